mod cached_factories;
