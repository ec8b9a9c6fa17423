use std::{
    hash::{Hash as _, Hasher as _},
    sync::Arc,
};

use fnv::FnvHasher;

use super::{Context, DocBlock, DocBlockContextFactory, DocBlockFactory};
use crate::{
    cache::{ClassBoundCache, ClassBoundCacheExt as _},
    reflection::Reflector,
};

const CONTEXT_KEY: &str = "reflection.docBlockContext";

/// Cache key of the doc block of the given symbol.
///
/// Symbols are partitioned by their declaring class, so the key only has to
/// tell apart the members of a single class.
fn doc_block_key(reflector: &Reflector) -> String {
    let mut hasher = FnvHasher::default();
    format!("{}.{}", reflector.kind(), reflector.name()).hash(&mut hasher);
    format!("reflection.docBlock.{:016x}", hasher.finish())
}

/// [`DocBlockContextFactory`] memoizing the contexts created by another one
/// in a [`ClassBoundCache`].
///
/// All the members of a class share the context of their declaring class.
pub struct CachedDocBlockContextFactory {
    cache: Arc<dyn ClassBoundCache>,
    inner: Arc<dyn DocBlockContextFactory>,
}

impl CachedDocBlockContextFactory {
    /// Decorates the `inner` factory with the given `cache`.
    pub fn new(cache: Arc<dyn ClassBoundCache>, inner: Arc<dyn DocBlockContextFactory>) -> Self {
        Self { cache, inner }
    }
}

impl DocBlockContextFactory for CachedDocBlockContextFactory {
    fn create_from_reflector(&self, reflector: &Reflector) -> Arc<Context> {
        let class = reflector.declaring_class();
        self.cache.get(class, CONTEXT_KEY, || {
            self.inner
                .create_from_reflector(&Reflector::Class(class.clone()))
        })
    }
}

/// [`DocBlockFactory`] memoizing the doc blocks created by another one in a
/// [`ClassBoundCache`].
pub struct CachedDocBlockFactory {
    cache: Arc<dyn ClassBoundCache>,
    inner: Arc<dyn DocBlockFactory>,
}

impl CachedDocBlockFactory {
    /// Decorates the `inner` factory with the given `cache`.
    pub fn new(cache: Arc<dyn ClassBoundCache>, inner: Arc<dyn DocBlockFactory>) -> Self {
        Self { cache, inner }
    }
}

impl DocBlockFactory for CachedDocBlockFactory {
    fn create_from_reflector(&self, reflector: &Reflector) -> Arc<DocBlock> {
        let key = doc_block_key(reflector);
        self.cache
            .get(reflector.declaring_class(), &key, || {
                self.inner.create_from_reflector(reflector)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::doc_block_key;
    use crate::reflection::{MemberRef, Reflector};

    #[test]
    fn doc_block_keys_tell_members_apart() {
        let method = Reflector::Method(MemberRef::new("App\\User", "name"));
        let property = Reflector::Property(MemberRef::new("App\\User", "name"));
        let other = Reflector::Method(MemberRef::new("App\\Post", "name"));

        let key = doc_block_key(&method);
        assert!(key.starts_with("reflection.docBlock."));
        assert_eq!(key.len(), "reflection.docBlock.".len() + 16);
        assert_ne!(key, doc_block_key(&property));
        // The declaring class partitions the cache, not the key.
        assert_eq!(key, doc_block_key(&other));
    }
}
