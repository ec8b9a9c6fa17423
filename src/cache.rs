//! Memoization of values bound to a class.

use std::{
    any::Any,
    sync::{Arc, Mutex, OnceLock, PoisonError},
};

use arcstr::ArcStr;
use fnv::FnvHashMap;

use crate::reflection::ClassName;

/// Type-erased value stored in a [`ClassBoundCache`].
pub type CachedValue = Arc<dyn Any + Send + Sync>;

/// Cache of values computed out of a class, partitioned per class.
///
/// There is deliberately no separate "has"/"put" pair: the only way in is
/// [`ClassBoundCache::get_or_compute()`], and implementations must make sure
/// concurrent callers asking for the same `(class, key)` observe the very same
/// value, computed once.
pub trait ClassBoundCache: Send + Sync {
    /// Returns the value cached under `key` in the partition of `class`,
    /// computing it with `resolver` on a miss.
    ///
    /// The `resolver` must not query this cache for the same `(class, key)`.
    fn get_or_compute(
        &self,
        class: &ClassName,
        key: &str,
        resolver: &mut dyn FnMut() -> CachedValue,
    ) -> CachedValue;
}

/// Typed access to a [`ClassBoundCache`].
pub trait ClassBoundCacheExt: ClassBoundCache {
    /// Typed version of [`ClassBoundCache::get_or_compute()`].
    ///
    /// If the cached value is not of type `T` (two callers using the same key
    /// for values of different types), the value is computed afresh and not
    /// cached.
    fn get<T, F>(&self, class: &ClassName, key: &str, resolver: F) -> Arc<T>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Arc<T>,
    {
        let mut erased = || -> CachedValue { resolver() };
        match self.get_or_compute(class, key, &mut erased).downcast::<T>() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(
                    %class,
                    key,
                    expected = std::any::type_name::<T>(),
                    "cached value is of an unexpected type, recomputing it",
                );
                resolver()
            }
        }
    }
}

impl<C: ClassBoundCache + ?Sized> ClassBoundCacheExt for C {}

type Cell = Arc<OnceLock<CachedValue>>;

/// Process-local [`ClassBoundCache`].
///
/// Each `(class, key)` entry is a [`OnceLock`] cell: the map lock is only held
/// to find or create the cell, never while computing a value, and the cell
/// makes concurrent callers wait for the single computation.
#[derive(Debug, Default)]
pub struct InMemoryClassBoundCache {
    cells: Mutex<FnvHashMap<ClassName, FnvHashMap<ArcStr, Cell>>>,
}

impl InMemoryClassBoundCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every cached value.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Drops the values cached in the partition of the given `class`.
    pub fn clear_class(&self, class: &ClassName) {
        self.lock().remove(class);
    }

    /// Returns the number of computed entries in the partition of `class`.
    pub fn len_of(&self, class: &ClassName) -> usize {
        self.lock()
            .get(class)
            .map_or(0, |p| p.values().filter(|c| c.get().is_some()).count())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FnvHashMap<ClassName, FnvHashMap<ArcStr, Cell>>> {
        self.cells.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cell(&self, class: &ClassName, key: &str) -> Cell {
        self.lock()
            .entry(class.clone())
            .or_default()
            .entry(key.into())
            .or_default()
            .clone()
    }
}

impl ClassBoundCache for InMemoryClassBoundCache {
    fn get_or_compute(
        &self,
        class: &ClassName,
        key: &str,
        resolver: &mut dyn FnMut() -> CachedValue,
    ) -> CachedValue {
        self.cell(class, key)
            .get_or_init(|| {
                tracing::trace!(%class, key, "class-bound cache miss");
                resolver()
            })
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::{ClassBoundCacheExt as _, InMemoryClassBoundCache};
    use crate::reflection::ClassName;

    #[test]
    fn computes_once_per_key() {
        let cache = InMemoryClassBoundCache::new();
        let class = ClassName::new("App\\User");
        let calls = AtomicUsize::new(0);
        let compute = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Arc::new(String::from("value"))
        };

        let a = cache.get(&class, "key", compute);
        let b = cache.get(&class, "key", compute);

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len_of(&class), 1);
    }

    #[test]
    fn partitions_by_class_and_key() {
        let cache = InMemoryClassBoundCache::new();
        let user = ClassName::new("App\\User");
        let post = ClassName::new("App\\Post");

        let a = cache.get(&user, "key", || Arc::new(1));
        let b = cache.get(&post, "key", || Arc::new(2));
        let c = cache.get(&user, "other", || Arc::new(3));

        assert_eq!((*a, *b, *c), (1, 2, 3));
        assert_eq!(cache.len_of(&user), 2);

        cache.clear_class(&user);
        assert_eq!(cache.len_of(&user), 0);
        assert_eq!(*cache.get(&post, "key", || Arc::new(0)), 2);

        cache.clear();
        assert_eq!(*cache.get(&post, "key", || Arc::new(0)), 0);
    }

    #[test]
    fn recomputes_values_of_unexpected_type() {
        let cache = InMemoryClassBoundCache::new();
        let class = ClassName::new("App\\User");
        let calls = AtomicUsize::new(0);

        let _ = cache.get(&class, "key", || Arc::new(1_u32));
        let fresh = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Arc::new(String::from("fresh"))
        };
        let s = cache.get(&class, "key", fresh);
        let t = cache.get(&class, "key", fresh);

        assert_eq!(s.as_str(), "fresh");
        assert!(!Arc::ptr_eq(&s, &t));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(*cache.get(&class, "key", || Arc::new(0_u32)), 1);
    }

    #[test]
    fn is_shared_across_threads() {
        let cache = Arc::new(InMemoryClassBoundCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let class = ClassName::new("App\\User");

        let handles = (0..8)
            .map(|_| {
                let (cache, calls, class) = (cache.clone(), calls.clone(), class.clone());
                std::thread::spawn(move || {
                    cache.get(&class, "key", || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Arc::new(42)
                    })
                })
            })
            .collect::<Vec<_>>();
        let values = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect::<Vec<_>>();

        assert!(values.iter().all(|v| Arc::ptr_eq(v, &values[0])));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
