use crate::base::ParamKey;
use lru::{KeyRef, LruCache};
use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, RwLock,
};

pub trait CounterTrait<K = ParamKey>: Send + Sync + std::fmt::Debug + Default + 'static {
    fn with_capacity(cap: usize) -> Self;
    fn cap(&self) -> usize;
    fn add(&self, key: K, value: u64);
    fn add_if_absent(&self, key: K, value: u64) -> Option<Arc<AtomicU64>>;
    #[cfg(not(test))]
    fn get<Q>(&self, key: &Q) -> Option<Arc<AtomicU64>>
    where
        KeyRef<K>: Borrow<Q>,
        Q: Hash + Eq + ?Sized;
    #[cfg(test)]
    fn get<Q>(&self, key: &Q) -> Option<Arc<AtomicU64>>
    where
        KeyRef<K>: Borrow<Q>,
        Q: Hash + Eq + 'static + Sized;
    #[cfg(not(test))]
    fn remove<Q>(&self, key: &Q) -> bool
    where
        KeyRef<K>: Borrow<Q>,
        Q: Hash + Eq + ?Sized;
    #[cfg(test)]
    fn remove<Q>(&self, key: &Q) -> bool
    where
        KeyRef<K>: Borrow<Q>,
        Q: Hash + Eq + 'static + Sized;
    #[cfg(not(test))]
    fn contains<Q>(&self, key: &Q) -> bool
    where
        KeyRef<K>: Borrow<Q>,
        Q: Hash + Eq + ?Sized;
    #[cfg(test)]
    fn contains<Q>(&self, key: &Q) -> bool
    where
        KeyRef<K>: Borrow<Q>,
        Q: Hash + Eq + 'static + Sized;
    fn keys(&self) -> Vec<K>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool;
    fn purge(&self);
}

#[derive(Debug)]
pub struct Counter<K = ParamKey>
where
    K: Send + Sync + Hash + Eq + std::fmt::Debug + Clone + 'static,
{
    cache: RwLock<LruCache<K, Arc<AtomicU64>>>,
}

/// Counter caches the hotspot parameter
impl<K> CounterTrait<K> for Counter<K>
where
    K: Send + Sync + Hash + Eq + std::fmt::Debug + Clone,
{
    fn with_capacity(cap: usize) -> Counter<K> {
        Counter {
            cache: RwLock::new(LruCache::new(cap)),
        }
    }

    fn cap(&self) -> usize {
        self.cache.read().unwrap().cap()
    }

    /// `add` add a value to the cache,
    /// Updates the "recently used"-ness of the key.
    fn add(&self, key: K, value: u64) {
        let mut cache = self.cache.write().unwrap();
        if cache.contains(&key) {
            cache.get(&key).unwrap().store(value, Ordering::SeqCst);
        } else {
            cache.put(key, Arc::new(AtomicU64::new(value)));
        }
    }

    // If the key is not existed in the cache, adds a value to the cache then return None. And updates the "recently used"-ness of the key
    // If the key is already existed in the cache, do nothing and return the prior value
    fn add_if_absent(&self, key: K, value: u64) -> Option<Arc<AtomicU64>> {
        let mut cache = self.cache.write().unwrap();
        if cache.contains(&key) {
            cache.get(&key).map(Arc::clone)
        } else {
            cache.put(key, Arc::new(AtomicU64::new(value)));
            None
        }
    }

    // `get` returns key's value from the cache and updates the "recently used"-ness of the key.
    fn get<Q>(&self, key: &Q) -> Option<Arc<AtomicU64>>
    where
        KeyRef<K>: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.cache.write().unwrap().get(key).map(Arc::clone)
    }

    // `remove` removes a key from the cache.
    // Return true if the key was contained.
    fn remove<Q>(&self, key: &Q) -> bool
    where
        KeyRef<K>: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.cache.write().unwrap().pop(key).is_some()
    }

    // `contains` checks if a key exists in cache
    // Without updating the recent-ness.
    fn contains<Q>(&self, key: &Q) -> bool
    where
        KeyRef<K>: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.cache.read().unwrap().contains(key)
    }

    // `keys` returns the keys in the cache, from oldest to newest.
    fn keys(&self) -> Vec<K> {
        let cache = self.cache.read().unwrap();
        let keys = cache.iter().rev().map(|(k, _v)| k.clone());
        keys.collect()
    }

    // `len` returns the number of items in the cache.
    fn len(&self) -> usize {
        self.cache.read().unwrap().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // `purge` clears all cache entries.
    fn purge(&self) {
        self.cache.write().unwrap().clear()
    }
}

impl<K> Default for Counter<K>
where
    K: Send + Sync + Hash + Eq + std::fmt::Debug + Clone,
{
    fn default() -> Counter<K> {
        Counter::<K>::with_capacity(0)
    }
}

#[cfg(test)]
pub(crate) use test::MockCounter;
