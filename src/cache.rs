/// Lock-free cache of configured zone converters

use std::sync::Arc;
use dashmap::DashMap;
use crossbeam::queue::SegQueue;
use log::debug;

use crate::projection::ellipsoid::Ellipsoid;
use crate::projection::flags::TmFlags;
use crate::projection::tm::TransverseMercator;
use crate::types::Hemisphere;

/// Identifies one UTM zone projection on one ellipsoid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ZoneKey {
    pub zone: u8,
    pub hemisphere: Hemisphere,
    ellipsoid: (u64, u64),
}

impl ZoneKey {
    pub fn new(zone: u8, hemisphere: Hemisphere, ellipsoid: &Ellipsoid) -> Self {
        Self {
            zone,
            hemisphere,
            ellipsoid: ellipsoid.key(),
        }
    }
}

/// Bounded cache of Transverse Mercator converters keyed by zone
pub struct ZoneCache {
    cache: Arc<DashMap<ZoneKey, Arc<TransverseMercator>>>,
    insertion_order: Arc<SegQueue<ZoneKey>>,
    max_zones: usize,
}

impl ZoneCache {
    /// Creates a new lock-free zone cache
    ///
    /// # Arguments
    /// * `max_zones` - Maximum number of converters to keep (default: 128)
    pub fn new(max_zones: usize) -> Self {
        Self {
            cache: Arc::new(DashMap::new()),
            insertion_order: Arc::new(SegQueue::new()),
            max_zones: max_zones.max(1),
        }
    }

    /// Gets a converter from the cache (lock-free)
    pub fn get(&self, key: &ZoneKey) -> Option<Arc<TransverseMercator>> {
        self.cache.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Puts a converter into the cache, evicting the oldest entries when full.
    /// Replacing a cached key keeps its place in the eviction order.
    pub fn put(&self, key: ZoneKey, converter: TransverseMercator) -> Arc<TransverseMercator> {
        let converter = Arc::new(converter);

        if self.cache.contains_key(&key) {
            self.cache.insert(key, Arc::clone(&converter));
            return converter;
        }

        while self.cache.len() >= self.max_zones {
            if let Some(old_key) = self.insertion_order.pop() {
                self.cache.remove(&old_key);
            } else {
                break;
            }
        }

        self.cache.insert(key, Arc::clone(&converter));
        self.insertion_order.push(key);
        converter
    }

    /// Returns the cached converter for `key`, building it with `build` on a miss
    ///
    /// Build failures are returned and nothing is cached.
    pub fn get_or_try_insert_with<F>(
        &self,
        key: ZoneKey,
        build: F,
    ) -> std::result::Result<Arc<TransverseMercator>, TmFlags>
    where
        F: FnOnce() -> std::result::Result<TransverseMercator, TmFlags>,
    {
        if let Some(converter) = self.get(&key) {
            return Ok(converter);
        }

        debug!("building converter for zone {}{}", key.zone, key.hemisphere);
        let converter = build()?;
        Ok(self.put(key, converter))
    }

    /// Clears the cache
    pub fn clear(&self) {
        self.cache.clear();

        while self.insertion_order.pop().is_some() {}
    }

    /// Returns the current number of cached converters
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Returns whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Returns cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            zone_count: self.cache.len(),
            max_zones: self.max_zones,
        }
    }
}

impl Clone for ZoneCache {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            insertion_order: Arc::clone(&self.insertion_order),
            max_zones: self.max_zones,
        }
    }
}

impl Default for ZoneCache {
    fn default() -> Self {
        Self::new(128)
    }
}

impl std::fmt::Debug for ZoneCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZoneCache")
            .field("zones", &self.cache.len())
            .field("max_zones", &self.max_zones)
            .finish()
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Number of converters currently in cache
    pub zone_count: usize,
    /// Maximum number of converters
    pub max_zones: usize,
}
