//! Kernel cache implementation
//!
//! Provides an LRU cache of kernel matrix rows for the SMO solver. The solver
//! asks for whole rows K(i, ·) because every step updates the gradient of all
//! variables; caching rows keeps the most active variables hot.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// LRU cache for kernel matrix rows
pub struct KernelCache {
    cache: LruCache<usize, Arc<[f64]>>,
    hits: u64,
    misses: u64,
}

impl KernelCache {
    /// Create a new kernel cache holding at most `capacity` rows
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Create a kernel cache sized from a memory budget in bytes
    ///
    /// A row for a problem of `n_samples` variables takes `8 * n_samples`
    /// bytes. At least two rows are kept so a working pair always fits.
    pub fn with_memory_limit(memory_bytes: usize, n_samples: usize) -> Self {
        let row_bytes = (n_samples * std::mem::size_of::<f64>()).max(1);
        Self::new((memory_bytes / row_bytes).max(2))
    }

    /// Get row `i`, computing it with `compute` on a miss
    pub fn get_or_compute<F>(&mut self, i: usize, compute: F) -> Arc<[f64]>
    where
        F: FnOnce() -> Vec<f64>,
    {
        if let Some(row) = self.cache.get(&i) {
            self.hits += 1;
            return Arc::clone(row);
        }

        self.misses += 1;
        let row: Arc<[f64]> = compute().into();
        self.cache.put(i, Arc::clone(&row));
        row
    }

    /// Get cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            capacity: self.cache.cap().get(),
            size: self.cache.len(),
        }
    }

    /// Clear the cache
    pub fn clear(&mut self) {
        self.cache.clear();
        self.hits = 0;
        self.misses = 0;
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub capacity: usize,
    pub size: usize,
}
