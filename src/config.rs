//! Manager configuration.

/// Sizes and thresholds for a [`Qmdd`][crate::qmdd::Qmdd] manager.
///
/// ```
/// use qmdd_rs::config::QmddConfig;
///
/// let config = QmddConfig::default().with_cache_bits(12).with_gc_threshold(1000);
/// assert_eq!(config.cache_bits, 12);
/// ```
#[derive(Debug, Clone)]
pub struct QmddConfig {
    /// The node store holds `2^storage_bits` nodes (including the terminal).
    pub storage_bits: usize,
    /// The computed table has `2^cache_bits` slots.
    pub cache_bits: usize,
    /// A garbage collection pass runs at an operation boundary once this many nodes are allocated.
    pub gc_threshold: usize,
    /// Tolerance for floating amplitude tables.
    pub tolerance: f64,
}

impl Default for QmddConfig {
    fn default() -> Self {
        Self {
            storage_bits: 20,
            cache_bits: 16,
            gc_threshold: 1 << 17,
            tolerance: 1e-12,
        }
    }
}

impl QmddConfig {
    pub fn with_storage_bits(mut self, bits: usize) -> Self {
        self.storage_bits = bits;
        self
    }

    pub fn with_cache_bits(mut self, bits: usize) -> Self {
        self.cache_bits = bits;
        self
    }

    pub fn with_gc_threshold(mut self, threshold: usize) -> Self {
        self.gc_threshold = threshold;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}
