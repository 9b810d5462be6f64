//! Construction parameters for [`HashTable`](crate::HashTable).

use crate::error::TableError;

pub const DEFAULT_INITIAL_CAPACITY: usize = 16;
pub const DEFAULT_MAX_LOAD_FACTOR: f64 = 0.7;

/// Initial sizing and growth threshold of a table.
///
/// ```
/// use probing_buckets::{HashTable, TableConfig};
///
/// let config = TableConfig::new().initial_capacity(11).max_load_factor(0.5);
/// let table: HashTable<u32, &str> = HashTable::with_config(config).unwrap();
/// assert_eq!(table.capacity(), 32);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableConfig {
    /// Number of entries the table should hold before its first growth. Rounded up to a
    /// power of two.
    pub initial_capacity: usize,
    /// Ratio of occupied-or-deleted slots to capacity above which the table grows.
    pub max_load_factor: f64,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
        }
    }
}

impl TableConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    pub fn max_load_factor(mut self, max_load_factor: f64) -> Self {
        self.max_load_factor = max_load_factor;
        self
    }

    pub fn validate(&self) -> Result<(), TableError> {
        check_load_factor(self.max_load_factor)
    }
}

/// A load factor must lie in `(0, 1]`. Anything above 1 could never be reached by an open
/// addressing table, and NaN would disable growth.
pub(crate) fn check_load_factor(max_load_factor: f64) -> Result<(), TableError> {
    if max_load_factor > 0.0 && max_load_factor <= 1.0 {
        Ok(())
    } else {
        Err(TableError::InvalidLoadFactor(max_load_factor))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let config = TableConfig::default();
        assert_eq!(config.initial_capacity, 16);
        assert_eq!(config.max_load_factor, 0.7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_bad_load_factors() {
        for lf in [0.0, -0.5, 1.01, f64::NAN, f64::INFINITY] {
            let config = TableConfig::new().max_load_factor(lf);
            assert!(matches!(
                config.validate(),
                Err(TableError::InvalidLoadFactor(_))
            ));
        }
        assert!(TableConfig::new().max_load_factor(1.0).validate().is_ok());
    }
}
