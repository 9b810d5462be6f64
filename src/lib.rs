//! Generic open addressing hash table with quadratic probing.
//!
//! - Slots are Empty, Occupied or Deleted (tombstone) and live in one power-of-two array.
//! - Lookups, inserts and erases share one triangular probe sequence, which visits every
//!   slot of the table, so a probe always finds a free slot when one exists.
//! - Erasing leaves a tombstone; inserts reuse tombstones and rehashing purges them.
//! - The table grows before an insert would push `(entries + tombstones) / capacity` above
//!   the configured maximum load factor. It never shrinks.

pub mod config;
pub mod error;
mod hash;
pub mod iter;
pub mod set;
pub mod stats;
pub mod table;

pub use config::TableConfig;
pub use error::TableError;
pub use iter::Position;
pub use set::ProbeSet;
pub use stats::TableStats;
pub use table::HashTable;
