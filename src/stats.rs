//! Occupancy and probe length report.

use std::fmt::{self, Display};
use std::hash::{BuildHasher, Hash};

use crate::table::{HashTable, Slot};

/// Number of histogram buckets. The last bucket collects every probe length at or above it.
pub const PROBE_HISTOGRAM_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct TableStats {
    pub capacity: usize,
    pub entries: usize,
    pub tombstones: usize,
    pub empty: usize,
    pub load_factor: f64,
    /// Longest distance, in probe steps, between an entry's home slot and its actual slot.
    pub max_probe_len: usize,
    pub mean_probe_len: f64,
    /// `probe_histogram[i]` counts entries found after exactly `i` extra probes.
    pub probe_histogram: [usize; PROBE_HISTOGRAM_LEN],
}

impl<K, V, S> HashTable<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Walks every slot once and measures how far each entry sits from its home slot.
    pub fn stats(&self) -> TableStats {
        let mut stats = TableStats {
            capacity: self.capacity(),
            entries: self.len(),
            tombstones: self.tombstones(),
            empty: self.capacity() - self.used,
            load_factor: self.load_factor(),
            max_probe_len: 0,
            mean_probe_len: 0.0,
            probe_histogram: [0; PROBE_HISTOGRAM_LEN],
        };
        let mut total: usize = 0;
        for (i, slot) in self.slots.iter().enumerate() {
            if let Slot::Occupied(key, _) = slot {
                let len: usize = self
                    .probe_seq(self.make_hash(key))
                    .position(|j| j == i)
                    .unwrap_or(self.capacity());
                total += len;
                stats.max_probe_len = stats.max_probe_len.max(len);
                stats.probe_histogram[len.min(PROBE_HISTOGRAM_LEN - 1)] += 1;
            }
        }
        if stats.entries > 0 {
            stats.mean_probe_len = total as f64 / stats.entries as f64;
        }
        stats
    }
}

impl Display for TableStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries == 0 {
            return write!(
                f,
                "Hash table stats: capacity {}, no entries, {} tombstones",
                self.capacity, self.tombstones
            );
        }
        writeln!(
            f,
            "Hash table stats: capacity {}, entries {}, tombstones {}, empty {}, load {:.3}",
            self.capacity, self.entries, self.tombstones, self.empty, self.load_factor
        )?;
        writeln!(
            f,
            " max probe length: {}, mean probe length: {:.3}",
            self.max_probe_len, self.mean_probe_len
        )?;
        write!(f, " probe length distribution:")?;
        for (len, &n) in self.probe_histogram.iter().enumerate() {
            if n == 0 {
                continue;
            }
            let share: f64 = n as f64 * 100.0 / self.entries as f64;
            if len == PROBE_HISTOGRAM_LEN - 1 {
                write!(f, "\n  >= {}: {} ({:.2}%)", len, n, share)?;
            } else {
                write!(f, "\n  {}: {} ({:.2}%)", len, n, share)?;
            }
        }
        Ok(())
    }
}
