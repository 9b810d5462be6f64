//! Index derivation, capacity policy and the triangular probe sequence.

pub(crate) const USIZE_BITS: usize = std::mem::size_of::<usize>() * 8;

/// Fibonacci multiplier used by [`index_for`]: 2^64 (or 2^32 on 32-bit targets) divided
/// by the golden ratio 1.6180339887..., truncated to an integer. Multiplying a hash by it spreads
/// neighbouring hash values across the whole word, so the top bits make a good table index
/// even for weak hashes such as small integers.
const HASH_MULTIPLIER: usize = if USIZE_BITS == 64 {
    11400714819323198486u64 as usize
} else if USIZE_BITS == 32 {
    2654435769
} else {
    panic!("Only 32-bit and 64-bit platforms are supported.")
};

pub(crate) const MIN_BITS: usize = 1;
pub(crate) const MIN_CAPACITY: usize = 1 << MIN_BITS;

/// Maps a full hash onto a slot index for a table of `1 << (USIZE_BITS - shift)` slots.
#[inline]
pub(crate) fn index_for(hash: u64, shift: usize) -> usize {
    (hash as usize).wrapping_mul(HASH_MULTIPLIER) >> shift
}

/// Shift that keeps the top `log2(capacity)` bits of the product. `capacity` must be a
/// power of two.
#[inline]
pub(crate) fn shift_for(capacity: usize) -> usize {
    debug_assert!(capacity.is_power_of_two());
    capacity.leading_zeros() as usize + 1
}

/// Smallest power of two at or above `requested`, never below [`MIN_CAPACITY`].
/// Returns `None` if no such `usize` exists.
pub(crate) fn capacity_for(requested: usize) -> Option<usize> {
    requested.max(MIN_CAPACITY).checked_next_power_of_two()
}

/// Smallest capacity able to hold `entries` live entries without exceeding `max_load_factor`.
pub(crate) fn capacity_for_entries(entries: usize, max_load_factor: f64) -> Option<usize> {
    let needed = (entries as f64 / max_load_factor).ceil();
    if !needed.is_finite() || needed >= usize::MAX as f64 {
        return None;
    }
    let mut capacity = capacity_for(needed as usize)?;
    // float rounding can leave us one doubling short
    while !fits(entries, capacity, max_load_factor) {
        capacity = capacity.checked_mul(2)?;
    }
    Some(capacity)
}

/// Returns true if `used` occupied-or-deleted slots stay within the load factor bound.
#[inline]
pub(crate) fn fits(used: usize, capacity: usize, max_load_factor: f64) -> bool {
    used as f64 <= max_load_factor * capacity as f64
}

/// The quadratic probe sequence `h0, h0 + 1, h0 + 3, h0 + 6, ...` modulo a power-of-two
/// capacity. Offsets are the triangular numbers `i(i+1)/2`, which visit every slot of the
/// table exactly once in the first `capacity` steps.
#[derive(Debug, Clone)]
pub(crate) struct ProbeSeq {
    pos: usize,
    stride: usize,
    mask: usize,
    remaining: usize,
}

impl ProbeSeq {
    #[inline]
    pub(crate) fn new(start: usize, capacity: usize) -> Self {
        ProbeSeq {
            pos: start,
            stride: 0,
            mask: capacity - 1,
            remaining: capacity,
        }
    }
}

impl Iterator for ProbeSeq {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let i = self.pos;
        self.stride += 1;
        self.pos = (self.pos + self.stride) & self.mask;
        Some(i)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for ProbeSeq {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn probe_sequence_covers_every_slot() {
        for bits in MIN_BITS..12 {
            let capacity = 1usize << bits;
            for start in [0, 1, capacity / 2, capacity - 1] {
                let mut seen = vec![false; capacity];
                for i in ProbeSeq::new(start, capacity) {
                    assert!(!seen[i], "slot {} visited twice (capacity {})", i, capacity);
                    seen[i] = true;
                }
                assert!(seen.iter().all(|&s| s));
            }
        }
    }

    #[test]
    fn probe_offsets_are_triangular() {
        let seq: Vec<usize> = ProbeSeq::new(5, 64).take(6).collect();
        assert_eq!(seq, vec![5, 6, 8, 11, 15, 20]);
    }

    #[test]
    fn index_stays_in_range() {
        for capacity in [2usize, 16, 1024] {
            let shift = shift_for(capacity);
            for hash in [0u64, 1, 42, u64::MAX, 0xdead_beef_cafe_babe] {
                assert!(index_for(hash, shift) < capacity);
            }
        }
    }

    #[test]
    fn capacity_policy() {
        assert_eq!(capacity_for(0), Some(2));
        assert_eq!(capacity_for(11), Some(16));
        assert_eq!(capacity_for(16), Some(16));
        assert_eq!(capacity_for(usize::MAX), None);
        assert_eq!(capacity_for_entries(100, 0.7), Some(256));
        assert_eq!(capacity_for_entries(7, 0.7), Some(16));
        assert_eq!(capacity_for_entries(8, 1.0), Some(8));
        assert!(capacity_for_entries(usize::MAX, 0.5).is_none());
    }
}
