//! The open addressing table.
//!
//! Every entry lives directly in one slot array whose capacity is a power of two. Collisions
//! are resolved with triangular (quadratic) probing, see [`ProbeSeq`]. Erasing an entry
//! leaves a tombstone behind so that keys stored further along the same probe sequence stay
//! reachable. Tombstones are reused by later inserts and purged by every rehash.

use std::alloc::{self, Layout};
use std::borrow::Borrow;
use std::collections::hash_map::RandomState;
use std::fmt::{self, Debug};
use std::hash::{BuildHasher, Hash};
use std::mem;
use std::ops::Index;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use tracing::{debug, trace, warn};

use crate::config::{check_load_factor, TableConfig};
use crate::error::TableError;
use crate::hash::{self, ProbeSeq};
use crate::iter::Position;

#[derive(Debug, Clone)]
pub(crate) enum Slot<K, V> {
    Empty,
    Occupied(K, V),
    Deleted,
}

impl<K, V> Slot<K, V> {
    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }

    #[inline]
    pub(crate) fn is_deleted(&self) -> bool {
        matches!(self, Slot::Deleted)
    }

    #[inline]
    pub(crate) fn is_occupied(&self) -> bool {
        matches!(self, Slot::Occupied(..))
    }
}

/// Outcome of walking a key's probe sequence.
enum Probe {
    /// The key is stored at this slot.
    Found(usize),
    /// The key is absent. This is the first tombstone on the sequence, or else the Empty
    /// slot that ended it.
    Vacant(usize),
    /// The key is absent and every slot is occupied.
    Full,
}

/// A map from unique keys to values stored with open addressing.
///
/// `insert` never overwrites an existing entry; use [`HashTable::assign`] to upsert.
///
/// ```
/// use probing_buckets::HashTable;
///
/// let mut table: HashTable<u32, &str> = HashTable::new();
/// assert!(table.insert(1, "one").1);
/// assert!(!table.insert(1, "uno").1);
/// assert_eq!(table.get(&1), Some(&"one"));
/// assert_eq!(table.erase(&1), 1);
/// assert_eq!(table.erase(&1), 0);
/// ```
pub struct HashTable<K, V, S = RandomState> {
    /// Identity stamped into every [`Position`] this table hands out.
    pub(crate) id: usize,
    pub(crate) slots: Vec<Slot<K, V>>,
    pub(crate) shift: usize,
    /// Live entries.
    pub(crate) count: usize,
    /// Occupied plus deleted slots.
    pub(crate) used: usize,
    pub(crate) max_load_factor: f64,
    pub(crate) hash_builder: S,
}

fn next_table_id() -> usize {
    static NEXT_ID: AtomicUsize = AtomicUsize::new(0);
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Turns an allocation failure into the global allocation error handler, the same way
/// `Vec` reacts to running out of memory.
fn or_alloc_error<K, V, T>(result: Result<T, TableError>) -> T {
    match result {
        Ok(value) => value,
        Err(TableError::AllocationFailure { capacity }) => {
            match Layout::array::<Slot<K, V>>(capacity) {
                Ok(layout) => alloc::handle_alloc_error(layout),
                Err(_) => panic!("capacity overflow"),
            }
        }
        Err(e) => panic!("{}", e),
    }
}

/// Allocates a slot array of exactly `capacity` Empty slots without touching any table.
fn allocate_slots<K, V>(capacity: usize) -> Result<Vec<Slot<K, V>>, TableError> {
    let mut slots: Vec<Slot<K, V>> = Vec::new();
    if slots.try_reserve_exact(capacity).is_err() {
        warn!(capacity, "failed to allocate slot array");
        return Err(TableError::AllocationFailure { capacity });
    }
    slots.resize_with(capacity, || Slot::Empty);
    Ok(slots)
}

impl<K, V> HashTable<K, V, RandomState> {
    pub fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }

    /// Creates a table that holds at least `capacity` entries before it grows.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, RandomState::new())
    }

    pub fn with_config(config: TableConfig) -> Result<Self, TableError> {
        Self::with_config_and_hasher(config, RandomState::new())
    }
}

impl<K, V, S> HashTable<K, V, S> {
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_capacity_and_hasher(TableConfig::default().initial_capacity, hash_builder)
    }

    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        let config: TableConfig = TableConfig::default().initial_capacity(capacity);
        or_alloc_error::<K, V, _>(Self::with_config_and_hasher(config, hash_builder))
    }

    pub fn with_config_and_hasher(config: TableConfig, hash_builder: S) -> Result<Self, TableError> {
        config.validate()?;
        let capacity: usize =
            hash::capacity_for_entries(config.initial_capacity, config.max_load_factor).ok_or(
                TableError::AllocationFailure {
                    capacity: config.initial_capacity,
                },
            )?;
        Ok(HashTable {
            id: next_table_id(),
            slots: allocate_slots(capacity)?,
            shift: hash::shift_for(capacity),
            count: 0,
            used: 0,
            max_load_factor: config.max_load_factor,
            hash_builder,
        })
    }

    /// Number of slots, always a power of two.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of slots holding a tombstone.
    #[inline]
    pub fn tombstones(&self) -> usize {
        self.used - self.count
    }

    /// Occupied-or-deleted slots divided by capacity.
    pub fn load_factor(&self) -> f64 {
        if self.capacity() == 0 {
            0.0
        } else {
            self.used as f64 / self.capacity() as f64
        }
    }

    pub fn max_load_factor(&self) -> f64 {
        self.max_load_factor
    }

    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Resets every slot to Empty, dropping all keys and values. Capacity is kept.
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = Slot::Empty;
        }
        self.count = 0;
        self.used = 0;
    }

    /// Drops the pair stored at `index` and leaves a tombstone.
    pub(crate) fn bury(&mut self, index: usize) -> Option<(K, V)> {
        match mem::replace(&mut self.slots[index], Slot::Deleted) {
            Slot::Occupied(key, value) => {
                self.count -= 1;
                Some((key, value))
            }
            other => {
                self.slots[index] = other;
                None
            }
        }
    }
}

impl<K, V, S> HashTable<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    #[inline]
    pub(crate) fn make_hash<Q>(&self, key: &Q) -> u64
    where
        Q: Hash + ?Sized,
    {
        self.hash_builder.hash_one(key)
    }

    #[inline]
    pub(crate) fn probe_seq(&self, hash: u64) -> ProbeSeq {
        ProbeSeq::new(hash::index_for(hash, self.shift), self.capacity())
    }

    /// Walks the probe sequence of `key`, remembering the first tombstone as the insertion
    /// point.
    fn probe<Q>(&self, hash: u64, key: &Q) -> Probe
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut tombstone: Option<usize> = None;
        for i in self.probe_seq(hash) {
            match &self.slots[i] {
                Slot::Empty => return Probe::Vacant(tombstone.unwrap_or(i)),
                Slot::Occupied(k, _) if k.borrow() == key => return Probe::Found(i),
                Slot::Occupied(..) => {}
                Slot::Deleted => {
                    if tombstone.is_none() {
                        tombstone = Some(i);
                    }
                }
            }
        }
        match tombstone {
            Some(i) => Probe::Vacant(i),
            None => Probe::Full,
        }
    }

    fn find_index<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        for i in self.probe_seq(self.make_hash(key)) {
            match &self.slots[i] {
                Slot::Empty => return None,
                Slot::Occupied(k, _) if k.borrow() == key => return Some(i),
                _ => {}
            }
        }
        None
    }

    /// Returns the position of `key`, or `None` if it is absent.
    pub fn find<Q>(&self, key: &Q) -> Option<Position>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find_index(key).map(|i| Position::new(self.id, i))
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find_index(key).is_some()
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_key_value(key).map(|(_, v)| v)
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match &self.slots[self.find_index(key)?] {
            Slot::Occupied(k, v) => Some((k, v)),
            _ => None,
        }
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let i: usize = self.find_index(key)?;
        match &mut self.slots[i] {
            Slot::Occupied(_, v) => Some(v),
            _ => None,
        }
    }

    /// Like [`get`](Self::get), but a missing key is an error.
    pub fn at<Q>(&self, key: &Q) -> Result<&V, TableError>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).ok_or(TableError::KeyNotFound)
    }

    pub fn at_mut<Q>(&mut self, key: &Q) -> Result<&mut V, TableError>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_mut(key).ok_or(TableError::KeyNotFound)
    }

    /// Inserts `key` unless it is already present. Returns the stored value and whether the
    /// insertion happened. On a hit the stored value is left untouched and `value` is dropped.
    pub fn insert(&mut self, key: K, value: V) -> (&mut V, bool) {
        or_alloc_error::<K, V, _>(self.try_insert(key, value))
    }

    pub fn try_insert(&mut self, key: K, value: V) -> Result<(&mut V, bool), TableError> {
        self.try_insert_with(key, || value)
    }

    /// Inserts or overwrites. Returns the previous value if the key was present.
    pub fn assign(&mut self, key: K, value: V) -> Option<V> {
        let hash: u64 = self.make_hash(&key);
        let index: usize = or_alloc_error::<K, V, _>(self.vacant_or_found(hash, &key));
        if self.slots[index].is_occupied() {
            return Some(mem::replace(self.value_mut_at(index), value));
        }
        self.occupy(index, key, value);
        None
    }

    pub fn get_or_insert_with<F>(&mut self, key: K, default: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        or_alloc_error::<K, V, _>(self.try_insert_with(key, default)).0
    }

    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }

    /// Builds the value only if the key is absent.
    fn try_insert_with<F>(&mut self, key: K, make: F) -> Result<(&mut V, bool), TableError>
    where
        F: FnOnce() -> V,
    {
        let hash: u64 = self.make_hash(&key);
        let index: usize = self.vacant_or_found(hash, &key)?;
        if self.slots[index].is_occupied() {
            return Ok((self.value_mut_at(index), false));
        }
        Ok((self.occupy(index, key, make()), true))
    }

    /// Returns the slot holding `key`, or the slot a new entry for `key` goes into. If
    /// claiming an Empty slot would exceed the load factor the table is rehashed first: in
    /// place when tombstones outnumber live entries and the live entries alone fit,
    /// otherwise into a larger array.
    fn vacant_or_found<Q>(&mut self, hash: u64, key: &Q) -> Result<usize, TableError>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        loop {
            match self.probe(hash, key) {
                Probe::Found(i) => return Ok(i),
                Probe::Vacant(i) if self.slots[i].is_deleted() => return Ok(i),
                Probe::Vacant(i)
                    if hash::fits(self.used + 1, self.capacity(), self.max_load_factor) =>
                {
                    return Ok(i)
                }
                _ => {
                    // mostly tombstones: purge them in place instead of doubling
                    if self.tombstones() >= self.count
                        && hash::fits(self.count + 1, self.capacity(), self.max_load_factor)
                    {
                        self.resize(self.capacity())?
                    } else {
                        self.grow()?
                    }
                }
            }
        }
    }

    fn occupy(&mut self, index: usize, key: K, value: V) -> &mut V {
        let previous: Slot<K, V> = mem::replace(&mut self.slots[index], Slot::Occupied(key, value));
        if previous.is_empty() {
            self.used += 1;
        } else {
            trace!(slot = index, "reusing tombstone");
        }
        self.count += 1;
        self.value_mut_at(index)
    }

    fn value_mut_at(&mut self, index: usize) -> &mut V {
        match &mut self.slots[index] {
            Slot::Occupied(_, v) => v,
            _ => unreachable!("slot {} is not occupied", index),
        }
    }

    /// Removes `key`. Returns the number of entries removed, 0 or 1.
    pub fn erase<Q>(&mut self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_entry(key).map_or(0, |_| 1)
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let i: usize = self.find_index(key)?;
        self.bury(i)
    }

    /// Keeps only the entries for which `keep` returns true.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        for i in 0..self.capacity() {
            let doomed: bool = match &mut self.slots[i] {
                Slot::Occupied(k, v) => !keep(k, v),
                _ => false,
            };
            if doomed {
                self.bury(i);
            }
        }
    }

    /// Changes the growth threshold. If the table is already above the new threshold it is
    /// rehashed right away.
    pub fn set_max_load_factor(&mut self, max_load_factor: f64) -> Result<(), TableError> {
        check_load_factor(max_load_factor)?;
        if !hash::fits(self.used, self.capacity(), max_load_factor) {
            let capacity: usize = hash::capacity_for_entries(self.count, max_load_factor)
                .ok_or(TableError::AllocationFailure {
                    capacity: self.capacity(),
                })?
                .max(self.capacity());
            self.resize(capacity)?;
        }
        self.max_load_factor = max_load_factor;
        Ok(())
    }

    /// Rebuilds the slot array with at least `capacity` slots, purging every tombstone.
    ///
    /// The table never shrinks, and the new capacity is always large enough to hold the
    /// current entries under the load factor. On failure the table is left as it was.
    pub fn rehash(&mut self, capacity: usize) -> Result<(), TableError> {
        let requested: usize =
            hash::capacity_for(capacity).ok_or(TableError::AllocationFailure { capacity })?;
        let needed: usize = hash::capacity_for_entries(self.count, self.max_load_factor)
            .ok_or(TableError::AllocationFailure { capacity })?;
        self.resize(requested.max(needed).max(self.capacity()))
    }

    /// Makes room for `additional` more entries without any further growth.
    pub fn reserve(&mut self, additional: usize) {
        or_alloc_error::<K, V, _>(self.try_reserve(additional))
    }

    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TableError> {
        let overflow = TableError::AllocationFailure {
            capacity: usize::MAX,
        };
        let used: usize = self.used.checked_add(additional).ok_or_else(|| overflow.clone())?;
        if hash::fits(used, self.capacity(), self.max_load_factor) {
            return Ok(());
        }
        let entries: usize = self.count.checked_add(additional).ok_or_else(|| overflow.clone())?;
        let capacity: usize = hash::capacity_for_entries(entries, self.max_load_factor)
            .ok_or(overflow)?
            .max(self.capacity());
        self.resize(capacity)
    }

    /// Doubles the capacity, or more if one more entry would still not fit.
    fn grow(&mut self) -> Result<(), TableError> {
        let doubled: Option<usize> = self.capacity().checked_mul(2);
        let needed: Option<usize> =
            hash::capacity_for_entries(self.count + 1, self.max_load_factor);
        match doubled.zip(needed) {
            Some((doubled, needed)) => self.resize(doubled.max(needed)),
            None => Err(TableError::AllocationFailure {
                capacity: usize::MAX,
            }),
        }
    }

    /// Moves every live entry into a fresh array of `capacity` slots. The new array is fully
    /// allocated before the table is touched.
    fn resize(&mut self, capacity: usize) -> Result<(), TableError> {
        let now: Instant = Instant::now();
        let old_capacity: usize = self.capacity();
        let purged: usize = self.tombstones();
        let new_slots: Vec<Slot<K, V>> = allocate_slots(capacity)?;

        let old_slots: Vec<Slot<K, V>> = mem::replace(&mut self.slots, new_slots);
        self.shift = hash::shift_for(capacity);
        self.used = self.count;
        for slot in old_slots {
            if let Slot::Occupied(key, value) = slot {
                let hash: u64 = self.make_hash(&key);
                let i: usize = self
                    .probe_seq(hash)
                    .find(|&i| self.slots[i].is_empty())
                    .expect("a rehashed table always has a free slot");
                self.slots[i] = Slot::Occupied(key, value);
            }
        }

        debug!(
            old_capacity,
            new_capacity = capacity,
            entries = self.count,
            tombstones_purged = purged,
            elapsed_ns = now.elapsed().as_nanos() as u64,
            "rehashed table"
        );
        Ok(())
    }
}

/// A copy is a distinct table: positions from the original are not valid on it.
impl<K, V, S> Clone for HashTable<K, V, S>
where
    K: Clone,
    V: Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        HashTable {
            id: next_table_id(),
            slots: self.slots.clone(),
            shift: self.shift,
            count: self.count,
            used: self.used,
            max_load_factor: self.max_load_factor,
            hash_builder: self.hash_builder.clone(),
        }
    }
}

impl<K, V, S> Default for HashTable<K, V, S>
where
    S: Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> Debug for HashTable<K, V, S>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> PartialEq for HashTable<K, V, S>
where
    K: Hash + Eq,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).map_or(false, |w| v == w))
    }
}

impl<K, V, S> Eq for HashTable<K, V, S>
where
    K: Hash + Eq,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, Q, V, S> Index<&Q> for HashTable<K, V, S>
where
    K: Hash + Eq + Borrow<Q>,
    Q: Hash + Eq + ?Sized,
    S: BuildHasher,
{
    type Output = V;

    /// Panics if the key is absent.
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

impl<K, V, S> FromIterator<(K, V)> for HashTable<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table: Self = HashTable::default();
        table.extend(iter);
        table
    }
}

/// First write wins, as with [`HashTable::insert`].
impl<K, V, S> Extend<(K, V)> for HashTable<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}
