//! A set of unique values built on the same engine as [`HashTable`].

use std::borrow::Borrow;
use std::collections::hash_map::RandomState;
use std::fmt::{self, Debug};
use std::hash::{BuildHasher, Hash};

use crate::config::TableConfig;
use crate::error::TableError;
use crate::iter::{IntoIter, Keys};
use crate::table::HashTable;

#[derive(Clone)]
pub struct ProbeSet<T, S = RandomState> {
    table: HashTable<T, (), S>,
}

impl<T, S> Default for ProbeSet<T, S>
where
    S: Default,
{
    fn default() -> Self {
        ProbeSet::with_hasher(S::default())
    }
}

impl<T> ProbeSet<T, RandomState> {
    pub fn new() -> Self {
        ProbeSet {
            table: HashTable::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        ProbeSet {
            table: HashTable::with_capacity(capacity),
        }
    }

    pub fn with_config(config: TableConfig) -> Result<Self, TableError> {
        Ok(ProbeSet {
            table: HashTable::with_config(config)?,
        })
    }
}

impl<T, S> ProbeSet<T, S> {
    pub fn with_hasher(hash_builder: S) -> Self {
        ProbeSet {
            table: HashTable::with_hasher(hash_builder),
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    pub fn load_factor(&self) -> f64 {
        self.table.load_factor()
    }

    pub fn clear(&mut self) {
        self.table.clear()
    }

    pub fn iter(&self) -> Keys<'_, T, ()> {
        self.table.keys()
    }
}

impl<T, S> ProbeSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    /// Adds `value`. Returns false, keeping the stored value, if an equal value is present.
    pub fn insert(&mut self, value: T) -> bool {
        self.table.insert(value, ()).1
    }

    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.contains_key(value)
    }

    pub fn get<Q>(&self, value: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.get_key_value(value).map(|(k, _)| k)
    }

    pub fn remove<Q>(&mut self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.erase(value) == 1
    }

    pub fn take<Q>(&mut self, value: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.remove_entry(value).map(|(k, _)| k)
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.table.retain(|k, _| keep(k))
    }

    pub fn reserve(&mut self, additional: usize) {
        self.table.reserve(additional)
    }

    pub fn rehash(&mut self, capacity: usize) -> Result<(), TableError> {
        self.table.rehash(capacity)
    }
}

impl<T, S> Debug for ProbeSet<T, S>
where
    T: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, S> PartialEq for ProbeSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.table == other.table
    }
}

impl<T, S> FromIterator<T> for ProbeSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set: Self = ProbeSet::with_hasher(S::default());
        set.extend(iter);
        set
    }
}

impl<T, S> Extend<T> for ProbeSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.table.extend(iter.into_iter().map(|v| (v, ())))
    }
}

pub struct SetIntoIter<T> {
    inner: IntoIter<T, ()>,
}

impl<T> Iterator for SetIntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for SetIntoIter<T> {}

impl<T, S> IntoIterator for ProbeSet<T, S> {
    type Item = T;
    type IntoIter = SetIntoIter<T>;

    fn into_iter(self) -> SetIntoIter<T> {
        SetIntoIter {
            inner: self.table.into_iter(),
        }
    }
}

impl<'a, T, S> IntoIterator for &'a ProbeSet<T, S> {
    type Item = &'a T;
    type IntoIter = Keys<'a, T, ()>;

    fn into_iter(self) -> Keys<'a, T, ()> {
        self.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn first_insert_wins() {
        let mut set: ProbeSet<String> = ProbeSet::new();
        assert!(set.insert("alpha".to_string()));
        assert!(!set.insert("alpha".to_string()));
        assert!(set.insert("beta".to_string()));
        assert_eq!(set.len(), 2);
        assert!(set.contains("alpha"));
        assert_eq!(set.get("beta").map(String::as_str), Some("beta"));
    }

    #[test]
    fn remove_and_take() {
        let mut set: ProbeSet<u32> = (0..20).collect();
        assert!(set.remove(&3));
        assert!(!set.remove(&3));
        assert_eq!(set.take(&4), Some(4));
        assert_eq!(set.take(&4), None);
        assert_eq!(set.len(), 18);
        set.retain(|v| v % 2 == 0);
        let mut left: Vec<u32> = set.into_iter().collect();
        left.sort_unstable();
        assert_eq!(left, vec![0, 2, 6, 8, 10, 12, 14, 16, 18]);
    }

    #[test]
    fn sets_compare_by_contents() {
        let a: ProbeSet<u32> = [1, 2, 3].into_iter().collect();
        let b: ProbeSet<u32> = [3, 2, 1, 2].into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(format!("{:?}", ProbeSet::<u8>::new()), "{}");
    }
}
