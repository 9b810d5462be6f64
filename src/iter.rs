//! Forward walks over the slot array.
//!
//! Every iterator scans the slots in index order and skips Empty and Deleted slots. Borrowed
//! iterators hold the table, so it cannot be changed while they are alive. [`Position`] is the
//! detached form of the same walk: it outlives the borrow and lets the caller erase the
//! entry it points at, see [`HashTable::erase_at`].

use std::iter::FusedIterator;
use std::slice;
use std::vec;

use crate::table::{HashTable, Slot};

/// Opaque handle to a slot of a table: the identity of the table that produced it plus a
/// slot index.
///
/// A position handed to any other table, clones included, refers to nothing there. It is
/// also only meaningful until its own table next inserts or rehashes; after that, lookups
/// through it return `None` or a different entry, but never touch memory they should not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    table: usize,
    index: usize,
}

impl Position {
    #[inline]
    pub(crate) fn new(table: usize, index: usize) -> Self {
        Position { table, index }
    }

    /// Index of the slot this position refers to.
    #[inline]
    pub fn slot(self) -> usize {
        self.index
    }
}

impl<K, V, S> HashTable<K, V, S> {
    fn occupied_from(&self, start: usize) -> Option<Position> {
        self.slots
            .get(start..)?
            .iter()
            .position(Slot::is_occupied)
            .map(|offset| Position::new(self.id, start + offset))
    }

    /// Position of the first live entry, or `None` if the table is empty.
    pub fn first(&self) -> Option<Position> {
        self.occupied_from(0)
    }

    /// Slot index of `position` if it was produced by this table.
    fn own_slot(&self, position: Position) -> Option<usize> {
        (position.table == self.id).then_some(position.index)
    }

    /// Position of the live entry after `position`, or `None` at the end. A position from
    /// another table yields `None`.
    pub fn next_position(&self, position: Position) -> Option<Position> {
        self.occupied_from(self.own_slot(position)? + 1)
    }

    pub fn entry_at(&self, position: Position) -> Option<(&K, &V)> {
        match self.slots.get(self.own_slot(position)?)? {
            Slot::Occupied(k, v) => Some((k, v)),
            _ => None,
        }
    }

    pub fn value_at_mut(&mut self, position: Position) -> Option<&mut V> {
        let index: usize = self.own_slot(position)?;
        match self.slots.get_mut(index)? {
            Slot::Occupied(_, v) => Some(v),
            _ => None,
        }
    }

    /// Erases the entry at `position` and returns the position of the next live entry.
    ///
    /// Nothing is erased if `position` does not refer to a live entry; the walk still moves
    /// on. A position from another table erases nothing and returns `None`. Since erasing
    /// leaves a tombstone and never moves other entries, no entry is skipped or visited twice.
    ///
    /// ```
    /// use probing_buckets::HashTable;
    ///
    /// let mut table: HashTable<u32, u32> = (0..10).map(|i| (i, i * i)).collect();
    /// let mut cursor = table.first();
    /// while let Some(pos) = cursor {
    ///     let odd = table.entry_at(pos).map_or(false, |(k, _)| k % 2 == 1);
    ///     cursor = if odd { table.erase_at(pos) } else { table.next_position(pos) };
    /// }
    /// assert_eq!(table.len(), 5);
    /// ```
    pub fn erase_at(&mut self, position: Position) -> Option<Position> {
        let index: usize = self.own_slot(position)?;
        if index < self.slots.len() {
            self.bury(index);
        }
        self.next_position(position)
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: self.slots.iter(),
            remaining: self.count,
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            slots: self.slots.iter_mut(),
            remaining: self.count,
        }
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    /// Removes every entry, yielding them as owned pairs. Capacity is kept. Entries not
    /// consumed before the `Drain` is dropped are dropped with it.
    ///
    /// Each yielded entry leaves a tombstone until the `Drain` is dropped, which resets every
    /// slot to Empty. A leaked `Drain` therefore leaves a consistent table that still holds
    /// the entries it never yielded.
    pub fn drain(&mut self) -> Drain<'_, K, V, S> {
        Drain {
            table: self,
            next: 0,
        }
    }
}

pub struct Iter<'a, K, V> {
    slots: slice::Iter<'a, Slot<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Clone for Iter<'a, K, V> {
    fn clone(&self) -> Self {
        Iter {
            slots: self.slots.clone(),
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        for slot in self.slots.by_ref() {
            if let Slot::Occupied(k, v) = slot {
                self.remaining -= 1;
                return Some((k, v));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

pub struct IterMut<'a, K, V> {
    slots: slice::IterMut<'a, Slot<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        for slot in self.slots.by_ref() {
            if let Slot::Occupied(k, v) = slot {
                self.remaining -= 1;
                return Some((&*k, v));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

pub struct IntoIter<K, V> {
    slots: vec::IntoIter<Slot<K, V>>,
    remaining: usize,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        for slot in self.slots.by_ref() {
            if let Slot::Occupied(k, v) = slot {
                self.remaining -= 1;
                return Some((k, v));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

pub struct Drain<'a, K, V, S> {
    table: &'a mut HashTable<K, V, S>,
    next: usize,
}

impl<'a, K, V, S> Iterator for Drain<'a, K, V, S> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < self.table.capacity() {
            let index: usize = self.next;
            self.next += 1;
            if let Some(pair) = self.table.bury(index) {
                return Some(pair);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.table.count, Some(self.table.count))
    }
}

impl<K, V, S> Drop for Drain<'_, K, V, S> {
    fn drop(&mut self) {
        self.table.clear();
    }
}

impl<K, V, S> ExactSizeIterator for Drain<'_, K, V, S> {}
impl<K, V, S> FusedIterator for Drain<'_, K, V, S> {}

pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}
impl<K, V> FusedIterator for Keys<'_, K, V> {}

pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}
impl<K, V> FusedIterator for Values<'_, K, V> {}

pub struct ValuesMut<'a, K, V> {
    inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<&'a mut V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}
impl<K, V> FusedIterator for ValuesMut<'_, K, V> {}

impl<K, V, S> IntoIterator for HashTable<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> IntoIter<K, V> {
        IntoIter {
            remaining: self.count,
            slots: self.slots.into_iter(),
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a HashTable<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut HashTable<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}
