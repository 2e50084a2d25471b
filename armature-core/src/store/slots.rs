//! Fixed-size slot tables
//!
//! Each slot holds one postcard-encoded entry, zero-padded to the slot
//! size. A slot is empty when it decodes to an entry with an empty name
//! (zeroed storage) or does not decode at all (erased flash).

use core::marker::PhantomData;

use armature_hal::{ByteRead, ByteStore};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::Label;
use crate::error::{Error, ValidationError};

/// An entry that can live in a slot table
pub trait SlotEntry: Serialize + DeserializeOwned {
    /// Entry name; empty marks a free slot
    fn label(&self) -> &Label;
}

/// Table of `count` slots of `SLOT` bytes starting at `base`
pub struct SlotTable<T, const SLOT: usize> {
    base: usize,
    count: usize,
    _entry: PhantomData<fn() -> T>,
}

impl<T, const SLOT: usize> Clone for SlotTable<T, SLOT> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, const SLOT: usize> Copy for SlotTable<T, SLOT> {}

impl<T, const SLOT: usize> SlotTable<T, SLOT> {
    pub const fn new(base: usize, count: usize) -> Self {
        Self {
            base,
            count,
            _entry: PhantomData,
        }
    }

    /// Number of slots
    pub const fn capacity(&self) -> usize {
        self.count
    }

    /// First byte of the table
    pub const fn base(&self) -> usize {
        self.base
    }

    /// First byte past the table
    pub const fn end(&self) -> usize {
        self.base + self.count * SLOT
    }
}

impl<T: SlotEntry, const SLOT: usize> SlotTable<T, SLOT> {
    fn offset(&self, index: usize) -> Result<usize, Error> {
        if index >= self.count {
            return Err(ValidationError::SlotIndex(index.min(u8::MAX as usize) as u8).into());
        }
        Ok(self.base + index * SLOT)
    }

    /// Read one slot, `None` if empty
    pub fn read<B: ByteRead>(&self, store: &B, index: usize) -> Result<Option<T>, Error> {
        let mut buf = [0u8; SLOT];
        store.read(self.offset(index)?, &mut buf)?;
        Ok(postcard::from_bytes::<T>(&buf)
            .ok()
            .filter(|entry| !entry.label().is_empty()))
    }

    /// Encode an entry into one slot, zero-padding the remainder
    pub fn write<B: ByteStore>(&self, store: &mut B, index: usize, entry: &T) -> Result<(), Error> {
        let offset = self.offset(index)?;
        let mut buf = [0u8; SLOT];
        // Entry sizes are bounded so every entry fits its slot
        postcard::to_slice(entry, &mut buf).map_err(|_| Error::Capacity)?;
        store.write(offset, &buf)?;
        Ok(())
    }

    /// Zero one slot
    pub fn clear<B: ByteStore>(&self, store: &mut B, index: usize) -> Result<(), Error> {
        store.zero(self.offset(index)?, SLOT)?;
        Ok(())
    }

    /// Zero every slot
    pub fn clear_all<B: ByteStore>(&self, store: &mut B) -> Result<(), Error> {
        store.zero(self.base, self.count * SLOT)?;
        Ok(())
    }

    /// Find the occupied slot holding `name`
    pub fn find<B: ByteRead>(&self, store: &B, name: &str) -> Result<Option<(usize, T)>, Error> {
        for index in 0..self.count {
            if let Some(entry) = self.read(store, index)? {
                if entry.label() == name {
                    return Ok(Some((index, entry)));
                }
            }
        }
        Ok(None)
    }

    /// Slot to save `name` into: its current slot, else the first empty one
    pub fn allocate<B: ByteRead>(&self, store: &B, name: &str) -> Result<usize, Error> {
        let mut empty = None;
        for index in 0..self.count {
            match self.read(store, index)? {
                Some(entry) if entry.label() == name => return Ok(index),
                Some(_) => {}
                None => {
                    if empty.is_none() {
                        empty = Some(index);
                    }
                }
            }
        }
        empty.ok_or(Error::Capacity)
    }

    /// Lazily iterate occupied entries in slot order
    pub fn entries<'a, B: ByteRead>(&self, store: &'a B) -> Entries<'a, B, T, SLOT> {
        Entries {
            store,
            table: *self,
            next: 0,
        }
    }
}

/// Iterator over occupied slots
///
/// Reads one slot per step. Cloning restarts from the clone's position
/// without touching the store.
pub struct Entries<'a, B, T, const SLOT: usize> {
    store: &'a B,
    table: SlotTable<T, SLOT>,
    next: usize,
}

impl<B, T, const SLOT: usize> Clone for Entries<'_, B, T, SLOT> {
    fn clone(&self) -> Self {
        Self {
            store: self.store,
            table: self.table,
            next: self.next,
        }
    }
}

impl<B: ByteRead, T: SlotEntry, const SLOT: usize> Iterator for Entries<'_, B, T, SLOT> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        while self.next < self.table.count {
            let index = self.next;
            self.next += 1;
            // Unreadable slots are skipped like empty ones
            if let Ok(Some(entry)) = self.table.read(self.store, index) {
                return Some(entry);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.table.count - self.next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::label;
    use armature_hal::RamStore;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Tag {
        name: Label,
        value: u16,
    }

    impl SlotEntry for Tag {
        fn label(&self) -> &Label {
            &self.name
        }
    }

    fn tag(name: &str, value: u16) -> Tag {
        Tag {
            name: label(name).unwrap(),
            value,
        }
    }

    const TABLE: SlotTable<Tag, 16> = SlotTable::new(8, 3);

    #[test]
    fn test_zeroed_and_erased_are_empty() {
        let store: RamStore<64> = RamStore::new();
        assert_eq!(TABLE.read(&store, 0).unwrap(), None);

        let store: RamStore<64> = RamStore::erased();
        assert_eq!(TABLE.read(&store, 2).unwrap(), None);
        assert_eq!(TABLE.entries(&store).count(), 0);
    }

    #[test]
    fn test_write_read() {
        let mut store: RamStore<64> = RamStore::erased();
        TABLE.write(&mut store, 1, &tag("a", 300)).unwrap();

        assert_eq!(TABLE.read(&store, 1).unwrap(), Some(tag("a", 300)));
        // Bytes outside the table untouched
        assert_eq!(store.as_bytes()[7], 0xFF);
        assert_eq!(store.as_bytes()[TABLE.end()], 0xFF);
    }

    #[test]
    fn test_allocate_prefers_name_match() {
        let mut store: RamStore<64> = RamStore::new();
        TABLE.write(&mut store, 1, &tag("b", 1)).unwrap();

        assert_eq!(TABLE.allocate(&store, "b").unwrap(), 1);
        assert_eq!(TABLE.allocate(&store, "c").unwrap(), 0);

        TABLE.write(&mut store, 0, &tag("a", 1)).unwrap();
        TABLE.write(&mut store, 2, &tag("c", 1)).unwrap();
        assert_eq!(TABLE.allocate(&store, "d"), Err(Error::Capacity));
        assert_eq!(TABLE.allocate(&store, "c").unwrap(), 2);
    }

    #[test]
    fn test_slot_index_checked() {
        let store: RamStore<64> = RamStore::new();
        assert_eq!(
            TABLE.read(&store, 3),
            Err(Error::Validation(ValidationError::SlotIndex(3)))
        );
    }

    #[test]
    fn test_entries_restartable() {
        let mut store: RamStore<64> = RamStore::new();
        TABLE.write(&mut store, 0, &tag("x", 1)).unwrap();
        TABLE.write(&mut store, 2, &tag("z", 3)).unwrap();

        let iter = TABLE.entries(&store);
        let first: heapless::Vec<u16, 3> = iter.clone().map(|t| t.value).collect();
        let again: heapless::Vec<u16, 3> = iter.map(|t| t.value).collect();
        assert_eq!(first.as_slice(), &[1, 3]);
        assert_eq!(first, again);
    }

    #[test]
    fn test_clear() {
        let mut store: RamStore<64> = RamStore::new();
        TABLE.write(&mut store, 0, &tag("x", 1)).unwrap();
        TABLE.write(&mut store, 1, &tag("y", 2)).unwrap();

        TABLE.clear(&mut store, 0).unwrap();
        assert_eq!(TABLE.find(&store, "x").unwrap(), None);
        assert_eq!(TABLE.find(&store, "y").unwrap(), Some((1, tag("y", 2))));

        TABLE.clear_all(&mut store).unwrap();
        assert_eq!(TABLE.entries(&store).count(), 0);
    }
}
