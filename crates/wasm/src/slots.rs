//! Id table for programs handed out to JavaScript.
//!
//! JS gets a plain `u32` id per program. Ids are never reused, so a stale id
//! from a released program cannot alias a newer one. Once `u32::MAX` has been
//! handed out the table refuses new entries.

use std::collections::BTreeMap;

pub(crate) struct ProgramSlots<T> {
    next_id: Option<u32>,
    entries: BTreeMap<u32, T>,
}

impl<T> ProgramSlots<T> {
    pub(crate) fn new() -> Self {
        Self {
            next_id: Some(1),
            entries: BTreeMap::new(),
        }
    }

    #[cfg(test)]
    fn starting_at(id: u32) -> Self {
        Self {
            next_id: Some(id),
            entries: BTreeMap::new(),
        }
    }

    /// Stores `value` under a fresh id. Hands `value` back if the id space
    /// is used up.
    pub(crate) fn insert(&mut self, value: T) -> Result<u32, T> {
        let Some(id) = self.next_id else {
            return Err(value);
        };
        self.next_id = id.checked_add(1);
        self.entries.insert(id, value);
        Ok(id)
    }

    pub(crate) fn get(&self, id: u32) -> Option<&T> {
        self.entries.get(&id)
    }

    pub(crate) fn take(&mut self, id: u32) -> Option<T> {
        self.entries.remove(&id)
    }

    /// Empties the table, yielding every live entry.
    pub(crate) fn drain(&mut self) -> impl Iterator<Item = T> {
        std::mem::take(&mut self.entries).into_values()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_start_at_one_and_are_not_reused() {
        let mut slots = ProgramSlots::new();
        let a = slots.insert("a").unwrap();
        assert_eq!(a, 1);
        assert_eq!(slots.take(a), Some("a"));
        let b = slots.insert("b").unwrap();
        assert_ne!(a, b);
        assert_eq!(slots.get(a), None);
        assert_eq!(slots.get(b), Some(&"b"));
    }

    #[test]
    fn take_twice_is_none() {
        let mut slots = ProgramSlots::new();
        let id = slots.insert(7).unwrap();
        assert_eq!(slots.take(id), Some(7));
        assert_eq!(slots.take(id), None);
    }

    #[test]
    fn drain_empties_table() {
        let mut slots = ProgramSlots::new();
        slots.insert(1).unwrap();
        slots.insert(2).unwrap();
        let mut drained: Vec<_> = slots.drain().collect();
        drained.sort();
        assert_eq!(drained, vec![1, 2]);
        assert_eq!(slots.len(), 0);
    }

    #[test]
    fn exhausted_ids_are_refused_not_wrapped() {
        let mut slots = ProgramSlots::starting_at(u32::MAX);
        assert_eq!(slots.insert("last"), Ok(u32::MAX));
        slots.take(u32::MAX);
        assert_eq!(slots.insert("next"), Err("next"));
        assert_eq!(slots.get(1), None);
        assert_eq!(slots.len(), 0);
    }
}
