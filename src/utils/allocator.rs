use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Stable handle into an [`Arena`] with generation tracking so that a
/// handle to a removed slot can never alias a later occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct SlotId {
    pub index: usize,
    pub generation: u32,
}

impl SlotId {
    pub fn new(index: usize, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_null(&self) -> bool {
        self.index == usize::MAX
    }
}

impl Default for SlotId {
    fn default() -> Self {
        Self::new(usize::MAX, 0)
    }
}

/// Generational arena that hands out stable ids while preventing
/// use-after-free through stale handles.
pub struct Arena<T> {
    items: Vec<Option<T>>,
    generations: Vec<u32>,
    free_list: VecDeque<usize>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            generations: Vec::new(),
            free_list: VecDeque::new(),
            len: 0,
        }
    }

    pub fn insert(&mut self, item: T) -> SlotId {
        self.len += 1;
        if let Some(index) = self.free_list.pop_front() {
            let generation = self.generations[index];
            self.items[index] = Some(item);
            return SlotId::new(index, generation);
        }

        let index = self.items.len();
        self.items.push(Some(item));
        self.generations.push(0);
        SlotId::new(index, 0)
    }

    pub fn remove(&mut self, id: SlotId) -> Option<T> {
        if !self.is_valid(id) {
            return None;
        }
        let item = self.items[id.index()].take();
        if item.is_some() {
            self.generations[id.index()] += 1;
            self.free_list.push_back(id.index());
            self.len -= 1;
        }
        item
    }

    pub fn get(&self, id: SlotId) -> Option<&T> {
        if self.is_valid(id) {
            self.items.get(id.index()).and_then(|slot| slot.as_ref())
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        if self.is_valid(id) {
            self.items.get_mut(id.index()).and_then(|slot| slot.as_mut())
        } else {
            None
        }
    }

    pub fn is_valid(&self, id: SlotId) -> bool {
        !id.is_null()
            && id.index() < self.items.len()
            && self.generations[id.index()] == id.generation
            && self.items[id.index()].is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter().filter_map(|slot| slot.as_ref())
    }

    pub fn iter_with_ids(&self) -> impl Iterator<Item = (SlotId, &T)> {
        self.items.iter().enumerate().filter_map(|(index, slot)| {
            slot.as_ref()
                .map(|item| (SlotId::new(index, self.generations[index]), item))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get_round_trip() {
        let mut arena = Arena::new();
        let a = arena.insert("a");
        let b = arena.insert("b");

        assert_eq!(arena.get(a), Some(&"a"));
        assert_eq!(arena.get(b), Some(&"b"));
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn stale_handle_rejected_after_reuse() {
        let mut arena = Arena::new();
        let a = arena.insert(1);
        arena.remove(a);

        let b = arena.insert(2);
        assert_eq!(b.index(), a.index());
        assert_ne!(b.generation, a.generation);
        assert_eq!(arena.get(a), None);
        assert_eq!(arena.get(b), Some(&2));
    }

    #[test]
    fn null_id_is_never_valid() {
        let arena: Arena<u32> = Arena::new();
        assert!(!arena.is_valid(SlotId::default()));
    }
}
