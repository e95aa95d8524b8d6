//! Object storage: generational handles and the arena that owns every live
//! instance.

use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::kind::{Kind, KindHash, Object};
use crate::world::World;

/// Handle to an object in a [`World`].
///
/// Layout: `u32 index` + `u32 generation`. A slot's generation is bumped
/// when its object is removed, so handles to destroyed objects never alias
/// a later occupant of the same slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId {
    index: u32,
    generation: u32,
}

impl ObjectId {
    /// Rebuild a handle from its raw parts.
    pub const fn from_raw(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl std::fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObjectId({}v{})", self.index, self.generation)
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Typed, nullable reference to another object.
///
/// This is the reflected form of a cross-object pointer: as a field it is
/// written as the target's location and resolved again on load.
pub struct ObjectRef<K> {
    id: Option<ObjectId>,
    _kind: PhantomData<fn() -> K>,
}

impl<K> ObjectRef<K> {
    pub const fn null() -> Self {
        Self {
            id: None,
            _kind: PhantomData,
        }
    }

    pub const fn new(id: ObjectId) -> Self {
        Self::from_id(Some(id))
    }

    pub const fn from_id(id: Option<ObjectId>) -> Self {
        Self {
            id,
            _kind: PhantomData,
        }
    }

    pub fn id(&self) -> Option<ObjectId> {
        self.id
    }

    pub fn is_null(&self) -> bool {
        self.id.is_none()
    }

    pub fn set(&mut self, id: Option<ObjectId>) {
        self.id = id;
    }
}

impl<K: Kind> ObjectRef<K> {
    /// The referenced object, if it is alive, stored in the arena and of kind `K`.
    pub fn get<'w>(&self, world: &'w World) -> Option<&'w K> {
        world.get::<K>(self.id?)
    }

    pub fn get_mut<'w>(&self, world: &'w mut World) -> Option<&'w mut K> {
        world.get_mut::<K>(self.id?)
    }
}

impl<K> Clone for ObjectRef<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for ObjectRef<K> {}

impl<K> Default for ObjectRef<K> {
    fn default() -> Self {
        Self::null()
    }
}

impl<K> PartialEq for ObjectRef<K> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<K> Eq for ObjectRef<K> {}

impl<K> Hash for ObjectRef<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<K> std::fmt::Debug for ObjectRef<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.id {
            Some(id) => write!(f, "ObjectRef({id})"),
            None => f.write_str("ObjectRef(null)"),
        }
    }
}

impl<K> From<ObjectId> for ObjectRef<K> {
    fn from(id: ObjectId) -> Self {
        Self::new(id)
    }
}

enum SlotState {
    Vacant,
    Occupied(Box<dyn Object>),
    /// Alive, but temporarily moved out (being decoded, or running in a
    /// system batch).
    Taken(KindHash),
}

struct Slot {
    generation: u32,
    state: SlotState,
}

/// Arena of live objects.
///
/// Removed slots go on a free list and are reused LIFO with a bumped
/// generation.
#[derive(Default)]
pub(crate) struct Objects {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    count: usize,
}

impl Objects {
    pub fn insert(&mut self, object: Box<dyn Object>) -> ObjectId {
        self.count += 1;
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.state = SlotState::Occupied(object);
            ObjectId::from_raw(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                state: SlotState::Occupied(object),
            });
            ObjectId::from_raw(index, 0)
        }
    }

    fn slot(&self, id: ObjectId) -> Option<&Slot> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
    }

    fn slot_mut(&mut self, id: ObjectId) -> Option<&mut Slot> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
    }

    /// Alive, whether stored or taken.
    pub fn contains(&self, id: ObjectId) -> bool {
        self.slot(id)
            .is_some_and(|slot| !matches!(slot.state, SlotState::Vacant))
    }

    pub fn kind_of(&self, id: ObjectId) -> Option<KindHash> {
        match &self.slot(id)?.state {
            SlotState::Vacant => None,
            SlotState::Occupied(object) => Some(object.kind_hash()),
            SlotState::Taken(kind) => Some(*kind),
        }
    }

    pub fn get(&self, id: ObjectId) -> Option<&dyn Object> {
        match &self.slot(id)?.state {
            SlotState::Occupied(object) => Some(object.as_ref()),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut dyn Object> {
        match &mut self.slot_mut(id)?.state {
            SlotState::Occupied(object) => Some(object.as_mut()),
            _ => None,
        }
    }

    /// Move an object out of its slot. The slot stays alive until the object
    /// is put back or the id is removed.
    pub fn take(&mut self, id: ObjectId) -> Option<Box<dyn Object>> {
        let slot = self.slot_mut(id)?;
        let SlotState::Occupied(object) = &slot.state else {
            return None;
        };
        let kind = object.kind_hash();
        match std::mem::replace(&mut slot.state, SlotState::Taken(kind)) {
            SlotState::Occupied(object) => Some(object),
            _ => None,
        }
    }

    /// Return a taken object. Returns `false` and drops the object if the id
    /// was removed in the meantime.
    pub fn put_back(&mut self, id: ObjectId, object: Box<dyn Object>) -> bool {
        match self.slot_mut(id) {
            Some(slot) if matches!(slot.state, SlotState::Taken(_)) => {
                slot.state = SlotState::Occupied(object);
                true
            }
            _ => false,
        }
    }

    /// Free the slot. Returns the object if it was stored (not taken).
    pub fn remove(&mut self, id: ObjectId) -> Option<Box<dyn Object>> {
        let slot = self.slot_mut(id)?;
        if matches!(slot.state, SlotState::Vacant) {
            return None;
        }
        let previous = std::mem::replace(&mut slot.state, SlotState::Vacant);
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(id.index);
        self.count -= 1;
        match previous {
            SlotState::Occupied(object) => Some(object),
            _ => None,
        }
    }

    /// Number of live objects, taken ones included.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Live stored objects in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &dyn Object)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| match &slot.state {
            SlotState::Occupied(object) => {
                Some((ObjectId::from_raw(i as u32, slot.generation), object.as_ref()))
            }
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Reflect;

    #[derive(Default, Reflect)]
    struct Counter {
        value: u32,
    }

    #[derive(Default, Reflect)]
    struct Marker {
        flag: bool,
    }

    fn counter(value: u32) -> Box<dyn Object> {
        Box::new(Counter { value })
    }

    #[test]
    fn insert_and_get() {
        let mut objects = Objects::default();
        let id = objects.insert(counter(3));
        assert!(objects.contains(id));
        assert_eq!(objects.kind_of(id), Some(Counter::HASH));
        assert_eq!(
            objects.get(id).unwrap().downcast_ref::<Counter>().unwrap().value,
            3
        );
        assert_eq!(objects.len(), 1);
    }

    #[test]
    fn removed_slot_is_reused_with_new_generation() {
        let mut objects = Objects::default();
        let first = objects.insert(counter(1));
        assert!(objects.remove(first).is_some());
        assert!(!objects.contains(first));

        let second = objects.insert(Box::new(Marker::default()));
        assert_eq!(second.index(), first.index());
        assert_ne!(second.generation(), first.generation());
        assert!(objects.get(first).is_none());
        assert_eq!(objects.kind_of(second), Some(Marker::HASH));
    }

    #[test]
    fn take_and_put_back() {
        let mut objects = Objects::default();
        let id = objects.insert(counter(5));

        let mut taken = objects.take(id).unwrap();
        assert!(objects.contains(id));
        assert!(objects.get(id).is_none());
        assert_eq!(objects.kind_of(id), Some(Counter::HASH));
        assert!(objects.take(id).is_none());

        taken.downcast_mut::<Counter>().unwrap().value = 6;
        assert!(objects.put_back(id, taken));
        assert_eq!(
            objects.get(id).unwrap().downcast_ref::<Counter>().unwrap().value,
            6
        );
    }

    #[test]
    fn put_back_after_remove_drops_object() {
        let mut objects = Objects::default();
        let id = objects.insert(counter(5));
        let taken = objects.take(id).unwrap();
        assert!(objects.remove(id).is_none());
        assert!(!objects.put_back(id, taken));
        assert_eq!(objects.len(), 0);
    }

    #[test]
    fn iter_skips_vacant_and_taken() {
        let mut objects = Objects::default();
        let a = objects.insert(counter(1));
        let b = objects.insert(counter(2));
        let c = objects.insert(counter(3));
        objects.remove(a);
        let _held = objects.take(c);

        let ids: Vec<_> = objects.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![b]);
    }

    #[test]
    fn object_ref_is_nullable() {
        let r: ObjectRef<Counter> = ObjectRef::default();
        assert!(r.is_null());
        let id = ObjectId::from_raw(1, 0);
        let r = ObjectRef::<Counter>::new(id);
        assert_eq!(r.id(), Some(id));
        assert_eq!(format!("{r:?}"), "ObjectRef(1v0)");
    }
}
