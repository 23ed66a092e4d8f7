//! The object heap and its allocation registry
//!
//! Objects live in a slot arena. Every allocated object is also
//! threaded onto an intrusive singly-linked registry (most recently
//! allocated first) which the sweep phase walks to find garbage.
//! Freed slots are recycled through a free list with a bumped
//! generation so that stale handles can be told apart from live ones.

use std::fmt::Debug;

use crate::eval::error::ExecutionError;

use super::object::{Kind, ObjRef, Object};

/// Live object count at which the first collection is triggered
pub const INITIAL_GC_THRESHOLD: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapStats {
    /// Objects currently registered
    pub live: usize,
    /// Live count at which the next allocation collects first
    pub threshold: usize,
    /// Objects registered since heap creation
    pub allocated: u64,
    /// Objects freed by sweep since heap creation
    pub freed: u64,
    /// Arena slots (occupied or free)
    pub slots: usize,
    /// Arena slots awaiting reuse
    pub free_slots: usize,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    object: Option<Object>,
}

/// Heap of objects plus the allocation registry
pub struct Heap {
    slots: Vec<Slot>,
    /// Indexes of vacated slots
    free: Vec<u32>,
    /// Registry head
    first_object: Option<ObjRef>,
    /// Registered object count
    live: usize,
    /// Collect before allocating once live reaches this
    threshold: usize,
    allocated: u64,
    freed: u64,
}

impl Default for Heap {
    fn default() -> Self {
        Heap::new()
    }
}

impl Debug for Heap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Heap")
            .field("live", &self.live)
            .field("threshold", &self.threshold)
            .field("registry", &self.iter().map(|(r, _)| r).collect::<Vec<_>>())
            .finish()
    }
}

impl Heap {
    pub fn new() -> Self {
        Heap::with_threshold(INITIAL_GC_THRESHOLD)
    }

    /// A heap that first collects when `threshold` objects are live
    pub fn with_threshold(threshold: usize) -> Self {
        Heap {
            slots: vec![],
            free: vec![],
            first_object: None,
            live: 0,
            threshold,
            allocated: 0,
            freed: 0,
        }
    }

    pub fn stats(&self) -> HeapStats {
        HeapStats {
            live: self.live,
            threshold: self.threshold,
            allocated: self.allocated,
            freed: self.freed,
            slots: self.slots.len(),
            free_slots: self.free.len(),
        }
    }

    /// Number of registered objects
    pub fn live(&self) -> usize {
        self.live
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Whether the next allocation must be preceded by a collection
    pub fn policy_requires_collection(&self) -> bool {
        cfg!(feature = "gc-stress") || self.live >= self.threshold
    }

    /// Reset the threshold to double the live set
    ///
    /// `pending` counts allocations that triggered the collection and
    /// are registered straight after it. Counting them here keeps
    /// `threshold == 2 * live` once they land, so ten garbage objects
    /// followed by an eleventh allocation leave one object live and a
    /// threshold of two.
    pub fn adapt_threshold(&mut self, pending: usize) {
        self.threshold = 2 * (self.live + pending);
    }

    /// Create a new object at the head of the registry
    pub fn register(&mut self, kind: Kind) -> ObjRef {
        let mut object = Object::new(kind);
        object.set_registry_next(self.first_object);

        let handle = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                debug_assert!(slot.object.is_none());
                slot.object = Some(object);
                ObjRef::new(index, slot.generation)
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    object: Some(object),
                });
                ObjRef::new(index, 0)
            }
        };

        self.first_object = Some(handle);
        self.live += 1;
        self.allocated += 1;
        handle
    }

    /// Whether `handle` refers to a registered object
    pub fn contains(&self, handle: ObjRef) -> bool {
        self.get(handle).is_ok()
    }

    pub fn get(&self, handle: ObjRef) -> Result<&Object, ExecutionError> {
        match self.slots.get(handle.index()) {
            Some(Slot {
                generation,
                object: Some(object),
            }) if *generation == handle.generation() => Ok(object),
            _ => Err(ExecutionError::DanglingReference(handle)),
        }
    }

    pub fn get_mut(&mut self, handle: ObjRef) -> Result<&mut Object, ExecutionError> {
        match self.slots.get_mut(handle.index()) {
            Some(Slot {
                generation,
                object: Some(object),
            }) if *generation == handle.generation() => Ok(object),
            _ => Err(ExecutionError::DanglingReference(handle)),
        }
    }

    /// Head of the registry
    pub fn first_object(&self) -> Option<ObjRef> {
        self.first_object
    }

    /// Successor of `handle` in the registry
    pub fn registry_next(&self, handle: ObjRef) -> Option<ObjRef> {
        self.entry(handle).registry_next()
    }

    /// Iterate over registered objects in registry order
    pub fn iter(&self) -> RegistryIter<'_> {
        RegistryIter {
            heap: self,
            current: self.first_object,
        }
    }

    /// Remove `handle` from the registry and free it
    ///
    /// `predecessor` must be the registry entry immediately before
    /// `handle`, or `None` if `handle` is the head. Returns the
    /// successor so a caller walking the registry can continue from it.
    pub fn unlink(&mut self, handle: ObjRef, predecessor: Option<ObjRef>) -> Option<ObjRef> {
        let next = self.entry(handle).registry_next();

        match predecessor {
            None => {
                debug_assert_eq!(self.first_object, Some(handle));
                self.first_object = next;
            }
            Some(prev) => {
                let prev = self.entry_mut(prev);
                debug_assert_eq!(prev.registry_next(), Some(handle));
                prev.set_registry_next(next);
            }
        }

        let slot = &mut self.slots[handle.index()];
        slot.object = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index() as u32);

        self.live -= 1;
        self.freed += 1;
        next
    }

    /// Mark object if not already marked and return whether marked
    pub fn mark(&mut self, handle: ObjRef) -> bool {
        match self.get_mut(handle) {
            Ok(object) if !object.is_marked() => {
                object.mark();
                true
            }
            Ok(_) => false,
            Err(_) => {
                debug_assert!(false, "marking dangling reference {handle}");
                false
            }
        }
    }

    pub fn is_marked(&self, handle: ObjRef) -> bool {
        self.get(handle).map(Object::is_marked).unwrap_or(false)
    }

    pub fn unmark(&mut self, handle: ObjRef) {
        if let Ok(object) = self.get_mut(handle) {
            object.unmark();
        }
    }

    /// Registry-internal access; registry links are always live
    fn entry(&self, handle: ObjRef) -> &Object {
        match self.get(handle) {
            Ok(object) => object,
            Err(e) => unreachable!("registry corrupted: {e}"),
        }
    }

    fn entry_mut(&mut self, handle: ObjRef) -> &mut Object {
        match self.get_mut(handle) {
            Ok(object) => object,
            Err(e) => unreachable!("registry corrupted: {e}"),
        }
    }
}

/// Walks the registry from the head following the intrusive links
pub struct RegistryIter<'heap> {
    heap: &'heap Heap,
    current: Option<ObjRef>,
}

impl<'heap> Iterator for RegistryIter<'heap> {
    type Item = (ObjRef, &'heap Object);

    fn next(&mut self) -> Option<Self::Item> {
        let handle = self.current?;
        let object = self.heap.entry(handle);
        self.current = object.registry_next();
        Some((handle, object))
    }
}
