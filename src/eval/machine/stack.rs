//! The operand stack
//!
//! Doubles as the root set for garbage collection: anything on the
//! stack, and anything reachable from it, survives a collection.

use crate::eval::{
    error::ExecutionError,
    memory::{
        collect::{CollectorHeapView, GcScannable},
        object::ObjRef,
    },
};

/// Default operand stack capacity
pub const MAX_STACK_SIZE: usize = 256;

/// Bounded stack of object handles
#[derive(Debug, Clone)]
pub struct RootStack {
    slots: Vec<ObjRef>,
    capacity: usize,
}

impl Default for RootStack {
    fn default() -> Self {
        RootStack::with_capacity(MAX_STACK_SIZE)
    }
}

impl RootStack {
    pub fn with_capacity(capacity: usize) -> Self {
        RootStack {
            slots: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() >= self.capacity
    }

    pub fn push(&mut self, obj: ObjRef) -> Result<(), ExecutionError> {
        if self.is_full() {
            return Err(ExecutionError::StackOverflow(self.capacity));
        }
        self.slots.push(obj);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<ObjRef, ExecutionError> {
        self.slots.pop().ok_or(ExecutionError::StackUnderflow)
    }

    /// The top of the stack
    pub fn peek(&self) -> Result<ObjRef, ExecutionError> {
        self.peek_at(0)
    }

    /// The entry `depth` places below the top
    pub fn peek_at(&self, depth: usize) -> Result<ObjRef, ExecutionError> {
        self.slots
            .len()
            .checked_sub(depth + 1)
            .map(|i| self.slots[i])
            .ok_or(ExecutionError::StackUnderflow)
    }

    /// Occupied slots from top to bottom
    pub fn peek_all(&self) -> impl DoubleEndedIterator<Item = ObjRef> + ExactSizeIterator + '_ {
        self.slots.iter().rev().copied()
    }
}

/// Every stack entry is a root
impl GcScannable for RootStack {
    fn scan(&self, marker: &mut CollectorHeapView<'_>) -> Vec<ObjRef> {
        self.peek_all().filter(|obj| marker.mark(*obj)).collect()
    }
}
