//! A small stack machine over a garbage collected heap
//!
//! The machine owns the heap and the operand stack. Every allocation
//! first consults the heap's collection policy and, if the threshold
//! has been reached, runs a full collection with the operand stack as
//! the root set before registering the new object.

use crate::eval::{
    error::ExecutionError,
    memory::{
        collect::{self, CollectionReport},
        heap::{Heap, HeapStats},
        object::{Kind, ObjRef, Object},
    },
    render::{HeapDump, ObjectDisplay, StackDump},
};

use super::{
    metrics::{Clock, Metrics, ThreadOccupation},
    stack::RootStack,
    VmSettings,
};

/// The machine
///
/// GC roots (outside heap, pointing in) are:
/// - stack
pub struct Vm {
    /// Objects and allocation registry
    heap: Heap,
    /// Operand stack
    stack: RootStack,
    /// Whether to dump the heap during collection
    dump_heap: bool,
    /// Metrics
    metrics: Metrics,
    /// Clock
    clock: Clock,
}

impl Default for Vm {
    fn default() -> Self {
        Vm::new(&VmSettings::default())
    }
}

impl Vm {
    pub fn new(settings: &VmSettings) -> Self {
        let mut clock = Clock::default();
        clock.switch(ThreadOccupation::Mutator);
        Vm {
            heap: Heap::with_threshold(settings.initial_threshold),
            stack: RootStack::with_capacity(settings.stack_size),
            dump_heap: settings.dump_heap,
            metrics: Metrics::default(),
            clock,
        }
    }

    /// Access the heap
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Access the operand stack
    pub fn stack(&self) -> &RootStack {
        &self.stack
    }

    /// Access the metrics (allocs, collections, etc.)
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Get heap statistics
    pub fn heap_stats(&self) -> HeapStats {
        self.heap.stats()
    }

    /// Return clock for access to GC timings
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Stop the clock, e.g. before reporting timings
    pub fn stop_clock(&mut self) {
        self.clock.stop();
    }

    /// Number of live objects
    pub fn live(&self) -> usize {
        self.heap.live()
    }

    /// Live object count at which the next allocation collects first
    pub fn threshold(&self) -> usize {
        self.heap.threshold()
    }

    /// Allocate a fresh object, collecting first if the policy says so
    ///
    /// The new object is not rooted; push it or link it from a rooted
    /// composite before the next allocation if it is to survive.
    pub fn allocate(&mut self, kind: Kind) -> ObjRef {
        if self.heap.policy_requires_collection() {
            self.collect(1);
        }
        self.metrics.alloc(1);
        let obj = self.heap.register(kind);
        log::trace!("allocated {kind} {obj}");
        obj
    }

    /// Run a collection now
    pub fn gc(&mut self) -> CollectionReport {
        self.collect(0)
    }

    fn collect(&mut self, pending: usize) -> CollectionReport {
        let report = collect::collect(
            &self.stack,
            &mut self.heap,
            &mut self.clock,
            pending,
            self.dump_heap,
        );
        self.clock.switch(ThreadOccupation::Mutator);
        self.metrics.collection(report.freed);
        report
    }

    pub fn object(&self, obj: ObjRef) -> Result<&Object, ExecutionError> {
        self.heap.get(obj)
    }

    /// Integer payload of a scalar
    pub fn value(&self, obj: ObjRef) -> Result<i64, ExecutionError> {
        self.heap.get(obj)?.value()
    }

    /// Edges of a composite
    pub fn children(&self, obj: ObjRef) -> Result<(Option<ObjRef>, Option<ObjRef>), ExecutionError> {
        self.heap.get(obj)?.children()
    }

    pub fn set_value(&mut self, obj: ObjRef, value: i64) -> Result<(), ExecutionError> {
        self.heap.get_mut(obj)?.set_value(value)
    }

    pub fn set_children(
        &mut self,
        obj: ObjRef,
        first: ObjRef,
        second: ObjRef,
    ) -> Result<(), ExecutionError> {
        self.heap.get(first)?;
        self.heap.get(second)?;
        self.heap.get_mut(obj)?.set_children(first, second)
    }

    /// Push an existing object
    pub fn push(&mut self, obj: ObjRef) -> Result<(), ExecutionError> {
        self.heap.get(obj)?;
        self.stack.push(obj)?;
        self.metrics.stack(self.stack.len());
        Ok(())
    }

    pub fn pop(&mut self) -> Result<ObjRef, ExecutionError> {
        self.stack.pop()
    }

    /// Kind of the object `depth` places below the top of the stack
    fn kind_at(&self, depth: usize) -> Result<Kind, ExecutionError> {
        self.heap.get(self.stack.peek_at(depth)?)?.kind()
    }

    fn expect_at(&self, depth: usize, expected: Kind) -> Result<(), ExecutionError> {
        let found = self.kind_at(depth)?;
        if found == expected {
            Ok(())
        } else {
            Err(ExecutionError::TypeMismatch { expected, found })
        }
    }

    pub fn push_scalar(&mut self, value: i64) -> Result<(), ExecutionError> {
        if self.stack.is_full() {
            return Err(ExecutionError::StackOverflow(self.stack.capacity()));
        }
        let obj = self.allocate(Kind::Scalar);
        self.set_value(obj, value)?;
        self.push(obj)
    }

    pub fn pop_scalar(&mut self) -> Result<i64, ExecutionError> {
        self.expect_at(0, Kind::Scalar)?;
        let obj = self.stack.pop()?;
        self.value(obj)
    }

    /// Replace the top two entries with a composite of them
    ///
    /// The composite is allocated while both operands are still on the
    /// stack so a collection triggered by the allocation cannot reclaim
    /// them. The top entry becomes `second`, the one below `first`.
    pub fn push_composite(&mut self) -> Result<(), ExecutionError> {
        self.stack.peek_at(1)?;
        let obj = self.allocate(Kind::Composite);
        let second = self.stack.pop()?;
        let first = self.stack.pop()?;
        self.set_children(obj, first, second)?;
        self.push(obj)
    }

    pub fn pop_composite(&mut self) -> Result<ObjRef, ExecutionError> {
        self.expect_at(0, Kind::Composite)?;
        self.stack.pop()
    }

    /// Replace the top two scalars with their sum
    pub fn add(&mut self) -> Result<(), ExecutionError> {
        self.expect_at(0, Kind::Scalar)?;
        self.expect_at(1, Kind::Scalar)?;
        let right = self.pop_scalar()?;
        let left = self.pop_scalar()?;
        self.push_scalar(left.wrapping_add(right))
    }

    /// Display form of an object
    pub fn display(&self, obj: ObjRef) -> ObjectDisplay<'_> {
        ObjectDisplay::new(&self.heap, obj)
    }

    pub fn dump_stack(&self) -> StackDump<'_> {
        StackDump::new(&self.stack, &self.heap)
    }

    pub fn dump_heap(&self) -> HeapDump<'_> {
        HeapDump::new(&self.heap)
    }
}
