//! Collector support
//!
//! A full stop-the-world mark and sweep. Marking traces from the roots
//! through composite edges; sweeping walks the allocation registry
//! once, unlinking everything left unmarked and clearing the marks of
//! survivors.
//!

use std::time::{Duration, Instant};

use itertools::Itertools;

use crate::eval::{
    machine::metrics::{Clock, ThreadOccupation},
    render::HeapDump,
};

use super::{heap::Heap, object::ObjRef};

/// Anything that holds references into the heap that must be traced
pub trait GcScannable {
    /// Mark directly referenced objects, returning those newly marked
    fn scan(&self, marker: &mut CollectorHeapView<'_>) -> Vec<ObjRef>;
}

impl GcScannable for [ObjRef] {
    fn scan(&self, marker: &mut CollectorHeapView<'_>) -> Vec<ObjRef> {
        self.iter().copied().filter(|obj| marker.mark(*obj)).collect()
    }
}

impl GcScannable for Vec<ObjRef> {
    fn scan(&self, marker: &mut CollectorHeapView<'_>) -> Vec<ObjRef> {
        self.as_slice().scan(marker)
    }
}

/// View of the heap available to the collector
pub struct CollectorHeapView<'guard> {
    heap: &'guard mut Heap,
}

impl<'guard> CollectorHeapView<'guard> {
    pub fn new(heap: &'guard mut Heap) -> Self {
        CollectorHeapView { heap }
    }

    /// Mark object if not already marked and return whether marked
    pub fn mark(&mut self, obj: ObjRef) -> bool {
        self.heap.mark(obj)
    }

    /// Mark the children of `obj`, returning those newly marked
    ///
    /// Children that are already marked are not returned, which is
    /// what terminates tracing on shared and cyclic structure.
    pub fn scan_object(&mut self, obj: ObjRef) -> Vec<ObjRef> {
        let edges: Vec<ObjRef> = match self.heap.get(obj) {
            Ok(object) => object.edges().collect(),
            Err(_) => vec![],
        };
        edges.into_iter().filter(|child| self.mark(*child)).collect()
    }

    /// Depth-first trace from the roots
    pub fn mark_from(&mut self, roots: &dyn GcScannable) -> usize {
        let mut grey = roots.scan(self);
        let mut marked = grey.len();

        while let Some(obj) = grey.pop() {
            let children = self.scan_object(obj);
            marked += children.len();
            grey.extend(children);
        }

        marked
    }

    /// Free every unmarked object and clear marks on survivors
    ///
    /// Single pass over the registry keeping a trailing predecessor so
    /// that each unlink is constant time.
    pub fn sweep(&mut self) -> usize {
        let mut freed = 0;
        let mut previous: Option<ObjRef> = None;
        let mut current = self.heap.first_object();

        while let Some(obj) = current {
            if self.heap.is_marked(obj) {
                self.heap.unmark(obj);
                previous = Some(obj);
                current = self.heap.registry_next(obj);
            } else {
                if let Ok(kind) = self.heap.get(obj).and_then(|object| object.kind()) {
                    log::trace!("freed {obj} {kind}");
                }
                current = self.heap.unlink(obj, previous);
                freed += 1;
            }
        }

        freed
    }
}

/// Outcome of a single collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionReport {
    /// Registered objects before the collection
    pub live_before: usize,
    /// Objects reached from the roots
    pub marked: usize,
    /// Objects unlinked and freed
    pub freed: usize,
    /// Registered objects after the collection
    pub live_after: usize,
    /// Threshold for the next collection
    pub threshold: usize,
    /// Wall time spent collecting
    pub elapsed: Duration,
}

/// Collect garbage, then reset the heap's threshold
///
/// `pending` is the number of allocations waiting on this collection
/// (zero for an on-demand collection).
pub fn collect(
    roots: &dyn GcScannable,
    heap: &mut Heap,
    clock: &mut Clock,
    pending: usize,
    dump_heap: bool,
) -> CollectionReport {
    let start = Instant::now();
    let live_before = heap.live();

    if dump_heap {
        eprintln!("GC!");
    }

    clock.switch(ThreadOccupation::CollectorMark);

    let mut heap_view = CollectorHeapView::new(heap);

    let marked = heap_view.mark_from(roots);

    if dump_heap {
        eprintln!("Heap after mark:\n\n{}", HeapDump::new(heap_view.heap));
    }

    clock.switch(ThreadOccupation::CollectorSweep);

    let freed = heap_view.sweep();

    heap.adapt_threshold(pending);

    if dump_heap {
        eprintln!("Heap after sweep:\n\n{}", HeapDump::new(heap));
    }

    clock.stop();

    let report = CollectionReport {
        live_before,
        marked,
        freed,
        live_after: heap.live(),
        threshold: heap.threshold(),
        elapsed: start.elapsed(),
    };

    log::debug!(
        "collected {} of {} objects, {} live, next collection at {}",
        report.freed,
        report.live_before,
        report.live_after,
        report.threshold
    );
    log::trace!(
        "survivors: [{}]",
        heap.iter().map(|(obj, _)| obj).join(", ")
    );

    report
}
