//! End to end behaviour of the machine and its collector
use marksweep::eval::{
    error::ExecutionError,
    machine::{vm::Vm, VmSettings},
    memory::object::{Kind, ObjRef},
};

fn registry(vm: &Vm) -> Vec<ObjRef> {
    vm.heap().iter().map(|(obj, _)| obj).collect()
}

fn rendered(vm: &Vm) -> Vec<String> {
    registry(vm)
        .into_iter()
        .map(|obj| vm.display(obj).to_string())
        .collect()
}

#[test]
pub fn test_single_rooted_scalar() {
    let mut vm = Vm::default();
    vm.push_scalar(42).unwrap();
    vm.gc();

    let dump = vm.dump_heap().to_string();
    assert!(dump.contains("Num. of objects: 1\n"));
    assert_eq!(rendered(&vm), vec!["42"]);
}

#[test]
pub fn test_unrooted_scalar_is_reclaimed_beside_composite() {
    let mut vm = Vm::default();
    vm.push_scalar(1).unwrap();
    vm.push_scalar(2).unwrap();
    vm.push_composite().unwrap();
    let loose = vm.allocate(Kind::Scalar);
    vm.set_value(loose, 123).unwrap();

    vm.gc();

    assert_eq!(vm.live(), 3);
    let values = rendered(&vm);
    assert!(!values.contains(&"123".to_string()));
    assert!(values.contains(&"(1, 2)".to_string()));
    assert!(values.contains(&"1".to_string()));
    assert!(values.contains(&"2".to_string()));
}

#[test]
pub fn test_self_referential_composite() {
    let mut vm = Vm::default();
    let cell = vm.allocate(Kind::Composite);
    vm.set_children(cell, cell, cell).unwrap();
    vm.push(cell).unwrap();

    let report = vm.gc();

    assert_eq!(report.live_after, 1);
    assert_eq!(registry(&vm), vec![cell]);
    assert!(vm.dump_heap().to_string().contains(&format!("<{cell}>")));
}

#[test]
pub fn test_pop_from_empty_stack() {
    let mut vm = Vm::default();
    assert_eq!(vm.pop(), Err(ExecutionError::StackUnderflow));
}

#[test]
pub fn test_scalar_popped_as_composite() {
    let mut vm = Vm::default();
    vm.push_scalar(9).unwrap();
    assert!(matches!(
        vm.pop_composite(),
        Err(ExecutionError::TypeMismatch {
            expected: Kind::Composite,
            found: Kind::Scalar
        })
    ));
}

#[test]
#[cfg(not(feature = "gc-stress"))]
pub fn test_eleventh_allocation_collects_first() {
    let mut vm = Vm::new(&VmSettings::default().with_threshold(10));
    let garbage: Vec<_> = (0..10).map(|_| vm.allocate(Kind::Scalar)).collect();
    assert_eq!(vm.live(), 10);

    let fresh = vm.allocate(Kind::Scalar);

    assert_eq!(vm.live(), 1);
    assert_eq!(vm.threshold(), 2);
    assert_eq!(registry(&vm), vec![fresh]);
    assert!(garbage.iter().all(|g| !vm.heap().contains(*g)));
}

#[test]
pub fn test_reachability_is_preserved_across_many_collections() {
    let mut vm = Vm::new(&VmSettings::default().with_threshold(4));

    // build ((0, 1), ((2, 3), ...)) style structure while churning garbage
    for i in 0..50 {
        vm.push_scalar(i).unwrap();
        let loose = vm.allocate(Kind::Scalar);
        vm.set_value(loose, -1).unwrap();
        if vm.stack().len() >= 2 {
            vm.push_composite().unwrap();
        }
    }

    assert!(vm.metrics().collections() > 0);
    let root = vm.pop_composite().unwrap();
    vm.push(root).unwrap();

    vm.gc();
    assert_eq!(vm.threshold(), 2 * vm.live());
    assert!(vm.heap().iter().all(|(_, object)| !object.is_marked()));

    // 50 scalars and 49 composites survive; every loose scalar is gone
    assert_eq!(vm.live(), 99);
    assert!(!rendered(&vm).contains(&"-1".to_string()));

    // innermost pair is (0, 1)
    let mut cursor = root;
    while let Ok((Some(first), _)) = vm.children(cursor) {
        cursor = first;
    }
    assert_eq!(vm.value(cursor), Ok(0));
}

#[test]
pub fn test_collection_is_idempotent() {
    let mut vm = Vm::default();
    vm.push_scalar(1).unwrap();
    vm.push_scalar(2).unwrap();
    vm.push_composite().unwrap();
    vm.allocate(Kind::Composite);

    vm.gc();
    let first = registry(&vm);
    let report = vm.gc();

    assert_eq!(report.freed, 0);
    assert_eq!(registry(&vm), first);
}

#[test]
pub fn test_independent_machines() {
    let mut a = Vm::default();
    let mut b = Vm::default();
    a.push_scalar(1).unwrap();
    b.allocate(Kind::Scalar);
    b.gc();
    assert_eq!(a.live(), 1);
    assert_eq!(b.live(), 0);
}

#[test]
pub fn test_traced_collection_of_long_garbage_chain() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Trace)
        .try_init();

    let mut vm = Vm::new(&VmSettings::default().with_threshold(usize::MAX));
    vm.push_scalar(1).unwrap();
    let mut head = vm.allocate(Kind::Scalar);
    for _ in 0..200_000 {
        let parent = vm.allocate(Kind::Composite);
        vm.set_children(parent, head, head).unwrap();
        head = parent;
    }

    let report = vm.gc();

    assert_eq!(report.freed, 200_001);
    assert_eq!(vm.live(), 1);
}

#[test]
pub fn test_heap_dumps_during_collection_of_shared_graph() {
    let mut vm = Vm::new(&VmSettings::default().with_heap_dumps());
    vm.push_scalar(3).unwrap();
    for _ in 0..30 {
        let top = vm.stack().peek().unwrap();
        vm.push(top).unwrap();
        vm.push_composite().unwrap();
    }

    vm.gc();

    assert_eq!(vm.live(), 31);
    let dump = vm.dump_stack().to_string();
    assert_eq!(dump.matches('(').count(), 30);
    assert!(dump.len() < 30 * 32);
}
