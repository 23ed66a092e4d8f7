//! Display forms for objects and the stack and heap dumps
//!
//! Rendering follows composite edges with an explicit work stack. Each
//! display or dump keeps the set of composites it has already written,
//! and any later reference to one of them (shared or cyclic) is printed
//! as a back-reference `<#i.g>` instead of being expanded again.

use std::collections::HashSet;
use std::fmt::{self, Display};

use super::{
    machine::stack::RootStack,
    memory::{
        heap::Heap,
        object::{Kind, ObjRef},
    },
};

/// Pending output while walking an object graph
enum Step {
    Edge(Option<ObjRef>),
    Text(&'static str),
}

/// Composites already written by one display or dump
#[derive(Default)]
struct Renderer {
    seen: HashSet<ObjRef>,
}

impl Renderer {
    /// Write `root` in full, then its children unless already written
    fn render(&mut self, f: &mut fmt::Formatter<'_>, heap: &Heap, root: ObjRef) -> fmt::Result {
        if !self.open(f, heap, root, true)? {
            return Ok(());
        }

        let mut work = vec![];
        self.push_children(heap, root, &mut work);

        while let Some(step) = work.pop() {
            match step {
                Step::Text(text) => f.write_str(text)?,
                Step::Edge(None) => f.write_str("nil")?,
                Step::Edge(Some(obj)) => {
                    if self.open(f, heap, obj, false)? {
                        self.push_children(heap, obj, &mut work);
                    }
                }
            }
        }

        Ok(())
    }

    /// Write a leaf form for `obj`, or the opening of a composite
    ///
    /// Returns true when the composite's children still need writing.
    fn open(
        &mut self,
        f: &mut fmt::Formatter<'_>,
        heap: &Heap,
        obj: ObjRef,
        root: bool,
    ) -> Result<bool, fmt::Error> {
        let object = match heap.get(obj) {
            Ok(object) => object,
            Err(_) => {
                write!(f, "<dangling {obj}>")?;
                return Ok(false);
            }
        };

        match object.kind() {
            Ok(Kind::Scalar) => {
                write!(f, "{}", object.value().unwrap_or_default())?;
                Ok(false)
            }
            Ok(Kind::Composite) => {
                if !self.seen.insert(obj) && !root {
                    write!(f, "<{obj}>")?;
                    Ok(false)
                } else {
                    f.write_str("(")?;
                    Ok(true)
                }
            }
            Err(e) => {
                write!(f, "<{e}>")?;
                Ok(false)
            }
        }
    }

    fn push_children(&self, heap: &Heap, obj: ObjRef, work: &mut Vec<Step>) {
        let (first, second) = heap
            .get(obj)
            .and_then(|object| object.children())
            .unwrap_or((None, None));
        work.push(Step::Text(")"));
        work.push(Step::Edge(second));
        work.push(Step::Text(", "));
        work.push(Step::Edge(first));
    }
}

/// Renders an object graph as nested pairs: `(1, (2, 3))`
pub struct ObjectDisplay<'heap> {
    heap: &'heap Heap,
    obj: ObjRef,
}

impl<'heap> ObjectDisplay<'heap> {
    pub fn new(heap: &'heap Heap, obj: ObjRef) -> Self {
        ObjectDisplay { heap, obj }
    }
}

impl Display for ObjectDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Renderer::default().render(f, self.heap, self.obj)
    }
}

/// The operand stack, top first
pub struct StackDump<'vm> {
    stack: &'vm RootStack,
    heap: &'vm Heap,
}

impl<'vm> StackDump<'vm> {
    pub fn new(stack: &'vm RootStack, heap: &'vm Heap) -> Self {
        StackDump { stack, heap }
    }
}

impl Display for StackDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut renderer = Renderer::default();
        writeln!(f, "---Start Stack Dump---")?;
        let depth = self.stack.len();
        for (i, obj) in self.stack.peek_all().enumerate() {
            write!(f, "{}: ", depth - 1 - i)?;
            renderer.render(f, self.heap, obj)?;
            writeln!(f)?;
        }
        writeln!(f, "---End Stack Dump---")
    }
}

/// Every registered object in registry order
pub struct HeapDump<'heap> {
    heap: &'heap Heap,
}

impl<'heap> HeapDump<'heap> {
    pub fn new(heap: &'heap Heap) -> Self {
        HeapDump { heap }
    }
}

impl Display for HeapDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut renderer = Renderer::default();
        writeln!(f, "---Start Memory Dump---")?;
        writeln!(f, "Num. of objects: {}", self.heap.live())?;
        writeln!(f, "Max objects: {}", self.heap.threshold())?;
        for (obj, _) in self.heap.iter() {
            write!(f, "{obj}: ")?;
            renderer.render(f, self.heap, obj)?;
            writeln!(f)?;
        }
        writeln!(f, "---End Memory Dump---")
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    fn scalar(heap: &mut Heap, value: i64) -> ObjRef {
        let obj = heap.register(Kind::Scalar);
        heap.get_mut(obj).unwrap().set_value(value).unwrap();
        obj
    }

    #[test]
    pub fn test_render_nested() {
        let mut heap = Heap::new();
        let one = scalar(&mut heap, 1);
        let two = scalar(&mut heap, 2);
        let pair = heap.register(Kind::Composite);
        heap.get_mut(pair).unwrap().set_children(one, two).unwrap();
        let outer = heap.register(Kind::Composite);
        heap.get_mut(outer).unwrap().set_children(pair, pair).unwrap();

        assert_eq!(ObjectDisplay::new(&heap, one).to_string(), "1");
        assert_eq!(ObjectDisplay::new(&heap, pair).to_string(), "(1, 2)");
        assert_eq!(
            ObjectDisplay::new(&heap, outer).to_string(),
            format!("((1, 2), <{pair}>)")
        );
    }

    #[test]
    pub fn test_render_back_references_cycles() {
        let mut heap = Heap::new();
        let one = scalar(&mut heap, 1);
        let cell = heap.register(Kind::Composite);
        heap.get_mut(cell).unwrap().set_children(one, cell).unwrap();

        assert_eq!(
            ObjectDisplay::new(&heap, cell).to_string(),
            format!("(1, <{cell}>)")
        );
    }

    #[test]
    pub fn test_render_empty_and_dangling() {
        let mut heap = Heap::new();
        let empty = heap.register(Kind::Composite);
        assert_eq!(ObjectDisplay::new(&heap, empty).to_string(), "(nil, nil)");

        heap.unlink(empty, None);
        assert_eq!(
            ObjectDisplay::new(&heap, empty).to_string(),
            format!("<dangling {empty}>")
        );
    }

    #[test]
    pub fn test_dumps() {
        let mut heap = Heap::new();
        let mut stack = RootStack::default();
        let a = scalar(&mut heap, 5);
        let b = scalar(&mut heap, 6);
        stack.push(a).unwrap();
        stack.push(b).unwrap();

        let stack_dump = StackDump::new(&stack, &heap).to_string();
        assert_eq!(
            stack_dump,
            "---Start Stack Dump---\n1: 6\n0: 5\n---End Stack Dump---\n"
        );

        let heap_dump = HeapDump::new(&heap).to_string();
        assert!(heap_dump.contains("Num. of objects: 2\n"));
        assert!(heap_dump.contains("Max objects: 10\n"));
        let b_line = heap_dump.find(&format!("{b}: 6")).unwrap();
        let a_line = heap_dump.find(&format!("{a}: 5")).unwrap();
        assert!(b_line < a_line);
    }

    #[test]
    pub fn test_shared_graph_renders_each_composite_once() {
        let mut heap = Heap::new();
        let mut node = scalar(&mut heap, 7);
        for _ in 0..30 {
            let parent = heap.register(Kind::Composite);
            heap.get_mut(parent).unwrap().set_children(node, node).unwrap();
            node = parent;
        }

        let text = ObjectDisplay::new(&heap, node).to_string();
        assert_eq!(text.matches('(').count(), 30);
        assert!(text.len() < 30 * 32);

        let dump = HeapDump::new(&heap).to_string();
        assert_eq!(dump.lines().count(), 31 + 4);
        assert!(dump.len() < 31 * 64 + 128);
    }

    #[test]
    pub fn test_deep_chain_renders_without_recursion() {
        let mut heap = Heap::new();
        let mut stack = RootStack::default();
        let mut node = scalar(&mut heap, 0);
        for _ in 0..200_000 {
            let parent = heap.register(Kind::Composite);
            heap.get_mut(parent).unwrap().set_children(node, node).unwrap();
            node = parent;
        }
        stack.push(node).unwrap();

        let text = ObjectDisplay::new(&heap, node).to_string();
        assert!(text.starts_with("(("));
        assert_eq!(text.matches('(').count(), 200_000);

        let dump = HeapDump::new(&heap).to_string();
        assert_eq!(dump.lines().count(), 200_001 + 4);

        let stack_dump = StackDump::new(&stack, &heap).to_string();
        assert!(stack_dump.starts_with("---Start Stack Dump---\n0: (("));
    }

    #[test]
    pub fn test_stack_dump_shares_back_references() {
        let mut heap = Heap::new();
        let mut stack = RootStack::default();
        let one = scalar(&mut heap, 1);
        let pair = heap.register(Kind::Composite);
        heap.get_mut(pair).unwrap().set_children(one, one).unwrap();
        let outer = heap.register(Kind::Composite);
        heap.get_mut(outer).unwrap().set_children(pair, one).unwrap();
        stack.push(outer).unwrap();
        stack.push(pair).unwrap();

        assert_eq!(
            StackDump::new(&stack, &heap).to_string(),
            format!("---Start Stack Dump---\n1: (1, 1)\n0: (<{pair}>, 1)\n---End Stack Dump---\n")
        );
    }
}
