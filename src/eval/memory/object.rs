//! Heap objects and the handles that refer to them
//!
//! An object is either a scalar carrying an integer or a composite
//! carrying two edges to other objects. Edges are plain handles and
//! do not own their targets: the heap owns every object, which is what
//! lets composites form cycles.

use std::{convert::TryFrom, fmt};

use crate::eval::error::ExecutionError;

use super::header::AllocHeader;

/// The two object shapes supported by the heap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Kind {
    Scalar = 0,
    Composite = 1,
}

impl TryFrom<u8> for Kind {
    type Error = ExecutionError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(Kind::Scalar),
            1 => Ok(Kind::Composite),
            _ => Err(ExecutionError::UnknownKind(tag)),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Scalar => write!(f, "scalar"),
            Kind::Composite => write!(f, "composite"),
        }
    }
}

/// Handle to an object in the heap
///
/// The generation distinguishes successive occupants of the same heap
/// slot, so a handle kept past its object's collection is detected as
/// dangling rather than silently aliasing a newer object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjRef {
    index: u32,
    generation: u32,
}

impl ObjRef {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        ObjRef { index, generation }
    }

    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

/// A node in the heap graph
#[derive(Debug, Clone)]
pub struct Object {
    header: AllocHeader,
    value: i64,
    first: Option<ObjRef>,
    second: Option<ObjRef>,
    /// Next entry in the allocation registry (not a graph edge)
    registry_next: Option<ObjRef>,
}

impl Object {
    /// A fresh, unmarked object with zeroed payload and no children
    pub fn new(kind: Kind) -> Self {
        Object {
            header: AllocHeader::new(kind as u8),
            value: 0,
            first: None,
            second: None,
            registry_next: None,
        }
    }

    /// Decode the kind from the header tag
    pub fn kind(&self) -> Result<Kind, ExecutionError> {
        Kind::try_from(self.header.tag())
    }

    /// Fail unless this object is of the `expected` kind
    pub fn expect(&self, expected: Kind) -> Result<(), ExecutionError> {
        let found = self.kind()?;
        if found == expected {
            Ok(())
        } else {
            Err(ExecutionError::TypeMismatch { expected, found })
        }
    }

    /// Integer payload of a scalar
    pub fn value(&self) -> Result<i64, ExecutionError> {
        self.expect(Kind::Scalar)?;
        Ok(self.value)
    }

    pub fn set_value(&mut self, value: i64) -> Result<(), ExecutionError> {
        self.expect(Kind::Scalar)?;
        self.value = value;
        Ok(())
    }

    /// The two edges of a composite
    pub fn children(&self) -> Result<(Option<ObjRef>, Option<ObjRef>), ExecutionError> {
        self.expect(Kind::Composite)?;
        Ok((self.first, self.second))
    }

    pub fn set_children(&mut self, first: ObjRef, second: ObjRef) -> Result<(), ExecutionError> {
        self.expect(Kind::Composite)?;
        self.first = Some(first);
        self.second = Some(second);
        Ok(())
    }

    /// Edges to trace; empty for scalars
    pub fn edges(&self) -> impl Iterator<Item = ObjRef> {
        let edges = match self.kind() {
            Ok(Kind::Composite) => [self.first, self.second],
            _ => [None, None],
        };
        edges.into_iter().flatten()
    }

    pub fn is_marked(&self) -> bool {
        self.header.is_marked()
    }

    pub(crate) fn mark(&mut self) {
        self.header.mark()
    }

    pub(crate) fn unmark(&mut self) {
        self.header.unmark()
    }

    pub(crate) fn registry_next(&self) -> Option<ObjRef> {
        self.registry_next
    }

    pub(crate) fn set_registry_next(&mut self, next: Option<ObjRef>) {
        self.registry_next = next;
    }
}
