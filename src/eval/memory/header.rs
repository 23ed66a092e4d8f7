//! Header for all heap objects
//!
//! Carries the mark bit used by the collector and the raw kind tag of
//! the object.

use bitmaps::Bitmap;

#[derive(Debug, Default, Clone, Copy)]
pub struct HeaderBits(Bitmap<1>);

const MARK_BIT: usize = 0;

impl HeaderBits {
    fn mark(&mut self) {
        self.0.set(MARK_BIT, true);
    }

    fn unmark(&mut self) {
        self.0.set(MARK_BIT, false);
    }

    fn is_marked(&self) -> bool {
        self.0.get(MARK_BIT)
    }
}

/// Object Header
///
/// The mark bit is only ever set while a collection is running; sweep
/// clears it again on every survivor.
#[derive(Debug, Clone, Copy)]
pub struct AllocHeader {
    /// Header bits for object state
    bits: HeaderBits,
    /// Raw tag of the object kind
    tag: u8,
}

impl AllocHeader {
    pub fn new(tag: u8) -> Self {
        AllocHeader {
            bits: HeaderBits::default(),
            tag,
        }
    }

    pub fn mark(&mut self) {
        self.bits.mark()
    }

    pub fn unmark(&mut self) {
        self.bits.unmark()
    }

    pub fn is_marked(&self) -> bool {
        self.bits.is_marked()
    }

    pub fn tag(&self) -> u8 {
        self.tag
    }
}
