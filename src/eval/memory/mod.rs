//! Allocation and memory management for the machine
pub mod collect;
pub mod header;
pub mod heap;
pub mod object;
