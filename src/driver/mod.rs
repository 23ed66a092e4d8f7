//! Command line driver for the demonstration machine
pub mod demo;
pub mod error;
pub mod options;
pub mod statistics;
