extern crate bitmaps;
extern crate indexmap;
extern crate itertools;
extern crate structopt;
extern crate thiserror;

pub mod driver;
pub mod eval;
