pub mod error;
pub mod machine;
pub mod memory;
pub mod render;
