pub mod memory;
pub mod tree;
pub mod xpath;
