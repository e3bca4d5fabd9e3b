pub mod edit;
pub mod error;
pub mod manager;
pub mod operation;
pub mod persist;
pub mod render;
pub mod settings;
pub mod step_sequence;
