pub mod host;
pub mod message;
