pub mod attributes;
pub mod context;
pub mod error;
pub mod locator;
pub mod oracle;
pub mod recorder;
