use thiserror::Error;

use crate::dom::tree::TreeError;

/// Reasons a captured interaction produces no step.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The host rejected a generated pattern
    #[error("tree query failed: {0}")]
    Query(#[from] TreeError),

    /// An element on the locator path could not be read
    #[error("selector has no context (element <{tag}>)")]
    NoContext { tag: String },

    /// A finalization segment matched nothing under its anchor
    #[error("selector no match: '{segment}' under '{anchor}'")]
    NoMatch { segment: String, anchor: String },

    /// No level of the ladder resolved to the target alone
    #[error("no unique locator found, last tried '{selector}'")]
    NotUnique { selector: String },

    /// The document has no body to anchor an indexed path
    #[error("document has no body element")]
    NoBody,
}
