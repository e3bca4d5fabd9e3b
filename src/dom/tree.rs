use std::fmt;

use thiserror::Error;

/// Element categories the context extractor knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementCategory {
    Input,
    Select,
    TextArea,
    Button,
    Image,
    /// Any other HTML element
    Html,
    Svg,
    MathMl,
}

impl ElementCategory {
    /// Whether the element derives from HTMLElement (text capture applies).
    pub fn is_html(self) -> bool {
        !matches!(self, ElementCategory::Svg | ElementCategory::MathMl)
    }
}

/// Point-in-time view of one element, read straight from the live tree.
///
/// Absent attributes are empty strings. `category` is `None` for nodes the
/// host cannot classify (foreign XML, processing instructions, ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeView {
    pub category: Option<ElementCategory>,
    /// Lowercased tag name
    pub tag: String,
    pub id: String,
    pub classes: Vec<String>,
    /// Live `name` property (form controls only)
    pub name_property: String,
    /// Declared `name` attribute
    pub name_attribute: String,
    pub input_type: String,
    /// Live value (`value` property for controls)
    pub value: String,
    pub aria_label: String,
    /// `data-id` attribute
    pub data_id: String,
    /// Direct text children in document order, untrimmed
    pub text_nodes: Vec<String>,
    /// Selected file paths of a file input
    pub files: Vec<String>,
    /// Bounding box origin (left, top) in client coordinates
    pub origin: (f64, f64),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid path pattern '{pattern}': {reason}")]
pub struct TreeError {
    pub pattern: String,
    pub reason: String,
}

/// Query capability supplied by the host document.
///
/// Every call reads the tree as it is right now; nothing is cached.
pub trait LiveTree {
    type Node: Copy + Eq + fmt::Debug;

    /// Evaluate a structural path pattern. Relative patterns (`.//x`) are
    /// evaluated against `scope`, or the document when `scope` is `None`.
    /// Matches come back in document order.
    fn query(&self, pattern: &str, scope: Option<Self::Node>) -> Result<Vec<Self::Node>, TreeError>;

    /// Read an element. `None` when the node is not an element.
    fn view(&self, node: Self::Node) -> Option<NodeView>;

    /// Parent node, if that parent is an element.
    fn parent_element(&self, node: Self::Node) -> Option<Self::Node>;

    /// Element siblings preceding `node`, nearest first.
    fn previous_element_siblings(&self, node: Self::Node) -> Vec<Self::Node>;

    fn body(&self) -> Option<Self::Node>;
}
