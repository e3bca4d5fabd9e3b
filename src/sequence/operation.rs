use std::fmt;

use serde::{Deserialize, Serialize};

use crate::capture::attributes::RequiredItems;
use crate::capture::context::EventContext;

/// Step identifier, unique within one sequence. Assigned by the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(pub u32);

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Click,
    Change,
    Fill,
    Sleep,
    Screenshot,
    Check,
    Closetab,
    Closewin,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::Click => "click",
            EventType::Change => "change",
            EventType::Fill => "fill",
            EventType::Sleep => "sleep",
            EventType::Screenshot => "screenshot",
            EventType::Check => "check",
            EventType::Closetab => "closetab",
            EventType::Closewin => "closewin",
        }
    }
}

/// Which locators playback may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequiredSelectors {
    pub selector1: bool,
    pub selector2: bool,
}

impl Default for RequiredSelectors {
    fn default() -> Self {
        Self {
            selector1: true,
            selector2: true,
        }
    }
}

/// One replayable step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Producer build tag
    pub version: String,
    pub id: StepId,
    pub browser_no: u32,
    pub tab_no: u32,
    pub event_type: EventType,
    #[serde(default)]
    pub params: String,
    /// Absent only for synthetic steps
    #[serde(default)]
    pub context: Option<EventContext>,
    #[serde(default)]
    pub selector1: String,
    #[serde(default)]
    pub selector2: String,
    #[serde(default)]
    pub required_items: RequiredItems,
    #[serde(default)]
    pub required_selectors: RequiredSelectors,
    #[serde(default)]
    pub scripts: String,
}

impl Operation {
    /// A step with no target element (sleep, screenshot, check, close).
    pub fn synthetic(version: &str, event_type: EventType, browser_no: u32, tab_no: u32, params: &str) -> Self {
        Operation {
            version: version.to_string(),
            id: StepId(0),
            browser_no,
            tab_no,
            event_type,
            params: params.to_string(),
            context: None,
            selector1: String::new(),
            selector2: String::new(),
            required_items: RequiredItems::new(),
            required_selectors: RequiredSelectors::default(),
            scripts: String::new(),
        }
    }
}
