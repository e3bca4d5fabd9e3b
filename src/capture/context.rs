use serde::{Deserialize, Serialize};

use crate::dom::tree::{ElementCategory, LiveTree, NodeView};
use crate::sequence::operation::EventType;

/// Tags whose incidental text never identifies them.
const TEXT_IGNORED_TAGS: &[&str] = &["form"];

/// Input types whose value is system-controlled and safe to bake into a locator.
const SYSTEM_VALUE_TYPES: &[&str] = &["checkbox", "radio", "button", "submit", "image", "reset"];

/// Input types that report a typed value on change.
const FILLABLE_INPUT_TYPES: &[&str] = &[
    "text", "password", "email", "number", "tel", "url", "search", "date", "time",
    "datetime-local", "month", "week", "color", "file", "range",
];

/// Normalized attribute snapshot of an interaction target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventContext {
    pub tag_name: String,
    pub id: String,
    pub text: String,
    pub name: String,
    pub input_type: String,
    pub value: String,
    /// aria-label
    pub label: String,
    pub data_id: String,
    pub offset_x: f64,
    pub offset_y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    Click,
    Change,
}

/// A raw interaction as delivered by the host listener.
#[derive(Debug, Clone, Copy)]
pub struct Interaction<N> {
    pub kind: InteractionKind,
    pub target: N,
    /// Pointer position in client coordinates, for pointer interactions
    pub pointer: Option<(f64, f64)>,
}

impl<N> Interaction<N> {
    pub fn click(target: N, x: f64, y: f64) -> Self {
        Interaction {
            kind: InteractionKind::Click,
            target,
            pointer: Some((x, y)),
        }
    }

    pub fn change(target: N) -> Self {
        Interaction {
            kind: InteractionKind::Change,
            target,
            pointer: None,
        }
    }
}

/// Build the context for a node, or `None` if it is not a recognized element.
pub fn context_from_view(view: &NodeView) -> Option<EventContext> {
    let category = view.category?;
    let mut ctx = EventContext {
        tag_name: view.tag.to_lowercase(),
        id: view.id.clone(),
        ..Default::default()
    };

    if category == ElementCategory::Input {
        ctx.input_type = view.input_type.clone();
    }

    if category.is_html() && !TEXT_IGNORED_TAGS.contains(&ctx.tag_name.as_str()) {
        ctx.text = view
            .text_nodes
            .iter()
            .map(|t| t.trim())
            .find(|t| !t.is_empty())
            .unwrap_or_default()
            .to_string();
    }

    ctx.name = if view.name_property.is_empty() {
        view.name_attribute.clone()
    } else {
        view.name_property.clone()
    };

    let system_controlled = SYSTEM_VALUE_TYPES.contains(&ctx.input_type.as_str())
        || ctx.tag_name == "option"
        || ctx.tag_name == "button";
    if system_controlled {
        ctx.value = view.value.clone();
    }

    ctx.label = view.aria_label.clone();
    ctx.data_id = view.data_id.clone();
    Some(ctx)
}

/// Read the interaction target and fill in the click offset.
pub fn extract_context<T: LiveTree>(tree: &T, interaction: &Interaction<T::Node>) -> Option<EventContext> {
    let view = tree.view(interaction.target)?;
    let mut ctx = context_from_view(&view)?;
    if let (InteractionKind::Click, Some((x, y))) = (interaction.kind, interaction.pointer) {
        ctx.offset_x = x - view.origin.0;
        ctx.offset_y = y - view.origin.1;
    }
    Some(ctx)
}

/// Map an interaction to `(eventType, params)`, or `None` when it is not
/// worth recording (changes on checkboxes, radios, and other clicked-only
/// controls are captured by their click).
pub fn classify_interaction(view: &NodeView, kind: InteractionKind) -> Option<(EventType, String)> {
    if kind == InteractionKind::Click {
        return Some((EventType::Click, String::new()));
    }

    match view.tag.as_str() {
        "textarea" => Some((EventType::Fill, view.value.clone())),
        "select" => Some((EventType::Change, view.value.clone())),
        "input" => {
            let input_type = view.input_type.as_str();
            if !FILLABLE_INPUT_TYPES.contains(&input_type) {
                return None;
            }
            let value = match input_type {
                "number" | "range" => numeric_value(&view.value),
                "file" if !view.files.is_empty() => view.files.join(","),
                _ => view.value.clone(),
            };
            Some((EventType::Fill, value))
        }
        _ => None,
    }
}

fn numeric_value(raw: &str) -> String {
    match raw.trim().parse::<f64>() {
        Ok(n) if !raw.trim().is_empty() => n.to_string(),
        _ => "NaN".to_string(),
    }
}
