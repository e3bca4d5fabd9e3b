use std::collections::HashMap;

use serde::Deserialize;

use crate::capture::attributes::{candidate, required_items_from_flags, AttrKey};
use crate::capture::context::EventContext;
use crate::capture::locator::ANY_DESCENDANT;
use crate::sequence::operation::{Operation, RequiredSelectors, StepId};

/// Partial context posted by the edit form. `None` keeps the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContextPatch {
    pub tag_name: Option<String>,
    pub id: Option<String>,
    pub text: Option<String>,
    pub name: Option<String>,
    pub input_type: Option<String>,
    pub value: Option<String>,
    pub label: Option<String>,
    pub data_id: Option<String>,
}

impl ContextPatch {
    /// Shallow merge; patch fields win.
    pub fn apply(&self, base: &EventContext) -> EventContext {
        let pick = |patch: &Option<String>, current: &String| patch.clone().unwrap_or_else(|| current.clone());
        EventContext {
            tag_name: pick(&self.tag_name, &base.tag_name),
            id: pick(&self.id, &base.id),
            text: pick(&self.text, &base.text),
            name: pick(&self.name, &base.name),
            input_type: pick(&self.input_type, &base.input_type),
            value: pick(&self.value, &base.value),
            label: pick(&self.label, &base.label),
            data_id: pick(&self.data_id, &base.data_id),
            offset_x: base.offset_x,
            offset_y: base.offset_y,
        }
    }
}

/// Fields posted by the step edit form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditForm {
    pub id: StepId,
    #[serde(default)]
    pub context: ContextPatch,
    /// Per-attribute enable checkboxes
    #[serde(default)]
    pub enabled: HashMap<AttrKey, bool>,
    #[serde(default)]
    pub selector2: String,
    #[serde(default)]
    pub required_selectors: Option<RequiredSelectors>,
    #[serde(default)]
    pub params: Option<String>,
}

/// Replace the last structural segment of `existing` with `leaf`, keeping
/// everything up to and including the final any-descendant separator.
pub fn replace_leaf_segment(existing: &str, leaf: &str) -> String {
    match last_separator(existing) {
        Some(pos) => format!("{}{}", &existing[..pos + ANY_DESCENDANT.len()], leaf),
        None => format!("{}{}", ANY_DESCENDANT, leaf),
    }
}

/// Byte offset of the last separator outside quoted literals.
fn last_separator(selector: &str) -> Option<usize> {
    let bytes = selector.as_bytes();
    let sep = ANY_DESCENDANT.as_bytes();
    let mut quote: Option<u8> = None;
    let mut last = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if bytes[i..].starts_with(sep) => {
                last = Some(i);
                i += sep.len();
                continue;
            }
            None => {}
        }
        i += 1;
    }
    last
}

/// Produce the edited copy of `op`. The caller has already checked that
/// `op` carries a context.
pub fn apply_edit(op: &Operation, base: &EventContext, form: &EditForm) -> Operation {
    let ctx = form.context.apply(base);
    let items = required_items_from_flags(&ctx, &form.enabled);
    let leaf = candidate(&ctx, &items);

    let mut edited = op.clone();
    edited.selector1 = replace_leaf_segment(&op.selector1, &leaf);
    edited.selector2 = form.selector2.clone();
    edited.required_items = items;
    if let Some(selectors) = form.required_selectors {
        edited.required_selectors = selectors;
    }
    if let Some(params) = &form.params {
        edited.params = params.clone();
    }
    edited.context = Some(ctx);
    edited
}
