use tracing::warn;

use crate::capture::attributes::required_items;
use crate::capture::context::{classify_interaction, extract_context, Interaction};
use crate::capture::error::CaptureError;
use crate::capture::locator::LocatorEngine;
use crate::dom::tree::LiveTree;
use crate::sequence::operation::{Operation, RequiredSelectors, StepId};

/// Producer side of recording: turns interactions on one tab into
/// inbound-shaped operations (`id` 0, assigned later by the sequencer).
#[derive(Debug, Clone)]
pub struct Recorder {
    pub version: String,
    pub browser_no: u32,
    pub tab_no: u32,
}

impl Recorder {
    pub fn new(version: &str, browser_no: u32, tab_no: u32) -> Self {
        Self {
            version: version.to_string(),
            browser_no,
            tab_no,
        }
    }

    /// `Ok(None)` when the interaction is not recorded at all.
    pub fn try_capture<T: LiveTree>(
        &self,
        tree: &T,
        interaction: &Interaction<T::Node>,
    ) -> Result<Option<Operation>, CaptureError> {
        let Some(view) = tree.view(interaction.target) else {
            return Ok(None);
        };
        let Some((event_type, params)) = classify_interaction(&view, interaction.kind) else {
            return Ok(None);
        };
        let Some(ctx) = extract_context(tree, interaction) else {
            return Ok(None);
        };

        let locators = LocatorEngine::new(tree).synthesize(interaction.target, &ctx)?;
        Ok(Some(Operation {
            version: self.version.clone(),
            id: StepId(0),
            browser_no: self.browser_no,
            tab_no: self.tab_no,
            event_type,
            params,
            required_items: required_items(&ctx),
            context: Some(ctx),
            selector1: locators.selector1,
            selector2: locators.selector2,
            required_selectors: RequiredSelectors::default(),
            scripts: String::new(),
        }))
    }

    /// Like [`Recorder::try_capture`], but a synthesis failure only drops
    /// the event.
    pub fn capture<T: LiveTree>(&self, tree: &T, interaction: &Interaction<T::Node>) -> Option<Operation> {
        match self.try_capture(tree, interaction) {
            Ok(op) => op,
            Err(e) => {
                warn!(error = %e, target = ?interaction.target, "locator synthesis failed, event dropped");
                None
            }
        }
    }
}
