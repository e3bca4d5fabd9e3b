use tracing::debug;

use crate::capture::attributes::{candidate, required_items};
use crate::capture::context::{context_from_view, EventContext};
use crate::capture::error::CaptureError;
use crate::capture::oracle::UniquenessOracle;
use crate::dom::tree::{LiveTree, NodeView};

/// "At any depth below" join for structural paths.
pub const ANY_DESCENDANT: &str = "//";

/// Direct-child join for sibling chains.
pub const DIRECT_CHILD: &str = " > ";

/// Both locators synthesized for one interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locators {
    /// Structural path locator
    pub selector1: String,
    /// Sibling-indexed chain locator
    pub selector2: String,
}

/// Join path segments with the any-descendant operator. A lone segment is
/// rooted at the document body, several are rooted at the first segment.
pub fn assemble(segments: &[String]) -> String {
    match segments {
        [] => String::new(),
        [only] => format!("/html/body{}{}", ANY_DESCENDANT, only),
        _ => format!("{}{}", ANY_DESCENDANT, segments.join(ANY_DESCENDANT)),
    }
}

/// Derives locators from the live tree at the instant of an interaction.
pub struct LocatorEngine<'a, T: LiveTree> {
    tree: &'a T,
    oracle: UniquenessOracle<'a, T>,
}

impl<'a, T: LiveTree> LocatorEngine<'a, T> {
    pub fn new(tree: &'a T) -> Self {
        Self {
            tree,
            oracle: UniquenessOracle::new(tree),
        }
    }

    pub fn synthesize(&self, target: T::Node, ctx: &EventContext) -> Result<Locators, CaptureError> {
        Ok(Locators {
            selector1: self.structural_path(target, ctx)?,
            selector2: self.sibling_chain(target),
        })
    }

    /// Escalate from the bare candidate to ancestor-rooted and finally
    /// indexed patterns until one resolves to `target` alone.
    pub fn structural_path(&self, target: T::Node, ctx: &EventContext) -> Result<String, CaptureError> {
        let items = required_items(ctx);
        let leaf = candidate(ctx, &items);

        // id and text are trusted without a uniqueness check.
        if !ctx.id.is_empty() || !ctx.text.is_empty() {
            return Ok(format!("{}{}", ANY_DESCENDANT, leaf));
        }

        if items.any_required() {
            let pattern = format!("{}{}", ANY_DESCENDANT, leaf);
            if self.oracle.is_unique_match(&pattern, target)? {
                return Ok(pattern);
            }
        }

        let mut anchors = vec![target];
        let mut segments = vec![leaf];

        let form = self.nearest_ancestor(target, |v| v.tag == "form");
        if let Some(form) = form {
            anchors.insert(0, form);
            segments.insert(0, self.segment(form)?);
            let pattern = assemble(&segments);
            if self.oracle.is_unique_match(&pattern, target)? {
                return Ok(pattern);
            }
        }

        let owner = self.nearest_ancestor(target, |v| !v.id.is_empty());
        if let Some(owner) = owner.filter(|o| Some(*o) != form) {
            // An id owner nested inside the form sits between form and leaf.
            let at = match form {
                Some(form) if self.is_ancestor(form, owner) => 1,
                _ => 0,
            };
            anchors.insert(at, owner);
            segments.insert(at, self.segment(owner)?);
            let pattern = assemble(&segments);
            if self.oracle.is_unique_match(&pattern, target)? {
                return Ok(pattern);
            }
        }

        self.finalize(anchors, segments, target)
    }

    /// Index segments from the innermost outward until the path is unique.
    /// Fails when even the fully indexed path does not resolve to `target`
    /// alone.
    fn finalize(
        &self,
        mut anchors: Vec<T::Node>,
        mut segments: Vec<String>,
        target: T::Node,
    ) -> Result<String, CaptureError> {
        if anchors.len() == 1 {
            let body = self.tree.body().ok_or(CaptureError::NoBody)?;
            anchors.insert(0, body);
            segments.insert(0, "body".to_string());
        }

        let mut selector = assemble(&segments);
        for i in (1..segments.len()).rev() {
            let scoped = format!(".{}{}", ANY_DESCENDANT, segments[i]);
            let index = self
                .oracle
                .occurrence_index(&scoped, anchors[i - 1], anchors[i])?
                .ok_or_else(|| CaptureError::NoMatch {
                    segment: segments[i].clone(),
                    anchor: segments[i - 1].clone(),
                })?;
            segments[i] = format!("{}[{}]", segments[i], index);
            selector = assemble(&segments);
            if self.oracle.is_unique_match(&selector, target)? {
                return Ok(selector);
            }
        }
        debug!(selector = %selector, "no indexed path is unique");
        Err(CaptureError::NotUnique { selector })
    }

    /// CSS-like `tag#id` / `tag.cls:nth-of-type(N)` chain from the nearest
    /// id-carrying ancestor (or the body) down to `target`.
    pub fn sibling_chain(&self, target: T::Node) -> String {
        let mut path = Vec::new();
        let mut current = target;
        while let Some(view) = self.tree.view(current) {
            let mut selector = view.tag.clone();
            if !view.id.is_empty() {
                selector.push('#');
                selector.push_str(&view.id);
                path.push(selector);
                break;
            }
            if !view.classes.is_empty() {
                selector.push('.');
                selector.push_str(&view.classes.join("."));
            }

            let nth = 1 + self
                .tree
                .previous_element_siblings(current)
                .into_iter()
                .filter_map(|s| self.tree.view(s))
                .filter(|s| s.tag == view.tag && view.classes.iter().all(|c| s.classes.contains(c)))
                .count();
            if nth != 1 {
                selector.push_str(&format!(":nth-of-type({})", nth));
            }
            path.push(selector);

            let Some(parent) = self.tree.parent_element(current) else {
                break;
            };
            if self.tree.view(parent).is_none_or(|p| is_root_container(&p)) {
                break;
            }
            current = parent;
        }
        path.reverse();
        path.join(DIRECT_CHILD)
    }

    fn segment(&self, node: T::Node) -> Result<String, CaptureError> {
        let view = self.tree.view(node).ok_or_else(|| CaptureError::NoContext {
            tag: "?".to_string(),
        })?;
        let ctx = context_from_view(&view).ok_or_else(|| CaptureError::NoContext {
            tag: view.tag.clone(),
        })?;
        Ok(candidate(&ctx, &required_items(&ctx)))
    }

    /// Walk up from `node`; the body or html element is the last one checked.
    fn nearest_ancestor(&self, node: T::Node, condition: impl Fn(&NodeView) -> bool) -> Option<T::Node> {
        let mut current = node;
        while let Some(parent) = self.tree.parent_element(current) {
            let view = self.tree.view(parent)?;
            if condition(&view) {
                return Some(parent);
            }
            if is_root_container(&view) {
                break;
            }
            current = parent;
        }
        None
    }

    fn is_ancestor(&self, ancestor: T::Node, node: T::Node) -> bool {
        let mut current = node;
        while let Some(parent) = self.tree.parent_element(current) {
            if parent == ancestor {
                return true;
            }
            current = parent;
        }
        false
    }
}

fn is_root_container(view: &NodeView) -> bool {
    view.tag == "body" || view.tag == "html"
}
