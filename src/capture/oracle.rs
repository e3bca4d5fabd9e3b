use tracing::debug;

use crate::capture::error::CaptureError;
use crate::dom::tree::LiveTree;

/// Answers "how many nodes does this pattern match right now".
pub struct UniquenessOracle<'a, T: LiveTree> {
    tree: &'a T,
}

impl<'a, T: LiveTree> UniquenessOracle<'a, T> {
    pub fn new(tree: &'a T) -> Self {
        Self { tree }
    }

    pub fn count(&self, pattern: &str) -> Result<usize, CaptureError> {
        let n = self.tree.query(pattern, None)?.len();
        debug!(pattern, matches = n, "uniqueness query");
        Ok(n)
    }

    /// True iff exactly one node matches and it is `target`.
    pub fn is_unique_match(&self, pattern: &str, target: T::Node) -> Result<bool, CaptureError> {
        let found = self.tree.query(pattern, None)?;
        debug!(pattern, matches = found.len(), "uniqueness query");
        Ok(found.len() == 1 && found[0] == target)
    }

    /// 1-based position of `target` among the matches of a relative
    /// pattern evaluated under `scope`.
    pub fn occurrence_index(
        &self,
        pattern: &str,
        scope: T::Node,
        target: T::Node,
    ) -> Result<Option<usize>, CaptureError> {
        let found = self.tree.query(pattern, Some(scope))?;
        let index = found.iter().position(|n| *n == target).map(|i| i + 1);
        debug!(pattern, matches = found.len(), ?index, "occurrence query");
        Ok(index)
    }
}
