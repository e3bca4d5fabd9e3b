use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::sequence::error::SequenceError;
use crate::sequence::operation::{Operation, StepId};

/// File extension of persisted test cases.
pub const ACE_EXTENSION: &str = "ace";

/// Persisted form: `{title, steps: [[id, operation], ...]}` in display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub title: String,
    pub steps: Vec<(StepId, Operation)>,
}

/// Sanitize a title into a safe file stem.
pub fn sanitize_filename(name: &str) -> String {
    let stem: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() { "untitled".to_string() } else { stem }
}

/// `dir/name.ace`; a name that already carries the extension is kept as is.
pub fn resolve_path(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    if path.extension().is_some_and(|e| e == ACE_EXTENSION) {
        path
    } else {
        dir.join(format!("{}.{}", name, ACE_EXTENSION))
    }
}

pub fn write_test_case(path: &Path, case: &TestCase) -> Result<(), SequenceError> {
    let json = serde_json::to_string_pretty(case).map_err(SequenceError::Serialize)?;
    std::fs::write(path, json).map_err(|e| SequenceError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

pub fn read_test_case(path: &Path) -> Result<TestCase, SequenceError> {
    let content = std::fs::read_to_string(path).map_err(|e| SequenceError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| SequenceError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}
