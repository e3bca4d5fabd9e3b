use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;

use crate::trace::trace::JournalEvent;

/// Append-only JSONL journal. Write failures are logged and never fatal.
pub struct TraceLogger {
    sink: Option<(PathBuf, Mutex<File>)>,
}

impl TraceLogger {
    /// Open `path` for appending. An unopenable path yields a disabled journal.
    pub fn new(path: &Path) -> Self {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Self {
                sink: Some((path.to_path_buf(), Mutex::new(file))),
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "journal disabled, could not open file");
                Self::disabled()
            }
        }
    }

    pub fn disabled() -> Self {
        Self { sink: None }
    }

    pub fn log(&self, event: &JournalEvent) {
        let Some((path, file)) = &self.sink else {
            return;
        };
        if let Err(e) = append(file, event) {
            warn!(path = %path.display(), kind = event.kind, error = %e, "failed to write journal event");
        }
    }
}

fn append(file: &Mutex<File>, event: &JournalEvent) -> io::Result<()> {
    let line = serde_json::to_string(event)?;
    let mut file = file
        .lock()
        .map_err(|_| io::Error::other("journal lock poisoned"))?;
    writeln!(file, "{}", line)
}
