use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;

use crate::sequence::operation::Operation;
use crate::transport::message::UiCommand;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("host driver error: {0}")]
pub struct HostError(pub String);

/// Receives refresh commands for the remote UI view.
pub trait UiSink {
    fn send(&mut self, command: UiCommand);
}

/// The browser-driving collaborator.
pub trait HostDriver {
    /// Open a browser instance on `url`; returns its browser number.
    fn launch(&mut self, url: &str) -> Result<u32, HostError>;

    /// Begin stepping through `steps`. Completion is reported back as
    /// [`HostEvent::PlaybackFinished`].
    fn start_playback(&mut self, steps: &[Operation]) -> Result<(), HostError>;

    fn stop_playback(&mut self);

    fn set_paused(&mut self, paused: bool);
}

/// Back-reference from the browser driver into the sequencer.
pub trait ExternalCloseListener {
    /// A tab (`tab_no != 0`) or a whole window (`tab_no == 0`) was closed
    /// outside the recorder.
    fn on_external_close(&mut self, browser_no: u32, tab_no: u32, coord: Option<(i32, i32)>);
}

/// Events delivered to the sequencer, one at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// A raw inbound event message from a capture script
    Recorded(String),
    Closed {
        browser_no: u32,
        tab_no: u32,
        coord: Option<(i32, i32)>,
    },
    PlaybackFinished {
        ok: bool,
        message: String,
    },
}

/// Collects UI commands; clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct BufferedUi {
    commands: Rc<RefCell<Vec<UiCommand>>>,
}

impl BufferedUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<UiCommand> {
        self.commands.borrow().clone()
    }

    pub fn take(&self) -> Vec<UiCommand> {
        std::mem::take(&mut *self.commands.borrow_mut())
    }
}

impl UiSink for BufferedUi {
    fn send(&mut self, command: UiCommand) {
        self.commands.borrow_mut().push(command);
    }
}

/// Driver used when no browser is attached (offline ingest, file tools).
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedHost;

impl HostDriver for DetachedHost {
    fn launch(&mut self, url: &str) -> Result<u32, HostError> {
        Err(HostError(format!("no browser host attached, cannot open {}", url)))
    }

    fn start_playback(&mut self, _steps: &[Operation]) -> Result<(), HostError> {
        Err(HostError("no browser host attached".into()))
    }

    fn stop_playback(&mut self) {}

    fn set_paused(&mut self, _paused: bool) {}
}
