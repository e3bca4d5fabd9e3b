use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::playback::state::{PlaybackError, PlaybackMachine, PlaybackState};
use crate::sequence::edit::{apply_edit, EditForm};
use crate::sequence::error::SequenceError;
use crate::sequence::operation::{EventType, Operation, StepId};
use crate::sequence::persist::{read_test_case, resolve_path, sanitize_filename, write_test_case, TestCase};
use crate::sequence::render::render_line;
use crate::sequence::settings::{Settings, SettingsPatch};
use crate::sequence::step_sequence::StepSequence;
use crate::trace::logger::TraceLogger;
use crate::trace::trace::JournalEvent;
use crate::transport::host::{ExternalCloseListener, HostDriver, HostEvent, UiSink};
use crate::transport::message::{decode_inbound, NoticeKind, Response, TransportConfig, UiCommand};

/// Host-side failure status (launch or playback start).
pub const RC_HOST: i32 = -5;

/// Steps inserted from the menu or by the host rather than recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntheticKind {
    Sleep(u64),
    Screenshot,
    Check,
    CloseTab {
        browser_no: u32,
        tab_no: u32,
        coord: Option<(i32, i32)>,
    },
    CloseWin {
        browser_no: u32,
        coord: Option<(i32, i32)>,
    },
}

impl SyntheticKind {
    pub fn event_type(&self) -> EventType {
        match self {
            SyntheticKind::Sleep(_) => EventType::Sleep,
            SyntheticKind::Screenshot => EventType::Screenshot,
            SyntheticKind::Check => EventType::Check,
            SyntheticKind::CloseTab { .. } => EventType::Closetab,
            SyntheticKind::CloseWin { .. } => EventType::Closewin,
        }
    }

    fn params(&self) -> String {
        match self {
            SyntheticKind::Sleep(ms) => ms.to_string(),
            SyntheticKind::CloseTab { coord: Some((x, y)), .. }
            | SyntheticKind::CloseWin { coord: Some((x, y)), .. } => format!("{},{}", x, y),
            _ => String::new(),
        }
    }
}

/// Context-menu actions on a step line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCode {
    UpdateInPlace,
    AddSleep,
    AddScreenshot,
    AddCheck,
    Delete,
    AddCloseTab,
    AddCloseWin,
}

impl MenuCode {
    pub fn from_code(code: i32) -> Option<MenuCode> {
        match code {
            0 => Some(MenuCode::UpdateInPlace),
            1 => Some(MenuCode::AddSleep),
            2 => Some(MenuCode::AddScreenshot),
            3 => Some(MenuCode::AddCheck),
            4 => Some(MenuCode::Delete),
            98 => Some(MenuCode::AddCloseTab),
            99 => Some(MenuCode::AddCloseWin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SequencerConfig {
    pub transport: TransportConfig,
    pub settings: Settings,
    /// JSONL session journal; `None` disables it
    pub journal: Option<PathBuf>,
}

/// Single owner of the step sequence. Every mutation is applied completely
/// (id, storage, UI notification, journal) before the next one starts.
pub struct Sequencer {
    sequence: StepSequence,
    title: String,
    playback: PlaybackMachine,
    transport: TransportConfig,
    settings: Settings,
    ui: Box<dyn UiSink>,
    host: Box<dyn HostDriver>,
    journal: TraceLogger,
    dirty: bool,
    saved_path: Option<PathBuf>,
}

impl Sequencer {
    pub fn new(config: SequencerConfig, ui: Box<dyn UiSink>, host: Box<dyn HostDriver>) -> Self {
        let journal = match &config.journal {
            Some(path) => TraceLogger::new(path),
            None => TraceLogger::disabled(),
        };
        Sequencer {
            sequence: StepSequence::new(),
            title: String::new(),
            playback: PlaybackMachine::new(),
            transport: config.transport,
            settings: config.settings,
            ui,
            host,
            journal,
            dirty: false,
            saved_path: None,
        }
    }

    pub fn sequence(&self) -> &StepSequence {
        &self.sequence
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn state(&self) -> PlaybackState {
        self.playback.state()
    }

    pub fn is_paused(&self) -> bool {
        self.playback.is_paused()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn saved_path(&self) -> Option<&Path> {
        self.saved_path.as_deref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Rendered display lines in order.
    pub fn lines(&self) -> Vec<(StepId, String)> {
        self.sequence.iter().map(|op| (op.id, render_line(op))).collect()
    }

    // ---- Sequence mutations ----

    /// Append a recorded step. Only legal while recording.
    pub fn record(&mut self, op: Operation) -> Result<StepId, SequenceError> {
        if !self.playback.is_recording() {
            return Err(PlaybackError {
                action: "recording a step",
                state: self.playback.state(),
            }
            .into());
        }
        let event_type = op.event_type;
        let id = self.sequence.push(op)?;
        self.dirty = true;
        self.notify_added(id);
        debug!(step = %id, event = event_type.as_str(), "recorded step");
        self.journal_step("record", id, event_type);
        Ok(id)
    }

    /// Decode and record one inbound event message. Messages from another
    /// producer version are dropped without a trace.
    pub fn accept_inbound(&mut self, line: &str) -> Option<StepId> {
        match decode_inbound(line, &self.transport.version) {
            Ok(Some(op)) => match self.record(op) {
                Ok(id) => Some(id),
                Err(e) => {
                    debug!(error = %e, "inbound event ignored");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "malformed inbound event dropped");
                None
            }
        }
    }

    /// Insert a synthetic step after `after`, or at the end for `None`.
    pub fn insert_synthetic(&mut self, after: Option<StepId>, kind: SyntheticKind) -> Result<StepId, SequenceError> {
        self.playback.ensure_editable("inserting a step")?;
        let (browser_no, tab_no) = match &kind {
            SyntheticKind::CloseTab { browser_no, tab_no, .. } => (*browser_no, *tab_no),
            SyntheticKind::CloseWin { browser_no, .. } => (*browser_no, 0),
            _ => self.target_of(after),
        };
        let op = Operation::synthetic(
            &self.transport.version,
            kind.event_type(),
            browser_no,
            tab_no,
            &kind.params(),
        );
        let id = self.sequence.insert_after(after, op)?;
        self.dirty = true;
        self.notify_added(id);
        self.journal_step("insert", id, kind.event_type());
        Ok(id)
    }

    pub fn delete(&mut self, id: StepId) -> Result<Operation, SequenceError> {
        self.playback.ensure_editable("deleting a step")?;
        let op = self.sequence.remove(id).ok_or(SequenceError::StepNotFound(id))?;
        self.dirty = true;
        self.ui.send(UiCommand::RemoveLine { id });
        self.journal_step("delete", id, op.event_type);
        Ok(op)
    }

    /// Merge an edit form onto a recorded step and regenerate its leaf
    /// locator segment.
    pub fn edit(&mut self, form: &EditForm) -> Result<(), SequenceError> {
        self.playback.ensure_editable("editing a step")?;
        let op = self.sequence.get(form.id).ok_or(SequenceError::StepNotFound(form.id))?;
        let base = op.context.as_ref().ok_or(SequenceError::NotEditable(form.id))?;
        let edited = apply_edit(op, base, form);
        let text = render_line(&edited);
        let event_type = edited.event_type;

        if let Some(slot) = self.sequence.get_mut(form.id) {
            *slot = edited;
        }
        self.dirty = true;
        self.ui.send(UiCommand::UpdateLine { id: form.id, text });
        self.journal_step("edit", form.id, event_type);
        Ok(())
    }

    /// Renumber ids to 1..N; the UI is redrawn when any id changed.
    pub fn compact(&mut self) {
        if self.sequence.compact() {
            self.dirty = true;
            self.redraw();
        }
        self.journal(self.event("compact"));
    }

    /// Compact and write `dir/<title>.ace`.
    pub fn save(&mut self, title: &str, dir: &Path) -> Result<PathBuf, SequenceError> {
        let path = resolve_path(dir, &sanitize_filename(title));
        self.save_as(title, &path)?;
        Ok(path)
    }

    /// The compacted sequence replaces the live one only once the write
    /// has succeeded.
    pub fn save_as(&mut self, title: &str, path: &Path) -> Result<(), SequenceError> {
        self.playback.ensure_editable("saving")?;
        let mut compacted = self.sequence.clone();
        let renumbered = compacted.compact();
        let case = TestCase {
            title: title.to_string(),
            steps: compacted.to_pairs(),
        };
        write_test_case(path, &case)?;

        self.sequence = compacted;
        if renumbered {
            self.redraw();
        }
        self.journal(self.event("compact"));
        self.title = case.title;
        self.dirty = false;
        self.saved_path = Some(path.to_path_buf());
        info!(path = %path.display(), steps = case.steps.len(), "saved test case");
        self.journal(self.event("save").with_detail(path.display()));
        Ok(())
    }

    /// Load `dir/<name>.ace`, replacing the whole sequence.
    pub fn load(&mut self, name: &str, dir: &Path) -> Result<(), SequenceError> {
        self.load_from(&resolve_path(dir, name))
    }

    /// Nothing in memory changes unless the file reads, parses and
    /// validates completely.
    pub fn load_from(&mut self, path: &Path) -> Result<(), SequenceError> {
        self.playback.ensure_editable("loading")?;
        let case = read_test_case(path)?;
        let sequence = StepSequence::from_pairs(case.steps)?;

        self.sequence = sequence;
        self.title = case.title;
        self.dirty = false;
        self.saved_path = Some(path.to_path_buf());
        self.redraw();
        info!(path = %path.display(), steps = self.sequence.len(), "loaded test case");
        self.journal(self.event("load").with_detail(path.display()));
        Ok(())
    }

    pub fn new_file(&mut self, title: &str) -> Result<(), SequenceError> {
        self.playback.ensure_editable("starting a new file")?;
        self.sequence.clear();
        self.title = title.to_string();
        self.dirty = false;
        self.saved_path = None;
        self.ui.send(UiCommand::Clear);
        self.journal(self.event("new").with_detail(title));
        Ok(())
    }

    // ---- Command surface ----

    pub fn launch(&mut self, url: &str) -> Response {
        match self.host.launch(url) {
            Ok(browser_no) => {
                info!(url, browser_no, "browser launched");
                Response::ok("launched")
                    .with("browserNo", browser_no)
                    .with("endpoint", self.transport.endpoint())
            }
            Err(e) => Response::with_code(RC_HOST, e.to_string()),
        }
    }

    pub fn set_recording(&mut self, on: bool) -> Response {
        match self.playback.set_recording(on) {
            Ok(()) => {
                self.journal(self.event("state").with_detail(if on { "record on" } else { "record off" }));
                Response::ok(self.playback.state().to_string())
            }
            Err(e) => Response::from(&SequenceError::from(e)),
        }
    }

    /// Start stepping through the operations in display order.
    pub fn play(&mut self) -> Response {
        if let Err(e) = self.playback.play() {
            return Response::from(&SequenceError::from(e));
        }
        let steps: Vec<Operation> = self.sequence.iter().cloned().collect();
        if let Err(e) = self.host.start_playback(&steps) {
            self.playback.stop();
            return Response::with_code(RC_HOST, e.to_string());
        }
        info!(steps = steps.len(), "playback started");
        self.journal(self.event("state").with_detail("play"));
        Response::ok("playing").with("steps", steps.len())
    }

    pub fn stop(&mut self) -> Response {
        let was_playing = self.playback.is_playing();
        self.playback.stop();
        if was_playing {
            self.host.stop_playback();
        }
        self.journal(self.event("state").with_detail("stop"));
        Response::ok("stopped")
    }

    pub fn pause(&mut self, paused: bool) -> Response {
        let flag = self.playback.pause(paused);
        self.host.set_paused(flag);
        Response::ok(if flag { "paused" } else { "resumed" })
    }

    pub fn on_playback_finished(&mut self, ok: bool, message: &str) {
        if self.playback.is_playing() {
            self.playback.stop();
        }
        info!(ok, message, "playback finished");
        self.ui.send(UiCommand::PlaybackFinished {
            ok,
            message: message.to_string(),
        });
        self.journal(self.event("state").with_detail(format!("finished ok={}", ok)));
    }

    /// Apply a context-menu action to the line `ref_id` (0 = no line).
    /// `extra` supplies `(browserNo, tabNo)` for the close steps.
    pub fn menu_test_step(&mut self, ref_id: StepId, menu_code: i32, extra: Option<(u32, u32)>) -> Option<Operation> {
        let Some(code) = MenuCode::from_code(menu_code) else {
            warn!(menu_code, "unknown menu code");
            return None;
        };
        let reference = (ref_id.0 != 0).then_some(ref_id);

        let kind = match code {
            MenuCode::UpdateInPlace => return reference.and_then(|id| self.sequence.get(id).cloned()),
            MenuCode::Delete => {
                return match self.delete(reference?) {
                    Ok(op) => Some(op),
                    Err(e) => {
                        warn!(error = %e, "menu delete failed");
                        None
                    }
                };
            }
            MenuCode::AddSleep => SyntheticKind::Sleep(self.settings.default_sleep_ms),
            MenuCode::AddScreenshot => SyntheticKind::Screenshot,
            MenuCode::AddCheck => SyntheticKind::Check,
            MenuCode::AddCloseTab => {
                let (browser_no, tab_no) = extra.unwrap_or_else(|| self.target_of(reference));
                SyntheticKind::CloseTab { browser_no, tab_no, coord: None }
            }
            MenuCode::AddCloseWin => {
                let (browser_no, _) = extra.unwrap_or_else(|| self.target_of(reference));
                SyntheticKind::CloseWin { browser_no, coord: None }
            }
        };

        match self.insert_synthetic(reference, kind) {
            Ok(id) => self.sequence.get(id).cloned(),
            Err(e) => {
                warn!(error = %e, "menu insert failed");
                None
            }
        }
    }

    pub fn edit_test_step(&mut self, fields: &Value) -> Response {
        let form: EditForm = match serde_json::from_value(fields.clone()) {
            Ok(f) => f,
            Err(e) => return Response::from(&SequenceError::InvalidRequest(e.to_string())),
        };
        match self.edit(&form) {
            Ok(()) => Response::ok("updated").with("id", form.id.0),
            Err(e) => Response::from(&e),
        }
    }

    pub fn edit_settings(&mut self, fields: &Value) -> Response {
        let patch: SettingsPatch = match serde_json::from_value(fields.clone()) {
            Ok(p) => p,
            Err(e) => return Response::from(&SequenceError::InvalidRequest(e.to_string())),
        };
        match self.settings.apply(patch) {
            Ok(()) => Response::ok("settings updated"),
            Err(e) => Response::from(&e),
        }
    }

    pub fn alert(&mut self, kind: NoticeKind, message: &str, title: Option<&str>) {
        self.ui.send(UiCommand::Alert {
            kind,
            message: message.to_string(),
            title: title.map(str::to_string),
        });
    }

    pub fn message(&mut self, kind: NoticeKind, message: &str, title: Option<&str>) {
        self.ui.send(UiCommand::Message {
            kind,
            message: message.to_string(),
            title: title.map(str::to_string),
        });
    }

    /// Apply one event from the serialized host channel.
    pub fn handle(&mut self, event: HostEvent) {
        match event {
            HostEvent::Recorded(line) => {
                self.accept_inbound(&line);
            }
            HostEvent::Closed { browser_no, tab_no, coord } => self.on_external_close(browser_no, tab_no, coord),
            HostEvent::PlaybackFinished { ok, message } => self.on_playback_finished(ok, &message),
        }
    }

    // ---- Helpers ----

    /// Browser/tab of the reference step, else of the last step.
    fn target_of(&self, reference: Option<StepId>) -> (u32, u32) {
        reference
            .and_then(|id| self.sequence.get(id))
            .or_else(|| self.sequence.last_id().and_then(|id| self.sequence.get(id)))
            .map(|op| (op.browser_no, op.tab_no))
            .unwrap_or((0, 0))
    }

    fn notify_added(&mut self, id: StepId) {
        let Some(op) = self.sequence.get(id) else {
            return;
        };
        let command = UiCommand::AddLine {
            after: self.sequence.predecessor(id),
            id,
            text: render_line(op),
        };
        self.ui.send(command);
    }

    fn redraw(&mut self) {
        self.ui.send(UiCommand::Clear);
        let mut after = None;
        for (id, text) in self.lines() {
            self.ui.send(UiCommand::AddLine { after, id, text });
            after = Some(id);
        }
    }

    fn event(&self, kind: &'static str) -> JournalEvent {
        JournalEvent::now(kind, self.playback.state(), self.sequence.len())
    }

    fn journal(&self, event: JournalEvent) {
        self.journal.log(&event);
    }

    fn journal_step(&self, kind: &'static str, id: StepId, event_type: EventType) {
        self.journal(self.event(kind).with_step(id).with_event_type(event_type));
    }
}

impl ExternalCloseListener for Sequencer {
    fn on_external_close(&mut self, browser_no: u32, tab_no: u32, coord: Option<(i32, i32)>) {
        if !self.playback.is_recording() {
            return;
        }
        let kind = if tab_no != 0 {
            SyntheticKind::CloseTab { browser_no, tab_no, coord }
        } else {
            SyntheticKind::CloseWin { browser_no, coord }
        };
        if let Err(e) = self.insert_synthetic(None, kind) {
            warn!(error = %e, "could not append close step");
        }
    }
}
