#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use ace_recorder::capture::attributes::required_items;
use ace_recorder::capture::context::EventContext;
use ace_recorder::sequence::manager::{Sequencer, SequencerConfig};
use ace_recorder::sequence::operation::{EventType, Operation, RequiredSelectors, StepId};
use ace_recorder::sequence::settings::Settings;
use ace_recorder::transport::host::{BufferedUi, HostDriver, HostError};
use ace_recorder::transport::message::TransportConfig;

pub const VERSION: &str = "1.0.0";

/// Host driver that records every call it receives.
#[derive(Debug, Clone, Default)]
pub struct ScriptedHost {
    pub calls: Rc<RefCell<Vec<String>>>,
}

impl ScriptedHost {
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl HostDriver for ScriptedHost {
    fn launch(&mut self, url: &str) -> Result<u32, HostError> {
        self.calls.borrow_mut().push(format!("launch {}", url));
        Ok(1)
    }

    fn start_playback(&mut self, steps: &[Operation]) -> Result<(), HostError> {
        self.calls.borrow_mut().push(format!("play {}", steps.len()));
        Ok(())
    }

    fn stop_playback(&mut self) {
        self.calls.borrow_mut().push("stop".into());
    }

    fn set_paused(&mut self, paused: bool) {
        self.calls.borrow_mut().push(format!("pause {}", paused));
    }
}

pub fn config() -> SequencerConfig {
    SequencerConfig {
        transport: TransportConfig {
            version: VERSION.into(),
            port: 9910,
        },
        settings: Settings::default(),
        journal: None,
    }
}

pub fn sequencer() -> (Sequencer, BufferedUi, ScriptedHost) {
    let ui = BufferedUi::new();
    let host = ScriptedHost::default();
    let seq = Sequencer::new(config(), Box::new(ui.clone()), Box::new(host.clone()));
    (seq, ui, host)
}

/// A sequencer already in the Recording state.
pub fn recording_sequencer() -> (Sequencer, BufferedUi, ScriptedHost) {
    let (mut seq, ui, host) = sequencer();
    assert!(seq.set_recording(true).is_ok(), "Recording must start from Idle");
    (seq, ui, host)
}

pub fn input_context(name: &str) -> EventContext {
    EventContext {
        tag_name: "input".into(),
        name: name.into(),
        input_type: "text".into(),
        ..Default::default()
    }
}

pub fn recorded(event_type: EventType, selector1: &str, ctx: EventContext) -> Operation {
    Operation {
        version: VERSION.into(),
        id: StepId(0),
        browser_no: 1,
        tab_no: 2,
        event_type,
        params: String::new(),
        required_items: required_items(&ctx),
        context: Some(ctx),
        selector1: selector1.into(),
        selector2: String::new(),
        required_selectors: RequiredSelectors::default(),
        scripts: String::new(),
    }
}

pub fn click(selector1: &str) -> Operation {
    recorded(EventType::Click, selector1, input_context("q"))
}

/// Record `n` clicks with selectors `//a[@id="s1"]`, `//a[@id="s2"]`, ...
pub fn record_clicks(seq: &mut Sequencer, n: usize) -> Vec<StepId> {
    (1..=n)
        .map(|i| {
            seq.record(click(&format!("//a[@id=\"s{}\"]", i)))
                .expect("record while recording")
        })
        .collect()
}

pub fn selectors(seq: &Sequencer) -> Vec<String> {
    seq.sequence().iter().map(|op| op.selector1.clone()).collect()
}
