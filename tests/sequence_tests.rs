mod common;

use std::path::Path;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use ace_recorder::capture::attributes::AttrKey;
use ace_recorder::playback::state::PlaybackState;
use ace_recorder::sequence::error::SequenceError;
use ace_recorder::sequence::manager::{Sequencer, SyntheticKind};
use ace_recorder::sequence::operation::{EventType, StepId};
use ace_recorder::sequence::persist::{write_test_case, TestCase};
use ace_recorder::transport::host::{BufferedUi, DetachedHost, HostEvent};
use ace_recorder::transport::message::{
    encode_operation, NoticeKind, UiCommand, RC_INVALID, RC_NOT_ALLOWED, RC_NOT_FOUND,
};

use common::*;

fn ids(seq: &Sequencer) -> Vec<u32> {
    seq.sequence().ids().iter().map(|id| id.0).collect()
}

fn inbound(version: &str, selector1: &str) -> String {
    let mut raw: Value = serde_json::from_str(&encode_operation(&click(selector1)).unwrap()).unwrap();
    raw["version"] = json!(version);
    raw["id"] = json!(42);
    raw.to_string()
}

// =========================================================================
// Recording
// =========================================================================

#[test]
fn record_requires_recording_state() {
    let (mut seq, ui, _) = sequencer();
    let err = seq.record(click("//a")).unwrap_err();
    assert!(matches!(err, SequenceError::Playback(_)), "Got {:?}", err);
    assert!(seq.sequence().is_empty());
    assert!(ui.commands().is_empty(), "Nothing rendered for a refused step");
}

#[test]
fn recorded_steps_get_sequential_ids_and_lines() {
    let (mut seq, ui, _) = recording_sequencer();
    let added = record_clicks(&mut seq, 2);
    assert_eq!(added, vec![StepId(1), StepId(2)]);
    assert!(seq.is_dirty());

    assert_eq!(
        ui.take(),
        vec![
            UiCommand::AddLine {
                after: None,
                id: StepId(1),
                text: r#"click //a[@id="s1"] [b1:t2]"#.into(),
            },
            UiCommand::AddLine {
                after: Some(StepId(1)),
                id: StepId(2),
                text: r#"click //a[@id="s2"] [b1:t2]"#.into(),
            },
        ]
    );
}

#[test]
fn deleted_ids_are_never_reused() {
    let (mut seq, _, _) = recording_sequencer();
    record_clicks(&mut seq, 3);
    seq.delete(StepId(3)).unwrap();
    let next = seq.record(click("//b")).unwrap();
    assert_eq!(next, StepId(4));
    assert_eq!(ids(&seq), vec![1, 2, 4]);
    assert!(seq.sequence().is_consistent());
}

#[test]
fn delete_unknown_step_fails() {
    let (mut seq, _, _) = recording_sequencer();
    record_clicks(&mut seq, 1);
    let err = seq.delete(StepId(9)).unwrap_err();
    assert!(matches!(err, SequenceError::StepNotFound(StepId(9))));
    assert_eq!(seq.sequence().len(), 1);
}

// =========================================================================
// Inbound messages
// =========================================================================

#[test]
fn inbound_from_other_version_is_dropped() {
    let (mut seq, _, _) = recording_sequencer();
    assert_eq!(seq.accept_inbound(&inbound("0.9.0", "//a")), None);
    assert_eq!(seq.accept_inbound("{not json"), None);
    assert!(seq.sequence().is_empty());

    let id = seq.accept_inbound(&inbound(VERSION, "//a"));
    assert_eq!(id, Some(StepId(1)), "Producer id is replaced");
    assert_eq!(seq.sequence().get(StepId(1)).unwrap().selector1, "//a");
}

#[test]
fn inbound_while_idle_is_ignored() {
    let (mut seq, _, _) = sequencer();
    seq.handle(HostEvent::Recorded(inbound(VERSION, "//a")));
    assert!(seq.sequence().is_empty());
}

#[test]
fn external_close_appends_only_while_recording() {
    let (mut seq, _, _) = recording_sequencer();
    record_clicks(&mut seq, 1);
    seq.handle(HostEvent::Closed { browser_no: 1, tab_no: 3, coord: Some((10, 20)) });
    seq.handle(HostEvent::Closed { browser_no: 2, tab_no: 0, coord: None });

    let tab = seq.sequence().get(StepId(2)).unwrap();
    assert_eq!(tab.event_type, EventType::Closetab);
    assert_eq!((tab.browser_no, tab.tab_no), (1, 3));
    assert_eq!(tab.params, "10,20");
    let win = seq.sequence().get(StepId(3)).unwrap();
    assert_eq!(win.event_type, EventType::Closewin);
    assert_eq!(seq.lines()[2].1, "close window [b2]");

    seq.set_recording(false);
    seq.handle(HostEvent::Closed { browser_no: 1, tab_no: 1, coord: None });
    assert_eq!(seq.sequence().len(), 3, "Closing outside recording adds nothing");
}

// =========================================================================
// Compaction
// =========================================================================

#[test]
fn compact_renumbers_in_display_order() {
    let (mut seq, ui, _) = recording_sequencer();
    record_clicks(&mut seq, 4);
    seq.delete(StepId(2)).unwrap();
    seq.insert_synthetic(Some(StepId(1)), SyntheticKind::Check).unwrap();
    assert_eq!(ids(&seq), vec![1, 5, 3, 4]);
    let before = selectors(&seq);

    ui.take();
    seq.compact();
    assert_eq!(ids(&seq), vec![1, 2, 3, 4]);
    assert_eq!(selectors(&seq), before, "Order survives compaction");
    assert!(seq.sequence().is_consistent());
    assert_eq!(ui.take().first(), Some(&UiCommand::Clear), "Changed ids redraw the view");

    seq.compact();
    assert_eq!(ids(&seq), vec![1, 2, 3, 4]);
    assert!(ui.take().is_empty(), "Second compaction is a no-op");

    assert_eq!(seq.record(click("//z")).unwrap(), StepId(5));
}

// =========================================================================
// Context menu
// =========================================================================

#[test]
fn menu_inserts_sleep_after_reference() {
    let (mut seq, ui, _) = recording_sequencer();
    record_clicks(&mut seq, 2);
    ui.take();

    let op = seq.menu_test_step(StepId(1), 1, None).expect("sleep inserted");
    assert_eq!(op.event_type, EventType::Sleep);
    assert_eq!(op.params, "1000");
    assert_eq!(op.id, StepId(3));
    assert_eq!((op.browser_no, op.tab_no), (1, 2), "Inherits the reference target");
    assert_eq!(ids(&seq), vec![1, 3, 2]);
    assert_eq!(
        ui.take(),
        vec![UiCommand::AddLine {
            after: Some(StepId(1)),
            id: StepId(3),
            text: "sleep 1000ms [b1:t2]".into(),
        }]
    );
}

#[test]
fn menu_without_reference_appends() {
    let (mut seq, _, _) = recording_sequencer();
    record_clicks(&mut seq, 2);
    let op = seq.menu_test_step(StepId(0), 2, None).unwrap();
    assert_eq!(op.event_type, EventType::Screenshot);
    assert_eq!(ids(&seq), vec![1, 2, 3]);

    let close = seq.menu_test_step(StepId(0), 98, Some((4, 7))).unwrap();
    assert_eq!((close.browser_no, close.tab_no), (4, 7));
}

#[test]
fn menu_update_delete_and_unknown_codes() {
    let (mut seq, _, _) = recording_sequencer();
    record_clicks(&mut seq, 2);

    let current = seq.menu_test_step(StepId(2), 0, None).unwrap();
    assert_eq!(current.selector1, r#"//a[@id="s2"]"#);
    assert_eq!(seq.sequence().len(), 2);

    assert_eq!(seq.menu_test_step(StepId(1), 7, None), None);
    assert_eq!(seq.menu_test_step(StepId(9), 1, None), None, "Unknown reference");
    assert_eq!(seq.sequence().len(), 2);

    let removed = seq.menu_test_step(StepId(1), 4, None).unwrap();
    assert_eq!(removed.id, StepId(1));
    assert_eq!(ids(&seq), vec![2]);
}

// =========================================================================
// Editing
// =========================================================================

#[test]
fn edit_regenerates_leaf_segment() {
    let (mut seq, ui, _) = recording_sequencer();
    let op = recorded(EventType::Click, r#"//form[name="login"]//input[name="user"][@type="text"]"#, input_context("user"));
    seq.record(op).unwrap();
    ui.take();

    let resp = seq.edit_test_step(&json!({
        "id": 1,
        "context": { "label": "Mail" },
        "enabled": { "name": true, "label": true },
        "selector2": "form > input"
    }));
    assert!(resp.is_ok(), "{:?}", resp);

    let edited = seq.sequence().get(StepId(1)).unwrap();
    assert_eq!(edited.selector1, r#"//form[name="login"]//input[name="user"][@aria-label="Mail"]"#);
    assert_eq!(edited.selector2, "form > input");
    assert_eq!(
        edited.required_items.iter().collect::<Vec<_>>(),
        vec![(AttrKey::Name, true), (AttrKey::Type, false), (AttrKey::Label, true)]
    );
    assert_eq!(edited.context.as_ref().unwrap().label, "Mail");
    assert!(matches!(ui.take().as_slice(), [UiCommand::UpdateLine { id: StepId(1), .. }]));
}

#[test]
fn edit_rejects_bad_requests() {
    let (mut seq, _, _) = recording_sequencer();
    record_clicks(&mut seq, 1);
    seq.insert_synthetic(None, SyntheticKind::Sleep(200)).unwrap();

    assert_eq!(seq.edit_test_step(&json!({ "id": 2 })).rcode, RC_NOT_FOUND, "Synthetic step");
    assert_eq!(seq.edit_test_step(&json!({ "id": 99 })).rcode, RC_NOT_FOUND);
    assert_eq!(seq.edit_test_step(&json!({ "id": "one" })).rcode, RC_INVALID);
    assert_eq!(seq.sequence().get(StepId(1)).unwrap().selector1, r#"//a[@id="s1"]"#);
}

#[test]
fn settings_patch_is_validated_as_a_whole() {
    let (mut seq, _, _) = recording_sequencer();
    assert!(seq.edit_settings(&json!({ "defaultSleepMs": 250 })).is_ok());
    let op = seq.menu_test_step(StepId(0), 1, None).unwrap();
    assert_eq!(op.params, "250");

    let resp = seq.edit_settings(&json!({ "defaultSleepMs": 0, "screenshotDir": "shots" }));
    assert_eq!(resp.rcode, RC_INVALID);
    assert_eq!(seq.settings().screenshot_dir, "screenshots");
    assert_eq!(seq.settings().default_sleep_ms, 250);
}

// =========================================================================
// Playback gating
// =========================================================================

#[test]
fn playback_locks_the_sequence() {
    let (mut seq, ui, host) = recording_sequencer();
    record_clicks(&mut seq, 2);

    let resp = seq.play();
    assert!(resp.is_ok());
    assert_eq!(resp.extra.get("steps"), Some(&json!(2)));
    assert_eq!(seq.state(), PlaybackState::Playing);

    assert!(seq.record(click("//x")).is_err(), "Recording is off while playing");
    assert!(matches!(
        seq.insert_synthetic(None, SyntheticKind::Check),
        Err(SequenceError::Playback(_))
    ));
    assert_eq!(seq.menu_test_step(StepId(1), 4, None), None);
    assert_eq!(seq.edit_test_step(&json!({ "id": 1 })).rcode, RC_NOT_ALLOWED);
    assert_eq!(seq.set_recording(true).rcode, RC_NOT_ALLOWED);
    assert_eq!(seq.play().rcode, RC_NOT_ALLOWED);
    assert!(matches!(seq.new_file("x"), Err(SequenceError::Playback(_))));
    assert_eq!(seq.sequence().len(), 2);

    seq.pause(true);
    assert!(seq.is_paused());

    seq.handle(HostEvent::PlaybackFinished { ok: true, message: "done".into() });
    assert_eq!(seq.state(), PlaybackState::Idle);
    assert_eq!(
        ui.commands().last(),
        Some(&UiCommand::PlaybackFinished { ok: true, message: "done".into() })
    );
    assert_eq!(host.calls(), vec!["play 2", "pause true"]);
}

#[test]
fn stop_forwards_to_host_only_while_playing() {
    let (mut seq, _, host) = sequencer();
    assert!(seq.stop().is_ok());
    assert!(host.calls().is_empty());

    seq.play();
    seq.stop();
    assert_eq!(seq.state(), PlaybackState::Idle);
    assert_eq!(host.calls(), vec!["play 0", "stop"]);
}

#[test]
fn failed_playback_start_returns_to_idle() {
    let mut seq = Sequencer::new(config(), Box::new(BufferedUi::new()), Box::new(DetachedHost));
    let resp = seq.play();
    assert!(!resp.is_ok());
    assert_eq!(seq.state(), PlaybackState::Idle);
    assert!(!seq.launch("https://example.com").is_ok());
}

#[test]
fn launch_reports_browser_number() {
    let (mut seq, _, host) = sequencer();
    let resp = seq.launch("https://example.com");
    assert!(resp.is_ok());
    assert_eq!(resp.extra.get("browserNo"), Some(&json!(1)));
    assert_eq!(resp.extra.get("endpoint"), Some(&json!("ws://localhost:9910")), "Capture scripts connect here");
    assert_eq!(host.calls(), vec!["launch https://example.com"]);
}

#[test]
fn notices_are_forwarded_to_the_ui() {
    let (mut seq, ui, _) = sequencer();
    seq.alert(NoticeKind::Error, "Save failed", Some("Recorder"));
    seq.message(NoticeKind::Info, "Saved", None);

    assert_eq!(
        ui.take(),
        vec![
            UiCommand::Alert {
                kind: NoticeKind::Error,
                message: "Save failed".into(),
                title: Some("Recorder".into()),
            },
            UiCommand::Message {
                kind: NoticeKind::Info,
                message: "Saved".into(),
                title: None,
            },
        ]
    );

    let wire = serde_json::to_value(UiCommand::Message {
        kind: NoticeKind::Warning,
        message: "Check".into(),
        title: None,
    })
    .unwrap();
    assert_eq!(wire, json!({ "cmd": "message", "kind": "warning", "message": "Check", "title": null }));
}

// =========================================================================
// Persistence
// =========================================================================

#[test]
fn save_then_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let (mut seq, _, _) = recording_sequencer();
    record_clicks(&mut seq, 3);
    seq.delete(StepId(2)).unwrap();

    let path = seq.save("Login flow", dir.path()).unwrap();
    assert_eq!(path, dir.path().join("Login_flow.ace"));
    assert_eq!(ids(&seq), vec![1, 2], "Saving compacts first");
    assert!(!seq.is_dirty());
    assert_eq!(seq.saved_path(), Some(path.as_path()));

    let (mut other, ui, _) = sequencer();
    other.load("Login_flow", dir.path()).unwrap();
    assert_eq!(other.title(), "Login flow");
    assert_eq!(other.sequence().to_pairs(), seq.sequence().to_pairs());
    assert_eq!(ui.commands().len(), 3, "Clear plus one line per step");

    other.set_recording(true);
    assert_eq!(other.record(click("//c")).unwrap(), StepId(3));
}

#[test]
fn load_continues_after_highest_id() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sparse.ace");
    let case = TestCase {
        title: "sparse".into(),
        steps: vec![(StepId(5), click("//five")), (StepId(2), click("//two"))],
    };
    write_test_case(&path, &case).unwrap();

    let (mut seq, _, _) = sequencer();
    seq.load_from(&path).unwrap();
    assert_eq!(ids(&seq), vec![5, 2], "Stored order is display order");

    seq.set_recording(true);
    assert_eq!(seq.record(click("//six")).unwrap(), StepId(6));
}

#[test]
fn exhausted_ids_are_reported_until_compaction() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("last.ace");
    let case = TestCase {
        title: "last".into(),
        steps: vec![(StepId(u32::MAX), click("//max"))],
    };
    write_test_case(&path, &case).unwrap();

    let (mut seq, _, _) = sequencer();
    seq.load_from(&path).unwrap();
    assert!(matches!(
        seq.insert_synthetic(None, SyntheticKind::Check),
        Err(SequenceError::IdsExhausted)
    ));
    seq.set_recording(true);
    assert!(matches!(seq.record(click("//next")), Err(SequenceError::IdsExhausted)));
    assert_eq!(ids(&seq), vec![u32::MAX]);
    assert!(seq.sequence().is_consistent());

    seq.compact();
    assert_eq!(seq.insert_synthetic(None, SyntheticKind::Check).unwrap(), StepId(2));
}

#[test]
fn failed_load_leaves_state_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let (mut seq, _, _) = recording_sequencer();
    record_clicks(&mut seq, 2);
    let before = seq.sequence().to_pairs();

    let garbage = dir.path().join("garbage.ace");
    std::fs::write(&garbage, "not a test case").unwrap();
    assert!(matches!(seq.load_from(&garbage), Err(SequenceError::Parse { .. })));

    let duplicated = dir.path().join("dup.ace");
    let case = TestCase {
        title: "dup".into(),
        steps: vec![(StepId(1), click("//a")), (StepId(1), click("//b"))],
    };
    write_test_case(&duplicated, &case).unwrap();
    assert!(matches!(seq.load_from(&duplicated), Err(SequenceError::Corrupt(_))));

    assert!(matches!(
        seq.load("missing", dir.path()),
        Err(SequenceError::Io { .. })
    ));

    assert_eq!(seq.sequence().to_pairs(), before);
    assert!(seq.is_dirty());
    assert_eq!(seq.record(click("//c")).unwrap(), StepId(3));
}

#[test]
fn failed_save_keeps_sequence_dirty() {
    let dir = tempfile::tempdir().unwrap();
    let (mut seq, ui, _) = recording_sequencer();
    record_clicks(&mut seq, 3);
    seq.delete(StepId(2)).unwrap();
    ui.take();

    let target = dir.path().join("no-such-dir").join("case.ace");
    assert!(matches!(seq.save_as("case", &target), Err(SequenceError::Io { .. })));
    assert!(seq.is_dirty());
    assert_eq!(seq.saved_path(), None);
    assert_eq!(ids(&seq), vec![1, 3], "A failed save does not renumber");
    assert!(ui.take().is_empty(), "Nothing is redrawn");
    assert_eq!(seq.record(click("//d")).unwrap(), StepId(4));
}

#[test]
fn new_file_resets_the_counter() {
    let (mut seq, ui, _) = recording_sequencer();
    record_clicks(&mut seq, 3);
    seq.new_file("next").unwrap();

    assert!(seq.sequence().is_empty());
    assert_eq!(seq.title(), "next");
    assert_eq!(ui.commands().last(), Some(&UiCommand::Clear));
    assert_eq!(seq.record(click("//a")).unwrap(), StepId(1));
}

// =========================================================================
// Journal
// =========================================================================

fn journal_kinds(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| {
            let event: Value = serde_json::from_str(line).expect("journal line is JSON");
            event["kind"].as_str().unwrap().to_string()
        })
        .collect()
}

#[test]
fn journal_records_each_mutation() {
    let dir = tempfile::tempdir().unwrap();
    let journal = dir.path().join("session.jsonl");
    let mut cfg = config();
    cfg.journal = Some(journal.clone());

    let mut seq = Sequencer::new(cfg, Box::new(BufferedUi::new()), Box::new(ScriptedHost::default()));
    seq.set_recording(true);
    record_clicks(&mut seq, 2);
    seq.delete(StepId(1)).unwrap();
    seq.compact();

    assert_eq!(journal_kinds(&journal), vec!["state", "record", "record", "delete", "compact"]);

    let last: Value = serde_json::from_str(
        std::fs::read_to_string(&journal).unwrap().lines().nth(2).unwrap(),
    )
    .unwrap();
    assert_eq!(last["step"], json!(2));
    assert_eq!(last["event_type"], json!("click"));
    assert_eq!(last["state"], json!("recording"));
}
