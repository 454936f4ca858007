//! End-to-end tests for the script engine
//!
//! These drive the full pipeline (parse -> validate -> run) against the
//! default device registry and a recording gateway, with the tokio clock
//! paused so timed waits and polls resolve instantly.

use axis_core::{RunState, StatusReport, StatusReporter};
use axis_gateway::RecordingGateway;
use axis_script::{parse_script, ScriptRunner, Validator, WaitConditionRegistry};
use std::sync::{Arc, Mutex};
use tokio::time::Duration;

type Reports = Arc<Mutex<Vec<StatusReport>>>;

fn collecting_reporter() -> (StatusReporter, Reports) {
    let reports: Reports = Arc::new(Mutex::new(Vec::new()));
    let sink = reports.clone();
    let reporter: StatusReporter = Arc::new(move |report| {
        if let Ok(mut reports) = sink.lock() {
            reports.push(report);
        }
    });
    (reporter, reports)
}

struct Harness {
    runner: ScriptRunner,
    gateway: Arc<RecordingGateway>,
    reports: Reports,
}

fn harness() -> Harness {
    let registry = Arc::new(axis_devices::default_registry());
    let gateway = Arc::new(RecordingGateway::new());
    let (reporter, reports) = collecting_reporter();
    let runner = ScriptRunner::new(
        registry,
        gateway.clone(),
        Arc::new(WaitConditionRegistry::standard()),
        reporter,
    );
    Harness {
        runner,
        gateway,
        reports,
    }
}

async fn wait_terminal(runner: &ScriptRunner) -> RunState {
    let mut rx = runner.subscribe();
    loop {
        let state = *rx.borrow_and_update();
        if state.is_terminal() {
            return state;
        }
        if rx.changed().await.is_err() {
            return runner.state();
        }
    }
}

async fn wait_for(runner: &ScriptRunner, wanted: RunState) {
    let mut rx = runner.subscribe();
    loop {
        if *rx.borrow_and_update() == wanted {
            return;
        }
        rx.changed().await.expect("state channel closed");
    }
}

fn sent_words(gateway: &RecordingGateway) -> Vec<String> {
    gateway.sent().iter().map(|s| s.command.clone()).collect()
}

#[tokio::test(start_paused = true)]
async fn test_round_trip_valid_script_completes() {
    let h = harness();
    h.gateway.telemetry().set("temp_c", "100.0 C");

    let script = "\
ENABLE
SET_HEATER_SETPOINT 100
WAIT_UNTIL_HEATER_AT_TEMP 100
MOVE_X 5
";
    let validator = Validator::new(Arc::new(axis_devices::default_registry()));
    assert!(validator.validate(script).is_empty());

    h.runner.start(parse_script(script)).unwrap();
    assert_eq!(wait_terminal(&h.runner).await, RunState::Completed);

    let words = sent_words(&h.gateway);
    assert_eq!(words[0], "ENABLE");
    assert_eq!(words[1], "SET_HEATER_SETPOINT 100");
    assert_eq!(words[2], "MOVE_X 5 50 200 25");
    assert!(!h.reports.lock().unwrap().iter().any(|r| r.is_error()));
}

#[tokio::test(start_paused = true)]
async fn test_cycle_executes_body_exactly_n_times() {
    let h = harness();
    let script = "CYCLE 3\n    MOVE_X 5\nENABLE\n";

    h.runner.start(parse_script(script)).unwrap();
    assert_eq!(wait_terminal(&h.runner).await, RunState::Completed);

    let words = sent_words(&h.gateway);
    assert_eq!(
        words,
        vec![
            "MOVE_X 5 50 200 25",
            "MOVE_X 5 50 200 25",
            "MOVE_X 5 50 200 25",
            "ENABLE"
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_nested_cycles() {
    let h = harness();
    let script = "\
CYCLE 2
    CYCLE 2
        ENABLE
    DISABLE
";

    h.runner.start(parse_script(script)).unwrap();
    assert_eq!(wait_terminal(&h.runner).await, RunState::Completed);

    let words = sent_words(&h.gateway);
    assert_eq!(words.iter().filter(|w| *w == "ENABLE").count(), 4);
    assert_eq!(words.iter().filter(|w| *w == "DISABLE").count(), 2);
    // One full inner pass completes before the outer advances
    assert_eq!(
        words,
        vec!["ENABLE", "ENABLE", "DISABLE", "ENABLE", "ENABLE", "DISABLE"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_wait_timeout_halts_run() {
    let h = harness();
    // Telemetry never drains to the target
    h.gateway.telemetry().set("vacuum_psig", "10.0 PSIG");

    let script = "WAIT_UNTIL_VACUUM 5 1\nENABLE\n";
    h.runner.start(parse_script(script)).unwrap();
    assert_eq!(wait_terminal(&h.runner).await, RunState::Errored);

    let timeout_errors = h
        .reports
        .lock()
        .unwrap()
        .iter()
        .filter(|r| r.is_error() && r.message.contains("Timeout waiting for vacuum target"))
        .count();
    assert_eq!(timeout_errors, 1);

    // Nothing after the failed wait was dispatched
    assert!(sent_words(&h.gateway).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_heater_wait_succeeds_on_first_poll() {
    let h = harness();
    h.gateway.telemetry().set("temp_c", "100.0 C");

    let script = "WAIT_UNTIL_HEATER_AT_TEMP 100\nENABLE\n";
    h.runner.start(parse_script(script)).unwrap();
    assert_eq!(wait_terminal(&h.runner).await, RunState::Completed);
    assert_eq!(sent_words(&h.gateway), vec!["ENABLE"]);
}

#[tokio::test(start_paused = true)]
async fn test_heater_wait_tolerance_band() {
    let h = harness();
    // 5% of 100 -> [95, 105]
    h.gateway.telemetry().set("temp_c", "95.2 C");

    let script = "WAIT_UNTIL_HEATER_AT_TEMP 100\n";
    h.runner.start(parse_script(script)).unwrap();
    assert_eq!(wait_terminal(&h.runner).await, RunState::Completed);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_mid_open_cycle() {
    let h = harness();
    // CYCLE with no count: unbounded loop, only cancel ends it
    let script = "CYCLE\n    MOVE_X 5\n";
    h.runner.start(parse_script(script)).unwrap();

    tokio::time::sleep(Duration::from_millis(500)).await;
    h.runner.cancel();

    let state = wait_terminal(&h.runner).await;
    assert_eq!(state, RunState::Cancelled);
    assert!(h.gateway.sent_count() > 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_wait() {
    let h = harness();
    h.gateway.telemetry().set("vacuum_psig", "0.0 PSIG");

    // Wait that can never succeed; cancel instead of letting it time out
    let script = "WAIT_UNTIL_VACUUM -12 600\nENABLE\n";
    h.runner.start(parse_script(script)).unwrap();

    tokio::time::sleep(Duration::from_secs(1)).await;
    h.runner.cancel();

    assert_eq!(wait_terminal(&h.runner).await, RunState::Cancelled);
    assert!(sent_words(&h.gateway).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_pause_and_resume() {
    let h = harness();
    let script = "ENABLE\nHEATER_ON\nDISABLE\n";
    h.runner.start(parse_script(script)).unwrap();

    h.runner.pause();
    wait_for(&h.runner, RunState::Paused).await;
    let paused_count = h.gateway.sent_count();

    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_eq!(h.runner.state(), RunState::Paused);
    assert_eq!(h.gateway.sent_count(), paused_count);

    h.runner.resume();
    assert_eq!(wait_terminal(&h.runner).await, RunState::Completed);
    assert_eq!(h.gateway.sent_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_start_while_active_is_rejected() {
    let h = harness();
    h.runner.start(parse_script("CYCLE\n    ENABLE\n")).unwrap();

    let second = h.runner.start(parse_script("DISABLE\n"));
    assert!(second.is_err());

    h.runner.cancel();
    assert_eq!(wait_terminal(&h.runner).await, RunState::Cancelled);
}

#[tokio::test(start_paused = true)]
async fn test_acknowledge_resets_to_idle() {
    let h = harness();
    h.runner.start(parse_script("ENABLE\n")).unwrap();

    assert!(!h.runner.acknowledge());

    assert_eq!(wait_terminal(&h.runner).await, RunState::Completed);
    assert!(h.runner.acknowledge());
    assert_eq!(h.runner.state(), RunState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_runtime_move_defaults_override_schema_defaults() {
    let h = harness();
    let script = "MOVE_X 5\nSET_DEFAULT_MOVE_VEL 80\nMOVE_X 5\n";

    h.runner.start(parse_script(script)).unwrap();
    assert_eq!(wait_terminal(&h.runner).await, RunState::Completed);

    let words = sent_words(&h.gateway);
    assert_eq!(words[0], "MOVE_X 5 50 200 25");
    assert_eq!(words[1], "MOVE_X 5 80 200 25");
}

#[tokio::test(start_paused = true)]
async fn test_wait_until_vacuum_tracks_last_set_target() {
    let h = harness();
    h.gateway.telemetry().set("vacuum_psig", "-13.0 PSIG");

    // No target argument on the wait: the last commanded setpoint is used
    let script = "SET_VACUUM_TARGET -12.5\nWAIT_UNTIL_VACUUM\nENABLE\n";
    h.runner.start(parse_script(script)).unwrap();
    assert_eq!(wait_terminal(&h.runner).await, RunState::Completed);

    let words = sent_words(&h.gateway);
    assert_eq!(words[0], "SET_VACUUM_TARGET -12.5");
    assert_eq!(words[1], "ENABLE");
}

#[tokio::test(start_paused = true)]
async fn test_timed_wait_then_continue() {
    let h = harness();
    let script = "WAIT 2\nENABLE\n";

    h.runner.start(parse_script(script)).unwrap();
    assert_eq!(wait_terminal(&h.runner).await, RunState::Completed);
    assert_eq!(sent_words(&h.gateway), vec!["ENABLE"]);
}

#[tokio::test(start_paused = true)]
async fn test_multiple_sub_commands_execute_in_order() {
    let h = harness();
    let script = "ENABLE, HEATER_ON, VACUUM_ON\n";

    h.runner.start(parse_script(script)).unwrap();
    assert_eq!(wait_terminal(&h.runner).await, RunState::Completed);
    assert_eq!(
        sent_words(&h.gateway),
        vec!["ENABLE", "HEATER_ON", "VACUUM_ON"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_abort_broadcasts_to_every_device() {
    let h = harness();
    h.runner.start(parse_script("ABORT\n")).unwrap();
    assert_eq!(wait_terminal(&h.runner).await, RunState::Completed);

    let mut devices: Vec<String> = h.gateway.sent().iter().map(|s| s.device.clone()).collect();
    devices.sort();
    assert_eq!(devices, vec!["fillhead", "gantry", "press", "pressurizer"]);
    assert!(h.gateway.sent().iter().all(|s| s.command == "ABORT"));
}
