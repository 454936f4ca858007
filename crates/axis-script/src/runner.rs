//! Script runner
//!
//! The sequencer: owns the run/pause/cancel state machine, interprets
//! validated lines on a dedicated worker task, expands CYCLE blocks with a
//! runtime frame stack, invokes wait handlers for blocking commands, and
//! dispatches everything else fire-and-forget to the device gateway.
//!
//! Malformed scripts never reach the runner: validation is a required
//! gate. Pause and cancel are cooperative, honored at line boundaries and
//! wait poll ticks.

use crate::parse::{ScriptLine, SubCommand};
use crate::wait::{WaitConditionRegistry, WaitRequest};
use axis_core::{
    CommandSchema, RunState, StatusReport, StatusReporter, DEVICE_ALL, DEVICE_SCRIPT,
};
use axis_gateway::DeviceGateway;
use axis_registry::SharedCommandRegistry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration, Instant};
use tracing::{debug, info, warn};

/// Pacing delay between sub-commands of one line
const SUB_COMMAND_PACING: Duration = Duration::from_millis(50);

/// Report cadence for timed waits
const WAIT_TICK: Duration = Duration::from_millis(100);

/// Errors returned by runner control calls
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("a script run is already active")]
    AlreadyRunning,
}

/// Caller requests, observed by the worker at its next boundary
#[derive(Debug, Clone, Copy, Default)]
struct ControlRequest {
    pause: bool,
    cancel: bool,
}

/// Shared control block between the runner handle and its worker
struct Control {
    request: watch::Sender<ControlRequest>,
    state: watch::Sender<RunState>,
}

impl Control {
    fn new() -> Self {
        Self {
            request: watch::channel(ControlRequest::default()).0,
            state: watch::channel(RunState::Idle).0,
        }
    }

    fn state(&self) -> RunState {
        *self.state.borrow()
    }

    fn set_state(&self, state: RunState) {
        debug!(?state, "Run state transition");
        self.state.send_replace(state);
    }

    fn cancelled(&self) -> bool {
        self.request.borrow().cancel
    }

    /// Honor pause/cancel at a line boundary
    ///
    /// Blocks (without polling) while paused. Returns false when the run
    /// has been cancelled.
    async fn boundary(&self) -> bool {
        let mut rx = self.request.subscribe();
        loop {
            let req = *rx.borrow_and_update();
            if req.cancel {
                return false;
            }
            if !req.pause {
                if self.state() == RunState::Paused {
                    self.set_state(RunState::Running);
                }
                return true;
            }
            if self.state() != RunState::Paused {
                self.set_state(RunState::Paused);
            }
            if rx.changed().await.is_err() {
                return false;
            }
        }
    }
}

/// One entry of the runtime loop stack
#[derive(Debug)]
struct BlockFrame {
    /// Indent of the CYCLE header line
    indent: usize,

    /// Index of the first body line in the parsed line list
    body_start: usize,

    /// Iterations left, or open-ended
    remaining: Remaining,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Remaining {
    Count(u32),
    Open,
}

/// Outcome of executing one line
enum LineOutcome {
    Continue,
    Halt(RunState),
}

/// The script sequencer
///
/// One runner serves one script session; starting a run while another is
/// active is rejected. Callers interact only through
/// start/pause/resume/cancel/state and the status reporter.
pub struct ScriptRunner {
    registry: SharedCommandRegistry,
    gateway: Arc<dyn DeviceGateway>,
    waits: Arc<WaitConditionRegistry>,
    reporter: StatusReporter,
    control: Arc<Control>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ScriptRunner {
    /// Create a runner over pre-built registries and a gateway
    pub fn new(
        registry: SharedCommandRegistry,
        gateway: Arc<dyn DeviceGateway>,
        waits: Arc<WaitConditionRegistry>,
        reporter: StatusReporter,
    ) -> Self {
        Self {
            registry,
            gateway,
            waits,
            reporter,
            control: Arc::new(Control::new()),
            worker: Mutex::new(None),
        }
    }

    /// Start executing a pre-validated script on the worker task
    pub fn start(&self, script: Vec<ScriptLine>) -> Result<(), RunnerError> {
        if self.control.state().is_active() {
            return Err(RunnerError::AlreadyRunning);
        }

        self.control.request.send_replace(ControlRequest::default());
        self.control.set_state(RunState::Running);
        info!(lines = script.len(), "Starting script run");

        let worker = Worker {
            registry: self.registry.clone(),
            gateway: self.gateway.clone(),
            waits: self.waits.clone(),
            reporter: self.reporter.clone(),
            control: self.control.clone(),
        };
        let handle = tokio::spawn(worker.run(script));
        if let Ok(mut slot) = self.worker.lock() {
            *slot = Some(handle);
        }
        Ok(())
    }

    /// Request a pause; takes effect at the next line boundary
    pub fn pause(&self) {
        self.control.request.send_modify(|r| r.pause = true);
    }

    /// Resume a paused run from the same line
    pub fn resume(&self) {
        self.control.request.send_modify(|r| r.pause = false);
    }

    /// Request cancellation; takes effect at the next checked boundary
    pub fn cancel(&self) {
        self.control.request.send_modify(|r| r.cancel = true);
    }

    /// Current run state
    pub fn state(&self) -> RunState {
        self.control.state()
    }

    /// Watch run-state transitions
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.control.state.subscribe()
    }

    /// Whether a run is active (running or paused)
    pub fn is_active(&self) -> bool {
        self.control.state().is_active()
    }

    /// Acknowledge a terminal state, resetting the runner to Idle
    ///
    /// Returns false when the run has not finished.
    pub fn acknowledge(&self) -> bool {
        if !self.control.state().is_terminal() {
            return false;
        }
        if let Ok(mut slot) = self.worker.lock() {
            *slot = None;
        }
        self.control.set_state(RunState::Idle);
        true
    }
}

/// The interpretation loop, running on its own task
struct Worker {
    registry: SharedCommandRegistry,
    gateway: Arc<dyn DeviceGateway>,
    waits: Arc<WaitConditionRegistry>,
    reporter: StatusReporter,
    control: Arc<Control>,
}

impl Worker {
    async fn run(self, script: Vec<ScriptLine>) {
        let outcome = self.interpret(&script).await;
        match outcome {
            RunState::Completed => info!("Script run completed"),
            RunState::Cancelled => {
                self.report_progress(0, "Script stopped by user.");
                info!("Script run cancelled");
            }
            RunState::Errored => warn!("Script run halted on error"),
            state => debug!(?state, "Script run ended"),
        }
        self.control.set_state(outcome);
    }

    async fn interpret(&self, script: &[ScriptLine]) -> RunState {
        // Per-run interpreter state: runtime defaults and the loop stack
        let mut defaults: HashMap<String, f64> = HashMap::new();
        let mut frames: Vec<BlockFrame> = Vec::new();
        let mut pc = 0usize;

        loop {
            if !self.control.boundary().await {
                return RunState::Cancelled;
            }

            // Close every block whose body ends at the current position;
            // end of script counts as a dedent to column zero.
            loop {
                let Some(frame) = frames.last_mut() else { break };
                let inside = script
                    .get(pc)
                    .is_some_and(|line| line.indent > frame.indent);
                if inside {
                    break;
                }
                let again = match &mut frame.remaining {
                    Remaining::Open => true,
                    Remaining::Count(n) => {
                        *n -= 1;
                        *n > 0
                    }
                };
                if again {
                    pc = frame.body_start;
                    break;
                }
                frames.pop();
            }

            if pc >= script.len() {
                return RunState::Completed;
            }
            let line = &script[pc];
            self.report_progress(line.number, format!("Executing line {}...", line.number));

            if line.first_word() == Some("CYCLE") {
                let remaining = line.sub_commands[0]
                    .args
                    .first()
                    .and_then(|a| a.parse::<f64>().ok())
                    .map(|n| Remaining::Count(n.max(1.0) as u32))
                    .unwrap_or(Remaining::Open);
                let has_body = script
                    .get(pc + 1)
                    .is_some_and(|next| next.indent > line.indent);
                if has_body {
                    debug!(line = line.number, ?remaining, "Entering CYCLE block");
                    frames.push(BlockFrame {
                        indent: line.indent,
                        body_start: pc + 1,
                        remaining,
                    });
                } else {
                    debug!(line = line.number, "CYCLE block has no body; skipping");
                }
                pc += 1;
                continue;
            }

            match self.execute_line(line, &mut defaults).await {
                LineOutcome::Continue => pc += 1,
                LineOutcome::Halt(state) => return state,
            }
        }
    }

    /// Execute every sub-command of one line, left to right
    async fn execute_line(
        &self,
        line: &ScriptLine,
        defaults: &mut HashMap<String, f64>,
    ) -> LineOutcome {
        for sub in &line.sub_commands {
            if self.control.cancelled() {
                return LineOutcome::Halt(RunState::Cancelled);
            }

            let Some(schema) = self.registry.get(&sub.word) else {
                self.report_error(line.number, format!("Unknown command '{}'.", sub.word));
                return LineOutcome::Halt(RunState::Errored);
            };

            // Keep wait targets in sync with the last commanded setpoint
            if let Some(value) = sub.args.first().and_then(|a| a.parse::<f64>().ok()) {
                match sub.word.as_str() {
                    "SET_HEATER_SETPOINT" => {
                        defaults.insert("HEATER_TARGET".to_string(), value);
                    }
                    "SET_VACUUM_TARGET" => {
                        defaults.insert("VACUUM_TARGET".to_string(), value);
                    }
                    _ => {}
                }
            }

            let ok = match schema.device.as_str() {
                DEVICE_SCRIPT => {
                    self.execute_script_command(line.number, sub, defaults).await
                }
                DEVICE_ALL => {
                    self.broadcast(sub);
                    true
                }
                device => self.dispatch(device, sub, &schema, defaults, line.number),
            };

            if !ok {
                let state = if self.control.cancelled() {
                    RunState::Cancelled
                } else {
                    RunState::Errored
                };
                return LineOutcome::Halt(state);
            }

            sleep(SUB_COMMAND_PACING).await;
        }

        LineOutcome::Continue
    }

    /// Handle script-control commands that never reach a device
    async fn execute_script_command(
        &self,
        line_no: usize,
        sub: &SubCommand,
        defaults: &mut HashMap<String, f64>,
    ) -> bool {
        match sub.word.as_str() {
            "WAIT" => self.timed_wait(line_no, sub, true).await,
            "WAIT_MS" => self.timed_wait(line_no, sub, false).await,
            word if self.waits.contains(word) => {
                self.telemetry_wait(line_no, sub, defaults).await
            }
            word if word.starts_with("SET_DEFAULT_") => {
                if sub.args.len() == 1 {
                    if let Ok(value) = sub.args[0].parse::<f64>() {
                        let key = word.trim_start_matches("SET_DEFAULT_").to_string();
                        debug!(key = %key, value, "Runtime default set");
                        defaults.insert(key, value);
                    }
                }
                true
            }
            word => {
                warn!(command = %word, "Unhandled script-control command");
                true
            }
        }
    }

    /// Sleep for a fixed duration, reporting the remaining time each tick
    async fn timed_wait(&self, line_no: usize, sub: &SubCommand, seconds: bool) -> bool {
        let Some(value) = sub.args.first().and_then(|a| a.parse::<f64>().ok()) else {
            self.report_error(line_no, "WAIT command requires a duration.");
            return false;
        };

        let total = if seconds {
            Duration::from_secs_f64(value)
        } else {
            Duration::from_secs_f64(value / 1000.0)
        };
        let unit = if seconds { "s" } else { "ms" };
        self.report_progress(line_no, format!("Waiting for {} {}...", value, unit));

        let deadline = Instant::now() + total;
        loop {
            if self.control.cancelled() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            let remaining = deadline - now;
            self.report_progress(
                line_no,
                format!("Waiting... {:.1}s remaining", remaining.as_secs_f64()),
            );
            sleep(WAIT_TICK.min(remaining)).await;
        }
    }

    /// Run a registered wait handler for a blocking telemetry condition
    async fn telemetry_wait(
        &self,
        line_no: usize,
        sub: &SubCommand,
        defaults: &HashMap<String, f64>,
    ) -> bool {
        let Some(registration) = self.waits.get(&sub.word) else {
            return false;
        };

        let mut args = Vec::with_capacity(sub.args.len());
        for arg in &sub.args {
            match arg.parse::<f64>() {
                Ok(value) => args.push(value),
                Err(_) => {
                    self.report_error(line_no, format!("Invalid parameters for {}.", sub.word));
                    return false;
                }
            }
        }

        let fallback_target = registration
            .target_key
            .as_deref()
            .and_then(|key| defaults.get(key))
            .copied();
        let fallback_timeout = registration
            .timeout_key
            .as_deref()
            .and_then(|key| defaults.get(key))
            .copied();

        let control = self.control.clone();
        let request = WaitRequest {
            line: line_no,
            args,
            fallback_target,
            fallback_timeout,
            gateway: self.gateway.clone(),
            reporter: self.reporter.clone(),
            live: Arc::new(move || !control.cancelled()),
        };

        (registration.handler)(request).await
    }

    /// Dispatch a device command, filling omitted optional parameters
    fn dispatch(
        &self,
        device: &str,
        sub: &SubCommand,
        schema: &CommandSchema,
        defaults: &HashMap<String, f64>,
        line_no: usize,
    ) -> bool {
        // Arguments beyond the schema are trailing comment text
        let mut full_args: Vec<String> = sub
            .args
            .iter()
            .take(schema.params.len())
            .cloned()
            .collect();

        for idx in full_args.len()..schema.params.len() {
            let param = &schema.params[idx];
            match self.default_for(&schema.name, param, defaults) {
                Some(value) => full_args.push(format!("{}", value)),
                None if !param.optional => {
                    self.report_error(
                        line_no,
                        format!(
                            "Missing required parameter '{}' for {}.",
                            param.name, schema.name
                        ),
                    );
                    return false;
                }
                None => {}
            }
        }

        let text = if full_args.is_empty() {
            schema.name.clone()
        } else {
            format!("{} {}", schema.name, full_args.join(" "))
        };
        self.gateway.send(device, &text);
        true
    }

    /// Resolve the value for an omitted parameter
    ///
    /// MOVE commands consult the runtime defaults set by
    /// SET_DEFAULT_MOVE_* before falling back to the schema default.
    fn default_for(
        &self,
        command: &str,
        param: &axis_core::ParamSpec,
        defaults: &HashMap<String, f64>,
    ) -> Option<f64> {
        if command.starts_with("MOVE") {
            if param.name.contains("Speed") {
                return defaults.get("MOVE_VEL").copied().or(param.default);
            }
            if param.name.contains("Accel") {
                return defaults.get("MOVE_ACC").copied().or(param.default);
            }
            if param.name.contains("Torque") {
                return defaults.get("MOVE_TORQUE").copied().or(param.default);
            }
        }
        param.default
    }

    /// Send a global command to every connected device
    fn broadcast(&self, sub: &SubCommand) {
        for device in self.registry.devices() {
            if device != DEVICE_SCRIPT && device != DEVICE_ALL {
                self.gateway.send(&device, &sub.word);
            }
        }
    }

    fn report_progress(&self, line: usize, message: impl Into<String>) {
        (self.reporter)(StatusReport::progress(line, message));
    }

    fn report_error(&self, line: usize, message: impl Into<String>) {
        (self.reporter)(StatusReport::error(line, message));
    }
}
