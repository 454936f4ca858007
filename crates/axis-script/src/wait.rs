//! Blocking wait-commands
//!
//! A wait-command polls a named telemetry value until a numeric condition
//! holds or a timeout elapses. Handlers report progress on every poll,
//! check a liveness flag each tick so cancellation stays cooperative, and
//! return a plain success flag: a timeout or an unreadable value never
//! panics the engine.

use axis_core::{StatusReport, StatusReporter};
use axis_gateway::DeviceGateway;
use dashmap::DashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::time::{sleep, Duration, Instant};
use tracing::debug;

/// Cadence at which handlers poll telemetry
pub const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Callback telling a handler whether the run is still active
pub type LivenessCheck = Arc<dyn Fn() -> bool + Send + Sync>;

/// Future type returned by wait handlers; resolves to the success flag
pub type WaitFuture = Pin<Box<dyn Future<Output = bool> + Send>>;

/// Wait handler function type
pub type WaitHandler = Arc<dyn Fn(WaitRequest) -> WaitFuture + Send + Sync>;

/// Everything a handler needs for one wait
pub struct WaitRequest {
    /// Script line the wait was issued from (reports are keyed by it)
    pub line: usize,

    /// Numeric arguments from the sub-command, in order
    pub args: Vec<f64>,

    /// Target to use when the script omits one
    pub fallback_target: Option<f64>,

    /// Timeout in seconds to use when the script omits one
    pub fallback_timeout: Option<f64>,

    /// Gateway the telemetry value is read through
    pub gateway: Arc<dyn DeviceGateway>,

    /// Status-report sink
    pub reporter: StatusReporter,

    /// Liveness flag, checked every poll tick
    pub live: LivenessCheck,
}

/// Static description of one wait condition
#[derive(Debug, Clone)]
pub struct WaitSpec {
    /// Telemetry field polled each tick
    pub metric: String,

    /// Lower-case name used in waiting/timeout messages (e.g. "vacuum")
    pub label: String,

    /// Capitalized name used in the success message (e.g. "Vacuum")
    pub title: String,

    /// Unit suffix for reported readings (e.g. "PSIG")
    pub unit: String,

    /// Timeout applied when neither the script nor a runtime default
    /// provides one
    pub default_timeout: Duration,
}

impl WaitSpec {
    /// Create a spec
    pub fn new(
        metric: impl Into<String>,
        label: impl Into<String>,
        title: impl Into<String>,
        unit: impl Into<String>,
        default_timeout: Duration,
    ) -> Self {
        Self {
            metric: metric.into(),
            label: label.into(),
            title: title.into(),
            unit: unit.into(),
            default_timeout,
        }
    }
}

/// A handler plus the runtime-default keys consulted for omitted arguments
#[derive(Clone)]
pub struct WaitRegistration {
    /// The handler invoked for this wait-command
    pub handler: WaitHandler,

    /// Runtime-defaults key consulted when the script omits the target
    pub target_key: Option<String>,

    /// Runtime-defaults key consulted when the script omits the timeout
    pub timeout_key: Option<String>,
}

/// Registry of wait-commands keyed by command word
pub struct WaitConditionRegistry {
    waits: DashMap<String, WaitRegistration>,
}

impl WaitConditionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            waits: DashMap::new(),
        }
    }

    /// Registry with the standard vacuum and heater waits
    pub fn standard() -> Self {
        let registry = Self::new();

        registry.register(
            "WAIT_UNTIL_VACUUM",
            WaitRegistration {
                handler: drain_to_target(WaitSpec::new(
                    "vacuum_psig",
                    "vacuum",
                    "Vacuum",
                    "PSIG",
                    Duration::from_secs(60),
                )),
                target_key: Some("VACUUM_TARGET".to_string()),
                timeout_key: Some("VACUUM_TIMEOUT".to_string()),
            },
        );

        registry.register(
            "WAIT_UNTIL_HEATER_AT_TEMP",
            WaitRegistration {
                handler: converge_within(
                    WaitSpec::new("temp_c", "temp", "Heater", "C", Duration::from_secs(100)),
                    0.05,
                ),
                target_key: Some("HEATER_TARGET".to_string()),
                timeout_key: Some("HEATER_TIMEOUT".to_string()),
            },
        );

        registry
    }

    /// Register a wait-command
    pub fn register(&self, word: impl Into<String>, registration: WaitRegistration) {
        let word = word.into().to_uppercase();
        debug!(command = %word, "Registering wait condition");
        self.waits.insert(word, registration);
    }

    /// Look up a wait-command by word
    pub fn get(&self, word: &str) -> Option<WaitRegistration> {
        self.waits.get(&word.to_uppercase()).map(|w| w.clone())
    }

    /// Check whether a command word is a registered wait
    pub fn contains(&self, word: &str) -> bool {
        self.waits.contains_key(&word.to_uppercase())
    }

    /// Number of registered waits
    pub fn wait_count(&self) -> usize {
        self.waits.len()
    }
}

impl Default for WaitConditionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a telemetry field and parse its first whitespace token as f64
///
/// Readings often carry a unit suffix ("-12.3 PSIG"); anything after the
/// first token is ignored. Returns None for missing or unparsable values.
fn read_numeric(gateway: &dyn DeviceGateway, name: &str) -> Option<f64> {
    let raw = gateway.read_telemetry(name).ok()?;
    raw.split_whitespace().next()?.parse().ok()
}

/// Resolve the effective timeout: script argument, then runtime default,
/// then the spec default
fn resolve_timeout(req: &WaitRequest, spec: &WaitSpec) -> Duration {
    req.args
        .get(1)
        .copied()
        .or(req.fallback_timeout)
        .map(|secs| Duration::from_secs_f64(secs.max(0.0)))
        .unwrap_or(spec.default_timeout)
}

/// Handler for a draining quantity: succeeds when `current <= target`
pub fn drain_to_target(spec: WaitSpec) -> WaitHandler {
    Arc::new(move |req: WaitRequest| {
        let spec = spec.clone();
        let fut = async move {
            let Some(target) = req.args.first().copied().or(req.fallback_target) else {
                (req.reporter)(StatusReport::error(
                    req.line,
                    format!("Invalid parameters for {} wait: no target.", spec.label),
                ));
                return false;
            };
            let timeout = resolve_timeout(&req, &spec);
            let deadline = Instant::now() + timeout;

            loop {
                if !(req.live)() {
                    return false;
                }
                if Instant::now() > deadline {
                    (req.reporter)(StatusReport::error(
                        req.line,
                        format!("Timeout waiting for {} target.", spec.label),
                    ));
                    return false;
                }

                match read_numeric(req.gateway.as_ref(), &spec.metric) {
                    Some(current) => {
                        (req.reporter)(StatusReport::progress(
                            req.line,
                            format!(
                                "Waiting for {} <= {:.2}, current: {:.2}",
                                spec.label, target, current
                            ),
                        ));
                        if current <= target {
                            (req.reporter)(StatusReport::progress(
                                req.line,
                                format!(
                                    "{} target reached ({:.2} {}).",
                                    spec.title, current, spec.unit
                                ),
                            ));
                            return true;
                        }
                    }
                    None => {
                        (req.reporter)(StatusReport::progress(
                            req.line,
                            format!("Waiting for {}... (current value invalid)", spec.label),
                        ));
                    }
                }

                sleep(POLL_INTERVAL).await;
            }
        };
        Box::pin(fut) as WaitFuture
    })
}

/// Handler for a converging quantity: succeeds when the reading is within
/// `tolerance_frac` of the target magnitude on either side
pub fn converge_within(spec: WaitSpec, tolerance_frac: f64) -> WaitHandler {
    Arc::new(move |req: WaitRequest| {
        let spec = spec.clone();
        let fut = async move {
            let Some(target) = req.args.first().copied().or(req.fallback_target) else {
                (req.reporter)(StatusReport::error(
                    req.line,
                    format!("Invalid parameters for {} wait: no target.", spec.label),
                ));
                return false;
            };
            let timeout = resolve_timeout(&req, &spec);
            let deadline = Instant::now() + timeout;

            let tolerance = target.abs() * tolerance_frac;
            let lower = target - tolerance;
            let upper = target + tolerance;

            loop {
                if !(req.live)() {
                    return false;
                }
                if Instant::now() > deadline {
                    (req.reporter)(StatusReport::error(
                        req.line,
                        format!("Timeout waiting for {} target.", spec.label),
                    ));
                    return false;
                }

                match read_numeric(req.gateway.as_ref(), &spec.metric) {
                    Some(current) => {
                        (req.reporter)(StatusReport::progress(
                            req.line,
                            format!(
                                "Waiting for {} in range [{:.1}..{:.1}]{}, current: {:.1}{}",
                                spec.label, lower, upper, spec.unit, current, spec.unit
                            ),
                        ));
                        if lower <= current && current <= upper {
                            (req.reporter)(StatusReport::progress(
                                req.line,
                                format!(
                                    "{} target reached ({:.1} {}).",
                                    spec.title, current, spec.unit
                                ),
                            ));
                            return true;
                        }
                    }
                    None => {
                        (req.reporter)(StatusReport::progress(
                            req.line,
                            format!("Waiting for {}... (current value invalid)", spec.label),
                        ));
                    }
                }

                sleep(POLL_INTERVAL).await;
            }
        };
        Box::pin(fut) as WaitFuture
    })
}
