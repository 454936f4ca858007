//! Device gateway seam for the axis motion-control engine
//!
//! The engine never talks to sockets or widgets. Everything it needs from
//! the outside world goes through [`DeviceGateway`]: fire-and-forget
//! command dispatch and best-effort telemetry reads by name. This crate
//! also provides [`TelemetryStore`], the concurrent name->value map that
//! transport layers feed with live readings, and [`RecordingGateway`], a
//! store-backed gateway used by tests and dry runs.

use dashmap::DashMap;
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, trace};

/// Errors surfaced by a gateway
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("telemetry value not found: {0}")]
    TelemetryNotFound(String),

    #[error("device not connected: {0}")]
    DeviceNotConnected(String),
}

/// The narrow interface between the engine and the hardware layer
///
/// `send` is fire-and-forget: the engine relies on wait-commands for
/// synchronization, not on per-command acknowledgments. `read_telemetry`
/// is best-effort and may return stale or unparsable values; callers must
/// tolerate both.
pub trait DeviceGateway: Send + Sync {
    /// Dispatch a command line to a device
    fn send(&self, device: &str, command: &str);

    /// Read the latest value of a named telemetry field
    fn read_telemetry(&self, name: &str) -> Result<String, GatewayError>;
}

/// Live telemetry values keyed by field name
///
/// Values are plain strings as received from the device; numeric consumers
/// parse the first whitespace-delimited token (readings often carry a unit
/// suffix, e.g. "-12.3 PSIG").
pub struct TelemetryStore {
    values: DashMap<String, String>,
}

impl TelemetryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            values: DashMap::new(),
        }
    }

    /// Set a telemetry value
    pub fn set(&self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        trace!(name = %name, value = %value, "Telemetry update");
        self.values.insert(name, value);
    }

    /// Get the latest value for a field
    pub fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).map(|v| v.clone())
    }

    /// Remove a field (e.g. when a device disconnects)
    pub fn remove(&self, name: &str) -> Option<String> {
        self.values.remove(name).map(|(_, v)| v)
    }

    /// All known field names
    pub fn names(&self) -> Vec<String> {
        self.values.iter().map(|v| v.key().clone()).collect()
    }

    /// Number of known fields
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no fields are known
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Default for TelemetryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// One dispatched command as seen by a [`RecordingGateway`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentCommand {
    /// Target device tag
    pub device: String,

    /// Full command text (word plus arguments)
    pub command: String,
}

/// A gateway backed by a [`TelemetryStore`] that records every dispatch
///
/// Used by integration tests and the CLI dry-run mode in place of the UDP
/// transport.
pub struct RecordingGateway {
    telemetry: TelemetryStore,
    sent: Mutex<Vec<SentCommand>>,
}

impl RecordingGateway {
    /// Create a gateway with an empty telemetry store
    pub fn new() -> Self {
        Self {
            telemetry: TelemetryStore::new(),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// The backing telemetry store
    pub fn telemetry(&self) -> &TelemetryStore {
        &self.telemetry
    }

    /// Every command dispatched so far, in order
    pub fn sent(&self) -> Vec<SentCommand> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }

    /// Number of commands dispatched so far
    pub fn sent_count(&self) -> usize {
        self.sent.lock().map(|sent| sent.len()).unwrap_or(0)
    }
}

impl Default for RecordingGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceGateway for RecordingGateway {
    fn send(&self, device: &str, command: &str) {
        debug!(device = %device, command = %command, "Dispatching command");
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(SentCommand {
                device: device.to_string(),
                command: command.to_string(),
            });
        }
    }

    fn read_telemetry(&self, name: &str) -> Result<String, GatewayError> {
        self.telemetry
            .get(name)
            .ok_or_else(|| GatewayError::TelemetryNotFound(name.to_string()))
    }
}
