//! Commands broadcast to every connected device

use axis_core::{CommandSchema, DEVICE_ALL};
use axis_registry::CommandRegistry;

/// Register global commands
pub fn register(registry: &CommandRegistry) {
    registry.register(
        CommandSchema::new("ABORT", DEVICE_ALL).describe("Stops all motion on every device."),
    );
}
