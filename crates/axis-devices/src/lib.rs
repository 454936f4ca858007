//! Static device command tables for the axis engine
//!
//! Each module declares the command schemas for one device and registers
//! them into a [`CommandRegistry`]. Registration is explicit and happens
//! once at startup; there is no runtime module discovery.

use axis_registry::CommandRegistry;
use tracing::debug;

pub mod fillhead;
pub mod gantry;
pub mod global;
pub mod press;
pub mod pressurizer;
pub mod script_control;

/// Build a registry populated with every known device command
pub fn default_registry() -> CommandRegistry {
    let registry = CommandRegistry::new();
    fillhead::register(&registry);
    gantry::register(&registry);
    press::register(&registry);
    pressurizer::register(&registry);
    global::register(&registry);
    script_control::register(&registry);
    debug!(
        commands = registry.command_count(),
        "Built default command registry"
    );
    registry
}
