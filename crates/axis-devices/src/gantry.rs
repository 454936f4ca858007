//! Gantry command table
//!
//! Three-axis gantry. Moves are relative; homing searches up to a maximum
//! distance or the axis travel limit.

use axis_core::{CommandSchema, NumericKind::Float, ParamSpec};
use axis_registry::CommandRegistry;

/// Device tag for the gantry controller
pub const DEVICE: &str = "gantry";

/// Relative move schema shared by the three axes
fn move_axis(name: &str, travel: f64, max_speed: f64) -> CommandSchema {
    CommandSchema::new(name, DEVICE)
        .param(ParamSpec::required("Dist(mm)", Float).range(-travel, travel))
        .param(
            ParamSpec::optional("Speed(mm/s)", Float)
                .range(1.0, max_speed)
                .default_value(50.0),
        )
        .param(
            ParamSpec::optional("Accel(mm/s^2)", Float)
                .range(10.0, 10000.0)
                .default_value(200.0),
        )
        .param(
            ParamSpec::optional("Torque(%)", Float)
                .range(0.0, 100.0)
                .default_value(25.0),
        )
}

fn home_axis(name: &str, travel: f64) -> CommandSchema {
    CommandSchema::new(name, DEVICE)
        .describe("Homes the axis, searching up to Max-Dist(mm) or the travel limit.")
        .param(ParamSpec::optional("Max-Dist(mm)", Float).range(1.0, travel))
}

/// Register every gantry command
pub fn register(registry: &CommandRegistry) {
    registry.register(move_axis("MOVE_X", 2000.0, 500.0).describe("Moves the gantry X-axis by a relative distance."));
    registry.register(move_axis("MOVE_Y", 1000.0, 500.0).describe("Moves the gantry Y-axis by a relative distance."));
    registry.register(move_axis("MOVE_Z", 1000.0, 200.0).describe("Moves the gantry Z-axis by a relative distance."));

    registry.register(home_axis("HOME_X", 2000.0));
    registry.register(home_axis("HOME_Y", 1000.0));
    registry.register(home_axis("HOME_Z", 1000.0));

    for axis in ["X", "Y", "Z"] {
        registry.register(
            CommandSchema::new(format!("ENABLE_{axis}"), DEVICE)
                .describe(format!("Enables the gantry {axis}-axis motor.")),
        );
        registry.register(
            CommandSchema::new(format!("DISABLE_{axis}"), DEVICE)
                .describe(format!("Disables the gantry {axis}-axis motor.")),
        );
    }

    registry.register(
        CommandSchema::new("START_DEMO", DEVICE).describe("Starts the circle demo on the gantry."),
    );
}
