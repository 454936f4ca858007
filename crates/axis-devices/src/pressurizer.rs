//! Pressurizer command table

use axis_core::{
    CommandSchema,
    NumericKind::{Float, Int},
    ParamSpec,
};
use axis_registry::CommandRegistry;

/// Device tag for the pressurizer controller
pub const DEVICE: &str = "pressurizer";

/// Register every pressurizer command
pub fn register(registry: &CommandRegistry) {
    registry.register(
        CommandSchema::new("PRESSURIZER_HOME", DEVICE).describe("Homes the pressurizer."),
    );
    registry.register(
        CommandSchema::new("PRESSURIZER_SET_PRESSURE", DEVICE)
            .describe("Sets the target pressure.")
            .param(ParamSpec::required("Pressure(msw)", Float).range(0.0, 100.0))
            .param(ParamSpec::optional("Rate(msw/s)", Float).range(0.1, 10.0)),
    );
    registry.register(
        CommandSchema::new("PRESSURIZER_SET_TEMP", DEVICE)
            .describe("Sets the temperature for a specific tank.")
            .param(ParamSpec::required("Tank(1/2)", Int).range(1.0, 2.0))
            .param(ParamSpec::required("Temp(C)", Float).range(0.0, 100.0)),
    );
    registry.register(
        CommandSchema::new("PRESSURIZER_CLEAR_ERRORS", DEVICE)
            .describe("Clears any active errors on the device."),
    );
    registry
        .register(CommandSchema::new("PRESSURIZER_ENABLE", DEVICE).describe("Enables the motors."));
    registry.register(
        CommandSchema::new("PRESSURIZER_DISABLE", DEVICE).describe("Disables the motors."),
    );
}
