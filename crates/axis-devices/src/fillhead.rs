//! Fillhead command table
//!
//! The fillhead combines the injector motors, the heater PID loop, the
//! vacuum system, and the two pinch valves. Injection and valve moves
//! signal completion through telemetry; the engine does not wait on them
//! unless the script says so.

use axis_core::{CommandSchema, NumericKind::Float, ParamSpec};
use axis_registry::CommandRegistry;

/// Device tag for the fillhead controller
pub const DEVICE: &str = "fillhead";

fn schema(name: &str) -> CommandSchema {
    CommandSchema::new(name, DEVICE)
}

/// Register every fillhead command
pub fn register(registry: &CommandRegistry) {
    registry.register(
        schema("INJECT_STATOR")
            .describe("Injects a specific volume using the Stator (5:1) cartridge settings.")
            .param(ParamSpec::required("Volume(ml)", Float).range(0.0, 1000.0))
            .param(
                ParamSpec::optional("Speed(ml/s)", Float)
                    .range(0.01, 5.0)
                    .default_value(0.25),
            ),
    );
    registry.register(
        schema("INJECT_ROTOR")
            .describe("Injects a specific volume using the Rotor (1:1) cartridge settings.")
            .param(ParamSpec::required("Volume(ml)", Float).range(0.0, 1000.0))
            .param(
                ParamSpec::optional("Speed(ml/s)", Float)
                    .range(0.01, 5.0)
                    .default_value(0.25),
            ),
    );
    registry.register(
        schema("JOG_MOVE")
            .describe("Jogs the injector motors by a relative distance. M0 is Machine, M1 is Cartridge.")
            .param(ParamSpec::required("Dist-M0(mm)", Float).range(-100.0, 100.0))
            .param(ParamSpec::required("Dist-M1(mm)", Float).range(-100.0, 100.0))
            .param(
                ParamSpec::optional("Speed(mm/s)", Float)
                    .range(0.01, 5.0)
                    .default_value(1.0),
            )
            .param(
                ParamSpec::optional("Accel(mm/s^2)", Float)
                    .range(1.0, 50.0)
                    .default_value(10.0),
            )
            .param(
                ParamSpec::optional("Torque(%)", Float)
                    .range(0.0, 100.0)
                    .default_value(20.0),
            ),
    );

    // Heater PID
    registry.register(
        schema("SET_HEATER_SETPOINT")
            .describe("Sets the target temperature for the heater PID.")
            .param(ParamSpec::required("Temp(C)", Float).range(20.0, 150.0)),
    );
    registry.register(
        schema("SET_HEATER_GAINS")
            .describe("Sets the PID gains for the heater.")
            .param(ParamSpec::required("Kp", Float).range(0.0, 1000.0))
            .param(ParamSpec::required("Ki", Float).range(0.0, 1000.0))
            .param(ParamSpec::required("Kd", Float).range(0.0, 1000.0)),
    );
    registry.register(schema("HEATER_ON").describe("Turns the heater PID controller on."));
    registry.register(schema("HEATER_OFF").describe("Turns the heater PID controller off."));

    // Homing
    registry.register(
        schema("MACHINE_HOME_MOVE")
            .describe("Homes the main machine axis using hardcoded parameters from firmware."),
    );
    registry.register(schema("CARTRIDGE_HOME_MOVE").describe(
        "Homes the injector against the cartridge using hardcoded parameters from firmware.",
    ));
    registry.register(
        schema("MOVE_TO_CARTRIDGE_HOME")
            .describe("Moves the injector to the zero position of the cartridge."),
    );

    // Pinch valves
    registry.register(schema("INJECTION_VALVE_OPEN").describe("Opens the injection pinch valve."));
    registry
        .register(schema("INJECTION_VALVE_CLOSE").describe("Closes the injection pinch valve."));
    registry.register(
        schema("INJECTION_VALVE_JOG")
            .describe("Jogs the injection pinch valve by a relative distance.")
            .param(ParamSpec::required("Dist(mm)", Float).range(-50.0, 50.0)),
    );
    registry.register(schema("VACUUM_VALVE_OPEN").describe("Opens the vacuum pinch valve."));
    registry.register(schema("VACUUM_VALVE_CLOSE").describe("Closes the vacuum pinch valve."));
    registry.register(
        schema("VACUUM_VALVE_JOG")
            .describe("Jogs the vacuum pinch valve by a relative distance.")
            .param(ParamSpec::required("Dist(mm)", Float).range(-50.0, 50.0)),
    );

    // Injection lifecycle
    registry.register(schema("PAUSE_INJECTION").describe("Pauses an ongoing injection or purge."));
    registry.register(schema("RESUME_INJECTION").describe("Resumes a paused injection or purge."));
    registry.register(schema("CANCEL_INJECTION").describe("Cancels an injection or purge."));
    registry.register(schema("ENABLE").describe("Enables all injector motors."));
    registry.register(schema("DISABLE").describe("Disables all injector motors."));

    // Vacuum system
    registry.register(schema("VACUUM_ON").describe("Turns the vacuum pump ON and opens the valve."));
    registry
        .register(schema("VACUUM_OFF").describe("Turns the vacuum pump OFF and closes the valve."));
    registry.register(
        schema("VACUUM_LEAK_TEST")
            .describe("Starts the automated vacuum leak test sequence in the firmware."),
    );
    registry.register(
        schema("SET_VACUUM_TARGET")
            .describe("Sets the target pressure for the vacuum system.")
            .param(ParamSpec::required("Target(PSIG)", Float).range(-14.5, 0.0)),
    );
    registry.register(
        schema("SET_VACUUM_TIMEOUT_S")
            .describe("Sets the timeout for reaching the vacuum target.")
            .param(ParamSpec::required("Timeout(s)", Float).range(1.0, 300.0)),
    );
    registry.register(
        schema("SET_LEAK_TEST_DELTA")
            .describe("Sets the maximum allowed pressure drop for the leak test.")
            .param(ParamSpec::required("Delta(PSI)", Float).range(0.01, 5.0)),
    );
    registry.register(
        schema("SET_LEAK_TEST_DURATION_S")
            .describe("Sets the duration of the leak test measurement period.")
            .param(ParamSpec::required("Duration(s)", Float).range(1.0, 300.0)),
    );
}
