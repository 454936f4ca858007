//! axis command-line tool
//!
//! Validates a script file against the default device registry and, with
//! `--run`, executes it against a recording gateway seeded with nominal
//! telemetry. Useful for checking scripts before they go anywhere near
//! hardware.

use anyhow::{bail, Context, Result};
use axis_core::{ReportKind, StatusReport, StatusReporter};
use axis_gateway::RecordingGateway;
use axis_script::{parse_script, ScriptRunner, Validator, WaitConditionRegistry};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

fn print_report(report: &StatusReport) {
    let prefix = match report.kind {
        ReportKind::Progress => "     ",
        ReportKind::Error => "ERROR",
    };
    if report.line > 0 {
        println!("{} L{}: {}", prefix, report.line, report.message);
    } else {
        println!("{} {}", prefix, report.message);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::WARN)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        bail!("usage: axis <script-file> [--run]");
    };
    let run = args.next().as_deref() == Some("--run");

    let script = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read script file '{}'", path))?;

    let registry = Arc::new(axis_devices::default_registry());
    info!(commands = registry.command_count(), "Registry ready");

    let validator = Validator::new(registry.clone());
    let errors = validator.validate(&script);
    if !errors.is_empty() {
        for error in &errors {
            eprintln!("ERROR L{}: {}", error.line, error.message);
        }
        bail!("{} validation error(s)", errors.len());
    }
    println!("OK    {} validates clean", path);

    if !run {
        return Ok(());
    }

    // Dry run against a recording gateway with nominal telemetry
    let gateway = Arc::new(RecordingGateway::new());
    gateway.telemetry().set("vacuum_psig", "-14.0 PSIG");
    gateway.telemetry().set("temp_c", "110.0 C");

    let reporter: StatusReporter = Arc::new(|report| print_report(&report));
    let runner = ScriptRunner::new(
        registry,
        gateway.clone(),
        Arc::new(WaitConditionRegistry::standard()),
        reporter,
    );

    runner.start(parse_script(&script))?;
    let mut states = runner.subscribe();
    loop {
        let state = *states.borrow_and_update();
        if state.is_terminal() {
            println!("Run finished: {:?}", state);
            break;
        }
        states.changed().await?;
    }

    println!("Dispatched {} command(s):", gateway.sent_count());
    for sent in gateway.sent() {
        println!("  {} <- {}", sent.device, sent.command);
    }

    Ok(())
}
