//! CLI command handlers.
//!
//! Each handler prints to stdout and returns an exit code; diagnostics go
//! through `tracing`.

use std::io::BufRead;
use std::path::Path;
use std::process::{self, Child, ExitCode, ExitStatus};
use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use super::args::{Cli, Command, RunArgs, ScenarioArgs};
use super::output::{display_system_state, format_progress, print_banner, print_summary};
use crate::config::SimConfig;
use crate::engine::{spawn_realtime, RunSummary, SentinelFile, Simulation, SnapshotSink};
use crate::error::SimResult;
use crate::export::sinks_for;

/// Viewer command lines tried when the configuration names none.
pub const DEFAULT_VIEWER_COMMANDS: [&str; 2] =
    ["python realtime_visualize.py", "python3 realtime_visualize.py"];

const PROGRESS_POLL: Duration = Duration::from_millis(250);

/// Pause between iterations in real-time mode when the configuration sets none.
pub const REALTIME_STEP_DELAY_MS: u64 = 5;

/// Main CLI entry point.
#[must_use]
pub fn run_cli(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run(args) => run_simulation(&args),
        Command::Validate { path } => validate_config(&path),
        Command::Show(args) => show_scenario(&args),
    }
}

/// Build the effective configuration for `nbody run`.
///
/// # Errors
///
/// Returns error if the file cannot be loaded or the result is invalid.
pub fn resolve_config(args: &RunArgs) -> SimResult<SimConfig> {
    let mut config = match &args.config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    args.apply(&mut config);
    config.check()?;
    Ok(config)
}

/// Run a simulation to completion or until stopped.
#[must_use]
pub fn run_simulation(args: &RunArgs) -> ExitCode {
    print_banner("nbody - Gravitational N-Body Simulation");

    let mut config = match resolve_config(args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if args.realtime && config.run.step_delay_ms == 0 {
        config.run.step_delay_ms = REALTIME_STEP_DELAY_MS;
    }

    let simulation = match Simulation::from_config(&config) {
        Ok(simulation) => simulation,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    println!(
        "Scenario: {} | Integrator: {} | Bodies: {}",
        config.scenario.label(),
        simulation.integrator_name(),
        simulation.bodies().len()
    );
    display_system_state("Initial system state:", simulation.bodies());

    let sentinel = SentinelFile::new(&config.output.stop_sentinel);
    if let Err(e) = sentinel.clear_stale() {
        warn!(path = %sentinel.path().display(), %e, "could not remove stale stop sentinel");
    }

    let mut viewer = if args.launch_viewer {
        launch_viewer(&config.output.viewer_command)
    } else {
        None
    };

    let sinks = sinks_for(&config.output);
    let outcome = if args.realtime {
        run_realtime(simulation, sentinel, sinks, config.run.progress_interval)
    } else {
        Ok(run_inline(simulation, &sentinel, sinks))
    };

    if let Some(child) = viewer.as_mut() {
        reap_viewer(child);
    }

    match outcome {
        Ok((simulation, summary)) => {
            display_system_state("Final system state:", simulation.bodies());
            print_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run_inline(
    mut simulation: Simulation,
    sentinel: &SentinelFile,
    mut sinks: Vec<Box<dyn SnapshotSink + Send>>,
) -> (Simulation, RunSummary) {
    let mut targets: Vec<&mut dyn SnapshotSink> = Vec::with_capacity(sinks.len());
    for sink in &mut sinks {
        targets.push(sink.as_mut());
    }
    let summary = simulation.run(sentinel, &mut targets);
    (simulation, summary)
}

fn run_realtime(
    simulation: Simulation,
    sentinel: SentinelFile,
    sinks: Vec<Box<dyn SnapshotSink + Send>>,
    progress_interval: u64,
) -> SimResult<(Simulation, RunSummary)> {
    let run = spawn_realtime(simulation, sentinel, sinks)?;
    let token = run.cancel_token();

    println!("\nSimulation running. Press Enter to stop.\n");
    // Detached: blocks on stdin until a line arrives. EOF leaves the run alone.
    let spawned = thread::Builder::new()
        .name("nbody-stdin".to_string())
        .spawn(move || {
            let mut line = String::new();
            if matches!(std::io::stdin().lock().read_line(&mut line), Ok(n) if n > 0) {
                info!("stop requested from stdin");
                token.cancel();
            }
        });
    if let Err(e) = spawned {
        warn!(%e, "stdin listener unavailable; stop with the sentinel file");
    }

    let mut reader = run.subscriber();
    let mut last_printed: Option<u64> = None;
    loop {
        if let Some(snapshot) = reader.wait_newer(PROGRESS_POLL) {
            let due = last_printed
                .map_or(true, |last| snapshot.iteration >= last + progress_interval);
            if due {
                println!("{}", format_progress(&snapshot));
                last_printed = Some(snapshot.iteration);
            }
        } else if reader.is_closed() {
            break;
        }
    }

    run.join()
}

/// Try each viewer command line in order; `commands` falls back to
/// [`DEFAULT_VIEWER_COMMANDS`] when empty.
///
/// Returns the first viewer process that starts. The caller keeps the handle
/// and reaps it with [`reap_viewer`]; a viewer still open when `nbody` exits
/// keeps running on its own.
#[must_use]
pub fn launch_viewer(commands: &[String]) -> Option<Child> {
    let defaults: Vec<String> = DEFAULT_VIEWER_COMMANDS
        .iter()
        .map(ToString::to_string)
        .collect();
    let candidates = if commands.is_empty() { &defaults[..] } else { commands };

    for command_line in candidates {
        let mut parts = command_line.split_whitespace();
        let Some(program) = parts.next() else {
            continue;
        };
        match process::Command::new(program).args(parts).spawn() {
            Ok(child) => {
                info!(command = %command_line, pid = child.id(), "viewer launched");
                return Some(child);
            }
            Err(e) => {
                warn!(command = %command_line, %e, "viewer launch failed");
            }
        }
    }

    let manual = candidates.first().map_or("python realtime_visualize.py", String::as_str);
    println!("Could not auto-launch visualization. Please run '{manual}' manually.");
    None
}

/// Collect the viewer's exit status if it has already exited.
pub fn reap_viewer(child: &mut Child) -> Option<ExitStatus> {
    match child.try_wait() {
        Ok(Some(status)) => {
            info!(pid = child.id(), %status, "viewer exited");
            Some(status)
        }
        Ok(None) => {
            info!(pid = child.id(), "viewer still running; leaving it open");
            None
        }
        Err(e) => {
            warn!(pid = child.id(), %e, "could not query viewer status");
            None
        }
    }
}

/// Validate a configuration file.
#[must_use]
pub fn validate_config(path: &Path) -> ExitCode {
    println!("Validating: {}", path.display());

    match SimConfig::load(path) {
        Ok(config) => match config.scenario.build_bodies() {
            Ok(bodies) => {
                println!("✓ Configuration valid");
                println!("  Scenario:    {}", config.scenario.label());
                println!("  Bodies:      {}", bodies.len());
                println!("  Integrator:  {:?}", config.run.integrator);
                println!("  Base dt:     {} s", config.run.base_dt);
                println!("  Iterations:  {}", config.run.max_iterations);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("✗ Scenario invalid: {e}");
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("✗ Configuration invalid: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Print the initial state of a scenario.
#[must_use]
pub fn show_scenario(args: &ScenarioArgs) -> ExitCode {
    let mut config = SimConfig::default();
    args.apply(&mut config);

    match config.scenario.build_bodies() {
        Ok(bodies) => {
            display_system_state(&format!("Scenario: {}", config.scenario.label()), &bodies);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::ScenarioConfig;
    use crate::physics::IntegratorKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn yaml_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_resolve_config_flags_override_file() {
        let file = yaml_file(
            r"
run:
  integrator: euler
  max_iterations: 50
scenario:
  kind: kepler
",
        );
        let args = RunArgs {
            config: Some(file.path().to_path_buf()),
            iterations: Some(7),
            ..RunArgs::default()
        };

        let config = resolve_config(&args).unwrap();
        assert_eq!(config.scenario, ScenarioConfig::Kepler);
        assert_eq!(config.run.integrator, IntegratorKind::Euler);
        assert_eq!(config.run.max_iterations, 7);
    }

    #[test]
    fn test_resolve_config_rejects_bad_dt() {
        let args = RunArgs {
            dt: Some(-1.0),
            ..RunArgs::default()
        };
        assert!(resolve_config(&args).is_err());
    }

    #[test]
    fn test_validate_missing_file_fails() {
        assert_eq!(
            validate_config(Path::new("/nonexistent/nbody.yaml")),
            ExitCode::FAILURE
        );
    }

    #[test]
    fn test_validate_good_file() {
        let file = yaml_file("scenario:\n  kind: solar-system\n");
        assert_eq!(validate_config(file.path()), ExitCode::SUCCESS);
    }

    #[test]
    fn test_show_empty_random_fails() {
        let args = ScenarioArgs {
            scenario: Some(crate::cli::ScenarioChoice::Random),
            bodies: Some(0),
            seed: None,
        };
        assert_eq!(show_scenario(&args), ExitCode::FAILURE);
    }

    #[test]
    fn test_launch_viewer_reports_failure() {
        let commands = vec!["/nonexistent/nbody-viewer --flag".to_string(), "   ".to_string()];
        assert!(launch_viewer(&commands).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_launched_viewer_is_reaped() {
        let mut child = launch_viewer(&["true".to_string()]).unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        let status = loop {
            if let Some(status) = reap_viewer(&mut child) {
                break status;
            }
            assert!(std::time::Instant::now() < deadline, "viewer never exited");
            thread::sleep(Duration::from_millis(10));
        };
        assert!(status.success());
    }

    #[test]
    fn test_run_inline_writes_exports() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = SimConfig::builder()
            .scenario(ScenarioConfig::Kepler)
            .max_iterations(20)
            .build();
        config.output.current_state = dir.path().join("state.csv");
        config.output.history = dir.path().join("history.csv");
        let sentinel = SentinelFile::new(dir.path().join("stop"));

        let simulation = Simulation::from_config(&config).unwrap();
        let (simulation, summary) = run_inline(simulation, &sentinel, sinks_for(&config.output));

        assert_eq!(summary.iterations, 20);
        assert_eq!(simulation.iteration(), 20);
        let state = std::fs::read_to_string(&config.output.current_state).unwrap();
        assert_eq!(state.lines().count(), 3);
        let history = std::fs::read_to_string(&config.output.history).unwrap();
        // header + initial + iterations 10 and 20, two bodies each
        assert_eq!(history.lines().count(), 1 + 3 * 2);
    }
}
