//! CLI argument parsing.
//!
//! Flags map onto [`SimConfig`] overrides so a YAML file and the command line
//! compose: file first, then flags.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::{ScenarioConfig, SimConfig};
use crate::physics::IntegratorKind;

/// Gravitational N-body simulator.
#[derive(Debug, Parser)]
#[command(name = "nbody", version, about)]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a simulation.
    Run(RunArgs),
    /// Load and validate a YAML configuration.
    Validate {
        /// Configuration file.
        path: PathBuf,
    },
    /// Print the initial state of a scenario.
    Show(ScenarioArgs),
}

/// Built-in scenario names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScenarioChoice {
    /// Sun through Saturn.
    Solar,
    /// Sun and Earth on a circular orbit.
    Kepler,
    /// Seeded random bodies.
    Random,
}

/// Scenario selection shared by `run` and `show`.
#[derive(Debug, Clone, Default, Args)]
pub struct ScenarioArgs {
    /// Built-in scenario (overrides the configuration file).
    #[arg(long, value_enum)]
    pub scenario: Option<ScenarioChoice>,

    /// Body count for the random scenario.
    #[arg(long)]
    pub bodies: Option<usize>,

    /// Seed for the random scenario.
    #[arg(long)]
    pub seed: Option<u64>,
}

impl ScenarioArgs {
    /// Apply the scenario overrides to `config`.
    ///
    /// `--bodies` or `--seed` alone adjust an already-random scenario.
    pub fn apply(&self, config: &mut SimConfig) {
        match self.scenario {
            Some(ScenarioChoice::Solar) => config.scenario = ScenarioConfig::SolarSystem,
            Some(ScenarioChoice::Kepler) => config.scenario = ScenarioConfig::Kepler,
            Some(ScenarioChoice::Random) => {
                if !matches!(config.scenario, ScenarioConfig::Random { .. }) {
                    config.scenario = ScenarioConfig::random(20, 42);
                }
            }
            None => {}
        }

        if let ScenarioConfig::Random { count, seed, .. } = &mut config.scenario {
            if let Some(bodies) = self.bodies {
                *count = bodies;
            }
            if let Some(value) = self.seed {
                *seed = value;
            }
        }
    }
}

/// Arguments of `nbody run`.
#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// YAML configuration file.
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Scenario selection.
    #[command(flatten)]
    pub scenario: ScenarioArgs,

    /// Iteration bound.
    #[arg(long)]
    pub iterations: Option<u64>,

    /// Base timestep in seconds.
    #[arg(long)]
    pub dt: Option<f64>,

    /// Integration scheme (verlet or euler).
    #[arg(long)]
    pub integrator: Option<IntegratorKind>,

    /// Use the base timestep on every iteration.
    #[arg(long)]
    pub no_adaptive: bool,

    /// Let bodies pass through each other.
    #[arg(long)]
    pub no_collisions: bool,

    /// Skip periodic energy checks.
    #[arg(long)]
    pub no_energy: bool,

    /// Run on a worker thread, print live progress, stop on Enter.
    #[arg(long)]
    pub realtime: bool,

    /// Try to start the external viewer before running.
    #[arg(long)]
    pub launch_viewer: bool,
}

impl RunArgs {
    /// Apply every command-line override to `config`.
    pub fn apply(&self, config: &mut SimConfig) {
        self.scenario.apply(config);

        if let Some(iterations) = self.iterations {
            config.run.max_iterations = iterations;
        }
        if let Some(dt) = self.dt {
            config.run.base_dt = dt;
        }
        if let Some(kind) = self.integrator {
            config.run.integrator = kind;
        }
        if self.no_adaptive {
            config.physics.adaptive_timestep = false;
        }
        if self.no_collisions {
            config.physics.collision_detection = false;
        }
        if self.no_energy {
            config.physics.energy_monitoring = false;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_parse_run_flags() {
        let cli = parse(&[
            "nbody",
            "run",
            "--scenario",
            "random",
            "--bodies",
            "12",
            "--seed",
            "9",
            "--iterations",
            "300",
            "--dt",
            "3600",
            "--integrator",
            "euler",
            "--no-adaptive",
            "--no-collisions",
            "-vv",
        ]);
        assert_eq!(cli.verbose, 2);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };

        let mut config = SimConfig::default();
        args.apply(&mut config);

        assert_eq!(config.scenario, ScenarioConfig::random(12, 9));
        assert_eq!(config.run.max_iterations, 300);
        assert!((config.run.base_dt - 3600.0).abs() < f64::EPSILON);
        assert_eq!(config.run.integrator, IntegratorKind::Euler);
        assert!(!config.physics.adaptive_timestep);
        assert!(!config.physics.collision_detection);
        assert!(config.physics.energy_monitoring);
    }

    #[test]
    fn test_parse_validate() {
        let cli = parse(&["nbody", "validate", "run.yaml"]);
        assert!(matches!(cli.command, Command::Validate { ref path } if path == &PathBuf::from("run.yaml")));
    }

    #[test]
    fn test_parse_show_kepler() {
        let cli = parse(&["nbody", "show", "--scenario", "kepler"]);
        let Command::Show(args) = cli.command else {
            panic!("expected show");
        };
        let mut config = SimConfig::default();
        args.apply(&mut config);
        assert_eq!(config.scenario, ScenarioConfig::Kepler);
    }

    #[test]
    fn test_seed_alone_keeps_non_random_scenario() {
        let args = ScenarioArgs {
            scenario: None,
            bodies: None,
            seed: Some(5),
        };
        let mut config = SimConfig::default();
        args.apply(&mut config);
        assert_eq!(config.scenario, ScenarioConfig::SolarSystem);
    }

    #[test]
    fn test_random_keeps_configured_bounds() {
        let mut config = SimConfig::default();
        config.scenario = ScenarioConfig::Random {
            count: 3,
            max_distance: 5.0e10,
            max_mass: 1.0e25,
            seed: 1,
        };
        let args = ScenarioArgs {
            scenario: Some(ScenarioChoice::Random),
            bodies: Some(8),
            seed: None,
        };
        args.apply(&mut config);
        assert_eq!(
            config.scenario,
            ScenarioConfig::Random {
                count: 8,
                max_distance: 5.0e10,
                max_mass: 1.0e25,
                seed: 1,
            }
        );
    }

    #[test]
    fn test_rejects_unknown_integrator() {
        assert!(Cli::try_parse_from(["nbody", "run", "--integrator", "rk4"]).is_err());
    }
}
