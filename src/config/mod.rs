//! Run configuration with YAML schema and validation.
//!
//! Loading follows three gates:
//! - serde parses the YAML into typed structs (unknown keys are rejected)
//! - `validator` checks field ranges
//! - a semantic pass checks cross-field constraints and the scenario

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{SimError, SimResult};
use crate::export::HistoryFormat;
use crate::physics::IntegratorKind;

/// Top-level configuration for one simulation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SimConfig {
    /// Physics toggles, fixed for the whole run.
    #[validate(nested)]
    #[serde(default)]
    pub physics: SimulationConfig,

    /// Loop bounds and cadences.
    #[validate(nested)]
    #[serde(default)]
    pub run: RunConfig,

    /// Initial body set.
    #[serde(default)]
    pub scenario: ScenarioConfig,

    /// Export destinations.
    #[validate(nested)]
    #[serde(default)]
    pub output: OutputConfig,
}

impl SimConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - YAML parsing fails
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> SimResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails.
    pub fn from_yaml(yaml: &str) -> SimResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.check()?;
        Ok(config)
    }

    /// Serialize to YAML.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_yaml(&self) -> SimResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Run range validation and the semantic pass.
    ///
    /// # Errors
    ///
    /// Returns the first failed constraint.
    pub fn check(&self) -> SimResult<()> {
        self.validate()?;
        self.validate_semantic()
    }

    /// Create a builder for configuration.
    #[must_use]
    pub fn builder() -> SimConfigBuilder {
        SimConfigBuilder::default()
    }

    fn validate_semantic(&self) -> SimResult<()> {
        if !(self.physics.collision_distance_factor > 0.0) {
            return Err(SimError::config(format!(
                "collision distance factor must be positive, got {}",
                self.physics.collision_distance_factor
            )));
        }

        let dt = self.run.base_dt;
        if !dt.is_finite() || dt <= 0.0 {
            return Err(SimError::config(format!(
                "base timestep must be positive and finite, got {dt}"
            )));
        }

        self.scenario.validate_scenario()
    }
}

/// Configuration builder for programmatic construction.
#[derive(Debug, Default)]
pub struct SimConfigBuilder {
    base_dt: Option<f64>,
    max_iterations: Option<u64>,
    integrator: Option<IntegratorKind>,
    adaptive_timestep: Option<bool>,
    collision_detection: Option<bool>,
    energy_monitoring: Option<bool>,
    energy_check_interval: Option<u64>,
    scenario: Option<ScenarioConfig>,
}

impl SimConfigBuilder {
    /// Set the base timestep in seconds.
    #[must_use]
    pub const fn base_dt(mut self, dt: f64) -> Self {
        self.base_dt = Some(dt);
        self
    }

    /// Set the iteration bound.
    #[must_use]
    pub const fn max_iterations(mut self, iterations: u64) -> Self {
        self.max_iterations = Some(iterations);
        self
    }

    /// Select the integrator.
    #[must_use]
    pub const fn integrator(mut self, kind: IntegratorKind) -> Self {
        self.integrator = Some(kind);
        self
    }

    /// Enable or disable the adaptive timestep.
    #[must_use]
    pub const fn adaptive_timestep(mut self, enabled: bool) -> Self {
        self.adaptive_timestep = Some(enabled);
        self
    }

    /// Enable or disable collision merging.
    #[must_use]
    pub const fn collision_detection(mut self, enabled: bool) -> Self {
        self.collision_detection = Some(enabled);
        self
    }

    /// Enable or disable energy monitoring.
    #[must_use]
    pub const fn energy_monitoring(mut self, enabled: bool) -> Self {
        self.energy_monitoring = Some(enabled);
        self
    }

    /// Set how often (in iterations) energy is recomputed.
    #[must_use]
    pub const fn energy_check_interval(mut self, interval: u64) -> Self {
        self.energy_check_interval = Some(interval);
        self
    }

    /// Set the initial body set.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // ScenarioConfig owns heap data
    pub fn scenario(mut self, scenario: ScenarioConfig) -> Self {
        self.scenario = Some(scenario);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> SimConfig {
        let mut config = SimConfig::default();

        if let Some(dt) = self.base_dt {
            config.run.base_dt = dt;
        }
        if let Some(iterations) = self.max_iterations {
            config.run.max_iterations = iterations;
        }
        if let Some(kind) = self.integrator {
            config.run.integrator = kind;
        }
        if let Some(enabled) = self.adaptive_timestep {
            config.physics.adaptive_timestep = enabled;
        }
        if let Some(enabled) = self.collision_detection {
            config.physics.collision_detection = enabled;
        }
        if let Some(enabled) = self.energy_monitoring {
            config.physics.energy_monitoring = enabled;
        }
        if let Some(interval) = self.energy_check_interval {
            config.run.energy_check_interval = interval;
        }
        if let Some(scenario) = self.scenario {
            config.scenario = scenario;
        }

        config
    }
}

/// Physics toggles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    /// Shrink the step under strong acceleration.
    #[serde(default = "default_true")]
    pub adaptive_timestep: bool,
    /// Merge bodies that come within range.
    #[serde(default = "default_true")]
    pub collision_detection: bool,
    /// Multiplier on summed radii for the collision threshold.
    #[validate(range(min = 0.0))]
    #[serde(default = "default_collision_distance_factor")]
    pub collision_distance_factor: f64,
    /// Track energy drift against the initial baseline.
    #[serde(default = "default_true")]
    pub energy_monitoring: bool,
    /// Relative drift reported as a warning.
    #[validate(range(min = 0.0))]
    #[serde(default = "default_energy_tolerance")]
    pub energy_tolerance: f64,
}

const fn default_true() -> bool {
    true
}

const fn default_collision_distance_factor() -> f64 {
    2.0
}

const fn default_energy_tolerance() -> f64 {
    1e-6
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            adaptive_timestep: true,
            collision_detection: true,
            collision_distance_factor: default_collision_distance_factor(),
            energy_monitoring: true,
            energy_tolerance: default_energy_tolerance(),
        }
    }
}

/// Loop bounds and cadences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Base timestep (s).
    #[serde(default = "default_base_dt")]
    pub base_dt: f64,
    /// Stop after this many iterations.
    #[validate(range(min = 1))]
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u64,
    /// Recompute energy every N iterations.
    #[validate(range(min = 1))]
    #[serde(default = "default_energy_check_interval")]
    pub energy_check_interval: u64,
    /// Publish a snapshot every N iterations.
    #[validate(range(min = 1))]
    #[serde(default = "default_one")]
    pub publish_interval: u64,
    /// Log progress every N iterations.
    #[validate(range(min = 1))]
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,
    /// Integration scheme.
    #[serde(default)]
    pub integrator: IntegratorKind,
    /// Sleep after each iteration (ms); paces real-time viewing.
    #[serde(default)]
    pub step_delay_ms: u64,
}

const fn default_base_dt() -> f64 {
    86_400.0
}

const fn default_max_iterations() -> u64 {
    1_000_000
}

const fn default_energy_check_interval() -> u64 {
    100
}

const fn default_one() -> u64 {
    1
}

const fn default_progress_interval() -> u64 {
    100
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            base_dt: default_base_dt(),
            max_iterations: default_max_iterations(),
            energy_check_interval: default_energy_check_interval(),
            publish_interval: default_one(),
            progress_interval: default_progress_interval(),
            integrator: IntegratorKind::default(),
            step_delay_ms: 0,
        }
    }
}

/// Initial body set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ScenarioConfig {
    /// Sun through Saturn.
    #[default]
    SolarSystem,
    /// Sun and Earth on a circular orbit.
    Kepler,
    /// Seeded random bodies orbiting a notional central mass.
    Random {
        /// Number of bodies to draw.
        #[serde(default = "default_random_count")]
        count: usize,
        /// Half-width of the position cube (m).
        #[serde(default = "default_max_distance")]
        max_distance: f64,
        /// Upper bound on body mass (kg).
        #[serde(default = "default_max_mass")]
        max_mass: f64,
        /// Generator seed.
        #[serde(default = "default_seed")]
        seed: u64,
    },
    /// Explicit body list.
    Bodies {
        /// Bodies in slot order.
        bodies: Vec<BodyConfig>,
    },
}

const fn default_random_count() -> usize {
    20
}

const fn default_max_distance() -> f64 {
    1.0e11
}

const fn default_max_mass() -> f64 {
    1.0e30
}

const fn default_seed() -> u64 {
    42
}

impl ScenarioConfig {
    /// Random scenario with the default bounds.
    #[must_use]
    pub const fn random(count: usize, seed: u64) -> Self {
        Self::Random {
            count,
            max_distance: default_max_distance(),
            max_mass: default_max_mass(),
            seed,
        }
    }

    fn validate_scenario(&self) -> SimResult<()> {
        match self {
            Self::SolarSystem | Self::Kepler => Ok(()),
            Self::Random {
                count,
                max_distance,
                max_mass,
                ..
            } => {
                if *count == 0 {
                    return Err(SimError::config("random scenario needs at least one body"));
                }
                if !(*max_distance > 0.0) || !max_distance.is_finite() {
                    return Err(SimError::config(format!(
                        "random max_distance must be positive, got {max_distance}"
                    )));
                }
                if !(*max_mass > 0.0) || !max_mass.is_finite() {
                    return Err(SimError::config(format!(
                        "random max_mass must be positive, got {max_mass}"
                    )));
                }
                Ok(())
            }
            Self::Bodies { bodies } => {
                if bodies.is_empty() {
                    return Err(SimError::config("body list is empty"));
                }
                for (index, body) in bodies.iter().enumerate() {
                    body.validate().map_err(|err| {
                        SimError::config(format!("body {index} ({}): {err}", body.name))
                    })?;
                }
                Ok(())
            }
        }
    }
}

/// One body in an explicit scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct BodyConfig {
    /// Label.
    #[serde(default)]
    pub name: String,
    /// Mass (kg). Values below the minimum produce an inactive body.
    #[validate(range(min = 0.0))]
    pub mass: f64,
    /// Position (m).
    pub position: [f64; 3],
    /// Velocity (m/s).
    #[serde(default)]
    pub velocity: [f64; 3],
    /// Radius (m); derived from mass when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
}

/// Export destinations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Latest snapshot, overwritten on every publish.
    #[serde(default = "default_current_state")]
    pub current_state: PathBuf,
    /// Appended history of snapshots.
    #[serde(default = "default_history")]
    pub history: PathBuf,
    /// History layout.
    #[serde(default)]
    pub history_format: HistoryFormat,
    /// Append to history every N iterations.
    #[validate(range(min = 1))]
    #[serde(default = "default_history_interval")]
    pub history_interval: u64,
    /// File whose presence requests a stop.
    #[serde(default = "default_stop_sentinel")]
    pub stop_sentinel: PathBuf,
    /// Viewer command lines, tried in order.
    #[serde(default)]
    pub viewer_command: Vec<String>,
}

fn default_current_state() -> PathBuf {
    PathBuf::from("nbody_realtime_data.csv")
}

fn default_history() -> PathBuf {
    PathBuf::from("nbody_simulation_results.csv")
}

const fn default_history_interval() -> u64 {
    10
}

fn default_stop_sentinel() -> PathBuf {
    PathBuf::from("shutdown_signal.txt")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            current_state: default_current_state(),
            history: default_history(),
            history_format: HistoryFormat::default(),
            history_interval: default_history_interval(),
            stop_sentinel: default_stop_sentinel(),
            viewer_command: Vec::new(),
        }
    }
}
