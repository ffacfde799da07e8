//! Configuration System
//!
//! Loads tuning parameters from a TOML file so timings, speeds and combat
//! numbers can be adjusted without recompiling. Every section has defaults,
//! so a file only needs the keys it changes.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default tuning file path
pub const DEFAULT_TUNING_PATH: &str = "empire.toml";

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Top-level configuration structure
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub simulation: SimulationConfig,
    pub movement: MovementConfig,
    pub states: StateConfig,
    pub agents: AgentConfig,
    pub combat: CombatConfig,
    pub dragons: DragonConfig,
}

/// Tick scheduling parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Simulation ticks per second
    pub tick_rate: u32,
    /// Upper bound on ticks executed in one rendered frame
    pub max_ticks_per_frame: u32,
    /// Frame deltas above this are clamped before accumulation
    pub max_frame_delta_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate: 30,
            max_ticks_per_frame: 3,
            max_frame_delta_ms: 100,
        }
    }
}

impl SimulationConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(1) / self.tick_rate.max(1)
    }

    pub fn max_frame_delta(&self) -> Duration {
        Duration::from_millis(self.max_frame_delta_ms)
    }
}

/// Agent movement parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Units per second
    pub speed: f32,
    /// Arrival is detected when closer than this to the target
    pub arrival_epsilon: f32,
    /// Distance between neighbours in a party formation
    pub formation_spacing: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            speed: 5.0,
            arrival_epsilon: 0.1,
            formation_spacing: 2.0,
        }
    }
}

/// Durations of the timed agent states
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    pub thinking_ms: u64,
    pub working_ms: u64,
    pub completing_ms: u64,
    /// Task label an agent shows after finishing work
    pub idle_task_label: String,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            thinking_ms: 2000,
            working_ms: 3000,
            completing_ms: 1500,
            idle_task_label: "Awaiting orders...".to_string(),
        }
    }
}

impl StateConfig {
    pub fn thinking(&self) -> Duration {
        Duration::from_millis(self.thinking_ms)
    }

    pub fn working(&self) -> Duration {
        Duration::from_millis(self.working_ms)
    }

    pub fn completing(&self) -> Duration {
        Duration::from_millis(self.completing_ms)
    }
}

/// Agent spawning parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub max_agents: usize,
    pub max_health: f32,
    /// Half-width of the square (or radius of the circle) used for spawning
    pub spawn_radius: f32,
    /// Center of the spawn area
    pub spawn_base: [f32; 3],
    pub grid_spacing: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_agents: 500,
            max_health: 100.0,
            spawn_radius: 20.0,
            spawn_base: [25.0, 0.0, 25.0],
            grid_spacing: 2.0,
        }
    }
}

/// Reinforcement parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Fraction of max health below which a fighting agent calls for help
    pub reinforcement_health_ratio: f32,
    /// How far from the caller a dragon may be to count as its opponent
    pub dragon_search_radius: f32,
    /// Most agents one call can pull in
    pub max_reinforcements: usize,
    /// How far from the caller an idle agent may be to answer
    pub recruit_radius: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            reinforcement_health_ratio: 0.4,
            dragon_search_radius: 10.0,
            max_reinforcements: 20,
            recruit_radius: 25.0,
        }
    }
}

/// Dragon AI parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DragonConfig {
    pub max_health: f32,
    /// Distance covered per tick while chasing a target
    pub step_per_tick: f32,
    pub attack_range: f32,
    /// Inclusive damage bounds
    pub damage_min: u32,
    pub damage_max: u32,
}

impl Default for DragonConfig {
    fn default() -> Self {
        Self {
            max_health: 500.0,
            step_per_tick: 0.016,
            attack_range: 2.0,
            damage_min: 5,
            damage_max: 14,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse and validate configuration from a TOML string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default path, or use defaults if not found
    pub fn load_or_default() -> Self {
        Self::load(DEFAULT_TUNING_PATH).unwrap_or_else(|e| {
            tracing::warn!("Could not load {}: {}. Using defaults.", DEFAULT_TUNING_PATH, e);
            Self::default()
        })
    }

    /// Returns the configuration as a TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
            ConfigError::Invalid {
                field,
                reason: reason.into(),
            }
        }

        if self.simulation.tick_rate == 0 {
            return Err(invalid("simulation.tick_rate", "must be at least 1"));
        }
        if self.simulation.max_ticks_per_frame == 0 {
            return Err(invalid("simulation.max_ticks_per_frame", "must be at least 1"));
        }
        fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(invalid(field, "must be finite and non-negative"))
            }
        }

        non_negative("movement.speed", self.movement.speed)?;
        non_negative("movement.formation_spacing", self.movement.formation_spacing)?;
        non_negative("agents.grid_spacing", self.agents.grid_spacing)?;
        non_negative("combat.dragon_search_radius", self.combat.dragon_search_radius)?;
        non_negative("combat.recruit_radius", self.combat.recruit_radius)?;
        non_negative("dragons.attack_range", self.dragons.attack_range)?;
        if !(self.movement.arrival_epsilon.is_finite() && self.movement.arrival_epsilon > 0.0) {
            return Err(invalid("movement.arrival_epsilon", "must be finite and positive"));
        }
        if !(self.agents.max_health.is_finite() && self.agents.max_health > 0.0) {
            return Err(invalid("agents.max_health", "must be finite and positive"));
        }
        if !(self.agents.spawn_radius.is_finite() && self.agents.spawn_radius >= 0.0) {
            return Err(invalid("agents.spawn_radius", "must be finite and non-negative"));
        }
        if !self.agents.spawn_base.iter().all(|c| c.is_finite()) {
            return Err(invalid("agents.spawn_base", "must be finite"));
        }
        if !(0.0..=1.0).contains(&self.combat.reinforcement_health_ratio) {
            return Err(invalid(
                "combat.reinforcement_health_ratio",
                "must be between 0 and 1",
            ));
        }
        if !(self.dragons.max_health.is_finite() && self.dragons.max_health > 0.0) {
            return Err(invalid("dragons.max_health", "must be finite and positive"));
        }
        if !self.dragons.step_per_tick.is_finite() {
            return Err(invalid("dragons.step_per_tick", "must be finite"));
        }
        if self.dragons.damage_min > self.dragons.damage_max {
            return Err(invalid(
                "dragons.damage_min",
                format!(
                    "{} exceeds damage_max {}",
                    self.dragons.damage_min, self.dragons.damage_max
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.simulation.tick_rate, 30);
        assert_eq!(config.simulation.max_ticks_per_frame, 3);
        assert_eq!(config.states.thinking(), Duration::from_millis(2000));
        assert_eq!(config.dragons.damage_min, 5);
        assert_eq!(config.dragons.damage_max, 14);
    }

    #[test]
    fn test_tick_interval() {
        let sim = SimulationConfig {
            tick_rate: 30,
            ..Default::default()
        };
        assert_eq!(sim.tick_interval(), Duration::from_nanos(33_333_333));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = Config::parse(
            r#"
[movement]
speed = 8.0

[dragons]
attack_range = 3.5
"#,
        )
        .unwrap();
        assert_eq!(config.movement.speed, 8.0);
        assert_eq!(config.movement.arrival_epsilon, 0.1);
        assert_eq!(config.dragons.attack_range, 3.5);
        assert_eq!(config.states.working_ms, 3000);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = Config::parse("[simulation]\ntick_rate = 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "simulation.tick_rate",
                ..
            }
        ));

        let err = Config::parse("[dragons]\ndamage_min = 20\ndamage_max = 10\n").unwrap_err();
        assert!(err.to_string().contains("dragons.damage_min"));
    }

    #[test]
    fn test_negative_or_nan_distances_rejected() {
        let err = Config::parse("[dragons]\nattack_range = -1.0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "dragons.attack_range",
                ..
            }
        ));

        let err = Config::parse("[combat]\nrecruit_radius = nan\n").unwrap_err();
        assert!(err.to_string().contains("combat.recruit_radius"));

        let err = Config::parse("[movement]\nformation_spacing = -2.0\n").unwrap_err();
        assert!(err.to_string().contains("movement.formation_spacing"));

        let err = Config::parse("[dragons]\nmax_health = 0.0\n").unwrap_err();
        assert!(err.to_string().contains("dragons.max_health"));
    }

    #[test]
    fn test_parse_error() {
        let err = Config::parse("[movement\nspeed = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        let parsed = Config::parse(&toml).unwrap();
        assert_eq!(parsed.agents.max_agents, config.agents.max_agents);
        assert_eq!(parsed.states.idle_task_label, config.states.idle_task_label);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empire.toml");
        std::fs::write(&path, "[combat]\nmax_reinforcements = 4\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.combat.max_reinforcements, 4);

        let missing = Config::load(dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io(_)));
    }
}
