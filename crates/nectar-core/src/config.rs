use crate::math::Vec3;
use serde::{Deserialize, Serialize};
use std::{error::Error, fmt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimConfigError {
    /// `dt` must be positive and finite.
    InvalidTimestep,
    /// The named field must be positive and finite.
    NonPositive(&'static str),
    /// The named sampling range has min >= max.
    InvalidRange(&'static str),
    /// `max_pitch_deg` must lie in (0, 90).
    InvalidMaxPitch,
    /// `spawn_attempts` must be at least 1.
    InvalidSpawnAttempts,
}

impl fmt::Display for SimConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimConfigError::InvalidTimestep => write!(f, "dt must be positive and finite"),
            SimConfigError::NonPositive(name) => {
                write!(f, "{name} must be positive and finite")
            }
            SimConfigError::InvalidRange(name) => {
                write!(f, "{name} range must have min < max")
            }
            SimConfigError::InvalidMaxPitch => {
                write!(f, "max_pitch_deg must lie in (0, 90)")
            }
            SimConfigError::InvalidSpawnAttempts => {
                write!(f, "spawn_attempts must be at least 1")
            }
        }
    }
}

impl Error for SimConfigError {}

/// Tunable parameters of the foraging simulation. Every field has a default
/// matching the original game, so partial configs deserialize cleanly.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Deterministic seed for reproducible runs.
    pub seed: u64,
    /// Fixed physics timestep in seconds.
    pub dt: f32,
    /// Force applied per unit of the movement action.
    pub move_force: f32,
    /// Pitch rate at full action deflection, degrees per second.
    pub pitch_speed: f32,
    /// Yaw rate at full action deflection, degrees per second.
    pub yaw_speed: f32,
    /// Pitch clamp preventing full inversion, degrees from level.
    pub max_pitch_deg: f32,
    /// Rate limit applied to pitch/yaw action changes, per second.
    pub rotation_smoothing_rate: f32,
    /// Radius of the agent's body collider used for overlap queries.
    pub body_radius: f32,
    /// Beak tip position in the agent's local frame.
    pub beak_tip_offset: Vec3,
    /// Contact tolerance around the beak tip for accepting a feed.
    pub beak_tip_radius: f32,
    /// Nectar extracted per accepted feed tick.
    pub nectar_per_feed: f32,
    /// Flat reward per accepted feed tick (training mode).
    pub feed_reward: f32,
    /// Extra reward at perfect head-on alignment (training mode).
    pub alignment_bonus: f32,
    /// One-time reward on entering a boundary collider (training mode).
    pub boundary_penalty: f32,
    /// Rejection-sampling budget for spawn placement.
    pub spawn_attempts: u32,
    /// Obstacle probe radius around a candidate spawn position.
    pub spawn_probe_radius: f32,
    /// Distance range in front of a flower for anchored spawns.
    pub spawn_flower_distance: (f32, f32),
    /// Height range above the area for free spawns.
    pub spawn_height: (f32, f32),
    /// Horizontal radius range from the area center for free spawns.
    pub spawn_radius: (f32, f32),
    /// Initial pitch range for free spawns, degrees.
    pub spawn_max_pitch_deg: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            dt: 0.02,
            move_force: 2.0,
            pitch_speed: 100.0,
            yaw_speed: 100.0,
            max_pitch_deg: 80.0,
            rotation_smoothing_rate: 2.0,
            body_radius: 0.1,
            beak_tip_offset: Vec3::new(0.0, 0.0, 0.1),
            beak_tip_radius: 0.008,
            nectar_per_feed: 0.01,
            feed_reward: 0.01,
            alignment_bonus: 0.02,
            boundary_penalty: -0.5,
            spawn_attempts: 100,
            spawn_probe_radius: 0.05,
            spawn_flower_distance: (0.10, 0.20),
            spawn_height: (1.2, 2.5),
            spawn_radius: (2.0, 7.0),
            spawn_max_pitch_deg: 60.0,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), SimConfigError> {
        fn positive(value: f32, name: &'static str) -> Result<(), SimConfigError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(SimConfigError::NonPositive(name))
            }
        }
        fn range(r: (f32, f32), name: &'static str) -> Result<(), SimConfigError> {
            if r.0.is_finite() && r.1.is_finite() && r.0 < r.1 {
                Ok(())
            } else {
                Err(SimConfigError::InvalidRange(name))
            }
        }

        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(SimConfigError::InvalidTimestep);
        }
        positive(self.move_force, "move_force")?;
        positive(self.pitch_speed, "pitch_speed")?;
        positive(self.yaw_speed, "yaw_speed")?;
        positive(self.rotation_smoothing_rate, "rotation_smoothing_rate")?;
        positive(self.body_radius, "body_radius")?;
        positive(self.beak_tip_radius, "beak_tip_radius")?;
        positive(self.nectar_per_feed, "nectar_per_feed")?;
        positive(self.spawn_probe_radius, "spawn_probe_radius")?;
        if !(0.0..90.0).contains(&self.max_pitch_deg) || self.max_pitch_deg == 0.0 {
            return Err(SimConfigError::InvalidMaxPitch);
        }
        if self.spawn_attempts == 0 {
            return Err(SimConfigError::InvalidSpawnAttempts);
        }
        range(self.spawn_flower_distance, "spawn_flower_distance")?;
        range(self.spawn_height, "spawn_height")?;
        range(self.spawn_radius, "spawn_radius")?;
        positive(self.spawn_max_pitch_deg, "spawn_max_pitch_deg")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        SimConfig::default().validate().unwrap();
    }

    #[test]
    fn validate_rejects_bad_timestep_and_ranges() {
        let mut config = SimConfig::default();
        config.dt = 0.0;
        assert_eq!(config.validate(), Err(SimConfigError::InvalidTimestep));

        let mut config = SimConfig::default();
        config.spawn_radius = (7.0, 2.0);
        assert_eq!(
            config.validate(),
            Err(SimConfigError::InvalidRange("spawn_radius"))
        );

        let mut config = SimConfig::default();
        config.max_pitch_deg = 95.0;
        assert_eq!(config.validate(), Err(SimConfigError::InvalidMaxPitch));

        let mut config = SimConfig::default();
        config.spawn_attempts = 0;
        assert_eq!(config.validate(), Err(SimConfigError::InvalidSpawnAttempts));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: SimConfig = serde_json::from_str(r#"{"seed": 7, "move_force": 3.5}"#).unwrap();
        assert_eq!(config.seed, 7);
        assert!((config.move_force - 3.5).abs() < 1e-6);
        assert!((config.dt - 0.02).abs() < 1e-6);
        config.validate().unwrap();
    }
}
