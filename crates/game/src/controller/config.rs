//! Per-character tuning values.
//!
//! Angles are in degrees, distances in meters and times in seconds.

use super::ControllerError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How planar (walk) input is conditioned before it becomes a move direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanarPolicy {
    /// Diagonal key combinations stay at (1, 1) and the axis is exponentially
    /// smoothed toward the raw value at `planar_smoothing_rate`.
    #[default]
    Smoothed,
    /// Diagonals are scaled back to unit length and applied without smoothing.
    Normalized,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Planar speed (meters/second).
    pub walk_speed: f32,
    /// Gravity magnitude (meters/second²), applied downwards.
    pub gravity: f32,
    /// Apex height of a jump (meters).
    pub jump_height: f32,
    /// Pointer look multiplier (see `POINTER_DEGREES_PER_COUNT`).
    pub pointer_sensitivity: f32,
    /// Right stick turn rate at full deflection (degrees/second).
    pub gamepad_sensitivity: f32,
    /// Pitch limit in both directions (degrees).
    pub max_pitch_angle: f32,
    /// Analog magnitudes below this radius count as zero.
    pub deadzone: f32,
    /// Pointer smoothing factor in (0, 1]; 1 disables smoothing.
    pub look_smoothing: f32,
    /// Planar smoothing rate (1/second), used by [`PlanarPolicy::Smoothed`].
    pub planar_smoothing_rate: f32,
    pub planar_policy: PlanarPolicy,
    /// Camera height above the body origin (meters).
    pub eye_height: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            walk_speed: 5.0,
            gravity: 9.81,
            jump_height: 2.0,
            pointer_sensitivity: 1.0,
            gamepad_sensitivity: 200.0,
            max_pitch_angle: 85.0,
            deadzone: 0.1,
            look_smoothing: 0.1,
            planar_smoothing_rate: 10.0,
            planar_policy: PlanarPolicy::Smoothed,
            eye_height: 1.6,
        }
    }
}

impl ControllerConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ControllerError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ControllerError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ControllerError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ControllerError> {
        fn positive(name: &str, value: f32) -> Result<(), ControllerError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ControllerError::InvalidConfig(format!(
                    "{} must be positive, got {}",
                    name, value
                )))
            }
        }

        positive("walk_speed", self.walk_speed)?;
        positive("gravity", self.gravity)?;
        positive("pointer_sensitivity", self.pointer_sensitivity)?;
        positive("gamepad_sensitivity", self.gamepad_sensitivity)?;
        positive("planar_smoothing_rate", self.planar_smoothing_rate)?;

        if !(self.jump_height.is_finite() && self.jump_height >= 0.0) {
            return Err(ControllerError::InvalidConfig(format!(
                "jump_height must not be negative, got {}",
                self.jump_height
            )));
        }
        if !(self.max_pitch_angle > 0.0 && self.max_pitch_angle <= 90.0) {
            return Err(ControllerError::InvalidConfig(format!(
                "max_pitch_angle must be in (0, 90], got {}",
                self.max_pitch_angle
            )));
        }
        if !(self.deadzone >= 0.0 && self.deadzone < 1.0) {
            return Err(ControllerError::InvalidConfig(format!(
                "deadzone must be in [0, 1), got {}",
                self.deadzone
            )));
        }
        if !(self.look_smoothing > 0.0 && self.look_smoothing <= 1.0) {
            return Err(ControllerError::InvalidConfig(format!(
                "look_smoothing must be in (0, 1], got {}",
                self.look_smoothing
            )));
        }
        if !self.eye_height.is_finite() {
            return Err(ControllerError::InvalidConfig(String::from(
                "eye_height must be finite",
            )));
        }

        Ok(())
    }
}
