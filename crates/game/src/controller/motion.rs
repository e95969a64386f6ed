//! Locomotion integration.
//!
//! Turns the arbitrated planar input, the jump edge and gravity into the
//! displacement requested from the character motor for one tick.

use super::{ControllerConfig, DeviceSource, PlanarPolicy, RawInput};
use nalgebra::{UnitQuaternion, Vector2, Vector3};

/// Vertical velocity held while resting on the ground, so the motor keeps
/// reporting contact instead of flickering between grounded and airborne.
pub const GROUND_STICK_VELOCITY: f32 = -2.0;

/// Directions shorter than this have no meaningful heading.
const MIN_DIRECTION_LENGTH: f32 = 1.0e-5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionState {
    pub vertical_velocity: f32,
    pub is_grounded: bool,
    /// Planar axis after deadzone and smoothing, in input space
    pub smoothed_planar_input: Vector2<f32>,
}

impl Default for MotionState {
    fn default() -> Self {
        Self {
            vertical_velocity: 0.0,
            is_grounded: false,
            smoothed_planar_input: Vector2::zeros(),
        }
    }
}

/// Displacement requested for one tick.
///
/// The motor receives two moves, planar first and vertical second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionStep {
    pub planar: Vector3<f32>,
    pub vertical: Vector3<f32>,
    /// A jump velocity was assigned this tick
    pub jumped: bool,
}

impl MotionStep {
    /// Single displacement for motors that take one move per tick
    pub fn total(&self) -> Vector3<f32> {
        self.planar + self.vertical
    }
}

/// Zero any analog vector shorter than the deadzone radius
pub fn apply_deadzone(axis: Vector2<f32>, deadzone: f32) -> Vector2<f32> {
    if axis.magnitude() < deadzone {
        Vector2::zeros()
    } else {
        axis
    }
}

/// Fraction of the remaining distance an exponential filter covers in `dt`
pub fn smoothing_factor(rate: f32, dt: f32) -> f32 {
    1.0 - (-rate * dt).exp()
}

/// Launch speed that peaks at `height` under `gravity`
pub fn jump_velocity(height: f32, gravity: f32) -> f32 {
    (height * 2.0 * gravity).sqrt()
}

#[derive(Debug, Clone, Default)]
pub struct MotionIntegrator {
    state: MotionState,
}

impl MotionIntegrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &MotionState {
        &self.state
    }

    pub fn integrate(
        &mut self,
        config: &ControllerConfig,
        source: DeviceSource,
        raw: &RawInput,
        grounded_now: bool,
        dt: f32,
        facing: &UnitQuaternion<f32>,
    ) -> MotionStep {
        let dt = dt.max(0.0);
        let state = &mut self.state;

        state.is_grounded = grounded_now;
        if grounded_now && state.vertical_velocity < 0.0 {
            state.vertical_velocity = GROUND_STICK_VELOCITY;
        }

        let signal = raw.signal(source);
        let raw_axis = apply_deadzone(signal.planar_axis, config.deadzone);

        let axis = match config.planar_policy {
            PlanarPolicy::Smoothed => {
                let t = smoothing_factor(config.planar_smoothing_rate, dt);
                let mut smoothed = state.smoothed_planar_input.lerp(&raw_axis, t);

                // Let go of the residue once released, or the heading below keeps it at full speed
                if raw_axis == Vector2::zeros() && smoothed.magnitude() < config.deadzone {
                    smoothed = Vector2::zeros();
                }
                smoothed
            }
            PlanarPolicy::Normalized => {
                let length = raw_axis.magnitude();
                if length > 1.0 { raw_axis / length } else { raw_axis }
            }
        };
        state.smoothed_planar_input = axis;

        let right = facing * Vector3::x();
        let forward = facing * -Vector3::z();
        let direction = (right * axis.x + forward * axis.y)
            .try_normalize(MIN_DIRECTION_LENGTH)
            .unwrap_or_else(Vector3::zeros);
        let planar_velocity = direction * config.walk_speed;

        let jumped = grounded_now && signal.jump_requested;
        if jumped {
            state.vertical_velocity = jump_velocity(config.jump_height, config.gravity);
            log::debug!("Jump with velocity {:.3}", state.vertical_velocity);
        }

        state.vertical_velocity -= config.gravity * dt;

        log::trace!(
            "Move {:?}: axis {:?}, vertical velocity {:.3}, grounded {}",
            source,
            axis,
            state.vertical_velocity,
            grounded_now
        );

        MotionStep {
            planar: planar_velocity * dt,
            vertical: Vector3::y() * state.vertical_velocity * dt,
            jumped,
        }
    }
}
