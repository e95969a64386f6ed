//! Camera look.
//!
//! Pitch is accumulated and clamped here; yaw is handed back as a relative
//! turn of the body and never stored.

use super::motion::apply_deadzone;
use super::{ControllerConfig, DeviceSource, RawInput};
use nalgebra::{UnitQuaternion, Vector2, Vector3};

/// Degrees of turn per pointer count at a sensitivity of 1
pub const POINTER_DEGREES_PER_COUNT: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookState {
    /// Degrees, positive looks down
    pub pitch_angle: f32,
    /// Pointer delta after smoothing
    pub smoothed_look_input: Vector2<f32>,
}

impl Default for LookState {
    fn default() -> Self {
        Self {
            pitch_angle: 0.0,
            smoothed_look_input: Vector2::zeros(),
        }
    }
}

/// Look change for one tick, in degrees
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LookDelta {
    /// Upward look input; the stored pitch moves by the negated amount
    pub pitch: f32,
    /// Positive turns right
    pub yaw: f32,
}

#[derive(Debug, Clone, Default)]
pub struct LookController {
    state: LookState,
}

impl LookController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &LookState {
        &self.state
    }

    pub fn look(
        &mut self,
        config: &ControllerConfig,
        source: DeviceSource,
        raw: &RawInput,
        dt: f32,
    ) -> LookDelta {
        let look_axis = raw.signal(source).look_axis;
        let input = match source {
            DeviceSource::Gamepad => {
                // Stale pointer motion must not replay when the pointer takes over again
                self.state.smoothed_look_input = Vector2::zeros();

                let stick = apply_deadzone(look_axis, config.deadzone);
                stick * config.gamepad_sensitivity * dt.max(0.0)
            }
            DeviceSource::PointerAndKeys => {
                let smoothed = self
                    .state
                    .smoothed_look_input
                    .lerp(&look_axis, config.look_smoothing);
                self.state.smoothed_look_input = smoothed;

                // Pointer deltas are already per tick
                apply_deadzone(smoothed, config.deadzone)
                    * config.pointer_sensitivity
                    * POINTER_DEGREES_PER_COUNT
            }
        };

        let delta = LookDelta {
            pitch: input.y,
            yaw: input.x,
        };

        self.state.pitch_angle = (self.state.pitch_angle - delta.pitch)
            .clamp(-config.max_pitch_angle, config.max_pitch_angle);

        log::trace!(
            "Look {:?}: yaw {:.3}, pitch {:.3} -> {:.3}",
            source,
            delta.yaw,
            delta.pitch,
            self.state.pitch_angle
        );

        delta
    }

    /// Camera rotation relative to the body, rebuilt from the stored pitch
    pub fn camera_rotation(&self) -> UnitQuaternion<f32> {
        UnitQuaternion::from_axis_angle(&Vector3::x_axis(), -self.state.pitch_angle.to_radians())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 0.016;

    fn pointer(x: f32, y: f32) -> RawInput {
        RawInput {
            pointer_delta: Vector2::new(x, y),
            ..Default::default()
        }
    }

    fn right_stick(x: f32, y: f32) -> RawInput {
        RawInput {
            gamepad_connected: true,
            gamepad_right_stick: Vector2::new(x, y),
            ..Default::default()
        }
    }

    #[test]
    fn test_pointer_first_tick_lags() {
        let config = ControllerConfig {
            pointer_sensitivity: 100.0,
            look_smoothing: 0.1,
            ..Default::default()
        };
        let mut look = LookController::new();

        let delta = look.look(&config, DeviceSource::PointerAndKeys, &pointer(10.0, -5.0), DT);

        let scale = 100.0 * POINTER_DEGREES_PER_COUNT;
        let smoothed = look.state().smoothed_look_input;
        assert!((smoothed - Vector2::new(1.0, -0.5)).magnitude() < 1e-6);
        assert!((delta.yaw - 1.0 * scale).abs() < 1e-4);
        assert!((delta.pitch - -0.5 * scale).abs() < 1e-4);
    }

    #[test]
    fn test_pointer_is_not_time_scaled() {
        let config = ControllerConfig::default();
        let mut slow = LookController::new();
        let mut fast = LookController::new();

        let a = slow.look(&config, DeviceSource::PointerAndKeys, &pointer(40.0, 0.0), 0.1);
        let b = fast.look(&config, DeviceSource::PointerAndKeys, &pointer(40.0, 0.0), 0.001);
        assert_eq!(a, b);
    }

    #[test]
    fn test_pointer_deadzone_applies_after_smoothing() {
        let config = ControllerConfig::default();
        let mut look = LookController::new();

        // 0.5 counts smooth to 0.05, under the 0.1 deadzone
        let delta = look.look(&config, DeviceSource::PointerAndKeys, &pointer(0.5, 0.0), DT);
        assert_eq!(delta, LookDelta::default());
        assert!(look.state().smoothed_look_input.x > 0.0);
    }

    #[test]
    fn test_gamepad_scales_with_dt() {
        let config = ControllerConfig::default();
        let mut look = LookController::new();

        let delta = look.look(&config, DeviceSource::Gamepad, &right_stick(1.0, 0.0), DT);
        assert!((delta.yaw - config.gamepad_sensitivity * DT).abs() < 1e-4);
        assert_eq!(delta.pitch, 0.0);

        let delta = look.look(&config, DeviceSource::Gamepad, &right_stick(0.05, 0.05), DT);
        assert_eq!(delta, LookDelta::default());
    }

    #[test]
    fn test_looking_up_decreases_pitch() {
        let config = ControllerConfig::default();
        let mut look = LookController::new();

        look.look(&config, DeviceSource::Gamepad, &right_stick(0.0, 1.0), DT);
        assert!(look.state().pitch_angle < 0.0);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let config = ControllerConfig::default();
        let mut look = LookController::new();

        for y in [1.0e6, -1.0e6, 3.0e4, -250.0, 1.0e9, -1.0e9] {
            look.look(&config, DeviceSource::PointerAndKeys, &pointer(0.0, y), DT);
            let pitch = look.state().pitch_angle;
            assert!(pitch >= -config.max_pitch_angle && pitch <= config.max_pitch_angle);
        }

        for _ in 0..1000 {
            look.look(&config, DeviceSource::Gamepad, &right_stick(0.0, -1.0), 0.5);
        }
        assert_eq!(look.state().pitch_angle, config.max_pitch_angle);
    }

    #[test]
    fn test_yaw_is_not_accumulated() {
        let config = ControllerConfig::default();
        let mut look = LookController::new();

        for _ in 0..100 {
            let delta = look.look(&config, DeviceSource::Gamepad, &right_stick(1.0, 0.0), DT);
            assert!((delta.yaw - config.gamepad_sensitivity * DT).abs() < 1e-4);
        }
        assert_eq!(look.state().pitch_angle, 0.0);
    }

    #[test]
    fn test_gamepad_resets_pointer_smoothing() {
        let config = ControllerConfig::default();
        let mut look = LookController::new();

        look.look(&config, DeviceSource::PointerAndKeys, &pointer(50.0, 0.0), DT);
        assert!(look.state().smoothed_look_input.x > 0.0);

        look.look(&config, DeviceSource::Gamepad, &right_stick(0.5, 0.0), DT);
        assert_eq!(look.state().smoothed_look_input, Vector2::zeros());
    }

    #[test]
    fn test_camera_rotation_is_absolute() {
        let config = ControllerConfig::default();
        let mut look = LookController::new();

        for _ in 0..200 {
            look.look(&config, DeviceSource::Gamepad, &right_stick(0.0, 1.0), DT);
            look.look(&config, DeviceSource::Gamepad, &right_stick(0.0, -1.0), DT);
        }

        // Equal up and down input returns exactly to level
        assert_eq!(look.state().pitch_angle, 0.0);
        assert_eq!(look.camera_rotation(), UnitQuaternion::identity());
    }

    #[test]
    fn test_camera_rotation_looks_down_for_positive_pitch() {
        let config = ControllerConfig::default();
        let mut look = LookController::new();

        look.look(&config, DeviceSource::PointerAndKeys, &pointer(0.0, -1.0e6), DT);
        let view = look.camera_rotation() * -Vector3::z();
        assert!(view.y < 0.0);
    }
}
