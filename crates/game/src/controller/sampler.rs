//! Input sampling.
//!
//! Platform events are latched as they arrive (press sets, release clears)
//! and turned into one [`RawInput`] snapshot per tick. Edge flags and pointer
//! motion are consumed by the snapshot that reads them.

use super::DeviceSource;
use crate::prelude::*;

use std::sync::{Arc, Mutex};

/// Direction keys currently held
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeldKeys {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
}

impl HeldKeys {
    /// Key axis: right/forward win over left/back when both are held.
    /// Diagonals are not normalized here.
    pub fn axis(&self) -> Vector2<f32> {
        let x = if self.right {
            1.0
        } else if self.left {
            -1.0
        } else {
            0.0
        };
        let y = if self.forward {
            1.0
        } else if self.back {
            -1.0
        } else {
            0.0
        };
        Vector2::new(x, y)
    }
}

/// Instantaneous input for one tick, all devices side by side.
///
/// Look-related vectors use +x right, +y up. Every gamepad field is zero or
/// false while no gamepad is connected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawInput {
    pub pointer_delta: Vector2<f32>,
    pub keys: HeldKeys,
    pub keyboard_jump_pressed: bool,
    pub gamepad_connected: bool,
    pub gamepad_left_stick: Vector2<f32>,
    pub gamepad_right_stick: Vector2<f32>,
    pub gamepad_jump_held: bool,
    pub gamepad_jump_pressed: bool,
}

impl Default for RawInput {
    fn default() -> Self {
        Self {
            pointer_delta: Vector2::zeros(),
            keys: HeldKeys::default(),
            keyboard_jump_pressed: false,
            gamepad_connected: false,
            gamepad_left_stick: Vector2::zeros(),
            gamepad_right_stick: Vector2::zeros(),
            gamepad_jump_held: false,
            gamepad_jump_pressed: false,
        }
    }
}

impl RawInput {
    /// Jump edge from either device
    pub fn jump_pressed(&self) -> bool {
        self.keyboard_jump_pressed || self.gamepad_jump_pressed
    }

    /// The part of this input that `source` contributes
    pub fn signal(&self, source: DeviceSource) -> InputSignal {
        let (planar_axis, look_axis) = match source {
            DeviceSource::Gamepad => (self.gamepad_left_stick, self.gamepad_right_stick),
            DeviceSource::PointerAndKeys => (self.keys.axis(), self.pointer_delta),
        };

        InputSignal {
            planar_axis,
            look_axis,
            jump_requested: self.jump_pressed(),
        }
    }
}

/// Device-independent input for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputSignal {
    /// Walk input, unit range per axis
    pub planar_axis: Vector2<f32>,
    /// Stick deflection, or pointer counts for this tick
    pub look_axis: Vector2<f32>,
    pub jump_requested: bool,
}

/// Latched input state, written by event callbacks between ticks.
#[derive(Debug, Clone)]
pub struct InputLatches {
    keys: HeldKeys,
    keyboard_jump_held: bool,
    keyboard_jump_pressed: bool,
    pointer_delta: Vector2<f32>,
    gamepad_connected: bool,
    left_stick: Vector2<f32>,
    right_stick: Vector2<f32>,
    gamepad_jump_held: bool,
    gamepad_jump_pressed: bool,
}

impl Default for InputLatches {
    fn default() -> Self {
        Self {
            keys: HeldKeys::default(),
            keyboard_jump_held: false,
            keyboard_jump_pressed: false,
            pointer_delta: Vector2::zeros(),
            gamepad_connected: false,
            left_stick: Vector2::zeros(),
            right_stick: Vector2::zeros(),
            gamepad_jump_held: false,
            gamepad_jump_pressed: false,
        }
    }
}

impl InputLatches {
    pub fn apply(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::KeyPressed { key, repeat } => self.set_key(key, true, repeat),
            InputEvent::KeyReleased(key) => self.set_key(key, false, false),
            InputEvent::PointerMotion { dx, dy } => {
                // Screen space grows downwards; look input grows upwards
                self.pointer_delta += Vector2::new(dx, -dy);
            }
            InputEvent::FocusLost => {
                self.keys = HeldKeys::default();
                self.keyboard_jump_held = false;
                self.gamepad_jump_held = false;
            }
            InputEvent::GamepadConnected => {
                self.gamepad_connected = true;
            }
            InputEvent::GamepadDisconnected => {
                self.gamepad_connected = false;
                self.left_stick = Vector2::zeros();
                self.right_stick = Vector2::zeros();
                self.gamepad_jump_held = false;
                self.gamepad_jump_pressed = false;
            }
            InputEvent::GamepadButtonPressed(GamepadButton::South) => {
                if !self.gamepad_jump_held {
                    self.gamepad_jump_pressed = true;
                }
                self.gamepad_jump_held = true;
            }
            InputEvent::GamepadButtonReleased(GamepadButton::South) => {
                self.gamepad_jump_held = false;
            }
            InputEvent::GamepadAxisChanged(axis, value) => {
                let value = if value.is_finite() {
                    value.clamp(-1.0, 1.0)
                } else {
                    0.0
                };
                match axis {
                    GamepadAxis::LeftStickX => self.left_stick.x = value,
                    GamepadAxis::LeftStickY => self.left_stick.y = value,
                    GamepadAxis::RightStickX => self.right_stick.x = value,
                    GamepadAxis::RightStickY => self.right_stick.y = value,
                    _ => {}
                }
            }
            _ => {}
        }
    }

    fn set_key(&mut self, key: KeyCode, down: bool, repeat: bool) {
        match key {
            KeyCode::KeyW => self.keys.forward = down,
            KeyCode::KeyS => self.keys.back = down,
            KeyCode::KeyA => self.keys.left = down,
            KeyCode::KeyD => self.keys.right = down,
            KeyCode::Space => {
                // Repeats also arrive after focus loss cleared the held flag
                if down && !repeat && !self.keyboard_jump_held {
                    self.keyboard_jump_pressed = true;
                }
                self.keyboard_jump_held = down;
            }
            _ => {}
        }
    }

    /// Snapshot for this tick, consuming edges and accumulated pointer motion
    pub fn take(&mut self) -> RawInput {
        let connected = self.gamepad_connected;
        RawInput {
            pointer_delta: std::mem::replace(&mut self.pointer_delta, Vector2::zeros()),
            keys: self.keys,
            keyboard_jump_pressed: std::mem::take(&mut self.keyboard_jump_pressed),
            gamepad_connected: connected,
            gamepad_left_stick: if connected { self.left_stick } else { Vector2::zeros() },
            gamepad_right_stick: if connected { self.right_stick } else { Vector2::zeros() },
            gamepad_jump_held: connected && self.gamepad_jump_held,
            gamepad_jump_pressed: std::mem::take(&mut self.gamepad_jump_pressed) && connected,
        }
    }
}

/// Per-character input source.
///
/// Holds the bus subscription that feeds its latches; dropping the sampler
/// unsubscribes.
#[derive(Debug)]
pub struct InputSampler {
    latches: Arc<Mutex<InputLatches>>,
    subscription: Subscription,
}

impl InputSampler {
    pub fn new(bus: &InputBus) -> Self {
        let latches = Arc::new(Mutex::new(InputLatches::default()));
        let writer = Arc::downgrade(&latches);
        let subscription = bus.subscribe(move |event| {
            if let Some(latches) = writer.upgrade() {
                match latches.lock() {
                    Ok(mut latches) => latches.apply(event),
                    Err(_) => log::warn!("Input latches poisoned, dropping {:?}", event),
                }
            }
        });

        Self {
            latches,
            subscription,
        }
    }

    /// Read this tick's input. A failed read yields empty input.
    pub fn sample(&mut self) -> RawInput {
        match self.latches.lock() {
            Ok(mut latches) => latches.take(),
            Err(_) => {
                log::warn!("Input latches poisoned, treating tick as idle");
                RawInput::default()
            }
        }
    }

    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(key: KeyCode) -> InputEvent {
        InputEvent::KeyPressed { key, repeat: false }
    }

    #[test]
    fn test_key_axis() {
        let mut latches = InputLatches::default();
        latches.apply(&press(KeyCode::KeyW));
        latches.apply(&press(KeyCode::KeyD));
        assert_eq!(latches.take().keys.axis(), Vector2::new(1.0, 1.0));

        latches.apply(&InputEvent::KeyReleased(KeyCode::KeyW));
        latches.apply(&press(KeyCode::KeyS));
        assert_eq!(latches.take().keys.axis(), Vector2::new(1.0, -1.0));
    }

    #[test]
    fn test_opposite_keys_prefer_right_and_forward() {
        let keys = HeldKeys {
            forward: true,
            back: true,
            left: true,
            right: true,
        };
        assert_eq!(keys.axis(), Vector2::new(1.0, 1.0));
    }

    #[test]
    fn test_jump_edge_fires_once_while_held() {
        let mut latches = InputLatches::default();
        latches.apply(&press(KeyCode::Space));
        assert!(latches.take().keyboard_jump_pressed);

        // Auto-repeat while held
        latches.apply(&InputEvent::KeyPressed {
            key: KeyCode::Space,
            repeat: true,
        });
        assert!(!latches.take().keyboard_jump_pressed);
        assert!(!latches.take().keyboard_jump_pressed);

        latches.apply(&InputEvent::KeyReleased(KeyCode::Space));
        latches.apply(&press(KeyCode::Space));
        assert!(latches.take().keyboard_jump_pressed);
    }

    #[test]
    fn test_tap_between_ticks_is_not_lost() {
        let mut latches = InputLatches::default();
        latches.apply(&InputEvent::GamepadConnected);
        latches.apply(&InputEvent::GamepadButtonPressed(GamepadButton::South));
        latches.apply(&InputEvent::GamepadButtonReleased(GamepadButton::South));

        let raw = latches.take();
        assert!(raw.gamepad_jump_pressed);
        assert!(!raw.gamepad_jump_held);
    }

    #[test]
    fn test_pointer_motion_accumulates_and_flips_y() {
        let mut latches = InputLatches::default();
        latches.apply(&InputEvent::PointerMotion { dx: 3.0, dy: 1.0 });
        latches.apply(&InputEvent::PointerMotion { dx: 2.0, dy: 4.0 });

        assert_eq!(latches.take().pointer_delta, Vector2::new(5.0, -5.0));
        assert_eq!(latches.take().pointer_delta, Vector2::zeros());
    }

    #[test]
    fn test_missing_gamepad_reads_as_zero() {
        let mut latches = InputLatches::default();
        latches.apply(&InputEvent::GamepadAxisChanged(GamepadAxis::LeftStickX, 0.8));

        let raw = latches.take();
        assert!(!raw.gamepad_connected);
        assert_eq!(raw.gamepad_left_stick, Vector2::zeros());
    }

    #[test]
    fn test_disconnect_clears_sticks() {
        let mut latches = InputLatches::default();
        latches.apply(&InputEvent::GamepadConnected);
        latches.apply(&InputEvent::GamepadAxisChanged(GamepadAxis::RightStickY, 0.5));
        latches.apply(&InputEvent::GamepadButtonPressed(GamepadButton::South));
        assert_eq!(latches.take().gamepad_right_stick, Vector2::new(0.0, 0.5));

        latches.apply(&InputEvent::GamepadDisconnected);
        latches.apply(&InputEvent::GamepadConnected);

        let raw = latches.take();
        assert_eq!(raw.gamepad_right_stick, Vector2::zeros());
        assert!(!raw.gamepad_jump_held);
    }

    #[test]
    fn test_focus_lost_releases_keys() {
        let mut latches = InputLatches::default();
        latches.apply(&press(KeyCode::KeyW));
        latches.apply(&press(KeyCode::Space));
        latches.take();

        latches.apply(&InputEvent::FocusLost);
        assert_eq!(latches.take().keys, HeldKeys::default());

        // Next press is a fresh edge
        latches.apply(&press(KeyCode::Space));
        assert!(latches.take().keyboard_jump_pressed);
    }

    #[test]
    fn test_repeat_after_focus_loss_is_not_a_jump() {
        let repeat = |key| InputEvent::KeyPressed { key, repeat: true };
        let mut latches = InputLatches::default();
        latches.apply(&press(KeyCode::Space));
        latches.apply(&press(KeyCode::KeyW));
        latches.take();

        // Focus comes back with both keys still physically down
        latches.apply(&InputEvent::FocusLost);
        latches.apply(&repeat(KeyCode::Space));
        latches.apply(&repeat(KeyCode::KeyW));

        let raw = latches.take();
        assert!(!raw.keyboard_jump_pressed);
        assert!(raw.keys.forward);

        latches.apply(&InputEvent::KeyReleased(KeyCode::Space));
        latches.apply(&press(KeyCode::Space));
        assert!(latches.take().keyboard_jump_pressed);
    }

    #[test]
    fn test_axis_values_are_clamped() {
        let mut latches = InputLatches::default();
        latches.apply(&InputEvent::GamepadConnected);
        latches.apply(&InputEvent::GamepadAxisChanged(GamepadAxis::LeftStickX, 3.0));
        latches.apply(&InputEvent::GamepadAxisChanged(GamepadAxis::LeftStickY, f32::NAN));

        assert_eq!(latches.take().gamepad_left_stick, Vector2::new(1.0, 0.0));
    }

    #[test]
    fn test_signal_follows_source() {
        let raw = RawInput {
            pointer_delta: Vector2::new(4.0, 2.0),
            keys: HeldKeys {
                back: true,
                ..Default::default()
            },
            gamepad_connected: true,
            gamepad_left_stick: Vector2::new(0.3, 0.0),
            gamepad_right_stick: Vector2::new(0.0, -0.7),
            gamepad_jump_pressed: true,
            ..Default::default()
        };

        let keys = raw.signal(DeviceSource::PointerAndKeys);
        assert_eq!(keys.planar_axis, Vector2::new(0.0, -1.0));
        assert_eq!(keys.look_axis, Vector2::new(4.0, 2.0));

        let pad = raw.signal(DeviceSource::Gamepad);
        assert_eq!(pad.planar_axis, Vector2::new(0.3, 0.0));
        assert_eq!(pad.look_axis, Vector2::new(0.0, -0.7));

        // Either device may jump regardless of which one steers
        assert!(keys.jump_requested && pad.jump_requested);
    }

    #[test]
    fn test_sampler_reads_bus_and_unsubscribes_on_drop() {
        let bus = InputBus::new();
        let mut sampler = InputSampler::new(&bus);
        assert_eq!(bus.listener_count(), 1);

        bus.publish(&press(KeyCode::KeyA));
        assert_eq!(sampler.sample().keys.axis(), Vector2::new(-1.0, 0.0));

        drop(sampler);
        assert_eq!(bus.listener_count(), 0);
    }
}
