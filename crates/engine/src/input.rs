use crate::prelude::*;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

pub use gilrs::{Axis as GamepadAxis, Button as GamepadButton};
pub use winit::keyboard::KeyCode;

/// Platform input, normalized into one event stream for keyboard, pointer and gamepad
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyPressed { key: KeyCode, repeat: bool },
    KeyReleased(KeyCode),
    /// Raw pointer motion in screen space (y grows downwards)
    PointerMotion { dx: f32, dy: f32 },
    /// The window lost focus; no release events will follow for held keys
    FocusLost,
    GamepadConnected,
    GamepadDisconnected,
    GamepadButtonPressed(GamepadButton),
    GamepadButtonReleased(GamepadButton),
    GamepadAxisChanged(GamepadAxis, f32),
}

type Listener = Box<dyn FnMut(&InputEvent) + Send>;
type Listeners = Mutex<Vec<(u64, Listener)>>;

/// Gamepad presence and stick positions as of the last published event.
///
/// Gilrs only reports axes when they move, so a listener that subscribes
/// after the pad was announced would otherwise never learn about it.
#[derive(Debug, Clone, Default)]
struct GamepadSnapshot {
    connected: bool,
    axes: Vec<(GamepadAxis, f32)>,
}

impl GamepadSnapshot {
    fn record(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::GamepadConnected => self.connected = true,
            InputEvent::GamepadDisconnected => {
                self.connected = false;
                self.axes.clear();
            }
            InputEvent::GamepadAxisChanged(axis, value) => {
                match self.axes.iter_mut().find(|(known, _)| *known == axis) {
                    Some(entry) => entry.1 = value,
                    None => self.axes.push((axis, value)),
                }
            }
            _ => {}
        }
    }

    /// Events that bring a fresh listener up to date
    fn replay(&self) -> Vec<InputEvent> {
        if !self.connected {
            return Vec::new();
        }

        std::iter::once(InputEvent::GamepadConnected)
            .chain(
                self.axes
                    .iter()
                    .map(|&(axis, value)| InputEvent::GamepadAxisChanged(axis, value)),
            )
            .collect()
    }
}

/// Resource that fans platform input events out to subscribers.
///
/// Listeners run synchronously inside `publish`, before the frame's systems.
/// They must only write latched state and must not subscribe or drop a
/// [`Subscription`] of the same bus from inside the callback.
///
/// Gamepad presence and stick positions are level state: a new subscriber
/// receives them on registration. Keys and buttons are not replayed, so a
/// late subscriber never sees a press it did not witness.
#[derive(Resource)]
pub struct InputBus {
    listeners: Arc<Listeners>,
    gamepad: Mutex<GamepadSnapshot>,
    next_id: AtomicU64,
}

impl InputBus {
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(Mutex::new(Vec::new())),
            gamepad: Mutex::new(GamepadSnapshot::default()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Register a listener. It stays registered until the returned handle is dropped.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: FnMut(&InputEvent) + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut listener: Listener = Box::new(listener);

        // Lock order is listeners, then gamepad, same as `publish`
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let replay = self
            .gamepad
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replay();
        for event in &replay {
            listener(event);
        }
        listeners.push((id, listener));
        drop(listeners);

        log::debug!(
            "Input subscription {} registered, {} gamepad events replayed",
            id,
            replay.len()
        );

        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    pub fn publish(&self, event: &InputEvent) {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        self.gamepad
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(event);
        for (_, listener) in listeners.iter_mut() {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for InputBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle returned by [`InputBus::subscribe`].
///
/// Dropping it removes exactly the listener it was created for.
pub struct Subscription {
    id: u64,
    listeners: Weak<Listeners>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.listeners.upgrade().is_some_and(|listeners| {
            listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .iter()
                .any(|(id, _)| *id == self.id)
        })
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // The bus may already be gone during world teardown
        if let Some(listeners) = self.listeners.upgrade() {
            listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|(id, _)| *id != self.id);
            log::debug!("Input subscription {} released", self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// Resource that tracks window-level pointer state
#[derive(Resource, Default)]
pub struct InputState {
    /// Whether the pointer is captured; pointer motion is only published while it is
    pub mouse_captured: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }
}
