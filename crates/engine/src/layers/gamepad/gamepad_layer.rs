use crate::prelude::*;

use gilrs::{Event, EventType, Gamepad, GamepadId, Gilrs};

const STICK_AXES: [GamepadAxis; 4] = [
    GamepadAxis::LeftStickX,
    GamepadAxis::LeftStickY,
    GamepadAxis::RightStickX,
    GamepadAxis::RightStickY,
];

/// Gilrs only reports axes when they move; a pad taking over may already be deflected
fn publish_stick_positions(bus: &InputBus, gamepad: Gamepad<'_>) {
    for axis in STICK_AXES {
        bus.publish(&InputEvent::GamepadAxisChanged(axis, gamepad.value(axis)));
    }
}

/// Tracks which gamepad currently drives the game.
///
/// Only one pad is "current" at a time: the first one to connect. When it
/// disconnects, another connected pad (if any) takes over.
#[derive(Debug, Clone, Default)]
pub struct GamepadRouter<I> {
    active: Option<I>,
}

impl<I: Copy + PartialEq> GamepadRouter<I> {
    pub fn new(active: Option<I>) -> Self {
        Self { active }
    }

    pub fn active(&self) -> Option<I> {
        self.active
    }

    pub fn is_active(&self, id: I) -> bool {
        self.active == Some(id)
    }

    /// Returns true if the pad became the current one
    pub fn connect(&mut self, id: I) -> bool {
        if self.active.is_none() {
            self.active = Some(id);
            true
        } else {
            false
        }
    }

    /// Events to publish after `id` went away
    pub fn disconnect(&mut self, id: I, fallback: Option<I>) -> Vec<InputEvent> {
        if !self.is_active(id) {
            return Vec::new();
        }

        self.active = fallback;
        match fallback {
            Some(_) => vec![InputEvent::GamepadDisconnected, InputEvent::GamepadConnected],
            None => vec![InputEvent::GamepadDisconnected],
        }
    }
}

/// Layer that polls gilrs and forwards the current gamepad's events to the [`InputBus`].
/// Must be added before any layer that samples input.
pub struct GamepadLayer {
    gilrs: Option<Gilrs>,
    router: GamepadRouter<GamepadId>,
    announce: bool,
}

impl GamepadLayer {
    pub fn new(_context: &LayerContext) -> Self {
        let gilrs = match Gilrs::new() {
            Ok(gilrs) => Some(gilrs),
            Err(e) => {
                log::warn!("Gamepad support unavailable: {}", e);
                None
            }
        };

        let active = gilrs.as_ref().and_then(|gilrs| {
            gilrs.gamepads().next().map(|(id, gamepad)| {
                log::info!("Using gamepad '{}'", gamepad.name());
                id
            })
        });

        Self {
            gilrs,
            router: GamepadRouter::new(active),
            announce: active.is_some(),
        }
    }
}

impl Layer for GamepadLayer {
    fn frame(&mut self, context: &LayerContext) -> crate::Result<()> {
        let Some(gilrs) = self.gilrs.as_mut() else {
            return Ok(());
        };

        let world = context.world();
        let Some(bus) = world.get_resource::<InputBus>() else {
            return Ok(());
        };

        if std::mem::take(&mut self.announce) {
            if let Some(active) = self.router.active() {
                bus.publish(&InputEvent::GamepadConnected);
                publish_stick_positions(bus, gilrs.gamepad(active));
            }
        }

        while let Some(Event { id, event, .. }) = gilrs.next_event() {
            match event {
                EventType::Connected => {
                    if self.router.connect(id) {
                        log::info!("Using gamepad '{}'", gilrs.gamepad(id).name());
                        bus.publish(&InputEvent::GamepadConnected);
                        publish_stick_positions(bus, gilrs.gamepad(id));
                    }
                }
                EventType::Disconnected => {
                    let fallback = gilrs
                        .gamepads()
                        .map(|(other, _)| other)
                        .find(|other| *other != id);
                    let handover = self.router.disconnect(id, fallback);
                    for event in &handover {
                        bus.publish(event);
                    }
                    let switched = !handover.is_empty();
                    if let Some(next) = self.router.active().filter(|_| switched) {
                        log::info!("Switched to gamepad '{}'", gilrs.gamepad(next).name());
                        publish_stick_positions(bus, gilrs.gamepad(next));
                    }
                }
                EventType::ButtonPressed(button, _) if self.router.is_active(id) => {
                    bus.publish(&InputEvent::GamepadButtonPressed(button));
                }
                EventType::ButtonReleased(button, _) if self.router.is_active(id) => {
                    bus.publish(&InputEvent::GamepadButtonReleased(button));
                }
                EventType::AxisChanged(axis, value, _) if self.router.is_active(id) => {
                    bus.publish(&InputEvent::GamepadAxisChanged(axis, value));
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn detach(&mut self, _context: &LayerContext) {}
}
