use super::RawInput;

/// Which device drives the character this tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DeviceSource {
    #[default]
    PointerAndKeys,
    Gamepad,
}

/// Picks the active device every tick from current stick activity.
///
/// There is no memory between ticks, so touching both devices in the same
/// tick may flip the source for a single tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceArbiter;

impl DeviceArbiter {
    pub fn decide(&self, raw: &RawInput, deadzone: f32) -> DeviceSource {
        let active = raw.gamepad_left_stick.magnitude() > deadzone
            || raw.gamepad_right_stick.magnitude() > deadzone;

        if raw.gamepad_connected && active {
            DeviceSource::Gamepad
        } else {
            DeviceSource::PointerAndKeys
        }
    }
}
