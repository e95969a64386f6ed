pub mod gamepad;

pub use gamepad::GamepadLayer;
