mod gamepad_layer;

pub use gamepad_layer::*;
