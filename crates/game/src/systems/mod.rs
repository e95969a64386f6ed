mod character_controller;

pub use character_controller::*;
