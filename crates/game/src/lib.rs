pub mod components;
pub mod controller;
pub mod controller_layer;
pub mod prelude;
pub mod systems;

pub use controller_layer::ControllerLayer;
