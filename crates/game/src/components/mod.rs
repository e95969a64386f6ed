mod character;
mod motor;

pub use character::*;
pub use motor::*;
