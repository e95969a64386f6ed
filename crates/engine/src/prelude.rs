pub use crate::components::*;
pub use crate::input::*;
pub use crate::{Layer, LayerContext};

pub use bevy_ecs::prelude::*;
pub use nalgebra::{Point3, UnitQuaternion, Vector2, Vector3};
