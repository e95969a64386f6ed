use crate::prelude::*;

/// Marks the entity a character looks through. Its `Transform` is written
/// every tick by whatever drives it.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Camera;
