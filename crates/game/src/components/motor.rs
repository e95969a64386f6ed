use crate::prelude::*;

/// Physical body of a character.
///
/// Resolves requested displacements against the world and reports whether the
/// body rests on a supporting surface after the last move.
pub trait CharacterMotor: Send + Sync {
    fn move_by(&mut self, displacement: Vector3<f32>);
    fn is_grounded(&self) -> bool;
    fn position(&self) -> Point3<f32>;
}

#[derive(Component)]
pub struct Motor(pub Box<dyn CharacterMotor>);

impl Motor {
    pub fn new(motor: impl CharacterMotor + 'static) -> Self {
        Self(Box::new(motor))
    }
}

/// Motor for an endless flat floor at `floor_height`; nothing else collides.
#[derive(Debug, Clone)]
pub struct KinematicMotor {
    position: Point3<f32>,
    floor_height: f32,
    grounded: bool,
}

impl KinematicMotor {
    pub fn new(position: Point3<f32>, floor_height: f32) -> Self {
        let mut motor = Self {
            position,
            floor_height,
            grounded: false,
        };
        motor.resolve_floor(0.0);
        motor
    }

    fn resolve_floor(&mut self, vertical: f32) {
        if self.position.y <= self.floor_height {
            self.position.y = self.floor_height;
            self.grounded = vertical <= 0.0;
        } else {
            self.grounded = false;
        }
    }
}

impl CharacterMotor for KinematicMotor {
    fn move_by(&mut self, displacement: Vector3<f32>) {
        if !displacement.iter().all(|value| value.is_finite()) {
            log::warn!("Ignoring non-finite displacement {:?}", displacement);
            return;
        }

        self.position += displacement;
        self.resolve_floor(displacement.y);
    }

    fn is_grounded(&self) -> bool {
        self.grounded
    }

    fn position(&self) -> Point3<f32> {
        self.position
    }
}
