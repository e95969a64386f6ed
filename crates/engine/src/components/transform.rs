use crate::prelude::*;

#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Point3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Transform {
    pub fn from_position(position: Point3<f32>) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Facing direction. Right-handed, Y up, looking down -Z at identity.
    pub fn forward(&self) -> Vector3<f32> {
        self.rotation * -Vector3::z()
    }

    pub fn right(&self) -> Vector3<f32> {
        self.rotation * Vector3::x()
    }

    pub fn up(&self) -> Vector3<f32> {
        self.rotation * Vector3::y()
    }

    /// Turn around the local up axis. Positive degrees turn right.
    pub fn rotate_yaw(&mut self, degrees: f32) {
        let turn = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), -degrees.to_radians());
        self.rotation = self.rotation * turn;
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Point3::origin(),
            rotation: UnitQuaternion::identity(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}
