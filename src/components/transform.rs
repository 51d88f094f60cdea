//! World transform component.
//!
//! The entity basis follows the source engine's convention: X is the right
//! axis, Y is the view (forward) axis, Z is up. `angles` holds yaw, pitch and
//! roll in degrees; [`Transform::update_rotation`] rebuilds the matrix basis
//! from them.

use bevy_ecs::prelude::Component;
use glam::{Mat4, Quat, Vec3, Vec4};

#[derive(Component, Debug, Clone)]
pub struct Transform {
    pub matrix: Mat4,
    /// Yaw, pitch, roll in degrees.
    pub angles: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            matrix: Mat4::IDENTITY,
            angles: Vec3::ZERO,
        }
    }
}

fn wrap_degrees(a: f32) -> f32 {
    a - 360.0 * (a / 360.0).floor()
}

impl Transform {
    pub fn right(&self) -> Vec3 {
        self.matrix.x_axis.truncate()
    }

    pub fn view(&self) -> Vec3 {
        self.matrix.y_axis.truncate()
    }

    pub fn up(&self) -> Vec3 {
        self.matrix.z_axis.truncate()
    }

    pub fn origin(&self) -> Vec3 {
        self.matrix.w_axis.truncate()
    }

    pub fn set_origin(&mut self, origin: Vec3) {
        self.matrix.w_axis = origin.extend(1.0);
    }

    /// Shift the origin by a world-space delta.
    pub fn translate(&mut self, delta: Vec3) {
        let origin = self.origin() + delta;
        self.set_origin(origin);
    }

    /// Rotate a vector by the basis only, ignoring the origin.
    pub fn rotate_vector(&self, v: Vec3) -> Vec3 {
        self.right() * v.x + self.view() * v.y + self.up() * v.z
    }

    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.rotate_vector(p) + self.origin()
    }

    /// Rebuild the matrix basis from `angles`, normalizing each angle into
    /// `[0, 360)` first. Yaw spins about world Z, pitch about the resulting
    /// right axis, roll about the resulting view axis.
    pub fn update_rotation(&mut self) {
        self.angles.x = wrap_degrees(self.angles.x);
        self.angles.y = wrap_degrees(self.angles.y);
        self.angles.z = wrap_degrees(self.angles.z);

        let yaw = self.angles.x.to_radians();
        let (sin_y, cos_y) = yaw.sin_cos();
        let mut view = Vec3::new(-sin_y, cos_y, 0.0);
        let mut right = Vec3::new(cos_y, sin_y, 0.0);
        let mut up = Vec3::Z;

        if self.angles.y != 0.0 {
            let pitch = Quat::from_axis_angle(right, self.angles.y.to_radians());
            up = pitch * up;
            view = pitch * view;
        }
        if self.angles.z != 0.0 {
            let roll = Quat::from_axis_angle(view, self.angles.z.to_radians());
            right = roll * right;
            up = roll * up;
        }

        self.matrix.x_axis = right.extend(0.0);
        self.matrix.y_axis = view.extend(0.0);
        self.matrix.z_axis = up.extend(0.0);
        self.matrix.w_axis = Vec4::new(
            self.matrix.w_axis.x,
            self.matrix.w_axis.y,
            self.matrix.w_axis.z,
            1.0,
        );
    }

    pub fn move_forward(&mut self, dist: f32) {
        let origin = self.origin() + self.view() * dist;
        self.set_origin(origin);
    }

    pub fn move_strafe(&mut self, dist: f32) {
        let origin = self.origin() + self.right() * dist;
        self.set_origin(origin);
    }

    pub fn move_vertical(&mut self, dist: f32) {
        let origin = self.origin() + self.up() * dist;
        self.set_origin(origin);
    }
}
