//! Oriented bounding box.
//!
//! Rebuilt every tick from the pose solver's interpolated bounds and the
//! entity transform; consumed by the locality updater (centroid) and the
//! activator scan (overlap test).

use bevy_ecs::prelude::Component;
use glam::{Mat4, Vec3};

#[derive(Component, Debug, Clone)]
pub struct Obb {
    /// Frame-local bounds, as last rebuilt.
    pub base_min: Vec3,
    pub base_max: Vec3,
    /// World-space centre after [`Obb::transform_by`].
    pub centre: Vec3,
    /// World-space box axes (unit length for rigid transforms).
    pub axes: [Vec3; 3],
    /// Half extents along each axis.
    pub half: Vec3,
}

impl Default for Obb {
    fn default() -> Self {
        Self {
            base_min: Vec3::ZERO,
            base_max: Vec3::ZERO,
            centre: Vec3::ZERO,
            axes: [Vec3::X, Vec3::Y, Vec3::Z],
            half: Vec3::ZERO,
        }
    }
}

impl Obb {
    /// Take new frame-local bounds. World data is stale until the next
    /// [`Obb::transform_by`].
    pub fn rebuild(&mut self, bb_min: Vec3, bb_max: Vec3) {
        self.base_min = bb_min;
        self.base_max = bb_max;
        self.half = (bb_max - bb_min) * 0.5;
    }

    /// Place the box in world space with the entity transform.
    pub fn transform_by(&mut self, m: &Mat4) {
        let local_centre = (self.base_min + self.base_max) * 0.5;
        self.centre = m.transform_point3(local_centre);
        self.axes = [
            m.x_axis.truncate(),
            m.y_axis.truncate(),
            m.z_axis.truncate(),
        ];
    }

    fn projected_radius(&self, axis: Vec3) -> f32 {
        self.half.x * self.axes[0].dot(axis).abs()
            + self.half.y * self.axes[1].dot(axis).abs()
            + self.half.z * self.axes[2].dot(axis).abs()
    }

    /// Separating-axis overlap test against another box: face axes of both
    /// boxes plus the nine edge cross products.
    pub fn overlaps(&self, other: &Obb) -> bool {
        let d = other.centre - self.centre;
        let mut axes: [Vec3; 15] = [Vec3::ZERO; 15];
        axes[..3].copy_from_slice(&self.axes);
        axes[3..6].copy_from_slice(&other.axes);
        let mut n = 6;
        for a in &self.axes {
            for b in &other.axes {
                axes[n] = a.cross(*b);
                n += 1;
            }
        }
        for axis in axes {
            let len_sq = axis.length_squared();
            if len_sq < 1e-6 {
                continue; // parallel edge pair, degenerate axis
            }
            let axis = axis / len_sq.sqrt();
            if d.dot(axis).abs() > self.projected_radius(axis) + other.projected_radius(axis) {
                return false;
            }
        }
        true
    }
}
