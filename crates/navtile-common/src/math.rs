//! Small math helpers used across the builder

use glam::Vec3;

/// Calculates the unit normal of a triangle (zero for degenerate triangles)
#[inline]
pub fn calc_tri_normal(v0: Vec3, v1: Vec3, v2: Vec3) -> Vec3 {
    let e0 = v1 - v0;
    let e1 = v2 - v0;
    e0.cross(e1).normalize_or_zero()
}

/// Cosine of a slope angle given in degrees
#[inline]
pub fn walkable_threshold(slope_degrees: f32) -> f32 {
    slope_degrees.to_radians().cos()
}

/// Rounds up to the next multiple of four
#[inline]
pub fn align4(value: usize) -> usize {
    (value + 3) & !3
}
