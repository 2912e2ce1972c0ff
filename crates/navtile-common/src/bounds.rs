//! Axis-aligned bounding volume used to describe tile and build extents

use glam::Vec3;

/// Axis-aligned bounding box with Y up
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct BoundingBox {
    /// Minimum corner
    pub minimum: Vec3,
    /// Maximum corner
    pub maximum: Vec3,
}

impl BoundingBox {
    /// Creates a bounding box from its corners
    pub fn new(minimum: Vec3, maximum: Vec3) -> Self {
        Self { minimum, maximum }
    }

    /// Size of the box along each axis
    pub fn extent(&self) -> Vec3 {
        self.maximum - self.minimum
    }

    /// Returns true if any axis has a non-positive (or NaN) extent
    pub fn is_degenerate(&self) -> bool {
        let size = self.extent();
        !(size.x > 0.0 && size.y > 0.0 && size.z > 0.0)
    }

    /// Grows the box by `offsets` on every side
    pub fn extend(&mut self, offsets: Vec3) {
        self.minimum -= offsets;
        self.maximum += offsets;
    }

    /// Returns a copy grown by `offsets` on every side
    pub fn extended(mut self, offsets: Vec3) -> Self {
        self.extend(offsets);
        self
    }

    /// Checks if the box contains a point (inclusive)
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.minimum).all() && point.cmple(self.maximum).all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_detection() {
        let flat = BoundingBox::new(Vec3::ZERO, Vec3::new(10.0, 0.0, 10.0));
        assert!(flat.is_degenerate());

        let inverted = BoundingBox::new(Vec3::splat(1.0), Vec3::ZERO);
        assert!(inverted.is_degenerate());

        let nan = BoundingBox::new(Vec3::ZERO, Vec3::new(f32::NAN, 1.0, 1.0));
        assert!(nan.is_degenerate());

        let valid = BoundingBox::new(Vec3::ZERO, Vec3::splat(1.0));
        assert!(!valid.is_degenerate());
    }

    #[test]
    fn test_extend() {
        let bounds =
            BoundingBox::new(Vec3::ZERO, Vec3::splat(2.0)).extended(Vec3::new(1.0, 0.0, 0.5));
        assert_eq!(bounds.minimum, Vec3::new(-1.0, 0.0, -0.5));
        assert_eq!(bounds.maximum, Vec3::new(3.0, 2.0, 2.5));
        assert_eq!(bounds.extent(), Vec3::new(4.0, 2.0, 3.0));
        assert!(bounds.contains(Vec3::new(-1.0, 1.0, 2.5)));
        assert!(!bounds.contains(Vec3::new(0.0, 2.1, 0.0)));
    }
}
