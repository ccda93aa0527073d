//! Minimal math types for node transforms.
//!
//! Only what the scene graph needs to compose world matrices; real
//! projection/animation math lives with the excluded collaborator layers.

use bytemuck::{Pod, Zeroable};

/// 3D vector - position, scale.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vec3 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
}

impl Vec3 {
    /// Zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// All-ones vector (identity scale).
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0);

    /// Creates a new vector.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Component-wise linear interpolation.
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
            self.z + (other.z - self.z) * t,
        )
    }
}

/// Column-major 4x4 matrix.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Matrix4 {
    /// Columns, each a 4-vector.
    pub cols: [[f32; 4]; 4],
}

impl Matrix4 {
    /// Identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Builds a transform from translation and non-uniform scale.
    #[must_use]
    pub fn from_translation_scale(translation: Vec3, scale: Vec3) -> Self {
        Self {
            cols: [
                [scale.x, 0.0, 0.0, 0.0],
                [0.0, scale.y, 0.0, 0.0],
                [0.0, 0.0, scale.z, 0.0],
                [translation.x, translation.y, translation.z, 1.0],
            ],
        }
    }

    /// Matrix product `self * rhs` (applies `rhs` first).
    #[must_use]
    pub fn multiply(&self, rhs: &Self) -> Self {
        let mut out = [[0.0f32; 4]; 4];
        for (c, rhs_col) in rhs.cols.iter().enumerate() {
            for r in 0..4 {
                out[c][r] = (0..4).map(|k| self.cols[k][r] * rhs_col[k]).sum();
            }
        }
        Self { cols: out }
    }

    /// The translation column.
    #[must_use]
    pub fn translation(&self) -> Vec3 {
        Vec3::new(self.cols[3][0], self.cols[3][1], self.cols[3][2])
    }
}

impl Default for Matrix4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_multiply() {
        let m = Matrix4::from_translation_scale(Vec3::new(1.0, 2.0, 3.0), Vec3::ONE);
        assert_eq!(Matrix4::IDENTITY.multiply(&m), m);
        assert_eq!(m.multiply(&Matrix4::IDENTITY), m);
    }

    #[test]
    fn test_translation_composes() {
        let parent = Matrix4::from_translation_scale(Vec3::new(1.0, 0.0, 0.0), Vec3::ONE);
        let child = Matrix4::from_translation_scale(Vec3::new(0.0, 2.0, 0.0), Vec3::ONE);
        let world = parent.multiply(&child);
        assert_eq!(world.translation(), Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_scale_applies_to_child_translation() {
        let parent =
            Matrix4::from_translation_scale(Vec3::ZERO, Vec3::new(2.0, 2.0, 2.0));
        let child = Matrix4::from_translation_scale(Vec3::new(1.0, 1.0, 1.0), Vec3::ONE);
        let world = parent.multiply(&child);
        assert_eq!(world.translation(), Vec3::new(2.0, 2.0, 2.0));
    }

    #[test]
    fn test_lerp_endpoints() {
        let a = Vec3::ZERO;
        let b = Vec3::new(10.0, -4.0, 2.0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), Vec3::new(5.0, -2.0, 1.0));
    }
}
