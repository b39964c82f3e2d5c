//! # Bone Matrices
//!
//! [`Mat3x4`] is a row-major 3x4 affine transform: three rows of
//! `[rotation/scale | translation]`. It is the layout skinning shaders
//! consume, 48 bytes per bone with no padding, and the layout baked frames
//! are stored in.
//!
//! Blending is component-wise on purpose: baked matrices are interpolated
//! directly, without decomposing into translation/rotation/scale.

use std::ops::Mul;

use bytemuck::{Pod, Zeroable};
use glam::{Affine3A, Mat4, Quat, Vec3, Vec3A};

/// Row-major 3x4 affine matrix.
///
/// Transforms a point `p` as `R * p + t`, where `R` is the left 3x3 block
/// and `t` the last column.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Mat3x4 {
    /// The three rows, each `[r0, r1, r2, t]`.
    pub rows: [[f32; 4]; 3],
}

impl Mat3x4 {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        rows: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
        ],
    };

    /// Creates a matrix from its rows.
    #[inline]
    #[must_use]
    pub const fn from_rows(rows: [[f32; 4]; 3]) -> Self {
        Self { rows }
    }

    /// A pure translation.
    #[must_use]
    pub fn from_translation(translation: Vec3) -> Self {
        let mut matrix = Self::IDENTITY;
        matrix.rows[0][3] = translation.x;
        matrix.rows[1][3] = translation.y;
        matrix.rows[2][3] = translation.z;
        matrix
    }

    /// A pure rotation.
    #[must_use]
    pub fn from_quat(rotation: Quat) -> Self {
        Self::from_affine(&Affine3A::from_quat(rotation))
    }

    /// Scale, then rotation, then translation.
    #[must_use]
    pub fn from_scale_rotation_translation(scale: Vec3, rotation: Quat, translation: Vec3) -> Self {
        Self::from_affine(&Affine3A::from_scale_rotation_translation(scale, rotation, translation))
    }

    /// Converts a glam affine transform.
    #[must_use]
    pub fn from_affine(affine: &Affine3A) -> Self {
        let m = affine.matrix3;
        let t = affine.translation;
        Self {
            rows: [
                [m.x_axis.x, m.y_axis.x, m.z_axis.x, t.x],
                [m.x_axis.y, m.y_axis.y, m.z_axis.y, t.y],
                [m.x_axis.z, m.y_axis.z, m.z_axis.z, t.z],
            ],
        }
    }

    /// Converts to a glam affine transform.
    #[must_use]
    pub fn to_affine(&self) -> Affine3A {
        let [r0, r1, r2] = self.rows;
        Affine3A::from_cols(
            Vec3A::new(r0[0], r1[0], r2[0]),
            Vec3A::new(r0[1], r1[1], r2[1]),
            Vec3A::new(r0[2], r1[2], r2[2]),
            Vec3A::new(r0[3], r1[3], r2[3]),
        )
    }

    /// Expands to a full 4x4 matrix with `[0, 0, 0, 1]` as the last row.
    #[must_use]
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from(self.to_affine())
    }

    /// The translation column.
    #[inline]
    #[must_use]
    pub fn translation(&self) -> Vec3 {
        Vec3::new(self.rows[0][3], self.rows[1][3], self.rows[2][3])
    }

    /// Applies the transform to a point.
    #[must_use]
    pub fn transform_point3(&self, point: Vec3) -> Vec3 {
        let row = |r: [f32; 4]| r[0] * point.x + r[1] * point.y + r[2] * point.z + r[3];
        Vec3::new(row(self.rows[0]), row(self.rows[1]), row(self.rows[2]))
    }

    /// Component-wise blend: `self * (1 - alpha) + other * alpha`.
    ///
    /// The result is not necessarily rigid when the two inputs differ by a
    /// large rotation.
    #[inline]
    #[must_use]
    pub fn lerp(&self, other: &Self, alpha: f32) -> Self {
        let keep = 1.0 - alpha;
        let mut rows = [[0.0; 4]; 3];
        for (row, (a, b)) in rows.iter_mut().zip(self.rows.iter().zip(&other.rows)) {
            for (value, (x, y)) in row.iter_mut().zip(a.iter().zip(b)) {
                *value = x * keep + y * alpha;
            }
        }
        Self { rows }
    }

    /// Checks whether every component is within `epsilon` of `other`'s.
    #[must_use]
    pub fn abs_diff_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.rows
            .iter()
            .flatten()
            .zip(other.rows.iter().flatten())
            .all(|(a, b)| (a - b).abs() <= epsilon)
    }
}

impl Default for Mat3x4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Affine composition: `parent * local` applies `local` first, then `parent`.
impl Mul for Mat3x4 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let a = &self.rows;
        let b = &rhs.rows;
        let mut rows = [[0.0; 4]; 3];
        for (i, row) in rows.iter_mut().enumerate() {
            for (j, value) in row.iter_mut().enumerate() {
                *value = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j];
            }
            row[3] += a[i][3];
        }
        Self { rows }
    }
}
