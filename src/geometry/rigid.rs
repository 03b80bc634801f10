//! Rigid-body transforms as 4×4 homogeneous matrices.
//!
//! All transform composition in this crate is exact matrix arithmetic; there
//! is no tolerance-based snapping anywhere in the pipeline. The inverse uses
//! the closed form for rigid transforms, `(Rᵀ, -Rᵀ t)`, which is exact when
//! the rotation block is orthonormal.

use nalgebra::{Matrix3, Matrix4, Rotation3, UnitQuaternion, Vector3, Vector4};

/// How far a rotation block may deviate from orthonormality before
/// configuration validation rejects it.
const ROTATION_TOLERANCE: f64 = 1e-6;

/// A rigid transform: 3×3 rotation and 3×1 translation stored as a 4×4
/// homogeneous matrix.
///
/// Invariant: the bottom row is `[0, 0, 0, 1]`. Constructors preserve it;
/// `from_matrix` trusts the caller (debug-asserted).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidTransform {
    mat: Matrix4<f64>,
}

impl RigidTransform {
    /// Identity transform (no rotation, no translation).
    pub fn identity() -> Self {
        Self {
            mat: Matrix4::identity(),
        }
    }

    /// Construct from a rotation matrix and a translation vector.
    ///
    /// Starts from the identity so the bottom row is `[0, 0, 0, 1]`, then
    /// fills the rotation and translation blocks.
    pub fn from_rotation_translation(rotation: Matrix3<f64>, translation: Vector3<f64>) -> Self {
        let mut mat = Matrix4::identity();
        mat.fixed_view_mut::<3, 3>(0, 0).copy_from(&rotation);
        mat.fixed_view_mut::<3, 1>(0, 3).copy_from(&translation);
        Self { mat }
    }

    /// Construct from a full 4×4 matrix. The caller guarantees the bottom
    /// row invariant and an orthonormal rotation block.
    pub fn from_matrix(mat: Matrix4<f64>) -> Self {
        debug_assert_eq!(mat.row(3), Matrix4::identity().row(3));
        Self { mat }
    }

    /// The underlying homogeneous matrix.
    pub fn matrix(&self) -> &Matrix4<f64> {
        &self.mat
    }

    /// The 3×3 rotation block.
    pub fn rotation(&self) -> Matrix3<f64> {
        self.mat.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// The translation column.
    pub fn translation(&self) -> Vector3<f64> {
        self.mat.fixed_view::<3, 1>(0, 3).into_owned()
    }

    /// Orientation as a unit quaternion, extracted from the rotation block.
    ///
    /// The block is orthonormal by construction, so the quaternion comes out
    /// normalized (right-handed, same axis ordering as the fixed mount
    /// transforms).
    pub fn orientation(&self) -> UnitQuaternion<f64> {
        UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(self.rotation()))
    }

    /// Compose with another transform: `self ∘ rhs` (apply `rhs` first).
    pub fn compose(&self, rhs: &RigidTransform) -> RigidTransform {
        Self {
            mat: self.mat * rhs.mat,
        }
    }

    /// Exact inverse: `(Rᵀ, -Rᵀ t)`.
    pub fn inverse(&self) -> RigidTransform {
        let r_t = self.rotation().transpose();
        let t = -(r_t * self.translation());
        Self::from_rotation_translation(r_t, t)
    }

    /// Transform a 3D point as a homogeneous 4-vector with `w = 1`.
    pub fn transform_point(&self, p: &Vector3<f64>) -> Vector3<f64> {
        let h = self.mat * Vector4::new(p.x, p.y, p.z, 1.0);
        Vector3::new(h.x, h.y, h.z)
    }
}

/// Whether a 3×3 matrix is a valid rotation: orthonormal with determinant +1.
pub fn is_rotation(m: &Matrix3<f64>) -> bool {
    let orthonormal = (m.transpose() * m - Matrix3::identity()).norm() < ROTATION_TOLERANCE;
    orthonormal && (m.determinant() - 1.0).abs() < ROTATION_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Rotation3;

    fn sample_transform() -> RigidTransform {
        let rotation = Rotation3::from_euler_angles(0.3, -0.7, 1.1).into_inner();
        RigidTransform::from_rotation_translation(rotation, Vector3::new(1.0, -2.0, 0.5))
    }

    #[test]
    fn test_bottom_row_invariant() {
        let t = sample_transform();
        let row = t.matrix().row(3);
        assert_eq!(row[0], 0.0);
        assert_eq!(row[1], 0.0);
        assert_eq!(row[2], 0.0);
        assert_eq!(row[3], 1.0);
    }

    #[test]
    fn test_double_inverse_roundtrip() {
        let t = sample_transform();
        let back = t.inverse().inverse();
        assert_relative_eq!(t.matrix(), back.matrix(), epsilon = 1e-12);
    }

    #[test]
    fn test_inverse_composes_to_identity() {
        let t = sample_transform();
        let id = t.compose(&t.inverse());
        assert_relative_eq!(id.matrix(), &Matrix4::identity(), epsilon = 1e-12);
    }

    #[test]
    fn test_compose_is_associative() {
        let a = sample_transform();
        let b = RigidTransform::from_rotation_translation(
            Rotation3::from_euler_angles(-0.2, 0.4, 0.0).into_inner(),
            Vector3::new(0.0, 3.0, -1.0),
        );
        let c = a.inverse();
        let left = a.compose(&b).compose(&c);
        let right = a.compose(&b.compose(&c));
        assert_relative_eq!(left.matrix(), right.matrix(), epsilon = 1e-12);
    }

    #[test]
    fn test_transform_point_matches_blocks() {
        let t = sample_transform();
        let p = Vector3::new(0.5, -1.5, 2.0);
        let expected = t.rotation() * p + t.translation();
        assert_relative_eq!(t.transform_point(&p), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_orientation_is_normalized() {
        let q = sample_transform().orientation();
        assert_relative_eq!(q.norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_is_rotation_rejects_scaled_and_reflected() {
        assert!(is_rotation(&Matrix3::identity()));
        assert!(!is_rotation(&(Matrix3::identity() * 2.0)));
        let reflection = Matrix3::from_diagonal(&Vector3::new(1.0, 1.0, -1.0));
        assert!(!is_rotation(&reflection));
    }
}
