//! Rigid-transform algebra on SE(3).
//!
//! A rigid transform `T = (R, t)` maps a point `p` to `R·p + t`. Its tangent vector, the
//! twist, is ordered `[rotation; translation]` and perturbs on the left:
//! `T ⊞ δ = exp(δ)·T`.
//!
//! The Jacobian formulas follow Ethan Eade, "Lie Groups for 2D and 3D Transformations" and
//! "Derivative of the Exponential Map", with rotation and translation blocks swapped to
//! match the twist ordering used here.

use nalgebra::{Matrix3, Matrix6, SMatrix, Vector3, Vector6};
use rand::Rng;

use crate::algebra::rotation::{self, left_jacobian, left_jacobian_inverse, skew, Rotation};
use crate::types::{RotationRepr, Scalar};

/// An element of SE(3).
#[derive(Debug, Clone, PartialEq)]
pub struct RigidTransform {
    rotation: Rotation,
    translation: Vector3<Scalar>,
}

impl RigidTransform {
    pub fn new(rotation: Rotation, translation: Vector3<Scalar>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    pub fn identity(repr: RotationRepr) -> Self {
        Self::new(Rotation::identity(repr), Vector3::zeros())
    }

    /// A transform with a uniformly random rotation and a translation with coefficients
    /// uniform in `[-1, 1]`.
    pub fn random<R: Rng + ?Sized>(repr: RotationRepr, rng: &mut R) -> Self {
        let rotation = Rotation::random(repr, rng);
        let translation = Vector3::from_fn(|_, _| rng.gen_range(-1.0..=1.0));
        Self::new(rotation, translation)
    }

    pub fn rotation(&self) -> &Rotation {
        &self.rotation
    }

    pub fn translation(&self) -> &Vector3<Scalar> {
        &self.translation
    }

    pub fn repr(&self) -> RotationRepr {
        self.rotation.repr()
    }

    /// Same transform with a different rotation storage.
    pub fn to_repr(&self, repr: RotationRepr) -> Self {
        Self::new(self.rotation.to_repr(repr), self.translation)
    }

    /// `(R⁻¹, −R⁻¹·t)`
    pub fn inverse(&self) -> Self {
        let rotation = self.rotation.inverse();
        let translation = -rotation.rotate(&self.translation);
        Self::new(rotation, translation)
    }

    /// `self ∘ rhs`: rotation `R_l·R_r`, translation `R_l·t_r + t_l`.
    pub fn compose(&self, rhs: &RigidTransform) -> Self {
        Self::new(
            self.rotation.compose(&rhs.rotation),
            self.rotation.rotate(&rhs.translation) + self.translation,
        )
    }

    /// Applies the transform to a point: `R·p + t`.
    pub fn transform_point(&self, p: &Vector3<Scalar>) -> Vector3<Scalar> {
        self.rotation.rotate(p) + self.translation
    }

    /// The adjoint `[[R, 0], [skew(t)·R, R]]`.
    pub fn adjoint(&self) -> Matrix6<Scalar> {
        adjoint(&self.rotation.matrix(), &self.translation)
    }

    /// SE(3) exponential of a twist `[ω; ρ]`.
    pub fn exp(repr: RotationRepr, twist: &Vector6<Scalar>) -> Self {
        let omega: Vector3<Scalar> = twist.fixed_rows::<3>(0).into_owned();
        let rho: Vector3<Scalar> = twist.fixed_rows::<3>(3).into_owned();
        Self::new(
            Rotation::from_scaled_axis(repr, omega),
            left_jacobian(&omega) * rho,
        )
    }

    pub fn log(&self) -> Vector6<Scalar> {
        log_map(self)
    }

    pub fn box_plus(&self, delta: &Vector6<Scalar>) -> Self {
        Self::exp(self.repr().composable(), delta)
            .compose(self)
            .to_repr(self.repr())
    }

    /// `log(self ∘ other⁻¹)`
    pub fn box_minus(&self, other: &RigidTransform) -> Vector6<Scalar> {
        self.compose(&other.inverse()).log()
    }
}

/// The SE(3) adjoint of `(R, t)`.
pub fn adjoint(r: &Matrix3<Scalar>, t: &Vector3<Scalar>) -> Matrix6<Scalar> {
    let mut adj = Matrix6::zeros();
    adj.fixed_view_mut::<3, 3>(0, 0).copy_from(r);
    adj.fixed_view_mut::<3, 3>(3, 0).copy_from(&(skew(t) * r));
    adj.fixed_view_mut::<3, 3>(3, 3).copy_from(r);
    adj
}

/// Logarithmic map of a rigid transform.
///
/// The rotation part is the SO(3) logarithm. The translation part is `V⁻¹·t` where
/// `V⁻¹ = I − skew(ω)/2 + (1/θ²)(1 − A/(2B))·skew(ω)²`; near `θ = 0` the last coefficient
/// is taken from its series `1/12 + θ²/720 + θ⁴/30240 + θ⁶/1209600`.
pub fn log_map(transform: &RigidTransform) -> Vector6<Scalar> {
    let omega = transform.rotation.log();
    let ln_t = left_jacobian_inverse(&omega) * transform.translation;
    let mut twist = Vector6::zeros();
    twist.fixed_rows_mut::<3>(0).copy_from(&omega);
    twist.fixed_rows_mut::<3>(3).copy_from(&ln_t);
    twist
}

/// Jacobian of Inverse, evaluated at the inverted transform: `−Adjoint(T⁻¹)`.
pub fn inverse_jacobian(val: &RigidTransform) -> Matrix6<Scalar> {
    -val.adjoint()
}

/// Jacobian of Compose with respect to its right operand: `Adjoint(lhs)`.
///
/// With respect to the left operand the Jacobian is the identity.
pub fn compose_rhs_jacobian(lhs: &RigidTransform) -> Matrix6<Scalar> {
    lhs.adjoint()
}

/// Jacobian of Transform with respect to the transform, at output point `out`:
/// `[skew(−out), I₃]`.
pub fn transform_lhs_jacobian(out: &Vector3<Scalar>) -> SMatrix<Scalar, 3, 6> {
    let mut jac = SMatrix::<Scalar, 3, 6>::zeros();
    jac.fixed_view_mut::<3, 3>(0, 0).copy_from(&skew(&-out));
    jac.fixed_view_mut::<3, 3>(0, 3).copy_from(&Matrix3::identity());
    jac
}

/// Jacobian of Transform with respect to the point: the rotation part.
pub fn transform_rhs_jacobian(lhs: &RigidTransform) -> Matrix3<Scalar> {
    rotation::transform_rhs_jacobian(&lhs.rotation)
}

/// Jacobian of LogMap, evaluated at its output twist `[ω; u]`.
///
/// This is the inverse SE(3) left Jacobian
/// `[[D, 0], [−D·B·D, D]]` with `D = J_l⁻¹(ω)` and Eade's auxiliary matrices
///
/// ```text
/// W = (c − b)·I + (a − 2b)/θ²·skew(ω) + (b − 3c)/θ²·ω·ωᵀ
/// B = b·skew(u) + c·(ω·uᵀ + u·ωᵀ) + (ω·u)·W
/// ```
///
/// where `a = sinθ/θ`, `b = (1 − cosθ)/θ²`, `c = (1 − a)/θ²`.
pub fn log_map_jacobian(twist: &Vector6<Scalar>) -> Matrix6<Scalar> {
    let omega: Vector3<Scalar> = twist.fixed_rows::<3>(0).into_owned();
    let u: Vector3<Scalar> = twist.fixed_rows::<3>(3).into_owned();
    let d_rot = rotation::log_map_jacobian(&omega);

    let theta2 = omega.norm_squared();
    let (b, c, w_cross, w_outer) = if theta2 < rotation::TAYLOR_THRESHOLD {
        (
            0.5 - theta2 / 24.0 + theta2 * theta2 / 720.0 - theta2.powi(3) / 40320.0,
            1.0 / 6.0 - theta2 / 120.0 + theta2 * theta2 / 5040.0 - theta2.powi(3) / 362880.0,
            -1.0 / 12.0 + theta2 / 180.0 - theta2 * theta2 / 6720.0,
            -1.0 / 60.0 + theta2 / 1260.0 - theta2 * theta2 / 60480.0,
        )
    } else {
        let theta = theta2.sqrt();
        let a = theta.sin() / theta;
        let b = (1.0 - theta.cos()) / theta2;
        let c = (1.0 - a) / theta2;
        (b, c, (a - 2.0 * b) / theta2, (b - 3.0 * c) / theta2)
    };

    let w = Matrix3::identity() * (c - b)
        + skew(&omega) * w_cross
        + omega * omega.transpose() * w_outer;
    let big_b = skew(&u) * b
        + (omega * u.transpose() + u * omega.transpose()) * c
        + w * omega.dot(&u);

    let mut jac = Matrix6::zeros();
    jac.fixed_view_mut::<3, 3>(0, 0).copy_from(&d_rot);
    jac.fixed_view_mut::<3, 3>(3, 0)
        .copy_from(&(-(d_rot * big_b * d_rot)));
    jac.fixed_view_mut::<3, 3>(3, 3).copy_from(&d_rot);
    jac
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::f64::consts::PI;

    fn rz90(repr: RotationRepr) -> Rotation {
        Rotation::from_scaled_axis(repr, Vector3::new(0.0, 0.0, PI / 2.0))
    }

    #[test]
    fn test_compose_concrete() {
        let t1 = RigidTransform::new(rz90(RotationRepr::Quaternion), Vector3::new(1.0, 0.0, 0.0));
        let t2 = RigidTransform::new(rz90(RotationRepr::Quaternion), Vector3::new(0.0, 1.0, 0.0));
        let composed = t1.compose(&t2);

        let r1 = rz90(RotationRepr::Matrix).matrix();
        let expected = r1 * Vector3::new(0.0, 1.0, 0.0) + Vector3::new(1.0, 0.0, 0.0);
        assert!((composed.translation() - expected).norm() < 1e-12);
        assert!(composed.translation().norm() < 1e-12);
    }

    #[test]
    fn test_compose_with_inverse_is_identity() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for repr in [RotationRepr::Quaternion, RotationRepr::Matrix] {
            let t = RigidTransform::random(repr, &mut rng);
            let id = t.compose(&t.inverse());
            assert!(id.log().norm() < 1e-12);
            let id = t.inverse().compose(&t);
            assert!(id.log().norm() < 1e-12);
        }
    }

    #[test]
    fn test_random_translation_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..50 {
            let t = RigidTransform::random(RotationRepr::Matrix, &mut rng);
            assert!(t.translation().iter().all(|x| (-1.0..=1.0).contains(x)));
        }
    }

    #[test]
    fn test_exp_log_round_trip() {
        let twists = [
            Vector6::new(0.3, -0.2, 0.9, 1.0, -2.0, 0.5),
            Vector6::new(0.01, 0.02, -0.01, 0.3, 0.0, 0.1),
            Vector6::new(1e-8, 0.0, 0.0, 0.3, -0.2, 0.5),
            Vector6::new(0.0, 0.0, 0.0, 0.3, -0.2, 0.5),
        ];
        for twist in twists {
            let t = RigidTransform::exp(RotationRepr::Quaternion, &twist);
            assert!((t.log() - twist).norm() < 1e-12, "{twist}");
        }
    }

    #[test]
    fn test_adjoint_blocks() {
        let t = RigidTransform::new(rz90(RotationRepr::Matrix), Vector3::new(1.0, 2.0, 3.0));
        let adj = t.adjoint();
        let r = t.rotation().matrix();
        assert_eq!(adj.fixed_view::<3, 3>(0, 0).into_owned(), r);
        assert_eq!(adj.fixed_view::<3, 3>(3, 3).into_owned(), r);
        assert_eq!(adj.fixed_view::<3, 3>(0, 3).into_owned(), Matrix3::zeros());
        assert_eq!(
            adj.fixed_view::<3, 3>(3, 0).into_owned(),
            skew(t.translation()) * r
        );
    }

    #[test]
    fn test_small_angle_log_uses_second_order_term() {
        // At θ = 1e-4 the skew(ω)² term of V⁻¹ still matters relative to ε
        let omega = Vector3::new(1e-4, -2e-4, 5e-5);
        let t = RigidTransform::exp(
            RotationRepr::Matrix,
            &Vector6::new(omega.x, omega.y, omega.z, 10.0, 20.0, -30.0),
        );
        let twist = t.log();
        assert!((twist - Vector6::new(omega.x, omega.y, omega.z, 10.0, 20.0, -30.0)).norm() < 1e-10);
    }

    #[test]
    fn test_log_jacobian_finite_near_zero() {
        for angle in [0.0, 1e-8] {
            let twist = Vector6::new(angle, 0.0, 0.0, 0.3, -0.2, 0.5);
            let jac = log_map_jacobian(&twist);
            assert!(jac.iter().all(|x| x.is_finite()));
        }
        let jac = log_map_jacobian(&Vector6::new(1e-8, 0.0, 0.0, 0.3, -0.2, 0.5));
        // Translation-wrt-rotation block approaches −skew(u)/2
        let expected = -skew(&Vector3::new(0.3, -0.2, 0.5)) / 2.0;
        assert!((jac.fixed_view::<3, 3>(3, 0).into_owned() - expected).norm() < 1e-7);
    }

    #[test]
    fn test_log_jacobian_series_continuity() {
        let u = Vector3::new(30.0, -20.0, 50.0);
        let at = |theta2: Scalar| {
            let omega = Vector3::new(1.0, 2.0, -2.0).normalize() * theta2.sqrt();
            log_map_jacobian(&Vector6::new(omega.x, omega.y, omega.z, u.x, u.y, u.z))
        };
        let threshold = rotation::TAYLOR_THRESHOLD;
        let diff = at(threshold * (1.0 - 1e-9)) - at(threshold * (1.0 + 1e-9));
        assert!(diff.norm() < 1e-10, "{diff}");
    }

    #[test]
    fn test_matrix_log_near_identity() {
        for angle in [0.0, 1e-8, 1e-6] {
            let twist = Vector6::new(angle, 0.0, 0.0, 0.3, -0.2, 0.1);
            for repr in [RotationRepr::Matrix, RotationRepr::AngleAxis] {
                let t = RigidTransform::exp(repr, &twist);
                assert!((t.log() - twist).norm() < 1e-14, "{repr:?} at {angle}");
            }
        }
    }

    #[test]
    fn test_transform_lhs_jacobian_layout() {
        let out = Vector3::new(1.0, 2.0, 3.0);
        let jac = transform_lhs_jacobian(&out);
        assert_eq!(jac.fixed_view::<3, 3>(0, 0).into_owned(), skew(&-out));
        assert_eq!(jac.fixed_view::<3, 3>(0, 3).into_owned(), Matrix3::identity());
    }
}
