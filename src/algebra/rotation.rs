//! Rotation algebra on SO(3).
//!
//! Rotations can be stored as unit quaternions, rotation matrices or scaled axes. All three
//! share the same tangent space: a perturbation `δ` acts on the left, `R ⊞ δ = exp(δ)·R`.
//!
//! The left Jacobian of SO(3) and its inverse live here as well; the rigid-transform
//! algebra reuses them for its logarithm.

use std::f64::consts::PI;

use nalgebra::{Matrix3, Quaternion, Rotation3, UnitQuaternion, Vector3};
use rand::Rng;

use crate::types::{RotationRepr, Scalar};

/// Squared angle below which closed-form coefficients are replaced by Taylor series.
///
/// Above it the closed forms lose at most `ε/θ⁴` to cancellation; below it every truncated
/// series drops terms no larger than `θ⁶/453600`.
pub const TAYLOR_THRESHOLD: Scalar = 1e-2;

/// An element of SO(3) in one of the supported storages.
#[derive(Debug, Clone, PartialEq)]
pub enum Rotation {
    Quaternion(UnitQuaternion<Scalar>),
    Matrix(Rotation3<Scalar>),
    AngleAxis(Vector3<Scalar>),
}

impl Rotation {
    pub fn identity(repr: RotationRepr) -> Self {
        Self::from_quaternion(repr, UnitQuaternion::identity())
    }

    /// Builds a rotation in the requested storage from a unit quaternion.
    pub fn from_quaternion(repr: RotationRepr, q: UnitQuaternion<Scalar>) -> Self {
        match repr {
            RotationRepr::Quaternion => Rotation::Quaternion(q),
            RotationRepr::Matrix => Rotation::Matrix(q.to_rotation_matrix()),
            RotationRepr::AngleAxis => Rotation::AngleAxis(q.scaled_axis()),
        }
    }

    /// Exponential map: the rotation by `|axis|` radians about `axis`.
    pub fn from_scaled_axis(repr: RotationRepr, axis: Vector3<Scalar>) -> Self {
        match repr {
            RotationRepr::Quaternion => {
                Rotation::Quaternion(UnitQuaternion::from_scaled_axis(axis))
            }
            RotationRepr::Matrix => Rotation::Matrix(Rotation3::from_scaled_axis(axis)),
            RotationRepr::AngleAxis => Rotation::AngleAxis(axis),
        }
    }

    /// Draws a rotation uniformly distributed on SO(3).
    pub fn random<R: Rng + ?Sized>(repr: RotationRepr, rng: &mut R) -> Self {
        Self::from_quaternion(repr, random_quaternion(rng))
    }

    pub fn repr(&self) -> RotationRepr {
        match self {
            Rotation::Quaternion(_) => RotationRepr::Quaternion,
            Rotation::Matrix(_) => RotationRepr::Matrix,
            Rotation::AngleAxis(_) => RotationRepr::AngleAxis,
        }
    }

    pub fn to_quaternion(&self) -> UnitQuaternion<Scalar> {
        match self {
            Rotation::Quaternion(q) => *q,
            Rotation::Matrix(m) => UnitQuaternion::from_rotation_matrix(m),
            Rotation::AngleAxis(v) => UnitQuaternion::from_scaled_axis(*v),
        }
    }

    /// The rotation as a plain 3x3 matrix.
    pub fn matrix(&self) -> Matrix3<Scalar> {
        match self {
            Rotation::Matrix(m) => *m.matrix(),
            other => other.to_quaternion().to_rotation_matrix().into_inner(),
        }
    }

    /// Converts to another storage. Converting to the current storage is a copy.
    pub fn to_repr(&self, repr: RotationRepr) -> Self {
        if self.repr() == repr {
            return self.clone();
        }
        Self::from_quaternion(repr, self.to_quaternion())
    }

    pub fn inverse(&self) -> Self {
        match self {
            Rotation::Quaternion(q) => Rotation::Quaternion(q.inverse()),
            Rotation::Matrix(m) => Rotation::Matrix(m.inverse()),
            Rotation::AngleAxis(v) => Rotation::AngleAxis(-v),
        }
    }

    /// `self · rhs`, stored like `rhs` (angle-axis results are stored as quaternions).
    pub fn compose(&self, rhs: &Rotation) -> Self {
        match (self, rhs) {
            (Rotation::Quaternion(a), Rotation::Quaternion(b)) => Rotation::Quaternion(a * b),
            (Rotation::Matrix(a), Rotation::Matrix(b)) => Rotation::Matrix(a * b),
            _ => Self::from_quaternion(
                rhs.repr().composable(),
                self.to_quaternion() * rhs.to_quaternion(),
            ),
        }
    }

    /// Rotates a point.
    pub fn rotate(&self, p: &Vector3<Scalar>) -> Vector3<Scalar> {
        match self {
            Rotation::Quaternion(q) => q * p,
            Rotation::Matrix(m) => m * p,
            Rotation::AngleAxis(v) => UnitQuaternion::from_scaled_axis(*v) * p,
        }
    }

    /// Logarithmic map: the scaled axis with angle in `[0, π]`.
    ///
    /// Always taken through the quaternion, whose angle comes from `atan2`. The trace-based
    /// `acos` of a rotation matrix loses every digit of angles below about `1e-8`.
    pub fn log(&self) -> Vector3<Scalar> {
        self.to_quaternion().scaled_axis()
    }

    /// Box-plus with a left perturbation.
    pub fn box_plus(&self, delta: &Vector3<Scalar>) -> Self {
        Rotation::from_scaled_axis(self.repr().composable(), *delta)
            .compose(self)
            .to_repr(self.repr())
    }

    /// Box-minus: `log(self · other⁻¹)`.
    pub fn box_minus(&self, other: &Rotation) -> Vector3<Scalar> {
        (self.to_quaternion() * other.to_quaternion().inverse()).scaled_axis()
    }
}

/// Shoemake's method for a uniformly random unit quaternion.
pub fn random_quaternion<R: Rng + ?Sized>(rng: &mut R) -> UnitQuaternion<Scalar> {
    let u1: Scalar = rng.gen();
    let u2: Scalar = rng.gen();
    let u3: Scalar = rng.gen();
    let a = (1.0 - u1).sqrt();
    let b = u1.sqrt();
    let q = Quaternion::new(
        b * (2.0 * PI * u3).cos(),
        a * (2.0 * PI * u2).sin(),
        a * (2.0 * PI * u2).cos(),
        b * (2.0 * PI * u3).sin(),
    );
    UnitQuaternion::new_normalize(q)
}

/// Cross-product matrix: `skew(a) * b == a × b`.
pub fn skew(v: &Vector3<Scalar>) -> Matrix3<Scalar> {
    v.cross_matrix()
}

/// Left Jacobian of SO(3), `J_l(ω) = I + B·[ω]× + C·[ω]×²`.
///
/// This is also the `V` matrix relating an SE(3) twist's translation part to the
/// transform's translation.
pub fn left_jacobian(omega: &Vector3<Scalar>) -> Matrix3<Scalar> {
    let theta2 = omega.norm_squared();
    let (b, c) = if theta2 < TAYLOR_THRESHOLD {
        (
            0.5 - theta2 / 24.0 + theta2 * theta2 / 720.0 - theta2.powi(3) / 40320.0,
            1.0 / 6.0 - theta2 / 120.0 + theta2 * theta2 / 5040.0 - theta2.powi(3) / 362880.0,
        )
    } else {
        let theta = theta2.sqrt();
        (
            (1.0 - theta.cos()) / theta2,
            (theta - theta.sin()) / (theta2 * theta),
        )
    };
    let cross = skew(omega);
    Matrix3::identity() + cross * b + cross * cross * c
}

/// Inverse of the left Jacobian of SO(3).
///
/// `J_l⁻¹(ω) = I − [ω]×/2 + (1/θ²)(1 − A/(2B))·[ω]×²` with `A = sinθ/θ`,
/// `B = (1 − cosθ)/θ²`. It is both the Jacobian of the SO(3) logarithm and the `V⁻¹` used
/// by the SE(3) logarithm.
pub fn left_jacobian_inverse(omega: &Vector3<Scalar>) -> Matrix3<Scalar> {
    let theta2 = omega.norm_squared();
    let k = if theta2 < TAYLOR_THRESHOLD {
        1.0 / 12.0 + theta2 / 720.0 + theta2 * theta2 / 30240.0 + theta2.powi(3) / 1209600.0
    } else {
        let theta = theta2.sqrt();
        let a = theta.sin() / theta;
        let b = (1.0 - theta.cos()) / theta2;
        (1.0 - a / (2.0 * b)) / theta2
    };
    let cross = skew(omega);
    Matrix3::identity() - cross / 2.0 + cross * cross * k
}

/// Jacobian of Inverse: `−Adjoint(R⁻¹)`, which for SO(3) is `−R_out`.
pub fn inverse_jacobian(val: &Rotation) -> Matrix3<Scalar> {
    -val.matrix()
}

/// Jacobian of Compose with respect to the right operand: `Adjoint(lhs) = R_lhs`.
pub fn compose_rhs_jacobian(lhs: &Rotation) -> Matrix3<Scalar> {
    lhs.matrix()
}

/// Jacobian of rotating a point with respect to the rotation, evaluated at the output.
pub fn transform_lhs_jacobian(out: &Vector3<Scalar>) -> Matrix3<Scalar> {
    skew(&-out)
}

/// Jacobian of rotating a point with respect to the point.
pub fn transform_rhs_jacobian(lhs: &Rotation) -> Matrix3<Scalar> {
    lhs.matrix()
}

/// Jacobian of LogMap, evaluated at its output `ω`.
pub fn log_map_jacobian(omega: &Vector3<Scalar>) -> Matrix3<Scalar> {
    left_jacobian_inverse(omega)
}
