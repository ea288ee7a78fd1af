//! Plain values produced by evaluating expressions.
//!
//! A [`Value`] is an element of one of the supported manifolds. Besides identifying its
//! [`ValueType`], it provides the manifold's local update operations:
//!
//! - `box_plus`: apply a tangent vector to a point (`exp(δ)·x` for rotations and rigid
//!   transforms, `x + δ` for vectors and scalars)
//! - `box_minus`: the tangent vector between two nearby points, the inverse of `box_plus`
//!
//! These are what finite-difference Jacobians are measured in.

use std::fmt;

use itertools::Itertools;
use nalgebra::{Vector3, Vector6};
use rand::Rng;

use crate::algebra::{RigidTransform, Rotation, VectorValue};
use crate::algebra::vector;
use crate::errors::{EvalError, PrepareError};
use crate::types::{Scalar, Tangent, ValueType, DEFAULT_PRECISION};

/// An evaluated element of a manifold.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    Vector(VectorValue),
    Rotation(Rotation),
    RigidTransform(RigidTransform),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Scalar(_) => ValueType::Scalar,
            Value::Vector(v) => v.value_type(),
            Value::Rotation(r) => ValueType::Rotation(r.repr()),
            Value::RigidTransform(t) => ValueType::RigidTransform(t.repr()),
        }
    }

    pub fn tangent_size(&self) -> usize {
        self.value_type().tangent_size()
    }

    /// The identity element of the manifold: zero for scalars and vectors.
    pub fn identity(ty: ValueType) -> Value {
        match ty {
            ValueType::Scalar => Value::Scalar(0.0),
            ValueType::Vector { family, dim } => Value::Vector(VectorValue::zeros(family, dim)),
            ValueType::Rotation(repr) => Value::Rotation(Rotation::identity(repr)),
            ValueType::RigidTransform(repr) => {
                Value::RigidTransform(RigidTransform::identity(repr))
            }
        }
    }

    /// A random element: uniform rotations, coefficients uniform in `[-1, 1]`.
    pub fn random<R: Rng + ?Sized>(ty: ValueType, rng: &mut R) -> Value {
        match ty {
            ValueType::Scalar => Value::Scalar(rng.gen_range(-1.0..=1.0)),
            ValueType::Vector { family, dim } => {
                Value::Vector(VectorValue::random(family, dim, rng))
            }
            ValueType::Rotation(repr) => Value::Rotation(Rotation::random(repr, rng)),
            ValueType::RigidTransform(repr) => {
                Value::RigidTransform(RigidTransform::random(repr, rng))
            }
        }
    }

    /// Converts to another type on the same manifold.
    pub fn convert_to(&self, ty: ValueType) -> Result<Value, PrepareError> {
        let from = self.value_type();
        if !from.can_convert_to(&ty) {
            return Err(PrepareError::InvalidConversion { from, to: ty });
        }
        Ok(match (self, ty) {
            (Value::Vector(v), ValueType::Vector { family, .. }) => {
                Value::Vector(v.clone().rebind_family(family))
            }
            (Value::Rotation(r), ValueType::Rotation(repr)) => Value::Rotation(r.to_repr(repr)),
            (Value::RigidTransform(t), ValueType::RigidTransform(repr)) => {
                Value::RigidTransform(t.to_repr(repr))
            }
            (value, _) => value.clone(),
        })
    }

    /// Applies a tangent-space offset.
    pub fn box_plus(&self, delta: &Tangent) -> Result<Value, EvalError> {
        let expected = self.tangent_size();
        if delta.len() != expected {
            return Err(EvalError::InvalidTangentLength {
                expected,
                got: delta.len(),
            });
        }
        Ok(match self {
            Value::Scalar(s) => Value::Scalar(s + delta[0]),
            Value::Vector(v) => {
                Value::Vector(VectorValue::new(v.family(), v.data() + delta))
            }
            Value::Rotation(r) => {
                Value::Rotation(r.box_plus(&Vector3::from_column_slice(delta.as_slice())))
            }
            Value::RigidTransform(t) => {
                Value::RigidTransform(t.box_plus(&Vector6::from_column_slice(delta.as_slice())))
            }
        })
    }

    /// The tangent vector `δ` such that `other ⊞ δ == self`.
    pub fn box_minus(&self, other: &Value) -> Result<Tangent, EvalError> {
        let mismatch = || EvalError::ManifoldMismatch {
            lhs: self.value_type(),
            rhs: other.value_type(),
        };
        if !self.value_type().can_convert_to(&other.value_type()) {
            return Err(mismatch());
        }
        match (self, other) {
            (Value::Scalar(a), Value::Scalar(b)) => Ok(Tangent::from_element(1, a - b)),
            (Value::Vector(a), Value::Vector(b)) => Ok(a.data() - b.data()),
            (Value::Rotation(a), Value::Rotation(b)) => {
                Ok(Tangent::from_column_slice(a.box_minus(b).as_slice()))
            }
            (Value::RigidTransform(a), Value::RigidTransform(b)) => {
                Ok(Tangent::from_column_slice(a.box_minus(b).as_slice()))
            }
            _ => Err(mismatch()),
        }
    }

    /// Fuzzy comparison with the default precision.
    pub fn is_approx(&self, other: &Value) -> bool {
        self.is_approx_prec(other, DEFAULT_PRECISION)
    }

    /// Fuzzy comparison.
    ///
    /// Scalars and vectors compare relative to the smaller magnitude. Rotations and rigid
    /// transforms compare by the norm of their box-minus difference.
    pub fn is_approx_prec(&self, other: &Value, prec: Scalar) -> bool {
        match (self, other) {
            (Value::Scalar(a), Value::Scalar(b)) => (a - b).abs() <= prec * a.abs().min(b.abs()),
            (Value::Vector(a), Value::Vector(b)) => vector::is_approx(a.data(), b.data(), prec),
            (Value::Rotation(a), Value::Rotation(b)) => a.box_minus(b).norm() <= prec,
            (Value::RigidTransform(a), Value::RigidTransform(b)) => {
                a.box_minus(b).norm() <= prec
            }
            _ => false,
        }
    }

    /// True if approximately the identity element, with the default precision.
    pub fn is_zero(&self) -> bool {
        self.is_zero_prec(DEFAULT_PRECISION)
    }

    pub fn is_zero_prec(&self, prec: Scalar) -> bool {
        match self {
            Value::Scalar(s) => s.abs() <= prec,
            Value::Vector(v) => vector::is_zero(v.data(), prec),
            Value::Rotation(r) => r.log().norm() <= prec,
            Value::RigidTransform(t) => t.log().norm() <= prec,
        }
    }

    pub fn as_scalar(&self) -> Option<Scalar> {
        match self {
            Value::Scalar(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&VectorValue> {
        match self {
            Value::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_rotation(&self) -> Option<&Rotation> {
        match self {
            Value::Rotation(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_rigid_transform(&self) -> Option<&RigidTransform> {
        match self {
            Value::RigidTransform(t) => Some(t),
            _ => None,
        }
    }
}

impl AsRef<Value> for Value {
    fn as_ref(&self) -> &Value {
        self
    }
}

impl From<Scalar> for Value {
    fn from(value: Scalar) -> Self {
        Value::Scalar(value)
    }
}

impl From<VectorValue> for Value {
    fn from(value: VectorValue) -> Self {
        Value::Vector(value)
    }
}

impl From<Rotation> for Value {
    fn from(value: Rotation) -> Self {
        Value::Rotation(value)
    }
}

impl From<RigidTransform> for Value {
    fn from(value: RigidTransform) -> Self {
        Value::RigidTransform(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(s) => write!(f, "{s}"),
            Value::Vector(v) => write!(f, "{v}"),
            Value::Rotation(r) => {
                write!(f, "Rotation<{}>[{}]", r.repr(), r.log().iter().join(", "))
            }
            Value::RigidTransform(t) => write!(
                f,
                "RigidTransform<{}>([{}], [{}])",
                t.repr(),
                t.rotation().log().iter().join(", "),
                t.translation().iter().join(", ")
            ),
        }
    }
}
