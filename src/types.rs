//! Type descriptors for the values an expression can produce.
//!
//! Every leaf and every operation result has a [`ValueType`]. It plays the role of a static
//! per-leaf descriptor: it knows the tangent-space size, the tangent type, and how to
//! rebind the same operation family onto a different storage representation.

use std::fmt;

use nalgebra::{DMatrix, DVector};

/// Scalar field used by every value in the crate.
pub type Scalar = f64;

/// A Jacobian in local (box-plus / box-minus) coordinates.
///
/// Shape is `tangent_size(output) x tangent_size(operand)`.
pub type Jacobian = DMatrix<Scalar>;

/// A tangent-space vector.
pub type Tangent = DVector<Scalar>;

/// Default tolerance for [`crate::value::Value::is_approx`] and
/// [`crate::value::Value::is_zero`].
pub const DEFAULT_PRECISION: Scalar = 1e-12;

/// Storage used for the rotation part of a rotation or rigid transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RotationRepr {
    /// Unit quaternion
    Quaternion,
    /// 3x3 rotation matrix
    Matrix,
    /// Scaled axis (angle times unit axis)
    AngleAxis,
}

impl RotationRepr {
    /// The storage that composition and point transformation are computed in.
    ///
    /// Angle-axis values cannot be multiplied directly, so they compose as quaternions.
    pub fn composable(self) -> Self {
        match self {
            RotationRepr::AngleAxis => RotationRepr::Quaternion,
            repr => repr,
        }
    }
}

/// Family of an element of R^n.
///
/// `Vector` is the generic family; the others carry a geometric meaning and are considered
/// more specific when two families meet in a sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VectorFamily {
    Vector,
    Translation,
    RelativeRotation,
    Twist,
}

impl VectorFamily {
    pub fn is_generic(self) -> bool {
        self == VectorFamily::Vector
    }

    /// Two families can meet in a sum or conversion if they agree or one is generic.
    pub fn is_compatible(self, other: VectorFamily) -> bool {
        self == other || self.is_generic() || other.is_generic()
    }

    /// The more specific of two compatible families, preferring `other` on a tie.
    pub fn more_specific(self, other: VectorFamily) -> VectorFamily {
        if other.is_generic() {
            self
        } else {
            other
        }
    }
}

/// The type of value produced by an expression node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// A real number
    Scalar,
    /// An element of R^dim
    Vector { family: VectorFamily, dim: usize },
    /// An element of SO(3)
    Rotation(RotationRepr),
    /// An element of SE(3)
    RigidTransform(RotationRepr),
}

impl ValueType {
    /// A generic vector of the given dimension.
    pub fn vector(dim: usize) -> Self {
        ValueType::Vector {
            family: VectorFamily::Vector,
            dim,
        }
    }

    /// A translation (or point) in R^3.
    pub fn translation() -> Self {
        ValueType::Vector {
            family: VectorFamily::Translation,
            dim: 3,
        }
    }

    /// The tangent type of SO(3).
    pub fn relative_rotation() -> Self {
        ValueType::Vector {
            family: VectorFamily::RelativeRotation,
            dim: 3,
        }
    }

    /// The tangent type of SE(3), ordered `[rotation; translation]`.
    pub fn twist() -> Self {
        ValueType::Vector {
            family: VectorFamily::Twist,
            dim: 6,
        }
    }

    /// Dimension of the local tangent space.
    pub fn tangent_size(&self) -> usize {
        match self {
            ValueType::Scalar => 1,
            ValueType::Vector { dim, .. } => *dim,
            ValueType::Rotation(_) => 3,
            ValueType::RigidTransform(_) => 6,
        }
    }

    /// Type of the tangent vectors of this manifold.
    pub fn tangent_type(&self) -> ValueType {
        match self {
            ValueType::Scalar => ValueType::Scalar,
            ValueType::Vector { .. } => *self,
            ValueType::Rotation(_) => ValueType::relative_rotation(),
            ValueType::RigidTransform(_) => ValueType::twist(),
        }
    }

    /// Storage representation of the rotation part, if there is one.
    pub fn rotation_repr(&self) -> Option<RotationRepr> {
        match self {
            ValueType::Rotation(repr) | ValueType::RigidTransform(repr) => Some(*repr),
            _ => None,
        }
    }

    /// The same operation family over a different rotation storage.
    ///
    /// Types without a rotation part are returned unchanged.
    pub fn rebind(&self, repr: RotationRepr) -> ValueType {
        match self {
            ValueType::Rotation(_) => ValueType::Rotation(repr),
            ValueType::RigidTransform(_) => ValueType::RigidTransform(repr),
            other => *other,
        }
    }

    /// The same vector storage under a different family.
    pub fn rebind_family(&self, family: VectorFamily) -> ValueType {
        match self {
            ValueType::Vector { dim, .. } => ValueType::Vector { family, dim: *dim },
            other => *other,
        }
    }

    /// Whether values of this type can be converted to `other` without changing the
    /// manifold they live on.
    pub fn can_convert_to(&self, other: &ValueType) -> bool {
        match (self, other) {
            (ValueType::Scalar, ValueType::Scalar) => true,
            (
                ValueType::Vector { family: a, dim: n },
                ValueType::Vector { family: b, dim: m },
            ) => n == m && a.is_compatible(*b),
            (ValueType::Rotation(_), ValueType::Rotation(_)) => true,
            (ValueType::RigidTransform(_), ValueType::RigidTransform(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for RotationRepr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RotationRepr::Quaternion => write!(f, "Quaternion"),
            RotationRepr::Matrix => write!(f, "Matrix"),
            RotationRepr::AngleAxis => write!(f, "AngleAxis"),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Scalar => write!(f, "Scalar"),
            ValueType::Vector { family, dim } => write!(f, "{family:?}<{dim}>"),
            ValueType::Rotation(repr) => write!(f, "Rotation<{repr}>"),
            ValueType::RigidTransform(repr) => write!(f, "RigidTransform<{repr}>"),
        }
    }
}
