//! Expression module for representing lazily composed geometric operations.
//!
//! An expression is an immutable tree of operations on rotations, rigid transforms,
//! vectors and scalars. Building one performs no arithmetic; the tree is later rewritten by
//! the [preparer](crate::prepare) and walked by the [evaluator](crate::evaluator). The main
//! types are:
//!
//! - `Expr`: a node of the tree, either a leaf, a unary or a binary operation
//! - `Leaf`: a stored constant or a value produced on demand (identity, zero, random)
//! - `UnaryOp` / `BinaryOp`: the operations with one and two operands
//! - `OperationTag`: the closed set of operation kinds, used in errors and dispatch
//!
//! # Expression Tree Structure
//! - Leaf nodes: constants, Identity, Zero, Random
//! - Unary operations: Convert, Minus, Inverse, LogMap, Norm, SquaredNorm
//! - Binary operations: Sum, Compose, Transform
//!
//! Leaves are shared through `Arc`, so cloning an expression is cheap and a cloned handle
//! of a leaf still refers to the same leaf. Jacobian targets are identified this way.
//!
//! # Operators
//! `+`, `-` and unary `-` map to Sum and Minus. `*` is Transform when the right operand is
//! a vector and Compose otherwise, so `t1 * t2 * p` reads like the usual notation.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::algebra::VectorValue;
use crate::errors::PrepareError;
use crate::rules;
use crate::types::{Scalar, ValueType, VectorFamily};
use crate::value::Value;

/// The closed set of operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationTag {
    Identity,
    Convert,
    Sum,
    Minus,
    Compose,
    Inverse,
    Transform,
    LogMap,
    Norm,
    SquaredNorm,
    Random,
    Zero,
}

impl fmt::Display for OperationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationTag::Identity => "Identity",
            OperationTag::Convert => "Convert",
            OperationTag::Sum => "Sum",
            OperationTag::Minus => "Minus",
            OperationTag::Compose => "Compose",
            OperationTag::Inverse => "Inverse",
            OperationTag::Transform => "Transform",
            OperationTag::LogMap => "LogMap",
            OperationTag::Norm => "Norm",
            OperationTag::SquaredNorm => "SquaredNorm",
            OperationTag::Random => "Random",
            OperationTag::Zero => "Zero",
        };
        write!(f, "{name}")
    }
}

/// A leaf of the expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Leaf {
    /// A stored plain value
    Constant(Value),
    /// The identity element of a rotation or rigid-transform type
    Identity(ValueType),
    /// The zero element of a scalar or vector type
    Zero(ValueType),
    /// A random element, drawn from a generator seeded with `seed` on every evaluation
    Random { ty: ValueType, seed: u64 },
}

impl Leaf {
    pub fn value_type(&self) -> ValueType {
        match self {
            Leaf::Constant(value) => value.value_type(),
            Leaf::Identity(ty) | Leaf::Zero(ty) | Leaf::Random { ty, .. } => *ty,
        }
    }

    /// The operation tag of a produced leaf. Stored constants have none.
    pub fn tag(&self) -> Option<OperationTag> {
        match self {
            Leaf::Constant(_) => None,
            Leaf::Identity(_) => Some(OperationTag::Identity),
            Leaf::Zero(_) => Some(OperationTag::Zero),
            Leaf::Random { .. } => Some(OperationTag::Random),
        }
    }

    /// Checks that the leaf can produce a value of its declared type.
    pub fn validate(&self) -> Result<(), PrepareError> {
        let ok = match self {
            Leaf::Constant(_) | Leaf::Random { .. } => true,
            Leaf::Identity(ty) => matches!(
                ty,
                ValueType::Rotation(_) | ValueType::RigidTransform(_)
            ),
            Leaf::Zero(ty) => matches!(ty, ValueType::Scalar | ValueType::Vector { .. }),
        };
        match (ok, self.tag()) {
            (false, Some(tag)) => Err(PrepareError::UnsupportedLeaf {
                tag,
                ty: self.value_type(),
            }),
            _ => Ok(()),
        }
    }

    /// Produces the leaf's value. Random leaves give the same value on every call.
    pub fn evaluate(&self) -> Value {
        match self {
            Leaf::Constant(value) => value.clone(),
            Leaf::Identity(ty) | Leaf::Zero(ty) => Value::identity(*ty),
            Leaf::Random { ty, seed } => {
                let mut rng = ChaCha8Rng::seed_from_u64(*seed);
                Value::random(*ty, &mut rng)
            }
        }
    }
}

/// Operations with one operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Change representation (rotation storage or vector family) on the same manifold
    Convert(ValueType),
    /// Negation of a scalar or vector
    Minus,
    /// Group inverse of a rotation or rigid transform
    Inverse,
    /// Logarithm of a rotation or rigid transform, giving its tangent vector
    LogMap,
    /// L2 norm of a vector
    Norm,
    /// Squared L2 norm of a vector
    SquaredNorm,
}

impl UnaryOp {
    pub fn tag(&self) -> OperationTag {
        match self {
            UnaryOp::Convert(_) => OperationTag::Convert,
            UnaryOp::Minus => OperationTag::Minus,
            UnaryOp::Inverse => OperationTag::Inverse,
            UnaryOp::LogMap => OperationTag::LogMap,
            UnaryOp::Norm => OperationTag::Norm,
            UnaryOp::SquaredNorm => OperationTag::SquaredNorm,
        }
    }
}

/// Operations with two operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// Sum of two scalars or vectors
    Sum,
    /// Group product `lhs · rhs`
    Compose,
    /// Action of a rotation or rigid transform on a point
    Transform,
}

impl BinaryOp {
    pub fn tag(&self) -> OperationTag {
        match self {
            BinaryOp::Sum => OperationTag::Sum,
            BinaryOp::Compose => OperationTag::Compose,
            BinaryOp::Transform => OperationTag::Transform,
        }
    }
}

/// A node of an expression tree.
#[derive(Debug, Clone)]
pub enum Expr {
    Leaf(Arc<Leaf>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn leaf(leaf: Leaf) -> Self {
        Expr::Leaf(Arc::new(leaf))
    }

    /// A stored constant.
    pub fn constant(value: impl Into<Value>) -> Self {
        Self::leaf(Leaf::Constant(value.into()))
    }

    pub fn scalar(value: Scalar) -> Self {
        Self::constant(value)
    }

    /// A generic vector constant.
    pub fn vector(data: &[Scalar]) -> Self {
        Self::constant(VectorValue::from_slice(VectorFamily::Vector, data))
    }

    /// A translation (or point) constant in R^3.
    pub fn translation(data: [Scalar; 3]) -> Self {
        Self::constant(VectorValue::from_slice(VectorFamily::Translation, &data))
    }

    pub fn identity(ty: ValueType) -> Self {
        Self::leaf(Leaf::Identity(ty))
    }

    pub fn zero(ty: ValueType) -> Self {
        Self::leaf(Leaf::Zero(ty))
    }

    /// A random leaf with a freshly drawn seed.
    pub fn random(ty: ValueType) -> Self {
        Self::random_seeded(ty, rand::random())
    }

    pub fn random_seeded(ty: ValueType, seed: u64) -> Self {
        Self::leaf(Leaf::Random { ty, seed })
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary(op, Box::new(operand))
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    pub fn compose(self, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Compose, self, rhs)
    }

    pub fn transform(self, point: Expr) -> Self {
        Self::binary(BinaryOp::Transform, self, point)
    }

    pub fn inverse(self) -> Self {
        Self::unary(UnaryOp::Inverse, self)
    }

    pub fn log(self) -> Self {
        Self::unary(UnaryOp::LogMap, self)
    }

    pub fn norm(self) -> Self {
        Self::unary(UnaryOp::Norm, self)
    }

    pub fn squared_norm(self) -> Self {
        Self::unary(UnaryOp::SquaredNorm, self)
    }

    pub fn convert(self, ty: ValueType) -> Self {
        Self::unary(UnaryOp::Convert(ty), self)
    }

    /// The shared leaf, if this node is one.
    pub fn as_leaf(&self) -> Option<&Arc<Leaf>> {
        match self {
            Expr::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    /// True if both expressions are handles of the same leaf.
    pub fn is_same_leaf(&self, other: &Expr) -> bool {
        match (self, other) {
            (Expr::Leaf(a), Expr::Leaf(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// True if `leaf` appears anywhere in the tree.
    pub fn contains_leaf(&self, leaf: &Arc<Leaf>) -> bool {
        match self {
            Expr::Leaf(l) => Arc::ptr_eq(l, leaf),
            Expr::Unary(_, operand) => operand.contains_leaf(leaf),
            Expr::Binary(_, lhs, rhs) => lhs.contains_leaf(leaf) || rhs.contains_leaf(leaf),
        }
    }

    /// The natural output type, derived bottom-up from the operation signatures.
    pub fn output_type(&self) -> Result<ValueType, PrepareError> {
        match self {
            Expr::Leaf(leaf) => Ok(leaf.value_type()),
            Expr::Unary(op, operand) => {
                Ok(rules::unary_signature(*op, operand.output_type()?)?.output)
            }
            Expr::Binary(op, lhs, rhs) => {
                Ok(rules::binary_signature(*op, lhs.output_type()?, rhs.output_type()?)?.output)
            }
        }
    }

    /// Evaluates to the natural output type.
    pub fn eval(&self) -> Result<Value, crate::errors::EvalError> {
        crate::evaluator::eval(self)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Leaf(leaf) => match leaf.as_ref() {
                Leaf::Constant(value) => write!(f, "{value}"),
                Leaf::Identity(ty) => write!(f, "identity<{ty}>"),
                Leaf::Zero(ty) => write!(f, "zero<{ty}>"),
                Leaf::Random { ty, .. } => write!(f, "random<{ty}>"),
            },
            Expr::Unary(op, operand) => match op {
                UnaryOp::Convert(ty) => write!(f, "convert<{ty}>({operand})"),
                UnaryOp::Minus => write!(f, "-({operand})"),
                UnaryOp::Inverse => write!(f, "inverse({operand})"),
                UnaryOp::LogMap => write!(f, "log({operand})"),
                UnaryOp::Norm => write!(f, "|{operand}|"),
                UnaryOp::SquaredNorm => write!(f, "|{operand}|^2"),
            },
            Expr::Binary(op, lhs, rhs) => match op {
                BinaryOp::Sum => write!(f, "({lhs} + {rhs})"),
                BinaryOp::Compose => write!(f, "compose({lhs}, {rhs})"),
                BinaryOp::Transform => write!(f, "transform({lhs}, {rhs})"),
            },
        }
    }
}

impl Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Sum, self, rhs)
    }
}

impl Sub for Expr {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        self + (-rhs)
    }
}

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::unary(UnaryOp::Minus, self)
    }
}

impl Mul for Expr {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        match rhs.output_type() {
            Ok(ValueType::Vector { .. }) => self.transform(rhs),
            _ => self.compose(rhs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RotationRepr;

    const RT_QUAT: ValueType = ValueType::RigidTransform(RotationRepr::Quaternion);

    #[test]
    fn test_output_types() {
        let t = Expr::random(RT_QUAT);
        let p = Expr::translation([1.0, 2.0, 3.0]);
        assert_eq!((t.clone() * p).output_type(), Ok(ValueType::translation()));
        assert_eq!(t.clone().log().output_type(), Ok(ValueType::twist()));
        assert_eq!(
            Expr::random(ValueType::Rotation(RotationRepr::Matrix))
                .log()
                .output_type(),
            Ok(ValueType::relative_rotation())
        );
        assert_eq!(
            Expr::vector(&[3.0, 4.0]).squared_norm().output_type(),
            Ok(ValueType::Scalar)
        );
        assert_eq!(t.inverse().output_type(), Ok(RT_QUAT));
    }

    #[test]
    fn test_operator_dispatch() {
        let t1 = Expr::random(RT_QUAT);
        let t2 = Expr::random(RT_QUAT);
        assert!(matches!(
            t1.clone() * t2,
            Expr::Binary(BinaryOp::Compose, _, _)
        ));
        assert!(matches!(
            t1 * Expr::translation([0.0, 0.0, 1.0]),
            Expr::Binary(BinaryOp::Transform, _, _)
        ));

        let v = Expr::vector(&[1.0, 2.0]);
        let w = Expr::vector(&[3.0, 4.0]);
        match v - w {
            Expr::Binary(BinaryOp::Sum, _, rhs) => {
                assert!(matches!(*rhs, Expr::Unary(UnaryOp::Minus, _)))
            }
            other => panic!("unexpected expression {other}"),
        }
    }

    #[test]
    fn test_ill_formed_output_type() {
        let e = Expr::vector(&[1.0, 2.0, 3.0]).compose(Expr::random(RT_QUAT));
        assert_eq!(
            e.output_type(),
            Err(PrepareError::UnsupportedOperands {
                op: OperationTag::Compose,
                lhs: ValueType::vector(3),
                rhs: RT_QUAT,
            })
        );
        let e = Expr::random(RT_QUAT).norm();
        assert!(matches!(
            e.output_type(),
            Err(PrepareError::UnsupportedOperand { .. })
        ));
    }

    #[test]
    fn test_leaf_identity() {
        let a = Expr::vector(&[1.0]);
        let b = Expr::vector(&[1.0]);
        assert!(a.is_same_leaf(&a.clone()));
        assert!(!a.is_same_leaf(&b));

        let sum = a.clone() + b.clone();
        assert!(sum.contains_leaf(a.as_leaf().unwrap()));
        assert!(!sum.contains_leaf(Expr::vector(&[1.0]).as_leaf().unwrap()));
    }

    #[test]
    fn test_random_leaf_is_repeatable() {
        let leaf = Leaf::Random {
            ty: RT_QUAT,
            seed: 42,
        };
        assert_eq!(leaf.evaluate(), leaf.evaluate());
        let other = Leaf::Random {
            ty: RT_QUAT,
            seed: 43,
        };
        assert_ne!(leaf.evaluate(), other.evaluate());
    }

    #[test]
    fn test_leaf_validation() {
        assert!(Leaf::Identity(RT_QUAT).validate().is_ok());
        assert!(Leaf::Zero(ValueType::vector(3)).validate().is_ok());
        assert_eq!(
            Leaf::Identity(ValueType::vector(3)).validate(),
            Err(PrepareError::UnsupportedLeaf {
                tag: OperationTag::Identity,
                ty: ValueType::vector(3),
            })
        );
        assert!(Leaf::Zero(RT_QUAT).validate().is_err());
    }

    #[test]
    fn test_display() {
        let e = Expr::identity(RT_QUAT).compose(Expr::zero(RT_QUAT).inverse());
        assert_eq!(
            format!("{e}"),
            "compose(identity<RigidTransform<Quaternion>>, inverse(zero<RigidTransform<Quaternion>>))"
        );
        let n = (Expr::vector(&[3.0, 4.0]) + Expr::vector(&[1.0, 0.0])).norm();
        assert_eq!(format!("{n}"), "|(Vector[3, 4] + Vector[1, 0])|");
    }
}
