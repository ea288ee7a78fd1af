//! Error types for the lie-expr crate.
//!
//! This module defines the failure modes of expression preparation and evaluation:
//!
//! - `PrepareError`: an expression tree cannot be typed, e.g. a rotation composed with a vector
//! - `EvalError`: evaluation or differentiation failed, wrapping any `PrepareError`
//!
//! Numerical imprecision of finite-difference Jacobians is never reported as an error.

use thiserror::Error;

use crate::expr::OperationTag;
use crate::types::ValueType;

/// Errors that can occur while rewriting an expression into its prepared form.
///
/// These signal an ill-formed expression tree: the operation has no rule for the operand
/// types it was given.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PrepareError {
    /// A unary operation was applied to an operand it has no rule for
    #[error("{op} is not defined for {operand}")]
    UnsupportedOperand { op: OperationTag, operand: ValueType },
    /// A binary operation was applied to operands it has no rule for
    #[error("{op} is not defined for {lhs} and {rhs}")]
    UnsupportedOperands {
        op: OperationTag,
        lhs: ValueType,
        rhs: ValueType,
    },
    /// A conversion between two types living on different manifolds
    #[error("cannot convert {from} to {to}")]
    InvalidConversion { from: ValueType, to: ValueType },
    /// A leaf that cannot produce a value of its declared type
    #[error("{tag} cannot produce a value of type {ty}")]
    UnsupportedLeaf { tag: OperationTag, ty: ValueType },
}

/// Errors that can occur when evaluating an expression or its Jacobians.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    /// The expression could not be prepared
    #[error("Failed to prepare expression: {0}")]
    Prepare(#[from] PrepareError),
    /// An operation rule received operands other than the prepared types it expects.
    ///
    /// This indicates a malformed algebra rule, not a user error.
    #[error("{op} expected {expected} but received {found}")]
    PreparedTypeMismatch {
        op: OperationTag,
        expected: ValueType,
        found: ValueType,
    },
    /// Jacobians can only be taken with respect to leaf expressions
    #[error("Jacobian target must be a leaf expression, got {0}")]
    TargetNotLeaf(String),
    /// The Jacobian of the L2 norm is undefined at the zero vector
    #[error("Jacobian of Norm is undefined at the zero vector")]
    ZeroNormJacobian,
    /// Box-minus between values on different manifolds
    #[error("cannot take the difference of {lhs} and {rhs}")]
    ManifoldMismatch { lhs: ValueType, rhs: ValueType },
    /// A tangent vector whose size does not match the manifold
    #[error("Invalid tangent length: expected {expected}, got {got}")]
    InvalidTangentLength { expected: usize, got: usize },
}
