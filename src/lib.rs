//! Lazily evaluated geometric expressions with analytic and numerical Jacobians.
//!
//! This crate composes operations on rotations (SO(3)), rigid transforms (SE(3)), vectors
//! and scalars into expression trees, evaluates them, and differentiates them. Jacobians are
//! expressed in left-perturbation local coordinates, `x ⊞ δ = exp(δ)·x`, with twists ordered
//! `[rotation; translation]`.
//!
//! # Features
//!
//! - Operator-based expression building (`*` composes or transforms, `+`/`-` on vectors)
//! - Automatic insertion of representation conversions (quaternion, matrix, angle-axis)
//! - Analytic Jacobians per operation, chained through whole expressions
//! - A finite-difference oracle to check any analytic Jacobian
//!
//! # Example
//!
//! ```rust
//! use lie_expr::prelude::*;
//!
//! let world_t_body = Expr::random(ValueType::RigidTransform(RotationRepr::Quaternion));
//! let point = Expr::translation([1.0, 0.0, 0.0]);
//! let residual = (world_t_body.clone() * point).squared_norm();
//!
//! let value = residual.eval().unwrap();
//! assert_eq!(value.value_type(), ValueType::Scalar);
//!
//! let analytic = evaluate_jacobian(&residual, &world_t_body).unwrap();
//! let numerical = evaluate_numerical_jacobian(&residual, &world_t_body).unwrap();
//! assert_eq!(analytic.shape(), (1, 6));
//! assert!((analytic - numerical).norm() < 1e-4);
//! ```

pub use errors::{EvalError, PrepareError};
pub use evaluator::{eval, evaluate_to, prepare_evaluator, prepare_evaluator_to, prepare_output};
pub use expr::Expr;
pub use jacobian::{evaluate_jacobian, evaluate_with_jacobians};
pub use numerical::{evaluate_numerical_jacobian, evaluate_numerical_jacobians, NumericalJacobian};
pub use value::Value;

pub mod prelude {
    pub use crate::algebra::{RigidTransform, Rotation, VectorValue};
    pub use crate::backends::matrix::Matrix;
    pub use crate::backends::vector::Vector;
    pub use crate::errors::{EvalError, PrepareError};
    pub use crate::evaluator::{
        eval, evaluate_to, prepare_evaluator, prepare_evaluator_to, prepare_output, Evaluator,
    };
    pub use crate::expr::{BinaryOp, Expr, Leaf, OperationTag, UnaryOp};
    pub use crate::jacobian::{evaluate_jacobian, evaluate_with_jacobians};
    pub use crate::numerical::{
        evaluate_numerical_jacobian, evaluate_numerical_jacobians, NumericalJacobian,
    };
    pub use crate::output::{FrameLabels, Framed, OutputFunctor, PlainOutput};
    pub use crate::types::{Jacobian, RotationRepr, Scalar, Tangent, ValueType, VectorFamily};
    pub use crate::value::Value;
}

/// Rotation, rigid-transform and vector algebra
pub mod algebra;
/// Conversions from and to `Vec`, arrays, nalgebra and ndarray containers
pub mod backends;
/// Error types for the various failure modes
pub mod errors;
/// Evaluation of prepared expressions
pub mod evaluator;
/// Expression tree representation
pub mod expr;
/// Analytic Jacobian rules and their chaining through expressions
pub mod jacobian;
/// Finite-difference Jacobians
pub mod numerical;
/// Output finalizers
pub mod output;
/// Conversion insertion before evaluation
pub mod prepare;
/// Operation signatures and value rules
pub mod rules;
/// Scalar, Jacobian and type descriptors
pub mod types;
/// Evaluated values and their manifold operations
pub mod value;
