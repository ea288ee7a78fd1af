//! Analytic Jacobians.
//!
//! Every operation has a local Jacobian per operand: the derivative of its output with
//! respect to that operand, in left-perturbation coordinates (`x ⊞ δ = exp(δ)·x` for
//! rotations and rigid transforms, `x + δ` otherwise). A Jacobian has
//! `tangent_size(output)` rows and `tangent_size(operand)` columns.
//!
//! [`evaluate_jacobian`] and [`evaluate_with_jacobians`] chain these local Jacobians through
//! a prepared tree in forward mode to get the Jacobian of a whole expression with respect
//! to one or more of its leaves.

use std::sync::Arc;

use log::debug;
use nalgebra::{SMatrix, Vector3};

use crate::algebra::{rigid_transform, rotation, vector};
use crate::errors::{EvalError, PrepareError};
use crate::evaluator;
use crate::expr::{BinaryOp, Expr, Leaf, UnaryOp};
use crate::rules;
use crate::types::{Jacobian, Scalar};
use crate::value::Value;

fn dynamic<const R: usize, const C: usize>(m: &SMatrix<Scalar, R, C>) -> Jacobian {
    Jacobian::from_column_slice(R, C, m.as_slice())
}

fn point(value: &Value) -> Option<Vector3<Scalar>> {
    value
        .as_vector()
        .filter(|v| v.dim() == 3)
        .map(|v| Vector3::from_column_slice(v.data().as_slice()))
}

fn unsupported_unary(op: UnaryOp, operand: &Value) -> EvalError {
    PrepareError::UnsupportedOperand {
        op: op.tag(),
        operand: operand.value_type(),
    }
    .into()
}

fn unsupported_binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> EvalError {
    PrepareError::UnsupportedOperands {
        op: op.tag(),
        lhs: lhs.value_type(),
        rhs: rhs.value_type(),
    }
    .into()
}

/// Jacobian of a unary operation with respect to its operand.
///
/// `value` is the operation's output for `operand`.
pub fn unary_jacobian(op: UnaryOp, value: &Value, operand: &Value) -> Result<Jacobian, EvalError> {
    let n = operand.tangent_size();
    match (op, value, operand) {
        (UnaryOp::Convert(_), _, _) => Ok(Jacobian::identity(n, n)),
        (UnaryOp::Minus, _, Value::Scalar(_) | Value::Vector(_)) => Ok(-Jacobian::identity(n, n)),
        (UnaryOp::Inverse, Value::Rotation(out), _) => {
            Ok(dynamic(&rotation::inverse_jacobian(out)))
        }
        (UnaryOp::Inverse, Value::RigidTransform(out), _) => {
            Ok(dynamic(&rigid_transform::inverse_jacobian(out)))
        }
        (UnaryOp::LogMap, _, Value::Rotation(r)) => {
            Ok(dynamic(&rotation::log_map_jacobian(&r.log())))
        }
        (UnaryOp::LogMap, _, Value::RigidTransform(t)) => {
            Ok(dynamic(&rigid_transform::log_map_jacobian(&t.log())))
        }
        (UnaryOp::Norm, Value::Scalar(norm), Value::Vector(v)) => vector::norm_jacobian(v, *norm),
        (UnaryOp::SquaredNorm, _, Value::Vector(v)) => Ok(vector::squared_norm_jacobian(v)),
        _ => Err(unsupported_unary(op, operand)),
    }
}

/// Jacobian of a binary operation with respect to its left operand.
pub fn left_jacobian(
    op: BinaryOp,
    value: &Value,
    lhs: &Value,
    rhs: &Value,
) -> Result<Jacobian, EvalError> {
    let n = lhs.tangent_size();
    match (op, lhs) {
        (BinaryOp::Sum, _) | (BinaryOp::Compose, _) => Ok(Jacobian::identity(n, n)),
        (BinaryOp::Transform, Value::Rotation(_)) => {
            let out = point(value).ok_or_else(|| unsupported_binary(op, lhs, rhs))?;
            Ok(dynamic(&rotation::transform_lhs_jacobian(&out)))
        }
        (BinaryOp::Transform, Value::RigidTransform(_)) => {
            let out = point(value).ok_or_else(|| unsupported_binary(op, lhs, rhs))?;
            Ok(dynamic(&rigid_transform::transform_lhs_jacobian(&out)))
        }
        _ => Err(unsupported_binary(op, lhs, rhs)),
    }
}

/// Jacobian of a binary operation with respect to its right operand.
///
/// For Compose this is the adjoint of the left operand.
pub fn right_jacobian(
    op: BinaryOp,
    _value: &Value,
    lhs: &Value,
    rhs: &Value,
) -> Result<Jacobian, EvalError> {
    let n = rhs.tangent_size();
    match (op, lhs) {
        (BinaryOp::Sum, _) => Ok(Jacobian::identity(n, n)),
        (BinaryOp::Compose, Value::Rotation(r)) => Ok(dynamic(&rotation::compose_rhs_jacobian(r))),
        (BinaryOp::Compose, Value::RigidTransform(t)) => {
            Ok(dynamic(&rigid_transform::compose_rhs_jacobian(t)))
        }
        (BinaryOp::Transform, Value::Rotation(r)) => {
            Ok(dynamic(&rotation::transform_rhs_jacobian(r)))
        }
        (BinaryOp::Transform, Value::RigidTransform(t)) => {
            Ok(dynamic(&rigid_transform::transform_rhs_jacobian(t)))
        }
        _ => Err(unsupported_binary(op, lhs, rhs)),
    }
}

/// A node's value and its Jacobian with respect to each target; `None` means the node does
/// not depend on that target.
struct Linearized {
    value: Value,
    jacobians: Vec<Option<Jacobian>>,
}

fn chain(local: &Jacobian, inner: &[Option<Jacobian>]) -> Vec<Option<Jacobian>> {
    inner.iter().map(|j| j.as_ref().map(|j| local * j)).collect()
}

fn linearize(expr: &Expr, targets: &[Arc<Leaf>]) -> Result<Linearized, EvalError> {
    match expr {
        Expr::Leaf(leaf) => {
            let value = leaf.evaluate();
            let n = value.tangent_size();
            let jacobians = targets
                .iter()
                .map(|t| Arc::ptr_eq(t, leaf).then(|| Jacobian::identity(n, n)))
                .collect();
            Ok(Linearized { value, jacobians })
        }
        Expr::Unary(op, operand) => {
            let inner = linearize(operand, targets)?;
            let value = rules::apply_unary(*op, &inner.value)?;
            let jacobians = if inner.jacobians.iter().any(Option::is_some) {
                let local = unary_jacobian(*op, &value, &inner.value)?;
                chain(&local, &inner.jacobians)
            } else {
                inner.jacobians
            };
            Ok(Linearized { value, jacobians })
        }
        Expr::Binary(op, lhs, rhs) => {
            let lhs = linearize(lhs, targets)?;
            let rhs = linearize(rhs, targets)?;
            let value = rules::apply_binary(*op, &lhs.value, &rhs.value)?;

            let from_lhs = if lhs.jacobians.iter().any(Option::is_some) {
                chain(&left_jacobian(*op, &value, &lhs.value, &rhs.value)?, &lhs.jacobians)
            } else {
                vec![None; targets.len()]
            };
            let from_rhs = if rhs.jacobians.iter().any(Option::is_some) {
                chain(&right_jacobian(*op, &value, &lhs.value, &rhs.value)?, &rhs.jacobians)
            } else {
                vec![None; targets.len()]
            };
            let jacobians = from_lhs
                .into_iter()
                .zip(from_rhs)
                .map(|pair| match pair {
                    (Some(a), Some(b)) => Some(a + b),
                    (a, b) => a.or(b),
                })
                .collect();
            Ok(Linearized { value, jacobians })
        }
    }
}

pub(crate) fn target_leaves(targets: &[&Expr]) -> Result<Vec<Arc<Leaf>>, EvalError> {
    targets
        .iter()
        .map(|target| {
            target
                .as_leaf()
                .cloned()
                .ok_or_else(|| EvalError::TargetNotLeaf(target.to_string()))
        })
        .collect()
}

/// Evaluates `expr` together with its analytic Jacobian with respect to each target leaf.
///
/// A target that does not appear in the expression gets a zero Jacobian.
pub fn evaluate_with_jacobians(
    expr: &Expr,
    targets: &[&Expr],
) -> Result<(Value, Vec<Jacobian>), EvalError> {
    let leaves = target_leaves(targets)?;
    let evaluator = evaluator::prepare_evaluator(expr)?;

    let Linearized { value, jacobians } = linearize(evaluator.expr(), &leaves)?;
    let rows = value.tangent_size();
    let jacobians = jacobians
        .into_iter()
        .zip(&leaves)
        .map(|(jacobian, leaf)| {
            jacobian.unwrap_or_else(|| {
                debug!("Target {} does not appear in the expression", leaf.value_type());
                Jacobian::zeros(rows, leaf.value_type().tangent_size())
            })
        })
        .collect();
    Ok((value, jacobians))
}

/// Analytic Jacobian of `expr` with respect to the leaf `target`.
pub fn evaluate_jacobian(expr: &Expr, target: &Expr) -> Result<Jacobian, EvalError> {
    let (_, mut jacobians) = evaluate_with_jacobians(expr, &[target])?;
    jacobians
        .pop()
        .ok_or_else(|| EvalError::TargetNotLeaf(target.to_string()))
}
