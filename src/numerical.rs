//! Finite-difference Jacobians, used as an independent check of the analytic rules.
//!
//! The oracle evaluates the expression once for a baseline, then once per tangent
//! coordinate of the target leaf with that leaf box-plussed by `delta` along the
//! coordinate. Every operation node above it is rebuilt from plain operand values and
//! re-evaluated, so the result depends only on the value rules, never on the analytic
//! Jacobians. Column `i` is `(perturbed ⊟ baseline) / delta`.
//!
//! The result is approximate. Its imprecision is never reported as an error.

use std::sync::Arc;

use log::debug;

use crate::errors::EvalError;
use crate::evaluator::{self, walk, Evaluator, NodeVisitor};
use crate::expr::{BinaryOp, Expr, Leaf, UnaryOp};
use crate::jacobian::target_leaves;
use crate::output::{OutputFunctor, PlainOutput};
use crate::types::{Jacobian, Scalar, Tangent};
use crate::value::Value;

/// Visitor that box-plusses one target leaf and re-prepares every operation node.
struct PerturbTarget<'a> {
    target: &'a Arc<Leaf>,
    delta: Tangent,
}

impl PerturbTarget<'_> {
    fn reevaluate(node: &Expr) -> Result<Value, EvalError> {
        evaluator::prepare_evaluator(node)?.evaluate()
    }
}

impl NodeVisitor for PerturbTarget<'_> {
    fn leaf(&self, leaf: &Arc<Leaf>) -> Result<Value, EvalError> {
        let value = leaf.evaluate();
        if Arc::ptr_eq(leaf, self.target) {
            return value.box_plus(&self.delta);
        }
        Ok(value)
    }

    fn unary(&self, op: UnaryOp, operand: Value) -> Result<Value, EvalError> {
        Self::reevaluate(&Expr::unary(op, Expr::constant(operand)))
    }

    fn binary(&self, op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, EvalError> {
        Self::reevaluate(&Expr::binary(op, Expr::constant(lhs), Expr::constant(rhs)))
    }
}

/// Finite-difference Jacobian settings.
#[derive(Debug, Clone)]
pub struct NumericalJacobian<F = PlainOutput> {
    delta: Scalar,
    output: F,
}

impl Default for NumericalJacobian<PlainOutput> {
    fn default() -> Self {
        Self {
            delta: f64::EPSILON.sqrt(),
            output: PlainOutput,
        }
    }
}

impl NumericalJacobian<PlainOutput> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<F: OutputFunctor> NumericalJacobian<F> {
    /// Sets the perturbation step. Defaults to `sqrt(f64::EPSILON)`.
    pub fn with_delta(mut self, delta: Scalar) -> Self {
        self.delta = delta;
        self
    }

    /// Measures differences on outputs wrapped by `output`.
    pub fn with_output<G: OutputFunctor>(self, output: G) -> NumericalJacobian<G> {
        NumericalJacobian {
            delta: self.delta,
            output,
        }
    }

    pub fn delta(&self) -> Scalar {
        self.delta
    }

    /// Jacobian of `expr` with respect to the leaf `target`.
    pub fn evaluate(&self, expr: &Expr, target: &Expr) -> Result<Jacobian, EvalError> {
        let mut jacobians = self.evaluate_many(expr, &[target])?;
        jacobians
            .pop()
            .ok_or_else(|| EvalError::TargetNotLeaf(target.to_string()))
    }

    /// Jacobians of `expr` with respect to each target leaf, sharing one baseline.
    pub fn evaluate_many(&self, expr: &Expr, targets: &[&Expr]) -> Result<Vec<Jacobian>, EvalError> {
        let leaves = target_leaves(targets)?;
        let evaluator = evaluator::prepare_evaluator(expr)?;

        let baseline = self.output.apply(evaluator.evaluate()?);
        debug!("Numerical baseline: {}", baseline.as_ref());

        leaves
            .iter()
            .map(|leaf| self.jacobian_for(&evaluator, baseline.as_ref(), leaf))
            .collect()
    }

    fn jacobian_for(
        &self,
        evaluator: &Evaluator,
        baseline: &Value,
        target: &Arc<Leaf>,
    ) -> Result<Jacobian, EvalError> {
        let rows = baseline.tangent_size();
        let cols = target.value_type().tangent_size();
        let mut jacobian = Jacobian::zeros(rows, cols);
        if !evaluator.expr().contains_leaf(target) {
            debug!("Target {} does not appear in the expression", target.value_type());
            return Ok(jacobian);
        }

        for i in 0..cols {
            let mut delta = Tangent::zeros(cols);
            delta[i] = self.delta;
            let visitor = PerturbTarget {
                target,
                delta,
            };
            let perturbed = self.output.apply(walk(evaluator.expr(), &visitor)?);
            let column = perturbed.as_ref().box_minus(baseline)? / self.delta;
            debug!("Column {i}: {}", column.transpose());
            jacobian.set_column(i, &column);
        }
        Ok(jacobian)
    }
}

/// Finite-difference Jacobian of `expr` with respect to the leaf `target`.
pub fn evaluate_numerical_jacobian(expr: &Expr, target: &Expr) -> Result<Jacobian, EvalError> {
    NumericalJacobian::new().evaluate(expr, target)
}

/// Finite-difference Jacobians of `expr` with respect to each target leaf.
pub fn evaluate_numerical_jacobians(
    expr: &Expr,
    targets: &[&Expr],
) -> Result<Vec<Jacobian>, EvalError> {
    NumericalJacobian::new().evaluate_many(expr, targets)
}
