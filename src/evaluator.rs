//! Evaluation of prepared expressions.
//!
//! All evaluation goes through one generic tree walk, [`walk`], parameterized by a
//! [`NodeVisitor`] that decides what happens at leaves and operation nodes. The
//! [`Evaluator`] uses [`DirectEvaluation`], which simply applies the operation rules; the
//! numerical Jacobian oracle supplies a visitor that perturbs one leaf instead.
//!
//! Evaluation is pure: an evaluator can be evaluated any number of times and from several
//! threads, always producing the same value.

use std::fmt;
use std::sync::Arc;

use colored::Colorize;

use crate::errors::EvalError;
use crate::expr::{BinaryOp, Expr, Leaf, UnaryOp};
use crate::output::{OutputFunctor, PlainOutput};
use crate::prepare::{self, PreparedExpr};
use crate::rules;
use crate::types::ValueType;
use crate::value::Value;

/// What to do at each kind of node during a walk.
///
/// Operands are evaluated before their parent, so `unary` and `binary` receive plain
/// values.
pub trait NodeVisitor {
    fn leaf(&self, leaf: &Arc<Leaf>) -> Result<Value, EvalError>;

    fn unary(&self, op: UnaryOp, operand: Value) -> Result<Value, EvalError>;

    fn binary(&self, op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, EvalError>;
}

/// Walks `expr` bottom-up, combining results with `visitor`.
pub fn walk<V: NodeVisitor + ?Sized>(expr: &Expr, visitor: &V) -> Result<Value, EvalError> {
    match expr {
        Expr::Leaf(leaf) => visitor.leaf(leaf),
        Expr::Unary(op, operand) => {
            let operand = walk(operand, visitor)?;
            visitor.unary(*op, operand)
        }
        Expr::Binary(op, lhs, rhs) => {
            let lhs = walk(lhs, visitor)?;
            let rhs = walk(rhs, visitor)?;
            visitor.binary(*op, lhs, rhs)
        }
    }
}

/// Evaluates every node with its value rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectEvaluation;

impl NodeVisitor for DirectEvaluation {
    fn leaf(&self, leaf: &Arc<Leaf>) -> Result<Value, EvalError> {
        Ok(leaf.evaluate())
    }

    fn unary(&self, op: UnaryOp, operand: Value) -> Result<Value, EvalError> {
        rules::apply_unary(op, &operand)
    }

    fn binary(&self, op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, EvalError> {
        rules::apply_binary(op, &lhs, &rhs)
    }
}

/// Evaluates a prepared expression.
#[derive(Debug, Clone)]
pub struct Evaluator {
    prepared: PreparedExpr,
}

impl Evaluator {
    pub fn new(prepared: PreparedExpr) -> Self {
        Self { prepared }
    }

    pub fn prepared(&self) -> &PreparedExpr {
        &self.prepared
    }

    pub fn expr(&self) -> &Expr {
        self.prepared.expr()
    }

    pub fn output_type(&self) -> ValueType {
        self.prepared.output_type()
    }

    pub fn evaluate(&self) -> Result<Value, EvalError> {
        walk(self.prepared.expr(), &DirectEvaluation)
    }
}

impl fmt::Display for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{{\n")?;
        writeln!(f, "    {}: {}\n", "Expression".cyan(), self.expr())?;
        writeln!(f, "    {}: {}\n", "Output".cyan(), self.output_type())?;
        writeln!(f, "}}")?;
        Ok(())
    }
}

/// Prepares `expr` to `destination`, checks the result and wraps it in an evaluator.
pub fn prepare_evaluator_to(expr: &Expr, destination: ValueType) -> Result<Evaluator, EvalError> {
    let prepared = prepare::prepare_to(expr, destination)?;
    prepared.verify()?;
    Ok(Evaluator::new(prepared))
}

/// Prepares `expr` to its natural output type, checks the result and wraps it in an
/// evaluator.
pub fn prepare_evaluator(expr: &Expr) -> Result<Evaluator, EvalError> {
    let prepared = prepare::prepare(expr)?;
    prepared.verify()?;
    Ok(Evaluator::new(prepared))
}

/// Evaluates and applies an output finalizer.
pub fn prepare_output<F: OutputFunctor + ?Sized>(
    evaluator: &Evaluator,
    functor: &F,
) -> Result<F::Output, EvalError> {
    Ok(functor.apply(evaluator.evaluate()?))
}

/// Prepares, checks and evaluates `expr` to a value of type `destination`.
pub fn evaluate_to(expr: &Expr, destination: ValueType) -> Result<Value, EvalError> {
    prepare_output(&prepare_evaluator_to(expr, destination)?, &PlainOutput)
}

/// Evaluates `expr` to its natural output type.
pub fn eval(expr: &Expr) -> Result<Value, EvalError> {
    prepare_output(&prepare_evaluator(expr)?, &PlainOutput)
}
