//! Expression preparation: rewriting a tree so every operation receives exactly the operand
//! types it expects.
//!
//! Preparation is bottom-up. Each child is prepared first; its type is then compared with
//! the type the parent's signature expects and, where they differ, the child is wrapped in
//! a `Convert`. Preparing to a destination type other than the natural one adds a final
//! `Convert` at the root.

use log::trace;

use crate::errors::{EvalError, PrepareError};
use crate::expr::{Expr, UnaryOp};
use crate::rules;
use crate::types::ValueType;

/// An expression whose operand types all match their operation signatures.
#[derive(Debug, Clone)]
pub struct PreparedExpr {
    expr: Expr,
    output_type: ValueType,
}

impl PreparedExpr {
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn into_expr(self) -> Expr {
        self.expr
    }

    pub fn output_type(&self) -> ValueType {
        self.output_type
    }

    /// Re-derives every signature and checks that no conversion is missing.
    pub fn verify(&self) -> Result<(), EvalError> {
        let found = verify_node(&self.expr)?;
        if found != self.output_type {
            return Err(EvalError::PreparedTypeMismatch {
                op: crate::expr::OperationTag::Convert,
                expected: self.output_type,
                found,
            });
        }
        Ok(())
    }
}

/// Prepares an expression to its natural output type.
pub fn prepare(expr: &Expr) -> Result<PreparedExpr, PrepareError> {
    let (expr, output_type) = prepare_node(expr)?;
    Ok(PreparedExpr { expr, output_type })
}

/// Prepares an expression to produce a value of type `destination`.
pub fn prepare_to(expr: &Expr, destination: ValueType) -> Result<PreparedExpr, PrepareError> {
    let (node, natural) = prepare_node(expr)?;
    if natural == destination {
        return Ok(PreparedExpr {
            expr: node,
            output_type: natural,
        });
    }
    let signature = rules::unary_signature(UnaryOp::Convert(destination), natural)?;
    trace!("Converting output {natural} to {destination}");
    Ok(PreparedExpr {
        expr: Expr::unary(UnaryOp::Convert(destination), node),
        output_type: signature.output,
    })
}

fn prepare_node(expr: &Expr) -> Result<(Expr, ValueType), PrepareError> {
    match expr {
        Expr::Leaf(leaf) => {
            leaf.validate()?;
            Ok((Expr::Leaf(leaf.clone()), leaf.value_type()))
        }
        Expr::Unary(op, operand) => {
            let (operand, ty) = prepare_node(operand)?;
            let signature = rules::unary_signature(*op, ty)?;
            let operand = coerce(operand, ty, signature.operand);
            Ok((Expr::unary(*op, operand), signature.output))
        }
        Expr::Binary(op, lhs, rhs) => {
            let (lhs, lhs_ty) = prepare_node(lhs)?;
            let (rhs, rhs_ty) = prepare_node(rhs)?;
            let signature = rules::binary_signature(*op, lhs_ty, rhs_ty)?;
            let lhs = coerce(lhs, lhs_ty, signature.lhs);
            let rhs = coerce(rhs, rhs_ty, signature.rhs);
            Ok((Expr::binary(*op, lhs, rhs), signature.output))
        }
    }
}

fn coerce(expr: Expr, found: ValueType, expected: ValueType) -> Expr {
    if found == expected {
        return expr;
    }
    trace!("Inserting conversion {found} -> {expected}");
    Expr::unary(UnaryOp::Convert(expected), expr)
}

fn verify_node(expr: &Expr) -> Result<ValueType, EvalError> {
    match expr {
        Expr::Leaf(leaf) => Ok(leaf.value_type()),
        Expr::Unary(op, operand) => {
            let found = verify_node(operand)?;
            let signature = rules::unary_signature(*op, found)?;
            if found != signature.operand {
                return Err(EvalError::PreparedTypeMismatch {
                    op: op.tag(),
                    expected: signature.operand,
                    found,
                });
            }
            Ok(signature.output)
        }
        Expr::Binary(op, lhs, rhs) => {
            let lhs_ty = verify_node(lhs)?;
            let rhs_ty = verify_node(rhs)?;
            let signature = rules::binary_signature(*op, lhs_ty, rhs_ty)?;
            for (expected, found) in [(signature.lhs, lhs_ty), (signature.rhs, rhs_ty)] {
                if found != expected {
                    return Err(EvalError::PreparedTypeMismatch {
                        op: op.tag(),
                        expected,
                        found,
                    });
                }
            }
            Ok(signature.output)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{BinaryOp, OperationTag};
    use crate::types::RotationRepr;

    fn rt(repr: RotationRepr) -> ValueType {
        ValueType::RigidTransform(repr)
    }

    fn count_converts(expr: &Expr) -> usize {
        match expr {
            Expr::Leaf(_) => 0,
            Expr::Unary(UnaryOp::Convert(_), operand) => 1 + count_converts(operand),
            Expr::Unary(_, operand) => count_converts(operand),
            Expr::Binary(_, lhs, rhs) => count_converts(lhs) + count_converts(rhs),
        }
    }

    #[test]
    fn test_mixed_storage_compose_converts_lhs() {
        let a = Expr::random(rt(RotationRepr::Matrix));
        let b = Expr::random(rt(RotationRepr::Quaternion));
        let prepared = prepare(&a.compose(b)).unwrap();

        assert_eq!(prepared.output_type(), rt(RotationRepr::Quaternion));
        assert_eq!(count_converts(prepared.expr()), 1);
        match prepared.expr() {
            Expr::Binary(BinaryOp::Compose, lhs, rhs) => {
                assert!(matches!(
                    lhs.as_ref(),
                    Expr::Unary(UnaryOp::Convert(ty), _) if *ty == rt(RotationRepr::Quaternion)
                ));
                assert!(matches!(rhs.as_ref(), Expr::Leaf(_)));
            }
            other => panic!("unexpected prepared tree {other}"),
        }
        assert!(prepared.verify().is_ok());
    }

    #[test]
    fn test_destination_adds_root_conversion() {
        let a = Expr::random(rt(RotationRepr::Matrix));
        let b = Expr::random(rt(RotationRepr::Quaternion));
        let prepared = prepare_to(&a.compose(b), rt(RotationRepr::AngleAxis)).unwrap();

        assert_eq!(prepared.output_type(), rt(RotationRepr::AngleAxis));
        assert_eq!(count_converts(prepared.expr()), 2);
        assert!(matches!(
            prepared.expr(),
            Expr::Unary(UnaryOp::Convert(ty), _) if *ty == rt(RotationRepr::AngleAxis)
        ));
        assert!(prepared.verify().is_ok());
    }

    #[test]
    fn test_natural_type_needs_no_conversion() {
        let t = Expr::random(rt(RotationRepr::Quaternion));
        let p = Expr::translation([1.0, 2.0, 3.0]);
        let prepared = prepare_to(&(t * p).squared_norm(), ValueType::Scalar).unwrap();
        assert_eq!(count_converts(prepared.expr()), 0);
    }

    #[test]
    fn test_invalid_destination() {
        let t = Expr::random(rt(RotationRepr::Quaternion));
        assert_eq!(
            prepare_to(&t, ValueType::twist()).unwrap_err(),
            PrepareError::InvalidConversion {
                from: rt(RotationRepr::Quaternion),
                to: ValueType::twist(),
            }
        );
    }

    #[test]
    fn test_ill_formed_tree() {
        let e = Expr::vector(&[1.0, 2.0, 3.0]).inverse();
        assert_eq!(
            prepare(&e).unwrap_err(),
            PrepareError::UnsupportedOperand {
                op: OperationTag::Inverse,
                operand: ValueType::vector(3),
            }
        );
        let e = Expr::identity(ValueType::vector(2));
        assert!(matches!(
            prepare(&e),
            Err(PrepareError::UnsupportedLeaf { .. })
        ));
    }

    #[test]
    fn test_verify_detects_missing_conversion() {
        let unprepared = PreparedExpr {
            expr: Expr::random(rt(RotationRepr::Matrix))
                .compose(Expr::random(rt(RotationRepr::Quaternion))),
            output_type: rt(RotationRepr::Quaternion),
        };
        assert_eq!(
            unprepared.verify(),
            Err(EvalError::PreparedTypeMismatch {
                op: OperationTag::Compose,
                expected: rt(RotationRepr::Quaternion),
                found: rt(RotationRepr::Matrix),
            })
        );
    }

    #[test]
    fn test_leaves_are_shared_after_preparation() {
        let t = Expr::random(rt(RotationRepr::Matrix));
        let prepared = prepare_to(&t.clone().inverse(), rt(RotationRepr::Quaternion)).unwrap();
        assert!(prepared.expr().contains_leaf(t.as_leaf().unwrap()));
    }
}
