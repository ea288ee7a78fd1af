//! Operation rules: the signature of every operation and the plain-value computation it
//! performs.
//!
//! A signature maps the operand types an operation was given to the operand types it
//! expects and the type it produces. The preparer inserts conversions wherever the two
//! differ; the value rules then only ever see the expected types, and re-check that they
//! do before computing.

use nalgebra::{DVector, Vector3};

use crate::algebra::{rigid_transform, vector, VectorValue};
use crate::errors::{EvalError, PrepareError};
use crate::expr::{BinaryOp, OperationTag, UnaryOp};
use crate::types::{ValueType, VectorFamily};
use crate::value::Value;

/// Expected operand type and output type of a unary operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnarySignature {
    pub operand: ValueType,
    pub output: ValueType,
}

/// Expected operand types and output type of a binary operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinarySignature {
    pub lhs: ValueType,
    pub rhs: ValueType,
    pub output: ValueType,
}

pub fn unary_signature(op: UnaryOp, operand: ValueType) -> Result<UnarySignature, PrepareError> {
    let output = match (op, operand) {
        (UnaryOp::Convert(to), from) => {
            if !from.can_convert_to(&to) {
                return Err(PrepareError::InvalidConversion { from, to });
            }
            to
        }
        (UnaryOp::Minus, ValueType::Scalar | ValueType::Vector { .. }) => operand,
        (UnaryOp::Inverse, ValueType::Rotation(_) | ValueType::RigidTransform(_)) => operand,
        (UnaryOp::LogMap, ValueType::Rotation(_) | ValueType::RigidTransform(_)) => {
            operand.tangent_type()
        }
        (UnaryOp::Norm | UnaryOp::SquaredNorm, ValueType::Vector { .. }) => ValueType::Scalar,
        _ => {
            return Err(PrepareError::UnsupportedOperand {
                op: op.tag(),
                operand,
            })
        }
    };
    Ok(UnarySignature { operand, output })
}

pub fn binary_signature(
    op: BinaryOp,
    lhs: ValueType,
    rhs: ValueType,
) -> Result<BinarySignature, PrepareError> {
    let unsupported = || PrepareError::UnsupportedOperands {
        op: op.tag(),
        lhs,
        rhs,
    };
    match (op, lhs, rhs) {
        (BinaryOp::Sum, ValueType::Scalar, ValueType::Scalar) => Ok(BinarySignature {
            lhs,
            rhs,
            output: ValueType::Scalar,
        }),
        (
            BinaryOp::Sum,
            ValueType::Vector { family: a, dim: n },
            ValueType::Vector { family: b, dim: m },
        ) if n == m && a.is_compatible(b) => Ok(BinarySignature {
            lhs,
            rhs,
            output: ValueType::Vector {
                family: a.more_specific(b),
                dim: n,
            },
        }),
        // Both operands take the right operand's composable storage
        (BinaryOp::Compose, ValueType::Rotation(_), ValueType::Rotation(repr))
        | (BinaryOp::Compose, ValueType::RigidTransform(_), ValueType::RigidTransform(repr)) => {
            let expected = rhs.rebind(repr.composable());
            Ok(BinarySignature {
                lhs: expected,
                rhs: expected,
                output: expected,
            })
        }
        (
            BinaryOp::Transform,
            ValueType::Rotation(repr) | ValueType::RigidTransform(repr),
            ValueType::Vector {
                family: VectorFamily::Translation | VectorFamily::Vector,
                dim: 3,
            },
        ) => Ok(BinarySignature {
            lhs: lhs.rebind(repr.composable()),
            rhs,
            output: rhs,
        }),
        _ => Err(unsupported()),
    }
}

fn expect_type(op: OperationTag, expected: ValueType, found: &Value) -> Result<(), EvalError> {
    let found = found.value_type();
    if found != expected {
        return Err(EvalError::PreparedTypeMismatch {
            op,
            expected,
            found,
        });
    }
    Ok(())
}

fn tangent_vector(family: VectorFamily, data: &[f64]) -> Value {
    Value::Vector(VectorValue::new(family, DVector::from_column_slice(data)))
}

/// Applies a unary operation to an operand of its expected type.
pub fn apply_unary(op: UnaryOp, operand: &Value) -> Result<Value, EvalError> {
    let signature = unary_signature(op, operand.value_type())?;
    expect_type(op.tag(), signature.operand, operand)?;

    let value = match (op, operand) {
        (UnaryOp::Convert(to), value) => value.convert_to(to)?,
        (UnaryOp::Minus, Value::Scalar(s)) => Value::Scalar(-s),
        (UnaryOp::Minus, Value::Vector(v)) => Value::Vector(vector::minus(v)),
        (UnaryOp::Inverse, Value::Rotation(r)) => Value::Rotation(r.inverse()),
        (UnaryOp::Inverse, Value::RigidTransform(t)) => Value::RigidTransform(t.inverse()),
        (UnaryOp::LogMap, Value::Rotation(r)) => {
            tangent_vector(VectorFamily::RelativeRotation, r.log().as_slice())
        }
        (UnaryOp::LogMap, Value::RigidTransform(t)) => {
            tangent_vector(VectorFamily::Twist, rigid_transform::log_map(t).as_slice())
        }
        (UnaryOp::Norm, Value::Vector(v)) => Value::Scalar(vector::norm(v)),
        (UnaryOp::SquaredNorm, Value::Vector(v)) => Value::Scalar(vector::squared_norm(v)),
        _ => {
            return Err(PrepareError::UnsupportedOperand {
                op: op.tag(),
                operand: operand.value_type(),
            }
            .into())
        }
    };
    Ok(value)
}

/// Applies a binary operation to operands of its expected types.
pub fn apply_binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
    let signature = binary_signature(op, lhs.value_type(), rhs.value_type())?;
    expect_type(op.tag(), signature.lhs, lhs)?;
    expect_type(op.tag(), signature.rhs, rhs)?;

    let value = match (op, lhs, rhs) {
        (BinaryOp::Sum, Value::Scalar(a), Value::Scalar(b)) => Value::Scalar(a + b),
        (BinaryOp::Sum, Value::Vector(a), Value::Vector(b)) => Value::Vector(vector::sum(a, b)),
        (BinaryOp::Compose, Value::Rotation(a), Value::Rotation(b)) => {
            Value::Rotation(a.compose(b))
        }
        (BinaryOp::Compose, Value::RigidTransform(a), Value::RigidTransform(b)) => {
            Value::RigidTransform(a.compose(b))
        }
        (BinaryOp::Transform, Value::Rotation(r), Value::Vector(p)) => {
            let out = r.rotate(&Vector3::from_column_slice(p.data().as_slice()));
            tangent_vector(p.family(), out.as_slice())
        }
        (BinaryOp::Transform, Value::RigidTransform(t), Value::Vector(p)) => {
            let out = t.transform_point(&Vector3::from_column_slice(p.data().as_slice()));
            tangent_vector(p.family(), out.as_slice())
        }
        _ => {
            return Err(PrepareError::UnsupportedOperands {
                op: op.tag(),
                lhs: lhs.value_type(),
                rhs: rhs.value_type(),
            }
            .into())
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::{RigidTransform, Rotation};
    use crate::types::RotationRepr;
    use nalgebra::Vector3;

    fn rt(repr: RotationRepr) -> ValueType {
        ValueType::RigidTransform(repr)
    }

    #[test]
    fn test_compose_signature_uses_rhs_storage() {
        let sig = binary_signature(
            BinaryOp::Compose,
            rt(RotationRepr::Matrix),
            rt(RotationRepr::Quaternion),
        )
        .unwrap();
        assert_eq!(sig.lhs, rt(RotationRepr::Quaternion));
        assert_eq!(sig.rhs, rt(RotationRepr::Quaternion));
        assert_eq!(sig.output, rt(RotationRepr::Quaternion));

        let sig = binary_signature(
            BinaryOp::Compose,
            rt(RotationRepr::AngleAxis),
            rt(RotationRepr::AngleAxis),
        )
        .unwrap();
        assert_eq!(sig.output, rt(RotationRepr::Quaternion));
    }

    #[test]
    fn test_transform_signature() {
        let sig = binary_signature(
            BinaryOp::Transform,
            ValueType::Rotation(RotationRepr::AngleAxis),
            ValueType::vector(3),
        )
        .unwrap();
        assert_eq!(sig.lhs, ValueType::Rotation(RotationRepr::Quaternion));
        assert_eq!(sig.output, ValueType::vector(3));

        assert!(binary_signature(
            BinaryOp::Transform,
            rt(RotationRepr::Matrix),
            ValueType::vector(4)
        )
        .is_err());
        assert!(binary_signature(
            BinaryOp::Transform,
            rt(RotationRepr::Matrix),
            ValueType::twist()
        )
        .is_err());
    }

    #[test]
    fn test_sum_signature() {
        let sig =
            binary_signature(BinaryOp::Sum, ValueType::vector(3), ValueType::translation()).unwrap();
        assert_eq!(sig.output, ValueType::translation());
        assert!(
            binary_signature(BinaryOp::Sum, ValueType::twist(), ValueType::vector(3)).is_err()
        );
        assert!(binary_signature(
            BinaryOp::Sum,
            ValueType::translation(),
            ValueType::relative_rotation()
        )
        .is_err());
    }

    #[test]
    fn test_rule_rejects_unprepared_operands() {
        let lhs = Value::from(RigidTransform::identity(RotationRepr::Matrix));
        let rhs = Value::from(RigidTransform::identity(RotationRepr::Quaternion));
        assert_eq!(
            apply_binary(BinaryOp::Compose, &lhs, &rhs),
            Err(EvalError::PreparedTypeMismatch {
                op: OperationTag::Compose,
                expected: rt(RotationRepr::Quaternion),
                found: rt(RotationRepr::Matrix),
            })
        );
    }

    #[test]
    fn test_transform_rule_keeps_point_family() {
        let r = Value::from(Rotation::from_scaled_axis(
            RotationRepr::Quaternion,
            Vector3::new(0.0, 0.0, std::f64::consts::FRAC_PI_2),
        ));
        let p = Value::from(VectorValue::from_slice(
            VectorFamily::Translation,
            &[1.0, 0.0, 0.0],
        ));
        let out = apply_binary(BinaryOp::Transform, &r, &p).unwrap();
        assert_eq!(out.value_type(), ValueType::translation());
        let data = out.as_vector().unwrap().data();
        assert!((data - DVector::from_column_slice(&[0.0, 1.0, 0.0])).norm() < 1e-12);
    }

    #[test]
    fn test_norm_rules() {
        let v = Value::from(VectorValue::from_slice(VectorFamily::Vector, &[3.0, 4.0]));
        assert_eq!(apply_unary(UnaryOp::Norm, &v), Ok(Value::Scalar(5.0)));
        assert_eq!(apply_unary(UnaryOp::SquaredNorm, &v), Ok(Value::Scalar(25.0)));
        assert_eq!(
            apply_unary(UnaryOp::Minus, &Value::Scalar(2.0)),
            Ok(Value::Scalar(-2.0))
        );
    }
}
