//! Vector algebra on R^n.
//!
//! Vectors keep their family (generic vector, translation, relative rotation, twist)
//! through Sum and Minus, so a translation plus a generic vector is still a translation.

use itertools::Itertools;
use nalgebra::DVector;
use rand::Rng;

use crate::errors::EvalError;
use crate::types::{Jacobian, Scalar, ValueType, VectorFamily};

/// An element of R^n tagged with its family.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorValue {
    family: VectorFamily,
    data: DVector<Scalar>,
}

impl VectorValue {
    pub fn new(family: VectorFamily, data: DVector<Scalar>) -> Self {
        Self { family, data }
    }

    pub fn from_slice(family: VectorFamily, data: &[Scalar]) -> Self {
        Self::new(family, DVector::from_column_slice(data))
    }

    /// The zero vector, which is also the identity element of R^n.
    pub fn zeros(family: VectorFamily, dim: usize) -> Self {
        Self::new(family, DVector::zeros(dim))
    }

    /// Coefficients drawn uniformly from `[-1, 1]`.
    pub fn random<R: Rng + ?Sized>(family: VectorFamily, dim: usize, rng: &mut R) -> Self {
        Self::new(
            family,
            DVector::from_fn(dim, |_, _| rng.gen_range(-1.0..=1.0)),
        )
    }

    pub fn family(&self) -> VectorFamily {
        self.family
    }

    pub fn data(&self) -> &DVector<Scalar> {
        &self.data
    }

    pub fn into_data(self) -> DVector<Scalar> {
        self.data
    }

    pub fn dim(&self) -> usize {
        self.data.len()
    }

    pub fn value_type(&self) -> ValueType {
        ValueType::Vector {
            family: self.family,
            dim: self.dim(),
        }
    }

    /// Same coefficients under another family.
    pub fn rebind_family(self, family: VectorFamily) -> Self {
        Self::new(family, self.data)
    }
}

impl std::fmt::Display for VectorValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[{}]", self.family, self.data.iter().join(", "))
    }
}

/// Elementwise sum; the result takes the more specific family of the two operands.
pub fn sum(lhs: &VectorValue, rhs: &VectorValue) -> VectorValue {
    VectorValue::new(lhs.family.more_specific(rhs.family), &lhs.data + &rhs.data)
}

pub fn minus(rhs: &VectorValue) -> VectorValue {
    VectorValue::new(rhs.family, -&rhs.data)
}

pub fn squared_norm(v: &VectorValue) -> Scalar {
    v.data.norm_squared()
}

pub fn norm(v: &VectorValue) -> Scalar {
    v.data.norm()
}

/// Gradient of the squared norm, `2·vᵀ`, as a `1 x n` Jacobian.
pub fn squared_norm_jacobian(v: &VectorValue) -> Jacobian {
    Jacobian::from_fn(1, v.dim(), |_, j| 2.0 * v.data[j])
}

/// Gradient of the norm, `vᵀ/‖v‖`, as a `1 x n` Jacobian.
///
/// The norm is not differentiable at the zero vector; that case is reported as an error.
pub fn norm_jacobian(v: &VectorValue, norm: Scalar) -> Result<Jacobian, EvalError> {
    if norm == 0.0 {
        return Err(EvalError::ZeroNormJacobian);
    }
    Ok(Jacobian::from_fn(1, v.dim(), |_, j| v.data[j] / norm))
}

/// Fuzzy comparison: `‖a − b‖ ≤ prec · min(‖a‖, ‖b‖)`.
pub fn is_approx(a: &DVector<Scalar>, b: &DVector<Scalar>, prec: Scalar) -> bool {
    if a.len() != b.len() {
        return false;
    }
    (a - b).norm_squared() <= prec * prec * a.norm_squared().min(b.norm_squared())
}

/// True if every coefficient is within `prec` of zero.
pub fn is_zero(v: &DVector<Scalar>, prec: Scalar) -> bool {
    v.iter().all(|x| x.abs() <= prec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_norms() {
        let v = VectorValue::from_slice(VectorFamily::Vector, &[3.0, 4.0]);
        assert_eq!(squared_norm(&v), 25.0);
        assert_eq!(norm(&v), 5.0);
        assert_eq!(
            squared_norm_jacobian(&v),
            Jacobian::from_row_slice(1, 2, &[6.0, 8.0])
        );
        let jac = norm_jacobian(&v, norm(&v)).unwrap();
        assert!((jac - Jacobian::from_row_slice(1, 2, &[0.6, 0.8])).norm() < 1e-15);
    }

    #[test]
    fn test_norm_jacobian_at_zero() {
        let v = VectorValue::zeros(VectorFamily::Vector, 3);
        assert_eq!(norm_jacobian(&v, norm(&v)), Err(EvalError::ZeroNormJacobian));
    }

    #[test]
    fn test_sum_family() {
        let t = VectorValue::from_slice(VectorFamily::Translation, &[1.0, 2.0, 3.0]);
        let v = VectorValue::from_slice(VectorFamily::Vector, &[1.0, 1.0, 1.0]);
        assert_eq!(sum(&t, &v).family(), VectorFamily::Translation);
        assert_eq!(sum(&v, &t).family(), VectorFamily::Translation);
        assert_eq!(sum(&v, &v).family(), VectorFamily::Vector);
        assert_eq!(sum(&t, &v).data().as_slice(), &[2.0, 3.0, 4.0]);
        assert_eq!(minus(&t).data().as_slice(), &[-1.0, -2.0, -3.0]);
    }

    #[test]
    fn test_random_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let v = VectorValue::random(VectorFamily::Vector, 100, &mut rng);
        assert_eq!(v.dim(), 100);
        assert!(v.data().iter().all(|x| (-1.0..=1.0).contains(x)));
    }

    #[test]
    fn test_fuzzy_predicates() {
        let a = DVector::from_column_slice(&[1.0, 2.0, 3.0]);
        let b = DVector::from_column_slice(&[1.0, 2.0, 3.0 + 1e-14]);
        assert!(is_approx(&a, &b, 1e-12));
        assert!(!is_approx(&a, &DVector::from_column_slice(&[1.0, 2.0, 3.1]), 1e-12));
        assert!(!is_approx(&a, &DVector::from_column_slice(&[1.0, 2.0]), 1e-12));
        assert!(is_zero(&DVector::from_column_slice(&[1e-13, -1e-13]), 1e-12));
        assert!(!is_zero(&a, 1e-12));
    }

    #[test]
    fn test_display() {
        let t = VectorValue::from_slice(VectorFamily::Translation, &[1.0, 2.5]);
        assert_eq!(format!("{t}"), "Translation[1, 2.5]");
    }
}
