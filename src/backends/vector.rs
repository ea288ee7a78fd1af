use crate::algebra::VectorValue;
use crate::errors::EvalError;
use crate::types::{Tangent, VectorFamily};

/// A trait for vector-like containers that can be exchanged with expressions.
///
/// Vector constants and tangent vectors are stored as nalgebra vectors internally. This
/// trait converts to and from the containers callers already use.
///
/// # Examples
///
/// ```rust
/// use lie_expr::prelude::Vector;
///
/// let v = vec![1.0, 2.0, 3.0];
/// let tangent = v.to_tangent();
/// let back: [f64; 3] = Vector::from_tangent(&tangent).unwrap();
/// assert_eq!(back, [1.0, 2.0, 3.0]);
/// ```
pub trait Vector: Sized {
    /// Returns the length of the vector.
    fn len(&self) -> usize;

    /// Checks if the vector is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies the coefficients into a tangent vector.
    fn to_tangent(&self) -> Tangent;

    /// Builds a container from a tangent vector.
    ///
    /// Fails for fixed-size containers whose length does not match.
    fn from_tangent(tangent: &Tangent) -> Result<Self, EvalError>;
}

impl Vector for Vec<f64> {
    fn len(&self) -> usize {
        self.len()
    }

    fn to_tangent(&self) -> Tangent {
        Tangent::from_column_slice(self)
    }

    fn from_tangent(tangent: &Tangent) -> Result<Self, EvalError> {
        Ok(tangent.iter().copied().collect())
    }
}

/// Fixed-size arrays. The array size is specified through the const generic parameter N.
impl<const N: usize> Vector for [f64; N] {
    fn len(&self) -> usize {
        N
    }

    fn to_tangent(&self) -> Tangent {
        Tangent::from_column_slice(self)
    }

    fn from_tangent(tangent: &Tangent) -> Result<Self, EvalError> {
        if tangent.len() != N {
            return Err(EvalError::InvalidTangentLength {
                expected: N,
                got: tangent.len(),
            });
        }
        let mut out = [0.0; N];
        out.copy_from_slice(tangent.as_slice());
        Ok(out)
    }
}

impl Vector for nalgebra::DVector<f64> {
    fn len(&self) -> usize {
        self.len()
    }

    fn to_tangent(&self) -> Tangent {
        self.clone()
    }

    fn from_tangent(tangent: &Tangent) -> Result<Self, EvalError> {
        Ok(tangent.clone())
    }
}

#[cfg(feature = "ndarray")]
impl Vector for ndarray::Array1<f64> {
    fn len(&self) -> usize {
        self.len()
    }

    fn to_tangent(&self) -> Tangent {
        Tangent::from_iterator(self.len(), self.iter().copied())
    }

    fn from_tangent(tangent: &Tangent) -> Result<Self, EvalError> {
        Ok(tangent.iter().copied().collect())
    }
}

impl VectorValue {
    /// A vector value of the given family with the coefficients of `data`.
    pub fn from_vector<V: Vector>(family: VectorFamily, data: &V) -> Self {
        VectorValue::new(family, data.to_tangent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DVector;

    #[test]
    fn test_vec_and_array() {
        let v = vec![1.0, 2.0, 3.0];
        assert_eq!(v.to_tangent(), DVector::from_column_slice(&[1.0, 2.0, 3.0]));
        let back: Vec<f64> = Vector::from_tangent(&v.to_tangent()).unwrap();
        assert_eq!(back, v);

        let arr: [f64; 2] = Vector::from_tangent(&DVector::from_column_slice(&[4.0, 5.0])).unwrap();
        assert_eq!(arr, [4.0, 5.0]);
        assert_eq!(
            <[f64; 3]>::from_tangent(&DVector::zeros(2)),
            Err(EvalError::InvalidTangentLength {
                expected: 3,
                got: 2
            })
        );
    }

    #[test]
    fn test_vector_value_from_container() {
        let value = VectorValue::from_vector(VectorFamily::Translation, &[1.0, 2.0, 3.0]);
        assert_eq!(value.dim(), 3);
        assert_eq!(value.family(), VectorFamily::Translation);
        assert!(Vector::is_empty(&Vec::<f64>::new()));
    }

    #[cfg(feature = "ndarray")]
    #[test]
    fn test_ndarray_vector() {
        let a = ndarray::Array1::from(vec![1.0, -1.0]);
        let t = a.to_tangent();
        assert_eq!(t.as_slice(), &[1.0, -1.0]);
        let back: ndarray::Array1<f64> = Vector::from_tangent(&t).unwrap();
        assert_eq!(back, a);
    }
}
