use crate::errors::EvalError;
use crate::types::Jacobian;

/// A trait for matrix-like containers Jacobians can be exported to.
///
/// # Examples
///
/// ```rust
/// use lie_expr::prelude::*;
///
/// let v = Expr::vector(&[3.0, 4.0]);
/// let jac = evaluate_jacobian(&v.clone().squared_norm(), &v).unwrap();
/// let rows: Vec<Vec<f64>> = Matrix::from_jacobian(&jac);
/// assert_eq!(rows, vec![vec![6.0, 8.0]]);
/// ```
pub trait Matrix: Sized {
    /// Creates a new matrix of the specified dimensions filled with zeros.
    fn zeros(rows: usize, cols: usize) -> Self;

    /// Returns the dimensions of the matrix as (rows, columns).
    fn dims(&self) -> (usize, usize);

    /// Reads one coefficient. Panics when out of bounds, like indexing.
    fn get(&self, row: usize, col: usize) -> f64;

    /// Writes one coefficient. Panics when out of bounds, like indexing.
    fn set(&mut self, row: usize, col: usize, value: f64);

    /// Copies a Jacobian into a new container.
    fn from_jacobian(jacobian: &Jacobian) -> Self {
        let (rows, cols) = jacobian.shape();
        let mut out = Self::zeros(rows, cols);
        for r in 0..rows {
            for c in 0..cols {
                out.set(r, c, jacobian[(r, c)]);
            }
        }
        out
    }

    /// Copies the container into a Jacobian.
    ///
    /// Fails when the container is not rectangular.
    fn to_jacobian(&self) -> Result<Jacobian, EvalError> {
        let (rows, cols) = self.dims();
        Ok(Jacobian::from_fn(rows, cols, |r, c| self.get(r, c)))
    }
}

/// Row-major nested vectors.
impl Matrix for Vec<Vec<f64>> {
    fn zeros(rows: usize, cols: usize) -> Self {
        vec![vec![0.0; cols]; rows]
    }

    fn dims(&self) -> (usize, usize) {
        (self.len(), self.first().map_or(0, Vec::len))
    }

    fn get(&self, row: usize, col: usize) -> f64 {
        self[row][col]
    }

    fn set(&mut self, row: usize, col: usize, value: f64) {
        self[row][col] = value;
    }

    fn to_jacobian(&self) -> Result<Jacobian, EvalError> {
        let (rows, cols) = self.dims();
        if let Some(row) = self.iter().find(|row| row.len() != cols) {
            return Err(EvalError::InvalidTangentLength {
                expected: cols,
                got: row.len(),
            });
        }
        Ok(Jacobian::from_fn(rows, cols, |r, c| self[r][c]))
    }
}

impl Matrix for nalgebra::DMatrix<f64> {
    fn zeros(rows: usize, cols: usize) -> Self {
        nalgebra::DMatrix::zeros(rows, cols)
    }

    fn dims(&self) -> (usize, usize) {
        (self.nrows(), self.ncols())
    }

    fn get(&self, row: usize, col: usize) -> f64 {
        self[(row, col)]
    }

    fn set(&mut self, row: usize, col: usize, value: f64) {
        self[(row, col)] = value;
    }

    fn from_jacobian(jacobian: &Jacobian) -> Self {
        jacobian.clone()
    }
}

#[cfg(feature = "ndarray")]
impl Matrix for ndarray::Array2<f64> {
    fn zeros(rows: usize, cols: usize) -> Self {
        ndarray::Array2::zeros((rows, cols))
    }

    fn dims(&self) -> (usize, usize) {
        (self.nrows(), self.ncols())
    }

    fn get(&self, row: usize, col: usize) -> f64 {
        self[[row, col]]
    }

    fn set(&mut self, row: usize, col: usize, value: f64) {
        self[[row, col]] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;

    fn sample() -> Jacobian {
        Jacobian::from_row_slice(2, 3, &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0])
    }

    #[test]
    fn test_nested_vec_layout() {
        let rows: Vec<Vec<f64>> = Matrix::from_jacobian(&sample());
        assert_eq!(rows.dims(), (2, 3));
        assert_eq!(rows, vec![vec![0.0, 1.0, 2.0], vec![3.0, 4.0, 5.0]]);
        assert_eq!(rows.to_jacobian(), Ok(sample()));
    }

    #[test]
    fn test_ragged_nested_vec_is_rejected() {
        let ragged = vec![vec![1.0, 2.0], vec![3.0]];
        assert_eq!(
            ragged.to_jacobian(),
            Err(EvalError::InvalidTangentLength {
                expected: 2,
                got: 1
            })
        );
    }

    #[test]
    fn test_nalgebra_matrix() {
        let mut mat = <DMatrix<f64> as Matrix>::zeros(2, 2);
        Matrix::set(&mut mat, 1, 0, 4.0);
        assert_eq!(Matrix::get(&mat, 1, 0), 4.0);
        assert_eq!(mat.dims(), (2, 2));
        assert_eq!(<DMatrix<f64> as Matrix>::from_jacobian(&sample()), sample());
    }

    #[cfg(feature = "ndarray")]
    #[test]
    fn test_ndarray_matrix() {
        let mat: ndarray::Array2<f64> = Matrix::from_jacobian(&sample());
        assert_eq!(mat.dims(), (2, 3));
        assert_eq!(mat[[1, 2]], 5.0);
        assert_eq!(mat.to_jacobian(), Ok(sample()));
    }
}
