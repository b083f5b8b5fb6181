use nalgebra::{DMatrix, DVector};
use crate::{Array, LinalgError};
use super::axis;

pub fn matrix_transpose(a: &Array) -> Result<Array, LinalgError> {
    let m = a.expect_matrix("matrix_transpose")?;
    Ok(Array::Matrix(m.transpose()))
}

/// The matrix viewed with `axis1` as rows and `axis2` as columns.
fn oriented(op: &'static str, a: &Array, axis1: isize, axis2: isize) -> Result<DMatrix<f64>, LinalgError> {
    let m = a.expect_matrix(op)?;
    match (axis(op, axis1, 2)?, axis(op, axis2, 2)?) {
        (0, 1) => Ok(m.clone()),
        (1, 0) => Ok(m.transpose()),
        _ => Err(LinalgError::shape(op, "axis1 and axis2 must differ"))
    }
}

fn offset_diagonal(m: &DMatrix<f64>, offset: isize) -> DVector<f64> {
    let (r, c) = m.shape();
    let (i0, j0) = if offset >= 0 {
        (0, offset as usize)
    } else {
        (offset.unsigned_abs(), 0)
    };
    let len = r.saturating_sub(i0).min(c.saturating_sub(j0));
    DVector::from_fn(len, |k, _| m[(i0 + k, j0 + k)])
}

/// Entries `(i, i + offset)` of the matrix spanned by `axis1` and `axis2`.
pub fn diagonal(a: &Array, offset: isize, axis1: isize, axis2: isize) -> Result<Array, LinalgError> {
    let m = oriented("diagonal", a, axis1, axis2)?;
    Ok(Array::Vector(offset_diagonal(&m, offset)))
}

/// Diagonal of a matrix, or a square matrix with the given vector on its
/// `k`-th diagonal.
pub fn diag(a: &Array, k: isize) -> Result<Array, LinalgError> {
    match a {
        Array::Vector(v) => {
            let n = v.len() + k.unsigned_abs();
            let mut m = DMatrix::zeros(n, n);
            for (i, &x) in v.iter().enumerate() {
                if k >= 0 {
                    m[(i, i + k as usize)] = x;
                } else {
                    m[(i + k.unsigned_abs(), i)] = x;
                }
            }
            Ok(Array::Matrix(m))
        },
        Array::Matrix(m) => Ok(Array::Vector(offset_diagonal(m, k))),
        Array::Scalar(_) => Err(LinalgError::shape("diag", "expected a vector or a matrix"))
    }
}

pub fn trace(a: &Array, offset: isize, axis1: isize, axis2: isize) -> Result<Array, LinalgError> {
    let m = oriented("trace", a, axis1, axis2)?;
    Ok(Array::Scalar(offset_diagonal(&m, offset).sum()))
}

/// Vandermonde matrix of the vector `x` with `n` columns (default
/// `len(x)`), powers decreasing unless `increasing`.
pub fn vander(a: &Array, n: Option<usize>, increasing: bool) -> Result<Array, LinalgError> {
    let x = a.expect_vector("vander")?;
    let n = n.unwrap_or(x.len());
    let m = DMatrix::from_fn(x.len(), n, |i, j| {
        let p = if increasing { j } else { n - 1 - j };
        x[i].powi(p as i32)
    });
    Ok(Array::Matrix(m))
}

/// The matrix `[v]_x` with `[v]_x w = v x w`.
pub fn vector_to_skew_symmetric_matrix(a: &Array) -> Result<Array, LinalgError> {
    const OP: &str = "vector_to_skew_symmetric_matrix";
    let v = a.expect_vector(OP)?;
    if v.len() != 3 {
        return Err(LinalgError::shape(OP, format!("expected a vector of length 3, found {}", v.len())))
    }
    let (x, y, z) = (v[0], v[1], v[2]);
    Ok(Array::matrix([
        [0.0, -z,   y  ],
        [z,   0.0, -x  ],
        [-y,  x,    0.0]
    ]))
}
