use itertools::Itertools;
use nalgebra::{DMatrix, DVector};
use crate::{Array, LinalgError, MatrixOrd, VectorOrd};
use super::{axis, decomp::singular_values};

pub fn matrix_norm(a: &Array, ord: MatrixOrd, keepdims: bool) -> Result<Array, LinalgError> {
    const OP: &str = "matrix_norm";
    let m = a.expect_matrix(OP)?;
    if m.is_empty() && matches!(ord, MatrixOrd::Two | MatrixOrd::NegTwo) {
        return Err(LinalgError::shape(OP, "a zero-size matrix has no extreme singular value"))
    }

    let abs = m.abs();
    let row_sums = || abs.column_sum();
    let col_sums = || abs.row_sum();

    let val = match ord {
        MatrixOrd::Fro => m.norm(),
        MatrixOrd::Nuc => singular_values(OP, m)?.sum(),
        MatrixOrd::Inf => row_sums().max(),
        MatrixOrd::NegInf => row_sums().min(),
        MatrixOrd::One => col_sums().max(),
        MatrixOrd::NegOne => col_sums().min(),
        MatrixOrd::Two => singular_values(OP, m)?.max(),
        MatrixOrd::NegTwo => singular_values(OP, m)?.min()
    };

    if keepdims {
        Ok(Array::Matrix(DMatrix::from_element(1, 1, val)))
    } else {
        Ok(Array::Scalar(val))
    }
}

fn pnorm<I>(xs: I, ord: VectorOrd) -> f64
where I: IntoIterator<Item = f64> {
    let abs = xs.into_iter().map(f64::abs);
    match ord {
        VectorOrd::Inf => abs.fold(0.0, f64::max),
        VectorOrd::NegInf => abs.fold(f64::INFINITY, f64::min),
        VectorOrd::P(p) if p == 0.0 => abs.filter(|&x| x != 0.0).count() as f64,
        VectorOrd::P(p) if p == 1.0 => abs.sum(),
        VectorOrd::P(p) if p == 2.0 => abs.map(|x| x * x).sum::<f64>().sqrt(),
        VectorOrd::P(p) => abs.map(|x| x.powf(p)).sum::<f64>().powf(1.0 / p)
    }
}

/// Vector norm over all entries, or along `axis` of a matrix.
pub fn vector_norm(a: &Array, ax: Option<isize>, keepdims: bool, ord: VectorOrd) -> Result<Array, LinalgError> {
    const OP: &str = "vector_norm";

    let along = match ax {
        Some(ax) => Some(axis(OP, ax, a.ndim())?),
        None => None
    };

    match (a, along) {
        (Array::Matrix(m), Some(ax)) => {
            let norms = if ax == 0 {
                m.column_iter().map(|c| pnorm(c.iter().cloned(), ord)).collect_vec()
            } else {
                m.row_iter().map(|r| pnorm(r.iter().cloned(), ord)).collect_vec()
            };
            Ok(match (keepdims, ax) {
                (false, _) => Array::Vector(DVector::from_vec(norms)),
                (true, 0) => Array::from_row_data((1, norms.len()), norms),
                (true, _) => Array::from_row_data((norms.len(), 1), norms)
            })
        },
        _ => {
            let val = pnorm(a.to_row_major(), ord);
            Ok(match (keepdims, a) {
                (false, _) | (true, Array::Scalar(_)) => Array::Scalar(val),
                (true, Array::Vector(_)) => Array::vector([val]),
                (true, Array::Matrix(_)) => Array::matrix([[val]])
            })
        }
    }
}
