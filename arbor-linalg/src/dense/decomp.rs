use itertools::Itertools;
use log::trace;
use nalgebra::{DMatrix, DVector, SymmetricEigen};
use crate::{Array, LinalgError, QrMode, Uplo};

pub fn cholesky(a: &Array, upper: bool) -> Result<Array, LinalgError> {
    const OP: &str = "cholesky";
    let m = a.expect_square(OP)?;
    let Some(c) = m.clone().cholesky() else {
        return Err(LinalgError::NotPositiveDefinite { op: OP })
    };
    let l = c.l();
    Ok(Array::Matrix(if upper { l.transpose() } else { l }))
}

/// Symmetric matrix read from one triangle of `m`.
fn symmetrized(m: &DMatrix<f64>, uplo: Uplo) -> DMatrix<f64> {
    let n = m.nrows();
    DMatrix::from_fn(n, n, |i, j| {
        if (i >= j) == (uplo == Uplo::Lower) { m[(i, j)] } else { m[(j, i)] }
    })
}

/// Eigenvalues in ascending order, and the eigenvectors as columns.
pub fn eigh(a: &Array, uplo: Uplo) -> Result<(Array, Array), LinalgError> {
    const OP: &str = "eigh";
    let m = a.expect_square(OP)?;
    if m.is_empty() {
        return Ok((Array::Vector(DVector::zeros(0)), Array::Matrix(DMatrix::zeros(0, 0))))
    }

    let Some(e) = SymmetricEigen::try_new(symmetrized(m, uplo), f64::EPSILON, 0) else {
        return Err(LinalgError::NoConvergence { op: OP })
    };

    let order = (0 .. e.eigenvalues.len())
        .sorted_by(|&i, &j| e.eigenvalues[i].total_cmp(&e.eigenvalues[j]))
        .collect_vec();

    let vals = DVector::from_iterator(order.len(), order.iter().map(|&i| e.eigenvalues[i]));
    let vecs = e.eigenvectors.select_columns(order.iter());
    Ok((Array::Vector(vals), Array::Matrix(vecs)))
}

pub fn eigvalsh(a: &Array, uplo: Uplo) -> Result<Array, LinalgError> {
    let (vals, _) = eigh(a, uplo)?;
    Ok(vals)
}

/// Orthonormal `m x m` matrix whose first columns are the given ones.
fn complete_basis(q: &DMatrix<f64>) -> DMatrix<f64> {
    let (m, k) = q.shape();
    if k >= m {
        return q.clone()
    }

    let mut aug = DMatrix::<f64>::zeros(m, k + m);
    aug.columns_mut(0, k).copy_from(q);
    aug.columns_mut(k, m).fill_with_identity();

    let mut full = aug.qr().q();
    full.columns_mut(0, k).copy_from(q);
    full
}

pub fn qr(a: &Array, mode: QrMode) -> Result<(Array, Array), LinalgError> {
    const OP: &str = "qr";
    let m = a.expect_matrix(OP)?;
    let (nr, nc) = m.shape();

    let (q, r) = if mode == QrMode::Complete && nr > nc {
        // decompose [A | I] so that Q is square
        let mut aug = DMatrix::<f64>::zeros(nr, nc + nr);
        aug.columns_mut(0, nc).copy_from(m);
        aug.columns_mut(nc, nr).fill_with_identity();

        let d = aug.qr();
        (d.q(), d.r().columns(0, nc).into_owned())
    } else {
        let d = m.clone().qr();
        (d.q(), d.r())
    };

    trace!("{OP}: {:?} -> q: {:?}, r: {:?}", m.shape(), q.shape(), r.shape());
    Ok((Array::Matrix(q), Array::Matrix(r)))
}

struct Svd {
    u: DMatrix<f64>,
    s: DVector<f64>,
    vt: DMatrix<f64>
}

/// Thin SVD with singular values in descending order.
fn svd_sorted(op: &'static str, m: &DMatrix<f64>) -> Result<Svd, LinalgError> {
    if m.is_empty() {
        let (nr, nc) = m.shape();
        return Ok(Svd { u: DMatrix::zeros(nr, 0), s: DVector::zeros(0), vt: DMatrix::zeros(0, nc) })
    }

    let d = m.clone().try_svd(true, true, f64::EPSILON, 0).ok_or(LinalgError::NoConvergence { op })?;
    let (Some(u), Some(vt)) = (d.u, d.v_t) else {
        return Err(LinalgError::NoConvergence { op })
    };
    let s = d.singular_values;

    let order = (0 .. s.len()).sorted_by(|&i, &j| s[j].total_cmp(&s[i])).collect_vec();
    Ok(Svd {
        u: u.select_columns(order.iter()),
        s: DVector::from_iterator(order.len(), order.iter().map(|&i| s[i])),
        vt: vt.select_rows(order.iter())
    })
}

pub(super) fn singular_values(op: &'static str, m: &DMatrix<f64>) -> Result<DVector<f64>, LinalgError> {
    if m.is_empty() {
        return Ok(DVector::zeros(0))
    }

    let d = m.clone().try_svd(false, false, f64::EPSILON, 0).ok_or(LinalgError::NoConvergence { op })?;
    let s = d.singular_values;
    let sorted = s.iter().cloned().sorted_by(|x, y| y.total_cmp(x)).collect_vec();
    Ok(DVector::from_vec(sorted))
}

/// `(u, s, vh)` with `a = u * diag(s) * vh`. With `full_matrices`, `u` and
/// `vh` are square.
pub fn svd(a: &Array, full_matrices: bool) -> Result<(Array, Array, Array), LinalgError> {
    const OP: &str = "svd";
    let m = a.expect_matrix(OP)?;
    let Svd { u, s, vt } = svd_sorted(OP, m)?;

    let (u, vt) = if full_matrices {
        (complete_basis(&u), complete_basis(&vt.transpose()).transpose())
    } else {
        (u, vt)
    };
    Ok((Array::Matrix(u), Array::Vector(s), Array::Matrix(vt)))
}

pub fn svdvals(a: &Array) -> Result<Array, LinalgError> {
    const OP: &str = "svdvals";
    let m = a.expect_matrix(OP)?;
    Ok(Array::Vector(singular_values(OP, m)?))
}

pub fn det(a: &Array) -> Result<Array, LinalgError> {
    let m = a.expect_square("det")?;
    Ok(Array::Scalar(m.determinant()))
}

/// Sign and natural log of the absolute value of the determinant. A
/// singular matrix gives `(0, -inf)`.
pub fn slogdet(a: &Array) -> Result<(Array, Array), LinalgError> {
    let m = a.expect_square("slogdet")?;
    let lu = m.clone().lu();

    let mut sign: f64 = lu.p().determinant();
    let mut logabsdet = 0.0;
    for &d in lu.u().diagonal().iter() {
        if d == 0.0 {
            return Ok((Array::Scalar(0.0), Array::Scalar(f64::NEG_INFINITY)))
        }
        sign *= d.signum();
        logabsdet += d.abs().ln();
    }
    Ok((Array::Scalar(sign), Array::Scalar(logabsdet)))
}

pub fn inv(a: &Array, adjoint: bool) -> Result<Array, LinalgError> {
    const OP: &str = "inv";
    let m = a.expect_square(OP)?;
    let Some(i) = m.clone().try_inverse() else {
        return Err(LinalgError::Singular { op: OP })
    };
    Ok(Array::Matrix(if adjoint { i.transpose() } else { i }))
}

fn default_rtol(m: &DMatrix<f64>) -> f64 {
    m.nrows().max(m.ncols()) as f64 * f64::EPSILON
}

/// Moore-Penrose inverse. Singular values at most `rtol` times the largest
/// one are treated as zero.
pub fn pinv(a: &Array, rtol: Option<f64>) -> Result<Array, LinalgError> {
    const OP: &str = "pinv";
    let m = a.expect_matrix(OP)?;
    if m.is_empty() {
        return Ok(Array::Matrix(DMatrix::zeros(m.ncols(), m.nrows())))
    }

    let Svd { u, s, vt } = svd_sorted(OP, m)?;
    let cutoff = rtol.unwrap_or_else(|| default_rtol(m)) * s.max();

    let mut v = vt.transpose();
    for (j, &x) in s.iter().enumerate() {
        if x > cutoff {
            v.column_mut(j).scale_mut(1.0 / x);
        } else {
            v.column_mut(j).fill(0.0);
        }
    }
    Ok(Array::Matrix(v * u.transpose()))
}

/// Number of singular values above `max(atol, rtol * s_max)`.
pub fn matrix_rank(a: &Array, atol: Option<f64>, rtol: Option<f64>) -> Result<Array, LinalgError> {
    const OP: &str = "matrix_rank";
    match a {
        Array::Matrix(m) => {
            if m.is_empty() {
                return Ok(Array::Scalar(0.0))
            }
            let s = singular_values(OP, m)?;
            let rtol = match (atol, rtol) {
                (_, Some(r)) => r,
                (None, None) => default_rtol(m),
                (Some(_), None) => 0.0
            };
            let tol = atol.unwrap_or(0.0).max(rtol * s.max());
            Ok(Array::Scalar(s.iter().filter(|&&x| x > tol).count() as f64))
        },
        Array::Vector(v) => {
            let tol = atol.unwrap_or(0.0);
            Ok(Array::Scalar(if v.iter().any(|x| x.abs() > tol) { 1.0 } else { 0.0 }))
        },
        Array::Scalar(_) => Err(LinalgError::shape(OP, "expected an array of dimension at least 1"))
    }
}

/// Solves `a x = b` for a square `a`; `b` is a vector or a matrix of
/// right-hand sides.
pub fn solve(a: &Array, b: &Array, adjoint: bool) -> Result<Array, LinalgError> {
    const OP: &str = "solve";
    let m = a.expect_square(OP)?;
    let lu = if adjoint { m.transpose().lu() } else { m.clone().lu() };

    let shape_err = |n: usize| LinalgError::shape(OP, format!("right-hand side has {n} rows, expected {}", m.nrows()));
    let x = match b {
        Array::Vector(v) if v.len() == m.nrows() => lu.solve(v).map(Array::Vector),
        Array::Matrix(r) if r.nrows() == m.nrows() => lu.solve(r).map(Array::Matrix),
        Array::Vector(v) => return Err(shape_err(v.len())),
        Array::Matrix(r) => return Err(shape_err(r.nrows())),
        Array::Scalar(_) => return Err(LinalgError::shape(OP, "right-hand side must be a vector or a matrix"))
    };
    x.ok_or(LinalgError::Singular { op: OP })
}
