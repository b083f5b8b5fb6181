use itertools::Itertools;
use log::trace;
use nalgebra::{DMatrix, DVector};
use crate::{Array, LinalgError, TensordotAxes};
use super::{axis, inv};

fn transposed(m: &DMatrix<f64>, flag: bool) -> DMatrix<f64> {
    if flag { m.transpose() } else { m.clone() }
}

fn ensure_len(op: &'static str, what: &str, a: usize, b: usize) -> Result<(), LinalgError> {
    if a == b {
        Ok(())
    } else {
        Err(LinalgError::shape(op, format!("{what}: {a} != {b}")))
    }
}

/// Matrix product. Vectors are treated as rows on the left and as columns
/// on the right; the product of two vectors is their dot product.
pub fn matmul(a: &Array, b: &Array, transpose_a: bool, transpose_b: bool) -> Result<Array, LinalgError> {
    const OP: &str = "matmul";
    match (a, b) {
        (Array::Matrix(a), Array::Matrix(b)) => {
            let (a, b) = (transposed(a, transpose_a), transposed(b, transpose_b));
            ensure_len(OP, "inner dimensions differ", a.ncols(), b.nrows())?;
            Ok(Array::Matrix(a * b))
        },
        (Array::Matrix(a), Array::Vector(v)) => {
            let a = transposed(a, transpose_a);
            ensure_len(OP, "inner dimensions differ", a.ncols(), v.len())?;
            Ok(Array::Vector(a * v))
        },
        (Array::Vector(v), Array::Matrix(b)) => {
            let b = transposed(b, transpose_b);
            ensure_len(OP, "inner dimensions differ", v.len(), b.nrows())?;
            Ok(Array::Vector((v.transpose() * b).transpose()))
        },
        (Array::Vector(v), Array::Vector(w)) => {
            ensure_len(OP, "vector lengths differ", v.len(), w.len())?;
            Ok(Array::Scalar(v.dot(w)))
        },
        _ => Err(LinalgError::shape(OP, "scalar operands are not allowed"))
    }
}

fn cross3(u: &[f64], v: &[f64]) -> [f64; 3] {
    [u[1] * v[2] - u[2] * v[1],
     u[2] * v[0] - u[0] * v[2],
     u[0] * v[1] - u[1] * v[0]]
}

/// Cross product of 3-vectors, taken along `axis` for matrices.
pub fn cross(a: &Array, b: &Array, ax: isize) -> Result<Array, LinalgError> {
    const OP: &str = "cross";
    if a.shape() != b.shape() {
        return Err(LinalgError::shape(OP, format!("shapes {:?} and {:?} differ", a.shape(), b.shape())))
    }

    match (a, b) {
        (Array::Vector(u), Array::Vector(v)) => {
            axis(OP, ax, 1)?;
            ensure_len(OP, "vectors must have length 3", u.len(), 3)?;
            Ok(Array::vector(cross3(u.as_slice(), v.as_slice())))
        },
        (Array::Matrix(x), Array::Matrix(y)) => {
            let ax = axis(OP, ax, 2)?;
            let (x, y) = if ax == 1 {
                (x.transpose(), y.transpose())
            } else {
                (x.clone(), y.clone())
            };
            ensure_len(OP, "vectors must have length 3", x.nrows(), 3)?;

            let mut res = DMatrix::zeros(3, x.ncols());
            for j in 0 .. x.ncols() {
                let (u, v) = (x.column(j).iter().cloned().collect_vec(), y.column(j).iter().cloned().collect_vec());
                let c = cross3(&u, &v);
                res.column_mut(j).copy_from_slice(&c);
            }
            Ok(Array::Matrix(if ax == 1 { res.transpose() } else { res }))
        },
        _ => Err(LinalgError::shape(OP, "expected vectors or matrices"))
    }
}

/// Sum product over the last axes of both arguments.
pub fn inner(a: &Array, b: &Array) -> Result<Array, LinalgError> {
    const OP: &str = "inner";
    match (a, b) {
        (Array::Scalar(x), other) | (other, Array::Scalar(x)) => Ok(scale(other, *x)),
        (Array::Vector(v), Array::Vector(w)) => {
            ensure_len(OP, "last dimensions differ", v.len(), w.len())?;
            Ok(Array::Scalar(v.dot(w)))
        },
        (Array::Matrix(m), Array::Vector(v)) | (Array::Vector(v), Array::Matrix(m)) => {
            ensure_len(OP, "last dimensions differ", m.ncols(), v.len())?;
            Ok(Array::Vector(m * v))
        },
        (Array::Matrix(x), Array::Matrix(y)) => {
            ensure_len(OP, "last dimensions differ", x.ncols(), y.ncols())?;
            Ok(Array::Matrix(x * y.transpose()))
        }
    }
}

fn scale(a: &Array, x: f64) -> Array {
    match a {
        Array::Scalar(y) => Array::Scalar(x * y),
        Array::Vector(v) => Array::Vector(v * x),
        Array::Matrix(m) => Array::Matrix(m * x)
    }
}

/// Outer product of the flattened arguments.
pub fn outer(a: &Array, b: &Array) -> Result<Array, LinalgError> {
    let (x, y) = (a.to_row_major(), b.to_row_major());
    let (x, y) = (DVector::from_vec(x), DVector::from_vec(y));
    Ok(Array::Matrix(x * y.transpose()))
}

/// Dot products of corresponding vectors along `axis`.
pub fn vecdot(a: &Array, b: &Array, ax: isize) -> Result<Array, LinalgError> {
    const OP: &str = "vecdot";
    if a.shape() != b.shape() {
        return Err(LinalgError::shape(OP, format!("shapes {:?} and {:?} differ", a.shape(), b.shape())))
    }

    match (a, b) {
        (Array::Vector(v), Array::Vector(w)) => {
            axis(OP, ax, 1)?;
            Ok(Array::Scalar(v.dot(w)))
        },
        (Array::Matrix(x), Array::Matrix(y)) => {
            let prod = x.component_mul(y);
            match axis(OP, ax, 2)? {
                0 => Ok(Array::Vector(prod.row_sum().transpose())),
                _ => Ok(Array::Vector(prod.column_sum()))
            }
        },
        _ => Err(LinalgError::shape(OP, "expected vectors or matrices"))
    }
}

fn permuted(a: &Array, perm: &[usize]) -> Array {
    match a {
        Array::Matrix(m) if perm == [1, 0] => Array::Matrix(m.transpose()),
        _ => a.clone()
    }
}

/// Tensor contraction over the given axes. The result must have dimension
/// at most 2.
pub fn tensordot(a: &Array, b: &Array, axes: &TensordotAxes) -> Result<Array, LinalgError> {
    const OP: &str = "tensordot";
    let (ra, rb) = (a.ndim(), b.ndim());

    let (a, b, n) = match axes {
        TensordotAxes::Count(n) => {
            if *n > ra || *n > rb {
                return Err(LinalgError::shape(OP, format!("cannot contract {n} axes of arrays of dimension {ra} and {rb}")))
            }
            (a.clone(), b.clone(), *n)
        },
        TensordotAxes::Pairs(ia, ib) => {
            let valid = |idx: &[usize], r: usize| idx.iter().all(|&i| i < r) && idx.iter().all_unique();
            if ia.len() != ib.len() || !valid(ia.as_slice(), ra) || !valid(ib.as_slice(), rb) {
                return Err(LinalgError::shape(OP, format!("invalid axes {ia:?} and {ib:?}")))
            }
            let pa = (0 .. ra).filter(|i| !ia.contains(i)).chain(ia.iter().cloned()).collect_vec();
            let pb = ib.iter().cloned().chain((0 .. rb).filter(|i| !ib.contains(i))).collect_vec();
            (permuted(a, &pa), permuted(b, &pb), ia.len())
        }
    };

    let (sa, sb) = (a.shape(), b.shape());
    let (outer_a, inner_a) = sa.split_at(ra - n);
    let (inner_b, outer_b) = sb.split_at(n);
    if inner_a != inner_b {
        return Err(LinalgError::shape(OP, format!("contracted dimensions {inner_a:?} and {inner_b:?} differ")))
    }

    let (p, k, q) = (
        outer_a.iter().product::<usize>(),
        inner_a.iter().product::<usize>(),
        outer_b.iter().product::<usize>()
    );
    let x = DMatrix::from_row_slice(p, k, &a.to_row_major());
    let y = DMatrix::from_row_slice(k, q, &b.to_row_major());
    let z = x * y;

    let shape = outer_a.iter().chain(outer_b.iter()).cloned().collect_vec();
    trace!("{OP}: {sa:?} x {sb:?} -> {shape:?}");

    let data = z.row_iter().flat_map(|r| r.iter().cloned().collect_vec()).collect();
    Array::from_shape(&shape, data).map_err(|_|
        LinalgError::shape(OP, format!("result of dimension {} is not supported", shape.len()))
    )
}

/// Integer power of a square matrix. Negative powers invert first.
pub fn matrix_power(a: &Array, n: i32) -> Result<Array, LinalgError> {
    const OP: &str = "matrix_power";
    let m = a.expect_square(OP)?;
    let base = if n < 0 {
        match inv(a, false) {
            Ok(Array::Matrix(m)) => m,
            _ => return Err(LinalgError::Singular { op: OP })
        }
    } else {
        m.clone()
    };

    let mut res = DMatrix::identity(m.nrows(), m.ncols());
    let mut sq = base;
    let mut e = n.unsigned_abs();
    while e > 0 {
        if e & 1 == 1 {
            res = &res * &sq;
        }
        e >>= 1;
        if e > 0 {
            sq = &sq * &sq;
        }
    }
    Ok(Array::Matrix(res))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matmul_matrices() {
        let a = Array::matrix([[3.0, -1.0], [-1.0, 3.0]]);
        let res = matmul(&a, &a, false, false).unwrap();
        assert_eq!(res, Array::matrix([[10.0, -6.0], [-6.0, 10.0]]));
    }

    #[test]
    fn matmul_transpose() {
        let a = Array::matrix([[1.0, 2.0], [3.0, 4.0]]);
        let b = Array::matrix([[1.0, 0.0], [1.0, 1.0]]);
        let res = matmul(&a, &b, true, false).unwrap();
        assert_eq!(res, Array::matrix([[4.0, 3.0], [6.0, 4.0]]));
    }

    #[test]
    fn matmul_vectors() {
        let a = Array::matrix([[1.0, 2.0], [3.0, 4.0]]);
        let v = Array::vector([1.0, 1.0]);
        assert_eq!(matmul(&a, &v, false, false).unwrap(), Array::vector([3.0, 7.0]));
        assert_eq!(matmul(&v, &a, false, false).unwrap(), Array::vector([4.0, 6.0]));
        assert_eq!(matmul(&v, &v, false, false).unwrap(), Array::scalar(2.0));
    }

    #[test]
    fn matmul_mismatch() {
        let a = Array::matrix([[1.0, 2.0, 3.0]]);
        assert!(matches!(matmul(&a, &a, false, false), Err(LinalgError::Shape { .. })));
        assert!(matmul(&Array::scalar(1.0), &a, false, false).is_err());
    }

    #[test]
    fn cross_vectors() {
        let x = Array::vector([1.0, 0.0, 0.0]);
        let y = Array::vector([0.0, 1.0, 0.0]);
        assert_eq!(cross(&x, &y, -1).unwrap(), Array::vector([0.0, 0.0, 1.0]));
    }

    #[test]
    fn cross_rows() {
        let x = Array::matrix([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let y = Array::matrix([[0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        assert_eq!(cross(&x, &y, -1).unwrap(), Array::matrix([[0.0, 0.0, 1.0], [1.0, 0.0, 0.0]]));
        assert!(cross(&x, &y, 0).is_err());
    }

    #[test]
    fn inner_products() {
        let v = Array::vector([1.0, 2.0, 3.0]);
        assert_eq!(inner(&v, &v).unwrap(), Array::scalar(14.0));

        let a = Array::matrix([[1.0, 0.0], [0.0, 2.0]]);
        let b = Array::matrix([[1.0, 1.0]]);
        assert_eq!(inner(&a, &b).unwrap(), Array::matrix([[1.0], [2.0]]));
        assert_eq!(inner(&Array::scalar(2.0), &v).unwrap(), Array::vector([2.0, 4.0, 6.0]));
    }

    #[test]
    fn outer_product() {
        let v = Array::vector([1.0, 2.0]);
        let w = Array::vector([1.0, 0.0, -1.0]);
        assert_eq!(outer(&v, &w).unwrap(), Array::matrix([[1.0, 0.0, -1.0], [2.0, 0.0, -2.0]]));
    }

    #[test]
    fn vecdot_axes() {
        let a = Array::matrix([[1.0, 2.0], [3.0, 4.0]]);
        assert_eq!(vecdot(&a, &a, -1).unwrap(), Array::vector([5.0, 25.0]));
        assert_eq!(vecdot(&a, &a, 0).unwrap(), Array::vector([10.0, 20.0]));
    }

    #[test]
    fn tensordot_counts() {
        let a = Array::matrix([[1.0, 2.0], [3.0, 4.0]]);
        let b = Array::matrix([[1.0, 0.0], [0.0, 1.0]]);
        assert_eq!(tensordot(&a, &b, &TensordotAxes::Count(2)).unwrap(), Array::scalar(5.0));
        assert_eq!(tensordot(&a, &b, &TensordotAxes::Count(1)).unwrap(), a);

        let v = Array::vector([1.0, 2.0]);
        assert_eq!(tensordot(&v, &v, &TensordotAxes::Count(0)).unwrap(), Array::matrix([[1.0, 2.0], [2.0, 4.0]]));
        assert!(tensordot(&a, &a, &TensordotAxes::Count(0)).is_err());
    }

    #[test]
    fn tensordot_pairs() {
        let a = Array::matrix([[1.0, 2.0], [3.0, 4.0]]);
        let v = Array::vector([1.0, 1.0]);
        let res = tensordot(&a, &v, &TensordotAxes::Pairs(vec![0], vec![0])).unwrap();
        assert_eq!(res, Array::vector([4.0, 6.0]));
    }

    #[test]
    fn power() {
        let a = Array::matrix([[1.0, 1.0], [0.0, 1.0]]);
        assert_eq!(matrix_power(&a, 0).unwrap(), Array::matrix([[1.0, 0.0], [0.0, 1.0]]));
        assert_eq!(matrix_power(&a, 3).unwrap(), Array::matrix([[1.0, 3.0], [0.0, 1.0]]));
        let inv2 = matrix_power(&a, -2).unwrap();
        assert!(inv2.approx_eq(&Array::matrix([[1.0, -2.0], [0.0, 1.0]]), 1e-12));
    }
}
