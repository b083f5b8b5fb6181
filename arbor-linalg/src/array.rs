use std::fmt::Display;
use itertools::Itertools;
use nalgebra::{DMatrix, DVector};
use num_traits::Zero;
use arbor::{ShapeMismatch, Writeback};
use crate::LinalgError;

/// Dense real array of rank 0, 1 or 2.
#[derive(Clone, Debug, PartialEq)]
pub enum Array {
    Scalar(f64),
    Vector(DVector<f64>),
    Matrix(DMatrix<f64>)
}

impl Array {
    pub fn scalar(a: f64) -> Self {
        Array::Scalar(a)
    }

    pub fn vector<I>(data: I) -> Self
    where I: IntoIterator<Item = f64> {
        Array::Vector(DVector::from_vec(data.into_iter().collect()))
    }

    /// Matrix from rows of equal length. Panics if the rows are ragged.
    pub fn matrix<I, R>(rows: I) -> Self
    where I: IntoIterator<Item = R>, R: IntoIterator<Item = f64> {
        Self::try_matrix(rows).expect("rows must have equal lengths")
    }

    pub fn try_matrix<I, R>(rows: I) -> Result<Self, LinalgError>
    where I: IntoIterator<Item = R>, R: IntoIterator<Item = f64> {
        let rows = rows.into_iter().map(|r| r.into_iter().collect_vec()).collect_vec();
        let m = rows.len();
        let n = rows.first().map(|r| r.len()).unwrap_or(0);
        if let Some(r) = rows.iter().find(|r| r.len() != n) {
            return Err(LinalgError::shape("array", format!("ragged rows: expected length {n}, found {}", r.len())))
        }
        Ok(Self::from_row_data((m, n), rows.into_iter().flatten()))
    }

    pub fn from_row_data<I>(shape: (usize, usize), data: I) -> Self
    where I: IntoIterator<Item = f64> {
        Array::Matrix(DMatrix::from_row_iterator(shape.0, shape.1, data))
    }

    /// Array of the given shape from row-major entries.
    pub fn from_shape(shape: &[usize], data: Vec<f64>) -> Result<Self, LinalgError> {
        let len: usize = shape.iter().product();
        if data.len() != len {
            return Err(LinalgError::shape("array", format!("{} entries do not fill shape {shape:?}", data.len())))
        }
        match *shape {
            [] => Ok(Array::Scalar(data[0])),
            [_] => Ok(Array::Vector(DVector::from_vec(data))),
            [m, n] => Ok(Self::from_row_data((m, n), data)),
            _ => Err(LinalgError::shape("array", format!("arrays of dimension {} are not supported", shape.len())))
        }
    }

    pub fn ndim(&self) -> usize {
        match self {
            Array::Scalar(_) => 0,
            Array::Vector(_) => 1,
            Array::Matrix(_) => 2
        }
    }

    pub fn shape(&self) -> Vec<usize> {
        match self {
            Array::Scalar(_) => vec![],
            Array::Vector(v) => vec![v.len()],
            Array::Matrix(m) => vec![m.nrows(), m.ncols()]
        }
    }

    pub fn len(&self) -> usize {
        self.shape().into_iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Array::Scalar(a) => Some(*a),
            _ => None
        }
    }

    pub fn as_vector(&self) -> Option<&DVector<f64>> {
        match self {
            Array::Vector(v) => Some(v),
            _ => None
        }
    }

    pub fn as_matrix(&self) -> Option<&DMatrix<f64>> {
        match self {
            Array::Matrix(m) => Some(m),
            _ => None
        }
    }

    /// Entries in row-major order.
    pub fn to_row_major(&self) -> Vec<f64> {
        match self {
            Array::Scalar(a) => vec![*a],
            Array::Vector(v) => v.iter().cloned().collect(),
            Array::Matrix(m) => m.row_iter().flat_map(|r| r.iter().cloned().collect_vec()).collect()
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Array::Scalar(a) => a.is_zero(),
            Array::Vector(v) => v.iter().all(|a| a.is_zero()),
            Array::Matrix(m) => m.iter().all(|a| a.is_zero())
        }
    }

    /// Entry-wise comparison within an absolute tolerance.
    pub fn approx_eq(&self, other: &Array, tol: f64) -> bool {
        self.shape() == other.shape() &&
        self.to_row_major().iter().zip(other.to_row_major().iter()).all(|(a, b)|
            (a - b).abs() <= tol || (a.is_infinite() && a == b)
        )
    }

    pub(crate) fn expect_matrix(&self, op: &'static str) -> Result<&DMatrix<f64>, LinalgError> {
        self.as_matrix().ok_or_else(||
            LinalgError::shape(op, format!("expected a 2-d array, found shape {:?}", self.shape()))
        )
    }

    pub(crate) fn expect_square(&self, op: &'static str) -> Result<&DMatrix<f64>, LinalgError> {
        let m = self.expect_matrix(op)?;
        if m.is_square() {
            Ok(m)
        } else {
            Err(LinalgError::shape(op, format!("expected a square matrix, found shape {:?}", self.shape())))
        }
    }

    pub(crate) fn expect_vector(&self, op: &'static str) -> Result<&DVector<f64>, LinalgError> {
        self.as_vector().ok_or_else(||
            LinalgError::shape(op, format!("expected a 1-d array, found shape {:?}", self.shape()))
        )
    }
}

impl From<f64> for Array {
    fn from(a: f64) -> Self {
        Array::Scalar(a)
    }
}

impl From<DVector<f64>> for Array {
    fn from(v: DVector<f64>) -> Self {
        Array::Vector(v)
    }
}

impl From<DMatrix<f64>> for Array {
    fn from(m: DMatrix<f64>) -> Self {
        Array::Matrix(m)
    }
}

impl Display for Array {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Array::Scalar(a) => write!(f, "{a}"),
            Array::Vector(v) => write!(f, "[{}]", v.iter().join(", ")),
            Array::Matrix(m) => write!(f, "[{}]",
                m.row_iter().map(|r| format!("[{}]", r.iter().join(", "))).join(", ")
            )
        }
    }
}

impl Writeback for Array {
    fn check_shape(&self, src: &Self) -> Result<(), ShapeMismatch> {
        if self.shape() == src.shape() {
            Ok(())
        } else {
            Err(ShapeMismatch::new(format!("{:?}", self.shape()), format!("{:?}", src.shape())))
        }
    }

    fn write_back(&mut self, src: Self) {
        match (self, src) {
            (Array::Matrix(m), Array::Matrix(s)) if m.shape() == s.shape() => m.copy_from(&s),
            (Array::Vector(v), Array::Vector(s)) if v.len() == s.len() => v.copy_from(&s),
            (this, src) => *this = src
        }
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use serde::{Deserialize, Serialize};
    use super::*;

    #[derive(Serialize, Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Scalar(f64),
        Vector(Vec<f64>),
        Matrix(Vec<Vec<f64>>)
    }

    impl Serialize for Array {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where S: serde::Serializer {
            let repr = match self {
                Array::Scalar(a) => Repr::Scalar(*a),
                Array::Vector(v) => Repr::Vector(v.iter().cloned().collect()),
                Array::Matrix(m) => Repr::Matrix(
                    m.row_iter().map(|r| r.iter().cloned().collect()).collect()
                )
            };
            repr.serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for Array {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where D: serde::Deserializer<'de> {
            match Repr::deserialize(deserializer)? {
                Repr::Scalar(a) => Ok(Array::Scalar(a)),
                Repr::Vector(v) => Ok(Array::Vector(DVector::from_vec(v))),
                Repr::Matrix(rows) => Array::try_matrix(rows).map_err(serde::de::Error::custom)
            }
        }
    }
}
