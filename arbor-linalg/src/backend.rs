use std::fmt::Display;
use itertools::Itertools;
use log::trace;
use arbor::{Backend, Operation, ShapeMismatch, Value, Writeback};
use crate::{dense, Array, LinalgError, LinalgOp};

/// Result of one operation at one key chain.
#[derive(Clone, Debug, PartialEq)]
pub enum Ret {
    One(Array),
    Tuple(Vec<Array>)
}

impl Ret {
    pub fn len(&self) -> usize {
        match self {
            Ret::One(_) => 1,
            Ret::Tuple(parts) => parts.len()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `i`-th component. A single array is every component of itself.
    pub fn component(&self, i: usize) -> Option<&Array> {
        match self {
            Ret::One(a) => Some(a),
            Ret::Tuple(parts) => parts.get(i)
        }
    }

    pub fn into_one(self) -> Option<Array> {
        match self {
            Ret::One(a) => Some(a),
            Ret::Tuple(_) => None
        }
    }
}

impl From<Array> for Ret {
    fn from(a: Array) -> Self {
        Ret::One(a)
    }
}

impl Display for Ret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ret::One(a) => write!(f, "{a}"),
            Ret::Tuple(parts) => write!(f, "({})", parts.iter().join(", "))
        }
    }
}

impl Writeback for Ret {
    fn check_shape(&self, src: &Self) -> Result<(), ShapeMismatch> {
        match (self, src) {
            (Ret::One(a), Ret::One(b)) => a.check_shape(b),
            (Ret::Tuple(xs), Ret::Tuple(ys)) if xs.len() == ys.len() => {
                xs.iter().zip(ys.iter()).try_for_each(|(x, y)| x.check_shape(y))
            },
            _ => Err(ShapeMismatch::new(format!("{} output(s)", self.len()), format!("{} output(s)", src.len())))
        }
    }

    fn write_back(&mut self, src: Self) {
        match (self, src) {
            (Ret::One(a), Ret::One(b)) => a.write_back(b),
            (Ret::Tuple(xs), Ret::Tuple(ys)) if xs.len() == ys.len() => {
                xs.iter_mut().zip(ys).for_each(|(x, y)| x.write_back(y))
            },
            (this, src) => *this = src
        }
    }
}

/// Splits a tree of `n`-component results into `n` trees.
pub fn unzip(op: &str, value: &Value<Ret>, n: usize) -> Result<Vec<Value<Array>>, LinalgError> {
    (0 .. n).map(|i|
        value.try_map_leaves(|_, r| match r {
            Ret::Tuple(parts) if parts.len() != n => {
                Err(LinalgError::MultiOutput { op: op.to_string(), count: parts.len() })
            },
            _ => r.component(i).cloned().ok_or(LinalgError::MultiOutput { op: op.to_string(), count: r.len() })
        })
    ).collect()
}

/// Dense real backend computing every [`LinalgOp`] with nalgebra.
#[derive(Clone, Copy, Debug, Default)]
pub struct NalgebraBackend;

impl NalgebraBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Backend<Array> for NalgebraBackend {
    type Op = LinalgOp;
    type Output = Ret;
    type Error = LinalgError;

    fn call(&self, op: &LinalgOp, args: &[&Array]) -> Result<Ret, LinalgError> {
        use LinalgOp::*;

        if args.len() != op.arity() {
            return Err(LinalgError::Arity { op: op.name(), expected: op.arity(), found: args.len() })
        }

        trace!("{}({})", op.name(), args.iter().map(|a| format!("{:?}", a.shape())).join(", "));

        let a = args[0];
        let b = || args[1];
        let one = |r: Result<Array, LinalgError>| r.map(Ret::One);

        match op {
            Matmul { transpose_a, transpose_b, adjoint_a, adjoint_b } =>
                one(dense::matmul(a, b(), transpose_a ^ adjoint_a, transpose_b ^ adjoint_b)),
            Cholesky { upper } => one(dense::cholesky(a, *upper)),
            Cross { axis } => one(dense::cross(a, b(), *axis)),
            Det => one(dense::det(a)),
            Diagonal { offset, axis1, axis2 } => one(dense::diagonal(a, *offset, *axis1, *axis2)),
            Diag { k } => one(dense::diag(a, *k)),
            Eigh { uplo } => {
                let (vals, vecs) = dense::eigh(a, *uplo)?;
                Ok(Ret::Tuple(vec![vals, vecs]))
            },
            Eigvalsh { uplo } => one(dense::eigvalsh(a, *uplo)),
            Inner => one(dense::inner(a, b())),
            Inv { adjoint } => one(dense::inv(a, *adjoint)),
            Pinv { rtol } => one(dense::pinv(a, *rtol)),
            MatrixNorm { ord, keepdims } => one(dense::matrix_norm(a, *ord, *keepdims)),
            MatrixPower { n } => one(dense::matrix_power(a, *n)),
            MatrixRank { atol, rtol } => one(dense::matrix_rank(a, *atol, *rtol)),
            MatrixTranspose { .. } => one(dense::matrix_transpose(a)),
            Outer => one(dense::outer(a, b())),
            Qr { mode } => {
                let (q, r) = dense::qr(a, *mode)?;
                Ok(Ret::Tuple(vec![q, r]))
            },
            Slogdet => {
                let (sign, logabsdet) = dense::slogdet(a)?;
                Ok(Ret::Tuple(vec![sign, logabsdet]))
            },
            Solve { adjoint } => one(dense::solve(a, b(), *adjoint)),
            Svd { compute_uv: true, full_matrices } => {
                let (u, s, vh) = dense::svd(a, *full_matrices)?;
                Ok(Ret::Tuple(vec![u, s, vh]))
            },
            Svd { compute_uv: false, .. } | Svdvals => one(dense::svdvals(a)),
            Tensordot { axes } => one(dense::tensordot(a, b(), axes)),
            Trace { offset, axis1, axis2 } => one(dense::trace(a, *offset, *axis1, *axis2)),
            Vecdot { axis } => one(dense::vecdot(a, b(), *axis)),
            VectorNorm { axis, keepdims, ord } => one(dense::vector_norm(a, *axis, *keepdims, *ord)),
            VectorToSkewSymmetricMatrix => one(dense::vector_to_skew_symmetric_matrix(a)),
            Vander { n, increasing } => one(dense::vander(a, *n, *increasing))
        }
    }
}

/// Adapts a backend returning [`Ret`] to one returning plain arrays, for
/// single-output operations.
#[derive(Clone, Copy, Debug, Default)]
pub struct Single<B>(pub B);

impl<B> Backend<Array> for Single<B>
where B: Backend<Array, Output = Ret, Error = LinalgError> {
    type Op = B::Op;
    type Output = Array;
    type Error = LinalgError;

    fn call(&self, op: &Self::Op, args: &[&Array]) -> Result<Array, LinalgError> {
        match self.0.call(op, args)? {
            Ret::One(a) => Ok(a),
            Ret::Tuple(parts) => Err(LinalgError::MultiOutput { op: op.name().to_string(), count: parts.len() })
        }
    }
}
