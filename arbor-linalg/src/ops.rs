//! Each linear-algebra operation mapped over nested arguments. The first
//! argument is given explicitly; [`LinalgExt`](crate::LinalgExt) provides the
//! same operations as methods.

use arbor::{Container, KeyChain, MapError, Value, ValueRef};
use crate::{unzip, Array, LinalgError, LinalgOp, MapOpts, MatrixOrd, NalgebraBackend, QrMode, Single, TensordotAxes, Uplo, VectorOrd};

pub type LinalgMapError = MapError<LinalgError>;

/// Maps a single-output operation over `args`.
pub fn apply(op: &LinalgOp, args: &[ValueRef<'_, Array>], opts: &MapOpts) -> Result<Value<Array>, LinalgMapError> {
    opts.mapper(Single(NalgebraBackend)).apply(op, args)
}

/// Maps any operation over `args` and returns one tree per output component.
pub fn apply_multi(op: &LinalgOp, args: &[ValueRef<'_, Array>], opts: &MapOpts) -> Result<Vec<Value<Array>>, LinalgMapError> {
    let res = opts.mapper(NalgebraBackend).apply(op, args)?;
    unzip(op.name(), &res, op.outputs()).map_err(|e|
        MapError::Backend { op: op.name().to_string(), path: KeyChain::root(), source: e }
    )
}

/// Like [`apply`], writing into the leaves of `out`.
pub fn apply_into<'o>(op: &LinalgOp, args: &[ValueRef<'_, Array>], opts: &MapOpts, out: &'o mut Container<Array>) -> Result<&'o mut Container<Array>, LinalgMapError> {
    opts.mapper(Single(NalgebraBackend)).apply_into(op, args, out)
}

fn split<const N: usize>(op: &LinalgOp, parts: Vec<Value<Array>>) -> Result<[Value<Array>; N], LinalgMapError> {
    parts.try_into().map_err(|parts: Vec<_>| MapError::Backend {
        op: op.name().to_string(),
        path: KeyChain::root(),
        source: LinalgError::MultiOutput { op: op.name().to_string(), count: parts.len() }
    })
}

#[derive(Clone, Debug, PartialEq)]
pub struct Qr {
    pub q: Value<Array>,
    pub r: Value<Array>
}

#[derive(Clone, Debug, PartialEq)]
pub struct Svd {
    pub u: Value<Array>,
    pub s: Value<Array>,
    pub vh: Value<Array>
}

#[derive(Clone, Debug, PartialEq)]
pub struct Eigh {
    pub eigenvalues: Value<Array>,
    pub eigenvectors: Value<Array>
}

#[derive(Clone, Debug, PartialEq)]
pub struct Slogdet {
    pub sign: Value<Array>,
    pub logabsdet: Value<Array>
}

type Res = Result<Value<Array>, LinalgMapError>;
pub type IntoRes<'o> = Result<&'o mut Container<Array>, LinalgMapError>;

/// Defines `$name`, mapping a single-output operation, and `$name_into`,
/// writing its result into an existing container. Keyword arguments follow
/// the array arguments.
macro_rules! single_output {
    ($name:ident, $name_into:ident ($($x:ident),+ ; $($kw:ident : $ty:ty),*) => $op:expr) => {
        #[allow(clippy::too_many_arguments)]
        pub fn $name($($x: ValueRef<'_, Array>,)+ $($kw: $ty,)* opts: &MapOpts) -> Res {
            apply(&$op, &[$($x),+], opts)
        }

        #[allow(clippy::too_many_arguments)]
        pub fn $name_into<'o>($($x: ValueRef<'_, Array>,)+ $($kw: $ty,)* opts: &MapOpts, out: &'o mut Container<Array>) -> IntoRes<'o> {
            apply_into(&$op, &[$($x),+], opts, out)
        }
    };
}

single_output!(matmul, matmul_into(x1, x2; transpose_a: bool, transpose_b: bool, adjoint_a: bool, adjoint_b: bool)
    => LinalgOp::Matmul { transpose_a, transpose_b, adjoint_a, adjoint_b });

single_output!(cholesky, cholesky_into(x; upper: bool) => LinalgOp::Cholesky { upper });

single_output!(cross, cross_into(x1, x2; axis: isize) => LinalgOp::Cross { axis });

single_output!(det, det_into(x;) => LinalgOp::Det);

single_output!(diagonal, diagonal_into(x; offset: isize, axis1: isize, axis2: isize)
    => LinalgOp::Diagonal { offset, axis1, axis2 });

single_output!(diag, diag_into(x; k: isize) => LinalgOp::Diag { k });

pub fn eigh(x: ValueRef<'_, Array>, uplo: Uplo, opts: &MapOpts) -> Result<Eigh, LinalgMapError> {
    let op = LinalgOp::Eigh { uplo };
    let [eigenvalues, eigenvectors] = split(&op, apply_multi(&op, &[x], opts)?)?;
    Ok(Eigh { eigenvalues, eigenvectors })
}

single_output!(eigvalsh, eigvalsh_into(x; uplo: Uplo) => LinalgOp::Eigvalsh { uplo });

single_output!(inner, inner_into(x1, x2;) => LinalgOp::Inner);

single_output!(inv, inv_into(x; adjoint: bool) => LinalgOp::Inv { adjoint });

single_output!(pinv, pinv_into(x; rtol: Option<f64>) => LinalgOp::Pinv { rtol });

single_output!(matrix_norm, matrix_norm_into(x; ord: MatrixOrd, keepdims: bool) => LinalgOp::MatrixNorm { ord, keepdims });

single_output!(matrix_power, matrix_power_into(x; n: i32) => LinalgOp::MatrixPower { n });

single_output!(matrix_rank, matrix_rank_into(x; atol: Option<f64>, rtol: Option<f64>) => LinalgOp::MatrixRank { atol, rtol });

single_output!(matrix_transpose, matrix_transpose_into(x; conjugate: bool) => LinalgOp::MatrixTranspose { conjugate });

single_output!(outer, outer_into(x1, x2;) => LinalgOp::Outer);

pub fn qr(x: ValueRef<'_, Array>, mode: QrMode, opts: &MapOpts) -> Result<Qr, LinalgMapError> {
    let op = LinalgOp::Qr { mode };
    let [q, r] = split(&op, apply_multi(&op, &[x], opts)?)?;
    Ok(Qr { q, r })
}

pub fn slogdet(x: ValueRef<'_, Array>, opts: &MapOpts) -> Result<Slogdet, LinalgMapError> {
    let op = LinalgOp::Slogdet;
    let [sign, logabsdet] = split(&op, apply_multi(&op, &[x], opts)?)?;
    Ok(Slogdet { sign, logabsdet })
}

single_output!(solve, solve_into(x1, x2; adjoint: bool) => LinalgOp::Solve { adjoint });

/// Full decomposition. `compute_uv = false` is [`svdvals`].
pub fn svd(x: ValueRef<'_, Array>, full_matrices: bool, opts: &MapOpts) -> Result<Svd, LinalgMapError> {
    let op = LinalgOp::Svd { compute_uv: true, full_matrices };
    let [u, s, vh] = split(&op, apply_multi(&op, &[x], opts)?)?;
    Ok(Svd { u, s, vh })
}

single_output!(svdvals, svdvals_into(x;) => LinalgOp::Svdvals);

single_output!(tensordot, tensordot_into(x1, x2; axes: TensordotAxes) => LinalgOp::Tensordot { axes });

single_output!(trace, trace_into(x; offset: isize, axis1: isize, axis2: isize)
    => LinalgOp::Trace { offset, axis1, axis2 });

single_output!(vecdot, vecdot_into(x1, x2; axis: isize) => LinalgOp::Vecdot { axis });

single_output!(vector_norm, vector_norm_into(x; axis: Option<isize>, keepdims: bool, ord: VectorOrd)
    => LinalgOp::VectorNorm { axis, keepdims, ord });

single_output!(vector_to_skew_symmetric_matrix, vector_to_skew_symmetric_matrix_into(x;)
    => LinalgOp::VectorToSkewSymmetricMatrix);

single_output!(vander, vander_into(x; n: Option<usize>, increasing: bool) => LinalgOp::Vander { n, increasing });
