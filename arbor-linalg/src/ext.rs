use delegate::delegate;
use arbor::{Container, KeyChain, KeyChains, MapConfig, Mapper, Selector, Value, ValueRef};
use crate::ops::{self, Eigh, IntoRes, LinalgMapError, Qr, Slogdet, Svd};
use crate::{Array, LinalgOp, MatrixOrd, QrMode, TensordotAxes, Uplo, VectorOrd};

/// Selection and traversal options of one mapped call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MapOpts {
    selector: Selector,
    config: MapConfig
}

impl MapOpts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts (or, with `to_apply(false)`, excludes) the listed key chains.
    pub fn key_chains<I, K>(mut self, chains: I) -> Self
    where I: IntoIterator<Item = K>, K: Into<KeyChain> {
        self.selector = Selector::only(chains)
            .to_apply(self.selector.is_to_apply())
            .prune_unapplied(self.selector.prunes_unapplied());
        self
    }

    /// Applies at the given key chains and moves each result to its paired chain.
    pub fn rename<I, K1, K2>(mut self, pairs: I) -> Self
    where I: IntoIterator<Item = (K1, K2)>, K1: Into<KeyChain>, K2: Into<KeyChain> {
        self.selector = Selector::rename(pairs)
            .to_apply(self.selector.is_to_apply())
            .prune_unapplied(self.selector.prunes_unapplied());
        self
    }

    pub fn to_apply(mut self, to_apply: bool) -> Self {
        self.selector = self.selector.to_apply(to_apply);
        self
    }

    pub fn prune_unapplied(mut self, prune: bool) -> Self {
        self.selector = self.selector.prune_unapplied(prune);
        self
    }

    pub fn map_sequences(mut self, val: bool) -> Self {
        self.config = self.config.map_sequences(val);
        self
    }

    pub fn assert_identical(mut self, val: bool) -> Self {
        self.config = self.config.assert_identical(val);
        self
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    delegate! { to self.selector {
        pub fn is_to_apply(&self) -> bool;
        pub fn prunes_unapplied(&self) -> bool;
        #[call(key_chains)]
        pub fn selected(&self) -> Option<&KeyChains>;
    }}

    pub fn mapper<B>(&self, backend: B) -> Mapper<B> {
        Mapper::new(backend)
            .with_selector(self.selector.clone())
            .with_config(self.config)
    }
}

type Res = Result<Value<Array>, LinalgMapError>;

fn with_first<'a>(first: ValueRef<'a, Array>, others: &[ValueRef<'a, Array>]) -> Vec<ValueRef<'a, Array>> {
    let mut args = Vec::with_capacity(others.len() + 1);
    args.push(first);
    args.extend_from_slice(others);
    args
}

/// Method forms of a function pair in [`ops`], with `self` as the first argument.
macro_rules! ext_single_output {
    ($name:ident, $name_into:ident ($($x:ident),* ; $($kw:ident : $ty:ty),*)) => {
        #[allow(clippy::too_many_arguments)]
        fn $name(&self, $($x: ValueRef<'_, Array>,)* $($kw: $ty,)* opts: &MapOpts) -> Res {
            ops::$name(self.as_arg(), $($x,)* $($kw,)* opts)
        }

        #[allow(clippy::too_many_arguments)]
        fn $name_into<'o>(&self, $($x: ValueRef<'_, Array>,)* $($kw: $ty,)* opts: &MapOpts, out: &'o mut Container<Array>) -> IntoRes<'o> {
            ops::$name_into(self.as_arg(), $($x,)* $($kw,)* opts, out)
        }
    };
}

/// Linear-algebra operations on nested arrays, with `self` as the first
/// argument.
pub trait LinalgExt {
    fn as_arg(&self) -> ValueRef<'_, Array>;

    fn linalg(&self, op: &LinalgOp, others: &[ValueRef<'_, Array>], opts: &MapOpts) -> Res {
        let args = with_first(self.as_arg(), others);
        ops::apply(op, &args, opts)
    }

    fn linalg_multi(&self, op: &LinalgOp, others: &[ValueRef<'_, Array>], opts: &MapOpts) -> Result<Vec<Value<Array>>, LinalgMapError> {
        let args = with_first(self.as_arg(), others);
        ops::apply_multi(op, &args, opts)
    }

    fn linalg_into<'o>(&self, op: &LinalgOp, others: &[ValueRef<'_, Array>], opts: &MapOpts, out: &'o mut Container<Array>) -> IntoRes<'o> {
        let args = with_first(self.as_arg(), others);
        ops::apply_into(op, &args, opts, out)
    }

    ext_single_output!(matmul, matmul_into(x2; transpose_a: bool, transpose_b: bool, adjoint_a: bool, adjoint_b: bool));
    ext_single_output!(cholesky, cholesky_into(; upper: bool));
    ext_single_output!(cross, cross_into(x2; axis: isize));
    ext_single_output!(det, det_into(;));
    ext_single_output!(diagonal, diagonal_into(; offset: isize, axis1: isize, axis2: isize));
    ext_single_output!(diag, diag_into(; k: isize));

    fn eigh(&self, uplo: Uplo, opts: &MapOpts) -> Result<Eigh, LinalgMapError> {
        ops::eigh(self.as_arg(), uplo, opts)
    }

    ext_single_output!(eigvalsh, eigvalsh_into(; uplo: Uplo));
    ext_single_output!(inner, inner_into(x2;));
    ext_single_output!(inv, inv_into(; adjoint: bool));
    ext_single_output!(pinv, pinv_into(; rtol: Option<f64>));
    ext_single_output!(matrix_norm, matrix_norm_into(; ord: MatrixOrd, keepdims: bool));
    ext_single_output!(matrix_power, matrix_power_into(; n: i32));
    ext_single_output!(matrix_rank, matrix_rank_into(; atol: Option<f64>, rtol: Option<f64>));
    ext_single_output!(matrix_transpose, matrix_transpose_into(; conjugate: bool));
    ext_single_output!(outer, outer_into(x2;));

    fn qr(&self, mode: QrMode, opts: &MapOpts) -> Result<Qr, LinalgMapError> {
        ops::qr(self.as_arg(), mode, opts)
    }

    fn slogdet(&self, opts: &MapOpts) -> Result<Slogdet, LinalgMapError> {
        ops::slogdet(self.as_arg(), opts)
    }

    ext_single_output!(solve, solve_into(x2; adjoint: bool));

    fn svd(&self, full_matrices: bool, opts: &MapOpts) -> Result<Svd, LinalgMapError> {
        ops::svd(self.as_arg(), full_matrices, opts)
    }

    ext_single_output!(svdvals, svdvals_into(;));
    ext_single_output!(tensordot, tensordot_into(x2; axes: TensordotAxes));
    ext_single_output!(trace, trace_into(; offset: isize, axis1: isize, axis2: isize));
    ext_single_output!(vecdot, vecdot_into(x2; axis: isize));
    ext_single_output!(vector_norm, vector_norm_into(; axis: Option<isize>, keepdims: bool, ord: VectorOrd));
    ext_single_output!(vector_to_skew_symmetric_matrix, vector_to_skew_symmetric_matrix_into(;));
    ext_single_output!(vander, vander_into(; n: Option<usize>, increasing: bool));
}

impl LinalgExt for Value<Array> {
    fn as_arg(&self) -> ValueRef<'_, Array> {
        self.view()
    }
}

impl LinalgExt for Container<Array> {
    fn as_arg(&self) -> ValueRef<'_, Array> {
        self.view()
    }
}

impl LinalgExt for Array {
    fn as_arg(&self) -> ValueRef<'_, Array> {
        ValueRef::leaf(self)
    }
}

#[cfg(test)]
mod tests {
    use arbor::cont;
    use super::*;

    #[test]
    fn opts_builders() {
        let opts = MapOpts::new().to_apply(false).key_chains(["a"]).prune_unapplied(true);
        assert!(!opts.is_to_apply());
        assert!(opts.prunes_unapplied());
        assert_eq!(opts.selected(), Some(&KeyChains::List(vec![KeyChain::parse("a")])));

        let opts = MapOpts::new().map_sequences(true).assert_identical(true);
        assert_eq!(opts.config(), &MapConfig::default().map_sequences(true).assert_identical(true));
    }

    #[test]
    fn method_forms() {
        let c = cont!{ "x" => Array::matrix([[1.0, 2.0], [3.0, 4.0]]) };
        let t = c.matrix_transpose(false, &MapOpts::new()).unwrap();
        assert_eq!(t, Value::Map(cont!{ "x" => Array::matrix([[1.0, 3.0], [2.0, 4.0]]) }));

        let tt = t.matrix_transpose(false, &MapOpts::new()).unwrap();
        assert_eq!(tt, Value::Map(c.clone()));

        let mut out = cont!{ "x" => Array::matrix([[0.0, 0.0], [0.0, 0.0]]) };
        c.matrix_transpose_into(false, &MapOpts::new(), &mut out).unwrap();
        assert_eq!(out, cont!{ "x" => Array::matrix([[1.0, 3.0], [2.0, 4.0]]) });
    }

    #[test]
    fn leaf_receiver() {
        let a = Array::matrix([[2.0, 0.0], [0.0, 2.0]]);
        let res = a.det(&MapOpts::new()).unwrap();
        assert!(res.as_leaf().unwrap().approx_eq(&Array::scalar(4.0), 1e-12));
    }

    #[test]
    fn linalg_general() {
        let c = cont!{ "x" => Array::vector([1.0, 2.0]) };
        let res = c.linalg(&LinalgOp::Outer, &[c.view()], &MapOpts::new()).unwrap();
        assert_eq!(res, Value::Map(cont!{ "x" => Array::matrix([[1.0, 2.0], [2.0, 4.0]]) }));
    }

    #[test]
    fn linalg_into_reuses_output() {
        let c = cont!{ "x" => Array::matrix([[1.0, 2.0], [3.0, 4.0]]), "y" => Array::matrix([[5.0]]) };
        let mut out = cont!{ "x" => Array::matrix([[0.0, 0.0], [0.0, 0.0]]), "y" => Array::matrix([[0.0]]) };
        let ptr = out.get("x").unwrap().as_leaf().unwrap().as_matrix().unwrap().as_ptr();

        let opts = MapOpts::new().key_chains(["x"]);
        c.linalg_into(&LinalgOp::matrix_transpose(), &[], &opts, &mut out).unwrap();

        let x = out.get("x").unwrap().as_leaf().unwrap();
        assert_eq!(x, &Array::matrix([[1.0, 3.0], [2.0, 4.0]]));
        assert_eq!(x.as_matrix().unwrap().as_ptr(), ptr);
        assert_eq!(out.get("y").unwrap().as_leaf(), Some(&Array::matrix([[0.0]])));
    }
}
