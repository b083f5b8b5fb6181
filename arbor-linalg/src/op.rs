use std::fmt::Display;
use std::str::FromStr;
use itertools::Itertools;
use arbor::Operation;
use crate::LinalgError;

/// Triangle of a symmetric matrix that is read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Uplo {
    #[default]
    Lower,
    Upper
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum MatrixOrd {
    #[default]
    Fro,
    Nuc,
    Inf,
    NegInf,
    One,
    NegOne,
    Two,
    NegTwo
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VectorOrd {
    P(f64),
    Inf,
    NegInf
}

impl Default for VectorOrd {
    fn default() -> Self {
        VectorOrd::P(2.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum QrMode {
    #[default]
    Reduced,
    Complete
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TensordotAxes {
    /// Contract the last `n` axes of the first argument with the first `n` of the second.
    Count(usize),
    Pairs(Vec<usize>, Vec<usize>)
}

impl Default for TensordotAxes {
    fn default() -> Self {
        TensordotAxes::Count(2)
    }
}

/// A linear-algebra operation together with its keyword arguments.
#[derive(Clone, Debug, PartialEq)]
pub enum LinalgOp {
    Matmul { transpose_a: bool, transpose_b: bool, adjoint_a: bool, adjoint_b: bool },
    Cholesky { upper: bool },
    Cross { axis: isize },
    Det,
    Diagonal { offset: isize, axis1: isize, axis2: isize },
    Diag { k: isize },
    Eigh { uplo: Uplo },
    Eigvalsh { uplo: Uplo },
    Inner,
    Inv { adjoint: bool },
    Pinv { rtol: Option<f64> },
    MatrixNorm { ord: MatrixOrd, keepdims: bool },
    MatrixPower { n: i32 },
    MatrixRank { atol: Option<f64>, rtol: Option<f64> },
    MatrixTranspose { conjugate: bool },
    Outer,
    Qr { mode: QrMode },
    Slogdet,
    Solve { adjoint: bool },
    Svd { compute_uv: bool, full_matrices: bool },
    Svdvals,
    Tensordot { axes: TensordotAxes },
    Trace { offset: isize, axis1: isize, axis2: isize },
    Vecdot { axis: isize },
    VectorNorm { axis: Option<isize>, keepdims: bool, ord: VectorOrd },
    VectorToSkewSymmetricMatrix,
    Vander { n: Option<usize>, increasing: bool }
}

impl LinalgOp {
    pub const NAMES: [&'static str; 27] = [
        "matmul", "cholesky", "cross", "det", "diagonal", "diag", "eigh",
        "eigvalsh", "inner", "inv", "pinv", "matrix_norm", "matrix_power",
        "matrix_rank", "matrix_transpose", "outer", "qr", "slogdet", "solve",
        "svd", "svdvals", "tensordot", "trace", "vecdot", "vector_norm",
        "vector_to_skew_symmetric_matrix", "vander"
    ];

    pub fn matmul() -> Self {
        LinalgOp::Matmul { transpose_a: false, transpose_b: false, adjoint_a: false, adjoint_b: false }
    }

    pub fn cholesky() -> Self {
        LinalgOp::Cholesky { upper: false }
    }

    pub fn cross() -> Self {
        LinalgOp::Cross { axis: -1 }
    }

    pub fn diagonal() -> Self {
        LinalgOp::Diagonal { offset: 0, axis1: -2, axis2: -1 }
    }

    pub fn diag() -> Self {
        LinalgOp::Diag { k: 0 }
    }

    pub fn eigh() -> Self {
        LinalgOp::Eigh { uplo: Uplo::Lower }
    }

    pub fn eigvalsh() -> Self {
        LinalgOp::Eigvalsh { uplo: Uplo::Lower }
    }

    pub fn inv() -> Self {
        LinalgOp::Inv { adjoint: false }
    }

    pub fn pinv() -> Self {
        LinalgOp::Pinv { rtol: None }
    }

    pub fn matrix_norm() -> Self {
        LinalgOp::MatrixNorm { ord: MatrixOrd::Fro, keepdims: false }
    }

    pub fn matrix_power(n: i32) -> Self {
        LinalgOp::MatrixPower { n }
    }

    pub fn matrix_rank() -> Self {
        LinalgOp::MatrixRank { atol: None, rtol: None }
    }

    pub fn matrix_transpose() -> Self {
        LinalgOp::MatrixTranspose { conjugate: false }
    }

    pub fn qr() -> Self {
        LinalgOp::Qr { mode: QrMode::Reduced }
    }

    pub fn solve() -> Self {
        LinalgOp::Solve { adjoint: false }
    }

    pub fn svd() -> Self {
        LinalgOp::Svd { compute_uv: true, full_matrices: true }
    }

    pub fn tensordot() -> Self {
        LinalgOp::Tensordot { axes: TensordotAxes::Count(2) }
    }

    pub fn trace() -> Self {
        LinalgOp::Trace { offset: 0, axis1: 0, axis2: 1 }
    }

    pub fn vecdot() -> Self {
        LinalgOp::Vecdot { axis: -1 }
    }

    pub fn vector_norm() -> Self {
        LinalgOp::VectorNorm { axis: None, keepdims: false, ord: VectorOrd::P(2.0) }
    }

    pub fn vander() -> Self {
        LinalgOp::Vander { n: None, increasing: false }
    }

    /// The operation with all keyword arguments at their defaults.
    /// `matrix_power` has no default exponent and starts at `n = 1`.
    pub fn default_of(name: &str) -> Result<Self, LinalgError> {
        use LinalgOp::*;
        let op = match name {
            "matmul"           => Self::matmul(),
            "cholesky"         => Self::cholesky(),
            "cross"            => Self::cross(),
            "det"              => Det,
            "diagonal"         => Self::diagonal(),
            "diag"             => Self::diag(),
            "eigh"             => Self::eigh(),
            "eigvalsh"         => Self::eigvalsh(),
            "inner"            => Inner,
            "inv"              => Self::inv(),
            "pinv"             => Self::pinv(),
            "matrix_norm"      => Self::matrix_norm(),
            "matrix_power"     => Self::matrix_power(1),
            "matrix_rank"      => Self::matrix_rank(),
            "matrix_transpose" => Self::matrix_transpose(),
            "outer"            => Outer,
            "qr"               => Self::qr(),
            "slogdet"          => Slogdet,
            "solve"            => Self::solve(),
            "svd"              => Self::svd(),
            "svdvals"          => Svdvals,
            "tensordot"        => Self::tensordot(),
            "trace"            => Self::trace(),
            "vecdot"           => Self::vecdot(),
            "vector_norm"      => Self::vector_norm(),
            "vector_to_skew_symmetric_matrix" => VectorToSkewSymmetricMatrix,
            "vander"           => Self::vander(),
            _ => return Err(LinalgError::UnknownOp(name.to_string()))
        };
        Ok(op)
    }

    /// Looks up an operation by name and sets its keyword arguments from
    /// `key=value` strings.
    pub fn from_name<I, K, V>(name: &str, kwargs: I) -> Result<Self, LinalgError>
    where I: IntoIterator<Item = (K, V)>, K: AsRef<str>, V: AsRef<str> {
        let mut op = Self::default_of(name)?;
        for (k, v) in kwargs {
            op.set(k.as_ref(), v.as_ref())?;
        }
        Ok(op)
    }

    pub fn set(&mut self, kw: &str, value: &str) -> Result<(), LinalgError> {
        use LinalgOp::*;
        let name = self.name();
        let p = Parser { op: name, kw, value };

        match (self, kw) {
            (Matmul { transpose_a, .. }, "transpose_a") => *transpose_a = p.parse()?,
            (Matmul { transpose_b, .. }, "transpose_b") => *transpose_b = p.parse()?,
            (Matmul { adjoint_a, .. }, "adjoint_a") => *adjoint_a = p.parse()?,
            (Matmul { adjoint_b, .. }, "adjoint_b") => *adjoint_b = p.parse()?,
            (Cholesky { upper }, "upper") => *upper = p.parse()?,
            (Cross { axis }, "axis") => *axis = p.parse()?,
            (Diagonal { offset, .. } | Trace { offset, .. }, "offset") => *offset = p.parse()?,
            (Diagonal { axis1, .. } | Trace { axis1, .. }, "axis1") => *axis1 = p.parse()?,
            (Diagonal { axis2, .. } | Trace { axis2, .. }, "axis2") => *axis2 = p.parse()?,
            (Diag { k }, "k") => *k = p.parse()?,
            (Eigh { uplo } | Eigvalsh { uplo }, "UPLO" | "uplo") => *uplo = p.parse_with(parse_uplo)?,
            (Inv { adjoint } | Solve { adjoint }, "adjoint") => *adjoint = p.parse()?,
            (Pinv { rtol }, "rtol") => *rtol = p.parse_opt()?,
            (MatrixNorm { ord, .. }, "ord") => *ord = p.parse_with(parse_matrix_ord)?,
            (MatrixNorm { keepdims, .. } | VectorNorm { keepdims, .. }, "keepdims") => *keepdims = p.parse()?,
            (MatrixPower { n }, "n") => *n = p.parse()?,
            (MatrixRank { atol, .. }, "atol") => *atol = p.parse_opt()?,
            (MatrixRank { rtol, .. }, "rtol") => *rtol = p.parse_opt()?,
            (MatrixTranspose { conjugate }, "conjugate") => *conjugate = p.parse()?,
            (Qr { mode }, "mode") => *mode = p.parse_with(parse_qr_mode)?,
            (Svd { compute_uv, .. }, "compute_uv") => *compute_uv = p.parse()?,
            (Svd { full_matrices, .. }, "full_matrices") => *full_matrices = p.parse()?,
            (Tensordot { axes }, "axes") => *axes = p.parse_with(parse_axes)?,
            (Vecdot { axis }, "axis") => *axis = p.parse()?,
            (VectorNorm { axis, .. }, "axis") => *axis = p.parse_opt()?,
            (VectorNorm { ord, .. }, "ord") => *ord = p.parse_with(parse_vector_ord)?,
            (Vander { n, .. }, "N" | "n") => *n = p.parse_opt()?,
            (Vander { increasing, .. }, "increasing") => *increasing = p.parse()?,
            _ => return Err(LinalgError::invalid(name, kw, "no such keyword argument"))
        }
        Ok(())
    }

    /// Keyword arguments with their current values.
    pub fn kwargs(&self) -> Vec<(&'static str, String)> {
        use LinalgOp::*;
        fn opt<T: Display>(v: &Option<T>) -> String {
            v.as_ref().map(|v| v.to_string()).unwrap_or("none".into())
        }

        match self {
            Matmul { transpose_a, transpose_b, adjoint_a, adjoint_b } => vec![
                ("transpose_a", transpose_a.to_string()),
                ("transpose_b", transpose_b.to_string()),
                ("adjoint_a", adjoint_a.to_string()),
                ("adjoint_b", adjoint_b.to_string()),
            ],
            Cholesky { upper } => vec![("upper", upper.to_string())],
            Cross { axis } | Vecdot { axis } => vec![("axis", axis.to_string())],
            Diagonal { offset, axis1, axis2 } | Trace { offset, axis1, axis2 } => vec![
                ("offset", offset.to_string()),
                ("axis1", axis1.to_string()),
                ("axis2", axis2.to_string()),
            ],
            Diag { k } => vec![("k", k.to_string())],
            Eigh { uplo } | Eigvalsh { uplo } => vec![
                ("UPLO", match uplo { Uplo::Lower => "L", Uplo::Upper => "U" }.to_string())
            ],
            Inv { adjoint } | Solve { adjoint } => vec![("adjoint", adjoint.to_string())],
            Pinv { rtol } => vec![("rtol", opt(rtol))],
            MatrixNorm { ord, keepdims } => vec![
                ("ord", matrix_ord_str(*ord).to_string()),
                ("keepdims", keepdims.to_string()),
            ],
            MatrixPower { n } => vec![("n", n.to_string())],
            MatrixRank { atol, rtol } => vec![("atol", opt(atol)), ("rtol", opt(rtol))],
            MatrixTranspose { conjugate } => vec![("conjugate", conjugate.to_string())],
            Qr { mode } => vec![
                ("mode", match mode { QrMode::Reduced => "reduced", QrMode::Complete => "complete" }.to_string())
            ],
            Svd { compute_uv, full_matrices } => vec![
                ("compute_uv", compute_uv.to_string()),
                ("full_matrices", full_matrices.to_string()),
            ],
            Tensordot { axes } => vec![("axes", match axes {
                TensordotAxes::Count(n) => n.to_string(),
                TensordotAxes::Pairs(a, b) => format!("{}:{}", a.iter().join(","), b.iter().join(","))
            })],
            VectorNorm { axis, keepdims, ord } => vec![
                ("axis", opt(axis)),
                ("keepdims", keepdims.to_string()),
                ("ord", match ord {
                    VectorOrd::P(p) => p.to_string(),
                    VectorOrd::Inf => "inf".to_string(),
                    VectorOrd::NegInf => "-inf".to_string()
                }),
            ],
            Vander { n, increasing } => vec![("N", opt(n)), ("increasing", increasing.to_string())],
            Det | Inner | Outer | Slogdet | Svdvals | VectorToSkewSymmetricMatrix => vec![]
        }
    }

    /// Number of array arguments taken.
    pub fn arity(&self) -> usize {
        use LinalgOp::*;
        match self {
            Matmul { .. } | Cross { .. } | Inner | Outer |
            Solve { .. } | Tensordot { .. } | Vecdot { .. } => 2,
            _ => 1
        }
    }

    /// Names of the components returned by a multi-output operation, empty
    /// for single-output ones.
    pub fn output_names(&self) -> &'static [&'static str] {
        use LinalgOp::*;
        match self {
            Eigh { .. } => &["eigenvalues", "eigenvectors"],
            Qr { .. } => &["q", "r"],
            Slogdet => &["sign", "logabsdet"],
            Svd { compute_uv: true, .. } => &["u", "s", "vh"],
            _ => &[]
        }
    }

    pub fn outputs(&self) -> usize {
        self.output_names().len().max(1)
    }
}

impl Operation for LinalgOp {
    fn name(&self) -> &str {
        LinalgOp::name(self)
    }
}

impl LinalgOp {
    pub fn name(&self) -> &'static str {
        use LinalgOp::*;
        match self {
            Matmul { .. } => "matmul",
            Cholesky { .. } => "cholesky",
            Cross { .. } => "cross",
            Det => "det",
            Diagonal { .. } => "diagonal",
            Diag { .. } => "diag",
            Eigh { .. } => "eigh",
            Eigvalsh { .. } => "eigvalsh",
            Inner => "inner",
            Inv { .. } => "inv",
            Pinv { .. } => "pinv",
            MatrixNorm { .. } => "matrix_norm",
            MatrixPower { .. } => "matrix_power",
            MatrixRank { .. } => "matrix_rank",
            MatrixTranspose { .. } => "matrix_transpose",
            Outer => "outer",
            Qr { .. } => "qr",
            Slogdet => "slogdet",
            Solve { .. } => "solve",
            Svd { .. } => "svd",
            Svdvals => "svdvals",
            Tensordot { .. } => "tensordot",
            Trace { .. } => "trace",
            Vecdot { .. } => "vecdot",
            VectorNorm { .. } => "vector_norm",
            VectorToSkewSymmetricMatrix => "vector_to_skew_symmetric_matrix",
            Vander { .. } => "vander"
        }
    }
}

impl Display for LinalgOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kwargs = self.kwargs();
        if kwargs.is_empty() {
            write!(f, "{}", self.name())
        } else {
            write!(f, "{}({})", self.name(), kwargs.iter().map(|(k, v)| format!("{k}={v}")).join(", "))
        }
    }
}

struct Parser<'a> {
    op: &'a str,
    kw: &'a str,
    value: &'a str
}

impl<'a> Parser<'a> {
    fn parse<T>(&self) -> Result<T, LinalgError>
    where T: FromStr {
        self.value.trim().to_lowercase().parse().map_err(|_|
            LinalgError::invalid(self.op, self.kw, format!("cannot parse `{}`", self.value))
        )
    }

    fn parse_opt<T>(&self) -> Result<Option<T>, LinalgError>
    where T: FromStr {
        match self.value.trim().to_lowercase().as_str() {
            "none" | "null" => Ok(None),
            _ => self.parse().map(Some)
        }
    }

    fn parse_with<T, F>(&self, f: F) -> Result<T, LinalgError>
    where F: FnOnce(&str) -> Option<T> {
        f(self.value.trim()).ok_or_else(||
            LinalgError::invalid(self.op, self.kw, format!("unsupported value `{}`", self.value))
        )
    }
}

fn parse_uplo(s: &str) -> Option<Uplo> {
    match s {
        "L" | "l" => Some(Uplo::Lower),
        "U" | "u" => Some(Uplo::Upper),
        _ => None
    }
}

fn parse_qr_mode(s: &str) -> Option<QrMode> {
    match s {
        "reduced" => Some(QrMode::Reduced),
        "complete" => Some(QrMode::Complete),
        _ => None
    }
}

fn matrix_ord_str(ord: MatrixOrd) -> &'static str {
    match ord {
        MatrixOrd::Fro => "fro",
        MatrixOrd::Nuc => "nuc",
        MatrixOrd::Inf => "inf",
        MatrixOrd::NegInf => "-inf",
        MatrixOrd::One => "1",
        MatrixOrd::NegOne => "-1",
        MatrixOrd::Two => "2",
        MatrixOrd::NegTwo => "-2"
    }
}

fn parse_matrix_ord(s: &str) -> Option<MatrixOrd> {
    use MatrixOrd::*;
    [Fro, Nuc, Inf, NegInf, One, NegOne, Two, NegTwo].into_iter().find(|&o| matrix_ord_str(o) == s)
}

fn parse_vector_ord(s: &str) -> Option<VectorOrd> {
    match s {
        "inf" => Some(VectorOrd::Inf),
        "-inf" => Some(VectorOrd::NegInf),
        _ => s.parse::<f64>().ok().filter(|p| p.is_finite()).map(VectorOrd::P)
    }
}

/// `n` or `a0,a1:b0,b1`.
fn parse_axes(s: &str) -> Option<TensordotAxes> {
    if let Ok(n) = s.parse::<usize>() {
        return Some(TensordotAxes::Count(n))
    }
    let (a, b) = s.split_once(':')?;
    let list = |s: &str| -> Option<Vec<usize>> {
        s.split(',').filter(|t| !t.trim().is_empty()).map(|t| t.trim().parse().ok()).collect()
    };
    let (a, b) = (list(a)?, list(b)?);
    (a.len() == b.len()).then_some(TensordotAxes::Pairs(a, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        for name in LinalgOp::NAMES {
            let op = LinalgOp::default_of(name).unwrap();
            assert_eq!(op.name(), name);
        }
    }

    #[test]
    fn unknown() {
        assert_eq!(LinalgOp::default_of("foo"), Err(LinalgError::UnknownOp("foo".into())));
    }

    #[test]
    fn from_name() {
        let op = LinalgOp::from_name("matmul", [("transpose_b", "true")]).unwrap();
        assert_eq!(op, LinalgOp::Matmul { transpose_a: false, transpose_b: true, adjoint_a: false, adjoint_b: false });

        let op = LinalgOp::from_name("eigh", [("UPLO", "U")]).unwrap();
        assert_eq!(op, LinalgOp::Eigh { uplo: Uplo::Upper });

        let op = LinalgOp::from_name("vector_norm", [("ord", "inf"), ("axis", "0")]).unwrap();
        assert_eq!(op, LinalgOp::VectorNorm { axis: Some(0), keepdims: false, ord: VectorOrd::Inf });

        let op = LinalgOp::from_name("pinv", [("rtol", "1e-3")]).unwrap();
        assert_eq!(op, LinalgOp::Pinv { rtol: Some(1e-3) });

        let op = LinalgOp::from_name("tensordot", [("axes", "1,0:0,1")]).unwrap();
        assert_eq!(op, LinalgOp::Tensordot { axes: TensordotAxes::Pairs(vec![1, 0], vec![0, 1]) });
    }

    #[test]
    fn from_name_errors() {
        let e = LinalgOp::from_name("det", [("axis", "1")]).unwrap_err();
        assert!(matches!(e, LinalgError::Invalid { .. }));

        let e = LinalgOp::from_name("qr", [("mode", "full")]).unwrap_err();
        assert_eq!(e.to_string(), "qr: invalid value for `mode`: unsupported value `full`");

        let e = LinalgOp::from_name("inv", [("adjoint", "maybe")]).unwrap_err();
        assert!(matches!(e, LinalgError::Invalid { .. }));
    }

    #[test]
    fn arity_and_outputs() {
        assert_eq!(LinalgOp::matmul().arity(), 2);
        assert_eq!(LinalgOp::Det.arity(), 1);
        assert_eq!(LinalgOp::qr().output_names(), &["q", "r"]);
        assert_eq!(LinalgOp::svd().outputs(), 3);
        assert_eq!(LinalgOp::Svd { compute_uv: false, full_matrices: true }.outputs(), 1);
        assert_eq!(LinalgOp::Det.outputs(), 1);
    }

    #[test]
    fn display() {
        assert_eq!(LinalgOp::Det.to_string(), "det");
        assert_eq!(LinalgOp::cholesky().to_string(), "cholesky(upper=false)");
        assert_eq!(LinalgOp::vander().to_string(), "vander(N=none, increasing=false)");
    }

    #[test]
    fn kwargs_roundtrip_through_set() {
        let op = LinalgOp::VectorNorm { axis: Some(1), keepdims: true, ord: VectorOrd::P(1.0) };
        let parsed = LinalgOp::from_name(op.name(), op.kwargs()).unwrap();
        assert_eq!(parsed, op);
    }
}
