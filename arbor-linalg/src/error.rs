use derive_more::Display;

#[derive(Clone, Debug, Display, PartialEq)]
pub enum LinalgError {
    #[display("{op}: {msg}")]
    Shape { op: &'static str, msg: String },

    #[display("{op}: matrix is singular")]
    Singular { op: &'static str },

    #[display("{op}: matrix is not positive definite")]
    NotPositiveDefinite { op: &'static str },

    #[display("{op}: decomposition did not converge")]
    NoConvergence { op: &'static str },

    #[display("{op}: expected {expected} argument(s), found {found}")]
    Arity { op: &'static str, expected: usize, found: usize },

    #[display("{op}: invalid value for `{kw}`: {msg}")]
    Invalid { op: String, kw: String, msg: String },

    #[display("{op}: returns {count} outputs where one was expected")]
    MultiOutput { op: String, count: usize },

    #[display("unknown operation: {_0}")]
    UnknownOp(String)
}

impl LinalgError {
    pub(crate) fn shape<S>(op: &'static str, msg: S) -> Self
    where S: Into<String> {
        LinalgError::Shape { op, msg: msg.into() }
    }

    pub(crate) fn invalid<S1, S2, S3>(op: S1, kw: S2, msg: S3) -> Self
    where S1: Into<String>, S2: Into<String>, S3: Into<String> {
        LinalgError::Invalid { op: op.into(), kw: kw.into(), msg: msg.into() }
    }
}

impl std::error::Error for LinalgError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(LinalgError::Singular { op: "inv" }.to_string(), "inv: matrix is singular");
        assert_eq!(
            LinalgError::Arity { op: "matmul", expected: 2, found: 1 }.to_string(),
            "matmul: expected 2 argument(s), found 1"
        );
        assert_eq!(
            LinalgError::invalid("qr", "mode", "unknown mode `full`").to_string(),
            "qr: invalid value for `mode`: unknown mode `full`"
        );
        assert_eq!(LinalgError::UnknownOp("foo".into()).to_string(), "unknown operation: foo");
    }
}
