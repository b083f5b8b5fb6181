use derive_more::Display;
use crate::KeyChain;

#[derive(Clone, Debug, Display, PartialEq, Eq)]
#[display("expected {expected}, found {found}")]
pub struct ShapeMismatch {
    pub expected: String,
    pub found: String
}

impl ShapeMismatch {
    pub fn new<S1, S2>(expected: S1, found: S2) -> Self
    where S1: ToString, S2: ToString {
        Self { expected: expected.to_string(), found: found.to_string() }
    }
}

impl std::error::Error for ShapeMismatch {}

#[derive(Debug, Display)]
pub enum MapError<E> {
    #[display("{op}: argument {arg} does not match the structure at `{path}`")]
    KeyMismatch { op: String, path: KeyChain, arg: usize },

    #[display("{op}: output at `{path}` is incompatible: {mismatch}")]
    OutputShape { op: String, path: KeyChain, mismatch: ShapeMismatch },

    #[display("{op}: failed at `{path}`: {source}")]
    Backend { op: String, path: KeyChain, source: E },

    #[display("{op}: cannot move the result at `{path}` to `{to}`")]
    Rename { op: String, path: KeyChain, to: KeyChain }
}

impl<E> MapError<E> {
    pub fn op(&self) -> &str {
        match self {
            MapError::KeyMismatch { op, .. } |
            MapError::OutputShape { op, .. } |
            MapError::Backend { op, .. } |
            MapError::Rename { op, .. } => op
        }
    }

    pub fn path(&self) -> &KeyChain {
        match self {
            MapError::KeyMismatch { path, .. } |
            MapError::OutputShape { path, .. } |
            MapError::Backend { path, .. } |
            MapError::Rename { path, .. } => path
        }
    }

    pub fn backend_error(&self) -> Option<&E> {
        match self {
            MapError::Backend { source, .. } => Some(source),
            _ => None
        }
    }
}

impl<E> std::error::Error for MapError<E>
where E: std::error::Error + 'static {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MapError::Backend { source, .. } => Some(source),
            MapError::OutputShape { mismatch, .. } => Some(mismatch),
            _ => None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Display)]
    #[display("boom")]
    struct Boom;

    impl std::error::Error for Boom {}

    #[test]
    fn display() {
        let e: MapError<Boom> = MapError::KeyMismatch { op: "matmul".into(), path: "a/b".into(), arg: 1 };
        assert_eq!(e.to_string(), "matmul: argument 1 does not match the structure at `a/b`");

        let e: MapError<Boom> = MapError::Backend { op: "inv".into(), path: "x".into(), source: Boom };
        assert_eq!(e.to_string(), "inv: failed at `x`: boom");
        assert_eq!(e.path(), &KeyChain::parse("x"));
        assert_eq!(e.op(), "inv");

        let e: MapError<Boom> = MapError::Rename { op: "neg".into(), path: "0".into(), to: "x".into() };
        assert_eq!(e.to_string(), "neg: cannot move the result at `0` to `x`");
    }

    #[test]
    fn source() {
        use std::error::Error;
        let e: MapError<Boom> = MapError::Backend { op: "inv".into(), path: "x".into(), source: Boom };
        assert_eq!(e.source().map(|s| s.to_string()), Some("boom".to_string()));
    }
}
