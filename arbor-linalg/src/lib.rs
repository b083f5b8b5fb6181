mod array;
mod error;
mod op;
mod backend;
mod ext;

pub mod dense;
pub mod ops;

pub use array::*;
pub use error::*;
pub use op::*;
pub use backend::*;
pub use ext::*;
pub use ops::{Eigh, LinalgMapError, Qr, Slogdet, Svd};
