mod products;
mod decomp;
mod structure;
mod norm;

pub use products::*;
pub use decomp::*;
pub use structure::*;
pub use norm::*;

use crate::LinalgError;

/// Resolves a possibly negative axis against `ndim`.
pub(crate) fn axis(op: &'static str, axis: isize, ndim: usize) -> Result<usize, LinalgError> {
    let n = ndim as isize;
    if -n <= axis && axis < n {
        Ok(axis.rem_euclid(n) as usize)
    } else {
        Err(LinalgError::shape(op, format!("axis {axis} is out of bounds for an array of dimension {ndim}")))
    }
}
