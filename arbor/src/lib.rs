mod key;
mod value;
mod container;
mod select;
mod error;
mod backend;
mod mapper;

pub use key::*;
pub use value::*;
pub use container::*;
pub use select::*;
pub use error::*;
pub use backend::*;
pub use mapper::*;

pub mod util;
