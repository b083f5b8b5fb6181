mod helper;
pub use helper::*;
