pub mod apply;
pub mod ops;
