//! Sound chip drivers

pub mod ay8910;

pub use ay8910::DualAy8910;
