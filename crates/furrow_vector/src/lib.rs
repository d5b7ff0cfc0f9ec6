//! Fixed-width columnar vectors and the batch compute kernels that drive them.
pub mod chunk;
pub mod compute;
pub mod datatype;
pub mod selection;
pub mod vector;
