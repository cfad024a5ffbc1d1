//! Morphological image processing operations.

/// Structuring elements.
pub mod kernels;
pub use kernels::{Kernel, KernelShape};

mod ops;
pub use ops::dilate;
