//! Geometric image transformations using perspective warps.
//!
//! - Perspective transform estimation from four point correspondences
//! - Perspective warping (homographies)

mod perspective;

pub use perspective::{
    get_perspective_transform, inverse_perspective_matrix, transform_point, warp_perspective,
};
