//! Pixel interpolation methods for image transformations.
//!
//! - **Nearest**: uses the nearest pixel value
//! - **Bilinear**: linear interpolation between the four adjacent pixels
//!
//! Used by the perspective warp in `crate::warp`.

mod bilinear;
mod interpolate;
mod nearest;

pub use interpolate::{interpolate_pixel, InterpolationMode};
