#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// color transformations module.
pub mod color;

/// polygonal contour extraction from binary images.
pub mod contours;

/// image cropping module.
pub mod crop;

/// utilities to draw on images.
pub mod draw;

/// edge detection module.
pub mod edges;

/// feature detection module.
pub mod features;

/// image filtering module.
pub mod filter;

/// planar geometry on integer polygons.
pub mod geometry;

/// utilities for interpolation.
pub mod interpolation;

/// morphological operations module.
pub mod morphology;

/// module containing parallization utilities.
pub mod parallel;

/// utility functions for resizing images.
pub mod resize;

/// operations to threshold images.
pub mod threshold;

/// image geometric transformations module.
pub mod warp;
