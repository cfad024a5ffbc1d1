#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Reference corpus construction from labeled photographs.
pub mod builder;

/// Tunable parameters of the detector and the matcher.
pub mod config;

/// Reference records and their JSON persistence.
pub mod corpus;

/// Painting frame detection.
pub mod detector;

/// Global image embeddings.
pub mod embedder;

/// Error types for the paintings crate.
pub mod error;

/// Quadrilaterals, point ordering and coordinate rescaling.
pub mod geometry;

/// Ranking of a query against the reference corpus.
pub mod matcher;

/// Distances between embeddings.
pub mod metrics;

/// End-to-end identification of the paintings in a photo.
pub mod pipeline;

/// Perspective rectification of detected frames.
pub mod rectifier;

pub use error::PaintingError;
