use kornia_image::ImageError;
use kornia_io::error::IoError;

/// An error type for the paintings module.
#[derive(thiserror::Error, Debug)]
pub enum PaintingError {
    /// Error raised by an image operation.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Error reading or writing an image file.
    #[error(transparent)]
    Io(#[from] IoError),

    /// Error accessing the file system.
    #[error("Failed to access the file system. {0}")]
    Fs(#[from] std::io::Error),

    /// Error (de)serializing a corpus or a configuration.
    #[error("Failed to (de)serialize JSON. {0}")]
    Json(#[from] serde_json::Error),

    /// The input cannot be processed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The polygon corners do not define a perspective transform.
    #[error("The polygon does not define a perspective transform: {0:?}")]
    DegenerateTransform([[i32; 2]; 4]),

    /// A record does not hold one descriptor per keypoint.
    #[error("Record {id} has {descriptors} descriptors but {keypoints} keypoints")]
    CorpusMismatch {
        /// Record id.
        id: String,
        /// Number of descriptors.
        descriptors: usize,
        /// Number of keypoints.
        keypoints: usize,
    },

    /// A record index is outside the corpus.
    #[error("Record index {0} is out of bounds for a corpus of {1} records")]
    RecordIndexOutOfBounds(usize, usize),

    /// Two embeddings have different lengths.
    #[error("Embedding of length {found} does not match the query length {expected}")]
    EmbeddingDimensionMismatch {
        /// Length of the query embedding.
        expected: usize,
        /// Length of the stored embedding.
        found: usize,
    },

    /// An embedding strategy was requested from a matcher without an embedder.
    #[error("The matching strategy needs an embedder but none was provided")]
    MissingEmbedder,

    /// A reference file name does not follow `room__IMG_XXXX__NN`.
    #[error("Invalid reference file name: {0}")]
    InvalidFilename(String),

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
