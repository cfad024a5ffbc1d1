/// An error type for the image module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ImageError {
    /// Error when channel and shape are not valid.
    #[error("Data length ({0}) does not match the image size ({1})")]
    InvalidChannelShape(usize, usize),

    /// Error when the image sizes of two operands differ.
    #[error("Image size ({0}x{1}) does not match the expected size ({2}x{3})")]
    InvalidImageSize(usize, usize, usize, usize),

    /// Error when a pixel coordinate is outside the image.
    #[error("Pixel index ({0}, {1}) is out of bounds for an image of ({2}x{3})")]
    PixelIndexOutOfBounds(usize, usize, usize, usize),

    /// Error when a channel index is outside the image.
    #[error("Channel index {0} is out of bounds for {1} channels")]
    ChannelIndexOutOfBounds(usize, usize),

    /// Error when the pixel type cannot be cast.
    #[error("Failed to cast image data")]
    CastError,

    /// Error when a matrix is singular.
    #[error("Cannot compute the determinant, the matrix is singular")]
    CannotComputeDeterminant,

    /// Error when a kernel has an invalid length.
    #[error("Invalid kernel length: {0}")]
    InvalidKernelLength(usize),

    /// Error when a crop window does not fit in the image.
    #[error("Crop region ({0}, {1}, {2}x{3}) does not fit in the image")]
    InvalidCropRegion(usize, usize, usize, usize),

    /// Error raised by the resize backend.
    #[error("Failed to resize the image: {0}")]
    ResizeError(String),

    /// Error when an operation requires a non-empty image.
    #[error("The image is empty")]
    EmptyImage,
}
