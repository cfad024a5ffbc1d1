use kornia_image::ImageError;

/// Shapes of morphological `Kernels`.
///
/// All kernels are centered at their geometric center.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelShape {
    /// A rectangular structuring element, every pixel included.
    Rect {
        /// Width of the rectangle.
        width: usize,
        /// Height of the rectangle.
        height: usize,
    },
}

/// A morphological structuring element.
///
/// A binary mask where 1 marks the pixels taking part in the operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl Kernel {
    /// Build the kernel for a shape.
    ///
    /// Fails with [`ImageError::InvalidKernelLength`] when a dimension is zero.
    pub fn new(shape: KernelShape) -> Result<Self, ImageError> {
        match shape {
            KernelShape::Rect { width, height } => {
                if width == 0 || height == 0 {
                    return Err(ImageError::InvalidKernelLength(0));
                }
                Ok(Self {
                    data: vec![1; width * height],
                    width,
                    height,
                })
            }
        }
    }

    /// The mask values, row-major.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Width of the kernel.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height of the kernel.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Offset of the anchor as `(rows, cols)`.
    pub fn pad(&self) -> (usize, usize) {
        (self.height / 2, self.width / 2)
    }
}
