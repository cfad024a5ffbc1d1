use kornia_image::{Image, ImageSize};
use kornia_imgproc::{interpolation::InterpolationMode, resize::resize_fast};

use crate::error::PaintingError;

/// A global image descriptor used by the embedding matching strategies.
///
/// Implementations must be deterministic: the same image always yields the same
/// vector, and every vector of one embedder has the same length.
pub trait Embedder: Send + Sync {
    /// Compute the embedding of an RGB image.
    fn embed(&self, image: &Image<u8, 3>) -> Result<Vec<f32>, PaintingError>;
}

/// Side of the square the [`ColorHistogramEmbedder`] resamples images to.
pub const EMBEDDING_INPUT_SIZE: usize = 224;

/// Concatenated per-channel color histograms.
///
/// The image is resized to 224x224, each channel is binned into `bins` equal
/// intervals and each histogram is L1 normalized. The embedding has `3 * bins`
/// values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorHistogramEmbedder {
    bins: usize,
}

impl Default for ColorHistogramEmbedder {
    fn default() -> Self {
        Self { bins: 16 }
    }
}

impl ColorHistogramEmbedder {
    /// Create an embedder with `bins` bins per channel, between 1 and 256.
    pub fn new(bins: usize) -> Result<Self, PaintingError> {
        if bins == 0 || bins > 256 {
            return Err(PaintingError::InvalidConfig(format!(
                "histogram bins must be in [1, 256], got {bins}"
            )));
        }
        Ok(Self { bins })
    }

    /// Number of bins per channel.
    pub fn bins(&self) -> usize {
        self.bins
    }
}

impl Embedder for ColorHistogramEmbedder {
    fn embed(&self, image: &Image<u8, 3>) -> Result<Vec<f32>, PaintingError> {
        if image.is_empty() {
            return Err(PaintingError::InvalidInput(
                "cannot embed an empty image".to_string(),
            ));
        }

        let size = ImageSize {
            width: EMBEDDING_INPUT_SIZE,
            height: EMBEDDING_INPUT_SIZE,
        };
        let mut resized = Image::<u8, 3>::from_size_val(size, 0)?;
        resize_fast(image, &mut resized, InterpolationMode::Bilinear)?;

        let mut counts = vec![0u32; 3 * self.bins];
        for pixel in resized.as_slice().chunks_exact(3) {
            for (c, &v) in pixel.iter().enumerate() {
                counts[c * self.bins + v as usize * self.bins / 256] += 1;
            }
        }

        let total = (size.width * size.height) as f32;
        Ok(counts.into_iter().map(|n| n as f32 / total).collect())
    }
}

/// An embedder returning the same vector for every image.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedEmbedder(pub Vec<f32>);

impl Embedder for FixedEmbedder {
    fn embed(&self, _image: &Image<u8, 3>) -> Result<Vec<f32>, PaintingError> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn histogram_of_constant_image() -> Result<(), PaintingError> {
        let image = Image::<u8, 3>::new([4, 2].into(), [10u8, 160, 250].repeat(8))?;

        let embedder = ColorHistogramEmbedder::new(4)?;
        let embedding = embedder.embed(&image)?;

        assert_eq!(embedding.len(), 12);
        // 10 -> bin 0, 160 -> bin 2, 250 -> bin 3
        let expected = [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ];
        for (a, b) in embedding.iter().zip(expected) {
            assert_relative_eq!(*a, b);
        }
        Ok(())
    }

    #[test]
    fn histogram_is_normalized_and_deterministic() -> Result<(), PaintingError> {
        let data = (0..40 * 30 * 3).map(|i| (i * 7 % 256) as u8).collect();
        let image = Image::<u8, 3>::new([40, 30].into(), data)?;

        let embedder = ColorHistogramEmbedder::default();
        let first = embedder.embed(&image)?;
        assert_eq!(first, embedder.embed(&image)?);

        for channel in first.chunks_exact(embedder.bins()) {
            assert_relative_eq!(channel.iter().sum::<f32>(), 1.0, epsilon = 1e-4);
        }
        Ok(())
    }

    #[test]
    fn invalid_inputs() -> Result<(), PaintingError> {
        assert!(ColorHistogramEmbedder::new(0).is_err());
        assert!(ColorHistogramEmbedder::new(257).is_err());

        let empty = Image::<u8, 3>::new([0, 0].into(), vec![])?;
        assert!(matches!(
            ColorHistogramEmbedder::default().embed(&empty),
            Err(PaintingError::InvalidInput(_))
        ));
        Ok(())
    }
}
