use fast_image_resize as fr;
use kornia_image::{Image, ImageError, ImageSize};

use crate::interpolation::InterpolationMode;

/// Resize an image to a new size using the [fast_image_resize](https://crates.io/crates/fast_image_resize) crate.
///
/// The function resizes an image to the size of `dst` using the specified interpolation mode.
/// It supports u8 images with 1 or 3 channels.
///
/// # Arguments
///
/// * `src` - The input image container.
/// * `dst` - The output image container, already allocated with the target size.
/// * `interpolation` - The interpolation mode to use.
///
/// # Example
///
/// ```
/// use kornia_image::{Image, ImageSize};
/// use kornia_imgproc::resize::resize_fast;
/// use kornia_imgproc::interpolation::InterpolationMode;
///
/// let image = Image::<_, 3>::new(
///     ImageSize {
///         width: 4,
///         height: 5,
///     },
///     vec![0u8; 4 * 5 * 3],
/// )
/// .unwrap();
///
/// let new_size = ImageSize {
///     width: 2,
///     height: 3,
/// };
///
/// let mut image_resized = Image::<_, 3>::from_size_val(new_size, 0).unwrap();
///
/// resize_fast(&image, &mut image_resized, InterpolationMode::Nearest).unwrap();
///
/// assert_eq!(image_resized.num_channels(), 3);
/// assert_eq!(image_resized.size().width, 2);
/// assert_eq!(image_resized.size().height, 3);
/// ```
///
/// # Errors
///
/// The function returns an error if either image is empty, the channel count is not
/// supported or the backend fails.
pub fn resize_fast<const C: usize>(
    src: &Image<u8, C>,
    dst: &mut Image<u8, C>,
    interpolation: InterpolationMode,
) -> Result<(), ImageError> {
    if src.is_empty() || dst.is_empty() {
        return Err(ImageError::EmptyImage);
    }

    let pixel_type = match C {
        1 => fr::PixelType::U8,
        3 => fr::PixelType::U8x3,
        _ => return Err(ImageError::ChannelIndexOutOfBounds(C, 3)),
    };

    let src_image = fr::images::ImageRef::new(
        src.width() as u32,
        src.height() as u32,
        src.as_slice(),
        pixel_type,
    )
    .map_err(|e| ImageError::ResizeError(e.to_string()))?;

    let mut dst_image = fr::images::Image::new(dst.width() as u32, dst.height() as u32, pixel_type);

    let options = fr::ResizeOptions::new().resize_alg(match interpolation {
        InterpolationMode::Bilinear => fr::ResizeAlg::Convolution(fr::FilterType::Bilinear),
        InterpolationMode::Nearest => fr::ResizeAlg::Nearest,
    });

    let mut resizer = fr::Resizer::new();
    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| ImageError::ResizeError(e.to_string()))?;

    dst.as_slice_mut().copy_from_slice(dst_image.buffer());

    Ok(())
}

/// Size of an image scaled to `width` columns with its aspect ratio preserved.
///
/// The height is truncated and never smaller than one row.
pub fn size_for_width(size: ImageSize, width: usize) -> ImageSize {
    let ratio = width as f64 / size.width.max(1) as f64;
    ImageSize {
        width,
        height: ((size.height as f64 * ratio) as usize).max(1),
    }
}

/// Resize an image to the given width preserving its aspect ratio.
///
/// # Arguments
///
/// * `src` - The input image.
/// * `width` - The target width in pixels.
///
/// # Returns
///
/// A new image with `width` columns.
pub fn resize_to_width<const C: usize>(
    src: &Image<u8, C>,
    width: usize,
) -> Result<Image<u8, C>, ImageError> {
    if src.is_empty() || width == 0 {
        return Err(ImageError::EmptyImage);
    }

    let new_size = size_for_width(src.size(), width);
    if new_size == src.size() {
        return Ok(src.clone());
    }

    let mut dst = Image::from_size_val(new_size, 0u8)?;
    resize_fast(src, &mut dst, InterpolationMode::Bilinear)?;

    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_gray_constant() -> Result<(), ImageError> {
        let image = Image::<u8, 1>::from_size_val([8, 6].into(), 42)?;
        let mut resized = Image::<u8, 1>::from_size_val([4, 3].into(), 0)?;
        resize_fast(&image, &mut resized, InterpolationMode::Bilinear)?;
        assert!(resized.as_slice().iter().all(|&v| v.abs_diff(42) <= 1));
        Ok(())
    }

    #[test]
    fn resize_keeps_aspect() -> Result<(), ImageError> {
        let image = Image::<u8, 3>::from_size_val([1000, 750].into(), 7)?;
        let resized = resize_to_width(&image, 500)?;
        assert_eq!(resized.size(), ImageSize { width: 500, height: 375 });

        let size = size_for_width([3, 1000].into(), 1);
        assert_eq!(size, ImageSize { width: 1, height: 333 });
        Ok(())
    }

    #[test]
    fn resize_empty() {
        let image = Image::<u8, 3>::empty();
        assert_eq!(resize_to_width(&image, 10), Err(ImageError::EmptyImage));
    }
}
