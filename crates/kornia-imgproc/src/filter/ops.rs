use kornia_image::{Image, ImageError};

use super::{kernels, separable_filter};
use crate::parallel;

/// Blur an image using a gaussian blur filter
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `kernel_size` - The size of the square kernel, must be odd.
/// * `sigma` - The standard deviation of the gaussian.
///
/// The filtered values are rounded back to u8.
pub fn gaussian_blur<const C: usize>(
    src: &Image<u8, C>,
    dst: &mut Image<u8, C>,
    kernel_size: usize,
    sigma: f32,
) -> Result<(), ImageError> {
    let kernel = kernels::gaussian_kernel_1d(kernel_size, sigma);

    let mut filtered = Image::<f32, C>::from_size_val(src.size(), 0.0)?;
    separable_filter(src, &mut filtered, &kernel, &kernel)?;

    if filtered.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            filtered.cols(),
            filtered.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    parallel::par_iter_rows_val(&filtered, dst, |&src_pixel, dst_pixel| {
        *dst_pixel = src_pixel.round().clamp(0.0, 255.0) as u8;
    });

    Ok(())
}

/// Compute the first order image derivatives with a 3x3 Sobel operator.
///
/// # Arguments
///
/// * `src` - The source grayscale image.
/// * `dx` - The destination for the horizontal derivative.
/// * `dy` - The destination for the vertical derivative.
pub fn spatial_gradient_sobel(
    src: &Image<u8, 1>,
    dx: &mut Image<f32, 1>,
    dy: &mut Image<f32, 1>,
) -> Result<(), ImageError> {
    let (derivative, smoothing) = kernels::sobel_kernel_1d(3)?;
    separable_filter(src, dx, &derivative, &smoothing)?;
    separable_filter(src, dy, &smoothing, &derivative)?;
    Ok(())
}
