use super::bilinear::bilinear_interpolation;
use super::nearest::nearest_neighbor_interpolation;
use kornia_image::Image;

/// Interpolation mode for the resampling operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationMode {
    /// Bilinear interpolation
    #[default]
    Bilinear,
    /// Nearest neighbor interpolation
    Nearest,
}

/// Kernel for interpolating a pixel value
///
/// # Arguments
///
/// * `image` - The input image container with shape (height, width, C).
/// * `u` - The x coordinate of the pixel to interpolate.
/// * `v` - The y coordinate of the pixel to interpolate.
/// * `interpolation` - The interpolation mode to use.
///
/// # Returns
///
/// The interpolated pixel, `None` when `(u, v)` falls outside the image.
pub fn interpolate_pixel<const C: usize>(
    image: &Image<u8, C>,
    u: f32,
    v: f32,
    interpolation: InterpolationMode,
) -> Option<[f32; C]> {
    if image.is_empty()
        || !(0.0..=(image.cols() - 1) as f32).contains(&u)
        || !(0.0..=(image.rows() - 1) as f32).contains(&v)
    {
        return None;
    }

    Some(match interpolation {
        InterpolationMode::Bilinear => bilinear_interpolation(image, u, v),
        InterpolationMode::Nearest => nearest_neighbor_interpolation(image, u, v),
    })
}

#[cfg(test)]
mod tests {
    use super::{interpolate_pixel, InterpolationMode};
    use kornia_image::{Image, ImageError, ImageSize};

    #[test]
    fn bilinear_center() -> Result<(), ImageError> {
        let image = Image::<u8, 1>::new(
            ImageSize {
                width: 2,
                height: 2,
            },
            vec![0, 100, 100, 200],
        )?;

        let pixel = interpolate_pixel(&image, 0.5, 0.5, InterpolationMode::Bilinear);
        assert_eq!(pixel, Some([100.0]));

        let pixel = interpolate_pixel(&image, 1.0, 0.0, InterpolationMode::Nearest);
        assert_eq!(pixel, Some([100.0]));

        assert_eq!(
            interpolate_pixel(&image, 1.5, 0.0, InterpolationMode::Bilinear),
            None
        );
        assert_eq!(
            interpolate_pixel(&image, -0.1, 0.0, InterpolationMode::Bilinear),
            None
        );
        Ok(())
    }
}
