use kornia_image::Image;

/// Compute the global threshold that maximizes the between-class variance (Otsu).
///
/// Pixels `<= threshold` form the background class. A uniform image has no valid
/// split and yields 0.
///
/// # Arguments
///
/// * `src` - The input grayscale image.
///
/// # Returns
///
/// The threshold value.
///
/// # Examples
///
/// ```
/// use kornia_image::{Image, ImageSize};
/// use kornia_imgproc::threshold::otsu_threshold_value;
///
/// let data = vec![100u8, 200, 50, 150, 200, 250];
/// let image = Image::<_, 1>::new(ImageSize { width: 2, height: 3 }, data).unwrap();
///
/// assert_eq!(otsu_threshold_value(&image), 100);
/// ```
pub fn otsu_threshold_value(src: &Image<u8, 1>) -> u8 {
    const BINS: usize = 256;
    let mut histogram = [0u32; BINS];

    for &pixel in src.as_slice() {
        histogram[pixel as usize] += 1;
    }

    let total_pixels = src.as_slice().len() as f64;
    let sum_total = histogram
        .iter()
        .enumerate()
        .map(|(i, &count)| i as f64 * count as f64)
        .sum::<f64>();

    let mut best_variance = 0.0;
    let mut best_threshold = 0u8;

    let mut weight_back = 0.0;
    let mut sum_back = 0.0;

    for (current_threshold, &hist_count) in histogram.iter().enumerate() {
        weight_back += hist_count as f64;
        sum_back += current_threshold as f64 * hist_count as f64;

        // skip empty classes
        if weight_back == 0.0 || weight_back == total_pixels {
            continue;
        }

        let weight_fore = total_pixels - weight_back;
        let mean_back = sum_back / weight_back;
        let mean_fore = (sum_total - sum_back) / weight_fore;

        let variance = weight_back * weight_fore * (mean_back - mean_fore).powi(2);

        if variance > best_variance {
            best_variance = variance;
            best_threshold = current_threshold as u8;
        }
    }

    best_threshold
}

#[cfg(test)]
mod tests {
    use kornia_image::{Image, ImageError, ImageSize};

    #[test]
    fn otsu_threshold_value() -> Result<(), ImageError> {
        let data = vec![100u8, 200, 50, 150, 200, 250];
        let image = Image::<_, 1>::new(
            ImageSize {
                width: 2,
                height: 3,
            },
            data,
        )?;
        assert_eq!(super::otsu_threshold_value(&image), 100);
        Ok(())
    }

    #[test]
    fn otsu_bimodal_and_uniform() -> Result<(), ImageError> {
        let mut data = vec![30u8; 50];
        data.extend(vec![220u8; 50]);
        let image = Image::<_, 1>::new([10, 10].into(), data)?;
        assert_eq!(super::otsu_threshold_value(&image), 30);

        let uniform = Image::<u8, 1>::from_size_val([4, 4].into(), 90)?;
        assert_eq!(super::otsu_threshold_value(&uniform), 0);

        Ok(())
    }
}
