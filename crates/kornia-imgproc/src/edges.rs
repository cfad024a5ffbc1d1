use std::collections::VecDeque;

use kornia_image::{Image, ImageError};
use rayon::prelude::*;

use crate::filter::spatial_gradient_sobel;

// tan(22.5 deg) and tan(67.5 deg)
const TAN_22_5: f32 = 0.414_213_57;
const TAN_67_5: f32 = 2.414_213_7;

/// Detect edges with the Canny algorithm.
///
/// The gradient is computed with a 3x3 Sobel operator, thinned with non-maximum
/// suppression along the quantized gradient direction and linked with hysteresis:
/// pixels above `high_threshold` seed edges that grow through 8-connected pixels
/// above `low_threshold`.
///
/// # Arguments
///
/// * `src` - The input grayscale image.
/// * `dst` - The output edge map, 255 on edges and 0 elsewhere.
/// * `low_threshold` - The hysteresis low threshold on the gradient magnitude.
/// * `high_threshold` - The hysteresis high threshold on the gradient magnitude.
/// * `l2_gradient` - Use the euclidean norm of the gradient instead of `|dx| + |dy|`.
pub fn canny(
    src: &Image<u8, 1>,
    dst: &mut Image<u8, 1>,
    low_threshold: f32,
    high_threshold: f32,
    l2_gradient: bool,
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    dst.as_slice_mut().fill(0);
    if src.is_empty() {
        return Ok(());
    }

    let (low, high) = if low_threshold > high_threshold {
        (high_threshold, low_threshold)
    } else {
        (low_threshold, high_threshold)
    };

    let mut dx = Image::<f32, 1>::from_size_val(src.size(), 0.0)?;
    let mut dy = Image::<f32, 1>::from_size_val(src.size(), 0.0)?;
    spatial_gradient_sobel(src, &mut dx, &mut dy)?;

    let magnitude: Vec<f32> = dx
        .as_slice()
        .par_iter()
        .zip(dy.as_slice().par_iter())
        .map(|(&gx, &gy)| {
            if l2_gradient {
                (gx * gx + gy * gy).sqrt()
            } else {
                gx.abs() + gy.abs()
            }
        })
        .collect();

    let (cols, rows) = (src.cols(), src.rows());
    let mag_at = |x: isize, y: isize| -> f32 {
        if x < 0 || y < 0 || x >= cols as isize || y >= rows as isize {
            0.0
        } else {
            magnitude[y as usize * cols + x as usize]
        }
    };

    // 0: suppressed, 1: weak candidate, 2: strong edge
    let mut labels = vec![0u8; cols * rows];
    labels
        .par_chunks_exact_mut(cols)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as isize;
            for (x, label) in row.iter_mut().enumerate() {
                let idx = y as usize * cols + x;
                let m = magnitude[idx];
                if m <= low {
                    continue;
                }

                let x = x as isize;
                let gx = dx.as_slice()[idx];
                let gy = dy.as_slice()[idx];
                let (ax, ay) = (gx.abs(), gy.abs());

                let is_max = if ay <= ax * TAN_22_5 {
                    m > mag_at(x - 1, y) && m >= mag_at(x + 1, y)
                } else if ay > ax * TAN_67_5 {
                    m > mag_at(x, y - 1) && m >= mag_at(x, y + 1)
                } else {
                    let s = if (gx < 0.0) != (gy < 0.0) { -1 } else { 1 };
                    m > mag_at(x - s, y - 1) && m > mag_at(x + s, y + 1)
                };

                if is_max {
                    *label = if m > high { 2 } else { 1 };
                }
            }
        });

    // hysteresis from the strong edges
    let mut queue: VecDeque<usize> = labels
        .iter()
        .enumerate()
        .filter_map(|(i, &l)| (l == 2).then_some(i))
        .collect();

    let out = dst.as_slice_mut();
    for &i in queue.iter() {
        out[i] = 255;
    }

    while let Some(i) = queue.pop_front() {
        let (x, y) = ((i % cols) as isize, (i / cols) as isize);
        for ny in y - 1..=y + 1 {
            for nx in x - 1..=x + 1 {
                if nx < 0 || ny < 0 || nx >= cols as isize || ny >= rows as isize {
                    continue;
                }
                let j = ny as usize * cols + nx as usize;
                if labels[j] == 1 && out[j] == 0 {
                    out[j] = 255;
                    queue.push_back(j);
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::canny;
    use kornia_image::{Image, ImageError, ImageSize};

    fn vertical_step(size: ImageSize, column: usize) -> Result<Image<u8, 1>, ImageError> {
        let mut data = vec![0u8; size.area()];
        for y in 0..size.height {
            for x in column..size.width {
                data[y * size.width + x] = 200;
            }
        }
        Image::new(size, data)
    }

    #[test]
    fn canny_single_line_on_step() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 20,
            height: 12,
        };
        let image = vertical_step(size, 10)?;
        let mut edges = Image::<u8, 1>::from_size_val(size, 0)?;
        canny(&image, &mut edges, 50.0, 100.0, true)?;

        for y in 0..size.height {
            for x in 0..size.width {
                let expected = if x == 9 { 255 } else { 0 };
                assert_eq!(edges.get_pixel(x, y, 0)?, expected, "({x}, {y})");
            }
        }
        Ok(())
    }

    #[test]
    fn canny_uniform_has_no_edges() -> Result<(), ImageError> {
        let image = Image::<u8, 1>::from_size_val([16, 16].into(), 77)?;
        let mut edges = Image::<u8, 1>::from_size_val(image.size(), 0)?;
        canny(&image, &mut edges, 0.0, 0.0, true)?;
        assert!(edges.as_slice().iter().all(|&v| v == 0));
        Ok(())
    }

    #[test]
    fn canny_high_threshold_rejects_weak_step() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 20,
            height: 12,
        };
        let image = vertical_step(size, 10)?;
        let mut edges = Image::<u8, 1>::from_size_val(size, 0)?;
        // the step magnitude is 800, above low but below high
        canny(&image, &mut edges, 100.0, 1000.0, true)?;
        assert!(edges.as_slice().iter().all(|&v| v == 0));
        Ok(())
    }
}
