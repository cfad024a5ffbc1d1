use kornia_image::{Image, ImageError};
use rayon::prelude::*;

/// Index of `i` folded into `[0, n)` mirroring around the edge pixels (`dcb|abcd|cba`).
#[inline]
pub(crate) fn reflect_101(i: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let n = n as isize;
    let mut i = i;
    while i < 0 || i >= n {
        if i < 0 {
            i = -i;
        }
        if i >= n {
            i = 2 * (n - 1) - i;
        }
    }
    i as usize
}

/// Apply a separable filter to an image.
///
/// The horizontal kernel is applied first, then the vertical one. Borders are
/// mirrored without repeating the edge pixel.
///
/// # Arguments
///
/// * `src` - The source image.
/// * `dst` - The destination image receiving the filtered values.
/// * `kernel_x` - The horizontal kernel.
/// * `kernel_y` - The vertical kernel.
pub fn separable_filter<const C: usize>(
    src: &Image<u8, C>,
    dst: &mut Image<f32, C>,
    kernel_x: &[f32],
    kernel_y: &[f32],
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    if kernel_x.is_empty() || kernel_x.len() % 2 == 0 {
        return Err(ImageError::InvalidKernelLength(kernel_x.len()));
    }

    if kernel_y.is_empty() || kernel_y.len() % 2 == 0 {
        return Err(ImageError::InvalidKernelLength(kernel_y.len()));
    }

    if src.is_empty() {
        return Ok(());
    }

    let (cols, rows) = (src.cols(), src.rows());
    let half_x = (kernel_x.len() / 2) as isize;
    let half_y = (kernel_y.len() / 2) as isize;
    let src_data = src.as_slice();

    // horizontal pass
    let mut temp = vec![0f32; src_data.len()];
    temp.par_chunks_exact_mut(cols * C)
        .enumerate()
        .for_each(|(r, row)| {
            let src_row = &src_data[r * cols * C..(r + 1) * cols * C];
            for c in 0..cols {
                for ch in 0..C {
                    let mut acc = 0f32;
                    for (k, &w) in kernel_x.iter().enumerate() {
                        let x = reflect_101(c as isize + k as isize - half_x, cols);
                        acc += src_row[x * C + ch] as f32 * w;
                    }
                    row[c * C + ch] = acc;
                }
            }
        });

    // vertical pass
    dst.as_slice_mut()
        .par_chunks_exact_mut(cols * C)
        .enumerate()
        .for_each(|(r, row)| {
            for (k, &w) in kernel_y.iter().enumerate() {
                let y = reflect_101(r as isize + k as isize - half_y, rows);
                let temp_row = &temp[y * cols * C..(y + 1) * cols * C];
                if k == 0 {
                    row.iter_mut()
                        .zip(temp_row)
                        .for_each(|(d, &t)| *d = t * w);
                } else {
                    row.iter_mut()
                        .zip(temp_row)
                        .for_each(|(d, &t)| *d += t * w);
                }
            }
        });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kornia_image::ImageSize;

    #[test]
    fn test_reflect_101() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(-2, 5), 2);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(6, 5), 2);
        assert_eq!(reflect_101(3, 1), 0);
    }

    #[test]
    fn test_separable_filter() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 5,
            height: 5,
        };

        #[rustfmt::skip]
        let img = Image::<u8, 1>::new(
            size,
            vec![
                0, 0, 0, 0, 0,
                0, 0, 0, 0, 0,
                0, 0, 9, 0, 0,
                0, 0, 0, 0, 0,
                0, 0, 0, 0, 0,
            ],
        )?;

        let mut dst = Image::<f32, 1>::from_size_val(size, 0.0)?;
        let kernel = vec![1.0 / 3.0; 3];

        separable_filter(&img, &mut dst, &kernel, &kernel)?;

        for y in 0..5 {
            for x in 0..5 {
                let expected = if (1..=3).contains(&x) && (1..=3).contains(&y) {
                    1.0
                } else {
                    0.0
                };
                let value = dst.get_pixel(x, y, 0)?;
                assert!((value - expected).abs() < 1e-5, "({x}, {y}) = {value}");
            }
        }

        Ok(())
    }

    #[test]
    fn test_separable_filter_even_kernel() -> Result<(), ImageError> {
        let img = Image::<u8, 1>::from_size_val([3, 3].into(), 0)?;
        let mut dst = Image::<f32, 1>::from_size_val(img.size(), 0.0)?;
        assert_eq!(
            separable_filter(&img, &mut dst, &[0.5, 0.5], &[1.0]),
            Err(ImageError::InvalidKernelLength(2))
        );
        Ok(())
    }
}
