use rayon::prelude::*;

use crate::interpolation::{interpolate_pixel, InterpolationMode};

use kornia_image::{Image, ImageError};

// pivots below this magnitude make the system singular
const SINGULAR_EPS: f64 = 1e-10;

#[rustfmt::skip]
fn determinant3x3(m: &[f64; 9]) -> f64 {
    m[0] * (m[4] * m[8] - m[5] * m[7]) -
    m[1] * (m[3] * m[8] - m[5] * m[6]) +
    m[2] * (m[3] * m[7] - m[4] * m[6])
}

#[rustfmt::skip]
fn adjugate3x3(m: &[f64; 9]) -> [f64; 9] {
    [
        m[4] * m[8] - m[5] * m[7],  // [0, 0]
        m[2] * m[7] - m[1] * m[8],  // [0, 1]
        m[1] * m[5] - m[2] * m[4],  // [0, 2]
        m[5] * m[6] - m[3] * m[8],  // [1, 0]
        m[0] * m[8] - m[2] * m[6],  // [1, 1]
        m[2] * m[3] - m[0] * m[5],  // [1, 2]
        m[3] * m[7] - m[4] * m[6],  // [2, 0]
        m[1] * m[6] - m[0] * m[7],  // [2, 1]
        m[0] * m[4] - m[1] * m[3],  // [2, 2]
    ]
}

/// Invert a 3x3 row-major perspective matrix.
///
/// Fails with [`ImageError::CannotComputeDeterminant`] when the matrix is singular.
pub fn inverse_perspective_matrix(m: &[f64; 9]) -> Result<[f64; 9], ImageError> {
    let det = determinant3x3(m);

    if det.abs() < SINGULAR_EPS {
        return Err(ImageError::CannotComputeDeterminant);
    }

    let adj = adjugate3x3(m);
    let inv_det = 1.0 / det;

    let mut inv_m = [0.0; 9];
    for (inv, a) in inv_m.iter_mut().zip(adj.iter()) {
        *inv = a * inv_det;
    }

    Ok(inv_m)
}

/// Apply a perspective matrix to a point.
pub fn transform_point(x: f64, y: f64, m: &[f64; 9]) -> (f64, f64) {
    let w = m[6] * x + m[7] * y + m[8];
    let u = (m[0] * x + m[1] * y + m[2]) / w;
    let v = (m[3] * x + m[4] * y + m[5]) / w;
    (u, v)
}

/// Compute the perspective transform mapping four source points to four destination points.
///
/// Solves the 8x8 linear system of the homography with `m[8] = 1` using gaussian
/// elimination with partial pivoting.
///
/// # Arguments
///
/// * `src` - The four source points as `[x, y]`.
/// * `dst` - The four destination points as `[x, y]`.
///
/// # Returns
///
/// The 3x3 row-major matrix src -> dst.
///
/// # Errors
///
/// [`ImageError::CannotComputeDeterminant`] when three of the points are collinear.
///
/// # Example
///
/// ```
/// use kornia_imgproc::warp::{get_perspective_transform, transform_point};
///
/// let src = [[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]];
/// let dst = [[1.0, 2.0], [21.0, 2.0], [21.0, 22.0], [1.0, 22.0]];
///
/// let m = get_perspective_transform(&src, &dst).unwrap();
/// let (x, y) = transform_point(10.0, 10.0, &m);
/// assert!((x - 21.0).abs() < 1e-9 && (y - 22.0).abs() < 1e-9);
/// ```
pub fn get_perspective_transform(
    src: &[[f64; 2]; 4],
    dst: &[[f64; 2]; 4],
) -> Result<[f64; 9], ImageError> {
    // rows of the augmented system [A | b]
    let mut a = [[0.0f64; 9]; 8];
    for i in 0..4 {
        let [x, y] = src[i];
        let [u, v] = dst[i];
        a[i] = [x, y, 1.0, 0.0, 0.0, 0.0, -x * u, -y * u, u];
        a[i + 4] = [0.0, 0.0, 0.0, x, y, 1.0, -x * v, -y * v, v];
    }

    for col in 0..8 {
        let pivot = (col..8)
            .max_by(|&r1, &r2| a[r1][col].abs().total_cmp(&a[r2][col].abs()))
            .unwrap_or(col);

        if a[pivot][col].abs() < SINGULAR_EPS {
            return Err(ImageError::CannotComputeDeterminant);
        }
        a.swap(col, pivot);

        for row in 0..8 {
            if row == col {
                continue;
            }
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..9 {
                a[row][k] -= factor * a[col][k];
            }
        }
    }

    let mut m = [0.0; 9];
    for i in 0..8 {
        m[i] = a[i][8] / a[i][i];
    }
    m[8] = 1.0;

    // three collinear correspondences still solve the system but collapse the plane
    if determinant3x3(&m).abs() < SINGULAR_EPS {
        return Err(ImageError::CannotComputeDeterminant);
    }

    Ok(m)
}

/// Applies a perspective transformation to an image.
///
/// Every destination pixel is mapped back through the inverse of `m` and sampled
/// from `src`; pixels mapping outside `src` are set to zero.
///
/// * `src` - The input image with shape (height, width, channels).
/// * `dst` - The output image with shape (height, width, channels).
/// * `m` - The 3x3 perspective transformation matrix src -> dst.
/// * `interpolation` - The interpolation mode to use.
///
/// # Example
///
/// ```
/// use kornia_image::{Image, ImageSize};
/// use kornia_imgproc::interpolation::InterpolationMode;
/// use kornia_imgproc::warp::warp_perspective;
///
/// let src = Image::<u8, 1>::new(
///   ImageSize {
///     width: 4,
///     height: 5,
///   },
///   vec![0u8; 4 * 5]
/// ).unwrap();
///
/// let m = [1.0, 0.0, -1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0];
///
/// let mut dst = Image::<u8, 1>::from_size_val(
///   ImageSize {
///     width: 2,
///     height: 3,
///   },
///   0
/// ).unwrap();
///
/// warp_perspective(&src, &mut dst, &m, InterpolationMode::Bilinear).unwrap();
///
/// assert_eq!(dst.size().width, 2);
/// assert_eq!(dst.size().height, 3);
/// ```
pub fn warp_perspective<const C: usize>(
    src: &Image<u8, C>,
    dst: &mut Image<u8, C>,
    m: &[f64; 9],
    interpolation: InterpolationMode,
) -> Result<(), ImageError> {
    let inv_m = inverse_perspective_matrix(m)?;

    if dst.is_empty() {
        return Ok(());
    }

    let dst_cols = dst.cols();

    dst.as_slice_mut()
        .par_chunks_exact_mut(dst_cols * C)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, dst_pixel) in row.chunks_exact_mut(C).enumerate() {
                let (u, v) = transform_point(x as f64, y as f64, &inv_m);
                match interpolate_pixel(src, u as f32, v as f32, interpolation) {
                    Some(pixel) => {
                        for (d, p) in dst_pixel.iter_mut().zip(pixel.iter()) {
                            *d = p.round().clamp(0.0, 255.0) as u8;
                        }
                    }
                    None => dst_pixel.fill(0),
                }
            }
        });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use kornia_image::ImageSize;

    #[test]
    fn perspective_identity_and_translation() -> Result<(), ImageError> {
        let src = [[0.0, 0.0], [5.0, 0.0], [5.0, 4.0], [0.0, 4.0]];
        let m = get_perspective_transform(&src, &src)?;
        let identity = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
        for (a, b) in m.iter().zip(identity.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-9);
        }

        let dst = src.map(|[x, y]| [x + 5.0, y - 3.0]);
        let m = get_perspective_transform(&src, &dst)?;
        let expected = [1.0, 0.0, 5.0, 0.0, 1.0, -3.0, 0.0, 0.0, 1.0];
        for (a, b) in m.iter().zip(expected.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-9);
        }
        Ok(())
    }

    #[test]
    fn perspective_maps_corners() -> Result<(), ImageError> {
        let src = [[12.0, 9.0], [230.0, 31.0], [205.0, 180.0], [20.0, 150.0]];
        let dst = [[12.0, 9.0], [230.0, 9.0], [230.0, 180.0], [12.0, 180.0]];
        let m = get_perspective_transform(&src, &dst)?;
        for (s, d) in src.iter().zip(dst.iter()) {
            let (u, v) = transform_point(s[0], s[1], &m);
            assert_relative_eq!(u, d[0], epsilon = 1e-6);
            assert_relative_eq!(v, d[1], epsilon = 1e-6);
        }

        let inv = inverse_perspective_matrix(&m)?;
        let (x, y) = transform_point(230.0, 180.0, &inv);
        assert_relative_eq!(x, 205.0, epsilon = 1e-6);
        assert_relative_eq!(y, 180.0, epsilon = 1e-6);
        Ok(())
    }

    #[test]
    fn perspective_collinear_points() {
        let src = [[0.0, 0.0], [1.0, 1.0], [2.0, 2.0], [3.0, 3.0]];
        let dst = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        assert_eq!(
            get_perspective_transform(&src, &dst),
            Err(ImageError::CannotComputeDeterminant)
        );
    }

    #[test]
    fn warp_perspective_identity() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 4,
            height: 3,
        };
        let src = Image::<u8, 3>::new(size, (0..36).map(|v| v as u8 * 7).collect())?;
        let mut dst = Image::<u8, 3>::from_size_val(size, 0)?;
        let identity = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
        warp_perspective(&src, &mut dst, &identity, InterpolationMode::Bilinear)?;
        assert_eq!(dst.as_slice(), src.as_slice());
        Ok(())
    }

    #[test]
    fn warp_perspective_shift() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 3,
            height: 2,
        };
        let src = Image::<u8, 1>::new(size, vec![1, 2, 3, 4, 5, 6])?;
        let mut dst = Image::<u8, 1>::from_size_val(size, 0)?;
        let shift = [1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
        warp_perspective(&src, &mut dst, &shift, InterpolationMode::Nearest)?;
        assert_eq!(dst.as_slice(), &[0, 1, 2, 0, 4, 5]);
        Ok(())
    }

    #[test]
    fn warp_singular_matrix() -> Result<(), ImageError> {
        let src = Image::<u8, 1>::from_size_val([2, 2].into(), 0)?;
        let mut dst = src.clone();
        assert_eq!(
            warp_perspective(&src, &mut dst, &[0.0; 9], InterpolationMode::Bilinear),
            Err(ImageError::CannotComputeDeterminant)
        );
        Ok(())
    }
}
