use kornia_image::Image;

/// Kernel for bilinear interpolation
///
/// # Arguments
///
/// * `image` - The input image container.
/// * `u` - The x coordinate of the pixel to interpolate, in `[0, cols - 1]`.
/// * `v` - The y coordinate of the pixel to interpolate, in `[0, rows - 1]`.
///
/// # Returns
///
/// The interpolated pixel values.
pub(crate) fn bilinear_interpolation<const C: usize>(
    image: &Image<u8, C>,
    u: f32,
    v: f32,
) -> [f32; C] {
    let (rows, cols) = (image.rows(), image.cols());

    let iu0 = (u.trunc() as usize).min(cols - 1);
    let iv0 = (v.trunc() as usize).min(rows - 1);
    let iu1 = if iu0 + 1 < cols { iu0 + 1 } else { iu0 };
    let iv1 = if iv0 + 1 < rows { iv0 + 1 } else { iv0 };

    let frac_u = u.fract();
    let frac_v = v.fract();

    let w00 = (1.0 - frac_u) * (1.0 - frac_v);
    let w01 = frac_u * (1.0 - frac_v);
    let w10 = (1.0 - frac_u) * frac_v;
    let w11 = frac_u * frac_v;

    let data = image.as_slice();
    let p00 = &data[image.pixel_offset(iu0, iv0)..][..C];
    let p01 = &data[image.pixel_offset(iu1, iv0)..][..C];
    let p10 = &data[image.pixel_offset(iu0, iv1)..][..C];
    let p11 = &data[image.pixel_offset(iu1, iv1)..][..C];

    let mut pixel = [0.0; C];
    for k in 0..C {
        pixel[k] = p00[k] as f32 * w00
            + p01[k] as f32 * w01
            + p10[k] as f32 * w10
            + p11[k] as f32 * w11;
    }

    pixel
}
