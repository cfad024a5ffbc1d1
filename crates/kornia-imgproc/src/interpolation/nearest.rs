use kornia_image::Image;

/// Kernel for nearest neighbor interpolation
pub(crate) fn nearest_neighbor_interpolation<const C: usize>(
    image: &Image<u8, C>,
    u: f32,
    v: f32,
) -> [f32; C] {
    let iu = (u.round() as usize).min(image.cols() - 1);
    let iv = (v.round() as usize).min(image.rows() - 1);

    let offset = image.pixel_offset(iu, iv);
    let mut pixel = [0.0; C];
    for (k, p) in pixel.iter_mut().enumerate() {
        *p = image.as_slice()[offset + k] as f32;
    }
    pixel
}
