use super::kernels::Kernel;
use kornia_image::{Image, ImageError};
use rayon::prelude::*;

/// Dilate an image using a [`Kernel`].
///
/// Each pixel is replaced by the maximum value in the neighborhood defined by the
/// kernel. Neighbors outside the image do not contribute.
///
/// # Arguments
///
/// * `src` - The source image.
/// * `dst` - The destination image (will be overwritten).
/// * `kernel` - The morphological structuring element ([`Kernel`]).
pub fn dilate<const C: usize>(
    src: &Image<u8, C>,
    dst: &mut Image<u8, C>,
    kernel: &Kernel,
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.width(),
            src.height(),
            dst.width(),
            dst.height(),
        ));
    }

    if src.is_empty() {
        return Ok(());
    }

    let (width, height) = (src.width() as isize, src.height() as isize);
    let (pad_h, pad_w) = kernel.pad();
    let (pad_h, pad_w) = (pad_h as isize, pad_w as isize);
    let offsets: Vec<(isize, isize)> = kernel
        .data()
        .iter()
        .enumerate()
        .filter(|(_, v)| **v != 0)
        .map(|(i, _)| {
            let ky = (i / kernel.width()) as isize;
            let kx = (i % kernel.width()) as isize;
            (kx - pad_w, ky - pad_h)
        })
        .collect();

    let src_data = src.as_slice();

    dst.as_slice_mut()
        .par_chunks_exact_mut(width as usize * C)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as isize;
            for x in 0..width {
                let mut value = [0u8; C];
                for &(ox, oy) in offsets.iter() {
                    let (sx, sy) = (x + ox, y + oy);
                    if sx < 0 || sy < 0 || sx >= width || sy >= height {
                        continue;
                    }
                    let base = (sy * width + sx) as usize * C;
                    for (c, v) in value.iter_mut().enumerate() {
                        *v = (*v).max(src_data[base + c]);
                    }
                }
                row[x as usize * C..(x as usize + 1) * C].copy_from_slice(&value);
            }
        });

    Ok(())
}
