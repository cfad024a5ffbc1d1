use kornia_image::Image;

/// Set a pixel's color, ignoring coordinates outside the image.
#[inline]
fn set_pixel<const C: usize>(img: &mut Image<u8, C>, x: i64, y: i64, color: [u8; C]) {
    if x < 0 || y < 0 || x >= img.cols() as i64 || y >= img.rows() as i64 {
        return;
    }
    let offset = img.pixel_offset(x as usize, y as usize);
    img.as_slice_mut()[offset..offset + C].copy_from_slice(&color);
}

/// Draws a line on an image inplace using Bresenham's line algorithm.
///
/// Thick lines are drawn by stamping a `thickness` x `thickness` square at every
/// point of the line. Parts of the line outside the image are clipped.
///
/// # Arguments
///
/// * `img` - The image to draw on.
/// * `p0` - The start point of the line as `[x, y]`.
/// * `p1` - The end point of the line as `[x, y]`.
/// * `color` - The color of the line as an array of `C` elements.
/// * `thickness` - The thickness of the line in pixels.
///
/// # Example
///
/// ```
/// use kornia_image::Image;
/// use kornia_imgproc::draw::draw_line;
///
/// let mut img = Image::<u8, 1>::from_size_val([5, 5].into(), 0).unwrap();
/// draw_line(&mut img, [0, 2], [4, 2], [255], 1);
/// assert_eq!(&img.as_slice()[10..15], &[255; 5]);
/// ```
pub fn draw_line<const C: usize>(
    img: &mut Image<u8, C>,
    p0: [i32; 2],
    p1: [i32; 2],
    color: [u8; C],
    thickness: usize,
) {
    let (mut x0, mut y0) = (p0[0] as i64, p0[1] as i64);
    let (x1, y1) = (p1[0] as i64, p1[1] as i64);

    let dx = (x1 - x0).abs();
    let dy = (y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx - dy;

    let thickness = thickness.max(1) as i64;
    let (lo, hi) = (-(thickness - 1) / 2, thickness / 2);

    loop {
        for oy in lo..=hi {
            for ox in lo..=hi {
                set_pixel(img, x0 + ox, y0 + oy, color);
            }
        }

        if x0 == x1 && y0 == y1 {
            break;
        }

        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x0 += sx;
        }
        if e2 < dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// Draws the outline of a closed polygon on an image inplace.
///
/// # Arguments
///
/// * `img` - The image to draw on.
/// * `points` - The polygon vertices as `[x, y]`, the last one connects to the first.
/// * `color` - The color of the outline.
/// * `thickness` - The thickness of the outline in pixels.
pub fn draw_polygon<const C: usize>(
    img: &mut Image<u8, C>,
    points: &[[i32; 2]],
    color: [u8; C],
    thickness: usize,
) {
    let n = points.len();
    for i in 0..n {
        draw_line(img, points[i], points[(i + 1) % n], color, thickness);
    }
}
