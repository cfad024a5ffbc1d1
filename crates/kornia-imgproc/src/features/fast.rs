use kornia_image::{Image, ImageError};
use rayon::prelude::*;

/// A corner found by the FAST detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FastCorner {
    /// Corner position as `[x, y]`.
    pub point: [i32; 2],
    /// Sum of the absolute differences above the threshold along the winning arc.
    pub score: i32,
}

// Bresenham circle of radius 3, clockwise from the top.
fn circle_offsets(cols: i32) -> [i32; 16] {
    [
        -3 * cols,     // 1
        -3 * cols + 1, // 2
        -2 * cols + 2, // 3
        -cols + 3,     // 4
        3,             // 5
        cols + 3,      // 6
        2 * cols + 2,  // 7
        3 * cols + 1,  // 8
        3 * cols,      // 9
        3 * cols - 1,  // 10
        2 * cols - 2,  // 11
        cols - 3,      // 12
        -3,            // 13
        -cols - 3,     // 14
        -2 * cols - 2, // 15
        -3 * cols - 1, // 16
    ]
}

/// Segment test on a single pixel.
///
/// Returns the corner score when `arc_length` contiguous circle pixels are all
/// brighter than `center + threshold` or all darker than `center - threshold`.
fn fast_corner_score(
    src: &[u8],
    pixel_idx: usize,
    offsets: &[i32; 16],
    threshold: u8,
    arc_length: u8,
) -> Option<i32> {
    let center = src[pixel_idx];
    let lower = center.saturating_sub(threshold);
    let upper = center.saturating_add(threshold);

    let at = |i: usize| src[(pixel_idx as i64 + offsets[i] as i64) as usize];

    // any arc covers at least arc_length / 4 of the compass points
    let required = (arc_length / 4) as usize;
    let compass = [at(0), at(4), at(8), at(12)];
    let brighter = compass.iter().filter(|&&p| p > upper).count();
    let darker = compass.iter().filter(|&&p| p < lower).count();
    if brighter < required && darker < required {
        return None;
    }

    let mut pixels = [0u8; 16];
    let mut bright_mask = 0u16;
    let mut dark_mask = 0u16;
    for (i, pixel) in pixels.iter_mut().enumerate() {
        *pixel = at(i);
        if *pixel > upper {
            bright_mask |= 1 << i;
        } else if *pixel < lower {
            dark_mask |= 1 << i;
        }
    }

    let window = ((1u32 << arc_length) - 1) as u16;
    let start = (0..16u32).find(|&shift| {
        let w = window.rotate_left(shift);
        bright_mask & w == w || dark_mask & w == w
    })?;

    let score = (start..start + arc_length as u32)
        .map(|i| (center.abs_diff(pixels[(i % 16) as usize]) - threshold) as i32)
        .sum();

    Some(score)
}

/// FAST corner detector.
///
/// # Arguments
///
/// * `src` - The source grayscale image.
/// * `threshold` - The intensity difference a circle pixel needs to count as brighter or darker.
/// * `arc_length` - The number of contiguous circle pixels required, between 1 and 16.
/// * `nms` - Keep only corners whose score is maximal in their 3x3 neighbourhood.
///
/// # Returns
///
/// The corners in raster order. Pixels closer than 3 to the image border are never corners.
///
/// # Example
///
/// ```
/// use kornia_image::Image;
/// use kornia_imgproc::features::fast_feature_detector;
///
/// let mut image = Image::<u8, 1>::from_size_val([16, 16].into(), 0).unwrap();
/// for y in 8..16 {
///     for x in 8..16 {
///         image.set_pixel(x, y, 0, 255).unwrap();
///     }
/// }
///
/// let corners = fast_feature_detector(&image, 20, 9, true).unwrap();
/// assert_eq!(corners.len(), 1);
/// assert_eq!(corners[0].point, [8, 8]);
/// ```
pub fn fast_feature_detector(
    src: &Image<u8, 1>,
    threshold: u8,
    arc_length: u8,
    nms: bool,
) -> Result<Vec<FastCorner>, ImageError> {
    if arc_length == 0 || arc_length > 16 {
        return Err(ImageError::InvalidKernelLength(arc_length as usize));
    }

    let (cols, rows) = (src.cols(), src.rows());
    if cols < 7 || rows < 7 {
        return Ok(Vec::new());
    }

    let offsets = circle_offsets(cols as i32);
    let data = src.as_slice();

    let scores: Vec<i32> = (0..rows)
        .into_par_iter()
        .flat_map_iter(|y| {
            (0..cols).map(move |x| {
                if y < 3 || y >= rows - 3 || x < 3 || x >= cols - 3 {
                    return 0;
                }
                fast_corner_score(data, y * cols + x, &offsets, threshold, arc_length)
                    // a zero score still marks a corner
                    .map_or(0, |s| s + 1)
            })
        })
        .collect();

    let corners = (3..rows - 3)
        .into_par_iter()
        .flat_map_iter(|y| {
            let scores = &scores;
            (3..cols - 3).filter_map(move |x| {
                let score = scores[y * cols + x];
                if score == 0 {
                    return None;
                }

                if nms {
                    // ties go to the first pixel in raster order
                    for dy in -1..=1isize {
                        for dx in -1..=1isize {
                            if dx == 0 && dy == 0 {
                                continue;
                            }
                            let n = ((y as isize + dy) as usize) * cols + (x as isize + dx) as usize;
                            let before = dy < 0 || (dy == 0 && dx < 0);
                            if scores[n] > score || (before && scores[n] == score) {
                                return None;
                            }
                        }
                    }
                }

                Some(FastCorner {
                    point: [x as i32, y as i32],
                    score: score - 1,
                })
            })
        })
        .collect();

    Ok(corners)
}
