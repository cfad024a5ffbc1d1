use kornia_image::{Image, ImageError, ImageSize};
use rayon::prelude::*;

use super::fast::fast_feature_detector;
use crate::{
    filter::{gaussian_blur, spatial_gradient_sobel},
    interpolation::InterpolationMode,
    resize::resize_fast,
};

/// A 256 bit binary ORB descriptor.
pub type OrbDescriptor = [u8; 32];

/// A keypoint detected in the base image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    /// Horizontal position in pixels.
    pub x: f32,
    /// Vertical position in pixels.
    pub y: f32,
    /// Diameter of the described neighbourhood.
    pub size: f32,
    /// Orientation in degrees, in `[0, 360)`.
    pub angle: f32,
    /// Harris corner response.
    pub response: f32,
    /// Pyramid level the keypoint was detected in.
    pub octave: i32,
    /// Object class, -1 when unused.
    pub class_id: i32,
}

/// Configuration of the ORB detector.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbConfig {
    /// Maximum number of keypoints to retain.
    pub n_features: usize,
    /// Downscaling ratio between two pyramid levels, greater than 1.
    pub scale_factor: f32,
    /// Number of pyramid levels.
    pub n_levels: usize,
    /// Size of the border where no keypoint is detected.
    pub edge_threshold: usize,
    /// Threshold of the FAST segment test.
    pub fast_threshold: u8,
    /// Harris detector free parameter.
    pub harris_k: f32,
    /// Diameter of the patch used for the orientation and the descriptor.
    pub patch_size: usize,
}

impl Default for OrbConfig {
    fn default() -> Self {
        Self {
            n_features: 500,
            scale_factor: 1.2,
            n_levels: 8,
            edge_threshold: 31,
            fast_threshold: 20,
            harris_k: 0.04,
            patch_size: 31,
        }
    }
}

impl OrbConfig {
    /// Set the maximum number of keypoints.
    pub fn with_n_features(mut self, n_features: usize) -> Self {
        self.n_features = n_features;
        self
    }

    /// Set the number of pyramid levels.
    pub fn with_n_levels(mut self, n_levels: usize) -> Self {
        self.n_levels = n_levels;
        self
    }
}

/// Oriented FAST and rotated BRIEF detector and descriptor extractor.
///
/// Keypoints are FAST-9 corners on a scale pyramid, ranked per level by their Harris
/// response, oriented with the intensity centroid and described with the rotated
/// 256 test pattern on a gaussian smoothed image.
///
/// # Example
///
/// ```
/// use kornia_image::Image;
/// use kornia_imgproc::features::{OrbConfig, OrbDetector};
///
/// let image = Image::<u8, 1>::from_size_val([128, 128].into(), 0).unwrap();
/// let orb = OrbDetector::new(OrbConfig::default().with_n_features(300));
///
/// let (keypoints, descriptors) = orb.detect_and_compute(&image).unwrap();
/// assert!(keypoints.is_empty());
/// assert_eq!(keypoints.len(), descriptors.len());
/// ```
#[derive(Debug, Clone, Default)]
pub struct OrbDetector {
    config: OrbConfig,
}

struct Level {
    image: Image<u8, 1>,
    scale: f32,
}

impl OrbDetector {
    /// Create a detector with the given configuration.
    pub fn new(config: OrbConfig) -> Self {
        Self { config }
    }

    /// The detector configuration.
    pub fn config(&self) -> &OrbConfig {
        &self.config
    }

    fn build_pyramid(&self, src: &Image<u8, 1>) -> Result<Vec<Level>, ImageError> {
        let min_side = 2 * self.config.edge_threshold + 1;
        let mut pyramid: Vec<Level> = Vec::with_capacity(self.config.n_levels);

        for level in 0..self.config.n_levels {
            let scale = self.config.scale_factor.powi(level as i32);
            let size = ImageSize {
                width: (src.width() as f32 / scale).round() as usize,
                height: (src.height() as f32 / scale).round() as usize,
            };

            if size.width < min_side || size.height < min_side {
                break;
            }

            let image = match pyramid.last() {
                None => src.clone(),
                Some(previous) => {
                    let mut image = Image::from_size_val(size, 0u8)?;
                    resize_fast(&previous.image, &mut image, InterpolationMode::Bilinear)?;
                    image
                }
            };

            pyramid.push(Level { image, scale });
        }

        Ok(pyramid)
    }

    // geometric distribution of the features over the levels, finer levels get more
    fn features_per_level(&self, n_levels: usize) -> Vec<usize> {
        if n_levels == 0 {
            return Vec::new();
        }

        let factor = 1.0 / self.config.scale_factor as f64;
        let n_features = self.config.n_features;
        let mut desired = n_features as f64 * (1.0 - factor)
            / (1.0 - factor.powi(self.config.n_levels as i32));

        let mut quotas = Vec::with_capacity(n_levels);
        let mut assigned = 0;
        for _ in 0..n_levels - 1 {
            let quota = (desired.round() as usize).min(n_features - assigned);
            quotas.push(quota);
            assigned += quota;
            desired *= factor;
        }
        quotas.push(n_features - assigned);

        quotas
    }

    fn detect_level(&self, level: &Level, quota: usize) -> Result<Vec<Keypoint>, ImageError> {
        let image = &level.image;
        let edge = self.config.edge_threshold as i32;
        let (cols, rows) = (image.cols() as i32, image.rows() as i32);

        let corners: Vec<[i32; 2]> =
            fast_feature_detector(image, self.config.fast_threshold, 9, true)?
                .into_iter()
                .map(|c| c.point)
                .filter(|p| p[0] >= edge && p[1] >= edge && p[0] < cols - edge && p[1] < rows - edge)
                .collect();

        if corners.is_empty() || quota == 0 {
            return Ok(Vec::new());
        }

        let responses = harris_responses(image, &corners, self.config.harris_k)?;

        let mut ranked: Vec<([i32; 2], f32)> = corners.into_iter().zip(responses).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(quota);

        let radius = (self.config.patch_size / 2) as i32;
        let keypoints = ranked
            .into_iter()
            .map(|(p, response)| Keypoint {
                x: p[0] as f32 * level.scale,
                y: p[1] as f32 * level.scale,
                size: self.config.patch_size as f32 * level.scale,
                angle: intensity_centroid_angle(image, p, radius),
                response,
                octave: 0,
                class_id: -1,
            })
            .collect();

        Ok(keypoints)
    }

    /// Detect keypoints and compute their descriptors.
    ///
    /// # Arguments
    ///
    /// * `src` - The grayscale image.
    ///
    /// # Returns
    ///
    /// The keypoints in base image coordinates and their descriptors, index aligned.
    /// Keypoints are ordered by pyramid level, then by decreasing response.
    pub fn detect_and_compute(
        &self,
        src: &Image<u8, 1>,
    ) -> Result<(Vec<Keypoint>, Vec<OrbDescriptor>), ImageError> {
        let pyramid = self.build_pyramid(src)?;
        let quotas = self.features_per_level(pyramid.len());

        let per_level = pyramid
            .par_iter()
            .zip(quotas.par_iter())
            .enumerate()
            .map(|(octave, (level, &quota))| {
                let mut keypoints = self.detect_level(level, quota)?;
                if keypoints.is_empty() {
                    return Ok((keypoints, Vec::new()));
                }

                let mut smoothed = Image::from_size_val(level.image.size(), 0u8)?;
                gaussian_blur(&level.image, &mut smoothed, 7, 2.0)?;

                let descriptors: Vec<OrbDescriptor> = keypoints
                    .iter_mut()
                    .map(|kp| {
                        kp.octave = octave as i32;
                        let p = [
                            (kp.x / level.scale).round() as i32,
                            (kp.y / level.scale).round() as i32,
                        ];
                        rotated_brief(&smoothed, p, kp.angle)
                    })
                    .collect();

                Ok((keypoints, descriptors))
            })
            .collect::<Result<Vec<_>, ImageError>>()?;

        let (keypoints, descriptors): (Vec<_>, Vec<_>) = per_level.into_iter().unzip();
        let keypoints: Vec<Keypoint> = keypoints.into_iter().flatten().collect();
        let descriptors: Vec<OrbDescriptor> = descriptors.into_iter().flatten().collect();

        log::debug!(
            "orb: {} keypoints over {} pyramid levels",
            keypoints.len(),
            pyramid.len()
        );

        Ok((keypoints, descriptors))
    }
}

/// Harris corner response over a 7x7 block around each point.
fn harris_responses(
    image: &Image<u8, 1>,
    points: &[[i32; 2]],
    k: f32,
) -> Result<Vec<f32>, ImageError> {
    const BLOCK_RADIUS: i32 = 3;

    let mut dx = Image::<f32, 1>::from_size_val(image.size(), 0.0)?;
    let mut dy = Image::<f32, 1>::from_size_val(image.size(), 0.0)?;
    spatial_gradient_sobel(image, &mut dx, &mut dy)?;

    // keeps the response independent of the block size and the intensity range
    let norm = 1.0 / (4.0 * (2 * BLOCK_RADIUS + 1) as f32 * 255.0);
    let (cols, rows) = (image.cols() as i32, image.rows() as i32);

    let responses = points
        .iter()
        .map(|&[px, py]| {
            let (mut sxx, mut syy, mut sxy) = (0f32, 0f32, 0f32);
            for y in (py - BLOCK_RADIUS).max(0)..=(py + BLOCK_RADIUS).min(rows - 1) {
                for x in (px - BLOCK_RADIUS).max(0)..=(px + BLOCK_RADIUS).min(cols - 1) {
                    let idx = (y * cols + x) as usize;
                    let gx = dx.as_slice()[idx] * norm;
                    let gy = dy.as_slice()[idx] * norm;
                    sxx += gx * gx;
                    syy += gy * gy;
                    sxy += gx * gy;
                }
            }
            sxx * syy - sxy * sxy - k * (sxx + syy) * (sxx + syy)
        })
        .collect();

    Ok(responses)
}

/// Orientation in degrees of the vector from `p` to the intensity centroid of the
/// disc of the given radius.
fn intensity_centroid_angle(image: &Image<u8, 1>, p: [i32; 2], radius: i32) -> f32 {
    let (cols, rows) = (image.cols() as i32, image.rows() as i32);
    let (mut m01, mut m10) = (0i64, 0i64);

    for dy in -radius..=radius {
        let half_width = ((radius * radius - dy * dy) as f32).sqrt().floor() as i32;
        let y = p[1] + dy;
        if y < 0 || y >= rows {
            continue;
        }
        for dx in -half_width..=half_width {
            let x = p[0] + dx;
            if x < 0 || x >= cols {
                continue;
            }
            let value = image.as_slice()[(y * cols + x) as usize] as i64;
            m10 += dx as i64 * value;
            m01 += dy as i64 * value;
        }
    }

    let angle = (m01 as f32).atan2(m10 as f32).to_degrees();
    let angle = if angle < 0.0 { angle + 360.0 } else { angle };
    if angle >= 360.0 {
        0.0
    } else {
        angle
    }
}

/// Binary intensity tests of the pattern rotated by `angle` degrees around `p`.
fn rotated_brief(smoothed: &Image<u8, 1>, p: [i32; 2], angle: f32) -> OrbDescriptor {
    let (sin_a, cos_a) = angle.to_radians().sin_cos();
    let (cols, rows) = (smoothed.cols() as i32, smoothed.rows() as i32);

    let sample = |offset: [i8; 2]| -> u8 {
        let (ox, oy) = (offset[0] as f32, offset[1] as f32);
        let x = p[0] + (ox * cos_a - oy * sin_a).round() as i32;
        let y = p[1] + (ox * sin_a + oy * cos_a).round() as i32;
        if x < 0 || y < 0 || x >= cols || y >= rows {
            0
        } else {
            smoothed.as_slice()[(y * cols + x) as usize]
        }
    };

    let mut descriptor = [0u8; 32];
    for (bit, (&a, &b)) in POS0.iter().zip(POS1.iter()).enumerate() {
        if sample(a) < sample(b) {
            descriptor[bit / 8] |= 1 << (bit % 8);
        }
    }

    descriptor
}

// test pairs of the 31x31 steered BRIEF pattern as [x, y] offsets
const POS0: [[i8; 2]; 256] = [
    [8, -3],
    [4, 2],
    [-11, 9],
    [7, -12],
    [2, -13],
    [1, -7],
    [-2, -10],
    [-13, -13],
    [-13, -3],
    [10, 4],
    [-13, -8],
    [-11, 7],
    [7, 7],
    [-4, -5],
    [-13, 2],
    [-9, 0],
    [12, -6],
    [-3, 6],
    [-6, -13],
    [11, -13],
    [4, 7],
    [5, -3],
    [3, -7],
    [-8, -7],
    [-2, 11],
    [-13, 12],
    [-7, 3],
    [-4, 2],
    [-10, -12],
    [5, -12],
    [5, -6],
    [1, 0],
    [9, 11],
    [4, 7],
    [2, -1],
    [-4, -12],
    [-8, -5],
    [4, 11],
    [0, -8],
    [-13, -2],
    [-3, -2],
    [-6, 9],
    [8, 12],
    [0, 9],
    [7, -5],
    [-13, -6],
    [10, 7],
    [-6, -3],
    [10, -9],
    [-13, 8],
    [-13, 0],
    [3, 3],
    [5, 7],
    [-1, 7],
    [3, -10],
    [2, -4],
    [-13, 0],
    [-13, -7],
    [-13, 3],
    [-7, 12],
    [6, -10],
    [-9, -1],
    [-2, -5],
    [-12, 5],
    [3, -10],
    [-7, -7],
    [-3, -2],
    [2, 9],
    [-11, -13],
    [-1, 6],
    [5, -3],
    [-4, -13],
    [-9, -6],
    [-12, -10],
    [10, 2],
    [7, 12],
    [-7, -13],
    [-4, 9],
    [7, -1],
    [-7, 6],
    [-13, 11],
    [-3, 7],
    [7, -8],
    [-13, -7],
    [1, -3],
    [2, -6],
    [-4, 3],
    [-1, -13],
    [7, 1],
    [1, -1],
    [9, 1],
    [-1, -9],
    [-13, -13],
    [7, 7],
    [12, -5],
    [6, 3],
    [5, -13],
    [2, -12],
    [3, 8],
    [2, 6],
    [9, -12],
    [-8, 4],
    [-11, 12],
    [1, 12],
    [6, -9],
    [2, 3],
    [6, 3],
    [3, -3],
    [7, 8],
    [-11, -5],
    [-10, 11],
    [-5, -8],
    [-10, 5],
    [8, -1],
    [4, -6],
    [-10, 12],
    [4, -2],
    [-2, 0],
    [-5, -8],
    [7, -6],
    [-9, -13],
    [-5, -13],
    [8, -8],
    [-9, -11],
    [1, -8],
    [7, -4],
    [-2, 1],
    [11, -6],
    [-12, -9],
    [3, 7],
    [5, 5],
    [0, -4],
    [-9, 12],
    [0, 7],
    [-1, 2],
    [5, 11],
    [3, 5],
    [-13, -4],
    [-5, 9],
    [-4, -7],
    [6, 5],
    [-7, 6],
    [-13, 6],
    [1, -10],
    [4, 1],
    [-2, -2],
    [2, -12],
    [-2, -13],
    [4, 1],
    [-6, -10],
    [-3, -13],
    [7, 5],
    [4, -2],
    [-13, 9],
    [7, 1],
    [7, -8],
    [-7, -4],
    [-8, 11],
    [-13, 6],
    [2, 4],
    [10, -5],
    [-6, -5],
    [8, -3],
    [2, -12],
    [-11, -2],
    [-12, -13],
    [-11, 0],
    [5, -3],
    [-2, -13],
    [-1, -8],
    [-13, -11],
    [-10, -2],
    [-3, 9],
    [2, -3],
    [-9, -13],
    [-4, 6],
    [-4, 12],
    [-6, -11],
    [6, -3],
    [-13, 11],
    [11, 11],
    [7, -5],
    [-1, 12],
    [-4, -8],
    [-7, 1],
    [-13, -12],
    [-7, -2],
    [-8, 5],
    [-5, -1],
    [-13, 7],
    [1, 5],
    [1, 0],
    [9, 12],
    [5, -8],
    [-1, 11],
    [-9, -3],
    [-1, -10],
    [-13, 1],
    [8, -11],
    [2, -13],
    [7, -13],
    [-10, -10],
    [-10, -8],
    [4, -6],
    [3, 12],
    [-4, 2],
    [5, -13],
    [4, -13],
    [-9, 9],
    [0, 3],
    [-12, 1],
    [3, 2],
    [-10, -10],
    [8, -13],
    [-8, -12],
    [2, 2],
    [10, 6],
    [6, 8],
    [-7, 10],
    [-3, -9],
    [-1, -13],
    [-3, -7],
    [-8, -2],
    [4, 2],
    [2, -5],
    [6, -9],
    [3, -1],
    [11, -1],
    [-3, 0],
    [4, -11],
    [2, -4],
    [-10, -6],
    [-13, 7],
    [-13, 12],
    [6, 0],
    [0, -1],
    [-13, 3],
    [-9, 8],
    [-13, -6],
    [5, -9],
    [2, 7],
    [-1, -6],
    [9, 5],
    [11, -3],
    [3, 0],
    [-1, 4],
    [3, -6],
    [-13, 0],
    [5, 8],
    [8, 9],
    [7, -4],
    [-10, 4],
    [7, 3],
    [9, -7],
    [7, 0],
    [-1, -6],
];

const POS1: [[i8; 2]; 256] = [
    [9, 5],
    [7, -12],
    [-8, 2],
    [12, -13],
    [2, 12],
    [1, 6],
    [-2, -4],
    [-11, -8],
    [-12, -9],
    [11, 9],
    [-8, -9],
    [-9, 12],
    [12, 6],
    [-3, 0],
    [-12, -3],
    [-7, 5],
    [12, -1],
    [-2, 12],
    [-4, -8],
    [12, -8],
    [5, 1],
    [10, -3],
    [6, 12],
    [-6, -2],
    [-1, -10],
    [-8, 10],
    [-5, -3],
    [-3, 7],
    [-6, 11],
    [6, -7],
    [7, -1],
    [4, -5],
    [11, -13],
    [4, 12],
    [4, 4],
    [-2, 7],
    [-7, -10],
    [9, 12],
    [1, -13],
    [-8, 2],
    [-2, 3],
    [-4, -9],
    [10, 7],
    [1, 3],
    [11, -10],
    [-11, 0],
    [12, 1],
    [-6, 12],
    [12, -4],
    [-8, -12],
    [-8, -4],
    [7, 8],
    [10, -7],
    [1, -12],
    [5, 6],
    [3, -10],
    [-13, 5],
    [-12, 12],
    [-11, 8],
    [-4, 7],
    [12, 8],
    [-7, -6],
    [0, 12],
    [-7, 5],
    [8, -13],
    [-4, 5],
    [-1, -7],
    [5, -11],
    [-5, -13],
    [0, -1],
    [5, 2],
    [-4, 12],
    [-9, 6],
    [-8, -4],
    [12, -3],
    [12, 12],
    [-6, 5],
    [-3, 4],
    [12, 2],
    [-5, 1],
    [-12, 5],
    [-2, -6],
    [12, -7],
    [-11, -12],
    [12, 12],
    [3, 0],
    [-2, -13],
    [1, 9],
    [8, -6],
    [3, 12],
    [12, 6],
    [-1, 3],
    [-10, 5],
    [10, 12],
    [12, 9],
    [7, 11],
    [6, 10],
    [2, 3],
    [4, -6],
    [12, -13],
    [10, 3],
    [-7, 9],
    [-4, -6],
    [2, -8],
    [7, -4],
    [3, -2],
    [11, 0],
    [8, -8],
    [9, 3],
    [-6, -4],
    [-5, 10],
    [-3, 12],
    [-9, 0],
    [12, -6],
    [6, -11],
    [-8, 7],
    [6, 7],
    [-2, 12],
    [-5, 2],
    [10, 12],
    [-8, -8],
    [-5, -2],
    [9, -13],
    [-9, 0],
    [1, -2],
    [9, 1],
    [-1, -4],
    [12, -11],
    [-6, 4],
    [7, 12],
    [10, 8],
    [2, 8],
    [-5, -13],
    [2, 12],
    [1, 7],
    [7, -9],
    [6, -8],
    [-8, 9],
    [-3, -3],
    [-3, -12],
    [8, 0],
    [-6, 12],
    [-5, -2],
    [3, 10],
    [8, -4],
    [2, -13],
    [12, 12],
    [0, -6],
    [9, 3],
    [-3, -5],
    [-1, 1],
    [12, -11],
    [5, -7],
    [-9, -5],
    [8, 6],
    [7, 6],
    [-7, 1],
    [-7, -8],
    [-12, -8],
    [3, 9],
    [12, 3],
    [-6, 7],
    [9, -8],
    [2, 8],
    [-10, 3],
    [-7, -9],
    [-10, -5],
    [11, 8],
    [-1, 12],
    [0, 9],
    [-12, -5],
    [-10, 11],
    [-2, -13],
    [3, 2],
    [-4, 0],
    [-3, -10],
    [-2, -7],
    [-4, 9],
    [6, 11],
    [-5, 5],
    [12, 6],
    [12, -2],
    [0, 7],
    [-3, -2],
    [-6, 7],
    [-8, -13],
    [-6, -8],
    [-6, -9],
    [-4, 5],
    [-8, 10],
    [5, -13],
    [10, -13],
    [10, -1],
    [10, -9],
    [1, -13],
    [-6, 2],
    [1, 12],
    [-8, -10],
    [10, -6],
    [3, -6],
    [12, -9],
    [-5, -7],
    [-8, -13],
    [8, 5],
    [8, -13],
    [-3, -3],
    [10, -12],
    [5, -1],
    [-4, 3],
    [3, -9],
    [-6, 1],
    [4, -8],
    [-10, 9],
    [12, 12],
    [-6, -5],
    [3, 7],
    [11, -8],
    [8, -12],
    [-6, 5],
    [-3, 9],
    [-1, 5],
    [-3, 4],
    [-8, 3],
    [12, 12],
    [3, 11],
    [11, -13],
    [7, 12],
    [12, 4],
    [-3, 6],
    [4, 12],
    [2, 1],
    [-8, 1],
    [-11, 1],
    [-11, -13],
    [11, -13],
    [1, 4],
    [-9, -2],
    [-6, -3],
    [-8, -2],
    [8, 10],
    [3, -9],
    [-1, -1],
    [11, -2],
    [12, -8],
    [3, 5],
    [0, 10],
    [4, 5],
    [-10, 5],
    [12, 11],
    [9, -6],
    [8, -12],
    [-10, 9],
    [12, 4],
    [10, -2],
    [12, -2],
    [0, -11],
];
