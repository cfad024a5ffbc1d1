use kornia_image::Image;
use kornia_imgproc::{
    color::gray_from_rgb_u8,
    contours::{find_contours, ContourApproximation, RetrievalMode},
    draw::draw_polygon,
    edges::canny,
    filter::gaussian_blur,
    geometry::{approx_poly_dp, convex_hull, polygon_area},
    morphology::{dilate, Kernel, KernelShape},
    resize::resize_to_width,
    threshold::otsu_threshold_value,
};

use crate::config::DetectorConfig;
use crate::error::PaintingError;
use crate::geometry::{order_points, Point2, Polygon4};

/// Finds quadrilateral painting frames in a photo.
///
/// The photo is resized to the working width, its edges are extracted and closed
/// with a small dilation, and the outer contours whose convex simplification is a
/// quadrilateral with a high enough solidity are kept.
#[derive(Debug, Clone, Default)]
pub struct FrameDetector {
    config: DetectorConfig,
}

impl FrameDetector {
    /// Create a detector.
    pub fn new(config: DetectorConfig) -> Result<Self, PaintingError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The detector parameters.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Binary edge map of a grayscale image, 255 on the dilated edges.
    ///
    /// The image is blurred, the Otsu threshold of the blurred image sets the Canny
    /// thresholds and the edges are dilated horizontally then vertically.
    pub fn edge_map(&self, gray: &Image<u8, 1>) -> Result<Image<u8, 1>, PaintingError> {
        let mut blurred = Image::from_size_val(gray.size(), 0u8)?;
        gaussian_blur(
            gray,
            &mut blurred,
            self.config.blur_kernel_size,
            self.config.blur_sigma,
        )?;

        let high = otsu_threshold_value(&blurred) as f32;
        let low = self.config.canny_low_ratio * high;

        let mut edges = Image::from_size_val(gray.size(), 0u8)?;
        canny(&blurred, &mut edges, low, high, true)?;

        let horizontal = Kernel::new(KernelShape::Rect {
            width: 3,
            height: 1,
        })?;
        let vertical = Kernel::new(KernelShape::Rect {
            width: 1,
            height: 3,
        })?;

        let mut dilated = Image::from_size_val(gray.size(), 0u8)?;
        dilate(&edges, &mut dilated, &horizontal)?;
        dilate(&dilated, &mut edges, &vertical)?;

        Ok(edges)
    }

    /// Detect the painting frames in an RGB photo.
    ///
    /// # Returns
    ///
    /// The frames in the coordinates of the resized image, in canonical corner
    /// order, and a copy of the resized image with the frames drawn on it. Use
    /// [`crate::geometry::rescale_polygons`] with the size of the annotated image to
    /// map the frames back to the photo.
    ///
    /// # Errors
    ///
    /// [`PaintingError::InvalidInput`] when the photo is empty.
    pub fn detect(
        &self,
        image: &Image<u8, 3>,
    ) -> Result<(Vec<Polygon4>, Image<u8, 3>), PaintingError> {
        if image.is_empty() {
            return Err(PaintingError::InvalidInput(
                "cannot detect frames in an empty image".to_string(),
            ));
        }

        let resized = resize_to_width(image, self.config.working_width)?;

        let mut gray = Image::from_size_val(resized.size(), 0u8)?;
        gray_from_rgb_u8(&resized, &mut gray)?;

        let edges = self.edge_map(&gray)?;
        let contours = find_contours(
            &edges,
            RetrievalMode::External,
            ContourApproximation::Simple,
        )?;

        let mut candidates: Vec<(f64, Vec<[i32; 2]>)> = contours
            .into_iter()
            .map(|c| (polygon_area(&c.points), c.points))
            .collect();
        candidates.sort_by(|a, b| b.0.total_cmp(&a.0));
        candidates.truncate(self.config.max_contours);

        let polygons: Vec<Polygon4> = candidates
            .iter()
            .filter_map(|(area, points)| self.quadrilateral(*area, points))
            .collect();

        log::debug!(
            "examined {} of the largest contours, accepted {} frames",
            candidates.len(),
            polygons.len()
        );

        let mut annotated = resized;
        for polygon in polygons.iter() {
            draw_polygon(
                &mut annotated,
                &polygon.to_array(),
                self.config.annotation_color,
                self.config.annotation_thickness,
            );
        }

        Ok((polygons, annotated))
    }

    fn quadrilateral(&self, area: f64, points: &[[i32; 2]]) -> Option<Polygon4> {
        let hull = convex_hull(points);
        let hull_area = polygon_area(&hull);
        if hull_area == 0.0 {
            return None;
        }

        let solidity = area / hull_area;
        let approx = approx_poly_dp(&hull, self.config.approx_epsilon, true);
        if approx.len() != 4 || solidity <= self.config.min_solidity {
            return None;
        }

        let corners = [approx[0], approx[1], approx[2], approx[3]].map(Point2::from);
        Some(order_points(&corners))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // a dark canvas with the pixels selected by `inside` painted bright
    fn fill(
        size: [usize; 2],
        inside: impl Fn(usize, usize) -> bool,
    ) -> Result<Image<u8, 3>, PaintingError> {
        let [width, height] = size;
        let mut image = Image::<u8, 3>::from_size_val([width, height].into(), 20)?;
        for y in 0..height {
            for x in 0..width {
                if inside(x, y) {
                    for c in 0..3 {
                        image.set_pixel(x, y, c, 220)?;
                    }
                }
            }
        }
        Ok(image)
    }

    fn scene(size: [usize; 2], rect: [usize; 4]) -> Result<Image<u8, 3>, PaintingError> {
        let [x0, y0, x1, y1] = rect;
        fill(size, |x, y| (x0..x1).contains(&x) && (y0..y1).contains(&y))
    }

    fn assert_corners(polygon: &Polygon4, expected: [[i32; 2]; 4], tolerance: i32) {
        for (p, e) in polygon.to_array().iter().zip(expected) {
            assert!((p[0] - e[0]).abs() <= tolerance, "{p:?} vs {e:?}");
            assert!((p[1] - e[1]).abs() <= tolerance, "{p:?} vs {e:?}");
        }
    }

    #[test]
    fn single_rectangle() -> Result<(), PaintingError> {
        let image = scene([500, 400], [100, 80, 400, 320])?;

        let detector = FrameDetector::default();
        let (polygons, annotated) = detector.detect(&image)?;

        assert_eq!(annotated.size(), image.size());
        assert_eq!(polygons.len(), 1);

        assert_corners(
            &polygons[0],
            [[100, 80], [399, 80], [399, 319], [100, 319]],
            5,
        );

        // the outline is drawn in the annotation color
        let tl = polygons[0].top_left();
        let offset = annotated.pixel_offset(tl.x as usize, tl.y as usize);
        assert_eq!(&annotated.as_slice()[offset..offset + 3], &[0, 255, 0]);
        Ok(())
    }

    #[test]
    fn bowed_left_edge() -> Result<(), PaintingError> {
        // the left edge bulges out by up to 4 pixels at mid height
        let bulge = |y: usize| {
            let t = (y as f64 - 200.0) / 120.0;
            (4.0 * (1.0 - t * t)).round() as usize
        };
        let image = fill([500, 400], |x, y| {
            (80..320).contains(&y) && x >= 100 - bulge(y) && x < 400
        })?;

        let (polygons, _) = FrameDetector::default().detect(&image)?;
        assert_eq!(polygons.len(), 1);
        assert_corners(
            &polygons[0],
            [[100, 80], [399, 80], [399, 319], [100, 319]],
            6,
        );
        Ok(())
    }

    #[test]
    fn perspective_quadrilateral() -> Result<(), PaintingError> {
        let corners: [[i64; 2]; 4] = [[120, 60], [390, 90], [420, 330], [80, 300]];
        let image = fill([500, 400], |x, y| {
            let (x, y) = (x as i64, y as i64);
            (0..4).all(|i| {
                let [ax, ay] = corners[i];
                let [bx, by] = corners[(i + 1) % 4];
                (bx - ax) * (y - ay) - (by - ay) * (x - ax) >= 0
            })
        })?;

        let (polygons, _) = FrameDetector::default().detect(&image)?;
        assert_eq!(polygons.len(), 1);
        assert_corners(
            &polygons[0],
            [[120, 60], [390, 90], [420, 330], [80, 300]],
            6,
        );
        Ok(())
    }

    #[test]
    fn blank_image() -> Result<(), PaintingError> {
        let image = Image::<u8, 3>::from_size_val([640, 480].into(), 128)?;
        let (polygons, annotated) = FrameDetector::default().detect(&image)?;
        assert!(polygons.is_empty());
        assert_eq!(annotated.width(), 500);
        assert_eq!(annotated.height(), 375);
        Ok(())
    }

    #[test]
    fn triangle_is_rejected() -> Result<(), PaintingError> {
        // a triangle has a 3 vertex approximation
        let mut image = Image::<u8, 3>::from_size_val([500, 400].into(), 20)?;
        for y in 50..350usize {
            for x in 100..(100 + (y - 50)) {
                for c in 0..3 {
                    image.set_pixel(x, y, c, 220)?;
                }
            }
        }
        let (polygons, _) = FrameDetector::default().detect(&image)?;
        assert!(polygons.is_empty());
        Ok(())
    }

    #[test]
    fn empty_input() {
        let res = FrameDetector::default().detect(&Image::empty());
        assert!(matches!(res, Err(PaintingError::InvalidInput(_))));
    }

    #[test]
    fn invalid_config() {
        let config = DetectorConfig::default().with_max_contours(0);
        assert!(FrameDetector::new(config).is_err());
    }
}
