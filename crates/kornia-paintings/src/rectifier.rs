use kornia_image::{Image, ImageError};
use kornia_imgproc::{
    crop::crop_image,
    interpolation::InterpolationMode,
    warp::{get_perspective_transform, warp_perspective},
};

use crate::error::PaintingError;
use crate::geometry::Polygon4;

/// Axis-aligned bounds `[min_x, min_y, max_x, max_y]` a frame is rectified onto.
///
/// The left edge comes from the left corners, the right edge from the right
/// corners and so on, so the rectangle spans the outermost corner on each side.
pub fn rectification_bounds(polygon: &Polygon4) -> [i32; 4] {
    let (tl, tr, br, bl) = (
        polygon.top_left(),
        polygon.top_right(),
        polygon.bottom_right(),
        polygon.bottom_left(),
    );
    [
        tl.x.min(bl.x),
        tl.y.min(tr.y),
        tr.x.max(br.x),
        br.y.max(bl.y),
    ]
}

/// Maps a detected frame onto an upright rectangle and crops it.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameRectifier {
    interpolation: InterpolationMode,
}

impl FrameRectifier {
    /// Create a rectifier with bilinear sampling.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sampling mode of the warp.
    pub fn with_interpolation(mut self, interpolation: InterpolationMode) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Rectify a frame of the original photo.
    ///
    /// The perspective transform mapping the four corners onto the corners of
    /// [`rectification_bounds`] is applied to the whole photo, then the bounds are
    /// cropped. The bounds are clamped to the photo and the right and bottom edges
    /// are exclusive.
    ///
    /// # Arguments
    ///
    /// * `polygon` - The frame, in the coordinates of `image`.
    /// * `image` - The original photo.
    ///
    /// # Returns
    ///
    /// The warped photo, with the size of `image`, and the crop. A frame with zero
    /// width or height yields the unwarped photo and an empty crop.
    ///
    /// # Errors
    ///
    /// [`PaintingError::DegenerateTransform`] when the corners do not define a
    /// perspective transform, e.g. three of them are collinear.
    pub fn rectify(
        &self,
        polygon: &Polygon4,
        image: &Image<u8, 3>,
    ) -> Result<(Image<u8, 3>, Image<u8, 3>), PaintingError> {
        let [min_x, min_y, max_x, max_y] = rectification_bounds(polygon);
        if max_x <= min_x || max_y <= min_y {
            log::warn!("frame {:?} has an empty bounding box", polygon.to_array());
            return Ok((image.clone(), Image::empty()));
        }

        let src = polygon.points().map(|p| [p.x as f64, p.y as f64]);
        let (x0, y0, x1, y1) = (min_x as f64, min_y as f64, max_x as f64, max_y as f64);
        let dst = [[x0, y0], [x1, y0], [x1, y1], [x0, y1]];

        let m = get_perspective_transform(&src, &dst).map_err(|e| match e {
            ImageError::CannotComputeDeterminant => {
                PaintingError::DegenerateTransform(polygon.to_array())
            }
            e => e.into(),
        })?;

        let mut warped = Image::from_size_val(image.size(), 0u8)?;
        warp_perspective(image, &mut warped, &m, self.interpolation)?;

        let clamp_x = |v: i32| v.clamp(0, image.width() as i32) as usize;
        let clamp_y = |v: i32| v.clamp(0, image.height() as i32) as usize;
        let (left, right) = (clamp_x(min_x), clamp_x(max_x));
        let (top, bottom) = (clamp_y(min_y), clamp_y(max_y));

        if right <= left || bottom <= top {
            return Ok((warped, Image::empty()));
        }

        let mut cropped = Image::from_size_val([right - left, bottom - top].into(), 0u8)?;
        crop_image(&warped, &mut cropped, left, top)?;

        Ok((warped, cropped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{order_points, Point2};

    fn gradient(width: usize, height: usize) -> Result<Image<u8, 3>, ImageError> {
        let data = (0..height)
            .flat_map(|y| (0..width).flat_map(move |x| [x as u8, y as u8, (x + y) as u8]))
            .collect();
        Image::new([width, height].into(), data)
    }

    #[test]
    fn bounds_span_outer_corners() {
        let polygon = order_points(&[
            Point2::new(12, 10),
            Point2::new(90, 14),
            Point2::new(95, 80),
            Point2::new(10, 85),
        ]);
        assert_eq!(rectification_bounds(&polygon), [10, 10, 95, 85]);
    }

    #[test]
    fn axis_aligned_square() -> Result<(), PaintingError> {
        let image = gradient(120, 100)?;
        let polygon = order_points(&[
            Point2::new(10, 20),
            Point2::new(60, 20),
            Point2::new(60, 70),
            Point2::new(10, 70),
        ]);

        let (warped, cropped) = FrameRectifier::new().rectify(&polygon, &image)?;

        assert_eq!(warped.size(), image.size());
        assert_eq!(cropped.width(), 50);
        assert_eq!(cropped.height(), 50);

        // an identity warp, the crop is the region of the source
        let mut expected = Image::<u8, 3>::from_size_val([50, 50].into(), 0)?;
        crop_image(&image, &mut expected, 10, 20)?;
        for (a, b) in cropped.as_slice().iter().zip(expected.as_slice()) {
            assert!(a.abs_diff(*b) <= 1);
        }
        Ok(())
    }

    #[test]
    fn tilted_frame() -> Result<(), PaintingError> {
        let image = gradient(200, 150)?;
        let polygon = order_points(&[
            Point2::new(30, 25),
            Point2::new(170, 35),
            Point2::new(160, 130),
            Point2::new(20, 120),
        ]);

        let (_, cropped) = FrameRectifier::new().rectify(&polygon, &image)?;
        assert_eq!(cropped.width(), 150);
        assert_eq!(cropped.height(), 105);
        Ok(())
    }

    #[test]
    fn bounds_are_clamped() -> Result<(), PaintingError> {
        let image = gradient(64, 48)?;
        let polygon = order_points(&[
            Point2::new(-10, -5),
            Point2::new(40, -5),
            Point2::new(40, 30),
            Point2::new(-10, 30),
        ]);

        let (_, cropped) = FrameRectifier::new().rectify(&polygon, &image)?;
        assert_eq!(cropped.width(), 40);
        assert_eq!(cropped.height(), 30);
        Ok(())
    }

    #[test]
    fn degenerate_frames() -> Result<(), PaintingError> {
        let image = gradient(64, 48)?;

        // zero height
        let flat = Polygon4::from_ordered([
            Point2::new(5, 10),
            Point2::new(50, 10),
            Point2::new(50, 10),
            Point2::new(5, 10),
        ]);
        let (warped, cropped) = FrameRectifier::new().rectify(&flat, &image)?;
        assert!(cropped.is_empty());
        assert_eq!(warped, image);

        // three collinear corners
        let collinear = Polygon4::from_ordered([
            Point2::new(0, 0),
            Point2::new(10, 10),
            Point2::new(20, 20),
            Point2::new(0, 20),
        ]);
        assert!(matches!(
            FrameRectifier::new().rectify(&collinear, &image),
            Err(PaintingError::DegenerateTransform(_))
        ));
        Ok(())
    }
}
