use kornia_image::ImageSize;
use serde::{Deserialize, Serialize};

/// A pixel position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point2 {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Point2 {
    /// Create a point.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<[i32; 2]> for Point2 {
    fn from(p: [i32; 2]) -> Self {
        Self { x: p[0], y: p[1] }
    }
}

impl From<Point2> for [i32; 2] {
    fn from(p: Point2) -> Self {
        [p.x, p.y]
    }
}

/// Four corners in the order top-left, top-right, bottom-right, bottom-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Polygon4 {
    points: [Point2; 4],
}

impl Polygon4 {
    /// Build a polygon from corners that are already in canonical order.
    ///
    /// Use [`order_points`] for corners in arbitrary order.
    pub fn from_ordered(points: [Point2; 4]) -> Self {
        Self { points }
    }

    /// The corners, top-left first and clockwise on screen.
    pub fn points(&self) -> &[Point2; 4] {
        &self.points
    }

    /// Top-left corner.
    pub fn top_left(&self) -> Point2 {
        self.points[0]
    }

    /// Top-right corner.
    pub fn top_right(&self) -> Point2 {
        self.points[1]
    }

    /// Bottom-right corner.
    pub fn bottom_right(&self) -> Point2 {
        self.points[2]
    }

    /// Bottom-left corner.
    pub fn bottom_left(&self) -> Point2 {
        self.points[3]
    }

    /// The corners as `[x, y]` arrays.
    pub fn to_array(&self) -> [[i32; 2]; 4] {
        self.points.map(Into::into)
    }
}

// index of the first point with the smallest or largest key
fn first_extreme(points: &[Point2; 4], key: impl Fn(&Point2) -> i64, largest: bool) -> usize {
    let mut best = 0;
    for i in 1..4 {
        let (k, b) = (key(&points[i]), key(&points[best]));
        if (largest && k > b) || (!largest && k < b) {
            best = i;
        }
    }
    best
}

/// Order four corners as top-left, top-right, bottom-right, bottom-left.
///
/// The top-left corner minimizes `x + y`, the bottom-right maximizes it, the
/// top-right maximizes `x - y` and the bottom-left minimizes it. Ties go to the
/// first point in input order.
///
/// # Example
///
/// ```
/// use kornia_paintings::geometry::{order_points, Point2};
///
/// let polygon = order_points(&[
///     Point2::new(90, 80),
///     Point2::new(10, 10),
///     Point2::new(12, 85),
///     Point2::new(95, 5),
/// ]);
/// assert_eq!(polygon.top_left(), Point2::new(10, 10));
/// assert_eq!(polygon.top_right(), Point2::new(95, 5));
/// assert_eq!(polygon.bottom_right(), Point2::new(90, 80));
/// assert_eq!(polygon.bottom_left(), Point2::new(12, 85));
/// ```
pub fn order_points(points: &[Point2; 4]) -> Polygon4 {
    let sum = |p: &Point2| p.x as i64 + p.y as i64;
    let diff = |p: &Point2| p.x as i64 - p.y as i64;

    let tl = first_extreme(points, sum, false);
    let br = first_extreme(points, sum, true);
    let tr = first_extreme(points, diff, true);
    let bl = first_extreme(points, diff, false);

    Polygon4::from_ordered([points[tl], points[tr], points[br], points[bl]])
}

/// Map polygons from the detection image back to the original image.
///
/// Each coordinate is multiplied by the ratio of the original to the detection
/// dimension along its axis and rounded to the nearest integer, ties to even.
///
/// # Arguments
///
/// * `polygons` - Polygons in detection image coordinates.
/// * `detection_size` - Size of the image the polygons were detected in.
/// * `original_size` - Size of the original image.
pub fn rescale_polygons(
    polygons: &[Polygon4],
    detection_size: ImageSize,
    original_size: ImageSize,
) -> Vec<Polygon4> {
    let scale_x = original_size.width as f64 / detection_size.width.max(1) as f64;
    let scale_y = original_size.height as f64 / detection_size.height.max(1) as f64;

    polygons
        .iter()
        .map(|polygon| {
            Polygon4::from_ordered(polygon.points().map(|p| Point2 {
                x: (p.x as f64 * scale_x).round_ties_even() as i32,
                y: (p.y as f64 * scale_y).round_ties_even() as i32,
            }))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> [Point2; 4] {
        [
            Point2::new(30, 220),
            Point2::new(310, 12),
            Point2::new(25, 18),
            Point2::new(290, 240),
        ]
    }

    #[test]
    fn order_points_canonical() {
        let polygon = order_points(&quad());
        assert_eq!(
            polygon.to_array(),
            [[25, 18], [310, 12], [290, 240], [30, 220]]
        );
    }

    #[test]
    fn order_points_permutation_invariant_and_idempotent() {
        let expected = order_points(&quad());
        let mut points = quad();
        for _ in 0..4 {
            points.rotate_left(1);
            assert_eq!(order_points(&points), expected);
            let mut reversed = points;
            reversed.reverse();
            assert_eq!(order_points(&reversed), expected);
        }
        assert_eq!(order_points(expected.points()), expected);
    }

    #[test]
    fn rescale_and_back() {
        let polygon = order_points(&quad());
        let detection = ImageSize {
            width: 500,
            height: 375,
        };
        let original = ImageSize {
            width: 1333,
            height: 1000,
        };

        let up = rescale_polygons(&[polygon], detection, original);
        let back = rescale_polygons(&up, original, detection);
        for (a, b) in polygon.points().iter().zip(back[0].points()) {
            assert!((a.x - b.x).abs() <= 1);
            assert!((a.y - b.y).abs() <= 1);
        }
    }

    #[test]
    fn rescale_ties_to_even() {
        let polygon = Polygon4::from_ordered([
            Point2::new(1, 1),
            Point2::new(3, 1),
            Point2::new(3, 5),
            Point2::new(1, 5),
        ]);
        let half = rescale_polygons(
            &[polygon],
            ImageSize {
                width: 10,
                height: 10,
            },
            ImageSize {
                width: 5,
                height: 5,
            },
        );
        // 0.5 -> 0, 1.5 -> 2, 2.5 -> 2
        assert_eq!(half[0].to_array(), [[0, 0], [2, 0], [2, 2], [0, 2]]);
    }
}
