//! Planar geometry on polygons with integer pixel vertices `[x, y]`.

#[inline]
fn cross(o: [i32; 2], a: [i32; 2], b: [i32; 2]) -> i64 {
    (a[0] as i64 - o[0] as i64) * (b[1] as i64 - o[1] as i64)
        - (a[1] as i64 - o[1] as i64) * (b[0] as i64 - o[0] as i64)
}

/// Signed area of a closed polygon with the shoelace formula.
///
/// The sign is positive when the vertices turn counter-clockwise in a y-up frame,
/// which is clockwise on screen.
pub fn signed_polygon_area(points: &[[i32; 2]]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }

    let twice_area: i64 = (0..n)
        .map(|i| {
            let p = points[i];
            let q = points[(i + 1) % n];
            p[0] as i64 * q[1] as i64 - q[0] as i64 * p[1] as i64
        })
        .sum();

    twice_area as f64 / 2.0
}

/// Area enclosed by a closed polygon or contour.
///
/// # Example
///
/// ```
/// use kornia_imgproc::geometry::polygon_area;
///
/// let square = [[0, 0], [0, 4], [4, 4], [4, 0]];
/// assert_eq!(polygon_area(&square), 16.0);
/// ```
pub fn polygon_area(points: &[[i32; 2]]) -> f64 {
    signed_polygon_area(points).abs()
}

/// Convex hull of a point set with the monotone chain algorithm.
///
/// Collinear points on the hull edges are dropped. The hull starts at the
/// lowest-x (then lowest-y) point.
pub fn convex_hull(points: &[[i32; 2]]) -> Vec<[i32; 2]> {
    let mut sorted = points.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    if sorted.len() < 3 {
        return sorted;
    }

    let mut lower: Vec<[i32; 2]> = Vec::with_capacity(sorted.len());
    for &p in sorted.iter() {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<[i32; 2]> = Vec::with_capacity(sorted.len());
    for &p in sorted.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0 {
            upper.pop();
        }
        upper.push(p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

fn distance_to_segment_line(p: [i32; 2], a: [i32; 2], b: [i32; 2]) -> f64 {
    let (dx, dy) = ((b[0] - a[0]) as f64, (b[1] - a[1]) as f64);
    let (px, py) = ((p[0] - a[0]) as f64, (p[1] - a[1]) as f64);
    let norm = (dx * dx + dy * dy).sqrt();
    if norm == 0.0 {
        (px * px + py * py).sqrt()
    } else {
        (dx * py - dy * px).abs() / norm
    }
}

/// Douglas-Peucker on an open chain, keeping both end points.
///
/// Returns the mask of the kept vertices.
fn douglas_peucker_mask(chain: &[[i32; 2]], epsilon: f64) -> Vec<bool> {
    let n = chain.len();
    let mut keep = vec![true; n];
    if n < 3 {
        return keep;
    }

    keep[1..n - 1].iter_mut().for_each(|k| *k = false);

    let mut stack = vec![(0usize, n - 1)];
    while let Some((start, end)) = stack.pop() {
        if end <= start + 1 {
            continue;
        }

        let (mut max_dist, mut max_idx) = (0.0, start);
        for i in start + 1..end {
            let d = distance_to_segment_line(chain[i], chain[start], chain[end]);
            if d > max_dist {
                max_dist = d;
                max_idx = i;
            }
        }

        if max_dist > epsilon {
            keep[max_idx] = true;
            stack.push((start, max_idx));
            stack.push((max_idx, end));
        }
    }

    keep
}

// number of farthest-point hops used to pick the split of a closed curve
const ANCHOR_ITERATIONS: usize = 3;

// index of the vertex farthest from `from`, scanning cyclically after it
fn farthest_vertex(points: &[[i32; 2]], from: usize) -> (usize, i64) {
    let n = points.len();
    let origin = points[from];
    (1..n)
        .map(|k| (from + k) % n)
        .fold((from, 0i64), |best, i| {
            let (dx, dy) = (
                (points[i][0] - origin[0]) as i64,
                (points[i][1] - origin[1]) as i64,
            );
            let d = dx * dx + dy * dy;
            if d > best.1 {
                (i, d)
            } else {
                best
            }
        })
}

/// Approximate a polygonal curve with fewer vertices (Douglas-Peucker).
///
/// Vertices closer than `epsilon` to the simplified curve are removed. A closed
/// curve is split at two mutually distant vertices, found by hopping a few times to
/// the farthest vertex, and both halves are simplified independently. No vertex is
/// kept only because it comes first. The kept vertices are returned in input order.
///
/// # Arguments
///
/// * `points` - The curve vertices.
/// * `epsilon` - Maximum distance between the curve and its approximation.
/// * `closed` - Whether the last vertex connects back to the first.
///
/// # Example
///
/// ```
/// use kornia_imgproc::geometry::approx_poly_dp;
///
/// let noisy_square = [[0, 0], [0, 50], [1, 100], [50, 101], [100, 100], [100, 0], [50, 1]];
/// let square = approx_poly_dp(&noisy_square, 5.0, true);
/// assert_eq!(square, vec![[0, 0], [1, 100], [100, 100], [100, 0]]);
/// ```
pub fn approx_poly_dp(points: &[[i32; 2]], epsilon: f64, closed: bool) -> Vec<[i32; 2]> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    if !closed {
        return points
            .iter()
            .zip(douglas_peucker_mask(points, epsilon))
            .filter_map(|(&p, k)| k.then_some(p))
            .collect();
    }

    let mut start = 0;
    let (mut end, mut max_sq) = farthest_vertex(points, start);
    for _ in 1..ANCHOR_ITERATIONS {
        start = end;
        (end, max_sq) = farthest_vertex(points, start);
    }

    if (max_sq as f64).sqrt() <= epsilon {
        return vec![points[start]];
    }

    let mut keep = vec![false; n];
    for (from, to) in [(start, end), (end, start)] {
        let len = (to + n - from) % n + 1;
        let indices: Vec<usize> = (0..len).map(|k| (from + k) % n).collect();
        let chain: Vec<[i32; 2]> = indices.iter().map(|&i| points[i]).collect();
        for (i, k) in indices.into_iter().zip(douglas_peucker_mask(&chain, epsilon)) {
            keep[i] |= k;
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(&p, k)| k.then_some(p))
        .collect()
}
