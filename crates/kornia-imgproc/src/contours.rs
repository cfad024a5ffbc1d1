//! Contour extraction by topological border following.
//!
//! Implements the border following of Suzuki and Abe, "Topological Structural
//! Analysis of Digitized Binary Images by Border Following" (1985). Every non-zero
//! pixel is foreground.

use kornia_image::{Image, ImageError};

// clockwise on screen (y grows downwards): E, SE, S, SW, W, NW, N, NE
const DIRECTIONS: [[i32; 2]; 8] = [
    [1, 0],
    [1, 1],
    [0, 1],
    [-1, 1],
    [-1, 0],
    [-1, -1],
    [0, -1],
    [1, -1],
];

const EAST: usize = 0;

/// Whether a border surrounds a foreground component or a hole inside one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderType {
    /// Border between a component and the background around it.
    Outer,
    /// Border between a component and a hole inside it.
    Hole,
}

/// Which borders to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalMode {
    /// Only the outermost borders, the ones without a parent.
    External,
    /// Every border, with its parent recorded.
    List,
}

/// How the border points are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContourApproximation {
    /// Every border pixel.
    None,
    /// Only the end points of horizontal, vertical and diagonal runs.
    Simple,
}

/// A traced border.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    /// Border pixels as `[x, y]`, in tracing order.
    pub points: Vec<[i32; 2]>,
    /// The border type.
    pub border_type: BorderType,
    /// Index of the parent border in the unfiltered tracing order.
    pub parent: Option<usize>,
}

fn direction_index(d: [i32; 2]) -> usize {
    DIRECTIONS.iter().position(|&v| v == d).unwrap_or(EAST)
}

struct Labels {
    data: Vec<i32>,
    cols: i32,
    rows: i32,
}

impl Labels {
    fn at(&self, p: [i32; 2]) -> i32 {
        if p[0] < 0 || p[1] < 0 || p[0] >= self.cols || p[1] >= self.rows {
            0
        } else {
            self.data[(p[1] * self.cols + p[0]) as usize]
        }
    }

    fn set(&mut self, p: [i32; 2], value: i32) {
        self.data[(p[1] * self.cols + p[0]) as usize] = value;
    }
}

fn step(p: [i32; 2], dir: usize) -> [i32; 2] {
    [p[0] + DIRECTIONS[dir][0], p[1] + DIRECTIONS[dir][1]]
}

/// Follow one border starting at `start` with the background neighbour `adj`.
fn follow_border(labels: &mut Labels, start: [i32; 2], adj: [i32; 2], nbd: i32) -> Vec<[i32; 2]> {
    let adj_dir = direction_index([adj[0] - start[0], adj[1] - start[1]]);

    // first non-zero neighbour clockwise from the background pixel
    let first = (0..8)
        .map(|i| (adj_dir + i) % 8)
        .find(|&d| labels.at(step(start, d)) != 0);

    let Some(first_dir) = first else {
        labels.set(start, -nbd);
        return vec![start];
    };

    let p1 = step(start, first_dir);
    let mut p2 = p1;
    let mut p3 = start;
    let mut points = Vec::new();

    loop {
        points.push(p3);

        // counter-clockwise from the element after p2
        let d2 = direction_index([p2[0] - p3[0], p2[1] - p3[1]]);
        let mut east_examined = false;
        let mut p4 = p2;
        for i in 1..=8 {
            let d = (d2 + 8 - i) % 8;
            let candidate = step(p3, d);
            if labels.at(candidate) != 0 {
                p4 = candidate;
                break;
            }
            if d == EAST {
                east_examined = true;
            }
        }

        if p3[0] + 1 == labels.cols || east_examined {
            labels.set(p3, -nbd);
        } else if labels.at(p3) == 1 {
            labels.set(p3, nbd);
        }

        if p4 == start && p3 == p1 {
            break;
        }

        p2 = p3;
        p3 = p4;
    }

    points
}

/// Drop the points lying in the middle of straight runs of a closed chain.
fn compress_chain(points: Vec<[i32; 2]>) -> Vec<[i32; 2]> {
    let n = points.len();
    if n < 3 {
        return points;
    }

    let compressed: Vec<[i32; 2]> = (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let curr = points[i];
            let next = points[(i + 1) % n];
            [curr[0] - prev[0], curr[1] - prev[1]] != [next[0] - curr[0], next[1] - curr[1]]
        })
        .map(|i| points[i])
        .collect();

    if compressed.is_empty() {
        points
    } else {
        compressed
    }
}

/// Find the contours of a binary image.
///
/// # Arguments
///
/// * `src` - The input image, non-zero pixels are foreground.
/// * `mode` - Which borders to return.
/// * `approximation` - How the border points are stored.
///
/// # Returns
///
/// The contours in discovery order (raster scan of their starting pixel).
///
/// # Example
///
/// ```
/// use kornia_image::{Image, ImageSize};
/// use kornia_imgproc::contours::{find_contours, ContourApproximation, RetrievalMode};
///
/// #[rustfmt::skip]
/// let image = Image::<u8, 1>::new(
///     ImageSize { width: 4, height: 4 },
///     vec![
///         0, 0, 0, 0,
///         0, 1, 1, 0,
///         0, 1, 1, 0,
///         0, 0, 0, 0,
///     ],
/// ).unwrap();
///
/// let contours = find_contours(&image, RetrievalMode::External, ContourApproximation::None).unwrap();
/// assert_eq!(contours.len(), 1);
/// assert_eq!(contours[0].points.len(), 4);
/// ```
pub fn find_contours(
    src: &Image<u8, 1>,
    mode: RetrievalMode,
    approximation: ContourApproximation,
) -> Result<Vec<Contour>, ImageError> {
    let (cols, rows) = (src.cols() as i32, src.rows() as i32);
    let mut labels = Labels {
        data: src.as_slice().iter().map(|&v| i32::from(v != 0)).collect(),
        cols,
        rows,
    };

    let mut contours: Vec<Contour> = Vec::new();
    let mut nbd = 1;

    for y in 0..rows {
        let mut lnbd = 1;

        for x in 0..cols {
            let value = labels.at([x, y]);
            if value == 0 {
                continue;
            }

            let start = if value == 1 && labels.at([x - 1, y]) == 0 {
                Some(([x - 1, y], BorderType::Outer))
            } else if value >= 1 && x + 1 < cols && labels.at([x + 1, y]) == 0 {
                if value > 1 {
                    lnbd = value;
                }
                Some(([x + 1, y], BorderType::Hole))
            } else {
                None
            };

            if let Some((adj, border_type)) = start {
                nbd += 1;

                let parent = if lnbd > 1 {
                    let index = (lnbd - 2) as usize;
                    let neighbour = &contours[index];
                    if (border_type == BorderType::Outer) ^ (neighbour.border_type == BorderType::Outer)
                    {
                        Some(index)
                    } else {
                        neighbour.parent
                    }
                } else {
                    None
                };

                let points = follow_border(&mut labels, [x, y], adj, nbd);
                contours.push(Contour {
                    points,
                    border_type,
                    parent,
                });
            }

            let value = labels.at([x, y]);
            if value != 1 {
                lnbd = value.abs();
            }
        }
    }

    let contours = contours.into_iter().filter(|c| match mode {
        RetrievalMode::External => c.border_type == BorderType::Outer && c.parent.is_none(),
        RetrievalMode::List => true,
    });

    Ok(match approximation {
        ContourApproximation::None => contours.collect(),
        ContourApproximation::Simple => contours
            .map(|c| Contour {
                points: compress_chain(c.points),
                ..c
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kornia_image::ImageSize;

    fn image_from_rows(rows: &[&str]) -> Result<Image<u8, 1>, ImageError> {
        let size = ImageSize {
            width: rows[0].len(),
            height: rows.len(),
        };
        let data = rows
            .iter()
            .flat_map(|r| r.bytes().map(|b| if b == b'#' { 255 } else { 0 }))
            .collect();
        Image::new(size, data)
    }

    #[test]
    fn filled_square() -> Result<(), ImageError> {
        let image = image_from_rows(&[
            ".......",
            ".......",
            "..###..",
            "..###..",
            "..###..",
            ".......",
            ".......",
        ])?;

        let contours = find_contours(&image, RetrievalMode::External, ContourApproximation::None)?;
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].border_type, BorderType::Outer);
        assert_eq!(
            contours[0].points,
            vec![[2, 2], [2, 3], [2, 4], [3, 4], [4, 4], [4, 3], [4, 2], [3, 2]]
        );

        let simple = find_contours(&image, RetrievalMode::External, ContourApproximation::Simple)?;
        assert_eq!(simple[0].points, vec![[2, 2], [2, 4], [4, 4], [4, 2]]);
        Ok(())
    }

    #[test]
    fn single_pixel() -> Result<(), ImageError> {
        let image = image_from_rows(&["...", ".#.", "..."])?;
        let contours = find_contours(&image, RetrievalMode::List, ContourApproximation::None)?;
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].points, vec![[1, 1]]);
        Ok(())
    }

    #[test]
    fn square_with_hole() -> Result<(), ImageError> {
        let image = image_from_rows(&[
            ".........",
            ".........",
            "..#####..",
            "..#####..",
            "..##.##..",
            "..#####..",
            "..#####..",
            ".........",
            ".........",
        ])?;

        let all = find_contours(&image, RetrievalMode::List, ContourApproximation::None)?;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].border_type, BorderType::Outer);
        assert_eq!(all[0].parent, None);
        assert_eq!(all[1].border_type, BorderType::Hole);
        assert_eq!(all[1].parent, Some(0));

        let external = find_contours(&image, RetrievalMode::External, ContourApproximation::None)?;
        assert_eq!(external.len(), 1);
        assert_eq!(external[0], all[0]);
        Ok(())
    }

    #[test]
    fn nested_component() -> Result<(), ImageError> {
        let image = image_from_rows(&[
            ".........",
            ".#######.",
            ".#.....#.",
            ".#.....#.",
            ".#..#..#.",
            ".#.....#.",
            ".#.....#.",
            ".#######.",
            ".........",
        ])?;

        let all = find_contours(&image, RetrievalMode::List, ContourApproximation::None)?;
        assert_eq!(all.len(), 3);
        assert_eq!(all[1].border_type, BorderType::Hole);
        assert_eq!(all[1].parent, Some(0));
        assert_eq!(all[2].border_type, BorderType::Outer);
        assert_eq!(all[2].parent, Some(1));
        assert_eq!(all[2].points, vec![[4, 4]]);

        let external = find_contours(&image, RetrievalMode::External, ContourApproximation::None)?;
        assert_eq!(external.len(), 1);
        assert_eq!(external[0].points.len(), 24);
        Ok(())
    }

    #[test]
    fn touching_image_border() -> Result<(), ImageError> {
        let image = image_from_rows(&["##..", "##..", "...."])?;
        let contours = find_contours(&image, RetrievalMode::External, ContourApproximation::None)?;
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].points, vec![[0, 0], [0, 1], [1, 1], [1, 0]]);
        Ok(())
    }
}
