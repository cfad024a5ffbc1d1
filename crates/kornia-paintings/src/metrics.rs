use std::fmt;
use std::str::FromStr;

use crate::error::PaintingError;

/// A distance between two embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Metric {
    /// `sqrt(sum((a - b)^2))`
    Euclidean,
    /// `sum(|a - b|)`
    CityBlock,
    /// `sum(|a - b|^p)^(1/p)` with `p >= 1`.
    Minkowski {
        /// Order of the norm.
        p: f64,
    },
    /// `max(|a - b|)`
    Chebyshev,
    /// `1 - a.b / (|a| |b|)`, 1 when either vector is zero.
    #[default]
    Cosine,
    /// Dissimilarity of the non-zero supports, 0 when both vectors are zero.
    Jaccard,
}

impl Metric {
    /// Distance between two vectors of the same length.
    ///
    /// # Errors
    ///
    /// [`PaintingError::EmbeddingDimensionMismatch`] when the lengths differ.
    ///
    /// # Example
    ///
    /// ```
    /// use kornia_paintings::metrics::Metric;
    ///
    /// let d = Metric::CityBlock.distance(&[1.0, 2.0], &[3.0, 1.0]).unwrap();
    /// assert_eq!(d, 3.0);
    /// ```
    pub fn distance(&self, a: &[f32], b: &[f32]) -> Result<f64, PaintingError> {
        if a.len() != b.len() {
            return Err(PaintingError::EmbeddingDimensionMismatch {
                expected: a.len(),
                found: b.len(),
            });
        }

        let diffs = a.iter().zip(b).map(|(&x, &y)| (x as f64 - y as f64).abs());

        let d = match *self {
            Metric::Euclidean => diffs.map(|d| d * d).sum::<f64>().sqrt(),
            Metric::CityBlock => diffs.sum(),
            Metric::Minkowski { p } => {
                if !(p >= 1.0) {
                    return Err(PaintingError::InvalidConfig(format!(
                        "minkowski order must be at least 1, got {p}"
                    )));
                }
                diffs.map(|d| d.powf(p)).sum::<f64>().powf(p.recip())
            }
            Metric::Chebyshev => diffs.fold(0.0, f64::max),
            Metric::Cosine => cosine(a, b),
            Metric::Jaccard => jaccard(a, b),
        };

        Ok(d)
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f64 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }

    1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())
}

fn jaccard(a: &[f32], b: &[f32]) -> f64 {
    let (mut differ, mut union) = (0usize, 0usize);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (x != 0.0, y != 0.0);
        if x || y {
            union += 1;
        }
        if x != y {
            differ += 1;
        }
    }

    if union == 0 {
        return 0.0;
    }

    differ as f64 / union as f64
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Euclidean => write!(f, "euclidean"),
            Metric::CityBlock => write!(f, "cityblock"),
            Metric::Minkowski { p } => write!(f, "minkowski:{p}"),
            Metric::Chebyshev => write!(f, "chebyshev"),
            Metric::Cosine => write!(f, "cosine"),
            Metric::Jaccard => write!(f, "jaccard"),
        }
    }
}

impl FromStr for Metric {
    type Err = PaintingError;

    /// Parse a metric name, `minkowski` takes an optional order as `minkowski:3`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let (name, arg) = match lower.split_once(':') {
            Some((name, arg)) => (name, Some(arg)),
            None => (lower.as_str(), None),
        };

        let metric = match (name, arg) {
            ("euclidean", None) => Metric::Euclidean,
            ("cityblock" | "manhattan", None) => Metric::CityBlock,
            ("chebyshev", None) => Metric::Chebyshev,
            ("cosine", None) => Metric::Cosine,
            ("jaccard", None) => Metric::Jaccard,
            ("minkowski", None) => Metric::Minkowski { p: 2.0 },
            ("minkowski", Some(p)) => {
                let p: f64 = p
                    .parse()
                    .map_err(|_| PaintingError::InvalidConfig(format!("invalid order: {p}")))?;
                if !(p >= 1.0) {
                    return Err(PaintingError::InvalidConfig(format!(
                        "minkowski order must be at least 1, got {p}"
                    )));
                }
                Metric::Minkowski { p }
            }
            _ => {
                return Err(PaintingError::InvalidConfig(format!(
                    "unknown metric: {s}"
                )))
            }
        };

        Ok(metric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const A: [f32; 4] = [1.0, 0.0, 2.0, -1.0];
    const B: [f32; 4] = [0.0, 0.0, 4.0, 1.0];

    #[test]
    fn metric_values() -> Result<(), PaintingError> {
        assert_relative_eq!(Metric::Euclidean.distance(&A, &B)?, 3.0);
        assert_relative_eq!(Metric::CityBlock.distance(&A, &B)?, 5.0);
        assert_relative_eq!(Metric::Chebyshev.distance(&A, &B)?, 2.0);
        assert_relative_eq!(
            Metric::Minkowski { p: 3.0 }.distance(&A, &B)?,
            17f64.powf(1.0 / 3.0)
        );
        assert_relative_eq!(
            Metric::Minkowski { p: 2.0 }.distance(&A, &B)?,
            Metric::Euclidean.distance(&A, &B)?
        );
        // a.b = 7, |a| = sqrt(6), |b| = sqrt(17)
        assert_relative_eq!(
            Metric::Cosine.distance(&A, &B)?,
            1.0 - 7.0 / (6f64.sqrt() * 17f64.sqrt()),
            epsilon = 1e-12
        );
        // supports {0, 2, 3} and {2, 3}
        assert_relative_eq!(Metric::Jaccard.distance(&A, &B)?, 1.0 / 3.0);
        Ok(())
    }

    #[test]
    fn reflexive_and_symmetric() -> Result<(), PaintingError> {
        let metrics = [
            Metric::Euclidean,
            Metric::CityBlock,
            Metric::Minkowski { p: 1.5 },
            Metric::Chebyshev,
            Metric::Cosine,
            Metric::Jaccard,
        ];
        for metric in metrics {
            assert_relative_eq!(metric.distance(&A, &A)?, 0.0, epsilon = 1e-12);
            assert_relative_eq!(metric.distance(&A, &B)?, metric.distance(&B, &A)?);
        }
        Ok(())
    }

    #[test]
    fn zero_vectors() -> Result<(), PaintingError> {
        let zero = [0.0f32; 4];
        assert_eq!(Metric::Cosine.distance(&zero, &A)?, 1.0);
        assert_eq!(Metric::Cosine.distance(&zero, &zero)?, 1.0);
        assert_eq!(Metric::Jaccard.distance(&zero, &zero)?, 0.0);
        assert_eq!(Metric::Jaccard.distance(&zero, &A)?, 1.0);
        Ok(())
    }

    #[test]
    fn length_mismatch() {
        assert!(matches!(
            Metric::Euclidean.distance(&A, &[1.0, 2.0]),
            Err(PaintingError::EmbeddingDimensionMismatch {
                expected: 4,
                found: 2
            })
        ));
    }

    #[test]
    fn parse_names() -> Result<(), PaintingError> {
        assert_eq!("cosine".parse::<Metric>()?, Metric::Cosine);
        assert_eq!("CityBlock".parse::<Metric>()?, Metric::CityBlock);
        assert_eq!("minkowski".parse::<Metric>()?, Metric::Minkowski { p: 2.0 });
        assert_eq!("minkowski:3".parse::<Metric>()?, Metric::Minkowski { p: 3.0 });
        assert!("minkowski:0.5".parse::<Metric>().is_err());
        assert!("hamming".parse::<Metric>().is_err());
        for metric in [Metric::Jaccard, Metric::Minkowski { p: 4.0 }] {
            assert_eq!(metric.to_string().parse::<Metric>()?, metric);
        }
        Ok(())
    }
}
