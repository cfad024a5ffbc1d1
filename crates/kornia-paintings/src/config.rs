use std::path::Path;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::PaintingError;

/// Parameters of the [`crate::detector::FrameDetector`].
///
/// Every field has a default so a JSON file may override any subset of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Width of the image the detection runs on, the aspect ratio is preserved.
    pub working_width: usize,
    /// Side of the gaussian blur kernel, odd.
    pub blur_kernel_size: usize,
    /// Standard deviation of the gaussian blur.
    pub blur_sigma: f32,
    /// Canny low threshold as a fraction of the Otsu threshold, which is the high one.
    pub canny_low_ratio: f32,
    /// Number of largest contours examined.
    pub max_contours: usize,
    /// Douglas-Peucker tolerance in working pixels.
    pub approx_epsilon: f64,
    /// Contour area over hull area a candidate must exceed.
    pub min_solidity: f64,
    /// Thickness of the polygons drawn on the annotated image.
    pub annotation_thickness: usize,
    /// RGB color of the polygons drawn on the annotated image.
    pub annotation_color: [u8; 3],
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            working_width: 500,
            blur_kernel_size: 9,
            blur_sigma: 1.0,
            canny_low_ratio: 0.5,
            max_contours: 25,
            approx_epsilon: 20.0,
            min_solidity: 0.6,
            annotation_thickness: 2,
            annotation_color: [0, 255, 0],
        }
    }
}

impl DetectorConfig {
    /// Set the working width.
    pub fn with_working_width(mut self, working_width: usize) -> Self {
        self.working_width = working_width;
        self
    }

    /// Set the minimum solidity.
    pub fn with_min_solidity(mut self, min_solidity: f64) -> Self {
        self.min_solidity = min_solidity;
        self
    }

    /// Set the Douglas-Peucker tolerance.
    pub fn with_approx_epsilon(mut self, approx_epsilon: f64) -> Self {
        self.approx_epsilon = approx_epsilon;
        self
    }

    /// Set the number of contours examined.
    pub fn with_max_contours(mut self, max_contours: usize) -> Self {
        self.max_contours = max_contours;
        self
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<(), PaintingError> {
        if self.working_width == 0 {
            return Err(invalid("working_width must be positive"));
        }
        if self.blur_kernel_size % 2 == 0 {
            return Err(invalid("blur_kernel_size must be odd"));
        }
        if !(self.blur_sigma > 0.0) {
            return Err(invalid("blur_sigma must be positive"));
        }
        if !(self.canny_low_ratio > 0.0 && self.canny_low_ratio <= 1.0) {
            return Err(invalid("canny_low_ratio must be in (0, 1]"));
        }
        if self.max_contours == 0 {
            return Err(invalid("max_contours must be positive"));
        }
        if !(self.approx_epsilon >= 0.0) {
            return Err(invalid("approx_epsilon must not be negative"));
        }
        if !(0.0..=1.0).contains(&self.min_solidity) {
            return Err(invalid("min_solidity must be in [0, 1]"));
        }
        Ok(())
    }
}

/// Parameters of the [`crate::matcher::PaintingMatcher`] and the corpus builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Width queries and references are resized to before the ORB extraction.
    pub query_width: usize,
    /// Maximum number of ORB keypoints per image.
    pub n_features: usize,
    /// Number of best matches summed into the keypoint score; records with fewer
    /// matches are dropped.
    pub best_matches: usize,
    /// Number of embedding candidates re-scored by the combined strategy.
    pub shortlist_size: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            query_width: 800,
            n_features: 300,
            best_matches: 20,
            shortlist_size: 60,
        }
    }
}

impl MatcherConfig {
    /// Set the query width.
    pub fn with_query_width(mut self, query_width: usize) -> Self {
        self.query_width = query_width;
        self
    }

    /// Set the number of ORB features.
    pub fn with_n_features(mut self, n_features: usize) -> Self {
        self.n_features = n_features;
        self
    }

    /// Set the number of best matches in a keypoint score.
    pub fn with_best_matches(mut self, best_matches: usize) -> Self {
        self.best_matches = best_matches;
        self
    }

    /// Set the combined strategy shortlist size.
    pub fn with_shortlist_size(mut self, shortlist_size: usize) -> Self {
        self.shortlist_size = shortlist_size;
        self
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<(), PaintingError> {
        if self.query_width == 0 {
            return Err(invalid("query_width must be positive"));
        }
        if self.n_features == 0 {
            return Err(invalid("n_features must be positive"));
        }
        if self.best_matches == 0 {
            return Err(invalid("best_matches must be positive"));
        }
        if self.shortlist_size == 0 {
            return Err(invalid("shortlist_size must be positive"));
        }
        Ok(())
    }
}

/// The configuration file of the command line tools.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Detector parameters.
    pub detector: DetectorConfig,
    /// Matcher parameters.
    pub matcher: MatcherConfig,
}

impl PipelineConfig {
    /// Read a configuration from a JSON file and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PaintingError> {
        let config: Self = read_json(path)?;
        config.detector.validate()?;
        config.matcher.validate()?;
        Ok(config)
    }
}

fn invalid(msg: &str) -> PaintingError {
    PaintingError::InvalidConfig(msg.to_string())
}

pub(crate) fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, PaintingError> {
    let file = std::fs::File::open(path)?;
    Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
}
