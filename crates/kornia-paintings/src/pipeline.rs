use kornia_image::Image;
use serde::Serialize;

use crate::corpus::Resolution;
use crate::detector::FrameDetector;
use crate::error::PaintingError;
use crate::geometry::{rescale_polygons, Polygon4};
use crate::matcher::{MatchStrategy, PaintingMatcher, RankedMatch};
use crate::rectifier::FrameRectifier;

/// A painting found in a photo.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identification {
    /// The frame in the coordinates of the photo.
    pub polygon: Polygon4,
    /// The ranked reference records.
    #[serde(skip)]
    pub matches: Vec<RankedMatch>,
    /// Labels of the best ranked record, if any record was scored.
    pub best: Option<Resolution>,
    /// Distance of the best ranked record.
    pub distance: Option<f64>,
}

/// Detects, rectifies and identifies every painting in a photo.
pub struct PaintingIdentifier {
    detector: FrameDetector,
    rectifier: FrameRectifier,
    matcher: PaintingMatcher,
}

impl PaintingIdentifier {
    /// Create an identifier.
    pub fn new(detector: FrameDetector, matcher: PaintingMatcher) -> Self {
        Self {
            detector,
            rectifier: FrameRectifier::new(),
            matcher,
        }
    }

    /// The matcher and its corpus.
    pub fn matcher(&self) -> &PaintingMatcher {
        &self.matcher
    }

    /// Identify the paintings in a photo.
    ///
    /// # Returns
    ///
    /// One identification per detected frame that rectifies to a non-empty crop, in
    /// detection order, and the detector's annotated image.
    pub fn identify_annotated(
        &self,
        image: &Image<u8, 3>,
        strategy: MatchStrategy,
    ) -> Result<(Vec<Identification>, Image<u8, 3>), PaintingError> {
        let (polygons, annotated) = self.detector.detect(image)?;
        let polygons = rescale_polygons(&polygons, annotated.size(), image.size());

        let mut identifications = Vec::with_capacity(polygons.len());
        for polygon in polygons {
            if let Some(identification) = self.identify_frame(polygon, image, strategy)? {
                identifications.push(identification);
            }
        }

        log::debug!(
            "identified {} of the detected frames",
            identifications.iter().filter(|i| i.best.is_some()).count()
        );

        Ok((identifications, annotated))
    }

    /// Identify the painting inside one frame of a photo.
    ///
    /// # Returns
    ///
    /// `None` when the frame yields no usable region: its rectified crop is empty or
    /// its corners do not define a perspective transform.
    pub fn identify_frame(
        &self,
        polygon: Polygon4,
        image: &Image<u8, 3>,
        strategy: MatchStrategy,
    ) -> Result<Option<Identification>, PaintingError> {
        let crop = match self.rectifier.rectify(&polygon, image) {
            Ok((_, crop)) => crop,
            Err(PaintingError::DegenerateTransform(corners)) => {
                log::warn!("skipping frame {corners:?}, it cannot be rectified");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        if crop.is_empty() {
            log::warn!("skipping frame {:?}, the crop is empty", polygon.to_array());
            return Ok(None);
        }

        let matches = self.matcher.match_image(&crop, strategy)?;
        let best = matches
            .first()
            .map(|m| self.matcher.corpus().resolve(m.index))
            .transpose()?;

        Ok(Some(Identification {
            polygon,
            distance: matches.first().map(|m| m.distance),
            best,
            matches,
        }))
    }

    /// Identify the paintings in a photo, see [`Self::identify_annotated`].
    pub fn identify(
        &self,
        image: &Image<u8, 3>,
        strategy: MatchStrategy,
    ) -> Result<Vec<Identification>, PaintingError> {
        Ok(self.identify_annotated(image, strategy)?.0)
    }
}
