use kornia_image::Image;
use kornia_imgproc::{
    color::gray_from_rgb_u8,
    features::{match_descriptors, Keypoint, OrbConfig, OrbDescriptor, OrbDetector},
    resize::resize_to_width,
};
use rayon::prelude::*;

use crate::config::MatcherConfig;
use crate::corpus::ReferenceCorpus;
use crate::embedder::Embedder;
use crate::error::PaintingError;
use crate::metrics::Metric;

/// How a query is compared to the reference records.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MatchStrategy {
    /// Sum of the best ORB descriptor distances.
    #[default]
    KeypointOnly,
    /// Distance between embeddings.
    EmbeddingOnly(Metric),
    /// Embedding shortlist re-ranked by the keypoint score.
    Combined(Metric),
}

/// A reference record and its distance to the query, lower is closer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedMatch {
    /// Index of the record in the corpus.
    pub index: usize,
    /// Distance to the query.
    pub distance: f64,
}

/// Ranks the records of a [`ReferenceCorpus`] against query images.
///
/// The matcher holds no mutable state and can be shared between threads.
pub struct PaintingMatcher {
    corpus: ReferenceCorpus,
    config: MatcherConfig,
    orb: OrbDetector,
    embedder: Option<Box<dyn Embedder>>,
}

/// Resize an image to `width`, convert it to grayscale and extract ORB features.
pub(crate) fn orb_features(
    orb: &OrbDetector,
    image: &Image<u8, 3>,
    width: usize,
) -> Result<(Vec<Keypoint>, Vec<OrbDescriptor>), PaintingError> {
    let resized = resize_to_width(image, width)?;
    let mut gray = Image::from_size_val(resized.size(), 0u8)?;
    gray_from_rgb_u8(&resized, &mut gray)?;
    Ok(orb.detect_and_compute(&gray)?)
}

/// The ORB extractor shared by the queries and the corpus builder.
pub(crate) fn orb_detector(config: &MatcherConfig) -> OrbDetector {
    OrbDetector::new(OrbConfig::default().with_n_features(config.n_features))
}

/// Sort matches by increasing distance, keeping the corpus order on ties.
fn sort_matches(matches: &mut [RankedMatch]) {
    matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));
}

impl PaintingMatcher {
    /// Create a matcher over a corpus.
    pub fn new(corpus: ReferenceCorpus, config: MatcherConfig) -> Result<Self, PaintingError> {
        config.validate()?;
        Ok(Self {
            orb: orb_detector(&config),
            corpus,
            config,
            embedder: None,
        })
    }

    /// Set the embedder used by the embedding strategies.
    pub fn with_embedder(mut self, embedder: impl Embedder + 'static) -> Self {
        self.embedder = Some(Box::new(embedder));
        self
    }

    /// The reference corpus.
    pub fn corpus(&self) -> &ReferenceCorpus {
        &self.corpus
    }

    /// The matcher parameters.
    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Rank the corpus records against a query image.
    ///
    /// # Arguments
    ///
    /// * `image` - The query, usually a rectified frame.
    /// * `strategy` - How records are scored.
    ///
    /// # Returns
    ///
    /// The scored records by increasing distance. Records without enough
    /// descriptor matches or without an embedding are left out, so the list may be
    /// empty.
    ///
    /// # Errors
    ///
    /// * [`PaintingError::InvalidInput`] when the query is empty.
    /// * [`PaintingError::MissingEmbedder`] for an embedding strategy without an embedder.
    /// * [`PaintingError::EmbeddingDimensionMismatch`] when a stored embedding does not
    ///   have the length of the query embedding.
    pub fn match_image(
        &self,
        image: &Image<u8, 3>,
        strategy: MatchStrategy,
    ) -> Result<Vec<RankedMatch>, PaintingError> {
        if image.is_empty() {
            return Err(PaintingError::InvalidInput(
                "cannot match an empty image".to_string(),
            ));
        }

        let matches = match strategy {
            MatchStrategy::KeypointOnly => self.keypoint_rank(image)?,
            MatchStrategy::EmbeddingOnly(metric) => self.embedding_rank(image, metric)?,
            MatchStrategy::Combined(metric) => self.combined_rank(image, metric)?,
        };

        log::debug!(
            "{strategy:?} scored {} of {} records",
            matches.len(),
            self.corpus.len()
        );

        Ok(matches)
    }

    /// Sum of the `best_matches` smallest cross-checked distances, `None` when the
    /// record has fewer matches.
    fn keypoint_score(&self, record: &[OrbDescriptor], query: &[OrbDescriptor]) -> Option<f64> {
        let mut distances: Vec<u32> = match_descriptors(record, query, None, true, None)
            .iter()
            .map(|m| m.distance)
            .collect();

        let n = self.config.best_matches;
        if distances.len() < n {
            return None;
        }

        distances.sort_unstable();
        Some(distances[..n].iter().map(|&d| d as f64).sum())
    }

    fn query_descriptors(&self, image: &Image<u8, 3>) -> Result<Vec<OrbDescriptor>, PaintingError> {
        let (_, descriptors) = orb_features(&self.orb, image, self.config.query_width)?;
        Ok(descriptors)
    }

    fn keypoint_rank(&self, image: &Image<u8, 3>) -> Result<Vec<RankedMatch>, PaintingError> {
        let query = self.query_descriptors(image)?;
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let mut matches: Vec<RankedMatch> = self
            .corpus
            .records()
            .par_iter()
            .enumerate()
            .filter_map(|(index, record)| {
                self.keypoint_score(record.descriptors(), &query)
                    .map(|distance| RankedMatch { index, distance })
            })
            .collect();

        sort_matches(&mut matches);
        Ok(matches)
    }

    fn embedding_rank(
        &self,
        image: &Image<u8, 3>,
        metric: Metric,
    ) -> Result<Vec<RankedMatch>, PaintingError> {
        let embedder = self
            .embedder
            .as_ref()
            .ok_or(PaintingError::MissingEmbedder)?;
        let query = embedder.embed(image)?;

        let scored: Vec<Option<RankedMatch>> = self
            .corpus
            .records()
            .par_iter()
            .enumerate()
            .map(|(index, record)| {
                record
                    .fvector()
                    .map(|fvector| {
                        metric
                            .distance(&query, fvector)
                            .map(|distance| RankedMatch { index, distance })
                    })
                    .transpose()
            })
            .collect::<Result<_, _>>()?;

        let mut matches: Vec<RankedMatch> = scored.into_iter().flatten().collect();
        sort_matches(&mut matches);
        Ok(matches)
    }

    fn combined_rank(
        &self,
        image: &Image<u8, 3>,
        metric: Metric,
    ) -> Result<Vec<RankedMatch>, PaintingError> {
        let mut shortlist = self.embedding_rank(image, metric)?;
        shortlist.truncate(self.config.shortlist_size);

        let query = self.query_descriptors(image)?;
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let mut matches: Vec<RankedMatch> = shortlist
            .par_iter()
            .filter_map(|candidate| {
                let record = &self.corpus.records()[candidate.index];
                self.keypoint_score(record.descriptors(), &query)
                    .map(|distance| RankedMatch {
                        index: candidate.index,
                        distance,
                    })
            })
            .collect();

        sort_matches(&mut matches);
        Ok(matches)
    }
}
