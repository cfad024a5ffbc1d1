use std::path::{Path, PathBuf};

use kornia_image::Image;
use kornia_imgproc::features::OrbDetector;
use kornia_io::functional::read_image_any_rgb8;
use rayon::prelude::*;

use crate::config::MatcherConfig;
use crate::corpus::{parse_reference_filename, KeypointRecord, ReferenceCorpus, ReferenceRecord};
use crate::embedder::Embedder;
use crate::error::PaintingError;
use crate::matcher::{orb_detector, orb_features};

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Builds a [`ReferenceCorpus`] from labeled photographs.
///
/// Each photograph is resized to the query width of the [`MatcherConfig`] and
/// described with the same ORB extractor as the queries, so reference and query
/// descriptors are comparable.
pub struct CorpusBuilder {
    orb: OrbDetector,
    width: usize,
    embedder: Option<Box<dyn Embedder>>,
}

impl CorpusBuilder {
    /// Create a builder extracting features like a matcher with `config`.
    pub fn new(config: &MatcherConfig) -> Result<Self, PaintingError> {
        config.validate()?;
        Ok(Self {
            orb: orb_detector(config),
            width: config.query_width,
            embedder: None,
        })
    }

    /// Also store the embedding of every photograph.
    pub fn with_embedder(mut self, embedder: impl Embedder + 'static) -> Self {
        self.embedder = Some(Box::new(embedder));
        self
    }

    /// Describe one photograph.
    ///
    /// # Arguments
    ///
    /// * `id` - The file name, parsed with [`parse_reference_filename`].
    /// * `image` - The photograph.
    pub fn record_from_image(
        &self,
        id: &str,
        image: &Image<u8, 3>,
    ) -> Result<ReferenceRecord, PaintingError> {
        let labels = parse_reference_filename(id)?;
        if image.is_empty() {
            return Err(PaintingError::InvalidInput(format!("{id} is empty")));
        }

        let (keypoints, descriptors) = orb_features(&self.orb, image, self.width)?;
        let fvector = self
            .embedder
            .as_ref()
            .map(|embedder| embedder.embed(image))
            .transpose()?;

        ReferenceRecord::new(
            id,
            labels.room,
            labels.photo,
            labels.painting_number,
            keypoints.iter().map(KeypointRecord::from).collect(),
            descriptors,
            fvector,
        )
    }

    /// Describe every photograph of a directory.
    ///
    /// Files with a `png`, `jpg` or `jpeg` extension are read in file name order,
    /// so the record indices are reproducible. Files whose name does not follow
    /// the reference naming convention are skipped with a warning.
    pub fn build_from_directory(
        &self,
        directory: impl AsRef<Path>,
    ) -> Result<ReferenceCorpus, PaintingError> {
        let directory = directory.as_ref();

        let mut files: Vec<(String, PathBuf)> = Vec::new();
        for entry in std::fs::read_dir(directory)? {
            let path = entry?.path();
            if !path.is_file() || !has_image_extension(&path) {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                log::warn!("skipping {}, the file name is not UTF-8", path.display());
                continue;
            };
            if let Err(e) = parse_reference_filename(name) {
                log::warn!("skipping {}: {e}", path.display());
                continue;
            }
            files.push((name.to_string(), path));
        }
        files.sort_by(|a, b| a.0.cmp(&b.0));

        let records = files
            .par_iter()
            .map(|(name, path)| -> Result<ReferenceRecord, PaintingError> {
                let image = read_image_any_rgb8(path)?;
                let record = self.record_from_image(name, &image)?;
                log::debug!("{name}: {} keypoints", record.keypoints().len());
                Ok(record)
            })
            .collect::<Result<Vec<_>, _>>()?;

        log::info!(
            "built {} reference records from {}",
            records.len(),
            directory.display()
        );

        ReferenceCorpus::new(records)
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::FixedEmbedder;

    #[test]
    fn extensions() {
        assert!(has_image_extension(Path::new("a/b__IMG_1__01.PNG")));
        assert!(has_image_extension(Path::new("x.jpeg")));
        assert!(!has_image_extension(Path::new("x.json")));
        assert!(!has_image_extension(Path::new("png")));
    }

    #[test]
    fn record_labels_and_embedding() -> Result<(), PaintingError> {
        let builder = CorpusBuilder::new(&MatcherConfig::default())?
            .with_embedder(FixedEmbedder(vec![0.5; 4]));
        let image = Image::<u8, 3>::from_size_val([80, 60].into(), 50)?;

        let record = builder.record_from_image("zaal_2__IMG_0007__03.jpg", &image)?;
        assert_eq!(record.room(), "zaal_2");
        assert_eq!(record.photo(), "0007");
        assert_eq!(record.painting_number(), 3);
        assert_eq!(record.fvector(), Some([0.5f32; 4].as_slice()));
        // a flat image has no corners
        assert!(record.descriptors().is_empty());

        assert!(matches!(
            builder.record_from_image("unlabeled.jpg", &image),
            Err(PaintingError::InvalidFilename(_))
        ));
        Ok(())
    }
}
