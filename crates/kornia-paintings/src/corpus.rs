use std::collections::HashSet;
use std::path::Path;

use kornia_imgproc::features::{Keypoint, OrbDescriptor};
use serde::{Deserialize, Serialize};

use crate::config::read_json;
use crate::error::PaintingError;

/// A serializable ORB keypoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeypointRecord {
    /// Position as `[x, y]` in the resized reference image.
    pub pt: [f32; 2],
    /// Diameter of the described neighbourhood.
    pub size: f32,
    /// Orientation in degrees.
    pub angle: f32,
    /// Corner response.
    pub response: f32,
    /// Pyramid level.
    pub octave: i32,
    /// Object class, -1 when unused.
    pub class_id: i32,
}

impl From<&Keypoint> for KeypointRecord {
    fn from(kp: &Keypoint) -> Self {
        Self {
            pt: [kp.x, kp.y],
            size: kp.size,
            angle: kp.angle,
            response: kp.response,
            octave: kp.octave,
            class_id: kp.class_id,
        }
    }
}

/// One labeled reference photograph of a painting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRecord")]
pub struct ReferenceRecord {
    id: String,
    room: String,
    photo: String,
    painting_number: u32,
    keypoints: Vec<KeypointRecord>,
    descriptors: Vec<OrbDescriptor>,
    fvector: Vec<f32>,
}

#[derive(Deserialize)]
struct RawRecord {
    id: String,
    room: String,
    photo: String,
    painting_number: u32,
    keypoints: Vec<KeypointRecord>,
    descriptors: Vec<OrbDescriptor>,
    #[serde(default)]
    fvector: Vec<f32>,
}

impl TryFrom<RawRecord> for ReferenceRecord {
    type Error = PaintingError;

    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        ReferenceRecord::new(
            raw.id,
            raw.room,
            raw.photo,
            raw.painting_number,
            raw.keypoints,
            raw.descriptors,
            (!raw.fvector.is_empty()).then_some(raw.fvector),
        )
    }
}

impl ReferenceRecord {
    /// Create a record.
    ///
    /// # Errors
    ///
    /// [`PaintingError::CorpusMismatch`] when there is not exactly one descriptor per
    /// keypoint.
    pub fn new(
        id: impl Into<String>,
        room: impl Into<String>,
        photo: impl Into<String>,
        painting_number: u32,
        keypoints: Vec<KeypointRecord>,
        descriptors: Vec<OrbDescriptor>,
        fvector: Option<Vec<f32>>,
    ) -> Result<Self, PaintingError> {
        let id = id.into();
        if descriptors.len() != keypoints.len() {
            return Err(PaintingError::CorpusMismatch {
                id,
                descriptors: descriptors.len(),
                keypoints: keypoints.len(),
            });
        }

        Ok(Self {
            id,
            room: room.into(),
            photo: photo.into(),
            painting_number,
            keypoints,
            descriptors,
            fvector: fvector.unwrap_or_default(),
        })
    }

    /// Unique identifier, the reference file name.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Room the painting hangs in.
    pub fn room(&self) -> &str {
        &self.room
    }

    /// Photo identifier within the room.
    pub fn photo(&self) -> &str {
        &self.photo
    }

    /// Painting number within the photo.
    pub fn painting_number(&self) -> u32 {
        self.painting_number
    }

    /// ORB keypoints, parallel to [`Self::descriptors`].
    pub fn keypoints(&self) -> &[KeypointRecord] {
        &self.keypoints
    }

    /// ORB descriptors.
    pub fn descriptors(&self) -> &[OrbDescriptor] {
        &self.descriptors
    }

    /// The embedding, if one was stored.
    pub fn fvector(&self) -> Option<&[f32]> {
        (!self.fvector.is_empty()).then_some(self.fvector.as_slice())
    }
}

/// Where a reference painting is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Room name.
    pub room: String,
    /// Photo identifier.
    pub photo: String,
    /// Painting number.
    pub painting_number: u32,
}

/// The reference database, an immutable arena of records addressed by index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceCorpus {
    records: Vec<ReferenceRecord>,
}

impl ReferenceCorpus {
    /// Create a corpus.
    ///
    /// # Errors
    ///
    /// [`PaintingError::InvalidInput`] when two records share an id.
    pub fn new(records: Vec<ReferenceRecord>) -> Result<Self, PaintingError> {
        let mut ids = HashSet::with_capacity(records.len());
        for record in records.iter() {
            if !ids.insert(record.id()) {
                return Err(PaintingError::InvalidInput(format!(
                    "duplicate record id: {}",
                    record.id()
                )));
            }
        }
        Ok(Self { records })
    }

    /// Load a corpus from a JSON file written by [`Self::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PaintingError> {
        let path = path.as_ref();
        let corpus: ReferenceCorpus = read_json(path)?;
        let corpus = Self::new(corpus.records)?;
        log::info!(
            "loaded {} reference records from {}",
            corpus.len(),
            path.display()
        );
        Ok(corpus)
    }

    /// Write the corpus as JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PaintingError> {
        let path = path.as_ref();
        let file = std::fs::File::create(path)?;
        serde_json::to_writer(std::io::BufWriter::new(file), self)?;
        log::info!(
            "saved {} reference records to {}",
            self.len(),
            path.display()
        );
        Ok(())
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the corpus has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in index order.
    pub fn records(&self) -> &[ReferenceRecord] {
        &self.records
    }

    /// The record at `index`.
    pub fn get(&self, index: usize) -> Result<&ReferenceRecord, PaintingError> {
        self.records
            .get(index)
            .ok_or(PaintingError::RecordIndexOutOfBounds(index, self.records.len()))
    }

    /// Room, photo and painting number of the record at `index`.
    pub fn resolve(&self, index: usize) -> Result<Resolution, PaintingError> {
        let record = self.get(index)?;
        Ok(Resolution {
            room: record.room.clone(),
            photo: record.photo.clone(),
            painting_number: record.painting_number,
        })
    }

    /// File name of the record at `index`.
    pub fn filename(&self, index: usize) -> Result<&str, PaintingError> {
        Ok(self.get(index)?.id())
    }

    /// Room of the record at `index`.
    pub fn room(&self, index: usize) -> Result<&str, PaintingError> {
        Ok(self.get(index)?.room())
    }

    /// Photo of the record at `index`.
    pub fn photo(&self, index: usize) -> Result<&str, PaintingError> {
        Ok(self.get(index)?.photo())
    }

    /// Painting number of the record at `index`.
    pub fn painting_number(&self, index: usize) -> Result<u32, PaintingError> {
        Ok(self.get(index)?.painting_number())
    }
}

/// Labels encoded in a reference file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFilename {
    /// Room name.
    pub room: String,
    /// Photo identifier.
    pub photo: String,
    /// Painting number.
    pub painting_number: u32,
}

/// Parse a reference file name of the form `room__IMG_XXXX__NN...`.
///
/// The name is split on `__`. The room is the first part, the photo is the second
/// part without its 4 character prefix and the painting number is the integer in
/// the first two characters of the third part.
///
/// # Example
///
/// ```
/// use kornia_paintings::corpus::parse_reference_filename;
///
/// let parsed = parse_reference_filename("zaal_1__IMG_20190323_111717__01.png").unwrap();
/// assert_eq!(parsed.room, "zaal_1");
/// assert_eq!(parsed.photo, "20190323_111717");
/// assert_eq!(parsed.painting_number, 1);
/// ```
pub fn parse_reference_filename(name: &str) -> Result<ParsedFilename, PaintingError> {
    let invalid = || PaintingError::InvalidFilename(name.to_string());

    let parts: Vec<&str> = name.split("__").collect();
    if parts.len() < 3 || parts[0].is_empty() {
        return Err(invalid());
    }

    let photo = parts[1].get(4..).ok_or_else(invalid)?;
    let painting_number = parts[2]
        .get(..2)
        .and_then(|n| n.parse::<u32>().ok())
        .ok_or_else(invalid)?;

    Ok(ParsedFilename {
        room: parts[0].to_string(),
        photo: photo.to_string(),
        painting_number,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, n: usize, fvector: Option<Vec<f32>>) -> Result<ReferenceRecord, PaintingError> {
        let keypoints = (0..n)
            .map(|i| KeypointRecord {
                pt: [i as f32, 2.0 * i as f32],
                size: 31.0,
                angle: 12.5 * i as f32,
                response: 1e-3,
                octave: (i % 3) as i32,
                class_id: -1,
            })
            .collect();
        let descriptors = (0..n).map(|i| [i as u8; 32]).collect();
        ReferenceRecord::new(id, "zaal_1", "1234", 3, keypoints, descriptors, fvector)
    }

    #[test]
    fn record_invariant() {
        let res = ReferenceRecord::new("a", "r", "p", 1, vec![], vec![[0u8; 32]], None);
        assert!(matches!(
            res,
            Err(PaintingError::CorpusMismatch {
                descriptors: 1,
                keypoints: 0,
                ..
            })
        ));
    }

    #[test]
    fn accessors_and_bounds() -> Result<(), PaintingError> {
        let corpus = ReferenceCorpus::new(vec![
            record("a.png", 2, None)?,
            record("b.png", 3, Some(vec![0.5, 0.5]))?,
        ])?;

        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.filename(1)?, "b.png");
        assert_eq!(corpus.room(0)?, "zaal_1");
        assert_eq!(corpus.photo(0)?, "1234");
        assert_eq!(corpus.painting_number(1)?, 3);
        assert_eq!(corpus.get(0)?.fvector(), None);
        assert_eq!(corpus.get(1)?.fvector(), Some([0.5f32, 0.5].as_slice()));
        assert_eq!(
            corpus.resolve(1)?,
            Resolution {
                room: "zaal_1".to_string(),
                photo: "1234".to_string(),
                painting_number: 3,
            }
        );
        assert!(matches!(
            corpus.resolve(2),
            Err(PaintingError::RecordIndexOutOfBounds(2, 2))
        ));
        Ok(())
    }

    #[test]
    fn duplicate_ids() -> Result<(), PaintingError> {
        let res = ReferenceCorpus::new(vec![record("a.png", 1, None)?, record("a.png", 2, None)?]);
        assert!(matches!(res, Err(PaintingError::InvalidInput(_))));
        Ok(())
    }

    #[test]
    fn json_round_trip() -> Result<(), PaintingError> {
        let corpus = ReferenceCorpus::new(vec![
            record("a.png", 4, Some(vec![0.25, -1.5, 3.0]))?,
            record("b.png", 0, None)?,
        ])?;

        let dir = tempfile::tempdir()?;
        let path = dir.path().join("corpus.json");
        corpus.save(&path)?;

        let loaded = ReferenceCorpus::load(&path)?;
        assert_eq!(loaded, corpus);

        // records without an embedding are stored with an empty one
        let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        assert_eq!(json["records"][1]["fvector"], serde_json::json!([]));
        Ok(())
    }

    #[test]
    fn load_rejects_mismatched_record() -> Result<(), PaintingError> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("corpus.json");
        let descriptor = serde_json::to_string(&[7u8; 32])?;
        std::fs::write(
            &path,
            format!(
                r#"{{"records": [{{"id": "x", "room": "r", "photo": "p", "painting_number": 1,
                    "keypoints": [], "descriptors": [{descriptor}], "fvector": []}}]}}"#
            ),
        )?;

        assert!(matches!(
            ReferenceCorpus::load(&path),
            Err(PaintingError::Json(_))
        ));
        Ok(())
    }

    #[test]
    fn filenames() -> Result<(), PaintingError> {
        let parsed = parse_reference_filename("Zaal_A__IMG_0042__12_cropped.jpg")?;
        assert_eq!(
            parsed,
            ParsedFilename {
                room: "Zaal_A".to_string(),
                photo: "0042".to_string(),
                painting_number: 12,
            }
        );

        for name in [
            "no_separators.png",
            "room__photo.png",
            "room__abc__xy.png",
            "room__ab__01.png",
            "__photo1__01.png",
            "room__photo1__1",
        ] {
            assert!(
                matches!(
                    parse_reference_filename(name),
                    Err(PaintingError::InvalidFilename(_))
                ),
                "{name}"
            );
        }
        Ok(())
    }
}
