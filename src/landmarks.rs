//! Face landmark model: named regions, the concatenated point set used for
//! matching, and the per-frame detector output.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{NormalizedRect, Point};

/// The named landmark regions a face detector reports.
///
/// Declaration order is the order regions are concatenated into
/// [`FaceLandmarks::all_points`]; do not reorder variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LandmarkRegion {
    FaceContour,
    LeftEyebrow,
    RightEyebrow,
    NoseCrest,
    Nose,
    MedianLine,
    LeftEye,
    RightEye,
    LeftPupil,
    RightPupil,
    OuterLips,
    InnerLips,
}

impl LandmarkRegion {
    pub const ALL: [LandmarkRegion; 12] = [
        LandmarkRegion::FaceContour,
        LandmarkRegion::LeftEyebrow,
        LandmarkRegion::RightEyebrow,
        LandmarkRegion::NoseCrest,
        LandmarkRegion::Nose,
        LandmarkRegion::MedianLine,
        LandmarkRegion::LeftEye,
        LandmarkRegion::RightEye,
        LandmarkRegion::LeftPupil,
        LandmarkRegion::RightPupil,
        LandmarkRegion::OuterLips,
        LandmarkRegion::InnerLips,
    ];

    /// Closed regions connect their last point back to the first when drawn.
    pub fn is_closed(self) -> bool {
        matches!(
            self,
            LandmarkRegion::LeftEye
                | LandmarkRegion::RightEye
                | LandmarkRegion::LeftPupil
                | LandmarkRegion::RightPupil
                | LandmarkRegion::OuterLips
                | LandmarkRegion::InnerLips
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            LandmarkRegion::FaceContour => "faceContour",
            LandmarkRegion::LeftEyebrow => "leftEyebrow",
            LandmarkRegion::RightEyebrow => "rightEyebrow",
            LandmarkRegion::NoseCrest => "noseCrest",
            LandmarkRegion::Nose => "nose",
            LandmarkRegion::MedianLine => "medianLine",
            LandmarkRegion::LeftEye => "leftEye",
            LandmarkRegion::RightEye => "rightEye",
            LandmarkRegion::LeftPupil => "leftPupil",
            LandmarkRegion::RightPupil => "rightPupil",
            LandmarkRegion::OuterLips => "outerLips",
            LandmarkRegion::InnerLips => "innerLips",
        }
    }
}

impl std::fmt::Display for LandmarkRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Landmarks for one detected face.
///
/// Region points are normalized to the face bounding box (origin bottom-left).
/// Any region may be missing. `all_points` is the sequence compared by the
/// matcher; two faces are comparable only when these have equal length.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FaceLandmarks {
    #[serde(default)]
    regions: BTreeMap<LandmarkRegion, Vec<Point>>,

    #[serde(default, rename = "allPoints")]
    all_points: Option<Vec<Point>>,
}

impl FaceLandmarks {
    /// Build landmarks from regions, deriving `all_points` by concatenating
    /// every present region in [`LandmarkRegion::ALL`] order.
    ///
    /// Empty regions are dropped.
    pub fn from_regions<I>(regions: I) -> Self
    where
        I: IntoIterator<Item = (LandmarkRegion, Vec<Point>)>,
    {
        let regions: BTreeMap<_, _> = regions
            .into_iter()
            .filter(|(_, points)| !points.is_empty())
            .collect();

        let mut landmarks = Self {
            regions,
            all_points: None,
        };
        landmarks.all_points = landmarks.concatenated_points();
        landmarks
    }

    /// Replace the derived point sequence with one supplied by the detector.
    pub fn with_all_points(mut self, points: Vec<Point>) -> Self {
        self.all_points = if points.is_empty() { None } else { Some(points) };
        self
    }

    pub fn region(&self, region: LandmarkRegion) -> Option<&[Point]> {
        self.regions
            .get(&region)
            .map(Vec::as_slice)
            .filter(|points| !points.is_empty())
    }

    /// Present regions in drawing order.
    pub fn regions(&self) -> impl Iterator<Item = (LandmarkRegion, &[Point])> + '_ {
        LandmarkRegion::ALL
            .iter()
            .filter_map(move |&region| self.region(region).map(|points| (region, points)))
    }

    /// The full point set compared by the matcher.
    ///
    /// When deserialized without a non-empty `allPoints` field this falls back
    /// to concatenating the regions. Never returns an empty sequence.
    pub fn all_points(&self) -> Option<std::borrow::Cow<'_, [Point]>> {
        match &self.all_points {
            Some(points) if !points.is_empty() => {
                Some(std::borrow::Cow::Borrowed(points.as_slice()))
            }
            _ => self.concatenated_points().map(std::borrow::Cow::Owned),
        }
    }

    pub fn num_points(&self) -> usize {
        self.all_points().map_or(0, |points| points.len())
    }

    pub fn is_empty(&self) -> bool {
        self.all_points().is_none()
    }

    fn concatenated_points(&self) -> Option<Vec<Point>> {
        let points: Vec<Point> = self
            .regions()
            .flat_map(|(_, points)| points.iter().copied())
            .collect();
        if points.is_empty() {
            None
        } else {
            Some(points)
        }
    }
}

/// One detected face: its bounding box in detector space plus landmarks, if
/// the detector produced any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceObservation {
    #[serde(rename = "boundingBox")]
    pub bounding_box: NormalizedRect,

    #[serde(default)]
    pub landmarks: Option<FaceLandmarks>,
}

impl FaceObservation {
    pub fn new(bounding_box: NormalizedRect, landmarks: FaceLandmarks) -> Self {
        Self {
            bounding_box,
            landmarks: Some(landmarks),
        }
    }

    /// Load an observation snapshot from a binary file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let observation: Self = bincode::deserialize(&bytes)?;
        Ok(observation)
    }

    /// Save the observation to a binary file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        let bytes = bincode::serialize(self)?;
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(())
    }
}

/// Everything the detector reported for one analyzed frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Frame {
    #[serde(default)]
    pub faces: Vec<FaceObservation>,

    /// Detected text rectangles, detector space.
    #[serde(default)]
    pub texts: Vec<NormalizedRect>,
}

impl Frame {
    /// The single face of this frame, if exactly one was detected.
    pub fn sole_face(&self) -> Option<&FaceObservation> {
        match self.faces.as_slice() {
            [face] => Some(face),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eye(offset: f32) -> Vec<Point> {
        vec![
            Point::new(offset, 0.6),
            Point::new(offset + 0.05, 0.65),
            Point::new(offset + 0.1, 0.6),
        ]
    }

    #[test]
    fn all_points_follow_region_order() {
        let landmarks = FaceLandmarks::from_regions(vec![
            (LandmarkRegion::RightEye, eye(0.6)),
            (LandmarkRegion::LeftEye, eye(0.2)),
        ]);

        let all = landmarks.all_points().unwrap();
        assert_eq!(all.len(), 6);
        // left eye precedes right eye regardless of insertion order
        assert_eq!(all[0], Point::new(0.2, 0.6));
        assert_eq!(all[3], Point::new(0.6, 0.6));
    }

    #[test]
    fn empty_regions_are_absent() {
        let landmarks = FaceLandmarks::from_regions(vec![
            (LandmarkRegion::Nose, Vec::new()),
            (LandmarkRegion::LeftEye, eye(0.2)),
        ]);
        assert!(landmarks.region(LandmarkRegion::Nose).is_none());
        assert_eq!(landmarks.regions().count(), 1);
        assert_eq!(landmarks.num_points(), 3);
    }

    #[test]
    fn no_regions_means_no_points() {
        let landmarks = FaceLandmarks::from_regions(Vec::new());
        assert!(landmarks.all_points().is_none());
        assert!(landmarks.is_empty());
    }

    #[test]
    fn explicit_all_points_win() {
        let landmarks = FaceLandmarks::from_regions(vec![(LandmarkRegion::LeftEye, eye(0.2))])
            .with_all_points(vec![Point::new(0.5, 0.5)]);
        assert_eq!(landmarks.num_points(), 1);
    }

    #[test]
    fn empty_all_points_from_json_are_absent() {
        let landmarks: FaceLandmarks =
            serde_json::from_str(r#"{"regions": {"nose": []}, "allPoints": []}"#).unwrap();
        assert!(landmarks.all_points().is_none());
        assert!(landmarks.is_empty());
        assert_eq!(landmarks.num_points(), 0);

        let with_regions: FaceLandmarks = serde_json::from_str(
            r#"{"regions": {"leftEye": [{"x": 0.1, "y": 0.2}]}, "allPoints": []}"#,
        )
        .unwrap();
        assert_eq!(with_regions.num_points(), 1);
    }

    #[test]
    fn closed_regions() {
        assert!(LandmarkRegion::LeftEye.is_closed());
        assert!(LandmarkRegion::InnerLips.is_closed());
        assert!(!LandmarkRegion::FaceContour.is_closed());
        assert!(!LandmarkRegion::MedianLine.is_closed());
        assert!(!LandmarkRegion::LeftEyebrow.is_closed());
    }

    #[test]
    fn frame_json_without_all_points() {
        let json = r#"{
            "faces": [{
                "boundingBox": {"x": 0.2, "y": 0.3, "width": 0.4, "height": 0.4},
                "landmarks": {"regions": {"leftEye": [{"x": 0.1, "y": 0.2}, {"x": 0.3, "y": 0.4}]}}
            }]
        }"#;
        let frame: Frame = serde_json::from_str(json).unwrap();
        assert!(frame.texts.is_empty());
        let face = frame.sole_face().unwrap();
        let landmarks = face.landmarks.as_ref().unwrap();
        assert_eq!(landmarks.num_points(), 2);
    }

    #[test]
    fn save_and_load_observation() {
        let observation = FaceObservation::new(
            NormalizedRect::new(0.25, 0.25, 0.5, 0.5),
            FaceLandmarks::from_regions(vec![(LandmarkRegion::OuterLips, eye(0.4))]),
        );

        let temp_path = std::env::temp_dir().join("see_some_id_observation.bin");
        observation.save(&temp_path).unwrap();

        let loaded = FaceObservation::load(&temp_path).unwrap();
        assert_eq!(loaded, observation);

        std::fs::remove_file(temp_path).ok();
    }
}
