//! Landmark-based face comparison.
//!
//! The score is the plain sum of squared point distances in normalized space,
//! with no division by point count and no per-region weighting: regions with
//! more points (the face contour) weigh more.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ComparisonGap, Error, Result};
use crate::landmarks::FaceLandmarks;

/// Scores strictly below this are a match.
pub const MATCH_THRESHOLD: f32 = 0.1;

/// Sum of squared distances between corresponding points of `current` and
/// `reference`.
///
/// Fails with [`Error::ComparisonUnavailable`] when either side has no points
/// or the point counts differ. The sum is accumulated in f64.
pub fn score(current: &FaceLandmarks, reference: &FaceLandmarks) -> Result<f32> {
    let current = current
        .all_points()
        .filter(|points| !points.is_empty())
        .ok_or(Error::ComparisonUnavailable {
            reason: ComparisonGap::MissingCurrent,
        })?;
    let reference = reference
        .all_points()
        .filter(|points| !points.is_empty())
        .ok_or(Error::ComparisonUnavailable {
            reason: ComparisonGap::MissingReference,
        })?;

    if current.len() != reference.len() {
        return Err(Error::ComparisonUnavailable {
            reason: ComparisonGap::LengthMismatch {
                current: current.len(),
                reference: reference.len(),
            },
        });
    }

    let sum: f64 = current
        .iter()
        .zip(reference.iter())
        .map(|(c, r)| c.distance_squared(r))
        .sum();

    Ok(sum as f32)
}

/// Whether `score` is below the default threshold.
pub fn is_match(score: f32) -> bool {
    score < MATCH_THRESHOLD
}

/// Outcome of comparing one live face against the reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchDecision {
    pub score: f32,
    pub matched: bool,
}

/// Threshold-holding comparator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matcher {
    threshold: f32,
}

impl Matcher {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn is_match(&self, score: f32) -> bool {
        score < self.threshold
    }

    /// Score `current` against `reference` and apply the threshold.
    pub fn compare(&self, current: &FaceLandmarks, reference: &FaceLandmarks) -> Result<MatchDecision> {
        let score = score(current, reference)?;
        let matched = self.is_match(score);
        debug!(score, threshold = self.threshold, matched, "compared face to reference");
        Ok(MatchDecision { score, matched })
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(MATCH_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::LandmarkRegion;
    use crate::types::Point;

    fn uniform(n: usize, x: f32, y: f32) -> FaceLandmarks {
        FaceLandmarks::from_regions(vec![(LandmarkRegion::FaceContour, vec![Point::new(x, y); n])])
    }

    fn sample_face() -> FaceLandmarks {
        FaceLandmarks::from_regions(vec![
            (
                LandmarkRegion::FaceContour,
                vec![
                    Point::new(0.1, 0.6),
                    Point::new(0.2, 0.3),
                    Point::new(0.5, 0.1),
                    Point::new(0.8, 0.3),
                    Point::new(0.9, 0.6),
                ],
            ),
            (
                LandmarkRegion::LeftEye,
                vec![Point::new(0.3, 0.6), Point::new(0.35, 0.65), Point::new(0.4, 0.6)],
            ),
            (
                LandmarkRegion::OuterLips,
                vec![Point::new(0.4, 0.25), Point::new(0.5, 0.3), Point::new(0.6, 0.25)],
            ),
        ])
    }

    fn translated(face: &FaceLandmarks, dx: f32, dy: f32) -> FaceLandmarks {
        let points = face
            .all_points()
            .unwrap()
            .iter()
            .map(|p| Point::new(p.x + dx, p.y + dy))
            .collect();
        FaceLandmarks::default().with_all_points(points)
    }

    #[test]
    fn identical_faces_score_zero() {
        let face = sample_face();
        let s = score(&face, &face).unwrap();
        assert_eq!(s, 0.0);
        assert!(is_match(s));
    }

    #[test]
    fn uniform_translation_scales_with_point_count() {
        let face = sample_face();
        let moved = translated(&face, 0.01, -0.02);
        let s = score(&moved, &face).unwrap();
        let expected = face.num_points() as f32 * (0.01f32 * 0.01 + 0.02 * 0.02);
        assert!((s - expected).abs() < 1e-5, "{} != {}", s, expected);
    }

    #[test]
    fn score_is_symmetric() {
        let a = sample_face();
        let b = translated(&a, 0.03, 0.01);
        assert_eq!(score(&a, &b).unwrap(), score(&b, &a).unwrap());
    }

    #[test]
    fn unshifted_reference_matches() {
        let reference = uniform(10, 0.5, 0.5);
        let current = uniform(10, 0.5, 0.5);
        let decision = Matcher::default().compare(&current, &reference).unwrap();
        assert_eq!(decision.score, 0.0);
        assert!(decision.matched);
    }

    #[test]
    fn threshold_is_strict() {
        let reference = uniform(10, 0.5, 0.5);
        let current = uniform(10, 0.6, 0.5);
        let decision = Matcher::default().compare(&current, &reference).unwrap();
        assert!((decision.score - 0.1).abs() < 1e-5);
        assert!(!decision.matched);
        assert!(!is_match(MATCH_THRESHOLD));
    }

    #[test]
    fn length_mismatch_is_unavailable() {
        let err = score(&uniform(10, 0.5, 0.5), &uniform(9, 0.5, 0.5)).unwrap_err();
        assert!(matches!(
            err,
            Error::ComparisonUnavailable {
                reason: ComparisonGap::LengthMismatch {
                    current: 10,
                    reference: 9
                }
            }
        ));
    }

    #[test]
    fn missing_points_are_unavailable() {
        let empty = FaceLandmarks::default();
        assert!(matches!(
            score(&empty, &sample_face()),
            Err(Error::ComparisonUnavailable {
                reason: ComparisonGap::MissingCurrent
            })
        ));
        assert!(matches!(
            score(&sample_face(), &empty),
            Err(Error::ComparisonUnavailable {
                reason: ComparisonGap::MissingReference
            })
        ));
    }

    #[test]
    fn empty_detector_points_never_match() {
        let empty: FaceLandmarks = serde_json::from_str(r#"{"allPoints": []}"#).unwrap();
        assert!(matches!(
            score(&empty, &empty),
            Err(Error::ComparisonUnavailable {
                reason: ComparisonGap::MissingCurrent
            })
        ));
        assert!(matches!(
            score(&sample_face(), &empty),
            Err(Error::ComparisonUnavailable {
                reason: ComparisonGap::MissingReference
            })
        ));
        assert!(Matcher::default().compare(&empty, &empty).is_err());
    }

    #[test]
    fn custom_threshold() {
        let matcher = Matcher::new(0.5);
        assert!(matcher.is_match(0.3));
        assert!(!matcher.is_match(0.5));
        assert_eq!(matcher.threshold(), 0.5);
    }
}
