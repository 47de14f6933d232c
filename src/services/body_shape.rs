use crate::models::BodyShape;
use crate::services::pose::PoseKeypoints;

/// Landmarks below this score are too unreliable to measure against
const MIN_KEYPOINT_SCORE: f32 = 0.3;

/// COCO pose has no waist landmark; elbow span at natural arm hang tracks
/// the waist closely enough once scaled down
const WAIST_FROM_ELBOW_SPAN: f64 = 0.8;

// Classification thresholds, checked in order. Boundary values fall through
// to the next rule.
const INVERTED_TRIANGLE_MIN_SHOULDER_HIP: f64 = 1.15;
const PEAR_MAX_SHOULDER_HIP: f64 = 0.90;
const HOURGLASS_MAX_WAIST_HIP: f64 = 0.75;
const APPLE_MIN_WAIST_HIP: f64 = 0.90;

/// Width ratios measured from pose landmarks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyRatios {
    pub shoulder_hip: f64,
    pub waist_hip: f64,
}

impl BodyRatios {
    /// Measures shoulder/hip and waist/hip width ratios from keypoints.
    ///
    /// Returns `None` when any required landmark is below the score floor or
    /// the hips have no measurable width.
    pub fn from_keypoints(keypoints: &PoseKeypoints) -> Option<Self> {
        let left_shoulder = keypoints.left_shoulder();
        let right_shoulder = keypoints.right_shoulder();
        let left_elbow = keypoints.left_elbow();
        let right_elbow = keypoints.right_elbow();
        let left_hip = keypoints.left_hip();
        let right_hip = keypoints.right_hip();

        let all_scored = [
            left_shoulder,
            right_shoulder,
            left_elbow,
            right_elbow,
            left_hip,
            right_hip,
        ]
        .iter()
        .all(|point| point.score >= MIN_KEYPOINT_SCORE);

        if !all_scored {
            return None;
        }

        let shoulder_width = (left_shoulder.x - right_shoulder.x).abs() as f64;
        let hip_width = (left_hip.x - right_hip.x).abs() as f64;
        let waist_width = (left_elbow.x - right_elbow.x).abs() as f64 * WAIST_FROM_ELBOW_SPAN;

        if hip_width <= f64::EPSILON {
            return None;
        }

        Some(Self {
            shoulder_hip: shoulder_width / hip_width,
            waist_hip: waist_width / hip_width,
        })
    }
}

/// Result of body shape analysis for one photo
#[derive(Debug, Clone, Copy)]
pub struct BodyAnalysis {
    pub body_type: BodyShape,
    pub confidence: f64,
    pub shoulder_hip_ratio: f64,
    pub waist_hip_ratio: f64,
}

impl BodyAnalysis {
    fn unknown() -> Self {
        Self {
            body_type: BodyShape::Unknown,
            confidence: 0.0,
            shoulder_hip_ratio: 0.0,
            waist_hip_ratio: 0.0,
        }
    }
}

/// Classifies a body shape from width ratios.
///
/// Shoulder/hip dominance wins first; otherwise the waist decides between
/// the hourglass, apple, and rectangle labels.
pub fn classify(ratios: BodyRatios) -> (BodyShape, f64) {
    if ratios.shoulder_hip > INVERTED_TRIANGLE_MIN_SHOULDER_HIP {
        (BodyShape::InvertedTriangle, 0.85)
    } else if ratios.shoulder_hip < PEAR_MAX_SHOULDER_HIP {
        (BodyShape::Pear, 0.85)
    } else if ratios.waist_hip < HOURGLASS_MAX_WAIST_HIP {
        (BodyShape::Hourglass, 0.85)
    } else if ratios.waist_hip > APPLE_MIN_WAIST_HIP {
        (BodyShape::Apple, 0.80)
    } else {
        (BodyShape::Rectangle, 0.80)
    }
}

/// Full analysis over an optional pose detection. Missing or unusable
/// keypoints yield the `Unknown` label with zero confidence.
pub fn analyze(keypoints: Option<&PoseKeypoints>) -> BodyAnalysis {
    let ratios = match keypoints.and_then(BodyRatios::from_keypoints) {
        Some(ratios) => ratios,
        None => return BodyAnalysis::unknown(),
    };

    let (body_type, confidence) = classify(ratios);
    BodyAnalysis {
        body_type,
        confidence,
        shoulder_hip_ratio: ratios.shoulder_hip,
        waist_hip_ratio: ratios.waist_hip,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::pose::{Keypoint, KEYPOINT_COUNT};

    fn ratios(shoulder_hip: f64, waist_hip: f64) -> BodyRatios {
        BodyRatios {
            shoulder_hip,
            waist_hip,
        }
    }

    /// Builds keypoints with the given widths centered at y-levels that do
    /// not matter for the ratios
    fn create_test_keypoints(
        shoulder_width: f32,
        elbow_width: f32,
        hip_width: f32,
        score: f32,
    ) -> PoseKeypoints {
        let mut points = [Keypoint {
            x: 0.5,
            y: 0.5,
            score,
        }; KEYPOINT_COUNT];

        let center = 0.5;
        points[5] = Keypoint {
            x: center - shoulder_width / 2.0,
            y: 0.3,
            score,
        };
        points[6] = Keypoint {
            x: center + shoulder_width / 2.0,
            y: 0.3,
            score,
        };
        points[7] = Keypoint {
            x: center - elbow_width / 2.0,
            y: 0.45,
            score,
        };
        points[8] = Keypoint {
            x: center + elbow_width / 2.0,
            y: 0.45,
            score,
        };
        points[11] = Keypoint {
            x: center - hip_width / 2.0,
            y: 0.6,
            score,
        };
        points[12] = Keypoint {
            x: center + hip_width / 2.0,
            y: 0.6,
            score,
        };

        PoseKeypoints::new(points)
    }

    #[test]
    fn test_wide_shoulders_classify_as_inverted_triangle() {
        assert_eq!(
            classify(ratios(1.16, 0.8)),
            (BodyShape::InvertedTriangle, 0.85)
        );
        assert_eq!(
            classify(ratios(1.5, 0.5)),
            (BodyShape::InvertedTriangle, 0.85)
        );
    }

    #[test]
    fn test_narrow_shoulders_classify_as_pear() {
        assert_eq!(classify(ratios(0.89, 0.8)), (BodyShape::Pear, 0.85));
        assert_eq!(classify(ratios(0.5, 0.5)), (BodyShape::Pear, 0.85));
    }

    #[test]
    fn test_narrow_waist_classifies_as_hourglass() {
        assert_eq!(classify(ratios(1.0, 0.74)), (BodyShape::Hourglass, 0.85));
        assert_eq!(classify(ratios(1.1, 0.6)), (BodyShape::Hourglass, 0.85));
    }

    #[test]
    fn test_wide_waist_classifies_as_apple() {
        assert_eq!(classify(ratios(1.0, 0.91)), (BodyShape::Apple, 0.80));
        assert_eq!(classify(ratios(0.95, 1.1)), (BodyShape::Apple, 0.80));
    }

    #[test]
    fn test_middle_band_classifies_as_rectangle() {
        assert_eq!(classify(ratios(1.0, 0.8)), (BodyShape::Rectangle, 0.80));
        assert_eq!(classify(ratios(1.1, 0.76)), (BodyShape::Rectangle, 0.80));
    }

    #[test]
    fn test_boundary_values_fall_through() {
        // Exactly at each threshold the strict comparison does not fire
        assert_ne!(classify(ratios(1.15, 0.8)).0, BodyShape::InvertedTriangle);
        assert_ne!(classify(ratios(0.90, 0.8)).0, BodyShape::Pear);
        assert_ne!(classify(ratios(1.0, 0.75)).0, BodyShape::Hourglass);
        assert_ne!(classify(ratios(1.0, 0.90)).0, BodyShape::Apple);

        assert_eq!(classify(ratios(1.15, 0.8)).0, BodyShape::Rectangle);
        assert_eq!(classify(ratios(0.90, 0.90)).0, BodyShape::Rectangle);
    }

    #[test]
    fn test_ratios_from_keypoints() {
        let keypoints = create_test_keypoints(0.48, 0.4, 0.4, 0.9);
        let ratios = BodyRatios::from_keypoints(&keypoints).unwrap();
        assert!((ratios.shoulder_hip - 1.2).abs() < 1e-5);
        assert!((ratios.waist_hip - 0.8).abs() < 1e-5);
    }

    #[test]
    fn test_low_score_keypoints_rejected() {
        let keypoints = create_test_keypoints(0.48, 0.4, 0.4, 0.2);
        assert!(BodyRatios::from_keypoints(&keypoints).is_none());
    }

    #[test]
    fn test_zero_hip_width_rejected() {
        let keypoints = create_test_keypoints(0.48, 0.4, 0.0, 0.9);
        assert!(BodyRatios::from_keypoints(&keypoints).is_none());
    }

    #[test]
    fn test_analyze_without_pose_is_unknown() {
        let analysis = analyze(None);
        assert_eq!(analysis.body_type, BodyShape::Unknown);
        assert_eq!(analysis.confidence, 0.0);
        assert_eq!(analysis.shoulder_hip_ratio, 0.0);
    }

    #[test]
    fn test_analyze_with_pose() {
        let keypoints = create_test_keypoints(0.52, 0.4, 0.4, 0.9);
        let analysis = analyze(Some(&keypoints));
        assert_eq!(analysis.body_type, BodyShape::InvertedTriangle);
        assert_eq!(analysis.confidence, 0.85);
        assert!(analysis.shoulder_hip_ratio > 1.15);
    }
}
