use std::path::Path;

use image::{imageops::FilterType, DynamicImage, GenericImageView};
use ndarray::{s, Array, Array4, Axis, Ix3};
use ort::{inputs, EnvironmentBuilder, Session, SessionBuilder};

use crate::error::{AppError, AppResult};

/// Number of COCO pose keypoints emitted per detection
pub const KEYPOINT_COUNT: usize = 17;

/// Model input is a square RGB tensor of this edge length
const INPUT_SIZE: usize = 640;

/// Detections below this objectness score are treated as "no person found"
const MIN_POSE_CONFIDENCE: f32 = 0.5;

/// Attribute layout per candidate row: 4 box coords, objectness, then
/// KEYPOINT_COUNT (x, y, score) triplets
const OBJECTNESS_INDEX: usize = 4;
const KEYPOINT_OFFSET: usize = 5;

// COCO keypoint indices used by the body shape analysis
const LEFT_SHOULDER: usize = 5;
const RIGHT_SHOULDER: usize = 6;
const LEFT_ELBOW: usize = 7;
const RIGHT_ELBOW: usize = 8;
const LEFT_HIP: usize = 11;
const RIGHT_HIP: usize = 12;

/// A single pose landmark with coordinates normalized to [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub score: f32,
}

/// Full set of COCO keypoints for the most confident person in a photo
#[derive(Debug, Clone)]
pub struct PoseKeypoints {
    points: [Keypoint; KEYPOINT_COUNT],
}

impl PoseKeypoints {
    pub fn new(points: [Keypoint; KEYPOINT_COUNT]) -> Self {
        Self { points }
    }

    pub fn left_shoulder(&self) -> Keypoint {
        self.points[LEFT_SHOULDER]
    }

    pub fn right_shoulder(&self) -> Keypoint {
        self.points[RIGHT_SHOULDER]
    }

    pub fn left_elbow(&self) -> Keypoint {
        self.points[LEFT_ELBOW]
    }

    pub fn right_elbow(&self) -> Keypoint {
        self.points[RIGHT_ELBOW]
    }

    pub fn left_hip(&self) -> Keypoint {
        self.points[LEFT_HIP]
    }

    pub fn right_hip(&self) -> Keypoint {
        self.points[RIGHT_HIP]
    }
}

/// Pose estimation backend
///
/// Returns `None` when no person is detected above the confidence floor, so
/// callers can degrade to an `Unknown` body shape instead of failing the
/// request.
pub trait PoseEstimator: Send + Sync {
    fn estimate(&self, image: &DynamicImage) -> AppResult<Option<PoseKeypoints>>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// Initializes the shared ONNX Runtime environment. Call once at startup,
/// before any session is created.
pub fn init_runtime() -> AppResult<()> {
    EnvironmentBuilder::default()
        .with_name("lookbook")
        .commit()?;
    Ok(())
}

/// YOLOv8-pose model running on ONNX Runtime
pub struct OrtPoseEstimator {
    session: Session,
}

impl OrtPoseEstimator {
    /// Loads the model from disk. Sessions are thread-safe and shared for the
    /// process lifetime.
    pub fn from_file(model_path: &Path) -> AppResult<Self> {
        if !model_path.exists() {
            return Err(AppError::Inference(format!(
                "model file not found: {}",
                model_path.display()
            )));
        }

        let session = SessionBuilder::new()?
            .with_parallel_execution(true)?
            .with_memory_pattern(true)?
            .with_model_from_file(model_path)?;

        Ok(Self { session })
    }
}

impl PoseEstimator for OrtPoseEstimator {
    fn estimate(&self, image: &DynamicImage) -> AppResult<Option<PoseKeypoints>> {
        let input = prepare_input(image);
        let outputs = self.session.run(inputs!["images" => input.view()]?)?;

        // Output is [1, 56, 8400]: 8400 candidate rows of box + objectness +
        // keypoint triplets. Transpose so candidates iterate along axis 0.
        let tensor = outputs["output0"].extract_tensor::<f32>()?;
        let view = tensor
            .view()
            .clone()
            .into_dimensionality::<Ix3>()
            .map_err(|e| AppError::Inference(format!("unexpected pose output shape: {}", e)))?;
        let transposed = view.t();
        let candidates = transposed.slice(s![.., .., 0]);

        let best = candidates.axis_iter(Axis(0)).max_by(|a, b| {
            a[OBJECTNESS_INDEX]
                .partial_cmp(&b[OBJECTNESS_INDEX])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let row = match best {
            Some(row) => row,
            None => return Ok(None),
        };

        if row.len() < KEYPOINT_OFFSET + KEYPOINT_COUNT * 3 {
            return Err(AppError::Inference(format!(
                "unexpected pose output row length {}",
                row.len()
            )));
        }

        if row[OBJECTNESS_INDEX] < MIN_POSE_CONFIDENCE {
            return Ok(None);
        }

        let mut points = [Keypoint {
            x: 0.0,
            y: 0.0,
            score: 0.0,
        }; KEYPOINT_COUNT];

        for (index, point) in points.iter_mut().enumerate() {
            let base = KEYPOINT_OFFSET + index * 3;
            *point = Keypoint {
                x: row[base] / INPUT_SIZE as f32,
                y: row[base + 1] / INPUT_SIZE as f32,
                score: row[base + 2],
            };
        }

        Ok(Some(PoseKeypoints::new(points)))
    }

    fn name(&self) -> &'static str {
        "yolov8-pose"
    }
}

fn prepare_input(image: &DynamicImage) -> Array4<f32> {
    let resized = image.resize_exact(INPUT_SIZE as u32, INPUT_SIZE as u32, FilterType::CatmullRom);
    let mut input = Array::zeros((1, 3, INPUT_SIZE, INPUT_SIZE));
    for pixel in resized.pixels() {
        let x = pixel.0 as usize;
        let y = pixel.1 as usize;
        let [r, g, b, _] = pixel.2 .0;
        input[[0, 0, y, x]] = (r as f32) / 255.;
        input[[0, 1, y, x]] = (g as f32) / 255.;
        input[[0, 2, y, x]] = (b as f32) / 255.;
    }
    input
}

#[cfg(test)]
mod tests {
    use super::*;

    pub fn create_test_keypoints() -> PoseKeypoints {
        let mut points = [Keypoint {
            x: 0.5,
            y: 0.5,
            score: 0.9,
        }; KEYPOINT_COUNT];
        points[LEFT_SHOULDER] = Keypoint {
            x: 0.3,
            y: 0.3,
            score: 0.9,
        };
        points[RIGHT_SHOULDER] = Keypoint {
            x: 0.7,
            y: 0.3,
            score: 0.9,
        };
        PoseKeypoints::new(points)
    }

    #[test]
    fn test_keypoint_accessors() {
        let keypoints = create_test_keypoints();
        assert_eq!(keypoints.left_shoulder().x, 0.3);
        assert_eq!(keypoints.right_shoulder().x, 0.7);
        assert_eq!(keypoints.left_hip().x, 0.5);
    }

    #[test]
    fn test_prepare_input_shape_and_range() {
        let image = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            4,
            4,
            image::Rgb([255, 128, 0]),
        ));
        let input = prepare_input(&image);
        assert_eq!(input.shape(), &[1, 3, INPUT_SIZE, INPUT_SIZE]);

        let red = input[[0, 0, 320, 320]];
        let blue = input[[0, 2, 320, 320]];
        assert!((red - 1.0).abs() < 1e-3);
        assert!(blue.abs() < 1e-3);
    }
}
