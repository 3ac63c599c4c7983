// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Pose estimator interface and the bundled ONNX Runtime adapter.
//!
//! The pipeline consumes pose estimation through the [`PoseEstimator`] trait:
//! an opaque, synchronous call from one bitmap to zero or more skeletons. The
//! call is treated as the dominant per-frame cost and is never invoked
//! concurrently with itself; the pipeline serializes access behind its
//! processing-unit lock.

use image::RgbImage;

use crate::error::Result;
use crate::pose::Skeleton;

/// Opaque pose estimation function consumed by the pipeline.
///
/// Stateful setup (model selection, precision, device target) happens at
/// construction, not per call. An empty result means no person was detected
/// and is not an error.
pub trait PoseEstimator: Send {
    /// Estimate poses on one normalized bitmap.
    ///
    /// Returns at most a small bounded number of skeletons, with keypoint
    /// coordinates in the bitmap's pixel space.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails for this frame; the pipeline skips
    /// the frame and continues.
    fn estimate(&mut self, bitmap: &RgbImage) -> Result<Vec<Skeleton>>;

    /// Release underlying resources. Safe to call exactly once at teardown;
    /// the default implementation is a no-op for stateless estimators.
    fn close(&mut self) {}
}

#[cfg(feature = "onnx")]
pub use onnx::OnnxPoseEstimator;

#[cfg(feature = "onnx")]
mod onnx {
    use std::path::Path;

    use image::{imageops, RgbImage};
    use ndarray::Array4;
    use ort::session::Session;
    use ort::value::TensorRef;

    use super::PoseEstimator;
    use crate::error::{PipelineError, Result};
    use crate::pose::{Keypoint, Skeleton, NUM_KEYPOINTS};

    /// Default model input size (width, height).
    const DEFAULT_INPUT_SIZE: (u32, u32) = (192, 192);

    /// ONNX Runtime-backed single-pose estimator.
    ///
    /// Accepts MoveNet-style models: input `[1, 3, H, W]` f32 in `[0, 1]`,
    /// output `[1, 1, 17, 3]` rows of normalized `(y, x, score)`. Detections
    /// whose mean keypoint score falls below the configured minimum are
    /// dropped, so `estimate` returns zero or one skeleton.
    pub struct OnnxPoseEstimator {
        session: Option<Session>,
        input_name: String,
        output_name: String,
        input_size: (u32, u32),
        min_score: f32,
    }

    impl OnnxPoseEstimator {
        /// Load a pose model from an ONNX file.
        ///
        /// # Errors
        ///
        /// Returns [`PipelineError::EstimatorError`] if the file is missing or
        /// the session cannot be built. Construction failure is fatal to
        /// session start and is never retried.
        pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
            let path = path.as_ref();
            if !path.exists() {
                return Err(PipelineError::EstimatorError(format!(
                    "Model file not found: {}",
                    path.display()
                )));
            }

            let session = Session::builder()
                .map_err(|e| {
                    PipelineError::EstimatorError(format!("Failed to create session builder: {e}"))
                })?
                .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)
                .map_err(|e| {
                    PipelineError::EstimatorError(format!("Failed to set optimization level: {e}"))
                })?
                .commit_from_file(path)
                .map_err(|e| PipelineError::EstimatorError(format!("Failed to load model: {e}")))?;

            let input_name = session
                .inputs
                .first()
                .map(|i| i.name.clone())
                .unwrap_or_else(|| "input".to_string());
            let output_name = session
                .outputs
                .first()
                .map(|o| o.name.clone())
                .unwrap_or_else(|| "output".to_string());

            Ok(Self {
                session: Some(session),
                input_name,
                output_name,
                input_size: DEFAULT_INPUT_SIZE,
                min_score: 0.2,
            })
        }

        /// Set the model input size (width, height).
        #[must_use]
        pub const fn with_input_size(mut self, width: u32, height: u32) -> Self {
            self.input_size = (width, height);
            self
        }

        /// Set the minimum mean keypoint score for a detection to be kept.
        #[must_use]
        pub const fn with_min_score(mut self, min_score: f32) -> Self {
            self.min_score = min_score;
            self
        }

        /// Resize the bitmap to the model input and normalize to `[0, 1]` NCHW.
        fn to_tensor(&self, bitmap: &RgbImage) -> Array4<f32> {
            let (w, h) = self.input_size;
            let resized = imageops::resize(bitmap, w, h, imageops::FilterType::Triangle);

            let mut tensor = Array4::<f32>::zeros((1, 3, h as usize, w as usize));
            for (x, y, pixel) in resized.enumerate_pixels() {
                let (xi, yi) = (x as usize, y as usize);
                tensor[[0, 0, yi, xi]] = f32::from(pixel[0]) / 255.0;
                tensor[[0, 1, yi, xi]] = f32::from(pixel[1]) / 255.0;
                tensor[[0, 2, yi, xi]] = f32::from(pixel[2]) / 255.0;
            }
            tensor
        }
    }

    impl PoseEstimator for OnnxPoseEstimator {
        fn estimate(&mut self, bitmap: &RgbImage) -> Result<Vec<Skeleton>> {
            let input = self.to_tensor(bitmap);
            let session = self.session.as_mut().ok_or_else(|| {
                PipelineError::EstimatorError("estimator already closed".to_string())
            })?;

            let input_contiguous = input.as_standard_layout();
            let input_tensor = TensorRef::from_array_view(&input_contiguous).map_err(|e| {
                PipelineError::EstimatorError(format!("Failed to create input tensor: {e}"))
            })?;

            let outputs = session
                .run(ort::inputs![self.input_name.as_str() => input_tensor])
                .map_err(|e| PipelineError::EstimatorError(format!("Inference failed: {e}")))?;

            let output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
                PipelineError::EstimatorError(format!("Output '{}' not found", self.output_name))
            })?;
            let (_, data) = output.try_extract_tensor::<f32>().map_err(|e| {
                PipelineError::EstimatorError(format!("Failed to extract output: {e}"))
            })?;

            if data.len() < NUM_KEYPOINTS * 3 {
                return Err(PipelineError::EstimatorError(format!(
                    "unexpected output length {}",
                    data.len()
                )));
            }

            // Rows of normalized (y, x, score), scaled to bitmap pixel space.
            #[allow(clippy::cast_precision_loss)]
            let (fw, fh) = (bitmap.width() as f32, bitmap.height() as f32);
            let mut keypoints = [Keypoint::new(0.0, 0.0, 0.0); NUM_KEYPOINTS];
            let mut score_sum = 0.0f32;
            for (i, kp) in keypoints.iter_mut().enumerate() {
                let row = &data[i * 3..i * 3 + 3];
                *kp = Keypoint::new(row[1] * fw, row[0] * fh, row[2]);
                score_sum += row[2];
            }

            #[allow(clippy::cast_precision_loss)]
            let score = score_sum / NUM_KEYPOINTS as f32;
            if score < self.min_score {
                return Ok(Vec::new());
            }
            Ok(vec![Skeleton::new(keypoints, score)])
        }

        fn close(&mut self) {
            // Dropping the session releases the ONNX Runtime resources.
            self.session = None;
        }
    }
}
