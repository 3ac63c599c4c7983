// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

#![allow(clippy::multiple_crate_versions)]

//! # Posefit
//!
//! Real-time exercise posture analysis and repetition counting, written in
//! Rust. Posefit consumes a live camera stream, estimates human body posture
//! through a pluggable pose model, classifies it against a selected exercise's
//! joint-angle rules, counts correctly-held repetitions, and renders a
//! color-coded skeleton overlay.
//!
//! ## Features
//!
//! - **Bounded latency** - Latest-frame-wins delivery drops superseded frames
//!   instead of queuing them; memory is bounded to one in-flight frame
//! - **Exact counting** - A hysteresis state machine counts a repetition only
//!   after a posture is held continuously for the hold threshold, then re-arms
//! - **Pluggable inference** - Pose estimation is an opaque trait; an ONNX
//!   Runtime adapter for single-pose models ships behind the `onnx` feature
//! - **Deterministic normalization** - Fixed-point YUV conversion and rotation
//!   produce byte-identical bitmaps for identical input
//! - **Verdict-driven overlay** - Skeletons are drawn in the configured color
//!   when posture passes and in the fixed alert color when it fails
//!
//! ## Quick Start (Library)
//!
//! ```no_run
//! use std::sync::Arc;
//! use posefit::{
//!     CameraSource, Exercise, OnnxPoseEstimator, Pipeline, PipelineListener, SessionConfig,
//!     WindowSink,
//! };
//!
//! struct Console;
//! impl PipelineListener for Console {
//!     fn on_posture_feedback(&self, feedback: &str) {
//!         println!("{feedback}");
//!     }
//!     fn on_rep_count(&self, count: u32) {
//!         println!("reps: {count}");
//!     }
//! }
//!
//! fn main() -> Result<(), posefit::PipelineError> {
//!     let config = SessionConfig::new().with_exercise(Exercise::Squat);
//!     let mut pipeline = Pipeline::new(config, Arc::new(Console));
//!     pipeline.set_estimator(Box::new(OnnxPoseEstimator::load("movenet.onnx")?));
//!
//!     let (sink, _frames) = WindowSink::pair(960, 720);
//!     pipeline.start(Box::new(CameraSource::new("/dev/video0")), Box::new(sink))?;
//!     std::thread::sleep(std::time::Duration::from_secs(30));
//!     pipeline.stop();
//!     Ok(())
//! }
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! # Count squats from the default camera
//! posefit run --model movenet.onnx
//!
//! # Push-ups from a specific device, cyan skeleton when posture passes
//! posefit run --model movenet.onnx --source /dev/video2 --exercise push-up --color cyan
//!
//! # Analyze a recorded workout video
//! posefit run --model movenet.onnx --source workout.mp4 --exercise lunge
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`pipeline`] | [`Pipeline`] orchestrator, lifecycle controls, listener interface |
//! | [`source`] | Frame acquisition ([`FrameSource`], [`CameraSource`], latest-frame-wins [`FrameSink`]) |
//! | [`normalizer`] | Raw frame to upright RGB bitmap ([`FrameNormalizer`]) |
//! | [`estimator`] | [`PoseEstimator`] trait and the ONNX adapter |
//! | [`classifier`] | Joint-angle posture rules ([`classify`], [`Exercise`], [`Verdict`]) |
//! | [`counter`] | Hysteresis repetition counter ([`RepCounter`]) |
//! | [`overlay`] | Skeleton drawing and viewport compositing |
//! | [`visualizer`] | Preview window and render sink |
//! | [`pose`] | [`Skeleton`], [`Keypoint`], [`BodyPart`] data model |
//! | [`frame`] | Raw frame types and orientation arithmetic |
//! | [`config`] | [`SessionConfig`] session settings |
//! | [`error`] | Error types ([`PipelineError`], [`Result`]) |
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `onnx` | ONNX Runtime pose estimator adapter (default) |
//! | `video` | Camera and video-file frame source (default) |
//! | `visualize` | Real-time preview window (default) |

// Modules
pub mod classifier;
pub mod cli;
pub mod config;
pub mod counter;
pub mod error;
pub mod estimator;
pub mod frame;
pub mod normalizer;
pub mod overlay;
pub mod pipeline;
pub mod pose;
pub mod source;
#[cfg(feature = "visualize")]
pub mod visualizer;

// Re-export main types for convenience
pub use classifier::{classify, joint_angle, Exercise, Verdict};
pub use config::SessionConfig;
pub use counter::{RepCounter, HOLD_THRESHOLD};
pub use error::{PipelineError, Result};
pub use estimator::PoseEstimator;
#[cfg(feature = "onnx")]
pub use estimator::OnnxPoseEstimator;
pub use frame::{Facing, PixelFormat, RawFrame, Rotation};
pub use normalizer::FrameNormalizer;
pub use overlay::Color;
pub use pipeline::{Pipeline, PipelineListener, PipelineState, RenderSink};
pub use pose::{BodyPart, Keypoint, Skeleton, NUM_KEYPOINTS};
pub use source::{select_camera, CameraDescriptor, CameraState, FrameSink, FrameSource};
#[cfg(feature = "video")]
pub use source::{enumerate_cameras, CameraSource};
#[cfg(feature = "visualize")]
pub use visualizer::WindowSink;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        // Version should be semver format like "0.1.0"
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "posefit");
    }
}
