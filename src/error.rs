// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Error types for the posture pipeline.

use std::fmt;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Main error type for the posture pipeline.
#[derive(Debug)]
pub enum PipelineError {
    /// Camera device open or stream-configuration failure (fatal to the session).
    CameraError(String),
    /// Pose estimator construction or inference failure.
    EstimatorError(String),
    /// A single frame could not be normalized (transient, the frame is skipped).
    FrameError(String),
    /// Invalid configuration or lifecycle misuse.
    ConfigError(String),
    /// Overlay compositing or display-surface error.
    RenderError(String),
    /// Wrapped `std::io::Error`
    Io(std::io::Error),
    /// Feature not enabled.
    FeatureNotEnabled(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CameraError(msg) => write!(f, "Camera error: {msg}"),
            Self::EstimatorError(msg) => write!(f, "Estimator error: {msg}"),
            Self::FrameError(msg) => write!(f, "Frame error: {msg}"),
            Self::ConfigError(msg) => write!(f, "Config error: {msg}"),
            Self::RenderError(msg) => write!(f, "Render error: {msg}"),
            Self::Io(err) => write!(f, "IO error: {err}"),
            Self::FeatureNotEnabled(msg) => write!(f, "Feature not enabled: {msg}"),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<image::ImageError> for PipelineError {
    fn from(err: image::ImageError) -> Self {
        Self::FrameError(err.to_string())
    }
}
