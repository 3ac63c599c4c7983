// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Session configuration.
//!
//! This module defines the [`SessionConfig`] struct, which fixes the exercise
//! selector and display options for one pipeline session. Values are read at
//! session start/resume and are not live-updated mid-session; changing the
//! exercise requires tearing the pipeline down and recreating it.

use crate::classifier::Exercise;
use crate::overlay::Color;

/// Configuration for one exercise session.
///
/// Uses a builder pattern for convenient construction.
///
/// # Example
///
/// ```rust
/// use posefit::{Exercise, SessionConfig};
/// use posefit::overlay::Color;
///
/// let config = SessionConfig::new()
///     .with_exercise(Exercise::Squat)
///     .with_good_color(Color::CYAN);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Exercise evaluated this session. Exactly one is active; `Exercise::None`
    /// yields failing verdicts with a selection prompt.
    pub exercise: Exercise,
    /// Display color for skeletons with a passing verdict. Failing verdicts
    /// always use the fixed alert color regardless of this value.
    pub good_color: Color,
    /// Skeletons with an overall score below this are dropped by the bundled
    /// estimator adapter.
    pub min_pose_score: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            exercise: Exercise::None,
            good_color: Color::GREEN,
            min_pose_score: 0.2,
        }
    }
}

impl SessionConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the exercise selector.
    #[must_use]
    pub const fn with_exercise(mut self, exercise: Exercise) -> Self {
        self.exercise = exercise;
        self
    }

    /// Set the good-posture display color.
    #[must_use]
    pub const fn with_good_color(mut self, color: Color) -> Self {
        self.good_color = color;
        self
    }

    /// Set the minimum overall pose score.
    #[must_use]
    pub const fn with_min_pose_score(mut self, score: f32) -> Self {
        self.min_pose_score = score;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = SessionConfig::default();
        assert_eq!(config.exercise, Exercise::None);
        assert_eq!(config.good_color, Color::GREEN);
        assert!((config.min_pose_score - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn test_config_builder() {
        let config = SessionConfig::new()
            .with_exercise(Exercise::Lunge)
            .with_good_color(Color::BLUE)
            .with_min_pose_score(0.5);

        assert_eq!(config.exercise, Exercise::Lunge);
        assert_eq!(config.good_color, Color::BLUE);
        assert!((config.min_pose_score - 0.5).abs() < f32::EPSILON);
    }
}
