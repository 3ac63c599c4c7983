// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Posture classification: joint-angle rules per exercise.
//!
//! [`classify`] is a pure function of one skeleton and the session's exercise
//! selector. It keeps no state between calls; every angle is re-derived from
//! the current skeleton.

use std::fmt;
use std::str::FromStr;

use crate::error::PipelineError;
use crate::pose::{BodyPart, Keypoint, Skeleton};

/// Exclusive exercise selector for one pipeline session.
///
/// Exactly one variant is active per session; changing it requires tearing the
/// pipeline down and recreating it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Exercise {
    PushUp,
    Plank,
    SitUp,
    Lunge,
    Squat,
    /// No exercise selected; every verdict fails with a prompt to select one.
    #[default]
    None,
}

impl Exercise {
    /// Human-readable name, as used in feedback strings.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PushUp => "push-up",
            Self::Plank => "plank",
            Self::SitUp => "sit-up",
            Self::Lunge => "lunge",
            Self::Squat => "squat",
            Self::None => "none",
        }
    }
}

impl fmt::Display for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Exercise {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "push-up" | "pushup" => Ok(Self::PushUp),
            "plank" => Ok(Self::Plank),
            "sit-up" | "situp" => Ok(Self::SitUp),
            "lunge" => Ok(Self::Lunge),
            "squat" => Ok(Self::Squat),
            "none" => Ok(Self::None),
            other => Err(PipelineError::ConfigError(format!(
                "unknown exercise: {other}"
            ))),
        }
    }
}

/// Pass/fail posture judgment plus feedback text for one skeleton.
///
/// Carries no identity; recomputed every frame and never cached across frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    /// Fixed feedback string for this exercise and outcome.
    pub feedback: &'static str,
    /// Whether the posture passes the exercise's angle rule.
    pub good: bool,
}

/// Feedback shown when no exercise is selected.
pub const SELECT_EXERCISE: &str = "select an exercise";

/// Angle at vertex `b` between rays `b->a` and `b->c`, in degrees.
///
/// Uses the signed `atan2` difference, folded into `[0, 180]` (angles above
/// 180 map to `360 - angle`), so `joint_angle(a, b, c) == joint_angle(c, b, a)`.
///
/// Returns `None` when either ray has zero length: the angle is undefined and
/// callers must treat it as a deterministic failure rather than a number.
#[must_use]
pub fn joint_angle(a: &Keypoint, b: &Keypoint, c: &Keypoint) -> Option<f32> {
    let (cx, cy) = (c.x - b.x, c.y - b.y);
    let (ax, ay) = (a.x - b.x, a.y - b.y);
    if (cx == 0.0 && cy == 0.0) || (ax == 0.0 && ay == 0.0) {
        return None;
    }

    let mut angle = (cy.atan2(cx) - ay.atan2(ax)).to_degrees();
    if angle < 0.0 {
        angle += 360.0;
    }
    if angle > 180.0 {
        angle = 360.0 - angle;
    }
    Some(angle)
}

/// Classify one skeleton against the selected exercise.
///
/// Each exercise checks one or two joint angles against a fixed pass range
/// (inclusive bounds). A degenerate angle (`None`) fails the rule.
#[must_use]
pub fn classify(skeleton: &Skeleton, exercise: Exercise) -> Verdict {
    use BodyPart::{
        LeftAnkle, LeftElbow, LeftHip, LeftKnee, LeftShoulder, LeftWrist, RightAnkle, RightElbow,
        RightHip, RightKnee, RightShoulder, RightWrist,
    };

    let good = match exercise {
        Exercise::PushUp => {
            angle_in(skeleton, LeftShoulder, LeftElbow, LeftWrist, 50.0, 130.0)
                && angle_in(skeleton, RightShoulder, RightElbow, RightWrist, 50.0, 130.0)
        }
        Exercise::Plank => {
            angle_in(skeleton, LeftShoulder, LeftHip, LeftKnee, 160.0, 180.0)
                && angle_in(skeleton, RightShoulder, RightHip, RightKnee, 160.0, 180.0)
        }
        Exercise::SitUp => angle_in(skeleton, LeftHip, LeftShoulder, LeftElbow, 30.0, 50.0),
        Exercise::Lunge => {
            angle_in(skeleton, LeftHip, LeftKnee, LeftAnkle, 80.0, 120.0)
                && angle_in(skeleton, RightHip, RightKnee, RightAnkle, 80.0, 120.0)
        }
        Exercise::Squat => angle_in(skeleton, RightHip, RightKnee, RightAnkle, 70.0, 110.0),
        Exercise::None => return Verdict { feedback: SELECT_EXERCISE, good: false },
    };

    Verdict { feedback: feedback_for(exercise, good), good }
}

/// Angle rule: the joint angle at `vertex` lies within `[lo, hi]`.
fn angle_in(skeleton: &Skeleton, a: BodyPart, vertex: BodyPart, c: BodyPart, lo: f32, hi: f32) -> bool {
    joint_angle(skeleton.keypoint(a), skeleton.keypoint(vertex), skeleton.keypoint(c))
        .is_some_and(|angle| angle >= lo && angle <= hi)
}

const fn feedback_for(exercise: Exercise, good: bool) -> &'static str {
    match (exercise, good) {
        (Exercise::PushUp, true) => "push-up posture is good",
        (Exercise::PushUp, false) => "fix your push-up posture",
        (Exercise::Plank, true) => "plank posture is good",
        (Exercise::Plank, false) => "fix your plank posture",
        (Exercise::SitUp, true) => "sit-up posture is good",
        (Exercise::SitUp, false) => "fix your sit-up posture",
        (Exercise::Lunge, true) => "lunge posture is good",
        (Exercise::Lunge, false) => "fix your lunge posture",
        (Exercise::Squat, true) => "squat posture is good",
        (Exercise::Squat, false) => "fix your squat posture",
        (Exercise::None, _) => SELECT_EXERCISE,
    }
}
