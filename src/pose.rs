// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Skeleton and keypoint data model.
//!
//! A [`Skeleton`] is one detected person's set of body-part keypoints for one
//! frame. Keypoint order is fixed: index `i` always holds the body part with
//! [`BodyPart`] index `i`, regardless of detection order. Skeletons are
//! immutable after creation and are owned by the frame cycle that produced them.

/// Number of keypoints per skeleton.
pub const NUM_KEYPOINTS: usize = 17;

/// Fixed enumeration of body parts with stable keypoint indices.
///
/// The order matches the COCO keypoint convention used by single-pose
/// estimation models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum BodyPart {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl BodyPart {
    /// All body parts in keypoint-index order.
    pub const ALL: [Self; NUM_KEYPOINTS] = [
        Self::Nose,
        Self::LeftEye,
        Self::RightEye,
        Self::LeftEar,
        Self::RightEar,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
    ];

    /// Stable keypoint index of this body part.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Human-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEye => "left_eye",
            Self::RightEye => "right_eye",
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
        }
    }
}

/// A named joint's 2D position and detection confidence.
///
/// Coordinates are in normalized-frame pixel space (the bitmap the estimator
/// saw). The score is in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    /// X coordinate in pixels.
    pub x: f32,
    /// Y coordinate in pixels.
    pub y: f32,
    /// Detection confidence in `[0, 1]`.
    pub score: f32,
}

impl Keypoint {
    /// Create a new keypoint.
    #[must_use]
    pub const fn new(x: f32, y: f32, score: f32) -> Self {
        Self { x, y, score }
    }
}

/// One detected person's keypoints for one frame, plus an overall score.
#[derive(Debug, Clone)]
pub struct Skeleton {
    keypoints: [Keypoint; NUM_KEYPOINTS],
    score: f32,
}

impl Skeleton {
    /// Create a skeleton from a full keypoint array and an overall score.
    ///
    /// The array index of each keypoint must be its [`BodyPart`] index; the
    /// fixed-size array makes a partial or reordered skeleton unrepresentable.
    #[must_use]
    pub const fn new(keypoints: [Keypoint; NUM_KEYPOINTS], score: f32) -> Self {
        Self { keypoints, score }
    }

    /// Keypoint for a given body part.
    #[must_use]
    pub fn keypoint(&self, part: BodyPart) -> &Keypoint {
        &self.keypoints[part.index()]
    }

    /// All keypoints in [`BodyPart`] index order.
    #[must_use]
    pub const fn keypoints(&self) -> &[Keypoint; NUM_KEYPOINTS] {
        &self.keypoints
    }

    /// Overall detection confidence in `[0, 1]`.
    #[must_use]
    pub const fn score(&self) -> f32 {
        self.score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_skeleton(score: f32) -> Skeleton {
        Skeleton::new([Keypoint::new(1.0, 2.0, 0.9); NUM_KEYPOINTS], score)
    }

    #[test]
    fn test_body_part_indices_are_stable() {
        for (i, part) in BodyPart::ALL.iter().enumerate() {
            assert_eq!(part.index(), i);
        }
        assert_eq!(BodyPart::Nose.index(), 0);
        assert_eq!(BodyPart::RightAnkle.index(), NUM_KEYPOINTS - 1);
    }

    #[test]
    fn test_body_part_names() {
        assert_eq!(BodyPart::Nose.name(), "nose");
        assert_eq!(BodyPart::LeftShoulder.name(), "left_shoulder");
        assert_eq!(BodyPart::RightAnkle.name(), "right_ankle");
    }

    #[test]
    fn test_skeleton_lookup_by_part() {
        let mut kps = [Keypoint::new(0.0, 0.0, 0.0); NUM_KEYPOINTS];
        kps[BodyPart::LeftKnee.index()] = Keypoint::new(10.0, 20.0, 0.7);
        let skeleton = Skeleton::new(kps, 0.8);

        let knee = skeleton.keypoint(BodyPart::LeftKnee);
        assert_eq!(knee.x, 10.0);
        assert_eq!(knee.y, 20.0);
        assert_eq!(knee.score, 0.7);
        assert_eq!(skeleton.score(), 0.8);
    }

    #[test]
    fn test_skeleton_keypoint_count() {
        let skeleton = uniform_skeleton(0.5);
        assert_eq!(skeleton.keypoints().len(), NUM_KEYPOINTS);
    }
}
