// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use crate::pose::BodyPart;

/// Anatomically adjacent keypoint pairs connected by line segments.
pub const SKELETON: [[BodyPart; 2]; 18] = [
    [BodyPart::Nose, BodyPart::LeftEye],
    [BodyPart::Nose, BodyPart::RightEye],
    [BodyPart::LeftEye, BodyPart::LeftEar],
    [BodyPart::RightEye, BodyPart::RightEar],
    [BodyPart::Nose, BodyPart::LeftShoulder],
    [BodyPart::Nose, BodyPart::RightShoulder],
    [BodyPart::LeftShoulder, BodyPart::LeftElbow],
    [BodyPart::LeftElbow, BodyPart::LeftWrist],
    [BodyPart::RightShoulder, BodyPart::RightElbow],
    [BodyPart::RightElbow, BodyPart::RightWrist],
    [BodyPart::LeftShoulder, BodyPart::RightShoulder],
    [BodyPart::LeftShoulder, BodyPart::LeftHip],
    [BodyPart::RightShoulder, BodyPart::RightHip],
    [BodyPart::LeftHip, BodyPart::RightHip],
    [BodyPart::LeftHip, BodyPart::LeftKnee],
    [BodyPart::LeftKnee, BodyPart::LeftAnkle],
    [BodyPart::RightHip, BodyPart::RightKnee],
    [BodyPart::RightKnee, BodyPart::RightAnkle],
];
