// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Raw sensor frame types and orientation arithmetic.

/// Fixed capture width delivered by the frame source.
pub const PREVIEW_WIDTH: u32 = 640;

/// Fixed capture height delivered by the frame source.
pub const PREVIEW_HEIGHT: u32 = 480;

/// Pixel layout of a raw sensor buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Planar YUV 4:2:0 (I420): full-resolution Y plane followed by
    /// quarter-resolution U and V planes.
    Yuv420,
    /// Packed 8-bit RGB, row-major.
    Rgb24,
}

/// Which way the sensor faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Front,
    Rear,
}

/// Clockwise rotation to apply so bitmap "up" matches physical "up".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Rotation from a degree value; any multiple of 360 folds back to `Deg0`.
    ///
    /// Degrees that are not a multiple of 90 round down to the nearest
    /// supported step.
    #[must_use]
    pub const fn from_degrees(degrees: i32) -> Self {
        match degrees.rem_euclid(360) / 90 {
            1 => Self::Deg90,
            2 => Self::Deg180,
            3 => Self::Deg270,
            _ => Self::Deg0,
        }
    }

    /// Degree value of this rotation.
    #[must_use]
    pub const fn degrees(self) -> i32 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    /// Whether this rotation swaps the bitmap's width and height.
    #[must_use]
    pub const fn swaps_dimensions(self) -> bool {
        matches!(self, Self::Deg90 | Self::Deg270)
    }
}

/// Compute the preview rotation from the sensor mounting angle and the
/// display rotation, both in degrees.
///
/// Front-facing sensors rotate opposite the rear convention: the sensor and
/// display angles add for front-facing sensors and subtract for rear-facing
/// ones.
#[must_use]
pub fn preview_rotation(sensor_orientation: i32, display_rotation: i32, facing: Facing) -> Rotation {
    let degrees = match facing {
        Facing::Front => (sensor_orientation + display_rotation).rem_euclid(360),
        Facing::Rear => (sensor_orientation - display_rotation).rem_euclid(360),
    };
    Rotation::from_degrees(degrees)
}

/// One raw sensor frame as delivered by the frame source.
///
/// Owned by the frame-processing cycle; a frame superseded in the delivery
/// slot is dropped, never queued.
#[derive(Debug, Clone)]
pub struct RawFrame {
    /// Raw pixel data in `format` layout.
    pub data: Vec<u8>,
    /// Width in pixels before rotation.
    pub width: u32,
    /// Height in pixels before rotation.
    pub height: u32,
    /// Pixel layout of `data`.
    pub format: PixelFormat,
    /// Rotation the normalizer must apply.
    pub rotation: Rotation,
}

impl RawFrame {
    /// Expected byte length of `data` for the frame's format and dimensions.
    #[must_use]
    pub const fn expected_len(&self) -> usize {
        let pixels = (self.width * self.height) as usize;
        match self.format {
            // Y plane + two quarter-size chroma planes
            PixelFormat::Yuv420 => pixels + pixels / 2,
            PixelFormat::Rgb24 => pixels * 3,
        }
    }
}
