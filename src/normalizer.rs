// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Frame normalization: raw sensor buffer to orientation-corrected RGB.
//!
//! [`FrameNormalizer::normalize`] is a deterministic transform: the same raw
//! buffer and orientation always produce byte-identical output. All math is
//! fixed-point integer, so results do not depend on the host's float rounding.
//!
//! The normalizer owns a single mutable scratch buffer, allocated lazily on
//! first use and reused afterwards; callers must serialize access (the
//! pipeline runs it under the processing-unit lock).

use std::num::NonZeroUsize;

use image::RgbImage;
use lru::LruCache;

use crate::error::{PipelineError, Result};
use crate::frame::{PixelFormat, RawFrame, Rotation};

// ================================================================================================
// Constants
// ================================================================================================

/// Maximum number of cached rotation remap LUTs (one per frame geometry).
const LUT_CACHE_SIZE: usize = 4;

// ================================================================================================
// Types
// ================================================================================================

type LutKey = (u32, u32, i32);

/// Converts raw sensor frames into upright RGB bitmaps.
pub struct FrameNormalizer {
    /// Color-converted pixels before rotation, w*h*3 bytes.
    rgb_scratch: Vec<u8>,
    /// Rotated output bitmap, reused across frames.
    output: Option<RgbImage>,
    /// Rotation remap LUTs: destination pixel index -> source pixel index.
    luts: LruCache<LutKey, Vec<u32>>,
}

impl Default for FrameNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameNormalizer {
    /// Create a normalizer. Buffers are allocated on first [`normalize`] call.
    ///
    /// [`normalize`]: FrameNormalizer::normalize
    #[must_use]
    pub fn new() -> Self {
        Self {
            rgb_scratch: Vec::new(),
            output: None,
            luts: LruCache::new(NonZeroUsize::new(LUT_CACHE_SIZE).unwrap()),
        }
    }

    /// Normalize one raw frame into the shared output bitmap.
    ///
    /// Converts planar YUV 4:2:0 to RGB (packed RGB passes through) and
    /// rotates so bitmap "up" matches physical "up". The returned reference
    /// borrows the normalizer's scratch buffer and is valid until the next
    /// call.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::FrameError`] if the buffer length does not
    /// match the declared format and dimensions, or a dimension is zero.
    /// These are transient: the caller skips the frame and continues.
    pub fn normalize(&mut self, frame: &RawFrame) -> Result<&RgbImage> {
        if frame.width == 0 || frame.height == 0 {
            return Err(PipelineError::FrameError(format!(
                "empty frame: {}x{}",
                frame.width, frame.height
            )));
        }
        // 4:2:0 subsampling requires even dimensions.
        if frame.format == PixelFormat::Yuv420 && (frame.width % 2 != 0 || frame.height % 2 != 0) {
            return Err(PipelineError::FrameError(format!(
                "odd dimensions for 4:2:0 frame: {}x{}",
                frame.width, frame.height
            )));
        }
        if frame.data.len() != frame.expected_len() {
            return Err(PipelineError::FrameError(format!(
                "buffer length {} does not match {}x{} {:?} (expected {})",
                frame.data.len(),
                frame.width,
                frame.height,
                frame.format,
                frame.expected_len()
            )));
        }

        let src: &[u8] = match frame.format {
            PixelFormat::Rgb24 => &frame.data,
            PixelFormat::Yuv420 => {
                yuv420_to_rgb(
                    &frame.data,
                    frame.width,
                    frame.height,
                    &mut self.rgb_scratch,
                );
                &self.rgb_scratch
            }
        };

        let (out_w, out_h) = if frame.rotation.swaps_dimensions() {
            (frame.height, frame.width)
        } else {
            (frame.width, frame.height)
        };

        // Reuse the output bitmap when the geometry is unchanged.
        let reusable = self
            .output
            .as_ref()
            .is_some_and(|img| img.width() == out_w && img.height() == out_h);
        if !reusable {
            self.output = Some(RgbImage::new(out_w, out_h));
        }
        let output = self.output.as_mut().unwrap();

        if frame.rotation == Rotation::Deg0 {
            output.copy_from_slice(src);
        } else {
            let key = (frame.width, frame.height, frame.rotation.degrees());
            let lut = self
                .luts
                .get_or_insert(key, || rotation_lut(frame.width, frame.height, frame.rotation));
            let dst: &mut [u8] = output;
            for (di, &si) in lut.iter().enumerate() {
                let s = si as usize * 3;
                let d = di * 3;
                dst[d..d + 3].copy_from_slice(&src[s..s + 3]);
            }
        }

        Ok(self.output.as_ref().unwrap())
    }
}

// ================================================================================================
// Conversion helpers
// ================================================================================================

/// Build the remap LUT for a clockwise rotation: for every destination pixel
/// index, the source pixel index that lands there.
fn rotation_lut(width: u32, height: u32, rotation: Rotation) -> Vec<u32> {
    let (w, h) = (width as usize, height as usize);
    let (out_w, out_h) = if rotation.swaps_dimensions() { (h, w) } else { (w, h) };

    let mut lut = vec![0u32; w * h];
    for dy in 0..out_h {
        for dx in 0..out_w {
            let (sx, sy) = match rotation {
                Rotation::Deg0 => (dx, dy),
                Rotation::Deg90 => (dy, h - 1 - dx),
                Rotation::Deg180 => (w - 1 - dx, h - 1 - dy),
                Rotation::Deg270 => (w - 1 - dy, dx),
            };
            lut[dy * out_w + dx] = (sy * w + sx) as u32;
        }
    }
    lut
}

/// Planar YUV 4:2:0 (I420) to packed RGB, fixed-point BT.601.
///
/// `out` is resized to `width * height * 3` and fully overwritten.
fn yuv420_to_rgb(data: &[u8], width: u32, height: u32, out: &mut Vec<u8>) {
    let (w, h) = (width as usize, height as usize);
    let y_plane = &data[..w * h];
    let u_plane = &data[w * h..w * h + (w / 2) * (h / 2)];
    let v_plane = &data[w * h + (w / 2) * (h / 2)..];

    out.resize(w * h * 3, 0);

    for row in 0..h {
        let chroma_row = row / 2;
        for col in 0..w {
            let y = i32::from(y_plane[row * w + col]);
            let u = i32::from(u_plane[chroma_row * (w / 2) + col / 2]);
            let v = i32::from(v_plane[chroma_row * (w / 2) + col / 2]);

            let c = y - 16;
            let d = u - 128;
            let e = v - 128;

            let r = clamp_u8((298 * c + 409 * e + 128) >> 8);
            let g = clamp_u8((298 * c - 100 * d - 208 * e + 128) >> 8);
            let b = clamp_u8((298 * c + 516 * d + 128) >> 8);

            let i = (row * w + col) * 3;
            out[i] = r;
            out[i + 1] = g;
            out[i + 2] = b;
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
const fn clamp_u8(v: i32) -> u8 {
    if v < 0 {
        0
    } else if v > 255 {
        255
    } else {
        v as u8
    }
}
