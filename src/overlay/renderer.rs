// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Overlay compositing: skeleton drawing, viewport letterboxing, rep count.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use ab_glyph::{FontRef, PxScale};
use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::RgbImage;
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut, draw_text_mut};

use crate::error::{PipelineError, Result};
use crate::overlay::color::Color;
use crate::overlay::skeleton::SKELETON;
use crate::pose::{BodyPart, Skeleton};

/// Assets URL for downloading fonts
const ASSETS_URL: &str = "https://github.com/ultralytics/assets/releases/download/v0.0.0";

/// Font used for labels and the rep count.
const FONT_NAME: &str = "Arial.ttf";

/// Radius of the filled marker drawn at every keypoint.
const KEYPOINT_RADIUS: i32 = 4;

/// Vertical offset of the per-person label above the nose keypoint.
const LABEL_MARGIN: f32 = 28.0;

/// Text size of per-person labels.
const LABEL_SCALE: f32 = 18.0;

/// Text size of the rep count overlay.
const COUNT_SCALE: f32 = 32.0;

/// Fixed position of the rep count overlay.
const COUNT_POS: (i32, i32) = (16, 16);

/// One skeleton with its resolved display color and label for this frame.
#[derive(Debug, Clone, Copy)]
pub struct PersonOverlay<'a> {
    /// The detected skeleton.
    pub skeleton: &'a Skeleton,
    /// Display color: the configured good color, or the alert color on a
    /// failing verdict.
    pub color: Color,
    /// Label drawn near the head keypoint.
    pub label: &'a str,
}

/// Aspect-fit placement of a frame inside a viewport.
///
/// Scales by the viewport dimension that constrains more tightly and centers
/// the image along the other axis. Returns `(x, y, width, height)` of the
/// image rectangle inside the viewport.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn fit_rect(frame: (u32, u32), viewport: (u32, u32)) -> (u32, u32, u32, u32) {
    let (fw, fh) = (frame.0.max(1) as f32, frame.1.max(1) as f32);
    let (vw, vh) = (viewport.0 as f32, viewport.1 as f32);

    let scale = (vw / fw).min(vh / fh);
    let w = ((fw * scale).round() as u32).clamp(1, viewport.0);
    let h = ((fh * scale).round() as u32).clamp(1, viewport.1);
    let x = (viewport.0 - w) / 2;
    let y = (viewport.1 - h) / 2;
    (x, y, w, h)
}

/// Draws skeleton overlays and composites frames into the display viewport.
///
/// Owns reusable scratch bitmaps for the annotated frame and the viewport
/// canvas; one renderer belongs to one processing context.
pub struct OverlayRenderer {
    font_data: Option<Vec<u8>>,
    annotated: Option<RgbImage>,
    canvas: Option<RgbImage>,
    resizer: Resizer,
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayRenderer {
    /// Create a renderer without a font; text overlays are skipped until
    /// [`load_font`](OverlayRenderer::load_font) succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self {
            font_data: None,
            annotated: None,
            canvas: None,
            resizer: Resizer::new(),
        }
    }

    /// Locate (or download once) the overlay font and keep it loaded.
    ///
    /// Returns `false` when no font could be obtained; the renderer then
    /// draws skeletons without text rather than failing.
    pub fn load_font(&mut self) -> bool {
        let Some(path) = check_font(FONT_NAME) else {
            return false;
        };
        let data = File::open(path).ok().and_then(|mut f| {
            let mut buffer = Vec::new();
            f.read_to_end(&mut buffer).ok()?;
            Some(buffer)
        });
        // Only keep bytes ab_glyph can actually parse.
        self.font_data = data.filter(|d| FontRef::try_from_slice(d).is_ok());
        self.font_data.is_some()
    }

    /// Compose one output frame: skeletons and labels drawn over the source
    /// bitmap, aspect-fit into the viewport over a cleared background, with
    /// the running rep count on top.
    ///
    /// The returned reference borrows the renderer's canvas and is valid until
    /// the next call.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::RenderError`] if the resize stage rejects the
    /// frame or viewport geometry.
    pub fn compose(
        &mut self,
        frame: &RgbImage,
        persons: &[PersonOverlay<'_>],
        rep_count: u32,
        viewport: (u32, u32),
    ) -> Result<&RgbImage> {
        let font = self
            .font_data
            .as_deref()
            .and_then(|d| FontRef::try_from_slice(d).ok());

        // Draw skeletons on a reusable copy of the source bitmap.
        let annotated = reuse_scratch(&mut self.annotated, frame.width(), frame.height());
        annotated.copy_from_slice(frame.as_raw());
        for person in persons {
            draw_person(annotated, person, font.as_ref());
        }

        // Clear the viewport canvas, then letterbox the annotated frame in.
        let (x, y, w, h) = fit_rect((frame.width(), frame.height()), viewport);
        let canvas = reuse_scratch(&mut self.canvas, viewport.0, viewport.1);
        for px in canvas.pixels_mut() {
            *px = image::Rgb([0, 0, 0]);
        }

        let src_image = Image::from_vec_u8(
            frame.width(),
            frame.height(),
            annotated.as_raw().clone(),
            PixelType::U8x3,
        )
        .map_err(|e| PipelineError::RenderError(format!("invalid source frame: {e}")))?;
        let mut dst_image = Image::new(w, h, PixelType::U8x3);
        let options =
            ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear));
        self.resizer
            .resize(&src_image, &mut dst_image, &options)
            .map_err(|e| PipelineError::RenderError(format!("resize failed: {e}")))?;

        let dst_row_len = (w * 3) as usize;
        let canvas_row_len = (viewport.0 * 3) as usize;
        let canvas_raw: &mut [u8] = canvas;
        for row in 0..h as usize {
            let src_start = row * dst_row_len;
            let dst_start = (y as usize + row) * canvas_row_len + (x * 3) as usize;
            canvas_raw[dst_start..dst_start + dst_row_len]
                .copy_from_slice(&dst_image.buffer()[src_start..src_start + dst_row_len]);
        }

        if let Some(ref f) = font {
            draw_text_mut(
                canvas,
                Color::WHITE.to_rgb(),
                COUNT_POS.0,
                COUNT_POS.1,
                PxScale::from(COUNT_SCALE),
                f,
                &format!("Reps: {rep_count}"),
            );
        }

        Ok(self.canvas.as_ref().unwrap())
    }
}

/// Draw one person: connecting segments, keypoint markers, and the label.
#[allow(clippy::cast_possible_truncation)]
fn draw_person(img: &mut RgbImage, person: &PersonOverlay<'_>, font: Option<&FontRef<'_>>) {
    let rgb = person.color.to_rgb();

    for [a, b] in &SKELETON {
        let pa = person.skeleton.keypoint(*a);
        let pb = person.skeleton.keypoint(*b);
        draw_line_segment_mut(img, (pa.x, pa.y), (pb.x, pb.y), rgb);
    }

    for kp in person.skeleton.keypoints() {
        draw_filled_circle_mut(img, (kp.x as i32, kp.y as i32), KEYPOINT_RADIUS, rgb);
    }

    if let Some(f) = font {
        let nose = person.skeleton.keypoint(BodyPart::Nose);
        let tx = (nose.x as i32).max(0);
        let ty = ((nose.y - LABEL_MARGIN) as i32).max(0);
        if (tx as u32) < img.width() && (ty as u32) < img.height() {
            draw_text_mut(img, rgb, tx, ty, PxScale::from(LABEL_SCALE), f, person.label);
        }
    }
}

/// Reuse a scratch bitmap when its geometry matches, reallocating otherwise.
fn reuse_scratch(slot: &mut Option<RgbImage>, width: u32, height: u32) -> &mut RgbImage {
    let reusable = slot
        .as_ref()
        .is_some_and(|img| img.width() == width && img.height() == height);
    if !reusable {
        *slot = Some(RgbImage::new(width, height));
    }
    slot.as_mut().unwrap()
}

/// Check if the font exists locally or download it once.
fn check_font(font: &str) -> Option<PathBuf> {
    let font_name = Path::new(font).file_name()?.to_string_lossy();
    let config_dir = dirs::config_dir()?.join("Ultralytics");
    let font_path = config_dir.join(font_name.as_ref());

    if font_path.exists() {
        return Some(font_path);
    }

    if fs::create_dir_all(&config_dir).is_err() {
        return None;
    }

    let url = format!("{ASSETS_URL}/{font_name}");
    match ureq::get(&url).call() {
        Ok(response) => {
            let mut file = File::create(&font_path).ok()?;
            let mut reader = response.into_body().into_reader();
            if io::copy(&mut reader, &mut file).is_err() {
                let _ = fs::remove_file(&font_path);
                return None;
            }
            Some(font_path)
        }
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{Keypoint, NUM_KEYPOINTS};

    fn skeleton_at(x: f32, y: f32) -> Skeleton {
        Skeleton::new([Keypoint::new(x, y, 1.0); NUM_KEYPOINTS], 0.9)
    }

    #[test]
    fn test_fit_rect_pillarboxes_tall_viewport() {
        // 640x480 frame into a 480x960 viewport: width constrains.
        let (x, y, w, h) = fit_rect((640, 480), (480, 960));
        assert_eq!((w, h), (480, 360));
        assert_eq!(x, 0);
        assert_eq!(y, (960 - 360) / 2);
    }

    #[test]
    fn test_fit_rect_letterboxes_wide_viewport() {
        // 480x640 frame into a 1280x720 viewport: height constrains.
        let (x, y, w, h) = fit_rect((480, 640), (1280, 720));
        assert_eq!((w, h), (540, 720));
        assert_eq!(x, (1280 - 540) / 2);
        assert_eq!(y, 0);
    }

    #[test]
    fn test_fit_rect_exact_fit() {
        assert_eq!(fit_rect((640, 480), (640, 480)), (0, 0, 640, 480));
    }

    #[test]
    fn test_compose_clears_and_centers() {
        let mut frame = RgbImage::new(8, 8);
        for px in frame.pixels_mut() {
            *px = image::Rgb([0, 0, 200]);
        }

        let mut renderer = OverlayRenderer::new();
        let out = renderer.compose(&frame, &[], 0, (16, 8)).unwrap().clone();

        assert_eq!((out.width(), out.height()), (16, 8));
        // Pillarbox bars stay cleared.
        assert_eq!(out.get_pixel(0, 4).0, [0, 0, 0]);
        assert_eq!(out.get_pixel(15, 4).0, [0, 0, 0]);
        // Center carries the frame content.
        assert_eq!(out.get_pixel(8, 4).0, [0, 0, 200]);
    }

    #[test]
    fn test_compose_has_no_stale_overlays() {
        let frame = RgbImage::new(8, 8);
        let skeleton = skeleton_at(4.0, 4.0);
        let persons = [PersonOverlay { skeleton: &skeleton, color: Color::GREEN, label: "ok" }];

        let mut renderer = OverlayRenderer::new();
        let with_person = renderer.compose(&frame, &persons, 0, (8, 8)).unwrap().clone();
        assert!(with_person.pixels().any(|p| p.0 == [0, 255, 0]));

        // Next frame without a person: the previous skeleton must be gone.
        let empty = renderer.compose(&frame, &[], 0, (8, 8)).unwrap().clone();
        assert!(empty.pixels().all(|p| p.0 != [0, 255, 0]));
    }

    #[test]
    fn test_compose_draws_skeleton_in_assigned_color() {
        let mut frame = RgbImage::new(32, 32);
        for px in frame.pixels_mut() {
            *px = image::Rgb([10, 10, 10]);
        }
        let skeleton = skeleton_at(16.0, 16.0);
        let persons =
            [PersonOverlay { skeleton: &skeleton, color: Color::RED, label: "fix" }];

        let mut renderer = OverlayRenderer::new();
        let out = renderer.compose(&frame, &persons, 3, (32, 32)).unwrap();
        assert!(out.pixels().any(|p| p.0 == [255, 0, 0]));
    }
}
