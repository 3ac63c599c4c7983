// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Preview window for displaying composited frames.

use image::RgbImage;
use minifb::{Key, Window, WindowOptions};

use crate::error::{PipelineError, Result};

/// A simple preview window using minifb.
///
/// Runs on the thread that created it; the pipeline worker feeds it through a
/// [`WindowSink`](crate::visualizer::WindowSink).
pub struct Viewer {
    window: Window,
    pub width: usize,
    pub height: usize,
    buffer: Vec<u32>,
}

impl Viewer {
    /// Create a new viewer window.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::RenderError`] if the window cannot be created.
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self> {
        let mut window = Window::new(
            title,
            width,
            height,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| PipelineError::RenderError(format!("Failed to create window: {e}")))?;

        // Limit update rate
        window.limit_update_rate(Some(std::time::Duration::from_micros(16600)));

        Ok(Self {
            window,
            width,
            height,
            buffer: Vec::new(),
        })
    }

    /// Whether the window is still open and Escape/Q have not been pressed.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.window.is_open()
            && !self.window.is_key_down(Key::Escape)
            && !self.window.is_key_down(Key::Q)
    }

    /// Update the window with a new frame.
    ///
    /// Returns `Ok(false)` once the user closes the window.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::RenderError`] if the window update fails.
    pub fn update(&mut self, frame: &RgbImage) -> Result<bool> {
        if !self.is_open() {
            return Ok(false);
        }

        let (img_width, img_height) = (frame.width() as usize, frame.height() as usize);

        let num_pixels = img_width * img_height;
        if self.buffer.len() != num_pixels {
            self.buffer.resize(num_pixels, 0);
        }

        // Pack RGB as 0x00RRGGBB, the format minifb expects.
        for (i, pixel) in frame.pixels().enumerate() {
            let r = u32::from(pixel[0]);
            let g = u32::from(pixel[1]);
            let b = u32::from(pixel[2]);
            self.buffer[i] = (r << 16) | (g << 8) | b;
        }

        if self.width != img_width || self.height != img_height {
            self.width = img_width;
            self.height = img_height;
        }

        self.window
            .update_with_buffer(&self.buffer, self.width, self.height)
            .map_err(|e| PipelineError::RenderError(format!("Failed to update window: {e}")))?;

        Ok(true)
    }

    /// Pump window events without new frame content.
    pub fn idle(&mut self) {
        self.window.update();
    }
}
