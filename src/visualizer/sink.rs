// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Render sink bridging the pipeline worker to the preview window.
//!
//! The worker pushes composited frames fire-and-forget; the window thread
//! drains them at its own pace. Like the camera-side delivery slot, the
//! bridge holds at most one frame and a newer frame replaces an unconsumed
//! one, so a stalled window never backs up the pipeline.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use image::RgbImage;

use crate::pipeline::RenderSink;

/// `Send` render sink feeding a [`Viewer`](crate::visualizer::Viewer) loop.
pub struct WindowSink {
    tx: Sender<RgbImage>,
    rx: Receiver<RgbImage>,
    width: u32,
    height: u32,
}

impl WindowSink {
    /// Create a sink for a viewport and the receiver the window thread polls.
    #[must_use]
    pub fn pair(width: u32, height: u32) -> (Self, Receiver<RgbImage>) {
        let (tx, rx) = bounded(1);
        (Self { tx, rx: rx.clone(), width, height }, rx)
    }
}

impl RenderSink for WindowSink {
    fn viewport(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn present(&mut self, frame: &RgbImage) {
        let mut frame = frame.clone();
        loop {
            match self.tx.try_send(frame) {
                Ok(()) => return,
                Err(TrySendError::Full(returned)) => {
                    let _ = self.rx.try_recv();
                    frame = returned;
                }
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }
}
