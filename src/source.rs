// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Frame acquisition: camera lifecycle and latest-frame-wins delivery.
//!
//! A [`FrameSource`] owns one capture device and delivers raw frames into a
//! [`FrameSink`]. The sink holds at most one undelivered frame: a new frame
//! replaces a pending one instead of queuing, so a slow consumer never causes
//! buildup and always sees the most recent frame.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::error::Result;
use crate::frame::{Facing, RawFrame};

/// Capture device lifecycle, driven by completion signals.
///
/// `Closed -> Opening -> Open -> Capturing -> Closed`; open and configure
/// failures drop straight back to `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraState {
    /// No device resources held.
    Closed,
    /// Device open requested, not yet completed.
    Opening,
    /// Device open, stream not yet running.
    Open,
    /// Frames are being delivered.
    Capturing,
}

/// One enumerated capture device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDescriptor {
    /// Enumeration index.
    pub index: u32,
    /// Platform device path or identifier.
    pub path: String,
    /// Which way the sensor faces.
    pub facing: Facing,
}

/// Deterministic device selection: prefer the rear-facing sensor.
///
/// Selection happens once, before first use. Front-facing devices are skipped
/// unless no rear-facing device exists.
#[must_use]
pub fn select_camera(devices: &[CameraDescriptor]) -> Option<&CameraDescriptor> {
    devices
        .iter()
        .find(|d| d.facing == Facing::Rear)
        .or_else(|| devices.first())
}

/// Asynchronous raw-frame producer interface.
pub trait FrameSource: Send {
    /// Open the device and begin delivering frames into `sink`.
    ///
    /// # Errors
    ///
    /// Device-open and stream-configuration failures are fatal to the session:
    /// they are returned to the caller and never retried. A disconnect after a
    /// successful start releases resources silently instead.
    fn start(&mut self, sink: FrameSink) -> Result<()>;

    /// Stop delivering frames and release the device. Idempotent.
    fn stop(&mut self);
}

/// Latest-frame-wins delivery slot between a frame source and the pipeline.
///
/// Backed by a bounded(1) channel; [`push`](FrameSink::push) displaces a
/// pending frame rather than blocking or queuing.
#[derive(Clone)]
pub struct FrameSink {
    tx: Sender<RawFrame>,
    rx: Receiver<RawFrame>,
}

impl FrameSink {
    /// Create a sink and the receiver the pipeline worker drains.
    #[must_use]
    pub fn pair() -> (Self, Receiver<RawFrame>) {
        let (tx, rx) = bounded(1);
        (Self { tx, rx: rx.clone() }, rx)
    }

    /// Deliver one frame, replacing any frame still pending in the slot.
    pub fn push(&self, frame: RawFrame) {
        let mut frame = frame;
        loop {
            match self.tx.try_send(frame) {
                Ok(()) => return,
                Err(TrySendError::Full(returned)) => {
                    // Drop the superseded frame and retry with the new one.
                    let _ = self.rx.try_recv();
                    frame = returned;
                }
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }
}

#[cfg(feature = "video")]
pub use video::{enumerate_cameras, CameraSource};

#[cfg(feature = "video")]
mod video {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Once};
    use std::thread::JoinHandle;

    use super::{CameraDescriptor, CameraState, FrameSink, FrameSource};
    use crate::error::{PipelineError, Result};
    use crate::frame::{Facing, PixelFormat, RawFrame, Rotation, PREVIEW_HEIGHT, PREVIEW_WIDTH};
    use crate::verbose;

    /// Enumerate capture devices on this host.
    ///
    /// Desktop V4L2-style device nodes expose no facing metadata; they are
    /// reported as rear-facing so [`super::select_camera`] keeps the original
    /// skip-front rule. Embedders with real facing data can build
    /// [`CameraDescriptor`]s directly.
    #[must_use]
    pub fn enumerate_cameras() -> Vec<CameraDescriptor> {
        #[cfg(target_os = "linux")]
        {
            (0..10)
                .map(|i| (i, format!("/dev/video{i}")))
                .filter(|(_, path)| std::path::Path::new(path).exists())
                .map(|(index, path)| CameraDescriptor { index, path, facing: Facing::Rear })
                .collect()
        }
        #[cfg(not(target_os = "linux"))]
        {
            vec![CameraDescriptor { index: 0, path: "0".to_string(), facing: Facing::Rear }]
        }
    }

    /// Camera (or video file) frame source decoding on a dedicated thread.
    ///
    /// Delivers packed-RGB raw frames stamped with the session's rotation.
    pub struct CameraSource {
        path: PathBuf,
        rotation: Rotation,
        state: CameraState,
        stop_flag: Arc<AtomicBool>,
        handle: Option<JoinHandle<()>>,
    }

    impl CameraSource {
        /// Create a source for a device node or video file path.
        #[must_use]
        pub fn new<P: Into<PathBuf>>(path: P) -> Self {
            Self {
                path: path.into(),
                rotation: Rotation::Deg0,
                state: CameraState::Closed,
                stop_flag: Arc::new(AtomicBool::new(false)),
                handle: None,
            }
        }

        /// Set the rotation stamped on delivered frames.
        #[must_use]
        pub const fn with_rotation(mut self, rotation: Rotation) -> Self {
            self.rotation = rotation;
            self
        }

        /// Current device lifecycle state.
        #[must_use]
        pub const fn state(&self) -> CameraState {
            self.state
        }
    }

    impl FrameSource for CameraSource {
        fn start(&mut self, sink: FrameSink) -> Result<()> {
            if self.handle.is_some() {
                return Err(PipelineError::ConfigError(
                    "frame source already capturing".to_string(),
                ));
            }

            static FFMPEG_INIT: Once = Once::new();
            FFMPEG_INIT.call_once(|| {
                let _ = video_rs::init();
            });

            // Open on the caller's thread so setup failures surface directly.
            self.state = CameraState::Opening;
            let mut decoder = video_rs::decode::Decoder::new(self.path.as_path()).map_err(|e| {
                self.state = CameraState::Closed;
                PipelineError::CameraError(format!(
                    "failed to open {}: {e}",
                    self.path.display()
                ))
            })?;
            self.state = CameraState::Open;

            self.stop_flag.store(false, Ordering::Relaxed);
            let stop = Arc::clone(&self.stop_flag);
            let rotation = self.rotation;
            self.handle = Some(std::thread::spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    match decoder.decode() {
                        Ok((_ts, frame)) => {
                            let (data, width, height) = bound_to_preview(&frame);
                            sink.push(RawFrame {
                                data,
                                width,
                                height,
                                format: PixelFormat::Rgb24,
                                rotation,
                            });
                        }
                        // Disconnect or end of stream: release silently.
                        Err(_) => break,
                    }
                }
            }));
            self.state = CameraState::Capturing;
            Ok(())
        }

        fn stop(&mut self) {
            self.stop_flag.store(true, Ordering::Relaxed);
            if let Some(handle) = self.handle.take() {
                // The in-flight decode returns naturally; join failures are
                // logged and teardown proceeds best-effort.
                if handle.join().is_err() {
                    verbose!("camera decode thread panicked during shutdown");
                }
            }
            self.state = CameraState::Closed;
        }
    }

    impl Drop for CameraSource {
        fn drop(&mut self) {
            self.stop();
        }
    }

    /// Bound a decoded frame to the fixed capture resolution.
    ///
    /// Sensors delivering more than the preview resolution are decimated by an
    /// integer stride (deterministic, no interpolation); frames already within
    /// bounds copy through unchanged.
    #[allow(clippy::cast_possible_truncation)]
    fn bound_to_preview(frame: &video_rs::Frame) -> (Vec<u8>, u32, u32) {
        let shape = frame.shape();
        let (height, width) = (shape[0], shape[1]);

        let step = width
            .div_ceil(PREVIEW_WIDTH as usize)
            .max(height.div_ceil(PREVIEW_HEIGHT as usize))
            .max(1);
        if step == 1 {
            let data = frame
                .as_slice()
                .map_or_else(|| frame.iter().copied().collect(), <[u8]>::to_vec);
            return (data, width as u32, height as u32);
        }

        let (out_w, out_h) = (width / step, height / step);
        let mut data = Vec::with_capacity(out_w * out_h * 3);
        for y in 0..out_h {
            for x in 0..out_w {
                for c in 0..3 {
                    data.push(frame[[y * step, x * step, c]]);
                }
            }
        }
        (data, out_w as u32, out_h as u32)
    }
}
