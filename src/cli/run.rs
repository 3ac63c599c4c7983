// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! The `run` command: wire a camera, an estimator, and a preview window into
//! one exercise session.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;

use crate::classifier::Exercise;
use crate::cli::args::RunArgs;
use crate::config::SessionConfig;
use crate::error::{PipelineError, Result};
use crate::estimator::OnnxPoseEstimator;
use crate::frame::Rotation;
use crate::overlay::Color;
use crate::pipeline::{Pipeline, PipelineListener};
use crate::source::{enumerate_cameras, select_camera, CameraSource};
use crate::visualizer::{Viewer, WindowSink};
use crate::{info, success, verbose, warn};

/// Console listener: feedback transitions, rep counts, and verbose FPS.
struct CliListener {
    last_feedback: Mutex<String>,
}

impl CliListener {
    fn new() -> Self {
        Self { last_feedback: Mutex::new(String::new()) }
    }
}

impl PipelineListener for CliListener {
    fn on_frame_rate(&self, fps: u32) {
        verbose!("fps: {fps}");
    }

    fn on_posture_feedback(&self, feedback: &str) {
        let Ok(mut last) = self.last_feedback.lock() else {
            return;
        };
        if *last != feedback {
            info!("{feedback}");
            *last = feedback.to_string();
        }
    }

    fn on_rep_count(&self, count: u32) {
        success!("reps: {count}");
    }
}

/// Resolve the `--source` argument to a capture path.
fn resolve_source(source: &str) -> Result<String> {
    if source == "auto" {
        let devices = enumerate_cameras();
        let device = select_camera(&devices).ok_or_else(|| {
            PipelineError::CameraError("no capture devices found".to_string())
        })?;
        verbose!("selected camera {} ({})", device.index, device.path);
        return Ok(device.path.clone());
    }

    if let Ok(index) = source.parse::<u32>() {
        let devices = enumerate_cameras();
        return devices
            .iter()
            .find(|d| d.index == index)
            .map(|d| d.path.clone())
            .ok_or_else(|| {
                PipelineError::CameraError(format!("no capture device with index {index}"))
            });
    }

    Ok(source.to_string())
}

/// Run one exercise session until the preview window closes.
///
/// # Errors
///
/// Fatal setup errors (bad color, model load, camera open, window creation)
/// abort the session start.
pub fn run_session(args: &RunArgs) -> Result<()> {
    crate::cli::logging::set_verbose(args.verbose);

    let good_color = Color::parse(&args.color).ok_or_else(|| {
        PipelineError::ConfigError(format!("unrecognized color: {}", args.color))
    })?;
    let config = SessionConfig::new()
        .with_exercise(args.exercise)
        .with_good_color(good_color)
        .with_min_pose_score(args.min_score);

    let estimator = OnnxPoseEstimator::load(&args.model)?
        .with_input_size(args.imgsz, args.imgsz)
        .with_min_score(args.min_score);

    let mut source = CameraSource::new(resolve_source(&args.source)?);
    if let Some(degrees) = args.rotate {
        source = source.with_rotation(Rotation::from_degrees(degrees));
    }

    let (sink, frames) = WindowSink::pair(args.width, args.height);
    let mut viewer = Viewer::new("posefit", args.width as usize, args.height as usize)?;

    let mut pipeline = Pipeline::new(config, Arc::new(CliListener::new()));
    pipeline.set_estimator(Box::new(estimator));
    if !pipeline.load_overlay_font() {
        warn!("overlay font unavailable; text overlays disabled");
    }

    pipeline.start(Box::new(source), Box::new(sink))?;
    if args.exercise == Exercise::None {
        warn!("no exercise selected; verdicts will not pass");
    }
    info!("session started: {} (close the window or press Esc to stop)", args.exercise);

    while viewer.is_open() {
        match frames.recv_timeout(Duration::from_millis(100)) {
            Ok(frame) => {
                if !viewer.update(&frame)? {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => viewer.idle(),
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    pipeline.stop();
    success!("session ended with {} reps", pipeline.rep_count());
    Ok(())
}
