// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Minimal library walkthrough: a synthetic squat session without a camera
//! or a model, printing feedback and rep counts to the console.
//!
//! ```bash
//! cargo run --example squat_session
//! ```

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use image::RgbImage;
use posefit::{
    BodyPart, Exercise, FrameSink, FrameSource, Keypoint, PixelFormat, Pipeline, PipelineListener,
    PoseEstimator, RawFrame, RenderSink, Result, Rotation, SessionConfig, Skeleton, NUM_KEYPOINTS,
};

/// Swings the right knee between a deep squat and standing every few frames.
struct SwingingEstimator {
    frame: u32,
}

impl PoseEstimator for SwingingEstimator {
    fn estimate(&mut self, _bitmap: &RgbImage) -> Result<Vec<Skeleton>> {
        self.frame += 1;
        // Eight frames down in the pass range, eight frames up outside it.
        let degrees = if (self.frame / 8) % 2 == 0 { 90.0 } else { 160.0 };

        let mut kps = [Keypoint::new(0.0, 0.0, 0.0); NUM_KEYPOINTS];
        kps[BodyPart::RightHip.index()] = Keypoint::new(320.0, 180.0, 0.9);
        kps[BodyPart::RightKnee.index()] = Keypoint::new(320.0, 300.0, 0.9);
        let rad = (degrees - 90.0f32).to_radians();
        kps[BodyPart::RightAnkle.index()] =
            Keypoint::new(320.0 + 120.0 * rad.cos(), 300.0 + 120.0 * rad.sin(), 0.9);
        Ok(vec![Skeleton::new(kps, 0.9)])
    }
}

/// Delivers blank preview-sized frames at ~30 fps from a helper thread.
struct SyntheticCamera {
    stop: Arc<Mutex<bool>>,
}

impl FrameSource for SyntheticCamera {
    fn start(&mut self, sink: FrameSink) -> Result<()> {
        let stop = Arc::clone(&self.stop);
        thread::spawn(move || {
            while !*stop.lock().unwrap() {
                sink.push(RawFrame {
                    data: vec![32; 640 * 480 * 3],
                    width: 640,
                    height: 480,
                    format: PixelFormat::Rgb24,
                    rotation: Rotation::Deg0,
                });
                thread::sleep(Duration::from_millis(33));
            }
        });
        Ok(())
    }

    fn stop(&mut self) {
        *self.stop.lock().unwrap() = true;
    }
}

struct DropSink;

impl RenderSink for DropSink {
    fn viewport(&self) -> (u32, u32) {
        (960, 720)
    }
    fn present(&mut self, _frame: &RgbImage) {}
}

struct Console {
    last: Mutex<String>,
}

impl PipelineListener for Console {
    fn on_posture_feedback(&self, feedback: &str) {
        let mut last = self.last.lock().unwrap();
        if *last != feedback {
            println!("{feedback}");
            *last = feedback.to_string();
        }
    }
    fn on_rep_count(&self, count: u32) {
        println!("reps: {count}");
    }
}

fn main() -> Result<()> {
    let config = SessionConfig::new().with_exercise(Exercise::Squat);
    let mut pipeline = Pipeline::new(config, Arc::new(Console { last: Mutex::new(String::new()) }));
    pipeline.set_estimator(Box::new(SwingingEstimator { frame: 0 }));

    let camera = SyntheticCamera { stop: Arc::new(Mutex::new(false)) };
    pipeline.start(Box::new(camera), Box::new(DropSink))?;

    thread::sleep(Duration::from_secs(3));
    pipeline.stop();
    println!("final count: {}", pipeline.rep_count());
    Ok(())
}
