// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Integration tests for the posture pipeline: scripted frame sources and
//! estimators driving full sessions through the real worker.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};
use image::RgbImage;
use posefit::{
    BodyPart, Exercise, FrameSink, FrameSource, Keypoint, PixelFormat, Pipeline, PipelineListener,
    PoseEstimator, RawFrame, RenderSink, Result, Rotation, SessionConfig, Skeleton, NUM_KEYPOINTS,
};

// ================================================================================================
// Test doubles
// ================================================================================================

/// Frame source whose sink is driven directly by the test.
struct ScriptedSource {
    sink: Arc<Mutex<Option<FrameSink>>>,
}

impl ScriptedSource {
    fn new() -> (Self, Arc<Mutex<Option<FrameSink>>>) {
        let sink = Arc::new(Mutex::new(None));
        (Self { sink: Arc::clone(&sink) }, sink)
    }
}

impl FrameSource for ScriptedSource {
    fn start(&mut self, sink: FrameSink) -> Result<()> {
        *self.sink.lock().unwrap() = Some(sink);
        Ok(())
    }

    fn stop(&mut self) {
        self.sink.lock().unwrap().take();
    }
}

/// Push one 2x2 RGB frame whose first byte tags it.
fn push_frame(sink: &Arc<Mutex<Option<FrameSink>>>, tag: u8) {
    let mut data = vec![0u8; 2 * 2 * 3];
    data[0] = tag;
    let frame = RawFrame {
        data,
        width: 2,
        height: 2,
        format: PixelFormat::Rgb24,
        rotation: Rotation::Deg0,
    };
    if let Some(sink) = sink.lock().unwrap().as_ref() {
        sink.push(frame);
    }
}

/// Estimator returning whatever skeletons the test currently scripts.
struct ScriptedEstimator {
    skeletons: Arc<Mutex<Vec<Skeleton>>>,
}

impl ScriptedEstimator {
    fn new() -> (Self, Arc<Mutex<Vec<Skeleton>>>) {
        let skeletons = Arc::new(Mutex::new(Vec::new()));
        (Self { skeletons: Arc::clone(&skeletons) }, skeletons)
    }
}

impl PoseEstimator for ScriptedEstimator {
    fn estimate(&mut self, _bitmap: &RgbImage) -> Result<Vec<Skeleton>> {
        Ok(self.skeletons.lock().unwrap().clone())
    }
}

/// Estimator that records frame tags and blocks until released, so the test
/// controls exactly when each processing unit completes.
struct GateEstimator {
    seen: Arc<Mutex<Vec<u8>>>,
    entered_tx: Sender<()>,
    release_rx: Receiver<()>,
}

impl PoseEstimator for GateEstimator {
    fn estimate(&mut self, bitmap: &RgbImage) -> Result<Vec<Skeleton>> {
        self.seen.lock().unwrap().push(bitmap.get_pixel(0, 0)[0]);
        let _ = self.entered_tx.send(());
        let _ = self.release_rx.recv_timeout(Duration::from_secs(2));
        Ok(Vec::new())
    }
}

/// Listener recording every event.
#[derive(Default)]
struct Recorder {
    feedback: Mutex<Vec<String>>,
    counts: Mutex<Vec<u32>>,
    fps: Mutex<Vec<u32>>,
    detections: Mutex<usize>,
}

impl PipelineListener for Recorder {
    fn on_frame_rate(&self, fps: u32) {
        self.fps.lock().unwrap().push(fps);
    }

    fn on_person_detected(&self, _primary: &Skeleton, _skeletons: &[Skeleton], _bitmap: &RgbImage) {
        *self.detections.lock().unwrap() += 1;
    }

    fn on_posture_feedback(&self, feedback: &str) {
        self.feedback.lock().unwrap().push(feedback.to_string());
    }

    fn on_rep_count(&self, count: u32) {
        self.counts.lock().unwrap().push(count);
    }
}

/// Render sink counting presented frames.
#[derive(Clone)]
struct CountingSink {
    presented: Arc<Mutex<u32>>,
}

impl CountingSink {
    fn new() -> (Self, Arc<Mutex<u32>>) {
        let presented = Arc::new(Mutex::new(0));
        (Self { presented: Arc::clone(&presented) }, presented)
    }
}

impl RenderSink for CountingSink {
    fn viewport(&self) -> (u32, u32) {
        (32, 32)
    }

    fn present(&mut self, _frame: &RgbImage) {
        *self.presented.lock().unwrap() += 1;
    }
}

/// Skeleton with the given right-knee angle (hip-knee-ankle).
fn squat_skeleton(knee_degrees: f32) -> Skeleton {
    let mut kps = [Keypoint::new(0.0, 0.0, 0.0); NUM_KEYPOINTS];
    kps[BodyPart::RightHip.index()] = Keypoint::new(100.0, 100.0, 0.9);
    kps[BodyPart::RightKnee.index()] = Keypoint::new(100.0, 200.0, 0.9);
    // The hip ray points straight up from the knee; place the ankle at the
    // requested angle from it.
    let rad = (knee_degrees - 90.0).to_radians();
    kps[BodyPart::RightAnkle.index()] =
        Keypoint::new(100.0 + 100.0 * rad.cos(), 200.0 + 100.0 * rad.sin(), 0.9);
    Skeleton::new(kps, 0.9)
}

fn squat_pipeline(listener: Arc<Recorder>) -> Pipeline {
    let config = SessionConfig::new().with_exercise(Exercise::Squat);
    Pipeline::new(config, listener)
}

// ================================================================================================
// Scenarios
// ================================================================================================

#[test]
fn test_squat_session_counts_held_rep() {
    let recorder = Arc::new(Recorder::default());
    let mut pipeline = squat_pipeline(Arc::clone(&recorder));

    let (estimator, skeletons) = ScriptedEstimator::new();
    pipeline.set_estimator(Box::new(estimator));

    let (source, sink) = ScriptedSource::new();
    let (render, _presented) = CountingSink::new();
    pipeline.start(Box::new(source), Box::new(render)).unwrap();

    // Good squat (right knee at 90 degrees), held for 250 ms across frames.
    *skeletons.lock().unwrap() = vec![squat_skeleton(90.0)];
    push_frame(&sink, 1);
    thread::sleep(Duration::from_millis(250));
    push_frame(&sink, 2);
    thread::sleep(Duration::from_millis(80));

    assert_eq!(*recorder.counts.lock().unwrap(), vec![1]);
    assert!(recorder
        .feedback
        .lock()
        .unwrap()
        .iter()
        .all(|f| f == "squat posture is good"));

    // Shallow squat (40 degrees): feedback flips, counter returns to idle
    // without incrementing.
    *skeletons.lock().unwrap() = vec![squat_skeleton(40.0)];
    push_frame(&sink, 3);
    thread::sleep(Duration::from_millis(80));

    assert_eq!(*recorder.counts.lock().unwrap(), vec![1]);
    assert_eq!(
        recorder.feedback.lock().unwrap().last().map(String::as_str),
        Some("fix your squat posture")
    );
    assert!(*recorder.detections.lock().unwrap() >= 3);

    pipeline.stop();
}

#[test]
fn test_broken_hold_never_counts() {
    let recorder = Arc::new(Recorder::default());
    let mut pipeline = squat_pipeline(Arc::clone(&recorder));

    let (estimator, skeletons) = ScriptedEstimator::new();
    pipeline.set_estimator(Box::new(estimator));

    let (source, sink) = ScriptedSource::new();
    let (render, _presented) = CountingSink::new();
    pipeline.start(Box::new(source), Box::new(render)).unwrap();

    // A single passing frame starts a hold; the posture breaks before any
    // second passing frame could complete it. No partial credit.
    *skeletons.lock().unwrap() = vec![squat_skeleton(90.0)];
    push_frame(&sink, 1);
    thread::sleep(Duration::from_millis(50));
    *skeletons.lock().unwrap() = vec![squat_skeleton(40.0)];
    push_frame(&sink, 2);
    push_frame(&sink, 3);
    thread::sleep(Duration::from_millis(80));

    assert!(recorder.counts.lock().unwrap().is_empty());

    pipeline.stop();
}

#[test]
fn test_no_detection_emits_no_events_but_fps_continues() {
    let recorder = Arc::new(Recorder::default());
    let mut pipeline = squat_pipeline(Arc::clone(&recorder));

    // Estimator scripted to find nobody.
    let (estimator, _skeletons) = ScriptedEstimator::new();
    pipeline.set_estimator(Box::new(estimator));

    let (source, sink) = ScriptedSource::new();
    let (render, presented) = CountingSink::new();
    pipeline.start(Box::new(source), Box::new(render)).unwrap();

    for tag in 0..5 {
        push_frame(&sink, tag);
        thread::sleep(Duration::from_millis(40));
    }
    // Wait past the one-second FPS window.
    thread::sleep(Duration::from_millis(1100));

    assert!(recorder.feedback.lock().unwrap().is_empty());
    assert!(recorder.counts.lock().unwrap().is_empty());
    assert_eq!(*recorder.detections.lock().unwrap(), 0);
    assert!(!recorder.fps.lock().unwrap().is_empty());
    // Detection absence still renders the (skeleton-free) frames.
    assert_eq!(*presented.lock().unwrap(), 5);

    pipeline.stop();
}

#[test]
fn test_backpressure_drops_superseded_frame() {
    let recorder = Arc::new(Recorder::default());
    let mut pipeline = squat_pipeline(Arc::clone(&recorder));

    let seen = Arc::new(Mutex::new(Vec::new()));
    let (entered_tx, entered_rx) = bounded(8);
    let (release_tx, release_rx) = bounded(8);
    pipeline.set_estimator(Box::new(GateEstimator {
        seen: Arc::clone(&seen),
        entered_tx,
        release_rx,
    }));

    let (source, sink) = ScriptedSource::new();
    let (render, presented) = CountingSink::new();
    pipeline.start(Box::new(source), Box::new(render)).unwrap();

    // Frame 1 enters the processing unit and blocks inside the estimator.
    push_frame(&sink, 1);
    entered_rx.recv_timeout(Duration::from_secs(2)).unwrap();

    // Frames 2 and 3 arrive while frame 1 is still in flight: frame 2 is
    // displaced in the slot and must never be processed or rendered.
    push_frame(&sink, 2);
    push_frame(&sink, 3);
    release_tx.send(()).unwrap();

    entered_rx.recv_timeout(Duration::from_secs(2)).unwrap();
    release_tx.send(()).unwrap();
    thread::sleep(Duration::from_millis(80));

    assert_eq!(*seen.lock().unwrap(), vec![1, 3]);
    assert_eq!(*presented.lock().unwrap(), 2);

    pipeline.stop();
}

#[test]
fn test_reset_count_mid_session() {
    let recorder = Arc::new(Recorder::default());
    let mut pipeline = squat_pipeline(Arc::clone(&recorder));

    let (estimator, skeletons) = ScriptedEstimator::new();
    pipeline.set_estimator(Box::new(estimator));

    let (source, sink) = ScriptedSource::new();
    let (render, _presented) = CountingSink::new();
    pipeline.start(Box::new(source), Box::new(render)).unwrap();

    *skeletons.lock().unwrap() = vec![squat_skeleton(90.0)];
    push_frame(&sink, 1);
    thread::sleep(Duration::from_millis(250));
    push_frame(&sink, 2);
    thread::sleep(Duration::from_millis(80));
    assert_eq!(pipeline.rep_count(), 1);

    pipeline.reset_count();
    assert_eq!(pipeline.rep_count(), 0);
    assert_eq!(
        recorder.counts.lock().unwrap().last().copied(),
        Some(0)
    );

    pipeline.stop();
}
