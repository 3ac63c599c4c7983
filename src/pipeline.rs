// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Pipeline orchestration: wiring, concurrency boundaries, and lifecycle.
//!
//! The pipeline runs three execution contexts:
//!
//! - a dedicated worker thread that runs the per-frame processing unit
//!   (normalize, estimate, classify, count, render) to completion, one frame
//!   at a time;
//! - the control context (the [`Pipeline`] methods), the only writer of the
//!   exercise selector and of the estimator/scratch lifecycle;
//! - the render context, which receives finished frames through a
//!   fire-and-forget [`RenderSink`].
//!
//! Frames arriving faster than the worker drains are dropped by the
//! latest-frame-wins slot, never queued, bounding memory to one in-flight
//! frame. Teardown stops the frame source first, then drains and joins the
//! worker, then releases the estimator, so no callback can fire into freed
//! state.

use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, select, tick, Receiver, Sender};
use image::RgbImage;

use crate::classifier::{classify, Exercise, Verdict};
use crate::config::SessionConfig;
use crate::counter::RepCounter;
use crate::error::{PipelineError, Result};
use crate::estimator::PoseEstimator;
use crate::frame::RawFrame;
use crate::normalizer::FrameNormalizer;
use crate::overlay::{Color, OverlayRenderer, PersonOverlay};
use crate::pose::Skeleton;
use crate::source::{FrameSink, FrameSource};
use crate::verbose;

/// Width of the frame-rate measurement window.
const FPS_WINDOW: Duration = Duration::from_secs(1);

/// Observer interface for pipeline events.
///
/// All methods default to no-ops so implementors subscribe only to what they
/// need. Callbacks run on the worker thread and should return promptly.
pub trait PipelineListener: Send + Sync {
    /// Frames processed in the last one-second window. Fires once per second
    /// while the session runs, measured on a monotonic ticker.
    fn on_frame_rate(&self, _fps: u32) {}

    /// At least one skeleton was found in this frame. `primary` is the first
    /// detection; `bitmap` is the normalized frame the estimator saw.
    fn on_person_detected(&self, _primary: &Skeleton, _skeletons: &[Skeleton], _bitmap: &RgbImage) {
    }

    /// Posture feedback for the primary skeleton, once per processed frame
    /// with a detection.
    fn on_posture_feedback(&self, _feedback: &str) {}

    /// The repetition count changed (or was explicitly reset to 0).
    fn on_rep_count(&self, _count: u32) {}
}

/// Output surface the worker pushes finished frames to, fire-and-forget.
pub trait RenderSink: Send {
    /// Destination viewport dimensions (width, height).
    fn viewport(&self) -> (u32, u32);

    /// Present one composited frame. Not acknowledged back to the worker.
    fn present(&mut self, frame: &RgbImage);
}

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// No session running; configuration may change.
    Idle,
    /// Frames are flowing.
    Running,
    /// Session suspended; the estimator stays loaded.
    Paused,
}

/// Shared mutable state of the processing unit: the normalizer's scratch
/// buffer and the active estimator live behind one lock, so swapping the
/// estimator is mutually exclusive with an in-flight frame.
struct ProcessingCore {
    normalizer: FrameNormalizer,
    estimator: Option<Box<dyn PoseEstimator>>,
}

/// State the worker hands back when it exits, reused on resume.
struct WorkerState {
    renderer: OverlayRenderer,
    render: Box<dyn RenderSink>,
}

struct Worker {
    shutdown_tx: Sender<()>,
    handle: JoinHandle<WorkerState>,
}

/// Real-time posture pipeline: frame source to rendered overlay.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use posefit::{Exercise, Pipeline, PipelineListener, SessionConfig};
///
/// struct PrintReps;
/// impl PipelineListener for PrintReps {
///     fn on_rep_count(&self, count: u32) {
///         println!("reps: {count}");
///     }
/// }
///
/// let config = SessionConfig::new().with_exercise(Exercise::Squat);
/// let mut pipeline = Pipeline::new(config, Arc::new(PrintReps));
/// # let _ = &mut pipeline;
/// ```
pub struct Pipeline {
    config: SessionConfig,
    core: Arc<Mutex<ProcessingCore>>,
    counter: Arc<Mutex<RepCounter>>,
    listener: Arc<dyn PipelineListener>,
    source: Option<Box<dyn FrameSource>>,
    renderer: Option<OverlayRenderer>,
    render: Option<Box<dyn RenderSink>>,
    worker: Option<Worker>,
    state: PipelineState,
}

impl Pipeline {
    /// Create an idle pipeline with the given session configuration.
    #[must_use]
    pub fn new(config: SessionConfig, listener: Arc<dyn PipelineListener>) -> Self {
        Self {
            config,
            core: Arc::new(Mutex::new(ProcessingCore {
                normalizer: FrameNormalizer::new(),
                estimator: None,
            })),
            counter: Arc::new(Mutex::new(RepCounter::new())),
            listener,
            source: None,
            renderer: Some(OverlayRenderer::new()),
            render: None,
            worker: None,
            state: PipelineState::Idle,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> PipelineState {
        self.state
    }

    /// Current repetition count.
    #[must_use]
    pub fn rep_count(&self) -> u32 {
        self.counter.lock().map_or(0, |c| c.count())
    }

    /// Select the exercise for the next session.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ConfigError`] unless the pipeline is idle:
    /// the selector is fixed for the lifetime of a session, and changing it
    /// requires tearing the session down first.
    pub fn configure(&mut self, exercise: Exercise) -> Result<()> {
        if self.state != PipelineState::Idle {
            return Err(PipelineError::ConfigError(
                "exercise can only change while idle".to_string(),
            ));
        }
        self.config.exercise = exercise;
        Ok(())
    }

    /// Update the good-posture display color. Takes effect at the next start
    /// or resume, matching the external settings read points.
    pub fn set_good_color(&mut self, color: Color) {
        self.config.good_color = color;
    }

    /// Install the active pose estimator, closing any previous one.
    ///
    /// Blocks until an in-flight processing unit completes: the estimator and
    /// the normalizer scratch share the processing-unit lock, so the swap can
    /// never interleave with a frame mid-processing.
    pub fn set_estimator(&mut self, estimator: Box<dyn PoseEstimator>) {
        if let Ok(mut core) = self.core.lock() {
            if let Some(mut old) = core.estimator.take() {
                old.close();
            }
            core.estimator = Some(estimator);
        }
    }

    /// Try to load the overlay font. Returns `false` while a session runs or
    /// when no font could be obtained (text overlays are then skipped).
    pub fn load_overlay_font(&mut self) -> bool {
        self.renderer.as_mut().is_some_and(OverlayRenderer::load_font)
    }

    /// Start a session: spawn the worker and open the frame source.
    ///
    /// The repetition counter is reset for the new session. Fatal setup
    /// errors (device open, stream configure) abort the start and are
    /// returned to the caller without retry.
    ///
    /// # Errors
    ///
    /// [`PipelineError::ConfigError`] if a session is already running;
    /// [`PipelineError::CameraError`] from the frame source.
    pub fn start(
        &mut self,
        source: Box<dyn FrameSource>,
        render: Box<dyn RenderSink>,
    ) -> Result<()> {
        if self.state != PipelineState::Idle {
            return Err(PipelineError::ConfigError(
                "session already started".to_string(),
            ));
        }
        if let Ok(mut counter) = self.counter.lock() {
            counter.reset();
        }

        let renderer = self.renderer.take().unwrap_or_default();
        self.source = Some(source);
        self.spawn_session(WorkerState { renderer, render })?;
        self.state = PipelineState::Running;
        Ok(())
    }

    /// Suspend the session: stop the frame source, drain and join the worker.
    /// The estimator and the rep count are kept for [`resume`](Self::resume).
    ///
    /// # Errors
    ///
    /// [`PipelineError::ConfigError`] if no session is running.
    pub fn pause(&mut self) -> Result<()> {
        if self.state != PipelineState::Running {
            return Err(PipelineError::ConfigError("session not running".to_string()));
        }
        if let Some(source) = self.source.as_mut() {
            source.stop();
        }
        self.join_worker();
        self.state = PipelineState::Paused;
        Ok(())
    }

    /// Resume a paused session, re-reading the configured display color.
    ///
    /// # Errors
    ///
    /// [`PipelineError::ConfigError`] if the session is not paused;
    /// [`PipelineError::CameraError`] if the frame source fails to reopen.
    pub fn resume(&mut self) -> Result<()> {
        if self.state != PipelineState::Paused {
            return Err(PipelineError::ConfigError("session not paused".to_string()));
        }
        let renderer = self.renderer.take().unwrap_or_default();
        let render = self.render.take().ok_or_else(|| {
            PipelineError::RenderError("render sink lost; cannot resume".to_string())
        })?;
        self.spawn_session(WorkerState { renderer, render })?;
        self.state = PipelineState::Running;
        Ok(())
    }

    /// End the session and release all resources.
    ///
    /// Teardown order: frame source first (no new frames), then the worker
    /// (drains the in-flight unit; an in-progress estimator call is waited
    /// out, never cancelled), then the estimator. Release errors are logged
    /// and never propagated.
    pub fn stop(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.stop();
        }
        self.join_worker();
        if let Ok(mut core) = self.core.lock() {
            if let Some(mut estimator) = core.estimator.take() {
                estimator.close();
            }
        }
        self.render = None;
        self.state = PipelineState::Idle;
    }

    /// Reset the repetition count to zero and emit a count event with 0.
    /// Idempotent.
    pub fn reset_count(&self) {
        if let Ok(mut counter) = self.counter.lock() {
            counter.reset();
        }
        self.listener.on_rep_count(0);
    }

    /// Spawn the worker and open the frame source into a fresh delivery slot.
    fn spawn_session(&mut self, state: WorkerState) -> Result<()> {
        let (sink, frames) = FrameSink::pair();
        let (shutdown_tx, shutdown_rx) = bounded(1);

        let ctx = WorkerCtx {
            core: Arc::clone(&self.core),
            counter: Arc::clone(&self.counter),
            listener: Arc::clone(&self.listener),
            frames,
            shutdown: shutdown_rx,
            exercise: self.config.exercise,
            good_color: self.config.good_color,
            state,
        };
        let handle = std::thread::Builder::new()
            .name("posefit-worker".to_string())
            .spawn(move || run_worker(ctx))?;
        self.worker = Some(Worker { shutdown_tx, handle });

        let Some(source) = self.source.as_mut() else {
            self.join_worker();
            return Err(PipelineError::ConfigError(
                "no frame source installed".to_string(),
            ));
        };
        if let Err(e) = source.start(sink) {
            // Fatal setup error: unwind the worker before surfacing it.
            self.join_worker();
            return Err(e);
        }
        Ok(())
    }

    /// Signal the worker, wait for the in-flight unit to drain, and reclaim
    /// the renderer and render sink for a later resume.
    fn join_worker(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.shutdown_tx.send(());
            match worker.handle.join() {
                Ok(state) => {
                    self.renderer = Some(state.renderer);
                    self.render = Some(state.render);
                }
                Err(_) => verbose!("worker thread panicked during shutdown"),
            }
        }
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.stop();
    }
}

struct WorkerCtx {
    core: Arc<Mutex<ProcessingCore>>,
    counter: Arc<Mutex<RepCounter>>,
    listener: Arc<dyn PipelineListener>,
    frames: Receiver<RawFrame>,
    shutdown: Receiver<()>,
    exercise: Exercise,
    good_color: Color,
    state: WorkerState,
}

/// Worker loop: one processing unit per delivered frame, an FPS event per
/// ticker window. Runs until shutdown is signalled or all frame senders hang
/// up.
fn run_worker(ctx: WorkerCtx) -> WorkerState {
    let WorkerCtx { core, counter, listener, frames, shutdown, exercise, good_color, mut state } =
        ctx;
    let ticker = tick(FPS_WINDOW);
    let mut frames_in_window: u32 = 0;

    loop {
        select! {
            recv(shutdown) -> _ => break,
            recv(frames) -> msg => {
                let Ok(frame) = msg else { break };
                process_frame(ProcessArgs {
                    core: &core,
                    counter: &counter,
                    listener: listener.as_ref(),
                    renderer: &mut state.renderer,
                    render: state.render.as_mut(),
                    frame: &frame,
                    exercise,
                    good_color,
                    frames_in_window: &mut frames_in_window,
                });
            }
            recv(ticker) -> _ => {
                listener.on_frame_rate(frames_in_window);
                frames_in_window = 0;
            }
        }
    }
    state
}

struct ProcessArgs<'a> {
    core: &'a Mutex<ProcessingCore>,
    counter: &'a Mutex<RepCounter>,
    listener: &'a dyn PipelineListener,
    renderer: &'a mut OverlayRenderer,
    render: &'a mut dyn RenderSink,
    frame: &'a RawFrame,
    exercise: Exercise,
    good_color: Color,
    frames_in_window: &'a mut u32,
}

/// The per-frame processing unit. Holds the processing-unit lock for its
/// whole duration and runs to completion before the next frame is accepted.
fn process_frame(args: ProcessArgs<'_>) {
    let Ok(mut core) = args.core.lock() else {
        return;
    };
    let ProcessingCore { normalizer, estimator } = &mut *core;

    // Transient frame errors skip the frame and keep the stream alive.
    let bitmap = match normalizer.normalize(args.frame) {
        Ok(bitmap) => bitmap,
        Err(e) => {
            verbose!("skipping frame: {e}");
            return;
        }
    };
    let skeletons = match estimator.as_mut() {
        Some(est) => match est.estimate(bitmap) {
            Ok(skeletons) => skeletons,
            Err(e) => {
                verbose!("skipping frame: {e}");
                return;
            }
        },
        None => Vec::new(),
    };

    // FPS accounting includes frames with zero detections.
    *args.frames_in_window += 1;

    // One verdict per skeleton per frame, reused for counting and colors.
    let verdicts: Vec<Verdict> =
        skeletons.iter().map(|s| classify(s, args.exercise)).collect();

    if let Some(primary) = skeletons.first() {
        args.listener.on_person_detected(primary, &skeletons, bitmap);
        let verdict = verdicts[0];
        args.listener.on_posture_feedback(verdict.feedback);

        let update = args
            .counter
            .lock()
            .ok()
            .and_then(|mut counter| counter.update(verdict.good, Instant::now()));
        if let Some(count) = update {
            args.listener.on_rep_count(count);
        }
    }

    let count = args.counter.lock().map_or(0, |c| c.count());
    let persons: Vec<PersonOverlay<'_>> = skeletons
        .iter()
        .zip(&verdicts)
        .map(|(skeleton, verdict)| PersonOverlay {
            skeleton,
            color: if verdict.good { args.good_color } else { Color::RED },
            label: verdict.feedback,
        })
        .collect();

    match args.renderer.compose(bitmap, &persons, count, args.render.viewport()) {
        Ok(composed) => args.render.present(composed),
        Err(e) => verbose!("render failed: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    struct CountingListener {
        counts: StdMutex<Vec<u32>>,
    }

    impl CountingListener {
        fn new() -> Self {
            Self { counts: StdMutex::new(Vec::new()) }
        }
    }

    impl PipelineListener for CountingListener {
        fn on_rep_count(&self, count: u32) {
            self.counts.lock().unwrap().push(count);
        }
    }

    struct NullSource;

    impl FrameSource for NullSource {
        fn start(&mut self, _sink: FrameSink) -> Result<()> {
            Ok(())
        }
        fn stop(&mut self) {}
    }

    struct NullSink;

    impl RenderSink for NullSink {
        fn viewport(&self) -> (u32, u32) {
            (64, 48)
        }
        fn present(&mut self, _frame: &RgbImage) {}
    }

    struct FailingSource;

    impl FrameSource for FailingSource {
        fn start(&mut self, _sink: FrameSink) -> Result<()> {
            Err(PipelineError::CameraError("no device".to_string()))
        }
        fn stop(&mut self) {}
    }

    fn pipeline_with(listener: Arc<CountingListener>) -> Pipeline {
        let config = SessionConfig::new().with_exercise(Exercise::Squat);
        Pipeline::new(config, listener)
    }

    #[test]
    fn test_configure_rejected_while_running() {
        let mut pipeline = pipeline_with(Arc::new(CountingListener::new()));
        pipeline.start(Box::new(NullSource), Box::new(NullSink)).unwrap();
        assert_eq!(pipeline.state(), PipelineState::Running);
        assert!(pipeline.configure(Exercise::Plank).is_err());
        pipeline.stop();
        assert!(pipeline.configure(Exercise::Plank).is_ok());
    }

    #[test]
    fn test_lifecycle_pause_resume_stop() {
        let mut pipeline = pipeline_with(Arc::new(CountingListener::new()));
        assert!(pipeline.pause().is_err());

        pipeline.start(Box::new(NullSource), Box::new(NullSink)).unwrap();
        pipeline.pause().unwrap();
        assert_eq!(pipeline.state(), PipelineState::Paused);
        assert!(pipeline.resume().is_ok());
        assert_eq!(pipeline.state(), PipelineState::Running);
        pipeline.stop();
        assert_eq!(pipeline.state(), PipelineState::Idle);
    }

    #[test]
    fn test_fatal_source_error_aborts_start() {
        let mut pipeline = pipeline_with(Arc::new(CountingListener::new()));
        let err = pipeline
            .start(Box::new(FailingSource), Box::new(NullSink))
            .unwrap_err();
        assert!(matches!(err, PipelineError::CameraError(_)));
        assert_eq!(pipeline.state(), PipelineState::Idle);
        // A failed start leaves the pipeline restartable.
        assert!(pipeline.start(Box::new(NullSource), Box::new(NullSink)).is_ok());
        pipeline.stop();
    }

    #[test]
    fn test_reset_count_emits_zero_and_is_idempotent() {
        let listener = Arc::new(CountingListener::new());
        let pipeline = pipeline_with(Arc::clone(&listener));

        pipeline.reset_count();
        pipeline.reset_count();
        assert_eq!(*listener.counts.lock().unwrap(), vec![0, 0]);
        assert_eq!(pipeline.rep_count(), 0);
    }
}
