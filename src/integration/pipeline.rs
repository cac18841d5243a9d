//! PipelineController: the frame-by-frame loop around the presence tracker.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use chrono::Local;
use tracing::{debug, error, info, warn};

use crate::config::PipelineConfig;
use crate::error::{BoxError, ModelStoreError, PipelineError};
use crate::integration::{
    CachedModelStore, Detection, DetectionSummary, Detector, EventSink, FrameSource, ModelStore,
    NoPersistence, Overlay, PersistPacer, PersistRequest, Persistence, RemoteStore, RenderRequest,
    Renderer, build_overlays,
};
use crate::tracker::{PresenceEvent, PresenceTracker};

/// Cooperative stop flag, sampled once per iteration.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every holder of this token to stop at its next check.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether [`cancel`](Self::cancel) was called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Lifecycle of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Running,
    /// End of stream reached; no more detector calls.
    Draining,
    Stopped,
    Failed,
}

/// What one processed frame produced.
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub frame_index: u64,
    pub events: Vec<PresenceEvent>,
    pub detections: Vec<Detection>,
    pub overlays: Vec<Overlay>,
    /// A snapshot was handed to persistence and accepted.
    pub persisted: bool,
    /// Processing rate of this iteration, in frames per second.
    pub fps: f64,
}

#[derive(Debug, Clone)]
pub enum StepOutcome {
    Processed(FrameReport),
    /// The detector failed on this frame; the tracker was not advanced.
    Skipped { consecutive_failures: u32 },
    /// No frame was read: the stream ended or the pipeline is no longer running.
    EndOfStream,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub state: PipelineState,
    pub cancelled: bool,
    pub frames_processed: u64,
    pub frames_skipped: u64,
    pub alerts: u64,
    pub forgotten: u64,
}

/// Assembles a [`PipelineController`] from its collaborators.
pub struct PipelineBuilder<S, R, P> {
    config: PipelineConfig,
    source: S,
    renderer: R,
    persistence: P,
    event_sink: Option<Box<dyn EventSink>>,
}

impl<S: FrameSource, R: Renderer> PipelineBuilder<S, R, NoPersistence> {
    /// Start a builder with no persistence and no event sink.
    pub fn new(config: PipelineConfig, source: S, renderer: R) -> Self {
        Self {
            config,
            source,
            renderer,
            persistence: NoPersistence,
            event_sink: None,
        }
    }
}

impl<S: FrameSource, R: Renderer, P: Persistence> PipelineBuilder<S, R, P> {
    /// Replace the persistence backend.
    pub fn persistence<P2: Persistence>(self, persistence: P2) -> PipelineBuilder<S, R, P2> {
        PipelineBuilder {
            config: self.config,
            source: self.source,
            renderer: self.renderer,
            persistence,
            event_sink: self.event_sink,
        }
    }

    /// Record every presence event to `sink`.
    pub fn event_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.event_sink = Some(Box::new(sink));
        self
    }

    /// Build around a detector that is already loaded.
    ///
    /// A failure budget of zero is raised to one: the first detector error
    /// is then fatal.
    pub fn build<D: Detector>(mut self, detector: D) -> PipelineController<S, D, R, P> {
        if self.config.max_consecutive_detector_failures == 0 {
            warn!("max_consecutive_detector_failures is 0, using 1");
            self.config.max_consecutive_detector_failures = 1;
        }
        let tracker = PresenceTracker::new(self.config.presence.clone());
        let pacer = PersistPacer::new(self.config.persist_interval());
        PipelineController {
            source: self.source,
            detector,
            renderer: self.renderer,
            persistence: self.persistence,
            event_sink: self.event_sink,
            tracker,
            config: self.config,
            pacer,
            state: PipelineState::Running,
            consecutive_failures: 0,
            released: false,
            summary: Counters::default(),
        }
    }

    /// Resolve the model weights through `store`, load the detector from the
    /// local path and build. Fails before any frame is read when the model is
    /// unavailable or cannot be loaded; the source and renderer are released.
    pub fn build_with_model<D, M, F, E>(
        mut self,
        store: &M,
        remote_path: &str,
        load: F,
    ) -> Result<PipelineController<S, D, R, P>, PipelineError>
    where
        D: Detector,
        M: ModelStore + ?Sized,
        F: FnOnce(&Path) -> Result<D, E>,
        E: Into<BoxError>,
    {
        let loaded = store
            .ensure_local(remote_path)
            .map_err(PipelineError::from)
            .and_then(|path| {
                load(&path).map_err(|e| PipelineError::DetectorLoad {
                    path: path.clone(),
                    source: e.into(),
                })
            });

        match loaded {
            Ok(detector) => Ok(self.build(detector)),
            Err(e) => {
                error!(remote = remote_path, error = %e, "Detection cannot be performed");
                self.release();
                Err(e)
            }
        }
    }

    /// Like [`build_with_model`](Self::build_with_model), with the remote
    /// path and cache directory taken from the config's `model` section.
    /// Fails with [`ModelStoreError::NotConfigured`] when that section is
    /// missing.
    pub fn build_from_config<D, RS, F, E>(
        mut self,
        remote: RS,
        load: F,
    ) -> Result<PipelineController<S, D, R, P>, PipelineError>
    where
        D: Detector,
        RS: RemoteStore,
        F: FnOnce(&Path) -> Result<D, E>,
        E: Into<BoxError>,
    {
        let Some(model) = self.config.model.clone() else {
            let e = PipelineError::from(ModelStoreError::NotConfigured);
            error!(error = %e, "Detection cannot be performed");
            self.release();
            return Err(e);
        };
        let store = CachedModelStore::new(remote, model.models_dir);
        self.build_with_model(&store, &model.remote_path, load)
    }

    fn release(&mut self) {
        self.source.release();
        self.renderer.release();
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Counters {
    frames_processed: u64,
    frames_skipped: u64,
    alerts: u64,
    forgotten: u64,
}

/// Drives frames through detection, presence tracking, rendering and
/// persistence, strictly in that order and one frame at a time.
///
/// Each controller owns its own [`PresenceTracker`], so independent cameras
/// run independent controllers.
pub struct PipelineController<S: FrameSource, D: Detector, R: Renderer, P: Persistence> {
    source: S,
    detector: D,
    renderer: R,
    persistence: P,
    event_sink: Option<Box<dyn EventSink>>,
    tracker: PresenceTracker,
    config: PipelineConfig,
    pacer: PersistPacer,
    state: PipelineState,
    consecutive_failures: u32,
    released: bool,
    summary: Counters,
}

impl<S: FrameSource, D: Detector, R: Renderer, P: Persistence> PipelineController<S, D, R, P> {
    /// Run until end of stream, cancellation or a fatal error. The frame
    /// source and renderer are released on every exit.
    pub fn run(&mut self, cancel: &CancelToken) -> Result<RunSummary, PipelineError> {
        info!("Pipeline started");
        let mut cancelled = false;

        let result = loop {
            if self.state != PipelineState::Running {
                break Ok(());
            }
            if cancel.is_cancelled() {
                cancelled = true;
                break Ok(());
            }
            match self.step() {
                Ok(_) => {}
                Err(e) => break Err(e),
            }
        };

        if result.is_ok() && self.state != PipelineState::Failed {
            self.state = PipelineState::Stopped;
        }
        self.release();

        let summary = self.summary(cancelled);
        info!(
            state = ?summary.state,
            frames = summary.frames_processed,
            skipped = summary.frames_skipped,
            alerts = summary.alerts,
            "Pipeline done"
        );
        result.map(|()| summary)
    }

    /// Run exactly one iteration.
    pub fn step(&mut self) -> Result<StepOutcome, PipelineError> {
        if self.state != PipelineState::Running {
            return Ok(StepOutcome::EndOfStream);
        }
        let loop_time = Instant::now();

        let frame = match self.source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                debug!("End of stream");
                self.state = PipelineState::Draining;
                return Ok(StepOutcome::EndOfStream);
            }
            Err(e) => {
                warn!(error = %e, "Frame read failed, treating as end of stream");
                self.state = PipelineState::Draining;
                return Ok(StepOutcome::EndOfStream);
            }
        };

        let raw = match self.detector.infer(&frame) {
            Ok(raw) => {
                self.consecutive_failures = 0;
                raw
            }
            Err(e) => {
                self.consecutive_failures += 1;
                if self.consecutive_failures >= self.config.max_consecutive_detector_failures {
                    error!(
                        consecutive = self.consecutive_failures,
                        error = %e,
                        "Detector keeps failing, giving up"
                    );
                    self.state = PipelineState::Failed;
                    return Err(PipelineError::DetectorFailure {
                        consecutive: self.consecutive_failures,
                        source: Box::new(e),
                    });
                }
                warn!(
                    consecutive = self.consecutive_failures,
                    error = %e,
                    "Detector failed, skipping frame"
                );
                self.summary.frames_skipped += 1;
                return Ok(StepOutcome::Skipped {
                    consecutive_failures: self.consecutive_failures,
                });
            }
        };

        let detections: Vec<Detection> = raw
            .into_iter()
            .map(|r| Detection::classify(r, &self.config.monitored_classes))
            .collect();
        let present = detections.iter().filter_map(|d| match d {
            Detection::Tracked {
                track_id, class_id, ..
            } => Some((*track_id, *class_id)),
            Detection::PassThrough { .. } => None,
        });

        let frame_index = self.tracker.next_frame_index();
        let events = match self.tracker.update(frame_index, present) {
            Ok(events) => events,
            Err(e) => {
                self.state = PipelineState::Failed;
                return Err(e.into());
            }
        };
        self.summary.frames_processed += 1;
        self.report_events(&events);

        let overlays = build_overlays(&detections, &self.tracker, &self.config.class_names);
        if let Err(e) = self.renderer.render(RenderRequest {
            frame: &frame,
            overlays: &overlays,
        }) {
            warn!(frame_index, error = %e, "Render failed");
        }

        let mut persisted = false;
        let now = Instant::now();
        if self.pacer.is_due(detections.len(), now) {
            let request = PersistRequest {
                frame: &frame,
                detection_summary: detections.iter().map(DetectionSummary::from).collect(),
                timestamp: Local::now(),
                frame_index,
            };
            match self.persistence.persist(request) {
                Ok(()) => persisted = true,
                Err(e) => warn!(frame_index, error = %e, "Persist failed"),
            }
            self.pacer.mark_persisted(now);
        }

        let fps = 1.0 / loop_time.elapsed().as_secs_f64().max(f64::EPSILON);
        debug!(
            frame_index,
            detections = detections.len(),
            tracked = self.tracker.len(),
            fps,
            "Processed frame"
        );

        Ok(StepOutcome::Processed(FrameReport {
            frame_index,
            events,
            detections,
            overlays,
            persisted,
            fps,
        }))
    }

    fn report_events(&mut self, events: &[PresenceEvent]) {
        for event in events {
            match event {
                PresenceEvent::Alert(alert) => {
                    self.summary.alerts += 1;
                    warn!(
                        track_id = alert.track_id,
                        frames = alert.frames_present,
                        frame_index = alert.frame_index,
                        "Suspicious presence: entity stayed past the presence threshold"
                    );
                }
                PresenceEvent::Forgotten(forgotten) => {
                    self.summary.forgotten += 1;
                    info!(
                        track_id = forgotten.track_id,
                        absent = forgotten.frames_absent,
                        frame_index = forgotten.frame_index,
                        "Entity forgotten"
                    );
                }
            }
        }

        if let Some(sink) = self.event_sink.as_mut() {
            if let Err(e) = sink.record(events) {
                warn!(error = %e, "Event log write failed");
            }
        }
    }

    fn release(&mut self) {
        if !self.released {
            self.source.release();
            self.renderer.release();
            self.released = true;
        }
    }

    fn summary(&self, cancelled: bool) -> RunSummary {
        RunSummary {
            state: self.state,
            cancelled,
            frames_processed: self.summary.frames_processed,
            frames_skipped: self.summary.frames_skipped,
            alerts: self.summary.alerts,
            forgotten: self.summary.forgotten,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// The session this pipeline feeds.
    pub fn tracker(&self) -> &PresenceTracker {
        &self.tracker
    }

    /// Effective configuration, after the failure budget was clamped.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Get a reference to the underlying detector.
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Get a mutable reference to the underlying detector.
    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }
}

impl<S, D, R, P> Drop for PipelineController<S, D, R, P>
where
    S: FrameSource,
    D: Detector,
    R: Renderer,
    P: Persistence,
{
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::rc::Rc;
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::integration::{Frame, IterFrameSource, RawDetection, RawDetectionBuilder};

    #[derive(Debug, Clone)]
    struct MockError;

    impl std::fmt::Display for MockError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "mock detector failure")
        }
    }

    impl std::error::Error for MockError {}

    struct ScriptedDetector {
        script: VecDeque<Result<Vec<RawDetection>, MockError>>,
    }

    impl Detector for ScriptedDetector {
        type Error = MockError;

        fn infer(&mut self, _frame: &Frame) -> Result<Vec<RawDetection>, Self::Error> {
            self.script.pop_front().unwrap_or_else(|| Ok(vec![]))
        }
    }

    #[derive(Default, Clone)]
    struct RecordingRenderer {
        labels: Rc<RefCell<Vec<Vec<String>>>>,
        releases: Rc<RefCell<u32>>,
        fail: bool,
    }

    impl Renderer for RecordingRenderer {
        fn render(&mut self, request: RenderRequest<'_>) -> Result<(), BoxError> {
            self.labels
                .borrow_mut()
                .push(request.overlays.iter().map(|o| o.label.clone()).collect());
            if self.fail {
                Err("window closed".into())
            } else {
                Ok(())
            }
        }

        fn release(&mut self) {
            *self.releases.borrow_mut() += 1;
        }
    }

    #[derive(Default, Clone)]
    struct RecordingPersistence {
        frames: Rc<RefCell<Vec<u64>>>,
    }

    impl Persistence for RecordingPersistence {
        fn persist(&mut self, request: PersistRequest<'_>) -> Result<(), BoxError> {
            self.frames.borrow_mut().push(request.frame_index);
            Ok(())
        }
    }

    /// Rejects every snapshot and counts the attempts.
    #[derive(Default, Clone)]
    struct FailingPersistence {
        attempts: Rc<Cell<u32>>,
    }

    impl Persistence for FailingPersistence {
        fn persist(&mut self, _request: PersistRequest<'_>) -> Result<(), BoxError> {
            self.attempts.set(self.attempts.get() + 1);
            Err("disk full".into())
        }
    }

    #[derive(Default, Clone)]
    struct FailingSink {
        calls: Rc<Cell<u32>>,
    }

    impl EventSink for FailingSink {
        fn record(&mut self, _events: &[PresenceEvent]) -> Result<(), BoxError> {
            self.calls.set(self.calls.get() + 1);
            Err("log volume unmounted".into())
        }
    }

    /// Yields `frames` blank frames, then errors on every later read.
    struct UnpluggedSource {
        frames: usize,
        reads: usize,
    }

    impl FrameSource for UnpluggedSource {
        type Error = std::io::Error;

        fn next_frame(&mut self) -> Result<Option<Frame>, Self::Error> {
            self.reads += 1;
            if self.reads > self.frames {
                return Err(std::io::Error::other("camera unplugged"));
            }
            Ok(Some(Frame::blank(4, 4, 3)))
        }
    }

    fn person(track_id: u64) -> RawDetection {
        RawDetectionBuilder::new()
            .tlbr(0.0, 0.0, 10.0, 20.0)
            .class(0)
            .track_id(track_id)
            .confidence(0.9)
            .build()
    }

    fn car() -> RawDetection {
        RawDetectionBuilder::new()
            .class(2)
            .track_id(99)
            .confidence(0.75)
            .build()
    }

    fn frames(n: usize) -> IterFrameSource<std::vec::IntoIter<Frame>> {
        IterFrameSource::new(vec![Frame::blank(4, 4, 3); n])
    }

    fn config(forget: u64, alert: u64) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.presence.absence_forget_threshold = forget;
        config.presence.presence_alert_threshold = alert;
        config.persist_interval_ms = 0;
        config.max_consecutive_detector_failures = 3;
        config
    }

    fn detector(script: Vec<Result<Vec<RawDetection>, MockError>>) -> ScriptedDetector {
        ScriptedDetector {
            script: script.into(),
        }
    }

    #[test]
    fn test_labels_follow_tracker_state() {
        let renderer = RecordingRenderer::default();
        let mut pipeline = PipelineBuilder::new(config(5, 1), frames(2), renderer.clone())
            .build(detector(vec![Ok(vec![person(1), car()]), Ok(vec![person(1)])]));

        pipeline.run(&CancelToken::new()).unwrap();

        let labels = renderer.labels.borrow();
        assert_eq!(labels[0], vec!["1: 1f".to_string(), "car: 0.75".to_string()]);
        assert_eq!(labels[1], vec!["1: 2f (suspect)".to_string()]);
        assert!(pipeline.tracker().entity(99).is_none());
    }

    #[test]
    fn test_detector_failure_skips_frame_without_advancing() {
        let script = vec![Ok(vec![person(1)]), Err(MockError), Ok(vec![person(1)])];
        let mut pipeline =
            PipelineBuilder::new(config(5, 10), frames(3), RecordingRenderer::default())
                .build(detector(script));

        assert!(matches!(
            pipeline.step().unwrap(),
            StepOutcome::Processed(r) if r.frame_index == 1
        ));
        assert!(matches!(
            pipeline.step().unwrap(),
            StepOutcome::Skipped {
                consecutive_failures: 1
            }
        ));
        assert!(matches!(
            pipeline.step().unwrap(),
            StepOutcome::Processed(r) if r.frame_index == 2
        ));

        let entity = pipeline.tracker().entity(1).unwrap();
        assert_eq!(entity.total_present_frames, 2);
        assert_eq!(entity.consecutive_absent_frames, 0);
    }

    #[test]
    fn test_repeated_detector_failures_escalate() {
        let renderer = RecordingRenderer::default();
        let script = vec![Ok(vec![]), Err(MockError), Err(MockError), Err(MockError)];
        let mut pipeline = PipelineBuilder::new(config(5, 10), frames(10), renderer.clone())
            .build(detector(script));

        let err = pipeline.run(&CancelToken::new()).unwrap_err();
        assert!(matches!(err, PipelineError::DetectorFailure { consecutive: 3, .. }));
        assert_eq!(pipeline.state(), PipelineState::Failed);
        assert_eq!(*renderer.releases.borrow(), 1);

        // No more frames are pulled after failing
        assert!(matches!(pipeline.step().unwrap(), StepOutcome::EndOfStream));
    }

    #[test]
    fn test_cancellation_is_checked_between_frames() {
        let renderer = RecordingRenderer::default();
        let cancel = CancelToken::new();
        let mut pipeline = PipelineBuilder::new(config(5, 10), frames(10), renderer.clone())
            .build(detector(vec![]));

        pipeline.step().unwrap();
        cancel.cancel();
        let summary = pipeline.run(&cancel).unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.state, PipelineState::Stopped);
        assert_eq!(summary.frames_processed, 1);
        assert_eq!(*renderer.releases.borrow(), 1);

        drop(pipeline);
        assert_eq!(*renderer.releases.borrow(), 1);
    }

    #[test]
    fn test_render_failure_is_not_fatal() {
        let renderer = RecordingRenderer {
            fail: true,
            ..Default::default()
        };
        let mut pipeline = PipelineBuilder::new(config(5, 10), frames(3), renderer.clone())
            .build(detector(vec![Ok(vec![person(1)]); 3]));

        let summary = pipeline.run(&CancelToken::new()).unwrap();
        assert_eq!(summary.frames_processed, 3);
        assert_eq!(pipeline.tracker().entity(1).unwrap().total_present_frames, 3);
    }

    #[test]
    fn test_persists_only_frames_with_detections() {
        let persistence = RecordingPersistence::default();
        let script = vec![Ok(vec![car()]), Ok(vec![]), Ok(vec![person(4)])];
        let mut pipeline =
            PipelineBuilder::new(config(5, 10), frames(3), RecordingRenderer::default())
                .persistence(persistence.clone())
                .build(detector(script));

        pipeline.run(&CancelToken::new()).unwrap();
        assert_eq!(*persistence.frames.borrow(), vec![1, 3]);
    }

    #[test]
    fn test_persist_interval_throttles_snapshots() {
        let persistence = RecordingPersistence::default();
        let mut config = config(5, 10);
        config.persist_interval_ms = 60_000;
        let mut pipeline = PipelineBuilder::new(config, frames(3), RecordingRenderer::default())
            .persistence(persistence.clone())
            .build(detector(vec![Ok(vec![car()]); 3]));

        pipeline.run(&CancelToken::new()).unwrap();
        assert!(persistence.frames.borrow().is_empty());
    }

    #[test]
    fn test_zero_failure_budget_is_clamped_to_one() {
        let mut config = config(5, 10);
        config.max_consecutive_detector_failures = 0;
        let mut pipeline = PipelineBuilder::new(config, frames(3), RecordingRenderer::default())
            .build(detector(vec![Err(MockError), Ok(vec![person(1)])]));

        assert_eq!(pipeline.config().max_consecutive_detector_failures, 1);
        assert!(matches!(
            pipeline.step(),
            Err(PipelineError::DetectorFailure { consecutive: 1, .. })
        ));
        assert_eq!(pipeline.state(), PipelineState::Failed);
    }

    #[test]
    fn test_source_error_ends_stream() {
        let renderer = RecordingRenderer::default();
        let source = UnpluggedSource {
            frames: 2,
            reads: 0,
        };
        let mut pipeline = PipelineBuilder::new(config(5, 10), source, renderer.clone())
            .build(detector(vec![Ok(vec![person(1)]); 5]));

        let summary = pipeline.run(&CancelToken::new()).unwrap();
        assert_eq!(summary.state, PipelineState::Stopped);
        assert!(!summary.cancelled);
        assert_eq!(summary.frames_processed, 2);
        assert_eq!(pipeline.tracker().entity(1).unwrap().total_present_frames, 2);
        assert_eq!(*renderer.releases.borrow(), 1);
    }

    #[test]
    fn test_persist_failure_is_not_fatal() {
        let persistence = FailingPersistence::default();
        let mut pipeline =
            PipelineBuilder::new(config(5, 10), frames(3), RecordingRenderer::default())
                .persistence(persistence.clone())
                .build(detector(vec![Ok(vec![person(1)]); 3]));

        for _ in 0..3 {
            match pipeline.step().unwrap() {
                StepOutcome::Processed(report) => assert!(!report.persisted),
                other => panic!("unexpected outcome {other:?}"),
            }
        }
        assert_eq!(persistence.attempts.get(), 3);
        let entity = pipeline.tracker().entity(1).unwrap();
        assert_eq!(entity.total_present_frames, 3);
        assert_eq!(entity.consecutive_absent_frames, 0);
    }

    #[test]
    fn test_failed_persist_still_uses_up_interval() {
        let persistence = FailingPersistence::default();
        let mut config = config(5, 10);
        config.persist_interval_ms = 200;
        let mut pipeline = PipelineBuilder::new(config, frames(4), RecordingRenderer::default())
            .persistence(persistence.clone())
            .build(detector(vec![Ok(vec![person(1)]); 4]));

        thread::sleep(Duration::from_millis(250));
        let summary = pipeline.run(&CancelToken::new()).unwrap();

        assert_eq!(summary.frames_processed, 4);
        assert_eq!(persistence.attempts.get(), 1);
        assert_eq!(pipeline.tracker().entity(1).unwrap().total_present_frames, 4);
    }

    #[test]
    fn test_event_sink_failure_is_not_fatal() {
        let sink = FailingSink::default();
        let mut script = vec![Ok(vec![person(1)]); 2];
        script.extend(vec![Ok(vec![]); 2]);
        let mut pipeline =
            PipelineBuilder::new(config(0, 1), frames(4), RecordingRenderer::default())
                .event_sink(sink.clone())
                .build(detector(script));

        let summary = pipeline.run(&CancelToken::new()).unwrap();
        assert_eq!(summary.state, PipelineState::Stopped);
        assert_eq!(summary.frames_processed, 4);
        assert_eq!(summary.alerts, 1);
        assert_eq!(summary.forgotten, 1);
        assert!(sink.calls.get() >= 2);
    }
}
