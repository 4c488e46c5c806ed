use super::{FrameReport, PipelineError, PipelineParams, RunSummary, StopReason, StrikeEvent};
use crate::capture::{gray_from_rgb, FrameSource};
use crate::debug::DebugArtifact;
use crate::events::EventSink;
use crate::session::{control_channel, ControlCommand, SessionHandle};
use crossbeam_channel::{Receiver, TryRecvError};
use dartcam_board::{BoardGeometry, ZoneClassifier};
use dartcam_core::GrayImage;
use dartcam_detect::{
    BlobClusterer, FiducialTracker, MotionAnalyzer, MotionEvent, StrikeRegistry, TipEstimator,
};
use image::RgbImage;
use log::{debug, info, warn};
use nalgebra::Point2;
use std::path::PathBuf;
use std::time::Instant;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// One detection session: background model, known strikes and the current
/// board registration.
pub struct DetectionPipeline {
    params: PipelineParams,
    motion: MotionAnalyzer,
    clusterer: BlobClusterer,
    tip: Box<dyn TipEstimator + Send>,
    registry: StrikeRegistry,
    fiducials: FiducialTracker,
    classifier: ZoneClassifier,
    control: Option<Receiver<ControlCommand>>,
    debug_artifact: Option<DebugArtifact>,
    frame: u64,
    stopped: bool,
}

impl DetectionPipeline {
    pub fn new(params: PipelineParams, geometry: BoardGeometry) -> Result<Self, PipelineError> {
        let motion = MotionAnalyzer::new(params.motion.clone())?;
        let fiducials = FiducialTracker::new(params.fiducial.clone())?;
        Ok(Self {
            motion,
            clusterer: BlobClusterer::new(params.cluster.clone()),
            tip: params.tip.build(),
            registry: StrikeRegistry::new(params.registry.clone()),
            fiducials,
            classifier: ZoneClassifier::new(geometry),
            control: None,
            debug_artifact: None,
            frame: 0,
            stopped: false,
            params,
        })
    }

    /// Replace the fiducial tracker, e.g. with one holding a known transform.
    pub fn with_fiducials(mut self, tracker: FiducialTracker) -> Self {
        self.fiducials = tracker;
        self
    }

    pub fn with_debug_artifact(mut self, path: impl Into<PathBuf>) -> Self {
        self.debug_artifact = Some(DebugArtifact::new(path));
        self
    }

    /// Take commands from `rx` between frames.
    pub fn attach_control(&mut self, rx: Receiver<ControlCommand>) {
        self.control = Some(rx);
    }

    /// Open a control queue of `capacity` commands and return its handle.
    pub fn session(&mut self, capacity: usize) -> SessionHandle {
        let (handle, rx) = control_channel(capacity);
        self.attach_control(rx);
        handle
    }

    pub fn params(&self) -> &PipelineParams {
        &self.params
    }

    pub fn registry(&self) -> &StrikeRegistry {
        &self.registry
    }

    pub fn fiducials(&self) -> &FiducialTracker {
        &self.fiducials
    }

    pub fn classifier(&self) -> &ZoneClassifier {
        &self.classifier
    }

    pub fn frames_processed(&self) -> u64 {
        self.frame
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Forget known strikes and the background. The fiducial transform is
    /// kept.
    pub fn reset(&mut self) {
        self.registry.reset();
        self.motion.reset_background();
        info!("session reset");
    }

    fn apply(&mut self, cmd: ControlCommand) {
        debug!("control: {cmd:?}");
        match cmd {
            ControlCommand::SetMotionThreshold(t) => {
                self.motion.set_motion_threshold(t);
                self.params.motion.motion_threshold = t;
            }
            ControlCommand::SetStillTime(d) => {
                self.motion.set_still_time(d.as_secs_f64());
                self.params.motion.still_time_secs = d.as_secs_f64();
            }
            ControlCommand::SetMinBlobArea(a) => {
                self.clusterer.set_min_blob_area(a);
                self.params.cluster.min_blob_area = a;
            }
            ControlCommand::SetMinSeparation(d) => {
                self.registry.set_min_separation(d);
                self.params.registry.min_separation = d;
            }
            ControlCommand::SetFiducialDebounce(d) => {
                self.fiducials.set_debounce(d.as_secs_f64());
                self.params.fiducial.debounce_secs = d.as_secs_f64();
            }
            ControlCommand::ResetBackground => self.motion.reset_background(),
            ControlCommand::Reset => self.reset(),
            ControlCommand::Stop => {
                info!("stop requested");
                self.stopped = true;
            }
        }
    }

    /// Apply every queued command.
    pub fn drain_control(&mut self) {
        let Some(rx) = self.control.clone() else {
            return;
        };
        loop {
            match rx.try_recv() {
                Ok(cmd) => self.apply(cmd),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    debug!("control queue closed");
                    self.control = None;
                    break;
                }
            }
        }
    }

    fn score(&self, frame: u64, camera: Point2<f32>, now: Instant) -> StrikeEvent {
        let board = self.fiducials.to_board_plane(camera);
        let zone = board.map(|p| self.classifier.classify(p));
        StrikeEvent {
            frame,
            camera: [camera.x, camera.y],
            board: board.map(|p| [p.x, p.y]),
            zone,
            label: zone.map(|z| z.label()),
            code: zone.map(|z| z.code()),
            points: zone.map(|z| z.points()),
            calibrated: self.classifier.geometry().is_calibrated(),
            detected_at: now,
        }
    }

    fn analyze(&mut self, frame: u64, mask: &GrayImage, now: Instant) -> Option<StrikeEvent> {
        let group = self.clusterer.largest(mask)?;
        let estimate = self.tip.estimate(&group.merged_points())?;
        if !self.registry.try_register(estimate.tip, now) {
            debug!("tip {:?} is a known strike", estimate.tip);
            return None;
        }
        self.motion.clear_window();
        let event = self.score(frame, estimate.tip, now);
        info!(
            "strike at ({:.1}, {:.1}): {}",
            estimate.tip.x,
            estimate.tip.y,
            event.label.as_deref().unwrap_or("unregistered board")
        );
        if let Some(artifact) = &self.debug_artifact {
            artifact.write(mask, &estimate, self.registry.params().min_separation);
        }
        Some(event)
    }

    /// Process one grayscale frame taken at `now`.
    ///
    /// Queued control commands are applied first. Once stopped, frames are
    /// counted but not analysed.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, frame), fields(frame = self.frame))
    )]
    pub fn process(&mut self, frame: &GrayImage, now: Instant) -> FrameReport {
        self.drain_control();
        let index = self.frame;
        self.frame += 1;
        let mut report = FrameReport {
            frame: index,
            ..FrameReport::default()
        };
        if self.stopped {
            return report;
        }

        report.fiducials_updated = self.fiducials.observe(frame, now);
        let update = self.motion.update(frame, now, &mut self.registry);
        report.motion_level = update.motion_level;
        report.disturbed = update.event == Some(MotionEvent::SceneDisturbed);
        if !update.stable {
            return report;
        }

        report.analyzed = true;
        if let Some(event) = self.analyze(index, &update.mask, now) {
            report.strikes.push(event);
        }
        self.motion.finish_analysis(update.blurred, now);
        report
    }

    pub fn process_rgb(
        &mut self,
        frame: &RgbImage,
        now: Instant,
    ) -> Result<FrameReport, PipelineError> {
        let gray = gray_from_rgb(frame)?;
        Ok(self.process(&gray, now))
    }

    /// Pull frames from `source` until it is exhausted, fails or a `Stop`
    /// command arrives, emitting every strike to `sink`.
    ///
    /// Only a failure to read the first frame is an error. Later capture
    /// errors end the run with [`StopReason::SourceFailed`], frames that do
    /// not convert with [`StopReason::FrameFailed`]; the debug artifact is
    /// removed either way.
    pub fn run<S, K>(&mut self, source: &mut S, sink: &mut K) -> Result<RunSummary, PipelineError>
    where
        S: FrameSource + ?Sized,
        K: EventSink + ?Sized,
    {
        let first = match source.next_frame() {
            Ok(Some(f)) => f,
            Ok(None) => return Err(PipelineError::NoFrames),
            Err(e) => return Err(PipelineError::FirstFrame(e)),
        };
        if let Some((w, h)) = source.resolution() {
            info!("capturing at {w}x{h}");
        }

        let mut frames = 0u64;
        let mut strikes = 0usize;
        let mut next = Some(first);
        let stop = loop {
            let Some(rgb) = next.take() else {
                break StopReason::Exhausted;
            };
            let gray = match gray_from_rgb(&rgb) {
                Ok(gray) => gray,
                Err(e) => {
                    warn!("unusable frame after {frames} frames: {e}");
                    break StopReason::FrameFailed(e);
                }
            };
            let report = self.process(&gray, source.frame_time());
            if self.stopped {
                break StopReason::Requested;
            }
            frames += 1;
            for event in &report.strikes {
                sink.emit(event);
            }
            strikes += report.strikes.len();

            self.drain_control();
            if self.stopped {
                break StopReason::Requested;
            }
            next = match source.next_frame() {
                Ok(f) => f,
                Err(e) => {
                    warn!("capture failed after {frames} frames: {e}");
                    break StopReason::SourceFailed(e);
                }
            };
        };

        if let Some(artifact) = &self.debug_artifact {
            artifact.remove();
        }
        info!("run finished after {frames} frames with {strikes} strikes ({stop:?})");
        Ok(RunSummary {
            frames,
            strikes,
            stop,
        })
    }
}

impl std::fmt::Debug for DetectionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectionPipeline")
            .field("params", &self.params)
            .field("tip", &self.tip.name())
            .field("strikes", &self.registry.len())
            .field("frame", &self.frame)
            .field("stopped", &self.stopped)
            .finish()
    }
}
