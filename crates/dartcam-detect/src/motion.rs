//! Frame differencing against a background reference, and the gate that
//! decides when the scene has been still long enough to look for a strike.

use crate::params::{MotionParams, ParamsError};
use crate::registry::StrikeRegistry;
use dartcam_core::filter::{
    abs_diff, default_sigma_for_kernel, dilate, erode, fill_disc, gaussian_blur, threshold_binary,
};
use dartcam_core::GrayImage;
use log::{debug, info, trace};
use std::collections::VecDeque;
use std::time::Instant;

#[cfg(feature = "tracing")]
use tracing::instrument;

fn secs_between(earlier: Instant, later: Instant) -> f64 {
    later.saturating_duration_since(earlier).as_secs_f64()
}

/// Sliding window of motion levels with a quiet/still state machine.
///
/// The window is quiet when it holds at least `min_samples` levels whose
/// spread stays under `max_jump`. Quiet time is counted from the oldest
/// sample of the quiet run (or from the last analysis, whichever is later),
/// and analysis becomes due once it exceeds the still time.
#[derive(Clone, Debug)]
pub struct StabilityGate {
    window_secs: f64,
    still_time_secs: f64,
    max_jump: usize,
    min_samples: usize,
    samples: VecDeque<(Instant, usize)>,
    quiet_since: Option<Instant>,
    settled_at: Option<Instant>,
}

impl StabilityGate {
    pub fn new(params: &MotionParams) -> Self {
        Self {
            window_secs: params.window_secs,
            still_time_secs: params.still_time_secs,
            max_jump: params.max_jump,
            min_samples: params.min_samples,
            samples: VecDeque::new(),
            quiet_since: None,
            settled_at: None,
        }
    }

    /// Add a level observed at `now`; returns whether the window is quiet.
    pub fn push(&mut self, now: Instant, level: usize) -> bool {
        self.samples.push_back((now, level));
        while let Some(&(t, _)) = self.samples.front() {
            if secs_between(t, now) > self.window_secs {
                self.samples.pop_front();
            } else {
                break;
            }
        }

        let quiet = self.is_quiet();
        if !quiet {
            self.quiet_since = None;
        } else if self.quiet_since.is_none() {
            let oldest = self.samples.front().map_or(now, |&(t, _)| t);
            self.quiet_since = Some(match self.settled_at {
                Some(s) if s > oldest => s,
                _ => oldest,
            });
        }
        quiet
    }

    fn is_quiet(&self) -> bool {
        if self.samples.len() < self.min_samples {
            return false;
        }
        let (lo, hi) = self
            .samples
            .iter()
            .fold((usize::MAX, 0usize), |(lo, hi), &(_, l)| (lo.min(l), hi.max(l)));
        hi - lo < self.max_jump
    }

    pub fn ready_to_analyze(&self, now: Instant) -> bool {
        self.quiet_since
            .is_some_and(|q| secs_between(q, now) > self.still_time_secs)
    }

    /// Mark an analysis attempt at `now`; the next one needs a fresh still period.
    pub fn settle(&mut self, now: Instant) {
        self.quiet_since = None;
        self.settled_at = Some(now);
    }

    pub fn clear_window(&mut self) {
        self.samples.clear();
        self.quiet_since = None;
    }

    pub fn reset(&mut self) {
        self.clear_window();
        self.settled_at = None;
    }

    pub fn set_still_time(&mut self, secs: f64) {
        self.still_time_secs = secs;
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Something the analyzer did besides measuring motion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotionEvent {
    /// No usable background yet (first frame or a size change); this frame
    /// became the reference.
    BackgroundInitialized,
    /// Motion exceeded the disturbance level: background replaced, window
    /// and known strikes cleared.
    SceneDisturbed,
}

/// Result of one [`MotionAnalyzer::update`].
#[derive(Clone, Debug)]
pub struct MotionUpdate {
    /// Foreground pixel count of `mask`.
    pub motion_level: usize,
    /// True when the caller should look for a strike in `mask` now.
    pub stable: bool,
    /// Binary motion mask with known strikes cut out.
    pub mask: GrayImage,
    /// Blurred frame; hand it back through [`MotionAnalyzer::finish_analysis`].
    pub blurred: GrayImage,
    pub event: Option<MotionEvent>,
}

/// Background-difference motion detector.
#[derive(Clone, Debug)]
pub struct MotionAnalyzer {
    params: MotionParams,
    sigma: f32,
    background: Option<GrayImage>,
    gate: StabilityGate,
}

impl MotionAnalyzer {
    pub fn new(params: MotionParams) -> Result<Self, ParamsError> {
        params.validate()?;
        Ok(Self {
            sigma: default_sigma_for_kernel(params.blur_kernel),
            gate: StabilityGate::new(&params),
            background: None,
            params,
        })
    }

    pub fn params(&self) -> &MotionParams {
        &self.params
    }

    pub fn set_motion_threshold(&mut self, threshold: u8) {
        self.params.motion_threshold = threshold;
    }

    pub fn set_still_time(&mut self, secs: f64) {
        self.params.still_time_secs = secs;
        self.gate.set_still_time(secs);
    }

    pub fn has_background(&self) -> bool {
        self.background.is_some()
    }

    /// Forget the background; the next frame becomes the new reference.
    pub fn reset_background(&mut self) {
        self.background = None;
        self.gate.reset();
    }

    pub fn clear_window(&mut self) {
        self.gate.clear_window();
    }

    pub fn ready_to_analyze(&self, now: Instant) -> bool {
        self.gate.ready_to_analyze(now)
    }

    /// Thresholded, dilated and eroded difference of two blurred frames.
    pub fn motion_mask(&self, blurred: &GrayImage, background: &GrayImage) -> GrayImage {
        let diff = abs_diff(blurred, background);
        let mask = threshold_binary(&diff, self.params.motion_threshold);
        let mask = dilate(&mask, self.params.dilate_iterations);
        erode(&mask, self.params.erode_iterations)
    }

    /// Process one grayscale frame.
    ///
    /// Disturbances clear `registry`; otherwise its strikes are masked out
    /// of the motion mask so settled darts do not count as motion.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, frame, registry), fields(width = frame.width, height = frame.height))
    )]
    pub fn update(
        &mut self,
        frame: &GrayImage,
        now: Instant,
        registry: &mut StrikeRegistry,
    ) -> MotionUpdate {
        let blurred = gaussian_blur(frame, self.params.blur_kernel, self.sigma);

        let background = match &self.background {
            Some(bg) if bg.same_size(&blurred) => bg,
            _ => {
                debug!(
                    "background initialised from a {}x{} frame",
                    blurred.width, blurred.height
                );
                self.background = Some(blurred.clone());
                self.gate.reset();
                return MotionUpdate {
                    motion_level: 0,
                    stable: false,
                    mask: GrayImage::new(blurred.width, blurred.height),
                    blurred,
                    event: Some(MotionEvent::BackgroundInitialized),
                };
            }
        };

        let mut mask = self.motion_mask(&blurred, background);
        for p in registry.positions() {
            fill_disc(&mut mask, p, self.params.known_strike_radius, 0);
        }
        let motion_level = mask.count_nonzero();
        let quiet = self.gate.push(now, motion_level);
        trace!("motion level {motion_level}, quiet {quiet}");

        if motion_level > self.params.disturbance_level {
            info!(
                "scene disturbed (motion level {motion_level}); resetting background and {} strikes",
                registry.len()
            );
            registry.reset();
            self.background = Some(blurred.clone());
            self.gate.clear_window();
            return MotionUpdate {
                motion_level,
                stable: false,
                mask,
                blurred,
                event: Some(MotionEvent::SceneDisturbed),
            };
        }

        MotionUpdate {
            motion_level,
            stable: self.gate.ready_to_analyze(now),
            mask,
            blurred,
            event: None,
        }
    }

    /// Close an analysis attempt: `blurred` becomes the background and the
    /// gate waits for a new still period.
    pub fn finish_analysis(&mut self, blurred: GrayImage, now: Instant) {
        self.background = Some(blurred);
        self.gate.settle(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point2;
    use std::time::Duration;

    fn at(base: Instant, secs: f64) -> Instant {
        base + Duration::from_secs_f64(secs)
    }

    #[test]
    fn gate_needs_min_samples() {
        let base = Instant::now();
        let mut gate = StabilityGate::new(&MotionParams::default());
        assert!(!gate.push(at(base, 0.0), 5));
        assert!(!gate.push(at(base, 0.03), 5));
        assert!(gate.push(at(base, 0.06), 5));
    }

    #[test]
    fn gate_opens_after_still_time_of_flat_levels() {
        let base = Instant::now();
        let mut gate = StabilityGate::new(&MotionParams::default());
        let mut first_ready = None;
        for i in 0..60 {
            let t = i as f64 / 30.0;
            // large swings first, then a narrow band from t = 1.0
            let level = if t < 1.0 {
                if i % 2 == 0 {
                    0
                } else {
                    5000
                }
            } else {
                100 + (i % 10)
            };
            gate.push(at(base, t), level);
            if gate.ready_to_analyze(at(base, t)) && first_ready.is_none() {
                first_ready = Some(t);
            }
        }
        let t = first_ready.expect("gate never opened");
        assert!(t >= 1.4, "opened too early at {t}");
        assert!(t <= 1.6, "opened too late at {t}");
    }

    #[test]
    fn settle_requires_a_fresh_still_period() {
        let base = Instant::now();
        let mut gate = StabilityGate::new(&MotionParams::default());
        for i in 0..20 {
            gate.push(at(base, i as f64 / 30.0), 0);
        }
        let t = 19.0 / 30.0;
        assert!(gate.ready_to_analyze(at(base, t)));
        gate.settle(at(base, t));
        assert!(!gate.ready_to_analyze(at(base, t)));

        gate.push(at(base, t + 0.1), 0);
        assert!(!gate.ready_to_analyze(at(base, t + 0.1)));
        gate.push(at(base, t + 0.45), 0);
        assert!(gate.ready_to_analyze(at(base, t + 0.45)));
    }

    #[test]
    fn first_frame_becomes_background() {
        let mut analyzer = MotionAnalyzer::new(MotionParams::default()).expect("params");
        let mut registry = StrikeRegistry::default();
        let frame = GrayImage::filled(64, 48, 120);
        let up = analyzer.update(&frame, Instant::now(), &mut registry);
        assert_eq!(up.event, Some(MotionEvent::BackgroundInitialized));
        assert_eq!(up.motion_level, 0);
        assert!(!up.stable);
        assert!(analyzer.has_background());
    }

    #[test]
    fn changed_block_is_counted_as_motion() {
        let base = Instant::now();
        let mut analyzer = MotionAnalyzer::new(MotionParams::default()).expect("params");
        let mut registry = StrikeRegistry::default();
        let empty = GrayImage::filled(100, 100, 180);
        analyzer.update(&empty, base, &mut registry);

        let mut frame = empty.clone();
        for y in 40..60 {
            for x in 40..60 {
                frame.set(x, y, 20);
            }
        }
        let up = analyzer.update(&frame, at(base, 0.03), &mut registry);
        assert_eq!(up.event, None);
        // the 400 px block grows by the blur halo and the closing
        assert!(
            (400..900).contains(&up.motion_level),
            "level {}",
            up.motion_level
        );
        assert_eq!(up.mask.get(50, 50), dartcam_core::MASK_ON);
        assert_eq!(up.mask.get(5, 5), 0);

        // a strike registered in the middle hides that part of the block
        registry.try_register(Point2::new(50.0, 50.0), at(base, 0.06));
        let up = analyzer.update(&frame, at(base, 0.06), &mut registry);
        assert_eq!(up.mask.get(50, 50), 0);
    }

    #[test]
    fn large_motion_resets_scene() {
        let base = Instant::now();
        let mut analyzer = MotionAnalyzer::new(MotionParams::default()).expect("params");
        let mut registry = StrikeRegistry::default();
        registry.try_register(Point2::new(10.0, 10.0), base);
        analyzer.update(&GrayImage::filled(200, 200, 200), base, &mut registry);

        let up = analyzer.update(&GrayImage::filled(200, 200, 10), at(base, 0.03), &mut registry);
        assert_eq!(up.event, Some(MotionEvent::SceneDisturbed));
        assert!(!up.stable);
        assert!(registry.is_empty());

        // the dark frame is now the background
        let up = analyzer.update(&GrayImage::filled(200, 200, 10), at(base, 0.06), &mut registry);
        assert_eq!(up.motion_level, 0);
    }

    #[test]
    fn size_change_reinitialises_background() {
        let base = Instant::now();
        let mut analyzer = MotionAnalyzer::new(MotionParams::default()).expect("params");
        let mut registry = StrikeRegistry::default();
        analyzer.update(&GrayImage::filled(40, 40, 0), base, &mut registry);
        let up = analyzer.update(&GrayImage::filled(50, 40, 0), at(base, 0.03), &mut registry);
        assert_eq!(up.event, Some(MotionEvent::BackgroundInitialized));
    }
}
