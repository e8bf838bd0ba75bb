//! Per-frame composition of tracking, trajectory analysis and rendering.

use tracing::{debug, info};

use crate::Timestamp;
use crate::analysis::{
    ClosedInterval, OccupancyStateMachine, PreviewOverlay, Proposal, ProposalThrottle,
    StabilityDetector, TrajectoryStore, overlaps_any,
};
use crate::config::{AnalysisConfig, validate_window};
use crate::error::Result;
use crate::integration::{DetectionSource, TrackerPipeline};
use crate::render::{Annotations, Frame, ZoneMark, encode_jpeg};
use crate::tracker::{MultiObjectTracker, Track};
use crate::zone::ZoneSnapshot;

const DEFAULT_JPEG_QUALITY: u8 = 80;

/// What the analysis core decided for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameAnalysis {
    pub proposal: Option<Proposal>,
    /// Occupancy intervals closed on this frame, to be persisted by the caller
    pub closed_intervals: Vec<ClosedInterval>,
    pub annotations: Annotations,
}

/// Annotated, encoded frame plus the analysis outcome.
#[derive(Debug, Clone)]
pub struct FrameOutput {
    pub frame_index: u64,
    /// JPEG bytes of the annotated frame
    pub image: Vec<u8>,
    pub proposal: Option<Proposal>,
    pub closed_intervals: Vec<ClosedInterval>,
}

/// Analysis state for a single streaming session.
///
/// Strictly sequential: one call per frame, no internal locking. Each
/// session builds its own pipeline, so trajectories, cooldowns and
/// occupancy are never shared.
pub struct AnalysisPipeline<D, T> {
    tracking: TrackerPipeline<D, T>,
    config: AnalysisConfig,
    jpeg_quality: u8,
    zones: ZoneSnapshot,
    trajectories: TrajectoryStore,
    stability: StabilityDetector,
    throttle: ProposalThrottle,
    occupancy: OccupancyStateMachine,
    preview: Option<PreviewOverlay>,
}

impl<D, T> AnalysisPipeline<D, T> {
    /// Time-dependent state is read from `config` at the start of every frame.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Change the stability window mid-session; takes effect on the next frame.
    pub fn set_stability_window(&mut self, seconds: f64) -> Result<()> {
        validate_window(seconds)?;
        info!(
            from = self.config.stability_window_seconds,
            to = seconds,
            "Stability window changed"
        );
        self.config.stability_window_seconds = seconds;
        Ok(())
    }

    pub fn set_jpeg_quality(&mut self, quality: u8) {
        self.jpeg_quality = quality.clamp(1, 100);
    }

    pub fn zones(&self) -> &ZoneSnapshot {
        &self.zones
    }

    /// Swap in a fresh zone snapshot and drop occupancy of vanished zones.
    pub fn replace_zones(&mut self, zones: ZoneSnapshot) {
        let dropped = self.occupancy.reconcile(&zones);
        info!(zones = zones.len(), dropped_occupancy = dropped, "Zone snapshot replaced");
        self.zones = zones;
    }

    pub fn trajectories(&self) -> &TrajectoryStore {
        &self.trajectories
    }

    pub fn occupancy(&self) -> &OccupancyStateMachine {
        &self.occupancy
    }

    pub fn throttle(&self) -> &ProposalThrottle {
        &self.throttle
    }

    pub fn preview(&self) -> Option<&PreviewOverlay> {
        self.preview.as_ref()
    }

    pub fn tracking(&self) -> &TrackerPipeline<D, T> {
        &self.tracking
    }

    /// Run the analysis core over this frame's tracks.
    ///
    /// Unconfirmed tracks are ignored. At most one proposal is emitted;
    /// trajectories are visited in ascending track id order and the first
    /// one that is stable, free of overlap and out of cooldown wins.
    pub fn analyze(&mut self, tracks: &[Track], now: Timestamp) -> FrameAnalysis {
        self.apply_config();

        let mut confirmed: Vec<&Track> = tracks.iter().filter(|t| t.is_confirmed()).collect();
        confirmed.sort_by_key(|t| t.track_id);

        let mut centers = Vec::with_capacity(confirmed.len());
        for track in &confirmed {
            let (cx, cy) = track.center();
            self.trajectories.record(track.track_id, cx, cy, now);
            centers.push((track.track_id, (cx, cy)));
        }

        let closed_intervals = self.occupancy.update(&self.zones, &centers, now);
        let proposal = self.propose(now);

        if self.preview.is_some_and(|p| !p.is_live(now)) {
            self.preview = None;
        }

        let forgotten = self.trajectories.collect_garbage(now);
        if forgotten > 0 {
            debug!(forgotten, "Forgot stale trajectories");
        }
        self.throttle.expire(now, self.config.proposal_cooldown());

        let annotations = Annotations {
            tracks: confirmed.iter().map(|t| (t.track_id, t.rect)).collect(),
            zones: self
                .zones
                .iter()
                .map(|z| ZoneMark {
                    rect: z.rect,
                    confirmed: z.confirmed,
                })
                .collect(),
            preview: self.preview.map(|p| p.rect),
        };

        FrameAnalysis {
            proposal,
            closed_intervals,
            annotations,
        }
    }

    fn propose(&mut self, now: Timestamp) -> Option<Proposal> {
        let cooldown = self.config.proposal_cooldown();

        for (track_id, history) in self.trajectories.iter() {
            let Some(candidate) = self.stability.evaluate(history, now) else {
                continue;
            };

            if overlaps_any(&candidate.rect, self.zones.rects()) {
                debug!(track_id, rect = ?candidate.rect, "Stable track overlaps an existing zone");
                continue;
            }

            if !self.throttle.try_acquire(track_id, now, cooldown) {
                debug!(track_id, "Proposal suppressed by cooldown");
                continue;
            }

            let proposal = Proposal::new(track_id, &candidate);
            info!(
                track_id,
                name = %proposal.name,
                rect = ?proposal.rect,
                start = proposal.start_time,
                "Proposing new workplace"
            );
            self.preview = Some(PreviewOverlay::new(
                candidate.rect,
                now,
                self.config.preview_duration_seconds,
            ));
            return Some(proposal);
        }

        None
    }

    fn apply_config(&mut self) {
        self.stability = StabilityDetector::from_config(&self.config);
        self.trajectories
            .set_retention(self.config.retention_window());
    }
}

impl<D, T> AnalysisPipeline<D, T>
where
    D: DetectionSource,
    D::Error: std::error::Error + Send + Sync + 'static,
    T: MultiObjectTracker,
    T::Error: std::error::Error + Send + Sync + 'static,
{
    pub fn new(detector: D, tracker: T, config: AnalysisConfig, zones: ZoneSnapshot) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            tracking: TrackerPipeline::new(detector, tracker, config.confidence_threshold),
            trajectories: TrajectoryStore::new(config.retention_window()),
            stability: StabilityDetector::from_config(&config),
            throttle: ProposalThrottle::new(),
            occupancy: OccupancyStateMachine::new(),
            preview: None,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            zones,
            config,
        })
    }

    /// Track, analyze, annotate and encode one frame.
    ///
    /// Detector and tracker failures are returned as fatal errors; the
    /// analysis state is left untouched in that case.
    pub fn process_frame(&mut self, mut frame: Frame, now: Timestamp) -> Result<FrameOutput> {
        let tracks = self.tracking.process_frame(&frame)?;
        let analysis = self.analyze(&tracks, now);

        analysis.annotations.draw(&mut frame.image);
        let image = encode_jpeg(&frame.image, self.jpeg_quality)?;

        Ok(FrameOutput {
            frame_index: frame.index,
            image,
            proposal: analysis.proposal,
            closed_intervals: analysis.closed_intervals,
        })
    }
}
