//! One streaming session: frame loop, persistence side effects and transport events.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::analysis::{ClosedInterval, Proposal};
use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::integration::DetectionSource;
use crate::pipeline::{AnalysisPipeline, FrameOutput};
use crate::source::{FrameFeed, open_source};
use crate::store::ZoneStore;
use crate::tracker::MultiObjectTracker;
use crate::zone::{Zone, ZoneSnapshot};
use crate::{Timestamp, unix_now};

/// Messages delivered to the viewer.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Annotated JPEG frame.
    Frame { index: u64, image: Vec<u8> },
    /// A new unconfirmed zone was proposed and stored.
    Proposal(Proposal),
    /// The zone list changed; viewers should refetch or use this snapshot.
    ZonesUpdated(ZoneSnapshot),
    /// The session ended with a fatal error.
    Error(String),
}

/// Live control messages from the viewer.
#[derive(Debug, Clone)]
pub enum SessionControl {
    SetStabilityWindow(f64),
    /// Reload zones from the store.
    RefreshZones,
    /// Push an externally obtained snapshot.
    ReplaceZones(ZoneSnapshot),
}

type Clock = Arc<dyn Fn() -> Timestamp + Send + Sync>;

/// A single viewer's analysis session.
///
/// Owns its own pipeline; nothing but the zone store is shared with other
/// sessions.
pub struct Session<D, T, S: ?Sized> {
    config: SessionConfig,
    detector: D,
    tracker: T,
    store: Arc<S>,
    clock: Clock,
}

impl<D, T, S> Session<D, T, S>
where
    D: DetectionSource,
    D::Error: std::error::Error + Send + Sync + 'static,
    T: MultiObjectTracker,
    T::Error: std::error::Error + Send + Sync + 'static,
    S: ZoneStore + ?Sized + 'static,
{
    pub fn new(config: SessionConfig, detector: D, tracker: T, store: Arc<S>) -> Self {
        Self {
            config,
            detector,
            tracker,
            store,
            clock: Arc::new(unix_now),
        }
    }

    /// Replace the wall clock used to timestamp frames.
    pub fn with_clock(mut self, clock: impl Fn() -> Timestamp + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Run until cancelled, the viewer goes away, or a fatal error occurs.
    ///
    /// Fatal errors are reported as [`SessionEvent::Error`] and returned.
    pub async fn run(
        self,
        events: mpsc::Sender<SessionEvent>,
        controls: mpsc::Receiver<SessionControl>,
        cancel: CancellationToken,
    ) -> Result<()> {
        info!(source = %self.config.video_source, "Session starting");

        let result = self.stream(&events, controls, &cancel).await;
        match &result {
            Ok(()) => info!("Session finished"),
            Err(e) => {
                error!(error = %e, "Session failed");
                let _ = events.send(SessionEvent::Error(e.to_string())).await;
            }
        }
        result
    }

    async fn stream(
        self,
        events: &mpsc::Sender<SessionEvent>,
        mut controls: mpsc::Receiver<SessionControl>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let Session {
            config,
            detector,
            tracker,
            store,
            clock,
        } = self;
        config.validate()?;

        let zones = store
            .list_zones()
            .await
            .map_err(Error::ZonesUnavailable)?;
        debug!(zones = zones.len(), "Loaded zones");

        let video_source = config.video_source.clone();
        let source = tokio::task::spawn_blocking(move || open_source(&video_source))
            .await
            .map_err(|e| Error::SourceUnavailable(e.to_string()))??;

        let mut pipeline = AnalysisPipeline::new(detector, tracker, config.analysis.clone(), zones)?;
        pipeline.set_jpeg_quality(config.jpeg_quality);

        let (writer, interval_tx) = IntervalWriter::spawn(Arc::clone(&store));
        let mut feed = FrameFeed::spawn(source, config.frame_queue_capacity, cancel.child_token());

        let outcome = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Session cancelled");
                    break Ok(());
                }
                Some(control) = controls.recv() => {
                    handle_control(control, &mut pipeline, store.as_ref(), events).await;
                }
                frame = feed.next() => {
                    let Some(frame) = frame else {
                        break Ok(());
                    };
                    let output = match pipeline.process_frame(frame, clock()) {
                        Ok(output) => output,
                        Err(e) => break Err(e),
                    };
                    if !deliver(output, &mut pipeline, store.as_ref(), &interval_tx, events).await {
                        debug!("Viewer disconnected");
                        break Ok(());
                    }
                }
            }
        };

        let feed_result = feed.shutdown().await;
        drop(interval_tx);
        writer.finish().await;

        outcome?;
        if !cancel.is_cancelled() && !events.is_closed() {
            feed_result?;
        }
        Ok(())
    }
}

/// Send the frame, queue interval writes and act on a proposal.
/// Returns `false` once the viewer is gone.
async fn deliver<D, T, S>(
    output: FrameOutput,
    pipeline: &mut AnalysisPipeline<D, T>,
    store: &S,
    intervals: &mpsc::UnboundedSender<ClosedInterval>,
    events: &mpsc::Sender<SessionEvent>,
) -> bool
where
    S: ZoneStore + ?Sized,
{
    for closed in output.closed_intervals {
        if intervals.send(closed).is_err() {
            warn!(zone_id = %closed.zone_id, "Interval writer stopped, dropping interval");
        }
    }

    let frame = SessionEvent::Frame {
        index: output.frame_index,
        image: output.image,
    };
    if events.send(frame).await.is_err() {
        return false;
    }

    let Some(proposal) = output.proposal else {
        return true;
    };

    match store.create_zone(&proposal.name, proposal.rect).await {
        Ok(zone_id) => {
            info!(zone_id = %zone_id, name = %proposal.name, "Stored proposed workplace");
            let stored = Zone::proposed(zone_id, proposal.name.clone(), proposal.rect);
            if events.send(SessionEvent::Proposal(proposal)).await.is_err() {
                return false;
            }
            let zones = match load_zones(store).await {
                Some(zones) => zones,
                // Keep the new zone locally so it still blocks overlapping proposals.
                None => {
                    let mut zones = pipeline.zones().clone();
                    zones.insert(stored);
                    zones
                }
            };
            pipeline.replace_zones(zones.clone());
            if events.send(SessionEvent::ZonesUpdated(zones)).await.is_err() {
                return false;
            }
        }
        Err(e) => warn!(error = %e, name = %proposal.name, "Failed to store proposed workplace"),
    }
    true
}

async fn handle_control<D, T, S>(
    control: SessionControl,
    pipeline: &mut AnalysisPipeline<D, T>,
    store: &S,
    events: &mpsc::Sender<SessionEvent>,
) where
    S: ZoneStore + ?Sized,
{
    match control {
        SessionControl::SetStabilityWindow(seconds) => {
            if let Err(e) = pipeline.set_stability_window(seconds) {
                warn!(error = %e, "Ignoring stability window change");
            }
        }
        SessionControl::RefreshZones => {
            if let Some(zones) = load_zones(store).await {
                pipeline.replace_zones(zones.clone());
                let _ = events.send(SessionEvent::ZonesUpdated(zones)).await;
            }
        }
        SessionControl::ReplaceZones(zones) => pipeline.replace_zones(zones),
    }
}

async fn load_zones<S: ZoneStore + ?Sized>(store: &S) -> Option<ZoneSnapshot> {
    match store.list_zones().await {
        Ok(zones) => Some(zones),
        Err(e) => {
            warn!(error = %e, "Failed to load zones");
            None
        }
    }
}

/// Appends closed intervals in order on a background task.
///
/// A failed write is logged and dropped; it never stalls the frame loop.
struct IntervalWriter {
    task: JoinHandle<()>,
}

impl IntervalWriter {
    fn spawn<S: ZoneStore + ?Sized + 'static>(
        store: Arc<S>,
    ) -> (Self, mpsc::UnboundedSender<ClosedInterval>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<ClosedInterval>();
        let task = tokio::spawn(async move {
            while let Some(closed) = rx.recv().await {
                match store.append_interval(closed.zone_id, closed.interval).await {
                    Ok(()) => debug!(
                        zone_id = %closed.zone_id,
                        start = closed.interval.start,
                        end = closed.interval.end,
                        "Occupancy interval stored"
                    ),
                    Err(e) => warn!(
                        zone_id = %closed.zone_id,
                        track_id = closed.track_id,
                        error = %e,
                        "Dropping occupancy interval"
                    ),
                }
            }
        });
        (Self { task }, tx)
    }

    /// Wait for queued writes to drain after the sender is dropped.
    async fn finish(self) {
        if let Err(e) = self.task.await {
            warn!(error = %e, "Interval writer ended abnormally");
        }
    }
}
