//! Track-replaying location source.
//!
//! Replays a recorded list of fixes on a worker thread, one per configured
//! interval, applying the distance filter and auto-pause behavior the way a
//! platform source would. A [`SimulatedHandle`] observes the calls made on
//! the source and can inject arbitrary events.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::{
    Fix, LocationSource, SourceAvailability, SourceError, SourceErrorKind, SourceEvent,
    SourceSettings,
};
use crate::common::constants::{EARTH_RADIUS_METERS, STATIONARY_FIXES_BEFORE_PAUSE};
use crate::common::utils::{lock, private_path};

/// Movement below this between consecutive fixes counts as stationary.
const STATIONARY_RADIUS_METERS: f64 = 2.0;

#[derive(Debug, Default)]
struct SimState {
    events: Option<Sender<SourceEvent>>,
    settings: Option<SourceSettings>,
    last_fix: Option<Fix>,
    start_calls: usize,
    stop_calls: usize,
    request_calls: usize,
    replay_finished: bool,
}

impl SimState {
    fn send(&self, event: SourceEvent) -> bool {
        self.events
            .as_ref()
            .is_some_and(|events| events.send(event).is_ok())
    }
}

/// Observer and event injector for a [`SimulatedSource`].
#[derive(Debug, Clone)]
pub struct SimulatedHandle {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedHandle {
    /// Send an arbitrary event as if the source produced it.
    ///
    /// Returns false if the source is not attached or the receiver is gone.
    pub fn emit(&self, event: SourceEvent) -> bool {
        if let SourceEvent::Locations(fixes) = &event
            && let Some(latest) = fixes.last()
        {
            lock(&self.state).last_fix = Some(latest.clone());
        }
        lock(&self.state).send(event)
    }

    pub fn emit_fix(&self, fix: Fix) -> bool {
        self.emit(SourceEvent::Locations(vec![fix]))
    }

    pub fn emit_error(&self, kind: SourceErrorKind, description: &str) -> bool {
        self.emit(SourceEvent::Failed(SourceError::new(kind, description)))
    }

    pub fn start_calls(&self) -> usize {
        lock(&self.state).start_calls
    }

    pub fn stop_calls(&self) -> usize {
        lock(&self.state).stop_calls
    }

    pub fn request_calls(&self) -> usize {
        lock(&self.state).request_calls
    }

    /// Settings most recently applied by the tracker.
    pub fn settings(&self) -> Option<SourceSettings> {
        lock(&self.state).settings.clone()
    }

    /// True once the replay worker has emitted the whole track.
    pub fn is_finished(&self) -> bool {
        lock(&self.state).replay_finished
    }
}

struct ReplayWorker {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

/// Location source replaying a recorded track.
pub struct SimulatedSource {
    track: Arc<Vec<Fix>>,
    cursor: Arc<AtomicUsize>,
    state: Arc<Mutex<SimState>>,
    worker: Option<ReplayWorker>,
    availability: SourceAvailability,
}

impl SimulatedSource {
    pub fn new(track: Vec<Fix>) -> Self {
        Self {
            track: Arc::new(track),
            cursor: Arc::new(AtomicUsize::new(0)),
            state: Arc::new(Mutex::new(SimState::default())),
            worker: None,
            availability: SourceAvailability {
                services_enabled: true,
                significant_change_available: true,
            },
        }
    }

    /// A source with nothing to replay; fixes only arrive through the handle.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Override what `availability` reports.
    pub fn with_availability(mut self, availability: SourceAvailability) -> Self {
        self.availability = availability;
        self
    }

    pub fn handle(&self) -> SimulatedHandle {
        SimulatedHandle {
            state: Arc::clone(&self.state),
        }
    }

    fn spawn_worker(&mut self) -> Result<()> {
        let settings = {
            let state = lock(&self.state);
            if state.events.is_none() {
                return Ok(());
            }
            state.settings.clone()
        };
        let Some(settings) = settings else {
            anyhow::bail!("replay started before settings were applied");
        };

        let (stop_tx, stop_rx) = mpsc::channel();
        let track = Arc::clone(&self.track);
        let cursor = Arc::clone(&self.cursor);
        let state = Arc::clone(&self.state);

        let handle = thread::Builder::new()
            .name("locatr-replay".into())
            .spawn(move || {
                let pace = Duration::try_from_secs_f64(settings.interval_seconds)
                    .unwrap_or(Duration::ZERO);
                let mut replay = Replay::new(settings, lock(&state).last_fix.clone());

                loop {
                    let index = cursor.fetch_add(1, Ordering::SeqCst);
                    let Some(fix) = track.get(index) else {
                        lock(&state).replay_finished = true;
                        break;
                    };

                    for event in replay.step(fix) {
                        let mut guard = lock(&state);
                        if let SourceEvent::Locations(fixes) = &event {
                            guard.last_fix = fixes.last().cloned();
                        }
                        if !guard.send(event) {
                            return;
                        }
                    }

                    match stop_rx.recv_timeout(pace) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })
            .context("Failed to spawn replay thread")?;

        self.worker = Some(ReplayWorker { stop_tx, handle });
        Ok(())
    }

    fn stop_worker(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop_tx.send(());
            let _ = worker.handle.join();
        }
    }
}

impl Drop for SimulatedSource {
    fn drop(&mut self) {
        self.stop_worker();
        // Handles may outlive the source; the event channel must not
        lock(&self.state).events = None;
    }
}

impl LocationSource for SimulatedSource {
    fn attach(&mut self, events: Sender<SourceEvent>) {
        lock(&self.state).events = Some(events);
    }

    fn apply_settings(&mut self, settings: &SourceSettings) {
        lock(&self.state).settings = Some(settings.clone());
    }

    fn start_updating(&mut self) {
        lock(&self.state).start_calls += 1;

        if self.worker.is_some() || self.track.is_empty() {
            return;
        }
        if let Err(e) = self.spawn_worker() {
            log_pipe!();
            log_warning!("Simulated source could not start replay: {e}");
        }
    }

    fn stop_updating(&mut self) {
        lock(&self.state).stop_calls += 1;
        self.stop_worker();
    }

    fn request_location(&mut self) {
        let mut state = lock(&self.state);
        state.request_calls += 1;

        let current = state.last_fix.clone().or_else(|| {
            self.track
                .get(self.cursor.load(Ordering::SeqCst))
                .cloned()
        });

        let event = match current {
            Some(fix) => SourceEvent::Locations(vec![fix]),
            None => SourceEvent::Failed(SourceError::new(
                SourceErrorKind::LocationUnknown,
                "The location is currently unknown",
            )),
        };
        state.send(event);
    }

    fn availability(&self) -> SourceAvailability {
        self.availability
    }

    fn name(&self) -> &'static str {
        "Simulated"
    }
}

/// Distance filtering and auto-pause bookkeeping for one replay run.
struct Replay {
    settings: SourceSettings,
    last_reported: Option<Fix>,
    stationary_run: usize,
    paused: bool,
}

impl Replay {
    fn new(settings: SourceSettings, last_reported: Option<Fix>) -> Self {
        Self {
            settings,
            last_reported,
            stationary_run: 0,
            paused: false,
        }
    }

    fn step(&mut self, fix: &Fix) -> Vec<SourceEvent> {
        let mut events = Vec::new();
        let moved = self
            .last_reported
            .as_ref()
            .map_or(f64::INFINITY, |last| distance_meters(last, fix));
        let stationary = moved < STATIONARY_RADIUS_METERS;

        self.stationary_run = if stationary { self.stationary_run + 1 } else { 0 };

        if self.settings.pauses_automatically {
            if !self.paused && self.stationary_run >= STATIONARY_FIXES_BEFORE_PAUSE {
                self.paused = true;
                events.push(SourceEvent::Paused);
            } else if self.paused && !stationary {
                self.paused = false;
                events.push(SourceEvent::Resumed);
            }
        }

        let filtered = self.settings.distance_filter_meters > 0.0
            && moved < self.settings.distance_filter_meters;

        if !self.paused && !filtered {
            self.last_reported = Some(fix.clone());
            events.push(SourceEvent::Locations(vec![fix.clone()]));
        }

        events
    }
}

/// Great-circle distance between two fixes (haversine).
pub fn distance_meters(a: &Fix, b: &Fix) -> f64 {
    let (lat_a, lat_b) = (a.latitude.to_radians(), b.latitude.to_radians());
    let d_lat = lat_b - lat_a;
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().min(1.0).asin()
}

/// Load a JSON track: an array of fixes.
pub fn load_track(path: &Path) -> Result<Vec<Fix>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read track file {}", private_path(path)))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse track file {}", private_path(path)))
}
