//! Location tracking state machine.
//!
//! The `Tracker` is the context object that owns everything the tracking
//! logic needs:
//!
//! - the current `Configuration` (replaced atomically by `configure`)
//! - the `TrackingState` (changed only by `start`/`stop`)
//! - the `LifecycleState` (changed only by lifecycle signals)
//! - the single-slot delivery channel registration
//! - the long-lived location source
//!
//! Source events are handled on a separate pump thread (see
//! [`coordinator`]) and deliveries are dispatched on a third thread, so the
//! consumer-facing calls below are safe to make from any thread while
//! events are arriving.

mod coordinator;
pub mod lifecycle;
pub mod state;

use anyhow::Result;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crate::common::constants::PLUGIN_VERSION;
use crate::common::utils::lock;
use crate::config::{ConfigError, Configuration, ConfigureParams};
use crate::delivery::{CallbackHandle, CallbackId, DeliveryChannel};
use crate::notifier::DebugNotifier;
use crate::source::{LocationSource, SourceAvailability, SourceSettings};

use coordinator::Coordinator;
use state::TrackerState;

pub use lifecycle::LifecycleSignal;
pub use state::{LifecycleState, TrackingState};

/// Dependencies needed to create a `Tracker`.
pub struct TrackerParams {
    pub source: Box<dyn LocationSource>,
    pub notifier: Arc<dyn DebugNotifier>,
}

/// Location tracking coordinator.
pub struct Tracker {
    state: Arc<Mutex<TrackerState>>,
    source: Mutex<Box<dyn LocationSource>>,
    delivery: DeliveryChannel,
    /// Reported by the source once, when the tracker is created
    availability: SourceAvailability,
    threads: Vec<JoinHandle<()>>,
}

impl Tracker {
    /// Attach the source, spawn the event and delivery threads, and start
    /// out Disabled, in the foreground, with default configuration.
    pub fn new(params: TrackerParams) -> Result<Self> {
        let TrackerParams {
            mut source,
            notifier,
        } = params;

        let (event_tx, event_rx) = mpsc::channel();
        source.attach(event_tx);

        let availability = source.availability();

        let state = Arc::new(Mutex::new(TrackerState::default()));
        let (delivery, dispatcher) = DeliveryChannel::new()?;
        let pump = Coordinator::new(Arc::clone(&state), delivery.clone(), notifier)
            .spawn(event_rx)?;

        Ok(Self {
            state,
            source: Mutex::new(source),
            delivery,
            availability,
            threads: vec![pump, dispatcher],
        })
    }

    /// Version string of the tracking interface.
    pub const fn version() -> &'static str {
        PLUGIN_VERSION
    }

    /// Validate and store a complete new configuration.
    ///
    /// Takes effect at the next `start`; an already running source keeps
    /// its current settings.
    pub fn configure(&self, params: ConfigureParams) -> Result<(), ConfigError> {
        let config = Configuration::try_from(params)?;
        let debug_enabled = config.debug_enabled;

        let tracking = {
            let mut state = lock(&self.state);
            state.config = config.clone();
            state.tracking
        };
        self.delivery.set_verbose(debug_enabled);

        if debug_enabled {
            config.log_summary();
            if tracking == TrackingState::Enabled {
                log_indented!("Tracking is active; new settings apply on the next start");
            }
        }
        Ok(())
    }

    /// Register the consumer that receives all further fixes and errors,
    /// replacing any previous one.
    pub fn register_for_updates(&self, handle: CallbackHandle) {
        let id = handle.id().clone();
        let replaced = self.delivery.register(handle);

        if self.debug_enabled() {
            log_block_start!("Registered for location updates: {id}");
            if let Some(old) = replaced {
                log_indented!("Replaced previous consumer {old}");
            }
        }
    }

    /// Ask the source for one fix, whatever the tracking state.
    ///
    /// The result arrives through the registered consumer, if any.
    pub fn request_current_location(&self) {
        if self.debug_enabled() {
            log_debug!("Requesting current location");
        }
        lock(&self.source).request_location();
    }

    /// Begin continuous tracking with the current configuration.
    /// Does nothing if tracking is already enabled.
    pub fn start(&self) {
        let mut state = lock(&self.state);
        if state.tracking == TrackingState::Enabled {
            return;
        }

        let settings = SourceSettings::from(&state.config);
        {
            let mut source = lock(&self.source);
            source.apply_settings(&settings);
            source.start_updating();
        }
        state.tracking = TrackingState::Enabled;

        if state.config.debug_enabled {
            log_block_start!("Location tracking started");
            log_indented!("Source: {}", lock(&self.source).name());
            log_indented!(
                "Are we in the background? {}",
                state.lifecycle == LifecycleState::Background
            );
            self.log_availability();
        }
    }

    /// Halt continuous tracking. Does nothing if tracking is disabled.
    pub fn stop(&self) {
        let mut state = lock(&self.state);
        if state.tracking == TrackingState::Disabled {
            return;
        }

        lock(&self.source).stop_updating();
        state.tracking = TrackingState::Disabled;

        if state.config.debug_enabled {
            log_block_start!("Location tracking stopped");
        }
    }

    /// Record a host lifecycle transition. Tracking is left untouched.
    pub fn handle_lifecycle(&self, signal: LifecycleSignal) {
        let mut state = lock(&self.state);
        state.lifecycle = state.lifecycle.apply(signal);

        if state.config.debug_enabled {
            let enabled = state.tracking == TrackingState::Enabled;
            match signal {
                LifecycleSignal::Resume => log_block_start!("App Resumed"),
                LifecycleSignal::Suspend => {
                    log_block_start!("App Suspended. Enabled? {enabled}")
                }
                LifecycleSignal::WillResign => {
                    log_block_start!("App Will Resign. Enabled? {enabled}")
                }
            }
        }
    }

    pub fn on_resume(&self) {
        self.handle_lifecycle(LifecycleSignal::Resume);
    }

    pub fn on_suspend(&self) {
        self.handle_lifecycle(LifecycleSignal::Suspend);
    }

    pub fn on_will_resign(&self) {
        self.handle_lifecycle(LifecycleSignal::WillResign);
    }

    pub fn tracking_state(&self) -> TrackingState {
        lock(&self.state).tracking
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        lock(&self.state).lifecycle
    }

    /// Copy of the configuration the next `start` will use.
    pub fn configuration(&self) -> Configuration {
        lock(&self.state).config.clone()
    }

    pub fn registered_consumer(&self) -> Option<CallbackId> {
        self.delivery.registered_id()
    }

    /// Stop tracking, release the source, and wait for queued deliveries.
    ///
    /// Blocks until the source has dropped every event sender it was given.
    pub fn shutdown(self) {
        self.stop();

        let Self {
            source,
            delivery,
            threads,
            ..
        } = self;
        drop(source);
        drop(delivery);

        for thread in threads {
            let _ = thread.join();
        }
    }

    pub fn availability(&self) -> SourceAvailability {
        self.availability
    }

    fn log_availability(&self) {
        if !self.availability.services_enabled {
            log_pipe!();
            log_warning!("Location services are not enabled");
        }
        if !self.availability.significant_change_available {
            log_pipe!();
            log_warning!("Significant location change monitoring is not available");
        }
    }

    fn debug_enabled(&self) -> bool {
        lock(&self.state).config.debug_enabled
    }
}
