//! Event pump between the location source and the delivery channel.
//!
//! Runs on its own thread and consumes `SourceEvent`s in arrival order:
//! fixes and errors are forwarded to the registered consumer, pause and
//! resume notices are only logged. Errors never change the tracking state;
//! the pump keeps listening until the source drops its sender.

use anyhow::{Context, Result};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use super::state::TrackerState;
use crate::common::utils::lock;
use crate::delivery::{DeliveryChannel, Payload, PushOutcome};
use crate::notifier::{self, DebugNotifier};
use crate::source::{Fix, SourceError, SourceEvent};

pub(super) struct Coordinator {
    state: Arc<Mutex<TrackerState>>,
    delivery: DeliveryChannel,
    notifier: Arc<dyn DebugNotifier>,
}

impl Coordinator {
    pub(super) fn new(
        state: Arc<Mutex<TrackerState>>,
        delivery: DeliveryChannel,
        notifier: Arc<dyn DebugNotifier>,
    ) -> Self {
        Self {
            state,
            delivery,
            notifier,
        }
    }

    /// Spawn the pump thread. It exits when every event sender is gone.
    pub(super) fn spawn(self, events: Receiver<SourceEvent>) -> Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("locatr-events".into())
            .spawn(move || {
                for event in events {
                    self.handle_event(event);
                }
            })
            .context("Failed to spawn location event thread")
    }

    /// Process one source event. Returns the push outcome for fixes and errors.
    pub(super) fn handle_event(&self, event: SourceEvent) -> Option<PushOutcome> {
        match event {
            SourceEvent::Locations(fixes) => self.on_locations(fixes),
            SourceEvent::Failed(error) => Some(self.on_failure(error)),
            SourceEvent::Paused => {
                if self.debug_enabled() {
                    log_debug!("Location source paused location updates");
                }
                None
            }
            SourceEvent::Resumed => {
                if self.debug_enabled() {
                    log_debug!("Location source resumed location updates");
                }
                None
            }
            SourceEvent::DeferredUpdatesFailed(reason) => {
                if self.debug_enabled() {
                    log_debug!(
                        "Location source failed deferred updates: {}",
                        reason.as_deref().unwrap_or("no reason given")
                    );
                }
                None
            }
        }
    }

    /// Only the most recent fix of a batch is delivered.
    fn on_locations(&self, fixes: Vec<Fix>) -> Option<PushOutcome> {
        let latest = fixes.into_iter().last()?;

        if self.debug_enabled() {
            let message = notifier::fix_message(&latest);
            log_debug!("{message}");
            if let Err(e) = self.notifier.notify(&message) {
                log_warning!("{} notifier failed: {e}", self.notifier.name());
            }
        }

        Some(self.delivery.push(Payload::from(latest)))
    }

    fn on_failure(&self, error: SourceError) -> PushOutcome {
        if self.debug_enabled() {
            log_pipe!();
            log_error!("LOCATION ERROR: {error}");
        }

        self.delivery.push(Payload::from(error))
    }

    fn debug_enabled(&self) -> bool {
        lock(&self.state).config.debug_enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::CallbackHandle;
    use crate::source::SourceErrorKind;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct CountingNotifier {
        calls: AtomicUsize,
    }

    impl DebugNotifier for CountingNotifier {
        fn notify(&self, _text: &str) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn name(&self) -> &'static str {
            "Counting"
        }
    }

    fn fix(timestamp_ms: i64) -> Fix {
        Fix {
            latitude: 1.0,
            longitude: 2.0,
            horizontal_accuracy: 3.0,
            timestamp_ms,
            speed: -1.0,
            altitude: 0.0,
            course: -1.0,
        }
    }

    fn coordinator(debug: bool) -> (Coordinator, Arc<CountingNotifier>, DeliveryChannel) {
        let mut state = TrackerState::default();
        state.config.debug_enabled = debug;
        let (delivery, _dispatcher) = DeliveryChannel::new().unwrap();
        let notifier = Arc::new(CountingNotifier::default());
        let coordinator = Coordinator::new(
            Arc::new(Mutex::new(state)),
            delivery.clone(),
            notifier.clone(),
        );
        (coordinator, notifier, delivery)
    }

    #[test]
    fn test_batch_delivers_latest_fix_only() {
        let (coordinator, _notifier, delivery) = coordinator(false);
        let (handle, rx) = CallbackHandle::channel("cb");
        delivery.register(handle);

        let outcome = coordinator.handle_event(SourceEvent::Locations(vec![fix(1), fix(2), fix(3)]));
        assert_eq!(outcome, Some(PushOutcome::Queued));

        let delivery = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        match delivery.payload {
            Payload::Location(payload) => assert_eq!(payload.timestamp, 3),
            other => panic!("unexpected payload {other:?}"),
        }
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn test_empty_batch_is_ignored() {
        let (coordinator, notifier, _delivery) = coordinator(true);
        assert_eq!(coordinator.handle_event(SourceEvent::Locations(Vec::new())), None);
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_notifier_only_called_in_debug() {
        let (quiet, quiet_notifier, _d1) = coordinator(false);
        quiet.handle_event(SourceEvent::Locations(vec![fix(1)]));
        assert_eq!(quiet_notifier.calls.load(Ordering::SeqCst), 0);

        let (verbose, verbose_notifier, _d2) = coordinator(true);
        verbose.handle_event(SourceEvent::Locations(vec![fix(1)]));
        assert_eq!(verbose_notifier.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_errors_are_forwarded_as_error_payloads() {
        let (coordinator, _notifier, delivery) = coordinator(false);
        let (handle, rx) = CallbackHandle::channel("cb");
        delivery.register(handle);

        coordinator.handle_event(SourceEvent::Failed(SourceError::new(
            SourceErrorKind::Denied,
            "denied",
        )));

        let delivery = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(delivery.payload, Payload::Error("denied".to_string()));
        assert!(delivery.keep_callback);
    }

    #[test]
    fn test_pause_and_resume_deliver_nothing() {
        let (coordinator, _notifier, delivery) = coordinator(true);
        let (handle, rx) = CallbackHandle::channel("cb");
        delivery.register(handle);

        assert_eq!(coordinator.handle_event(SourceEvent::Paused), None);
        assert_eq!(coordinator.handle_event(SourceEvent::Resumed), None);
        assert_eq!(
            coordinator.handle_event(SourceEvent::DeferredUpdatesFailed(None)),
            None
        );
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn test_without_consumer_pushes_are_dropped() {
        let (coordinator, _notifier, _delivery) = coordinator(false);
        assert_eq!(
            coordinator.handle_event(SourceEvent::Locations(vec![fix(1)])),
            Some(PushOutcome::NoConsumer)
        );
    }
}
