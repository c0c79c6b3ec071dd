//! Single-consumer, keep-alive delivery of fixes and errors.
//!
//! The channel holds at most one registered [`CallbackHandle`]. A push is
//! resolved against whoever is registered at that moment and handed to a
//! dedicated dispatcher thread, so the thread producing events never waits
//! on the consumer. The dispatcher drains a single FIFO queue, which keeps
//! consecutive deliveries in order.
//!
//! With nobody registered a push is dropped on the spot. A consumer whose
//! receiving end has gone away is noticed at send time and the delivery is
//! dropped as well; there is no explicit unregistration.

pub mod payload;

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::common::utils::lock;

pub use payload::{CallbackId, Delivery, FixPayload, Payload};

/// A registered consumer: its identity plus the channel replies go to.
#[derive(Debug, Clone)]
pub struct CallbackHandle {
    id: CallbackId,
    reply: Sender<Delivery>,
}

impl CallbackHandle {
    pub fn new(id: CallbackId, reply: Sender<Delivery>) -> Self {
        Self { id, reply }
    }

    /// Create a handle together with the receiver its deliveries arrive on.
    pub fn channel(id: impl Into<String>) -> (Self, Receiver<Delivery>) {
        let (reply, rx) = mpsc::channel();
        (Self::new(CallbackId::new(id), reply), rx)
    }

    pub fn id(&self) -> &CallbackId {
        &self.id
    }
}

/// Result of a push, for the producer's bookkeeping only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Handed to the dispatcher for the registered consumer.
    Queued,
    /// Nobody was registered; the payload was discarded.
    NoConsumer,
}

struct Dispatch {
    reply: Sender<Delivery>,
    delivery: Delivery,
}

/// Single-slot registration plus the dispatcher queue.
#[derive(Clone)]
pub struct DeliveryChannel {
    slot: Arc<Mutex<Option<CallbackHandle>>>,
    queue: Sender<Dispatch>,
    verbose: Arc<AtomicBool>,
}

impl DeliveryChannel {
    /// Create the channel and spawn its dispatcher thread.
    ///
    /// The dispatcher exits once every clone of the channel is dropped.
    pub fn new() -> Result<(Self, JoinHandle<()>)> {
        let (queue, rx) = mpsc::channel::<Dispatch>();
        let verbose = Arc::new(AtomicBool::new(false));

        let dispatcher = thread::Builder::new()
            .name("locatr-delivery".into())
            .spawn({
                let verbose = Arc::clone(&verbose);
                move || {
                    for dispatch in rx {
                        let callback_id = dispatch.delivery.callback_id.clone();
                        if dispatch.reply.send(dispatch.delivery).is_err()
                            && verbose.load(Ordering::Relaxed)
                        {
                            log_warning!("Consumer {callback_id} is gone, delivery dropped");
                        }
                    }
                }
            })
            .context("Failed to spawn delivery dispatcher")?;

        Ok((
            Self {
                slot: Arc::new(Mutex::new(None)),
                queue,
                verbose,
            },
            dispatcher,
        ))
    }

    /// Toggle debug logging for dropped deliveries.
    pub fn set_verbose(&self, verbose: bool) {
        self.verbose.store(verbose, Ordering::Relaxed);
    }

    /// Register `handle`, replacing any previous consumer.
    ///
    /// Returns the id of the consumer that was replaced, if any.
    pub fn register(&self, handle: CallbackHandle) -> Option<CallbackId> {
        lock(&self.slot).replace(handle).map(|old| old.id)
    }

    pub fn registered_id(&self) -> Option<CallbackId> {
        lock(&self.slot).as_ref().map(|handle| handle.id.clone())
    }

    /// Send `payload` to the registered consumer, keeping its channel open.
    pub fn push(&self, payload: Payload) -> PushOutcome {
        let Some(handle) = lock(&self.slot).clone() else {
            if self.verbose.load(Ordering::Relaxed) {
                log_debug!("No consumer registered, dropping delivery");
            }
            return PushOutcome::NoConsumer;
        };

        let dispatch = Dispatch {
            reply: handle.reply,
            delivery: Delivery {
                callback_id: handle.id,
                payload,
                keep_callback: true,
            },
        };

        // The dispatcher only stops once every channel clone is gone,
        // and this one is still alive
        let _ = self.queue.send(dispatch);
        PushOutcome::Queued
    }
}
