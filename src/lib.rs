//! # locatr
//!
//! Background location tracking with a single-consumer, keep-alive delivery
//! channel.
//!
//! A host configures tracking parameters, registers one consumer, starts and
//! stops continuous tracking and asks for one-off fixes. Fixes and errors
//! from the location source are streamed to whichever consumer is registered
//! when they arrive.
//!
//! ## Architecture
//!
//! - **Core**: `core::Tracker` owns configuration, tracking and lifecycle
//!   state and drives the location source
//! - **Delivery**: `delivery` holds the single registration slot and the FIFO
//!   dispatcher thread
//! - **Sources**: `source` defines the `LocationSource` seam and a track
//!   replaying implementation
//! - **Configuration**: `config` for validation, accuracy/activity mapping and
//!   the TOML options file with hot reload
//! - **Host bridge**: `host` decodes JSON commands and encodes replies
//! - **Infrastructure**: signal handling, logind monitoring, stdin/stdout
//!   transport, debug notifications and logging

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod logger;

pub mod args;
pub mod commands;
pub mod common;
pub mod config;
pub mod core;
pub mod delivery;
pub mod host;
pub mod io;
pub mod notifier;
pub mod source;

pub use crate::config::{ConfigError, Configuration, ConfigureParams};
pub use crate::core::{LifecycleSignal, LifecycleState, Tracker, TrackerParams, TrackingState};
pub use crate::delivery::{CallbackHandle, CallbackId, Delivery, Payload};
