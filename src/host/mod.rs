//! Host command bridge.
//!
//! Decodes the JSON commands a host application sends, maps them onto
//! `Tracker` operations and encodes the replies. Every command carries a
//! `callbackId`; replies are routed back with the same id.
//!
//! ```json
//! {"action":"configure","callbackId":"c1","args":[0,10,5000,1000,2000,true,"","","Fitness",false]}
//! {"action":"registerForLocationUpdates","callbackId":"c2"}
//! {"action":"start","callbackId":"c3"}
//! ```
//!
//! `registerForLocationUpdates` gets no immediate reply. Its id instead
//! receives every later fix and error with `keepCallback: true`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::mpsc::{self, Sender};
use std::thread;

use crate::config::ConfigureParams;
use crate::core::Tracker;
use crate::delivery::{CallbackHandle, CallbackId, Delivery, Payload};

/// Arguments of a `configure` command: the host's positional array or
/// named fields.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ConfigureArgs {
    Positional(Vec<Value>),
    Named(Map<String, Value>),
}

/// A command received from the host.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum HostCommand {
    Configure {
        #[serde(rename = "callbackId")]
        callback_id: CallbackId,
        args: ConfigureArgs,
    },
    RegisterForLocationUpdates {
        #[serde(rename = "callbackId")]
        callback_id: CallbackId,
    },
    RequestCurrentLocation {
        #[serde(rename = "callbackId")]
        callback_id: CallbackId,
    },
    Start {
        #[serde(rename = "callbackId")]
        callback_id: CallbackId,
    },
    Stop {
        #[serde(rename = "callbackId")]
        callback_id: CallbackId,
    },
    GetVersion {
        #[serde(rename = "callbackId")]
        callback_id: CallbackId,
    },
}

impl HostCommand {
    pub fn callback_id(&self) -> &CallbackId {
        match self {
            HostCommand::Configure { callback_id, .. }
            | HostCommand::RegisterForLocationUpdates { callback_id }
            | HostCommand::RequestCurrentLocation { callback_id }
            | HostCommand::Start { callback_id }
            | HostCommand::Stop { callback_id }
            | HostCommand::GetVersion { callback_id } => callback_id,
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            HostCommand::Configure { .. } => "configure",
            HostCommand::RegisterForLocationUpdates { .. } => "registerForLocationUpdates",
            HostCommand::RequestCurrentLocation { .. } => "requestCurrentLocation",
            HostCommand::Start { .. } => "start",
            HostCommand::Stop { .. } => "stop",
            HostCommand::GetVersion { .. } => "getVersion",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatus {
    Ok,
    Error,
}

/// A reply sent back to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostReply {
    pub callback_id: CallbackId,
    pub status: ReplyStatus,
    pub message: Value,
    pub keep_callback: bool,
}

impl HostReply {
    pub fn ok(callback_id: CallbackId) -> Self {
        Self {
            callback_id,
            status: ReplyStatus::Ok,
            message: Value::Null,
            keep_callback: false,
        }
    }

    pub fn ok_with(callback_id: CallbackId, message: impl Into<Value>) -> Self {
        Self {
            message: message.into(),
            ..Self::ok(callback_id)
        }
    }

    pub fn error(callback_id: CallbackId, message: impl Into<String>) -> Self {
        Self {
            callback_id,
            status: ReplyStatus::Error,
            message: Value::String(message.into()),
            keep_callback: false,
        }
    }
}

impl From<Delivery> for HostReply {
    fn from(delivery: Delivery) -> Self {
        let status = if delivery.payload.is_error() {
            ReplyStatus::Error
        } else {
            ReplyStatus::Ok
        };
        let message = match delivery.payload {
            Payload::Error(text) => Value::String(text),
            Payload::Location(fix) => Value::from(fix),
        };

        Self {
            callback_id: delivery.callback_id,
            status,
            message,
            keep_callback: delivery.keep_callback,
        }
    }
}

/// Run `command` against `tracker` and return its immediate reply.
///
/// `registrar` turns a callback id into the handle its deliveries go
/// through; it is only called for `registerForLocationUpdates`, which
/// returns no immediate reply.
pub fn dispatch<R>(tracker: &Tracker, command: HostCommand, registrar: R) -> Option<HostReply>
where
    R: FnOnce(CallbackId) -> Result<CallbackHandle>,
{
    match command {
        HostCommand::Configure { callback_id, args } => {
            let params = match args {
                ConfigureArgs::Positional(values) => ConfigureParams::from_positional(&values),
                ConfigureArgs::Named(fields) => ConfigureParams::from_named(&fields),
            };
            let reply = match params.and_then(|params| tracker.configure(params)) {
                Ok(()) => HostReply::ok(callback_id),
                Err(e) => HostReply::error(callback_id, e.to_string()),
            };
            Some(reply)
        }
        HostCommand::RegisterForLocationUpdates { callback_id } => {
            match registrar(callback_id.clone()) {
                Ok(handle) => {
                    tracker.register_for_updates(handle);
                    None
                }
                Err(e) => Some(HostReply::error(callback_id, format!("{e:#}"))),
            }
        }
        HostCommand::RequestCurrentLocation { callback_id } => {
            tracker.request_current_location();
            Some(HostReply::ok(callback_id))
        }
        HostCommand::Start { callback_id } => {
            tracker.start();
            Some(HostReply::ok(callback_id))
        }
        HostCommand::Stop { callback_id } => {
            tracker.stop();
            Some(HostReply::ok(callback_id))
        }
        HostCommand::GetVersion { callback_id } => {
            Some(HostReply::ok_with(callback_id, Tracker::version()))
        }
    }
}

/// Create a callback handle whose deliveries are forwarded to `replies`.
///
/// The forwarding thread ends once the handle is replaced and every queued
/// delivery has been passed on, or when `replies` is closed.
pub fn forward_deliveries(id: CallbackId, replies: Sender<HostReply>) -> Result<CallbackHandle> {
    let (tx, rx) = mpsc::channel::<Delivery>();

    thread::Builder::new()
        .name(format!("locatr-callback-{id}"))
        .spawn(move || {
            for delivery in rx {
                if replies.send(HostReply::from(delivery)).is_err() {
                    break;
                }
            }
        })
        .context("Failed to spawn callback forwarding thread")?;

    Ok(CallbackHandle::new(id, tx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TrackerParams;
    use crate::delivery::FixPayload;
    use crate::notifier::LogNotifier;
    use crate::source::SimulatedSource;
    use serde_json::json;
    use std::sync::Arc;

    fn test_tracker() -> Tracker {
        Tracker::new(TrackerParams {
            source: Box::new(SimulatedSource::empty()),
            notifier: Arc::new(LogNotifier),
        })
        .unwrap()
    }

    fn configure_command(args: Value) -> HostCommand {
        serde_json::from_value(json!({
            "action": "configure",
            "callbackId": "cfg",
            "args": args,
        }))
        .unwrap()
    }

    fn no_registration(_: CallbackId) -> Result<CallbackHandle> {
        anyhow::bail!("registration not expected")
    }

    #[test]
    fn test_decode_positional_configure() {
        let command: HostCommand = serde_json::from_value(json!({
            "action": "configure",
            "callbackId": "c1",
            "args": [0, 10, 5000, 1000, 2000, true, "", "", "Fitness", false],
        }))
        .unwrap();

        match command {
            HostCommand::Configure {
                callback_id,
                args: ConfigureArgs::Positional(values),
            } => {
                assert_eq!(callback_id.as_str(), "c1");
                assert_eq!(values.len(), 10);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_decode_named_configure() {
        let command: HostCommand = serde_json::from_value(json!({
            "action": "configure",
            "callbackId": "c1",
            "args": {
                "distance_filter_meters": 5.0,
                "requested_accuracy_distance": 100,
                "interval_ms": 5000,
                "aggressive_interval_ms": 2000,
                "activity_label": "Other",
                "use_activity_detection": false,
            },
        }))
        .unwrap();

        match command {
            HostCommand::Configure {
                args: ConfigureArgs::Named(fields),
                ..
            } => {
                let params = ConfigureParams::from_named(&fields).unwrap();
                assert_eq!(params.requested_accuracy_distance, 100);
                assert_eq!(params.debug, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_decode_simple_commands() {
        for action in [
            "registerForLocationUpdates",
            "requestCurrentLocation",
            "start",
            "stop",
            "getVersion",
        ] {
            let command: HostCommand =
                serde_json::from_value(json!({"action": action, "callbackId": "x"})).unwrap();
            assert_eq!(command.action(), action);
            assert_eq!(command.callback_id().as_str(), "x");
        }
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let result: Result<HostCommand, _> =
            serde_json::from_value(json!({"action": "teleport", "callbackId": "x"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_reply_encoding() {
        let reply = HostReply::ok_with(CallbackId::new("v"), "1.0");
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            json!({"callbackId": "v", "status": "ok", "message": "1.0", "keepCallback": false})
        );
    }

    #[test]
    fn test_delivery_becomes_keep_alive_reply() {
        let reply = HostReply::from(Delivery {
            callback_id: CallbackId::new("loc"),
            payload: Payload::Location(FixPayload {
                latitude: 1.0,
                longitude: 2.0,
                accuracy: 3.0,
                timestamp: 4,
                speed: -1.0,
                altitude: 0.0,
                heading: -1.0,
            }),
            keep_callback: true,
        });
        assert_eq!(reply.status, ReplyStatus::Ok);
        assert!(reply.keep_callback);
        assert_eq!(reply.message["accuracy"], json!(3.0));

        let reply = HostReply::from(Delivery {
            callback_id: CallbackId::new("loc"),
            payload: Payload::Error("denied".into()),
            keep_callback: true,
        });
        assert_eq!(reply.status, ReplyStatus::Error);
        assert_eq!(reply.message, json!("denied"));
        assert!(reply.keep_callback);
    }

    #[test]
    fn test_forwarder_converts_deliveries() {
        let (replies_tx, replies_rx) = mpsc::channel();
        let handle = forward_deliveries(CallbackId::new("f"), replies_tx).unwrap();

        let (channel, _dispatcher) = crate::delivery::DeliveryChannel::new().unwrap();
        channel.register(handle);
        channel.push(Payload::Error("boom".into()));

        let reply = replies_rx
            .recv_timeout(std::time::Duration::from_secs(1))
            .unwrap();
        assert_eq!(reply.callback_id.as_str(), "f");
        assert_eq!(reply.status, ReplyStatus::Error);
    }

    #[test]
    fn test_named_configure_with_non_boolean_debug() {
        let tracker = test_tracker();
        let command = configure_command(json!({
            "distance_filter_meters": 0.0,
            "requested_accuracy_distance": 100,
            "interval_ms": 5000,
            "aggressive_interval_ms": 2000,
            "activity_label": "Fitness",
            "debug": "yes",
            "use_activity_detection": false,
        }));

        let reply = dispatch(&tracker, command, no_registration).unwrap();
        assert_eq!(reply.status, ReplyStatus::Ok);
        let config = tracker.configuration();
        assert!(!config.debug_enabled);
        assert_eq!(config.interval_seconds, 5.0);
        tracker.shutdown();
    }

    #[test]
    fn test_named_configure_error_names_field() {
        let tracker = test_tracker();
        let command = configure_command(json!({
            "distance_filter_meters": 0.0,
            "requested_accuracy_distance": 100,
            "interval_ms": "soon",
            "aggressive_interval_ms": 2000,
            "activity_label": "Fitness",
            "use_activity_detection": false,
        }));

        let reply = dispatch(&tracker, command, no_registration).unwrap();
        assert_eq!(reply.status, ReplyStatus::Error);
        assert!(reply.message.as_str().unwrap().contains("interval_ms"));
        tracker.shutdown();
    }
}
