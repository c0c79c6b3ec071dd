//! Configure input validation.
//!
//! Turns untrusted `ConfigureParams` (or the host's positional or named
//! arguments) into a `Configuration`. Missing, ill-typed and out-of-range
//! fields are rejected with `ConfigError::InvalidConfiguration`.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use thiserror::Error;

use super::mapping::{resolve_accuracy_tier, resolve_activity_hint};
use super::{Configuration, ConfigureParams};
use crate::common::constants::MILLIS_PER_SECOND;

/// Errors surfaced synchronously to the caller of `Configure`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {field} {reason}")]
    InvalidConfiguration { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidConfiguration {
            field,
            reason: reason.into(),
        }
    }

    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            ConfigError::InvalidConfiguration { field, .. } => field,
        }
    }
}

// Positional layout of the host's configure arguments. Slots 3, 6 and 7
// (fastest interval, notification title and text) belong to other platforms.
const ARG_DISTANCE_FILTER: usize = 0;
const ARG_DESIRED_ACCURACY: usize = 1;
const ARG_INTERVAL: usize = 2;
const ARG_AGGRESSIVE_INTERVAL: usize = 4;
const ARG_DEBUG: usize = 5;
const ARG_ACTIVITY_TYPE: usize = 8;
const ARG_USE_ACTIVITY_DETECTION: usize = 9;

impl ConfigureParams {
    /// Decode the host's positional configure arguments.
    pub fn from_positional(args: &[Value]) -> Result<Self, ConfigError> {
        Self::decode(|index, _| args.get(index))
    }

    /// Decode configure arguments given as an object keyed by field name.
    pub fn from_named(fields: &Map<String, Value>) -> Result<Self, ConfigError> {
        Self::decode(|_, name| fields.get(name))
    }

    fn decode<'a>(
        lookup: impl Fn(usize, &'static str) -> Option<&'a Value>,
    ) -> Result<Self, ConfigError> {
        let field = |index, name| (lookup(index, name), name);

        Ok(Self {
            distance_filter_meters: number_arg(field(
                ARG_DISTANCE_FILTER,
                "distance_filter_meters",
            ))?,
            requested_accuracy_distance: integer_arg(field(
                ARG_DESIRED_ACCURACY,
                "requested_accuracy_distance",
            ))?,
            interval_ms: integer_arg(field(ARG_INTERVAL, "interval_ms"))?,
            aggressive_interval_ms: integer_arg(field(
                ARG_AGGRESSIVE_INTERVAL,
                "aggressive_interval_ms",
            ))?,
            activity_label: string_arg(field(ARG_ACTIVITY_TYPE, "activity_label"))?,
            debug: lookup(ARG_DEBUG, "debug").and_then(Value::as_bool),
            use_activity_detection: bool_arg(field(
                ARG_USE_ACTIVITY_DETECTION,
                "use_activity_detection",
            ))?,
        })
    }
}

/// Deserialize an optional flag, treating anything but a boolean as unset.
pub(crate) fn lenient_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?.as_bool())
}

impl TryFrom<ConfigureParams> for Configuration {
    type Error = ConfigError;

    fn try_from(params: ConfigureParams) -> Result<Self, Self::Error> {
        let distance_filter_meters = params.distance_filter_meters;
        if !distance_filter_meters.is_finite() || distance_filter_meters < 0.0 {
            return Err(ConfigError::invalid(
                "distance_filter_meters",
                format!("must be a non-negative number of meters (got {distance_filter_meters})"),
            ));
        }

        Ok(Configuration {
            distance_filter_meters,
            accuracy_tier: resolve_accuracy_tier(params.requested_accuracy_distance),
            interval_seconds: millis_to_seconds(params.interval_ms, "interval_ms")?,
            aggressive_interval_seconds: millis_to_seconds(
                params.aggressive_interval_ms,
                "aggressive_interval_ms",
            )?,
            activity_hint: resolve_activity_hint(&params.activity_label),
            debug_enabled: params.debug.unwrap_or(false),
            use_activity_detection: params.use_activity_detection,
        })
    }
}

fn millis_to_seconds(millis: i64, field: &'static str) -> Result<f64, ConfigError> {
    if millis < 0 {
        return Err(ConfigError::invalid(
            field,
            format!("must not be negative (got {millis} ms)"),
        ));
    }
    Ok(millis as f64 / MILLIS_PER_SECOND)
}

type Field<'a> = (Option<&'a Value>, &'static str);

fn arg<'a>((value, field): Field<'a>) -> Result<(&'a Value, &'static str), ConfigError> {
    match value {
        None | Some(Value::Null) => Err(ConfigError::invalid(field, "is missing")),
        Some(value) => Ok((value, field)),
    }
}

fn number_arg(field: Field<'_>) -> Result<f64, ConfigError> {
    let (value, field) = arg(field)?;
    value
        .as_f64()
        .ok_or_else(|| ConfigError::invalid(field, format!("must be a number (got {value})")))
}

/// Integers may arrive as floats from dynamically typed hosts; whole values are accepted.
fn integer_arg(field: Field<'_>) -> Result<i64, ConfigError> {
    let (value, field) = arg(field)?;
    if let Some(int) = value.as_i64() {
        return Ok(int);
    }
    match value.as_f64() {
        Some(float) if float.fract() == 0.0 && float.abs() < i64::MAX as f64 => Ok(float as i64),
        _ => Err(ConfigError::invalid(
            field,
            format!("must be an integer (got {value})"),
        )),
    }
}

fn string_arg(field: Field<'_>) -> Result<String, ConfigError> {
    let (value, field) = arg(field)?;
    value
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| ConfigError::invalid(field, format!("must be a string (got {value})")))
}

fn bool_arg(field: Field<'_>) -> Result<bool, ConfigError> {
    let (value, field) = arg(field)?;
    value
        .as_bool()
        .ok_or_else(|| ConfigError::invalid(field, format!("must be a boolean (got {value})")))
}
