pub mod cli;
pub mod schema;

use std::collections::BTreeMap;

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::metadata::{
    MetadataValue, RevolvingManner, SignalMetadata, REFERENCE_AMPLITUDE, REFERENCE_FREQUENCY,
    REVOLVING_FREQUENCY, REVOLVING_MANNER, SAMPLE_RATE, SIGNAL_TIME_LENGTH,
};
use crate::core::SignalResult;

pub use schema::{ConfigError, ConfigSchema, FieldKind, FieldSpec, Requirement};

/// Signal parameters accepted at the boundary.
///
/// Only presence, types and the manner choice are checked here; engineering
/// limits are enforced by the container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalConfig {
    pub reference_frequency: f64,
    pub reference_amplitude: f64,
    pub sample_rate: f64,
    pub signal_time_length: f64,
    pub revolving_manner: RevolvingManner,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revolving_frequency: Option<f64>,
}

impl SignalConfig {
    /// Build from a flat key/value mapping checked against [`ConfigSchema::signal`].
    /// Unknown keys are logged and ignored.
    pub fn from_map(values: &BTreeMap<String, MetadataValue>) -> Result<Self, ConfigError> {
        let schema = ConfigSchema::signal();
        schema.check(values)?;

        for key in schema.unknown_keys(values) {
            warn!("Ignoring unknown configuration key: {}", key);
        }

        let manner_text = values
            .get(REVOLVING_MANNER)
            .and_then(MetadataValue::as_str)
            .ok_or_else(|| ConfigError::MissingRequired {
                key: REVOLVING_MANNER.to_string(),
            })?;
        let revolving_manner = manner_text.parse::<RevolvingManner>().map_err(|_| ConfigError::InvalidChoice {
            key: REVOLVING_MANNER.to_string(),
            value: manner_text.to_string(),
            allowed: RevolvingManner::ALLOWED.iter().map(|s| s.to_string()).collect(),
        })?;

        Ok(Self {
            reference_frequency: float(values, REFERENCE_FREQUENCY)?,
            reference_amplitude: float(values, REFERENCE_AMPLITUDE)?,
            sample_rate: float(values, SAMPLE_RATE)?,
            signal_time_length: float(values, SIGNAL_TIME_LENGTH)?,
            revolving_manner,
            revolving_frequency: values.get(REVOLVING_FREQUENCY).and_then(MetadataValue::as_f64),
        })
    }

    /// Build from a caller-supplied JSON object. Null values count as absent.
    pub fn from_json(config: Value) -> Result<Self, ConfigError> {
        let object = config.as_object().ok_or_else(|| ConfigError::InvalidType {
            key: "config".to_string(),
            expected: "an object",
        })?;

        let mut values = BTreeMap::new();
        for (key, value) in object {
            if value.is_null() {
                continue;
            }
            let scalar = MetadataValue::from_json(value).ok_or_else(|| ConfigError::InvalidType {
                key: key.clone(),
                expected: "a scalar",
            })?;
            values.insert(key.clone(), scalar);
        }

        Self::from_map(&values)
    }

    /// Mandatory metadata fields for a container built from this config
    pub fn to_metadata(&self) -> SignalResult<SignalMetadata> {
        let mut metadata = SignalMetadata::new()
            .with(REFERENCE_FREQUENCY, self.reference_frequency)?
            .with(REFERENCE_AMPLITUDE, self.reference_amplitude)?
            .with(SAMPLE_RATE, self.sample_rate)?
            .with(SIGNAL_TIME_LENGTH, self.signal_time_length)?
            .with(REVOLVING_MANNER, self.revolving_manner)?;

        if let Some(frequency) = self.revolving_frequency {
            metadata.set(REVOLVING_FREQUENCY, frequency)?;
        }
        Ok(metadata)
    }
}

fn float(values: &BTreeMap<String, MetadataValue>, key: &str) -> Result<f64, ConfigError> {
    values
        .get(key)
        .and_then(MetadataValue::as_f64)
        .ok_or_else(|| ConfigError::MissingRequired { key: key.to_string() })
}
