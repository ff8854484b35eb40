use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{SignalError, SignalResult};

pub const REFERENCE_FREQUENCY: &str = "reference_frequency";
pub const REFERENCE_AMPLITUDE: &str = "reference_amplitude";
pub const SAMPLE_RATE: &str = "sample_rate";
pub const SIGNAL_TIME_LENGTH: &str = "signal_time_length";
pub const REVOLVING_MANNER: &str = "revolving_manner";
pub const REVOLVING_FREQUENCY: &str = "revolving_frequency";

/// Mandatory keys in canonical order.
/// `revolving_frequency` is only required for the non-arbitrary manner.
pub const MANDATORY_FIELDS: [&str; 6] = [
    REFERENCE_FREQUENCY,
    REFERENCE_AMPLITUDE,
    SAMPLE_RATE,
    SIGNAL_TIME_LENGTH,
    REVOLVING_MANNER,
    REVOLVING_FREQUENCY,
];

/// Inclusive bounds for a numeric metadata field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldLimit {
    pub field: &'static str,
    pub min: f64,
    pub max: f64,
    pub unit: &'static str,
}

impl FieldLimit {
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    pub fn check(&self, value: f64) -> SignalResult<()> {
        if self.contains(value) {
            return Ok(());
        }
        Err(SignalError::OutOfRange {
            field: self.field.to_string(),
            value,
            min: self.min,
            max: self.max,
            unit: self.unit,
        })
    }
}

pub const REFERENCE_FREQUENCY_LIMIT: FieldLimit = FieldLimit {
    field: REFERENCE_FREQUENCY,
    min: 50.0,
    max: 50_000.0,
    unit: "Hz",
};

pub const REFERENCE_AMPLITUDE_LIMIT: FieldLimit = FieldLimit {
    field: REFERENCE_AMPLITUDE,
    min: 0.1,
    max: 110.0,
    unit: "V",
};

pub const SAMPLE_RATE_LIMIT: FieldLimit = FieldLimit {
    field: SAMPLE_RATE,
    min: 100.0,
    max: 1_000_000.0,
    unit: "S/s",
};

pub const SIGNAL_TIME_LENGTH_LIMIT: FieldLimit = FieldLimit {
    field: SIGNAL_TIME_LENGTH,
    min: 1e-4,
    max: 100.0,
    unit: "s",
};

pub const REVOLVING_FREQUENCY_LIMIT: FieldLimit = FieldLimit {
    field: REVOLVING_FREQUENCY,
    min: 0.0,
    max: 25_000.0,
    unit: "Hz",
};

/// Scalar metadata value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl MetadataValue {
    /// Numeric view; integers are widened to f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetadataValue::Int(v) => Some(*v as f64),
            MetadataValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Convert a JSON scalar. Arrays, objects and null have no scalar form.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(MetadataValue::Bool(*b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Some(MetadataValue::Int(i)),
                None => n.as_f64().map(MetadataValue::Float),
            },
            serde_json::Value::String(s) => Some(MetadataValue::Text(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Bool(v) => write!(f, "{}", v),
            MetadataValue::Int(v) => write!(f, "{}", v),
            MetadataValue::Float(v) => write!(f, "{}", v),
            MetadataValue::Text(v) => write!(f, "{}", v),
        }
    }
}

impl From<f64> for MetadataValue {
    fn from(v: f64) -> Self {
        MetadataValue::Float(v)
    }
}

impl From<f32> for MetadataValue {
    fn from(v: f32) -> Self {
        MetadataValue::Float(v as f64)
    }
}

impl From<i64> for MetadataValue {
    fn from(v: i64) -> Self {
        MetadataValue::Int(v)
    }
}

impl From<i32> for MetadataValue {
    fn from(v: i32) -> Self {
        MetadataValue::Int(v as i64)
    }
}

impl From<u32> for MetadataValue {
    fn from(v: u32) -> Self {
        MetadataValue::Int(v as i64)
    }
}

impl From<bool> for MetadataValue {
    fn from(v: bool) -> Self {
        MetadataValue::Bool(v)
    }
}

impl From<&str> for MetadataValue {
    fn from(v: &str) -> Self {
        MetadataValue::Text(v.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(v: String) -> Self {
        MetadataValue::Text(v)
    }
}

impl From<RevolvingManner> for MetadataValue {
    fn from(v: RevolvingManner) -> Self {
        MetadataValue::Text(v.as_str().to_string())
    }
}

/// Whether the rotation frequency behind the signal is fixed and known
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevolvingManner {
    /// Unconstrained rotation; no revolving frequency
    Arbitrary,
    /// Fixed rotation at `revolving_frequency`
    NonArbitrary,
}

impl RevolvingManner {
    pub const ALLOWED: [&'static str; 2] = ["arbitrary", "non_arbitrary"];

    pub fn as_str(&self) -> &'static str {
        match self {
            RevolvingManner::Arbitrary => "arbitrary",
            RevolvingManner::NonArbitrary => "non_arbitrary",
        }
    }

    fn allowed() -> Vec<String> {
        Self::ALLOWED.iter().map(|s| s.to_string()).collect()
    }
}

impl FromStr for RevolvingManner {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "arbitrary" => Ok(RevolvingManner::Arbitrary),
            "non_arbitrary" => Ok(RevolvingManner::NonArbitrary),
            other => Err(SignalError::InvalidChoice {
                field: REVOLVING_MANNER.to_string(),
                value: other.to_string(),
                allowed: Self::allowed(),
            }),
        }
    }
}

impl fmt::Display for RevolvingManner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Acquisition metadata attached to a signal.
///
/// Mandatory fields are typed; anything else lands in `extras`. The manner is
/// kept as raw text so an invalid value surfaces from [`validate`] in rule
/// order rather than at insertion time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, MetadataValue>",
    into = "BTreeMap<String, MetadataValue>"
)]
pub struct SignalMetadata {
    reference_frequency: Option<f64>,
    reference_amplitude: Option<f64>,
    sample_rate: Option<f64>,
    signal_time_length: Option<f64>,
    revolving_manner: Option<String>,
    revolving_frequency: Option<f64>,
    extras: BTreeMap<String, MetadataValue>,
}

impl SignalMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from key/value pairs, applying the type rules of [`set`](Self::set).
    /// No range validation happens here.
    pub fn from_pairs<I, K, V>(pairs: I) -> SignalResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<MetadataValue>,
    {
        let mut metadata = Self::new();
        for (key, value) in pairs {
            metadata.set(key, value)?;
        }
        Ok(metadata)
    }

    /// Insert or overwrite a key. Mandatory numeric fields accept integers or
    /// floats, `revolving_manner` accepts text.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> SignalResult<()> {
        let key = key.into();
        let value = value.into();

        match key.as_str() {
            REFERENCE_FREQUENCY => self.reference_frequency = Some(number(&key, &value)?),
            REFERENCE_AMPLITUDE => self.reference_amplitude = Some(number(&key, &value)?),
            SAMPLE_RATE => self.sample_rate = Some(number(&key, &value)?),
            SIGNAL_TIME_LENGTH => self.signal_time_length = Some(number(&key, &value)?),
            REVOLVING_FREQUENCY => self.revolving_frequency = Some(number(&key, &value)?),
            REVOLVING_MANNER => {
                let text = value.as_str().ok_or_else(|| SignalError::InvalidType {
                    field: key.clone(),
                    expected: "a string",
                })?;
                self.revolving_manner = Some(text.to_string());
            }
            _ => {
                self.extras.insert(key, value);
            }
        }
        Ok(())
    }

    /// Builder form of [`set`](Self::set)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> SignalResult<Self> {
        self.set(key, value)?;
        Ok(self)
    }

    pub fn get(&self, key: &str) -> Option<MetadataValue> {
        match key {
            REFERENCE_FREQUENCY => self.reference_frequency.map(MetadataValue::Float),
            REFERENCE_AMPLITUDE => self.reference_amplitude.map(MetadataValue::Float),
            SAMPLE_RATE => self.sample_rate.map(MetadataValue::Float),
            SIGNAL_TIME_LENGTH => self.signal_time_length.map(MetadataValue::Float),
            REVOLVING_FREQUENCY => self.revolving_frequency.map(MetadataValue::Float),
            REVOLVING_MANNER => self.revolving_manner.clone().map(MetadataValue::Text),
            other => self.extras.get(other).cloned(),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<MetadataValue> {
        let previous = self.get(key);
        match key {
            REFERENCE_FREQUENCY => self.reference_frequency = None,
            REFERENCE_AMPLITUDE => self.reference_amplitude = None,
            SAMPLE_RATE => self.sample_rate = None,
            SIGNAL_TIME_LENGTH => self.signal_time_length = None,
            REVOLVING_FREQUENCY => self.revolving_frequency = None,
            REVOLVING_MANNER => self.revolving_manner = None,
            other => {
                self.extras.remove(other);
            }
        }
        previous
    }

    /// Mandatory keys that are currently absent, in canonical order
    pub fn missing_fields(&self) -> Vec<String> {
        let needs_revolving = self.revolving_manner.as_deref() == Some(RevolvingManner::NonArbitrary.as_str());

        MANDATORY_FIELDS
            .iter()
            .filter(|&&field| field != REVOLVING_FREQUENCY || needs_revolving)
            .filter(|&&field| !self.contains_key(field))
            .map(|field| field.to_string())
            .collect()
    }

    pub fn validate(&self) -> SignalResult<()> {
        validate(self)
    }

    pub fn reference_frequency(&self) -> Option<f64> {
        self.reference_frequency
    }

    pub fn reference_amplitude(&self) -> Option<f64> {
        self.reference_amplitude
    }

    pub fn sample_rate(&self) -> Option<f64> {
        self.sample_rate
    }

    pub fn signal_time_length(&self) -> Option<f64> {
        self.signal_time_length
    }

    /// Parsed manner; `None` when absent or not one of the allowed values
    pub fn revolving_manner(&self) -> Option<RevolvingManner> {
        self.revolving_manner.as_deref().and_then(|s| s.parse().ok())
    }

    pub fn revolving_frequency(&self) -> Option<f64> {
        self.revolving_frequency
    }

    /// Annotations outside the mandatory set
    pub fn extras(&self) -> &BTreeMap<String, MetadataValue> {
        &self.extras
    }

    /// Flat view of every stored key
    pub fn to_map(&self) -> BTreeMap<String, MetadataValue> {
        let mut map = self.extras.clone();
        for field in MANDATORY_FIELDS {
            if let Some(value) = self.get(field) {
                map.insert(field.to_string(), value);
            }
        }
        map
    }
}

impl TryFrom<BTreeMap<String, MetadataValue>> for SignalMetadata {
    type Error = SignalError;

    fn try_from(map: BTreeMap<String, MetadataValue>) -> Result<Self, Self::Error> {
        Self::from_pairs(map)
    }
}

impl From<SignalMetadata> for BTreeMap<String, MetadataValue> {
    fn from(metadata: SignalMetadata) -> Self {
        metadata.to_map()
    }
}

fn number(field: &str, value: &MetadataValue) -> SignalResult<f64> {
    value.as_f64().ok_or_else(|| SignalError::InvalidType {
        field: field.to_string(),
        expected: "a number",
    })
}

fn present<T>(value: Option<T>, field: &str) -> SignalResult<T> {
    value.ok_or_else(|| SignalError::MissingFields(vec![field.to_string()]))
}

/// Full metadata validation: presence first, then every range rule in order.
///
/// Presence failures report all missing keys together. After that the first
/// failing rule wins.
pub fn validate(metadata: &SignalMetadata) -> SignalResult<()> {
    let missing = metadata.missing_fields();
    if !missing.is_empty() {
        return Err(SignalError::MissingFields(missing));
    }

    REFERENCE_FREQUENCY_LIMIT.check(present(metadata.reference_frequency, REFERENCE_FREQUENCY)?)?;
    REFERENCE_AMPLITUDE_LIMIT.check(present(metadata.reference_amplitude, REFERENCE_AMPLITUDE)?)?;
    SAMPLE_RATE_LIMIT.check(present(metadata.sample_rate, SAMPLE_RATE)?)?;
    SIGNAL_TIME_LENGTH_LIMIT.check(present(metadata.signal_time_length, SIGNAL_TIME_LENGTH)?)?;

    let manner: RevolvingManner = present(metadata.revolving_manner.as_deref(), REVOLVING_MANNER)?.parse()?;

    if manner == RevolvingManner::NonArbitrary {
        REVOLVING_FREQUENCY_LIMIT.check(present(metadata.revolving_frequency, REVOLVING_FREQUENCY)?)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_is_inclusive() {
        assert!(SAMPLE_RATE_LIMIT.contains(100.0));
        assert!(SAMPLE_RATE_LIMIT.contains(1_000_000.0));
        assert!(!SAMPLE_RATE_LIMIT.contains(99.999));
        assert!(!SAMPLE_RATE_LIMIT.contains(f64::NAN));
    }

    #[test]
    fn test_manner_parsing() {
        assert_eq!("arbitrary".parse::<RevolvingManner>().unwrap(), RevolvingManner::Arbitrary);
        assert_eq!("non_arbitrary".parse::<RevolvingManner>().unwrap(), RevolvingManner::NonArbitrary);

        let err = "non-arbitrary".parse::<RevolvingManner>().unwrap_err();
        assert_eq!(err.field(), Some(REVOLVING_MANNER));
    }

    #[test]
    fn test_integer_widened_on_set() {
        let metadata = SignalMetadata::new().with(SAMPLE_RATE, 10_000).unwrap();
        assert_eq!(metadata.sample_rate(), Some(10_000.0));
        assert_eq!(metadata.get(SAMPLE_RATE), Some(MetadataValue::Float(10_000.0)));
    }

    #[test]
    fn test_text_rejected_for_numeric_field() {
        let err = SignalMetadata::new().with(REFERENCE_FREQUENCY, "fast").unwrap_err();
        assert_eq!(
            err,
            SignalError::InvalidType {
                field: REFERENCE_FREQUENCY.to_string(),
                expected: "a number",
            }
        );
    }

    #[test]
    fn test_extras_kept_separately() {
        let metadata = SignalMetadata::new().with("operator", "alice").unwrap();
        assert_eq!(metadata.extras().len(), 1);
        assert_eq!(metadata.get("operator"), Some(MetadataValue::from("alice")));
        assert_eq!(metadata.missing_fields().len(), 5);
    }

    #[test]
    fn test_json_map_round_trip() {
        let metadata = SignalMetadata::new()
            .with(REFERENCE_FREQUENCY, 100.0)
            .unwrap()
            .with(REVOLVING_MANNER, "arbitrary")
            .unwrap()
            .with("bench", 3)
            .unwrap();

        let json = serde_json::to_string(&metadata).unwrap();
        let restored: SignalMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, metadata);
    }
}
