use serde::Deserialize;
use serde_json::Value;

use super::error::{SignalError, SignalResult};
use super::metadata::{validate, MetadataValue, SignalMetadata};

/// Reference signal pair with its time base and validated metadata.
///
/// A container only exists with metadata that passes [`validate`], and every
/// mutation either keeps it valid or is rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalDataContainer {
    /// In-phase ("SIN") channel
    in_phase: Vec<f64>,

    /// Quadrature ("COS") channel
    quadrature: Vec<f64>,

    /// Sample time stamps in seconds
    time_base: Vec<f64>,

    metadata: SignalMetadata,
}

/// Wire form accepted by [`SignalDataContainer::from_json`]
#[derive(Deserialize)]
struct RawContainer {
    sin: Vec<Value>,
    cos: Vec<Value>,
    t: Vec<Value>,
    #[serde(default)]
    metadata: serde_json::Map<String, Value>,
}

impl SignalDataContainer {
    /// Build a container, converting every sample to f64.
    ///
    /// Sample shape is checked before metadata: equal lengths, finite values,
    /// non-decreasing time base.
    pub fn new<I, Q, T, A, B, C>(
        in_phase: I,
        quadrature: Q,
        time_base: T,
        metadata: SignalMetadata,
    ) -> SignalResult<Self>
    where
        I: IntoIterator<Item = A>,
        Q: IntoIterator<Item = B>,
        T: IntoIterator<Item = C>,
        A: Into<f64>,
        B: Into<f64>,
        C: Into<f64>,
    {
        let in_phase: Vec<f64> = in_phase.into_iter().map(Into::into).collect();
        let quadrature: Vec<f64> = quadrature.into_iter().map(Into::into).collect();
        let time_base: Vec<f64> = time_base.into_iter().map(Into::into).collect();

        check_shape(&in_phase, &quadrature, &time_base)?;
        validate(&metadata)?;

        Ok(Self {
            in_phase,
            quadrature,
            time_base,
            metadata,
        })
    }

    /// Build from a JSON object `{ "sin": [..], "cos": [..], "t": [..], "metadata": {..} }`.
    ///
    /// Null metadata values count as absent.
    pub fn from_json(value: Value) -> SignalResult<Self> {
        let raw: RawContainer = serde_json::from_value(value).map_err(|_| SignalError::InvalidType {
            field: "container".to_string(),
            expected: "an object with sin, cos and t arrays",
        })?;

        let in_phase = samples("SIN", &raw.sin)?;
        let quadrature = samples("COS", &raw.cos)?;
        let time_base = samples("t", &raw.t)?;

        let mut metadata = SignalMetadata::new();
        for (key, value) in &raw.metadata {
            if value.is_null() {
                continue;
            }
            let scalar = MetadataValue::from_json(value).ok_or_else(|| SignalError::InvalidType {
                field: key.clone(),
                expected: "a scalar",
            })?;
            metadata.set(key.as_str(), scalar)?;
        }

        Self::new(in_phase, quadrature, time_base, metadata)
    }

    /// Insert or overwrite a metadata key, then re-run full validation.
    ///
    /// The update is staged on a copy; on failure the container keeps its
    /// previous metadata.
    pub fn add_metadata(&mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> SignalResult<()> {
        let mut candidate = self.metadata.clone();
        candidate.set(key, value)?;
        validate(&candidate)?;
        self.metadata = candidate;
        Ok(())
    }

    /// Stored value for `key`, or `default` when absent
    pub fn get_metadata(&self, key: &str, default: MetadataValue) -> MetadataValue {
        self.metadata.get(key).unwrap_or(default)
    }

    pub fn metadata_value(&self, key: &str) -> Option<MetadataValue> {
        self.metadata.get(key)
    }

    pub fn metadata(&self) -> &SignalMetadata {
        &self.metadata
    }

    pub fn in_phase(&self) -> &[f64] {
        &self.in_phase
    }

    pub fn quadrature(&self) -> &[f64] {
        &self.quadrature
    }

    pub fn time_base(&self) -> &[f64] {
        &self.time_base
    }

    /// Number of samples per channel
    pub fn len(&self) -> usize {
        self.time_base.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_base.is_empty()
    }
}

fn check_shape(in_phase: &[f64], quadrature: &[f64], time_base: &[f64]) -> SignalResult<()> {
    if in_phase.len() != quadrature.len() || in_phase.len() != time_base.len() {
        return Err(SignalError::LengthMismatch {
            in_phase: in_phase.len(),
            quadrature: quadrature.len(),
            time_base: time_base.len(),
        });
    }

    for (channel, data) in [("SIN", in_phase), ("COS", quadrature), ("t", time_base)] {
        if let Some(index) = data.iter().position(|v| !v.is_finite()) {
            return Err(SignalError::InvalidSample { channel, index });
        }
    }

    if let Some(index) = time_base.windows(2).position(|w| w[1] < w[0]) {
        return Err(SignalError::NonMonotonicTimeBase { index: index + 1 });
    }

    Ok(())
}

fn samples(channel: &'static str, values: &[Value]) -> SignalResult<Vec<f64>> {
    values
        .iter()
        .enumerate()
        .map(|(index, v)| v.as_f64().ok_or(SignalError::InvalidSample { channel, index }))
        .collect()
}
