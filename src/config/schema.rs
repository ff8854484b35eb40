use std::collections::BTreeMap;

use thiserror::Error;

use crate::core::metadata::{
    MetadataValue, RevolvingManner, REFERENCE_AMPLITUDE, REFERENCE_FREQUENCY, REVOLVING_FREQUENCY,
    REVOLVING_MANNER, SAMPLE_RATE, SIGNAL_TIME_LENGTH,
};

/// Configuration rejected at the boundary, before any container is built
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("--{key} is required")]
    MissingRequired { key: String },

    #[error("--{key} is required when --{when_key} is '{when_value}'")]
    ConditionallyRequired {
        key: String,
        when_key: String,
        when_value: String,
    },

    #[error("--{key} must be one of {} (got '{value}')", .allowed.join(", "))]
    InvalidChoice {
        key: String,
        value: String,
        allowed: Vec<String>,
    },

    #[error("--{key} must be {expected}")]
    InvalidType { key: String, expected: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Float,
    Text,
}

/// When a configuration key must be supplied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Always,
    Optional,
    /// Required iff `key` currently holds `equals`
    When {
        key: &'static str,
        equals: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub kind: FieldKind,
    pub requirement: Requirement,
    /// Allowed values for text fields; empty means unrestricted
    pub choices: &'static [&'static str],
}

impl FieldSpec {
    pub const fn float(key: &'static str) -> Self {
        Self {
            key,
            kind: FieldKind::Float,
            requirement: Requirement::Always,
            choices: &[],
        }
    }

    pub const fn choice(key: &'static str, choices: &'static [&'static str]) -> Self {
        Self {
            key,
            kind: FieldKind::Text,
            requirement: Requirement::Always,
            choices,
        }
    }

    pub fn required(mut self, requirement: Requirement) -> Self {
        self.requirement = requirement;
        self
    }

    fn check_value(&self, value: &MetadataValue) -> Result<(), ConfigError> {
        match self.kind {
            FieldKind::Float if value.as_f64().is_none() => Err(ConfigError::InvalidType {
                key: self.key.to_string(),
                expected: "a number",
            }),
            FieldKind::Text => {
                let text = value.as_str().ok_or_else(|| ConfigError::InvalidType {
                    key: self.key.to_string(),
                    expected: "a string",
                })?;
                if !self.choices.is_empty() && !self.choices.contains(&text) {
                    return Err(ConfigError::InvalidChoice {
                        key: self.key.to_string(),
                        value: text.to_string(),
                        allowed: self.choices.iter().map(|c| c.to_string()).collect(),
                    });
                }
                Ok(())
            }
            FieldKind::Float => Ok(()),
        }
    }
}

/// Declarative description of the flat configuration mapping
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigSchema {
    fields: Vec<FieldSpec>,
}

impl ConfigSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// Schema for signal synthesis parameters
    pub fn signal() -> Self {
        Self::new(vec![
            FieldSpec::float(REFERENCE_FREQUENCY),
            FieldSpec::float(REFERENCE_AMPLITUDE),
            FieldSpec::float(SAMPLE_RATE),
            FieldSpec::float(SIGNAL_TIME_LENGTH),
            FieldSpec::choice(REVOLVING_MANNER, &RevolvingManner::ALLOWED),
            FieldSpec::float(REVOLVING_FREQUENCY).required(Requirement::When {
                key: REVOLVING_MANNER,
                equals: "non_arbitrary",
            }),
        ])
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Check types, choices and requirements. Fields are visited in schema
    /// order and the first problem is returned.
    pub fn check(&self, values: &BTreeMap<String, MetadataValue>) -> Result<(), ConfigError> {
        for spec in &self.fields {
            match values.get(spec.key) {
                Some(value) => spec.check_value(value)?,
                None => match spec.requirement {
                    Requirement::Always => {
                        return Err(ConfigError::MissingRequired {
                            key: spec.key.to_string(),
                        })
                    }
                    Requirement::When { key, equals } => {
                        if values.get(key).and_then(MetadataValue::as_str) == Some(equals) {
                            return Err(ConfigError::ConditionallyRequired {
                                key: spec.key.to_string(),
                                when_key: key.to_string(),
                                when_value: equals.to_string(),
                            });
                        }
                    }
                    Requirement::Optional => {}
                },
            }
        }
        Ok(())
    }

    /// Keys the schema does not describe
    pub fn unknown_keys<'a>(&self, values: &'a BTreeMap<String, MetadataValue>) -> Vec<&'a str> {
        values
            .keys()
            .filter(|key| self.field(key).is_none())
            .map(String::as_str)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, MetadataValue)]) -> BTreeMap<String, MetadataValue> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_optional_field_may_be_absent() {
        let schema = ConfigSchema::new(vec![
            FieldSpec::float("gain").required(Requirement::Optional)
        ]);
        assert!(schema.check(&BTreeMap::new()).is_ok());
    }

    #[test]
    fn test_choice_rejects_unknown_text() {
        let schema = ConfigSchema::new(vec![FieldSpec::choice("mode", &["a", "b"])]);
        let err = schema.check(&values(&[("mode", "c".into())])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidChoice { .. }));
    }

    #[test]
    fn test_unknown_keys_listed() {
        let schema = ConfigSchema::signal();
        let map = values(&[("operator", "alice".into()), (SAMPLE_RATE, 100.0.into())]);
        assert_eq!(schema.unknown_keys(&map), vec!["operator"]);
    }
}
