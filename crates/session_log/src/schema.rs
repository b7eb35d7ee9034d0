use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::SessionLogError;

/// Experiment name stamped into every header unless the caller overrides it.
pub const DEFAULT_EXPERIMENT_NAME: &str = "shape-dependent-tracking-2025";

/// Immutable prefix of a session document, written once at open time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionHeader {
    pub participant_id: String,
    pub experiment_name: String,
    pub start_time: String,
}

impl SessionHeader {
    #[must_use]
    pub fn new(
        participant_id: impl Into<String>,
        experiment_name: impl Into<String>,
        start_time: impl Into<String>,
    ) -> Self {
        Self {
            participant_id: participant_id.into(),
            experiment_name: experiment_name.into(),
            start_time: start_time.into(),
        }
    }

    /// Header stamped with the current UTC time.
    pub fn starting_now(
        participant_id: impl Into<String>,
        experiment_name: impl Into<String>,
    ) -> Result<Self, SessionLogError> {
        let start_time = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(SessionLogError::ClockFormat)?;
        Ok(Self::new(participant_id, experiment_name, start_time))
    }
}

/// Scalar stored under one sample field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl SampleValue {
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            Self::Text(_) => None,
        }
    }

    /// NaN and infinities have no JSON number form.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        match self {
            Self::Float(value) => value.is_finite(),
            Self::Integer(_) | Self::Text(_) => true,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl From<i64> for SampleValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for SampleValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for SampleValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for SampleValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<f32> for SampleValue {
    fn from(value: f32) -> Self {
        Self::Float(f64::from(value))
    }
}

impl From<String> for SampleValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for SampleValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

/// One measurement: field name to scalar. No schema is shared across samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sample(BTreeMap<String, SampleValue>);

impl Sample {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<SampleValue>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(
        &mut self,
        field: impl Into<String>,
        value: impl Into<SampleValue>,
    ) -> Option<SampleValue> {
        self.0.insert(field.into(), value.into())
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&SampleValue> {
        self.0.get(field)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First field whose value cannot be written as a JSON scalar.
    #[must_use]
    pub fn non_finite_field(&self) -> Option<&str> {
        self.iter()
            .find(|(_, value)| !value.is_finite())
            .map(|(field, _)| field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SampleValue)> {
        self.0.iter().map(|(field, value)| (field.as_str(), value))
    }
}

impl<K, V> FromIterator<(K, V)> for Sample
where
    K: Into<String>,
    V: Into<SampleValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(field, value)| (field.into(), value.into()))
                .collect(),
        )
    }
}

/// A finished section as it appears in a closed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SectionRecord {
    pub trial_num: String,
    pub trial_info: String,
    pub data: Vec<Sample>,
}

impl SectionRecord {
    /// Numeric trial index; `trial_num` is stored as a quoted decimal.
    #[must_use]
    pub fn index(&self) -> Option<u32> {
        self.trial_num.parse().ok()
    }
}

/// A closed session document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionDocument {
    pub pid: String,
    pub exp: String,
    pub start_time: String,
    pub data: Vec<SectionRecord>,
}

impl SessionDocument {
    #[must_use]
    pub fn header(&self) -> SessionHeader {
        SessionHeader::new(&self.pid, &self.exp, &self.start_time)
    }
}
