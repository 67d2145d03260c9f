//! The sensor record and the shapes it takes on the wire.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The kind of quantity a sensor measures.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorType {
    Temperature,
    Humidity,
    Motion,
    Pressure,
    Light,
}

impl SensorType {
    pub const ALL: [SensorType; 5] = [
        SensorType::Temperature,
        SensorType::Humidity,
        SensorType::Motion,
        SensorType::Pressure,
        SensorType::Light,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SensorType::Temperature => "temperature",
            SensorType::Humidity => "humidity",
            SensorType::Motion => "motion",
            SensorType::Pressure => "pressure",
            SensorType::Light => "light",
        }
    }
}

impl FromStr for SensorType {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        SensorType::ALL
            .into_iter()
            .find(|sensor_type| sensor_type.as_str() == value)
            .ok_or_else(|| anyhow::anyhow!("Unknown sensor type '{}'", value))
    }
}

impl Display for SensorType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored sensor reading.
///
/// `value` keeps the number exactly as it was received, so an integer reading
/// such as `45` is served back as `45` and not as `45.0`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    pub sensor_id: String,
    #[serde(rename = "type")]
    pub sensor_type: SensorType,
    pub value: Number,
    pub unit: String,
    pub timestamp: String,
}

/// A create request which passed field validation.
///
/// The timestamp is optional, the service assigns one if it is missing.
#[derive(Clone, Debug, PartialEq)]
pub struct NewSensor {
    pub sensor_id: String,
    pub sensor_type: SensorType,
    pub value: Number,
    pub unit: String,
    pub timestamp: Option<String>,
}

impl NewSensor {
    pub fn into_sensor(self, timestamp: String) -> Sensor {
        Sensor {
            sensor_id: self.sensor_id,
            sensor_type: self.sensor_type,
            value: self.value,
            unit: self.unit,
            timestamp,
        }
    }
}

/// The body of `POST /sensors` before any field has been checked.
///
/// Every field is kept as a raw JSON value so that validation can report all
/// problems at once instead of stopping at the first type mismatch.
#[derive(Debug, Default, Deserialize)]
pub struct SensorPayload {
    pub sensor_id: Option<Value>,
    #[serde(rename = "type")]
    pub sensor_type: Option<Value>,
    pub value: Option<Value>,
    pub unit: Option<Value>,
    pub timestamp: Option<Value>,
}

/// Query parameters of `GET /sensors`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct SensorFilter {
    #[serde(rename = "type")]
    pub sensor_type: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl SensorFilter {
    /// The type to filter by, ignoring an empty `type=` parameter.
    pub fn effective_type(&self) -> Option<&str> {
        self.sensor_type.as_deref().filter(|t| !t.is_empty())
    }

    /// The page size, where `0` means "no pagination" just like an absent limit.
    pub fn effective_limit(&self) -> Option<usize> {
        self.limit.filter(|limit| *limit > 0)
    }

    pub fn effective_offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }
}

/// Response body of `GET /sensors`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SensorList {
    pub data: Vec<Sensor>,
    pub count: usize,
}

impl From<Vec<Sensor>> for SensorList {
    fn from(data: Vec<Sensor>) -> Self {
        let count = data.len();
        SensorList { data, count }
    }
}
