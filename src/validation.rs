//! Validation rules for sensor records.
//!
//! Two layers live here:
//!
//! - **Field validation** ([`validate_payload`]) runs at the HTTP boundary before
//!   the service sees any data. It checks presence, JSON types and formats and
//!   reports every problem it finds. Failures are answered with 422.
//! - **Range validation** ([`validate_range`]) is a business rule applied by the
//!   service on creation. It is keyed by (type, unit). Combinations without a
//!   rule, such as a temperature in Kelvin, are accepted unchecked.

use crate::model::{NewSensor, SensorPayload, SensorType};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::{Number, Value};
use std::fmt::{Display, Formatter};
use std::sync::LazyLock;

pub const MIN_SENSOR_ID_LENGTH: usize = 1;
pub const MAX_SENSOR_ID_LENGTH: usize = 100;

static VALID_SENSOR_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_]+$").expect("Invalid regex"));

const DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// `+02:00` and `+0200`.
const OFFSET_FORMATS: [&str; 2] = ["%:z", "%z"];

pub fn is_valid_str(data: &str, min_length: usize, max_length: usize) -> bool {
    let len = data.chars().count();
    len >= min_length && len <= max_length
}

pub fn is_valid_sensor_id(sensor_id: &str) -> bool {
    is_valid_str(sensor_id, MIN_SENSOR_ID_LENGTH, MAX_SENSOR_ID_LENGTH)
        && VALID_SENSOR_ID_REGEX.is_match(sensor_id)
}

/// Determines if the given string is an ISO-8601 date or date-time.
///
/// A trailing `Z` is accepted as UTC offset, as is a numeric offset with or
/// without colon. Date-times without offset, with the time cut down to minutes
/// or hours, and plain dates are accepted as well.
pub fn is_valid_timestamp(timestamp: &str) -> bool {
    if DateTime::parse_from_rfc3339(timestamp).is_ok()
        || NaiveDate::parse_from_str(timestamp, "%Y-%m-%d").is_ok()
    {
        return true;
    }

    let timestamp = match timestamp.strip_suffix('Z') {
        Some(local) => format!("{}+00:00", local),
        None => timestamp.to_string(),
    };

    // chrono needs minutes, so `2026-01-18T14` is checked as `2026-01-18T14:00`.
    is_valid_date_time(&timestamp)
        || (!timestamp.contains(':') && is_valid_date_time(&format!("{}:00", timestamp)))
}

fn is_valid_date_time(timestamp: &str) -> bool {
    DATE_TIME_FORMATS.iter().any(|layout| {
        NaiveDateTime::parse_from_str(timestamp, layout).is_ok()
            || OFFSET_FORMATS.iter().any(|offset| {
                DateTime::parse_from_str(timestamp, &format!("{}{}", layout, offset)).is_ok()
            })
    })
}

/// Checks all fields of a create request and converts it into a [`NewSensor`].
///
/// Returns the list of all violations if any field is missing or malformed.
pub fn validate_payload(payload: SensorPayload) -> Result<NewSensor, Vec<String>> {
    let mut errors = Vec::new();

    let sensor_id = match payload.sensor_id {
        Some(Value::String(sensor_id)) => {
            if !is_valid_sensor_id(&sensor_id) {
                errors.push(sensor_id_violation(&sensor_id));
            }
            Some(sensor_id)
        }
        _ => {
            errors.push("sensor_id is required and must be a string".to_string());
            None
        }
    };

    let sensor_type = match payload
        .sensor_type
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|sensor_type| sensor_type.parse::<SensorType>().ok())
    {
        Some(sensor_type) => Some(sensor_type),
        None => {
            let valid_types = SensorType::ALL.map(|sensor_type| sensor_type.as_str());
            errors.push(format!(
                "type is required and must be one of: {}",
                valid_types.join(", ")
            ));
            None
        }
    };

    let value = match payload.value {
        Some(Value::Number(value)) => Some(value),
        _ => {
            errors.push("value is required and must be a number".to_string());
            None
        }
    };

    let unit = match payload.unit {
        Some(Value::String(unit)) => Some(unit),
        _ => {
            errors.push("unit is required and must be a string".to_string());
            None
        }
    };

    let timestamp = match payload.timestamp {
        None => None,
        Some(Value::String(timestamp)) => {
            if !is_valid_timestamp(&timestamp) {
                errors.push("timestamp must be a valid ISO 8601 date-time string".to_string());
            }
            Some(timestamp)
        }
        Some(_) => {
            errors.push("timestamp must be a string".to_string());
            None
        }
    };

    match (sensor_id, sensor_type, value, unit) {
        (Some(sensor_id), Some(sensor_type), Some(value), Some(unit)) if errors.is_empty() => {
            Ok(NewSensor {
                sensor_id,
                sensor_type,
                value,
                unit,
                timestamp,
            })
        }
        _ => Err(errors),
    }
}

fn sensor_id_violation(sensor_id: &str) -> String {
    if is_valid_str(sensor_id, MIN_SENSOR_ID_LENGTH, MAX_SENSOR_ID_LENGTH) {
        "sensor_id must match pattern: lowercase letters, numbers, and underscores only".to_string()
    } else {
        format!(
            "sensor_id must be between {} and {} characters long",
            MIN_SENSOR_ID_LENGTH, MAX_SENSOR_ID_LENGTH
        )
    }
}

/// The acceptable values for a (type, unit) combination.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Bounds {
    /// Inclusive on both ends.
    Between(f64, f64),
    OneOf(&'static [f64]),
    AtLeast(f64),
}

impl Bounds {
    pub fn accepts(&self, value: f64) -> bool {
        match self {
            Bounds::Between(min, max) => *min <= value && value <= *max,
            Bounds::OneOf(allowed) => allowed.contains(&value),
            Bounds::AtLeast(min) => *min <= value,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RangeRule {
    pub sensor_type: SensorType,
    pub unit: &'static str,
    pub bounds: Bounds,
    pub message: &'static str,
}

pub static RANGE_RULES: [RangeRule; 7] = [
    RangeRule {
        sensor_type: SensorType::Temperature,
        unit: "F",
        bounds: Bounds::Between(-50.0, 150.0),
        message: "Temperature out of valid range (-50 to 150 F)",
    },
    RangeRule {
        sensor_type: SensorType::Temperature,
        unit: "C",
        bounds: Bounds::Between(-45.0, 65.0),
        message: "Temperature out of valid range (-45 to 65 C)",
    },
    RangeRule {
        sensor_type: SensorType::Humidity,
        unit: "%",
        bounds: Bounds::Between(0.0, 100.0),
        message: "Humidity out of valid range (0 to 100%)",
    },
    RangeRule {
        sensor_type: SensorType::Motion,
        unit: "boolean",
        bounds: Bounds::OneOf(&[0.0, 1.0]),
        message: "Motion sensor value must be 0 or 1",
    },
    RangeRule {
        sensor_type: SensorType::Pressure,
        unit: "psi",
        bounds: Bounds::Between(0.0, 200.0),
        message: "Pressure out of valid range (0 to 200 psi)",
    },
    RangeRule {
        sensor_type: SensorType::Pressure,
        unit: "kPa",
        bounds: Bounds::Between(0.0, 1400.0),
        message: "Pressure out of valid range (0 to 1400 kPa)",
    },
    RangeRule {
        sensor_type: SensorType::Light,
        unit: "lux",
        bounds: Bounds::AtLeast(0.0),
        message: "Light value must be non-negative",
    },
];

pub fn find_range_rule(sensor_type: SensorType, unit: &str) -> Option<&'static RangeRule> {
    RANGE_RULES
        .iter()
        .find(|rule| rule.sensor_type == sensor_type && rule.unit == unit)
}

/// A value outside the range permitted for its (type, unit) combination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RangeViolation {
    pub message: String,
}

impl Display for RangeViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for RangeViolation {}

/// Enforces the range rule for the given (type, unit), if there is one.
pub fn validate_range(
    sensor_type: SensorType,
    unit: &str,
    value: &Number,
) -> Result<(), RangeViolation> {
    let Some(rule) = find_range_rule(sensor_type, unit) else {
        return Ok(());
    };

    match value.as_f64() {
        Some(value) if rule.bounds.accepts(value) => Ok(()),
        Some(_) => Err(RangeViolation {
            message: rule.message.to_string(),
        }),
        None => Err(RangeViolation {
            message: format!("{} value must be a finite number", sensor_type),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn number(value: Value) -> Number {
        match value {
            Value::Number(number) => number,
            other => panic!("Not a number: {}", other),
        }
    }

    fn payload(value: Value) -> SensorPayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn sensor_id_must_be_lowercase_alphanumeric() {
        assert!(is_valid_sensor_id("temp_living_room"));
        assert!(is_valid_sensor_id("sensor_42"));
        assert!(!is_valid_sensor_id("Temp"));
        assert!(!is_valid_sensor_id("temp-living"));
        assert!(!is_valid_sensor_id(""));
        assert!(is_valid_sensor_id(&"a".repeat(100)));
        assert!(!is_valid_sensor_id(&"a".repeat(101)));
    }

    #[test]
    fn timestamps_accept_iso_8601_variants() {
        assert!(is_valid_timestamp("2026-01-18T14:30:00Z"));
        assert!(is_valid_timestamp("2026-01-18T14:30:00.123Z"));
        assert!(is_valid_timestamp("2026-01-18T14:30:00+02:00"));
        assert!(is_valid_timestamp("2026-01-18T14:30:00"));
        assert!(is_valid_timestamp("2026-01-18T14:30"));
        assert!(is_valid_timestamp("2026-01-18T14:30Z"));
        assert!(is_valid_timestamp("2026-01-18T14:30+02:00"));
        assert!(is_valid_timestamp("2026-01-18T14:30:00+0200"));
        assert!(is_valid_timestamp("2026-01-18 14:30:00.5-05:00"));
        assert!(is_valid_timestamp("2026-01-18T14"));
        assert!(is_valid_timestamp("2026-01-18"));
        assert!(!is_valid_timestamp("2026-01-18T25"));
        assert!(!is_valid_timestamp("2026-01-18T14:30:00+2"));
        assert!(!is_valid_timestamp("yesterday"));
        assert!(!is_valid_timestamp("2026-13-01T00:00:00Z"));
        assert!(!is_valid_timestamp(""));
    }

    #[test]
    fn valid_payload_is_converted() {
        let sensor = validate_payload(payload(json!({
            "sensor_id": "light_porch",
            "type": "light",
            "value": 500,
            "unit": "lux",
            "timestamp": "2026-01-18T16:00:00Z"
        })))
        .unwrap();

        assert_eq!(sensor.sensor_id, "light_porch");
        assert_eq!(sensor.sensor_type, SensorType::Light);
        assert_eq!(sensor.value.as_f64(), Some(500.0));
        assert_eq!(sensor.timestamp.as_deref(), Some("2026-01-18T16:00:00Z"));
    }

    #[test]
    fn timestamp_is_optional() {
        let sensor = validate_payload(payload(json!({
            "sensor_id": "motion_hall",
            "type": "motion",
            "value": 1,
            "unit": "boolean",
            "timestamp": null
        })))
        .unwrap();

        assert_eq!(sensor.timestamp, None);
    }

    #[test]
    fn all_violations_are_reported() {
        let errors = validate_payload(payload(json!({
            "type": "temperature",
            "value": 70
        })))
        .unwrap_err();

        assert_eq!(
            errors,
            vec![
                "sensor_id is required and must be a string".to_string(),
                "unit is required and must be a string".to_string(),
            ]
        );
    }

    #[test]
    fn wrongly_typed_fields_are_rejected() {
        let errors = validate_payload(payload(json!({
            "sensor_id": "Bad-Id",
            "type": "sound",
            "value": "72",
            "unit": 5,
            "timestamp": "not a date"
        })))
        .unwrap_err();

        assert_eq!(errors.len(), 5);
        assert!(errors[0].starts_with("sensor_id must match pattern"));
        assert!(errors[1].contains("temperature, humidity, motion, pressure, light"));
    }

    #[test]
    fn overlong_sensor_id_is_rejected() {
        let errors = validate_payload(payload(json!({
            "sensor_id": "a".repeat(101),
            "type": "humidity",
            "value": 50,
            "unit": "%"
        })))
        .unwrap_err();

        assert_eq!(errors, vec!["sensor_id must be between 1 and 100 characters long"]);
    }

    #[test]
    fn temperature_ranges_depend_on_unit() {
        let t = SensorType::Temperature;
        assert!(validate_range(t, "F", &number(json!(72.4))).is_ok());
        assert!(validate_range(t, "F", &number(json!(150))).is_ok());
        assert!(validate_range(t, "F", &number(json!(-50))).is_ok());
        assert_eq!(
            validate_range(t, "F", &number(json!(200))).unwrap_err().message,
            "Temperature out of valid range (-50 to 150 F)"
        );
        assert!(validate_range(t, "C", &number(json!(65))).is_ok());
        assert!(validate_range(t, "C", &number(json!(66))).is_err());
        assert!(validate_range(t, "C", &number(json!(-45.5))).is_err());
    }

    #[test]
    fn motion_must_be_zero_or_one() {
        let m = SensorType::Motion;
        assert!(validate_range(m, "boolean", &number(json!(0))).is_ok());
        assert!(validate_range(m, "boolean", &number(json!(1))).is_ok());
        assert!(validate_range(m, "boolean", &number(json!(1.0))).is_ok());
        assert_eq!(
            validate_range(m, "boolean", &number(json!(2))).unwrap_err().message,
            "Motion sensor value must be 0 or 1"
        );
        assert!(validate_range(m, "boolean", &number(json!(0.5))).is_err());
    }

    #[test]
    fn remaining_rules_enforce_their_bounds() {
        assert!(validate_range(SensorType::Humidity, "%", &number(json!(100))).is_ok());
        assert!(validate_range(SensorType::Humidity, "%", &number(json!(-1))).is_err());
        assert!(validate_range(SensorType::Pressure, "psi", &number(json!(14.7))).is_ok());
        assert!(validate_range(SensorType::Pressure, "psi", &number(json!(201))).is_err());
        assert!(validate_range(SensorType::Pressure, "kPa", &number(json!(1400))).is_ok());
        assert!(validate_range(SensorType::Pressure, "kPa", &number(json!(1400.1))).is_err());
        assert!(validate_range(SensorType::Light, "lux", &number(json!(0))).is_ok());
        assert!(validate_range(SensorType::Light, "lux", &number(json!(1e9))).is_ok());
        assert_eq!(
            validate_range(SensorType::Light, "lux", &number(json!(-0.1)))
                .unwrap_err()
                .message,
            "Light value must be non-negative"
        );
    }

    #[test]
    fn unknown_units_are_not_checked() {
        assert!(validate_range(SensorType::Temperature, "K", &number(json!(10000))).is_ok());
        assert!(validate_range(SensorType::Motion, "bool", &number(json!(7))).is_ok());
        assert!(validate_range(SensorType::Humidity, "percent", &number(json!(-3))).is_ok());
    }

    #[test]
    fn every_sensor_type_has_at_least_one_rule() {
        for sensor_type in SensorType::ALL {
            assert!(RANGE_RULES.iter().any(|rule| rule.sensor_type == sensor_type));
        }
    }
}
