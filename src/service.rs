//! Business rules for sensor records.
//!
//! The service filters and paginates listings, rejects duplicate ids, assigns
//! timestamps and enforces the value ranges from [`crate::validation`]. It knows
//! nothing about HTTP, its outcomes are mapped to status codes by the controller.

use crate::model::{NewSensor, Sensor, SensorFilter};
use crate::repository::SensorRepository;
use crate::validation::validate_range;
use chrono::{SecondsFormat, Utc};
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub const MESSAGE_NOT_FOUND: &str = "Sensor not found";
pub const MESSAGE_CONFLICT: &str = "Sensor already exists";

#[derive(Debug)]
pub enum ServiceError {
    /// No record exists for the requested id.
    NotFound,
    /// A record with the given id already exists.
    Conflict,
    /// The record violates a business rule, such as a value range.
    InvalidValue(String),
    /// Anything unexpected, e.g. an unavailable store.
    Internal(anyhow::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::NotFound => f.write_str(MESSAGE_NOT_FOUND),
            ServiceError::Conflict => f.write_str(MESSAGE_CONFLICT),
            ServiceError::InvalidValue(message) => f.write_str(message),
            ServiceError::Internal(err) => write!(f, "{:#}", err),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<anyhow::Error> for ServiceError {
    fn from(err: anyhow::Error) -> Self {
        ServiceError::Internal(err)
    }
}

/// Returns the current UTC time as ISO-8601 string with a `Z` suffix.
pub fn current_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Clone)]
pub struct SensorService {
    repository: Arc<dyn SensorRepository>,
}

impl SensorService {
    pub fn new(repository: Arc<dyn SensorRepository>) -> Self {
        SensorService { repository }
    }

    /// Lists all records, optionally restricted to a type and paginated.
    ///
    /// Pagination only applies if a non-zero `limit` is given, in which case
    /// `offset` (default 0) records are skipped first.
    pub fn get_all_sensors(&self, filter: &SensorFilter) -> ServiceResult<Vec<Sensor>> {
        tracing::info!(
            sensor_type = filter.sensor_type.as_deref(),
            limit = filter.limit,
            offset = filter.offset,
            "Fetching all sensors"
        );

        let mut sensors = self.repository.find_all()?;

        if let Some(sensor_type) = filter.effective_type() {
            sensors.retain(|sensor| sensor.sensor_type.as_str() == sensor_type);
        }

        if let Some(limit) = filter.effective_limit() {
            sensors = sensors
                .into_iter()
                .skip(filter.effective_offset())
                .take(limit)
                .collect();
        }

        Ok(sensors)
    }

    pub fn get_sensor_by_id(&self, sensor_id: &str) -> ServiceResult<Sensor> {
        tracing::info!(sensor_id, "Fetching sensor");

        match self.repository.find_by_id(sensor_id)? {
            Some(sensor) => Ok(sensor),
            None => {
                tracing::warn!(sensor_id, "{}", MESSAGE_NOT_FOUND);
                Err(ServiceError::NotFound)
            }
        }
    }

    /// Stores a new record.
    ///
    /// Fails with [`ServiceError::Conflict`] if the id is taken and with
    /// [`ServiceError::InvalidValue`] if the value is out of range. A missing
    /// or empty timestamp is replaced by the current time.
    pub fn create_sensor(&self, new_sensor: NewSensor) -> ServiceResult<Sensor> {
        let sensor_id = new_sensor.sensor_id.clone();
        tracing::info!(sensor_id = sensor_id.as_str(), "Creating sensor");

        if self.repository.exists(&sensor_id)? {
            return Err(self.conflict(&sensor_id));
        }

        let timestamp = match &new_sensor.timestamp {
            Some(timestamp) if !timestamp.is_empty() => timestamp.clone(),
            _ => current_timestamp(),
        };

        validate_range(new_sensor.sensor_type, &new_sensor.unit, &new_sensor.value).map_err(
            |violation| {
                tracing::warn!(
                    sensor_id = sensor_id.as_str(),
                    reason = %violation,
                    "Rejected sensor value"
                );
                ServiceError::InvalidValue(violation.message)
            },
        )?;

        match self
            .repository
            .insert_if_absent(new_sensor.into_sensor(timestamp))?
        {
            Some(sensor) => Ok(sensor),
            None => Err(self.conflict(&sensor_id)),
        }
    }

    fn conflict(&self, sensor_id: &str) -> ServiceError {
        tracing::warn!(sensor_id, "{}", MESSAGE_CONFLICT);
        ServiceError::Conflict
    }
}
