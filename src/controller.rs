//! Translates service outcomes into HTTP results.
//!
//! Every method runs inside a `sensor_controller` span carrying the request's
//! correlation id. Domain errors become [`ApiError`]s with their status code,
//! unexpected failures are logged and answered with an opaque 500.

use crate::model::{Sensor, SensorFilter, SensorList, SensorPayload};
use crate::service::{MESSAGE_CONFLICT, MESSAGE_NOT_FOUND, SensorService, ServiceError};
use crate::validation::validate_payload;
use crate::web::correlation::CorrelationId;
use crate::web::error::ApiError;
use std::sync::Arc;
use warp::http::StatusCode;

pub const MESSAGE_VALIDATION_FAILED: &str = "Validation failed";

#[derive(Clone)]
pub struct SensorController {
    service: Arc<SensorService>,
}

impl SensorController {
    pub fn new(service: Arc<SensorService>) -> Self {
        SensorController { service }
    }

    pub fn get_all_sensors(
        &self,
        correlation_id: &CorrelationId,
        filter: &SensorFilter,
    ) -> anyhow::Result<SensorList> {
        let _span = controller_span(correlation_id).entered();

        self.service
            .get_all_sensors(filter)
            .map(SensorList::from)
            .map_err(|err| into_api_error(err, "Error fetching sensors"))
    }

    pub fn get_sensor_by_id(
        &self,
        correlation_id: &CorrelationId,
        sensor_id: &str,
    ) -> anyhow::Result<Sensor> {
        let _span = controller_span(correlation_id).entered();

        self.service
            .get_sensor_by_id(sensor_id)
            .map_err(|err| into_api_error(err, "Error fetching sensor"))
    }

    /// Validates the raw body and stores the resulting record.
    ///
    /// Field problems are reported all at once as 422, before the service is
    /// consulted.
    pub fn create_sensor(
        &self,
        correlation_id: &CorrelationId,
        payload: SensorPayload,
    ) -> anyhow::Result<(StatusCode, Sensor)> {
        let _span = controller_span(correlation_id).entered();

        let new_sensor = validate_payload(payload).map_err(|errors| {
            tracing::debug!(errors = ?errors, "Rejected sensor payload");
            anyhow::Error::from(ApiError::unprocessable(MESSAGE_VALIDATION_FAILED, errors))
        })?;

        self.service
            .create_sensor(new_sensor)
            .map(|sensor| (StatusCode::CREATED, sensor))
            .map_err(|err| into_api_error(err, "Error creating sensor"))
    }
}

fn controller_span(correlation_id: &CorrelationId) -> tracing::Span {
    tracing::info_span!("sensor_controller", correlation_id = %correlation_id)
}

fn into_api_error(err: ServiceError, failure_message: &str) -> anyhow::Error {
    let api_error = match err {
        ServiceError::NotFound => ApiError::new(StatusCode::NOT_FOUND, MESSAGE_NOT_FOUND),
        ServiceError::Conflict => ApiError::new(StatusCode::CONFLICT, MESSAGE_CONFLICT),
        ServiceError::InvalidValue(message) => ApiError::new(StatusCode::BAD_REQUEST, message),
        ServiceError::Internal(cause) => {
            tracing::error!(error = %format!("{:#}", cause), "{}", failure_message);
            ApiError::internal()
        }
    };

    api_error.into()
}
