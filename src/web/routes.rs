//! Route table of the service.
//!
//! | Route | Handler |
//! |---|---|
//! | `GET /health` | static liveness answer |
//! | `GET /sensors?type=&limit=&offset=` | [`SensorController::get_all_sensors`] |
//! | `GET /sensors/{sensor_id}` | [`SensorController::get_sensor_by_id`] |
//! | `POST /sensors` (bearer API key) | [`SensorController::create_sensor`] |

use crate::controller::SensorController;
use crate::model::{SensorFilter, SensorPayload};
use crate::routes;
use crate::web::DEFAULT_MAX_JSON_BODY_SIZE;
use crate::web::auth::with_api_key;
use crate::web::correlation::{CorrelationId, with_correlation_id};
use crate::web::warp::{into_response, into_response_with_status, with_body_as_json, with_cloneable};
use serde_json::json;
use std::sync::Arc;
use warp::filters::BoxedFilter;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

/// Builds every route of the service.
pub fn service_routes(controller: SensorController, api_key: Arc<str>) -> BoxedFilter<(impl Reply,)> {
    routes![
        get_health_route(),
        get_sensors_route(controller.clone()),
        get_sensor_route(controller.clone()),
        create_sensor_route(controller, api_key)
    ]
    .boxed()
}

pub fn get_health_route() -> BoxedFilter<(Response,)> {
    warp::path!("health")
        .and(warp::get())
        .and_then(handle_get_health)
        .boxed()
}

async fn handle_get_health() -> Result<Response, Rejection> {
    Ok(warp::reply::json(&json!({
        "status": "ok",
        "service": "python",
    }))
    .into_response())
}

pub fn get_sensors_route(controller: SensorController) -> BoxedFilter<(Response,)> {
    warp::path!("sensors")
        .and(warp::get())
        .and(with_correlation_id())
        .and(warp::query::<SensorFilter>())
        .and(with_cloneable(controller))
        .and_then(handle_get_sensors)
        .boxed()
}

async fn handle_get_sensors(
    correlation_id: CorrelationId,
    filter: SensorFilter,
    controller: SensorController,
) -> Result<Response, Rejection> {
    into_response(controller.get_all_sensors(&correlation_id, &filter))
}

pub fn get_sensor_route(controller: SensorController) -> BoxedFilter<(Response,)> {
    warp::path!("sensors" / String)
        .and(warp::get())
        .and(with_correlation_id())
        .and(with_cloneable(controller))
        .and_then(handle_get_sensor)
        .boxed()
}

async fn handle_get_sensor(
    sensor_id: String,
    correlation_id: CorrelationId,
    controller: SensorController,
) -> Result<Response, Rejection> {
    into_response(controller.get_sensor_by_id(&correlation_id, &sensor_id))
}

pub fn create_sensor_route(
    controller: SensorController,
    api_key: Arc<str>,
) -> BoxedFilter<(Response,)> {
    warp::path!("sensors")
        .and(warp::post())
        .and(with_api_key(api_key))
        .and(with_correlation_id())
        .and(with_body_as_json::<SensorPayload>(DEFAULT_MAX_JSON_BODY_SIZE))
        .and(with_cloneable(controller))
        .and_then(handle_create_sensor)
        .boxed()
}

async fn handle_create_sensor(
    correlation_id: CorrelationId,
    payload: SensorPayload,
    controller: SensorController,
) -> Result<Response, Rejection> {
    into_response_with_status(controller.create_sensor(&correlation_id, payload))
}
