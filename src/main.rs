use anyhow::Context;
use sensor_service::config::Config;
use sensor_service::controller::SensorController;
use sensor_service::logging::setup_tracing;
use sensor_service::repository::InMemorySensorRepository;
use sensor_service::service::SensorService;
use sensor_service::web::routes::service_routes;
use sensor_service::web::warp::run_webserver;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    setup_tracing(config.log_level);

    tracing::info!(
        app = sensor_service::APP_NAME.as_str(),
        version = sensor_service::APP_VERSION.as_str(),
        environment = config.environment.as_str(),
        port = config.port,
        "Starting sensor service"
    );
    if config.uses_default_api_key() {
        tracing::warn!("API_KEY is not set, using the default key. Never do this outside of development!");
    }

    let repository = Arc::new(InMemorySensorRepository::with_example_sensors());
    let service = Arc::new(SensorService::new(repository));
    let controller = SensorController::new(service);
    let routes = service_routes(controller, Arc::from(config.api_key.as_str()));

    run_webserver(routes, config.bind_address()).await
}
