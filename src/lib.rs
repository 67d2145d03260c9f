//! # Sensor Service
//!
//! A small HTTP microservice which stores and serves IoT sensor readings
//! (temperature, humidity, motion, pressure, light) in process memory.
//!
//! A request passes through a fixed pipeline:
//!
//! ```text
//! correlation id middleware -> (auth for writes) -> route -> controller -> service -> repository
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Runtime settings read from the environment
//! - [`logging`] - Tracing setup emitting one JSON object per log line
//! - [`model`] - The sensor record and its wire representations
//! - [`validation`] - Field format checks and per-type value ranges
//! - [`repository`] - In-memory store of sensor records
//! - [`service`] - Business rules on top of the repository
//! - [`controller`] - Maps service outcomes to HTTP status codes
//! - [`web`] - Warp routes, middleware, authentication and the HTTP server
//! - [`tools`] - Id generation, stopwatch and shutdown handling
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `PORT` | HTTP port to listen on | `8000` |
//! | `API_KEY` | Bearer token required for `POST /sensors` | `default-api-key-change-me` |
//! | `LOG_LEVEL` | One of `error`, `warn`, `info`, `debug` | `info` |
//! | `APP_ENV` | Deployment environment label | `development` |
//! | `APP_NAME` | Value of the `service` field in log lines | `sensor-service` |
//! | `APP_VERSION` | Version string | `DEVELOPMENT-SNAPSHOT-VERSION` |
//!
//! ## Feature Flags
//!
//! - `pretty_logs` - Colorful console output for development instead of JSON lines

use std::env;
use std::sync::LazyLock;

/// Runtime configuration.
pub mod config;

/// Logging and tracing infrastructure.
pub mod logging;

/// Sensor records and request/response shapes.
pub mod model;

/// Field and value range validation.
pub mod validation;

/// Storage of sensor records.
pub mod repository;

/// Business rules.
pub mod service;

/// HTTP-level request handling.
pub mod controller;

/// HTTP server, middleware, authentication and routes.
pub mod web;

/// General-purpose utilities and helpers.
pub mod tools;

/// Application name from `APP_NAME` environment variable.
///
/// Emitted as the `service` field of every log line.
pub static APP_NAME: LazyLock<String> =
    LazyLock::new(|| env::var("APP_NAME").unwrap_or("sensor-service".to_string()));

/// Application version from `APP_VERSION` environment variable.
///
/// Typically set during CI/CD builds. Defaults to
/// `"DEVELOPMENT-SNAPSHOT-VERSION"` for local development.
pub static APP_VERSION: LazyLock<String> =
    LazyLock::new(|| env::var("APP_VERSION").unwrap_or("DEVELOPMENT-SNAPSHOT-VERSION".to_string()));
