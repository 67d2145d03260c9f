//! HTTP surface of the service, built on warp.

use bytesize::KB;

pub mod auth;
pub mod correlation;
pub mod error;
pub mod routes;
pub mod warp;

/// Upper bound for JSON request bodies.
pub const DEFAULT_MAX_JSON_BODY_SIZE: u64 = 64 * KB;
