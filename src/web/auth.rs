//! Bearer API key authentication for write routes.

use crate::status_bail;
use crate::web::correlation::{CorrelationId, with_correlation_id};
use crate::web::warp::{into_rejection, with_cloneable};
use std::sync::Arc;
use warp::http::StatusCode;
use warp::{Filter, Rejection, http};

pub const MESSAGE_UNAUTHORIZED: &str = "Unauthorized - Invalid or missing API key";

const SCHEME_BEARER: &str = "Bearer";

/// Admits the request only if it carries `Authorization: Bearer <api_key>`.
///
/// Every failure yields the same 401 response, the actual cause is only logged.
pub fn with_api_key(api_key: Arc<str>) -> impl Filter<Extract = (), Error = Rejection> + Clone {
    warp::any()
        .and(warp::header::optional::<String>(
            http::header::AUTHORIZATION.as_str(),
        ))
        .and(with_correlation_id())
        .and(with_cloneable(api_key))
        .and_then(
            |authorization: Option<String>, correlation_id: CorrelationId, api_key: Arc<str>| async move {
                let _span = tracing::info_span!("auth", correlation_id = %correlation_id).entered();
                verify_api_key(authorization.as_deref(), &api_key).map_err(into_rejection)
            },
        )
        .untuple_one()
}

fn verify_api_key(authorization: Option<&str>, api_key: &str) -> anyhow::Result<()> {
    let Some(authorization) = authorization else {
        tracing::warn!("Authentication failed - missing authorization header");
        status_bail!(StatusCode::UNAUTHORIZED, "{}", MESSAGE_UNAUTHORIZED);
    };

    let token = match authorization.split_once(' ') {
        Some((SCHEME_BEARER, token)) if !token.is_empty() && !token.contains(' ') => token,
        _ => {
            tracing::warn!("Authentication failed - invalid token format");
            status_bail!(StatusCode::UNAUTHORIZED, "{}", MESSAGE_UNAUTHORIZED);
        }
    };

    if token.as_bytes() != api_key.as_bytes() {
        tracing::warn!("Authentication failed - invalid API key");
        status_bail!(StatusCode::UNAUTHORIZED, "{}", MESSAGE_UNAUTHORIZED);
    }

    tracing::info!("Authentication successful");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::error::ApiError;

    fn rejected_with(authorization: Option<&str>) -> ApiError {
        let err = verify_api_key(authorization, "secret-key").unwrap_err();
        err.downcast_ref::<ApiError>().unwrap().clone()
    }

    #[test]
    fn accepts_matching_key() {
        assert!(verify_api_key(Some("Bearer secret-key"), "secret-key").is_ok());
    }

    #[test]
    fn rejects_missing_header() {
        let err = rejected_with(None);
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.detail, MESSAGE_UNAUTHORIZED);
    }

    #[test]
    fn rejects_other_schemes_and_malformed_values() {
        for authorization in [
            "secret-key",
            "Basic secret-key",
            "bearer secret-key",
            "Bearer ",
            "Bearer secret-key extra",
        ] {
            assert_eq!(
                rejected_with(Some(authorization)).status,
                StatusCode::UNAUTHORIZED,
                "{authorization}"
            );
        }
    }

    #[test]
    fn rejects_wrong_key() {
        assert_eq!(rejected_with(Some("Bearer secret-kez")).detail, MESSAGE_UNAUTHORIZED);
        assert_eq!(rejected_with(Some("Bearer secret-key2")).detail, MESSAGE_UNAUTHORIZED);
    }

    #[tokio::test]
    async fn with_api_key_passes_valid_requests() {
        let filter = with_api_key(Arc::from("secret-key"));

        let res = warp::test::request()
            .header("authorization", "Bearer secret-key")
            .filter(&filter)
            .await;

        assert!(res.is_ok());
    }

    #[tokio::test]
    async fn with_api_key_rejects_missing_token() {
        let filter = with_api_key(Arc::from("secret-key"));

        let res = warp::test::request().filter(&filter).await;

        let rejection = res.unwrap_err();
        assert_eq!(
            rejection.find::<ApiError>().unwrap().status,
            StatusCode::UNAUTHORIZED
        );
    }
}
