use crate::tools::system;
use crate::web::correlation::CorrelationIdMiddleware;
use crate::web::error::ApiError;
use anyhow::Context;
use bytes::Bytes;
use futures_util::future::BoxFuture;
use hyper::{Body, Request, Server};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;
use tower::{Service, ServiceBuilder};
use warp::http::StatusCode;
use warp::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use warp::http::HeaderValue;
use warp::reject::{InvalidQuery, MethodNotAllowed};
use warp::reply::Response;
use warp::{Filter, Rejection, Reply, reply};

pub fn with_cloneable<C: Clone + Send>(
    value: C,
) -> impl Filter<Extract = (C,), Error = Infallible> + Clone {
    warp::any().map(move || value.clone())
}

/// Reads the request body (up to `max_body_size` bytes) and parses it as JSON.
///
/// The body does not need a `Content-Length` header, chunked bodies are
/// measured after reading. Oversized bodies are rejected as 413. Empty bodies,
/// malformed JSON and JSON which does not fit `T` are all rejected as 422
/// Unprocessable Entity.
pub fn with_body_as_json<T: DeserializeOwned + Send>(
    max_body_size: u64,
) -> impl Filter<Extract = (T,), Error = Rejection> + Clone {
    warp::header::optional::<u64>(CONTENT_LENGTH.as_str())
        .and_then(move |declared_length: Option<u64>| async move {
            match declared_length {
                Some(length) if length > max_body_size => Err(into_rejection(payload_too_large())),
                _ => Ok(()),
            }
        })
        .untuple_one()
        .and(warp::body::bytes())
        .and_then(move |body: Bytes| async move {
            if body.len() as u64 > max_body_size {
                return Err(into_rejection(payload_too_large()));
            }

            decode_json(&body).map_err(into_rejection)
        })
}

fn payload_too_large() -> anyhow::Error {
    ApiError::new(
        StatusCode::PAYLOAD_TOO_LARGE,
        "The given request data is too large",
    )
    .into()
}

pub fn decode_json<T: DeserializeOwned>(body: &[u8]) -> anyhow::Result<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::unprocessable("Empty request body", Vec::new()).into());
    }

    serde_json::from_slice(body).map_err(|err| {
        ApiError::unprocessable("Invalid JSON input", vec![err.to_string()]).into()
    })
}

pub fn into_response<S: Serialize>(result: anyhow::Result<S>) -> Result<Response, Rejection> {
    into_response_with_status(result.map(|data| (StatusCode::OK, data)))
}

pub fn into_response_with_status<S: Serialize>(
    response: anyhow::Result<(StatusCode, S)>,
) -> Result<Response, Rejection> {
    let response = response.and_then(|(status_code, data)| {
        serde_json::to_vec(&data)
            .context("Failed to serialize data")
            .map(|data| (status_code, data))
    });

    match response {
        Ok((status, data)) => {
            let mut res = Response::new(data.into());
            *res.status_mut() = status;
            res.headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            Ok(res)
        }
        Err(err) => Err(into_rejection(err)),
    }
}

/// Converts an error into a rejection.
///
/// Errors carrying an [`ApiError`] keep their status and message. Everything
/// else is logged and reported as an opaque 500.
pub fn into_rejection(err: anyhow::Error) -> Rejection {
    match err.downcast_ref::<ApiError>() {
        Some(api_error) => api_error.clone().into(),
        None => {
            tracing::error!(error = %format!("{:#}", err), "Unexpected error while handling request");
            ApiError::internal().into()
        }
    }
}

fn json_error(err: &ApiError) -> Response {
    reply::with_status(reply::json(err), err.status).into_response()
}

/// Turns rejections into JSON error responses.
pub async fn handle_rejection(err: Rejection) -> Result<Response, Rejection> {
    if let Some(err) = err.find::<ApiError>() {
        Ok(json_error(err))
    } else if let Some(invalid_query) = err.find::<InvalidQuery>() {
        Ok(json_error(&ApiError::unprocessable(
            "Invalid query parameters",
            vec![invalid_query.to_string()],
        )))
    } else if err.find::<MethodNotAllowed>().is_some() {
        Ok(json_error(&ApiError::new(
            StatusCode::METHOD_NOT_ALLOWED,
            "Method Not Allowed",
        )))
    } else if err.is_not_found() {
        Ok(json_error(&ApiError::new(StatusCode::NOT_FOUND, "Not Found")))
    } else {
        Err(err)
    }
}

#[macro_export]
macro_rules! routes {
    [$route:expr] => {
        $route
    };
    [$route:expr, $($rest:expr),+] => {
        warp::Filter::or($route, $crate::routes![$($rest),+])
    };
}

/// Wraps the routes into the service stack: rejection handling, then the
/// correlation id middleware around everything.
pub fn into_service<F>(
    routes: F,
) -> impl Service<
    Request<Body>,
    Response = Response,
    Error = Infallible,
    Future = BoxFuture<'static, Result<Response, Infallible>>,
> + Clone
+ Send
+ 'static
where
    F: Filter + Clone + Send + Sync + 'static,
    F::Extract: Reply,
    F::Error: Into<Rejection> + 'static,
{
    let filter = routes.boxed().recover(handle_rejection);

    ServiceBuilder::new()
        .layer_fn(CorrelationIdMiddleware::new)
        .service(warp::service(filter))
}

pub async fn run_webserver<F>(routes: F, bind_address: SocketAddr) -> anyhow::Result<()>
where
    F: Filter + Clone + Send + Sync + 'static,
    F::Extract: Reply,
    F::Error: Into<Rejection> + 'static,
{
    tracing::info!("Starting server at {}", bind_address);
    system::install_termination_listener();

    let svc = into_service(routes);

    let server = Server::try_bind(&bind_address)
        .with_context(|| format!("Failed to bind HTTP server to {}", bind_address))?
        .serve(hyper::service::make_service_fn(move |_| {
            let svc = svc.clone();
            async move { Ok::<_, Infallible>(svc) }
        }));

    tracing::info!(
        "Running HTTP server at effective address {}",
        server.local_addr()
    );
    server
        .with_graceful_shutdown(system::await_shutdown())
        .await
        .context("HTTP server terminated unexpectedly")?;

    tracing::info!("HTTP Server has been stopped...");
    // Give in-flight requests a moment before the process exits.
    tokio::time::sleep(Duration::from_millis(500)).await;
    tracing::info!("HTTP Server has been terminated.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn api_error(err: anyhow::Error) -> ApiError {
        err.downcast_ref::<ApiError>().unwrap().clone()
    }

    #[test]
    fn decode_json_accepts_objects() {
        let value: Value = decode_json(br#"{"sensor_id": "a"}"#).unwrap();
        assert_eq!(value, json!({"sensor_id": "a"}));
    }

    #[test]
    fn decode_json_rejects_empty_body() {
        let err = api_error(decode_json::<Value>(b"  ").unwrap_err());

        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.detail, "Empty request body");
    }

    #[test]
    fn decode_json_rejects_malformed_input() {
        let err = api_error(decode_json::<Value>(b"{not json").unwrap_err());

        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.detail, "Invalid JSON input");
        assert_eq!(err.errors.len(), 1);
    }

    #[tokio::test]
    async fn oversized_bodies_are_rejected() {
        let filter = with_body_as_json::<Value>(8)
            .map(|value: Value| warp::reply::json(&value))
            .recover(handle_rejection);

        let res = warp::test::request()
            .method("POST")
            .body(r#"{"unit": "lux"}"#)
            .reply(&filter)
            .await;

        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn unexpected_errors_do_not_leak() {
        let route = warp::path!("boom").and_then(|| async {
            Err::<Response, Rejection>(into_rejection(anyhow::anyhow!("disk on fire")))
        });

        let res = warp::test::request()
            .path("/boom")
            .reply(&route.recover(handle_rejection))
            .await;

        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            serde_json::from_slice::<Value>(res.body()).unwrap(),
            json!({"detail": "Internal server error"})
        );
    }

    #[tokio::test]
    async fn unknown_routes_yield_json_not_found() {
        let route = warp::path!("known").map(warp::reply);

        let res = warp::test::request()
            .path("/unknown")
            .reply(&route.recover(handle_rejection))
            .await;

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            serde_json::from_slice::<Value>(res.body()).unwrap(),
            json!({"detail": "Not Found"})
        );
    }
}
