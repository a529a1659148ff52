//! Proxied routes
//!
//! Product and review reads are weight-routed and tagged with the backend
//! that served them. Writes, cart and account calls always go to legacy and
//! come back exactly as legacy answered. Both carry the client's end-to-end
//! request headers.

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Method, Uri, header},
    response::{IntoResponse, Response},
    routing::{any, get, post, put},
};
use bytes::Bytes;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::error::{GatewayError, Result};
use crate::router::{RouteOutcome, TrafficRouter};
use crate::traffic::Backend;
use crate::upstream::UpstreamResponse;

/// Header naming the backend that served a read
pub const X_SOURCE: HeaderName = HeaderName::from_static("x-source");

/// Header present when a read was served by the fallback backend
pub const X_FALLBACK: HeaderName = HeaderName::from_static("x-fallback");

/// Response headers that describe the backend connection, not the payload
const HOP_BY_HOP: [HeaderName; 6] = [
    header::CONNECTION,
    header::CONTENT_LENGTH,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Request headers the gateway sets itself or that only concern the client hop
///
/// `accept-encoding` is dropped so read bodies arrive uncompressed and can be
/// tagged.
const NOT_FORWARDED: [HeaderName; 10] = [
    header::HOST,
    header::CONNECTION,
    header::CONTENT_LENGTH,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::PROXY_AUTHORIZATION,
    header::PROXY_AUTHENTICATE,
    header::ACCEPT_ENCODING,
];

pub fn routes() -> Router<TrafficRouter> {
    Router::new()
        .route("/api/products", get(read_handler).post(write_handler))
        .route(
            "/api/products/{id}",
            get(read_handler).put(write_handler).delete(write_handler),
        )
        .route(
            "/api/products/{id}/reviews",
            get(read_handler).post(write_handler),
        )
        .route("/api/reviews", post(write_handler))
        .route("/api/reviews/{id}", put(write_handler).delete(write_handler))
        .route("/api/cart", any(write_handler))
        .route("/api/cart/{*rest}", any(write_handler))
        .route("/api/login", post(write_handler))
        .route("/api/register", post(write_handler))
}

/// Weight-routed read
async fn read_handler(
    State(router): State<TrafficRouter>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response> {
    let forwarded = forwarded_request_headers(&headers);
    let routed = router.route_read(path_and_query(&uri), &forwarded).await;

    match routed.outcome {
        RouteOutcome::Primary { backend, response } => {
            Ok(annotate(response, backend, false, routed.weight))
        }
        RouteOutcome::Fallback {
            backend, response, ..
        } => Ok(annotate(response, backend, true, routed.weight)),
        RouteOutcome::Unavailable {
            primary,
            primary_error,
            fallback_error,
        } => Err(GatewayError::unavailable(format!(
            "{} {}; {} {}",
            primary,
            primary_error,
            primary.other(),
            fallback_error
        ))),
    }
}

/// Write pinned to legacy
async fn write_handler(
    State(router): State<TrafficRouter>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let forwarded = forwarded_request_headers(&headers);
    let response = router
        .forward_write(method, path_and_query(&uri), forwarded, body)
        .await?;

    Ok((response.status, passthrough_headers(&response.headers), response.body).into_response())
}

fn path_and_query(uri: &Uri) -> &str {
    uri.path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path())
}

/// Build the client response for a served read
///
/// Successful JSON bodies are tagged with routing metadata; anything else is
/// passed through as served. Headers are always set.
pub fn annotate(
    response: UpstreamResponse,
    backend: Backend,
    fallback: bool,
    weight: u8,
) -> Response {
    let mut headers = passthrough_headers(&response.headers);
    let mut body = response.body;

    if response.status.is_success()
        && let Ok(value) = serde_json::from_slice::<Value>(&body)
    {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let tagged = tag_body(value, backend, fallback, weight, &timestamp);
        if let Ok(bytes) = serde_json::to_vec(&tagged) {
            body = Bytes::from(bytes);
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
        }
    }

    headers.insert(X_SOURCE, HeaderValue::from_static(backend.label()));
    if fallback {
        headers.insert(X_FALLBACK, HeaderValue::from_static("true"));
    }

    (response.status, headers, body).into_response()
}

/// Merge routing metadata into a JSON body
///
/// Objects get the fields at top level; any other JSON value is wrapped as
/// `{"data": value, ...}`.
pub fn tag_body(
    value: Value,
    backend: Backend,
    fallback: bool,
    weight: u8,
    timestamp: &str,
) -> Value {
    let mut object = match value {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("data".to_string(), other);
            map
        }
    };

    object.insert("source".to_string(), Value::from(backend.label()));
    object.insert("trafficWeight".to_string(), Value::from(weight));
    object.insert("timestamp".to_string(), Value::from(timestamp));
    if fallback {
        object.insert("fallback".to_string(), Value::Bool(true));
    }
    Value::Object(object)
}

/// Client request headers to send on to a backend
///
/// Everything end-to-end is kept (authorization, cookies, content
/// negotiation, tracing ids); connection-level headers and `host` are not.
pub fn forwarded_request_headers(headers: &HeaderMap) -> HeaderMap {
    let mut out = headers.clone();
    for name in NOT_FORWARDED {
        out.remove(name);
    }
    out.remove("keep-alive");
    out
}

fn passthrough_headers(headers: &HeaderMap) -> HeaderMap {
    let mut out = headers.clone();
    for name in HOP_BY_HOP {
        out.remove(name);
    }
    out
}
