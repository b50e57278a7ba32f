use std::net::SocketAddr;

use axum::body::{Body, Bytes};
use axum::extract::{ConnectInfo, Request, State};
use axum::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE, ORIGIN};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;

use crate::client_ip;
use crate::config::Config;
use crate::error::AppError;
use crate::state::SharedState;
use crate::submission::parser;

/// Forward the body untouched to the script endpoint and hand back its
/// status and body.
pub async fn relay(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let ip = client_ip::extract(&headers, Some(addr.ip()), &state.config.trusted_proxies);
    state.limiter.check(ip).map_err(|retry_after| {
        tracing::warn!("Relay rate limit hit for {ip}");
        AppError::RateLimited(retry_after)
    })?;

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/json")
        .to_string();

    if let Some(expected) = state.config.forms_secret.as_deref() {
        let provided = submitted_secret(&content_type, &body).await;
        let matches = provided.is_some_and(|s| bool::from(s.as_bytes().ct_eq(expected.as_bytes())));
        if !matches {
            tracing::warn!("Rejected relay request from {ip}: invalid secret");
            return Err(AppError::Forbidden("invalid secret".to_string()));
        }
    }

    tracing::debug!("Relaying {} bytes from {ip}", body.len());

    let upstream = state
        .client
        .post(&state.config.upstream_url)
        .header(CONTENT_TYPE, &content_type)
        .body(body)
        .send()
        .await
        .map_err(|e| AppError::BadGateway(format!("Upstream request failed: {e}")))?;

    let status =
        StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let upstream_type = upstream
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| HeaderValue::from_str(v).ok());
    let bytes = upstream
        .bytes()
        .await
        .map_err(|e| AppError::BadGateway(format!("Upstream body read failed: {e}")))?;

    tracing::info!("Relayed submission from {ip}: upstream answered {status}");

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    if let Some(ct) = upstream_type {
        response.headers_mut().insert(CONTENT_TYPE, ct);
    }

    Ok(response)
}

pub async fn relay_options() -> Response {
    (
        [
            ("Access-Control-Allow-Methods", "POST, OPTIONS"),
            ("Access-Control-Allow-Headers", "Content-Type"),
            ("Access-Control-Max-Age", "86400"),
        ],
        StatusCode::NO_CONTENT,
    )
        .into_response()
}

pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// Stamp `Access-Control-Allow-Origin` on every response, errors included, so
/// a cross-origin caller can always read the status.
pub async fn allow_origin(State(state): State<SharedState>, req: Request, next: Next) -> Response {
    let origin = allowed_origin(&state.config, req.headers());
    let mut response = next.run(req).await;
    if let Some(origin) = origin {
        response
            .headers_mut()
            .insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    }
    response
}

/// `*` when no origins are configured, otherwise the request's origin if listed.
fn allowed_origin(config: &Config, headers: &HeaderMap) -> Option<HeaderValue> {
    if config.cors_origins.is_empty() {
        return Some(HeaderValue::from_static("*"));
    }

    let origin = headers.get(ORIGIN)?.to_str().ok()?;
    config
        .cors_origins
        .iter()
        .any(|allowed| allowed == origin)
        .then(|| HeaderValue::from_str(origin).ok())
        .flatten()
}

async fn submitted_secret(content_type: &str, body: &Bytes) -> Option<String> {
    let value = parser::parse_body(Some(content_type), body.clone()).await.ok()?;
    value.get("secret")?.as_str().map(|s| s.to_string())
}
