pub mod client_ip;
pub mod config;
pub mod error;
pub mod rate_limit;
pub mod routes;
pub mod schools;
pub mod session;
pub mod state;
pub mod submission;
pub mod survey;
pub mod transport;

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderName, HeaderValue};
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::rate_limit::RelayRateLimiter;
use crate::state::{AppState, SharedState};

pub use crate::config::{BodyEncoding, ServiceConfig};
pub use crate::error::SubmitError;
pub use crate::submission::{FieldValue, FormCollector, SubmissionRecord};
pub use crate::survey::{Page, SurveyForm};
pub use crate::transport::{SheetsClient, SubmissionResult, Submitter};

pub fn build_app(config: Config) -> Result<(Router, SharedState), String> {
    let client = reqwest::Client::builder()
        .timeout(config.upstream_timeout)
        .build()
        .map_err(|e| format!("Failed to build HTTP client: {e}"))?;

    match &config.forms_secret {
        Some(_) => tracing::info!("Relay secret check enabled"),
        None => tracing::warn!("FORMS_SECRET not set, relay accepts any caller"),
    }

    let limiter = RelayRateLimiter::new(config.rate_limit, config.rate_window_secs);
    let max_body_size = config.max_body_size;
    let relay_path = config.relay_path.clone();

    let state: SharedState = Arc::new(AppState {
        config,
        client,
        limiter,
    });

    let app = Router::new()
        .merge(routes::relay_routes(&relay_path))
        .route("/health", axum::routing::get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    routes::relay::allow_origin,
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("x-content-type-options"),
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("x-frame-options"),
                    HeaderValue::from_static("DENY"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("referrer-policy"),
                    HeaderValue::from_static("strict-origin-when-cross-origin"),
                ))
                .layer(RequestBodyLimitLayer::new(max_body_size)),
        )
        .with_state(state.clone());

    Ok((app, state))
}

async fn health() -> &'static str {
    "ok"
}
