pub mod relay;

use axum::Router;
use axum::routing::post;

use crate::state::SharedState;

pub fn relay_routes(path: &str) -> Router<SharedState> {
    Router::new().route(
        path,
        post(relay::relay)
            .options(relay::relay_options)
            .fallback(relay::method_not_allowed),
    )
}
