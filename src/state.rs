use std::sync::Arc;

use crate::config::Config;
use crate::rate_limit::RelayRateLimiter;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub client: reqwest::Client,
    pub limiter: RelayRateLimiter,
}
