use std::net::IpAddr;
use std::sync::LazyLock;
use std::time::Duration;

use ipnet::IpNet;
use regex::Regex;
use reqwest::Url;

use crate::error::SubmitError;

/// Relay service configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub upstream_url: String,
    pub forms_secret: Option<String>,
    pub host: IpAddr,
    pub port: u16,
    pub relay_path: String,
    pub cors_origins: Vec<String>,
    pub max_body_size: usize,
    pub rate_limit: u32,
    pub rate_window_secs: u64,
    pub trusted_proxies: Vec<IpNet>,
    pub upstream_timeout: Duration,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let upstream_url = env_required("SHEET_SCRIPT_URL")?;
        parse_http_url(&upstream_url).map_err(|e| format!("Invalid SHEET_SCRIPT_URL: {e}"))?;

        let forms_secret = std::env::var("FORMS_SECRET").ok().filter(|s| !s.is_empty());

        let host: IpAddr = env_or("RELAY_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid RELAY_HOST: {e}"))?;

        let port: u16 = env_or("RELAY_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid RELAY_PORT: {e}"))?;

        let relay_path = env_or("RELAY_PATH", "/api/proxy-to-sheet");
        check_relay_path(&relay_path)
            .map_err(|e| format!("Invalid RELAY_PATH '{relay_path}': {e}"))?;

        let cors_origins: Vec<String> = env_or("RELAY_CORS_ORIGINS", "")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_body_size: usize = env_or("RELAY_MAX_BODY_SIZE", "65536")
            .parse()
            .map_err(|e| format!("Invalid RELAY_MAX_BODY_SIZE: {e}"))?;

        let rate_limit: u32 = env_or("RELAY_RATE_LIMIT", "10")
            .parse()
            .map_err(|e| format!("Invalid RELAY_RATE_LIMIT: {e}"))?;

        let rate_window_secs: u64 = env_or("RELAY_RATE_WINDOW_SECS", "60")
            .parse()
            .map_err(|e| format!("Invalid RELAY_RATE_WINDOW_SECS: {e}"))?;

        let trusted_proxies: Vec<IpNet> = env_or("RELAY_TRUSTED_PROXIES", "")
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.trim()
                    .parse()
                    .map_err(|e| format!("Invalid RELAY_TRUSTED_PROXIES entry '{s}': {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let upstream_timeout: u64 = env_or("RELAY_UPSTREAM_TIMEOUT_SECS", "30")
            .parse()
            .map_err(|e| format!("Invalid RELAY_UPSTREAM_TIMEOUT_SECS: {e}"))?;

        let log_level = env_or("RELAY_LOG_LEVEL", "info");

        Ok(Config {
            upstream_url,
            forms_secret,
            host,
            port,
            relay_path,
            cors_origins,
            max_body_size,
            rate_limit,
            rate_window_secs,
            trusted_proxies,
            upstream_timeout: Duration::from_secs(upstream_timeout),
            log_level,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

static RELAY_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(/[A-Za-z0-9._~-]+)+/?$").unwrap());

/// Paths reserved by the service itself.
const RESERVED_PATHS: &[&str] = &["/health"];

/// The relay path must be a plain literal route: no captures, no wildcards,
/// and no clash with the service's own routes.
fn check_relay_path(path: &str) -> Result<(), String> {
    if !RELAY_PATH_RE.is_match(path) {
        return Err("must be a literal path such as /api/proxy-to-sheet".to_string());
    }
    if RESERVED_PATHS.contains(&path.trim_end_matches('/')) {
        return Err("path is reserved".to_string());
    }
    Ok(())
}

fn parse_http_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("unsupported scheme '{other}'")),
    }
}

/// How the record is encoded on the wire. One encoding per service, never mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyEncoding {
    #[default]
    Json,
    Form,
}

/// Settings for the submission transport.
///
/// Built once at startup. The setters exist to finish configuration before
/// the first submission; after that the value is shared read-only.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    endpoint: Option<Url>,
    required_fields: Vec<String>,
    secret: Option<String>,
    pub encoding: BodyEncoding,
    pub timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            required_fields: Vec::new(),
            secret: None,
            encoding: BodyEncoding::Json,
            timeout: Duration::from_secs(30),
        }
    }
}

impl ServiceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// The survey's stock required set.
    pub fn survey_required_fields() -> Vec<String> {
        [
            "nome",
            "idade",
            "genero",
            "cidade",
            "escola",
            "anoEscolar",
            "turno",
            "interesseEnsinoSuperior",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    /// Point the service at a script endpoint or a same-origin relay.
    ///
    /// An invalid URL leaves the service unconfigured.
    pub fn set_script_url(&mut self, url: &str) -> Result<(), SubmitError> {
        match parse_http_url(url) {
            Ok(parsed) => {
                tracing::info!("Remote endpoint configured: {parsed}");
                self.endpoint = Some(parsed);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Invalid remote endpoint URL '{url}': {e}");
                self.endpoint = None;
                Err(SubmitError::Configuration(format!(
                    "Invalid remote endpoint URL: {e}"
                )))
            }
        }
    }

    pub fn with_script_url(mut self, url: &str) -> Result<Self, SubmitError> {
        self.set_script_url(url)?;
        Ok(self)
    }

    pub fn set_required_fields<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_fields = fields.into_iter().map(Into::into).collect();
        tracing::debug!("Required fields: {:?}", self.required_fields);
    }

    pub fn with_required_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_required_fields(fields);
        self
    }

    /// Shared secret sent as a `secret` field on every submission, for relays
    /// started with `FORMS_SECRET`.
    pub fn set_secret(&mut self, secret: impl Into<String>) {
        let secret = secret.into();
        self.secret = (!secret.is_empty()).then_some(secret);
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.set_secret(secret);
        self
    }

    pub fn with_encoding(mut self, encoding: BodyEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> Option<&Url> {
        self.endpoint.as_ref()
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    pub fn required_fields(&self) -> &[String] {
        &self.required_fields
    }

    pub fn secret(&self) -> Option<&str> {
        self.secret.as_deref()
    }
}
