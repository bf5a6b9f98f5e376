use anyhow::{anyhow, Context, Result};
use url::Url;

/// Backend value that selects the offline classifier instead of HTTP.
pub const SIM_BACKEND: &str = "sim";

pub const DEFAULT_BACKEND_URL: &str = "https://iris-project-b4fp.onrender.com/predict";

#[derive(Debug, Clone, PartialEq)]
pub enum Backend {
    Http(Url),
    Simulated,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: Backend,
    pub request_timeout_ms: u64,
    pub cancel_superseded: bool,
    pub sim_latency_ms: (u64, u64),
    pub sqlite_path: String,
    pub health_retries: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let backend_raw =
            std::env::var("BACKEND_URL").unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string());
        let latency_raw = std::env::var("SIM_LATENCY_MS").unwrap_or_else(|_| "20,400".to_string());
        Ok(Self {
            backend: parse_backend(&backend_raw)?,
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(10_000),
            cancel_superseded: std::env::var("CANCEL_SUPERSEDED").map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes")).unwrap_or(false),
            sim_latency_ms: parse_latency(&latency_raw)?,
            sqlite_path: std::env::var("SQLITE_PATH").unwrap_or_else(|_| "./specimens.sqlite".to_string()),
            health_retries: std::env::var("HEALTH_RETRIES").ok().and_then(|v| v.parse().ok()).unwrap_or(3),
        })
    }
}

pub fn parse_backend(raw: &str) -> Result<Backend> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case(SIM_BACKEND) {
        return Ok(Backend::Simulated);
    }
    let url = Url::parse(raw).with_context(|| format!("invalid BACKEND_URL {:?}", raw))?;
    match url.scheme() {
        "http" | "https" => Ok(Backend::Http(url)),
        other => Err(anyhow!("unsupported BACKEND_URL scheme {:?}", other)),
    }
}

/// Parses `min,max` (or a single fixed value) in milliseconds.
pub fn parse_latency(raw: &str) -> Result<(u64, u64)> {
    let mut parts = raw.split(',').map(str::trim);
    let lo: u64 = parts
        .next()
        .unwrap_or_default()
        .parse()
        .with_context(|| format!("invalid SIM_LATENCY_MS {:?}", raw))?;
    let hi: u64 = match parts.next() {
        Some(v) => v.parse().with_context(|| format!("invalid SIM_LATENCY_MS {:?}", raw))?,
        None => lo,
    };
    if parts.next().is_some() || hi < lo {
        return Err(anyhow!("SIM_LATENCY_MS must be `min,max` with min <= max, got {:?}", raw));
    }
    Ok((lo, hi))
}

pub fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis() as u64
}
