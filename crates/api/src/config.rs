use std::ops::RangeInclusive;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Worker loops run inside the API process (default: `0`).
    pub embedded_workers: usize,
    /// Terminal jobs older than this are purged from the broker (default: `168`).
    pub job_retention_hours: i64,
    /// Running jobs without a heartbeat for this long are recovered (default: `300`).
    pub stale_job_secs: u64,
}

/// Upper bound for `JOB_RETENTION_HOURS` (100 years).
pub const MAX_RETENTION_HOURS: i64 = 876_000;

/// Upper bound for `STALE_JOB_SECS` (one week).
pub const MAX_STALE_JOB_SECS: u64 = 604_800;

#[derive(Debug, thiserror::Error)]
#[error("{var} has an invalid value {value:?}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: &'static str,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            cors_origins: vec!["http://localhost:5173".into()],
            request_timeout_secs: 30,
            embedded_workers: 0,
            job_retention_hours: 168,
            stale_job_secs: 300,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `EMBEDDED_WORKERS`     | `0`                        |
    /// | `JOB_RETENTION_HOURS`  | `168`                      |
    /// | `STALE_JOB_SECS`       | `300`                      |
    ///
    /// Unparseable or out-of-range numeric values are an error rather than
    /// silently replaced by the default.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let host = lookup("HOST").unwrap_or(defaults.host);

        let cors_origins = match lookup("CORS_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => defaults.cors_origins,
        };

        Ok(Self {
            host,
            port: parse_var(&lookup, "PORT", defaults.port)?,
            cors_origins,
            request_timeout_secs: parse_var(
                &lookup,
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout_secs,
            )?,
            embedded_workers: parse_var(&lookup, "EMBEDDED_WORKERS", defaults.embedded_workers)?,
            job_retention_hours: parse_bounded(
                &lookup,
                "JOB_RETENTION_HOURS",
                defaults.job_retention_hours,
                1..=MAX_RETENTION_HOURS,
            )?,
            stale_job_secs: parse_bounded(
                &lookup,
                "STALE_JOB_SECS",
                defaults.stale_job_secs,
                1..=MAX_STALE_JOB_SECS,
            )?,
        })
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError {
            var,
            value,
            reason: "not a number",
        }),
        None => Ok(default),
    }
}

fn parse_bounded<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
    range: RangeInclusive<T>,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + ToString,
{
    let value = parse_var(lookup, var, default)?;
    if !range.contains(&value) {
        return Err(ConfigError {
            var,
            value: value.to_string(),
            reason: "out of range",
        });
    }
    Ok(value)
}
