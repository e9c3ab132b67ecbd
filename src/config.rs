//! Configuration module for the form relay.

use std::{path::PathBuf, str::FromStr, time::Duration};

use anyhow::{Context, anyhow};
use tracing::Level;

/// Deployment environment, controls the default allowed CORS origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Origin the browser forms are served from.
    pub fn default_origin(self) -> &'static str {
        match self {
            Environment::Development => "http://localhost:3000",
            Environment::Production => "https://cohesionafrica.com",
        }
    }
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(anyhow!("unknown environment `{other}`")),
        }
    }
}

/// Which mail transport the dispatcher is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Smtp,
    File,
    Stub,
}

impl FromStr for TransportKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "smtp" => Ok(TransportKind::Smtp),
            "file" => Ok(TransportKind::File),
            "stub" => Ok(TransportKind::Stub),
            other => Err(anyhow!("unknown transport `{other}` (expected smtp, file or stub)")),
        }
    }
}

/// Struct containing all configuration options.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub log_to_file: bool,
    pub log_to_stdout: bool,
    pub log_level: Level,
    pub log_dir: PathBuf,
    pub log_file: String,
    pub listen_addr: String,
    pub listen_port: u16,
    pub environment: Environment,
    pub cors_allow_origin: Option<String>,
    pub transport: TransportKind,
    pub outbox_dir: PathBuf,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_secure: bool,
    pub smtp_username: String,
    pub smtp_password: String,
    pub smtp_timeout: Duration,
    pub smtp_verify_on_start: bool,
    pub mail_from: String,
    pub mail_to: String,
}

/// # ApiConfig::default()
/// Populated with default values for all configuration options.
/// These defaults are overridden by environment variables in [`ApiConfig::from_env`].
/// > Boolean and enum values are case-insensitive.
/// # Environment Variables:
/// |Variable|Description|
/// |:------:|:---------:|
/// |`LOG_LEVEL`|Log level (DEBUG, INFO, WARN, ERROR), `RUST_LOG` wins when set|
/// |`LOG_TO_FILE`|Whether to log to file (true/false)|
/// |`LOG_TO_STDOUT`|Whether to log to stdout (true/false)|
/// |`LOG_DIR`|Directory to log to|
/// |`LOG_FILE`|File to log to (relative to `LOG_DIR`)|
/// |`LISTEN_ADDR`|Address to bind to (e.g. `127.0.0.1`)|
/// |`LISTEN_PORT`|Port to bind to (e.g. `8080`)|
/// |`APP_ENV`|`development` or `production`|
/// |`CORS_ALLOW_ORIGIN`|Overrides the per-environment allowed origin|
/// |`MAIL_TRANSPORT`|`smtp`, `file` or `stub`|
/// |`OUTBOX_DIR`|Directory to store emails when using `file` transport|
/// |`SMTP_HOST`|SMTP server hostname (e.g. `smtp.example.com`)|
/// |`SMTP_PORT`|SMTP server port (e.g. `465`)|
/// |`SMTP_SECURE`|Implicit TLS when true, STARTTLS when false|
/// |`SMTP_USERNAME`|SMTP username for authentication|
/// |`SMTP_PASSWORD`|SMTP password for authentication|
/// |`SMTP_TIMEOUT_SECS`|Upper bound for a single send|
/// |`SMTP_VERIFY_ON_START`|Probe the SMTP server at start-up (true/false)|
/// |`MAIL_FROM`|Sender address (e.g. `Cohesion Africa <noreply@cohesionafrica.com>`)|
/// |`MAIL_TO`|Internal inbox receiving registrations and inquiries|
///
/// --------------------------------------------------------------------
/// ## Log defaults:
/// |`log_file`       |`log_dir` |`log_to_file`|`log_to_stdout`|`log_level`|
/// |:---------------:|:--------:|:-----------:|:-------------:|:---------:|
/// |`form-relay.log` |`logs`    |`true`       |`true`         |`INFO`     |
/// --------------------------------------------------------------------
/// ## App defaults:
/// |`listen_addr`|`listen_port`|`environment`|`cors_allow_origin`|
/// |:-----------:|:-----------:|:-----------:|:-----------------:|
/// |`127.0.0.1`  |`8080`       |`production` |none               |
/// --------------------------------------------------------------------
/// ## SMTP defaults:
/// |`smtp_host`|`smtp_port`|`smtp_secure`|`smtp_timeout`|`smtp_verify_on_start`|
/// |:---------:|:---------:|:-----------:|:------------:|:--------------------:|
/// |`localhost`|`465`      |`true`       |`15s`         |`false`               |
/// --------------------------------------------------------------------
/// ## Mail defaults:
/// |       `mail_from`|       `mail_to`|`transport`|`outbox_dir`|
/// |:----------------:|:--------------:|:---------:|:----------:|
/// |`noreply@localhost`|`inbox@localhost`|    `smtp`|    `outbox`|
/// --------------------------------------------------------------------
impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            log_to_file: true,
            log_to_stdout: true,
            log_level: Level::INFO,
            log_dir: PathBuf::from("logs"),
            log_file: "form-relay.log".into(),
            listen_addr: "127.0.0.1".into(),
            listen_port: 8080,
            environment: Environment::Production,
            cors_allow_origin: None,
            transport: TransportKind::Smtp,
            outbox_dir: PathBuf::from("outbox"),
            smtp_host: "localhost".into(),
            smtp_port: 465,
            smtp_secure: true,
            smtp_username: String::new(),
            smtp_password: String::new(),
            smtp_timeout: Duration::from_secs(15),
            smtp_verify_on_start: false,
            mail_from: "noreply@localhost".into(),
            mail_to: "inbox@localhost".into(),
        }
    }
}

impl ApiConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup, falling back to defaults.
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut cfg = ApiConfig::default();

        if let Some(v) = get("LOG_LEVEL") {
            cfg.log_level = parse("LOG_LEVEL", &v)?;
        }
        if let Some(v) = get("LOG_TO_FILE") {
            cfg.log_to_file = parse_bool("LOG_TO_FILE", &v)?;
        }
        if let Some(v) = get("LOG_TO_STDOUT") {
            cfg.log_to_stdout = parse_bool("LOG_TO_STDOUT", &v)?;
        }
        if let Some(v) = get("LOG_DIR") {
            cfg.log_dir = PathBuf::from(v);
        }
        if let Some(v) = get("LOG_FILE") {
            cfg.log_file = v;
        }
        if let Some(v) = get("LISTEN_ADDR") {
            cfg.listen_addr = v;
        }
        if let Some(v) = get("LISTEN_PORT") {
            cfg.listen_port = parse("LISTEN_PORT", &v)?;
        }
        if let Some(v) = get("APP_ENV") {
            cfg.environment = parse("APP_ENV", &v)?;
        }
        cfg.cors_allow_origin = get("CORS_ALLOW_ORIGIN").map(|v| v.trim().to_string());
        if let Some(v) = get("MAIL_TRANSPORT") {
            cfg.transport = parse("MAIL_TRANSPORT", &v)?;
        }
        if let Some(v) = get("OUTBOX_DIR") {
            cfg.outbox_dir = PathBuf::from(v);
        }
        if let Some(v) = get("SMTP_HOST") {
            cfg.smtp_host = v;
        }
        if let Some(v) = get("SMTP_PORT") {
            cfg.smtp_port = parse("SMTP_PORT", &v)?;
        }
        if let Some(v) = get("SMTP_SECURE") {
            cfg.smtp_secure = parse_bool("SMTP_SECURE", &v)?;
        }
        if let Some(v) = get("SMTP_USERNAME") {
            cfg.smtp_username = v;
        }
        if let Some(v) = get("SMTP_PASSWORD") {
            cfg.smtp_password = v;
        }
        if let Some(v) = get("SMTP_TIMEOUT_SECS") {
            let secs: u64 = parse("SMTP_TIMEOUT_SECS", &v)?;
            if secs == 0 {
                return Err(anyhow!("SMTP_TIMEOUT_SECS must be greater than zero"));
            }
            cfg.smtp_timeout = Duration::from_secs(secs);
        }
        if let Some(v) = get("SMTP_VERIFY_ON_START") {
            cfg.smtp_verify_on_start = parse_bool("SMTP_VERIFY_ON_START", &v)?;
        }
        if let Some(v) = get("MAIL_FROM") {
            cfg.mail_from = v;
        }
        if let Some(v) = get("MAIL_TO") {
            cfg.mail_to = v;
        }
        Ok(cfg)
    }

    /// Origin allowed to call the API: the explicit override, else the environment default.
    pub fn allowed_origin(&self) -> &str {
        self.cors_allow_origin
            .as_deref()
            .unwrap_or_else(|| self.environment.default_origin())
    }

    /// SMTP credentials are only needed by the `smtp` transport.
    pub fn missing_smtp_credentials(&self) -> bool {
        self.transport == TransportKind::Smtp
            && (self.smtp_username.is_empty() || self.smtp_password.is_empty())
    }
}

fn parse<T>(key: &str, value: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| anyhow!("{e}"))
        .with_context(|| format!("invalid value for {key}: `{value}`"))
}

fn parse_bool(key: &str, value: &str) -> anyhow::Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(anyhow!("invalid value for {key}: `{value}` (expected true/false)")),
    }
}
