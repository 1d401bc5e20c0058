use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::exams::{VisibilityPolicy, DEFAULT_FLAG_LIMIT};
use crate::terms::TermSystem;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_env_value(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub terms: TermConfig,
    pub exams: ExamConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_env_value(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let system = match env::var("QUARK_TERM_SYSTEM") {
            Ok(raw) => TermSystem::parse(&raw).ok_or(ConfigError::InvalidTermSystem(raw))?,
            Err(_) => TermSystem::Quarter,
        };

        let flag_limit = match env::var("QUARK_EXAM_FLAG_LIMIT") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidFlagLimit(raw))?,
            Err(_) => DEFAULT_FLAG_LIMIT,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            terms: TermConfig { system },
            exams: ExamConfig { flag_limit },
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Academic calendar settings.
#[derive(Debug, Clone, Copy)]
pub struct TermConfig {
    pub system: TermSystem,
}

/// Exam archive moderation settings.
#[derive(Debug, Clone, Copy)]
pub struct ExamConfig {
    pub flag_limit: usize,
}

impl ExamConfig {
    pub fn visibility_policy(&self) -> VisibilityPolicy {
        VisibilityPolicy {
            flag_limit: self.flag_limit,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidTermSystem(String),
    InvalidFlagLimit(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidTermSystem(value) => write!(
                f,
                "QUARK_TERM_SYSTEM must be 'quarter' or 'semester' (got '{value}')"
            ),
            ConfigError::InvalidFlagLimit(value) => write!(
                f,
                "QUARK_EXAM_FLAG_LIMIT must be a non-negative integer (got '{value}')"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidTermSystem(_)
            | ConfigError::InvalidFlagLimit(_) => None,
        }
    }
}
