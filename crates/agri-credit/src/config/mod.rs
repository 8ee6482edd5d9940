use std::env;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

const ENV_KEY: &str = "APP_ENV";
const HOST_KEY: &str = "APP_HOST";
const PORT_KEY: &str = "APP_PORT";
const LOG_LEVEL_KEY: &str = "APP_LOG_LEVEL";
const LOG_FORMAT_KEY: &str = "APP_LOG_FORMAT";
const RULE_SET_KEY: &str = "CREDIT_RULE_SET";

/// Rule-set version used when `CREDIT_RULE_SET` is not provided.
pub const DEFAULT_RULE_SET_VERSION: &str = "1.0";

/// Deployment stage the scoring service runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Settings shared by the HTTP service and the command-line entry points.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub scoring: ScoringConfig,
}

impl AppConfig {
    /// Reads `.env` (when present) and then the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; unset keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup(ENV_KEY)
            .map(|raw| AppEnvironment::parse(&raw))
            .unwrap_or(AppEnvironment::Development);

        let server = ServerConfig {
            host: lookup(HOST_KEY).unwrap_or_else(|| ServerConfig::DEFAULT_HOST.to_string()),
            port: match lookup(PORT_KEY) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidPort(raw))?,
                None => ServerConfig::DEFAULT_PORT,
            },
        };

        let telemetry = TelemetryConfig {
            log_level: lookup(LOG_LEVEL_KEY).unwrap_or_else(|| "info".to_string()),
            log_format: match lookup(LOG_FORMAT_KEY) {
                Some(raw) => LogFormat::parse(&raw).ok_or(ConfigError::InvalidLogFormat(raw))?,
                None => LogFormat::Compact,
            },
        };

        let rule_set_version = lookup(RULE_SET_KEY)
            .map(|raw| raw.trim().to_string())
            .unwrap_or_else(|| DEFAULT_RULE_SET_VERSION.to_string());
        if rule_set_version.is_empty() {
            return Err(ConfigError::EmptyRuleSetVersion);
        }

        Ok(Self {
            environment,
            server,
            telemetry,
            scoring: ScoringConfig { rule_set_version },
        })
    }
}

/// Address the HTTP listener binds to.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    const DEFAULT_HOST: &'static str = "127.0.0.1";
    const DEFAULT_PORT: u16 = 3000;

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = if self.host.eq_ignore_ascii_case("localhost") {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        } else {
            self.host
                .parse()
                .map_err(|source| ConfigError::InvalidHost {
                    host: self.host.clone(),
                    source,
                })?
        };
        Ok(SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// `EnvFilter` directive, e.g. `info` or `agri_credit=debug`.
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Compact,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" | "text" => Some(Self::Compact),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Selects which registered scoring rule set drives evaluations.
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    pub rule_set_version: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort(String),
    InvalidHost {
        host: String,
        source: std::net::AddrParseError,
    },
    InvalidLogFormat(String),
    EmptyRuleSetVersion,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort(value) => {
                write!(f, "{PORT_KEY} must be a port number (found '{value}')")
            }
            ConfigError::InvalidHost { host, .. } => {
                write!(f, "{HOST_KEY} must be an IP address or localhost (found '{host}')")
            }
            ConfigError::InvalidLogFormat(value) => {
                write!(f, "{LOG_FORMAT_KEY} must be 'compact' or 'json' (found '{value}')")
            }
            ConfigError::EmptyRuleSetVersion => {
                write!(f, "{RULE_SET_KEY} must name a rule-set version")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Mutex, OnceLock};

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn unset_keys_take_defaults() {
        let config = from_pairs(&[]).expect("defaults load");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.telemetry.log_format, LogFormat::Compact);
        assert_eq!(config.scoring.rule_set_version, DEFAULT_RULE_SET_VERSION);
    }

    #[test]
    fn reads_rule_set_stage_and_json_format() {
        let config = from_pairs(&[
            (RULE_SET_KEY, " 2.1 "),
            (LOG_FORMAT_KEY, "JSON"),
            (ENV_KEY, "prod"),
        ])
        .expect("config loads");

        assert_eq!(config.scoring.rule_set_version, "2.1");
        assert_eq!(config.telemetry.log_format, LogFormat::Json);
        assert_eq!(config.environment, AppEnvironment::Production);
    }

    #[test]
    fn localhost_binds_loopback() {
        let config = from_pairs(&[(HOST_KEY, "LocalHost"), (PORT_KEY, "8081")])
            .expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::from(([127, 0, 0, 1], 8081)));
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(matches!(
            from_pairs(&[(PORT_KEY, "not-a-port")]),
            Err(ConfigError::InvalidPort(value)) if value == "not-a-port"
        ));
        assert!(matches!(
            from_pairs(&[(RULE_SET_KEY, "   ")]),
            Err(ConfigError::EmptyRuleSetVersion)
        ));
        assert!(matches!(
            from_pairs(&[(LOG_FORMAT_KEY, "xml")]),
            Err(ConfigError::InvalidLogFormat(value)) if value == "xml"
        ));

        let config = from_pairs(&[(HOST_KEY, "farm-gateway")]).expect("host is not parsed eagerly");
        assert!(matches!(
            config.server.socket_addr(),
            Err(ConfigError::InvalidHost { host, .. }) if host == "farm-gateway"
        ));
    }

    #[test]
    fn load_reads_the_process_environment() {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        let _lock = GUARD
            .get_or_init(|| Mutex::new(()))
            .lock()
            .expect("env mutex poisoned");

        env::set_var(RULE_SET_KEY, "2.0");
        let config = AppConfig::load();
        env::remove_var(RULE_SET_KEY);

        assert_eq!(
            config.expect("config loads").scoring.rule_set_version,
            "2.0"
        );
    }
}
