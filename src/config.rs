use serde::{Deserialize, Serialize};
use std::env;

use crate::error::{AppError, AppResult};
use crate::models::Period;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub reservation_api: ReservationApiConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationApiConfig {
    pub base_url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64, // seconds
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub default_period: Period,
    #[serde(default = "default_waiting_limit")]
    pub waiting_limit: usize,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_waiting_limit() -> usize {
    3
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_period: Period::default(),
            waiting_limit: default_waiting_limit(),
        }
    }
}

fn get_env(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_toml() -> AppResult<Self> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 配置文件不存在时完全依赖环境变量
        let mut config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => Self::from_toml_str(&config_str)?,
            Err(e) if e.kind() == ErrorKind::NotFound => Self::from_env()?,
            Err(e) => {
                return Err(AppError::ConfigError(format!(
                    "Cannot read config file {config_path}: {e}"
                )));
            }
        };

        // 环境变量覆盖（即便文件存在时也覆盖）
        config.apply_env_overrides();

        Ok(config)
    }

    pub fn from_toml_str(config_str: &str) -> AppResult<Self> {
        toml::from_str(config_str)
            .map_err(|e| AppError::ConfigError(format!("Failed to parse config file: {e}")))
    }

    fn from_env() -> AppResult<Self> {
        let base_url = get_env("RESERVATION_API_URL").ok_or_else(|| {
            AppError::ConfigError(
                "RESERVATION_API_URL is not set and no config.toml was found".to_string(),
            )
        })?;

        Ok(Config {
            server: ServerConfig {
                host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: get_env_parse("SERVER_PORT", 8080u16),
            },
            reservation_api: ReservationApiConfig {
                base_url,
                token: get_env("RESERVATION_API_TOKEN"),
                timeout_secs: get_env_parse("RESERVATION_API_TIMEOUT_SECS", default_timeout_secs()),
            },
            dashboard: DashboardConfig {
                default_period: get_env_parse("DASHBOARD_DEFAULT_PERIOD", Period::default()),
                waiting_limit: get_env_parse("DASHBOARD_WAITING_LIMIT", default_waiting_limit()),
            },
        })
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            self.server.port = p;
        }
        if let Ok(v) = env::var("RESERVATION_API_URL") {
            self.reservation_api.base_url = v;
        }
        if let Ok(v) = env::var("RESERVATION_API_TOKEN") {
            self.reservation_api.token = Some(v);
        }
        if let Ok(v) = env::var("RESERVATION_API_TIMEOUT_SECS")
            && let Ok(n) = v.parse()
        {
            self.reservation_api.timeout_secs = n;
        }
        if let Ok(v) = env::var("DASHBOARD_DEFAULT_PERIOD") {
            match v.parse() {
                Ok(period) => self.dashboard.default_period = period,
                Err(e) => log::warn!("Ignoring DASHBOARD_DEFAULT_PERIOD: {e}"),
            }
        }
        if let Ok(v) = env::var("DASHBOARD_WAITING_LIMIT")
            && let Ok(n) = v.parse()
        {
            self.dashboard.waiting_limit = n;
        }
    }
}
