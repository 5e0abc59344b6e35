use crate::error::{AppError, Result};
use std::env;
use std::time::Duration;
use url::Url;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Redis configuration
    pub redis: RedisConfig,
    /// Push (WebSocket fan-out) configuration
    pub push: PushConfig,
    /// Stress endpoint limits
    pub stress: StressConfig,
    /// Logging configuration
    pub log: LogConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port for the HTTP server (default: 8080)
    pub port: u16,
    /// Host to bind to (default: 0.0.0.0)
    pub host: String,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis address as host:port (default: localhost:6379)
    pub addr: String,
    /// Optional password
    pub password: Option<String>,
    /// Database index (default: 0)
    pub db: i64,
    /// Pub/sub topic feeding the WebSocket broadcast
    pub channel: String,
    /// Key looked up by `/redis` and the greeting page
    pub value_key: String,
    /// Returned whenever the lookup misses or Redis is unavailable
    pub default_value: String,
}

#[derive(Debug, Clone)]
pub struct PushConfig {
    /// Upper bound on a single WebSocket write before the peer is dropped
    pub write_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Maximum number of tasks a single `/stress` call may spawn
    pub max_tasks: usize,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level (debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let default_value = get_env_or("DEFAULT_VALUE", "default_value");
        let password = get_env_or("REDIS_PASSWORD", "");

        Ok(Config {
            server: ServerConfig {
                port: get_env_or("PORT", "8080").parse().map_err(|_| {
                    AppError::InvalidConfig("PORT must be a valid port number".into())
                })?,
                host: get_env_or("HOST", "0.0.0.0"),
            },
            redis: RedisConfig {
                addr: get_env_or("REDIS_ADDR", "localhost:6379"),
                password: if password.is_empty() {
                    None
                } else {
                    Some(password)
                },
                db: get_env_or("REDIS_DB", "0").parse().map_err(|_| {
                    AppError::InvalidConfig("REDIS_DB must be a valid number".into())
                })?,
                channel: get_env_or("REDIS_CHANNEL", "notifications"),
                value_key: get_env_or("REDIS_VALUE", &default_value),
                default_value,
            },
            push: PushConfig {
                write_timeout: Duration::from_secs(
                    get_env_or("WS_WRITE_TIMEOUT_SECS", "5")
                        .parse()
                        .map_err(|_| {
                            AppError::InvalidConfig(
                                "WS_WRITE_TIMEOUT_SECS must be a valid number".into(),
                            )
                        })?,
                ),
            },
            stress: StressConfig {
                max_tasks: get_env_or("STRESS_MAX_TASKS", "10000")
                    .parse()
                    .map_err(|_| {
                        AppError::InvalidConfig("STRESS_MAX_TASKS must be a valid number".into())
                    })?,
            },
            log: LogConfig {
                level: get_env_or("LOG_LEVEL", "info"),
                format: get_env_or("LOG_FORMAT", "pretty"),
            },
        })
    }

    /// Get the Redis connection URL
    pub fn redis_url(&self) -> Result<String> {
        let mut url = Url::parse(&format!("redis://{}", self.redis.addr))?;

        if let Some(password) = &self.redis.password {
            url.set_password(Some(password))
                .map_err(|_| AppError::InvalidConfig("REDIS_ADDR cannot carry a password".into()))?;
        }
        url.set_path(&self.redis.db.to_string());

        Ok(url.to_string())
    }

    /// Get the HTTP server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Get environment variable with a default value
fn get_env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const CONFIG_ENV_KEYS: &[&str] = &[
        "PORT",
        "HOST",
        "REDIS_ADDR",
        "REDIS_PASSWORD",
        "REDIS_DB",
        "REDIS_CHANNEL",
        "REDIS_VALUE",
        "DEFAULT_VALUE",
        "WS_WRITE_TIMEOUT_SECS",
        "STRESS_MAX_TASKS",
        "LOG_LEVEL",
        "LOG_FORMAT",
    ];

    struct EnvGuard {
        saved: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new(keys: &[&str]) -> Self {
            let saved = keys
                .iter()
                .map(|&key| {
                    let old = env::var(key).ok();
                    env::remove_var(key);
                    (key.to_string(), old)
                })
                .collect();

            Self { saved }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in self.saved.drain(..) {
                match value {
                    Some(v) => env::set_var(key, v),
                    None => env::remove_var(key),
                }
            }
        }
    }

    fn sample_config() -> Config {
        Config {
            server: ServerConfig {
                port: 8080,
                host: "0.0.0.0".to_string(),
            },
            redis: RedisConfig {
                addr: "localhost:6379".to_string(),
                password: None,
                db: 0,
                channel: "notifications".to_string(),
                value_key: "default_value".to_string(),
                default_value: "default_value".to_string(),
            },
            push: PushConfig {
                write_timeout: Duration::from_secs(5),
            },
            stress: StressConfig { max_tasks: 10_000 },
            log: LogConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }

    #[test]
    fn test_config_from_env_defaults() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _guard = EnvGuard::new(CONFIG_ENV_KEYS);

        let config = Config::from_env().unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.redis.addr, "localhost:6379");
        assert!(config.redis.password.is_none());
        assert_eq!(config.redis.db, 0);
        assert_eq!(config.redis.channel, "notifications");
        assert_eq!(config.redis.default_value, "default_value");
        assert_eq!(config.redis.value_key, "default_value");
        assert_eq!(config.push.write_timeout, Duration::from_secs(5));
        assert_eq!(config.stress.max_tasks, 10_000);
    }

    #[test]
    fn test_config_from_env_overrides() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _guard = EnvGuard::new(CONFIG_ENV_KEYS);

        env::set_var("PORT", "9090");
        env::set_var("REDIS_ADDR", "cache.example:6380");
        env::set_var("REDIS_PASSWORD", "s3cret");
        env::set_var("REDIS_DB", "3");
        env::set_var("REDIS_CHANNEL", "events");
        env::set_var("DEFAULT_VALUE", "fallback");
        env::set_var("WS_WRITE_TIMEOUT_SECS", "2");

        let config = Config::from_env().unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.redis.addr, "cache.example:6380");
        assert_eq!(config.redis.password.as_deref(), Some("s3cret"));
        assert_eq!(config.redis.db, 3);
        assert_eq!(config.redis.channel, "events");
        assert_eq!(config.redis.default_value, "fallback");
        // REDIS_VALUE falls back to DEFAULT_VALUE
        assert_eq!(config.redis.value_key, "fallback");
        assert_eq!(config.push.write_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_config_from_env_invalid_port() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _guard = EnvGuard::new(CONFIG_ENV_KEYS);

        env::set_var("PORT", "not-a-port");
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, AppError::InvalidConfig(_)));
    }

    #[test]
    fn test_config_from_env_invalid_db() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _guard = EnvGuard::new(CONFIG_ENV_KEYS);

        env::set_var("REDIS_DB", "zero");
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, AppError::InvalidConfig(_)));
    }

    #[test]
    fn test_config_from_env_invalid_stress_max_tasks() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _guard = EnvGuard::new(CONFIG_ENV_KEYS);

        env::set_var("STRESS_MAX_TASKS", "lots");
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, AppError::InvalidConfig(msg) if msg.contains("STRESS_MAX_TASKS")));
    }

    #[test]
    fn test_redis_url() {
        let mut config = sample_config();
        assert_eq!(config.redis_url().unwrap(), "redis://localhost:6379/0");

        config.redis.password = Some("p@ss".to_string());
        config.redis.db = 2;
        assert_eq!(
            config.redis_url().unwrap(),
            "redis://:p%40ss@localhost:6379/2"
        );
    }

    #[test]
    fn test_server_addr() {
        assert_eq!(sample_config().server_addr(), "0.0.0.0:8080");
    }
}
