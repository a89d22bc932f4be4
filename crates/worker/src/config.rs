use behavior_db::DEFAULT_MAX_CONNECTIONS;
use behavior_events::bus::DEFAULT_CAPACITY;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} must be a valid {expected}, got `{value}`")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Upper bound on pooled connections (default: `20`).
    pub db_max_connections: u32,
    /// Buffer size of the in-process event bus (default: `1024`).
    pub event_bus_capacity: usize,
}

impl WorkerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var              | Default  |
    /// |----------------------|----------|
    /// | `DATABASE_URL`       | required |
    /// | `DB_MAX_CONNECTIONS` | `20`     |
    /// | `EVENT_BUS_CAPACITY` | `1024`   |
    ///
    /// SMTP settings are read separately by `EmailConfig::from_env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = get("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let db_max_connections = match get("DB_MAX_CONNECTIONS") {
            None => DEFAULT_MAX_CONNECTIONS,
            Some(value) => parse_positive("DB_MAX_CONNECTIONS", "u32", value)?,
        };
        let event_bus_capacity = match get("EVENT_BUS_CAPACITY") {
            None => DEFAULT_CAPACITY,
            Some(value) => parse_positive("EVENT_BUS_CAPACITY", "usize", value)?,
        };

        Ok(Self {
            database_url,
            db_max_connections,
            event_bus_capacity,
        })
    }
}

fn parse_positive<T>(name: &'static str, expected: &'static str, value: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match value.trim().parse::<T>() {
        Ok(parsed) if parsed > T::default() => Ok(parsed),
        _ => Err(ConfigError::Invalid {
            name,
            expected,
            value,
        }),
    }
}
