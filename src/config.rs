use anyhow::Context;
use std::str::FromStr;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    database_url: String,
    server_port: u16,
    max_connections: u32,
    cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, which returns `None` for unset keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = load_env(&lookup, "DATABASE_URL")?;
        let server_port = load_env(&lookup, "SERVER_PORT")?;
        let max_connections = load_env_or(&lookup, "DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        let cors_origins = lookup("CORS_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            database_url,
            server_port,
            max_connections,
            cors_origins,
        })
    }

    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    #[must_use]
    pub const fn server_port(&self) -> u16 {
        self.server_port
    }

    #[must_use]
    pub const fn max_connections(&self) -> u32 {
        self.max_connections
    }

    /// Empty means any origin.
    #[must_use]
    pub fn cors_origins(&self) -> &[String] {
        &self.cors_origins
    }
}

fn load_env<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
{
    let val = lookup(key).with_context(|| format!("Failed to load environment variable {key}"))?;
    val.parse::<T>()
        .with_context(|| format!("Failed to parse environment variable {key}"))
}

fn load_env_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> anyhow::Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(_) => load_env(lookup, key),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn reads_required_and_defaults_the_rest() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "sqlite://catalog.db"),
            ("SERVER_PORT", "8080"),
        ]))
        .unwrap();

        assert_eq!(config.database_url(), "sqlite://catalog.db");
        assert_eq!(config.server_port(), 8080);
        assert_eq!(config.max_connections(), DEFAULT_MAX_CONNECTIONS);
        assert!(config.cors_origins().is_empty());
    }

    #[test]
    fn splits_cors_origins() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("SERVER_PORT", "8080"),
            ("DATABASE_MAX_CONNECTIONS", "2"),
            ("CORS_ALLOWED_ORIGINS", "https://a.example, ,https://b.example"),
        ]))
        .unwrap();

        assert_eq!(config.max_connections(), 2);
        assert_eq!(
            config.cors_origins(),
            ["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn missing_or_malformed_values_name_the_variable() {
        let err = Config::from_lookup(lookup(&[("SERVER_PORT", "8080")])).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));

        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("SERVER_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("SERVER_PORT"));
    }
}
