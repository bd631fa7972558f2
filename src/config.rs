use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::env;

pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub ai: AiConfig,
    pub cloudinary: Option<CloudinaryConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source. Empty values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let url = get("DATABASE_URL").ok_or_else(|| anyhow!("DATABASE_URL is not set"))?;
        let jwt_secret = get("JWT_SECRET").ok_or_else(|| anyhow!("JWT_SECRET is not set"))?;

        let max_connections = match get("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("invalid DATABASE_MAX_CONNECTIONS: {}", raw))?,
            None => 10,
        };
        let port = match get("PORT").or_else(|| get("SERVER_PORT")) {
            Some(raw) => raw.parse().with_context(|| format!("invalid PORT: {}", raw))?,
            None => 5000,
        };

        // Several deployments used different names for the same key.
        let api_key = ["GROQ_API_KEY", "GROQ", "GROQ_API"]
            .iter()
            .find_map(|key| get(key));

        let cloudinary = match (
            get("CLOUDINARY_CLOUD_NAME"),
            get("CLOUDINARY_API_KEY"),
            get("CLOUDINARY_API_SECRET"),
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Some(CloudinaryConfig {
                cloud_name,
                api_key,
                api_secret,
            }),
            _ => None,
        };

        Ok(Self {
            database: DatabaseConfig {
                url,
                max_connections,
            },
            server: ServerConfig {
                host: get("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port,
            },
            auth: AuthConfig {
                jwt_secret,
                token_ttl_days: 7,
            },
            ai: AiConfig {
                api_key,
                base_url: get("GROQ_BASE_URL").unwrap_or_else(|| DEFAULT_GROQ_BASE_URL.to_string()),
            },
            cloudinary,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_required_variables() {
        assert!(config_from(&[("JWT_SECRET", "s")]).is_err());
        assert!(config_from(&[("DATABASE_URL", "postgres://x")]).is_err());
        assert!(config_from(&[("DATABASE_URL", "postgres://x"), ("JWT_SECRET", "  ")]).is_err());
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("DATABASE_URL", "postgres://x"), ("JWT_SECRET", "s")]).unwrap();
        assert_eq!(config.server_address(), "0.0.0.0:5000");
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.auth.token_ttl_days, 7);
        assert_eq!(config.ai.base_url, DEFAULT_GROQ_BASE_URL);
        assert!(config.ai.api_key.is_none());
        assert!(config.cloudinary.is_none());
    }

    #[test]
    fn test_groq_key_aliases() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("GROQ_API", "third"),
            ("GROQ", "second"),
        ])
        .unwrap();
        assert_eq!(config.ai.api_key.as_deref(), Some("second"));
    }

    #[test]
    fn test_cloudinary_requires_all_parts() {
        let partial = config_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("CLOUDINARY_CLOUD_NAME", "farm"),
        ])
        .unwrap();
        assert!(partial.cloudinary.is_none());

        let full = config_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("CLOUDINARY_CLOUD_NAME", "farm"),
            ("CLOUDINARY_API_KEY", "key"),
            ("CLOUDINARY_API_SECRET", "secret"),
        ])
        .unwrap();
        assert_eq!(full.cloudinary.unwrap().cloud_name, "farm");
    }

    #[test]
    fn test_invalid_port() {
        assert!(config_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("PORT", "abc"),
        ])
        .is_err());
    }
}
