use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

use crate::ranking::PropagationMode;

const MIN_SECRET_LEN: usize = 16;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub redis_url: Option<String>,
    pub rules_path: Option<String>,
    pub token_secret: String,
    pub token_issuer: String,
    pub token_ttl_secs: i64,
    pub rank_propagation: PropagationMode,
    /// Required by administrative routes; when unset they are closed.
    pub admin_token: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let redis_url = optional(&env_map, "REDIS_URL");
        let rules_path = optional(&env_map, "RULES_PATH");

        let token_secret = env_map
            .get("TOKEN_SECRET")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("TOKEN_SECRET".to_string()))?;
        if token_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::InvalidValue(
                "TOKEN_SECRET".to_string(),
                format!("must be at least {} bytes", MIN_SECRET_LEN),
            ));
        }

        let token_issuer =
            optional(&env_map, "TOKEN_ISSUER").unwrap_or_else(|| "tapkeeper".to_string());

        let token_ttl_secs = env_map
            .get("TOKEN_TTL_SECS")
            .map(|s| s.as_str())
            .unwrap_or("86400")
            .parse::<i64>()
            .ok()
            .filter(|ttl| *ttl > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "TOKEN_TTL_SECS".to_string(),
                    "must be a positive integer".to_string(),
                )
            })?;

        let rank_propagation = env_map
            .get("RANK_PROPAGATION")
            .map(|s| s.as_str())
            .unwrap_or("detached");
        let rank_propagation = PropagationMode::from_str(rank_propagation).map_err(|_| {
            ConfigError::InvalidValue(
                "RANK_PROPAGATION".to_string(),
                format!("must be detached or inline, got {}", rank_propagation),
            )
        })?;

        let admin_token = optional(&env_map, "ADMIN_TOKEN");

        Ok(Config {
            port,
            database_path,
            redis_url,
            rules_path,
            token_secret,
            token_issuer,
            token_ttl_secs,
            rank_propagation,
            admin_token,
        })
    }
}

/// A set, non-blank variable.
fn optional(env_map: &HashMap<String, String>, key: &str) -> Option<String> {
    env_map
        .get(key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_required_env() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("DATABASE_PATH".to_string(), "/tmp/test.db".to_string());
        map.insert(
            "TOKEN_SECRET".to_string(),
            "0123456789abcdef0123".to_string(),
        );
        map
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_env_map(setup_required_env()).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.token_issuer, "tapkeeper");
        assert_eq!(config.token_ttl_secs, 86400);
        assert_eq!(config.rank_propagation, PropagationMode::Detached);
        assert!(config.redis_url.is_none());
        assert!(config.rules_path.is_none());
        assert!(config.admin_token.is_none());
    }

    #[test]
    fn test_missing_database_path() {
        let mut env_map = setup_required_env();
        env_map.remove("DATABASE_PATH");
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "DATABASE_PATH"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_missing_token_secret() {
        let mut env_map = setup_required_env();
        env_map.remove("TOKEN_SECRET");
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "TOKEN_SECRET"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_short_token_secret() {
        let mut env_map = setup_required_env();
        env_map.insert("TOKEN_SECRET".to_string(), "short".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "TOKEN_SECRET"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_invalid_port() {
        let mut env_map = setup_required_env();
        env_map.insert("PORT".to_string(), "not_a_number".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "PORT"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_invalid_token_ttl() {
        for bad in ["0", "-5", "soon"] {
            let mut env_map = setup_required_env();
            env_map.insert("TOKEN_TTL_SECS".to_string(), bad.to_string());
            match Config::from_env_map(env_map) {
                Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "TOKEN_TTL_SECS"),
                _ => panic!("Expected InvalidValue error for {bad}"),
            }
        }
    }

    #[test]
    fn test_invalid_rank_propagation() {
        let mut env_map = setup_required_env();
        env_map.insert("RANK_PROPAGATION".to_string(), "eventually".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "RANK_PROPAGATION"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_optional_values_ignore_blank() {
        let mut env_map = setup_required_env();
        env_map.insert("REDIS_URL".to_string(), "  ".to_string());
        env_map.insert("RULES_PATH".to_string(), "/etc/rules.json".to_string());
        env_map.insert("RANK_PROPAGATION".to_string(), "inline".to_string());
        let config = Config::from_env_map(env_map).unwrap();
        assert!(config.redis_url.is_none());
        assert_eq!(config.rules_path.as_deref(), Some("/etc/rules.json"));
        assert_eq!(config.rank_propagation, PropagationMode::Inline);
    }
}
