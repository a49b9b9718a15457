//! Client configuration loaded from environment variables.
//!
//! A `.env` file is honoured for local development.

use std::env;
use std::path::PathBuf;

use crate::services::participant_cache::PARTICIPANT_CACHE_CAPACITY;

/// Configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// GCP project hosting the Firestore database
    pub gcp_project_id: String,
    /// Web API key for the Identity Toolkit endpoint
    pub firebase_api_key: String,
    /// Location of the local key-value preferences file
    pub preferences_path: PathBuf,
    /// Maximum number of participants kept in the feed cache
    pub participant_cache_capacity: usize,
}

impl Config {
    /// Config for tests. Never talks to a real project.
    pub fn test_default() -> Self {
        Self {
            gcp_project_id: "test-project".to_string(),
            firebase_api_key: "test_api_key".to_string(),
            preferences_path: PathBuf::from("sharedPrefs.json"),
            participant_cache_capacity: PARTICIPANT_CACHE_CAPACITY,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let participant_cache_capacity = match env::var("PARTICIPANT_CACHE_CAPACITY") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::Invalid("PARTICIPANT_CACHE_CAPACITY"))?,
            Err(_) => PARTICIPANT_CACHE_CAPACITY,
        };

        Ok(Self {
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            firebase_api_key: env::var("FIREBASE_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("FIREBASE_API_KEY"))?,
            preferences_path: env::var("PREFERENCES_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("sharedPrefs.json")),
            participant_cache_capacity,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("FIREBASE_API_KEY", " test_key ");
        env::set_var("GCP_PROJECT_ID", "bread-test");
        env::remove_var("PARTICIPANT_CACHE_CAPACITY");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.firebase_api_key, "test_key");
        assert_eq!(config.gcp_project_id, "bread-test");
        assert_eq!(config.participant_cache_capacity, 50);
    }

    #[test]
    fn test_default_capacity_matches_cache() {
        assert_eq!(
            Config::test_default().participant_cache_capacity,
            PARTICIPANT_CACHE_CAPACITY
        );
    }
}
