//! Environment configuration
//!
//! Read after `dotenv::dotenv()` in the binaries. A missing Gemini key is
//! allowed: generation then always falls back and advice always apologizes.

use crate::error::CoachError;
use crate::gemini::DEFAULT_MODEL;
use crate::Result;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct CoachConfig {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub api_port: u16,
    pub advice_temperature: f32,
    pub plan_temperature: f32,
    /// Chat sessions unused this long are evicted by the API server
    pub session_idle_timeout_secs: u64,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: String::new(),
            gemini_model: DEFAULT_MODEL.to_string(),
            api_port: DEFAULT_PORT,
            advice_temperature: crate::conversational::DEFAULT_ADVICE_TEMPERATURE,
            plan_temperature: crate::planner::gemini::DEFAULT_PLAN_TEMPERATURE,
            session_idle_timeout_secs: crate::api::DEFAULT_SESSION_IDLE_TIMEOUT.as_secs(),
        }
    }
}

impl CoachConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = lookup("PORT").or_else(|| lookup("API_PORT"));

        Ok(Self {
            gemini_api_key: lookup("GEMINI_API_KEY").unwrap_or_default(),
            gemini_model: lookup("GEMINI_MODEL")
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(defaults.gemini_model),
            api_port: parse_or("PORT", port, defaults.api_port)?,
            advice_temperature: parse_or(
                "ADVICE_TEMPERATURE",
                lookup("ADVICE_TEMPERATURE"),
                defaults.advice_temperature,
            )?,
            plan_temperature: parse_or(
                "PLAN_TEMPERATURE",
                lookup("PLAN_TEMPERATURE"),
                defaults.plan_temperature,
            )?,
            session_idle_timeout_secs: parse_or(
                "SESSION_IDLE_TIMEOUT_SECS",
                lookup("SESSION_IDLE_TIMEOUT_SECS"),
                defaults.session_idle_timeout_secs,
            )?,
        })
    }

    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_timeout_secs)
    }

    pub fn has_api_key(&self) -> bool {
        !self.gemini_api_key.trim().is_empty() && self.gemini_api_key != "your_gemini_api_key_here"
    }
}

fn parse_or<T: FromStr>(key: &str, value: Option<String>, default: T) -> Result<T> {
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| CoachError::ConfigError(format!("{} has invalid value '{}'", key, raw))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CoachConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api_port, DEFAULT_PORT);
        assert_eq!(config.gemini_model, DEFAULT_MODEL);
        assert_eq!(config.session_idle_timeout(), Duration::from_secs(30 * 60));
        assert!(!config.has_api_key());
    }

    #[test]
    fn test_overrides() {
        let config = CoachConfig::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "abc"),
            ("API_PORT", "9000"),
            ("PLAN_TEMPERATURE", "0.2"),
            ("SESSION_IDLE_TIMEOUT_SECS", "120"),
        ]))
        .unwrap();

        assert_eq!(config.session_idle_timeout(), Duration::from_secs(120));
        assert!(config.has_api_key());
        assert_eq!(config.api_port, 9000);
        assert!((config.plan_temperature - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn test_placeholder_key_counts_as_missing() {
        let config =
            CoachConfig::from_lookup(lookup(&[("GEMINI_API_KEY", "your_gemini_api_key_here")]))
                .unwrap();
        assert!(!config.has_api_key());
    }

    #[test]
    fn test_invalid_port() {
        let result = CoachConfig::from_lookup(lookup(&[("PORT", "eighty")]));
        assert!(matches!(result, Err(CoachError::ConfigError(_))));
    }
}
