use crate::error::{Result, SalesPulseError};
use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "https://ai.gateway.lovable.dev/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8787";
pub const DEFAULT_DATA_DIR: &str = ".sales-pulse";

pub const API_KEY_VAR: &str = "SALES_PULSE_API_KEY";

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub bind_addr: String,
    pub data_dir: PathBuf,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 1000,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

impl BridgeConfig {
    /// Reads `SALES_PULSE_*` variables, falling back to defaults.
    /// A missing API key is only an error once something needs it.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            api_key: non_empty(API_KEY_VAR),
            api_url: non_empty("SALES_PULSE_API_URL").unwrap_or(defaults.api_url),
            model: non_empty("SALES_PULSE_MODEL").unwrap_or(defaults.model),
            bind_addr: non_empty("SALES_PULSE_BIND_ADDR").unwrap_or(defaults.bind_addr),
            data_dir: non_empty("SALES_PULSE_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            ..defaults
        }
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| SalesPulseError::MissingConfig(API_KEY_VAR.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_unset() {
        let config = BridgeConfig::from_lookup(|_| None);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.max_tokens, 1000);
        assert!((config.temperature - 0.7).abs() < f32::EPSILON);
        assert!(matches!(
            config.require_api_key(),
            Err(SalesPulseError::MissingConfig(_))
        ));
    }

    #[test]
    fn test_environment_overrides() {
        let vars: HashMap<&str, &str> = [
            ("SALES_PULSE_API_KEY", "secret"),
            ("SALES_PULSE_MODEL", "openai/gpt-4o-mini"),
            ("SALES_PULSE_DATA_DIR", "/tmp/vendas"),
            ("SALES_PULSE_API_URL", "   "),
        ]
        .into_iter()
        .collect();

        let config = BridgeConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.require_api_key().unwrap(), "secret");
        assert_eq!(config.model, "openai/gpt-4o-mini");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/vendas"));
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }
}
