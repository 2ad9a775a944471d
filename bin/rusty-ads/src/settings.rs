//! Runtime settings: built-in defaults, overridden by `RUSTY_ADS_*`
//! environment variables (a `.env` file is loaded first).

use anyhow::Context;
use config::{Config, Environment};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub bind_addr: String,
    pub database_url: String,
    pub static_dir: String,
    pub max_upload_bytes: u64,
    pub secure_cookies: bool,
}

impl Settings {
    pub fn load() -> anyhow::Result<Self> {
        Self::from_env(Environment::with_prefix("RUSTY_ADS").try_parsing(true))
    }

    fn from_env(env: Environment) -> anyhow::Result<Self> {
        Config::builder()
            .set_default("bind_addr", "127.0.0.1:8080")?
            .set_default("database_url", "sqlite:rusty_ads.db")?
            .set_default("static_dir", "./static")?
            .set_default("max_upload_bytes", 2 * 1024 * 1024)?
            .set_default("secure_cookies", false)?
            .add_source(env)
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Invalid settings")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let source: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Environment::with_prefix("RUSTY_ADS").try_parsing(true).source(Some(source))
    }

    #[test]
    fn defaults_apply_without_environment() {
        let settings = Settings::from_env(env(&[])).unwrap();
        assert_eq!(settings.bind_addr, "127.0.0.1:8080");
        assert_eq!(settings.database_url, "sqlite:rusty_ads.db");
        assert_eq!(settings.max_upload_bytes, 2_097_152);
        assert!(!settings.secure_cookies);
    }

    #[test]
    fn prefixed_variables_override_defaults() {
        let settings = Settings::from_env(env(&[
            ("RUSTY_ADS_BIND_ADDR", "0.0.0.0:9000"),
            ("RUSTY_ADS_MAX_UPLOAD_BYTES", "1024"),
            ("RUSTY_ADS_SECURE_COOKIES", "true"),
        ]))
        .unwrap();
        assert_eq!(settings.bind_addr, "0.0.0.0:9000");
        assert_eq!(settings.max_upload_bytes, 1024);
        assert!(settings.secure_cookies);
        assert_eq!(settings.static_dir, "./static");
    }
}
