use anyhow::Context;
use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub rust_log: String,
    pub bind_addr: String,
    pub smtp_host: String,
    /// Sender address, also the SMTP username.
    pub email: String,
    pub app_password: String,
    pub coordinator_name: String,
    /// Seeds the admin password on first start.
    pub admin_password: Option<String>,
    pub secure_cookies: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        // A missing .env is fine; the variables may come from the environment.
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let required = |key: &str| lookup(key).with_context(|| format!("{key} is not set"));
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.into());

        let secure_cookies = match lookup("SECURE_COOKIES") {
            Some(value) => value
                .parse()
                .with_context(|| format!("SECURE_COOKIES must be true or false, got {value:?}"))?,
            None => false,
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            rust_log: or_default("RUST_LOG", "debug"),
            bind_addr: or_default("BIND_ADDR", "0.0.0.0:3000"),
            smtp_host: or_default("SMTP_HOST", "smtp.gmail.com"),
            email: required("EMAIL")?,
            app_password: required("APP_PASSWORD")?,
            coordinator_name: or_default("COORDINATOR_NAME", "Meals of Gratitude Coordinator"),
            admin_password: lookup("ADMIN_PASSWORD").filter(|p| !p.is_empty()),
            secure_cookies,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/meals"),
            ("EMAIL", "program@example.com"),
            ("APP_PASSWORD", "app-secret"),
        ])
        .expect("config");

        assert_eq!(config.rust_log, "debug");
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.smtp_host, "smtp.gmail.com");
        assert_eq!(config.coordinator_name, "Meals of Gratitude Coordinator");
        assert_eq!(config.admin_password, None);
        assert!(!config.secure_cookies);
    }

    #[test]
    fn test_missing_and_malformed_values() {
        let err = config_from(&[("EMAIL", "a@b.c"), ("APP_PASSWORD", "x")])
            .err()
            .expect("missing database url");
        assert!(err.to_string().contains("DATABASE_URL"));

        assert!(
            config_from(&[
                ("DATABASE_URL", "postgres://localhost/meals"),
                ("EMAIL", "a@b.c"),
                ("APP_PASSWORD", "x"),
                ("SECURE_COOKIES", "sometimes"),
            ])
            .is_err()
        );
    }
}
