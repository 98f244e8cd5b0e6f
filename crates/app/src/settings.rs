//! Settings of the `famledger` binary.
//!
//! Read from an optional `settings.toml` in the working directory, then
//! overridden by `FAMLEDGER_*` environment variables using `__` between
//! nested keys (e.g. `FAMLEDGER_SERVER__PORT=8080`).

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
}

#[derive(Debug, Default, Deserialize)]
pub struct Notifier {
    /// Mail relay receiving invite notices as JSON.
    pub webhook_url: Option<String>,
    /// Public URL of the web app, used to build invite links.
    pub app_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Option<Server>,
    #[serde(default)]
    pub notifier: Notifier,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_config(
            Config::builder()
                .add_source(File::with_name("settings").required(false))
                .add_source(
                    Environment::with_prefix("FAMLEDGER")
                        .separator("__")
                        .try_parsing(true),
                ),
        )
    }

    fn from_config(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn parse(toml: &str) -> Settings {
        Settings::from_config(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
            .unwrap()
    }

    #[test]
    fn sqlite_server_section() {
        let settings = parse(
            r#"
            [app]
            level = "debug"

            [server]
            port = 3000
            database = { sqlite = "famledger.db" }

            [notifier]
            webhook_url = "http://relay.local/invites"
            "#,
        );
        assert_eq!(settings.app.level, "debug");
        let server = settings.server.unwrap();
        assert_eq!(server.port, 3000);
        assert_eq!(server.bind, None);
        assert_eq!(server.database, Database::Sqlite("famledger.db".to_string()));
        assert_eq!(
            settings.notifier.webhook_url.as_deref(),
            Some("http://relay.local/invites")
        );
    }

    #[test]
    fn empty_config_has_no_server() {
        let settings = parse("");
        assert_eq!(settings.app.level, "info");
        assert!(settings.server.is_none());
        assert!(settings.notifier.webhook_url.is_none());
    }

    #[test]
    fn memory_database() {
        let settings = parse(
            r#"
            [server]
            port = 3000
            database = "memory"
            "#,
        );
        assert_eq!(settings.server.unwrap().database, Database::Memory);
    }
}
