use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::markup::BotTextTrust;

/// Optional config file picked up from the working directory.
const CWD_CONFIG_FILE: &str = "config.yaml";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Base URL of the Backend Q&A Service
    #[arg(long, env = "BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Render backend replies as raw markup
    #[arg(long, env = "TRUST_BACKEND_MARKUP")]
    pub trust_backend_markup: Option<bool>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub storage: StorageConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    /// Unset means wait for the network layer.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// File holding the client-local key-value store.
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UiConfig {
    pub trust_backend_markup: bool,
    pub max_upload_bytes: usize,
}

impl BackendConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl UiConfig {
    pub fn bot_text_trust(&self) -> BotTextTrust {
        BotTextTrust::from_flag(self.trust_backend_markup)
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        // 1. Defaults
        let mut builder = Config::builder()
            .set_default("server.port", 3000)?
            .set_default("server.host", "127.0.0.1")?
            .set_default("backend.base_url", "http://192.168.56.55:8000")?
            .set_default("storage.path", ".allybot/storage.json")?
            .set_default("ui.trust_backend_markup", false)?
            .set_default("ui.max_upload_bytes", 50 * 1024 * 1024)?;

        // 2. Config file: explicit path is required, ./config.yaml is optional
        builder = match &cli.config {
            Some(path) => builder.add_source(File::with_name(path).required(true)),
            None => builder.add_source(File::with_name(CWD_CONFIG_FILE).required(false)),
        };

        // 3. Environment variables, e.g. ALLYBOT__SERVER__PORT=8000
        builder = builder.add_source(
            Environment::with_prefix("ALLYBOT")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        // 4. CLI flags (and their plain env aliases) win
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(url) = cli.backend_url {
            builder = builder.set_override("backend.base_url", url)?;
        }
        if let Some(trust) = cli.trust_backend_markup {
            builder = builder.set_override("ui.trust_backend_markup", trust)?;
        }

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides() {
        let config = AppConfig::load_from_args([
            "allybot",
            "--port",
            "4100",
            "--backend-url",
            "http://qa.internal:9000",
            "--trust-backend-markup",
            "true",
        ])
        .unwrap();

        assert_eq!(config.server.port, 4100);
        assert_eq!(config.backend.base_url, "http://qa.internal:9000");
        assert_eq!(config.ui.bot_text_trust(), BotTextTrust::Trusted);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result =
            AppConfig::load_from_args(["allybot", "--config", "/nonexistent/allybot.yaml"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_timeout_conversion() {
        let backend = BackendConfig {
            base_url: "http://x".into(),
            timeout_secs: Some(5),
        };
        assert_eq!(backend.timeout(), Some(Duration::from_secs(5)));
    }
}
