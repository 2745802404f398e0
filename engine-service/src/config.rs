//! Layered configuration: defaults, then `engine.toml`, then
//! `ENGINE__SECTION__KEY` environment variables — the teacher's
//! `ConfigLoader::builder()` pattern from `inference-runner/src/config.rs`.

use config::{Config as ConfigLoader, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default = "default_settings_path")]
    pub settings_path: String,
    #[serde(default)]
    pub runners: RunnersConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Which built-in runners discovery should consider enabling, before
/// hardware-probe filtering (§4.3). Mirrors the teacher's
/// `EnginesConfig { ollama, llama_cpp }` per-engine enable flags.
#[derive(Debug, Clone, Deserialize)]
pub struct RunnersConfig {
    #[serde(default = "default_true")]
    pub echo_llm: bool,
    #[serde(default = "default_true")]
    pub local_asr: bool,
    #[serde(default = "default_true")]
    pub local_tts: bool,
    #[serde(default = "default_true")]
    pub guardian: bool,
}

impl Default for RunnersConfig {
    fn default() -> Self {
        Self {
            echo_llm: true,
            local_asr: true,
            local_tts: true,
            guardian: true,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8089
}

fn default_settings_path() -> String {
    "engine-settings.json".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let loader = ConfigLoader::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port() as i64)?
            .set_default("settings_path", default_settings_path())?
            .set_default("runners.echo_llm", true)?
            .set_default("runners.local_asr", true)?
            .set_default("runners.local_tts", true)?
            .set_default("runners.guardian", true)?
            .add_source(File::with_name("engine").required(false))
            .add_source(Environment::with_prefix("ENGINE").separator("__").try_parsing(true))
            .build()?;

        loader.try_deserialize()
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
