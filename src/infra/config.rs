// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::infra::paths;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub evaluation: EvaluationConfig,

    #[serde(default)]
    pub python: PythonConfig,

    #[serde(default)]
    pub c: CConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Items per linter batch. A failing batch is discarded as a whole.
    pub chunk_size: usize,
    /// Default binding id ("python" or "c") when the caller does not pick one.
    #[serde(default)]
    pub language: Option<String>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            chunk_size: 50,
            language: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PythonConfig {
    pub linter: String,
    #[serde(default)]
    pub linter_args: Vec<String>,
}

impl Default for PythonConfig {
    fn default() -> Self {
        Self {
            linter: "pylint".into(),
            linter_args: vec!["--msg-template={msg_id}-{msg}".into()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CConfig {
    pub compiler: String,
    #[serde(default)]
    pub compiler_args: Vec<String>,
}

impl Default for CConfig {
    fn default() -> Self {
        Self {
            compiler: "gcc".into(),
            compiler_args: vec!["-fsyntax-only".into()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
        }
    }
}

impl Config {
    /// Load config from file, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        match paths::config_file_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        if config.evaluation.chunk_size == 0 {
            anyhow::bail!("evaluation.chunk_size must be at least 1");
        }
        Ok(config)
    }
}
