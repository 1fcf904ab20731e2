//! User configuration and logging setup.
//!
//! Configuration lives in an optional TOML file; every field has a default so a
//! missing file is the same as an empty one.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::i18n::Language;
use crate::runner::{ExecutionMode, NodeExecutor};

pub const APP_DIR: &str = "console-rules";
pub const CONFIG_ENV: &str = "CONSOLE_RULES_CONFIG";
const CONFIG_FILE: &str = "config.toml";
const LOG_FILE: &str = "console-rules.log";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: Option<PathBuf>,
    /// Language used until one is chosen and stored.
    pub language: String,
    /// External editor command; falls back to `$VISUAL`, `$EDITOR`, then nvim/vim/nano.
    pub editor: Option<String>,
    pub log_level: String,
    pub runner: RunnerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub program: String,
    pub mode: ExecutionMode,
    pub args: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            language: Language::default().code().to_string(),
            editor: None,
            log_level: "info".to_string(),
            runner: RunnerConfig::default(),
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            program: "node".to_string(),
            mode: ExecutionMode::default(),
            args: Vec::new(),
        }
    }
}

impl RunnerConfig {
    pub fn executor(&self) -> NodeExecutor {
        NodeExecutor::new(self.program.clone(), self.args.clone(), self.mode)
    }
}

impl Config {
    /// Loads from `$CONSOLE_RULES_CONFIG`, else `<config_dir>/console-rules/config.toml`.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn default_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Directory for the storage file, exports, drafts and the log.
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(dirs::data_dir()
                .context("Failed to get data directory")?
                .join(APP_DIR)),
        }
    }

    /// Configured initial language, `pt` when the code is not supported.
    pub fn default_language(&self) -> Language {
        Language::from_code(&self.language).unwrap_or_default()
    }

    /// Editor commands to try, in order.
    pub fn editor_candidates(&self) -> Vec<String> {
        let mut editors: Vec<String> = Vec::new();
        if let Some(editor) = &self.editor {
            editors.push(editor.clone());
        }
        for var in ["VISUAL", "EDITOR"] {
            if let Ok(editor) = std::env::var(var) {
                if !editor.trim().is_empty() {
                    editors.push(editor);
                }
            }
        }
        editors.extend(["nvim", "vim", "nano"].map(String::from));
        editors
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.log_level))
    }
}

/// Compact logs on stderr, for one-shot commands.
pub fn init_stderr_logging(config: &Config) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(config.env_filter())
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

/// Logs appended to `<data_dir>/console-rules.log`, keeping the terminal free for the UI.
pub fn init_file_logging(config: &Config, data_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(data_dir)?;
    let path = data_dir.join(LOG_FILE);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(config.env_filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();

    info!("logging to {}", path.display());
    Ok(path)
}
