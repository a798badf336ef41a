use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::llm::{DEFAULT_API_VERSION, DEFAULT_CHAT_API_VERSION};

pub const ENV_ENDPOINT: &str = "PROJECT_ENDPOINT";
pub const ENV_MODEL: &str = "MODEL_DEPLOYMENT_NAME";
pub const DEFAULT_AGENT_NAME: &str = "support-agent";
pub const DEFAULT_INSTRUCTIONS: &str = "You are a technical support agent.
When a user has a technical issue, you get their email address and a description of the issue.
Then you use those values to submit a support ticket using the function available to you.
If a file is saved, tell the user the file name.";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} is not set (export it or add it to .env)")]
    Missing(&'static str),

    #[error("{name} must be an http(s) URL, got {value:?}")]
    InvalidEndpoint { name: &'static str, value: String },

    #[error("agent name may only use letters, digits, '-', '_' and '.', got {0:?}")]
    InvalidAgentName(String),

    #[error("cannot determine the ticket directory: {0}")]
    TicketDir(#[source] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub endpoint: String,
    pub model: String,
    pub agent_name: String,
    pub instructions: String,
    pub api_version: String,
    pub chat_api_version: String,
    pub ticket_dir: PathBuf,
    pub http: HttpConfig,
    pub clear_screen: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct HttpConfig {
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 5_000,
            request_timeout_ms: 120_000,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct FileConfig {
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub agent_name: Option<String>,
    pub instructions: Option<String>,
    pub api_version: Option<String>,
    pub chat_api_version: Option<String>,
    pub ticket_dir: Option<PathBuf>,
    pub clear_screen: Option<bool>,
    pub http: Option<PartialHttpConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct PartialHttpConfig {
    pub connect_timeout_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
}

impl AppConfig {
    pub fn from_cli(cli: &crate::Cli) -> Result<Self, ConfigError> {
        let project_root = std::env::current_dir().map_err(ConfigError::TicketDir)?;
        let project_cfg = load_project_config(&project_root);
        let file_cfg = load_file_config();
        Self::resolve(
            cli,
            |k| std::env::var(k).ok(),
            project_cfg,
            file_cfg,
        )
    }

    /// Merge CLI > env > project file > global file > defaults, then validate.
    pub fn resolve(
        cli: &crate::Cli,
        env: impl Fn(&str) -> Option<String>,
        project_cfg: FileConfig,
        file_cfg: FileConfig,
    ) -> Result<Self, ConfigError> {
        let env = |k: &str| env(k).filter(|v| !v.trim().is_empty());

        let endpoint = cli
            .endpoint
            .clone()
            .or_else(|| env(ENV_ENDPOINT))
            .or(project_cfg.endpoint)
            .or(file_cfg.endpoint)
            .ok_or(ConfigError::Missing(ENV_ENDPOINT))?;
        validate_endpoint(&endpoint)?;

        let model = cli
            .model
            .clone()
            .or_else(|| env(ENV_MODEL))
            .or(project_cfg.model)
            .or(file_cfg.model)
            .filter(|m| !m.trim().is_empty())
            .ok_or(ConfigError::Missing(ENV_MODEL))?;

        let agent_name = cli
            .agent_name
            .clone()
            .or_else(|| env("SUPPORT_AGENT_NAME"))
            .or(project_cfg.agent_name)
            .or(file_cfg.agent_name)
            .unwrap_or_else(|| DEFAULT_AGENT_NAME.to_string());
        validate_agent_name(&agent_name)?;

        let instructions = project_cfg
            .instructions
            .or(file_cfg.instructions)
            .unwrap_or_else(|| DEFAULT_INSTRUCTIONS.to_string());

        let api_version = cli
            .api_version
            .clone()
            .or_else(|| env("SUPPORT_AGENT_API_VERSION"))
            .or(project_cfg.api_version)
            .or(file_cfg.api_version)
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());

        let chat_api_version = cli
            .chat_api_version
            .clone()
            .or_else(|| env("SUPPORT_AGENT_CHAT_API_VERSION"))
            .or(project_cfg.chat_api_version)
            .or(file_cfg.chat_api_version)
            .unwrap_or_else(|| DEFAULT_CHAT_API_VERSION.to_string());

        let ticket_dir = match cli
            .ticket_dir
            .clone()
            .or_else(|| env("SUPPORT_AGENT_TICKET_DIR").map(PathBuf::from))
            .or(project_cfg.ticket_dir)
            .or(file_cfg.ticket_dir)
        {
            Some(dir) => dir,
            None => default_ticket_dir()?,
        };

        let http_defaults = HttpConfig::default();
        let project_http = project_cfg.http.unwrap_or_default();
        let file_http = file_cfg.http.unwrap_or_default();
        let http = HttpConfig {
            connect_timeout_ms: project_http
                .connect_timeout_ms
                .or(file_http.connect_timeout_ms)
                .unwrap_or(http_defaults.connect_timeout_ms),
            request_timeout_ms: project_http
                .request_timeout_ms
                .or(file_http.request_timeout_ms)
                .unwrap_or(http_defaults.request_timeout_ms),
        };

        let clear_screen = !cli.no_clear
            && project_cfg
                .clear_screen
                .or(file_cfg.clear_screen)
                .unwrap_or(true);

        Ok(Self {
            endpoint,
            model,
            agent_name,
            instructions,
            api_version,
            chat_api_version,
            ticket_dir,
            http,
            clear_screen,
        })
    }
}

fn validate_endpoint(endpoint: &str) -> Result<(), ConfigError> {
    let invalid = || ConfigError::InvalidEndpoint {
        name: ENV_ENDPOINT,
        value: endpoint.to_string(),
    };
    let url = reqwest::Url::parse(endpoint).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(invalid());
    }
    Ok(())
}

/// The name is used as a URL path segment.
fn validate_agent_name(name: &str) -> Result<(), ConfigError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && name != "."
        && name != "..";
    if !valid {
        return Err(ConfigError::InvalidAgentName(name.to_string()));
    }
    Ok(())
}

/// Tickets land next to the executable unless configured otherwise.
pub fn default_ticket_dir() -> Result<PathBuf, ConfigError> {
    let exe = std::env::current_exe().map_err(ConfigError::TicketDir)?;
    Ok(exe
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(".")))
}

pub fn load_file_config() -> FileConfig {
    fn candidate_paths() -> Vec<PathBuf> {
        let mut v = Vec::new();
        if let Ok(p) = std::env::var("SUPPORT_AGENT_CONFIG") {
            v.push(PathBuf::from(p));
        }
        if let Some(dir) = dirs::config_dir() {
            v.push(dir.join("support-agent/config.toml"));
        }
        if let Some(home) = dirs::home_dir() {
            v.push(home.join(".config/support-agent/config.toml"));
        }
        v
    }

    for p in candidate_paths() {
        if p.exists()
            && let Some(cfg) = read_config(&p)
        {
            return cfg;
        }
    }
    FileConfig::default()
}

/// Load project-specific configuration from .support-agent/config.toml
pub fn load_project_config(project_root: &Path) -> FileConfig {
    let path = project_root.join(".support-agent").join("config.toml");
    if path.exists() {
        read_config(&path).unwrap_or_default()
    } else {
        FileConfig::default()
    }
}

fn read_config(path: &Path) -> Option<FileConfig> {
    let s = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            warn!(path=%path.display(), error=%e, "read config failed");
            return None;
        }
    };
    match toml::from_str::<FileConfig>(&s) {
        Ok(cfg) => {
            info!(path=%path.display(), "loaded config file");
            Some(cfg)
        }
        Err(e) => {
            warn!(path=%path.display(), error=%e.to_string(), "parse config failed");
            None
        }
    }
}

#[cfg(test)]
mod tests;
