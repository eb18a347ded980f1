use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Result, SyncError};

/// Placeholder written into `server:` when no host override is configured.
/// Left in the output on purpose so the consumer notices and edits it.
pub const SERVER_PLACEHOLDER: &str = "YOUR_SERVER_IP";

pub const DEFAULT_INBOUND_ID: i64 = 1;
pub const DEFAULT_INDEX_FILENAME: &str = "0 Clash client config files.txt";
pub const DEFAULT_GIST_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_GIST_RAW_BASE: &str = "https://gist.githubusercontent.com";

/// Field layout policy for generated proxies.
///
/// Two layouts exist in the wild and neither is canonical, so both are kept
/// as named profiles.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum FieldProfile {
    /// `flow` is emitted only when the panel client record carries one.
    #[default]
    ClientFlow,
    /// Reality inbounds always get `flow: xtls-rprx-vision`, whatever the
    /// client record says.
    RealityVision,
}

impl fmt::Display for FieldProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientFlow => write!(f, "client-flow"),
            Self::RealityVision => write!(f, "reality-vision"),
        }
    }
}

/// Generator settings, read from the optional TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorSettings {
    pub profile: FieldProfile,
    /// Inbound protocols the proxy builder accepts; others produce no output.
    pub supported_protocols: Vec<String>,
    pub strip_comments: bool,
    pub output_dir: PathBuf,
    pub extra_servers: PathBuf,
    /// Custom template; the embedded one is used when unset.
    pub template: Option<PathBuf>,
    pub index_filename: String,
    pub gist_api_base: String,
    pub gist_raw_base: String,
    pub upload: bool,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            profile: FieldProfile::default(),
            supported_protocols: vec!["vless".to_string()],
            strip_comments: true,
            output_dir: PathBuf::from("generated_configs"),
            extra_servers: PathBuf::from("extra_servers.yaml"),
            template: None,
            index_filename: DEFAULT_INDEX_FILENAME.to_string(),
            gist_api_base: DEFAULT_GIST_API_BASE.to_string(),
            gist_raw_base: DEFAULT_GIST_RAW_BASE.to_string(),
            upload: true,
        }
    }
}

impl GeneratorSettings {
    pub fn from_toml(content: &str) -> Result<Self> {
        let mut settings: Self = toml::from_str(content)
            .map_err(|e| SyncError::Config(format!("invalid settings file: {e}")))?;
        settings.expand_paths()?;
        Ok(settings)
    }

    /// Read settings from `path`. Unlike the extra-servers file, an explicitly
    /// named settings file must exist.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SyncError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    pub fn supports(&self, protocol: &str) -> bool {
        self.supported_protocols.iter().any(|p| p == protocol)
    }

    fn expand_paths(&mut self) -> Result<()> {
        self.output_dir = expand_path(&self.output_dir)?;
        self.extra_servers = expand_path(&self.extra_servers)?;
        if let Some(template) = self.template.take() {
            self.template = Some(expand_path(&template)?);
        }
        Ok(())
    }
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    let raw = path.to_string_lossy();
    shellexpand::full(&raw)
        .map(|expanded| PathBuf::from(expanded.as_ref()))
        .map_err(|e| SyncError::Config(format!("cannot expand path '{raw}': {e}")))
}

/// Panel credentials and the inbound to sync.
#[derive(Clone)]
pub struct PanelConfig {
    pub url: String,
    pub username: String,
    pub password: String,
    pub inbound_id: i64,
}

impl fmt::Debug for PanelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanelConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("inbound_id", &self.inbound_id)
            .finish()
    }
}

/// Gist identifiers. Each is optional: a missing token or id only skips the
/// upload, a missing owner only skips the index file.
#[derive(Clone, Default)]
pub struct GistConfig {
    pub id: Option<String>,
    pub token: Option<String>,
    pub owner: Option<String>,
}

impl fmt::Debug for GistConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GistConfig")
            .field("id", &self.id)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("owner", &self.owner)
            .finish()
    }
}

/// Run configuration. Built once at startup and only ever borrowed.
#[derive(Debug, Clone)]
pub struct Config {
    pub panel: PanelConfig,
    pub gist: GistConfig,
    pub server_host: Option<String>,
    pub generator: GeneratorSettings,
}

impl Config {
    /// Build from process environment variables.
    pub fn from_env(generator: GeneratorSettings) -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), generator)
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F, generator: GeneratorSettings) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &str| {
            get(key).ok_or_else(|| SyncError::Config(format!("{key} must be set")))
        };

        let inbound_id = match get("INBOUND_ID") {
            Some(raw) => raw.parse::<i64>().map_err(|_| {
                SyncError::Config(format!("INBOUND_ID must be an integer, got '{raw}'"))
            })?,
            None => DEFAULT_INBOUND_ID,
        };

        Ok(Self {
            panel: PanelConfig {
                url: require("PANEL_URL")?.trim_end_matches('/').to_string(),
                username: require("PANEL_USERNAME")?,
                password: require("PANEL_PASSWORD")?,
                inbound_id,
            },
            gist: GistConfig {
                id: get("GIST_ID"),
                token: get("GITHUB_TOKEN"),
                owner: get("GITHUB_USERNAME"),
            },
            server_host: get("SERVER_HOST"),
            generator,
        })
    }

    /// Address written into every generated proxy.
    pub fn server_address(&self) -> &str {
        self.server_host.as_deref().unwrap_or(SERVER_PLACEHOLDER)
    }
}
