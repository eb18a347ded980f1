//! Client config rendering.
//!
//! A Jinja-style template receives `all_proxies` (client proxy first, then
//! extras) and a `to_yaml` filter that dumps one proxy as block YAML in its
//! original key order.

pub mod comments;
pub mod index;

pub use comments::strip_comments;
pub use index::build_index;

use std::path::Path;

use minijinja::{context, Environment, ErrorKind};

use crate::config::GeneratorSettings;
use crate::error::{Result, SyncError};
use crate::proxy::ProxyDescriptor;

/// Template shipped with the binary.
pub const DEFAULT_TEMPLATE: &str = include_str!("../../templates/clash_client_template.yaml.j2");

// No file extension: extension-based auto-escaping must stay off.
const TEMPLATE_NAME: &str = "clash_client";

pub struct Renderer {
    env: Environment<'static>,
    strip_comments: bool,
}

impl Renderer {
    /// Compile `source`. Syntax errors surface here rather than per client.
    pub fn new(source: String, strip_comments: bool) -> Result<Self> {
        let mut env = Environment::new();
        env.add_filter("to_yaml", to_yaml);
        env.add_template_owned(TEMPLATE_NAME, source)?;
        Ok(Self {
            env,
            strip_comments,
        })
    }

    /// Renderer for the configured template, or the embedded default.
    pub fn from_settings(settings: &GeneratorSettings) -> Result<Self> {
        let source = match settings.template.as_deref() {
            Some(path) => read_template(path)?,
            None => DEFAULT_TEMPLATE.to_string(),
        };
        Self::new(source, settings.strip_comments)
    }

    pub fn render(&self, proxies: &[ProxyDescriptor]) -> Result<String> {
        let template = self.env.get_template(TEMPLATE_NAME)?;
        let raw = template.render(context! { all_proxies => proxies })?;
        Ok(if self.strip_comments {
            strip_comments(&raw)
        } else {
            raw
        })
    }
}

fn read_template(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| SyncError::Render(format!("failed to read {}: {e}", path.display())))
}

/// `{{ value | to_yaml }}`: block-style YAML without the trailing newline.
fn to_yaml(value: minijinja::Value) -> std::result::Result<String, minijinja::Error> {
    serde_yaml::to_string(&value)
        .map(|yaml| yaml.trim_end().to_string())
        .map_err(|e| {
            minijinja::Error::new(
                ErrorKind::InvalidOperation,
                format!("cannot serialize value as YAML: {e}"),
            )
        })
}
