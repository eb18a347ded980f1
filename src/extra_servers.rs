//! Static extra proxies appended to every generated config.
//!
//! The file is optional. A missing, unreadable or malformed file degrades to
//! an empty list with a warning; it never fails the run. Entries without a
//! non-empty string `name` are skipped.

use std::path::Path;

use serde_yaml::Value;

use crate::proxy::ProxyDescriptor;

/// Load extra proxies from a YAML file whose root is a list of mappings.
pub async fn load_extra_servers(path: &Path) -> Vec<ProxyDescriptor> {
    if !path.exists() {
        tracing::debug!("no extra servers file at {}", path.display());
        return Vec::new();
    }

    let data = match tokio::fs::read_to_string(path).await {
        Ok(d) => d,
        Err(e) => {
            tracing::warn!("failed to read extra servers at {}: {e}", path.display());
            return Vec::new();
        }
    };

    parse_extra_servers(&data, path)
}

fn parse_extra_servers(data: &str, path: &Path) -> Vec<ProxyDescriptor> {
    if data.trim().is_empty() {
        return Vec::new();
    }
    let root: Value = match serde_yaml::from_str(data) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("malformed extra servers at {}, ignoring: {e}", path.display());
            return Vec::new();
        }
    };

    let items = match root {
        Value::Sequence(items) => items,
        Value::Null => return Vec::new(),
        _ => {
            tracing::warn!(
                "extra servers at {} must be a list of proxies, ignoring",
                path.display()
            );
            return Vec::new();
        }
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let descriptor = match item {
                Value::Mapping(mapping) => ProxyDescriptor::from_mapping(mapping),
                _ => None,
            };
            let Some(descriptor) = descriptor else {
                tracing::warn!(
                    "skipping extra server #{index} in {}: not a string-keyed mapping",
                    path.display()
                );
                return None;
            };
            if descriptor.name().is_none_or(|name| name.trim().is_empty()) {
                tracing::warn!(
                    "skipping extra server #{index} in {}: missing name",
                    path.display()
                );
                return None;
            }
            Some(descriptor)
        })
        .collect()
}
