//! One sync run: panel → proxies → rendered files → index → Gist.
//!
//! Steps run strictly in order. Login, lookup, parse and template failures
//! abort before any file is written; upload problems are logged and recorded
//! in the report, since the local files are already on disk by then.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{Result, SyncError};
use crate::extra_servers::load_extra_servers;
use crate::gist::{FileSet, GistPublisher};
use crate::panel::{parse_settings, GeneralSettings, Inbound, PanelSession, SecurityMode, StreamSettings};
use crate::proxy::{build_client_proxy, BuildOptions, ProxyDescriptor};
use crate::render::{build_index, Renderer};

/// What happened to the upload step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Uploaded { files: usize },
    /// Upload not attempted; the reason is logged as a warning.
    Skipped(String),
    Failed(String),
    NothingToUpload,
}

#[derive(Debug, Clone)]
pub struct SyncReport {
    pub inbound: String,
    /// Per-client files written to the output directory, in client order.
    pub written: Vec<PathBuf>,
    pub skipped_clients: usize,
    pub index_file: Option<String>,
    pub upload: UploadOutcome,
}

/// Per-client configs rendered for one inbound.
#[derive(Debug, Default)]
pub struct Generated {
    /// `(filename, content)` in client order.
    pub files: Vec<(String, String)>,
    pub skipped: usize,
}

pub async fn run(config: &Config) -> Result<SyncReport> {
    let session = PanelSession::login(&config.panel).await?;
    let inbound = session.fetch_inbound(config.panel.inbound_id).await?;
    tracing::info!(
        "processing inbound: {} ({})",
        inbound.remark,
        inbound.protocol
    );

    let (stream, general) = parse_settings(&inbound)?;
    tracing::info!("found {} clients", general.clients.len());

    let extras = load_extra_servers(&config.generator.extra_servers).await;
    if !extras.is_empty() {
        tracing::info!("loaded {} extra servers", extras.len());
    }

    let renderer = Renderer::from_settings(&config.generator)?;
    let generated = generate(config, &inbound, &stream, &general, &extras, &renderer)?;
    let written = write_files(&config.generator.output_dir, &generated.files).await?;

    let mut upload_set: FileSet = generated.files.into_iter().collect();
    let index_file = attach_index(config, &mut upload_set);
    let upload = publish_files(config, &upload_set).await;

    Ok(SyncReport {
        inbound: inbound.remark,
        written,
        skipped_clients: generated.skipped,
        index_file,
        upload,
    })
}

/// Render one config per eligible client. No I/O.
pub fn generate(
    config: &Config,
    inbound: &Inbound,
    stream: &StreamSettings,
    general: &GeneralSettings,
    extras: &[ProxyDescriptor],
    renderer: &Renderer,
) -> Result<Generated> {
    if !config.generator.supports(&inbound.protocol) {
        tracing::warn!(
            "inbound protocol '{}' is not in supported_protocols {:?}; no configs generated",
            inbound.protocol,
            config.generator.supported_protocols
        );
    } else if stream.security_mode() == SecurityMode::Reality {
        tracing::info!(
            "reality inbound: generated proxies set skip-cert-verify, the server is \
             authenticated by its reality public key instead"
        );
    }

    let options = BuildOptions::from_config(config);
    let mut generated = Generated::default();

    for client in &general.clients {
        let Some((email, _)) = client.identity() else {
            tracing::debug!("skipping client without email or id");
            generated.skipped += 1;
            continue;
        };
        let Some(filename) = client_filename(email) else {
            tracing::warn!("skipping client '{email}': email is not usable as a file name");
            generated.skipped += 1;
            continue;
        };
        let Some(proxy) = build_client_proxy(client, inbound, stream, general, &options) else {
            generated.skipped += 1;
            continue;
        };

        let mut all_proxies = Vec::with_capacity(extras.len() + 1);
        all_proxies.push(proxy);
        all_proxies.extend_from_slice(extras);
        let content = renderer.render(&all_proxies)?;

        if let Some(existing) = generated.files.iter_mut().find(|(name, _)| *name == filename) {
            tracing::warn!("duplicate client email '{email}', later client wins");
            existing.1 = content;
        } else {
            generated.files.push((filename, content));
        }
    }

    Ok(generated)
}

/// `{email}.yaml`, or `None` when the email could escape the output dir.
pub fn client_filename(email: &str) -> Option<String> {
    let unsafe_name = email == "."
        || email == ".."
        || email.contains(['/', '\\', '\0']);
    (!unsafe_name).then(|| format!("{email}.yaml"))
}

async fn write_files(dir: &Path, files: &[(String, String)]) -> Result<Vec<PathBuf>> {
    let io_err = |path: &Path, e: std::io::Error| SyncError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| io_err(dir, e))?;

    let mut written = Vec::with_capacity(files.len());
    for (filename, content) in files {
        let path = dir.join(filename);
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| io_err(&path, e))?;
        tracing::info!("generated {filename}");
        written.push(path);
    }
    Ok(written)
}

/// Add the download index to the upload set when owner and Gist id are known.
fn attach_index(config: &Config, files: &mut FileSet) -> Option<String> {
    if files.is_empty() {
        return None;
    }
    let (Some(owner), Some(gist_id)) = (&config.gist.owner, &config.gist.id) else {
        tracing::info!("GITHUB_USERNAME or GIST_ID not set, skipping index file");
        return None;
    };

    let names: Vec<&String> = files.keys().collect();
    let index = build_index(&names, &config.generator.gist_raw_base, owner, gist_id);
    let index_name = config.generator.index_filename.clone();
    files.insert(index_name.clone(), index);
    tracing::info!("index file generated: {index_name}");
    Some(index_name)
}

async fn publish_files(config: &Config, files: &FileSet) -> UploadOutcome {
    if files.is_empty() {
        tracing::warn!("no configs generated, nothing to upload");
        return UploadOutcome::NothingToUpload;
    }
    if !config.generator.upload {
        tracing::info!("upload disabled, keeping {} local files", files.len());
        return UploadOutcome::Skipped("upload disabled".to_string());
    }

    let publisher = match GistPublisher::new(&config.gist, &config.generator.gist_api_base) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!("{e}; skipping upload");
            return UploadOutcome::Skipped(e.to_string());
        }
    };

    match publisher.publish(files).await {
        Ok(()) => UploadOutcome::Uploaded { files: files.len() },
        Err(e) => {
            tracing::error!("{e}");
            UploadOutcome::Failed(e.to_string())
        }
    }
}
