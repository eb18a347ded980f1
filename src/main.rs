use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use clash_gist_sync::{Config, FieldProfile, GeneratorSettings, SyncReport, UploadOutcome};

/// Generate per-client Clash configs from a 3x-ui inbound and publish them to a Gist.
///
/// Credentials and identifiers are read from the environment (or `.env`):
/// PANEL_URL, PANEL_USERNAME, PANEL_PASSWORD, INBOUND_ID, GIST_ID,
/// GITHUB_TOKEN, GITHUB_USERNAME, SERVER_HOST.
#[derive(Debug, Parser)]
#[command(name = "clash-gist-sync", version, about)]
struct Cli {
    /// TOML file with generator settings.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for generated per-client configs.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Field layout profile.
    #[arg(long, value_enum)]
    profile: Option<FieldProfile>,

    /// Write files locally but skip the Gist upload.
    #[arg(long)]
    no_upload: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn generator_settings(&self) -> Result<GeneratorSettings> {
        let mut settings = match &self.config {
            Some(path) => GeneratorSettings::load(path)?,
            None => GeneratorSettings::default(),
        };
        if let Some(dir) = &self.output_dir {
            settings.output_dir = dir.clone();
        }
        if let Some(profile) = self.profile {
            settings.profile = profile;
        }
        if self.no_upload {
            settings.upload = false;
        }
        Ok(settings)
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn print_summary(report: &SyncReport) {
    println!();
    println!(
        "  {} {}: {} config(s) written, {} client(s) skipped",
        console::style("\u{2713}").green().bold(),
        report.inbound,
        report.written.len(),
        report.skipped_clients,
    );
    if let Some(index) = &report.index_file {
        println!("    index: {index}");
    }
    let upload = match &report.upload {
        UploadOutcome::Uploaded { files } => {
            console::style(format!("uploaded {files} file(s)")).green()
        }
        UploadOutcome::Skipped(reason) => console::style(format!("skipped ({reason})")).yellow(),
        UploadOutcome::Failed(reason) => console::style(format!("failed ({reason})")).red(),
        UploadOutcome::NothingToUpload => console::style("nothing to upload".to_string()).yellow(),
    };
    println!("    gist: {upload}");
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match cli
        .generator_settings()
        .and_then(|settings| Config::from_env(settings).map_err(Into::into))
    {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::FAILURE;
        }
    };
    tracing::debug!(?config, "configuration loaded");

    match clash_gist_sync::run(&config).await {
        Ok(report) => {
            print_summary(&report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("sync aborted: {e}");
            ExitCode::FAILURE
        }
    }
}
