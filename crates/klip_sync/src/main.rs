//! klip-sync: one-shot download of pending klip articles.
//!
//! Exit status is 0 when the run completed (including when nothing was
//! pending or every download failed) and 1 on any fatal error.
mod cli;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use klip_engine::{
    default_config_path, ensure_download_dir, load_config, ReqwestRemoteClient, SyncError,
    SyncPipeline,
};
use klip_logging::{klip_error, klip_warn};

use cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    klip_logging::initialize(cli.log_destination(), cli.log_level());
    exit_code(run(cli.config))
}

fn exit_code(result: anyhow::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            klip_error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(config_override: Option<PathBuf>) -> anyhow::Result<()> {
    let config_path = match config_override {
        Some(path) => path,
        None => default_config_path()?,
    };
    let config = load_config(&config_path)?;
    ensure_download_dir(&config.download_path)?;

    let client = ReqwestRemoteClient::new(&config.server_url, config.remote_settings())?;
    let pipeline = SyncPipeline::new(client, &config.download_path);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;

    match runtime.block_on(pipeline.run()) {
        Ok(_) => Ok(()),
        Err(SyncError::Acknowledge { source, report }) => {
            klip_warn!(
                "{} article(s) are stored locally but still pending on the server",
                report.success_set().len()
            );
            Err(source).context("failed to batch delete downloaded articles")
        }
        Err(err) => Err(err.into()),
    }
}
