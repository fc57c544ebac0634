//! drive-owner - recursive Google Drive ownership transfer
//!
//! Walks a Drive folder tree and transfers every file and folder owned by the
//! authenticated user to a new owner.

mod cli;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use drive::{
    AuthOptions, Backoff, BackoffOptions, DriveAuth, DriveClient, DriveCredentials, ThreadSleeper,
    TransferReport, transfer_ownership,
};
use log::{info, warn};

use logging::log_and_return_error;

fn main() -> Result<()> {
    let args = cli::Args::parse();
    logging::init(args.log_filter());
    run(args).map_err(log_and_return_error)
}

fn run(args: cli::Args) -> Result<()> {
    if let Err(e) = config::init() {
        warn!("Failed to initialize config directory: {:#}", e);
    }

    let credentials = DriveCredentials::load(args.credentials.as_deref()).with_context(|| {
        let default_path = DriveCredentials::default_credentials_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "~/.config/drive-owner/client_secrets.json".to_string());
        format!(
            "Google OAuth credentials not found. Pass --credentials, place client_secrets.json \
             in the working directory or at {}, or set DRIVE_CLIENT_ID and DRIVE_CLIENT_SECRET",
            default_path
        )
    })?;

    let auth = DriveAuth::new(
        credentials,
        AuthOptions {
            host: args.host.clone(),
            port: args.port,
            token_path: args.token_cache.clone(),
        },
    )?;
    let client = DriveClient::new(auth);
    client.authenticate().context("Authentication failed")?;

    let backoff = Backoff::new(
        BackoffOptions {
            reset_on_success: args.reset_backoff,
            ..BackoffOptions::default()
        },
        Box::new(ThreadSleeper),
    );

    let report = transfer_ownership(
        &client,
        &args.transfer_options(),
        args.failure_policy(),
        backoff,
    )?;

    write_dead_letters(&args, &report)?;
    Ok(())
}

fn write_dead_letters(args: &cli::Args, report: &TransferReport) -> Result<()> {
    if report.dead_letters.is_empty() {
        return Ok(());
    }
    config::save_json_file(&args.dead_letter_file, &report.dead_letters)
        .context("Failed to write dead-letter file")?;
    info!(
        "{} failed transfers written to {}",
        report.dead_letters.len(),
        args.dead_letter_file.display()
    );
    Ok(())
}
