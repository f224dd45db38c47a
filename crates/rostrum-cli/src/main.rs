//! rostrum - keep the ward's speaker rotation lists current.
//!
//! Pulls the member list from the membership directory, reads who spoke when
//! from the ward spreadsheet, and writes back a ranked list of potential
//! adult and youth speakers: those who have never spoken first, then
//! everyone else from the longest ago.

use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rostrum_core::api::DirectoryClient;
use rostrum_core::auth::{google, ClientSecret, CredentialStore};
use rostrum_core::pipeline::GroupReport;
use rostrum_core::sheets::SheetsClient;
use rostrum_core::{Config, SpeakerSync, SyncReport};

// ============================================================================
// Constants
// ============================================================================

/// Default log filter when RUST_LOG is not set
const DEFAULT_LOG_FILTER: &str = "info";

/// Prefix of the daily log files written to `log_dir`
const LOG_FILE_PREFIX: &str = "rostrum.log";

const USAGE: &str = "\
Usage: rostrum [OPTION]

Rank potential adult and youth speakers and write the lists to the ward spreadsheet.

Options:
  --dry-run           Rank and print the lists without changing the spreadsheet
  --authorize         Authorize access to Google Sheets and save the token
  --forget-password   Remove the stored directory password from the keychain
  -h, --help          Show this help
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Sync { dry_run: bool },
    Authorize,
    ForgetPassword,
    Help,
}

impl Command {
    fn parse(args: &[String]) -> Result<Self> {
        match args.get(1).map(String::as_str) {
            None => Ok(Command::Sync { dry_run: false }),
            Some("--dry-run") => Ok(Command::Sync { dry_run: true }),
            Some("--authorize") => Ok(Command::Authorize),
            Some("--forget-password") => Ok(Command::ForgetPassword),
            Some("-h") | Some("--help") => Ok(Command::Help),
            Some(other) => Err(anyhow::anyhow!("Unknown option {}\n\n{}", other, USAGE)),
        }
    }
}

/// Initialize the tracing subscriber for logging. Logs go to stderr, and
/// also to a daily file when `log_dir` is set; the returned guard flushes
/// that file on drop.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().collect();
    let config = Config::load();

    let log_dir = config.as_ref().ok().and_then(|c| c.log_dir.clone());
    let _guard = init_tracing(log_dir.as_deref());

    let result = match config {
        Ok(config) => run(&args, config).await,
        Err(e) => Err(e.context("Failed to load configuration")),
    };

    if let Err(e) = result {
        error!(error = %format!("{:#}", e), "rostrum failed");
        eprintln!("Error: {:#}", e);
        drop(_guard);
        std::process::exit(1);
    }
}

async fn run(args: &[String], config: Config) -> Result<()> {
    match Command::parse(args)? {
        Command::Sync { dry_run } => sync(&config, dry_run).await,
        Command::Authorize => authorize().await,
        Command::ForgetPassword => forget_password(&config),
        Command::Help => {
            print!("{}", USAGE);
            Ok(())
        }
    }
}

async fn sync(config: &Config, dry_run: bool) -> Result<()> {
    // Configuration problems surface before anything touches the network
    let settings = config.run_settings()?;
    let blacklist = config.load_blacklist()?;
    let token_path = Config::token_path()?;

    info!(unit = %settings.unit_number, dry_run = dry_run, "Speaker sync starting");

    let access_token = google::valid_access_token(&token_path)
        .await
        .context("Failed to get Google access token")?;
    let sheets = SheetsClient::new(&settings.spreadsheet_id, access_token)?;

    let directory = DirectoryClient::new(&config.directory)?;
    let (password, prompted) = match config.password.clone() {
        Some(password) => (password, false),
        None => match CredentialStore::get_password(&settings.username) {
            Some(password) => (password, false),
            None => (prompt_password(&settings.username)?, true),
        },
    };
    directory
        .authenticate(&settings.username, &password)
        .await
        .context("Failed to sign in to the membership directory")?;
    if prompted {
        if let Err(e) = CredentialStore::store(&settings.username, &password) {
            warn!(error = %e, "Failed to store directory password");
        }
    }
    let roster = directory.for_unit(settings.unit_number.clone());

    let report = SpeakerSync::new(&roster, &sheets, &blacklist, &config.layout)
        .dry_run(dry_run)
        .run()
        .await?;

    if dry_run {
        print_report(&report);
    }
    info!(
        members = report.roster_size,
        skipped_rows = report.issue_count(),
        dry_run = report.dry_run,
        "Speaker sync finished"
    );
    Ok(())
}

fn prompt_password(username: &str) -> Result<String> {
    let password = rpassword::prompt_password(format!("Directory password for {}: ", username))?;
    Ok(password)
}

fn print_report(report: &SyncReport) {
    for group in &report.groups {
        print_group(group);
    }
}

fn print_group(report: &GroupReport) {
    println!("Potential {} Speakers ({})", report.group, report.candidates.len());
    for candidate in &report.candidates {
        println!(
            "  {:<32} {:<16} {}",
            candidate.name, candidate.phone, candidate.last_spoken
        );
    }
    for issue in &report.issues {
        println!("  ! {}", issue);
    }
    println!();
}

/// Run the installed-app consent flow and save the resulting token.
async fn authorize() -> Result<()> {
    let secret = ClientSecret::load(&Config::client_secret_candidates()?)?;
    let url = secret.authorization_url()?;

    eprintln!("Open this URL in a browser and approve access to Google Sheets:\n\n{}\n", url);
    eprint!("Paste the code (or the full URL you were redirected to): ");
    io::stderr().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let code = google::extract_code(&input)
        .ok_or_else(|| anyhow::anyhow!("No authorization code found in the pasted text"))?;

    let token = google::exchange_code(&secret, &code).await?;
    if token.refresh_token.is_none() {
        warn!("No refresh token issued; you will need to authorize again when this one expires");
    }

    let path = Config::token_path()?;
    google::save_token(&path, &token)?;
    eprintln!("Saved Google token to {}", path.display());
    Ok(())
}

fn forget_password(config: &Config) -> Result<()> {
    let username = config
        .username
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("No directory username configured"))?;
    CredentialStore::delete(username)?;
    eprintln!("Removed stored password for {}", username);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("rostrum")
            .chain(list.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_command_parse() {
        assert_eq!(Command::parse(&args(&[])).unwrap(), Command::Sync { dry_run: false });
        assert_eq!(Command::parse(&args(&["--dry-run"])).unwrap(), Command::Sync { dry_run: true });
        assert_eq!(Command::parse(&args(&["--authorize"])).unwrap(), Command::Authorize);
        assert_eq!(Command::parse(&args(&["--forget-password"])).unwrap(), Command::ForgetPassword);
        assert_eq!(Command::parse(&args(&["-h"])).unwrap(), Command::Help);
    }

    #[test]
    fn test_command_parse_unknown() {
        let err = Command::parse(&args(&["--frobnicate"])).expect_err("unknown flag");
        assert!(err.to_string().starts_with("Unknown option --frobnicate"));
    }
}
