//! totalrecall - Windows Recall store extraction
//!
//! Copies a user's Recall store (`ukg.db` and `ImageStore`) into a
//! timestamp-named extraction folder and writes a `TotalRecall.txt` timeline
//! of captured window titles and screenshots.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Logs: $XDG_STATE_HOME/totalrecall/totalrecall.<date>.log (~/.local/state/totalrecall/)
//! - Config: $XDG_CONFIG_HOME/totalrecall/config.toml (~/.config/totalrecall/config.toml)

mod prompt;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use totalrecall_core::config::ReportTimezone;
use totalrecall_core::source::{base_path_for_user, IcaclsGranter, NoopGranter, PermissionGranter};
use totalrecall_core::{Config, ExtractionSummary, Extractor, ExtractorSettings, Stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "totalrecall")]
#[command(about = "Extract a Windows Recall store and summarize its captures")]
#[command(version)]
struct Args {
    /// Windows user whose store is extracted (prompted for if omitted)
    #[arg(short, long)]
    username: Option<String>,

    /// Store root (the UKP folder), bypassing username lookup
    #[arg(long, value_name = "DIR")]
    base_path: Option<PathBuf>,

    /// Directory in which the extraction folder is created
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Extract without asking for confirmation
    #[arg(short, long)]
    yes: bool,

    /// Do not run icacls on the store before reading it
    #[arg(long)]
    skip_permissions: bool,

    /// Pick the GUID folder by name instead of directory listing order
    #[arg(long)]
    sort_subfolders: bool,

    /// Order report entries by timestamp instead of table order
    #[arg(long)]
    order_by_timestamp: bool,

    /// Render report timestamps in local time instead of UTC
    #[arg(long)]
    local_time: bool,

    /// Summary output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Verbose output on stderr (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Config file to use instead of the XDG default
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let core_error = err.downcast_ref::<totalrecall_core::Error>();
            if core_error.is_some_and(|e| e.is_aborted()) {
                eprintln!("Extraction aborted");
                return ExitCode::SUCCESS;
            }

            // Stage errors already carry their cause in the message
            match core_error {
                Some(e) => eprintln!("Error: {}", e),
                None => eprintln!("Error: {:#}", err),
            }
            let code = core_error.map(|e| e.exit_code()).unwrap_or(1);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("failed to load configuration")?;
    apply_overrides(&mut config, args);

    let stderr_level = match args.verbose {
        0 => None,
        1 => Some("debug"),
        _ => Some("trace"),
    };
    let _log_guard = totalrecall_core::logging::init(&config.logging, stderr_level)
        .context("failed to initialize logging")?;

    tracing::info!("totalrecall starting");

    let result = run_extraction(args, &config);
    match &result {
        Err(e)
            if e.downcast_ref::<totalrecall_core::Error>()
                .is_some_and(|e| e.is_aborted()) =>
        {
            tracing::info!("Extraction aborted by user");
        }
        Err(e) => tracing::error!(error = %e, "Extraction failed"),
        Ok(()) => tracing::info!("totalrecall finished"),
    }
    result
}

/// Fold command-line switches into the loaded configuration.
fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(output) = &args.output {
        config.extraction.output_dir = output.clone();
    }
    if args.skip_permissions {
        config.source.grant_permissions = false;
    }
    if args.sort_subfolders {
        config.source.sort_subfolders = true;
    }
    if args.order_by_timestamp {
        config.report.order_by_timestamp = true;
    }
    if args.local_time {
        config.report.timezone = ReportTimezone::Local;
    }
}

fn run_extraction(args: &Args, config: &Config) -> Result<()> {
    // Keep stdout clean for the JSON summary
    let mut console: Box<dyn Write> = match args.format {
        OutputFormat::Text => Box::new(io::stdout()),
        OutputFormat::Json => Box::new(io::stderr()),
    };
    let stdin = io::stdin();
    let mut input = stdin.lock();

    let (base_path, username) = resolve_base_path(args, config, &mut input, &mut console)?;
    tracing::info!(path = %base_path.display(), "Using store root");

    let granter = build_granter(config, username.as_deref());
    let extractor = Extractor::new(ExtractorSettings::from_config(config, base_path), granter);

    let location = extractor.locate()?;
    writeln!(console, "Recall folder found: {}", location.recall_folder().display())?;

    let confirmed = args.yes
        || prompt::confirm_extraction(&mut input, &mut console)
            .context("failed to read confirmation")?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(next_step_message(Stage::LocationResolved));

    let result = extractor.extract_with_progress(&location, confirmed, |stage| {
        spinner.set_message(next_step_message(stage));
    });
    spinner.finish_and_clear();
    let summary = result?;

    match args.format {
        OutputFormat::Text => print_text_summary(&summary),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }

    Ok(())
}

/// Work out the store root, asking for a username when nothing else says where it is.
fn resolve_base_path<R: BufRead, W: Write>(
    args: &Args,
    config: &Config,
    input: &mut R,
    console: &mut W,
) -> Result<(PathBuf, Option<String>)> {
    if let Some(base_path) = args
        .base_path
        .clone()
        .or_else(|| config.source.base_path.clone())
    {
        return Ok((base_path, args.username.clone()));
    }

    let username = match &args.username {
        Some(username) => username.clone(),
        None => prompt::read_username(input, console).context("failed to read username")?,
    };
    let base_path = base_path_for_user(&config.source.users_root, &username)?;
    Ok((base_path, Some(username)))
}

fn build_granter(config: &Config, username: Option<&str>) -> Box<dyn PermissionGranter> {
    match username {
        Some(user) if cfg!(windows) && config.source.grant_permissions => {
            Box::new(IcaclsGranter::new(user))
        }
        _ => {
            tracing::debug!("Permission grant disabled or unavailable on this platform");
            Box::new(NoopGranter)
        }
    }
}

/// Spinner text shown once `stage` has been reached.
fn next_step_message(stage: Stage) -> &'static str {
    match stage {
        Stage::Idle | Stage::LocationResolved => "Creating extraction folder...",
        Stage::TargetPrepared => "Copying database and image store...",
        Stage::Copied => "Renaming images...",
        Stage::Normalized => "Querying database...",
        Stage::Queried => "Writing report...",
        Stage::ReportWritten | Stage::Done => "Done",
    }
}

fn print_text_summary(summary: &ExtractionSummary) {
    println!("Extraction complete:");
    println!(
        "  Files copied:     {} ({} bytes)",
        summary.copied.files, summary.copied.bytes
    );
    println!("  Directories:      {}", summary.copied.directories);
    println!("  Images renamed:   {}", summary.normalized.renamed);
    if summary.normalized.collisions > 0 {
        println!("  Name collisions:  {}", summary.normalized.collisions);
    }
    println!("  Captured windows: {}", summary.window_events);
    println!("  Images taken:     {}", summary.image_events);
    println!(
        "\nSummary of the extraction is available in the file: {}",
        summary.target.report_path.display()
    );
    println!(
        "\nFull extraction folder path: {}",
        summary.target.root_folder.display()
    );
}
