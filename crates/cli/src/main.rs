use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use tidydesk_core::{
    collect_doctor_info, default_root, run_organize, run_sync, CategoryTable, HeuristicTagger,
    OrganizeOptions, SyncOptions, DEFAULT_BACKUP_FOLDER,
};
use tidydesk_drive::{DriveClient, TokenFileSession};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "tidydesk",
    version,
    about = "Organize a desktop folder into category/keyword subfolders and mirror it to Google Drive."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Move files into category folders and cluster them by keyword.
    Organize(OrganizeArgs),
    /// Mirror the local tree into a remote backup folder.
    Sync(SyncArgs),
    /// Show environment, root, and category table information.
    Doctor(DoctorArgs),
}

#[derive(Debug, Args)]
struct OrganizeArgs {
    /// Directory to organize. Defaults to ~/Desktop.
    #[arg(long, value_name = "PATH")]
    root: Option<PathBuf>,

    /// JSON file overriding the built-in category table.
    #[arg(long, value_name = "FILE")]
    categories: Option<PathBuf>,

    /// Exclude glob patterns (repeatable).
    #[arg(long = "exclude", value_name = "GLOB", num_args = 1.., action = ArgAction::Append)]
    exclude: Vec<String>,

    /// Skip the keyword clustering pass.
    #[arg(long)]
    no_cluster: bool,

    /// Optional JSON report output file.
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct SyncArgs {
    /// Directory to mirror. Defaults to ~/Desktop.
    #[arg(long, value_name = "PATH")]
    root: Option<PathBuf>,

    /// Name of the remote backup folder.
    #[arg(long, default_value = DEFAULT_BACKUP_FOLDER, value_name = "NAME")]
    backup_name: String,

    /// Token file holding the remote session credentials.
    #[arg(long, default_value = "token.json", value_name = "FILE")]
    token_file: PathBuf,

    /// Upload every file even when a same-named remote file exists.
    #[arg(long)]
    reupload_existing: bool,

    /// Retry budget for transient remote errors.
    #[arg(long, default_value_t = 3)]
    max_attempts: u32,

    /// Optional JSON report output file.
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct DoctorArgs {
    /// Directory to inspect. Defaults to ~/Desktop.
    #[arg(long, value_name = "PATH")]
    root: Option<PathBuf>,

    /// JSON file overriding the built-in category table.
    #[arg(long, value_name = "FILE")]
    categories: Option<PathBuf>,

    /// Token file to check for.
    #[arg(long, default_value = "token.json", value_name = "FILE")]
    token_file: PathBuf,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Organize(args) => run_organize_command(args),
        Commands::Sync(args) => run_sync_command(args),
        Commands::Doctor(args) => {
            run_doctor_command(args);
            Ok(())
        }
    }
}

fn run_organize_command(args: OrganizeArgs) -> Result<()> {
    let table = load_table(args.categories.as_deref())?;
    let options = OrganizeOptions {
        root: args.root.unwrap_or_else(default_root),
        excludes: args.exclude,
        cluster: !args.no_cluster,
        ..OrganizeOptions::default()
    };

    let report = run_organize(&options, &table, &HeuristicTagger)?;

    println!(
        "Organized {}: {} moved, {} skipped (already in place), {} clustered, {} warning(s).",
        report.root,
        report.moved_files,
        report.skipped_existing,
        report.clustered_files,
        report.warnings.len()
    );
    if report.moved_files == 0 && report.clustered_files == 0 {
        println!("Nothing to do; the folder appears to be organized already.");
    }
    for warning in &report.warnings {
        println!("Warning: {warning}");
    }

    if let Some(output) = args.output {
        let payload =
            serde_json::to_string_pretty(&report).context("failed to serialize report")?;
        fs::write(&output, payload)
            .with_context(|| format!("failed to write report to {}", output.display()))?;
        println!("Report written to {}", output.display());
    }

    Ok(())
}

fn run_sync_command(args: SyncArgs) -> Result<()> {
    let options = SyncOptions {
        root: args.root.unwrap_or_else(default_root),
        backup_folder: args.backup_name,
        skip_existing: !args.reupload_existing,
        max_attempts: args.max_attempts,
        ..SyncOptions::default()
    };

    let session = TokenFileSession::new(args.token_file);
    let mut client = DriveClient::new(session)?;
    let report = run_sync(&options, &mut client)?;

    println!(
        "Synced {} into '{}': {} uploaded, {} already present, {} folder(s) created, {} warning(s).",
        report.root,
        report.backup_folder,
        report.uploaded_files,
        report.skipped_existing_files,
        report.folders_created,
        report.warnings.len()
    );
    for warning in &report.warnings {
        println!("Warning: {warning}");
    }

    if let Some(output) = args.output {
        let payload =
            serde_json::to_string_pretty(&report).context("failed to serialize report")?;
        fs::write(&output, payload)
            .with_context(|| format!("failed to write report to {}", output.display()))?;
        println!("Report written to {}", output.display());
    }

    Ok(())
}

fn run_doctor_command(args: DoctorArgs) {
    let table = match load_table(args.categories.as_deref()) {
        Ok(table) => table,
        Err(err) => {
            println!("Warning: {err:#}; using the built-in category table.");
            CategoryTable::default()
        }
    };
    let root = args.root.unwrap_or_else(default_root);
    let info = collect_doctor_info(&root, &table, Some(&args.token_file));

    println!("OS: {} ({})", info.os, info.arch);
    if let Some(current_dir) = info.current_dir {
        println!("Current directory: {current_dir}");
    }
    println!("Root: {} (exists: {})", info.root, info.root_exists);
    println!(
        "Categories: {} (catch-all: {})",
        info.categories.join(", "),
        info.catch_all
    );
    if let Some(token_file) = info.token_file {
        println!("Token file: {token_file} (exists: {})", info.token_file_exists);
    }
    for note in info.notes {
        println!("Note: {note}");
    }
}

fn load_table(path: Option<&std::path::Path>) -> Result<CategoryTable> {
    match path {
        Some(path) => CategoryTable::from_json_file(path),
        None => Ok(CategoryTable::default()),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
