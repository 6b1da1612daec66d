//! GPS Sorter - Sort photos into folders by where they were taken
//!
//! A CLI tool that reads GPS coordinates from photo EXIF data and sorts
//! photos into named-location folders, or into place-name folders found
//! by reverse geocoding when no locations file is given.

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use gps_sorter::{Cli, RunSummary, Sorter, SorterConfig};
use std::path::{Path, PathBuf};
use tracing::{Level, error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

// CLI Output Module
mod cli_output {
    //! Colored summary output for the terminal

    use crossterm::{
        QueueableCommand,
        style::{Color, Print, StyledContent, Stylize, style},
    };
    use std::io::{Write, stdout};

    /// CLI theme colors
    pub struct CliTheme;

    impl CliTheme {
        pub const SUCCESS: Color = Color::Green;
        pub const WARNING: Color = Color::Yellow;
        pub const ERROR: Color = Color::Red;
        pub const HINT: Color = Color::DarkGrey;
        pub const ACCENT: Color = Color::Cyan;
    }

    const WIDTH: usize = 60;

    /// Queue styled pieces followed by a newline, then flush once
    fn emit(pieces: &[StyledContent<&str>]) {
        let mut out = stdout().lock();
        for piece in pieces {
            let _ = out.queue(Print(piece));
        }
        let _ = out.queue(Print("\n"));
        let _ = out.flush();
    }

    pub fn separator() {
        let line = "─".repeat(WIDTH);
        emit(&[style(line.as_str())]);
    }

    pub fn title(text: &str) {
        let pad = " ".repeat((WIDTH.saturating_sub(text.len()) / 2).saturating_sub(1));
        emit(&[
            style(pad.as_str()),
            "╔ ".bold(),
            text.bold(),
            "╗".bold(),
        ]);
        blank();
    }

    /// An icon-prefixed message line
    pub fn notice(icon: &str, color: Color, msg: &str) {
        emit(&[style(icon).with(color).bold(), style(" "), style(msg)]);
    }

    /// An indented `key: value` line
    pub fn field(key: &str, value: &str, color: Color) {
        emit(&[
            style("  "),
            style(key).with(CliTheme::HINT),
            style(": "),
            style(value).with(color).bold(),
        ]);
    }

    pub fn blank() {
        emit(&[]);
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.print_sample_config {
        print!("{}", SorterConfig::sample_config());
        return Ok(());
    }

    // Get the executable directory for Config and Log directories
    let exe_dir = get_executable_dir()?;
    let log_path = get_log_path(&exe_dir);
    let _guard = setup_logging(&cli, &log_path)?;

    info!(version = env!("CARGO_PKG_VERSION"), "GPS Sorter starting");
    info!(log_file = %log_path.display(), "Log file location");

    let Some(options) = cli.to_options() else {
        anyhow::bail!("Both --input and --output are required");
    };

    let config = match load_config(&cli, &exe_dir) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid config");
            std::process::exit(1);
        }
    };

    if config.is_auto_mode() {
        info!("No locations configured, grouping photos by proximity");
    } else {
        info!(
            locations = config.locations.len(),
            uncategorized = ?config.uncategorized_behavior,
            "Using configured locations"
        );
    }
    if cli.verbose {
        info!(?options, "Run options");
    }

    let dry_run = options.dry_run;
    let mut sorter = Sorter::new(options, config);

    match sorter.run() {
        Ok(summary) => {
            print_summary(&summary, dry_run, &log_path);
            info!(log_file = %log_path.display(), "Sorting complete. Log saved to");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Sorting failed");
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_summary(summary: &RunSummary, dry_run: bool, log_path: &Path) {
    use cli_output::{CliTheme, blank, field, notice, separator, title};

    separator();
    title("Sorting complete");
    separator();

    blank();
    let stats = [
        ("Photos found", summary.total, CliTheme::ACCENT),
        ("Sorted", summary.sorted, CliTheme::SUCCESS),
        ("No GPS (in 'Skipped')", summary.skipped_no_gps, CliTheme::WARNING),
        ("Left in place", summary.skipped_no_match_left, CliTheme::WARNING),
        ("Other", summary.skipped_other, CliTheme::HINT),
        ("Errors", summary.errors.len(), CliTheme::ERROR),
    ];
    for (key, value, color) in stats {
        field(key, &value.to_string(), color);
    }
    blank();

    if summary.geocode_failures > 0 {
        separator();
        notice(
            "⚠",
            CliTheme::WARNING,
            &format!(
                "{} location(s) could not be named and use coordinate folders",
                summary.geocode_failures
            ),
        );
        notice(
            "→",
            CliTheme::HINT,
            "Check your internet connection, delete the geocode cache and run again",
        );
    }

    if !summary.errors.is_empty() {
        separator();
        notice(
            "✗",
            CliTheme::ERROR,
            &format!("Failed to sort {} file(s)", summary.errors.len()),
        );
        blank();
        for (path, message) in &summary.errors {
            field(&path.display().to_string(), message, CliTheme::ERROR);
        }
    }

    if dry_run {
        separator();
        notice(
            "⚠",
            CliTheme::WARNING,
            "Dry run: no files were copied or moved and the geocode cache was not updated",
        );
    }

    separator();
    blank();
    field("📁 Log file", &log_path.display().to_string(), CliTheme::ACCENT);
}

/// Get the directory where the executable is located
fn get_executable_dir() -> Result<PathBuf> {
    let exe_path = std::env::current_exe()?;
    Ok(exe_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".")))
}

/// Timestamped log file under `<exe dir>/Log`
fn get_log_path(exe_dir: &Path) -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    exe_dir
        .join("Log")
        .join(format!("GpsSort_{}.log", timestamp))
}

/// Resolve config path - supports shorthand syntax
///
/// `-c japan` finds `japan.toml`/`japan.json`/`japan.yaml` in the working directory or in
/// the `Config` directory next to the executable.
fn resolve_config_path(exe_dir: &Path, config_path: &Path) -> PathBuf {
    if config_path.exists() {
        return config_path.to_path_buf();
    }

    let config_dir = exe_dir.join("Config");
    let filename = config_path.file_name().unwrap_or(config_path.as_os_str());
    let in_config_dir = config_dir.join(filename);

    let mut candidates = Vec::new();
    for base in [config_path.to_path_buf(), in_config_dir] {
        if base.extension().is_none() {
            candidates.push(base.with_extension("toml"));
            candidates.push(base.with_extension("json"));
            candidates.push(base.with_extension("yaml"));
        } else {
            candidates.push(base);
        }
    }

    candidates
        .into_iter()
        .find(|p| p.exists())
        .unwrap_or_else(|| config_path.to_path_buf())
}

/// Load the locations file, or the auto-mode default without one
fn load_config(cli: &Cli, exe_dir: &Path) -> gps_sorter::Result<SorterConfig> {
    let Some(ref config_path) = cli.config else {
        return Ok(SorterConfig::default());
    };

    let resolved_path = resolve_config_path(exe_dir, config_path);
    info!(config_file = %resolved_path.display(), "Loading locations from file");
    Ok(SorterConfig::load_from_file(&resolved_path)?)
}

/// Setup logging: stderr plus a log file, JSON in the file with `--json-log`
fn setup_logging(cli: &Cli, log_path: &Path) -> Result<WorkerGuard> {
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(log_path)?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    // exactly one of the two file layers is present
    let json_file = cli
        .json_log
        .then(|| fmt::layer().json().with_ansi(false).with_writer(writer.clone()));
    let text_file = (!cli.json_log).then(|| fmt::layer().with_ansi(false).with_writer(writer));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_file)
        .with(text_file)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(guard)
}
