//! Change-log diff command

use anyhow::{bail, Context};
use clap::{Args, ValueEnum};
use snaplog_core::config::{ChainMode, StructuralChanges};
use snaplog_core::logging_facility::{init, Profile};
use snaplog_engine::commands::changelog::{
    run_changelog, ChangelogOptions, ChangelogReport, ChangelogSource,
};
use snaplog_store::config_file::{load_config_file, ConfigFile};
use snaplog_store::report::console::render_all;
use snaplog_store::report::csv::write_csv_file;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// SQLite database holding the landing table
    #[arg(long, env = "SNAPLOG_DB")]
    pub db: Option<PathBuf>,

    /// JSON Lines export, one snapshot row per line (takes precedence over --db)
    #[arg(long)]
    pub jsonl: Option<PathBuf>,

    /// YAML configuration file
    #[arg(long, env = "SNAPLOG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write the change log as CSV to this path
    #[arg(long, env = "SNAPLOG_REPORT_CSV")]
    pub csv: Option<PathBuf>,

    #[arg(long)]
    pub workers: Option<usize>,

    /// Comparison base for each snapshot
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Also report added and removed fields
    #[arg(long)]
    pub report_structural: bool,

    /// Do not print change lines
    #[arg(long)]
    pub quiet: bool,

    /// JSON structured logs on stderr
    #[arg(long)]
    pub log_json: bool,

    /// Debug-level logs on stderr, one line per entity chain
    #[arg(short, long, conflicts_with = "log_json")]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Compare each snapshot with the one before it
    Previous,
    /// Compare every snapshot with the first one
    First,
}

impl From<ModeArg> for ChainMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Previous => ChainMode::Previous,
            ModeArg::First => ChainMode::First,
        }
    }
}

pub fn execute(args: DiffArgs) -> anyhow::Result<()> {
    init(if args.log_json {
        Profile::Production
    } else if args.verbose {
        Profile::Verbose
    } else {
        Profile::Development
    });

    let file = match &args.config {
        Some(path) => load_config_file(path)?,
        None => ConfigFile::default(),
    };
    let source = select_source(&args, &file)?;
    let config = {
        let mut config = file.changelog;
        if let Some(workers) = args.workers {
            config.workers = workers;
        }
        if let Some(mode) = args.mode {
            config.chain_mode = mode.into();
        }
        if args.report_structural {
            config.structural_changes = StructuralChanges::Report;
        }
        config
    };

    let report = run_changelog(&source, &config, &ChangelogOptions::default())?;

    if !args.quiet {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        render_all(&mut out, report.events()).context("writing change log")?;
        out.flush().context("writing change log")?;
    }

    if let Some(path) = &args.csv {
        write_report(&report, path)?;
    }

    Ok(())
}

fn select_source(args: &DiffArgs, file: &ConfigFile) -> anyhow::Result<ChangelogSource> {
    match (&args.db, &args.jsonl) {
        (_, Some(path)) => Ok(ChangelogSource::Jsonl {
            path: path.clone(),
            layout: file.jsonl.clone(),
        }),
        (Some(path), None) => Ok(ChangelogSource::Sqlite {
            path: path.clone(),
            landing: file.landing.clone(),
        }),
        (None, None) => bail!("Must specify either --db or --jsonl"),
    }
}

fn write_report(report: &ChangelogReport, path: &Path) -> anyhow::Result<()> {
    // Empty change logs leave no file behind.
    if report.event_count() == 0 {
        return Ok(());
    }
    let rows = write_csv_file(path, report.events())?;
    println!("[CSV] {} rows saved: {}", rows, path.display());
    Ok(())
}
