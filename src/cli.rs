use crate::{constants::DEFAULT_BRANCH_LENGTH, utils::util::Result};
use chrono::Datelike;
use clap::{ArgAction, Parser, Subcommand};
use env_logger::fmt::Color;
use log::{Level, LevelFilter};
use once_cell::sync::Lazy;
use std::{
    io::Write,
    path::{Path, PathBuf},
};

pub static FULL_VERSION: Lazy<String> = Lazy::new(|| env!("CARGO_PKG_VERSION").to_string());

#[derive(Parser, Debug)]
#[command(name="mafx",
          version=&**FULL_VERSION,
          about="Reference-anchored MAF block set indexer",
          long_about = None,
          after_help = format!("Copyright (C) {}.
          This program comes with ABSOLUTELY NO WARRANTY; it is intended for
          Research Use Only and not for use in diagnostic procedures.", chrono::Utc::now().year()),
          help_template = "{name} {version}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}{after-help}",
          )]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        global = true
    )]
    pub verbosity: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Rewrite a MAF file in deterministic root-component order
    Sort(SortArgs),
    /// Print the blocks overlapping a reference-genome region
    Overlap(OverlapArgs),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Sort(_) => "sort",
            Command::Overlap(_) => "overlap",
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(arg_required_else_help(true))]
pub struct SortArgs {
    /// Input MAF file (plain or gzip)
    #[arg(
        long = "maf",
        value_name = "MAF",
        value_parser = check_file_exists
    )]
    pub input: PathBuf,

    /// Output MAF file
    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        value_parser = check_prefix_path
    )]
    pub output: PathBuf,

    /// Name of the reference genome anchoring the block set
    #[arg(long = "ref-genome", value_name = "GENOME")]
    pub ref_genome: String,

    /// Branch length to use when generating trees for treeless MAF blocks
    #[arg(
        long = "branch-length",
        value_name = "LENGTH",
        default_value_t = DEFAULT_BRANCH_LENGTH,
        help_heading = "Advanced"
    )]
    pub branch_length: f64,
}

#[derive(Parser, Debug, Clone)]
#[command(arg_required_else_help(true))]
pub struct OverlapArgs {
    /// Input MAF file (plain or gzip)
    #[arg(
        long = "maf",
        value_name = "MAF",
        value_parser = check_file_exists
    )]
    pub input: PathBuf,

    /// Name of the reference genome anchoring the block set
    #[arg(long = "ref-genome", value_name = "GENOME")]
    pub ref_genome: String,

    /// Reference region to query, in the form seq:start-end (half-open)
    #[arg(
        long = "region",
        value_name = "REGION",
        value_parser = parse_region
    )]
    pub region: Region,

    /// Branch length to use when generating trees for treeless MAF blocks
    #[arg(
        long = "branch-length",
        value_name = "LENGTH",
        default_value_t = DEFAULT_BRANCH_LENGTH,
        help_heading = "Advanced"
    )]
    pub branch_length: f64,
}

/// A half-open reference-genome coordinate range on a named sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub seq_name: String,
    pub start: i64,
    pub end: i64,
}

pub fn init_verbose(args: &Cli) {
    let filter_level: LevelFilter = match args.verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            let level = record.level();
            let mut style = buf.style();
            match record.level() {
                Level::Error => style.set_color(Color::Red),
                Level::Warn => style.set_color(Color::Yellow),
                Level::Info => style.set_color(Color::Green),
                Level::Debug => style.set_color(Color::Blue),
                Level::Trace => style.set_color(Color::Cyan),
            };

            writeln!(
                buf,
                "{} [{}] {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                style.value(level),
                record.module_path().unwrap_or("unknown_module"),
                record.args()
            )
        })
        .filter_level(filter_level)
        .init();
}

fn check_file_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.exists() {
        return Err(crate::mafx_error!("File does not exist: {}", path.display()));
    }
    Ok(path.to_path_buf())
}

fn check_prefix_path(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            return Err(crate::mafx_error!(
                "Path does not exist: {}",
                parent_dir.display()
            ));
        }
    }
    Ok(path.to_path_buf())
}

fn parse_region(s: &str) -> Result<Region> {
    let malformed =
        || crate::mafx_error!("Region must be in the form seq:start-end, got: {}", s);
    let (seq_name, range) = s.rsplit_once(':').ok_or_else(malformed)?;
    let (start, end) = range.split_once('-').ok_or_else(malformed)?;
    let start: i64 = start.parse().map_err(|_| malformed())?;
    let end: i64 = end.parse().map_err(|_| malformed())?;
    if seq_name.is_empty() || start < 0 || end < start {
        return Err(malformed());
    }
    Ok(Region {
        seq_name: seq_name.to_string(),
        start,
        end,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_region_valid() {
        let region = parse_region("chr1:100-200").unwrap();
        assert_eq!(region.seq_name, "chr1");
        assert_eq!(region.start, 100);
        assert_eq!(region.end, 200);
    }

    #[test]
    fn test_parse_region_invalid() {
        assert!(parse_region("chr1").is_err());
        assert!(parse_region("chr1:100").is_err());
        assert!(parse_region("chr1:200-100").is_err());
        assert!(parse_region(":100-200").is_err());
        assert!(parse_region("chr1:x-y").is_err());
    }
}
