pub mod config;
pub mod report;
pub mod tables;

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::classifier::ClassificationRule;
use crate::error::{GapsError, Result};
use crate::importer::{DateColumn, LoadProgress};
use crate::reports::ActiveTypeRule;
use crate::session::Session;
use crate::settings::Settings;

#[derive(Parser)]
#[command(name = "gaps", about = "Transaction analytics for GAPS payment-gateway exports.")]
pub struct Cli {
    #[command(flatten)]
    pub input: InputArgs,
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone, Debug)]
pub struct InputArgs {
    /// CSV export to analyse
    #[arg(short, long, env = "GAPS_FILE", global = true)]
    pub file: Option<PathBuf>,
    /// Restrict every view to one PaymentDate year
    #[arg(short, long, global = true)]
    pub year: Option<i32>,
    /// Definition of a successful transaction
    #[arg(long, value_enum, global = true)]
    pub rule: Option<ClassificationRule>,
    /// Date column parsed leniently; the other must be ISO-8601
    #[arg(long = "lenient-date-column", value_enum, ignore_case = true, global = true)]
    pub lenient_date_column: Option<DateColumn>,
    /// Output format
    #[arg(long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Bucket {
    /// Every row of the file, ignoring --year
    Raw,
    /// Rows of the selected year with process type descriptions
    Processed,
    Successful,
    Declined,
    Failed,
    Pending,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the PaymentDate years present in the file.
    Years,
    /// Totals and success/decline/pending breakdown.
    Summary,
    /// Successful transactions per month.
    Monthly,
    /// Successful transactions per quarter.
    Quarterly,
    /// Process type share and month-by-type breakdown.
    Types {
        /// Only these process type descriptions (comma separated)
        #[arg(long, value_delimiter = ',')]
        types: Vec<String>,
    },
    /// Month-over-month growth of the average count per process type.
    Growth {
        #[arg(long, value_delimiter = ',')]
        types: Vec<String>,
        /// Types a month's average is divided by
        #[arg(long = "active-types", value_enum)]
        active_types: Option<ActiveTypeRule>,
    },
    /// Successful transactions by weekday and process type.
    Weekly,
    /// Companies with the most successful transactions.
    Companies {
        /// Number of companies to show
        #[arg(long)]
        top: Option<usize>,
    },
    /// List the rows of a transaction bucket.
    Table {
        #[arg(value_enum)]
        bucket: Bucket,
        /// Maximum rows to print
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Every view in one run.
    Dashboard {
        #[arg(long, value_delimiter = ',')]
        types: Vec<String>,
        #[arg(long)]
        top: Option<usize>,
    },
    /// Show or change persisted settings.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print current settings.
    Show,
    /// Change one setting.
    Set {
        /// classification_rule, lenient_date_column, active_type_rule or top_companies
        key: String,
        value: String,
    },
    /// Print the settings file location.
    Path,
}

pub(crate) fn type_filter(types: &[String]) -> Option<&[String]> {
    (!types.is_empty()).then_some(types)
}

/// Load the export named by `input`, applying flag overrides on top of
/// the persisted settings, and select the requested year.
pub(crate) fn open_session(input: &InputArgs, settings: &Settings) -> Result<Session> {
    let file = input.file.as_ref().ok_or_else(|| {
        GapsError::Other("No input file. Pass --file or set GAPS_FILE.".to_string())
    })?;
    let mut options = settings.analysis_options();
    if let Some(rule) = input.rule {
        options.rule = rule;
    }
    if let Some(column) = input.lenient_date_column {
        options.lenient_date_column = column;
    }

    let data = std::fs::read(file)?;
    let show_progress = std::io::stderr().is_terminal();
    let mut session = Session::open_with_progress(&data, options, |p| {
        if !show_progress {
            return;
        }
        match p {
            LoadProgress::Started => eprintln!("Loading data..."),
            LoadProgress::Finished { rows } => eprintln!("Done! ({rows} rows loaded)"),
        }
    })?;
    session.select_year(input.year);
    Ok(session)
}
