use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "screener",
    about = "Score résumés against job descriptions in batch",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Score every row of a CSV worklist
    Run(RunArgs),
    /// Score unprocessed rows of the resume_details table and record matches
    Db(DbArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Worklist CSV with ID, APPLICANT, POSITION, RESUME and JOBDESCRIPTION columns
    #[arg(long)]
    pub input: PathBuf,
    /// Results CSV to write
    #[arg(long)]
    pub output: PathBuf,
    #[command(flatten)]
    pub scoring: ScoringArgs,
}

#[derive(Args, Debug)]
pub struct DbArgs {
    /// Results CSV to write
    #[arg(long)]
    pub output: PathBuf,
    #[command(flatten)]
    pub scoring: ScoringArgs,
}

#[derive(Args, Debug)]
pub struct ScoringArgs {
    /// Scoring backend
    #[arg(long, value_enum, default_value_t = ScorerKind::Explainable)]
    pub scorer: ScorerKind,
    /// Skip the delay inserted between worklist items
    #[arg(long)]
    pub no_pacing: bool,
    /// Resolve "present" and unreadable dates against this day (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub as_of: Option<NaiveDate>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScorerKind {
    /// Model score with breakdown, strengths, weaknesses and analysis
    Explainable,
    /// Model score with match and stability only
    Basic,
    /// Deterministic overlap with the extracted job requirements
    Keyword,
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|err| format!("invalid date '{value}': {err}"))
}
