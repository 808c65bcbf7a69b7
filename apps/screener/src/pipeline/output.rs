use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::pipeline::worklist::WorklistItem;
use crate::scoring::ScoreRecord;

/// Value written into every score field of a row whose item failed.
pub const ERROR_SENTINEL: &str = "Error";

/// Outcome of one worklist item.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputRecord {
    Scored { item: WorklistItem, score: ScoreRecord },
    Failed { item: WorklistItem, reason: String },
}

impl OutputRecord {
    pub fn item(&self) -> &WorklistItem {
        match self {
            OutputRecord::Scored { item, .. } | OutputRecord::Failed { item, .. } => item,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, OutputRecord::Failed { .. })
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            OutputRecord::Failed { reason, .. } => Some(reason),
            OutputRecord::Scored { .. } => None,
        }
    }

    /// Flattens into the tabular row shape. Lists are joined with ", " and
    /// the breakdown is embedded as a JSON string.
    pub fn to_row(&self) -> OutputRow {
        let item = self.item();
        let id = item
            .id
            .map(|id| id.to_string())
            .unwrap_or_else(|| ERROR_SENTINEL.to_string());

        match self {
            OutputRecord::Scored { score, .. } => OutputRow {
                id,
                applicant: item.applicant.clone(),
                position: item.position.clone(),
                match_percentage: score.overall_match.to_string(),
                stability_score: score.stability_score.to_string(),
                total_experience: format!("{:.2}", score.total_experience_years),
                companies_count: score.relevant_company_count.to_string(),
                strengths: score.strengths.join(", "),
                weaknesses: score.weaknesses.join(", "),
                score_breakdown: serde_json::to_string(&score.score_breakdown)
                    .unwrap_or_else(|_| "{}".to_string()),
                detailed_analysis: score.analysis_text.clone(),
            },
            OutputRecord::Failed { .. } => OutputRow {
                id,
                applicant: item.applicant.clone(),
                position: item.position.clone(),
                match_percentage: ERROR_SENTINEL.to_string(),
                stability_score: ERROR_SENTINEL.to_string(),
                total_experience: ERROR_SENTINEL.to_string(),
                companies_count: ERROR_SENTINEL.to_string(),
                strengths: ERROR_SENTINEL.to_string(),
                weaknesses: ERROR_SENTINEL.to_string(),
                score_breakdown: ERROR_SENTINEL.to_string(),
                detailed_analysis: ERROR_SENTINEL.to_string(),
            },
        }
    }
}

/// One output row, column names as consumers of the results sheet expect them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRow {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "APPLICANT")]
    pub applicant: String,
    #[serde(rename = "POSITION")]
    pub position: String,
    #[serde(rename = "Match_Percentage")]
    pub match_percentage: String,
    #[serde(rename = "Stability_Score")]
    pub stability_score: String,
    #[serde(rename = "Total_Experience")]
    pub total_experience: String,
    #[serde(rename = "Companies_Count")]
    pub companies_count: String,
    #[serde(rename = "Strengths")]
    pub strengths: String,
    #[serde(rename = "Weaknesses")]
    pub weaknesses: String,
    #[serde(rename = "Score_Breakdown")]
    pub score_breakdown: String,
    #[serde(rename = "Detailed_Analysis")]
    pub detailed_analysis: String,
}

/// Final destination of a batch. Written once, after every item resolved.
pub trait ResultSink: Send {
    fn write_all(&mut self, records: &[OutputRecord]) -> Result<(), AppError>;
}

pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ResultSink for CsvSink {
    fn write_all(&mut self, records: &[OutputRecord]) -> Result<(), AppError> {
        let output_err = |e: csv::Error| AppError::Output(format!("{}: {e}", self.path.display()));

        let mut writer = csv::Writer::from_path(&self.path).map_err(output_err)?;
        for record in records {
            writer.serialize(record.to_row()).map_err(output_err)?;
        }
        writer
            .flush()
            .map_err(|e| AppError::Output(format!("{}: {e}", self.path.display())))?;

        info!(
            "Analysis complete. {} rows saved to {}",
            records.len(),
            self.path.display()
        );
        Ok(())
    }
}
