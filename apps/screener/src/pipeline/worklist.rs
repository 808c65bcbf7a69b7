use std::io::Read;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use tracing::{info, warn};

use crate::errors::AppError;

/// One (résumé, job description) pair to score. Read-only to the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct WorklistItem {
    /// Store identity; present for rows that can be written back.
    pub id: Option<i64>,
    pub applicant: String,
    pub position: String,
    /// Résumé locator, handed to the document reader.
    pub resume_path: String,
    pub job_description: String,
}

/// Where a batch gets its worklist from. A load failure aborts the run.
#[async_trait]
pub trait WorklistSource: Send + Sync {
    async fn load(&self) -> Result<Vec<WorklistItem>, AppError>;
}

/// Tabular worklist with the columns ID, APPLICANT, POSITION, RESUME and
/// JOBDESCRIPTION. Header names are matched exactly; ID may be blank.
pub struct CsvWorklist {
    path: PathBuf,
}

impl CsvWorklist {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl WorklistSource for CsvWorklist {
    async fn load(&self) -> Result<Vec<WorklistItem>, AppError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| AppError::Worklist(format!("{}: {e}", self.path.display())))?;

        let items = parse_worklist(bytes.as_slice())
            .map_err(|e| AppError::Worklist(format!("{}: {e}", self.path.display())))?;

        info!("Loaded {} worklist rows from {}", items.len(), self.path.display());
        Ok(items)
    }
}

/// Reads every well-formed row. A row that does not deserialize is skipped
/// with a warning; only I/O failures abort the load.
pub fn parse_worklist<R: Read>(reader: R) -> Result<Vec<WorklistItem>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut items = Vec::new();

    for (index, record) in csv_reader.deserialize::<WorklistRow>().enumerate() {
        let row = match record {
            Ok(row) => row,
            Err(e) if e.is_io_error() => return Err(e),
            Err(e) => {
                warn!("Skipping malformed worklist row {}: {e}", index + 1);
                continue;
            }
        };
        items.push(WorklistItem {
            id: row.id,
            applicant: row.applicant,
            position: row.position.unwrap_or_default(),
            resume_path: row.resume.unwrap_or_default(),
            job_description: row.job_description.unwrap_or_default(),
        });
    }

    Ok(items)
}

#[derive(Debug, Deserialize)]
struct WorklistRow {
    #[serde(rename = "ID", default)]
    id: Option<i64>,
    #[serde(rename = "APPLICANT", alias = "Applicant", default)]
    applicant: String,
    #[serde(
        rename = "POSITION",
        alias = "Position",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    position: Option<String>,
    #[serde(
        rename = "RESUME",
        alias = "Resume",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    resume: Option<String>,
    #[serde(
        rename = "JOBDESCRIPTION",
        alias = "JobDescription",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    job_description: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
