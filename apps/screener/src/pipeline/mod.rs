//! Batch pipeline: drives extraction, tenure arithmetic and match scoring over
//! a worklist, one item at a time.
//!
//! Per item: pacing delay (plus jitter) → read résumé → extract profile → enrich (merged
//! experience, stability) → score → optional store write-back. A failure in
//! any step turns that item into an "Error" row; the batch always continues.
//! Only loading the worklist and writing the final output can abort a run.

pub mod output;
pub mod worklist;

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{info, warn};

use crate::db::ScoreStore;
use crate::documents::DocumentReader;
use crate::errors::{truncate_for_log, AppError};
use crate::extraction::ExtractionClient;
use crate::profile::dates::DatePoint;
use crate::scoring::{MatchScorer, ScoreRecord};

use output::{OutputRecord, ResultSink};
use worklist::{WorklistItem, WorklistSource};

pub const DEFAULT_PACING_CAP_SECS: u64 = 60;

/// Delay inserted before each item: `min(2^index, cap)` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    cap: Option<Duration>,
}

impl Pacing {
    pub fn exponential(cap_secs: u64) -> Self {
        Self {
            cap: Some(Duration::from_secs(cap_secs)),
        }
    }

    pub fn disabled() -> Self {
        Self { cap: None }
    }

    pub fn delay_for(&self, index: usize) -> Duration {
        match self.cap {
            None => Duration::ZERO,
            Some(cap) => {
                let exponent = u32::try_from(index).unwrap_or(u32::MAX);
                Duration::from_secs(2u64.saturating_pow(exponent)).min(cap)
            }
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self::exponential(DEFAULT_PACING_CAP_SECS)
    }
}

/// Extra delay added on top of each non-zero pacing delay.
pub trait Jitter: Send + Sync {
    fn sample(&self) -> Duration;
}

/// Uniform in `[0, 1)` seconds.
pub struct UniformJitter;

impl Jitter for UniformJitter {
    fn sample(&self) -> Duration {
        Duration::from_secs_f64(rand::thread_rng().gen_range(0.0..1.0))
    }
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub scored: usize,
    pub failed: usize,
}

pub struct BatchPipeline {
    documents: Arc<dyn DocumentReader>,
    extractor: ExtractionClient,
    scorer: Arc<dyn MatchScorer>,
    pacing: Pacing,
    jitter: Option<Arc<dyn Jitter>>,
    store: Option<Arc<dyn ScoreStore>>,
    reference_date: Option<DatePoint>,
}

impl BatchPipeline {
    pub fn new(
        documents: Arc<dyn DocumentReader>,
        extractor: ExtractionClient,
        scorer: Arc<dyn MatchScorer>,
    ) -> Self {
        Self {
            documents,
            extractor,
            scorer,
            pacing: Pacing::default(),
            jitter: None,
            store: None,
            reference_date: None,
        }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_jitter(mut self, jitter: Arc<dyn Jitter>) -> Self {
        self.jitter = Some(jitter);
        self
    }

    /// Writes each successful match back to the store.
    pub fn with_store(mut self, store: Arc<dyn ScoreStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Pins "now" for date resolution instead of reading the clock per item.
    pub fn with_reference_date(mut self, today: DatePoint) -> Self {
        self.reference_date = Some(today);
        self
    }

    /// Loads the worklist, scores every item and writes the results in one go.
    pub async fn execute(
        &self,
        source: &dyn WorklistSource,
        sink: &mut dyn ResultSink,
    ) -> Result<BatchSummary, AppError> {
        let items = source.load().await?;
        let records = self.run(&items).await;
        sink.write_all(&records)?;

        let failed = records.iter().filter(|r| r.is_failed()).count();
        Ok(BatchSummary {
            scored: records.len() - failed,
            failed,
        })
    }

    /// Scores items in order. Never fails; failed items become `Failed` records.
    pub async fn run(&self, items: &[WorklistItem]) -> Vec<OutputRecord> {
        info!(
            "Scoring {} résumés with the {} scorer",
            items.len(),
            self.scorer.backend()
        );
        let mut records = Vec::with_capacity(items.len());

        for (index, item) in items.iter().enumerate() {
            let delay = self.pacing.delay_for(index);
            if !delay.is_zero() {
                let jitter = self.jitter.as_ref().map_or(Duration::ZERO, |j| j.sample());
                tokio::time::sleep(delay + jitter).await;
            }

            let record = match self.process_item(item).await {
                Ok(score) => {
                    info!("Processed: {}", item.applicant);
                    self.write_back(item, &score).await;
                    OutputRecord::Scored {
                        item: item.clone(),
                        score,
                    }
                }
                Err(e) => {
                    let reason = e.to_string();
                    warn!(
                        "Error processing {}: {}",
                        item.applicant,
                        truncate_for_log(&reason)
                    );
                    OutputRecord::Failed {
                        item: item.clone(),
                        reason,
                    }
                }
            };
            records.push(record);
        }

        let failures: Vec<&str> = records.iter().filter_map(|r| r.failure_reason()).collect();
        if !failures.is_empty() {
            warn!("{} of {} items failed", failures.len(), records.len());
        }
        records
    }

    async fn process_item(&self, item: &WorklistItem) -> Result<ScoreRecord, AppError> {
        let today = self.reference_date.unwrap_or_else(DatePoint::today);

        let text = self.documents.read_text(&item.resume_path).await?;

        let mut profile = self.extractor.extract_profile(&text, today).await;
        profile.enrich(today);
        info!(
            "{}: {:.2} years relevant experience, stability {:.0}",
            item.applicant, profile.total_experience_years, profile.stability_score
        );

        Ok(self.scorer.score(&item.job_description, &profile).await)
    }

    /// Store failures are logged and never affect the item's result.
    async fn write_back(&self, item: &WorklistItem, score: &ScoreRecord) {
        let (Some(store), Some(id)) = (&self.store, item.id) else {
            return;
        };

        match store.record_match(id, score.overall_match).await {
            Ok(true) => info!("Recorded match {} for id {id}", score.overall_match),
            Ok(false) => warn!("Id {id} was not pending, match not recorded"),
            Err(e) => warn!(
                "Database update failed for id {id}: {}",
                truncate_for_log(&e.to_string())
            ),
        }
    }
}
