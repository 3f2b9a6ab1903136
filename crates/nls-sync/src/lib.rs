//! Run orchestration: score keywords, dispatch sources, persist outputs.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use nls_adapters::{preview_records, FetchRequest, SourceRegistry};
use nls_core::{prioritize_niches, KeywordScorer, NicheScore, PlaceholderScorer, SourceRecord};
use nls_storage::{load_proxies, write_lines, write_table, ContactStore, InsertReport, ProxyList};
use serde::Serialize;
use tracing::{info, warn, Span};
use uuid::Uuid;

pub mod niches;

pub use niches::{format_findings, load_niche_config, run_niche_pipeline, NicheConfig, NicheFinding};

pub const CRATE_NAME: &str = "nls-sync";

pub const DEFAULT_KEYWORDS: [&str; 3] = ["weight loss", "cybersecurity", "passive income"];
pub const DEFAULT_LIMIT: usize = 25;
pub const DEFAULT_OUTPUT_DIR: &str = "data/latest";
pub const DEFAULT_DB_PATH: &str = "data/contacts.db";

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub keywords: Vec<String>,
    pub limit: usize,
    pub output_dir: PathBuf,
    pub db_path: PathBuf,
    pub inline_proxies: Vec<String>,
    pub proxy_file: Option<PathBuf>,
    pub preview: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS.iter().map(ToString::to_string).collect(),
            limit: DEFAULT_LIMIT,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            inline_proxies: Vec::new(),
            proxy_file: None,
            preview: false,
        }
    }
}

impl PipelineConfig {
    /// Defaults, overridden by `NLS_OUTPUT_DIR`, `NLS_DB_PATH`, `NLS_LIMIT`
    /// and `NLS_PROXY_FILE` when set. Unparseable values are ignored.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            output_dir: std::env::var("NLS_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            db_path: std::env::var("NLS_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            limit: std::env::var("NLS_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.limit),
            proxy_file: std::env::var("NLS_PROXY_FILE").ok().map(PathBuf::from),
            ..defaults
        }
    }
}

/// Per-source records in dispatch order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunResults {
    batches: Vec<(String, Vec<SourceRecord>)>,
}

impl RunResults {
    pub fn push(&mut self, source_id: impl Into<String>, records: Vec<SourceRecord>) {
        self.batches.push((source_id.into(), records));
    }

    pub fn get(&self, source_id: &str) -> Option<&[SourceRecord]> {
        self.batches
            .iter()
            .find(|(id, _)| id == source_id)
            .map(|(_, records)| records.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[SourceRecord])> {
        self.batches
            .iter()
            .map(|(id, records)| (id.as_str(), records.as_slice()))
    }

    pub fn source_ids(&self) -> Vec<&str> {
        self.batches.iter().map(|(id, _)| id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn total_records(&self) -> usize {
        self.batches.iter().map(|(_, records)| records.len()).sum()
    }

    pub fn flatten(&self) -> Vec<SourceRecord> {
        self.batches
            .iter()
            .flat_map(|(_, records)| records.iter().cloned())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PersistReport {
    pub files_written: Vec<PathBuf>,
    pub inserted: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub preview: bool,
    pub proxies: usize,
    pub sources: usize,
    pub records: usize,
    pub inserted: usize,
    pub skipped: usize,
    pub output_dir: String,
    pub db_path: String,
}

pub struct Pipeline {
    config: PipelineConfig,
    registry: SourceRegistry,
    scorer: Box<dyn KeywordScorer + Send + Sync>,
    span: Span,
}

impl Pipeline {
    /// `span` is the log handle every message from this pipeline is parented to.
    pub fn new(config: PipelineConfig, registry: SourceRegistry, span: Span) -> Self {
        Self {
            config,
            registry,
            scorer: Box::new(PlaceholderScorer),
            span,
        }
    }

    pub fn with_scorer(mut self, scorer: Box<dyn KeywordScorer + Send + Sync>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Swap or add adapters between runs.
    pub fn registry_mut(&mut self) -> &mut SourceRegistry {
        &mut self.registry
    }

    pub fn load_proxies(&self) -> Result<ProxyList> {
        let proxies = load_proxies(&self.config.inline_proxies, self.config.proxy_file.as_deref())?;
        match proxies.first() {
            Some(first) => info!(parent: &self.span, count = proxies.len(), first, "loaded proxies"),
            None => info!(parent: &self.span, "no proxies configured; running direct requests"),
        }
        Ok(proxies)
    }

    /// Rank every configured keyword and log the breakdown. Nothing else
    /// consumes the ranking yet.
    pub fn rank_keywords(&self) -> Vec<NicheScore> {
        let keywords = &self.config.keywords;
        info!(parent: &self.span, ?keywords, "scoring niches");
        let ranked = prioritize_niches(self.scorer.as_ref(), keywords, keywords.len());
        for item in &ranked {
            info!(
                parent: &self.span,
                "{:<20} score={:.2} (payout={:.2}, urgency={:.2}, evergreen={:.2}, volume={:.2})",
                item.keyword,
                item.total(),
                item.payout_score,
                item.urgency_score,
                item.evergreen_score,
                item.search_volume_score
            );
        }
        ranked
    }

    /// Call every registered source in order. In preview mode adapters are
    /// skipped and placeholder records are synthesised instead.
    ///
    /// The first adapter error aborts the run.
    pub async fn run_sources(
        &self,
        keywords: &[String],
        preview: bool,
        limit: usize,
        proxies: Option<&ProxyList>,
    ) -> Result<RunResults> {
        let mut results = RunResults::default();
        for adapter in self.registry.iter() {
            let source_id = adapter.source_id();
            info!(parent: &self.span, source = source_id, preview, "running source");

            let mut records = if preview {
                preview_records(source_id, keywords, limit)
            } else {
                let request = FetchRequest {
                    keywords,
                    limit,
                    proxies,
                };
                adapter
                    .fetch_contacts(&request)
                    .await
                    .with_context(|| format!("source {source_id} failed"))?
            };

            if records.len() > limit {
                warn!(
                    parent: &self.span,
                    source = source_id,
                    returned = records.len(),
                    limit,
                    "adapter exceeded limit; truncating"
                );
                records.truncate(limit);
            }
            results.push(source_id, records);
        }
        Ok(results)
    }

    /// Write `<source>.jsonl` and `<source>.csv` per source, then every record
    /// into the contact store in one transaction.
    pub async fn persist(&self, results: &RunResults) -> Result<PersistReport> {
        let output_dir = &self.config.output_dir;
        let mut files_written = Vec::with_capacity(results.len() * 2);

        for (source_id, records) in results.iter() {
            let json_path = output_dir.join(format!("{source_id}.jsonl"));
            let csv_path = output_dir.join(format!("{source_id}.csv"));
            info!(
                parent: &self.span,
                count = records.len(),
                path = %json_path.display(),
                "writing records"
            );
            write_lines(&json_path, records).await?;
            write_table(&csv_path, records).await?;
            files_written.push(json_path);
            files_written.push(csv_path);
        }

        let flattened = results.flatten();
        info!(
            parent: &self.span,
            count = flattened.len(),
            db = %self.config.db_path.display(),
            "persisting contact rows"
        );
        let mut store = ContactStore::open(&self.config.db_path).await?;
        let InsertReport { inserted, skipped } = store.write_deduped(&flattened).await?;
        store.close().await?;
        if skipped > 0 {
            info!(parent: &self.span, skipped, "duplicate contacts ignored");
        }

        Ok(PersistReport {
            files_written,
            inserted,
            skipped,
        })
    }

    pub async fn run_once(&self) -> Result<RunSummary> {
        let started_at = Utc::now();
        let run_id = Uuid::new_v4();
        info!(parent: &self.span, %run_id, "run started");

        let proxies = self.load_proxies()?;
        self.rank_keywords();

        let results = self
            .run_sources(
                &self.config.keywords,
                self.config.preview,
                self.config.limit,
                Some(&proxies),
            )
            .await?;
        let persisted = self.persist(&results).await?;
        info!(
            parent: &self.span,
            output_dir = %self.config.output_dir.display(),
            db = %self.config.db_path.display(),
            "wrote outputs"
        );

        Ok(RunSummary {
            run_id,
            started_at,
            finished_at: Utc::now(),
            preview: self.config.preview,
            proxies: proxies.len(),
            sources: results.len(),
            records: results.total_records(),
            inserted: persisted.inserted,
            skipped: persisted.skipped,
            output_dir: self.config.output_dir.display().to_string(),
            db_path: self.config.db_path.display().to_string(),
        })
    }
}
