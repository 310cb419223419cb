//! Request orchestration: upload, ask, compare, stats.
//!
//! [`DocumentService`] owns the extraction cascade, the active index, and
//! the generation capability, and sequences them per request. Upload is
//! the only operation that mutates state, and the mutation is a single
//! atomic index swap. Clause mining runs inside upload but is non-fatal:
//! its failure is logged and reported as an empty list.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use serde::Serialize;
use tracing::{info, warn};

use crate::answer::Answerer;
use crate::chunk::chunk_pages;
use crate::clauses::{identify_clauses, ClauseRecord};
use crate::compare::{diff_lines, document_text};
use crate::config::{ChunkingConfig, Config};
use crate::embedding::{create_embedder, Embedder};
use crate::error::ServiceError;
use crate::extract::{default_strategies, extract_pages, DocumentInput, ExtractionStrategy};
use crate::index::{IndexSnapshot, SemanticIndex};
use crate::llm::{create_generator, TextGenerator};
use crate::models::{NormalizedPage, QueryResult};
use crate::normalize::normalize_pages;
use crate::ocr::{OcrEngine, OllamaVisionOcr};

/// What an upload returns to the caller.
#[derive(Debug, Serialize)]
pub struct UploadReport {
    pub message: String,
    pub filename: String,
    pub pages: usize,
    pub chunks_added: usize,
    #[serde(rename = "identified_clauses")]
    pub clauses: Vec<ClauseRecord>,
}

#[derive(Debug, Serialize)]
pub struct StatsReport {
    pub uptime_secs: u64,
    pub uploads: u64,
    pub questions: u64,
    pub embedding_model: String,
    pub generation_model: String,
    pub index: IndexSnapshot,
}

pub struct DocumentService {
    chunking: ChunkingConfig,
    strategies: Vec<Box<dyn ExtractionStrategy>>,
    index: Arc<SemanticIndex>,
    generator: Arc<dyn TextGenerator>,
    answerer: Answerer,
    embedding_model: String,
    generation_model: String,
    uploads: AtomicU64,
    questions: AtomicU64,
    started: Instant,
}

impl DocumentService {
    /// Wire the service from configuration with the real providers.
    pub fn from_config(config: &Config) -> Result<Self> {
        let embedder: Arc<dyn Embedder> = Arc::from(create_embedder(&config.embedding)?);
        let generator: Arc<dyn TextGenerator> = Arc::from(create_generator(&config.generation)?);
        let ocr: Arc<dyn OcrEngine> = Arc::new(OllamaVisionOcr::new(&config.ocr));
        Ok(Self::new(config, embedder, generator, ocr))
    }

    /// Wire the service with explicit capabilities. Used directly by
    /// tests to substitute deterministic providers.
    pub fn new(
        config: &Config,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn TextGenerator>,
        ocr: Arc<dyn OcrEngine>,
    ) -> Self {
        let embedding_model = embedder.model_name().to_string();
        let generation_model = generator.model_name().to_string();
        let index = Arc::new(SemanticIndex::new(embedder));
        let answerer = Answerer::new(index.clone(), generator.clone(), &config.retrieval);
        Self {
            chunking: config.chunking.clone(),
            strategies: default_strategies(&config.ocr, ocr),
            index,
            generator,
            answerer,
            embedding_model,
            generation_model,
            uploads: AtomicU64::new(0),
            questions: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    /// Ingest one document: extract, normalize, mine clauses, chunk,
    /// embed, and atomically replace the active index generation.
    pub async fn ingest(&self, filename: &str, path: &Path) -> Result<UploadReport, ServiceError> {
        let pages = self.extract_normalized(filename, path).await?;

        let clauses = match identify_clauses(self.generator.as_ref(), &pages).await {
            Ok(clauses) => clauses,
            Err(e) => {
                warn!(source = filename, error = %e, "clause identification failed, continuing without clauses");
                Vec::new()
            }
        };

        let chunks = chunk_pages(&pages, &self.chunking);
        let chunks_added = self.index.replace(chunks).await?;
        self.uploads.fetch_add(1, Ordering::Relaxed);
        info!(
            source = filename,
            pages = pages.len(),
            chunks_added,
            clauses = clauses.len(),
            "document indexed"
        );

        Ok(UploadReport {
            message: "दस्तावेज़ सफलतापूर्वक संसाधित हुआ".to_string(),
            filename: filename.to_string(),
            pages: pages.len(),
            chunks_added,
            clauses,
        })
    }

    /// Answer a question against the currently indexed document.
    pub async fn ask(&self, question: &str) -> Result<QueryResult, ServiceError> {
        let result = self.answerer.ask(question).await?;
        self.questions.fetch_add(1, Ordering::Relaxed);
        Ok(result)
    }

    /// Diff two documents line by line. Runs the full extraction and
    /// normalization path on each; neither document touches the index.
    pub async fn compare(
        &self,
        first_name: &str,
        first_path: &Path,
        second_name: &str,
        second_path: &Path,
    ) -> Result<Vec<String>, ServiceError> {
        let first = self
            .extract_normalized(first_name, first_path)
            .await
            .map_err(|e| ServiceError::Comparison(format!("{}: {}", first_name, e)))?;
        let second = self
            .extract_normalized(second_name, second_path)
            .await
            .map_err(|e| ServiceError::Comparison(format!("{}: {}", second_name, e)))?;
        Ok(diff_lines(
            first_name,
            &document_text(&first),
            second_name,
            &document_text(&second),
        ))
    }

    pub async fn stats(&self) -> StatsReport {
        StatsReport {
            uptime_secs: self.started.elapsed().as_secs(),
            uploads: self.uploads.load(Ordering::Relaxed),
            questions: self.questions.load(Ordering::Relaxed),
            embedding_model: self.embedding_model.clone(),
            generation_model: self.generation_model.clone(),
            index: self.index.snapshot().await,
        }
    }

    async fn extract_normalized(
        &self,
        filename: &str,
        path: &Path,
    ) -> Result<Vec<NormalizedPage>, ServiceError> {
        let input = DocumentInput::from_path(path, filename)
            .map_err(|e| ServiceError::Save(format!("cannot read {}: {}", filename, e)))?;
        let pages = extract_pages(&input, &self.strategies).await?;
        normalize_pages(pages)
    }
}

/// Reduce a client-supplied filename to something safe to place in a
/// temp path: the base name only, with anything outside alphanumerics,
/// dot, dash, and underscore replaced.
pub fn safe_filename(raw: &str) -> String {
    let base = Path::new(raw)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim_matches(|c| c == '.' || c == '_').is_empty() {
        "upload.bin".to_string()
    } else {
        cleaned
    }
}
