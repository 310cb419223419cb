//! End-to-end pipeline tests with deterministic capabilities.
//!
//! These exercise the full upload → ask → compare flow through
//! [`DocumentService`] with a letter-frequency embedder and a scripted
//! generator, so no network or model is involved.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tempfile::TempDir;

use nyay_saarthi::config::Config;
use nyay_saarthi::embedding::Embedder;
use nyay_saarthi::error::ServiceError;
use nyay_saarthi::llm::TextGenerator;
use nyay_saarthi::ocr::OcrEngine;
use nyay_saarthi::pipeline::DocumentService;

/// Embeds text as a 26-dimensional ASCII letter frequency vector. Crude,
/// but deterministic and similarity-preserving enough for retrieval tests.
struct BagOfLetters;

#[async_trait]
impl Embedder for BagOfLetters {
    fn model_name(&self) -> &str {
        "bag-of-letters"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|t| {
                let mut v = vec![0.0f32; 26];
                for c in t.chars().filter(|c| c.is_ascii_alphabetic()) {
                    v[(c.to_ascii_lowercase() as usize) - ('a' as usize)] += 1.0;
                }
                v
            })
            .collect())
    }
}

/// Returns a clause payload for clause prompts and a fixed Hindi answer
/// for question prompts.
struct ScriptedGenerator {
    clause_payload: String,
}

impl ScriptedGenerator {
    fn finding_termination() -> Self {
        Self {
            clause_payload: r#"[{"clause_type": "Termination", "extracted_text": "Either party may terminate this agreement with thirty days notice."}]"#.to_string(),
        }
    }

    fn finding_nothing() -> Self {
        Self {
            clause_payload: "[]".to_string(),
        }
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        if prompt.contains("JSON array") {
            Ok(self.clause_payload.clone())
        } else {
            Ok("अनुबंध तीस दिन के नोटिस पर समाप्त हो सकता है।".to_string())
        }
    }
}

/// OCR must never run in these tests: every document is plain text.
struct UnreachableOcr;

#[async_trait]
impl OcrEngine for UnreachableOcr {
    async fn recognize(&self, _image_png: &[u8], _lang_hint: &str) -> Result<String> {
        panic!("OCR should not be reached for plain text inputs");
    }
}

fn service_with(generator: Arc<dyn TextGenerator>) -> DocumentService {
    let config = Config::minimal();
    DocumentService::new(
        &config,
        Arc::new(BagOfLetters),
        generator,
        Arc::new(UnreachableOcr),
    )
}

fn write_doc(dir: &TempDir, name: &str, text: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, text).unwrap();
    path
}

#[tokio::test]
async fn asking_before_any_upload_is_rejected() {
    let service = service_with(Arc::new(ScriptedGenerator::finding_nothing()));
    let err = service.ask("समाप्ति की शर्तें क्या हैं?").await.unwrap_err();
    assert!(matches!(err, ServiceError::NoActiveIndex));
}

#[tokio::test]
async fn upload_indexes_chunks_and_finds_clauses() {
    let dir = TempDir::new().unwrap();
    let path = write_doc(
        &dir,
        "contract.txt",
        "Either party may terminate this agreement with thirty days notice. \
         All payments are due within forty five days of invoice.",
    );
    let service = service_with(Arc::new(ScriptedGenerator::finding_termination()));

    let report = service.ingest("contract.txt", &path).await.unwrap();
    assert_eq!(report.pages, 1);
    assert!(report.chunks_added > 0);
    assert_eq!(report.clauses.len(), 1);
    assert_eq!(report.clauses[0].clause_type.label(), "Termination");
    assert_eq!(report.clauses[0].page_number, 1);
    assert!(!report.clauses[0].explanation.hi.is_empty());
}

#[tokio::test]
async fn a_second_upload_fully_replaces_the_first() {
    let dir = TempDir::new().unwrap();
    let first = write_doc(&dir, "v1.txt", "alpha alpha alpha lease agreement terms");
    let second = write_doc(&dir, "v2.txt", "beta beta beta employment agreement terms");
    let service = service_with(Arc::new(ScriptedGenerator::finding_nothing()));

    service.ingest("v1.txt", &first).await.unwrap();
    service.ingest("v2.txt", &second).await.unwrap();

    let result = service.ask("alpha agreement terms").await.unwrap();
    assert!(!result.sources.is_empty());
    for source in &result.sources {
        assert!(
            !source.content.contains("alpha"),
            "retrieved a chunk from the replaced generation: {}",
            source.content
        );
    }
}

#[tokio::test]
async fn answers_come_with_sources() {
    let dir = TempDir::new().unwrap();
    let path = write_doc(
        &dir,
        "contract.txt",
        "Either party may terminate this agreement with thirty days notice.",
    );
    let service = service_with(Arc::new(ScriptedGenerator::finding_nothing()));
    service.ingest("contract.txt", &path).await.unwrap();

    let result = service.ask("terminate agreement notice").await.unwrap();
    assert_eq!(result.answer, "अनुबंध तीस दिन के नोटिस पर समाप्त हो सकता है।");
    assert!(!result.sources.is_empty());
    assert!(result.sources[0].content.contains("terminate"));
    assert_eq!(result.sources[0].page, 1);
}

#[tokio::test]
async fn clause_failure_does_not_fail_the_upload() {
    struct ClausesBroken;

    #[async_trait]
    impl TextGenerator for ClausesBroken {
        fn model_name(&self) -> &str {
            "clauses-broken"
        }
        async fn generate(&self, prompt: &str) -> Result<String> {
            if prompt.contains("JSON array") {
                Ok("I refuse to produce JSON today.".to_string())
            } else {
                Ok("उत्तर".to_string())
            }
        }
    }

    let dir = TempDir::new().unwrap();
    let path = write_doc(&dir, "contract.txt", "Some ordinary agreement text here.");
    let service = service_with(Arc::new(ClausesBroken));

    let report = service.ingest("contract.txt", &path).await.unwrap();
    assert!(report.chunks_added > 0);
    assert!(report.clauses.is_empty());
}

#[tokio::test]
async fn comparing_identical_documents_yields_no_lines() {
    let dir = TempDir::new().unwrap();
    let text = "clause one\nclause two\nclause three";
    let a = write_doc(&dir, "a.txt", text);
    let b = write_doc(&dir, "b.txt", text);
    let service = service_with(Arc::new(ScriptedGenerator::finding_nothing()));

    let lines = service.compare("a.txt", &a, "b.txt", &b).await.unwrap();
    assert!(lines.is_empty());
}

#[tokio::test]
async fn comparing_revisions_reports_changed_lines() {
    let dir = TempDir::new().unwrap();
    let a = write_doc(&dir, "v1.txt", "rent is 1000\nterm is one year\ncity is Pune");
    let b = write_doc(&dir, "v2.txt", "rent is 1200\nterm is one year\ncity is Pune");
    let service = service_with(Arc::new(ScriptedGenerator::finding_nothing()));

    let lines = service.compare("v1.txt", &a, "v2.txt", &b).await.unwrap();
    assert!(lines.iter().any(|l| l == "-rent is 1000"));
    assert!(lines.iter().any(|l| l == "+rent is 1200"));
}

#[tokio::test]
async fn unreadable_files_surface_an_extraction_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("junk.bin");
    std::fs::write(&path, [0u8, 159, 146, 150, 0, 1, 2, 3]).unwrap();
    let service = service_with(Arc::new(ScriptedGenerator::finding_nothing()));

    let err = service.ingest("junk.bin", &path).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Extraction(_) | ServiceError::ContentEmpty
    ));
}

#[tokio::test]
async fn stats_reflect_processed_requests() {
    let dir = TempDir::new().unwrap();
    let path = write_doc(&dir, "doc.txt", "agreement text for counting");
    let service = service_with(Arc::new(ScriptedGenerator::finding_nothing()));

    let before = service.stats().await;
    assert_eq!(before.uploads, 0);
    assert_eq!(before.index.chunk_count, 0);

    service.ingest("doc.txt", &path).await.unwrap();
    service.ask("agreement").await.unwrap();

    let after = service.stats().await;
    assert_eq!(after.uploads, 1);
    assert_eq!(after.questions, 1);
    assert!(after.index.chunk_count > 0);
    assert!(after.index.generation_id.is_some());
    assert_eq!(after.embedding_model, "bag-of-letters");
}
