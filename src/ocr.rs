//! Rasterized OCR capability for image-only pages.
//!
//! The last extraction fallback: render each PDF page to a PNG with
//! pdfium, then hand the image to a recognition capability. Rasterization
//! is CPU-bound and runs on the blocking thread pool; recognition is an
//! HTTP call to a vision model.
//!
//! Recognition is bilingual (Hindi + English by default) and per-page:
//! a failure on one page never fails the whole document.

use anyhow::{bail, Result};
use async_trait::async_trait;
use base64::Engine;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::OcrConfig;

/// Capability contract: `recognize(image, lang_hint) -> text`.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, image_png: &[u8], lang_hint: &str) -> Result<String>;
}

/// Capability contract: render a document file into one image per page.
#[async_trait]
pub trait PageRasterizer: Send + Sync {
    async fn rasterize(&self, path: &Path, target_width: u32) -> Result<Vec<Vec<u8>>>;
}

/// The production rasterizer, backed by the pdfium system library.
pub struct PdfiumRasterizer;

#[async_trait]
impl PageRasterizer for PdfiumRasterizer {
    async fn rasterize(&self, path: &Path, target_width: u32) -> Result<Vec<Vec<u8>>> {
        rasterize_pdf(path, target_width).await
    }
}

/// Render every page of a PDF to PNG bytes.
///
/// Runs pdfium on the blocking pool so a large scan does not stall the
/// request-handling threads.
pub async fn rasterize_pdf(path: &Path, target_width: u32) -> Result<Vec<Vec<u8>>> {
    let path: PathBuf = path.to_path_buf();
    tokio::task::spawn_blocking(move || rasterize_blocking(&path, target_width)).await?
}

fn rasterize_blocking(path: &Path, target_width: u32) -> Result<Vec<Vec<u8>>> {
    use pdfium_render::prelude::*;

    let bindings = Pdfium::bind_to_system_library()
        .map_err(|e| anyhow::anyhow!("pdfium library unavailable: {}", e))?;
    let pdfium = Pdfium::new(bindings);
    let document = pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| anyhow::anyhow!("failed to open PDF for rendering: {}", e))?;

    let render_config = PdfRenderConfig::new().set_target_width(target_width as i32);

    let mut pages = Vec::new();
    for page in document.pages().iter() {
        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| anyhow::anyhow!("page render failed: {}", e))?;
        let image = bitmap.as_image();
        let mut png = Vec::new();
        image.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)?;
        pages.push(png);
    }
    Ok(pages)
}

// ============ Ollama vision recognition ============

/// Recognition via a local Ollama vision model (e.g. llava), sending the
/// rendered page as a base64 image.
pub struct OllamaVisionOcr {
    model: String,
    url: String,
    timeout_secs: u64,
}

impl OllamaVisionOcr {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            model: config.model.clone(),
            url: config
                .url
                .clone()
                .unwrap_or_else(|| "http://localhost:11434".to_string()),
            timeout_secs: config.timeout_secs,
        }
    }
}

#[async_trait]
impl OcrEngine for OllamaVisionOcr {
    async fn recognize(&self, image_png: &[u8], lang_hint: &str) -> Result<String> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(image_png);
        let prompt = format!(
            "Transcribe all text visible in this scanned document page exactly as written. \
             The page may contain text in these languages: {}. \
             Output only the transcribed text with no commentary.",
            lang_hint
        );
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "images": [encoded],
            "stream": false,
        });
        let response = client
            .post(format!("{}/api/generate", self.url))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                anyhow::anyhow!(
                    "Ollama connection error (is Ollama running at {}?): {}",
                    self.url,
                    e
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Ollama API error {}: {}", status, body_text);
        }
        let json: serde_json::Value = response.json().await?;
        json.get("response")
            .and_then(|r| r.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("Invalid Ollama response: missing response text"))
    }
}
