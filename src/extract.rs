//! Text-extraction fallback cascade.
//!
//! An uploaded document passes through an ordered list of strategies:
//! a structured document loader (DOCX/PPTX/XLSX/plain text), two
//! independent PDF text extractors, and finally rasterized OCR for
//! PDF-like inputs. The first strategy to produce non-empty pages wins;
//! each failure is logged and retained so a total miss can report every
//! reason at once.
//!
//! File-type detection combines the extension with magic-byte sniffing,
//! so a scanned PDF with a wrong extension still reaches the OCR
//! fallback.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::OcrConfig;
use crate::error::{ServiceError, StrategyFailure};
use crate::models::Page;
use crate::ocr::{OcrEngine, PageRasterizer, PdfiumRasterizer};

/// PDF magic bytes at offset 0.
const PDF_SIGNATURE: &[u8] = b"%PDF-";
/// Maximum decompressed bytes read from a single ZIP entry.
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;
/// Maximum sheets processed in an xlsx.
const XLSX_MAX_SHEETS: usize = 100;
/// Maximum cells processed per sheet.
const XLSX_MAX_CELLS_PER_SHEET: usize = 100_000;

/// What the file looks like, from extension plus magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedKind {
    Pdf,
    Docx,
    Pptx,
    Xlsx,
    PlainText,
    Unknown,
}

/// One document handed to the cascade.
#[derive(Debug, Clone)]
pub struct DocumentInput {
    pub path: PathBuf,
    /// Base filename, used as chunk provenance.
    pub source: String,
    pub kind: DetectedKind,
}

impl DocumentInput {
    /// Build an input for a file on disk, sniffing its type.
    pub fn from_path(path: &Path, source: &str) -> std::io::Result<Self> {
        let mut prefix = [0u8; 8];
        let n = std::fs::File::open(path).and_then(|mut f| f.read(&mut prefix))?;
        Ok(Self {
            path: path.to_path_buf(),
            source: source.to_string(),
            kind: detect_kind(source, &prefix[..n]),
        })
    }
}

/// Detect the document kind. The magic sniff outranks the extension so a
/// PDF saved as `.txt` is still offered the PDF extractors and OCR.
pub fn detect_kind(filename: &str, prefix: &[u8]) -> DetectedKind {
    if prefix.starts_with(PDF_SIGNATURE) {
        return DetectedKind::Pdf;
    }
    let ext = filename
        .rsplit('.')
        .next()
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => DetectedKind::Pdf,
        "docx" => DetectedKind::Docx,
        "pptx" => DetectedKind::Pptx,
        "xlsx" => DetectedKind::Xlsx,
        "txt" | "md" | "csv" => DetectedKind::PlainText,
        _ => DetectedKind::Unknown,
    }
}

/// One rung of the cascade: produce a non-empty list of pages or fail.
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    /// Whether this strategy should be attempted for the input at all.
    fn applies_to(&self, input: &DocumentInput) -> bool;
    async fn try_extract(&self, input: &DocumentInput) -> Result<Vec<Page>>;
}

/// Run the cascade: first non-empty result wins; all failures are kept.
pub async fn extract_pages(
    input: &DocumentInput,
    strategies: &[Box<dyn ExtractionStrategy>],
) -> Result<Vec<Page>, ServiceError> {
    let mut failures = Vec::new();
    for strategy in strategies {
        if !strategy.applies_to(input) {
            continue;
        }
        match strategy.try_extract(input).await {
            Ok(pages) => {
                let pages: Vec<Page> =
                    pages.into_iter().filter(|p| !p.text.trim().is_empty()).collect();
                if pages.is_empty() {
                    warn!(strategy = strategy.name(), source = %input.source, "strategy produced no text");
                    failures.push(StrategyFailure {
                        strategy: strategy.name(),
                        reason: "produced no text".to_string(),
                    });
                    continue;
                }
                info!(
                    strategy = strategy.name(),
                    source = %input.source,
                    pages = pages.len(),
                    "extraction succeeded"
                );
                return Ok(pages);
            }
            Err(e) => {
                warn!(strategy = strategy.name(), source = %input.source, error = %e, "strategy failed");
                failures.push(StrategyFailure {
                    strategy: strategy.name(),
                    reason: e.to_string(),
                });
            }
        }
    }
    Err(ServiceError::Extraction(failures))
}

/// The production strategy order.
pub fn default_strategies(
    ocr_config: &OcrConfig,
    ocr_engine: Arc<dyn OcrEngine>,
) -> Vec<Box<dyn ExtractionStrategy>> {
    vec![
        Box::new(StructuredLoader),
        Box::new(PdfExtractStrategy),
        Box::new(LopdfStrategy),
        Box::new(OcrStrategy {
            rasterizer: Arc::new(PdfiumRasterizer),
            engine: ocr_engine,
            config: ocr_config.clone(),
        }),
    ]
}

// ============ Structured document loader ============

/// Loads OOXML documents (DOCX, PPTX, XLSX) and plain text. PPTX slides
/// and XLSX sheets each become their own page.
pub struct StructuredLoader;

#[async_trait]
impl ExtractionStrategy for StructuredLoader {
    fn name(&self) -> &'static str {
        "structured"
    }

    fn applies_to(&self, input: &DocumentInput) -> bool {
        !matches!(input.kind, DetectedKind::Pdf)
    }

    async fn try_extract(&self, input: &DocumentInput) -> Result<Vec<Page>> {
        let input = input.clone();
        tokio::task::spawn_blocking(move || {
            let bytes = std::fs::read(&input.path)?;
            match input.kind {
                DetectedKind::Docx => {
                    let text = extract_docx(&bytes)?;
                    Ok(vec![Page {
                        source: input.source.clone(),
                        number: 1,
                        text,
                    }])
                }
                DetectedKind::Pptx => Ok(texts_to_pages(&input.source, extract_pptx(&bytes)?)),
                DetectedKind::Xlsx => Ok(texts_to_pages(&input.source, extract_xlsx(&bytes)?)),
                DetectedKind::PlainText | DetectedKind::Unknown => {
                    let text = String::from_utf8(bytes)
                        .map_err(|_| anyhow::anyhow!("file is not valid UTF-8 text"))?;
                    Ok(vec![Page {
                        source: input.source.clone(),
                        number: 1,
                        text,
                    }])
                }
                DetectedKind::Pdf => bail!("structured loader does not handle PDF"),
            }
        })
        .await?
    }
}

fn texts_to_pages(source: &str, texts: Vec<String>) -> Vec<Page> {
    texts
        .into_iter()
        .enumerate()
        .map(|(i, text)| Page {
            source: source.to_string(),
            number: (i + 1) as u32,
            text,
        })
        .collect()
}

fn read_zip_entry_bounded(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
    name: &str,
) -> Result<Vec<u8>> {
    let entry = archive.by_name(name)?;
    let mut out = Vec::new();
    entry.take(MAX_XML_ENTRY_BYTES).read_to_end(&mut out)?;
    if out.len() as u64 >= MAX_XML_ENTRY_BYTES {
        bail!("ZIP entry {} exceeds size limit", name);
    }
    Ok(out)
}

fn extract_docx(bytes: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))?;
    let xml = read_zip_entry_bounded(&mut archive, "word/document.xml")?;
    collect_t_elements(&xml)
}

fn extract_pptx(bytes: &[u8]) -> Result<Vec<String>> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))?;
    let mut slide_names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with("ppt/slides/slide") && n.ends_with(".xml"))
        .map(|s| s.to_string())
        .collect();
    slide_names.sort_by_key(|name| {
        name.trim_start_matches("ppt/slides/slide")
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });
    let mut slides = Vec::new();
    for name in slide_names {
        let xml = read_zip_entry_bounded(&mut archive, &name)?;
        slides.push(collect_t_elements(&xml)?);
    }
    Ok(slides)
}

fn extract_xlsx(bytes: &[u8]) -> Result<Vec<String>> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))?;
    let shared_strings = read_shared_strings(&mut archive)?;
    let mut sheet_names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with("xl/worksheets/sheet") && n.ends_with(".xml"))
        .map(|s| s.to_string())
        .collect();
    sheet_names.sort_by_key(|name| {
        name.trim_start_matches("xl/worksheets/sheet")
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });
    let mut sheets = Vec::new();
    for name in sheet_names.into_iter().take(XLSX_MAX_SHEETS) {
        let xml = read_zip_entry_bounded(&mut archive, &name)?;
        sheets.push(extract_sheet_cells(&xml, &shared_strings)?);
    }
    Ok(sheets)
}

/// Collect the text of every `<w:t>`/`<a:t>` element, space-separated.
fn collect_t_elements(xml: &[u8]) -> Result<String> {
    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    if let Ok(quick_xml::events::Event::Text(te)) = reader.read_event_into(&mut buf)
                    {
                        if !out.is_empty() {
                            out.push(' ');
                        }
                        out.push_str(te.unescape().unwrap_or_default().as_ref());
                    }
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => bail!("malformed OOXML: {}", e),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

fn read_shared_strings(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
) -> Result<Vec<String>> {
    let xml = read_zip_entry_bounded(archive, "xl/sharedStrings.xml")?;
    let mut strings = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut in_si = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"si" {
                    in_si = true;
                } else if in_si && e.local_name().as_ref() == b"t" {
                    if let Ok(quick_xml::events::Event::Text(te)) = reader.read_event_into(&mut buf)
                    {
                        strings.push(te.unescape().unwrap_or_default().into_owned());
                    }
                }
            }
            Ok(quick_xml::events::Event::End(e)) => {
                if e.local_name().as_ref() == b"si" {
                    in_si = false;
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => bail!("malformed sharedStrings.xml: {}", e),
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

fn extract_sheet_cells(xml: &[u8], shared_strings: &[String]) -> Result<String> {
    let mut cells: Vec<String> = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut in_v = false;
    let mut cell_is_shared_str = false;
    loop {
        if cells.len() >= XLSX_MAX_CELLS_PER_SHEET {
            break;
        }
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"c" {
                    cell_is_shared_str = e.attributes().any(|a| {
                        a.as_ref()
                            .map(|a| a.key.as_ref() == b"t" && a.value.as_ref() == b"s")
                            .unwrap_or(false)
                    });
                } else if e.local_name().as_ref() == b"v" {
                    in_v = true;
                }
            }
            Ok(quick_xml::events::Event::Text(te)) if in_v => {
                let v = te.unescape().unwrap_or_default();
                let s = v.trim();
                if !s.is_empty() && cell_is_shared_str {
                    if let Ok(i) = s.parse::<usize>() {
                        if i < shared_strings.len() {
                            cells.push(shared_strings[i].clone());
                        }
                    }
                }
                in_v = false;
            }
            Ok(quick_xml::events::Event::End(e)) => {
                if e.local_name().as_ref() == b"v" {
                    in_v = false;
                } else if e.local_name().as_ref() == b"c" {
                    cell_is_shared_str = false;
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => bail!("malformed worksheet XML: {}", e),
            _ => {}
        }
        buf.clear();
    }
    Ok(cells.join(" "))
}

// ============ PDF text extractors ============

/// First PDF extractor: pdf-extract's per-page text pass. One output
/// string per document page, so page numbers stay true.
pub struct PdfExtractStrategy;

#[async_trait]
impl ExtractionStrategy for PdfExtractStrategy {
    fn name(&self) -> &'static str {
        "pdf-extract"
    }

    fn applies_to(&self, input: &DocumentInput) -> bool {
        matches!(input.kind, DetectedKind::Pdf)
    }

    async fn try_extract(&self, input: &DocumentInput) -> Result<Vec<Page>> {
        let input = input.clone();
        tokio::task::spawn_blocking(move || {
            let bytes = std::fs::read(&input.path)?;
            let texts = pdf_extract::extract_text_from_mem_by_pages(&bytes)
                .map_err(|e| anyhow::anyhow!("pdf-extract failed: {}", e))?;
            Ok(texts_to_pages(&input.source, texts))
        })
        .await?
    }
}

/// Second, independent PDF extractor: lopdf's per-page content-stream
/// text. Catches documents pdf-extract chokes on.
pub struct LopdfStrategy;

#[async_trait]
impl ExtractionStrategy for LopdfStrategy {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn applies_to(&self, input: &DocumentInput) -> bool {
        matches!(input.kind, DetectedKind::Pdf)
    }

    async fn try_extract(&self, input: &DocumentInput) -> Result<Vec<Page>> {
        let input = input.clone();
        tokio::task::spawn_blocking(move || {
            let doc = lopdf::Document::load(&input.path)
                .map_err(|e| anyhow::anyhow!("lopdf failed to open: {}", e))?;
            let mut pages = Vec::new();
            for (page_number, _) in doc.get_pages() {
                let text = doc.extract_text(&[page_number]).unwrap_or_default();
                pages.push(Page {
                    source: input.source.clone(),
                    number: page_number,
                    text,
                });
            }
            Ok(pages)
        })
        .await?
    }
}

// ============ OCR fallback ============

/// Last resort for PDF-like inputs: rasterize each page and run bilingual
/// recognition per page. One page's recognition failure is skipped, not
/// fatal — scanned documents routinely have an unreadable page.
pub struct OcrStrategy {
    pub rasterizer: Arc<dyn PageRasterizer>,
    pub engine: Arc<dyn OcrEngine>,
    pub config: OcrConfig,
}

#[async_trait]
impl ExtractionStrategy for OcrStrategy {
    fn name(&self) -> &'static str {
        "ocr"
    }

    fn applies_to(&self, input: &DocumentInput) -> bool {
        self.config.enabled && matches!(input.kind, DetectedKind::Pdf)
    }

    async fn try_extract(&self, input: &DocumentInput) -> Result<Vec<Page>> {
        let images = self
            .rasterizer
            .rasterize(&input.path, self.config.render_width)
            .await?;
        let mut pages = Vec::new();
        for (i, image) in images.iter().enumerate() {
            let number = (i + 1) as u32;
            match self.engine.recognize(image, &self.config.languages).await {
                Ok(text) => pages.push(Page {
                    source: input.source.clone(),
                    number,
                    text,
                }),
                Err(e) => {
                    warn!(source = %input.source, page = number, error = %e, "OCR failed for page, skipping");
                }
            }
        }
        if pages.is_empty() {
            bail!("recognition produced no text on any page");
        }
        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn pdf_magic_outranks_extension() {
        assert_eq!(detect_kind("scan.txt", b"%PDF-1.4"), DetectedKind::Pdf);
        assert_eq!(detect_kind("scan", b"%PDF-1.7\n"), DetectedKind::Pdf);
    }

    #[test]
    fn extension_detection() {
        assert_eq!(detect_kind("a.pdf", b"PK\x03\x04"), DetectedKind::Pdf);
        assert_eq!(detect_kind("a.docx", b"PK\x03\x04"), DetectedKind::Docx);
        assert_eq!(detect_kind("a.PPTX", b"PK\x03\x04"), DetectedKind::Pptx);
        assert_eq!(detect_kind("a.xlsx", b"PK\x03\x04"), DetectedKind::Xlsx);
        assert_eq!(detect_kind("notes.txt", b"hello"), DetectedKind::PlainText);
        assert_eq!(detect_kind("mystery.bin", b"hello"), DetectedKind::Unknown);
    }

    struct FakeStrategy {
        name: &'static str,
        pages: Option<Vec<Page>>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ExtractionStrategy for FakeStrategy {
        fn name(&self) -> &'static str {
            self.name
        }
        fn applies_to(&self, _input: &DocumentInput) -> bool {
            true
        }
        async fn try_extract(&self, input: &DocumentInput) -> Result<Vec<Page>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.pages {
                Some(p) => {
                    let mut p = p.clone();
                    for page in &mut p {
                        page.source = input.source.clone();
                    }
                    Ok(p)
                }
                None => bail!("simulated failure"),
            }
        }
    }

    fn fake_input() -> DocumentInput {
        DocumentInput {
            path: PathBuf::from("/nonexistent"),
            source: "doc.pdf".to_string(),
            kind: DetectedKind::Pdf,
        }
    }

    fn some_page() -> Page {
        Page {
            source: String::new(),
            number: 1,
            text: "hello".to_string(),
        }
    }

    #[tokio::test]
    async fn first_success_short_circuits() {
        let a_calls = Arc::new(AtomicUsize::new(0));
        let b_calls = Arc::new(AtomicUsize::new(0));
        let strategies: Vec<Box<dyn ExtractionStrategy>> = vec![
            Box::new(FakeStrategy {
                name: "a",
                pages: Some(vec![some_page()]),
                calls: a_calls.clone(),
            }),
            Box::new(FakeStrategy {
                name: "b",
                pages: Some(vec![some_page()]),
                calls: b_calls.clone(),
            }),
        ];
        let pages = extract_pages(&fake_input(), &strategies).await.unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
        assert_eq!(b_calls.load(Ordering::SeqCst), 0, "later strategies must not run");
    }

    #[tokio::test]
    async fn failures_fall_through_and_are_all_reported() {
        let calls = Arc::new(AtomicUsize::new(0));
        let strategies: Vec<Box<dyn ExtractionStrategy>> = vec![
            Box::new(FakeStrategy {
                name: "a",
                pages: None,
                calls: calls.clone(),
            }),
            Box::new(FakeStrategy {
                name: "b",
                pages: Some(vec![]),
                calls: calls.clone(),
            }),
        ];
        let err = extract_pages(&fake_input(), &strategies).await.unwrap_err();
        match err {
            ServiceError::Extraction(failures) => {
                assert_eq!(failures.len(), 2);
                assert_eq!(failures[0].strategy, "a");
                assert_eq!(failures[1].strategy, "b");
            }
            other => panic!("expected Extraction, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn whitespace_only_pages_do_not_count_as_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let win_calls = Arc::new(AtomicUsize::new(0));
        let blank = Page {
            source: String::new(),
            number: 1,
            text: "   \n ".to_string(),
        };
        let strategies: Vec<Box<dyn ExtractionStrategy>> = vec![
            Box::new(FakeStrategy {
                name: "blank",
                pages: Some(vec![blank]),
                calls: calls.clone(),
            }),
            Box::new(FakeStrategy {
                name: "real",
                pages: Some(vec![some_page()]),
                calls: win_calls.clone(),
            }),
        ];
        let pages = extract_pages(&fake_input(), &strategies).await.unwrap();
        assert_eq!(pages[0].text, "hello");
        assert_eq!(win_calls.load(Ordering::SeqCst), 1);
    }

    fn two_page_pdf(first: &str, second: &str) -> Vec<u8> {
        use lopdf::content::{Content, Operation};
        use lopdf::{dictionary, Document, Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let mut kids: Vec<Object> = Vec::new();
        for text in [first, second] {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => 2,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[tokio::test]
    async fn pdf_extraction_keeps_page_numbers() {
        let bytes = two_page_pdf("PAGE ONE TEXT", "PAGE TWO TEXT");
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut tmp, &bytes).unwrap();
        let input = DocumentInput::from_path(tmp.path(), "two.pdf").unwrap();
        assert_eq!(input.kind, DetectedKind::Pdf);

        let pages = PdfExtractStrategy.try_extract(&input).await.unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].number, 1);
        assert!(pages[0].text.contains("PAGE ONE TEXT"));
        assert!(!pages[0].text.contains("PAGE TWO TEXT"));
        assert_eq!(pages[1].number, 2);
        assert!(pages[1].text.contains("PAGE TWO TEXT"));
    }

    struct FixedImages;

    #[async_trait]
    impl crate::ocr::PageRasterizer for FixedImages {
        async fn rasterize(&self, _path: &Path, _target_width: u32) -> Result<Vec<Vec<u8>>> {
            Ok(vec![vec![1], vec![2]])
        }
    }

    #[tokio::test]
    async fn ocr_skips_a_page_whose_recognition_fails() {
        struct FlakyOcr;
        #[async_trait]
        impl OcrEngine for FlakyOcr {
            async fn recognize(&self, image_png: &[u8], _lang_hint: &str) -> Result<String> {
                if image_png == [1] {
                    bail!("unreadable page");
                }
                Ok("दूसरे पृष्ठ का पाठ".to_string())
            }
        }

        let strategy = OcrStrategy {
            rasterizer: Arc::new(FixedImages),
            engine: Arc::new(FlakyOcr),
            config: OcrConfig::default(),
        };
        let pages = strategy.try_extract(&fake_input()).await.unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].number, 2);
        assert_eq!(pages[0].text, "दूसरे पृष्ठ का पाठ");
    }

    #[tokio::test]
    async fn ocr_fails_only_when_every_page_fails() {
        struct BlindOcr;
        #[async_trait]
        impl OcrEngine for BlindOcr {
            async fn recognize(&self, _image_png: &[u8], _lang_hint: &str) -> Result<String> {
                bail!("nothing recognized")
            }
        }

        let strategy = OcrStrategy {
            rasterizer: Arc::new(FixedImages),
            engine: Arc::new(BlindOcr),
            config: OcrConfig::default(),
        };
        assert!(strategy.try_extract(&fake_input()).await.is_err());
    }

    #[test]
    fn docx_text_is_extracted_from_zip() {
        // Minimal docx: a zip with word/document.xml containing two w:t runs.
        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buf);
            let options: zip::write::SimpleFileOptions = Default::default();
            writer.start_file("word/document.xml", options).unwrap();
            use std::io::Write;
            writer
                .write_all(
                    br#"<?xml version="1.0"?><w:document xmlns:w="x"><w:body><w:p><w:r><w:t>Hello</w:t></w:r><w:r><w:t>World</w:t></w:r></w:p></w:body></w:document>"#,
                )
                .unwrap();
            writer.finish().unwrap();
        }
        let text = extract_docx(buf.get_ref()).unwrap();
        assert_eq!(text, "Hello World");
    }

    #[test]
    fn invalid_zip_is_an_error() {
        assert!(extract_docx(b"not a zip").is_err());
    }
}
