//! Extraction: turn raw source bytes into the plain text fed to generation.
//!
//! ## Why extraction never fails
//!
//! A document that yields no text is still a valid request: the generation
//! stage answers empty text with placeholder cards. So every failure here (no
//! pdfium library, corrupt bytes, one broken page) is logged and turned into
//! empty text instead of an error, and the caller always gets a `String`.
//!
//! ## Why a page trait?
//!
//! Page assembly rules (page order, single-newline joins, skipping empty and
//! failing pages) are independent of pdfium. [`PageTextSource`] lets those
//! rules run against any paged document, including in-memory test fixtures.

use crate::error::ExtractionError;
use pdfium_render::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

/// Text returned for image sources. No OCR is performed.
pub const IMAGE_PLACEHOLDER_TEXT: &str = "Text extracted from image would appear here.";

/// What kind of bytes a source holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Page-structured binary document (PDF).
    Document,
    /// Raster image. Extraction is a documented stub.
    Image,
    /// UTF-8 text.
    PlainText,
}

impl SourceKind {
    /// Classify a file name by its extension (case-insensitive).
    pub fn from_filename(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(SourceKind::Document),
            "png" | "jpg" | "jpeg" => Some(SourceKind::Image),
            "txt" | "md" => Some(SourceKind::PlainText),
            _ => None,
        }
    }
}

/// A document whose text can be read one page at a time.
pub trait PageTextSource {
    fn page_count(&self) -> usize;

    /// Text of the 0-indexed page `index`.
    fn page_text(&self, index: usize) -> Result<String, ExtractionError>;
}

/// Join page texts in page order with single newlines.
///
/// Pages that are empty, whitespace-only, or fail to read contribute nothing;
/// failures are logged with their 1-indexed page number.
pub fn collect_page_text(source: &dyn PageTextSource) -> String {
    let total = source.page_count();
    let mut pages = Vec::with_capacity(total);

    for index in 0..total {
        match source.page_text(index) {
            Ok(text) if text.trim().is_empty() => {
                debug!("Page {}: no extractable text", index + 1);
            }
            Ok(text) => pages.push(text),
            Err(e) => warn!("Skipping page {}/{}: {}", index + 1, total, e),
        }
    }

    pages.join("\n")
}

/// Extract plain text from `bytes` of the given kind. Never fails.
pub fn extract(bytes: &[u8], kind: SourceKind) -> String {
    match kind {
        SourceKind::Document => match extract_document(bytes) {
            Ok(text) => text,
            Err(e) => {
                warn!("Document extraction failed, continuing with empty text: {}", e);
                String::new()
            }
        },
        SourceKind::Image => IMAGE_PLACEHOLDER_TEXT.to_string(),
        SourceKind::PlainText => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// [`extract`] on the blocking thread pool.
///
/// pdfium is CPU-bound and not async-safe, so document extraction must not
/// run on a Tokio worker thread.
pub async fn extract_async(bytes: Vec<u8>, kind: SourceKind) -> String {
    match tokio::task::spawn_blocking(move || extract(&bytes, kind)).await {
        Ok(text) => text,
        Err(e) => {
            warn!("Extraction task panicked, continuing with empty text: {}", e);
            String::new()
        }
    }
}

// ── pdfium backend ───────────────────────────────────────────────────────

fn extract_document(bytes: &[u8]) -> Result<String, ExtractionError> {
    if !bytes.starts_with(b"%PDF") {
        let magic: Vec<u8> = bytes.iter().take(4).copied().collect();
        return Err(ExtractionError::UnreadableDocument(format!(
            "missing %PDF header (first bytes: {magic:?})"
        )));
    }

    let pdfium = bind_pdfium()?;
    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| ExtractionError::UnreadableDocument(format!("{:?}", e)))?;

    let text = collect_page_text(&document);
    info!(
        "Extracted {} chars from {} pages",
        text.chars().count(),
        document.page_count()
    );
    Ok(text)
}

/// Bind to `PDFIUM_LIB_PATH` when set, otherwise the system library.
fn bind_pdfium() -> Result<Pdfium, ExtractionError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.is_empty() => Pdfium::bind_to_library(&path),
        _ => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| ExtractionError::PdfiumUnavailable(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

impl PageTextSource for PdfDocument<'_> {
    fn page_count(&self) -> usize {
        self.pages().len() as usize
    }

    fn page_text(&self, index: usize) -> Result<String, ExtractionError> {
        let page_err = |e: PdfiumError| ExtractionError::Page {
            page: index + 1,
            detail: format!("{:?}", e),
        };
        let page = self.pages().get(index as u16).map_err(page_err)?;
        let text = page.text().map_err(page_err)?;
        Ok(text.all())
    }
}
