//! Input resolution: normalise a user-supplied path or URL to source bytes.
//!
//! Unlike extraction, this stage *does* fail: a missing file, an unsupported
//! extension, or an oversized upload is a caller mistake that should be
//! reported, not papered over with placeholder cards.

use crate::config::GenerationConfig;
use crate::error::FlashcardError;
use crate::model::MANUAL_TEXT_SOURCE;
use crate::pipeline::extract::SourceKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Source bytes with the name and kind they were resolved under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// File name (no directories), or [`MANUAL_TEXT_SOURCE`] for pasted text.
    pub name: String,
    pub kind: SourceKind,
    pub bytes: Vec<u8>,
}

impl SourceDocument {
    /// Wrap pasted text as a plain-text source.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            name: MANUAL_TEXT_SOURCE.to_string(),
            kind: SourceKind::PlainText,
            bytes: text.into().into_bytes(),
        }
    }

    /// Wrap uploaded bytes, classifying them by file name.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, FlashcardError> {
        let name = name.into();
        let kind = SourceKind::from_filename(&name)
            .ok_or_else(|| FlashcardError::UnsupportedFileType { name: name.clone() })?;
        Ok(Self { name, kind, bytes })
    }

    /// Default set title: the file name without its last extension.
    pub fn title(&self) -> String {
        match self.name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() && self.name != MANUAL_TEXT_SOURCE => {
                stem.to_string()
            }
            _ => self.name.clone(),
        }
    }

}

fn check_size(name: &str, size: usize, limit: usize) -> Result<(), FlashcardError> {
    if size > limit {
        return Err(FlashcardError::InputTooLarge {
            name: name.to_string(),
            size,
            limit,
        });
    }
    Ok(())
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve a local path or HTTP(S) URL to a [`SourceDocument`].
///
/// Uses `download_timeout_secs` and `max_input_bytes` from `config`. The
/// size limit is enforced before the body is buffered: local files are
/// checked by metadata, downloads by `Content-Length` and a running total.
pub async fn resolve_input(
    input: &str,
    config: &GenerationConfig,
) -> Result<SourceDocument, FlashcardError> {
    if is_url(input) {
        download_url(input, config.download_timeout_secs, config.max_input_bytes).await
    } else {
        read_local(input, config.max_input_bytes).await
    }
}

async fn read_local(path_str: &str, max_bytes: usize) -> Result<SourceDocument, FlashcardError> {
    if path_str.trim().is_empty() {
        return Err(FlashcardError::InvalidInput {
            input: path_str.to_string(),
        });
    }
    let path = PathBuf::from(path_str);
    let name = file_name(&path).ok_or_else(|| FlashcardError::InvalidInput {
        input: path_str.to_string(),
    })?;

    // Reject unsupported types before reading a possibly large file.
    if SourceKind::from_filename(&name).is_none() {
        return Err(FlashcardError::UnsupportedFileType { name });
    }

    let io_err = |e: std::io::Error| match e.kind() {
        std::io::ErrorKind::PermissionDenied => FlashcardError::PermissionDenied {
            path: path.clone(),
        },
        _ => FlashcardError::FileNotFound { path: path.clone() },
    };

    let metadata = tokio::fs::metadata(&path).await.map_err(io_err)?;
    let size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
    check_size(&name, size, max_bytes)?;

    let bytes = tokio::fs::read(&path).await.map_err(io_err)?;
    // The file may have grown since the metadata call.
    check_size(&name, bytes.len(), max_bytes)?;

    debug!("Read {} bytes from {}", bytes.len(), path.display());
    SourceDocument::from_bytes(name, bytes)
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
}

/// Download a URL into memory, stopping once `max_bytes` is exceeded.
async fn download_url(
    url: &str,
    timeout_secs: u64,
    max_bytes: usize,
) -> Result<SourceDocument, FlashcardError> {
    info!("Downloading source from: {}", url);

    let name = extract_filename(url).ok_or_else(|| FlashcardError::UnsupportedFileType {
        name: url.to_string(),
    })?;

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| FlashcardError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let request_err = |e: reqwest::Error| {
        if e.is_timeout() {
            FlashcardError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            FlashcardError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    };

    let mut response = client.get(url).send().await.map_err(request_err)?;

    if !response.status().is_success() {
        return Err(FlashcardError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    if let Some(declared) = response.content_length() {
        check_size(&name, usize::try_from(declared).unwrap_or(usize::MAX), max_bytes)?;
    }

    let mut bytes = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(request_err)? {
        bytes.extend_from_slice(&chunk);
        check_size(&name, bytes.len(), max_bytes)?;
    }

    info!("Downloaded {} bytes as {}", bytes.len(), name);
    SourceDocument::from_bytes(name, bytes)
}

/// Last URL path segment, if it names a supported file type.
fn extract_filename(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let last = parsed.path_segments()?.next_back()?;
    SourceKind::from_filename(last).map(|_| last.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config_with_limit(max_input_bytes: usize) -> GenerationConfig {
        GenerationConfig::builder()
            .max_input_bytes(max_input_bytes)
            .download_timeout_secs(5)
            .build()
            .unwrap()
    }

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn test_extract_filename() {
        assert_eq!(
            extract_filename("https://example.com/papers/notes.pdf"),
            Some("notes.pdf".to_string())
        );
        assert_eq!(extract_filename("https://example.com/papers/"), None);
        assert_eq!(extract_filename("https://example.com/page.html"), None);
    }

    #[test]
    fn test_title_strips_last_extension() {
        let doc = SourceDocument::from_bytes("biology.ch1.pdf", vec![]).unwrap();
        assert_eq!(doc.title(), "biology.ch1");
        assert_eq!(doc.kind, SourceKind::Document);
    }

    #[test]
    fn test_manual_text_source() {
        let doc = SourceDocument::from_text("Some pasted notes.");
        assert_eq!(doc.name, MANUAL_TEXT_SOURCE);
        assert_eq!(doc.kind, SourceKind::PlainText);
        assert_eq!(doc.title(), MANUAL_TEXT_SOURCE);
    }

    #[test]
    fn test_unsupported_bytes_rejected() {
        let err = SourceDocument::from_bytes("slides.pptx", vec![1, 2, 3]).unwrap_err();
        assert!(matches!(err, FlashcardError::UnsupportedFileType { .. }));
    }

    #[tokio::test]
    async fn test_resolve_local_text_file() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(b"Local notes about cells.").unwrap();

        let doc = resolve_input(file.path().to_str().unwrap(), &config_with_limit(1024))
            .await
            .unwrap();
        assert_eq!(doc.kind, SourceKind::PlainText);
        assert_eq!(doc.bytes, b"Local notes about cells.");
    }

    #[tokio::test]
    async fn test_resolve_missing_file() {
        let err = resolve_input("/definitely/not/here.pdf", &config_with_limit(1024))
            .await
            .unwrap_err();
        assert!(matches!(err, FlashcardError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn test_resolve_rejects_oversized_file() {
        let mut file = tempfile::Builder::new().suffix(".md").tempfile().unwrap();
        file.write_all(&[b'x'; 64]).unwrap();

        let err = resolve_input(file.path().to_str().unwrap(), &config_with_limit(16))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FlashcardError::InputTooLarge { size: 64, limit: 16, .. }
        ));
    }

    #[tokio::test]
    async fn test_oversized_file_rejected_from_metadata() {
        // Sparse 4 GiB file: rejection must come from the size on disk,
        // not from buffering the contents.
        let file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        file.as_file().set_len(4 << 30).unwrap();

        let err = resolve_input(file.path().to_str().unwrap(), &config_with_limit(16 << 20))
            .await
            .unwrap_err();
        match err {
            FlashcardError::InputTooLarge { size, limit, .. } => {
                assert_eq!(size as u64, 4u64 << 30);
                assert_eq!(limit, 16 << 20);
            }
            other => panic!("expected InputTooLarge, got {other:?}"),
        }
    }

    #[test]
    fn test_check_size_boundary() {
        assert!(check_size("a.txt", 16, 16).is_ok());
        assert!(matches!(
            check_size("a.txt", 17, 16),
            Err(FlashcardError::InputTooLarge { size: 17, limit: 16, .. })
        ));
    }

    #[tokio::test]
    async fn test_resolve_rejects_unknown_extension() {
        let err = resolve_input("/tmp/archive.zip", &config_with_limit(1024))
            .await
            .unwrap_err();
        assert!(matches!(err, FlashcardError::UnsupportedFileType { .. }));
    }
}
