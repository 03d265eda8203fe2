//! In-memory PDF text extraction.

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// How far into the buffer the `%PDF-` header may appear.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Text extracted from a PDF, one entry per page in page order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPdf {
    pub pages: Vec<String>,
}

impl ExtractedPdf {
    /// All pages joined with no page-boundary marker.
    pub fn text(&self) -> String {
        self.pages.concat()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Whether no page carries any visible text.
    pub fn is_blank(&self) -> bool {
        self.pages.iter().all(|p| p.trim().is_empty())
    }
}

/// Check the buffer looks like a PDF before handing it to the parser.
fn ensure_pdf_header(bytes: &[u8]) -> Result<()> {
    if bytes.is_empty() {
        return Err(Error::input("the uploaded file is empty"));
    }
    let head = &bytes[..bytes.len().min(HEADER_SEARCH_WINDOW)];
    if head.windows(5).any(|w| w == b"%PDF-") {
        Ok(())
    } else {
        Err(Error::input("the uploaded file is not a PDF (missing %PDF header)"))
    }
}

/// Extract per-page text from a PDF held in memory.
///
/// Runs synchronously; call [`load_pdf`] from async code.
pub fn extract_pages(bytes: &[u8]) -> Result<ExtractedPdf> {
    ensure_pdf_header(bytes)?;

    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| Error::input(format!("the PDF could not be parsed: {e}")))?;

    debug!(
        pages = pages.len(),
        chars = pages.iter().map(String::len).sum::<usize>(),
        "Extracted PDF text"
    );
    Ok(ExtractedPdf { pages })
}

/// Extract a PDF on the blocking thread pool.
///
/// A panic inside the extractor is reported as a corrupt input rather than
/// tearing down the request.
pub async fn load_pdf(bytes: Vec<u8>) -> Result<ExtractedPdf> {
    match tokio::task::spawn_blocking(move || extract_pages(&bytes)).await {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, "PDF extraction aborted");
            Err(Error::input("the PDF is corrupt and could not be parsed"))
        }
    }
}
