//! Document loading.

mod pdf;

#[cfg(test)]
pub(crate) mod test_pdf;

pub use pdf::{extract_pages, load_pdf, ExtractedPdf};
