//! Text extraction module.
//!
//! Extracts text from downloaded papers using pdftotext (Poppler).

mod extractor;

pub use extractor::{check_binary, ExtractionError, TextExtractor};
