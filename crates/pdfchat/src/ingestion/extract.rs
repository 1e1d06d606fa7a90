//! PDF text extraction

use crate::error::{Error, Result};

/// Extract the plain text of a PDF held in memory.
pub fn extract_text(bytes: &[u8], filename: &str) -> Result<String> {
    pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| Error::file_parse(filename, e.to_string()))
}
