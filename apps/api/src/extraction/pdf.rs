use super::ExtractError;

/// Extracts text from a PDF held in memory.
pub(super) fn extract_text(bytes: &[u8]) -> Result<String, ExtractError> {
    if !bytes.starts_with(b"%PDF") {
        return Err(ExtractError::ExtractionFailed(
            "file is not a PDF document".to_string(),
        ));
    }

    // pdf-extract panics on some malformed inputs.
    std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
        .map_err(|_| ExtractError::ExtractionFailed("PDF decoder panicked".to_string()))?
        .map_err(|e| ExtractError::ExtractionFailed(format!("could not read PDF: {e}")))
}
