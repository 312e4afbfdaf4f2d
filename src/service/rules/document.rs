//! Source document text: PDF extraction or plain UTF-8

use super::error::RuleExtractionError;

/// Whether the object key names a PDF document
pub fn is_pdf(document_name: &str) -> bool {
    document_name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("pdf"))
}

/// Turn stored document bytes into text for the extraction prompt
///
/// PDF pages are concatenated in page order. Any other key must hold UTF-8 text.
pub async fn document_text(
    document_name: &str,
    bytes: Vec<u8>,
) -> Result<String, RuleExtractionError> {
    let unreadable = |reason: String| RuleExtractionError::UnreadableDocument {
        document_name: document_name.to_string(),
        reason,
    };

    if !is_pdf(document_name) {
        return String::from_utf8(bytes).map_err(|e| unreadable(e.to_string()));
    }

    // Parsing is CPU-bound; a panic inside the PDF library stays in the blocking task
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| unreadable(format!("PDF text extraction aborted: {e}")))?
        .map_err(|e| unreadable(e.to_string()))?;

    tracing::debug!(
        document = %document_name,
        text_length = text.len(),
        "Extracted text from PDF"
    );

    Ok(text)
}


#[cfg(test)]
mod tests {
    use super::testing::minimal_pdf;
    use super::*;

    #[test]
    fn test_is_pdf() {
        assert!(is_pdf("policy.pdf"));
        assert!(is_pdf("archive/Policy.PDF"));
        assert!(!is_pdf("policy.txt"));
        assert!(!is_pdf("pdf"));
    }

    #[tokio::test]
    async fn test_plain_text_passes_through() {
        let text = document_text("policy.txt", b"Deny if fraud".to_vec())
            .await
            .unwrap();
        assert_eq!(text, "Deny if fraud");
    }

    #[tokio::test]
    async fn test_non_utf8_text_is_unreadable() {
        let err = document_text("policy.txt", vec![0xff, 0xfe])
            .await
            .unwrap_err();
        assert!(matches!(err, RuleExtractionError::UnreadableDocument { .. }));
    }

    #[tokio::test]
    async fn test_extracts_pdf_text() {
        let text = document_text("policy.pdf", minimal_pdf("Deny claims with proven fraud"))
            .await
            .unwrap();
        assert!(text.contains("Deny claims with proven fraud"), "got {text:?}");
    }

    #[tokio::test]
    async fn test_corrupt_pdf_is_unreadable() {
        let err = document_text("policy.pdf", b"%PDF-1.4\nthis is not a pdf".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RuleExtractionError::UnreadableDocument { ref document_name, .. } if document_name == "policy.pdf"
        ));
    }
}
