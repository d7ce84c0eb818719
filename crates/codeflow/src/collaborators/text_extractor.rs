//! Plain-text document decoding.
//!
//! Binary formats (PDF, Word) need a dedicated extractor; this one accepts
//! anything that is valid UTF-8 and reports everything else as unreadable so
//! the upload is kept but marked unprocessed.

use crate::collaborators::TextExtractor;
use crate::errors::ExtractionError;

#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract_text(&self, filename: &str, bytes: &[u8]) -> Result<String, ExtractionError> {
        let text = std::str::from_utf8(bytes).map_err(|e| {
            ExtractionError::Unreadable(format!(
                "'{}' is not UTF-8 text (invalid byte at offset {})",
                filename,
                e.valid_up_to()
            ))
        })?;
        Ok(text.trim_start_matches('\u{feff}').replace('\0', ""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_passes_through() {
        let text = PlainTextExtractor
            .extract_text("notes.txt", "\u{feff}Loops\n\nRecursion".as_bytes())
            .unwrap();
        assert_eq!(text, "Loops\n\nRecursion");
    }

    #[test]
    fn test_binary_is_unreadable() {
        let err = PlainTextExtractor
            .extract_text("slides.pdf", &[0x25, 0x50, 0xff, 0xfe])
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Unreadable(_)));
        assert!(err.to_string().contains("slides.pdf"));
    }
}
