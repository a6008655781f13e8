//! Best-effort text extraction from uploaded files.
//!
//! This is a heuristic, not a format implementation: PDF and Word
//! extraction scan the raw byte stream for string literals between known
//! structural markers. Encrypted or compressed-stream PDFs and scanned
//! documents legitimately fail, and every failure degrades to a
//! human-readable placeholder asking the user to paste the text manually.

mod docx;
mod pdf;

pub use docx::extract_docx_text;
pub use pdf::extract_pdf_text;

/// Minimum usable extraction length. Anything shorter is treated as a
/// failed extraction and replaced by the placeholder.
const MIN_TEXT_LEN: usize = 20;

/// Extract plain text from an uploaded file, falling back to a
/// placeholder that always names the original file.
pub fn extract_text(file_name: &str, mime: &str, bytes: &[u8]) -> String {
    let attempted = match classify(file_name, mime) {
        FileKind::PlainText => Some(String::from_utf8_lossy(bytes).into_owned()),
        FileKind::Pdf => extract_pdf_text(bytes),
        FileKind::Docx => extract_docx_text(bytes),
        FileKind::Other => None,
    };

    match attempted {
        Some(text) if text.trim().len() >= MIN_TEXT_LEN || matches!(classify(file_name, mime), FileKind::PlainText) => text,
        _ => manual_paste_placeholder(file_name),
    }
}

/// The guidance string shown when extraction fails. Always non-empty and
/// always contains the original file name.
pub fn manual_paste_placeholder(file_name: &str) -> String {
    format!(
        "[Could not extract text from \"{file_name}\". The file may be scanned, \
         encrypted, or in an unsupported format. Please paste the document text \
         manually, or upload the file as a PDF or image for direct processing.]"
    )
}

enum FileKind {
    PlainText,
    Pdf,
    Docx,
    Other,
}

fn classify(file_name: &str, mime: &str) -> FileKind {
    let name = file_name.to_ascii_lowercase();
    if mime.starts_with("text/") || name.ends_with(".txt") || name.ends_with(".md") {
        FileKind::PlainText
    } else if mime == "application/pdf" || name.ends_with(".pdf") {
        FileKind::Pdf
    } else if mime == "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        || name.ends_with(".docx")
    {
        FileKind::Docx
    } else {
        FileKind::Other
    }
}
