/// Scan raw `.docx` bytes for `<w:t>…</w:t>` text runs.
///
/// Works only when the document XML happens to be stored uncompressed
/// inside the zip container; deflated archives (the normal case) contain
/// no readable tags and produce `None`.
pub fn extract_docx_text(bytes: &[u8]) -> Option<String> {
    const OPEN: &[u8] = b"<w:t";
    const CLOSE: &[u8] = b"</w:t>";

    let mut runs: Vec<String> = Vec::new();
    let mut pos = 0;

    while let Some(open) = find(bytes, OPEN, pos) {
        // Skip attributes to the end of the opening tag.
        let Some(tag_end) = find(bytes, b">", open) else {
            break;
        };
        let content_start = tag_end + 1;
        let Some(close) = find(bytes, CLOSE, content_start) else {
            break;
        };

        let run: String = bytes[content_start..close]
            .iter()
            .filter(|b| b.is_ascii() && !b.is_ascii_control())
            .map(|&b| b as char)
            .collect();
        if !run.trim().is_empty() {
            runs.push(run);
        }
        pos = close + CLOSE.len();
    }

    if runs.is_empty() {
        return None;
    }
    Some(runs.join(" "))
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_text_run() {
        let docx = b"<w:p><w:r><w:t>Take one tablet daily</w:t></w:r></w:p>";
        assert_eq!(extract_docx_text(docx).unwrap(), "Take one tablet daily");
    }

    #[test]
    fn runs_with_attributes() {
        let docx = b"<w:t xml:space=\"preserve\">Before meals </w:t><w:t>with water</w:t>";
        assert_eq!(
            extract_docx_text(docx).unwrap(),
            "Before meals  with water"
        );
    }

    #[test]
    fn deflated_archive_yields_none() {
        let docx = b"PK\x03\x04\x14\x00\x06\x00\x08\x00\x00\x00!\x00";
        assert!(extract_docx_text(docx).is_none());
    }

    #[test]
    fn unterminated_run_yields_none() {
        assert!(extract_docx_text(b"<w:t>never closed").is_none());
    }
}
