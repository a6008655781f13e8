/// Scan raw PDF bytes for text shown inside `BT…ET` text objects.
///
/// Collects parenthesised string literals from each text object and joins
/// them with spaces. Compressed content streams (the common case for
/// generated PDFs) contain no readable literals and produce `None`.
pub fn extract_pdf_text(bytes: &[u8]) -> Option<String> {
    let mut pieces: Vec<String> = Vec::new();
    let mut pos = 0;

    while let Some(bt) = find(bytes, b"BT", pos) {
        let after_bt = bt + 2;
        // A truncated trailing object loses only its own literals.
        let Some(et) = find(bytes, b"ET", after_bt) else {
            break;
        };
        collect_literals(&bytes[after_bt..et], &mut pieces);
        pos = et + 2;
    }

    if pieces.is_empty() {
        return None;
    }
    Some(pieces.join(" "))
}

/// Pull printable ASCII out of `(...)` literals, honouring `\(`, `\)`
/// and `\\` escapes.
fn collect_literals(window: &[u8], out: &mut Vec<String>) {
    let mut current = String::new();
    let mut in_literal = false;
    let mut escaped = false;

    for &byte in window {
        if !in_literal {
            if byte == b'(' {
                in_literal = true;
                current.clear();
            }
            continue;
        }

        if escaped {
            if matches!(byte, b'(' | b')' | b'\\') {
                current.push(byte as char);
            }
            escaped = false;
        } else if byte == b'\\' {
            escaped = true;
        } else if byte == b')' {
            if !current.trim().is_empty() {
                out.push(std::mem::take(&mut current));
            }
            in_literal = false;
        } else if byte.is_ascii() && !byte.is_ascii_control() {
            current.push(byte as char);
        }
    }
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
    fn single_text_object() {
        let pdf = b"%PDF-1.4 BT /F1 12 Tf 100 700 Td (Hello World) Tj ET";
        assert_eq!(extract_pdf_text(pdf).unwrap(), "Hello World");
    }

    #[test]
    fn multiple_text_objects_joined_in_order() {
        let pdf = b"BT (First line) Tj ET junk BT (Second line) Tj ET";
        assert_eq!(extract_pdf_text(pdf).unwrap(), "First line Second line");
    }

    #[test]
    fn escaped_parentheses_kept() {
        let pdf = b"BT (dose \\(mg\\)) Tj ET";
        assert_eq!(extract_pdf_text(pdf).unwrap(), "dose (mg)");
    }

    #[test]
    fn literals_outside_text_objects_ignored() {
        let pdf = b"(metadata) BT (visible) Tj ET (trailer)";
        assert_eq!(extract_pdf_text(pdf).unwrap(), "visible");
    }

    #[test]
    fn compressed_stream_yields_none() {
        // A flate-compressed content stream has no BT/ET literals in the clear.
        let pdf = b"%PDF-1.7 stream \x78\x9c\x01\x02\x03 endstream";
        assert!(extract_pdf_text(pdf).is_none());
    }

    #[test]
    fn unterminated_text_object_yields_none() {
        assert!(extract_pdf_text(b"BT (never closed").is_none());
    }

    #[test]
    fn truncated_trailing_object_keeps_earlier_text() {
        let pdf = b"BT (Discharge instructions follow) Tj ET BT (cut off mid strea";
        assert_eq!(
            extract_pdf_text(pdf).unwrap(),
            "Discharge instructions follow"
        );
    }

    #[test]
    fn empty_input_yields_none() {
        assert!(extract_pdf_text(b"").is_none());
    }
}
