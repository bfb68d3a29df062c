//! Content sniffing for uploaded files.
//!
//! The media type is always derived from the leading bytes of the stream, the
//! `Content-Type` declared by the client is never consulted.

/// Maximum number of leading bytes considered when sniffing.
pub const SNIFF_LEN: usize = 512;

/// Fallback for content that matches no known signature.
pub const OCTET_STREAM: &str = "application/octet-stream";

const TEXT_UTF8: &str = "text/plain; charset=utf-8";

const HTML_TAGS: &[&[u8]] = &[
    b"<!DOCTYPE HTML",
    b"<HTML",
    b"<HEAD",
    b"<SCRIPT",
    b"<IFRAME",
    b"<H1",
    b"<DIV",
    b"<FONT",
    b"<TABLE",
    b"<A",
    b"<STYLE",
    b"<TITLE",
    b"<B",
    b"<BODY",
    b"<BR",
    b"<P",
    b"<!--",
];

/// Best-guess media type for the first bytes of a stream.
pub fn detect_content_type(sample: &[u8]) -> String {
    let sample = &sample[..sample.len().min(SNIFF_LEN)];

    if let Some(mime) = sniff_markup(sample) {
        return mime.to_string();
    }
    if let Some(mime) = sniff_bom(sample) {
        return mime.to_string();
    }
    if let Some(kind) = infer::get(sample) {
        return kind.mime_type().to_string();
    }
    if sample.iter().any(|&b| is_binary_byte(b)) {
        OCTET_STREAM.to_string()
    } else {
        TEXT_UTF8.to_string()
    }
}

/// `true` when `allow_list` is empty or contains `mime`, ignoring ASCII case.
pub fn is_allowed(mime: &str, allow_list: &[String]) -> bool {
    allow_list.is_empty() || allow_list.iter().any(|x| x.eq_ignore_ascii_case(mime))
}

fn sniff_markup(sample: &[u8]) -> Option<&'static str> {
    let start = sample
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(sample.len());
    let data = &sample[start..];

    if data.starts_with(b"<?xml") {
        return Some("text/xml; charset=utf-8");
    }

    HTML_TAGS
        .iter()
        .any(|tag| {
            data.len() > tag.len()
                && data[..tag.len()].eq_ignore_ascii_case(tag)
                && matches!(data[tag.len()], b' ' | b'>')
        })
        .then_some("text/html; charset=utf-8")
}

fn sniff_bom(sample: &[u8]) -> Option<&'static str> {
    if sample.starts_with(&[0xFE, 0xFF]) {
        Some("text/plain; charset=utf-16be")
    } else if sample.starts_with(&[0xFF, 0xFE]) {
        Some("text/plain; charset=utf-16le")
    } else if sample.starts_with(&[0xEF, 0xBB, 0xBF]) {
        Some(TEXT_UTF8)
    } else {
        None
    }
}

fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}
