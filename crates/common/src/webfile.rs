//! Inspection of uploaded files
//!
//! Both helpers rewind the reader afterwards so the upload can still be
//! stored or streamed elsewhere.

use std::io::{self, Read, Seek};
use std::path::Path;

use dusted_fault::{ResultExt, SystemFailure};
use sha2::{Digest, Sha256};

/// Number of leading bytes considered when sniffing content
const SNIFF_LEN: u64 = 512;

const OCTET_STREAM: &str = "application/octet-stream";

const EXTENSIONS: &[(&str, &str)] = &[
    ("avif", "image/avif"),
    ("css", "text/css; charset=utf-8"),
    ("csv", "text/csv; charset=utf-8"),
    ("gif", "image/gif"),
    ("gz", "application/gzip"),
    ("htm", "text/html; charset=utf-8"),
    ("html", "text/html; charset=utf-8"),
    ("ico", "image/vnd.microsoft.icon"),
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("js", "text/javascript; charset=utf-8"),
    ("json", "application/json"),
    ("md", "text/markdown; charset=utf-8"),
    ("mjs", "text/javascript; charset=utf-8"),
    ("mp3", "audio/mpeg"),
    ("mp4", "video/mp4"),
    ("pdf", "application/pdf"),
    ("png", "image/png"),
    ("svg", "image/svg+xml"),
    ("txt", "text/plain; charset=utf-8"),
    ("wasm", "application/wasm"),
    ("wav", "audio/wav"),
    ("webm", "video/webm"),
    ("webp", "image/webp"),
    ("xml", "text/xml; charset=utf-8"),
    ("zip", "application/zip"),
];

const SIGNATURES: &[(&[u8], &str)] = &[
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"\xff\xd8\xff", "image/jpeg"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"%PDF-", "application/pdf"),
    (b"PK\x03\x04", "application/zip"),
    (b"\x1f\x8b\x08", "application/x-gzip"),
    (b"ID3", "audio/mpeg"),
    (b"OggS\x00", "application/ogg"),
    (b"\x1aE\xdf\xa3", "video/webm"),
    (b"\x00asm", "application/wasm"),
    (b"\xef\xbb\xbf", "text/plain; charset=utf-8"),
];

const HTML_TAGS: &[&str] = &[
    "<!doctype html", "<html", "<head", "<body", "<script", "<iframe", "<h1", "<div", "<font",
    "<table", "<a", "<style", "<title", "<b", "<br", "<p", "<!--",
];

/// Media type of an uploaded file.
///
/// The file name's extension wins; otherwise the first 512 bytes of the
/// content are sniffed.
pub fn mime_type<R: Read + Seek>(filename: &str, reader: &mut R) -> Result<String, SystemFailure> {
    if let Some(mime) = mime_from_extension(filename) {
        return Ok(mime.to_string());
    }

    let mut head = Vec::with_capacity(SNIFF_LEN as usize);
    reader
        .by_ref()
        .take(SNIFF_LEN)
        .read_to_end(&mut head)
        .wrap_system("webfile", "mime_type", "reading the first 512 bytes failed")?;
    reader
        .rewind()
        .wrap_system("webfile", "mime_type", "seeking file failed")?;

    let mime = detect_content_type(&head);
    tracing::debug!(filename, mime, "Detected content type by sniffing");
    Ok(mime.to_string())
}

/// Hex encoded SHA-256 of the file content followed by an optional salt
pub fn hash<R: Read + Seek>(reader: &mut R, salt: &[u8]) -> Result<String, SystemFailure> {
    let mut hasher = Sha256::new();
    io::copy(reader, &mut hasher).wrap_system("webfile", "hash", "reading file failed")?;
    reader
        .rewind()
        .wrap_system("webfile", "hash", "seeking file failed")?;

    hasher.update(salt);
    Ok(hex::encode(hasher.finalize()))
}

fn mime_from_extension(filename: &str) -> Option<&'static str> {
    let extension = Path::new(filename).extension()?.to_str()?.to_ascii_lowercase();
    EXTENSIONS
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
}

fn detect_content_type(data: &[u8]) -> &'static str {
    if data.is_empty() {
        return "text/plain; charset=utf-8";
    }

    if let Some((_, mime)) = SIGNATURES.iter().find(|(sig, _)| data.starts_with(sig)) {
        return *mime;
    }

    if data.len() >= 12 && &data[0..4] == b"RIFF" {
        match &data[8..12] {
            b"WEBP" => return "image/webp",
            b"WAVE" => return "audio/wave",
            b"AVI " => return "video/avi",
            _ => {}
        }
    }

    if data.len() >= 12 && &data[4..8] == b"ftyp" {
        return "video/mp4";
    }

    let text = trim_leading_whitespace(data);
    if starts_with_html_tag(text) {
        return "text/html; charset=utf-8";
    }
    if text.starts_with(b"<?xml") {
        return "text/xml; charset=utf-8";
    }

    if is_text(data) {
        "text/plain; charset=utf-8"
    } else {
        OCTET_STREAM
    }
}

fn trim_leading_whitespace(data: &[u8]) -> &[u8] {
    let start = data
        .iter()
        .position(|b| !matches!(b, b'\t' | b'\n' | b'\x0c' | b'\r' | b' '))
        .unwrap_or(data.len());
    &data[start..]
}

// A tag matches when followed by a space or '>'
fn starts_with_html_tag(data: &[u8]) -> bool {
    HTML_TAGS.iter().any(|tag| {
        let tag = tag.as_bytes();
        data.len() > tag.len()
            && data[..tag.len()].eq_ignore_ascii_case(tag)
            && matches!(data[tag.len()], b' ' | b'>')
    })
}

fn is_text(data: &[u8]) -> bool {
    !data
        .iter()
        .any(|b| matches!(b, 0x00..=0x08 | 0x0b | 0x0e..=0x1a | 0x1c..=0x1f))
}
