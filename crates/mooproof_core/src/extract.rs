//! crates/mooproof_core/src/extract.rs
//!
//! Turns an uploaded file's raw bytes into plain text.
//!
//! Extraction is best-effort: `.txt` files are transcoded to UTF-8 and `.docx`
//! files have the character content of their text runs concatenated. Nothing
//! here touches the filesystem.

use std::io::{Cursor, Read};
use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use encoding_rs::{Encoding, WINDOWS_1252};
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use zip::ZipArchive;

use crate::error::ExtractError;

/// The archive entry holding the body of a Word document.
const DOCUMENT_PART: &str = "word/document.xml";

/// The WordprocessingML namespace `w:` is bound to.
const WORDML_NS: &[u8] = b"http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// The upload formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Txt,
    Docx,
}

impl FileKind {
    /// Determines the format from the filename's extension, case-insensitively.
    pub fn from_filename(filename: &str) -> Result<Self, ExtractError> {
        let extension = file_extension(filename);
        match extension.as_str() {
            "txt" => Ok(FileKind::Txt),
            "docx" => Ok(FileKind::Docx),
            _ => Err(ExtractError::UnsupportedFileType(extension)),
        }
    }

    fn label(self) -> &'static str {
        match self {
            FileKind::Txt => "TXT",
            FileKind::Docx => "DOCX",
        }
    }
}

/// The lower-cased extension of `filename`, or an empty string when it has none.
pub fn file_extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Upper bound on the decompressed size of a document's body part.
pub const DEFAULT_MAX_DOCUMENT_BYTES: u64 = 64 * 1024 * 1024;

#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    /// Separate `<w:p>` paragraphs with a blank line instead of joining runs directly.
    pub paragraph_breaks: bool,
    /// Archives whose body part inflates past this many bytes are rejected.
    pub max_document_bytes: u64,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            paragraph_breaks: false,
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
        }
    }
}

/// Extracts plain text from `bytes`, picking the format from `filename`.
pub fn extract(bytes: &[u8], filename: &str) -> Result<String, ExtractError> {
    extract_with(bytes, filename, ExtractOptions::default())
}

pub fn extract_with(
    bytes: &[u8],
    filename: &str,
    options: ExtractOptions,
) -> Result<String, ExtractError> {
    match FileKind::from_filename(filename)? {
        FileKind::Txt => Ok(decode_text(bytes)),
        FileKind::Docx => extract_docx(bytes, options),
    }
}

/// Turns the wire payload of an upload back into file bytes.
///
/// Plain text files travel as-is; every other format travels base64 encoded,
/// optionally still wearing the `data:...;base64,` prefix a browser adds.
pub fn decode_upload(payload: &str, filename: &str) -> Result<Vec<u8>, ExtractError> {
    if FileKind::from_filename(filename)? == FileKind::Txt {
        return Ok(payload.as_bytes().to_vec());
    }

    let encoded = match payload.split_once(',') {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => payload,
    };
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();

    STANDARD
        .decode(compact.as_bytes())
        .map_err(|_| ExtractError::UndecodablePayload)
}

/// Decodes a plain text file into UTF-8.
///
/// A byte-order mark wins; otherwise valid UTF-8 passes through untouched and
/// anything else is read as Windows-1252, which covers ISO-8859-1 text too.
pub fn decode_text(bytes: &[u8]) -> String {
    if let Some((encoding, bom_length)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_length..]);
        return text.into_owned();
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
            text.into_owned()
        }
    }
}

fn extract_docx(bytes: &[u8], options: ExtractOptions) -> Result<String, ExtractError> {
    let no_text = || ExtractError::NoTextExtracted(FileKind::Docx.label().to_string());

    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|_| ExtractError::CannotOpenContainer)?;

    let xml = match archive.by_name(DOCUMENT_PART) {
        Ok(entry) => read_bounded(entry, options.max_document_bytes)?,
        Err(_) => return Err(no_text()),
    };

    if xml.trim().is_empty() {
        return Err(no_text());
    }

    let text = collect_text_runs(&xml, options)?;
    let text = text.trim();
    if text.is_empty() {
        return Err(no_text());
    }

    Ok(text.to_string())
}

/// Walks every `w:t` element in document order and concatenates its content.
/// Inflates at most `limit` bytes; the declared size in the archive is not trusted.
fn read_bounded(entry: impl Read, limit: u64) -> Result<String, ExtractError> {
    let mut content = Vec::new();
    entry
        .take(limit.saturating_add(1))
        .read_to_end(&mut content)
        .map_err(|e| ExtractError::InvalidDocument(e.to_string()))?;

    if content.len() as u64 > limit {
        return Err(ExtractError::InvalidDocument(format!(
            "document part exceeds {} bytes",
            limit
        )));
    }

    String::from_utf8(content).map_err(|e| ExtractError::InvalidDocument(e.to_string()))
}

fn collect_text_runs(xml: &str, options: ExtractOptions) -> Result<String, ExtractError> {
    let mut reader = NsReader::from_str(xml);
    let mut output = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_resolved_event() {
            Ok((ns, Event::Start(e))) if is_wordml(&ns) => match e.local_name().as_ref() {
                b"t" => in_text_run = true,
                b"p" if options.paragraph_breaks => {
                    if !output.is_empty() && !output.ends_with("\n\n") {
                        output.push_str("\n\n");
                    }
                }
                _ => {}
            },
            Ok((ns, Event::End(e))) if is_wordml(&ns) => {
                if e.local_name().as_ref() == b"t" {
                    in_text_run = false;
                }
            }
            Ok((_, Event::Text(e))) if in_text_run => {
                let value = e
                    .unescape()
                    .map_err(|err| ExtractError::InvalidDocument(err.to_string()))?;
                output.push_str(&value);
            }
            Ok((_, Event::CData(e))) if in_text_run => {
                output.push_str(&String::from_utf8_lossy(&e));
            }
            Ok((_, Event::Eof)) => break,
            Err(err) => return Err(ExtractError::InvalidDocument(err.to_string())),
            _ => {}
        }
    }

    Ok(output)
}

fn is_wordml(ns: &ResolveResult) -> bool {
    matches!(ns, ResolveResult::Bound(Namespace(uri)) if *uri == WORDML_NS)
}
