//! Text extraction per media kind.
//!
//! | kind  | method                                   |
//! |-------|------------------------------------------|
//! | image | none (vision providers read the pixels)  |
//! | pdf   | `pdf-extract` text layer, then flattened |
//! | docx  | `word/document.xml` runs via `quick-xml` |
//! | text  | read as UTF-8 (lossy)                    |
//! | json  | read as UTF-8 (lossy)                    |
//!
//! PDF and DOCX parsing are CPU-bound and synchronous, so they run inside
//! `spawn_blocking` to keep the async workers free.

use crate::error::TranslateError;
use crate::pipeline::input::MediaKind;
use crate::pipeline::normalize::clean_extracted_text;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Extract the raw text of the file at `path`.
///
/// Images yield an empty string. Parse failures surface as
/// [`TranslateError::ExtractionFailed`].
pub async fn extract_text(path: &Path, kind: MediaKind) -> Result<String, TranslateError> {
    let text = match kind {
        MediaKind::Image => {
            debug!("Image input: skipping text extraction");
            return Ok(String::new());
        }
        MediaKind::Pdf => {
            let owned = path.to_path_buf();
            let raw = run_blocking(path, move || extract_pdf(&owned)).await?;
            clean_extracted_text(&raw)
        }
        MediaKind::Docx => {
            let owned = path.to_path_buf();
            run_blocking(path, move || extract_docx(&owned)).await?
        }
        MediaKind::Text | MediaKind::Json => {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|e| failed(path, e.to_string()))?;
            String::from_utf8_lossy(&bytes).into_owned()
        }
    };

    info!("Extracted {} chars from {} input", text.chars().count(), kind);
    Ok(text)
}

async fn run_blocking<F>(path: &Path, f: F) -> Result<String, TranslateError>
where
    F: FnOnce() -> Result<String, String> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| TranslateError::Internal(format!("Extraction task panicked: {e}")))?
        .map_err(|detail| failed(path, detail))
}

fn failed(path: &Path, detail: String) -> TranslateError {
    TranslateError::ExtractionFailed {
        path: PathBuf::from(path),
        detail,
    }
}

fn extract_pdf(path: &Path) -> Result<String, String> {
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    if !bytes.starts_with(b"%PDF") {
        return Err("not a PDF (missing %PDF header)".into());
    }
    pdf_extract::extract_text_from_mem(&bytes).map_err(|e| e.to_string())
}

fn extract_docx(path: &Path) -> Result<String, String> {
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| format!("not a DOCX archive: {e}"))?;
    let mut xml = Vec::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| format!("missing word/document.xml: {e}"))?
        .read_to_end(&mut xml)
        .map_err(|e| e.to_string())?;
    docx_xml_to_text(&xml)
}

/// Collect the text runs of a WordprocessingML body.
///
/// Paragraph ends become newlines, `<w:tab/>` a tab and `<w:br/>` a newline.
pub(crate) fn docx_xml_to_text(xml: &[u8]) -> Result<String, String> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut out = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text = true,
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => out.push('\t'),
                b"br" | b"cr" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let text = t.unescape().map_err(|e| e.to_string())?;
                out.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(format!("malformed document.xml: {e}")),
        }
        buf.clear();
    }

    Ok(out.trim_end().to_string())
}
