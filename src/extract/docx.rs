//! DOCX paragraph extraction.
//!
//! A DOCX file is a zip package; body text lives in `word/document.xml` as
//! `w:p` paragraphs made of `w:r` runs holding `w:t` text.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;

use super::ExtractionError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Largest decompressed `word/document.xml` we will read.
const MAX_DOCUMENT_PART_BYTES: u64 = 64 * 1024 * 1024;

/// Extract paragraph text in document order, one paragraph per line.
pub(crate) fn extract_docx_text(content: &[u8]) -> Result<String, ExtractionError> {
    let xml = read_document_part(content, MAX_DOCUMENT_PART_BYTES)?;
    Ok(paragraphs_from_xml(&xml)?.join("\n"))
}

/// Decompress the body part, refusing anything that inflates past `limit`.
fn read_document_part(content: &[u8], limit: u64) -> Result<String, ExtractionError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(content))
        .map_err(|e| ExtractionError::Malformed(format!("not a DOCX package: {}", e)))?;

    let entry = archive
        .by_name(DOCUMENT_PART)
        .map_err(|_| ExtractionError::Malformed(format!("missing {}", DOCUMENT_PART)))?;
    let too_large = || {
        ExtractionError::Malformed(format!(
            "{} expands past {} bytes",
            DOCUMENT_PART, limit
        ))
    };
    if entry.size() > limit {
        return Err(too_large());
    }

    // The header size can lie, so cap the read as well
    let mut xml = String::new();
    entry
        .take(limit + 1)
        .read_to_string(&mut xml)
        .map_err(|e| ExtractionError::Malformed(format!("unreadable {}: {}", DOCUMENT_PART, e)))?;
    if xml.len() as u64 > limit {
        return Err(too_large());
    }

    Ok(xml)
}

/// Collect the text of every `w:p` element.
fn paragraphs_from_xml(xml: &str) -> Result<Vec<String>, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    // Text boxes can nest paragraphs inside paragraphs
    let mut open: Vec<String> = Vec::new();
    let mut in_run = false;
    let mut in_text = false;

    loop {
        let event = reader.read_event().map_err(|e| {
            ExtractionError::Malformed(format!(
                "invalid {} at byte {}: {}",
                DOCUMENT_PART,
                reader.buffer_position(),
                e
            ))
        })?;

        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"p" => open.push(String::new()),
                b"r" => in_run = true,
                b"t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"p" => paragraphs.push(String::new()),
                b"tab" if in_run => push_text(&mut open, "\t"),
                b"br" | b"cr" if in_run => push_text(&mut open, "\n"),
                _ => {}
            },
            Event::Text(t) if in_text => {
                let text = t
                    .unescape()
                    .map_err(|e| ExtractionError::Malformed(format!("bad text run: {}", e)))?;
                push_text(&mut open, &text);
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"p" => {
                    if let Some(paragraph) = open.pop() {
                        paragraphs.push(paragraph);
                    }
                }
                b"r" => in_run = false,
                b"t" => in_text = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

fn push_text(open: &mut [String], text: &str) {
    if let Some(paragraph) = open.last_mut() {
        paragraph.push_str(text);
    }
}
