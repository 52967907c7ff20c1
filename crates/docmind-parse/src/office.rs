//! DOCX and PPTX text: read the OOXML parts out of the zip container and
//! collect text runs paragraph by paragraph.

use std::io::{Cursor, Read};

use zip::ZipArchive;

use docmind_core::error::{Error, Result};

fn open(bytes: &[u8]) -> Result<ZipArchive<Cursor<&[u8]>>> {
    ZipArchive::new(Cursor::new(bytes)).map_err(|e| Error::Parse(format!("not a zip container: {e}")))
}

fn read_entry(archive: &mut ZipArchive<Cursor<&[u8]>>, name: &str) -> Result<String> {
    let mut entry = archive
        .by_name(name)
        .map_err(|e| Error::Parse(format!("missing {name}: {e}")))?;
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| Error::Parse(format!("unreadable {name}: {e}")))?;
    Ok(xml)
}

pub(crate) fn docx_text(bytes: &[u8]) -> Result<String> {
    let mut archive = open(bytes)?;
    let xml = read_entry(&mut archive, "word/document.xml")?;
    Ok(paragraph_text(&xml, "w:p", "w:t"))
}

pub(crate) fn pptx_text(bytes: &[u8]) -> Result<String> {
    let mut archive = open(bytes)?;
    let mut slides: Vec<(usize, String)> = archive
        .file_names()
        .filter_map(|name| {
            let number = name.strip_prefix("ppt/slides/slide")?.strip_suffix(".xml")?;
            Some((number.parse::<usize>().ok()?, name.to_string()))
        })
        .collect();
    slides.sort_by_key(|(number, _)| *number);

    let mut parts = Vec::with_capacity(slides.len());
    for (_, name) in &slides {
        let text = paragraph_text(&read_entry(&mut archive, name)?, "a:p", "a:t");
        if !text.is_empty() {
            parts.push(text);
        }
    }
    Ok(parts.join("\n\n"))
}

/// Concatenate `<text_tag>` contents per `<para_tag>` element, one line per
/// non-empty paragraph.
fn paragraph_text(xml: &str, para_tag: &str, text_tag: &str) -> String {
    let para_close = format!("</{para_tag}>");
    let text_close = format!("</{text_tag}>");
    let mut lines = Vec::new();
    let mut pos = 0;

    while let Some(start) = find_open_tag(xml, pos, para_tag) {
        let end = xml[start..].find(&para_close).map_or(xml.len(), |e| start + e + para_close.len());
        let paragraph = &xml[start..end];

        let mut line = String::new();
        let mut t_pos = 0;
        while let Some(t_start) = find_open_tag(paragraph, t_pos, text_tag) {
            let Some(tag_end) = paragraph[t_start..].find('>') else { break };
            let content_start = t_start + tag_end + 1;
            if paragraph[..content_start].ends_with("/>") {
                // self-closing, no text
                t_pos = content_start;
                continue;
            }
            let Some(len) = paragraph[content_start..].find(&text_close) else { break };
            line.push_str(&decode_entities(&paragraph[content_start..content_start + len]));
            t_pos = content_start + len + text_close.len();
        }

        if !line.is_empty() {
            lines.push(line);
        }
        pos = end;
    }
    lines.join("\n")
}

/// Position of the next `<tag>` or `<tag ...>`, skipping longer names such as
/// `<w:tab/>` when looking for `<w:t>`.
fn find_open_tag(xml: &str, from: usize, tag: &str) -> Option<usize> {
    let needle = format!("<{tag}");
    let mut pos = from;
    while let Some(found) = xml[pos..].find(&needle) {
        let start = pos + found;
        match xml[start + needle.len()..].chars().next() {
            Some('>' | ' ' | '/' | '\t' | '\n' | '\r') => return Some(start),
            Some(_) => pos = start + needle.len(),
            None => return None,
        }
    }
    None
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
