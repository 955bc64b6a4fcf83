use anyhow::{Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const DOCUMENT_PART: &str = "word/document.xml";

/// Reads the body paragraphs of a `.docx` file, in document order.
pub fn read_paragraphs(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("{} is not a valid .docx archive", path.display()))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .with_context(|| format!("{} has no {}", path.display(), DOCUMENT_PART))?
        .read_to_string(&mut xml)
        .context("Failed to read document.xml")?;

    paragraphs_from_xml(&xml)
}

/// Extracts paragraph text from WordprocessingML.
///
/// Only `w:p` elements directly under `w:body` count as paragraphs, so table
/// cells and text boxes are left out. Run-level `w:tab` becomes `\t`, and
/// `w:br`/`w:cr` become `\n`.
pub fn paragraphs_from_xml(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);

    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut paragraphs = Vec::new();
    let mut current: Option<String> = None;
    let mut nested = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event().context("Malformed document.xml")? {
            Event::Start(e) => {
                let name = e.local_name().as_ref().to_vec();
                match name.as_slice() {
                    b"p" if is_body_level(&stack) => current = Some(String::new()),
                    b"p" if current.is_some() => nested += 1,
                    b"t" if current.is_some() && nested == 0 && in_run(&stack) => in_text = true,
                    _ => {}
                }
                stack.push(name);
            }
            Event::Empty(e) => {
                let name = e.local_name();
                if name.as_ref() == b"p" {
                    if is_body_level(&stack) {
                        paragraphs.push(String::new());
                    }
                } else if nested == 0 && in_run(&stack) {
                    if let Some(text) = current.as_mut() {
                        match name.as_ref() {
                            b"tab" => text.push('\t'),
                            b"br" | b"cr" => text.push('\n'),
                            _ => {}
                        }
                    }
                }
            }
            Event::Text(e) if in_text => {
                if let Some(text) = current.as_mut() {
                    text.push_str(&e.unescape()?);
                }
            }
            Event::CData(e) if in_text => {
                if let Some(text) = current.as_mut() {
                    text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::End(e) => {
                stack.pop();
                match e.local_name().as_ref() {
                    b"t" => in_text = false,
                    b"p" if nested > 0 => nested -= 1,
                    b"p" if is_body_level(&stack) => {
                        if let Some(text) = current.take() {
                            paragraphs.push(text);
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

fn is_body_level(stack: &[Vec<u8>]) -> bool {
    stack.last().is_some_and(|n| n == b"body")
}

fn in_run(stack: &[Vec<u8>]) -> bool {
    stack.last().is_some_and(|n| n == b"r")
}

#[cfg(test)]
pub(crate) fn write_docx(path: &Path, paragraphs: &[&str]) -> Result<()> {
    use std::io::Write;

    let mut body = String::new();
    for p in paragraphs {
        if p.is_empty() {
            body.push_str("<w:p/>");
        } else {
            body.push_str(&format!(
                "<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>",
                escape(p)
            ));
        }
    }
    let xml = wrap_body(&body);

    let file = File::create(path)?;
    let mut zip = zip::ZipWriter::new(file);
    zip.start_file(DOCUMENT_PART, zip::write::SimpleFileOptions::default())?;
    zip.write_all(xml.as_bytes())?;
    zip.finish()?;
    Ok(())
}

#[cfg(test)]
fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
fn wrap_body(body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:body>{}<w:sectPr/></w:body></w:document>",
        body
    )
}
