use crate::core::state::PromptMap;
use crate::utils::docx;
use anyhow::Result;
use std::path::Path;

pub const HEADER_PREFIX: &str = "VEO PROMPT - ";

/// Loads the prompt map from a `.docx` document.
///
/// A missing file is not fatal: an error line is printed and the map is
/// empty, so every letter ends up skipped.
pub fn load_prompts(path: &Path) -> Result<PromptMap> {
    if !path.exists() {
        println!("[ERRO] Prompts file not found: {}", path.display());
        return Ok(PromptMap::new());
    }

    let paragraphs = docx::read_paragraphs(path)?;
    let prompts = parse_prompts(paragraphs.iter().map(String::as_str));

    let keys: Vec<&String> = prompts.keys().collect();
    println!("[INFO] Prompts loaded for letters: {:?}", keys);
    Ok(prompts)
}

/// Two-state scan: a header line arms a key, the next non-empty paragraph
/// becomes its prompt.
pub fn parse_prompts<'a, I>(paragraphs: I) -> PromptMap
where
    I: IntoIterator<Item = &'a str>,
{
    let mut prompts = PromptMap::new();
    let mut pending: Option<String> = None;

    for paragraph in paragraphs {
        let text = paragraph.trim();
        if let Some(letter) = header_letter(text) {
            // A header with nothing after the dash arms nothing.
            pending = Some(letter).filter(|l| !l.is_empty());
        } else if !text.is_empty() {
            if let Some(key) = pending.take() {
                prompts.insert(key, text.to_string());
            }
        }
    }

    prompts
}

fn header_letter(text: &str) -> Option<String> {
    if !text.to_uppercase().starts_with(HEADER_PREFIX) {
        return None;
    }
    let letter = text.rsplit('-').next().unwrap_or_default();
    Some(letter.trim().to_uppercase())
}
