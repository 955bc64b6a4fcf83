use crate::core::config::SelectionConfig;
use crate::core::io::Storage;
use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

/// Case-sensitive suffixes a face image may have.
pub const FACE_EXTENSIONS: [&str; 2] = [".png", ".jpg"];

/// Source of typed face choices.
pub trait ChoiceInput: Send {
    fn ask(&mut self, prompt: &str) -> Result<String>;
}

/// Interactive terminal prompt.
pub struct ConsoleInput;

impl ChoiceInput for ConsoleInput {
    fn ask(&mut self, prompt: &str) -> Result<String> {
        Ok(inquire::Text::new(prompt).prompt()?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt {
    Accepted(PathBuf),
    Rejected(String),
}

/// Sorted face image names in `dir`. A missing directory counts as empty.
pub async fn list_faces(storage: &dyn Storage, dir: &str) -> Vec<String> {
    let names = match storage.list(dir).await {
        Ok(names) => names,
        Err(e) => {
            log::debug!("Cannot list {}: {:#}", dir, e);
            Vec::new()
        }
    };
    let mut faces: Vec<String> = names
        .into_iter()
        .filter(|n| FACE_EXTENSIONS.iter().any(|ext| n.ends_with(ext)))
        .collect();
    faces.sort();
    faces
}

/// The typed text is used as-is: `choice + suffix` must name an existing file.
pub async fn resolve_choice(
    storage: &dyn Storage,
    dir: &str,
    suffix: &str,
    choice: &str,
) -> Result<Attempt> {
    let candidate = format!("{}{}", choice, suffix);
    let full_path = Path::new(dir).join(&candidate);
    if storage.exists(&full_path.to_string_lossy()).await? {
        Ok(Attempt::Accepted(full_path))
    } else {
        Ok(Attempt::Rejected(candidate))
    }
}

/// Lists the available faces and asks until a choice resolves to a file.
///
/// Fails before prompting when the folder holds no face image. With
/// `max_attempts` set, fails after that many rejected choices.
pub async fn select_face(
    config: &SelectionConfig,
    face_folder: &str,
    storage: &dyn Storage,
    input: &mut dyn ChoiceInput,
) -> Result<PathBuf> {
    println!("\n--- FACE SELECTION ---");
    let faces = list_faces(storage, face_folder).await;

    if faces.is_empty() {
        println!("[ERRO] No faces found in {}!", face_folder);
        bail!("No face images found in {}", face_folder);
    }

    for face in &faces {
        println!("Found option: {}", face);
    }

    if let Some(preset) = &config.face_choice {
        match resolve_choice(storage, face_folder, &config.suffix, preset).await? {
            Attempt::Accepted(path) => {
                println!("[OK] Face selected: {}", display_name(&path));
                return Ok(path);
            }
            Attempt::Rejected(candidate) => {
                println!(
                    "[ERRO] Preset face {} does not exist. Asking instead.",
                    candidate
                );
            }
        }
    }

    let mut rejected = 0usize;
    loop {
        if let Some(max) = config.max_attempts {
            if rejected >= max {
                bail!("No valid face selected after {} attempts", max);
            }
        }

        let choice = input.ask("Enter the number of the desired face:")?;
        match resolve_choice(storage, face_folder, &config.suffix, &choice).await? {
            Attempt::Accepted(path) => {
                println!("[OK] Face selected: {}", display_name(&path));
                return Ok(path);
            }
            Attempt::Rejected(candidate) => {
                println!("[ERRO] File {} does not exist. Try again.", candidate);
                rejected += 1;
            }
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}
