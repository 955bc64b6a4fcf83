use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::services::face_swap::FaceSwapConfig;
use crate::services::video::VideoConfig;

const CONFIG_FILE: &str = "config.yml";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_face_folder")]
    pub face_folder: String,

    #[serde(default = "default_frame_folder")]
    pub frame_folder: String,

    #[serde(default = "default_temp_folder")]
    pub temp_folder: String,

    #[serde(default = "default_output")]
    pub output_folder: String,

    #[serde(default = "default_prompts_file")]
    pub prompts_file: String,

    #[serde(default)]
    pub selection: SelectionConfig,

    #[serde(default)]
    pub face_swap: FaceSwapConfig,

    #[serde(default)]
    pub video: VideoConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SelectionConfig {
    /// Appended to the typed choice to form the face file name.
    #[serde(default = "default_face_suffix")]
    pub suffix: String,

    /// Preset choice for unattended runs.
    #[serde(default)]
    pub face_choice: Option<String>,

    /// `None` keeps asking until a valid face is picked.
    #[serde(default)]
    pub max_attempts: Option<usize>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            suffix: default_face_suffix(),
            face_choice: None,
            max_attempts: None,
        }
    }
}

fn default_face_folder() -> String {
    "FACE_SOURCE".to_string()
}
fn default_frame_folder() -> String {
    "FRAME".to_string()
}
fn default_temp_folder() -> String {
    "TEMP_FRAMES".to_string()
}
fn default_output() -> String {
    "output".to_string()
}
fn default_prompts_file() -> String {
    "PROMPTS VEO.DOCX".to_string()
}
fn default_face_suffix() -> String {
    "rosto.png".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            face_folder: default_face_folder(),
            frame_folder: default_frame_folder(),
            temp_folder: default_temp_folder(),
            output_folder: default_output(),
            prompts_file: default_prompts_file(),
            selection: SelectionConfig::default(),
            face_swap: FaceSwapConfig::default(),
            video: VideoConfig::default(),
        }
    }
}

impl Config {
    /// Reads `config.yml` when present, then applies environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(Path::new(CONFIG_FILE))?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("{} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Environment values win over anything read from the file.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty("FACE_SWAP_PROVIDER") {
            self.face_swap.provider = v;
        }
        if let Some(v) = non_empty("SEAART_API_KEY") {
            self.face_swap.seaart.api_key = Some(v);
        }
        if let Some(v) = non_empty("SEAART_API_URL") {
            self.face_swap.seaart.endpoint = v;
        }
        if let Some(v) = non_empty("GOOGLE_PROJECT_ID") {
            self.video.veo.project_id = Some(v);
        }
        if let Some(v) = non_empty("GOOGLE_LOCATION") {
            self.video.veo.location = v;
        }
        if let Some(v) = non_empty("GOOGLE_ACCESS_TOKEN") {
            self.video.veo.access_token = Some(v);
        }
        if let Some(v) = non_empty("VEO_MODEL") {
            self.video.veo.model = v;
        }
    }

    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.output_folder)
            .with_context(|| format!("Failed to create {}", self.output_folder))?;
        fs::create_dir_all(&self.temp_folder)
            .with_context(|| format!("Failed to create {}", self.temp_folder))?;
        Ok(())
    }
}
