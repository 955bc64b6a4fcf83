use crate::core::config::Config;
use crate::core::io::Storage;
use crate::core::state::VideoOutcome;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub mod veo;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VideoConfig {
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default)]
    pub veo: veo::VeoConfig,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            veo: veo::VeoConfig::default(),
        }
    }
}

fn default_provider() -> String {
    "veo".to_string()
}

#[async_trait]
pub trait VideoClient: Send + Sync {
    /// Returns the bytes of the first generated video.
    async fn generate(&self, image: &Path, prompt: &str) -> Result<Vec<u8>>;
}

pub fn output_path(output_folder: &str, letter: char) -> PathBuf {
    Path::new(output_folder).join(format!("video_{}.mp4", letter))
}

/// Produces `video_<letter>.mp4` unless it is already on disk.
///
/// Errors never escape: they are printed and folded into
/// [`VideoOutcome::Failed`], leaving no output file behind. Bytes go to a
/// `.part` file first so an interrupted write is never taken for a finished
/// video on the next run.
pub async fn render_letter(
    client: &dyn VideoClient,
    storage: &dyn Storage,
    output_folder: &str,
    image: &Path,
    prompt: &str,
    letter: char,
) -> VideoOutcome {
    println!("   [VEO] Generating video for {}...", letter);
    let output = output_path(output_folder, letter);

    match storage.exists(&output.to_string_lossy()).await {
        Ok(true) => {
            println!("   [INFO] Video {} already exists. Skipping.", output.display());
            return VideoOutcome::AlreadyExists(output);
        }
        Ok(false) => {}
        Err(e) => {
            println!("   [ERRO VEO] Generation failed: {:#}", e);
            return VideoOutcome::Failed(format!("{:#}", e));
        }
    }

    match generate_and_save(client, storage, &output, image, prompt).await {
        Ok(()) => {
            println!("   [OK] Video saved: {}", output.display());
            VideoOutcome::Generated(output)
        }
        Err(e) => {
            println!("   [ERRO VEO] Generation failed: {:#}", e);
            VideoOutcome::Failed(format!("{:#}", e))
        }
    }
}

async fn generate_and_save(
    client: &dyn VideoClient,
    storage: &dyn Storage,
    output: &Path,
    image: &Path,
    prompt: &str,
) -> Result<()> {
    let bytes = client.generate(image, prompt).await?;
    let target = output.to_string_lossy();
    let partial = format!("{}.part", target);
    storage.write(&partial, &bytes).await?;
    storage.rename(&partial, &target).await
}

pub fn create_video_client(
    config: &Config,
    storage: Arc<dyn Storage>,
) -> Result<Box<dyn VideoClient>> {
    info!("Initializing video client for provider: {}", config.video.provider);
    match config.video.provider.as_str() {
        "veo" => Ok(Box::new(veo::VeoClient::new(config.video.veo.clone(), storage))),
        _ => Err(anyhow!("Unknown video provider: {}", config.video.provider)),
    }
}
