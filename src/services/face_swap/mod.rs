use crate::core::config::Config;
use crate::core::io::Storage;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub mod mock;
pub mod seaart;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FaceSwapConfig {
    /// "mock" or "seaart".
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_mock_delay_ms")]
    pub mock_delay_ms: u64,

    #[serde(default)]
    pub seaart: seaart::SeaArtConfig,
}

impl Default for FaceSwapConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            mock_delay_ms: default_mock_delay_ms(),
            seaart: seaart::SeaArtConfig::default(),
        }
    }
}

fn default_provider() -> String {
    "mock".to_string()
}
fn default_mock_delay_ms() -> u64 {
    1000
}

#[async_trait]
pub trait FaceSwapClient: Send + Sync {
    /// Puts `face` onto `frame` and returns the local path of the result.
    async fn swap(&self, frame: &Path, face: &Path, letter: char) -> Result<PathBuf>;
}

/// Where the composited image for `letter` is stored.
pub fn swapped_path(temp_folder: &str, letter: char) -> PathBuf {
    Path::new(temp_folder).join(format!("{}_swapped.png", letter))
}

pub fn create_face_swap_client(
    config: &Config,
    storage: Arc<dyn Storage>,
) -> Result<Box<dyn FaceSwapClient>> {
    info!("Initializing face swap client for provider: {}", config.face_swap.provider);
    match config.face_swap.provider.as_str() {
        "mock" => Ok(Box::new(mock::MockFaceSwapClient::new(
            &config.temp_folder,
            config.face_swap.mock_delay_ms,
            storage,
        ))),
        "seaart" => Ok(Box::new(seaart::SeaArtClient::new(
            &config.face_swap.seaart,
            &config.temp_folder,
            storage,
        )?)),
        _ => Err(anyhow!(
            "Unknown face swap provider: {}",
            config.face_swap.provider
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::NativeStorage;

    #[test]
    fn test_swapped_path_is_keyed_by_letter() {
        assert_eq!(
            swapped_path("TEMP_FRAMES", 'Q'),
            Path::new("TEMP_FRAMES").join("Q_swapped.png")
        );
    }

    #[test]
    fn test_factory_rejects_unknown_provider() {
        let mut config = Config::default();
        config.face_swap.provider = "deepfacelab".to_string();
        let storage = Arc::new(NativeStorage::new());
        assert!(create_face_swap_client(&config, storage).is_err());
    }

    #[test]
    fn test_factory_builds_known_providers() {
        let storage = Arc::new(NativeStorage::new());
        let mut config = Config::default();
        assert!(create_face_swap_client(&config, storage.clone()).is_ok());

        config.face_swap.provider = "seaart".to_string();
        assert!(create_face_swap_client(&config, storage).is_ok());
    }
}
