use super::{swapped_path, FaceSwapClient};
use crate::core::io::Storage;
use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::time::{sleep, Duration};

/// Stand-in provider: copies the frame unchanged and waits a moment to
/// mimic the remote round trip.
pub struct MockFaceSwapClient {
    temp_folder: String,
    delay: Duration,
    storage: Arc<dyn Storage>,
}

impl MockFaceSwapClient {
    pub fn new(temp_folder: &str, delay_ms: u64, storage: Arc<dyn Storage>) -> Self {
        Self {
            temp_folder: temp_folder.to_string(),
            delay: Duration::from_millis(delay_ms),
            storage,
        }
    }
}

#[async_trait]
impl FaceSwapClient for MockFaceSwapClient {
    async fn swap(&self, frame: &Path, _face: &Path, letter: char) -> Result<PathBuf> {
        let output = swapped_path(&self.temp_folder, letter);
        debug!("Mock face swap: copying {:?} to {:?}", frame, output);

        let bytes = self.storage.read(&frame.to_string_lossy()).await?;
        self.storage.write(&output.to_string_lossy(), &bytes).await?;
        sleep(self.delay).await;

        Ok(output)
    }
}
