use super::{swapped_path, FaceSwapClient};
use crate::core::io::Storage;
use crate::utils::media::{decode_base64_payload, image_mime_type, to_data_uri};
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SeaArtConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

impl Default for SeaArtConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_endpoint(),
        }
    }
}

fn default_endpoint() -> String {
    "https://api.seaart.ai/v1/tools/face-swap".to_string()
}

#[derive(Serialize)]
struct SwapRequest {
    source_image: String,
    target_image: String,
}

#[derive(Deserialize, Debug, Default)]
struct SwapResponse {
    output_url: Option<String>,
    output_image: Option<String>,
    message: Option<String>,
    data: Option<Box<SwapResponse>>,
}

#[derive(Debug, PartialEq)]
enum SwapResult {
    Url(String),
    Inline(String),
}

impl SwapResponse {
    fn into_result(self) -> Result<SwapResult> {
        self.resolve(None)
    }

    /// Looks through nested `data` wrappers, keeping the nearest `message`
    /// for the error.
    fn resolve(self, outer_message: Option<String>) -> Result<SwapResult> {
        let message = self.message.filter(|m| !m.is_empty()).or(outer_message);
        if let Some(url) = self.output_url.filter(|u| !u.is_empty()) {
            return Ok(SwapResult::Url(url));
        }
        if let Some(image) = self.output_image.filter(|i| !i.is_empty()) {
            return Ok(SwapResult::Inline(image));
        }
        if let Some(data) = self.data {
            return data.resolve(message);
        }
        Err(anyhow!(
            "Face swap response has no result: {}",
            message.as_deref().unwrap_or("no message")
        ))
    }
}

pub struct SeaArtClient {
    api_key: Option<String>,
    endpoint: Url,
    temp_folder: String,
    storage: Arc<dyn Storage>,
    client: reqwest::Client,
}

impl SeaArtClient {
    pub fn new(config: &SeaArtConfig, temp_folder: &str, storage: Arc<dyn Storage>) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint)
            .with_context(|| format!("Invalid face swap endpoint: {}", config.endpoint))?;
        Ok(Self {
            api_key: config.api_key.clone(),
            endpoint,
            temp_folder: temp_folder.to_string(),
            storage,
            client: reqwest::Client::new(),
        })
    }

    async fn encode_image(&self, path: &Path) -> Result<String> {
        let bytes = self.storage.read(&path.to_string_lossy()).await?;
        Ok(to_data_uri(&bytes, image_mime_type(path, &bytes)))
    }

    async fn fetch_result(&self, result: SwapResult) -> Result<Vec<u8>> {
        match result {
            SwapResult::Inline(payload) => decode_base64_payload(&payload),
            SwapResult::Url(location) => {
                // Relative locations resolve against the API host.
                let url = self
                    .endpoint
                    .join(&location)
                    .with_context(|| format!("Invalid output_url: {}", location))?;
                debug!("Downloading swapped image from {}", url);
                let bytes = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .context("Failed to download swapped image")?
                    .error_for_status()?
                    .bytes()
                    .await?;
                Ok(bytes.to_vec())
            }
        }
    }
}

#[async_trait]
impl FaceSwapClient for SeaArtClient {
    async fn swap(&self, frame: &Path, face: &Path, letter: char) -> Result<PathBuf> {
        let api_key = self
            .api_key
            .as_deref()
            .context("SEAART_API_KEY is not set")?;

        let request_body = SwapRequest {
            source_image: self.encode_image(face).await?,
            target_image: self.encode_image(frame).await?,
        };

        let resp = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(api_key)
            .json(&request_body)
            .send()
            .await
            .context("Failed to reach face swap service")?;

        let status = resp.status();
        let response_text = resp.text().await?;
        if !status.is_success() {
            bail!("Face swap API error ({}): {}", status, response_text);
        }

        let parsed: SwapResponse = serde_json::from_str(&response_text).map_err(|e| {
            anyhow!(
                "Failed to parse face swap response: {}. Body: {}",
                e,
                response_text
            )
        })?;

        let bytes = self.fetch_result(parsed.into_result()?).await?;
        let output = swapped_path(&self.temp_folder, letter);
        self.storage.write(&output.to_string_lossy(), &bytes).await?;
        Ok(output)
    }
}
