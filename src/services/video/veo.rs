use super::VideoClient;
use crate::core::io::Storage;
use crate::utils::media::{decode_base64_payload, encode_base64, image_mime_type};
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use url::Url;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VeoConfig {
    pub project_id: Option<String>,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub access_token: Option<String>,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    #[serde(default = "default_max_polls")]
    pub max_polls: usize,
    /// Replaces `https://<location>-aiplatform.googleapis.com`.
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl Default for VeoConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            location: default_location(),
            model: default_model(),
            access_token: None,
            poll_interval_seconds: default_poll_interval(),
            max_polls: default_max_polls(),
            endpoint: None,
        }
    }
}

fn default_location() -> String {
    "us-central1".to_string()
}
fn default_model() -> String {
    "veo-2.0-generate-001".to_string()
}
fn default_poll_interval() -> u64 {
    10
}
fn default_max_polls() -> usize {
    60
}

// --- Wire types ---

#[derive(Serialize)]
struct PredictRequest {
    instances: Vec<PredictInstance>,
    parameters: PredictParameters,
}

#[derive(Serialize)]
struct PredictInstance {
    prompt: String,
    image: InlineImage,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineImage {
    bytes_base64_encoded: String,
    mime_type: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters {
    sample_count: u32,
    enhance_prompt: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FetchOperationRequest<'a> {
    operation_name: &'a str,
}

#[derive(Deserialize)]
struct OperationHandle {
    name: String,
}

#[derive(Deserialize, Debug)]
struct Operation {
    #[serde(default)]
    done: bool,
    error: Option<OperationError>,
    response: Option<GenerateResponse>,
}

#[derive(Deserialize, Debug)]
struct OperationError {
    code: Option<i64>,
    message: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    videos: Vec<GeneratedVideo>,
    rai_media_filtered_count: Option<u32>,
    #[serde(default)]
    rai_media_filtered_reasons: Vec<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GeneratedVideo {
    bytes_base64_encoded: Option<String>,
    gcs_uri: Option<String>,
}

impl Operation {
    fn into_video_bytes(self) -> Result<Vec<u8>> {
        if let Some(err) = self.error {
            return Err(anyhow!(
                "Veo operation failed (code {}): {}",
                err.code.unwrap_or_default(),
                err.message
            ));
        }

        let response = self
            .response
            .context("Veo operation finished without a response")?;

        let Some(first) = response.videos.into_iter().next() else {
            let filtered = response.rai_media_filtered_count.unwrap_or(0);
            if filtered > 0 {
                bail!(
                    "Veo returned no video: {} filtered by safety ({})",
                    filtered,
                    response.rai_media_filtered_reasons.join("; ")
                );
            }
            bail!("Veo returned no video");
        };

        match (first.bytes_base64_encoded, first.gcs_uri) {
            (Some(payload), _) => decode_base64_payload(&payload),
            (None, Some(uri)) => Err(anyhow!(
                "Veo stored the video at {} instead of returning bytes",
                uri
            )),
            (None, None) => Err(anyhow!("Veo video entry carries no data")),
        }
    }
}

// --- Client ---

pub struct VeoClient {
    config: VeoConfig,
    storage: Arc<dyn Storage>,
    client: reqwest::Client,
}

impl VeoClient {
    pub fn new(config: VeoConfig, storage: Arc<dyn Storage>) -> Self {
        Self {
            config,
            storage,
            client: reqwest::Client::new(),
        }
    }

    fn model_url(&self, project_id: &str, method: &str) -> Result<Url> {
        let location = &self.config.location;
        let base = match &self.config.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{}-aiplatform.googleapis.com", location),
        };
        let url = format!(
            "{base}/v1/projects/{project_id}/locations/{location}/publishers/google/models/{model}:{method}",
            base = base,
            location = location,
            project_id = project_id,
            model = self.config.model,
            method = method,
        );
        Url::parse(&url).with_context(|| format!("Invalid Vertex AI URL: {}", url))
    }

    async fn post_json<B, R>(&self, url: Url, token: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let resp = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .context("Failed to reach Vertex AI")?;

        let status = resp.status();
        let response_text = resp.text().await?;
        if !status.is_success() {
            bail!("Vertex AI error ({}): {}", status, response_text);
        }

        serde_json::from_str(&response_text).map_err(|e| {
            anyhow!(
                "Failed to parse Vertex AI response: {}. Body: {}",
                e,
                response_text
            )
        })
    }

    async fn wait_for(&self, project_id: &str, token: &str, operation: &str) -> Result<Vec<u8>> {
        let url = self.model_url(project_id, "fetchPredictOperation")?;
        let request = FetchOperationRequest {
            operation_name: operation,
        };
        let interval = Duration::from_secs(self.config.poll_interval_seconds);

        for attempt in 1..=self.config.max_polls {
            sleep(interval).await;
            let op: Operation = self.post_json(url.clone(), token, &request).await?;
            debug!("Poll {} for {}: done={}", attempt, operation, op.done);
            if op.done {
                return op.into_video_bytes();
            }
        }

        Err(anyhow!(
            "Veo operation {} still running after {} polls",
            operation,
            self.config.max_polls
        ))
    }
}

#[async_trait]
impl VideoClient for VeoClient {
    async fn generate(&self, image: &Path, prompt: &str) -> Result<Vec<u8>> {
        let project_id = self
            .config
            .project_id
            .as_deref()
            .context("GOOGLE_PROJECT_ID is not set")?;
        let token = self
            .config
            .access_token
            .as_deref()
            .context("GOOGLE_ACCESS_TOKEN is not set")?;

        let image_bytes = self.storage.read(&image.to_string_lossy()).await?;
        let request = PredictRequest {
            instances: vec![PredictInstance {
                prompt: prompt.to_string(),
                image: InlineImage {
                    bytes_base64_encoded: encode_base64(&image_bytes),
                    mime_type: image_mime_type(image, &image_bytes).to_string(),
                },
            }],
            parameters: PredictParameters {
                sample_count: 1,
                enhance_prompt: false,
            },
        };

        let url = self.model_url(project_id, "predictLongRunning")?;
        let handle: OperationHandle = self.post_json(url, token, &request).await?;
        debug!("Veo operation started: {}", handle.name);

        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("   {spinner:.green} {msg} [{elapsed_precise}]")?);
        pb.set_message("Waiting for Veo...");
        pb.enable_steady_tick(Duration::from_millis(120));

        let result = self.wait_for(project_id, token, &handle.name).await;
        pb.finish_and_clear();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::NativeStorage;
    use crate::utils::test_http::TestServer;

    const SUBMITTED: &[u8] = br#"{"name": "projects/p/operations/op-1"}"#;
    const PENDING: &[u8] = br#"{"name": "projects/p/operations/op-1", "done": false}"#;
    const DONE: &[u8] =
        br#"{"name": "projects/p/operations/op-1", "done": true, "response": {"videos": [{"bytesBase64Encoded": "bXA0"}]}}"#;

    fn client(config: VeoConfig) -> VeoClient {
        VeoClient::new(config, Arc::new(NativeStorage::new()))
    }

    fn served_client(server: &TestServer, max_polls: usize) -> VeoClient {
        client(VeoConfig {
            project_id: Some("p".to_string()),
            access_token: Some("tok".to_string()),
            poll_interval_seconds: 0,
            max_polls,
            endpoint: Some(server.url.clone()),
            ..Default::default()
        })
    }

    fn swapped_frame(dir: &tempfile::TempDir) -> Result<std::path::PathBuf> {
        let path = dir.path().join("A_swapped.png");
        std::fs::write(&path, b"RIFF\x24\0\0\0WEBPVP8 ")?;
        Ok(path)
    }

    #[test]
    fn test_model_url() -> Result<()> {
        let veo = client(VeoConfig::default());
        let url = veo.model_url("my-project", "predictLongRunning")?;
        assert_eq!(
            url.as_str(),
            "https://us-central1-aiplatform.googleapis.com/v1/projects/my-project/locations/us-central1/publishers/google/models/veo-2.0-generate-001:predictLongRunning"
        );
        Ok(())
    }

    #[test]
    fn test_request_serialization() {
        let request = PredictRequest {
            instances: vec![PredictInstance {
                prompt: "Fly over mountains".to_string(),
                image: InlineImage {
                    bytes_base64_encoded: "aGk=".to_string(),
                    mime_type: "image/png".to_string(),
                },
            }],
            parameters: PredictParameters {
                sample_count: 1,
                enhance_prompt: false,
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["instances"][0]["prompt"], "Fly over mountains");
        assert_eq!(value["instances"][0]["image"]["bytesBase64Encoded"], "aGk=");
        assert_eq!(value["instances"][0]["image"]["mimeType"], "image/png");
        assert_eq!(value["parameters"]["sampleCount"], 1);
        assert_eq!(value["parameters"]["enhancePrompt"], false);
    }

    #[test]
    fn test_pending_operation() {
        let json = r#"{"name": "projects/p/locations/l/publishers/google/models/m/operations/123"}"#;
        let op: Operation = serde_json::from_str(json).unwrap();
        assert!(!op.done);
    }

    #[test]
    fn test_done_operation_with_video_bytes() {
        let json = r#"{
            "name": "op",
            "done": true,
            "response": {
                "@type": "type.googleapis.com/cloud.ai.large_models.vision.GenerateVideoResponse",
                "raiMediaFilteredCount": 0,
                "videos": [
                    { "bytesBase64Encoded": "bXA0", "mimeType": "video/mp4" },
                    { "bytesBase64Encoded": "c2Vjb25k", "mimeType": "video/mp4" }
                ]
            }
        }"#;
        let op: Operation = serde_json::from_str(json).unwrap();
        assert!(op.done);
        assert_eq!(op.into_video_bytes().unwrap(), b"mp4");
    }

    #[test]
    fn test_done_operation_with_error() {
        let json = r#"{"done": true, "error": {"code": 3, "message": "Invalid image"}}"#;
        let op: Operation = serde_json::from_str(json).unwrap();
        let err = op.into_video_bytes().unwrap_err();
        assert!(err.to_string().contains("Invalid image"));
    }

    #[test]
    fn test_filtered_video_reports_reason() {
        let json = r#"{
            "done": true,
            "response": {
                "raiMediaFilteredCount": 1,
                "raiMediaFilteredReasons": ["Unsafe content"]
            }
        }"#;
        let op: Operation = serde_json::from_str(json).unwrap();
        let err = op.into_video_bytes().unwrap_err();
        assert!(err.to_string().contains("Unsafe content"));
    }

    #[test]
    fn test_gcs_only_video_is_an_error() {
        let json = r#"{"done": true, "response": {"videos": [{"gcsUri": "gs://bucket/v.mp4"}]}}"#;
        let op: Operation = serde_json::from_str(json).unwrap();
        let err = op.into_video_bytes().unwrap_err();
        assert!(err.to_string().contains("gs://bucket/v.mp4"));
    }

    #[test]
    fn test_endpoint_override() -> Result<()> {
        let veo = client(VeoConfig {
            endpoint: Some("http://127.0.0.1:9000/".to_string()),
            ..Default::default()
        });
        let url = veo.model_url("p", "fetchPredictOperation")?;
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:9000/v1/projects/p/locations/us-central1/publishers/google/models/veo-2.0-generate-001:fetchPredictOperation"
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_generate_polls_until_done() -> Result<()> {
        let server = TestServer::start(vec![
            (200, SUBMITTED.to_vec()),
            (200, PENDING.to_vec()),
            (200, DONE.to_vec()),
        ])
        .await;
        let dir = tempfile::tempdir()?;
        let image = swapped_frame(&dir)?;

        let bytes = served_client(&server, 5).generate(&image, "Fly over mountains").await?;
        assert_eq!(bytes, b"mp4");

        let requests = server.requests();
        assert_eq!(requests.len(), 3);

        let submit = &requests[0];
        assert_eq!(submit.method, "POST");
        assert!(submit.path.ends_with("/models/veo-2.0-generate-001:predictLongRunning"));
        assert_eq!(submit.header("authorization"), Some("Bearer tok"));
        let body = submit.json();
        assert_eq!(body["instances"][0]["prompt"], "Fly over mountains");
        assert_eq!(body["instances"][0]["image"]["mimeType"], "image/webp");

        for poll in &requests[1..] {
            assert!(poll.path.ends_with(":fetchPredictOperation"));
            assert_eq!(poll.json()["operationName"], "projects/p/operations/op-1");
            assert_eq!(poll.header("authorization"), Some("Bearer tok"));
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_generate_gives_up_after_max_polls() -> Result<()> {
        let server = TestServer::start(vec![
            (200, SUBMITTED.to_vec()),
            (200, PENDING.to_vec()),
            (200, PENDING.to_vec()),
        ])
        .await;
        let dir = tempfile::tempdir()?;
        let image = swapped_frame(&dir)?;

        let err = served_client(&server, 2)
            .generate(&image, "prompt")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("still running after 2 polls"));
        assert_eq!(server.requests().len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_submit_error_status_is_reported() -> Result<()> {
        let server =
            TestServer::start(vec![(429, br#"{"error": "quota exhausted"}"#.to_vec())]).await;
        let dir = tempfile::tempdir()?;
        let image = swapped_frame(&dir)?;

        let err = served_client(&server, 5)
            .generate(&image, "prompt")
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("429"));
        assert!(message.contains("quota exhausted"));
        assert_eq!(server.requests().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_poll_error_status_is_reported() -> Result<()> {
        let server = TestServer::start(vec![
            (200, SUBMITTED.to_vec()),
            (503, b"backend unavailable".to_vec()),
        ])
        .await;
        let dir = tempfile::tempdir()?;
        let image = swapped_frame(&dir)?;

        let err = served_client(&server, 5)
            .generate(&image, "prompt")
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("503"));
        assert!(message.contains("backend unavailable"));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_without_request() {
        let veo = client(VeoConfig::default());
        let err = veo
            .generate(Path::new("A_swapped.png"), "prompt")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("GOOGLE_PROJECT_ID"));

        let veo = client(VeoConfig {
            project_id: Some("p".to_string()),
            ..Default::default()
        });
        let err = veo
            .generate(Path::new("A_swapped.png"), "prompt")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("GOOGLE_ACCESS_TOKEN"));
    }
}
