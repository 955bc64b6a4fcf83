use crate::core::config::Config;
use crate::core::io::Storage;
use crate::core::state::{LetterOutcome, PromptMap, RunReport, VideoOutcome, ALPHABET};
use crate::services::face_swap::FaceSwapClient;
use crate::services::video::{self, VideoClient};
use anyhow::Result;
use log::debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct WorkflowManager {
    config: Config,
    face_swap: Box<dyn FaceSwapClient>,
    video: Box<dyn VideoClient>,
    storage: Arc<dyn Storage>,
}

impl WorkflowManager {
    pub fn new(
        config: Config,
        face_swap: Box<dyn FaceSwapClient>,
        video: Box<dyn VideoClient>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        Self {
            config,
            face_swap,
            video,
            storage,
        }
    }

    fn frame_path(&self, letter: char) -> PathBuf {
        Path::new(&self.config.frame_folder).join(format!("{}.webp", letter))
    }

    /// Walks A to Z once. Per-letter failures are recorded, never raised.
    pub async fn run(&self, face: &Path, prompts: &PromptMap) -> Result<RunReport> {
        let mut report = RunReport::default();

        for letter in ALPHABET {
            let outcome = self.process_letter(letter, face, prompts).await?;
            report.record(letter, outcome);
        }

        println!(
            "\n[INFO] Run complete: {} generated, {} already present, {} failed, {} skipped",
            report.generated(),
            report.already_present(),
            report.failed(),
            report.skipped()
        );
        Ok(report)
    }

    async fn process_letter(
        &self,
        letter: char,
        face: &Path,
        prompts: &PromptMap,
    ) -> Result<LetterOutcome> {
        let frame = self.frame_path(letter);
        if !self.storage.exists(&frame.to_string_lossy()).await? {
            debug!("No frame for {}, skipping", letter);
            return Ok(LetterOutcome::MissingFrame);
        }

        let Some(prompt) = prompts.get(&letter.to_string()) else {
            debug!("No prompt for {}, skipping", letter);
            return Ok(LetterOutcome::MissingPrompt);
        };

        println!("\n>>> Processing letter: {}", letter);
        println!("   [FaceSwap] Starting face swap for frame {}...", letter);

        let swapped = match self.face_swap.swap(&frame, face, letter).await {
            Ok(path) => path,
            Err(e) => {
                println!("   [ERRO FaceSwap] Processing failed: {:#}", e);
                println!("   [SKIP] Face swap failed for {}", letter);
                return Ok(LetterOutcome::SwapFailed(format!("{:#}", e)));
            }
        };

        // The video outcome is reported but does not change the flow.
        let outcome: VideoOutcome = video::render_letter(
            self.video.as_ref(),
            self.storage.as_ref(),
            &self.config.output_folder,
            &swapped,
            prompt,
            letter,
        )
        .await;

        Ok(LetterOutcome::Video(outcome))
    }
}
