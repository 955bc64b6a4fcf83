use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use veo3_automation::core::config::Config;
use veo3_automation::core::io::{NativeStorage, Storage};
use veo3_automation::services::face_swap::create_face_swap_client;
use veo3_automation::services::prompts::load_prompts;
use veo3_automation::services::setup::{self, ConsoleInput};
use veo3_automation::services::video::create_video_client;
use veo3_automation::services::workflow::WorkflowManager;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    dotenvy::dotenv().ok();

    let config = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {:#}", e);
            return Err(e);
        }
    };

    // 1. Folders
    config.ensure_directories()?;
    println!("=== STARTING VEO3 AUTOMATION (MULTI-FACE & WEBP) ===");

    let storage: Arc<dyn Storage> = Arc::new(NativeStorage::new());

    // 2. Face
    let face = setup::select_face(
        &config.selection,
        &config.face_folder,
        storage.as_ref(),
        &mut ConsoleInput,
    )
    .await?;

    // 3. Prompts
    let prompts = load_prompts(Path::new(&config.prompts_file))?;

    // 4. Clients
    let face_swap = create_face_swap_client(&config, storage.clone())?;
    let video = create_video_client(&config, storage.clone())?;

    // 5. A-Z
    let manager = WorkflowManager::new(config, face_swap, video, storage);
    manager.run(&face, &prompts).await?;

    Ok(())
}
