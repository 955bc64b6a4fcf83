pub mod face_swap;
pub mod prompts;
pub mod setup;
pub mod video;
pub mod workflow;
