//! Input handling: reading uploads and extracting their text

pub mod manager;
pub mod text_extractor;

pub use manager::{validate_job_description, validate_upload, InputManager};
