pub mod draft_service;
pub mod level_service;

pub use draft_service::DraftService;
pub use level_service::{LevelService, PublishDraft};
