pub mod match_editor_service;
pub mod minio_service;
pub mod standings_service;

pub use match_editor_service::{EditorError, MatchEditorService};
pub use minio_service::MinIOService;
pub use standings_service::StandingsService;
