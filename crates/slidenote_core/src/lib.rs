//! Core logic for the SlideNote companion.
//! Holds the note document, slide/note synchronization, pagination and the
//! deck rendering and PDF export seams used by the desktop shell.

pub mod config;
pub mod export;
pub mod layout;
pub mod logging;
pub mod model;
pub mod navigation;
pub mod pagination;
pub mod render;
pub mod session;
pub mod slides;

pub use config::{ConfigError, SessionConfig};
pub use export::{
    ExportBridge, ExportError, ExportOutcome, ExportReply, ExportRequest, NoWindow,
    PresetSaveDialog, PrintOptions, SaveDialog, WindowSource, EXPORT_REQUEST_CHANNEL,
    EXPORT_RESPONSE_CHANNEL,
};
pub use layout::{LineLayout, NoteLayout, NoteViewport};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::editor::{NoteEditor, Selection};
pub use model::note::{ChangeSource, NoteBlock, NoteDocument, NoteUnit, TextChange, TextFormat};
pub use navigation::NavigationOutcome;
pub use pagination::{PaginationEngine, PaginationOutcome};
pub use render::{Deck, DocumentRenderer, LopdfRenderer, PageSurface, RenderError};
pub use session::{LoadReport, NoteSession, RenderApplied};
pub use slides::SlideIndexTable;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
