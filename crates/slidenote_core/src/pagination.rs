//! Automatic page-break insertion.
//!
//! # Responsibility
//! - Watch user edits and insert a page-break marker once the measured note
//!   height overflows the page count implied by existing markers.
//!
//! # Invariants
//! - Only `ChangeSource::User` changes are considered; the engine's own
//!   insertion is tagged `Api` and can never re-trigger it.
//! - At most one marker is inserted per observed change.
//! - An unmeasurable surface is a no-op for that change.

use crate::config::A4_PAGE_HEIGHT_PX;
use crate::layout::NoteLayout;
use crate::model::editor::NoteEditor;
use crate::model::note::{ChangeSource, TextChange};
use log::{debug, info};

/// Why a change did not lead to a page-break check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    ProgrammaticChange,
    Unmeasurable,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaginationOutcome {
    Skipped(SkipReason),
    /// Content still fits within the expected pages.
    WithinPages { height: f64, expected_pages: usize },
    /// One marker was inserted at `offset`; `after_page` is the page it closes.
    Inserted { offset: usize, after_page: usize },
}

impl PaginationOutcome {
    pub fn inserted(&self) -> bool {
        matches!(self, Self::Inserted { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaginationEngine {
    page_height_px: f64,
}

impl Default for PaginationEngine {
    fn default() -> Self {
        Self::new(A4_PAGE_HEIGHT_PX)
    }
}

impl PaginationEngine {
    pub fn new(page_height_px: f64) -> Self {
        Self { page_height_px }
    }

    pub fn page_height_px(&self) -> f64 {
        self.page_height_px
    }

    /// Applies the overflow rule for one observed change.
    pub fn on_change<L: NoteLayout + ?Sized>(
        &self,
        editor: &mut NoteEditor,
        layout: &L,
        change: &TextChange,
    ) -> PaginationOutcome {
        if change.source != ChangeSource::User {
            return PaginationOutcome::Skipped(SkipReason::ProgrammaticChange);
        }

        let Some(height) = layout.content_height(editor.document()) else {
            debug!("event=page_break_insert module=pagination status=skip reason=unmeasurable");
            return PaginationOutcome::Skipped(SkipReason::Unmeasurable);
        };

        let expected_pages = editor.document().page_break_count() + 1;
        if height <= expected_pages as f64 * self.page_height_px {
            return PaginationOutcome::WithinPages {
                height,
                expected_pages,
            };
        }

        let offset = editor.document().end_offset();
        editor.insert_page_break(offset, ChangeSource::Api);
        editor.set_selection(offset + 1, 0, ChangeSource::Silent);
        info!(
            "event=page_break_insert module=pagination status=ok after_page={} offset={} height_px={:.0}",
            expected_pages, offset, height
        );
        PaginationOutcome::Inserted {
            offset,
            after_page: expected_pages,
        }
    }
}
