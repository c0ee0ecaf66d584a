//! Page-click navigation into the note document.
//!
//! # Responsibility
//! - Resolve a clicked deck page to its tracked note offset.
//! - Open a fresh line there, place the caret on it and scroll it into view.
//!
//! # Invariants
//! - A click outside `1..=table.len()` changes nothing.
//! - A valid click inserts exactly one line break and leaves a caret (no
//!   range) just after it. Offsets past the document end clamp to the end,
//!   and the reported caret is always the editor's own.

use crate::layout::{NoteLayout, NoteViewport};
use crate::model::editor::NoteEditor;
use crate::model::note::{ChangeSource, TextFormat};
use crate::slides::SlideIndexTable;
use log::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NavigationOutcome {
    Moved {
        page: u32,
        caret: usize,
        /// New scroll offset; `None` when the caret could not be measured.
        scroll_top: Option<f64>,
    },
    /// Page is not covered by the current table (stale or out-of-range click).
    Ignored { page: u32, table_len: usize },
}

impl NavigationOutcome {
    pub fn moved(&self) -> bool {
        matches!(self, Self::Moved { .. })
    }
}

/// Moves the caret to the note section of `page` (1-based).
pub fn navigate_to_page<L: NoteLayout + ?Sized>(
    editor: &mut NoteEditor,
    table: &SlideIndexTable,
    layout: &L,
    viewport: &mut NoteViewport,
    page: u32,
) -> NavigationOutcome {
    let Some(target) = table.offset_for_page(page) else {
        warn!(
            "event=page_click module=navigation status=skip page={} table_len={}",
            page,
            table.len()
        );
        return NavigationOutcome::Ignored {
            page,
            table_len: table.len(),
        };
    };

    let change = editor.insert_text(target, "\n", TextFormat::PLAIN, ChangeSource::User);
    editor.set_selection(change.offset + change.inserted, 0, ChangeSource::User);
    let caret = editor.selection().index;

    let scroll_top = layout
        .caret_bounds(editor.document(), caret)
        .map(|bounds| bounds.top);
    if let Some(top) = scroll_top {
        viewport.scroll_top = top;
    }

    info!(
        "event=page_click module=navigation status=ok page={} target={} caret={}",
        page, target, caret
    );
    NavigationOutcome::Moved {
        page,
        caret,
        scroll_top,
    }
}
