//! Editing session over one note document.
//!
//! # Responsibility
//! - Apply insert/delete operations and track the caret/selection.
//! - Queue change records until the session drains them.
//!
//! # Invariants
//! - Selection bounds never exceed the document end offset.
//! - `Silent` changes are applied but never queued.

use crate::model::note::{ChangeSource, NoteDocument, TextChange, TextFormat};

/// Caret (`length == 0`) or range selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    pub index: usize,
    pub length: usize,
}

impl Selection {
    pub fn caret(index: usize) -> Self {
        Self { index, length: 0 }
    }
}

/// Note document plus selection and a pending change queue.
#[derive(Debug, Clone, Default)]
pub struct NoteEditor {
    document: NoteDocument,
    selection: Selection,
    changes: Vec<TextChange>,
}

impl NoteEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(&self) -> &NoteDocument {
        &self.document
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Length including the terminal line break.
    pub fn length(&self) -> usize {
        self.document.len()
    }

    pub fn insert_text(
        &mut self,
        offset: usize,
        text: &str,
        format: TextFormat,
        source: ChangeSource,
    ) -> TextChange {
        let change = self.document.insert_text(offset, text, format, source);
        self.shift_selection_for_insert(change);
        self.record(change);
        change
    }

    pub fn insert_page_break(&mut self, offset: usize, source: ChangeSource) -> TextChange {
        let change = self.document.insert_page_break(offset, source);
        self.shift_selection_for_insert(change);
        self.record(change);
        change
    }

    pub fn delete_text(&mut self, offset: usize, len: usize, source: ChangeSource) -> TextChange {
        let change = self.document.delete(offset, len, source);
        let removed_end = change.offset + change.deleted;
        let index = if self.selection.index >= removed_end {
            self.selection.index - change.deleted
        } else {
            self.selection.index.min(change.offset)
        };
        self.selection = Selection::caret(index);
        self.record(change);
        change
    }

    /// Empties the document and puts the caret at the start.
    pub fn clear(&mut self, source: ChangeSource) -> TextChange {
        let change = self.document.clear(source);
        self.selection = Selection::default();
        self.record(change);
        change
    }

    /// Sets the selection, clamped to the document.
    pub fn set_selection(&mut self, index: usize, length: usize, _source: ChangeSource) {
        let end = self.document.end_offset();
        let index = index.min(end);
        let length = length.min(end - index);
        self.selection = Selection { index, length };
    }

    /// Drains queued changes in the order they were applied.
    pub fn take_changes(&mut self) -> Vec<TextChange> {
        std::mem::take(&mut self.changes)
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    fn shift_selection_for_insert(&mut self, change: TextChange) {
        if change.offset < self.selection.index {
            self.selection.index += change.inserted;
        } else if change.offset < self.selection.index + self.selection.length {
            self.selection.length += change.inserted;
        }
    }

    fn record(&mut self, change: TextChange) {
        if change.source != ChangeSource::Silent {
            self.changes.push(change);
        }
    }
}
