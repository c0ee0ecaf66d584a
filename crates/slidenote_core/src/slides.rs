//! Slide index table and per-slide note sections.
//!
//! # Responsibility
//! - Partition the note document into one labeled section per deck page.
//! - Remember where each section's editable line starts.
//!
//! # Invariants
//! - After `initialize_sections(n)`, the table has exactly `n` entries.
//! - Entries are strictly increasing; sections are appended in page order.
//! - Re-initialization discards all prior content and entries.
//! - Offsets are recorded once and never re-synchronized after edits.

use crate::model::editor::NoteEditor;
use crate::model::note::{ChangeSource, TextFormat};
use log::info;

/// Ordered editable offsets, one per deck page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlideIndexTable {
    offsets: Vec<usize>,
}

impl SlideIndexTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Offset for a 1-based page number.
    pub fn offset_for_page(&self, page: u32) -> Option<usize> {
        let index = usize::try_from(page).ok()?.checked_sub(1)?;
        self.offsets.get(index).copied()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.offsets
    }

    pub fn is_strictly_increasing(&self) -> bool {
        self.offsets.windows(2).all(|pair| pair[0] < pair[1])
    }
}

/// Header text for a 1-based slide number.
pub fn slide_header(slide: u32) -> String {
    format!("Slide {slide}")
}

/// Clears the note document and rebuilds one section per slide.
///
/// Each section is a bold `Slide {i}` header line, the tracked editable
/// position, a page-break marker and a plain line break.
pub fn initialize_sections(editor: &mut NoteEditor, num_slides: u32) -> SlideIndexTable {
    editor.clear(ChangeSource::Api);
    let mut offsets = Vec::with_capacity(num_slides as usize);

    for slide in 1..=num_slides {
        let end = editor.document().end_offset();
        editor.insert_text(
            end,
            &format!("{}\n", slide_header(slide)),
            TextFormat::BOLD,
            ChangeSource::Api,
        );
        offsets.push(editor.document().end_offset());
        let end = editor.document().end_offset();
        editor.insert_page_break(end, ChangeSource::Api);
        let end = editor.document().end_offset();
        editor.insert_text(end, "\n", TextFormat::PLAIN, ChangeSource::Api);
    }

    info!(
        "event=notes_init module=slides status=ok slides={} doc_len={}",
        num_slides,
        editor.length()
    );
    SlideIndexTable { offsets }
}

#[cfg(test)]
mod tests {
    use super::{initialize_sections, slide_header, SlideIndexTable};
    use crate::model::editor::NoteEditor;

    #[test]
    fn zero_slides_leave_a_blank_document() {
        let mut editor = NoteEditor::new();
        let table = initialize_sections(&mut editor, 0);
        assert!(table.is_empty());
        assert!(editor.document().is_blank());
    }

    #[test]
    fn offsets_for_single_digit_slides_are_ten_apart() {
        let mut editor = NoteEditor::new();
        let table = initialize_sections(&mut editor, 3);
        assert_eq!(table.as_slice(), &[8, 18, 28]);
        assert_eq!(editor.document().page_break_count(), 3);
    }

    #[test]
    fn page_lookup_is_one_based() {
        let mut editor = NoteEditor::new();
        let table = initialize_sections(&mut editor, 2);
        assert_eq!(table.offset_for_page(0), None);
        assert_eq!(table.offset_for_page(1), Some(8));
        assert_eq!(table.offset_for_page(3), None);
        assert_eq!(SlideIndexTable::new().offset_for_page(1), None);
    }

    #[test]
    fn header_text_matches_slide_number() {
        assert_eq!(slide_header(12), "Slide 12");
    }
}
