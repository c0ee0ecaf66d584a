//! Note document model.
//!
//! # Responsibility
//! - Hold the ordered rich-text units edited by the user and by programmatic
//!   insertions (slide headers, page breaks).
//! - Record every mutation as a `TextChange` tagged with its source.
//!
//! # Invariants
//! - The document always ends with a terminal line break; an empty document
//!   has length 1.
//! - Offsets count units. A page-break marker is exactly one unit and carries
//!   no text.
//! - The terminal line break is never deleted and nothing is inserted after it.

use serde::{Deserialize, Serialize};

const LINE_BREAK: char = '\n';

/// Inline formatting carried by one character unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextFormat {
    pub bold: bool,
}

impl TextFormat {
    pub const PLAIN: Self = Self { bold: false };
    pub const BOLD: Self = Self { bold: true };
}

/// One addressable unit of the note document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteUnit {
    Char { ch: char, format: TextFormat },
    /// Atomic, non-editable page boundary.
    PageBreak,
}

impl NoteUnit {
    pub fn is_page_break(&self) -> bool {
        matches!(self, Self::PageBreak)
    }

    pub fn is_line_break(&self) -> bool {
        matches!(self, Self::Char { ch: LINE_BREAK, .. })
    }
}

/// Origin of a document mutation.
///
/// Pagination reacts to `User` changes only, so programmatic insertions never
/// re-trigger it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeSource {
    /// Keystrokes, pastes and page clicks.
    User,
    /// Programmatic insertions (slide headers, automatic page breaks).
    Api,
    /// Selection-only updates that must not be observed.
    Silent,
}

/// One recorded mutation of the note document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChange {
    pub source: ChangeSource,
    pub offset: usize,
    pub inserted: usize,
    pub deleted: usize,
}

/// Contiguous characters sharing one format inside a paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    pub bold: bool,
}

/// Block-level projection of the document used by layout and export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteBlock {
    Paragraph(Vec<TextRun>),
    PageBreak,
}

impl NoteBlock {
    /// Character count of a paragraph; page breaks have no characters.
    pub fn char_count(&self) -> usize {
        match self {
            Self::Paragraph(runs) => runs.iter().map(|run| run.text.chars().count()).sum(),
            Self::PageBreak => 0,
        }
    }
}

/// Rich-text note document addressed by unit offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDocument {
    units: Vec<NoteUnit>,
}

impl Default for NoteDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl NoteDocument {
    /// Creates an empty document holding only the terminal line break.
    pub fn new() -> Self {
        Self {
            units: vec![NoteUnit::Char {
                ch: LINE_BREAK,
                format: TextFormat::PLAIN,
            }],
        }
    }

    /// Total unit count, terminal line break included.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Always `false`: the terminal line break is permanent.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns whether the document holds nothing but the terminal line break.
    pub fn is_blank(&self) -> bool {
        self.units.len() == 1
    }

    /// Offset where appended content lands (just before the terminal break).
    pub fn end_offset(&self) -> usize {
        self.units.len() - 1
    }

    pub fn units(&self) -> &[NoteUnit] {
        &self.units
    }

    pub fn unit_at(&self, offset: usize) -> Option<NoteUnit> {
        self.units.get(offset).copied()
    }

    /// Counts page-break markers currently present.
    pub fn page_break_count(&self) -> usize {
        self.units.iter().filter(|unit| unit.is_page_break()).count()
    }

    /// Inserts `text` at `offset`, clamped to the end offset.
    ///
    /// Carriage returns are dropped so `\r\n` input becomes one line break.
    /// Returns the `TextChange` describing the insertion.
    pub fn insert_text(
        &mut self,
        offset: usize,
        text: &str,
        format: TextFormat,
        source: ChangeSource,
    ) -> TextChange {
        let at = offset.min(self.end_offset());
        let inserted = text
            .chars()
            .filter(|ch| *ch != '\r')
            .map(|ch| NoteUnit::Char { ch, format })
            .collect::<Vec<_>>();
        let count = inserted.len();
        self.units.splice(at..at, inserted);
        TextChange {
            source,
            offset: at,
            inserted: count,
            deleted: 0,
        }
    }

    /// Inserts one page-break marker at `offset`, clamped to the end offset.
    pub fn insert_page_break(&mut self, offset: usize, source: ChangeSource) -> TextChange {
        let at = offset.min(self.end_offset());
        self.units.insert(at, NoteUnit::PageBreak);
        TextChange {
            source,
            offset: at,
            inserted: 1,
            deleted: 0,
        }
    }

    /// Deletes up to `len` units starting at `offset`.
    ///
    /// The terminal line break survives every deletion.
    pub fn delete(&mut self, offset: usize, len: usize, source: ChangeSource) -> TextChange {
        let start = offset.min(self.end_offset());
        let end = start.saturating_add(len).min(self.end_offset());
        self.units.drain(start..end);
        TextChange {
            source,
            offset: start,
            inserted: 0,
            deleted: end - start,
        }
    }

    /// Resets to an empty document.
    pub fn clear(&mut self, source: ChangeSource) -> TextChange {
        let deleted = self.end_offset();
        *self = Self::new();
        TextChange {
            source,
            offset: 0,
            inserted: 0,
            deleted,
        }
    }

    /// Plain-text projection; page breaks render as form feeds.
    pub fn plain_text(&self) -> String {
        self.units
            .iter()
            .map(|unit| match unit {
                NoteUnit::Char { ch, .. } => *ch,
                NoteUnit::PageBreak => '\u{000C}',
            })
            .collect()
    }

    /// Splits the document into paragraphs and page breaks.
    ///
    /// A line break closes the current paragraph (an empty one included). A
    /// page break closes a pending non-empty paragraph and stands alone.
    pub fn blocks(&self) -> Vec<NoteBlock> {
        let mut blocks = Vec::new();
        let mut runs: Vec<TextRun> = Vec::new();
        let mut pending = false;

        for unit in &self.units {
            match unit {
                NoteUnit::PageBreak => {
                    if pending {
                        blocks.push(NoteBlock::Paragraph(std::mem::take(&mut runs)));
                        pending = false;
                    }
                    blocks.push(NoteBlock::PageBreak);
                }
                NoteUnit::Char { ch: LINE_BREAK, .. } => {
                    blocks.push(NoteBlock::Paragraph(std::mem::take(&mut runs)));
                    pending = false;
                }
                NoteUnit::Char { ch, format } => {
                    pending = true;
                    match runs.last_mut() {
                        Some(run) if run.bold == format.bold => run.text.push(*ch),
                        _ => runs.push(TextRun {
                            text: ch.to_string(),
                            bold: format.bold,
                        }),
                    }
                }
            }
        }

        blocks
    }
}

#[cfg(test)]
mod tests {
    use super::{ChangeSource, NoteBlock, NoteDocument, NoteUnit, TextFormat, TextRun};

    #[test]
    fn new_document_holds_only_terminal_break() {
        let doc = NoteDocument::new();
        assert_eq!(doc.len(), 1);
        assert!(doc.is_blank());
        assert_eq!(doc.end_offset(), 0);
        assert!(doc.unit_at(0).expect("terminal unit").is_line_break());
    }

    #[test]
    fn insert_past_end_clamps_before_terminal_break() {
        let mut doc = NoteDocument::new();
        let change = doc.insert_text(99, "ab", TextFormat::PLAIN, ChangeSource::User);
        assert_eq!(change.offset, 0);
        assert_eq!(change.inserted, 2);
        assert_eq!(doc.plain_text(), "ab\n");
    }

    #[test]
    fn carriage_returns_are_dropped() {
        let mut doc = NoteDocument::new();
        doc.insert_text(0, "a\r\nb", TextFormat::PLAIN, ChangeSource::User);
        assert_eq!(doc.plain_text(), "a\nb\n");
    }

    #[test]
    fn delete_never_removes_terminal_break() {
        let mut doc = NoteDocument::new();
        doc.insert_text(0, "abc", TextFormat::PLAIN, ChangeSource::User);
        let change = doc.delete(1, 100, ChangeSource::User);
        assert_eq!(change.deleted, 2);
        assert_eq!(doc.plain_text(), "a\n");
    }

    #[test]
    fn page_breaks_are_single_atomic_units() {
        let mut doc = NoteDocument::new();
        doc.insert_text(0, "x", TextFormat::PLAIN, ChangeSource::User);
        doc.insert_page_break(1, ChangeSource::Api);
        assert_eq!(doc.len(), 3);
        assert_eq!(doc.page_break_count(), 1);
        assert_eq!(doc.unit_at(1), Some(NoteUnit::PageBreak));
    }

    #[test]
    fn blocks_group_runs_and_split_on_page_breaks() {
        let mut doc = NoteDocument::new();
        doc.insert_text(0, "Slide 1\n", TextFormat::BOLD, ChangeSource::Api);
        let end = doc.end_offset();
        doc.insert_page_break(end, ChangeSource::Api);
        let end = doc.end_offset();
        doc.insert_text(end, "tail", TextFormat::PLAIN, ChangeSource::User);

        assert_eq!(
            doc.blocks(),
            vec![
                NoteBlock::Paragraph(vec![TextRun {
                    text: "Slide 1".to_string(),
                    bold: true,
                }]),
                NoteBlock::PageBreak,
                NoteBlock::Paragraph(vec![TextRun {
                    text: "tail".to_string(),
                    bold: false,
                }]),
            ]
        );
    }

    #[test]
    fn clear_reports_removed_units() {
        let mut doc = NoteDocument::new();
        doc.insert_text(0, "hello", TextFormat::PLAIN, ChangeSource::User);
        let change = doc.clear(ChangeSource::Api);
        assert_eq!(change.deleted, 5);
        assert!(doc.is_blank());
    }
}
