//! Note surface measurement.
//!
//! # Responsibility
//! - Estimate rendered height of the note surface for pagination.
//! - Locate the caret's vertical position for scroll-into-view.
//!
//! # Invariants
//! - Page-break markers add no measured height; they only count.
//! - `None` means the surface cannot be measured (detached view).

use crate::config::SessionConfig;
use crate::model::note::{NoteBlock, NoteDocument, NoteUnit};

/// Vertical bounds of a caret, in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaretBounds {
    pub top: f64,
    pub height: f64,
}

/// Scroll state of the note pane.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NoteViewport {
    pub scroll_top: f64,
}

/// Measurement contract used by pagination and navigation.
pub trait NoteLayout {
    fn content_height(&self, doc: &NoteDocument) -> Option<f64>;
    fn caret_bounds(&self, doc: &NoteDocument, offset: usize) -> Option<CaretBounds>;
}

/// Fixed-metrics line layout: paragraphs wrap at `chars_per_line`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineLayout {
    pub line_height_px: f64,
    pub chars_per_line: usize,
    pub top_padding_px: f64,
}

impl Default for LineLayout {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}

impl LineLayout {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            line_height_px: config.line_height_px,
            chars_per_line: config.chars_per_line.max(1),
            top_padding_px: config.top_padding_px,
        }
    }

    fn paragraph_lines(&self, chars: usize) -> usize {
        chars.div_ceil(self.chars_per_line).max(1)
    }
}

impl NoteLayout for LineLayout {
    fn content_height(&self, doc: &NoteDocument) -> Option<f64> {
        let lines = doc
            .blocks()
            .iter()
            .map(|block| match block {
                NoteBlock::Paragraph(_) => self.paragraph_lines(block.char_count()),
                NoteBlock::PageBreak => 0,
            })
            .sum::<usize>();
        Some(self.top_padding_px + lines as f64 * self.line_height_px)
    }

    fn caret_bounds(&self, doc: &NoteDocument, offset: usize) -> Option<CaretBounds> {
        let mut line = 0usize;
        let mut column = 0usize;

        for unit in doc.units().iter().take(offset) {
            match unit {
                NoteUnit::PageBreak => {
                    if column > 0 {
                        line += 1;
                        column = 0;
                    }
                }
                unit if unit.is_line_break() => {
                    line += 1;
                    column = 0;
                }
                NoteUnit::Char { .. } => {
                    if column == self.chars_per_line {
                        line += 1;
                        column = 0;
                    }
                    column += 1;
                }
            }
        }

        Some(CaretBounds {
            top: self.top_padding_px + line as f64 * self.line_height_px,
            height: self.line_height_px,
        })
    }
}
