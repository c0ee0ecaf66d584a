//! Note-taking session view-model.
//!
//! # Responsibility
//! - Own the note editor, slide index table, current deck, rendered pages,
//!   zoom levels and note viewport for one window.
//! - Sequence deck loads, user edits, page clicks and export payloads.
//!
//! # Invariants
//! - A new deck replaces the previous one wholesale and rebuilds the slide
//!   index table from its page count.
//! - Render batches from a superseded load or scale are discarded.
//! - Pagination only ever reacts to user-sourced changes.

use crate::config::SessionConfig;
use crate::export::markup::{document_markup, escape};
use crate::layout::{LineLayout, NoteLayout, NoteViewport};
use crate::model::editor::NoteEditor;
use crate::model::note::{ChangeSource, NoteDocument, TextFormat};
use crate::navigation::{navigate_to_page, NavigationOutcome};
use crate::pagination::{PaginationEngine, PaginationOutcome};
use crate::render::{render_pages, Deck, DocumentRenderer, PageSurface, RenderBatch, RenderError, RenderTicket};
use crate::slides::{initialize_sections, SlideIndexTable};
use log::{info, warn};
use std::collections::BTreeMap;

/// What happened to a render batch handed to `apply_render`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderApplied {
    Applied { rendered: usize, failed: usize },
    /// The batch belongs to an older load or scale and was dropped.
    Discarded { batch_generation: u64, current_generation: u64 },
}

/// Summary of `load_deck`.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub page_count: u32,
    pub slide_indices: Vec<usize>,
    pub render: RenderApplied,
}

pub struct NoteSession<L = LineLayout> {
    config: SessionConfig,
    editor: NoteEditor,
    slides: SlideIndexTable,
    pagination: PaginationEngine,
    layout: L,
    viewport: NoteViewport,
    deck: Option<Deck>,
    pages: BTreeMap<u32, PageSurface>,
    failed_pages: BTreeMap<u32, String>,
    pdf_scale: f32,
    note_scale: f32,
    generation: u64,
}

impl NoteSession<LineLayout> {
    pub fn new(config: SessionConfig) -> Self {
        let layout = LineLayout::from_config(&config);
        Self::with_layout(config, layout)
    }
}

impl Default for NoteSession<LineLayout> {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl<L: NoteLayout> NoteSession<L> {
    pub fn with_layout(config: SessionConfig, layout: L) -> Self {
        Self {
            pagination: PaginationEngine::new(config.page_height_px),
            pdf_scale: config.pdf_scale,
            note_scale: config.note_scale,
            config,
            editor: NoteEditor::new(),
            slides: SlideIndexTable::new(),
            layout,
            viewport: NoteViewport::default(),
            deck: None,
            pages: BTreeMap::new(),
            failed_pages: BTreeMap::new(),
            generation: 0,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn editor(&self) -> &NoteEditor {
        &self.editor
    }

    pub fn document(&self) -> &NoteDocument {
        self.editor.document()
    }

    pub fn slide_indices(&self) -> &SlideIndexTable {
        &self.slides
    }

    pub fn deck(&self) -> Option<&Deck> {
        self.deck.as_ref()
    }

    /// Successfully rendered pages of the current deck, by page number.
    pub fn pages(&self) -> &BTreeMap<u32, PageSurface> {
        &self.pages
    }

    /// Pages whose last render failed, with the error message.
    pub fn failed_pages(&self) -> &BTreeMap<u32, String> {
        &self.failed_pages
    }

    pub fn pdf_scale(&self) -> f32 {
        self.pdf_scale
    }

    pub fn note_scale(&self) -> f32 {
        self.note_scale
    }

    pub fn viewport(&self) -> NoteViewport {
        self.viewport
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Installs `deck`, rebuilds note sections and returns the render ticket.
    pub fn begin_load(&mut self, deck: Deck) -> RenderTicket {
        self.generation += 1;
        self.pages.clear();
        self.failed_pages.clear();
        self.slides = initialize_sections(&mut self.editor, deck.page_count());
        self.process_changes();
        self.viewport = NoteViewport::default();

        let ticket = RenderTicket {
            generation: self.generation,
            deck_id: deck.id(),
            scale: self.pdf_scale,
        };
        self.deck = Some(deck);
        ticket
    }

    /// Stores surfaces from `batch` unless it was superseded.
    pub fn apply_render(&mut self, batch: RenderBatch) -> RenderApplied {
        let current_deck = self.deck.as_ref().map(Deck::id);
        if batch.ticket.generation != self.generation
            || current_deck != Some(batch.ticket.deck_id)
        {
            warn!(
                "event=page_render module=session status=skip reason=stale_batch batch_generation={} current_generation={}",
                batch.ticket.generation, self.generation
            );
            return RenderApplied::Discarded {
                batch_generation: batch.ticket.generation,
                current_generation: self.generation,
            };
        }

        let rendered = batch.surfaces.len();
        let failed = batch.failures.len();
        for surface in batch.surfaces {
            self.failed_pages.remove(&surface.page_number);
            self.pages.insert(surface.page_number, surface);
        }
        for (page, err) in batch.failures {
            self.pages.remove(&page);
            self.failed_pages.insert(page, err.to_string());
        }
        RenderApplied::Applied { rendered, failed }
    }

    /// Parses `bytes`, resets notes for the new deck and renders every page.
    ///
    /// A parse failure leaves the current deck and notes untouched.
    pub async fn load_deck<R: DocumentRenderer + ?Sized>(
        &mut self,
        renderer: &R,
        bytes: &[u8],
    ) -> Result<LoadReport, RenderError> {
        let deck = renderer.load(bytes).await?;
        let ticket = self.begin_load(deck.clone());
        let batch = render_pages(renderer, &deck, ticket).await;
        let render = self.apply_render(batch);

        Ok(LoadReport {
            page_count: deck.page_count(),
            slide_indices: self.slides.as_slice().to_vec(),
            render,
        })
    }

    /// Updates the page-render scale; returns a ticket when a re-render is due.
    pub fn set_pdf_scale(&mut self, scale: f32) -> Option<RenderTicket> {
        let clamped = clamp_scale(
            scale,
            self.config.pdf_scale_min,
            self.config.pdf_scale_max,
            self.pdf_scale,
        );
        self.pdf_scale = clamped;
        info!("event=scale_change module=session status=ok target=pdf scale={clamped}");

        let deck_id = self.deck.as_ref()?.id();
        self.generation += 1;
        Some(RenderTicket {
            generation: self.generation,
            deck_id,
            scale: clamped,
        })
    }

    /// Re-renders the current deck at `scale`.
    pub async fn rescale<R: DocumentRenderer + ?Sized>(
        &mut self,
        renderer: &R,
        scale: f32,
    ) -> Option<RenderApplied> {
        let ticket = self.set_pdf_scale(scale)?;
        let deck = self.deck.clone()?;
        let batch = render_pages(renderer, &deck, ticket).await;
        Some(self.apply_render(batch))
    }

    /// Updates the note-pane zoom and returns the applied value.
    pub fn set_note_scale(&mut self, scale: f32) -> f32 {
        self.note_scale = clamp_scale(
            scale,
            self.config.note_scale_min,
            self.config.note_scale_max,
            self.note_scale,
        );
        info!(
            "event=scale_change module=session status=ok target=note scale={}",
            self.note_scale
        );
        self.note_scale
    }

    /// Applies a user keystroke or paste, then paginates.
    pub fn type_text(&mut self, offset: usize, text: &str) -> Vec<PaginationOutcome> {
        let change = self
            .editor
            .insert_text(offset, text, TextFormat::PLAIN, ChangeSource::User);
        self.editor
            .set_selection(change.offset + change.inserted, 0, ChangeSource::Silent);
        self.process_changes()
    }

    /// Applies a user deletion, then paginates.
    pub fn delete_text(&mut self, offset: usize, len: usize) -> Vec<PaginationOutcome> {
        self.editor.delete_text(offset, len, ChangeSource::User);
        self.process_changes()
    }

    /// Navigates to the note section of a clicked page (1-based).
    pub fn click_page(&mut self, page: u32) -> NavigationOutcome {
        let outcome = navigate_to_page(
            &mut self.editor,
            &self.slides,
            &self.layout,
            &mut self.viewport,
            page,
        );
        self.process_changes();
        outcome
    }

    /// Feeds queued changes to pagination until none remain.
    pub fn process_changes(&mut self) -> Vec<PaginationOutcome> {
        let mut outcomes = Vec::new();
        loop {
            let changes = self.editor.take_changes();
            if changes.is_empty() {
                break;
            }
            for change in changes {
                let outcome = self
                    .pagination
                    .on_change(&mut self.editor, &self.layout, &change);
                if change.source == ChangeSource::User {
                    outcomes.push(outcome);
                }
            }
        }
        outcomes
    }

    /// Serialized note markup for notes-only export.
    pub fn notes_markup(&self) -> String {
        document_markup(self.editor.document())
    }

    /// Markup of the whole window: deck summary, page labels, then notes.
    pub fn capture_view(&self) -> String {
        let mut out = String::new();
        match &self.deck {
            Some(deck) => {
                out.push_str(&format!(
                    "<h2>{}</h2>",
                    escape(&format!(
                        "Slides: {} pages at scale {}",
                        deck.page_count(),
                        self.pdf_scale
                    ))
                ));
                for page in self.pages.keys() {
                    out.push_str(&format!("<h3>Page {page}</h3>"));
                }
            }
            None => out.push_str("<h2>No deck loaded</h2>"),
        }
        out.push_str(&self.notes_markup());
        out
    }
}

fn clamp_scale(requested: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if requested.is_finite() {
        requested.clamp(min, max)
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::clamp_scale;

    #[test]
    fn clamp_scale_bounds_and_rejects_nan() {
        assert_eq!(clamp_scale(10.0, 0.5, 3.0, 1.0), 3.0);
        assert_eq!(clamp_scale(0.1, 0.5, 3.0, 1.0), 0.5);
        assert_eq!(clamp_scale(f32::NAN, 0.5, 3.0, 1.2), 1.2);
    }
}
