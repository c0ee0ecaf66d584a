//! Deck rendering adapter.
//!
//! # Responsibility
//! - Define the contract between the session and a page-rendering backend.
//! - Render every page of a deck as independent futures and collect results.
//!
//! # Invariants
//! - A failing page is logged and recorded; it never cancels other pages.
//! - Results carry the `RenderTicket` they were requested with, so a session
//!   can discard batches from a superseded load.
//!
//! # See also
//! - `lopdf_renderer` for the bundled backend.

mod lopdf_renderer;

pub use lopdf_renderer::LopdfRenderer;

use async_trait::async_trait;
use futures_util::stream::{FuturesUnordered, StreamExt};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// A4 portrait in PDF points.
pub const A4_WIDTH_PT: f32 = 595.0;
pub const A4_HEIGHT_PT: f32 = 842.0;

/// Largest surface edge accepted by `render_page`.
pub const MAX_SURFACE_EDGE_PX: u32 = 16_384;

/// Identity of one loaded deck; a fresh ID is issued per load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeckId(pub Uuid);

impl DeckId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DeckId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for DeckId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Page size in PDF points after rotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width_pt: f32,
    pub height_pt: f32,
}

impl PageGeometry {
    pub const A4: Self = Self {
        width_pt: A4_WIDTH_PT,
        height_pt: A4_HEIGHT_PT,
    };
}

/// Opaque handle to a loaded, paginated source document.
///
/// Replaced wholesale on the next load; never mutated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Deck {
    id: DeckId,
    pages: Vec<PageGeometry>,
}

impl Deck {
    pub fn new(pages: Vec<PageGeometry>) -> Self {
        Self {
            id: DeckId::new(),
            pages,
        }
    }

    pub fn id(&self) -> DeckId {
        self.id
    }

    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Geometry for a 1-based page number.
    pub fn page(&self, page_number: u32) -> Option<PageGeometry> {
        let index = usize::try_from(page_number).ok()?.checked_sub(1)?;
        self.pages.get(index).copied()
    }
}

/// RGBA surface for one rendered page, sized to the scaled viewport.
///
/// `LopdfRenderer` only fills `pixels` with opaque white. Page content appears
/// once a rasterizing `DocumentRenderer` is plugged in.
#[derive(Clone, PartialEq)]
pub struct PageSurface {
    pub page_number: u32,
    pub width_px: u32,
    pub height_px: u32,
    pub scale: f32,
    pub pixels: Vec<u8>,
}

impl std::fmt::Debug for PageSurface {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageSurface")
            .field("page_number", &self.page_number)
            .field("width_px", &self.width_px)
            .field("height_px", &self.height_px)
            .field("scale", &self.scale)
            .field("pixels_len", &self.pixels.len())
            .finish()
    }
}

#[derive(Debug)]
pub enum RenderError {
    Parse(lopdf::Error),
    NoPages,
    PageOutOfRange { page: u32, page_count: u32 },
    InvalidScale(f32),
    SurfaceTooLarge { page: u32, width_px: u64, height_px: u64 },
}

impl Display for RenderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "failed to parse document: {err}"),
            Self::NoPages => write!(f, "document has no pages"),
            Self::PageOutOfRange { page, page_count } => {
                write!(f, "page {page} is outside 1..={page_count}")
            }
            Self::InvalidScale(scale) => write!(f, "invalid render scale {scale}"),
            Self::SurfaceTooLarge {
                page,
                width_px,
                height_px,
            } => write!(
                f,
                "page {page} surface {width_px}x{height_px} exceeds {MAX_SURFACE_EDGE_PX}px"
            ),
        }
    }
}

impl Error for RenderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<lopdf::Error> for RenderError {
    fn from(value: lopdf::Error) -> Self {
        Self::Parse(value)
    }
}

/// Page-rendering backend.
///
/// Runs on the UI thread only, so futures are not required to be `Send`.
#[async_trait(?Send)]
pub trait DocumentRenderer {
    /// Parses a binary document payload into a deck handle.
    async fn load(&self, bytes: &[u8]) -> Result<Deck, RenderError>;

    /// Renders one 1-based page at a linear scale factor.
    async fn render_page(
        &self,
        deck: &Deck,
        page_number: u32,
        scale: f32,
    ) -> Result<PageSurface, RenderError>;
}

/// Identifies one render request batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTicket {
    pub generation: u64,
    pub deck_id: DeckId,
    pub scale: f32,
}

/// Per-page outcomes of one render pass, in completion order.
#[derive(Debug)]
pub struct RenderBatch {
    pub ticket: RenderTicket,
    pub surfaces: Vec<PageSurface>,
    pub failures: Vec<(u32, RenderError)>,
}

/// Renders every page of `deck` concurrently on the current thread.
pub async fn render_pages<R: DocumentRenderer + ?Sized>(
    renderer: &R,
    deck: &Deck,
    ticket: RenderTicket,
) -> RenderBatch {
    let mut pending = (1..=deck.page_count())
        .map(|page| async move { (page, renderer.render_page(deck, page, ticket.scale).await) })
        .collect::<FuturesUnordered<_>>();

    let mut batch = RenderBatch {
        ticket,
        surfaces: Vec::new(),
        failures: Vec::new(),
    };

    while let Some((page, result)) = pending.next().await {
        match result {
            Ok(surface) => {
                info!(
                    "event=page_render module=render status=ok page={} scale={} generation={}",
                    page, ticket.scale, ticket.generation
                );
                batch.surfaces.push(surface);
            }
            Err(err) => {
                error!(
                    "event=page_render module=render status=error page={} generation={} error={}",
                    page, ticket.generation, err
                );
                batch.failures.push((page, err));
            }
        }
    }

    batch
}
