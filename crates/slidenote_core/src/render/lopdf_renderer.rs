//! `lopdf`-backed deck loader and page-surface allocator.
//!
//! Parses the page tree and each page's effective MediaBox (inherited through
//! `Parent` links, rotated by `/Rotate`). Rendering produces a white RGBA
//! surface sized to the scaled viewport; painting page content belongs to a
//! rasterizing backend plugged in behind `DocumentRenderer`.

use super::{Deck, DocumentRenderer, PageGeometry, PageSurface, RenderError, MAX_SURFACE_EDGE_PX};
use async_trait::async_trait;
use log::{error, info, warn};
use lopdf::{Document, Object, ObjectId};

const MAX_PARENT_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfRenderer;

impl LopdfRenderer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait(?Send)]
impl DocumentRenderer for LopdfRenderer {
    async fn load(&self, bytes: &[u8]) -> Result<Deck, RenderError> {
        let document = match Document::load_mem(bytes) {
            Ok(document) => document,
            Err(err) => {
                error!(
                    "event=deck_load module=render status=error bytes={} error={}",
                    bytes.len(),
                    err
                );
                return Err(err.into());
            }
        };

        let pages = document
            .get_pages()
            .into_iter()
            .map(|(number, page_id)| page_geometry(&document, number, page_id))
            .collect::<Vec<_>>();
        if pages.is_empty() {
            error!("event=deck_load module=render status=error error=no_pages");
            return Err(RenderError::NoPages);
        }

        let deck = Deck::new(pages);
        info!(
            "event=deck_load module=render status=ok deck_id={} pages={} bytes={}",
            deck.id(),
            deck.page_count(),
            bytes.len()
        );
        Ok(deck)
    }

    async fn render_page(
        &self,
        deck: &Deck,
        page_number: u32,
        scale: f32,
    ) -> Result<PageSurface, RenderError> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(RenderError::InvalidScale(scale));
        }
        let geometry = deck
            .page(page_number)
            .ok_or(RenderError::PageOutOfRange {
                page: page_number,
                page_count: deck.page_count(),
            })?;

        let width = (f64::from(geometry.width_pt) * f64::from(scale)).ceil() as u64;
        let height = (f64::from(geometry.height_pt) * f64::from(scale)).ceil() as u64;
        let limit = u64::from(MAX_SURFACE_EDGE_PX);
        if width == 0 || height == 0 || width > limit || height > limit {
            return Err(RenderError::SurfaceTooLarge {
                page: page_number,
                width_px: width,
                height_px: height,
            });
        }

        Ok(PageSurface {
            page_number,
            width_px: width as u32,
            height_px: height as u32,
            scale,
            pixels: vec![u8::MAX; (width * height * 4) as usize],
        })
    }
}

fn page_geometry(document: &Document, number: u32, page_id: ObjectId) -> PageGeometry {
    let Some([x1, y1, x2, y2]) = inherited_rect(document, page_id, b"MediaBox") else {
        warn!(
            "event=deck_load module=render status=degraded page={} reason=missing_media_box",
            number
        );
        return PageGeometry::A4;
    };

    let width_pt = (x2 - x1).abs();
    let height_pt = (y2 - y1).abs();
    if width_pt <= 0.0 || height_pt <= 0.0 {
        warn!(
            "event=deck_load module=render status=degraded page={} reason=empty_media_box",
            number
        );
        return PageGeometry::A4;
    }

    let rotation = document
        .get_dictionary(page_id)
        .ok()
        .and_then(|dict| dict.get(b"Rotate").ok())
        .and_then(|object| object.as_i64().ok())
        .unwrap_or(0);
    if rotation.rem_euclid(180) == 90 {
        PageGeometry {
            width_pt: height_pt,
            height_pt: width_pt,
        }
    } else {
        PageGeometry {
            width_pt,
            height_pt,
        }
    }
}

fn inherited_rect(document: &Document, page_id: ObjectId, key: &[u8]) -> Option<[f32; 4]> {
    let mut current = Some(page_id);
    for _ in 0..MAX_PARENT_DEPTH {
        let dict = document.get_dictionary(current?).ok()?;
        if let Ok(object) = dict.get(key) {
            let (_, resolved) = document.dereference(object).ok()?;
            return rect_from(resolved);
        }
        current = dict
            .get(b"Parent")
            .and_then(Object::as_reference)
            .ok();
    }
    None
}

fn rect_from(object: &Object) -> Option<[f32; 4]> {
    let values = object.as_array().ok()?;
    if values.len() != 4 {
        return None;
    }
    let mut rect = [0.0f32; 4];
    for (slot, value) in rect.iter_mut().zip(values) {
        *slot = number(value)?;
    }
    Some(rect)
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value as f32),
        _ => None,
    }
}
