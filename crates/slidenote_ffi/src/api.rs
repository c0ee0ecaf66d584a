//! FFI use-case API for the desktop shell.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Own the UI-thread note session and run its async work to completion.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - All calls come from the UI thread; the session is thread-local.
//! - Export replies always name `EXPORT_RESPONSE_CHANNEL`.

use log::warn;
use slidenote_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    ExportBridge, ExportRequest, LopdfRenderer, NavigationOutcome, NoteSession, PaginationOutcome,
    PresetSaveDialog, RenderApplied, SessionConfig, EXPORT_RESPONSE_CHANNEL,
};
use std::cell::{OnceCell, RefCell};
use std::path::PathBuf;
use tokio::runtime::{Builder, Runtime};

thread_local! {
    static SESSION: RefCell<NoteSession> = RefCell::new(NoteSession::new(load_config()));
    static RUNTIME: OnceCell<Runtime> = const { OnceCell::new() };
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Result of loading a deck chosen in the file picker.
#[derive(Debug, Clone, PartialEq)]
pub struct DeckLoadResponse {
    pub ok: bool,
    pub page_count: u32,
    pub rendered_pages: u32,
    pub failed_pages: u32,
    /// Note offsets per slide, in page order.
    pub slide_indices: Vec<u64>,
    pub message: String,
}

/// Result of a page click in the deck pane.
#[derive(Debug, Clone, PartialEq)]
pub struct PageClickResponse {
    pub moved: bool,
    pub caret: Option<u64>,
    pub scroll_top: Option<f64>,
}

/// State after a note edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteEditResponse {
    pub length: u64,
    pub page_breaks: u64,
    pub inserted_breaks: u32,
    pub caret: u64,
}

/// Applied zoom after a slider move.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleResponse {
    pub applied: f64,
    pub rendered_pages: u32,
}

/// Export result envelope, delivered on `channel`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResponse {
    pub channel: String,
    pub success: bool,
    pub error: Option<String>,
}

/// Loads a deck and rebuilds the note sections for it.
///
/// # FFI contract
/// - Sync call; parses and renders before returning.
/// - A rejected payload leaves the current deck and notes untouched.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn deck_load(bytes: Vec<u8>) -> DeckLoadResponse {
    let result = with_runtime(|runtime| {
        with_session(|session| runtime.block_on(session.load_deck(&LopdfRenderer::new(), &bytes)))
    })
    .and_then(|inner| inner);

    match result {
        Ok(Ok(report)) => {
            let (rendered, failed) = render_counts(report.render);
            DeckLoadResponse {
                ok: true,
                page_count: report.page_count,
                rendered_pages: rendered,
                failed_pages: failed,
                slide_indices: report.slide_indices.iter().map(|i| *i as u64).collect(),
                message: format!("Loaded {} page(s).", report.page_count),
            }
        }
        Ok(Err(err)) => failed_load(format!("deck_load failed: {err}")),
        Err(err) => failed_load(err),
    }
}

/// Moves the deck zoom slider and re-renders the current deck.
///
/// # FFI contract
/// - Out-of-range values are clamped; non-finite values keep the old scale.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn set_pdf_scale(scale: f64) -> ScaleResponse {
    let result = with_runtime(|runtime| {
        with_session(|session| {
            let applied = runtime.block_on(session.rescale(&LopdfRenderer::new(), scale as f32));
            (session.pdf_scale(), applied)
        })
    })
    .and_then(|inner| inner);
    match result {
        Ok((applied, render)) => ScaleResponse {
            applied: f64::from(applied),
            rendered_pages: render.map(|r| render_counts(r).0).unwrap_or(0),
        },
        Err(err) => {
            warn!("event=scale_change module=ffi status=error error={err}");
            ScaleResponse {
                applied: 0.0,
                rendered_pages: 0,
            }
        }
    }
}

/// Moves the note zoom slider; the shell applies it as a top-left transform.
#[flutter_rust_bridge::frb(sync)]
pub fn set_note_scale(scale: f64) -> f64 {
    with_session(|session| f64::from(session.set_note_scale(scale as f32))).unwrap_or(1.0)
}

/// Applies typed or pasted text at `offset`.
#[flutter_rust_bridge::frb(sync)]
pub fn note_insert_text(offset: u64, text: String) -> NoteEditResponse {
    edit(|session| count_inserted(&session.type_text(offset as usize, &text)))
}

/// Deletes `length` units at `offset`.
#[flutter_rust_bridge::frb(sync)]
pub fn note_delete_text(offset: u64, length: u64) -> NoteEditResponse {
    edit(|session| count_inserted(&session.delete_text(offset as usize, length as usize)))
}

/// Jumps the note caret to the section of a clicked page (1-based).
///
/// # FFI contract
/// - Stale or out-of-range pages return `moved = false` and change nothing.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn page_click(page: u32) -> PageClickResponse {
    match with_session(|session| session.click_page(page)) {
        Ok(NavigationOutcome::Moved {
            caret, scroll_top, ..
        }) => PageClickResponse {
            moved: true,
            caret: Some(caret as u64),
            scroll_top,
        },
        Ok(NavigationOutcome::Ignored { .. }) | Err(_) => PageClickResponse {
            moved: false,
            caret: None,
            scroll_top: None,
        },
    }
}

/// Serialized note markup.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_markup() -> String {
    with_session(|session| session.notes_markup()).unwrap_or_default()
}

/// Current slide index table.
#[flutter_rust_bridge::frb(sync)]
pub fn slide_indices() -> Vec<u64> {
    with_session(|session| {
        session
            .slide_indices()
            .as_slice()
            .iter()
            .map(|i| *i as u64)
            .collect()
    })
    .unwrap_or_default()
}

/// Exports the window (`kind = "view"`) or the notes (`kind = "notes"`).
///
/// Input semantics:
/// - `path`: destination picked in the shell's save dialog; `None` means the
///   dialog was dismissed.
///
/// # FFI contract
/// - Sync call; composes and writes before returning.
/// - Never panics; failures come back as `success = false`.
#[flutter_rust_bridge::frb(sync)]
pub fn export_pdf(kind: String, path: Option<String>) -> ExportResponse {
    let request = match kind.trim().to_ascii_lowercase().as_str() {
        "view" => ExportRequest::View,
        "notes" => match with_session(|session| session.notes_markup()) {
            Ok(markup) => ExportRequest::Notes { markup },
            Err(err) => return export_failure(err),
        },
        other => return export_failure(format!("unsupported export kind `{other}`")),
    };

    let file_name = with_session(|session| session.config().export_file_name.clone())
        .unwrap_or_else(|_| SessionConfig::default().export_file_name);
    let dialog = PresetSaveDialog::new(path.map(PathBuf::from));
    let window = || {
        SESSION.with(|cell| {
            cell.try_borrow()
                .ok()
                .map(|session| session.capture_view())
        })
    };
    let bridge = ExportBridge::new(dialog, window).with_default_file_name(file_name);

    match with_runtime(|runtime| runtime.block_on(bridge.handle(request))) {
        Ok(reply) => ExportResponse {
            channel: reply.channel.to_string(),
            success: reply.outcome.success,
            error: reply.outcome.error,
        },
        Err(err) => export_failure(err),
    }
}

fn edit(f: impl FnOnce(&mut NoteSession) -> usize) -> NoteEditResponse {
    with_session(|session| {
        let inserted_breaks = f(session).min(u32::MAX as usize) as u32;
        NoteEditResponse {
            length: session.document().len() as u64,
            page_breaks: session.document().page_break_count() as u64,
            inserted_breaks,
            caret: session.editor().selection().index as u64,
        }
    })
    .unwrap_or(NoteEditResponse {
        length: 0,
        page_breaks: 0,
        inserted_breaks: 0,
        caret: 0,
    })
}

fn count_inserted(outcomes: &[PaginationOutcome]) -> usize {
    outcomes.iter().filter(|outcome| outcome.inserted()).count()
}

fn load_config() -> SessionConfig {
    SessionConfig::load_from_env().unwrap_or_else(|err| {
        warn!("event=config_load module=ffi status=error fallback=defaults error={err}");
        SessionConfig::default()
    })
}

fn with_session<T>(f: impl FnOnce(&mut NoteSession) -> T) -> Result<T, String> {
    SESSION.with(|cell| match cell.try_borrow_mut() {
        Ok(mut session) => Ok(f(&mut session)),
        Err(_) => Err("note session is busy".to_string()),
    })
}

fn with_runtime<T>(f: impl FnOnce(&Runtime) -> T) -> Result<T, String> {
    RUNTIME.with(|slot| {
        if slot.get().is_none() {
            let runtime = Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|err| format!("async runtime init failed: {err}"))?;
            let _ = slot.set(runtime);
        }
        slot.get()
            .map(f)
            .ok_or_else(|| "async runtime unavailable".to_string())
    })
}

fn render_counts(render: RenderApplied) -> (u32, u32) {
    match render {
        RenderApplied::Applied { rendered, failed } => (rendered as u32, failed as u32),
        RenderApplied::Discarded { .. } => (0, 0),
    }
}

fn failed_load(message: String) -> DeckLoadResponse {
    DeckLoadResponse {
        ok: false,
        page_count: 0,
        rendered_pages: 0,
        failed_pages: 0,
        slide_indices: Vec::new(),
        message,
    }
}

fn export_failure(message: String) -> ExportResponse {
    warn!("event=export_pdf module=ffi status=error error={message}");
    ExportResponse {
        channel: EXPORT_RESPONSE_CHANNEL.to_string(),
        success: false,
        error: Some(message),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, deck_load, export_pdf, init_logging, note_delete_text, note_insert_text, notes_markup,
        page_click, ping, set_note_scale, set_pdf_scale, slide_indices,
    };
    use lopdf::{dictionary, Document, Object, Stream};

    fn sample_deck(pages: usize) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let kids = (0..pages)
            .map(|_| {
                let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
                Object::Reference(doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "Contents" => content_id,
                }))
            })
            .collect::<Vec<_>>();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages as i64,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(595),
                    Object::Integer(842),
                ],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("sample deck should serialize");
        bytes
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn deck_load_builds_sections_from_inherited_media_box() {
        let response = deck_load(sample_deck(3));
        assert!(response.ok, "{}", response.message);
        assert_eq!(response.page_count, 3);
        assert_eq!(response.rendered_pages, 3);
        assert_eq!(response.slide_indices, vec![8, 18, 28]);
        assert_eq!(slide_indices(), vec![8, 18, 28]);
    }

    #[test]
    fn deck_load_rejects_garbage_without_touching_notes() {
        let response = deck_load(b"not a pdf".to_vec());
        assert!(!response.ok);
        assert!(response.message.contains("deck_load failed"));
        assert!(slide_indices().is_empty());
    }

    #[test]
    fn page_click_and_typing_flow_into_markup() {
        assert!(deck_load(sample_deck(2)).ok);
        let click = page_click(2);
        assert!(click.moved);
        assert_eq!(click.caret, Some(19));

        let edit = note_insert_text(19, "check the numbers".to_string());
        assert_eq!(edit.caret, 36);
        assert_eq!(edit.page_breaks, 2);
        assert!(notes_markup().contains("check the numbers"));

        assert!(!page_click(3).moved);
    }

    #[test]
    fn page_click_caret_matches_editor_after_notes_are_deleted() {
        assert!(deck_load(sample_deck(3)).ok);
        let wiped = note_delete_text(0, 1_000);
        assert_eq!(wiped.length, 1);

        let click = page_click(3);
        assert!(click.moved);
        assert_eq!(click.caret, Some(1));

        let edit = note_insert_text(1, "x".to_string());
        assert_eq!(edit.caret, 2);
    }

    #[test]
    fn scale_sliders_clamp_values() {
        assert!(deck_load(sample_deck(1)).ok);
        let response = set_pdf_scale(50.0);
        assert_eq!(response.applied, 4.0);
        assert_eq!(response.rendered_pages, 1);
        assert_eq!(set_note_scale(0.0), 0.5);
    }

    #[test]
    fn export_writes_notes_and_reports_cancel() {
        assert!(deck_load(sample_deck(2)).ok);
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("notes.pdf");

        let saved = export_pdf(
            "notes".to_string(),
            Some(path.to_string_lossy().into_owned()),
        );
        assert!(saved.success, "{:?}", saved.error);
        assert_eq!(saved.channel, "export-pdf-response");
        assert!(std::fs::metadata(&path).expect("file written").len() > 0);

        let canceled = export_pdf("view".to_string(), None);
        assert!(!canceled.success);
        assert_eq!(canceled.error.as_deref(), Some("Save canceled"));
        assert_eq!(canceled.channel, "export-pdf-response");

        let unknown = export_pdf("slides".to_string(), None);
        assert!(!unknown.success);
    }
}
