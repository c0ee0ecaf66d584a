//! PDF export bridge.
//!
//! # Responsibility
//! - Turn an export request (whole view or notes only) into a page-formatted
//!   PDF, ask the save dialog for a destination and write the bytes.
//! - Report every outcome as an `ExportReply` on the single response channel.
//!
//! # Invariants
//! - Both request kinds answer on `EXPORT_RESPONSE_CHANNEL`.
//! - A dismissed dialog yields `Save canceled` and writes nothing.
//! - Failures never escape as panics; they become `success: false` replies.

mod dialog;
pub mod markup;
mod pdf;

pub use dialog::{DialogChoice, PresetSaveDialog, SaveDialog, SaveDialogOptions};
pub use pdf::compose_pdf;

use log::{error, info};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Instant;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub const EXPORT_REQUEST_CHANNEL: &str = "export-pdf";
pub const EXPORT_RESPONSE_CHANNEL: &str = "export-pdf-response";
pub const SAVE_CANCELED: &str = "Save canceled";

/// Fixed page-format options used for every export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintOptions {
    pub margins: MarginsMode,
    pub page_size: PageSize,
    pub print_background: bool,
    pub selection_only: bool,
    pub landscape: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarginsMode {
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSize {
    A4,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            margins: MarginsMode::Default,
            page_size: PageSize::A4,
            print_background: true,
            selection_only: false,
            landscape: false,
        }
    }
}

impl PrintOptions {
    /// Page width and height in points, after orientation.
    pub fn page_size_pt(&self) -> (i64, i64) {
        let (width, height) = match self.page_size {
            PageSize::A4 => (595, 842),
        };
        if self.landscape {
            (height, width)
        } else {
            (width, height)
        }
    }

    pub fn margin_pt(&self) -> i64 {
        match self.margins {
            MarginsMode::Default => 36,
        }
    }
}

/// What to export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportRequest {
    /// Everything the window currently shows.
    View,
    /// Serialized note markup only.
    Notes { markup: String },
}

impl ExportRequest {
    fn kind(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Notes { .. } => "notes",
        }
    }

    fn dialog_title(&self) -> &'static str {
        match self {
            Self::View => "Save as PDF",
            Self::Notes { .. } => "Save notes as PDF",
        }
    }
}

#[derive(Debug)]
pub enum ExportError {
    Canceled,
    NoFilePath,
    NoActiveWindow,
    Compose(String),
    UnsupportedCharacter(char),
    Io { path: PathBuf, source: std::io::Error },
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Canceled => write!(f, "{SAVE_CANCELED}"),
            Self::NoFilePath => write!(f, "No file path provided"),
            Self::NoActiveWindow => write!(f, "No active window available."),
            Self::Compose(message) => write!(f, "failed to compose PDF: {message}"),
            Self::UnsupportedCharacter(ch) => write!(
                f,
                "failed to compose PDF: {ch:?} (U+{:04X}) has no glyph in the export font",
                u32::from(*ch)
            ),
            Self::Io { path, source } => {
                write!(f, "failed to write `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result payload sent back to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExportOutcome {
    pub fn saved() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(err: &ExportError) -> Self {
        Self {
            success: false,
            error: Some(err.to_string()),
        }
    }

    pub fn is_canceled(&self) -> bool {
        self.error.as_deref() == Some(SAVE_CANCELED)
    }
}

/// Reply envelope; `channel` is always `EXPORT_RESPONSE_CHANNEL`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportReply {
    pub channel: &'static str,
    pub outcome: ExportOutcome,
}

/// Source of the window's current markup for `ExportRequest::View`.
pub trait WindowSource {
    /// `None` when no window is available.
    fn capture_view(&self) -> Option<String>;
}

impl<F> WindowSource for F
where
    F: Fn() -> Option<String>,
{
    fn capture_view(&self) -> Option<String> {
        self()
    }
}

/// Window source for headless callers that only export notes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWindow;

impl WindowSource for NoWindow {
    fn capture_view(&self) -> Option<String> {
        None
    }
}

pub struct ExportBridge<D, W> {
    dialog: D,
    window: W,
    options: PrintOptions,
    default_file_name: String,
}

impl<D: SaveDialog, W: WindowSource> ExportBridge<D, W> {
    pub fn new(dialog: D, window: W) -> Self {
        Self {
            dialog,
            window,
            options: PrintOptions::default(),
            default_file_name: "document.pdf".to_string(),
        }
    }

    pub fn with_default_file_name(mut self, name: impl Into<String>) -> Self {
        self.default_file_name = name.into();
        self
    }

    pub fn dialog(&self) -> &D {
        &self.dialog
    }

    pub fn options(&self) -> &PrintOptions {
        &self.options
    }

    /// Runs one export and wraps the result for the response channel.
    pub async fn handle(&self, request: ExportRequest) -> ExportReply {
        let kind = request.kind();
        let started_at = Instant::now();
        info!("event=export_pdf module=export status=start kind={kind}");

        let outcome = match self.export(request).await {
            Ok((path, bytes)) => {
                info!(
                    "event=export_pdf module=export status=ok kind={} bytes={} duration_ms={} path={}",
                    kind,
                    bytes,
                    started_at.elapsed().as_millis(),
                    path.display()
                );
                ExportOutcome::saved()
            }
            Err(ExportError::Canceled) => {
                info!("event=export_pdf module=export status=canceled kind={kind}");
                ExportOutcome::failed(&ExportError::Canceled)
            }
            Err(err) => {
                error!(
                    "event=export_pdf module=export status=error kind={} duration_ms={} error={}",
                    kind,
                    started_at.elapsed().as_millis(),
                    err
                );
                ExportOutcome::failed(&err)
            }
        };

        ExportReply {
            channel: EXPORT_RESPONSE_CHANNEL,
            outcome,
        }
    }

    /// Composes, asks for a path and writes. Returns the path and byte count.
    pub async fn export(&self, request: ExportRequest) -> Result<(PathBuf, usize), ExportError> {
        let title = request.dialog_title();
        let markup = match request {
            ExportRequest::View => self
                .window
                .capture_view()
                .ok_or(ExportError::NoActiveWindow)?,
            ExportRequest::Notes { markup } => markup,
        };

        let blocks = markup::parse_markup(&markup);
        let bytes = compose_pdf(&blocks, &self.options)?;

        let options = SaveDialogOptions::pdf(title, self.default_file_name.as_str());
        let path = match self.dialog.show_save_dialog(&options).await {
            DialogChoice::Canceled => return Err(ExportError::Canceled),
            DialogChoice::Chosen(path) if path.as_os_str().is_empty() => {
                return Err(ExportError::NoFilePath)
            }
            DialogChoice::Chosen(path) => path,
        };

        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|source| ExportError::Io {
                path: path.clone(),
                source,
            })?;
        Ok((path, bytes.len()))
    }

    /// Answers fire-and-forget requests until either channel closes.
    pub async fn serve(
        &self,
        mut requests: UnboundedReceiver<ExportRequest>,
        replies: UnboundedSender<ExportReply>,
    ) {
        while let Some(request) = requests.recv().await {
            let reply = self.handle(request).await;
            if replies.send(reply).is_err() {
                break;
            }
        }
    }
}
