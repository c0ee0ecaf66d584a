//! Save-dialog contract.
//!
//! The desktop shell owns the native dialog; core only sees the choice.

use async_trait::async_trait;
use std::path::PathBuf;

/// Options shown by a native save dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveDialogOptions {
    pub title: String,
    pub default_path: String,
    pub filter_name: String,
    pub extensions: Vec<String>,
}

impl SaveDialogOptions {
    pub fn pdf(title: impl Into<String>, default_path: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            default_path: default_path.into(),
            filter_name: "PDF Files".to_string(),
            extensions: vec!["pdf".to_string()],
        }
    }
}

/// What the user did with the dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogChoice {
    Canceled,
    /// Chosen path; may be empty when the platform returns no path.
    Chosen(PathBuf),
}

#[async_trait(?Send)]
pub trait SaveDialog {
    async fn show_save_dialog(&self, options: &SaveDialogOptions) -> DialogChoice;
}

/// Dialog whose answer was collected ahead of time by the caller.
///
/// `None` behaves as a dismissed dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresetSaveDialog {
    path: Option<PathBuf>,
}

impl PresetSaveDialog {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn canceled() -> Self {
        Self { path: None }
    }
}

#[async_trait(?Send)]
impl SaveDialog for PresetSaveDialog {
    async fn show_save_dialog(&self, _options: &SaveDialogOptions) -> DialogChoice {
        match &self.path {
            Some(path) => DialogChoice::Chosen(path.clone()),
            None => DialogChoice::Canceled,
        }
    }
}
