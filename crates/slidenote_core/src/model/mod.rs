//! Note-side domain model.
//!
//! # Responsibility
//! - Define the rich-text note document and its change records.
//! - Keep the editing session (document + caret) free of UI concerns.
//!
//! # Invariants
//! - The note document is owned by exactly one editing session.
//! - Every mutation is tagged with the `ChangeSource` that produced it.

pub mod editor;
pub mod note;
