//! Desktop-shell bindings for `slidenote_core`.

pub mod api;
