use slidenote_core::layout::{CaretBounds, LineLayout, NoteLayout};
use slidenote_core::pagination::SkipReason;
use slidenote_core::{NoteDocument, NoteSession, PaginationOutcome, SessionConfig};

fn tight_config() -> SessionConfig {
    SessionConfig {
        page_height_px: 100.0,
        line_height_px: 10.0,
        chars_per_line: 20,
        top_padding_px: 0.0,
        ..SessionConfig::default()
    }
}

struct Detached;

impl NoteLayout for Detached {
    fn content_height(&self, _doc: &NoteDocument) -> Option<f64> {
        None
    }

    fn caret_bounds(&self, _doc: &NoteDocument, _offset: usize) -> Option<CaretBounds> {
        None
    }
}

#[test]
fn markers_catch_up_with_height_one_event_at_a_time() {
    let config = tight_config();
    let layout = LineLayout::from_config(&config);
    let mut session = NoteSession::new(config.clone());

    for _ in 0..60 {
        let end = session.document().end_offset();
        session.type_text(end, "a line of notes\n");

        let height = layout
            .content_height(session.document())
            .expect("line layout always measures");
        let breaks = session.document().page_break_count() as f64;
        // At most one page of lag per event.
        assert!(height <= (breaks + 1.0) * config.page_height_px);
    }
    assert!(session.document().page_break_count() >= 5);
}

#[test]
fn large_paste_inserts_a_single_marker_then_later_edits_catch_up() {
    let mut session = NoteSession::new(tight_config());
    let paste = "x\n".repeat(35);

    let outcomes = session.type_text(0, &paste);
    assert_eq!(outcomes.iter().filter(|o| o.inserted()).count(), 1);
    assert_eq!(session.document().page_break_count(), 1);

    session.type_text(0, "y");
    assert_eq!(session.document().page_break_count(), 2);
    session.type_text(0, "y");
    assert_eq!(session.document().page_break_count(), 3);
    let outcomes = session.type_text(0, "y");
    assert!(matches!(
        outcomes.as_slice(),
        [PaginationOutcome::WithinPages { .. }]
    ));
}

#[test]
fn inserted_marker_sits_before_the_end_and_caret_follows_it() {
    let mut session = NoteSession::new(tight_config());
    let outcomes = session.type_text(0, &"z\n".repeat(11));

    let Some(PaginationOutcome::Inserted { offset, after_page }) = outcomes.first().copied() else {
        panic!("expected a page break, got {outcomes:?}");
    };
    assert_eq!(after_page, 1);
    assert_eq!(offset, session.document().end_offset() - 1);
    assert!(session.document().unit_at(offset).expect("marker").is_page_break());
    assert_eq!(session.editor().selection().index, offset + 1);
}

#[test]
fn unmeasurable_surface_is_a_no_op() {
    let mut session = NoteSession::with_layout(tight_config(), Detached);
    let outcomes = session.type_text(0, &"q\n".repeat(50));
    assert_eq!(
        outcomes,
        vec![PaginationOutcome::Skipped(SkipReason::Unmeasurable)]
    );
    assert_eq!(session.document().page_break_count(), 0);
}
