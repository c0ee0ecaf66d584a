//! Editor markup serialization.
//!
//! # Responsibility
//! - Serialize the note document to the editor's HTML markup.
//! - Parse that markup (plus view headings) back into blocks for printing.
//!
//! # Invariants
//! - Text is HTML-escaped on the way out and unescaped on the way in.
//! - Page breaks round-trip through `PAGE_BREAK_MARKUP`.

use crate::model::note::{NoteBlock, NoteDocument, TextRun};
use once_cell::sync::Lazy;
use regex::Regex;

pub const PAGE_BREAK_MARKUP: &str =
    r#"<div class="page-break-container" contenteditable="false"><hr class="page-break"></div>"#;

static BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?s)<(p|h1|h2|h3)>(.*?)</(?:p|h1|h2|h3)>|<div class="page-break-container"[^>]*>.*?</div>"#,
    )
    .expect("valid block regex")
});
static STRONG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<strong>(.*?)</strong>").expect("valid strong regex"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

/// Serializes the document to paragraph markup.
pub fn document_markup(doc: &NoteDocument) -> String {
    blocks_markup(&doc.blocks())
}

pub fn blocks_markup(blocks: &[NoteBlock]) -> String {
    let mut out = String::new();
    for block in blocks {
        match block {
            NoteBlock::PageBreak => out.push_str(PAGE_BREAK_MARKUP),
            NoteBlock::Paragraph(runs) if runs.is_empty() => out.push_str("<p><br></p>"),
            NoteBlock::Paragraph(runs) => {
                out.push_str("<p>");
                for run in runs {
                    if run.bold {
                        out.push_str("<strong>");
                        out.push_str(&escape(&run.text));
                        out.push_str("</strong>");
                    } else {
                        out.push_str(&escape(&run.text));
                    }
                }
                out.push_str("</p>");
            }
        }
    }
    out
}

/// Parses paragraph markup into blocks.
///
/// Headings (`h1`-`h3`) become bold paragraphs; content outside recognized
/// blocks is ignored.
pub fn parse_markup(markup: &str) -> Vec<NoteBlock> {
    BLOCK_RE
        .captures_iter(markup)
        .map(|caps| match (caps.get(1), caps.get(2)) {
            (Some(tag), Some(inner)) => {
                let heading = tag.as_str() != "p";
                NoteBlock::Paragraph(parse_runs(inner.as_str(), heading))
            }
            _ => NoteBlock::PageBreak,
        })
        .collect()
}

fn parse_runs(inner: &str, force_bold: bool) -> Vec<TextRun> {
    let mut runs = Vec::new();
    let mut cursor = 0;
    for caps in STRONG_RE.captures_iter(inner) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        push_run(&mut runs, &inner[cursor..whole.start()], force_bold);
        if let Some(bold) = caps.get(1) {
            push_run(&mut runs, bold.as_str(), true);
        }
        cursor = whole.end();
    }
    push_run(&mut runs, &inner[cursor..], force_bold);
    runs
}

fn push_run(runs: &mut Vec<TextRun>, fragment: &str, bold: bool) {
    let text = unescape(&TAG_RE.replace_all(fragment, ""));
    if text.is_empty() {
        return;
    }
    match runs.last_mut() {
        Some(run) if run.bold == bold => run.text.push_str(&text),
        _ => runs.push(TextRun { text, bold }),
    }
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::{document_markup, parse_markup, PAGE_BREAK_MARKUP};
    use crate::model::note::{ChangeSource, NoteBlock, NoteDocument, TextFormat, TextRun};

    #[test]
    fn serializes_bold_runs_breaks_and_empty_lines() {
        let mut doc = NoteDocument::new();
        doc.insert_text(0, "Slide 1\n", TextFormat::BOLD, ChangeSource::Api);
        let end = doc.end_offset();
        doc.insert_page_break(end, ChangeSource::Api);

        let markup = document_markup(&doc);
        assert_eq!(
            markup,
            format!("<p><strong>Slide 1</strong></p>{PAGE_BREAK_MARKUP}<p><br></p>")
        );
    }

    #[test]
    fn escapes_markup_characters() {
        let mut doc = NoteDocument::new();
        doc.insert_text(0, "a<b & c", TextFormat::PLAIN, ChangeSource::User);
        assert!(document_markup(&doc).starts_with("<p>a&lt;b &amp; c</p>"));
    }

    #[test]
    fn parses_mixed_runs_and_headings() {
        let blocks = parse_markup(&format!(
            "<h3>Page 1</h3><p>x <strong>y</strong> &amp; z</p>{PAGE_BREAK_MARKUP}<p><br></p>"
        ));
        assert_eq!(
            blocks,
            vec![
                NoteBlock::Paragraph(vec![TextRun {
                    text: "Page 1".to_string(),
                    bold: true,
                }]),
                NoteBlock::Paragraph(vec![
                    TextRun {
                        text: "x ".to_string(),
                        bold: false,
                    },
                    TextRun {
                        text: "y".to_string(),
                        bold: true,
                    },
                    TextRun {
                        text: " & z".to_string(),
                        bold: false,
                    },
                ]),
                NoteBlock::PageBreak,
                NoteBlock::Paragraph(Vec::new()),
            ]
        );
    }
}
