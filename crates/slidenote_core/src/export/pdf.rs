//! Page-formatted PDF composition with `lopdf`.
//!
//! Lays blocks out top to bottom with fixed Helvetica metrics, wrapping at an
//! estimated character width. A page-break block always starts a new page;
//! overflowing text does too.
//!
//! Text is encoded with the fonts' WinAnsi table. Characters outside it fail
//! the export with `ExportError::UnsupportedCharacter` rather than being
//! dropped.

use super::{ExportError, PrintOptions};
use crate::model::note::{NoteBlock, TextRun};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Encoding, Object, ObjectId, Stream};

const FONT_SIZE_PT: i64 = 11;
const LEADING_PT: i64 = 15;
/// Average Helvetica glyph width as a fraction of the font size.
const AVG_GLYPH_WIDTH: f64 = 0.5;

/// One wrapped output line: text segments sharing the baseline.
type Line = Vec<(String, bool)>;

/// Composes `blocks` into a complete PDF file.
pub fn compose_pdf(blocks: &[NoteBlock], options: &PrintOptions) -> Result<Vec<u8>, ExportError> {
    let (page_width, page_height) = options.page_size_pt();
    let margin = options.margin_pt();
    let wrap = (((page_width - 2 * margin) as f64) / (FONT_SIZE_PT as f64 * AVG_GLYPH_WIDTH))
        .floor()
        .max(1.0) as usize;

    let mut doc = Document::with_version("1.5");
    let regular = text_font("Helvetica");
    let bold = text_font("Helvetica-Bold");
    let encoding = regular
        .get_font_encoding(&doc)
        .map_err(|err| ExportError::Compose(err.to_string()))?;

    let mut pages: Vec<Vec<Operation>> = Vec::new();
    let mut ops = page_prelude(options, page_width, page_height);
    let mut page_has_text = false;
    let mut y = page_height - margin - FONT_SIZE_PT;

    for block in blocks {
        match block {
            NoteBlock::PageBreak => {
                pages.push(std::mem::replace(
                    &mut ops,
                    page_prelude(options, page_width, page_height),
                ));
                page_has_text = false;
                y = page_height - margin - FONT_SIZE_PT;
            }
            NoteBlock::Paragraph(runs) => {
                for line in wrap_runs(runs, wrap) {
                    if y < margin {
                        pages.push(std::mem::replace(
                            &mut ops,
                            page_prelude(options, page_width, page_height),
                        ));
                        page_has_text = false;
                        y = page_height - margin - FONT_SIZE_PT;
                    }
                    if !line.is_empty() {
                        push_line(&mut ops, &line, margin, y, &encoding)?;
                        page_has_text = true;
                    }
                    y -= LEADING_PT;
                }
            }
        }
    }
    if page_has_text || pages.is_empty() {
        pages.push(ops);
    }

    let fonts = (doc.add_object(regular.clone()), doc.add_object(bold));
    build_document(doc, fonts, pages, page_width, page_height)
}

fn text_font(base_font: &str) -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
        "Encoding" => "WinAnsiEncoding",
    }
}

fn page_prelude(options: &PrintOptions, width: i64, height: i64) -> Vec<Operation> {
    if !options.print_background {
        return Vec::new();
    }
    vec![
        Operation::new("q", vec![]),
        Operation::new("g", vec![Object::Integer(1)]),
        Operation::new(
            "re",
            vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(width),
                Object::Integer(height),
            ],
        ),
        Operation::new("f", vec![]),
        Operation::new("Q", vec![]),
    ]
}

fn push_line(
    ops: &mut Vec<Operation>,
    line: &Line,
    x: i64,
    y: i64,
    encoding: &Encoding,
) -> Result<(), ExportError> {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("g", vec![Object::Integer(0)]));
    ops.push(Operation::new(
        "Td",
        vec![Object::Integer(x), Object::Integer(y)],
    ));
    for (text, bold) in line {
        let font = if *bold { "F2" } else { "F1" };
        ops.push(Operation::new(
            "Tf",
            vec![font.into(), Object::Integer(FONT_SIZE_PT)],
        ));
        ops.push(Operation::new(
            "Tj",
            vec![Object::string_literal(encode_text(encoding, text)?)],
        ));
    }
    ops.push(Operation::new("ET", vec![]));
    Ok(())
}

/// Greedy character wrap that keeps run boundaries inside a line.
fn wrap_runs(runs: &[TextRun], width: usize) -> Vec<Line> {
    let mut lines: Vec<Line> = Vec::new();
    let mut line: Line = Vec::new();
    let mut column = 0;

    for run in runs {
        let mut segment = String::new();
        for ch in run.text.chars() {
            if column == width {
                if !segment.is_empty() {
                    line.push((std::mem::take(&mut segment), run.bold));
                }
                lines.push(std::mem::take(&mut line));
                column = 0;
            }
            segment.push(ch);
            column += 1;
        }
        if !segment.is_empty() {
            line.push((segment, run.bold));
        }
    }
    lines.push(line);
    lines
}

/// One byte per character; tabs print as spaces.
fn encode_text(encoding: &Encoding, text: &str) -> Result<Vec<u8>, ExportError> {
    let mut bytes = Vec::with_capacity(text.len());
    let mut buf = [0u8; 4];
    for ch in text.chars() {
        let ch = if ch == '\t' { ' ' } else { ch };
        match Document::encode_text(encoding, ch.encode_utf8(&mut buf)).as_slice() {
            [byte] => bytes.push(*byte),
            _ => return Err(ExportError::UnsupportedCharacter(ch)),
        }
    }
    Ok(bytes)
}

fn build_document(
    mut doc: Document,
    (regular_id, bold_id): (ObjectId, ObjectId),
    pages: Vec<Vec<Operation>>,
    width: i64,
    height: i64,
) -> Result<Vec<u8>, ExportError> {
    let pages_id = doc.new_object_id();
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
        },
    });

    let mut kids = Vec::with_capacity(pages.len());
    for operations in pages {
        let encoded = Content { operations }
            .encode()
            .map_err(|err| ExportError::Compose(err.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(width),
                Object::Integer(height),
            ],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|err| ExportError::Compose(err.to_string()))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::{compose_pdf, wrap_runs};
    use crate::export::{ExportError, PrintOptions};
    use crate::model::note::{NoteBlock, TextRun};

    fn paragraph(text: &str) -> NoteBlock {
        NoteBlock::Paragraph(vec![TextRun {
            text: text.to_string(),
            bold: false,
        }])
    }

    fn page_count(bytes: &[u8]) -> usize {
        lopdf::Document::load_mem(bytes)
            .expect("composed pdf should parse")
            .get_pages()
            .len()
    }

    #[test]
    fn wrap_splits_long_runs_and_keeps_formatting() {
        let runs = vec![
            TextRun {
                text: "abc".to_string(),
                bold: true,
            },
            TextRun {
                text: "defg".to_string(),
                bold: false,
            },
        ];
        let lines = wrap_runs(&runs, 5);
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            vec![("abc".to_string(), true), ("de".to_string(), false)]
        );
        assert_eq!(lines[1], vec![("fg".to_string(), false)]);
    }

    #[test]
    fn page_break_blocks_start_new_pages() {
        let blocks = vec![
            paragraph("one"),
            NoteBlock::PageBreak,
            paragraph("two"),
            NoteBlock::PageBreak,
            NoteBlock::Paragraph(Vec::new()),
        ];
        let bytes = compose_pdf(&blocks, &PrintOptions::default()).expect("compose");
        assert!(bytes.starts_with(b"%PDF-1.5"));
        assert_eq!(page_count(&bytes), 2);
    }

    #[test]
    fn overflowing_text_spills_onto_next_page() {
        let blocks = (0..120).map(|i| paragraph(&format!("line {i}"))).collect::<Vec<_>>();
        let bytes = compose_pdf(&blocks, &PrintOptions::default()).expect("compose");
        assert!(page_count(&bytes) >= 2);
    }

    #[test]
    fn win_ansi_punctuation_survives_into_page_text() {
        let text = "Café “quote” €5 — ok";
        let bytes = compose_pdf(&[paragraph(text)], &PrintOptions::default()).expect("compose");
        let extracted = lopdf::Document::load_mem(&bytes)
            .expect("composed pdf should parse")
            .extract_text(&[1])
            .expect("extract");
        assert_eq!(extracted.trim_end(), text);
    }

    #[test]
    fn characters_outside_the_font_fail_instead_of_degrading() {
        let err = compose_pdf(&[paragraph("会議メモ")], &PrintOptions::default())
            .expect_err("cjk text has no glyphs in the base fonts");
        assert!(matches!(err, ExportError::UnsupportedCharacter('会')));
        assert!(err.to_string().contains("U+4F1A"));
    }

    #[test]
    fn empty_input_still_yields_one_page() {
        let bytes = compose_pdf(&[], &PrintOptions::default()).expect("compose");
        assert_eq!(page_count(&bytes), 1);
    }
}
