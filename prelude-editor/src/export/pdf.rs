//! PDF renderer
//!
//! Lays an [`ExportDocument`] out on A4 pages with the standard Courier
//! faces, so text widths are known without font metrics.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};
use prelude_common::{Error, Result};

use super::document::{Block, ExportDocument, TakeSheet, TAKE_HEADERS};

pub const PAGE_WIDTH: i64 = 595;
pub const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 40;
const CONTENT_WIDTH: i64 = PAGE_WIDTH - 2 * MARGIN;
const BOTTOM: i64 = PAGE_HEIGHT - MARGIN;

const BODY_SIZE: i64 = 10;
const TABLE_SIZE: i64 = 9;
const CELL_PADDING: i64 = 3;
const TAKE_ROW_HEIGHT: i64 = 22;
const MIN_TAKE_ROW_HEIGHT: i64 = 12;
const TAKE_COLUMNS: [i64; 3] = [50, 90, 60];

#[derive(Debug, Clone, Copy)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

/// Courier advances 0.6 em per glyph
fn text_width(chars: usize, size: i64) -> i64 {
    chars as i64 * size * 6 / 10
}

fn chars_per_line(width: i64, size: i64) -> usize {
    (width * 10 / (size * 6)).max(1) as usize
}

/// Encode for WinAnsiEncoding; unmappable characters become `?`
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '…' => 0x85,
            '\t' => b' ',
            c if (c as u32) >= 0x20 && (c as u32) < 0x7f => c as u8,
            c if (c as u32) >= 0xa0 && (c as u32) <= 0xff => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

/// Word-wrap to at most `width` characters per line
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for raw in text.split('\n') {
        let mut line = String::new();
        for word in raw.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            let line_len = line.chars().count();
            if line_len > 0 && line_len + 1 + word.len() > width {
                lines.push(std::mem::take(&mut line));
            }
            while word.len() > width {
                let rest = word.split_off(width);
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                lines.push(word.iter().collect());
                word = rest;
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.extend(word);
        }
        lines.push(line);
    }
    lines
}

/// Take-grid rows and row height for the space left on a page
///
/// Rows fill the page at the normal height; when fewer than `min_rows` fit,
/// rows shrink down to a floor and spill onto the next page past that.
pub fn take_grid_rows(available: i64, min_rows: usize) -> (usize, i64) {
    let fitting = (available / TAKE_ROW_HEIGHT).max(0) as usize;
    if fitting >= min_rows {
        return (fitting, TAKE_ROW_HEIGHT);
    }
    let squeezed = (available / min_rows.max(1) as i64).max(MIN_TAKE_ROW_HEIGHT);
    (min_rows, squeezed.min(TAKE_ROW_HEIGHT))
}

/// Accumulates content-stream operations page by page
struct PageWriter {
    done: Vec<Vec<Operation>>,
    current: Vec<Operation>,
    /// Distance from the top edge
    y: i64,
}

impl PageWriter {
    fn new() -> Self {
        Self {
            done: Vec::new(),
            current: Vec::new(),
            y: MARGIN,
        }
    }

    fn new_page(&mut self) {
        if self.current.is_empty() {
            self.y = MARGIN;
            return;
        }
        self.done.push(std::mem::take(&mut self.current));
        self.y = MARGIN;
    }

    fn ensure(&mut self, height: i64) {
        if self.y + height > BOTTOM {
            self.new_page();
        }
    }

    fn text_at(&mut self, x: i64, baseline: i64, font: Font, size: i64, text: &str) {
        self.current.push(Operation::new("BT", vec![]));
        self.current.push(Operation::new(
            "Tf",
            vec![Object::Name(font.resource().as_bytes().to_vec()), Object::Integer(size)],
        ));
        self.current.push(Operation::new(
            "Td",
            vec![Object::Integer(x), Object::Integer(PAGE_HEIGHT - baseline)],
        ));
        self.current.push(Operation::new(
            "Tj",
            vec![Object::String(win_ansi(text), StringFormat::Literal)],
        ));
        self.current.push(Operation::new("ET", vec![]));
    }

    fn rect(&mut self, x: i64, top: i64, width: i64, height: i64) {
        self.current.push(Operation::new(
            "re",
            vec![
                Object::Integer(x),
                Object::Integer(PAGE_HEIGHT - top - height),
                Object::Integer(width),
                Object::Integer(height),
            ],
        ));
        self.current.push(Operation::new("S", vec![]));
    }

    fn rule(&mut self, top: i64) {
        self.current.push(Operation::new(
            "m",
            vec![Object::Integer(MARGIN), Object::Integer(PAGE_HEIGHT - top)],
        ));
        self.current.push(Operation::new(
            "l",
            vec![Object::Integer(PAGE_WIDTH - MARGIN), Object::Integer(PAGE_HEIGHT - top)],
        ));
        self.current.push(Operation::new("S", vec![]));
    }

    /// One line of text advancing the cursor
    fn line(&mut self, x: i64, font: Font, size: i64, text: &str) {
        let leading = size + size / 5;
        self.ensure(leading);
        self.y += leading;
        self.text_at(x, self.y, font, size, text);
    }

    fn centered(&mut self, font: Font, size: i64, text: &str) {
        let width = text_width(text.chars().count(), size);
        let x = ((PAGE_WIDTH - width) / 2).max(MARGIN);
        self.line(x, font, size, text);
    }

    fn paragraph(&mut self, text: &str) {
        for line in wrap(text, chars_per_line(CONTENT_WIDTH, BODY_SIZE)) {
            self.line(MARGIN, Font::Regular, BODY_SIZE, &line);
        }
        self.y += 4;
    }

    fn field(&mut self, label: &str, value: &str) {
        let label = format!("{}: ", label);
        let label_width = text_width(label.chars().count(), BODY_SIZE);
        let lines = wrap(value, chars_per_line(CONTENT_WIDTH - label_width, BODY_SIZE));
        for (i, line) in lines.iter().enumerate() {
            self.line(MARGIN + label_width, Font::Regular, BODY_SIZE, line);
            if i == 0 {
                self.text_at(MARGIN, self.y, Font::Bold, BODY_SIZE, &label);
            }
        }
        self.y += 2;
    }

    fn wrap_cells(widths: &[i64], cells: &[String]) -> Vec<Vec<String>> {
        widths
            .iter()
            .zip(cells)
            .map(|(w, cell)| wrap(cell, chars_per_line(w - 2 * CELL_PADDING, TABLE_SIZE)))
            .collect()
    }

    fn row_height(wrapped: &[Vec<String>], min_height: i64) -> i64 {
        let line_count = wrapped.iter().map(Vec::len).max().unwrap_or(1) as i64;
        (line_count * (TABLE_SIZE + 2) + 2 * CELL_PADDING).max(min_height)
    }

    /// One bordered table row at the cursor
    fn row(&mut self, widths: &[i64], wrapped: &[Vec<String>], font: Font, height: i64) {
        let leading = TABLE_SIZE + 2;
        let mut x = MARGIN;
        for (width, lines) in widths.iter().zip(wrapped) {
            self.rect(x, self.y, *width, height);
            for (i, line) in lines.iter().enumerate() {
                let baseline = self.y + CELL_PADDING + (i as i64 + 1) * leading - 2;
                self.text_at(x + CELL_PADDING, baseline, font, TABLE_SIZE, line);
            }
            x += width;
        }
        self.y += height;
    }

    fn table(&mut self, widths: &[i64], headers: &[String], rows: &[Vec<String>], min_height: i64) {
        let header = Self::wrap_cells(widths, headers);
        let header_height = Self::row_height(&header, 0);

        self.ensure(header_height + min_height.max(TABLE_SIZE + 2 + 2 * CELL_PADDING));
        self.row(widths, &header, Font::Bold, header_height);

        for cells in rows {
            let wrapped = Self::wrap_cells(widths, cells);
            let height = Self::row_height(&wrapped, min_height);
            if self.y + height > BOTTOM {
                // Repeat the header on the continuation page
                self.new_page();
                self.row(widths, &header, Font::Bold, header_height);
            }
            self.row(widths, &wrapped, Font::Regular, height);
        }
        self.y += 10;
    }

    fn take_sheet(&mut self, sheet: &TakeSheet) {
        self.centered(Font::Bold, 18, "TAKE SHEET");
        self.y += 6;
        self.centered(Font::Bold, 14, &sheet.title);
        self.y += 4;
        self.centered(Font::Regular, BODY_SIZE, &sheet.project_name);
        self.y += 10;
        for (label, value) in &sheet.fields {
            self.field(label, value);
        }
        self.y += 6;

        let header_height = TABLE_SIZE + 2 + 2 * CELL_PADDING;
        let available = BOTTOM - self.y - header_height;
        let (rows, height) = take_grid_rows(available, sheet.min_rows);

        let notes_width = CONTENT_WIDTH - TAKE_COLUMNS.iter().sum::<i64>();
        let widths = [TAKE_COLUMNS[0], TAKE_COLUMNS[1], TAKE_COLUMNS[2], notes_width];
        let headers: Vec<String> = TAKE_HEADERS.iter().map(|h| h.to_string()).collect();
        let body: Vec<Vec<String>> = (1..=rows)
            .map(|n| vec![n.to_string(), String::new(), String::new(), String::new()])
            .collect();
        self.table(&widths, &headers, &body, height);
    }

    fn finish(mut self) -> Vec<Vec<Operation>> {
        if !self.current.is_empty() || self.done.is_empty() {
            self.done.push(self.current);
        }
        self.done
    }
}

/// Content-stream operations per page
fn layout(document: &ExportDocument) -> Vec<Vec<Operation>> {
    let mut w = PageWriter::new();

    for block in &document.blocks {
        match block {
            Block::Title(text) => {
                w.ensure(60);
                w.line(MARGIN, Font::Bold, 18, text);
                w.y += 8;
            }
            Block::Subtitle(text) => {
                for line in wrap(text, chars_per_line(CONTENT_WIDTH, BODY_SIZE)) {
                    w.line(MARGIN, Font::Regular, BODY_SIZE, &line);
                }
                w.y += 6;
            }
            Block::Heading(text) => {
                // Keep a heading with at least two following lines
                w.ensure(60);
                w.y += 6;
                w.line(MARGIN, Font::Bold, 13, text);
                w.y += 4;
                let top = w.y;
                w.rule(top);
                w.y += 6;
            }
            Block::Subheading(text) => {
                w.ensure(48);
                w.y += 4;
                w.line(MARGIN, Font::Bold, 11, text);
                w.y += 2;
            }
            Block::Field { label, value } => w.field(label, value),
            Block::Label(text) => w.line(MARGIN, Font::Bold, BODY_SIZE, &format!("{}:", text)),
            Block::Paragraph(text) => w.paragraph(text),
            Block::Table { headers, rows } => {
                let columns = headers.len().max(1) as i64;
                let widths = vec![CONTENT_WIDTH / columns; headers.len()];
                w.table(&widths, headers, rows, 0);
            }
            Block::Checklist { label, items } => {
                w.ensure(40);
                w.line(MARGIN, Font::Bold, 11, label);
                w.y += 2;
                for item in items {
                    w.ensure(16);
                    w.y += 14;
                    let top = w.y - 9;
                    w.rect(MARGIN, top, 9, 9);
                    let baseline = w.y;
                    w.text_at(MARGIN + 16, baseline, Font::Regular, BODY_SIZE, item);
                }
                w.y += 8;
            }
            Block::TakeSheet(sheet) => w.take_sheet(sheet),
            Block::PageBreak => w.new_page(),
            Block::Spacer => w.y += 8,
        }
    }

    w.finish()
}

fn pdf_error(e: impl std::fmt::Display) -> Error {
    Error::Internal(format!("PDF generation failed: {}", e))
}

/// Render to PDF bytes
pub fn render(document: &ExportDocument) -> Result<Vec<u8>> {
    let pages = layout(document);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations };
        let stream = Stream::new(dictionary! {}, content.encode().map_err(pdf_error)?);
        let content_id = doc.add_object(stream);
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let media_box: Vec<Object> = [0, 0, PAGE_WIDTH, PAGE_HEIGHT]
        .into_iter()
        .map(Object::Integer)
        .collect();
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => media_box,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).map_err(pdf_error)?;
    Ok(bytes)
}
