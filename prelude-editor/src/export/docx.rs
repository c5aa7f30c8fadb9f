//! DOCX renderer
//!
//! Writes a minimal WordprocessingML package: content types, the package
//! relationship and `word/document.xml`. Formatting is direct (run
//! properties), so no style part is needed.

use prelude_common::{Error, Result};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::document::{Block, ExportDocument, TakeSheet, TAKE_HEADERS};

/// Take rows on a DOCX take sheet
pub const DOCX_TAKE_ROWS: usize = 20;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_OPEN: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#;

/// A4 in twentieths of a point, one-inch margins
const SECTION: &str = r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr>"#;

const DOCUMENT_CLOSE: &str = "</w:body></w:document>";

pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            // Not allowed in XML 1.0
            c if (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r') => {}
            c => out.push(c),
        }
    }
    out
}

#[derive(Clone, Copy, Default)]
struct RunStyle {
    bold: bool,
    italic: bool,
    /// Half-points
    size: u32,
}

impl RunStyle {
    fn sized(size: u32) -> Self {
        Self { size, ..Self::default() }
    }

    fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    fn italic(mut self) -> Self {
        self.italic = true;
        self
    }
}

/// A run; embedded newlines become line breaks
fn run(text: &str, style: RunStyle) -> String {
    let mut props = String::new();
    if style.bold {
        props.push_str("<w:b/>");
    }
    if style.italic {
        props.push_str("<w:i/>");
    }
    if style.size > 0 {
        props.push_str(&format!("<w:sz w:val=\"{}\"/>", style.size));
    }

    let mut out = String::from("<w:r>");
    if !props.is_empty() {
        out.push_str(&format!("<w:rPr>{}</w:rPr>", props));
    }
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push_str("<w:br/>");
        }
        out.push_str(&format!("<w:t xml:space=\"preserve\">{}</w:t>", escape_xml(line)));
    }
    out.push_str("</w:r>");
    out
}

fn paragraph(runs: &[String], center: bool, space_after: u32) -> String {
    let mut props = format!("<w:spacing w:after=\"{}\"/>", space_after);
    if center {
        props.push_str("<w:jc w:val=\"center\"/>");
    }
    format!("<w:p><w:pPr>{}</w:pPr>{}</w:p>", props, runs.concat())
}

fn page_break() -> String {
    "<w:p><w:r><w:br w:type=\"page\"/></w:r></w:p>".to_string()
}

fn cell(text: &str, header: bool, width: u32) -> String {
    let mut style = RunStyle::sized(20);
    if header {
        style = style.bold();
    }
    let shading = if header {
        "<w:shd w:val=\"clear\" w:color=\"auto\" w:fill=\"D9D9D9\"/>"
    } else {
        ""
    };
    format!(
        "<w:tc><w:tcPr><w:tcW w:w=\"{}\" w:type=\"dxa\"/>{}</w:tcPr>{}</w:tc>",
        width,
        shading,
        paragraph(&[run(text, style)], false, 0)
    )
}

fn table(headers: &[String], rows: &[Vec<String>], widths: &[u32]) -> String {
    let border = |side: &str| format!("<w:{} w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"999999\"/>", side);
    let borders: String = ["top", "left", "bottom", "right", "insideH", "insideV"]
        .iter()
        .map(|s| border(s))
        .collect();

    let mut out = format!(
        "<w:tbl><w:tblPr><w:tblW w:w=\"5000\" w:type=\"pct\"/><w:tblBorders>{}</w:tblBorders></w:tblPr><w:tblGrid>",
        borders
    );
    for w in widths {
        out.push_str(&format!("<w:gridCol w:w=\"{}\"/>", w));
    }
    out.push_str("</w:tblGrid>");

    let row = |cells: &[String], header: bool| {
        let mut r = String::from("<w:tr>");
        if header {
            r.push_str("<w:trPr><w:tblHeader/></w:trPr>");
        }
        for (i, text) in cells.iter().enumerate() {
            r.push_str(&cell(text, header, widths.get(i).copied().unwrap_or(1000)));
        }
        r.push_str("</w:tr>");
        r
    };

    out.push_str(&row(headers, true));
    for cells in rows {
        out.push_str(&row(cells, false));
    }
    out.push_str("</w:tbl>");
    // Word needs a paragraph between adjacent tables
    out.push_str(&paragraph(&[], false, 120));
    out
}

/// Usable width in twips, split evenly
fn even_widths(columns: usize) -> Vec<u32> {
    let total = 9026u32;
    let n = columns.max(1) as u32;
    vec![total / n; columns]
}

fn take_sheet(sheet: &TakeSheet) -> String {
    let mut out = String::new();
    out.push_str(&paragraph(&[run("TAKE SHEET", RunStyle::sized(36).bold())], true, 120));
    out.push_str(&paragraph(&[run(&sheet.title, RunStyle::sized(28).bold())], true, 80));
    out.push_str(&paragraph(
        &[run(&sheet.project_name, RunStyle::sized(20).italic())],
        true,
        240,
    ));
    for (label, value) in &sheet.fields {
        out.push_str(&paragraph(
            &[
                run(&format!("{}: ", label), RunStyle::sized(20).bold()),
                run(value, RunStyle::sized(20)),
            ],
            false,
            80,
        ));
    }

    let headers: Vec<String> = TAKE_HEADERS.iter().map(|h| h.to_string()).collect();
    let rows: Vec<Vec<String>> = (1..=DOCX_TAKE_ROWS.max(sheet.min_rows))
        .map(|n| vec![n.to_string(), String::new(), String::new(), String::new()])
        .collect();
    out.push_str(&table(&headers, &rows, &[900, 1800, 1100, 5226]));
    out
}

/// `word/document.xml` body for a document
pub fn document_xml(document: &ExportDocument) -> String {
    let mut body = String::from(DOCUMENT_OPEN);

    for block in &document.blocks {
        let xml = match block {
            Block::Title(text) => paragraph(&[run(text, RunStyle::sized(40).bold())], false, 120),
            Block::Subtitle(text) => paragraph(&[run(text, RunStyle::sized(20).italic())], false, 200),
            Block::Heading(text) => paragraph(&[run(text, RunStyle::sized(32).bold())], false, 120),
            Block::Subheading(text) => paragraph(&[run(text, RunStyle::sized(26).bold())], false, 80),
            Block::Field { label, value } => paragraph(
                &[run(&format!("{}: ", label), RunStyle::default().bold()), run(value, RunStyle::default())],
                false,
                80,
            ),
            Block::Label(text) => paragraph(&[run(&format!("{}:", text), RunStyle::default().bold())], false, 40),
            Block::Paragraph(text) => paragraph(&[run(text, RunStyle::default())], false, 160),
            Block::Table { headers, rows } => table(headers, rows, &even_widths(headers.len())),
            Block::Checklist { label, items } => {
                let mut xml = paragraph(&[run(label, RunStyle::sized(24).bold())], false, 80);
                for item in items {
                    xml.push_str(&paragraph(&[run(&format!("☐  {}", item), RunStyle::sized(20))], false, 60));
                }
                xml
            }
            Block::TakeSheet(sheet) => take_sheet(sheet),
            Block::PageBreak => page_break(),
            Block::Spacer => paragraph(&[], false, 120),
        };
        body.push_str(&xml);
    }

    body.push_str(SECTION);
    body.push_str(DOCUMENT_CLOSE);
    body
}

fn zip_error(e: impl std::fmt::Display) -> Error {
    Error::Internal(format!("DOCX packaging failed: {}", e))
}

/// Render to DOCX bytes
pub fn render(document: &ExportDocument) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let parts = [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", PACKAGE_RELS.to_string()),
        ("word/document.xml", document_xml(document)),
    ];
    for (name, content) in parts {
        zip.start_file(name, options).map_err(zip_error)?;
        zip.write_all(content.as_bytes())?;
    }

    let cursor = zip.finish().map_err(zip_error)?;
    Ok(cursor.into_inner())
}
