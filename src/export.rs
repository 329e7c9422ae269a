// 📄 Document Exporter - merged shopping list → paginated document
//
// Rendering goes through the `DocumentWriter` trait. Two writers exist:
// - `PdfWriter`: single-font PDF 1.4 for the download endpoint
// - `TextWriter`: plain text with form feeds between pages (CLI)
//
// Both share `PageCursor`, so the two formats paginate identically.

use std::collections::HashMap;
use std::io::Write;
use thiserror::Error;

use crate::shopping_list::MergedLine;

pub const SHOPPING_LIST_TITLE: &str = "Ingredients list";
pub const SHOPPING_LIST_FILENAME: &str = "shopping_list.pdf";
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error while writing document: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// LAYOUT
// ============================================================================

/// Fixed page geometry in PDF points (origin bottom-left)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub width: u32,
    pub height: u32,
    pub title_x: u32,
    pub title_y: u32,
    pub title_size: u32,
    pub body_x: u32,
    pub body_top: u32,
    pub body_bottom: u32,
    pub line_height: u32,
    pub body_size: u32,
}

impl Default for PageLayout {
    /// A4 portrait
    fn default() -> Self {
        PageLayout {
            width: 595,
            height: 842,
            title_x: 230,
            title_y: 770,
            title_size: 20,
            body_x: 60,
            body_top: 650,
            body_bottom: 50,
            line_height: 20,
            body_size: 12,
        }
    }
}

impl PageLayout {
    /// Body lines that fit between body_top and body_bottom (inclusive).
    /// An inverted body area still holds one line; a zero line height counts as 1pt.
    pub fn lines_per_page(&self) -> usize {
        (self.body_top.saturating_sub(self.body_bottom) / self.line_height.max(1)) as usize + 1
    }
}

/// Tracks the vertical position on the current page
#[derive(Debug, Clone)]
pub struct PageCursor {
    layout: PageLayout,
    lines_on_page: usize,
}

impl PageCursor {
    pub fn new(layout: PageLayout) -> Self {
        Self {
            layout,
            lines_on_page: 0,
        }
    }

    pub fn is_full(&self) -> bool {
        self.lines_on_page >= self.layout.lines_per_page()
    }

    /// Baseline for the next body line, advancing the cursor.
    /// Overfilling a page without `start_page` clamps at the page bottom.
    pub fn next_line_y(&mut self) -> u32 {
        let offset = u32::try_from(self.lines_on_page)
            .unwrap_or(u32::MAX)
            .saturating_mul(self.layout.line_height);
        self.lines_on_page += 1;
        self.layout.body_top.saturating_sub(offset)
    }

    pub fn start_page(&mut self) {
        self.lines_on_page = 0;
    }
}

// ============================================================================
// WRITER INTERFACE
// ============================================================================

pub trait DocumentWriter {
    /// Draw the document title at its fixed position on the current page
    fn draw_title(&mut self, text: &str) -> Result<(), ExportError>;

    /// Draw one body line below the previous one
    fn draw_line(&mut self, text: &str) -> Result<(), ExportError>;

    /// Flush the current page and start a new one if it has no room left
    fn new_page_if_needed(&mut self) -> Result<(), ExportError>;

    /// Flush the last page and return the encoded document
    fn finish(self) -> Result<Vec<u8>, ExportError>
    where
        Self: Sized;
}

/// Body line text: `"1. flour - 500 g"`
pub fn format_line(index: usize, line: &MergedLine) -> String {
    format!(
        "{}. {} - {} {}",
        index, line.name, line.total_amount, line.measurement_unit
    )
}

/// Title, then one body line per merged ingredient in order
pub fn render_shopping_list<W: DocumentWriter>(
    mut writer: W,
    lines: &[MergedLine],
) -> Result<Vec<u8>, ExportError> {
    writer.draw_title(SHOPPING_LIST_TITLE)?;

    for (i, line) in lines.iter().enumerate() {
        writer.new_page_if_needed()?;
        writer.draw_line(&format_line(i + 1, line))?;
    }

    writer.finish()
}

pub fn export_pdf(lines: &[MergedLine]) -> Result<Vec<u8>, ExportError> {
    render_shopping_list(PdfWriter::new(PageLayout::default()), lines)
}

pub fn export_text(lines: &[MergedLine]) -> Result<Vec<u8>, ExportError> {
    render_shopping_list(TextWriter::new(PageLayout::default()), lines)
}

// ============================================================================
// PDF WRITER
// ============================================================================

/// Codes one Helvetica encoding can address
const GLYPHS_PER_FONT: usize = 256;

/// WinAnsiEncoding 0x80..=0x9F; `'\0'` marks unassigned codes
const WINANSI_HIGH: [char; 32] = [
    '€', '\0', '‚', 'ƒ', '„', '…', '†', '‡', 'ˆ', '‰', 'Š', '‹', 'Œ', '\0', 'Ž', '\0',
    '\0', '‘', '’', '“', '”', '•', '–', '—', '˜', '™', 'š', '›', 'œ', '\0', 'ž', 'Ÿ',
];

/// Byte for `ch` in the base Helvetica/WinAnsi font. Control characters become spaces.
fn winansi_code(ch: char) -> Option<u8> {
    match ch {
        ' '..='~' | '\u{A0}'..='\u{FF}' => Some(ch as u32 as u8),
        c if c.is_control() => Some(b' '),
        c => WINANSI_HIGH
            .iter()
            .position(|&high| high == c)
            .map(|i| 0x80 + i as u8),
    }
}

/// Fonts of one document.
///
/// Font 0 is Helvetica with WinAnsiEncoding. Characters it cannot encode are
/// assigned, in first-seen order, to extra Helvetica fonts whose encodings name
/// the glyphs `uniXXXX` and carry a ToUnicode map, so the document keeps the
/// exact text.
#[derive(Debug, Default)]
struct FontSet {
    extra: Vec<Vec<char>>,
    slots: HashMap<char, (usize, u8)>,
}

impl FontSet {
    fn glyph(&mut self, ch: char) -> (usize, u8) {
        if let Some(code) = winansi_code(ch) {
            return (0, code);
        }
        if let Some(&slot) = self.slots.get(&ch) {
            return slot;
        }

        if self.extra.last().map_or(true, |glyphs| glyphs.len() == GLYPHS_PER_FONT) {
            self.extra.push(Vec::with_capacity(GLYPHS_PER_FONT));
        }
        let font = self.extra.len();
        let glyphs = &mut self.extra[font - 1];
        let slot = (font, glyphs.len() as u8);
        glyphs.push(ch);
        self.slots.insert(ch, slot);
        slot
    }

    /// Split text into runs of (font index, codes)
    fn encode(&mut self, text: &str) -> Vec<(usize, Vec<u8>)> {
        let mut runs: Vec<(usize, Vec<u8>)> = Vec::new();
        for ch in text.chars() {
            let (font, code) = self.glyph(ch);
            match runs.last_mut() {
                Some((current, codes)) if *current == font => codes.push(code),
                _ => runs.push((font, vec![code])),
            }
        }
        runs
    }
}

pub struct PdfWriter {
    cursor: PageCursor,
    fonts: FontSet,
    pages: Vec<Vec<u8>>,
    current: Vec<u8>,
}

impl PdfWriter {
    pub fn new(layout: PageLayout) -> Self {
        Self {
            cursor: PageCursor::new(layout),
            fonts: FontSet::default(),
            pages: Vec::new(),
            current: Vec::new(),
        }
    }

    fn text_op(&mut self, x: u32, y: u32, size: u32, text: &str) -> Result<(), ExportError> {
        let mut runs = self.fonts.encode(text);
        if runs.is_empty() {
            runs.push((0, Vec::new()));
        }

        write!(self.current, "BT {} {} Td", x, y)?;
        for (font, codes) in runs {
            write!(self.current, " /F{} {} Tf ", font + 1, size)?;
            if font == 0 {
                self.current.push(b'(');
                self.current.extend(escape_literal(&codes));
                self.current.push(b')');
            } else {
                write!(self.current, "<{}>", hex(&codes))?;
            }
            self.current.extend_from_slice(b" Tj");
        }
        self.current.extend_from_slice(b" ET\n");
        Ok(())
    }

    fn flush_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.current));
        self.cursor.start_page();
    }
}

/// PDF literal string body for already-encoded bytes
fn escape_literal(codes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(codes.len());
    for &byte in codes {
        if matches!(byte, b'(' | b')' | b'\\') {
            out.push(b'\\');
        }
        out.push(byte);
    }
    out
}

fn hex(codes: &[u8]) -> String {
    codes.iter().map(|code| format!("{:02X}", code)).collect()
}

/// Adobe glyph name for a character outside WinAnsi
fn glyph_name(ch: char) -> String {
    match ch as u32 {
        cp @ 0..=0xFFFF => format!("uni{:04X}", cp),
        cp => format!("u{:X}", cp),
    }
}

/// ToUnicode CMap: one-byte codes → UTF-16BE
fn to_unicode_cmap(glyphs: &[char]) -> Result<Vec<u8>, ExportError> {
    let mut out = Vec::new();
    write!(
        out,
        "/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n/CMapType 2 def\n\
         1 begincodespacerange\n<00> <FF>\nendcodespacerange\n"
    )?;

    // at most 100 entries per bfchar block
    for (block, chunk) in glyphs.chunks(100).enumerate() {
        writeln!(out, "{} beginbfchar", chunk.len())?;
        for (i, ch) in chunk.iter().enumerate() {
            let mut units = [0u16; 2];
            let target: String = ch
                .encode_utf16(&mut units)
                .iter()
                .map(|unit| format!("{:04X}", unit))
                .collect();
            writeln!(out, "<{:02X}> <{}>", block * 100 + i, target)?;
        }
        writeln!(out, "endbfchar")?;
    }

    write!(
        out,
        "endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n"
    )?;
    Ok(out)
}

impl DocumentWriter for PdfWriter {
    fn draw_title(&mut self, text: &str) -> Result<(), ExportError> {
        let layout = self.cursor.layout;
        self.text_op(layout.title_x, layout.title_y, layout.title_size, text)
    }

    fn draw_line(&mut self, text: &str) -> Result<(), ExportError> {
        let layout = self.cursor.layout;
        let y = self.cursor.next_line_y();
        self.text_op(layout.body_x, y, layout.body_size, text)
    }

    fn new_page_if_needed(&mut self) -> Result<(), ExportError> {
        if self.cursor.is_full() {
            self.flush_page();
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<u8>, ExportError> {
        self.flush_page();
        let layout = self.cursor.layout;

        let mut out: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = Vec::new();
        let page_count = self.pages.len();

        // 1: catalog, 2: page tree, 3: base font, then (page, content) pairs,
        // then (font, ToUnicode) pairs for the extra fonts
        let page_ids: Vec<usize> = (0..page_count).map(|i| 4 + 2 * i).collect();
        let first_extra_id = 4 + 2 * page_count;
        let extra_ids: Vec<usize> = (0..self.fonts.extra.len())
            .map(|i| first_extra_id + 2 * i)
            .collect();

        let mut font_resources = String::from("/F1 3 0 R");
        for (i, id) in extra_ids.iter().enumerate() {
            font_resources.push_str(&format!(" /F{} {} 0 R", i + 2, id));
        }

        out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

        offsets.push(out.len());
        write!(out, "1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n")?;

        offsets.push(out.len());
        let kids: Vec<String> = page_ids.iter().map(|id| format!("{} 0 R", id)).collect();
        write!(
            out,
            "2 0 obj\n<< /Type /Pages /Kids [{}] /Count {} >>\nendobj\n",
            kids.join(" "),
            page_count
        )?;

        offsets.push(out.len());
        write!(
            out,
            "3 0 obj\n<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>\nendobj\n"
        )?;

        for (page_id, content) in page_ids.iter().zip(self.pages.iter()) {
            offsets.push(out.len());
            write!(
                out,
                "{} 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] /Resources << /Font << {} >> >> /Contents {} 0 R >>\nendobj\n",
                page_id,
                layout.width,
                layout.height,
                font_resources,
                page_id + 1
            )?;

            offsets.push(out.len());
            write!(out, "{} 0 obj\n<< /Length {} >>\nstream\n", page_id + 1, content.len())?;
            out.extend_from_slice(content);
            write!(out, "\nendstream\nendobj\n")?;
        }

        for (font_id, glyphs) in extra_ids.iter().zip(self.fonts.extra.iter()) {
            let names: Vec<String> = glyphs.iter().map(|&ch| format!("/{}", glyph_name(ch))).collect();
            offsets.push(out.len());
            write!(
                out,
                "{} 0 obj\n<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding << /Type /Encoding /Differences [0 {}] >> /ToUnicode {} 0 R >>\nendobj\n",
                font_id,
                names.join(" "),
                font_id + 1
            )?;

            let cmap = to_unicode_cmap(glyphs)?;
            offsets.push(out.len());
            write!(out, "{} 0 obj\n<< /Length {} >>\nstream\n", font_id + 1, cmap.len())?;
            out.extend_from_slice(&cmap);
            write!(out, "\nendstream\nendobj\n")?;
        }

        let xref_offset = out.len();
        write!(out, "xref\n0 {}\n0000000000 65535 f \n", offsets.len() + 1)?;
        for offset in &offsets {
            write!(out, "{:010} 00000 n \n", offset)?;
        }
        write!(
            out,
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            offsets.len() + 1,
            xref_offset
        )?;

        Ok(out)
    }
}

// ============================================================================
// TEXT WRITER
// ============================================================================

pub struct TextWriter {
    cursor: PageCursor,
    out: Vec<u8>,
}

impl TextWriter {
    pub fn new(layout: PageLayout) -> Self {
        Self {
            cursor: PageCursor::new(layout),
            out: Vec::new(),
        }
    }
}

impl DocumentWriter for TextWriter {
    fn draw_title(&mut self, text: &str) -> Result<(), ExportError> {
        writeln!(self.out, "{}\n", text)?;
        Ok(())
    }

    fn draw_line(&mut self, text: &str) -> Result<(), ExportError> {
        self.cursor.next_line_y();
        writeln!(self.out, "{}", text)?;
        Ok(())
    }

    fn new_page_if_needed(&mut self) -> Result<(), ExportError> {
        if self.cursor.is_full() {
            self.out.push(b'\x0c');
            self.cursor.start_page();
        }
        Ok(())
    }

    fn finish(self) -> Result<Vec<u8>, ExportError> {
        Ok(self.out)
    }
}
