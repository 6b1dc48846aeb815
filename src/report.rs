//! PDF report of a finished translation.
//!
//! Rendering is split in two so the interesting part is testable without
//! parsing PDF output:
//!
//! 1. [`layout`] turns the request into pages of positioned, styled lines
//!    (Markdown-ish classification, word wrap, page breaks, footers).
//! 2. [`render_pdf`] draws those pages with `printpdf` using the built-in
//!    Helvetica faces.
//!
//! The built-in PDF fonts only cover WinAnsi, so characters outside
//! Latin-1 are replaced before drawing.

use crate::error::TranslateError;
use chrono::Utc;
use printpdf::{BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, Point};
use serde::Deserialize;
use std::io::BufWriter;
use tracing::info;

/// Body of `POST /api/generate-pdf`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    #[serde(default)]
    pub translated_text: String,
    pub file_name: Option<String>,
    pub source_lang: Option<String>,
    pub target_lang: Option<String>,
    pub metadata: Option<ReportMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub model: Option<String>,
    pub word_count: Option<u64>,
}

pub const FOOTER_BRAND: &str = "Translatrix Pro - AI Document Translation";

// ── Page geometry (mm) ───────────────────────────────────────────────────

const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN: f32 = 18.0;
const BODY_BOTTOM: f32 = PAGE_H - MARGIN - 8.0;
const FOOTER_Y: f32 = PAGE_H - 10.0;
const PT_TO_MM: f32 = 0.3528;
/// Average Helvetica glyph width as a fraction of the font size.
const GLYPH_RATIO: f32 = 0.52;

/// Visual role of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Title,
    Caption,
    Section,
    Info,
    Heading1,
    Heading2,
    Heading3,
    Bold,
    TableRow,
    Body,
    Footer,
}

impl LineStyle {
    fn size_pt(self) -> f32 {
        match self {
            LineStyle::Title => 20.0,
            LineStyle::Heading1 => 16.0,
            LineStyle::Heading2 => 14.0,
            LineStyle::Section | LineStyle::Heading3 => 12.0,
            LineStyle::Caption | LineStyle::Info | LineStyle::Bold | LineStyle::Body => 10.0,
            LineStyle::TableRow => 9.0,
            LineStyle::Footer => 8.0,
        }
    }

    fn is_bold(self) -> bool {
        matches!(
            self,
            LineStyle::Title
                | LineStyle::Section
                | LineStyle::Heading1
                | LineStyle::Heading2
                | LineStyle::Heading3
                | LineStyle::Bold
        )
    }

    fn is_centered(self) -> bool {
        matches!(self, LineStyle::Title | LineStyle::Caption | LineStyle::Footer)
    }

    fn line_height_mm(self) -> f32 {
        self.size_pt() * 1.4 * PT_TO_MM
    }

    /// Extra space after headings.
    fn space_after_mm(self) -> f32 {
        match self {
            LineStyle::Heading1 | LineStyle::Heading2 | LineStyle::Heading3 => 1.5,
            LineStyle::Title => 2.0,
            _ => 0.0,
        }
    }
}

/// Classify one source line of the translation. Blank lines give `None`.
pub fn classify_line(line: &str) -> Option<(LineStyle, String)> {
    let t = line.trim();
    if t.is_empty() {
        return None;
    }
    if let Some(rest) = t.strip_prefix("### ") {
        return Some((LineStyle::Heading3, rest.trim().to_string()));
    }
    if let Some(rest) = t.strip_prefix("## ") {
        return Some((LineStyle::Heading2, rest.trim().to_string()));
    }
    if let Some(rest) = t.strip_prefix("# ") {
        return Some((LineStyle::Heading1, rest.trim().to_string()));
    }
    if t.len() > 4 && t.starts_with("**") && t.ends_with("**") {
        return Some((LineStyle::Bold, t.replace("**", "")));
    }
    if t.len() > 1 && t.starts_with('|') && t.ends_with('|') {
        let cells: Vec<&str> = t
            .split('|')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect();
        return Some((LineStyle::TableRow, cells.join(" | ")));
    }
    Some((LineStyle::Body, t.to_string()))
}

/// Greedy word wrap to `max_chars` per line; overlong words are split.
pub fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let len = word.len();
        if current_len > 0 && current_len + 1 + len > max_chars {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.extend(word);
        current_len += len;
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn chars_per_line(style: LineStyle) -> usize {
    let width_pt = (PAGE_W - 2.0 * MARGIN) / PT_TO_MM;
    (width_pt / (style.size_pt() * GLYPH_RATIO)) as usize
}

fn text_width_mm(text: &str, style: LineStyle) -> f32 {
    text.chars().count() as f32 * style.size_pt() * GLYPH_RATIO * PT_TO_MM
}

/// A line placed on a page; `y` is measured from the top edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Placed {
    pub style: LineStyle,
    pub text: String,
    pub y: f32,
}

/// One laid-out page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub lines: Vec<Placed>,
    /// Horizontal rules, as y offsets from the top edge.
    pub rules: Vec<f32>,
}

struct Cursor {
    pages: Vec<Page>,
    y: f32,
}

impl Cursor {
    fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            y: MARGIN,
        }
    }

    fn page(&mut self) -> &mut Page {
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn ensure_room(&mut self, height: f32) {
        if self.y + height > BODY_BOTTOM {
            self.pages.push(Page::default());
            self.y = MARGIN;
        }
    }

    fn push(&mut self, style: LineStyle, text: &str) {
        for line in wrap(text, chars_per_line(style)) {
            let h = style.line_height_mm();
            self.ensure_room(h);
            self.y += h;
            let y = self.y;
            self.page().lines.push(Placed {
                style,
                text: line,
                y,
            });
        }
        self.y += style.space_after_mm();
    }

    fn gap(&mut self, mm: f32) {
        self.y += mm;
    }

    fn rule(&mut self) {
        self.ensure_room(4.0);
        self.y += 2.0;
        let y = self.y;
        self.page().rules.push(y);
        self.y += 2.0;
    }
}

/// Lay the report out into pages, footers included.
pub fn layout(request: &ReportRequest, generated_at: &str) -> Vec<Page> {
    let mut c = Cursor::new();

    c.push(LineStyle::Title, "TRANSLATION REPORT");
    c.push(LineStyle::Caption, &format!("Generated: {generated_at}"));
    c.gap(5.0);

    c.push(LineStyle::Section, "Document Information");
    c.gap(1.0);
    if let Some(name) = request.file_name.as_deref().filter(|s| !s.is_empty()) {
        c.push(LineStyle::Info, &format!("Original File: {name}"));
    }
    if let (Some(src), Some(tgt)) = (&request.source_lang, &request.target_lang) {
        c.push(
            LineStyle::Info,
            &format!("Translation: {} -> {}", src.to_uppercase(), tgt.to_uppercase()),
        );
    }
    if let Some(meta) = &request.metadata {
        if let Some(model) = meta.model.as_deref().filter(|s| !s.is_empty()) {
            c.push(LineStyle::Info, &format!("AI Model: {model}"));
        }
        if let Some(words) = meta.word_count.filter(|w| *w > 0) {
            c.push(LineStyle::Info, &format!("Word Count: {words}"));
        }
    }
    c.gap(3.0);
    c.rule();
    c.gap(3.0);

    c.push(LineStyle::Section, "Translated Document");
    c.gap(2.0);

    for line in request.translated_text.lines() {
        match classify_line(line) {
            Some((style, text)) => c.push(style, &text),
            None => c.gap(1.5),
        }
    }

    let total = c.pages.len();
    for (i, page) in c.pages.iter_mut().enumerate() {
        page.lines.push(Placed {
            style: LineStyle::Footer,
            text: format!("Page {} of {} | {}", i + 1, total, FOOTER_BRAND),
            y: FOOTER_Y,
        });
    }
    c.pages
}

/// Replace characters the built-in fonts cannot encode.
fn winansi(text: &str) -> String {
    text.chars()
        .map(|ch| match ch {
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2013}' | '\u{2014}' => '-',
            '\u{2022}' => '*',
            c if (c as u32) < 0x100 => c,
            _ => '?',
        })
        .collect()
}

/// Render the report to PDF bytes.
pub fn render_pdf(request: &ReportRequest) -> Result<Vec<u8>, TranslateError> {
    if request.translated_text.trim().is_empty() {
        return Err(TranslateError::EmptyText);
    }

    let generated_at = Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();
    let pages = layout(request, &generated_at);

    let (doc, first_page, first_layer) =
        PdfDocument::new("Translation Report", Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| TranslateError::ReportFailed(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| TranslateError::ReportFailed(e.to_string()))?;

    for (i, page) in pages.iter().enumerate() {
        let layer = if i == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (p, l) = doc.add_page(Mm(PAGE_W), Mm(PAGE_H), format!("Layer {}", i + 1));
            doc.get_page(p).get_layer(l)
        };

        for placed in &page.lines {
            let font: &IndirectFontRef = if placed.style.is_bold() { &bold } else { &regular };
            let text = winansi(&placed.text);
            let x = if placed.style.is_centered() {
                ((PAGE_W - text_width_mm(&text, placed.style)) / 2.0).max(MARGIN)
            } else {
                MARGIN
            };
            layer.use_text(
                text,
                placed.style.size_pt(),
                Mm(x),
                Mm(PAGE_H - placed.y),
                font,
            );
        }

        for &y in &page.rules {
            layer.add_line(Line {
                points: vec![
                    (Point::new(Mm(MARGIN), Mm(PAGE_H - y)), false),
                    (Point::new(Mm(PAGE_W - MARGIN), Mm(PAGE_H - y)), false),
                ],
                is_closed: false,
            });
        }
    }

    let mut buffer = Vec::new();
    {
        let mut writer = BufWriter::new(&mut buffer);
        doc.save(&mut writer)
            .map_err(|e| TranslateError::ReportFailed(e.to_string()))?;
    }

    info!(
        "PDF report generated: {} pages, {:.2} KB",
        pages.len(),
        buffer.len() as f64 / 1024.0
    );
    Ok(buffer)
}

/// `translation_report_<unix millis>.pdf`
pub fn report_filename() -> String {
    format!("translation_report_{}.pdf", Utc::now().timestamp_millis())
}
