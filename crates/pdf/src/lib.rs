//! PDF page provider for textorizer.
//!
//! [`PdfDocument`] opens a PDF with `lopdf`, interprets every page's content
//! stream once and serves the results through
//! [`textorizer_core::PageSource`]: page rectangles, vector-path boxes,
//! image boxes, text blocks and plain text, all in page space (origin at the
//! top-left corner, y growing downwards).

use std::path::Path;

use sha2::{Digest, Sha256};
use textorizer_core::columns::TextBlockBox;
use textorizer_core::{PageSource, Rect};
use thiserror::Error;

use parser::backend::{LopdfBackend, PdfBackend};
use parser::content::{PageContent, TextSpan};
use parser::layout::TextBlock;

pub mod parser;
pub mod render;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Document is encrypted")]
    Encrypted,
    #[error("Document has no pages")]
    NoPages,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// What was painted on one page.
#[derive(Debug, Clone)]
struct Page {
    rect: Rect,
    content: PageContent,
}

/// An opened PDF document.
///
/// All pages are interpreted when the document is opened; afterwards every
/// query is answered from memory.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    name: String,
    checksum: String,
    pages: Vec<Page>,
}

impl PdfDocument {
    /// Open the PDF at `path`. The display name is the file name.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PdfError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::from_bytes(name, &bytes)
    }

    /// Parse PDF bytes.
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Result<Self, PdfError> {
        let name = name.into();
        let backend = LopdfBackend::load_bytes(bytes)?;
        let page_map = backend.pages();
        if page_map.is_empty() {
            return Err(PdfError::NoPages);
        }

        let mut pages = Vec::with_capacity(page_map.len());
        for (&page_num, &page_id) in &page_map {
            let page_box = backend.page_box(page_id)?;
            let rect = Rect::enclosing(0.0, 0.0, page_box.width(), page_box.height());

            let content = match parser::content::interpret_page(&backend, page_id) {
                Ok(content) => content,
                Err(e) => {
                    log::warn!("{name}: page {page_num} is unreadable and treated as empty: {e}");
                    PageContent::default()
                }
            };
            log::debug!(
                "{name}: page {page_num}: {} spans, {} paths, {} images",
                content.spans.len(),
                content.paths.len(),
                content.images.len()
            );

            pages.push(Page { rect, content });
        }

        Ok(PdfDocument {
            name,
            checksum: checksum(bytes),
            pages,
        })
    }

    /// Text blocks built from the spans whose centre lies inside `clip`.
    pub fn blocks(&self, page: usize, clip: &Rect) -> Vec<TextBlock> {
        let Some(p) = self.pages.get(page) else {
            return Vec::new();
        };
        let spans = p
            .content
            .spans
            .iter()
            .filter(|span| centre_in(span, clip))
            .cloned();
        parser::layout::analyze(spans)
    }
}

/// Lowercase hex SHA-256 of the raw document bytes.
pub fn checksum(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn centre_in(span: &TextSpan, clip: &Rect) -> bool {
    let (cx, cy) = span.bbox.center();
    cx >= clip.x0 as f32 && cx < clip.x1 as f32 && cy >= clip.y0 as f32 && cy < clip.y1 as f32
}

fn rects(bounds: &[parser::graphics::Bounds]) -> Vec<Rect> {
    bounds
        .iter()
        .map(|b| b.to_rect())
        .filter(|r| !r.is_empty())
        .collect()
}

impl PageSource for PdfDocument {
    fn name(&self) -> &str {
        &self.name
    }

    fn checksum(&self) -> &str {
        &self.checksum
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_rect(&self, page: usize) -> Rect {
        self.pages.get(page).map_or(Rect::EMPTY, |p| p.rect)
    }

    fn drawings(&self, page: usize) -> Vec<Rect> {
        self.pages
            .get(page)
            .map(|p| rects(&p.content.paths))
            .unwrap_or_default()
    }

    fn image_rects(&self, page: usize) -> Vec<Rect> {
        self.pages
            .get(page)
            .map(|p| rects(&p.content.images))
            .unwrap_or_default()
    }

    fn text_blocks(&self, page: usize, clip: &Rect) -> Vec<TextBlockBox> {
        self.blocks(page, clip)
            .iter()
            .map(TextBlock::to_block_box)
            .collect()
    }

    fn text(&self, page: usize, clip: &Rect) -> String {
        render::text::render_blocks(&self.blocks(page, clip))
    }
}
