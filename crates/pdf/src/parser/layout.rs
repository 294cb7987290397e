//! Layout analysis: group text spans into lines and lines into blocks.
//!
//! The pipeline is:
//!
//! 1. Horizontal spans sharing a baseline are merged left to right into
//!    lines. A gap of [`COLUMN_GAP_FACTOR`] em or more splits the run so two
//!    columns never end up on one line.
//! 2. Every non-horizontal span is a line of its own.
//! 3. Lines are grouped into blocks: a horizontal line joins the most recent
//!    block whose last line it sits directly below.

use textorizer_core::columns::{TextBlockBox, TextLineBox};

use super::content::TextSpan;
use super::graphics::Bounds;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A line of text assembled from one or more [`TextSpan`]s.
#[derive(Debug, Clone)]
pub struct TextLine {
    pub spans: Vec<TextSpan>,
    /// Span texts joined with the inter-word spaces put back.
    pub text: String,
    pub bbox: Bounds,
    /// Baseline of the first span.
    pub y: f32,
    /// Largest font size on the line.
    pub font_size: f32,
    pub horizontal: bool,
}

impl TextLine {
    fn from_span(span: TextSpan) -> Self {
        TextLine {
            text: span.text.clone(),
            bbox: span.bbox,
            y: span.y,
            font_size: span.font_size,
            horizontal: span.is_horizontal(),
            spans: vec![span],
        }
    }

    fn push(&mut self, span: TextSpan, space: bool) {
        if space {
            self.text.push(' ');
        }
        self.text.push_str(&span.text);
        self.bbox = self.bbox.union(&span.bbox);
        self.font_size = self.font_size.max(span.font_size);
        self.spans.push(span);
    }

    pub fn to_line_box(&self) -> TextLineBox {
        TextLineBox::from_spans(
            self.bbox.to_rect(),
            self.horizontal,
            self.spans.iter().map(|s| s.text.as_str()),
        )
    }
}

/// A vertical group of consecutive [`TextLine`]s.
#[derive(Debug, Clone)]
pub struct TextBlock {
    pub lines: Vec<TextLine>,
    pub bbox: Bounds,
}

impl TextBlock {
    fn new(line: TextLine) -> Self {
        TextBlock {
            bbox: line.bbox,
            lines: vec![line],
        }
    }

    fn is_horizontal(&self) -> bool {
        self.lines.first().is_some_and(|l| l.horizontal)
    }

    pub fn to_block_box(&self) -> TextBlockBox {
        TextBlockBox {
            bbox: self.bbox.to_rect(),
            lines: self.lines.iter().map(TextLine::to_line_box).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Two spans whose baselines differ by no more than this are treated as
/// belonging to the same line.
const Y_TOLERANCE: f32 = 1.0;

/// Minimum gap (in points) between adjacent spans before we insert a space.
const MIN_WORD_GAP: f32 = 1.5;

/// A horizontal gap of this many em ends a line.
const COLUMN_GAP_FACTOR: f32 = 2.0;

/// A line more than this multiple of its font size below the previous line
/// of a block starts a new block.
const BLOCK_GAP_FACTOR: f32 = 1.4;

// ---------------------------------------------------------------------------
// CJK / spaceless-script helper
// ---------------------------------------------------------------------------

/// Returns `true` if `c` belongs to a script that does not use inter-word
/// spaces (CJK ideographs, kana, Hangul, Thai and related scripts).
pub fn is_spaceless_script_char(c: char) -> bool {
    matches!(
        c as u32,
        0x4E00..=0x9FFF     // CJK Unified Ideographs
        | 0x3400..=0x4DBF   // Extension A
        | 0x20000..=0x2A6DF // Extension B
        | 0xF900..=0xFAFF   // Compatibility Ideographs
        | 0x3040..=0x30FF   // Hiragana, Katakana
        | 0x31F0..=0x31FF
        | 0xAC00..=0xD7AF   // Hangul
        | 0x1100..=0x11FF
        | 0x3130..=0x318F
        | 0x3000..=0x303F   // CJK punctuation
        | 0xFF00..=0xFFEF   // Fullwidth forms
        | 0x0E00..=0x0EFF   // Thai, Lao
        | 0x1000..=0x109F   // Myanmar
        | 0x1780..=0x17FF   // Khmer
        | 0x0F00..=0x0FFF   // Tibetan
    )
}

fn boundary_is_spaceless(prev: &str, next: &str) -> bool {
    match (prev.chars().next_back(), next.chars().next()) {
        (Some(l), Some(f)) => is_spaceless_script_char(l) && is_spaceless_script_char(f),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Public API: span -> line grouping
// ---------------------------------------------------------------------------

/// Group spans into lines.
///
/// Horizontal lines come first, top to bottom and then left to right,
/// followed by the non-horizontal spans in content order.
pub fn group_spans_into_lines<I>(spans: I) -> Vec<TextLine>
where
    I: IntoIterator<Item = TextSpan>,
{
    let (mut horizontal, other): (Vec<TextSpan>, Vec<TextSpan>) =
        spans.into_iter().partition(TextSpan::is_horizontal);

    horizontal.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));

    let mut lines = Vec::new();
    let mut row: Vec<TextSpan> = Vec::new();

    for span in horizontal {
        if row.first().is_some_and(|first| (span.y - first.y).abs() > Y_TOLERANCE) {
            lines.extend(assemble_row(std::mem::take(&mut row)));
        }
        row.push(span);
    }
    lines.extend(assemble_row(row));

    lines.extend(other.into_iter().map(TextLine::from_span));
    lines
}

/// Build the lines of one baseline row, left to right.
fn assemble_row(mut spans: Vec<TextSpan>) -> Vec<TextLine> {
    spans.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));

    let mut lines: Vec<TextLine> = Vec::new();
    for span in spans {
        if let Some(line) = lines.last_mut() {
            let gap = span.bbox.x0 - line.bbox.x1;
            let em = line.font_size.max(span.font_size);

            if gap < COLUMN_GAP_FACTOR * em {
                let space = gap >= MIN_WORD_GAP
                    && !line.text.ends_with(' ')
                    && !span.text.starts_with(' ')
                    && !boundary_is_spaceless(&line.text, &span.text);
                line.push(span, space);
                continue;
            }
        }
        lines.push(TextLine::from_span(span));
    }
    lines
}

// ---------------------------------------------------------------------------
// Public API: line -> block grouping
// ---------------------------------------------------------------------------

/// Group lines into blocks.
///
/// Lines are taken in the order [`group_spans_into_lines`] returns them.
pub fn group_lines_into_blocks(lines: Vec<TextLine>) -> Vec<TextBlock> {
    let mut blocks: Vec<TextBlock> = Vec::new();

    for line in lines {
        if line.horizontal {
            let target = blocks.iter_mut().rev().find(|b| continues(b, &line));
            if let Some(block) = target {
                block.bbox = block.bbox.union(&line.bbox);
                block.lines.push(line);
                continue;
            }
        }
        blocks.push(TextBlock::new(line));
    }

    blocks
}

/// Whether `line` continues `block`: it overlaps the block's last line
/// horizontally and sits at most [`BLOCK_GAP_FACTOR`] em below it.
fn continues(block: &TextBlock, line: &TextLine) -> bool {
    let Some(last) = block.lines.last() else {
        return false;
    };
    if !block.is_horizontal() || !last.bbox.overlaps_x(&line.bbox) {
        return false;
    }
    let dy = line.y - last.y;
    dy > 0.0 && dy <= BLOCK_GAP_FACTOR * last.font_size.max(line.font_size)
}

/// Run the full pipeline over the spans of one page.
pub fn analyze<I>(spans: I) -> Vec<TextBlock>
where
    I: IntoIterator<Item = TextSpan>,
{
    group_lines_into_blocks(group_spans_into_lines(spans))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
