//! Content-stream interpretation.
//!
//! Walks a page's operators with a simplified graphics and text state and
//! records three kinds of marks, all in page space:
//!
//! - text spans with their approximate glyph boxes and writing direction,
//! - bounding boxes of painted vector paths,
//! - placement boxes of images.
//!
//! Glyph metrics are not read from the fonts. Every character is assumed
//! [`APPROX_CHAR_WIDTH_RATIO`] em wide, with an ascent of [`ASCENT`] and a
//! descent of [`DESCENT`] em.

use super::backend::{
    get_number_from_value, numbers, ContentOp, PageBox, PageId, PdfBackend, PdfValue, XObject,
};
use super::graphics::{Bounds, Matrix, PathBuilder};
use crate::PdfError;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A run of text shown by one text operator.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    /// Approximate glyph box.
    pub bbox: Bounds,
    /// Baseline start.
    pub x: f32,
    pub y: f32,
    /// Rendered font size.
    pub font_size: f32,
    /// Unit writing direction.
    pub dir: (f32, f32),
}

impl TextSpan {
    /// Left to right, not rotated.
    pub fn is_horizontal(&self) -> bool {
        let (dx, dy) = self.dir;
        dx > 0.0 && dy.abs() <= 1e-3 * dx
    }
}

/// Everything painted on one page.
#[derive(Debug, Clone, Default)]
pub struct PageContent {
    pub spans: Vec<TextSpan>,
    pub paths: Vec<Bounds>,
    pub images: Vec<Bounds>,
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Approximate character width as a fraction of font size.
pub const APPROX_CHAR_WIDTH_RATIO: f32 = 0.5;

/// Glyph ascent above the baseline, in em.
pub const ASCENT: f32 = 0.8;

/// Glyph descent below the baseline, in em.
pub const DESCENT: f32 = 0.2;

/// Form XObjects nested deeper than this are skipped.
const MAX_FORM_DEPTH: usize = 8;

// ---------------------------------------------------------------------------
// Internal: text state machine
// ---------------------------------------------------------------------------

/// Mutable text state tracked while walking a content stream.
#[derive(Debug, Clone)]
struct TextState {
    /// Current font resource name (the `/F1`-style key).
    font_key: Vec<u8>,
    /// Font size in text-space units.
    font_size: f32,
    text_matrix: Matrix,
    /// Set by BT and updated by Td/TD/T*/Tm.
    line_matrix: Matrix,
    /// Horizontal scaling factor (percent / 100).
    horiz_scale: f32,
    char_spacing: f32,
    word_spacing: f32,
    text_rise: f32,
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_key: Vec::new(),
            font_size: 0.0,
            text_matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            horiz_scale: 1.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            text_rise: 0.0,
            leading: 0.0,
        }
    }
}

impl TextState {
    /// Advance the text matrix horizontally by `dx` text-space units.
    fn advance_x(&mut self, dx: f32) {
        self.text_matrix = Matrix::translate(dx, 0.0).then(&self.text_matrix);
    }

    /// Multiply the text line matrix by a translation (used by Td / TD).
    fn translate_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translate(tx, ty).then(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.translate_line(0.0, -self.leading);
    }

    /// Text-space advance of one character.
    fn char_advance(&self, ch: char) -> f32 {
        let mut w = self.font_size * APPROX_CHAR_WIDTH_RATIO + self.char_spacing;
        if ch == ' ' {
            w += self.word_spacing;
        }
        w * self.horiz_scale
    }

    fn text_advance(&self, text: &str) -> f32 {
        text.chars().map(|ch| self.char_advance(ch)).sum()
    }
}

/// Interpreter state for one content stream and the forms it invokes.
struct Interpreter<'a> {
    backend: &'a dyn PdfBackend,
    page_id: PageId,
    ctm: Matrix,
    stack: Vec<Matrix>,
    text: TextState,
    path: PathBuilder,
    out: PageContent,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Matrix taking PDF user space to page space: origin at the top-left
/// corner of the MediaBox, y growing downwards.
pub fn page_space(page_box: &PageBox) -> Matrix {
    Matrix([1.0, 0.0, 0.0, -1.0, -page_box.llx, page_box.ury])
}

/// Interpret a page's content stream.
///
/// The interpreter handles these operators:
///
/// | Operator | Action |
/// |----------|--------|
/// | `q` `Q` `cm` | Save, restore and concatenate the CTM |
/// | `m` `l` `c` `v` `y` `re` `h` | Build a path |
/// | `S` `s` `f` `F` `f*` `B` `B*` `b` `b*` | Paint the path, recording its box |
/// | `n` | End the path without painting |
/// | `Do` | Place an image, or run a form |
/// | `BT` `ET` | Begin / end a text object |
/// | `Tf` `Tm` `Td` `TD` `T*` `TL` `Tc` `Tw` `Tz` `Ts` | Text state |
/// | `Tj` `TJ` `'` `"` | Show text |
pub fn interpret_page(backend: &dyn PdfBackend, page_id: PageId) -> Result<PageContent, PdfError> {
    let page_box = backend.page_box(page_id)?;
    let raw = backend.page_content(page_id)?;
    let ops = backend.decode_content(&raw)?;

    let mut interp = Interpreter {
        backend,
        page_id,
        ctm: page_space(&page_box),
        stack: Vec::new(),
        text: TextState::default(),
        path: PathBuilder::default(),
        out: PageContent::default(),
    };
    interp.run(&ops, 0);
    Ok(interp.out)
}

// ---------------------------------------------------------------------------
// Operator dispatch
// ---------------------------------------------------------------------------

impl Interpreter<'_> {
    fn run(&mut self, ops: &[ContentOp], depth: usize) {
        for op in ops {
            let operands = op.operands.as_slice();
            match op.operator.as_str() {
                // -- Graphics state ------------------------------------------
                "q" => self.stack.push(self.ctm),
                "Q" => {
                    if let Some(ctm) = self.stack.pop() {
                        self.ctm = ctm;
                    }
                }
                "cm" => {
                    if let Some(m) = numbers(operands).and_then(|v| Matrix::from_slice(&v)) {
                        self.ctm = m.then(&self.ctm);
                    }
                }

                // -- Path construction ---------------------------------------
                "m" | "l" | "c" | "v" | "y" => {
                    if let Some(vals) = numbers(operands) {
                        for pair in vals.chunks_exact(2) {
                            self.path.add(&self.ctm, pair[0], pair[1]);
                        }
                    }
                }
                "re" => {
                    if let Some([x, y, w, h]) = numbers(operands).as_deref().and_then(four) {
                        self.path.add_rect(&self.ctm, x, y, w, h);
                    }
                }
                "h" => {}

                // -- Path painting -------------------------------------------
                "S" | "s" | "f" | "F" | "f*" | "B" | "B*" | "b" | "b*" => {
                    if let Some(bounds) = self.path.take() {
                        self.out.paths.push(bounds);
                    }
                }
                "n" => self.path.clear(),

                // -- External objects ----------------------------------------
                "Do" => {
                    if let Some(PdfValue::Name(name)) = operands.first() {
                        self.do_xobject(name, depth);
                    }
                }

                // -- Text object delimiters ----------------------------------
                "BT" => {
                    self.text.text_matrix = Matrix::IDENTITY;
                    self.text.line_matrix = Matrix::IDENTITY;
                }
                "ET" => {}

                // -- Text state ----------------------------------------------
                "Tf" => self.handle_tf(operands),
                "Tm" => {
                    if let Some(m) = numbers(operands).and_then(|v| Matrix::from_slice(&v)) {
                        self.text.text_matrix = m;
                        self.text.line_matrix = m;
                    }
                }
                "Td" => {
                    if let Some([tx, ty]) = numbers(operands).as_deref().and_then(two) {
                        self.text.translate_line(tx, ty);
                    }
                }
                "TD" => {
                    // TD is equivalent to: -ty TL ; tx ty Td
                    if let Some([tx, ty]) = numbers(operands).as_deref().and_then(two) {
                        self.text.leading = -ty;
                        self.text.translate_line(tx, ty);
                    }
                }
                "T*" => self.text.next_line(),
                "TL" => {
                    if let Some(v) = first_number(operands) {
                        self.text.leading = v;
                    }
                }
                "Tc" => {
                    if let Some(v) = first_number(operands) {
                        self.text.char_spacing = v;
                    }
                }
                "Tw" => {
                    if let Some(v) = first_number(operands) {
                        self.text.word_spacing = v;
                    }
                }
                "Tz" => {
                    if let Some(v) = first_number(operands) {
                        self.text.horiz_scale = v / 100.0;
                    }
                }
                "Ts" => {
                    if let Some(v) = first_number(operands) {
                        self.text.text_rise = v;
                    }
                }

                // -- Show text -----------------------------------------------
                "Tj" => {
                    if let Some(first) = operands.first() {
                        self.show_string(first);
                    }
                }
                "TJ" => {
                    if let Some(PdfValue::Array(arr)) = operands.first() {
                        self.show_array(arr);
                    }
                }
                "'" => {
                    self.text.next_line();
                    if let Some(first) = operands.first() {
                        self.show_string(first);
                    }
                }
                "\"" => {
                    // " aw ac string  =>  set Tw, Tc, T*, Tj
                    if let [aw, ac, string, ..] = operands {
                        if let Some(aw) = get_number_from_value(aw) {
                            self.text.word_spacing = aw;
                        }
                        if let Some(ac) = get_number_from_value(ac) {
                            self.text.char_spacing = ac;
                        }
                        self.text.next_line();
                        self.show_string(string);
                    }
                }

                _ => {}
            }
        }
    }

    fn handle_tf(&mut self, operands: &[PdfValue]) {
        let [key, size, ..] = operands else {
            return;
        };
        let key = match key {
            PdfValue::Name(n) | PdfValue::Str(n) => n.clone(),
            _ => return,
        };
        self.text.font_key = key;
        self.text.font_size = get_number_from_value(size).unwrap_or(0.0);
    }

    fn do_xobject(&mut self, name: &[u8], depth: usize) {
        match self.backend.xobject(self.page_id, name) {
            Some(XObject::Image) => {
                let bounds = Bounds::transformed(&self.ctm, 0.0, 0.0, 1.0, 1.0);
                if !bounds.is_empty() {
                    self.out.images.push(bounds);
                }
            }
            Some(XObject::Form { matrix, content }) => {
                if depth >= MAX_FORM_DEPTH {
                    log::warn!(
                        "form XObject /{} nested too deeply, skipped",
                        String::from_utf8_lossy(name)
                    );
                    return;
                }
                let ops = match self.backend.decode_content(&content) {
                    Ok(ops) => ops,
                    Err(e) => {
                        log::warn!(
                            "form XObject /{} not decodable: {e}",
                            String::from_utf8_lossy(name)
                        );
                        return;
                    }
                };

                let saved_ctm = self.ctm;
                let saved_depth = self.stack.len();
                self.ctm = Matrix(matrix).then(&self.ctm);
                self.run(&ops, depth + 1);
                self.stack.truncate(saved_depth);
                self.ctm = saved_ctm;
            }
            None => {
                log::debug!(
                    "XObject /{} not found or unsupported",
                    String::from_utf8_lossy(name)
                );
            }
        }
    }

    // -- Text showing -------------------------------------------------------

    fn decode(&self, val: &PdfValue) -> String {
        match val {
            PdfValue::Str(bytes) => {
                self.backend
                    .decode_text(self.page_id, &self.text.font_key, bytes)
            }
            _ => String::new(),
        }
    }

    /// Show one string (`Tj`, `'`, `"`).
    fn show_string(&mut self, operand: &PdfValue) {
        let text = self.decode(operand);
        if text.is_empty() {
            return;
        }
        let start = self.text.text_matrix;
        let advance = self.text.text_advance(&text);
        self.emit(text, &start, advance);
        self.text.advance_x(advance);
    }

    /// Process a `TJ` array: strings to show and kerning adjustments in
    /// thousandths of a text-space unit. Produces a single span, with a
    /// space wherever the adjustment looks like a word gap.
    fn show_array(&mut self, arr: &[PdfValue]) {
        let start = self.text.text_matrix;
        let mut buf = String::new();
        let mut advance = 0.0;

        let gap_threshold =
            self.text.font_size * APPROX_CHAR_WIDTH_RATIO * self.text.horiz_scale * 0.3;

        for elem in arr {
            match elem {
                PdfValue::Str(_) => {
                    let fragment = self.decode(elem);
                    let dx = self.text.text_advance(&fragment);
                    buf.push_str(&fragment);
                    self.text.advance_x(dx);
                    advance += dx;
                }
                val => {
                    if let Some(adj) = get_number_from_value(val) {
                        let dx = -adj / 1000.0 * self.text.font_size * self.text.horiz_scale;
                        if dx > gap_threshold && !buf.is_empty() && !buf.ends_with(' ') {
                            buf.push(' ');
                        }
                        self.text.advance_x(dx);
                        advance += dx;
                    }
                }
            }
        }

        self.emit(buf, &start, advance);
    }

    /// Record a span drawn from the text position `start` over `advance`
    /// text-space units. Whitespace-only text is dropped.
    fn emit(&mut self, text: String, start: &Matrix, advance: f32) {
        if text.trim().is_empty() {
            return;
        }
        let ts = &self.text;
        let trm = start.then(&self.ctm);

        let bbox = Bounds::transformed(
            &trm,
            0.0,
            ts.text_rise - DESCENT * ts.font_size,
            advance,
            ts.text_rise + ASCENT * ts.font_size,
        );
        let (x, y) = trm.apply(0.0, ts.text_rise);

        let (dx, dy) = trm.apply_vector(1.0, 0.0);
        let len = (dx * dx + dy * dy).sqrt();
        let dir = if len > 0.0 { (dx / len, dy / len) } else { (1.0, 0.0) };

        self.out.spans.push(TextSpan {
            text,
            bbox,
            x,
            y,
            font_size: (ts.font_size * trm.vertical_scale()).abs(),
            dir,
        });
    }
}

fn first_number(operands: &[PdfValue]) -> Option<f32> {
    operands.first().and_then(get_number_from_value)
}

fn two(vals: &[f32]) -> Option<[f32; 2]> {
    match vals {
        [a, b, ..] => Some([*a, *b]),
        _ => None,
    }
}

fn four(vals: &[f32]) -> Option<[f32; 4]> {
    match vals {
        [a, b, c, d, ..] => Some([*a, *b, *c, *d]),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
