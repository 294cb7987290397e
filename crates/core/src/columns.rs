//! Column detection.
//!
//! Turns one page's text, image and vector-graphics boxes into a short list
//! of non-overlapping rectangles, each wrapping one column of body text, in
//! approximate reading order.
//!
//! # Pipeline
//!
//! ```text
//! blocks  ->  candidates  ->  sort  ->  extend right  ->  merge  ->  clean
//!             (horizontal,    (background,                (column   (dedupe,
//!              meaningful      top, left)                  joins)    row order)
//!              lines only)
//! ```
//!
//! The whole pass is deterministic integer geometry. Nothing here can fail;
//! degenerate input produces an empty result.

use crate::geometry::{intersects_any, membership, Rect};

/// Blocks whose bottom edges differ by at most this much are treated as one
/// visual row when repairing left-to-right order.
const ROW_TOLERANCE: i32 = 10;

/// One line of a text block, as reported by the page provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLineBox {
    pub bbox: Rect,
    /// Whether the writing direction is left-to-right horizontal.
    pub horizontal: bool,
    /// Whether the line carries more than one non-whitespace character.
    pub meaningful: bool,
}

impl TextLineBox {
    /// Build a line box from the texts of its spans.
    ///
    /// Each span is trimmed before concatenation; the line is meaningful when
    /// the result is longer than one character.
    pub fn from_spans<I, S>(bbox: Rect, horizontal: bool, spans: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let chars: usize = spans
            .into_iter()
            .map(|s| s.as_ref().trim().chars().count())
            .sum();
        TextLineBox {
            bbox,
            horizontal,
            meaningful: chars > 1,
        }
    }
}

/// A text block: the provider's grouping of consecutive lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlockBox {
    pub bbox: Rect,
    pub lines: Vec<TextLineBox>,
}

/// Everything the detector needs to know about one page.
#[derive(Debug, Clone, Default)]
pub struct PageLayout {
    /// Page rectangle with the margins removed.
    pub clip: Rect,
    /// Bounding boxes of vector drawings.
    pub paths: Vec<Rect>,
    /// Placement boxes of images.
    pub images: Vec<Rect>,
    /// Text blocks inside `clip`.
    pub blocks: Vec<TextBlockBox>,
}

/// Detect the column rectangles of a page.
///
/// With `no_image_text` set, blocks lying entirely on an image are ignored.
pub fn column_boxes(layout: &PageLayout, no_image_text: bool) -> Vec<Rect> {
    if layout.clip.is_empty() {
        return Vec::new();
    }

    let mut paths = layout.paths.clone();
    paths.sort_by_key(|b| (b.y0, b.x0));
    let images = &layout.images;

    let (mut candidates, vertical) = collect_candidates(&layout.blocks, images, no_image_text);

    candidates.sort_by_key(|b| (membership(b, &paths), b.y0, b.x0));

    extend_right(&mut candidates, layout.clip.x1, &paths, &vertical, images);

    if candidates.is_empty() {
        return Vec::new();
    }

    let columns = join_columns(candidates, &paths, &vertical);
    clean_columns(columns)
}

/// Split blocks into column candidates and vertical-text obstacles.
fn collect_candidates(
    blocks: &[TextBlockBox],
    images: &[Rect],
    no_image_text: bool,
) -> (Vec<Rect>, Vec<Rect>) {
    let mut candidates = Vec::new();
    let mut vertical = Vec::new();

    for block in blocks {
        if no_image_text && membership(&block.bbox, images) != 0 {
            continue;
        }

        let Some(first) = block.lines.first() else {
            continue;
        };
        if !first.horizontal {
            vertical.push(block.bbox);
            continue;
        }

        let bbox = block
            .lines
            .iter()
            .filter(|line| line.meaningful)
            .fold(Rect::EMPTY, |acc, line| acc.union(&line.bbox));

        if !bbox.is_empty() {
            candidates.push(bbox);
        }
    }

    (candidates, vertical)
}

/// Whether `temp` (a grown version of `own`) stays clear of every box in
/// `others` except copies of `own`. Touching vertical text always vetoes.
fn can_extend<'a>(
    temp: &Rect,
    own: &Rect,
    others: impl IntoIterator<Item = &'a Rect>,
    vertical: &[Rect],
) -> bool {
    if intersects_any(temp, vertical) {
        return false;
    }
    others
        .into_iter()
        .all(|b| b == own || !temp.intersects(b))
}

/// Widen free-standing candidates up to `right` where nothing is in the way.
///
/// Candidates are updated in place, so later checks see earlier extensions.
fn extend_right(
    candidates: &mut [Rect],
    right: i32,
    paths: &[Rect],
    vertical: &[Rect],
    images: &[Rect],
) {
    for i in 0..candidates.len() {
        let bb = candidates[i];

        // text on a coloured background or inside an image stays put
        if membership(&bb, paths) != 0 || membership(&bb, images) != 0 {
            continue;
        }
        if bb.x1 >= right {
            continue;
        }

        let temp = bb.with_right(right);

        if intersects_any(&temp, paths)
            || intersects_any(&temp, vertical)
            || intersects_any(&temp, images)
        {
            continue;
        }

        if can_extend(&temp, &bb, candidates.iter(), vertical) {
            candidates[i] = temp;
        }
    }
}

/// Fold candidates into column blocks.
///
/// A candidate joins the first existing block it overlaps horizontally and
/// shares a background with, provided the union hits no other block. If the
/// grown block would then swallow a candidate still waiting to be placed,
/// the candidate is kept as its own block instead.
fn join_columns(candidates: Vec<Rect>, paths: &[Rect], vertical: &[Rect]) -> Vec<Rect> {
    let mut columns = vec![candidates[0]];
    let mut pending: Vec<Option<Rect>> = candidates[1..].iter().copied().map(Some).collect();

    for i in 0..pending.len() {
        let Some(bb) = pending[i] else {
            continue;
        };

        let mut target = None;
        for (j, nbb) in columns.iter().enumerate() {
            // never join across columns
            if nbb.x1 < bb.x0 || bb.x1 < nbb.x0 {
                continue;
            }
            // never join across different backgrounds
            if membership(nbb, paths) != membership(&bb, paths) {
                continue;
            }

            let temp = bb.union(nbb);
            if can_extend(&temp, nbb, columns.iter(), vertical) {
                target = Some((j, temp));
                break;
            }
        }

        let (j, temp) = match target {
            Some(found) => found,
            None => {
                columns.push(bb);
                (columns.len() - 1, bb)
            }
        };

        if can_extend(&temp, &bb, pending.iter().flatten(), vertical) {
            columns[j] = temp;
        } else {
            columns.push(bb);
        }

        pending[i] = None;
    }

    columns
}

/// Drop repeated blocks and sort each visual row left to right.
fn clean_columns(mut columns: Vec<Rect>) -> Vec<Rect> {
    columns.dedup();
    if columns.len() < 2 {
        return columns;
    }

    let mut row_bottom = columns[0].y1;
    let mut start = 0;
    let mut end = 0;

    for i in 1..columns.len() {
        let bottom = columns[i].y1;
        if (bottom - row_bottom).abs() > ROW_TOLERANCE {
            if end > start {
                columns[start..=end].sort_by_key(|b| b.x0);
            }
            row_bottom = bottom;
            start = i;
        }
        end = i;
    }
    if end > start {
        columns[start..=end].sort_by_key(|b| b.x0);
    }

    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(x0: i32, y0: i32, x1: i32, y1: i32) -> TextLineBox {
        TextLineBox {
            bbox: Rect::new(x0, y0, x1, y1),
            horizontal: true,
            meaningful: true,
        }
    }

    /// A block made of one meaningful horizontal line.
    fn block(x0: i32, y0: i32, x1: i32, y1: i32) -> TextBlockBox {
        TextBlockBox {
            bbox: Rect::new(x0, y0, x1, y1),
            lines: vec![line(x0, y0, x1, y1)],
        }
    }

    fn vertical_block(x0: i32, y0: i32, x1: i32, y1: i32) -> TextBlockBox {
        TextBlockBox {
            bbox: Rect::new(x0, y0, x1, y1),
            lines: vec![TextLineBox {
                bbox: Rect::new(x0, y0, x1, y1),
                horizontal: false,
                meaningful: true,
            }],
        }
    }

    fn page(blocks: Vec<TextBlockBox>) -> PageLayout {
        PageLayout {
            clip: Rect::new(0, 0, 600, 800),
            paths: vec![],
            images: vec![],
            blocks,
        }
    }

    // =====================================================================
    // TextLineBox
    // =====================================================================

    #[test]
    fn test_line_meaningful_needs_two_chars() {
        let r = Rect::new(0, 0, 10, 10);
        assert!(TextLineBox::from_spans(r, true, ["ab"]).meaningful);
        assert!(TextLineBox::from_spans(r, true, [" a ", " b"]).meaningful);
        assert!(!TextLineBox::from_spans(r, true, ["  x  "]).meaningful);
        assert!(!TextLineBox::from_spans(r, true, ["   ", ""]).meaningful);
        assert!(!TextLineBox::from_spans(r, true, Vec::<String>::new()).meaningful);
    }

    // =====================================================================
    // column_boxes
    // =====================================================================

    #[test]
    fn test_no_blocks_returns_empty() {
        assert!(column_boxes(&page(vec![]), false).is_empty());
    }

    #[test]
    fn test_empty_clip_returns_empty() {
        let mut layout = page(vec![block(10, 10, 200, 50)]);
        layout.clip = Rect::new(300, 0, 200, 800);
        assert!(column_boxes(&layout, false).is_empty());
    }

    #[test]
    fn test_single_block_extends_to_clip_edge() {
        let result = column_boxes(&page(vec![block(10, 10, 200, 50)]), false);
        assert_eq!(result, vec![Rect::new(10, 10, 600, 50)]);
    }

    #[test]
    fn test_two_columns_side_by_side() {
        let result = column_boxes(
            &page(vec![block(10, 10, 290, 100), block(310, 10, 590, 100)]),
            false,
        );
        assert_eq!(result.len(), 2);
        // The left column is blocked by its neighbour; the right one widens.
        assert_eq!(result[0], Rect::new(10, 10, 290, 100));
        assert_eq!(result[1], Rect::new(310, 10, 600, 100));
    }

    #[test]
    fn test_stacked_paragraphs_merge_into_one_column() {
        let result = column_boxes(
            &page(vec![
                block(10, 10, 290, 100),
                block(10, 110, 290, 200),
                block(310, 10, 590, 100),
                block(310, 110, 590, 200),
            ]),
            false,
        );
        assert_eq!(
            result,
            vec![Rect::new(10, 10, 290, 200), Rect::new(310, 10, 600, 200)]
        );
    }

    #[test]
    fn test_merge_that_would_swallow_a_pending_block_is_undone() {
        // The middle block would join the top one, but the union covers
        // the block to its right, so both stay separate.
        let result = column_boxes(
            &page(vec![
                block(10, 10, 300, 50),
                block(10, 100, 100, 200),
                block(200, 150, 300, 180),
            ]),
            false,
        );
        assert_eq!(
            result,
            vec![
                Rect::new(10, 10, 600, 50),
                Rect::new(10, 100, 100, 200),
                Rect::new(200, 150, 600, 180),
            ]
        );
    }

    #[test]
    fn test_extension_blocked_by_image() {
        let mut layout = page(vec![block(10, 10, 200, 50)]);
        layout.images = vec![Rect::new(400, 0, 500, 100)];
        assert_eq!(column_boxes(&layout, false), vec![Rect::new(10, 10, 200, 50)]);
    }

    #[test]
    fn test_extension_blocked_by_path() {
        let mut layout = page(vec![block(10, 10, 200, 50)]);
        layout.paths = vec![Rect::new(300, 20, 301, 700)];
        assert_eq!(column_boxes(&layout, false), vec![Rect::new(10, 10, 200, 50)]);
    }

    #[test]
    fn test_text_inside_path_is_not_extended() {
        let mut layout = page(vec![block(20, 20, 100, 40)]);
        layout.paths = vec![Rect::new(10, 10, 200, 60)];
        assert_eq!(column_boxes(&layout, false), vec![Rect::new(20, 20, 100, 40)]);
    }

    #[test]
    fn test_vertical_text_is_an_obstacle_not_a_column() {
        let result = column_boxes(
            &page(vec![block(10, 10, 200, 50), vertical_block(500, 0, 520, 400)]),
            false,
        );
        assert_eq!(result, vec![Rect::new(10, 10, 200, 50)]);
    }

    #[test]
    fn test_only_meaningful_lines_count() {
        let b = TextBlockBox {
            bbox: Rect::new(10, 10, 300, 100),
            lines: vec![
                line(10, 10, 150, 30),
                TextLineBox {
                    bbox: Rect::new(10, 40, 300, 100),
                    horizontal: true,
                    meaningful: false,
                },
            ],
        };
        let mut layout = page(vec![b]);
        layout.images = vec![Rect::new(400, 0, 500, 50)];
        assert_eq!(column_boxes(&layout, false), vec![Rect::new(10, 10, 150, 30)]);
    }

    #[test]
    fn test_block_without_meaningful_lines_is_dropped() {
        let b = TextBlockBox {
            bbox: Rect::new(10, 10, 300, 100),
            lines: vec![TextLineBox {
                bbox: Rect::new(10, 10, 300, 100),
                horizontal: true,
                meaningful: false,
            }],
        };
        assert!(column_boxes(&page(vec![b]), false).is_empty());
    }

    #[test]
    fn test_no_image_text_skips_blocks_on_images() {
        let mut layout = page(vec![block(110, 110, 190, 130), block(10, 300, 200, 350)]);
        layout.images = vec![Rect::new(100, 100, 200, 200)];

        // The image caption anchors a column that the paragraph below joins.
        let with = column_boxes(&layout, false);
        assert_eq!(with, vec![Rect::new(10, 110, 600, 350)]);

        let without = column_boxes(&layout, true);
        assert_eq!(without, vec![Rect::new(10, 300, 600, 350)]);
    }

    #[test]
    fn test_background_text_sorted_after_free_text() {
        let mut layout = page(vec![block(20, 20, 100, 40), block(10, 300, 200, 350)]);
        layout.paths = vec![Rect::new(10, 10, 200, 60)];
        let result = column_boxes(&layout, false);
        assert_eq!(
            result,
            vec![Rect::new(10, 300, 600, 350), Rect::new(20, 20, 100, 40)]
        );
    }

    #[test]
    fn test_deterministic() {
        let layout = page(vec![
            block(10, 10, 290, 100),
            block(310, 10, 590, 100),
            block(10, 150, 590, 200),
        ]);
        assert_eq!(column_boxes(&layout, false), column_boxes(&layout, false));
    }

    // =====================================================================
    // can_extend
    // =====================================================================

    #[test]
    fn test_can_extend_ignores_own_box() {
        let own = Rect::new(0, 0, 10, 10);
        let temp = Rect::new(0, 0, 50, 10);
        assert!(can_extend(&temp, &own, [own].iter(), &[]));
        assert!(!can_extend(&temp, &own, [own, Rect::new(20, 0, 30, 10)].iter(), &[]));
    }

    #[test]
    fn test_can_extend_vertical_always_vetoes() {
        let own = Rect::new(0, 0, 10, 10);
        let temp = Rect::new(0, 0, 50, 10);
        let vertical = [Rect::new(40, 0, 45, 100)];
        assert!(!can_extend(&temp, &own, std::iter::empty(), &vertical));
    }

    // =====================================================================
    // clean_columns
    // =====================================================================

    #[test]
    fn test_clean_removes_adjacent_duplicates() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(0, 20, 10, 30);
        assert_eq!(clean_columns(vec![a, a, b, b, b]), vec![a, b]);
    }

    #[test]
    fn test_clean_sorts_rows_by_left_edge() {
        let right = Rect::new(300, 0, 400, 100);
        let left = Rect::new(0, 0, 100, 95);
        let below = Rect::new(0, 200, 400, 300);
        assert_eq!(
            clean_columns(vec![right, left, below]),
            vec![left, right, below]
        );
    }

    #[test]
    fn test_clean_keeps_rows_apart_beyond_tolerance() {
        let right = Rect::new(300, 0, 400, 100);
        let left = Rect::new(0, 0, 100, 111);
        assert_eq!(clean_columns(vec![right, left]), vec![right, left]);
    }

    #[test]
    fn test_clean_sorts_trailing_row() {
        let top = Rect::new(0, 0, 400, 50);
        let c = Rect::new(200, 100, 300, 200);
        let a = Rect::new(0, 100, 100, 205);
        let b = Rect::new(100, 100, 200, 198);
        assert_eq!(clean_columns(vec![top, c, a, b]), vec![top, a, b, c]);
    }
}
