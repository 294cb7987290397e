use crate::parser::layout::TextBlock;
use crate::render::cleanup::cleanup_text;

/// Render blocks as plain text in reading order.
///
/// Blocks are ordered by their top edge, then their left edge. Every line
/// ends with a newline and blocks are separated by an empty line.
pub fn render_blocks(blocks: &[TextBlock]) -> String {
    let mut ordered: Vec<&TextBlock> = blocks.iter().collect();
    ordered.sort_by(|a, b| {
        a.bbox
            .y0
            .total_cmp(&b.bbox.y0)
            .then(a.bbox.x0.total_cmp(&b.bbox.x0))
    });

    let mut output = String::new();
    for (i, block) in ordered.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        for line in &block.lines {
            output.push_str(&line.text);
            output.push('\n');
        }
    }

    cleanup_text(&output)
}
