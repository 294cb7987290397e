//! Text post-processing shared by every page source.

/// Join wrapped lines of the same paragraph.
///
/// A line that ends in a space followed by a newline (`" \n"`) is a soft
/// break and is folded into a single space. Hard breaks and blank lines
/// between paragraphs are left alone.
pub fn concat_paragraphs(text: &str) -> String {
    text.replace(" \n", " ")
}
