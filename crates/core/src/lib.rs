//! Core library for textorizer
//!
//! This crate implements the **Functional Core** of textorizer, following the
//! Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! - **`textorizer_core`** (this crate): column detection, the region store and
//!   the region file format. No PDF parsing.
//! - **`pdf`**: reads PDF files and exposes their pages as a [`PageSource`].
//! - **`textorizer`**: the command-line shell that wires the two together.
//!
//! Detection is pure integer geometry: given a page's text, image and drawing
//! boxes it always produces the same columns. The region store is generic over
//! [`PageSource`], so it can be tested against fixture pages without a PDF.
//! The only I/O in this crate is reading and writing region files.
//!
//! # Module Organization
//!
//! - [`geometry`]: integer page-space rectangles
//! - [`columns`]: the column detector
//! - [`regions`]: per-page region cache, editing, text conversion and
//!   (de)serialization
//! - [`schema`]: the versioned region file format
//! - [`text`]: paragraph joining
//! - [`info`]: project metadata for `--version`
//!
//! # Example Usage
//!
//! ```rust
//! use textorizer_core::columns::{column_boxes, PageLayout, TextBlockBox, TextLineBox};
//! use textorizer_core::geometry::Rect;
//!
//! let bbox = Rect::new(10, 10, 200, 50);
//! let layout = PageLayout {
//!     clip: Rect::new(0, 0, 600, 800),
//!     blocks: vec![TextBlockBox {
//!         bbox,
//!         lines: vec![TextLineBox::from_spans(bbox, true, ["Hello world"])],
//!     }],
//!     ..Default::default()
//! };
//!
//! assert_eq!(column_boxes(&layout, false), vec![Rect::new(10, 10, 600, 50)]);
//! ```

pub mod columns;
pub mod geometry;
pub mod info;
pub mod regions;
pub mod schema;
pub mod text;

pub use geometry::Rect;
pub use regions::{Margins, PageSource, RegionStore};
pub use schema::{RegionFile, RegionFileError};
