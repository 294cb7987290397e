//! Per-document region store.
//!
//! Regions are cached per page. A page that was never looked at is absent and
//! gets detected on first access; a page that is present is authoritative,
//! even when its list is empty, until [`RegionStore::clear_regions`] drops it.
//!
//! Page and region indices that are out of range never fail: edits become
//! no-ops, lookups come back empty.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::columns::{column_boxes, PageLayout, TextBlockBox};
use crate::geometry::Rect;
use crate::schema::{RegionFile, RegionFileError, FORMAT_VERSION};
use crate::text::concat_paragraphs;

/// The document a [`RegionStore`] works on.
///
/// All page-level methods are only called with `page < page_count()`.
/// Rectangles are in page space: origin at the top-left corner, y down.
pub trait PageSource {
    /// Display name, usually the file name.
    fn name(&self) -> &str;

    /// Stable hash of the raw document bytes.
    fn checksum(&self) -> &str;

    fn page_count(&self) -> usize;

    fn page_rect(&self, page: usize) -> Rect;

    /// Bounding boxes of the page's vector drawings.
    fn drawings(&self, page: usize) -> Vec<Rect>;

    /// Placement boxes of the page's images.
    fn image_rects(&self, page: usize) -> Vec<Rect>;

    /// Text blocks inside `clip`.
    fn text_blocks(&self, page: usize, clip: &Rect) -> Vec<TextBlockBox>;

    /// Text under `clip`, in reading order.
    fn text(&self, page: usize, clip: &Rect) -> String;
}

/// Stripes excluded from detection, plus the image-text filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Margins {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    #[serde(alias = "ignoreImages")]
    pub ignore_images: bool,
}

impl Margins {
    /// The part of `page` left after removing the margins. May be empty.
    ///
    /// Out-of-range margins saturate instead of overflowing.
    pub fn clip(&self, page: &Rect) -> Rect {
        Rect::new(
            page.x0.saturating_add(self.left),
            page.y0.saturating_add(self.top),
            page.x1.saturating_sub(self.right),
            page.y1.saturating_sub(self.bottom),
        )
    }
}

pub struct RegionStore<S> {
    source: S,
    pages: BTreeMap<usize, Vec<Rect>>,
    margins: Margins,
}

impl<S: PageSource> RegionStore<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            pages: BTreeMap::new(),
            margins: Margins::default(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn page_count(&self) -> usize {
        self.source.page_count()
    }

    pub fn margins(&self) -> &Margins {
        &self.margins
    }

    /// Margins used when an edit or lookup has to detect a page first.
    pub fn set_margins(&mut self, margins: Margins) {
        self.margins = margins;
    }

    /// Regions of `page`, detecting them with `margins` on a cache miss.
    ///
    /// Returns `None` only when `page` is out of range.
    pub fn regions(&mut self, page: usize, margins: &Margins) -> Option<&[Rect]> {
        if page >= self.page_count() {
            return None;
        }
        if !self.pages.contains_key(&page) {
            let found = self.detect(page, margins);
            self.pages.insert(page, found);
        } else {
            log::debug!("page {page}: using cached regions");
        }
        self.pages.get(&page).map(Vec::as_slice)
    }

    /// Regions of `page` if they are cached, without detecting.
    pub fn cached_regions(&self, page: usize) -> Option<&[Rect]> {
        self.pages.get(&page).map(Vec::as_slice)
    }

    /// Forget the regions of one page so the next access detects again.
    ///
    /// Returns whether anything was cached.
    pub fn clear_regions(&mut self, page: usize) -> bool {
        self.pages.remove(&page).is_some()
    }

    pub fn clear_all_regions(&mut self) {
        self.pages.clear();
    }

    /// Pin `page` to an empty region list.
    pub fn mark_page_empty(&mut self, page: usize) {
        if page >= self.page_count() {
            return;
        }
        self.pages.insert(page, Vec::new());
    }

    pub fn mark_all_pages_empty(&mut self) {
        for page in 0..self.page_count() {
            self.pages.insert(page, Vec::new());
        }
    }

    /// Append a region. Coordinates are clamped to the page; a rectangle
    /// that is degenerate after clamping is dropped.
    pub fn add_region(&mut self, page: usize, left: i32, top: i32, right: i32, bottom: i32) {
        if page >= self.page_count() {
            return;
        }
        let Some(rect) = self.clamp_region(page, left, top, right, bottom) else {
            return;
        };
        if let Some(regions) = self.regions_mut(page) {
            regions.push(rect);
            log::debug!("page {page}: added region {rect:?}");
        }
    }

    /// Replace a region in place, with the same clamping rule as
    /// [`add_region`](Self::add_region).
    pub fn modify_region(
        &mut self,
        page: usize,
        index: usize,
        left: i32,
        top: i32,
        right: i32,
        bottom: i32,
    ) {
        if !self.has_region(page, index) {
            return;
        }
        let Some(rect) = self.clamp_region(page, left, top, right, bottom) else {
            return;
        };
        if let Some(slot) = self.regions_mut(page).and_then(|r| r.get_mut(index)) {
            *slot = rect;
        }
    }

    pub fn remove_region(&mut self, page: usize, index: usize) {
        if !self.has_region(page, index) {
            return;
        }
        if let Some(regions) = self.regions_mut(page) {
            regions.remove(index);
        }
    }

    /// Move a region `delta` places up (negative) or down (positive) by
    /// swapping it with its neighbours, stopping at either end.
    ///
    /// Returns the region's new index, or `index` unchanged when it does
    /// not exist.
    pub fn reorder_region(&mut self, page: usize, index: usize, delta: isize) -> usize {
        if !self.has_region(page, index) {
            return index;
        }
        let Some(regions) = self.regions_mut(page) else {
            return index;
        };

        let mut index = index;
        let mut delta = delta;

        while delta < 0 && index > 0 {
            regions.swap(index - 1, index);
            index -= 1;
            delta += 1;
        }

        while delta > 0 && index + 1 < regions.len() {
            regions.swap(index, index + 1);
            index += 1;
            delta -= 1;
        }

        index
    }

    /// Index of the first region containing the point.
    pub fn find_region(&mut self, page: usize, x: i32, y: i32) -> Option<usize> {
        self.regions_mut(page)?
            .iter()
            .position(|r| r.contains_point(x, y))
    }

    /// Text of one region; empty when the region does not exist.
    ///
    /// With `concat` set, wrapped lines of a paragraph are joined.
    pub fn convert_region_to_text(&mut self, page: usize, index: usize, concat: bool) -> String {
        let Some(rect) = self
            .regions_mut(page)
            .and_then(|r| r.get(index).copied())
        else {
            return String::new();
        };
        self.region_text(page, &rect, concat)
    }

    /// Text of all regions of a page in stored order, each followed by a
    /// newline.
    pub fn convert_page_to_text(&mut self, page: usize, concat: bool) -> String {
        let Some(regions) = self.regions_mut(page).cloned() else {
            return String::new();
        };

        let mut text = String::new();
        for rect in &regions {
            text.push_str(&self.region_text(page, rect, concat));
            text.push('\n');
        }
        text
    }

    /// Text of every page, one after the other.
    pub fn convert_document_to_text(&mut self, concat: bool) -> String {
        (0..self.page_count())
            .map(|page| self.convert_page_to_text(page, concat))
            .collect()
    }

    /// Build a region file document.
    ///
    /// Keys of `extra` (e.g. `margins`) are carried over, except for
    /// `version`, `pdf` and `pages`, which are always computed.
    pub fn serialize_regions(&self, extra: Option<&Map<String, Value>>) -> Value {
        let mut data = extra.cloned().unwrap_or_default();

        let pages: Map<String, Value> = self
            .pages
            .iter()
            .map(|(page, regions)| (page.to_string(), json!(regions)))
            .collect();

        data.insert("version".into(), json!(FORMAT_VERSION));
        data.insert(
            "pdf".into(),
            json!({
                "name": self.source.name(),
                "checksum": self.source.checksum(),
                "pages": self.page_count(),
            }),
        );
        data.insert("pages".into(), Value::Object(pages));

        Value::Object(data)
    }

    /// Validate a region file against this document and, on success,
    /// replace the whole cache with its regions.
    ///
    /// On failure the cache is left as it was.
    pub fn deserialize_regions(&mut self, data: &Value) -> Result<RegionFile, RegionFileError> {
        let file = RegionFile::parse(data)?;

        if file.pdf.checksum != self.source.checksum() {
            return Err(RegionFileError::ChecksumMismatch {
                expected: self.source.checksum().to_string(),
                found: file.pdf.checksum,
            });
        }
        if file.pdf.pages != self.page_count() {
            return Err(RegionFileError::PageCountMismatch {
                expected: self.page_count(),
                found: file.pdf.pages,
            });
        }

        log::debug!(
            "loaded regions for {} of {} pages",
            file.pages.len(),
            self.page_count()
        );
        self.pages = file.pages.clone();
        Ok(file)
    }

    fn detect(&self, page: usize, margins: &Margins) -> Vec<Rect> {
        let clip = margins.clip(&self.source.page_rect(page));
        let layout = PageLayout {
            clip,
            paths: self.source.drawings(page),
            images: self.source.image_rects(page),
            blocks: self.source.text_blocks(page, &clip),
        };
        let columns = column_boxes(&layout, margins.ignore_images);
        log::debug!("page {page}: detected {} regions", columns.len());
        columns
    }

    /// Cached regions of `page`, detecting with the store's margins first.
    fn regions_mut(&mut self, page: usize) -> Option<&mut Vec<Rect>> {
        let margins = self.margins;
        self.regions(page, &margins)?;
        self.pages.get_mut(&page)
    }

    fn has_region(&mut self, page: usize, index: usize) -> bool {
        self.regions_mut(page).is_some_and(|r| index < r.len())
    }

    fn clamp_region(
        &self,
        page: usize,
        left: i32,
        top: i32,
        right: i32,
        bottom: i32,
    ) -> Option<Rect> {
        let bounds = self.source.page_rect(page);
        let max_x = (bounds.width() - 1).max(0);
        let max_y = (bounds.height() - 1).max(0);

        let left = left.min(max_x).max(0);
        let right = right.min(max_x).max(0);
        let top = top.min(max_y).max(0);
        let bottom = bottom.min(max_y).max(0);

        if left >= right || top >= bottom {
            return None;
        }
        Some(Rect::new(left, top, right, bottom))
    }

    fn region_text(&self, page: usize, rect: &Rect, concat: bool) -> String {
        let text = self.source.text(page, rect);
        if concat {
            concat_paragraphs(&text)
        } else {
            text
        }
    }
}
