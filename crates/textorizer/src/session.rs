use std::path::Path;

use pdf::PdfDocument;
use serde_json::{json, Map, Value};
use textorizer_core::{schema, Margins, PageSource, RegionStore};

use crate::prelude::*;

/// Margin flags shared by every command that may detect regions.
///
/// A flag that is not given leaves the value from the region file (or zero)
/// in place.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct MarginArgs {
    /// Height of the header stripe to leave out of detection
    #[arg(long, env = "TEXTORIZER_MARGIN_TOP")]
    pub top: Option<i32>,

    /// Height of the footer stripe to leave out of detection
    #[arg(long, env = "TEXTORIZER_MARGIN_BOTTOM")]
    pub bottom: Option<i32>,

    /// Width of the left stripe to leave out of detection
    #[arg(long, env = "TEXTORIZER_MARGIN_LEFT")]
    pub left: Option<i32>,

    /// Width of the right stripe to leave out of detection
    #[arg(long, env = "TEXTORIZER_MARGIN_RIGHT")]
    pub right: Option<i32>,

    /// Ignore text that lies on images
    #[arg(
        long,
        env = "TEXTORIZER_IGNORE_IMAGES",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub ignore_images: Option<bool>,
}

impl MarginArgs {
    /// Overlay the given flags on `base`.
    pub fn apply(&self, base: Margins) -> Margins {
        Margins {
            left: self.left.unwrap_or(base.left),
            top: self.top.unwrap_or(base.top),
            right: self.right.unwrap_or(base.right),
            bottom: self.bottom.unwrap_or(base.bottom),
            ignore_images: self.ignore_images.unwrap_or(base.ignore_images),
        }
    }
}

/// An open PDF together with its regions.
pub struct Session {
    pub store: RegionStore<PdfDocument>,
    /// Top-level keys of the loaded region file, written back on save.
    extra: Map<String, Value>,
}

impl Session {
    /// Open `pdf_path` and, when given, load the region file at
    /// `regions_path`. Margins come from the region file, overridden by
    /// `margins`.
    pub fn open(
        pdf_path: &Path,
        regions_path: Option<&Path>,
        margins: &MarginArgs,
    ) -> Result<Self, Error> {
        let doc = PdfDocument::open(pdf_path).map_err(|source| Error::Open {
            path: pdf_path.to_path_buf(),
            source,
        })?;
        log::debug!(
            "opened {} ({} pages, sha256 {})",
            doc.name(),
            doc.page_count(),
            doc.checksum()
        );

        let mut store = RegionStore::new(doc);
        let mut extra = Map::new();
        let mut base = Margins::default();

        if let Some(path) = regions_path {
            let load_error = |source| Error::LoadRegions {
                path: path.to_path_buf(),
                source,
            };
            let data = schema::read_region_file(path).map_err(load_error)?;
            let file = store.deserialize_regions(&data).map_err(load_error)?;

            base = file.margins.unwrap_or_default();
            if let Value::Object(map) = data {
                extra = map;
            }
        }

        let margins = margins.apply(base);
        store.set_margins(margins);
        extra.insert("margins".into(), json!(margins));

        Ok(Session { store, extra })
    }

    pub fn margins(&self) -> Margins {
        *self.store.margins()
    }

    /// The pages a command works on: `page` alone, or every page.
    pub fn pages(&self, page: Option<usize>) -> Result<Vec<usize>> {
        let count = self.store.page_count();
        match page {
            Some(p) if p >= count => {
                bail!("Page {p} is out of range, the document has {count} pages (counting from 0)")
            }
            Some(p) => Ok(vec![p]),
            None => Ok((0..count).collect()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let data = self.store.serialize_regions(Some(&self.extra));
        schema::write_region_file(path, &data).map_err(|source| Error::SaveRegions {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("saved regions to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use lopdf::{dictionary, Document, Object, Stream};
    use textorizer_core::{Rect, RegionFileError};

    use super::*;

    /// A single 600x800 page with one line of text.
    pub(crate) fn write_pdf(dir: &Path, text: &str) -> std::path::PathBuf {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content = f!("BT /F1 10 Tf 1 0 0 1 50 700 Tm ({text}) Tj ET");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), 600.into(), 800.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let path = dir.join("doc.pdf");
        doc.save(&path).unwrap();
        path
    }

    #[test]
    fn test_flags_override_file_margins() {
        let base = Margins {
            left: 1,
            top: 2,
            right: 3,
            bottom: 4,
            ignore_images: true,
        };
        let args = MarginArgs {
            top: Some(20),
            ignore_images: Some(false),
            ..MarginArgs::default()
        };
        assert_eq!(
            args.apply(base),
            Margins {
                top: 20,
                ignore_images: false,
                ..base
            }
        );
        assert_eq!(MarginArgs::default().apply(base), base);
    }

    #[test]
    fn test_open_missing_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let err = Session::open(&dir.path().join("nope.pdf"), None, &MarginArgs::default())
            .err()
            .unwrap();
        assert!(matches!(err, Error::Open { .. }));
    }

    #[test]
    fn test_save_and_reload_keeps_margins_and_extra_keys() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = write_pdf(dir.path(), "Some words on a line");
        let regions = dir.path().join("doc.json");

        let margins = MarginArgs {
            top: Some(10),
            ..MarginArgs::default()
        };
        let mut session = Session::open(&pdf, None, &margins).unwrap();
        session.store.add_region(0, 5, 5, 100, 100);
        session.save(&regions).unwrap();

        // a key added by hand survives the next save
        let mut data = schema::read_region_file(&regions).unwrap();
        data["comment"] = json!("checked");
        schema::write_region_file(&regions, &data).unwrap();

        let session = Session::open(&pdf, Some(&regions), &MarginArgs::default()).unwrap();
        assert_eq!(session.margins().top, 10);
        assert_eq!(
            session.store.cached_regions(0).and_then(|r| r.last()).copied(),
            Some(Rect::new(5, 5, 100, 100))
        );

        session.save(&regions).unwrap();
        let data = schema::read_region_file(&regions).unwrap();
        assert_eq!(data["comment"], json!("checked"));
        assert_eq!(data["margins"]["top"], json!(10));
    }

    #[test]
    fn test_foreign_region_file_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = write_pdf(dir.path(), "Some words on a line");
        let regions = dir.path().join("foreign.json");
        std::fs::write(
            &regions,
            r#"{"version": {"major": 1, "minor": 0, "patch": 1},
                "pdf": {"checksum": "0000", "pages": 1},
                "pages": {}}"#,
        )
        .unwrap();

        let err = Session::open(&pdf, Some(&regions), &MarginArgs::default())
            .err()
            .unwrap();
        match err {
            Error::LoadRegions { source, .. } => {
                assert!(matches!(source, RegionFileError::ChecksumMismatch { .. }))
            }
            other => panic!("expected a load error, got {other:?}"),
        }
    }

    #[test]
    fn test_page_selection() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = write_pdf(dir.path(), "Some words on a line");
        let session = Session::open(&pdf, None, &MarginArgs::default()).unwrap();

        assert_eq!(session.pages(None).unwrap(), vec![0]);
        assert_eq!(session.pages(Some(0)).unwrap(), vec![0]);
        assert!(session.pages(Some(1)).is_err());
    }
}
