//! Region file format.
//!
//! A region file binds per-page region lists to one exact PDF through its
//! checksum and page count:
//!
//! ```json
//! {
//!     "version": { "major": 1, "minor": 0, "patch": 1 },
//!     "pdf": { "name": "paper.pdf", "checksum": "…", "pages": 12 },
//!     "margins": { "left": 0, "top": 40, "right": 0, "bottom": 40, "ignore_images": false },
//!     "pages": { "0": [[10, 10, 290, 700], [310, 10, 600, 700]] }
//! }
//! ```
//!
//! Parsing happens in two phases. The version is read on its own first, so
//! files from a newer format get a clean "unsupported version" error before
//! any of their content is looked at. Each remaining shape is then validated
//! separately and reported by field name.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::geometry::Rect;
use crate::regions::Margins;

/// Version written by this crate.
pub const FORMAT_VERSION: Version = Version {
    major: 1,
    minor: 0,
    patch: 1,
};

/// Failure to read, validate or write a region file.
#[derive(Debug, thiserror::Error)]
pub enum RegionFileError {
    #[error("No version information found")]
    MissingVersion,

    #[error("Invalid version information")]
    InvalidVersion,

    #[error("Unsupported region file version {major}.{minor}.{patch}")]
    UnsupportedVersion { major: i64, minor: i64, patch: i64 },

    #[error("Invalid `{field}`: {reason}")]
    Schema { field: String, reason: String },

    #[error("PDF file checksum mismatch ({expected} vs {found})")]
    ChecksumMismatch { expected: String, found: String },

    #[error("PDF page count mismatch ({expected} vs {found})")]
    PageCountMismatch { expected: usize, found: usize },

    #[error("Malformed region file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to save {}: {source}", path.display())]
    Save {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl RegionFileError {
    /// Whether the file was read but its content was rejected.
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::Read { .. } | Self::Save { .. })
    }

    fn schema(field: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Schema {
            field: field.into(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub major: i64,
    pub minor: i64,
    pub patch: i64,
}

impl Version {
    /// Readable versions: any 1.0.x.
    pub fn is_supported(&self) -> bool {
        self.major == 1 && self.minor <= 0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Which PDF a region file belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfIdentity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub checksum: String,
    pub pages: usize,
}

/// A fully validated region file.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionFile {
    pub version: Version,
    pub pdf: PdfIdentity,
    pub margins: Option<Margins>,
    pub pages: BTreeMap<usize, Vec<Rect>>,
}

/// Read only the version block, ignoring everything else.
pub fn parse_version(data: &Value) -> Result<Version, RegionFileError> {
    let version = data
        .get("version")
        .filter(|v| !v.is_null())
        .ok_or(RegionFileError::MissingVersion)?;

    let field = |name: &str| {
        version
            .get(name)
            .and_then(Value::as_i64)
            .ok_or(RegionFileError::InvalidVersion)
    };

    Ok(Version {
        major: field("major")?,
        minor: field("minor")?,
        patch: field("patch")?,
    })
}

impl RegionFile {
    /// Validate a region file document. Unknown top-level keys are ignored.
    pub fn parse(data: &Value) -> Result<Self, RegionFileError> {
        let version = parse_version(data)?;
        if !version.is_supported() {
            return Err(RegionFileError::UnsupportedVersion {
                major: version.major,
                minor: version.minor,
                patch: version.patch,
            });
        }

        let root = data
            .as_object()
            .ok_or_else(|| RegionFileError::schema("<root>", "expected an object"))?;

        let pdf = parse_pdf(root)?;
        let margins = parse_margins(root)?;
        let pages = parse_pages(root)?;

        Ok(RegionFile {
            version,
            pdf,
            margins,
            pages,
        })
    }
}

fn parse_pdf(root: &Map<String, Value>) -> Result<PdfIdentity, RegionFileError> {
    let pdf = root
        .get("pdf")
        .ok_or_else(|| RegionFileError::schema("pdf", "missing"))?;
    serde_json::from_value(pdf.clone()).map_err(|e| RegionFileError::schema("pdf", e))
}

fn parse_margins(root: &Map<String, Value>) -> Result<Option<Margins>, RegionFileError> {
    match root.get("margins") {
        None | Some(Value::Null) => Ok(None),
        Some(margins) => serde_json::from_value(margins.clone())
            .map(Some)
            .map_err(|e| RegionFileError::schema("margins", e)),
    }
}

fn parse_pages(root: &Map<String, Value>) -> Result<BTreeMap<usize, Vec<Rect>>, RegionFileError> {
    let pages = root
        .get("pages")
        .ok_or_else(|| RegionFileError::schema("pages", "missing"))?
        .as_object()
        .ok_or_else(|| RegionFileError::schema("pages", "expected an object"))?;

    let mut result = BTreeMap::new();
    for (key, regions) in pages {
        let page: usize = key
            .trim()
            .parse()
            .map_err(|_| RegionFileError::schema(format!("pages.{key}"), "page index is not an integer"))?;
        let regions: Vec<Rect> = serde_json::from_value(regions.clone())
            .map_err(|e| RegionFileError::schema(format!("pages.{key}"), e))?;
        result.insert(page, regions);
    }

    Ok(result)
}

/// Load a region file as raw JSON. Validation happens on deserialization.
pub fn read_region_file(path: &Path) -> Result<Value, RegionFileError> {
    let text = fs::read_to_string(path).map_err(|source| RegionFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}

/// Write a region document as 4-space indented UTF-8 JSON.
pub fn write_region_file(path: &Path, data: &Value) -> Result<(), RegionFileError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    data.serialize(&mut ser)?;
    buf.push(b'\n');

    fs::write(path, buf).map_err(|source| RegionFileError::Save {
        path: path.to_path_buf(),
        source,
    })
}
