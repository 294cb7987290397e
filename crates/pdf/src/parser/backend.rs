use std::collections::BTreeMap;

use lopdf::{self, content::Content};

use crate::PdfError;

// ---------------------------------------------------------------------------
// Type aliases
// ---------------------------------------------------------------------------

/// A page identifier mirroring `lopdf::ObjectId`: (object number, generation number).
pub type PageId = (u32, u16);

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// A simplified, lopdf-independent representation of a PDF value.
///
/// This enum decouples the content interpreter from the concrete
/// `lopdf::Object` type so that it can be tested against plain data.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    Dict(Vec<(Vec<u8>, PdfValue)>),
    Reference(PageId),
}

/// A single content-stream operation (operator + operands).
#[derive(Debug, Clone)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

/// The page's MediaBox in PDF user space: `[llx, lly, urx, ury]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub llx: f32,
    pub lly: f32,
    pub urx: f32,
    pub ury: f32,
}

impl PageBox {
    /// Normalise a raw `[x0, y0, x1, y1]` array, which may list its
    /// corners in any order.
    pub fn from_corners(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        PageBox {
            llx: x0.min(x1),
            lly: y0.min(y1),
            urx: x0.max(x1),
            ury: y0.max(y1),
        }
    }

    pub fn width(&self) -> f32 {
        self.urx - self.llx
    }

    pub fn height(&self) -> f32 {
        self.ury - self.lly
    }
}

/// A named external object referenced by the `Do` operator.
#[derive(Debug, Clone)]
pub enum XObject {
    /// Raster image, painted into the unit square of the current CTM.
    Image,
    /// Form: a nested content stream with its own matrix.
    Form { matrix: [f32; 6], content: Vec<u8> },
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Extract an `f32` from a [`PdfValue`], accepting both `Integer` and `Real`.
pub fn get_number_from_value(val: &PdfValue) -> Option<f32> {
    match val {
        PdfValue::Integer(i) => Some(*i as f32),
        PdfValue::Real(f) => Some(*f),
        _ => None,
    }
}

/// Collect the numeric operands, `None` if any of them is not a number.
pub fn numbers(operands: &[PdfValue]) -> Option<Vec<f32>> {
    operands.iter().map(get_number_from_value).collect()
}

/// Convert a `lopdf::Object` into a [`PdfValue`].
///
/// References are preserved as `PdfValue::Reference`. Stream dictionaries
/// are converted but the raw stream bytes are discarded.
pub fn convert_object(obj: &lopdf::Object) -> PdfValue {
    match obj {
        lopdf::Object::Null => PdfValue::Null,
        lopdf::Object::Boolean(b) => PdfValue::Bool(*b),
        lopdf::Object::Integer(i) => PdfValue::Integer(*i),
        lopdf::Object::Real(f) => PdfValue::Real(*f),
        lopdf::Object::Name(n) => PdfValue::Name(n.clone()),
        lopdf::Object::String(s, _) => PdfValue::Str(s.clone()),
        lopdf::Object::Array(arr) => PdfValue::Array(arr.iter().map(convert_object).collect()),
        lopdf::Object::Dictionary(dict) => {
            let entries = dict
                .iter()
                .map(|(k, v)| (k.clone(), convert_object(v)))
                .collect();
            PdfValue::Dict(entries)
        }
        lopdf::Object::Stream(stream) => {
            let entries = stream
                .dict
                .iter()
                .map(|(k, v)| (k.clone(), convert_object(v)))
                .collect();
            PdfValue::Dict(entries)
        }
        lopdf::Object::Reference(id) => PdfValue::Reference(*id),
    }
}

/// Best-effort decoding of raw PDF string bytes into a Rust `String`.
///
/// Handles three cases in order:
/// 1. UTF-16BE with BOM (`\xFE\xFF` prefix) -- strips BOM and decodes.
/// 2. Valid UTF-8 -- returned as-is.
/// 3. Fallback to Latin-1 (ISO 8859-1) -- each byte mapped to its Unicode
///    code point.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let code_units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();
        return String::from_utf16_lossy(&code_units);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Latin-1 (PDFDocEncoding for the printable range).
    bytes.iter().map(|&b| b as char).collect()
}

// ---------------------------------------------------------------------------
// PdfBackend trait
// ---------------------------------------------------------------------------

/// Abstraction over a PDF parsing backend (currently backed by `lopdf`).
///
/// The content interpreter only talks to this trait, so it can be tested
/// against mock implementations that hand out pre-decoded operations.
pub trait PdfBackend {
    /// Return a mapping from 1-based page number to [`PageId`].
    fn pages(&self) -> BTreeMap<u32, PageId>;

    /// The page's MediaBox, inherited from the page tree if needed.
    fn page_box(&self, page: PageId) -> Result<PageBox, PdfError>;

    /// Return the decompressed content stream bytes for a page.
    fn page_content(&self, page: PageId) -> Result<Vec<u8>, PdfError>;

    /// Decode raw content-stream bytes into a sequence of [`ContentOp`]s.
    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>, PdfError>;

    /// Decode raw string bytes found in a text-showing operator, using any
    /// font-specific encoding information the backend can find for the given
    /// page and font name.
    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String;

    /// Look up an XObject by its resource name. `None` when it is missing or
    /// neither an image nor a form.
    fn xobject(&self, page: PageId, name: &[u8]) -> Option<XObject>;
}

// ---------------------------------------------------------------------------
// LopdfBackend
// ---------------------------------------------------------------------------

/// Concrete [`PdfBackend`] implementation backed by [`lopdf::Document`].
pub struct LopdfBackend {
    doc: lopdf::Document,
}

impl LopdfBackend {
    /// Parse a PDF from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self, PdfError> {
        let doc = lopdf::Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        if doc.is_encrypted() {
            return Err(PdfError::Encrypted);
        }

        Ok(Self { doc })
    }

    // -- private helpers ----------------------------------------------------

    fn page_dict(&self, page: PageId) -> Result<&lopdf::Dictionary, PdfError> {
        self.doc
            .get_object(page)
            .map_err(|e| PdfError::Parse(format!("cannot get page object: {}", e)))?
            .as_dict()
            .map_err(|e| PdfError::Parse(format!("page object is not a dictionary: {}", e)))
    }

    /// Walk up the page tree to find an inheritable attribute.
    fn inherited<'a>(&'a self, dict: &'a lopdf::Dictionary, key: &[u8]) -> Option<&'a lopdf::Object> {
        if let Ok(obj) = dict.get(key) {
            return Some(self.resolve_object(obj));
        }

        let parent_id = dict.get(b"Parent").ok()?.as_reference().ok()?;
        let parent = self.doc.get_object(parent_id).ok()?.as_dict().ok()?;
        self.inherited(parent, key)
    }

    fn resolve_object<'a>(&'a self, obj: &'a lopdf::Object) -> &'a lopdf::Object {
        match obj {
            lopdf::Object::Reference(id) => self.doc.get_object(*id).unwrap_or(obj),
            _ => obj,
        }
    }

    fn resolve_dict<'a>(&'a self, obj: &'a lopdf::Object) -> Option<&'a lopdf::Dictionary> {
        self.resolve_object(obj).as_dict().ok()
    }

    /// Convert a slice of lopdf objects to `f32` values.
    fn array_to_f32s(&self, objects: &[lopdf::Object]) -> Result<Vec<f32>, PdfError> {
        objects
            .iter()
            .map(|obj| match self.resolve_object(obj) {
                lopdf::Object::Integer(i) => Ok(*i as f32),
                lopdf::Object::Real(f) => Ok(*f),
                other => Err(PdfError::Parse(format!(
                    "expected number in array, got {:?}",
                    other
                ))),
            })
            .collect()
    }

    /// Look up the encoding name for a font on a page.
    fn font_encoding_name(&self, page: PageId, font_name: &[u8]) -> Option<String> {
        let fonts = self.doc.get_page_fonts(page).ok()?;
        let font_dict = fonts.get(font_name)?;
        let enc_obj = font_dict.get(b"Encoding").ok()?;
        match enc_obj {
            lopdf::Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// PdfBackend implementation for LopdfBackend
// ---------------------------------------------------------------------------

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn page_box(&self, page: PageId) -> Result<PageBox, PdfError> {
        let page_dict = self.page_dict(page)?;

        let media_box = self
            .inherited(page_dict, b"MediaBox")
            .and_then(|obj| obj.as_array().ok())
            .ok_or_else(|| PdfError::Parse("MediaBox not found for page".into()))?;

        match self.array_to_f32s(media_box)?.as_slice() {
            [x0, y0, x1, y1, ..] => Ok(PageBox::from_corners(*x0, *y0, *x1, *y1)),
            nums => Err(PdfError::Parse(format!(
                "MediaBox has {} elements, expected 4",
                nums.len()
            ))),
        }
    }

    fn page_content(&self, page: PageId) -> Result<Vec<u8>, PdfError> {
        self.doc
            .get_page_content(page)
            .map_err(|e| PdfError::Parse(format!("cannot get page content: {}", e)))
    }

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>, PdfError> {
        let content = Content::decode(data)
            .map_err(|e| PdfError::Parse(format!("content stream decode error: {}", e)))?;

        let ops = content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operator: op.operator,
                operands: op.operands.iter().map(convert_object).collect(),
            })
            .collect();

        Ok(ops)
    }

    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String {
        if let Some(enc_name) = self.font_encoding_name(page, font_name) {
            // Identity-H / Identity-V fonts typically use 2-byte CID codes
            // that map to Unicode.  Try UTF-16BE decoding.
            if enc_name.contains("Identity") && bytes.len() >= 2 && bytes.len() % 2 == 0 {
                let code_units: Vec<u16> = bytes
                    .chunks(2)
                    .map(|c| u16::from_be_bytes([c[0], c[1]]))
                    .collect();
                let decoded = String::from_utf16_lossy(&code_units);
                if !decoded.is_empty() && !decoded.chars().all(|c| c == '\u{FFFD}' || c == '\0') {
                    return decoded;
                }
            }
        }

        decode_text_simple(bytes)
    }

    fn xobject(&self, page: PageId, name: &[u8]) -> Option<XObject> {
        let page_dict = self.page_dict(page).ok()?;
        let resources = self.resolve_dict(self.inherited(page_dict, b"Resources")?)?;
        let xobjects = self.resolve_dict(resources.get(b"XObject").ok()?)?;
        let stream = self
            .resolve_object(xobjects.get(name).ok()?)
            .as_stream()
            .ok()?;

        let subtype = stream.dict.get(b"Subtype").ok()?.as_name().ok()?;
        match subtype {
            b"Image" => Some(XObject::Image),
            b"Form" => {
                let matrix = stream
                    .dict
                    .get(b"Matrix")
                    .ok()
                    .and_then(|m| m.as_array().ok())
                    .and_then(|arr| self.array_to_f32s(arr).ok())
                    .and_then(|vals| <[f32; 6]>::try_from(vals).ok())
                    .unwrap_or([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
                let content = stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone());
                Some(XObject::Form { matrix, content })
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Object, Stream};

    // -- decode_text_simple -------------------------------------------------

    #[test]
    fn decode_text_simple_utf8() {
        assert_eq!(decode_text_simple("caf\u{00E9}".as_bytes()), "caf\u{00E9}");
    }

    #[test]
    fn decode_text_simple_latin1() {
        // 0xE9 is U+00E9 in Latin-1 but not valid standalone UTF-8.
        let input: &[u8] = &[0x63, 0x61, 0x66, 0xE9];
        assert_eq!(decode_text_simple(input), "caf\u{00E9}");
    }

    #[test]
    fn decode_text_simple_utf16be() {
        let input: &[u8] = &[0xFE, 0xFF, 0x00, 0x41, 0x00, 0x42, 0x00];
        assert_eq!(decode_text_simple(input), "AB");
        assert_eq!(decode_text_simple(&[0xFE, 0xFF]), "");
    }

    // -- numbers ------------------------------------------------------------

    #[test]
    fn numbers_mixed_integer_and_real() {
        assert_eq!(
            numbers(&[PdfValue::Integer(2), PdfValue::Real(0.5)]),
            Some(vec![2.0, 0.5])
        );
        assert_eq!(numbers(&[PdfValue::Integer(2), PdfValue::Null]), None);
        assert_eq!(numbers(&[]), Some(vec![]));
    }

    // -- PageBox ------------------------------------------------------------

    #[test]
    fn page_box_normalises_corners() {
        let b = PageBox::from_corners(612.0, 792.0, 0.0, 0.0);
        assert_eq!((b.llx, b.lly, b.urx, b.ury), (0.0, 0.0, 612.0, 792.0));
        assert_eq!((b.width(), b.height()), (612.0, 792.0));
    }

    // -- convert_object -----------------------------------------------------

    #[test]
    fn convert_scalars() {
        assert_eq!(convert_object(&Object::Null), PdfValue::Null);
        assert_eq!(convert_object(&Object::Integer(99)), PdfValue::Integer(99));
        assert_eq!(convert_object(&Object::Real(1.5)), PdfValue::Real(1.5));
        assert_eq!(
            convert_object(&Object::Reference((7, 0))),
            PdfValue::Reference((7, 0))
        );
    }

    #[test]
    fn convert_stream_uses_dict() {
        let stream = Stream::new(dictionary! { "Length" => 0 }, vec![]);
        match convert_object(&Object::Stream(stream)) {
            PdfValue::Dict(entries) => {
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].0, b"Length");
            }
            other => panic!("expected Dict for stream, got {:?}", other),
        }
    }

    // -- LopdfBackend -------------------------------------------------------

    /// One page inheriting its MediaBox and Resources from the page tree,
    /// with an image and a form XObject.
    fn sample_document() -> Vec<u8> {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 1,
                "Height" => 1,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            vec![0],
        ));
        let form_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => vec![0.into(), 0.into(), 100.into(), 100.into()],
                "Matrix" => vec![1.into(), 0.into(), 0.into(), 1.into(), 50.into(), 60.into()],
            },
            b"0 0 10 10 re f".to_vec(),
        ));

        let content_id = doc.add_object(Stream::new(dictionary! {}, b"q Q".to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 600.into(), 800.into()],
                "Resources" => dictionary! {
                    "XObject" => dictionary! {
                        "Im1" => image_id,
                        "Fm1" => form_id,
                    },
                },
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn lopdf_backend_rejects_garbage() {
        assert!(matches!(
            LopdfBackend::load_bytes(b"not a pdf"),
            Err(PdfError::Parse(_))
        ));
    }

    #[test]
    fn lopdf_backend_inherits_media_box() {
        let backend = LopdfBackend::load_bytes(&sample_document()).unwrap();
        assert_eq!(backend.pages().len(), 1);
        let page = backend.pages()[&1];
        let b = backend.page_box(page).unwrap();
        assert_eq!((b.width(), b.height()), (600.0, 800.0));
    }

    #[test]
    fn lopdf_backend_resolves_xobjects() {
        let backend = LopdfBackend::load_bytes(&sample_document()).unwrap();
        let page = backend.pages()[&1];

        assert!(matches!(backend.xobject(page, b"Im1"), Some(XObject::Image)));
        match backend.xobject(page, b"Fm1") {
            Some(XObject::Form { matrix, content }) => {
                assert_eq!(matrix, [1.0, 0.0, 0.0, 1.0, 50.0, 60.0]);
                assert_eq!(content, b"0 0 10 10 re f");
            }
            other => panic!("expected form, got {:?}", other),
        }
        assert!(backend.xobject(page, b"Missing").is_none());
    }

    #[test]
    fn lopdf_backend_decodes_content() {
        let backend = LopdfBackend::load_bytes(&sample_document()).unwrap();
        let ops = backend.decode_content(b"1 0 0 1 5 6 cm (Hi) Tj").unwrap();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].operator, "cm");
        assert_eq!(ops[0].operands.len(), 6);
        assert_eq!(ops[1].operands, vec![PdfValue::Str(b"Hi".to_vec())]);
    }
}
