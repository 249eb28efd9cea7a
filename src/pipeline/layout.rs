//! Minimal single-page PDF drawing on top of lopdf.
//!
//! Payslips only need text in the two standard Helvetica faces, hairline
//! rules, filled bands and one optional raster image. [`PageBuilder`] records
//! those as content-stream operations in PDF user space (points, origin at
//! the bottom-left). [`PageBuilder::finish`] wraps them into a complete
//! document. Text is encoded as WinAnsi; characters outside Latin-1 are
//! replaced with `?`.

use crate::pipeline::logo::LogoImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};

/// Points per millimetre.
pub const MM: f32 = 72.0 / 25.4;
/// A4 portrait, in points.
pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;

const PRODUCER: &str = concat!("xlsx2payslip ", env!("CARGO_PKG_VERSION"));

const LOGO_RESOURCE: &str = "Im1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource_name(self) -> &'static [u8] {
        match self {
            Font::Regular => b"F1",
            Font::Bold => b"F2",
        }
    }

    fn base_font(self) -> &'static str {
        match self {
            Font::Regular => "Helvetica",
            Font::Bold => "Helvetica-Bold",
        }
    }
}

// ── Metrics ──────────────────────────────────────────────────────────────

// Advance widths (1/1000 em) for ASCII 32..=126, from the standard AFM files.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

const FALLBACK_WIDTH: u16 = 556;

fn glyph_width(ch: char, font: Font) -> u16 {
    let table = match font {
        Font::Regular => &HELVETICA_WIDTHS,
        Font::Bold => &HELVETICA_BOLD_WIDTHS,
    };
    let code = ch as u32;
    if (32..=126).contains(&code) {
        table[(code - 32) as usize]
    } else {
        FALLBACK_WIDTH
    }
}

/// Rendered width of `text` in points.
pub fn text_width(text: &str, size: f32, font: Font) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(glyph_width(c, font))).sum();
    units as f32 * size / 1000.0
}

/// Truncate `text` with `...` so it fits in `max_width` points.
pub fn fit_text(text: &str, max_width: f32, size: f32, font: Font) -> String {
    if text_width(text, size, font) <= max_width {
        return text.to_string();
    }
    let ellipsis = "...";
    let budget = max_width - text_width(ellipsis, size, font);
    let mut out = String::new();
    let mut used = 0.0;
    for ch in text.chars() {
        let w = f32::from(glyph_width(ch, font)) * size / 1000.0;
        if used + w > budget {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push_str(ellipsis);
    out
}

/// Largest size ≤ `size` (and ≥ `min_size`) at which `text` fits `max_width`.
pub fn fit_size(text: &str, max_width: f32, size: f32, min_size: f32, font: Font) -> f32 {
    let width = text_width(text, size, font);
    if width <= max_width || width == 0.0 {
        return size;
    }
    (size * max_width / width).max(min_size)
}

/// WinAnsi bytes for a PDF string literal.
pub fn encode_text(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            0x20..=0x7E | 0xA0..=0xFF => c as u8,
            _ => b'?',
        })
        .collect()
}

// ── Page builder ─────────────────────────────────────────────────────────

/// Records drawing operations for one page.
#[derive(Debug, Default)]
pub struct PageBuilder {
    operations: Vec<Operation>,
    uses_logo: bool,
}

impl PageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Left-aligned text with its baseline at `y`.
    pub fn text(&mut self, x: f32, y: f32, size: f32, font: Font, text: &str) {
        if text.is_empty() {
            return;
        }
        self.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![Object::Name(font.resource_name().to_vec()), size.into()],
            ),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new("Tj", vec![Object::string_literal(encode_text(text))]),
            Operation::new("ET", vec![]),
        ]);
    }

    /// Text whose right edge sits at `right`.
    pub fn text_right(&mut self, right: f32, y: f32, size: f32, font: Font, text: &str) {
        let x = right - text_width(text, size, font);
        self.text(x, y, size, font, text);
    }

    /// Text centred on `center`.
    pub fn text_centered(&mut self, center: f32, y: f32, size: f32, font: Font, text: &str) {
        let x = center - text_width(text, size, font) / 2.0;
        self.text(x, y, size, font, text);
    }

    /// Stroke colour for subsequent lines and rectangles.
    pub fn stroke_gray(&mut self, gray: f32) {
        self.operations.push(Operation::new("G", vec![gray.into()]));
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, width: f32) {
        self.operations.extend([
            Operation::new("w", vec![width.into()]),
            Operation::new("m", vec![x1.into(), y1.into()]),
            Operation::new("l", vec![x2.into(), y2.into()]),
            Operation::new("S", vec![]),
        ]);
    }

    /// Stroked rectangle; `(x, y)` is the bottom-left corner.
    pub fn rect(&mut self, x: f32, y: f32, w: f32, h: f32, width: f32) {
        self.operations.extend([
            Operation::new("w", vec![width.into()]),
            Operation::new("re", vec![x.into(), y.into(), w.into(), h.into()]),
            Operation::new("S", vec![]),
        ]);
    }

    /// Filled rectangle in a grey level (0 black, 1 white). Fill colour is
    /// reset to black afterwards.
    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, gray: f32) {
        self.operations.extend([
            Operation::new("g", vec![gray.into()]),
            Operation::new("re", vec![x.into(), y.into(), w.into(), h.into()]),
            Operation::new("f", vec![]),
            Operation::new("g", vec![0.0f32.into()]),
        ]);
    }

    /// Place the document logo with its bottom-left corner at `(x, y)`.
    pub fn logo(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.uses_logo = true;
        self.operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    w.into(),
                    0.0f32.into(),
                    0.0f32.into(),
                    h.into(),
                    x.into(),
                    y.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(LOGO_RESOURCE.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ]);
    }

    /// Assemble a one-page A4 document and serialise it.
    pub fn finish(
        self,
        title: &str,
        logo: Option<&LogoImage>,
        compress: bool,
    ) -> Result<Vec<u8>, lopdf::Error> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut fonts = Dictionary::new();
        for font in [Font::Regular, Font::Bold] {
            let id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => font.base_font(),
                "Encoding" => "WinAnsiEncoding",
            });
            fonts.set(font.resource_name().to_vec(), id);
        }

        let mut resources = dictionary! { "Font" => fonts };
        if let (true, Some(image)) = (self.uses_logo, logo) {
            let image_id = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => i64::from(image.width),
                    "Height" => i64::from(image.height),
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8,
                },
                image.rgb.clone(),
            ));
            resources.set("XObject", dictionary! { LOGO_RESOURCE => image_id });
        }
        let resources_id = doc.add_object(resources);

        let content = Content {
            operations: self.operations,
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
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
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(encode_text(title)),
            "Producer" => Object::string_literal(PRODUCER),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);

        if compress {
            doc.compress();
        }

        let mut buf = Vec::new();
        doc.save_to(&mut buf)?;
        Ok(buf)
    }
}
