// Font metrics
// The core only ever asks a font two questions: how wide is this text, and how tall is a line.

use rusttype::{Font, Scale, point};
use unicode_segmentation::UnicodeSegmentation;

use super::config::FontSizes;

/// Width measurement and line spacing for one logical text style
pub trait FontMetrics {
    /// Advance width of `text` in pixels
    fn measure(&self, text: &str) -> f32;

    /// Distance between two baselines in pixels
    fn line_spacing(&self) -> f32;
}

/// The logical styles a block can be rendered in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontRole {
    Header,
    SubHeader,
    Paragraph,
    List,
}

/// Font lookup by role, supplied by the host
pub trait FontSet {
    fn font(&self, role: FontRole) -> &dyn FontMetrics;
}

impl<T: FontSet + ?Sized> FontSet for Box<T> {
    fn font(&self, role: FontRole) -> &dyn FontMetrics {
        (**self).font(role)
    }
}

/// Every grapheme cluster advances by the same amount
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedWidthFont {
    pub advance: f32,
    pub line_spacing: f32,
}

impl FixedWidthFont {
    pub fn new(advance: f32, line_spacing: f32) -> Self {
        FixedWidthFont {
            advance,
            line_spacing,
        }
    }

    /// Approximates a monospace face rendered at `size` px
    pub fn for_size(size: f32) -> Self {
        Self::new(size * 0.5, (size * 1.25).round())
    }
}

impl FontMetrics for FixedWidthFont {
    fn measure(&self, text: &str) -> f32 {
        text.graphemes(true).count() as f32 * self.advance
    }

    fn line_spacing(&self) -> f32 {
        self.line_spacing
    }
}

/// A `FontSet` of fixed-width fonts, one per role
#[derive(Debug, Clone, PartialEq)]
pub struct FixedWidthFonts {
    pub header: FixedWidthFont,
    pub sub_header: FixedWidthFont,
    pub paragraph: FixedWidthFont,
    pub list: FixedWidthFont,
}

impl FixedWidthFonts {
    /// Same metrics for every role
    pub fn uniform(advance: f32, line_spacing: f32) -> Self {
        let font = FixedWidthFont::new(advance, line_spacing);
        FixedWidthFonts {
            header: font,
            sub_header: font,
            paragraph: font,
            list: font,
        }
    }

    pub fn from_sizes(sizes: &FontSizes) -> Self {
        FixedWidthFonts {
            header: FixedWidthFont::for_size(sizes.header),
            sub_header: FixedWidthFont::for_size(sizes.sub_header),
            paragraph: FixedWidthFont::for_size(sizes.paragraph),
            list: FixedWidthFont::for_size(sizes.list),
        }
    }
}

impl FontSet for FixedWidthFonts {
    fn font(&self, role: FontRole) -> &dyn FontMetrics {
        match role {
            FontRole::Header => &self.header,
            FontRole::SubHeader => &self.sub_header,
            FontRole::Paragraph => &self.paragraph,
            FontRole::List => &self.list,
        }
    }
}

/// Metrics taken from a TrueType/OpenType face
#[derive(Clone)]
pub struct TrueTypeFont {
    font: Font<'static>,
    scale: Scale,
}

impl TrueTypeFont {
    /// Returns `None` when the bytes are not a usable font
    pub fn from_bytes(bytes: Vec<u8>, size: f32) -> Option<Self> {
        let font = Font::try_from_vec(bytes)?;
        Some(TrueTypeFont {
            font,
            scale: Scale::uniform(size),
        })
    }

    pub fn with_size(&self, size: f32) -> Self {
        TrueTypeFont {
            font: self.font.clone(),
            scale: Scale::uniform(size),
        }
    }
}

impl FontMetrics for TrueTypeFont {
    fn measure(&self, text: &str) -> f32 {
        self.font
            .layout(text, self.scale, point(0.0, 0.0))
            .last()
            .map(|glyph| glyph.position().x + glyph.unpositioned().h_metrics().advance_width)
            .unwrap_or(0.0)
    }

    fn line_spacing(&self) -> f32 {
        let v = self.font.v_metrics(self.scale);
        (v.ascent - v.descent + v.line_gap).ceil()
    }
}

/// A `FontSet` built from one face at the four configured sizes
#[derive(Clone)]
pub struct TrueTypeFonts {
    header: TrueTypeFont,
    sub_header: TrueTypeFont,
    paragraph: TrueTypeFont,
    list: TrueTypeFont,
}

impl TrueTypeFonts {
    pub fn from_bytes(bytes: Vec<u8>, sizes: &FontSizes) -> Option<Self> {
        let base = TrueTypeFont::from_bytes(bytes, sizes.paragraph)?;
        Some(TrueTypeFonts {
            header: base.with_size(sizes.header),
            sub_header: base.with_size(sizes.sub_header),
            list: base.with_size(sizes.list),
            paragraph: base,
        })
    }
}

impl FontSet for TrueTypeFonts {
    fn font(&self, role: FontRole) -> &dyn FontMetrics {
        match role {
            FontRole::Header => &self.header,
            FontRole::SubHeader => &self.sub_header,
            FontRole::Paragraph => &self.paragraph,
            FontRole::List => &self.list,
        }
    }
}
