//! # Font Management
//!
//! Text measurement for the layout engine and font data for the PDF
//! backend. Helvetica and Helvetica-Bold are always available and need no
//! embedding; a statement may additionally supply a custom TrueType family,
//! registered under [`PRIMARY_FAMILY`] and parsed with ttf-parser.

pub mod metrics;

pub use metrics::StandardFontMetrics;
use std::collections::HashMap;

use crate::error::{FolioError, Result};

/// Family name of the built-in face.
pub const DEFAULT_FAMILY: &str = "Helvetica";
/// Family name custom statement fonts are registered under.
pub const PRIMARY_FAMILY: &str = "Primary";

#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct FontKey {
    pub family: String,
    pub bold: bool,
}

impl FontKey {
    pub fn new(family: &str, bold: bool) -> Self {
        Self {
            family: family.to_string(),
            bold,
        }
    }
}

#[derive(Debug, Clone)]
pub enum FontData {
    /// One of the standard PDF fonts. No embedding needed.
    Standard(StandardFont),
    /// A TrueType font that needs to be embedded.
    Custom {
        data: Vec<u8>,
        metrics: CustomFontMetrics,
    },
}

/// Parsed metrics from a TrueType/OpenType font via ttf-parser.
#[derive(Debug, Clone)]
pub struct CustomFontMetrics {
    pub units_per_em: u16,
    pub advance_widths: HashMap<char, u16>,
    pub default_advance: u16,
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
    /// Maps characters to their glyph IDs in the font.
    pub glyph_ids: HashMap<char, u16>,
}

impl CustomFontMetrics {
    /// Get the advance width of a character in points.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let w = self
            .advance_widths
            .get(&ch)
            .copied()
            .unwrap_or(self.default_advance);
        (w as f64 / self.units_per_em as f64) * font_size
    }

    /// Parse metrics from font data using ttf-parser.
    pub fn from_font_data(data: &[u8]) -> Result<Self> {
        let face = ttf_parser::Face::parse(data, 0)
            .map_err(|e| FolioError::FontError(format!("Failed to parse TTF data: {}", e)))?;
        let units_per_em = face.units_per_em();

        let mut advance_widths = HashMap::new();
        let mut glyph_ids = HashMap::new();
        let mut default_advance = 0u16;

        for code in 32u32..=0xFFFF {
            if let Some(ch) = char::from_u32(code) {
                if let Some(glyph_id) = face.glyph_index(ch) {
                    let advance = face.glyph_hor_advance(glyph_id).unwrap_or(0);
                    advance_widths.insert(ch, advance);
                    glyph_ids.insert(ch, glyph_id.0);
                    if ch == ' ' {
                        default_advance = advance;
                    }
                }
            }
        }

        if default_advance == 0 {
            default_advance = units_per_em / 2;
        }

        Ok(CustomFontMetrics {
            units_per_em,
            advance_widths,
            default_advance,
            ascender: face.ascender(),
            descender: face.descender(),
            line_gap: face.line_gap(),
            glyph_ids,
        })
    }
}

/// The standard PDF faces the renderer uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
}

impl StandardFont {
    /// The PDF name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
        }
    }
}

/// Vertical metrics of a face at a given size, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineMetrics {
    pub ascent: f64,
    /// Positive distance below the baseline.
    pub descent: f64,
    pub line_gap: f64,
}

impl LineMetrics {
    /// Height of one line without leading.
    pub fn height(&self) -> f64 {
        self.ascent + self.descent + self.line_gap
    }
}

static HELVETICA_DATA: FontData = FontData::Standard(StandardFont::Helvetica);
static HELVETICA_BOLD_DATA: FontData = FontData::Standard(StandardFont::HelveticaBold);

/// Shared font context used by layout and PDF serialization.
pub struct FontContext {
    fonts: HashMap<FontKey, FontData>,
}

impl Default for FontContext {
    fn default() -> Self {
        Self::new()
    }
}

impl FontContext {
    pub fn new() -> Self {
        let mut fonts = HashMap::new();
        fonts.insert(
            FontKey::new(DEFAULT_FAMILY, false),
            FontData::Standard(StandardFont::Helvetica),
        );
        fonts.insert(
            FontKey::new(DEFAULT_FAMILY, true),
            FontData::Standard(StandardFont::HelveticaBold),
        );
        Self { fonts }
    }

    /// Register a custom TrueType face.
    pub fn register(&mut self, family: &str, bold: bool, data: Vec<u8>) -> Result<()> {
        let metrics = CustomFontMetrics::from_font_data(&data)?;
        log::debug!(
            "registered font '{}' (bold: {}, {} glyphs)",
            family,
            bold,
            metrics.glyph_ids.len()
        );
        self.fonts
            .insert(FontKey::new(family, bold), FontData::Custom { data, metrics });
        Ok(())
    }

    /// Look up a font, falling back to the regular weight of the same family
    /// and then to Helvetica.
    pub fn resolve(&self, family: &str, bold: bool) -> &FontData {
        if let Some(font) = self.fonts.get(&FontKey::new(family, bold)) {
            return font;
        }
        if let Some(font) = self.fonts.get(&FontKey::new(family, false)) {
            return font;
        }
        if bold {
            &HELVETICA_BOLD_DATA
        } else {
            &HELVETICA_DATA
        }
    }

    /// The key a (family, bold) request actually resolves to.
    pub fn resolve_key(&self, family: &str, bold: bool) -> FontKey {
        if self.fonts.contains_key(&FontKey::new(family, bold)) {
            FontKey::new(family, bold)
        } else if self.fonts.contains_key(&FontKey::new(family, false)) {
            FontKey::new(family, false)
        } else {
            FontKey::new(DEFAULT_FAMILY, bold)
        }
    }

    /// Get the advance width of a single character in points.
    pub fn char_width(&self, ch: char, family: &str, bold: bool, font_size: f64) -> f64 {
        match self.resolve(family, bold) {
            FontData::Standard(std_font) => std_font.metrics().char_width(ch, font_size),
            FontData::Custom { metrics, .. } => metrics.char_width(ch, font_size),
        }
    }

    /// Measure the width of a string in points.
    pub fn measure_string(&self, text: &str, family: &str, bold: bool, font_size: f64) -> f64 {
        match self.resolve(family, bold) {
            FontData::Standard(std_font) => std_font.metrics().measure_string(text, font_size),
            FontData::Custom { metrics, .. } => {
                text.chars().map(|ch| metrics.char_width(ch, font_size)).sum()
            }
        }
    }

    /// Vertical metrics of a face at `font_size`.
    pub fn line_metrics(&self, family: &str, bold: bool, font_size: f64) -> LineMetrics {
        let (asc, desc, gap, upem) = match self.resolve(family, bold) {
            FontData::Standard(std_font) => {
                let m = std_font.metrics();
                (m.ascender, m.descender, m.line_gap, 1000u16)
            }
            FontData::Custom { metrics, .. } => (
                metrics.ascender,
                metrics.descender,
                metrics.line_gap,
                metrics.units_per_em,
            ),
        };
        let scale = font_size / upem as f64;
        LineMetrics {
            ascent: asc as f64 * scale,
            descent: -(desc as f64) * scale,
            line_gap: gap as f64 * scale,
        }
    }
}
