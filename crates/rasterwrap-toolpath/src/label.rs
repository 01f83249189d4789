//! Text labels as intensity grids
//!
//! Labels are drawn white on black at 80% of the row count, vertically
//! centred, and the grid is exactly as wide as the laid-out text.

use crate::error::{LabelError, LabelResult};
use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use image::{GrayImage, Luma};
use rusttype::{point as rt_point, Font, Scale};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

/// Glyph size as a fraction of the label height in rows
pub const LABEL_FONT_RATIO: f32 = 0.8;

/// Renders text into an intensity grid of a fixed height
pub trait LabelRasterizer {
    /// Render `text` into a grid `rows` rows high
    fn rasterize(&self, text: &str, rows: u32) -> LabelResult<GrayImage>;
}

/// Where the label font comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontSource {
    /// A TrueType/OpenType file on disk
    File(PathBuf),
    /// A family name looked up among the installed system fonts.
    /// `Sans`, `Serif` and `Monospace` select the generic families.
    Family(String),
}

impl Default for FontSource {
    fn default() -> Self {
        FontSource::Family("Monospace".to_string())
    }
}

fn system_fonts() -> &'static Database {
    static DB: OnceLock<Database> = OnceLock::new();
    DB.get_or_init(|| {
        let mut db = Database::new();
        db.load_system_fonts();
        debug!("Loaded {} system font faces", db.len());
        db
    })
}

/// Label rasterizer backed by a TrueType font
pub struct FontLabelRasterizer {
    font: Font<'static>,
}

impl FontLabelRasterizer {
    /// Load the font described by `source`
    pub fn from_source(source: &FontSource) -> LabelResult<Self> {
        match source {
            FontSource::File(path) => Self::from_file(path),
            FontSource::Family(family) => Self::from_family(family),
        }
    }

    /// Load a font file
    pub fn from_file<P: AsRef<Path>>(path: P) -> LabelResult<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        Self::from_bytes(bytes).map_err(|_| LabelError::InvalidFont(path.display().to_string()))
    }

    /// Parse font data
    pub fn from_bytes(bytes: Vec<u8>) -> LabelResult<Self> {
        let font = Font::try_from_vec(bytes)
            .ok_or_else(|| LabelError::InvalidFont("unparseable font data".to_string()))?;
        Ok(Self { font })
    }

    /// Look up a regular-weight face of `family` among system fonts
    pub fn from_family(family: &str) -> LabelResult<Self> {
        let families = match family.trim() {
            "" | "Sans" => vec![Family::SansSerif],
            "Serif" => vec![Family::Serif],
            "Monospace" => vec![Family::Monospace],
            other => vec![Family::Name(other)],
        };
        let query = Query {
            families: &families,
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        };

        let db = system_fonts();
        let face = db
            .query(&query)
            .and_then(|id| db.face(id))
            .ok_or_else(|| LabelError::FontNotFound(family.to_string()))?;
        debug!("Using font face {} for family {}", face.post_script_name, family);

        let bytes = match &face.source {
            fontdb::Source::File(path) | fontdb::Source::SharedFile(path, _) => fs::read(path)?,
            fontdb::Source::Binary(data) => data.as_ref().as_ref().to_vec(),
        };
        Self::from_bytes(bytes).map_err(|_| LabelError::InvalidFont(family.to_string()))
    }
}

impl LabelRasterizer for FontLabelRasterizer {
    fn rasterize(&self, text: &str, rows: u32) -> LabelResult<GrayImage> {
        if text.trim().is_empty() || rows == 0 {
            return Err(LabelError::EmptyLabel(text.to_string()));
        }

        let font_size = (rows as f32 * LABEL_FONT_RATIO).floor().max(1.0);
        let scale = Scale::uniform(font_size);
        let v_metrics = self.font.v_metrics(scale);
        let text_height = v_metrics.ascent - v_metrics.descent;
        let top = ((rows as f32 - text_height) / 2.0).floor();

        let glyphs: Vec<_> = self
            .font
            .layout(text, scale, rt_point(0.0, top + v_metrics.ascent))
            .collect();

        let width = glyphs
            .iter()
            .map(|g| {
                let advance = g.position().x + g.unpositioned().h_metrics().advance_width;
                let ink = g.pixel_bounding_box().map_or(0.0, |bb| bb.max.x as f32);
                advance.max(ink)
            })
            .fold(0.0f32, f32::max)
            .ceil() as u32;
        if width == 0 {
            return Err(LabelError::EmptyLabel(text.to_string()));
        }

        let mut img = GrayImage::new(width, rows);
        for glyph in &glyphs {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|x, y, coverage| {
                let px = bb.min.x + x as i32;
                let py = bb.min.y + y as i32;
                if px < 0 || py < 0 || px >= width as i32 || py >= rows as i32 {
                    return;
                }
                let value = (coverage.clamp(0.0, 1.0) * 255.0).round() as u8;
                let pixel = img.get_pixel_mut(px as u32, py as u32);
                pixel.0[0] = pixel.0[0].max(value);
            });
        }

        debug!(text, width, rows, font_size, "Rasterized label");
        Ok(img)
    }
}

/// Rasterizer that draws every label as a solid block, for dry runs and tests
#[derive(Debug, Clone, Copy)]
pub struct BlockLabelRasterizer {
    /// Columns per character
    pub columns_per_char: u32,
    /// Intensity of the block
    pub intensity: u8,
}

impl Default for BlockLabelRasterizer {
    fn default() -> Self {
        Self {
            columns_per_char: 4,
            intensity: 255,
        }
    }
}

impl LabelRasterizer for BlockLabelRasterizer {
    fn rasterize(&self, text: &str, rows: u32) -> LabelResult<GrayImage> {
        let chars = text.chars().count() as u32;
        if text.trim().is_empty() || rows == 0 || self.columns_per_char == 0 {
            return Err(LabelError::EmptyLabel(text.to_string()));
        }
        Ok(GrayImage::from_pixel(
            chars * self.columns_per_char,
            rows,
            Luma([self.intensity]),
        ))
    }
}
