//! Glyph tables for the bitmap controller
//!
//! Each printable ASCII character becomes a 16-pixel-tall glyph stored as
//! column bytes in SSD1306 page order: the top page (pixel rows 0-7, LSB at
//! the top) followed by the bottom page (rows 8-15). Tables are rendered
//! once from the `embedded-graphics` mono fonts when the engine is built.

use core::convert::Infallible;

use embedded_graphics::mono_font::ascii::{FONT_7X14, FONT_8X13};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Glyph height in pixels (two controller pages)
pub const GLYPH_HEIGHT: usize = 16;

/// Widest supported glyph
pub const MAX_GLYPH_WIDTH: usize = 8;

/// First character in the tables
const FIRST_CHAR: u8 = 0x20;

/// Number of characters in the tables (0x20..=0x7e)
const CHAR_COUNT: usize = 0x5f;

/// Rendered for bytes outside the table
const FALLBACK_CHAR: u8 = b'.';

/// Selectable glyph table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GlyphFont {
    /// 7 pixels wide; 16 columns leave 16 blank pixels at the right edge
    Narrow7x16,
    /// 8 pixels wide; 16 columns fill the 128-pixel panel
    #[default]
    Wide8x16,
}

impl GlyphFont {
    /// Glyph width in pixels
    pub const fn width(self) -> usize {
        match self {
            GlyphFont::Narrow7x16 => 7,
            GlyphFont::Wide8x16 => 8,
        }
    }

    fn source(self) -> &'static MonoFont<'static> {
        match self {
            GlyphFont::Narrow7x16 => &FONT_7X14,
            GlyphFont::Wide8x16 => &FONT_8X13,
        }
    }
}

/// One glyph, split into its two pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph<'a> {
    /// Column bytes for pixel rows 0-7
    pub top: &'a [u8],
    /// Column bytes for pixel rows 8-15
    pub bottom: &'a [u8],
}

/// Rendered glyph table
pub struct GlyphTable {
    font: GlyphFont,
    glyphs: [[u8; 2 * MAX_GLYPH_WIDTH]; CHAR_COUNT],
}

impl GlyphTable {
    /// Render every printable character of `font`
    pub fn new(font: GlyphFont) -> Self {
        let mut glyphs = [[0u8; 2 * MAX_GLYPH_WIDTH]; CHAR_COUNT];
        let source = font.source();
        let style = MonoTextStyle::new(source, BinaryColor::On);
        // Centre the source cell vertically in the 16-pixel glyph
        let top = (GLYPH_HEIGHT as i32 - source.character_size.height as i32) / 2;

        for (index, glyph) in glyphs.iter_mut().enumerate() {
            let mut canvas = GlyphCanvas::default();
            let mut utf8 = [0u8; 4];
            let ch = char::from(FIRST_CHAR + index as u8).encode_utf8(&mut utf8);
            let _ = Text::with_baseline(ch, Point::new(0, top), style, Baseline::Top)
                .draw(&mut canvas);

            let width = font.width();
            for (x, column) in canvas.columns.iter().take(width).enumerate() {
                glyph[x] = *column as u8;
                glyph[width + x] = (*column >> 8) as u8;
            }
        }

        Self { font, glyphs }
    }

    /// Font the table was rendered from
    pub fn font(&self) -> GlyphFont {
        self.font
    }

    /// Glyph width in pixels
    pub fn width(&self) -> usize {
        self.font.width()
    }

    /// Look up a character; bytes outside 0x20..=0x7e map to '.'
    pub fn glyph(&self, ch: u8) -> Glyph<'_> {
        let index = match ch.checked_sub(FIRST_CHAR) {
            Some(i) if (i as usize) < CHAR_COUNT => i as usize,
            _ => (FALLBACK_CHAR - FIRST_CHAR) as usize,
        };
        let width = self.width();
        let data = &self.glyphs[index];
        Glyph {
            top: &data[..width],
            bottom: &data[width..2 * width],
        }
    }
}

/// Draw target collecting one glyph as 16-bit pixel columns
#[derive(Default)]
struct GlyphCanvas {
    columns: [u16; MAX_GLYPH_WIDTH],
}

impl OriginDimensions for GlyphCanvas {
    fn size(&self) -> Size {
        Size::new(MAX_GLYPH_WIDTH as u32, GLYPH_HEIGHT as u32)
    }
}

impl DrawTarget for GlyphCanvas {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            let x = point.x as usize;
            let y = point.y as usize;
            if color.is_on() && point.x >= 0 && point.y >= 0 && x < MAX_GLYPH_WIDTH && y < GLYPH_HEIGHT {
                self.columns[x] |= 1 << y;
            }
        }
        Ok(())
    }
}
