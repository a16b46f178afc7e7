use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{Rgb, RgbImage};

const GLYPH_SIZE: u32 = 8;

// Unknown characters render as a blank cell of the same width
fn glyph(c: char) -> [u8; 8] {
    BASIC_FONTS.get(c).unwrap_or([0; 8])
}

/// Text rendered with the built-in 8x8 bitmap font, scaled by an integer factor.
#[derive(Debug, Clone, Copy)]
pub struct BitmapText<'a> {
    pub text: &'a str,
    pub scale: u32,
}

impl<'a> BitmapText<'a> {
    pub fn new(text: &'a str, scale: u32) -> Self {
        Self {
            text,
            scale: scale.max(1),
        }
    }

    /// Pixel bounding box (width, height) of the rendered text.
    pub fn size(&self) -> (u32, u32) {
        let chars = self.text.chars().count() as u32;
        (chars * GLYPH_SIZE * self.scale, GLYPH_SIZE * self.scale)
    }

    /// Draws the text with its top-left corner at (x, y). Pixels falling off
    /// the canvas are clipped.
    pub fn draw(&self, canvas: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
        let step = (GLYPH_SIZE * self.scale) as i64;
        for (i, c) in self.text.chars().enumerate() {
            let origin_x = x + i as i64 * step;
            for (row, &bits) in glyph(c).iter().enumerate() {
                for col in 0..GLYPH_SIZE {
                    if bits & (1u8 << col) == 0 {
                        continue;
                    }
                    let px = origin_x + (col * self.scale) as i64;
                    let py = y + (row as u32 * self.scale) as i64;
                    fill_rect(canvas, px, py, self.scale, self.scale, color);
                }
            }
        }
    }
}

/// Fills a rectangle, clipped to the canvas.
pub fn fill_rect(canvas: &mut RgbImage, x: i64, y: i64, width: u32, height: u32, color: Rgb<u8>) {
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + width as i64).min(canvas.width() as i64);
    let y1 = (y + height as i64).min(canvas.height() as i64);
    for py in y0..y1 {
        for px in x0..x1 {
            canvas.put_pixel(px as u32, py as u32, color);
        }
    }
}

/// Draws a rectangle outline `thickness` pixels wide, inside the given bounds.
pub fn stroke_rect(
    canvas: &mut RgbImage,
    x: i64,
    y: i64,
    width: u32,
    height: u32,
    thickness: u32,
    color: Rgb<u8>,
) {
    let t = thickness.min(width).min(height);
    fill_rect(canvas, x, y, width, t, color);
    fill_rect(canvas, x, y + (height - t) as i64, width, t, color);
    fill_rect(canvas, x, y, t, height, color);
    fill_rect(canvas, x + (width - t) as i64, y, t, height, color);
}
