//! Square grid compositor for the hairstyle collage.
//!
//! `compose` tiles `grid_size²` already-generated images into one PNG, and
//! `placeholder` draws the same grid with numbered empty cells when no source
//! images are available. Both return base64 so the result can be dropped
//! straight into a JSON field.

mod font;

use std::io::Cursor;

use base64::{Engine as _, engine::general_purpose};
use image::imageops::{self, FilterType};
use image::{ImageError, ImageFormat, Rgb, RgbImage};

use font::{BitmapText, fill_rect, stroke_rect};

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
pub const GRAY: Rgb<u8> = Rgb([128, 128, 128]);

// 8000x8000 RGB is already ~190MB
const MAX_CANVAS_PIXELS: u64 = 64_000_000;

const LABEL_MARGIN: u32 = 10;
const LABEL_PADDING: u32 = 5;
const BORDER_WIDTH: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    ResourceExhausted,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("expected {expected} images for the grid, got {actual}")]
    ImageCount { expected: usize, actual: usize },

    #[error("{0} must be positive")]
    NonPositive(&'static str),

    #[error("got {labels} labels for {images} images")]
    TooManyLabels { labels: usize, images: usize },

    #[error("image {index} could not be decoded: {source}")]
    Decode { index: usize, source: ImageError },

    #[error("image {index} exceeds decoder limits")]
    DecodeLimits { index: usize },

    #[error("canvas of {side}x{side} pixels is too large")]
    CanvasTooLarge { side: u64 },

    #[error("failed to encode collage: {0}")]
    Encode(ImageError),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ImageCount { .. }
            | Error::NonPositive(_)
            | Error::TooManyLabels { .. }
            | Error::Decode { .. } => ErrorKind::InvalidInput,
            Error::DecodeLimits { .. } | Error::CanvasTooLarge { .. } | Error::Encode(_) => {
                ErrorKind::ResourceExhausted
            }
        }
    }
}

/// Grid geometry and fill color.
#[derive(Debug, Clone, Copy)]
pub struct GridLayout {
    pub grid_size: u32,
    pub cell_size: u32,
    pub background: Rgb<u8>,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            grid_size: 3,
            cell_size: 400,
            background: WHITE,
        }
    }
}

impl GridLayout {
    pub fn new(grid_size: u32, cell_size: u32) -> Self {
        Self {
            grid_size,
            cell_size,
            ..Self::default()
        }
    }

    pub fn cell_count(&self) -> usize {
        (self.grid_size as usize).pow(2)
    }

    // Top-left pixel of cell `idx`, row-major
    fn cell_origin(&self, idx: usize) -> (u32, u32) {
        let grid = self.grid_size as usize;
        let (row, col) = (idx / grid, idx % grid);
        (col as u32 * self.cell_size, row as u32 * self.cell_size)
    }

    fn label_scale(&self) -> u32 {
        (self.cell_size / 200).max(1)
    }

    fn blank_canvas(&self) -> Result<RgbImage, Error> {
        if self.grid_size == 0 {
            return Err(Error::NonPositive("grid_size"));
        }
        if self.cell_size == 0 {
            return Err(Error::NonPositive("cell_size"));
        }
        let side = (self.grid_size as u64) * (self.cell_size as u64);
        match side.checked_mul(side) {
            Some(area) if area <= MAX_CANVAS_PIXELS => {}
            _ => return Err(Error::CanvasTooLarge { side }),
        }
        Ok(RgbImage::from_pixel(side as u32, side as u32, self.background))
    }
}

#[derive(Debug, Clone, Copy)]
enum Anchor {
    Bottom,
    Center,
}

/// Draws `text` inside a cell. Text wider than the cell is cut to fit.
fn draw_caption(
    canvas: &mut RgbImage,
    layout: &GridLayout,
    idx: usize,
    text: &str,
    anchor: Anchor,
    ink: Rgb<u8>,
    backing: Option<Rgb<u8>>,
) {
    let (cell_x, cell_y) = layout.cell_origin(idx);
    let cell = layout.cell_size as i64;
    let scale = layout.label_scale();

    let glyph_width = BitmapText::new("W", scale).size().0;
    let room = layout.cell_size.saturating_sub(2 * LABEL_PADDING) / glyph_width;
    let clipped: String = text.chars().take(room as usize).collect();
    if clipped.is_empty() {
        return;
    }
    let label = BitmapText::new(&clipped, scale);
    let (width, height) = label.size();

    let text_x = cell_x as i64 + (cell - width as i64) / 2;
    let text_y = match anchor {
        Anchor::Bottom => cell_y as i64 + cell - height as i64 - LABEL_MARGIN as i64,
        Anchor::Center => cell_y as i64 + (cell - height as i64) / 2,
    }
    // backing box must not spill into the cell above
    .max(cell_y as i64 + LABEL_PADDING as i64);

    if let Some(fill) = backing {
        fill_rect(
            canvas,
            text_x - LABEL_PADDING as i64,
            text_y - LABEL_PADDING as i64,
            width + 2 * LABEL_PADDING,
            height + 2 * LABEL_PADDING,
            fill,
        );
    }
    label.draw(canvas, text_x, text_y, ink);
}

fn encode(canvas: &RgbImage) -> Result<String, Error> {
    let mut png = Vec::new();
    canvas
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(Error::Encode)?;
    Ok(general_purpose::STANDARD.encode(&png))
}

/// Tiles `images` row-major into a `grid_size x grid_size` canvas and returns
/// the PNG as base64.
///
/// Every image is resized to exactly one cell with Lanczos3. A label, when
/// present for a cell, is centred near the cell's bottom edge on an opaque
/// white box. Any bad input fails the whole composition.
pub fn compose<B: AsRef<[u8]>>(
    images: &[B],
    labels: Option<&[String]>,
    layout: &GridLayout,
) -> Result<String, Error> {
    if layout.grid_size == 0 {
        return Err(Error::NonPositive("grid_size"));
    }
    if images.len() != layout.cell_count() {
        return Err(Error::ImageCount {
            expected: layout.cell_count(),
            actual: images.len(),
        });
    }
    if let Some(labels) = labels {
        if labels.len() > images.len() {
            return Err(Error::TooManyLabels {
                labels: labels.len(),
                images: images.len(),
            });
        }
    }

    let mut canvas = layout.blank_canvas()?;

    for (idx, bytes) in images.iter().enumerate() {
        let decoded = image::load_from_memory(bytes.as_ref()).map_err(|source| match source {
            ImageError::Limits(_) => Error::DecodeLimits { index: idx },
            source => Error::Decode { index: idx, source },
        })?;
        let tile = decoded
            .resize_exact(layout.cell_size, layout.cell_size, FilterType::Lanczos3)
            .to_rgb8();

        let (x, y) = layout.cell_origin(idx);
        imageops::replace(&mut canvas, &tile, x as i64, y as i64);

        if let Some(text) = labels.and_then(|labels| labels.get(idx)) {
            draw_caption(&mut canvas, layout, idx, text, Anchor::Bottom, BLACK, Some(WHITE));
        }
    }

    encode(&canvas)
}

/// Captions used by the placeholder grid: "Style 1" .. "Style N²".
pub fn placeholder_labels(grid_size: u32) -> Vec<String> {
    (1..=(grid_size as usize).pow(2))
        .map(|n| format!("Style {n}"))
        .collect()
}

/// Degraded-mode collage: bordered empty cells with a centred "Style N"
/// caption. Needs nothing beyond the built-in font.
pub fn placeholder(grid_size: u32, cell_size: u32) -> Result<String, Error> {
    let layout = GridLayout::new(grid_size, cell_size);
    let mut canvas = layout.blank_canvas()?;

    for (idx, text) in placeholder_labels(grid_size).iter().enumerate() {
        let (x, y) = layout.cell_origin(idx);
        stroke_rect(
            &mut canvas,
            x as i64,
            y as i64,
            cell_size,
            cell_size,
            BORDER_WIDTH,
            GRAY,
        );
        draw_caption(&mut canvas, &layout, idx, text, Anchor::Center, GRAY, None);
    }

    encode(&canvas)
}
