use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use tracing::{info, warn};

use crate::collage::{self, GridLayout};
use crate::gemini::ModelError;
use crate::models::{HairCollage, Photo, StyleParams, StyleReport};

/// Image returned by the upstream model, already base64-decoded.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// The generative model behind /api/generate.
#[async_trait]
pub trait StyleModel: Send + Sync {
    async fn style_report(&self, photo: &Photo, params: &StyleParams) -> Result<StyleReport, ModelError>;

    /// Hairstyle illustration(s) for the collage. The model may answer with a
    /// single composite, one image per cell, or nothing usable.
    async fn hair_images(&self, photo: &Photo, hairstyles: &[String]) -> Result<Vec<GeneratedImage>, ModelError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollageSource {
    Model,
    Composed,
    Placeholder,
}

impl CollageSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollageSource::Model => "model",
            CollageSource::Composed => "composed",
            CollageSource::Placeholder => "placeholder",
        }
    }
}

fn placeholder_collage(layout: &GridLayout) -> Result<(HairCollage, CollageSource), collage::Error> {
    let b64 = collage::placeholder(layout.grid_size, layout.cell_size)?;
    Ok((HairCollage::png(b64), CollageSource::Placeholder))
}

/// Turns whatever the image model produced into the response collage.
///
/// One image is passed through untouched, exactly one image per cell is
/// composited (labelled with the hairstyle names), and anything else,
/// including a model or compositing failure, falls back to the placeholder
/// grid. Only a failing placeholder is an error.
pub fn assemble_collage(
    generated: Result<Vec<GeneratedImage>, ModelError>,
    hairstyles: &[String],
    layout: &GridLayout,
) -> Result<(HairCollage, CollageSource), collage::Error> {
    let images = match generated {
        Ok(images) => images,
        Err(err) => {
            warn!("Hair image generation failed, using placeholder: {err}");
            return placeholder_collage(layout);
        }
    };

    if images.len() == 1 {
        let image = &images[0];
        let collage = HairCollage {
            base64: general_purpose::STANDARD.encode(&image.bytes),
            mime: image.mime_type.clone(),
            ..HairCollage::png(String::new())
        };
        return Ok((collage, CollageSource::Model));
    }

    if images.len() != layout.cell_count() {
        info!(
            "Image model returned {} images, expected 1 or {}; using placeholder",
            images.len(),
            layout.cell_count()
        );
        return placeholder_collage(layout);
    }

    let tiles: Vec<&[u8]> = images.iter().map(|image| image.bytes.as_slice()).collect();
    let labels: Vec<String> = hairstyles.iter().take(tiles.len()).cloned().collect();
    let labels = (!labels.is_empty()).then_some(labels.as_slice());

    match collage::compose(&tiles, labels, layout) {
        Ok(b64) => Ok((HairCollage::png(b64), CollageSource::Composed)),
        Err(err) => {
            warn!(kind = ?err.kind(), "Compositing model images failed, using placeholder: {err}");
            placeholder_collage(layout)
        }
    }
}
