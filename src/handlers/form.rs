use axum::extract::Multipart;

use crate::error::AppError;
use crate::models::{FitPreference, Occasion, Photo, StyleParams, StyleVibe};

const ALLOWED_PHOTO_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];
const MAX_HEIGHT_CM: f64 = 300.0;
const MAX_WEIGHT_KG: f64 = 500.0;

/// Raw multipart fields of a generate request, before validation.
#[derive(Debug, Default)]
pub struct GenerateForm {
    pub photo: Option<(Option<String>, Vec<u8>)>, // (content type, bytes)
    pub height_cm: Option<String>,
    pub occasion: Option<String>,
    pub weight_kg: Option<String>,
    pub style_vibe: Option<String>,
    pub fit_preference: Option<String>,
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError::BadRequest(message.into())
}

// Blank optional fields count as not provided
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_measure(name: &str, raw: &str, max: f64) -> Result<f64, AppError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| bad_request(format!("Invalid {name}. Must be a number.")))?;
    if !value.is_finite() || value <= 0.0 || value > max {
        return Err(bad_request(format!(
            "Invalid {name}. Must be greater than 0 and at most {max}."
        )));
    }
    Ok(value)
}

pub async fn read_form(mut multipart: Multipart) -> Result<GenerateForm, AppError> {
    let mut form = GenerateForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| bad_request(format!("Invalid form data: {err}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "photo" {
            let content_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|err| bad_request(format!("Failed to read photo: {err}")))?;
            form.photo = Some((content_type, bytes.to_vec()));
            continue;
        }

        let slot = match name.as_str() {
            "height_cm" => &mut form.height_cm,
            "occasion" => &mut form.occasion,
            "weight_kg" => &mut form.weight_kg,
            "style_vibe" => &mut form.style_vibe,
            "fit_preference" => &mut form.fit_preference,
            _ => continue,
        };
        let text = field
            .text()
            .await
            .map_err(|err| bad_request(format!("Invalid value for {name}: {err}")))?;
        *slot = Some(text);
    }

    Ok(form)
}

impl GenerateForm {
    /// Checks every field and returns the photo plus typed parameters.
    pub fn validate(self, max_upload_bytes: usize) -> Result<(Photo, StyleParams), AppError> {
        let (content_type, bytes) = self
            .photo
            .ok_or_else(|| bad_request("Missing required field: photo"))?;
        let mime_type = content_type
            .filter(|ct| ALLOWED_PHOTO_TYPES.contains(&ct.as_str()))
            .ok_or_else(|| {
                bad_request(format!(
                    "Invalid file type. Allowed: {}",
                    ALLOWED_PHOTO_TYPES.join(", ")
                ))
            })?;

        let height_raw = non_empty(&self.height_cm)
            .ok_or_else(|| bad_request("Missing required field: height_cm"))?;
        let occasion_raw = non_empty(&self.occasion)
            .ok_or_else(|| bad_request("Missing required field: occasion"))?;
        let occasion = Occasion::parse(occasion_raw).ok_or_else(|| {
            bad_request(format!(
                "Invalid occasion. Must be one of: {}",
                Occasion::choices()
            ))
        })?;

        let style_vibe = match non_empty(&self.style_vibe) {
            Some(raw) => Some(StyleVibe::parse(raw).ok_or_else(|| {
                bad_request(format!(
                    "Invalid style_vibe. Must be one of: {}",
                    StyleVibe::choices()
                ))
            })?),
            None => None,
        };
        let fit_preference = match non_empty(&self.fit_preference) {
            Some(raw) => Some(FitPreference::parse(raw).ok_or_else(|| {
                bad_request(format!(
                    "Invalid fit_preference. Must be one of: {}",
                    FitPreference::choices()
                ))
            })?),
            None => None,
        };

        let height_cm = parse_measure("height_cm", height_raw, MAX_HEIGHT_CM)?;
        let weight_kg = non_empty(&self.weight_kg)
            .map(|raw| parse_measure("weight_kg", raw, MAX_WEIGHT_KG))
            .transpose()?;

        if bytes.is_empty() {
            return Err(bad_request("Photo is empty."));
        }
        if bytes.len() > max_upload_bytes {
            return Err(bad_request(format!(
                "File too large. Maximum size is {}MB.",
                max_upload_bytes / (1024 * 1024)
            )));
        }

        Ok((
            Photo { bytes, mime_type },
            StyleParams {
                height_cm,
                occasion,
                weight_kg,
                style_vibe,
                fit_preference,
            },
        ))
    }
}
