use serde::{Deserialize, Serialize};

pub const COLLAGE_MIME: &str = "image/png";
pub const COLLAGE_NOTE: &str = "Screenshot and crop any style you like.";

// Closed choice lists accepted by /api/generate
macro_rules! choice_enum {
    ($name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            pub fn parse(value: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|v| v.as_str() == value)
            }

            pub fn choices() -> String {
                Self::ALL
                    .iter()
                    .map(|v| v.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        }
    };
}

choice_enum!(Occasion {
    Daily => "Daily",
    Work => "Work",
    Date => "Date",
    Interview => "Interview",
    Party => "Party",
});

choice_enum!(StyleVibe {
    Minimal => "Minimal",
    Street => "Street",
    Casual => "Casual",
    Classic => "Classic",
    Sporty => "Sporty",
});

choice_enum!(FitPreference {
    SlimNo => "Slim-No",
    OversizedNo => "Oversized-No",
    NoPreference => "Doesn't matter",
});

// Uploaded photo, kept in memory for the lifetime of the request only
#[derive(Clone)]
pub struct Photo {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl std::fmt::Debug for Photo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Photo")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

// Validated body/preference parameters
#[derive(Debug, Clone, PartialEq)]
pub struct StyleParams {
    pub height_cm: f64,
    pub occasion: Occasion,
    pub weight_kg: Option<f64>,
    pub style_vibe: Option<StyleVibe>,
    pub fit_preference: Option<FitPreference>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BodyFitGuidance {
    pub overall: String,
    pub r#do: Vec<String>,
    pub avoid: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColorGuidance {
    pub best: Vec<String>,
    pub avoid: Vec<String>,
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutfitItems {
    pub top: String,
    pub bottom: String,
    pub shoes: String,
    #[serde(default)]
    pub outerwear: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutfitSuggestion {
    pub title: String,
    pub items: OutfitItems,
    pub why: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HairstyleRecommendation {
    pub name: String,
    pub why: String,
    pub how: String,
}

/// Style report as produced by the text model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StyleReport {
    pub summary: Vec<String>,
    pub body_fit: BodyFitGuidance,
    pub colors: ColorGuidance,
    pub outfits: Vec<OutfitSuggestion>,
    pub styling_tips: Vec<String>,
    pub hairstyles: Vec<HairstyleRecommendation>,
}

impl StyleReport {
    pub fn hairstyle_names(&self) -> Vec<String> {
        self.hairstyles.iter().map(|h| h.name.clone()).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HairCollage {
    pub mime: String,
    pub base64: String,
    pub note: String,
}

impl HairCollage {
    pub fn png(base64: String) -> Self {
        Self {
            mime: COLLAGE_MIME.to_string(),
            base64,
            note: COLLAGE_NOTE.to_string(),
        }
    }
}

// /api/generate response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerateResponse {
    pub result: StyleReport,
    pub hair_collage: HairCollage,
}
