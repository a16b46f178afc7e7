use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use base64::{Engine as _, engine::general_purpose};
use http_body_util::BodyExt;
use image::{GenericImageView, ImageFormat, Rgb, RgbImage};
use serde_json::Value;
use tower::ServiceExt;

use crate::collage::GridLayout;
use crate::gemini::ModelError;
use crate::handlers::router;
use crate::models::{
    BodyFitGuidance, ColorGuidance, HairstyleRecommendation, OutfitItems, OutfitSuggestion, Photo,
    StyleParams, StyleReport,
};
use crate::rate_limit::RateLimiter;
use crate::state::AppState;
use crate::stylist::{GeneratedImage, StyleModel};

const BOUNDARY: &str = "stylist-test-boundary";

#[derive(Clone, Copy)]
enum ImageReply {
    Tiles,
    Single,
    Fail,
}

struct FakeModel {
    fail_report: bool,
    images: ImageReply,
    report_calls: AtomicUsize,
}

impl FakeModel {
    fn new(images: ImageReply) -> Self {
        Self {
            fail_report: false,
            images,
            report_calls: AtomicUsize::new(0),
        }
    }
}

fn png(color: Rgb<u8>) -> Vec<u8> {
    let img = RgbImage::from_pixel(16, 16, color);
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .unwrap();
    out
}

fn report() -> StyleReport {
    StyleReport {
        summary: vec!["Structured pieces work well".to_string()],
        body_fit: BodyFitGuidance {
            overall: "Balanced proportions".to_string(),
            r#do: vec!["Tapered trousers".to_string()],
            avoid: vec!["Very long tops".to_string()],
        },
        colors: ColorGuidance {
            best: vec!["Navy".to_string()],
            avoid: vec!["Neon yellow".to_string()],
            notes: "Cool undertones".to_string(),
        },
        outfits: vec![OutfitSuggestion {
            title: "Smart casual".to_string(),
            items: OutfitItems {
                top: "Knit polo".to_string(),
                bottom: "Chinos".to_string(),
                shoes: "White sneakers".to_string(),
                outerwear: String::new(),
            },
            why: "Relaxed but neat".to_string(),
        }],
        styling_tips: vec!["Roll the sleeves once".to_string()],
        hairstyles: (1..=9)
            .map(|i| HairstyleRecommendation {
                name: format!("Cut {i}"),
                why: "Frames the face".to_string(),
                how: "Light product".to_string(),
            })
            .collect(),
    }
}

#[async_trait]
impl StyleModel for FakeModel {
    async fn style_report(&self, _photo: &Photo, _params: &StyleParams) -> Result<StyleReport, ModelError> {
        self.report_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_report {
            return Err(ModelError::Status {
                status: 500,
                message: "upstream exploded with secret details".to_string(),
            });
        }
        Ok(report())
    }

    async fn hair_images(&self, _photo: &Photo, hairstyles: &[String]) -> Result<Vec<GeneratedImage>, ModelError> {
        assert_eq!(hairstyles.len(), 9);
        let image = |color| GeneratedImage {
            mime_type: "image/png".to_string(),
            bytes: png(color),
        };
        match self.images {
            ImageReply::Tiles => Ok((0..9).map(|i| image(Rgb([i * 25, 80, 160]))).collect()),
            ImageReply::Single => Ok(vec![image(Rgb([1, 2, 3]))]),
            ImageReply::Fail => Err(ModelError::EmptyResponse),
        }
    }
}

fn app_with(model: Arc<FakeModel>, max_requests: u32) -> axum::Router {
    let state = Arc::new(AppState {
        model,
        rate_limiter: RateLimiter::new(max_requests, 3600).unwrap(),
        collage_layout: GridLayout::new(3, 40),
        max_upload_bytes: 64 * 1024,
    });
    router(state)
}

struct Upload<'a> {
    fields: Vec<(&'a str, &'a str)>,
    photo: Option<(&'a str, Vec<u8>)>,
}

impl<'a> Upload<'a> {
    fn valid() -> Self {
        Self {
            fields: vec![("height_cm", "178"), ("occasion", "Work"), ("style_vibe", "Minimal")],
            photo: Some(("image/png", png(Rgb([200, 180, 160])))),
        }
    }

    fn body(&self) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in &self.fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((content_type, bytes)) = &self.photo {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"me\"\r\nContent-Type: {content_type}\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn request(&self, client_ip: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/generate")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .header("x-forwarded-for", client_ip)
            .body(Body::from(self.body()))
            .unwrap()
    }
}

async fn json_body(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn generate_composes_model_tiles() {
    let model = Arc::new(FakeModel::new(ImageReply::Tiles));
    let app = app_with(model.clone(), 10);

    let response = app.oneshot(Upload::valid().request("198.51.100.1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["result"]["hairstyles"].as_array().unwrap().len(), 9);
    assert_eq!(body["result"]["body_fit"]["do"][0], "Tapered trousers");
    assert_eq!(body["hair_collage"]["mime"], "image/png");
    assert_eq!(body["hair_collage"]["note"], "Screenshot and crop any style you like.");

    let png = general_purpose::STANDARD
        .decode(body["hair_collage"]["base64"].as_str().unwrap())
        .unwrap();
    let collage = image::load_from_memory(&png).unwrap();
    assert_eq!(collage.dimensions(), (120, 120));
    assert_eq!(model.report_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn single_model_image_is_returned_as_is() {
    let app = app_with(Arc::new(FakeModel::new(ImageReply::Single)), 10);

    let response = app.oneshot(Upload::valid().request("198.51.100.2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let expected = general_purpose::STANDARD.encode(png(Rgb([1, 2, 3])));
    assert_eq!(body["hair_collage"]["base64"], expected.as_str());
}

#[tokio::test]
async fn image_failure_still_returns_placeholder_collage() {
    let app = app_with(Arc::new(FakeModel::new(ImageReply::Fail)), 10);

    let response = app.oneshot(Upload::valid().request("198.51.100.3")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let png = general_purpose::STANDARD
        .decode(body["hair_collage"]["base64"].as_str().unwrap())
        .unwrap();
    assert_eq!(image::load_from_memory(&png).unwrap().dimensions(), (120, 120));
}

#[tokio::test]
async fn report_failure_is_a_generic_500() {
    let model = Arc::new(FakeModel {
        fail_report: true,
        ..FakeModel::new(ImageReply::Tiles)
    });
    let app = app_with(model, 10);

    let response = app.oneshot(Upload::valid().request("198.51.100.4")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = json_body(response).await;
    let detail = body["detail"].as_str().unwrap();
    assert_eq!(detail, "Failed to generate style report. Please try again.");
    assert!(!detail.contains("secret"));
}

#[tokio::test]
async fn invalid_occasion_is_rejected_before_model_call() {
    let model = Arc::new(FakeModel::new(ImageReply::Tiles));
    let app = app_with(model.clone(), 10);
    let upload = Upload {
        fields: vec![("height_cm", "178"), ("occasion", "Brunch")],
        ..Upload::valid()
    };

    let response = app.oneshot(upload.request("198.51.100.5")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert!(body["detail"].as_str().unwrap().starts_with("Invalid occasion"));
    assert_eq!(model.report_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unsupported_photo_type_is_rejected() {
    let app = app_with(Arc::new(FakeModel::new(ImageReply::Tiles)), 10);
    let upload = Upload {
        photo: Some(("application/pdf", b"%PDF-1.7".to_vec())),
        ..Upload::valid()
    };

    let response = app.oneshot(upload.request("198.51.100.6")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(
        body["detail"],
        "Invalid file type. Allowed: image/jpeg, image/png, image/webp"
    );
}

#[tokio::test]
async fn oversized_photo_is_rejected() {
    let app = app_with(Arc::new(FakeModel::new(ImageReply::Tiles)), 10);
    let upload = Upload {
        photo: Some(("image/jpeg", vec![0u8; 64 * 1024 + 1])),
        ..Upload::valid()
    };

    let response = app.oneshot(upload.request("198.51.100.7")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["detail"].as_str().unwrap().starts_with("File too large"));
}

#[tokio::test]
async fn rate_limit_returns_429_with_retry_after() {
    let model = Arc::new(FakeModel::new(ImageReply::Tiles));
    let app = app_with(model.clone(), 2);

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(Upload::valid().request("203.0.113.9"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(Upload::valid().request("203.0.113.9"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = response.headers()[header::RETRY_AFTER]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(retry_after > 0 && retry_after <= 3600);
    let body = json_body(response).await;
    assert_eq!(
        body["detail"],
        format!("Rate limit exceeded. Try again in {retry_after} seconds.")
    );
    assert_eq!(model.report_calls.load(Ordering::SeqCst), 2);

    // another client is unaffected
    let response = app
        .oneshot(Upload::valid().request("203.0.113.10"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_reports_service_name() {
    let app = app_with(Arc::new(FakeModel::new(ImageReply::Tiles)), 10);
    let request = Request::builder()
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "ai-personal-stylist");
}

#[tokio::test]
async fn metrics_expose_request_counter() {
    let app = app_with(Arc::new(FakeModel::new(ImageReply::Tiles)), 10);
    let response = app
        .clone()
        .oneshot(Upload::valid().request("198.51.100.8"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let request = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("stylist_requests_total"));
    assert!(text.contains("stylist_collages_total"));
}
