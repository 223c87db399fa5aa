//! End-to-end tests for the HTTP interface.
//!
//! Requests go through the real router with a dummy printer (or a device path
//! that does not exist, to exercise printer failures).

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;

use promptslip::{
    server::{self, AppState, ServerConfig},
    sink::SinkConfig,
    topics::{StaticTopicSource, TopicSource},
};

const BOUNDARY: &str = "promptslip-test-boundary";

const TOPICS: &str = "\nCONVERSATION TOPICS\n========================================\n\n1. What made you smile today?\n\n========================================\n";

enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
}

fn multipart_body(parts: &[Part]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend(format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes());
                body.extend(value.as_bytes());
            }
            Part::File {
                name,
                filename,
                content_type,
                data,
            } => {
                body.extend(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, filename, content_type
                    )
                    .as_bytes(),
                );
                body.extend(*data);
            }
        }
        body.extend(b"\r\n");
    }
    body.extend(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn print_request(parts: &[Part]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/print")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x * 4) as u8, (y * 4) as u8, 128]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

fn app_with(sink: SinkConfig, topics: Arc<dyn TopicSource>) -> Router {
    let config = ServerConfig {
        sink,
        ..ServerConfig::default()
    };
    server::router(Arc::new(AppState::new(config, topics)))
}

fn dummy_app() -> Router {
    app_with(
        SinkConfig::Dummy { output: None },
        Arc::new(StaticTopicSource::new(TOPICS)),
    )
}

fn location(response: &axum::response::Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect has a location")
        .to_str()
        .unwrap()
        .to_string()
}

/// Decode the `conversation_text` query parameter of a redirect.
fn conversation_text(location: &str) -> String {
    let query = location.split_once('?').map(|(_, q)| q).unwrap_or("");
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "conversation_text")
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_image_with_generated_topics_redirects() {
    let png = png_bytes(40, 30);
    let response = dummy_app()
        .oneshot(print_request(&[Part::File {
            name: "file",
            filename: "photo.png",
            content_type: "image/png",
            data: &png,
        }]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = location(&response);
    assert!(location.starts_with("/?success=true&conversation_text="));
    assert!(conversation_text(&location).contains("CONVERSATION TOPICS"));
}

#[tokio::test]
async fn test_raw_text_printed_sanitized() {
    let response = dummy_app()
        .oneshot(print_request(&[Part::Text("raw_text", "“Hello”, it’s working — right…?")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        conversation_text(&location(&response)),
        "\"Hello\", it's working -- right...?"
    );
}

#[tokio::test]
async fn test_blank_raw_text_uses_topics() {
    let response = dummy_app()
        .oneshot(print_request(&[
            Part::Text("raw_text", "   "),
            Part::Text("user_prompt", "travel"),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(conversation_text(&location(&response)), TOPICS);
}

#[tokio::test]
async fn test_unsupported_content_type_rejected() {
    let response = dummy_app()
        .oneshot(print_request(&[Part::File {
            name: "file",
            filename: "notes.txt",
            content_type: "text/plain",
            data: b"definitely not an image",
        }]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "Unsupported file type");
}

#[tokio::test]
async fn test_corrupt_image_rejected() {
    let response = dummy_app()
        .oneshot(print_request(&[Part::File {
            name: "file",
            filename: "broken.jpg",
            content_type: "image/jpeg",
            data: b"\xFF\xD8\xFF\xE0 truncated",
        }]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_overly_tall_image_rejected() {
    let png = png_bytes(1, 2000);
    let response = dummy_app()
        .oneshot(print_request(&[Part::File {
            name: "file",
            filename: "strip.png",
            content_type: "image/png",
            data: &png,
        }]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_printer_failure_is_500() {
    let app = app_with(
        SinkConfig::Device {
            path: PathBuf::from("/nonexistent/promptslip-lp0"),
            baud: None,
        },
        Arc::new(StaticTopicSource::new(TOPICS)),
    );
    let response = app
        .oneshot(print_request(&[Part::Text("raw_text", "hello")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(response).await.contains("/nonexistent/promptslip-lp0"));
}

#[tokio::test]
async fn test_dummy_output_saved() {
    let path = std::env::temp_dir().join(format!("promptslip-http-{}.escpos", std::process::id()));
    let app = app_with(
        SinkConfig::Dummy {
            output: Some(path.clone()),
        },
        Arc::new(StaticTopicSource::new(TOPICS)),
    );
    let response = app
        .oneshot(print_request(&[Part::Text("raw_text", "saved slip")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let bytes = std::fs::read(&path).unwrap();
    std::fs::remove_file(&path).ok();
    // ESC @, spacer, text, GS V B 0
    assert!(bytes.starts_with(b"\x1b@\n"));
    assert!(bytes.windows(10).any(|w| w == b"saved slip"));
    assert!(bytes.ends_with(&[0x1D, 0x56, 0x42, 0x00]));
}

#[tokio::test]
async fn test_index_shows_printed_text() {
    let response = dummy_app()
        .oneshot(
            Request::builder()
                .uri("/?success=true&conversation_text=1.+Why%3F")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("1. Why?"));
}

#[tokio::test]
async fn test_banner_flow() {
    let app = dummy_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/banner")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("text=HELLO+WORLD"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let page = location(&response);
    assert!(page.starts_with("/banner/"));

    let response = app
        .clone()
        .oneshot(Request::builder().uri(&page).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("HELLO WORLD"));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("{}/image.png", page))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    let png = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let decoded = image::load_from_memory(&png).unwrap();
    assert_eq!(decoded.width(), 576);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("{}/print", page))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).ends_with("?printed=true"));
}

#[tokio::test]
async fn test_unknown_banner_is_404() {
    let app = dummy_app();
    for uri in [
        "/banner/00000000-0000-0000-0000-000000000000",
        "/banner/not-a-token/image.png",
    ] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
    }
}
