//! End-to-end runs of the command-line pipeline into temporary files.

mod common;

use clap::Parser;
use poster_core::{AspectRatio, ElementKind, PosterDocument, Rgba};
use poster_renderer::image::load_image_from_bytes;
use poster_renderer::ImageFormat;
use poster_studio::{CliArgs, StudioConfig, StudioError};

fn config(args: &[&str]) -> StudioConfig {
    let argv = std::iter::once("poster-studio").chain(args.iter().copied());
    StudioConfig::from(CliArgs::try_parse_from(argv).expect("valid args"))
}

#[tokio::test]
async fn test_exports_document_as_jpeg() {
    let dir = tempfile::tempdir().expect("tempdir");
    let doc_path = dir.path().join("poster.json");
    let out_path = dir.path().join("out.jpg");

    let mut doc = PosterDocument::new();
    doc.content.headline = "OPEN HOUSE".to_string();
    doc.set_visible(ElementKind::Qr, false);
    std::fs::write(&doc_path, doc.to_json().expect("json")).expect("write doc");

    let path = poster_studio::run(config(&[
        "--document",
        doc_path.to_str().expect("utf8 path"),
        "--output",
        out_path.to_str().expect("utf8 path"),
        "--format",
        "jpeg",
        "--aspect",
        "1:1",
    ]))
    .await
    .expect("run");
    assert_eq!(path, out_path);

    let bytes = std::fs::read(&out_path).expect("read export");
    let decoded = load_image_from_bytes(&bytes).expect("decode");
    assert_eq!(decoded.format, ImageFormat::Jpeg);
    assert_eq!((decoded.width, decoded.height), (1080, 1080));
}

#[tokio::test]
async fn test_generation_without_key_still_exports() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out_path = dir.path().join("poster.png");
    let logo_path = dir.path().join("logo.png");
    let logo = common::png_base64(30, 10, Rgba::rgb(0, 200, 0));
    std::fs::write(
        &logo_path,
        base64::Engine::decode(&base64::engine::general_purpose::STANDARD, logo)
            .expect("png bytes"),
    )
    .expect("write logo");

    let mut config = config(&[
        "--output",
        out_path.to_str().expect("utf8 path"),
        "--logo",
        logo_path.to_str().expect("utf8 path"),
        "--theme",
        "autumn leaves",
        "--generate",
    ]);
    config.generator.api_key = None;

    poster_studio::run(config).await.expect("run");

    let bytes = std::fs::read(&out_path).expect("read export");
    let decoded = load_image_from_bytes(&bytes).expect("decode");
    assert_eq!(decoded.format, ImageFormat::Png);
    assert_eq!((decoded.width, decoded.height), (1080, 1920));
}

#[tokio::test]
async fn test_malformed_document_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let doc_path = dir.path().join("broken.json");
    std::fs::write(&doc_path, r#"{"aspectRatio": "3:2"}"#).expect("write doc");

    let result = poster_studio::run(config(&[
        "--document",
        doc_path.to_str().expect("utf8 path"),
        "--output",
        dir.path().join("never.png").to_str().expect("utf8 path"),
    ]))
    .await;

    assert!(matches!(result, Err(StudioError::Document(_))));
    assert!(!dir.path().join("never.png").exists());
}

#[tokio::test]
async fn test_invalid_endpoint_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = config(&[
        "--output",
        dir.path().join("never.png").to_str().expect("utf8 path"),
    ]);
    config.generator.endpoint = "::not a url::".to_string();

    let result = poster_studio::run(config).await;
    assert!(matches!(result, Err(StudioError::Generation(_))));
}

#[test]
fn test_cli_aspect_override_parses() {
    let config = config(&["--aspect", "4:3"]);
    assert_eq!(config.aspect, Some(AspectRatio::Classic));
}
