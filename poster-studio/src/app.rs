//! One-shot command-line pipeline: load, compose, export.

use std::path::PathBuf;
use std::sync::Arc;

use poster_core::PosterDocument;
use poster_renderer::ImageRole;
use tracing::{info, warn};

use crate::config::StudioConfig;
use crate::error::StudioResult;
use crate::generator::HttpBackgroundGenerator;
use crate::session::{EditorSession, NoticeLevel, SessionEvent, SessionOptions};

/// Build the document `config` describes, resolve its images, optionally
/// generate a background, and write the export. Returns the output path.
///
/// Image and generation failures are logged and the poster is exported
/// with the fallbacks (gradient background, omitted logo/QR).
///
/// # Errors
///
/// Returns an error if the document cannot be read or parsed, the generator
/// endpoint is invalid, or the export cannot be written.
pub async fn run(config: StudioConfig) -> StudioResult<PathBuf> {
    let document = load_document(&config).await?;
    let generator = Arc::new(HttpBackgroundGenerator::new(&config.generator)?);
    let options = SessionOptions {
        renderer: config.renderer.clone(),
        generation_timeout: config.generation_timeout,
        ..SessionOptions::default()
    };

    let mut session = EditorSession::new(document, generator, options)?;
    session.load_document_assets();
    if let Some(background) = &config.background {
        session.handle(SessionEvent::LoadImage {
            role: ImageRole::Background,
            source: Some(background.clone()),
        });
    }
    if config.generate {
        session.request_background();
    }

    let handled = session.run_until_idle().await;
    info!("Resolved {} asynchronous results", handled);
    for notice in session.take_notices() {
        match notice.level {
            NoticeLevel::Info => info!("{}", notice.message),
            NoticeLevel::Error => warn!("{}", notice.message),
        }
    }

    let path = config.output_path();
    session.export_to_file(&path, config.format)?;
    Ok(path)
}

async fn load_document(config: &StudioConfig) -> StudioResult<PosterDocument> {
    let mut document = match &config.document {
        Some(path) => {
            let json = tokio::fs::read_to_string(path).await?;
            info!("Loaded document from {}", path.display());
            PosterDocument::from_json(&json)?
        }
        None => PosterDocument::new(),
    };

    if let Some(aspect) = config.aspect {
        document.set_aspect_ratio(aspect);
    }
    if let Some(theme) = &config.theme {
        document.set_theme(theme.clone());
    }
    if let Some(logo) = &config.logo {
        document.set_logo_url(Some(logo.clone()));
    }
    if let Some(qr) = &config.qr {
        document.set_qr_url(Some(qr.clone()));
    }
    Ok(document)
}
