//! The editing session.
//!
//! [`EditorSession`] owns the document, the interaction controller, the
//! image slots and the renderer, and mutates them only in
//! [`EditorSession::handle`]. Image loads and background generation run as
//! tokio tasks and report back as [`SessionEvent`]s over the session's
//! channel, so every mutation happens in arrival order on the caller's task.
//!
//! ## Event flow
//!
//! ```text
//!  UI / CLI ──► handle(event) ──► document / controller / slots ──► render
//!                    ▲                       │
//!                    │                       ▼ spawn
//!              run_until_idle ◄── mpsc ◄── load / generate task
//! ```

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use poster_core::{
    CanvasRect, DocumentEdit, ElementKind, InteractionConfig, InteractionController,
    PointerEvent, PosterDocument,
};
use poster_renderer::{
    ExportConfig, ExportFormat, ImageHandle, ImageRole, ImageSlots, LoadTicket, PosterRenderer,
    RasterSurface, RenderContext, RendererConfig, SurfaceExporter,
};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::assets::AssetLoader;
use crate::error::StudioResult;
use crate::generator::{BackgroundGenerator, GeneratedImage, GenerationError};

/// Notices kept before the oldest is dropped.
pub const MAX_NOTICES: usize = 16;

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Progress information.
    Info,
    /// Something the user asked for did not happen.
    Error,
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Human-readable text.
    pub message: String,
}

impl Notice {
    /// Informational notice.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    /// Error notice.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Identifies one background generation request.
///
/// Only the latest ticket is honoured, and only while the document's theme
/// still equals the theme it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTicket {
    /// Monotonic request id.
    pub id: u64,
    /// Theme the request was issued for.
    pub theme: String,
}

/// Everything that can happen to a session.
#[derive(Debug)]
pub enum SessionEvent {
    /// The canvas appeared on screen at this rect.
    Mount(CanvasRect),
    /// The canvas left the screen.
    Unmount,
    /// Pointer input in device coordinates.
    Pointer(PointerEvent),
    /// Select an element directly (e.g. from a layer list).
    Select(Option<ElementKind>),
    /// A document edit from the property panel.
    Edit(DocumentEdit),
    /// Toggle bold on the selected text element.
    ToggleSelectedBold,
    /// Toggle italic on the selected text element.
    ToggleSelectedItalic,
    /// Show or hide the selected element.
    ToggleSelectedVisibility,
    /// Rescale the selected element.
    SetSelectedScale(f32),
    /// Load an image into a slot; `None` clears the slot.
    LoadImage {
        /// Target slot.
        role: ImageRole,
        /// Data URI, URL or file path.
        source: Option<String>,
    },
    /// Generate a background for the current theme.
    RequestBackground,
    /// An image load finished.
    ImageLoaded {
        /// Slot the load was for.
        role: ImageRole,
        /// Ticket issued when the load started.
        ticket: LoadTicket,
        /// Decoded image or failure reason.
        result: Result<ImageHandle, String>,
    },
    /// A background generation request finished.
    BackgroundGenerated {
        /// Ticket issued with the request.
        ticket: GenerationTicket,
        /// Decoded background or failure.
        result: Result<ImageHandle, GenerationError>,
    },
}

/// Session construction options.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Grid and capture radius for pointer interaction.
    pub interaction: InteractionConfig,
    /// Renderer settings.
    pub renderer: RendererConfig,
    /// Export encoder settings.
    pub export: ExportConfig,
    /// Upper bound on one generation request; `None` waits forever.
    pub generation_timeout: Option<Duration>,
}

/// An interactive editing session over one poster document.
pub struct EditorSession {
    document: PosterDocument,
    controller: InteractionController,
    slots: ImageSlots,
    renderer: PosterRenderer,
    exporter: SurfaceExporter,
    generator: Arc<dyn BackgroundGenerator>,
    assets: AssetLoader,
    generation_timeout: Option<Duration>,
    events_tx: UnboundedSender<SessionEvent>,
    events_rx: UnboundedReceiver<SessionEvent>,
    in_flight: usize,
    next_generation: u64,
    pending_generation: Option<GenerationTicket>,
    notices: VecDeque<Notice>,
    frame: Option<RasterSurface>,
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("document", &self.document)
            .field("controller", &self.controller)
            .field("slots", &self.slots)
            .field("in_flight", &self.in_flight)
            .field("pending_generation", &self.pending_generation)
            .field("notices", &self.notices)
            .finish_non_exhaustive()
    }
}

impl EditorSession {
    /// Create a session. Nothing is loaded or rendered until events arrive.
    ///
    /// # Errors
    ///
    /// Returns an error if the asset loader's HTTP client fails to build.
    pub fn new(
        document: PosterDocument,
        generator: Arc<dyn BackgroundGenerator>,
        options: SessionOptions,
    ) -> StudioResult<Self> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        info!(
            "Editor session started ({} poster)",
            document.aspect_ratio
        );
        Ok(Self {
            document,
            controller: InteractionController::new(options.interaction),
            slots: ImageSlots::new(),
            renderer: PosterRenderer::new(options.renderer),
            exporter: SurfaceExporter::new(options.export),
            generator,
            assets: AssetLoader::new()?,
            generation_timeout: options.generation_timeout,
            events_tx,
            events_rx,
            in_flight: 0,
            next_generation: 0,
            pending_generation: None,
            notices: VecDeque::new(),
            frame: None,
        })
    }

    /// The document being edited.
    #[must_use]
    pub fn document(&self) -> &PosterDocument {
        &self.document
    }

    /// The interaction controller.
    #[must_use]
    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    /// Current image slot states.
    #[must_use]
    pub fn slots(&self) -> &ImageSlots {
        &self.slots
    }

    /// The most recent preview frame.
    #[must_use]
    pub fn frame(&self) -> Option<&RasterSurface> {
        self.frame.as_ref()
    }

    /// Frames rendered so far, previews and exports included.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.renderer.frame_count()
    }

    /// The generation request whose result is still awaited.
    #[must_use]
    pub fn pending_generation(&self) -> Option<&GenerationTicket> {
        self.pending_generation.as_ref()
    }

    /// Background tasks that have not reported back yet.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Sender for feeding events from another task.
    #[must_use]
    pub fn sender(&self) -> UnboundedSender<SessionEvent> {
        self.events_tx.clone()
    }

    /// Pending notices, oldest first.
    #[must_use]
    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    /// Remove and return all pending notices.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    /// Process one event. Returns `true` if it produced a new preview frame.
    pub fn handle(&mut self, event: SessionEvent) -> bool {
        let needs_render = match event {
            SessionEvent::Mount(rect) => {
                self.controller.mount(rect);
                true
            }
            SessionEvent::Unmount => {
                self.controller.unmount();
                false
            }
            SessionEvent::Pointer(pointer) => self
                .controller
                .handle(&mut self.document, pointer)
                .needs_render(),
            SessionEvent::Select(element) => {
                self.controller.select(element);
                true
            }
            SessionEvent::Edit(edit) => self.apply_edit(&edit),
            SessionEvent::ToggleSelectedBold => {
                self.controller.toggle_selected_bold(&mut self.document)
            }
            SessionEvent::ToggleSelectedItalic => {
                self.controller.toggle_selected_italic(&mut self.document)
            }
            SessionEvent::ToggleSelectedVisibility => {
                self.controller.toggle_selected_visibility(&mut self.document)
            }
            SessionEvent::SetSelectedScale(scale) => {
                self.controller.set_selected_scale(&mut self.document, scale)
            }
            SessionEvent::LoadImage { role, source } => self.load_image(role, source),
            SessionEvent::RequestBackground => {
                self.request_background();
                false
            }
            SessionEvent::ImageLoaded {
                role,
                ticket,
                result,
            } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.on_image_loaded(role, ticket, result)
            }
            SessionEvent::BackgroundGenerated { ticket, result } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.on_background_generated(&ticket, result)
            }
        };

        if needs_render {
            self.render_preview();
        }
        needs_render
    }

    /// Handle queued events until no background task is outstanding.
    ///
    /// Returns the number of events handled.
    pub async fn run_until_idle(&mut self) -> usize {
        let mut handled = 0;
        loop {
            while let Ok(event) = self.events_rx.try_recv() {
                self.handle(event);
                handled += 1;
            }
            if self.in_flight == 0 {
                break;
            }
            // The session holds a sender, so the channel never closes here.
            let Some(event) = self.events_rx.recv().await else {
                break;
            };
            self.handle(event);
            handled += 1;
        }
        handled
    }

    /// Start loading the logo and QR images named by the document.
    pub fn load_document_assets(&mut self) {
        let logo = self.document.logo_url.clone();
        let qr = self.document.qr_url.clone();
        self.load_image(ImageRole::Logo, logo);
        self.load_image(ImageRole::Qr, qr);
    }

    /// Ask the generator for a background matching the current theme.
    ///
    /// Supersedes any request still in flight.
    pub fn request_background(&mut self) -> GenerationTicket {
        self.next_generation += 1;
        let ticket = GenerationTicket {
            id: self.next_generation,
            theme: self.document.theme.clone(),
        };
        if let Some(previous) = self.pending_generation.replace(ticket.clone()) {
            debug!(
                "Background request {} superseded by {}",
                previous.id, ticket.id
            );
        }
        info!("Generating background for theme {:?}", ticket.theme);
        self.push_notice(Notice::info("Generating background"));

        let generator = Arc::clone(&self.generator);
        let assets = self.assets.clone();
        let timeout = self.generation_timeout;
        let aspect = self.document.aspect_ratio;
        let tx = self.events_tx.clone();
        let task_ticket = ticket.clone();
        self.in_flight += 1;

        tokio::spawn(async move {
            let call = generator.generate(&task_ticket.theme, aspect);
            let result = match timeout {
                Some(limit) => tokio::time::timeout(limit, call)
                    .await
                    .unwrap_or_else(|_| Err(GenerationError::Timeout(limit))),
                None => call.await,
            };
            let result = match result {
                Ok(image) => decode_generated(&assets, &image).await,
                Err(e) => Err(e),
            };
            let event = SessionEvent::BackgroundGenerated {
                ticket: task_ticket,
                result,
            };
            if tx.send(event).is_err() {
                debug!("Session closed before background generation finished");
            }
        });

        ticket
    }

    /// Render at full resolution without editor chrome and encode.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or encoding fails.
    pub fn export(&mut self, format: ExportFormat) -> StudioResult<Vec<u8>> {
        let surface = self.render_export()?;
        Ok(self.exporter.export(&surface, format)?)
    }

    /// Export as a `data:` URI.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or encoding fails.
    pub fn export_data_uri(&mut self, format: ExportFormat) -> StudioResult<String> {
        let surface = self.render_export()?;
        Ok(self.exporter.to_data_uri(&surface, format)?)
    }

    /// Export to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering, encoding or writing fails.
    pub fn export_to_file(&mut self, path: &Path, format: ExportFormat) -> StudioResult<()> {
        let surface = self.render_export()?;
        self.exporter.write_file(&surface, format, path)?;
        Ok(())
    }

    fn render_export(&mut self) -> StudioResult<RasterSurface> {
        let images = self.slots.snapshot();
        Ok(self
            .renderer
            .render(&self.document, &images, &RenderContext::export())?)
    }

    fn render_preview(&mut self) {
        let images = self.slots.snapshot();
        let ctx = RenderContext::preview(self.controller.selected());
        match self.renderer.render(&self.document, &images, &ctx) {
            Ok(surface) => self.frame = Some(surface),
            Err(e) => {
                warn!("Preview render failed: {}", e);
                self.push_notice(Notice::error(format!("Preview failed: {e}")));
            }
        }
    }

    fn apply_edit(&mut self, edit: &DocumentEdit) -> bool {
        edit.apply(&mut self.document);
        match edit {
            DocumentEdit::SetLogoUrl { url } => {
                self.load_image(ImageRole::Logo, url.clone());
            }
            DocumentEdit::SetQrUrl { url } => {
                self.load_image(ImageRole::Qr, url.clone());
            }
            DocumentEdit::SetTheme { theme } => {
                if self
                    .pending_generation
                    .as_ref()
                    .is_some_and(|pending| &pending.theme != theme)
                {
                    debug!("Theme changed while a background was generating");
                }
            }
            _ => {}
        }
        true
    }

    /// Returns `true` if the slot was cleared and the frame is stale.
    ///
    /// Starting a load leaves the current frame up; the completion renders.
    fn load_image(&mut self, role: ImageRole, source: Option<String>) -> bool {
        let Some(source) = source.filter(|s| !s.trim().is_empty()) else {
            self.slots.clear(role);
            return true;
        };

        let ticket = self.slots.begin_load(role);
        let assets = self.assets.clone();
        let tx = self.events_tx.clone();
        self.in_flight += 1;

        tokio::spawn(async move {
            let result = assets
                .load_str(&source)
                .await
                .map_err(|e| e.to_string());
            let event = SessionEvent::ImageLoaded {
                role,
                ticket,
                result,
            };
            if tx.send(event).is_err() {
                debug!("Session closed before {} image finished loading", role);
            }
        });
        false
    }

    fn on_image_loaded(
        &mut self,
        role: ImageRole,
        ticket: LoadTicket,
        result: Result<ImageHandle, String>,
    ) -> bool {
        let failure = result.as_ref().err().cloned();
        let changed = self.slots.complete(role, ticket, result);
        if changed {
            if let Some(reason) = failure {
                self.push_notice(Notice::error(format!("Could not load {role} image: {reason}")));
            }
        }
        changed
    }

    fn on_background_generated(
        &mut self,
        ticket: &GenerationTicket,
        result: Result<ImageHandle, GenerationError>,
    ) -> bool {
        if self.pending_generation.as_ref() != Some(ticket) {
            debug!("Discarding superseded background (request {})", ticket.id);
            return false;
        }
        self.pending_generation = None;

        if ticket.theme != self.document.theme {
            info!(
                "Discarding background for theme {:?}; theme is now {:?}",
                ticket.theme, self.document.theme
            );
            return false;
        }

        match result {
            Ok(image) => {
                let ticket = self.slots.begin_load(ImageRole::Background);
                self.slots.complete(ImageRole::Background, ticket, Ok(image))
            }
            Err(e) => {
                warn!("Background generation failed, keeping current background: {}", e);
                self.push_notice(Notice::error(format!("Background generation failed: {e}")));
                false
            }
        }
    }

    fn push_notice(&mut self, notice: Notice) {
        if self.notices.len() == MAX_NOTICES {
            self.notices.pop_front();
        }
        self.notices.push_back(notice);
    }
}

/// Decode a generated background before it goes anywhere near the slot.
async fn decode_generated(
    assets: &AssetLoader,
    image: &GeneratedImage,
) -> Result<ImageHandle, GenerationError> {
    let handle = assets
        .load_str(&image.data_uri)
        .await
        .map_err(|e| GenerationError::Decode(e.to_string()))?;
    let (width, height) = handle.dimensions();
    info!("Background generated ({}, {}x{})", image.mime_type, width, height);
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use poster_core::AspectRatio;

    /// Generator that always fails the same way.
    struct FailingGenerator;

    #[async_trait]
    impl BackgroundGenerator for FailingGenerator {
        async fn generate(
            &self,
            _theme: &str,
            _aspect: AspectRatio,
        ) -> Result<GeneratedImage, GenerationError> {
            Err(GenerationError::MissingCredential)
        }
    }

    fn session() -> EditorSession {
        EditorSession::new(
            PosterDocument::new(),
            Arc::new(FailingGenerator),
            SessionOptions::default(),
        )
        .expect("session")
    }

    #[tokio::test]
    async fn test_mount_renders_first_frame() {
        let mut session = session();
        assert!(session.frame().is_none());
        assert!(session.handle(SessionEvent::Mount(CanvasRect::new(0.0, 0.0, 540.0, 960.0))));
        let frame = session.frame().expect("frame");
        assert_eq!((frame.width(), frame.height()), (1080, 1920));
    }

    #[tokio::test]
    async fn test_edit_rerenders() {
        let mut session = session();
        let before = session.frame_count();
        assert!(session.handle(SessionEvent::Edit(DocumentEdit::SetAspectRatio {
            ratio: AspectRatio::Square,
        })));
        assert_eq!(session.frame_count(), before + 1);
        assert_eq!(session.frame().expect("frame").height(), 1080);
    }

    #[tokio::test]
    async fn test_selection_controls_need_a_selection() {
        let mut session = session();
        assert!(!session.handle(SessionEvent::ToggleSelectedBold));
        session.handle(SessionEvent::Select(Some(ElementKind::Headline)));
        let bold = session.document().placement(ElementKind::Headline).bold();
        assert!(session.handle(SessionEvent::ToggleSelectedBold));
        assert_eq!(
            session.document().placement(ElementKind::Headline).bold(),
            !bold
        );
    }

    #[tokio::test]
    async fn test_clearing_a_slot_renders_immediately() {
        let mut session = session();
        assert!(session.handle(SessionEvent::LoadImage {
            role: ImageRole::Logo,
            source: None,
        }));
        assert_eq!(session.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_failed_generation_posts_error_notice() {
        let mut session = session();
        session.handle(SessionEvent::RequestBackground);
        session.run_until_idle().await;

        let notices = session.take_notices();
        assert_eq!(notices.first().map(|n| n.level), Some(NoticeLevel::Info));
        assert_eq!(notices.last().map(|n| n.level), Some(NoticeLevel::Error));
        assert!(session.pending_generation().is_none());
        assert!(session.notices().next().is_none());
    }

    #[test]
    fn test_notice_queue_is_bounded() {
        let mut session = session();
        for i in 0..MAX_NOTICES + 3 {
            session.push_notice(Notice::info(format!("n{i}")));
        }
        let notices = session.take_notices();
        assert_eq!(notices.len(), MAX_NOTICES);
        assert_eq!(notices[0].message, "n3");
    }
}
