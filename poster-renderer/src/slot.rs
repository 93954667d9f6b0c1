//! Image slots: per-role load state the renderer reads without blocking.
//!
//! Each slot moves `Unloaded -> Loading { ticket, .. } -> Loaded | Failed`. A
//! load completion is applied only if its ticket is the one the slot is
//! waiting for; completions of superseded loads are dropped. A loading slot
//! keeps serving the image it held before, so renders during a reload never
//! lose a layer.

use std::fmt;

use crate::image::ImageHandle;
use crate::layout::ImageDimensions;

/// Which image a slot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageRole {
    /// Full-bleed background.
    Background,
    /// Brand logo.
    Logo,
    /// QR code.
    Qr,
}

impl ImageRole {
    /// All roles.
    pub const ALL: [Self; 3] = [Self::Background, Self::Logo, Self::Qr];
}

impl fmt::Display for ImageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Background => "background",
            Self::Logo => "logo",
            Self::Qr => "qr",
        })
    }
}

/// Identifies one load attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket(u64);

impl LoadTicket {
    /// Numeric id, for logging.
    #[must_use]
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Load state of one image.
#[derive(Debug, Clone, Default)]
pub enum ImageSlot {
    /// Nothing requested.
    #[default]
    Unloaded,
    /// A load is in flight.
    Loading {
        /// The load the slot is waiting for.
        ticket: LoadTicket,
        /// Image served until the load completes.
        previous: Option<ImageHandle>,
    },
    /// Decoded and drawable.
    Loaded(ImageHandle),
    /// The last load failed.
    Failed(String),
}

impl ImageSlot {
    /// The drawable image: the loaded one, or the one a reload replaces.
    #[must_use]
    pub fn image(&self) -> Option<&ImageHandle> {
        match self {
            Self::Loaded(handle)
            | Self::Loading {
                previous: Some(handle),
                ..
            } => Some(handle),
            _ => None,
        }
    }

    /// Whether a load is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }
}

/// The three image slots of an editing session.
#[derive(Debug, Clone, Default)]
pub struct ImageSlots {
    background: ImageSlot,
    logo: ImageSlot,
    qr: ImageSlot,
    next_ticket: u64,
}

impl ImageSlots {
    /// All slots unloaded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of a slot.
    #[must_use]
    pub fn get(&self, role: ImageRole) -> &ImageSlot {
        match role {
            ImageRole::Background => &self.background,
            ImageRole::Logo => &self.logo,
            ImageRole::Qr => &self.qr,
        }
    }

    fn get_mut(&mut self, role: ImageRole) -> &mut ImageSlot {
        match role {
            ImageRole::Background => &mut self.background,
            ImageRole::Logo => &mut self.logo,
            ImageRole::Qr => &mut self.qr,
        }
    }

    /// Start a load, superseding any load in flight for the same slot.
    ///
    /// Whatever image the slot currently serves stays drawable until the
    /// load completes.
    pub fn begin_load(&mut self, role: ImageRole) -> LoadTicket {
        self.next_ticket += 1;
        let ticket = LoadTicket(self.next_ticket);
        let slot = self.get_mut(role);
        let previous = slot.image().cloned();
        *slot = ImageSlot::Loading { ticket, previous };
        tracing::debug!("Loading {} image (ticket {})", role, ticket.id());
        ticket
    }

    /// Apply a load completion.
    ///
    /// Returns `true` if the slot changed. Completions whose ticket is not
    /// the one the slot is waiting for are discarded. A failed load leaves
    /// the slot without an image, so that layer is not drawn.
    pub fn complete(
        &mut self,
        role: ImageRole,
        ticket: LoadTicket,
        result: Result<ImageHandle, String>,
    ) -> bool {
        let slot = self.get_mut(role);
        match slot {
            ImageSlot::Loading { ticket: current, .. } if *current == ticket => {}
            _ => {
                tracing::debug!(
                    "Discarding stale {} image completion (ticket {})",
                    role,
                    ticket.id()
                );
                return false;
            }
        }

        *slot = match result {
            Ok(handle) => ImageSlot::Loaded(handle),
            Err(reason) => {
                tracing::warn!("Failed to load {} image: {}", role, reason);
                ImageSlot::Failed(reason)
            }
        };
        true
    }

    /// Reset a slot to unloaded, cancelling any load in flight.
    pub fn clear(&mut self, role: ImageRole) {
        *self.get_mut(role) = ImageSlot::Unloaded;
    }

    /// The images drawable right now.
    #[must_use]
    pub fn snapshot(&self) -> ImageSet {
        ImageSet {
            background: self.background.image().cloned(),
            logo: self.logo.image().cloned(),
            qr: self.qr.image().cloned(),
        }
    }
}

/// Images available to one render call.
#[derive(Debug, Clone, Default)]
pub struct ImageSet {
    background: Option<ImageHandle>,
    logo: Option<ImageHandle>,
    qr: Option<ImageHandle>,
}

impl ImageSet {
    /// No images: gradient background, no logo, no QR.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Set the background image.
    #[must_use]
    pub fn with_background(mut self, image: ImageHandle) -> Self {
        self.background = Some(image);
        self
    }

    /// Set the logo image.
    #[must_use]
    pub fn with_logo(mut self, image: ImageHandle) -> Self {
        self.logo = Some(image);
        self
    }

    /// Set the QR image.
    #[must_use]
    pub fn with_qr(mut self, image: ImageHandle) -> Self {
        self.qr = Some(image);
        self
    }

    /// Image for a role.
    #[must_use]
    pub fn get(&self, role: ImageRole) -> Option<&ImageHandle> {
        match role {
            ImageRole::Background => self.background.as_ref(),
            ImageRole::Logo => self.logo.as_ref(),
            ImageRole::Qr => self.qr.as_ref(),
        }
    }

    /// Source dimensions the layout needs.
    #[must_use]
    pub fn dimensions(&self) -> ImageDimensions {
        ImageDimensions {
            logo: self.logo.as_ref().map(ImageHandle::dimensions),
            qr: self.qr.as_ref().map(ImageHandle::dimensions),
        }
    }
}
