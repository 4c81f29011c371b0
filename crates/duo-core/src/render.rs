use crate::errors::EngineError;

/// Opaque handle to a platform render surface (e.g. an Android `SurfaceView`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Local,
    Remote,
}

/// Owner of the view containers that host the local and remote video.
///
/// Only called from the session task. Implementations backed by a real view
/// tree must apply the mutation on the platform's main thread.
pub trait RenderHost: Send {
    /// Create a surface and attach it to the container for `kind`.
    fn create_surface(&mut self, kind: SlotKind) -> Result<SurfaceId, EngineError>;
    /// Draw the surface above other surfaces in the same window.
    fn set_media_overlay(&mut self, surface: SurfaceId, overlay: bool);
    fn set_visible(&mut self, surface: SurfaceId, visible: bool);
    /// Detach the surface from its container.
    fn release_surface(&mut self, surface: SurfaceId);
}

/// A surface the controller owns and the engine writes frames into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSlot {
    kind: SlotKind,
    surface: SurfaceId,
    visible: bool,
    overlay: bool,
    bound_uid: Option<u32>,
}

impl RenderSlot {
    pub fn create(host: &mut dyn RenderHost, kind: SlotKind) -> Result<Self, EngineError> {
        let surface = host.create_surface(kind)?;
        tracing::debug!(?kind, surface = surface.0, "render slot created");
        Ok(Self {
            kind,
            surface,
            visible: false,
            overlay: false,
            bound_uid: None,
        })
    }

    pub fn kind(&self) -> SlotKind {
        self.kind
    }

    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_overlay(&self) -> bool {
        self.overlay
    }

    pub fn bound_uid(&self) -> Option<u32> {
        self.bound_uid
    }

    pub fn mark_bound(&mut self, uid: u32) {
        self.bound_uid = Some(uid);
    }

    pub fn set_overlay(&mut self, host: &mut dyn RenderHost, overlay: bool) {
        host.set_media_overlay(self.surface, overlay);
        self.overlay = overlay;
    }

    /// Returns true if the visibility actually changed.
    pub fn set_visible(&mut self, host: &mut dyn RenderHost, visible: bool) -> bool {
        if self.visible == visible {
            return false;
        }
        host.set_visible(self.surface, visible);
        self.visible = visible;
        true
    }

    pub fn release(self, host: &mut dyn RenderHost) {
        tracing::debug!(kind = ?self.kind, surface = self.surface.0, "render slot released");
        host.release_surface(self.surface);
    }
}
