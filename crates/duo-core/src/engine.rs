//! Seams to the external real-time media engine.
//!
//! The engine itself (capture, encoding, transport) lives in a vendor SDK
//! owned by the native shell. The core only drives it through these traits
//! and receives its asynchronous callbacks through [`EngineEventHandler`].

use std::fmt;
use std::sync::Arc;

use crate::errors::EngineError;
use crate::render::SurfaceId;

/// Uid the engine interprets as "the local user" in a canvas.
pub const LOCAL_CANVAS_UID: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Scale to fill the surface, cropping overflow.
    Hidden,
    /// Scale to fit inside the surface, letterboxing.
    Fit,
}

/// Binds a render surface to a participant's video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoCanvas {
    pub surface: SurfaceId,
    pub render_mode: RenderMode,
    pub uid: u32,
}

impl VideoCanvas {
    pub fn local(surface: SurfaceId) -> Self {
        Self {
            surface,
            render_mode: RenderMode::Hidden,
            uid: LOCAL_CANVAS_UID,
        }
    }

    pub fn remote(surface: SurfaceId, uid: u32) -> Self {
        Self {
            surface,
            render_mode: RenderMode::Fit,
            uid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelProfile {
    Communication,
    LiveBroadcasting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientRole {
    Broadcaster,
    Audience,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelMediaOptions {
    pub profile: ChannelProfile,
    pub role: ClientRole,
}

impl Default for ChannelMediaOptions {
    /// One-to-one call, publishing local media.
    fn default() -> Self {
        Self {
            profile: ChannelProfile::Communication,
            role: ClientRole::Broadcaster,
        }
    }
}

/// Why a remote user left the channel, decoded from the engine's code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfflineReason {
    Quit,
    Dropped,
    BecameAudience,
    Other(i32),
}

impl OfflineReason {
    pub fn code(self) -> i32 {
        match self {
            Self::Quit => 0,
            Self::Dropped => 1,
            Self::BecameAudience => 2,
            Self::Other(code) => code,
        }
    }
}

impl From<i32> for OfflineReason {
    fn from(code: i32) -> Self {
        match code {
            0 => Self::Quit,
            1 => Self::Dropped,
            2 => Self::BecameAudience,
            other => Self::Other(other),
        }
    }
}

impl fmt::Display for OfflineReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Callbacks delivered by the engine on its own thread.
pub trait EngineEventHandler: Send + Sync {
    fn on_join_channel_success(&self, channel: &str, uid: u32, elapsed_ms: u32);
    fn on_user_joined(&self, uid: u32, elapsed_ms: u32);
    fn on_user_offline(&self, uid: u32, reason: OfflineReason);
}

pub struct EngineConfig {
    pub app_id: String,
    pub event_handler: Arc<dyn EngineEventHandler>,
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("app_id", &self.app_id)
            .finish_non_exhaustive()
    }
}

/// One live instance of the media engine.
///
/// Calls are issued from the session task only. `join_channel` and
/// `leave_channel` return once the request is issued; completion arrives
/// later through [`EngineEventHandler`].
pub trait MediaEngine: Send {
    fn enable_video(&mut self) -> Result<(), EngineError>;
    fn setup_local_video(&mut self, canvas: VideoCanvas) -> Result<(), EngineError>;
    fn setup_remote_video(&mut self, canvas: VideoCanvas) -> Result<(), EngineError>;
    fn start_preview(&mut self) -> Result<(), EngineError>;
    fn join_channel(
        &mut self,
        token: &str,
        channel: &str,
        uid: u32,
        options: ChannelMediaOptions,
    ) -> Result<(), EngineError>;
    fn leave_channel(&mut self) -> Result<(), EngineError>;
    fn stop_preview(&mut self) -> Result<(), EngineError>;
    /// Release the native instance. May block; never called on the session task.
    fn destroy(self: Box<Self>);
}

/// Constructs engine instances.
pub trait EngineFactory: Send {
    fn create(&self, config: EngineConfig) -> Result<Box<dyn MediaEngine>, EngineError>;
}
