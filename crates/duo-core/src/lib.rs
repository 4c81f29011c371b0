//! Duo call core: session lifecycle for a two-party video call.
//!
//! Pure Rust crate with no platform dependencies. The media engine, view
//! surfaces and OS permissions are supplied by the native UI shell through
//! the traits in [`engine`], [`render`] and [`permissions`].
//! Consumed by native UI shells via UniFFI bindings.

pub mod call;
pub mod config;
pub mod engine;
pub mod errors;
pub mod events;
pub mod permissions;
pub mod render;
pub mod session;

#[cfg(test)]
mod fakes;

pub use call::{CallSession, EngineEventSink};
pub use config::{CallConfig, ConfigStore};
pub use engine::{
    ChannelMediaOptions, ChannelProfile, ClientRole, EngineConfig, EngineEventHandler,
    EngineFactory, MediaEngine, OfflineReason, RenderMode, VideoCanvas,
};
pub use errors::{CallError, EngineError};
pub use events::{CallEvent, CallEventListener, EventEmitter};
pub use permissions::{PERMISSION_REQUEST_ID, Permission, PermissionGate, REQUESTED_PERMISSIONS};
pub use render::{RenderHost, RenderSlot, SlotKind, SurfaceId};
pub use session::{CallSessionController, SessionSnapshot, SessionState};
