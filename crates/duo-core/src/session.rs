use std::fmt;
use std::sync::Arc;

use crate::engine::{
    ChannelMediaOptions, EngineConfig, EngineEventHandler, EngineFactory, MediaEngine,
    OfflineReason, VideoCanvas,
};
use crate::errors::CallError;
use crate::events::{CallEvent, EventEmitter};
use crate::render::{RenderHost, RenderSlot, SlotKind};

/// Lifecycle of a call session.
///
/// `Joined` and `Left` may alternate; `Destroying` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    NotInitialized,
    /// Engine created, never joined.
    Initialized,
    /// Join request issued, waiting for the engine's confirmation.
    Joining,
    Joined,
    Left,
    /// Teardown started. Every further event is dropped.
    Destroying,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::NotInitialized => write!(f, "not-initialized"),
            SessionState::Initialized => write!(f, "initialized"),
            SessionState::Joining => write!(f, "joining"),
            SessionState::Joined => write!(f, "joined"),
            SessionState::Left => write!(f, "left"),
            SessionState::Destroying => write!(f, "destroying"),
        }
    }
}

/// Point-in-time view of the controller, for UI layers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub joined: bool,
    pub has_engine: bool,
    pub local_visible: bool,
    pub remote_visible: bool,
    pub remote_uid: Option<u32>,
}

/// Drives the media engine through a single call.
///
/// Owns the engine handle and both render slots. Not thread-safe by itself:
/// [`crate::CallSession`] gives it a single owning task and funnels engine
/// callbacks into it.
pub struct CallSessionController {
    state: SessionState,
    factory: Box<dyn EngineFactory>,
    engine: Option<Box<dyn MediaEngine>>,
    host: Box<dyn RenderHost>,
    local: Option<RenderSlot>,
    remote: Option<RenderSlot>,
    local_uid: u32,
    emitter: EventEmitter,
}

impl CallSessionController {
    pub fn new(
        factory: Box<dyn EngineFactory>,
        host: Box<dyn RenderHost>,
        local_uid: u32,
        emitter: EventEmitter,
    ) -> Self {
        Self {
            state: SessionState::NotInitialized,
            factory,
            engine: None,
            host,
            local: None,
            remote: None,
            local_uid,
            emitter,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_joined(&self) -> bool {
        self.state == SessionState::Joined
    }

    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }

    pub fn local_slot(&self) -> Option<&RenderSlot> {
        self.local.as_ref()
    }

    pub fn remote_slot(&self) -> Option<&RenderSlot> {
        self.remote.as_ref()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            joined: self.is_joined(),
            has_engine: self.has_engine(),
            local_visible: self.local.as_ref().is_some_and(RenderSlot::is_visible),
            remote_visible: self.remote.as_ref().is_some_and(RenderSlot::is_visible),
            remote_uid: self.remote.as_ref().and_then(RenderSlot::bound_uid),
        }
    }

    /// Create the engine if it does not exist yet. No-op otherwise.
    pub fn ensure_engine_ready(
        &mut self,
        app_id: &str,
        event_handler: Arc<dyn EngineEventHandler>,
    ) -> Result<(), CallError> {
        if self.state == SessionState::Destroying {
            return Err(CallError::SessionClosed);
        }
        if self.engine.is_some() {
            return Ok(());
        }

        let mut engine = self
            .factory
            .create(EngineConfig {
                app_id: app_id.to_string(),
                event_handler,
            })
            .map_err(|e| CallError::EngineInit(e.to_string()))?;

        if let Err(e) = engine.enable_video() {
            destroy_in_background(engine);
            return Err(CallError::EngineInit(format!("enable video: {e}")));
        }

        tracing::info!("media engine ready");
        self.engine = Some(engine);
        if self.state == SessionState::NotInitialized {
            self.set_state(SessionState::Initialized);
        }
        Ok(())
    }

    /// Start preview and ask the engine to join `channel`.
    ///
    /// Returns once the request is issued. The session only counts as joined
    /// after [`Self::on_join_success`]. While a join is still unconfirmed the
    /// request is issued again, so a stalled join can be retried.
    pub fn request_join(
        &mut self,
        token: &str,
        channel: &str,
        has_permission: bool,
    ) -> Result<(), CallError> {
        let previous = self.state;
        match previous {
            SessionState::Destroying => return Err(CallError::SessionClosed),
            SessionState::Joined => {
                tracing::debug!("already joined");
                return Ok(());
            }
            SessionState::Joining => tracing::info!(channel, "join unconfirmed, reissuing"),
            _ => {}
        }
        if !has_permission {
            return Err(CallError::PermissionDenied);
        }
        let Some(engine) = self.engine.as_mut() else {
            return Err(CallError::EngineCall("engine not initialized".into()));
        };

        if self.local.is_none() {
            let slot = RenderSlot::create(self.host.as_mut(), SlotKind::Local)
                .map_err(|e| CallError::EngineCall(format!("create local surface: {e}")))?;
            self.local = Some(slot);
        }
        let Some(local) = self.local.as_mut() else {
            return Err(CallError::EngineCall("local surface missing".into()));
        };

        if let Err(e) = engine.setup_local_video(VideoCanvas::local(local.surface())) {
            return Err(CallError::EngineCall(format!("setup local video: {e}")));
        }
        local.mark_bound(self.local_uid);
        if local.set_visible(self.host.as_mut(), true) {
            self.emitter.emit(CallEvent::LocalVideoChanged { visible: true });
        }

        let issued = engine
            .start_preview()
            .map_err(|e| format!("start preview: {e}"))
            .and_then(|()| {
                engine
                    .join_channel(token, channel, self.local_uid, ChannelMediaOptions::default())
                    .map_err(|e| format!("join channel: {e}"))
            });

        if let Err(msg) = issued {
            tracing::warn!(channel, "join request failed: {msg}");
            if let Err(e) = engine.stop_preview() {
                tracing::warn!("stop preview during rollback: {e}");
            }
            self.hide_local();
            if previous == SessionState::Joining {
                self.set_state(SessionState::Left);
            }
            return Err(CallError::EngineCall(msg));
        }

        tracing::info!(channel, uid = self.local_uid, "join requested");
        self.set_state(SessionState::Joining);
        Ok(())
    }

    /// Leave the channel and hide both video surfaces.
    pub fn request_leave(&mut self) -> Result<(), CallError> {
        if !self.is_joined() {
            return Err(CallError::NotJoined);
        }
        let Some(engine) = self.engine.as_mut() else {
            return Err(CallError::NotJoined);
        };
        engine
            .leave_channel()
            .map_err(|e| CallError::EngineCall(format!("leave channel: {e}")))?;

        self.hide_remote();
        self.hide_local();
        self.set_state(SessionState::Left);
        self.emitter.notice("You left channel");
        Ok(())
    }

    pub fn on_join_success(&mut self, channel: &str, uid: u32, elapsed_ms: u32) {
        match self.state {
            SessionState::Joining => {
                tracing::info!(channel, uid, elapsed_ms, "joined channel");
                self.set_state(SessionState::Joined);
                self.emitter.notice(format!("Joined Channel {channel}"));
            }
            SessionState::Joined => {}
            state => {
                tracing::warn!(channel, %state, "join confirmation without pending join, ignored");
            }
        }
    }

    pub fn on_remote_user_joined(&mut self, uid: u32) {
        if self.state == SessionState::Destroying {
            return;
        }
        self.emitter.notice(format!("Remote user joined {uid}"));

        if !matches!(self.state, SessionState::Joining | SessionState::Joined) {
            tracing::debug!(uid, state = %self.state, "no active call, remote video not bound");
            return;
        }
        let Some(engine) = self.engine.as_mut() else {
            tracing::warn!(uid, "remote user joined without engine");
            return;
        };

        if self.remote.is_none() {
            match RenderSlot::create(self.host.as_mut(), SlotKind::Remote) {
                Ok(mut slot) => {
                    slot.set_overlay(self.host.as_mut(), true);
                    self.remote = Some(slot);
                }
                Err(e) => {
                    tracing::error!(uid, "create remote surface: {e}");
                    return;
                }
            }
        }
        let Some(remote) = self.remote.as_mut() else {
            return;
        };

        // The engine drops a remote canvas once its user goes offline, so bind
        // on every join, even for the uid already on the surface.
        if let Err(e) = engine.setup_remote_video(VideoCanvas::remote(remote.surface(), uid)) {
            tracing::error!(uid, "setup remote video: {e}");
            return;
        }
        remote.mark_bound(uid);
        remote.set_visible(self.host.as_mut(), true);
        self.emitter.emit(CallEvent::RemoteVideoChanged { uid, visible: true });
    }

    pub fn on_remote_user_left(&mut self, uid: u32, reason: OfflineReason) {
        if self.state == SessionState::Destroying {
            return;
        }
        self.emitter.notice(format!("Remote user offline {uid} {reason}"));

        match self.remote.as_ref().and_then(RenderSlot::bound_uid) {
            Some(bound) if bound == uid => self.hide_remote(),
            Some(bound) => tracing::debug!(uid, bound, "offline user is not on the remote surface"),
            None => tracing::debug!(uid, "no remote surface to hide"),
        }
    }

    /// Stop the call and release the engine.
    ///
    /// Engine destruction runs on the blocking pool and is not awaited.
    /// The handle is cleared before it completes.
    pub fn teardown(&mut self) {
        if self.state == SessionState::Destroying {
            return;
        }
        self.set_state(SessionState::Destroying);

        if let Some(mut engine) = self.engine.take() {
            if let Err(e) = engine.stop_preview() {
                tracing::warn!("stop preview on teardown: {e}");
            }
            if let Err(e) = engine.leave_channel() {
                tracing::warn!("leave channel on teardown: {e}");
            }
            destroy_in_background(engine);
        }

        if let Some(slot) = self.remote.take() {
            slot.release(self.host.as_mut());
        }
        if let Some(slot) = self.local.take() {
            slot.release(self.host.as_mut());
        }
        tracing::info!("call session torn down");
    }

    fn hide_local(&mut self) {
        if let Some(local) = self.local.as_mut() {
            if local.set_visible(self.host.as_mut(), false) {
                self.emitter.emit(CallEvent::LocalVideoChanged { visible: false });
            }
        }
    }

    fn hide_remote(&mut self) {
        if let Some(remote) = self.remote.as_mut() {
            if remote.set_visible(self.host.as_mut(), false) {
                let uid = remote.bound_uid().unwrap_or_default();
                self.emitter.emit(CallEvent::RemoteVideoChanged { uid, visible: false });
            }
        }
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state == state {
            return;
        }
        tracing::debug!(from = %self.state, to = %state, "session state changed");
        self.state = state;
        self.emitter.emit(CallEvent::StateChanged(state));
    }
}

fn destroy_in_background(engine: Box<dyn MediaEngine>) {
    let destroy = move || {
        engine.destroy();
        tracing::info!("media engine destroyed");
    };
    match tokio::runtime::Handle::try_current() {
        Ok(rt) => {
            rt.spawn_blocking(destroy);
        }
        Err(_) => {
            tracing::warn!("no runtime available, destroying engine inline");
            destroy();
        }
    }
}
