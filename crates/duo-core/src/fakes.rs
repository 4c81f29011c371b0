//! Recording collaborators for unit tests.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use crate::engine::{
    ChannelMediaOptions, EngineConfig, EngineEventHandler, EngineFactory, MediaEngine,
    OfflineReason, VideoCanvas,
};
use crate::errors::EngineError;
use crate::events::{CallEvent, CallEventListener};
use crate::permissions::{Permission, PermissionGate};
use crate::render::{RenderHost, SlotKind, SurfaceId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    EnableVideo,
    SetupLocal(VideoCanvas),
    SetupRemote(VideoCanvas),
    StartPreview,
    Join {
        token: String,
        channel: String,
        uid: u32,
        options: ChannelMediaOptions,
    },
    Leave,
    StopPreview,
}

#[derive(Default)]
struct EngineShared {
    created: Mutex<Vec<String>>,
    calls: Mutex<Vec<EngineCall>>,
    fail_create: AtomicBool,
    fail_on: Mutex<Option<&'static str>>,
    destroy_gate: Mutex<Option<mpsc::Receiver<()>>>,
    destroyed: Mutex<bool>,
    destroyed_cv: Condvar,
    handler: Mutex<Option<Arc<dyn EngineEventHandler>>>,
}

/// Factory whose engines record every call into a shared log.
#[derive(Clone, Default)]
pub struct FakeFactory {
    shared: Arc<EngineShared>,
}

impl FakeFactory {
    pub fn fail_create(&self) {
        self.shared.fail_create.store(true, Ordering::SeqCst);
    }

    pub fn allow_create(&self) {
        self.shared.fail_create.store(false, Ordering::SeqCst);
    }

    /// Make the named engine operation fail from now on.
    pub fn fail_on(&self, op: &'static str) {
        *self.shared.fail_on.lock().unwrap() = Some(op);
    }

    /// Block engine destruction until the returned sender fires.
    pub fn hold_destroy(&self) -> mpsc::Sender<()> {
        let (tx, rx) = mpsc::channel();
        *self.shared.destroy_gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn created(&self) -> Vec<String> {
        self.shared.created.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.shared.calls.lock().unwrap().clone()
    }

    /// The event handler the latest engine was created with.
    pub fn handler(&self) -> Option<Arc<dyn EngineEventHandler>> {
        self.shared.handler.lock().unwrap().clone()
    }

    pub fn is_destroyed(&self) -> bool {
        *self.shared.destroyed.lock().unwrap()
    }

    pub fn wait_destroyed(&self, timeout: Duration) -> bool {
        let guard = self.shared.destroyed.lock().unwrap();
        let (guard, _) = self
            .shared
            .destroyed_cv
            .wait_timeout_while(guard, timeout, |destroyed| !*destroyed)
            .unwrap();
        *guard
    }
}

impl EngineFactory for FakeFactory {
    fn create(&self, config: EngineConfig) -> Result<Box<dyn MediaEngine>, EngineError> {
        if self.shared.fail_create.load(Ordering::SeqCst) {
            return Err(EngineError::new("invalid app id"));
        }
        self.shared.created.lock().unwrap().push(config.app_id);
        *self.shared.handler.lock().unwrap() = Some(config.event_handler);
        Ok(Box::new(FakeEngine {
            shared: self.shared.clone(),
        }))
    }
}

struct FakeEngine {
    shared: Arc<EngineShared>,
}

impl FakeEngine {
    fn record(&self, op: &'static str, call: EngineCall) -> Result<(), EngineError> {
        self.shared.calls.lock().unwrap().push(call);
        if *self.shared.fail_on.lock().unwrap() == Some(op) {
            return Err(EngineError::new(format!("{op} rejected")));
        }
        Ok(())
    }
}

impl MediaEngine for FakeEngine {
    fn enable_video(&mut self) -> Result<(), EngineError> {
        self.record("enable_video", EngineCall::EnableVideo)
    }

    fn setup_local_video(&mut self, canvas: VideoCanvas) -> Result<(), EngineError> {
        self.record("setup_local_video", EngineCall::SetupLocal(canvas))
    }

    fn setup_remote_video(&mut self, canvas: VideoCanvas) -> Result<(), EngineError> {
        self.record("setup_remote_video", EngineCall::SetupRemote(canvas))
    }

    fn start_preview(&mut self) -> Result<(), EngineError> {
        self.record("start_preview", EngineCall::StartPreview)
    }

    fn join_channel(
        &mut self,
        token: &str,
        channel: &str,
        uid: u32,
        options: ChannelMediaOptions,
    ) -> Result<(), EngineError> {
        self.record(
            "join_channel",
            EngineCall::Join {
                token: token.to_string(),
                channel: channel.to_string(),
                uid,
                options,
            },
        )
    }

    fn leave_channel(&mut self) -> Result<(), EngineError> {
        self.record("leave_channel", EngineCall::Leave)
    }

    fn stop_preview(&mut self) -> Result<(), EngineError> {
        self.record("stop_preview", EngineCall::StopPreview)
    }

    fn destroy(self: Box<Self>) {
        let gate = self.shared.destroy_gate.lock().unwrap().take();
        if let Some(rx) = gate {
            let _ = rx.recv_timeout(Duration::from_secs(5));
        }
        *self.shared.destroyed.lock().unwrap() = true;
        self.shared.destroyed_cv.notify_all();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    Create(SlotKind, SurfaceId),
    Overlay(SurfaceId, bool),
    Visible(SurfaceId, bool),
    Release(SurfaceId),
}

#[derive(Clone, Default)]
pub struct FakeRenderHost {
    calls: Arc<Mutex<Vec<HostCall>>>,
    next_id: Arc<AtomicU64>,
    fail_create: Arc<AtomicBool>,
}

impl FakeRenderHost {
    pub fn fail_create(&self) {
        self.fail_create.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl RenderHost for FakeRenderHost {
    fn create_surface(&mut self, kind: SlotKind) -> Result<SurfaceId, EngineError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(EngineError::new("no container"));
        }
        let id = SurfaceId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.calls.lock().unwrap().push(HostCall::Create(kind, id));
        Ok(id)
    }

    fn set_media_overlay(&mut self, surface: SurfaceId, overlay: bool) {
        self.calls.lock().unwrap().push(HostCall::Overlay(surface, overlay));
    }

    fn set_visible(&mut self, surface: SurfaceId, visible: bool) {
        self.calls.lock().unwrap().push(HostCall::Visible(surface, visible));
    }

    fn release_surface(&mut self, surface: SurfaceId) {
        self.calls.lock().unwrap().push(HostCall::Release(surface));
    }
}

#[derive(Default)]
pub struct FakePermissions {
    granted: AtomicBool,
    requests: Mutex<Vec<(u32, Vec<Permission>)>>,
}

impl FakePermissions {
    pub fn granted() -> Self {
        let gate = Self::default();
        gate.set_granted(true);
        gate
    }

    pub fn set_granted(&self, granted: bool) {
        self.granted.store(granted, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<(u32, Vec<Permission>)> {
        self.requests.lock().unwrap().clone()
    }
}

impl PermissionGate for FakePermissions {
    fn has_permissions(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    fn request_permissions(&self, request_id: u32, permissions: &[Permission]) {
        self.requests
            .lock()
            .unwrap()
            .push((request_id, permissions.to_vec()));
    }
}

pub struct NullHandler;

impl EngineEventHandler for NullHandler {
    fn on_join_channel_success(&self, _channel: &str, _uid: u32, _elapsed_ms: u32) {}
    fn on_user_joined(&self, _uid: u32, _elapsed_ms: u32) {}
    fn on_user_offline(&self, _uid: u32, _reason: OfflineReason) {}
}

#[derive(Clone, Default)]
pub struct RecordingListener {
    events: Arc<Mutex<Vec<CallEvent>>>,
}

impl RecordingListener {
    pub fn events(&self) -> Vec<CallEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn notices(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                CallEvent::Notice(msg) => Some(msg),
                _ => None,
            })
            .collect()
    }
}

impl CallEventListener for RecordingListener {
    fn on_event(&self, event: CallEvent) {
        self.events.lock().unwrap().push(event);
    }
}
