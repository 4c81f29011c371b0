//! UniFFI bindings for duo-core.
//!
//! Provides a DuoClient object that wraps the call session into a single
//! FFI-safe interface. The native shell implements the media engine, the
//! render host and the permission gate as callback interfaces, and forwards
//! the vendor SDK's event handler callbacks to DuoClient.

use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex};

use duo_core::{
    self, CallError, CallSession, ConfigStore, EngineError, EngineEventHandler,
    events::CallEvent as CoreCallEvent, session::SessionSnapshot as CoreSessionSnapshot,
    session::SessionState as CoreSessionState,
};

uniffi::include_scaffolding!("duo");

// ── Platform log helper ──────────────────────────────────────────────

/// Write a message to logcat on Android, or stderr on other platforms.
fn duo_log(msg: &str) {
    #[cfg(target_os = "android")]
    {
        use std::ffi::CString;
        unsafe extern "C" {
            fn __android_log_write(prio: i32, tag: *const std::ffi::c_char, text: *const std::ffi::c_char) -> i32;
        }
        let tag = c"DUO_FFI";
        let text = CString::new(msg).unwrap_or_else(|_| c"(invalid utf8)".to_owned());
        unsafe { __android_log_write(4 /* INFO */, tag.as_ptr(), text.as_ptr()); }
    }
    #[cfg(target_os = "ios")]
    {
        use std::ffi::CString;
        unsafe extern "C" {
            fn syslog(priority: i32, message: *const std::ffi::c_char, ...);
        }
        let text = CString::new(msg).unwrap_or_else(|_| c"(invalid utf8)".to_owned());
        unsafe { syslog(6 /* LOG_INFO */, c"%s".as_ptr(), text.as_ptr()); }
    }
    #[cfg(not(any(target_os = "android", target_os = "ios")))]
    eprintln!("{msg}");
}

// ── Namespace functions ──────────────────────────────────────────────

/// Initialize tracing/logging. Call once from the host before using DuoClient.
fn init_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("duo_core=debug,duo_ffi=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .try_init();
    });
}

// ── FFI-safe type conversions ──────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotInitialized,
    Initialized,
    Joining,
    Joined,
    Left,
    Destroying,
}

impl From<CoreSessionState> for SessionState {
    fn from(s: CoreSessionState) -> Self {
        match s {
            CoreSessionState::NotInitialized => Self::NotInitialized,
            CoreSessionState::Initialized => Self::Initialized,
            CoreSessionState::Joining => Self::Joining,
            CoreSessionState::Joined => Self::Joined,
            CoreSessionState::Left => Self::Left,
            CoreSessionState::Destroying => Self::Destroying,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Local,
    Remote,
}

impl From<duo_core::SlotKind> for SlotKind {
    fn from(k: duo_core::SlotKind) -> Self {
        match k {
            duo_core::SlotKind::Local => Self::Local,
            duo_core::SlotKind::Remote => Self::Remote,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Hidden,
    Fit,
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

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoCanvas {
    pub surface_id: u64,
    pub render_mode: RenderMode,
    pub uid: u32,
}

impl From<duo_core::VideoCanvas> for VideoCanvas {
    fn from(c: duo_core::VideoCanvas) -> Self {
        Self {
            surface_id: c.surface.0,
            render_mode: match c.render_mode {
                duo_core::RenderMode::Hidden => RenderMode::Hidden,
                duo_core::RenderMode::Fit => RenderMode::Fit,
            },
            uid: c.uid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMediaOptions {
    pub profile: ChannelProfile,
    pub role: ClientRole,
}

impl From<duo_core::ChannelMediaOptions> for ChannelMediaOptions {
    fn from(o: duo_core::ChannelMediaOptions) -> Self {
        Self {
            profile: match o.profile {
                duo_core::ChannelProfile::Communication => ChannelProfile::Communication,
                duo_core::ChannelProfile::LiveBroadcasting => ChannelProfile::LiveBroadcasting,
            },
            role: match o.role {
                duo_core::ClientRole::Broadcaster => ClientRole::Broadcaster,
                duo_core::ClientRole::Audience => ClientRole::Audience,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub joined: bool,
    pub has_engine: bool,
    pub local_visible: bool,
    pub remote_visible: bool,
    pub remote_uid: Option<u32>,
}

impl From<CoreSessionSnapshot> for SessionSnapshot {
    fn from(s: CoreSessionSnapshot) -> Self {
        Self {
            state: s.state.into(),
            joined: s.joined,
            has_engine: s.has_engine,
            local_visible: s.local_visible,
            remote_visible: s.remote_visible,
            remote_uid: s.remote_uid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallConfig {
    pub app_id: String,
    pub token: String,
    pub channel_name: String,
    pub local_uid: u32,
}

impl From<duo_core::CallConfig> for CallConfig {
    fn from(c: duo_core::CallConfig) -> Self {
        Self {
            app_id: c.app_id,
            token: c.token,
            channel_name: c.channel_name,
            local_uid: c.local_uid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallEvent {
    StateChanged { state: SessionState },
    Notice { message: String },
    LocalVideoChanged { visible: bool },
    RemoteVideoChanged { uid: u32, visible: bool },
}

impl From<CoreCallEvent> for CallEvent {
    fn from(e: CoreCallEvent) -> Self {
        match e {
            CoreCallEvent::StateChanged(s) => Self::StateChanged { state: s.into() },
            CoreCallEvent::Notice(message) => Self::Notice { message },
            CoreCallEvent::LocalVideoChanged { visible } => Self::LocalVideoChanged { visible },
            CoreCallEvent::RemoteVideoChanged { uid, visible } => {
                Self::RemoteVideoChanged { uid, visible }
            }
        }
    }
}

// ── Error conversion ──────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum DuoError {
    #[error("{msg}")]
    PermissionDenied { msg: String },
    #[error("{msg}")]
    EngineInit { msg: String },
    #[error("{msg}")]
    EngineCall { msg: String },
    #[error("{msg}")]
    NotJoined { msg: String },
    #[error("{msg}")]
    SessionClosed { msg: String },
    #[error("Config error: {msg}")]
    Config { msg: String },
    #[error("Callback error: {msg}")]
    Callback { msg: String },
}

impl From<CallError> for DuoError {
    fn from(e: CallError) -> Self {
        tracing::error!("CallError: {e}");
        let msg = e.to_string();
        match e {
            CallError::PermissionDenied => Self::PermissionDenied { msg },
            CallError::EngineInit(_) => Self::EngineInit { msg },
            CallError::EngineCall(_) => Self::EngineCall { msg },
            CallError::NotJoined => Self::NotJoined { msg },
            CallError::SessionClosed => Self::SessionClosed { msg },
            CallError::Config(_) => Self::Config { msg },
        }
    }
}

impl From<uniffi::UnexpectedUniFFICallbackError> for DuoError {
    fn from(e: uniffi::UnexpectedUniFFICallbackError) -> Self {
        Self::Callback { msg: e.reason }
    }
}

fn engine_error(e: DuoError) -> EngineError {
    EngineError::new(e.to_string())
}

// ── Callback interfaces ───────────────────────────────────────────────

pub trait CallEventListener: Send + Sync {
    fn on_event(&self, event: CallEvent);
}

/// The vendor media engine, implemented by the native shell.
pub trait NativeEngine: Send + Sync {
    fn create(&self, app_id: String) -> Result<(), DuoError>;
    fn enable_video(&self) -> Result<(), DuoError>;
    fn setup_local_video(&self, canvas: VideoCanvas) -> Result<(), DuoError>;
    fn setup_remote_video(&self, canvas: VideoCanvas) -> Result<(), DuoError>;
    fn start_preview(&self) -> Result<(), DuoError>;
    fn join_channel(
        &self,
        token: String,
        channel: String,
        uid: u32,
        options: ChannelMediaOptions,
    ) -> Result<(), DuoError>;
    fn leave_channel(&self) -> Result<(), DuoError>;
    fn stop_preview(&self) -> Result<(), DuoError>;
    fn destroy(&self);
}

/// View containers for the local and remote video. Implementations must
/// apply every call on the platform main thread.
pub trait NativeRenderHost: Send + Sync {
    fn create_surface(&self, kind: SlotKind) -> Result<u64, DuoError>;
    fn set_media_overlay(&self, surface_id: u64, overlay: bool);
    fn set_visible(&self, surface_id: u64, visible: bool);
    fn release_surface(&self, surface_id: u64);
}

pub trait NativePermissions: Send + Sync {
    fn has_permissions(&self) -> bool;
    fn request_permissions(&self, request_id: u32);
}

// ── Bridges: FFI callbacks → core traits ─────────────────────────────

struct BridgeListener {
    ffi_listener: Arc<dyn CallEventListener>,
}

impl duo_core::CallEventListener for BridgeListener {
    fn on_event(&self, event: CoreCallEvent) {
        self.ffi_listener.on_event(event.into());
    }
}

/// Event handler of the live engine. The shell reports SDK callbacks to
/// DuoClient, which routes them here.
///
/// Each install gets a new generation. A destroyed engine only clears the
/// route if no newer engine has installed its handler since.
#[derive(Clone, Default)]
struct EngineEventRoute {
    slot: Arc<StdMutex<RouteSlot>>,
}

#[derive(Default)]
struct RouteSlot {
    generation: u64,
    handler: Option<Arc<dyn EngineEventHandler>>,
}

impl EngineEventRoute {
    fn lock(&self) -> std::sync::MutexGuard<'_, RouteSlot> {
        self.slot.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn install(&self, handler: Arc<dyn EngineEventHandler>) -> u64 {
        let mut slot = self.lock();
        slot.generation += 1;
        slot.handler = Some(handler);
        slot.generation
    }

    fn clear(&self, generation: u64) {
        let mut slot = self.lock();
        if slot.generation == generation {
            slot.handler = None;
        } else {
            tracing::debug!(generation, live = slot.generation, "stale engine, route kept");
        }
    }

    fn current(&self) -> Option<Arc<dyn EngineEventHandler>> {
        let handler = self.lock().handler.clone();
        if handler.is_none() {
            tracing::debug!("engine event without live engine, dropped");
        }
        handler
    }
}

struct BridgeEngineFactory {
    native: Arc<dyn NativeEngine>,
    route: EngineEventRoute,
}

impl duo_core::EngineFactory for BridgeEngineFactory {
    fn create(
        &self,
        config: duo_core::EngineConfig,
    ) -> Result<Box<dyn duo_core::MediaEngine>, EngineError> {
        self.native.create(config.app_id).map_err(engine_error)?;
        let generation = self.route.install(config.event_handler);
        Ok(Box::new(BridgeEngine {
            native: self.native.clone(),
            route: self.route.clone(),
            generation,
        }))
    }
}

struct BridgeEngine {
    native: Arc<dyn NativeEngine>,
    route: EngineEventRoute,
    generation: u64,
}

impl duo_core::MediaEngine for BridgeEngine {
    fn enable_video(&mut self) -> Result<(), EngineError> {
        self.native.enable_video().map_err(engine_error)
    }

    fn setup_local_video(&mut self, canvas: duo_core::VideoCanvas) -> Result<(), EngineError> {
        self.native.setup_local_video(canvas.into()).map_err(engine_error)
    }

    fn setup_remote_video(&mut self, canvas: duo_core::VideoCanvas) -> Result<(), EngineError> {
        self.native.setup_remote_video(canvas.into()).map_err(engine_error)
    }

    fn start_preview(&mut self) -> Result<(), EngineError> {
        self.native.start_preview().map_err(engine_error)
    }

    fn join_channel(
        &mut self,
        token: &str,
        channel: &str,
        uid: u32,
        options: duo_core::ChannelMediaOptions,
    ) -> Result<(), EngineError> {
        self.native
            .join_channel(token.to_string(), channel.to_string(), uid, options.into())
            .map_err(engine_error)
    }

    fn leave_channel(&mut self) -> Result<(), EngineError> {
        self.native.leave_channel().map_err(engine_error)
    }

    fn stop_preview(&mut self) -> Result<(), EngineError> {
        self.native.stop_preview().map_err(engine_error)
    }

    fn destroy(self: Box<Self>) {
        self.route.clear(self.generation);
        self.native.destroy();
    }
}

struct BridgeRenderHost {
    native: Box<dyn NativeRenderHost>,
}

impl duo_core::RenderHost for BridgeRenderHost {
    fn create_surface(
        &mut self,
        kind: duo_core::SlotKind,
    ) -> Result<duo_core::SurfaceId, EngineError> {
        self.native
            .create_surface(kind.into())
            .map(duo_core::SurfaceId)
            .map_err(engine_error)
    }

    fn set_media_overlay(&mut self, surface: duo_core::SurfaceId, overlay: bool) {
        self.native.set_media_overlay(surface.0, overlay);
    }

    fn set_visible(&mut self, surface: duo_core::SurfaceId, visible: bool) {
        self.native.set_visible(surface.0, visible);
    }

    fn release_surface(&mut self, surface: duo_core::SurfaceId) {
        self.native.release_surface(surface.0);
    }
}

struct BridgePermissions {
    native: Box<dyn NativePermissions>,
}

impl duo_core::PermissionGate for BridgePermissions {
    fn has_permissions(&self) -> bool {
        self.native.has_permissions()
    }

    fn request_permissions(&self, request_id: u32, permissions: &[duo_core::Permission]) {
        tracing::debug!(request_id, ?permissions, "forwarding permission request");
        self.native.request_permissions(request_id);
    }
}

// ── DuoClient: main FFI object ────────────────────────────────────────

pub struct DuoClient {
    session: CallSession,
    config: ConfigStore,
    route: EngineEventRoute,
    rt: tokio::runtime::Runtime,
}

impl DuoClient {
    pub fn new(
        data_dir: String,
        engine: Box<dyn NativeEngine>,
        render_host: Box<dyn NativeRenderHost>,
        permissions: Box<dyn NativePermissions>,
    ) -> Self {
        duo_log("DUO FFI: DuoClient::new() called");
        let rt = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");
        let config = ConfigStore::new(&data_dir);
        let route = EngineEventRoute::default();

        let session = CallSession::spawn(
            rt.handle(),
            config.get(),
            Box::new(BridgeEngineFactory {
                native: Arc::from(engine),
                route: route.clone(),
            }),
            Box::new(BridgeRenderHost { native: render_host }),
            Arc::new(BridgePermissions { native: permissions }),
        );

        duo_log("DUO FFI: DuoClient::new() completed");
        Self {
            session,
            config,
            route,
            rt,
        }
    }

    /// Request permissions if needed and create the engine eagerly.
    pub fn start(&self) -> Result<(), DuoError> {
        self.run("start", self.session.start())
    }

    pub fn join_channel(&self) -> Result<(), DuoError> {
        self.run("join_channel", self.session.join())
    }

    pub fn leave_channel(&self) -> Result<(), DuoError> {
        self.run("leave_channel", self.session.leave())
    }

    /// Stop the call and release the engine. Safe to call more than once.
    pub fn teardown(&self) {
        if let Err(e) = self.run("teardown", self.session.teardown()) {
            tracing::debug!("teardown: {e}");
        }
    }

    pub fn on_permissions_result(&self, request_id: u32, granted: bool) -> Result<(), DuoError> {
        self.run(
            "on_permissions_result",
            self.session.permissions_result(request_id, granted),
        )
    }

    pub fn on_join_channel_success(&self, channel: String, uid: u32, elapsed: u32) {
        if let Some(handler) = self.route.current() {
            handler.on_join_channel_success(&channel, uid, elapsed);
        }
    }

    pub fn on_user_joined(&self, uid: u32, elapsed: u32) {
        if let Some(handler) = self.route.current() {
            handler.on_user_joined(uid, elapsed);
        }
    }

    pub fn on_user_offline(&self, uid: u32, reason: i32) {
        if let Some(handler) = self.route.current() {
            handler.on_user_offline(uid, reason.into());
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot().into()
    }

    pub fn is_joined(&self) -> bool {
        self.session.snapshot().joined
    }

    pub fn add_listener(&self, listener: Box<dyn CallEventListener>) {
        let bridge = Arc::new(BridgeListener {
            ffi_listener: Arc::from(listener),
        });
        self.session.add_listener(bridge);
    }

    pub fn get_config(&self) -> CallConfig {
        self.config.get().into()
    }

    pub fn set_app_id(&self, app_id: String) -> Result<(), DuoError> {
        self.config.set_app_id(app_id)?;
        self.push_config()
    }

    pub fn set_token(&self, token: String) -> Result<(), DuoError> {
        self.config.set_token(token)?;
        self.push_config()
    }

    pub fn set_channel_name(&self, channel_name: String) -> Result<(), DuoError> {
        self.config.set_channel_name(channel_name)?;
        self.push_config()
    }

    fn push_config(&self) -> Result<(), DuoError> {
        self.run("update_config", self.session.update_config(self.config.get()))
    }

    /// Block on a session future without letting a panic cross the FFI
    /// boundary.
    fn run(
        &self,
        label: &str,
        fut: impl Future<Output = Result<(), CallError>>,
    ) -> Result<(), DuoError> {
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| self.rt.block_on(fut)));
        match result {
            Ok(res) => res.map_err(DuoError::from),
            Err(panic_info) => {
                let msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "unknown panic".to_string()
                };
                duo_log(&format!("DUO FFI: {label}() PANIC caught: {msg}"));
                Err(DuoError::EngineCall { msg: format!("panic in {label}: {msg}") })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::time::{Duration, Instant};

    #[derive(Clone, Default)]
    struct ShellEngine {
        calls: Arc<StdMutex<Vec<String>>>,
    }

    impl ShellEngine {
        fn log(&self, call: impl Into<String>) -> Result<(), DuoError> {
            self.calls.lock().unwrap().push(call.into());
            Ok(())
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl NativeEngine for ShellEngine {
        fn create(&self, app_id: String) -> Result<(), DuoError> {
            self.log(format!("create {app_id}"))
        }
        fn enable_video(&self) -> Result<(), DuoError> {
            self.log("enable_video")
        }
        fn setup_local_video(&self, canvas: VideoCanvas) -> Result<(), DuoError> {
            self.log(format!("setup_local_video {}", canvas.uid))
        }
        fn setup_remote_video(&self, canvas: VideoCanvas) -> Result<(), DuoError> {
            self.log(format!("setup_remote_video {}", canvas.uid))
        }
        fn start_preview(&self) -> Result<(), DuoError> {
            self.log("start_preview")
        }
        fn join_channel(
            &self,
            token: String,
            channel: String,
            uid: u32,
            _options: ChannelMediaOptions,
        ) -> Result<(), DuoError> {
            self.log(format!("join_channel {token} {channel} {uid}"))
        }
        fn leave_channel(&self) -> Result<(), DuoError> {
            self.log("leave_channel")
        }
        fn stop_preview(&self) -> Result<(), DuoError> {
            self.log("stop_preview")
        }
        fn destroy(&self) {
            let _ = self.log("destroy");
        }
    }

    #[derive(Default)]
    struct ShellViews {
        next: AtomicU64,
    }

    impl NativeRenderHost for ShellViews {
        fn create_surface(&self, _kind: SlotKind) -> Result<u64, DuoError> {
            Ok(self.next.fetch_add(1, Ordering::SeqCst) + 1)
        }
        fn set_media_overlay(&self, _surface_id: u64, _overlay: bool) {}
        fn set_visible(&self, _surface_id: u64, _visible: bool) {}
        fn release_surface(&self, _surface_id: u64) {}
    }

    struct ShellPermissions {
        granted: Arc<AtomicBool>,
    }

    impl NativePermissions for ShellPermissions {
        fn has_permissions(&self) -> bool {
            self.granted.load(Ordering::SeqCst)
        }
        fn request_permissions(&self, _request_id: u32) {}
    }

    fn client(granted: bool) -> (DuoClient, ShellEngine, Arc<AtomicBool>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let engine = ShellEngine::default();
        let granted = Arc::new(AtomicBool::new(granted));
        let client = DuoClient::new(
            dir.path().to_str().unwrap().to_string(),
            Box::new(engine.clone()),
            Box::new(ShellViews::default()),
            Box::new(ShellPermissions { granted: granted.clone() }),
        );
        client.set_app_id("app-1".into()).unwrap();
        client.set_token("tok".into()).unwrap();
        client.set_channel_name("room-1".into()).unwrap();
        (client, engine, granted, dir)
    }

    fn eventually(mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        false
    }

    #[test]
    fn test_join_and_leave_through_shell_callbacks() {
        let (client, engine, _granted, _dir) = client(true);
        client.start().unwrap();
        client.join_channel().unwrap();
        assert!(!client.is_joined());

        client.on_join_channel_success("room-1".into(), 5, 10);
        assert!(eventually(|| client.is_joined()));

        client.on_user_joined(7, 3);
        assert!(eventually(|| client.snapshot().remote_uid == Some(7)));

        client.leave_channel().unwrap();
        assert_eq!(client.snapshot().state, SessionState::Left);
        assert_eq!(
            engine.calls(),
            vec![
                "create app-1",
                "enable_video",
                "setup_local_video 0",
                "start_preview",
                "join_channel tok room-1 5",
                "setup_remote_video 7",
                "leave_channel",
            ]
        );
    }

    #[test]
    fn test_permission_denied_maps_to_ffi_error() {
        let (client, engine, granted, _dir) = client(false);
        let err = client.join_channel().unwrap_err();
        assert!(matches!(err, DuoError::PermissionDenied { .. }));
        assert!(engine.calls().is_empty());

        granted.store(true, Ordering::SeqCst);
        client
            .on_permissions_result(duo_core::PERMISSION_REQUEST_ID, true)
            .unwrap();
        assert_eq!(client.snapshot().state, SessionState::Joining);
    }

    #[test]
    fn test_teardown_destroys_engine_and_tolerates_repeat() {
        let (client, engine, _granted, _dir) = client(true);
        client.start().unwrap();
        client.teardown();
        client.teardown();

        assert!(eventually(|| engine.calls().last().map(String::as_str) == Some("destroy")));
        client.on_user_joined(7, 1);
        assert_eq!(client.snapshot().state, SessionState::Destroying);
        assert!(matches!(
            client.join_channel(),
            Err(DuoError::SessionClosed { .. })
        ));
    }

    struct SilentHandler;

    impl EngineEventHandler for SilentHandler {
        fn on_join_channel_success(&self, _channel: &str, _uid: u32, _elapsed_ms: u32) {}
        fn on_user_joined(&self, _uid: u32, _elapsed_ms: u32) {}
        fn on_user_offline(&self, _uid: u32, _reason: duo_core::OfflineReason) {}
    }

    #[test]
    fn test_stale_engine_destroy_keeps_newer_route() {
        use duo_core::{EngineFactory as _, MediaEngine as _};

        let route = EngineEventRoute::default();
        let factory = BridgeEngineFactory {
            native: Arc::new(ShellEngine::default()),
            route: route.clone(),
        };
        let config = || duo_core::EngineConfig {
            app_id: "app-1".into(),
            event_handler: Arc::new(SilentHandler),
        };

        let first = factory.create(config()).unwrap();
        let second = factory.create(config()).unwrap();

        first.destroy();
        assert!(route.current().is_some());

        second.destroy();
        assert!(route.current().is_none());
    }

    #[test]
    fn test_events_before_engine_are_dropped() {
        let (client, _engine, _granted, _dir) = client(true);
        client.on_user_joined(7, 1);
        assert_eq!(client.snapshot().remote_uid, None);
    }
}
