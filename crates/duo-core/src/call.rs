//! Session task: the single execution context that owns the controller.
//!
//! UI actions and engine callbacks are both turned into [`Command`]s and
//! processed one at a time, so render-surface mutations never run on the
//! engine's callback thread.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, watch};

use crate::config::CallConfig;
use crate::engine::{EngineEventHandler, EngineFactory, OfflineReason};
use crate::errors::CallError;
use crate::events::{CallEventListener, EventEmitter};
use crate::permissions::{PERMISSION_REQUEST_ID, PermissionGate, REQUESTED_PERMISSIONS};
use crate::render::RenderHost;
use crate::session::{CallSessionController, SessionSnapshot, SessionState};

type Reply = oneshot::Sender<Result<(), CallError>>;

#[derive(Debug)]
enum EngineEvent {
    JoinSuccess { channel: String, uid: u32, elapsed_ms: u32 },
    UserJoined { uid: u32, elapsed_ms: u32 },
    UserOffline { uid: u32, reason: OfflineReason },
}

enum Command {
    Start(Reply),
    Join(Reply),
    Leave(Reply),
    PermissionsResult { request_id: u32, granted: bool, reply: Reply },
    UpdateConfig(CallConfig, Reply),
    Teardown(Reply),
    Engine(EngineEvent),
}

/// Engine event handler that forwards callbacks to the session task.
///
/// Safe to call from any thread. Events posted after the session task has
/// exited are dropped.
#[derive(Clone)]
pub struct EngineEventSink {
    tx: mpsc::UnboundedSender<Command>,
}

impl EngineEventSink {
    fn post(&self, event: EngineEvent) {
        if self.tx.send(Command::Engine(event)).is_err() {
            tracing::debug!("session task gone, engine event dropped");
        }
    }
}

impl EngineEventHandler for EngineEventSink {
    fn on_join_channel_success(&self, channel: &str, uid: u32, elapsed_ms: u32) {
        self.post(EngineEvent::JoinSuccess {
            channel: channel.to_string(),
            uid,
            elapsed_ms,
        });
    }

    fn on_user_joined(&self, uid: u32, elapsed_ms: u32) {
        self.post(EngineEvent::UserJoined { uid, elapsed_ms });
    }

    fn on_user_offline(&self, uid: u32, reason: OfflineReason) {
        self.post(EngineEvent::UserOffline { uid, reason });
    }
}

/// Handle to a running call session.
///
/// Cheap to clone. The session task exits once every handle and every
/// [`EngineEventSink`] is dropped, which includes the one held by a live
/// engine.
#[derive(Clone)]
pub struct CallSession {
    tx: mpsc::UnboundedSender<Command>,
    snapshot: watch::Receiver<SessionSnapshot>,
    emitter: EventEmitter,
}

impl CallSession {
    /// Spawn the session task on `rt`.
    pub fn spawn(
        rt: &Handle,
        config: CallConfig,
        factory: Box<dyn EngineFactory>,
        host: Box<dyn RenderHost>,
        permissions: Arc<dyn PermissionGate>,
    ) -> Self {
        let emitter = EventEmitter::new();
        let (tx, rx) = mpsc::unbounded_channel();
        let controller =
            CallSessionController::new(factory, host, config.local_uid, emitter.clone());
        let (snapshot_tx, snapshot) = watch::channel(controller.snapshot());

        let task = SessionTask {
            controller,
            config,
            permissions,
            weak_tx: tx.downgrade(),
            emitter: emitter.clone(),
            snapshot_tx,
            pending_join: false,
        };
        rt.spawn(task.run(rx));

        Self { tx, snapshot, emitter }
    }

    pub fn add_listener(&self, listener: Arc<dyn CallEventListener>) {
        self.emitter.add_listener(listener);
    }

    /// Event handler to hand to the media engine.
    pub fn event_sink(&self) -> EngineEventSink {
        EngineEventSink { tx: self.tx.clone() }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Wait until the published snapshot satisfies `pred`.
    pub async fn wait_for(
        &self,
        pred: impl FnMut(&SessionSnapshot) -> bool,
    ) -> Result<SessionSnapshot, CallError> {
        let mut rx = self.snapshot.clone();
        let snap = rx
            .wait_for(pred)
            .await
            .map_err(|_| CallError::SessionClosed)?;
        Ok(snap.clone())
    }

    /// Request permissions if missing and create the engine eagerly.
    pub async fn start(&self) -> Result<(), CallError> {
        self.request(Command::Start).await
    }

    pub async fn join(&self) -> Result<(), CallError> {
        self.request(Command::Join).await
    }

    pub async fn leave(&self) -> Result<(), CallError> {
        self.request(Command::Leave).await
    }

    /// Feed back the outcome of the OS permission dialog.
    pub async fn permissions_result(&self, request_id: u32, granted: bool) -> Result<(), CallError> {
        self.request(|reply| Command::PermissionsResult { request_id, granted, reply })
            .await
    }

    pub async fn teardown(&self) -> Result<(), CallError> {
        self.request(Command::Teardown).await
    }

    /// Replace the app id and channel credentials used by later calls.
    /// The local uid is fixed when the session is spawned.
    pub async fn update_config(&self, config: CallConfig) -> Result<(), CallError> {
        self.request(|reply| Command::UpdateConfig(config, reply)).await
    }

    async fn request(&self, make: impl FnOnce(Reply) -> Command) -> Result<(), CallError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .map_err(|_| CallError::SessionClosed)?;
        rx.await.map_err(|_| CallError::SessionClosed)?
    }
}

struct SessionTask {
    controller: CallSessionController,
    config: CallConfig,
    permissions: Arc<dyn PermissionGate>,
    /// Weak so the task can exit once every handle is dropped.
    weak_tx: mpsc::WeakUnboundedSender<Command>,
    emitter: EventEmitter,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    pending_join: bool,
}

impl SessionTask {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        tracing::info!("call session task started");
        while let Some(command) = rx.recv().await {
            match command {
                Command::Start(reply) => {
                    let res = self.start();
                    self.finish(reply, res);
                }
                Command::Join(reply) => {
                    let res = self.join();
                    self.finish(reply, res);
                }
                Command::Leave(reply) => {
                    let res = self.leave();
                    self.finish(reply, res);
                }
                Command::PermissionsResult { request_id, granted, reply } => {
                    let res = self.permissions_result(request_id, granted);
                    self.finish(reply, res);
                }
                Command::UpdateConfig(config, reply) => {
                    tracing::debug!(channel = %config.channel_name, "call config updated");
                    self.config = config;
                    self.finish(reply, Ok(()));
                }
                Command::Teardown(reply) => {
                    self.pending_join = false;
                    self.controller.teardown();
                    self.finish(reply, Ok(()));
                }
                Command::Engine(event) => {
                    self.on_engine_event(event);
                    self.publish();
                }
            }
        }
        tracing::info!("call session task exited");
    }

    fn start(&mut self) -> Result<(), CallError> {
        self.ensure_alive()?;
        if !self.permissions.has_permissions() {
            self.request_permissions();
        }
        self.ensure_engine()
    }

    fn join(&mut self) -> Result<(), CallError> {
        self.ensure_alive()?;
        if !self.permissions.has_permissions() {
            self.pending_join = true;
            self.request_permissions();
            return Err(CallError::PermissionDenied);
        }
        self.pending_join = false;
        self.ensure_engine()?;
        self.controller
            .request_join(&self.config.token, &self.config.channel_name, true)
    }

    fn leave(&mut self) -> Result<(), CallError> {
        self.ensure_alive()?;
        self.controller.request_leave()
    }

    fn permissions_result(&mut self, request_id: u32, granted: bool) -> Result<(), CallError> {
        if request_id != PERMISSION_REQUEST_ID {
            tracing::debug!(request_id, "ignoring foreign permission result");
            return Ok(());
        }
        let pending = std::mem::take(&mut self.pending_join);
        if granted && pending {
            tracing::info!("permissions granted, retrying join");
            return self.join();
        }
        if !granted {
            tracing::warn!("permissions denied by user");
        }
        Ok(())
    }

    fn ensure_alive(&self) -> Result<(), CallError> {
        if self.controller.state() == SessionState::Destroying {
            return Err(CallError::SessionClosed);
        }
        Ok(())
    }

    fn ensure_engine(&mut self) -> Result<(), CallError> {
        let tx = self.weak_tx.upgrade().ok_or(CallError::SessionClosed)?;
        let handler: Arc<dyn EngineEventHandler> = Arc::new(EngineEventSink { tx });
        self.controller
            .ensure_engine_ready(&self.config.app_id, handler)
    }

    fn request_permissions(&self) {
        tracing::info!("requesting camera and microphone permissions");
        self.permissions
            .request_permissions(PERMISSION_REQUEST_ID, &REQUESTED_PERMISSIONS);
    }

    fn on_engine_event(&mut self, event: EngineEvent) {
        if self.controller.state() == SessionState::Destroying {
            tracing::debug!(?event, "session destroying, engine event dropped");
            return;
        }
        match event {
            EngineEvent::JoinSuccess { channel, uid, elapsed_ms } => {
                self.controller.on_join_success(&channel, uid, elapsed_ms);
            }
            EngineEvent::UserJoined { uid, elapsed_ms } => {
                tracing::info!(uid, elapsed_ms, "remote user joined");
                self.controller.on_remote_user_joined(uid);
            }
            EngineEvent::UserOffline { uid, reason } => {
                tracing::info!(uid, %reason, "remote user offline");
                self.controller.on_remote_user_left(uid, reason);
            }
        }
    }

    /// Report the outcome to the caller and surface errors as a notice.
    fn finish(&mut self, reply: Reply, res: Result<(), CallError>) {
        if let Err(e) = &res {
            tracing::warn!("call action failed: {e}");
            self.emitter.notice(e.to_string());
        }
        self.publish();
        let _ = reply.send(res);
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.controller.snapshot());
    }
}
