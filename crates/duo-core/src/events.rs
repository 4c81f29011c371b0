use std::sync::Arc;

use crate::session::SessionState;

/// Events emitted by the core to native UI listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallEvent {
    StateChanged(SessionState),
    /// Short user-facing message, shown as a toast by the shell.
    Notice(String),
    LocalVideoChanged { visible: bool },
    RemoteVideoChanged { uid: u32, visible: bool },
}

/// Trait for receiving events from the core.
/// Implementations must be Send + Sync (called from the session task).
pub trait CallEventListener: Send + Sync {
    fn on_event(&self, event: CallEvent);
}

/// Internal event emitter that dispatches to registered listeners.
#[derive(Clone, Default)]
pub struct EventEmitter {
    listeners: Arc<std::sync::RwLock<Vec<Arc<dyn CallEventListener>>>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&self, listener: Arc<dyn CallEventListener>) {
        self.listeners
            .write()
            .expect("listener lock poisoned")
            .push(listener);
    }

    pub fn emit(&self, event: CallEvent) {
        let listeners = self.listeners.read().expect("listener lock poisoned");
        for listener in listeners.iter() {
            listener.on_event(event.clone());
        }
    }

    pub fn notice(&self, message: impl Into<String>) {
        self.emit(CallEvent::Notice(message.into()));
    }
}
