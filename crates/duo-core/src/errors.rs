use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error("Permission was not granted")]
    PermissionDenied,
    #[error("engine init failed: {0}")]
    EngineInit(String),
    #[error("engine call failed: {0}")]
    EngineCall(String),
    #[error("Join a channel first")]
    NotJoined,
    #[error("call session closed")]
    SessionClosed,
    #[error("config error: {0}")]
    Config(String),
}

/// Failure reported by an external collaborator (media engine, render host).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct EngineError(pub String);

impl EngineError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}
