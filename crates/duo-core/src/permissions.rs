/// Identifies our runtime permission request in the OS result callback.
pub const PERMISSION_REQUEST_ID: u32 = 22;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    RecordAudio,
    Camera,
}

/// Everything a video call needs before joining.
pub const REQUESTED_PERMISSIONS: [Permission; 2] = [Permission::RecordAudio, Permission::Camera];

/// OS permission subsystem, as seen by the session.
pub trait PermissionGate: Send + Sync {
    /// True only if every permission in [`REQUESTED_PERMISSIONS`] is granted.
    fn has_permissions(&self) -> bool;
    /// Show the OS permission dialog. The outcome comes back through
    /// `CallSession::permissions_result` with the same `request_id`.
    fn request_permissions(&self, request_id: u32, permissions: &[Permission]);
}
