/// Lifecycle of one gateway session, owned by the supervisor.
///
/// Transitions: `Idle → Connecting → Running → Closing → Closed`, with
/// `Broken` reachable from `Running` when the transport dies. From `Broken`
/// the supervisor either re-enters `Connecting` (reconnect enabled) or stays
/// put until the application calls `close`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Constructed but never started.
    Idle,

    /// Transport being opened and the handshake in progress.
    Connecting,

    /// Listening loop and sending workers are live.
    Running,

    /// Transport failed underneath a running session.
    Broken,

    /// `close` in progress; tasks are being torn down.
    Closing,

    /// Fully torn down; no background tasks remain.
    Closed,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Connecting => "connecting",
            SessionState::Running => "running",
            SessionState::Broken => "broken",
            SessionState::Closing => "closing",
            SessionState::Closed => "closed",
        }
    }

    pub fn is_running(self) -> bool {
        matches!(self, SessionState::Running)
    }
}
