use std::time::Duration;

use secrecy::SecretString;

// -----------------------------------------------------------------------------
// ----- Constants -------------------------------------------------------------

pub const DEFAULT_PORT: u16 = 20000;
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_RECONNECT_BACKOFF: Duration = Duration::from_secs(2);

/// Reconnect backoff doubles up to this cap.
pub const MAX_RECONNECT_BACKOFF: Duration = Duration::from_secs(60);

// -----------------------------------------------------------------------------
// ----- SessionConfig ---------------------------------------------------------

/// Everything one session needs, supplied by the surrounding application.
/// Passed explicitly to the supervisor; there is no ambient global config.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub host: String,
    pub port: u16,
    pub password: Option<SecretString>,

    /// Number of sending workers (≥ 1).
    pub worker_count: usize,

    /// Per-command acknowledgement window.
    pub command_timeout: Duration,
    pub connect_timeout: Duration,

    /// Emit a synthesized notification payload alongside each raw event.
    pub generate_events: bool,

    /// Re-establish the session after a transport failure.
    pub reconnect: bool,
    pub reconnect_backoff: Duration,
}

// -----------------------------------------------------------------------------
// ----- SessionConfig: Static -------------------------------------------------

impl SessionConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            password: None,
            worker_count: 1,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            generate_events: false,
            reconnect: false,
            reconnect_backoff: DEFAULT_RECONNECT_BACKOFF,
        }
    }
}

// -----------------------------------------------------------------------------
// ----- SessionConfig: Builder ------------------------------------------------

impl SessionConfig {
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_password(mut self, password: SecretString) -> Self {
        self.password = Some(password);
        self
    }

    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count.max(1);
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_generate_events(mut self, enabled: bool) -> Self {
        self.generate_events = enabled;
        self
    }

    pub fn with_reconnect(mut self, enabled: bool) -> Self {
        self.reconnect = enabled;
        self
    }

    pub fn with_reconnect_backoff(mut self, backoff: Duration) -> Self {
        self.reconnect_backoff = backoff;
        self
    }
}

// -----------------------------------------------------------------------------
// ----- Tests -----------------------------------------------------------------


// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
