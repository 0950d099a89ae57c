pub mod correlation;
pub mod dispatcher;
pub mod events;
pub mod handshake;
pub mod listener;
pub mod supervisor;

pub use events::{EventNotification, SessionEvent};
pub use supervisor::SessionSupervisor;

// Session orchestration: handshake, listening loop, sending workers and the
// supervisor that owns them. Frame-level code stays in codec/ and net/.
