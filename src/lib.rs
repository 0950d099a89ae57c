pub mod codec;
pub mod config;
pub mod errors;
pub mod net;
pub mod session;
pub mod shared_types;

pub use codec::{OwnCommand, OwnMessage};
pub use config::SessionConfig;
pub use errors::SessionError;
pub use session::{EventNotification, SessionEvent, SessionSupervisor};
pub use shared_types::{GatewayIdentity, SessionState, TestOutcome, TestReason};
