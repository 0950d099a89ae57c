pub mod identity;
pub mod outcome;
pub mod session_state;

pub use identity::GatewayIdentity;
pub use outcome::{TestOutcome, TestReason};
pub use session_state::SessionState;
