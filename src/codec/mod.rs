pub mod frame;
pub mod message;
pub mod password;

pub use frame::{CodecError, FRAME_END};
pub use message::{OwnCommand, OwnMessage};
pub use password::own_password;

// OpenWebNet frame codec; session orchestration lives in session/.
