pub mod cli;
pub mod session;
pub mod types;

pub use cli::CliConfig;
pub use session::SessionConfig;
pub use types::LogLevel;
