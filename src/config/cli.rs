use std::time::Duration;

use clap::Parser;
use secrecy::SecretString;

use super::session::SessionConfig;
use super::types::LogLevel;

// -----------------------------------------------------------------------------
// ----- CliConfig -------------------------------------------------------------

/// Parsed daemon arguments. The session config is derived from this and
/// injected into the supervisor; nothing here is globally reachable.
#[derive(Clone, Debug)]
pub struct CliConfig {
    pub session: SessionConfig,
    pub log_level: LogLevel,
}

impl CliConfig {
    pub fn from_args() -> Self {
        Self::from(Args::parse())
    }
}

impl From<Args> for CliConfig {
    fn from(args: Args) -> Self {
        let mut session = SessionConfig::new(args.host)
            .with_port(args.port)
            .with_worker_count(args.workers)
            .with_command_timeout(args.command_timeout)
            .with_generate_events(args.generate_events)
            .with_reconnect(args.reconnect);

        if let Some(password) = args.password {
            session = session.with_password(SecretString::new(password.into_boxed_str()));
        }

        Self {
            session,
            log_level: args.log_level,
        }
    }
}

// -----------------------------------------------------------------------------
// ----- Args ------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "owngate", version, about = "OpenWebNet gateway session daemon")]
struct Args {
    // Gateway address. Required via CLI or ENV.
    #[arg(long = "host", short = 'H', env = "OWNGATE_HOST")]
    host: String,

    #[arg(long = "port", short = 'p', env = "OWNGATE_PORT", default_value_t = 20000)]
    port: u16,

    // Numeric OPEN password; most gateways only gate non-local subnets.
    #[arg(long = "password", env = "OWNGATE_PASSWORD")]
    password: Option<String>,

    // Sending concurrency.
    #[arg(long = "workers", env = "OWNGATE_WORKERS", default_value_t = 1)]
    workers: usize,

    #[arg(long = "command-timeout", value_parser = humantime::parse_duration, default_value = "5s")]
    command_timeout: Duration,

    // Emit synthesized notifications alongside raw events.
    #[arg(long = "generate-events", default_value_t = false)]
    generate_events: bool,

    // Re-establish the session after transport failure.
    #[arg(long = "reconnect", default_value_t = false)]
    reconnect: bool,

    #[arg(long = "log", default_value = "info")]
    log_level: LogLevel,
}

// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
