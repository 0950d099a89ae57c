use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

use owngate::config::CliConfig;
use owngate::{SessionEvent, SessionSupervisor};

// -----------------------------------------------------------------------------
// ----- Constants -------------------------------------------------------------

const APP_NAME: &str = "owngate";

// -----------------------------------------------------------------------------
// ----- Main ------------------------------------------------------------------

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let config = CliConfig::from_args();
    init_tracing(&config);

    run(config).await
}

fn init_tracing(config: &CliConfig) {
    let filter = EnvFilter::try_new(config.log_level.clone().as_str()).unwrap();
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

// -----------------------------------------------------------------------------
// ----- Run -------------------------------------------------------------------

async fn run(config: CliConfig) -> std::process::ExitCode {
    let session = SessionSupervisor::new(config.session);

    // Validate reachability and credentials before starting any worker.
    let probe = session.test().await;
    if !probe.success {
        error!(
            "{} cannot use the gateway: {} (check {} first)",
            APP_NAME,
            probe.reason.as_str(),
            match probe.reason {
                owngate::TestReason::Unreachable => "the address",
                _ => "the credentials",
            }
        );
        return std::process::ExitCode::FAILURE;
    }

    let mut events = match session.start().await {
        Ok(events) => events,
        Err(e) => {
            error!("{} failed to start session: {e}", APP_NAME);
            return std::process::ExitCode::FAILURE;
        }
    };

    if let Some(name) = session.name() {
        info!(
            "{} connected to '{}' ({})",
            APP_NAME,
            name,
            session.unique_id().unwrap_or_default()
        );
    }

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("{} shutting down", APP_NAME);
                break;
            }

            event = events.recv() => match event {
                Some(SessionEvent::Message { raw, .. }) => info!("event: {raw}"),
                Some(SessionEvent::Notification(n)) => {
                    info!("notification: gateway={} who={:?} frame={}", n.gateway, n.who, n.frame);
                }
                None => {
                    error!("{} event stream ended", APP_NAME);
                    break;
                }
            }
        }
    }

    session.close().await;
    std::process::ExitCode::SUCCESS
}

// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
