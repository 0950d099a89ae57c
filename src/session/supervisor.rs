use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::codec::OwnCommand;
use crate::config::SessionConfig;
use crate::config::session::MAX_RECONNECT_BACKOFF;
use crate::errors::{AuthRejection, SessionError};
use crate::shared_types::{GatewayIdentity, SessionState, TestOutcome, TestReason};

use super::correlation::CorrelationTable;
use super::dispatcher::{
    CommandRequest, SharedQueue, SharedWriter, WorkerContext, sending_loop,
};
use super::events::SessionEvent;
use super::handshake;
use super::listener::{ListenerContext, ListenerExit, listening_loop};

// -----------------------------------------------------------------------------
// ----- SessionSupervisor -----------------------------------------------------

/// Owns one gateway session end to end: transport lifecycle, the listening
/// loop, the sending workers and the state machine. Constructed per gateway
/// and injected into callers; nothing here is ambient.
pub struct SessionSupervisor {
    config: SessionConfig,
    state: Arc<RwLock<SessionState>>,
    identity: Arc<RwLock<Option<GatewayIdentity>>>,
    // tokio mutex: close() holds it across task joins.
    running: Mutex<Option<Running>>,
}

struct Running {
    queue_tx: mpsc::UnboundedSender<CommandRequest>,
    shutdown_tx: watch::Sender<bool>,
    writer: SharedWriter,
    tasks: Vec<JoinHandle<()>>,
}

// -----------------------------------------------------------------------------
// ----- SessionSupervisor: Static ---------------------------------------------

impl SessionSupervisor {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            state: Arc::new(RwLock::new(SessionState::Idle)),
            identity: Arc::new(RwLock::new(None)),
            running: Mutex::new(None),
        }
    }
}

// -----------------------------------------------------------------------------
// ----- SessionSupervisor: Public ---------------------------------------------

impl SessionSupervisor {
    /// Reachability/credential probe: run the full handshake, then drop the
    /// connection. On success the identity accessors are populated. No
    /// background task outlives this call.
    pub async fn test(&self) -> TestOutcome {
        match handshake::establish(&self.config).await {
            Ok((connection, identity)) => {
                drop(connection);
                *self.identity.write() = Some(identity);
                TestOutcome::ok()
            }
            Err(e) => {
                warn!(host = %self.config.host, error = %e, "gateway test failed");
                TestOutcome::failed(test_reason(&e))
            }
        }
    }

    /// Open the transport, authenticate and launch the listening loop plus
    /// the configured number of sending workers. Returns the event stream
    /// the application consumes.
    pub async fn start(&self) -> Result<mpsc::UnboundedReceiver<SessionEvent>, SessionError> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return Err(SessionError::Protocol("session already started".to_string()));
        }

        *self.state.write() = SessionState::Connecting;

        let (connection, identity) = match handshake::establish(&self.config).await {
            Ok(established) => established,
            Err(e) => {
                *self.state.write() = SessionState::Idle;
                return Err(e);
            }
        };

        info!(
            gateway = %identity.unique_id,
            name = %identity.name(),
            workers = self.config.worker_count,
            "gateway session established"
        );
        *self.identity.write() = Some(identity);

        let (reader, writer_half) = connection.into_split();
        let writer: SharedWriter = Arc::new(Mutex::new(Some(writer_half)));
        let correlation = Arc::new(Mutex::new(CorrelationTable::new()));

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let queue: SharedQueue = Arc::new(Mutex::new(queue_rx));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let listener = tokio::spawn(listening_loop(ListenerContext {
            reader,
            correlation: correlation.clone(),
            events: events_tx.clone(),
            identity: self.identity.clone(),
            generate_events: self.config.generate_events,
            shutdown: shutdown_rx.clone(),
        }));

        let mut tasks = Vec::with_capacity(self.config.worker_count + 1);
        for id in 0..self.config.worker_count {
            tasks.push(tokio::spawn(sending_loop(WorkerContext {
                id,
                queue: queue.clone(),
                writer: writer.clone(),
                correlation: correlation.clone(),
                command_timeout: self.config.command_timeout,
                shutdown: shutdown_rx.clone(),
            })));
        }

        tasks.push(tokio::spawn(monitor_loop(MonitorContext {
            config: self.config.clone(),
            state: self.state.clone(),
            identity: self.identity.clone(),
            writer: writer.clone(),
            correlation,
            events: events_tx,
            shutdown: shutdown_rx,
            listener,
        })));

        *self.state.write() = SessionState::Running;
        *running = Some(Running {
            queue_tx,
            shutdown_tx,
            writer,
            tasks,
        });

        Ok(events_rx)
    }

    /// Enqueue one command and await its outcome. Fails fast when the
    /// session is not running.
    pub async fn send(&self, command: OwnCommand) -> Result<(), SessionError> {
        match *self.state.read() {
            SessionState::Running => {}
            SessionState::Broken => return Err(SessionError::ConnectionLost),
            _ => return Err(SessionError::Closing),
        }

        let queue_tx = {
            let running = self.running.lock().await;
            match running.as_ref() {
                Some(running) => running.queue_tx.clone(),
                None => return Err(SessionError::Closing),
            }
        };

        let (reply, outcome) = oneshot::channel();
        queue_tx
            .send(CommandRequest { command, reply })
            .map_err(|_| SessionError::Closing)?;

        // A dropped request (teardown racing the enqueue) reads as Closing.
        outcome.await.unwrap_or(Err(SessionError::Closing))
    }

    /// Validate a raw frame through the codec, then send it. The queue is
    /// never touched for an invalid frame.
    pub async fn send_raw(&self, frame: &str) -> Result<(), SessionError> {
        let command = OwnCommand::new(frame)?;
        self.send(command).await
    }

    /// Tear the session down: cancel the loop and every worker, fail queued
    /// and in-flight requests with `Closing`, close the transport. Returns
    /// only once all tasks have terminated.
    pub async fn close(&self) {
        let Some(running) = self.running.lock().await.take() else {
            *self.state.write() = SessionState::Closed;
            return;
        };

        *self.state.write() = SessionState::Closing;
        let _ = running.shutdown_tx.send(true);
        drop(running.queue_tx);

        for task in running.tasks {
            let _ = task.await;
        }

        *running.writer.lock().await = None;
        *self.state.write() = SessionState::Closed;
        info!("gateway session closed");
    }
}

// -----------------------------------------------------------------------------
// ----- SessionSupervisor: Accessors ------------------------------------------

impl SessionSupervisor {
    pub fn state(&self) -> SessionState {
        *self.state.read()
    }

    pub fn identity(&self) -> Option<GatewayIdentity> {
        self.identity.read().clone()
    }

    pub fn unique_id(&self) -> Option<String> {
        self.identity.read().as_ref().map(|i| i.unique_id.clone())
    }

    pub fn manufacturer(&self) -> Option<&'static str> {
        self.identity.read().as_ref().map(|i| i.manufacturer)
    }

    pub fn model(&self) -> Option<String> {
        self.identity.read().as_ref().map(|i| i.model.clone())
    }

    pub fn firmware(&self) -> Option<String> {
        self.identity.read().as_ref().map(|i| i.firmware.clone())
    }

    pub fn name(&self) -> Option<String> {
        self.identity.read().as_ref().map(GatewayIdentity::name)
    }
}

// -----------------------------------------------------------------------------
// ----- Monitor ---------------------------------------------------------------

struct MonitorContext {
    config: SessionConfig,
    state: Arc<RwLock<SessionState>>,
    identity: Arc<RwLock<Option<GatewayIdentity>>>,
    writer: SharedWriter,
    correlation: Arc<Mutex<CorrelationTable>>,
    events: mpsc::UnboundedSender<SessionEvent>,
    shutdown: watch::Receiver<bool>,
    listener: JoinHandle<ListenerExit>,
}

/// Watches the listening loop. On transport loss it marks the session
/// broken and, when reconnect is enabled, re-establishes the session with
/// exponential backoff; the workers stay alive across the gap and only the
/// listener is respawned per connection.
async fn monitor_loop(mut ctx: MonitorContext) {
    loop {
        let exit = tokio::select! {
            _ = ctx.shutdown.changed() => {
                // Join the listener so close() leaves nothing running.
                let _ = (&mut ctx.listener).await;
                return;
            }
            exited = &mut ctx.listener => exited.unwrap_or(ListenerExit::TransportLost),
        };

        if exit == ListenerExit::Shutdown {
            return;
        }

        *ctx.state.write() = SessionState::Broken;
        *ctx.writer.lock().await = None;

        if !ctx.config.reconnect {
            warn!("gateway connection lost; reconnect disabled, session stays broken");
            return;
        }

        if !reconnect(&mut ctx).await {
            return;
        }
    }
}

/// Backoff loop; `true` once a new connection is live, `false` on shutdown.
async fn reconnect(ctx: &mut MonitorContext) -> bool {
    let mut backoff = ctx.config.reconnect_backoff;

    loop {
        info!(delay = ?backoff, "re-establishing gateway session");
        tokio::select! {
            _ = ctx.shutdown.changed() => return false,
            _ = tokio::time::sleep(backoff) => {}
        }

        match handshake::establish(&ctx.config).await {
            Ok((connection, identity)) => {
                *ctx.identity.write() = Some(identity);

                let (reader, writer_half) = connection.into_split();
                *ctx.writer.lock().await = Some(writer_half);

                ctx.listener = tokio::spawn(listening_loop(ListenerContext {
                    reader,
                    correlation: ctx.correlation.clone(),
                    events: ctx.events.clone(),
                    identity: ctx.identity.clone(),
                    generate_events: ctx.config.generate_events,
                    shutdown: ctx.shutdown.clone(),
                }));

                *ctx.state.write() = SessionState::Running;
                info!("gateway session re-established");
                return true;
            }
            Err(e) => {
                warn!(error = %e, "reconnect attempt failed");
                backoff = (backoff * 2).min(MAX_RECONNECT_BACKOFF);
            }
        }
    }
}

// -----------------------------------------------------------------------------
// ----- Helpers ---------------------------------------------------------------

fn test_reason(error: &SessionError) -> TestReason {
    match error {
        SessionError::Unreachable { .. } => TestReason::Unreachable,
        SessionError::AuthRejected(AuthRejection::PasswordRequired) => {
            TestReason::PasswordRequired
        }
        SessionError::AuthRejected(AuthRejection::PasswordError) => TestReason::PasswordError,
        _ => TestReason::ProtocolError,
    }
}

// -----------------------------------------------------------------------------
// ----- Tests -----------------------------------------------------------------


// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
