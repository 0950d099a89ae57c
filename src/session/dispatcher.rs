use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tracing::{debug, warn};

use crate::codec::OwnCommand;
use crate::errors::SessionError;

use super::correlation::{AckOutcome, CorrelationTable};

// -----------------------------------------------------------------------------
// ----- CommandRequest --------------------------------------------------------

/// One queued command plus the slot its caller awaits. The outcome is set
/// exactly once, by whichever path resolves the request first.
pub(crate) struct CommandRequest {
    pub command: OwnCommand,
    pub reply: oneshot::Sender<Result<(), SessionError>>,
}

/// FIFO admission, bounded consumption: workers take turns locking the
/// receiver, so dequeue order is the enqueue order regardless of N.
pub(crate) type SharedQueue = Arc<Mutex<mpsc::UnboundedReceiver<CommandRequest>>>;

/// Write half of the transport. `None` while the session is broken; workers
/// fail fast instead of blocking on a dead socket.
pub(crate) type SharedWriter = Arc<Mutex<Option<OwnedWriteHalf>>>;

// -----------------------------------------------------------------------------
// ----- WorkerContext ---------------------------------------------------------

pub(crate) struct WorkerContext {
    pub id: usize,
    pub queue: SharedQueue,
    pub writer: SharedWriter,
    pub correlation: Arc<Mutex<CorrelationTable>>,
    pub command_timeout: Duration,
    pub shutdown: watch::Receiver<bool>,
}

// -----------------------------------------------------------------------------
// ----- Sending loop ----------------------------------------------------------

/// One sending worker: dequeue, transmit, register a correlation entry, wait
/// for the listening loop to resolve it (bounded by the command timeout).
/// A timed-out command is purged and the worker moves on; it never stalls
/// the rest of the queue beyond its own window.
pub(crate) async fn sending_loop(mut ctx: WorkerContext) {
    debug!(worker = ctx.id, "sending worker started");

    loop {
        if *ctx.shutdown.borrow() {
            break;
        }

        let request = tokio::select! {
            _ = ctx.shutdown.changed() => break,
            request = dequeue(&ctx.queue) => match request {
                Some(request) => request,
                // Queue sender gone; the supervisor is tearing down.
                None => break,
            }
        };

        serve(&mut ctx, request).await;
    }

    drain_queue(&ctx.queue).await;
    debug!(worker = ctx.id, "sending worker stopped");
}

async fn dequeue(queue: &SharedQueue) -> Option<CommandRequest> {
    queue.lock().await.recv().await
}

// -----------------------------------------------------------------------------
// ----- Serving one request ---------------------------------------------------

async fn serve(ctx: &mut WorkerContext, request: CommandRequest) {
    let CommandRequest { command, reply } = request;

    // Register under the writer lock: correlation order must equal wire
    // order even when several workers transmit back to back.
    let (key, mut ack_rx) = {
        let mut writer_guard = ctx.writer.lock().await;
        let Some(writer) = writer_guard.as_mut() else {
            let _ = reply.send(Err(SessionError::ConnectionLost));
            return;
        };

        let (key, ack_rx) = ctx.correlation.lock().await.register();

        if let Err(e) = writer.write_all(command.frame().as_bytes()).await {
            warn!(worker = ctx.id, command = %command, error = %e, "transmit failed");
            ctx.correlation.lock().await.purge(key);
            let _ = reply.send(Err(SessionError::ConnectionLost));
            return;
        }

        (key, ack_rx)
    };

    let outcome = tokio::select! {
        resolved = &mut ack_rx => match resolved {
            Ok(outcome) => outcome,
            // Table dropped out from under us; only happens at teardown.
            Err(_) => AckOutcome::Closing,
        },

        _ = tokio::time::sleep(ctx.command_timeout) => {
            ctx.correlation.lock().await.purge(key);
            // The ack may have raced the purge; prefer it over a timeout.
            match ack_rx.try_recv() {
                Ok(outcome) => outcome,
                Err(_) => {
                    debug!(worker = ctx.id, command = %command, "command timed out");
                    let _ = reply.send(Err(SessionError::Timeout(ctx.command_timeout)));
                    return;
                }
            }
        }

        _ = ctx.shutdown.changed() => {
            ctx.correlation.lock().await.purge(key);
            match ack_rx.try_recv() {
                Ok(outcome) => outcome,
                Err(_) => AckOutcome::Closing,
            }
        }
    };

    let _ = reply.send(match outcome {
        AckOutcome::Acknowledged => Ok(()),
        AckOutcome::Rejected => Err(SessionError::Nack),
        AckOutcome::ConnectionLost => Err(SessionError::ConnectionLost),
        AckOutcome::Closing => Err(SessionError::Closing),
    });
}

// -----------------------------------------------------------------------------
// ----- Teardown --------------------------------------------------------------

/// Fail whatever is still queued with `Closing`. Every worker runs this on
/// exit; `try_recv` makes the race between them harmless.
async fn drain_queue(queue: &SharedQueue) {
    let mut guard = queue.lock().await;
    while let Ok(request) = guard.try_recv() {
        let _ = request.reply.send(Err(SessionError::Closing));
    }
}

// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
