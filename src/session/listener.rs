use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{Mutex, mpsc, watch};
use tracing::{debug, warn};

use crate::codec::OwnMessage;
use crate::net::FrameReader;
use crate::shared_types::GatewayIdentity;

use super::correlation::{AckOutcome, CorrelationTable};
use super::events::{EventNotification, SessionEvent};

// -----------------------------------------------------------------------------
// ----- ListenerContext -------------------------------------------------------

pub(crate) struct ListenerContext {
    pub reader: FrameReader,
    pub correlation: Arc<Mutex<CorrelationTable>>,
    pub events: mpsc::UnboundedSender<SessionEvent>,
    pub identity: Arc<RwLock<Option<GatewayIdentity>>>,
    pub generate_events: bool,
    pub shutdown: watch::Receiver<bool>,
}

/// Why the loop stopped; the supervisor's monitor reacts differently to each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListenerExit {
    Shutdown,
    TransportLost,
}

// -----------------------------------------------------------------------------
// ----- Listening loop --------------------------------------------------------

/// Single reader of the transport. Frames are processed strictly in arrival
/// order: acknowledgements resolve the front of the correlation table,
/// everything else goes to the event sink. A malformed frame is logged and
/// skipped; only transport loss or shutdown ends the loop.
pub(crate) async fn listening_loop(mut ctx: ListenerContext) -> ListenerExit {
    debug!("listening loop started");

    loop {
        tokio::select! {
            _ = ctx.shutdown.changed() => {
                // Unblock every worker still awaiting an acknowledgement.
                ctx.correlation.lock().await.drain(AckOutcome::Closing);
                debug!("listening loop stopped on shutdown");
                return ListenerExit::Shutdown;
            }

            read = ctx.reader.next_frame() => match read {
                Ok(Some(raw)) => route_frame(&ctx, raw).await,
                Ok(None) => {
                    warn!("gateway closed the connection");
                    return transport_lost(&ctx).await;
                }
                Err(e) => {
                    warn!(error = %e, "transport read failed");
                    return transport_lost(&ctx).await;
                }
            }
        }
    }
}

// -----------------------------------------------------------------------------
// ----- Routing ---------------------------------------------------------------

async fn route_frame(ctx: &ListenerContext, raw: String) {
    let message = match OwnMessage::parse(&raw) {
        Ok(message) => message,
        Err(e) => {
            warn!(frame = %raw, error = %e, "skipping malformed frame");
            return;
        }
    };

    match message {
        OwnMessage::Ack => {
            if !ctx.correlation.lock().await.resolve_front(AckOutcome::Acknowledged) {
                debug!("stray ACK with no command in flight");
            }
        }
        OwnMessage::Nack => {
            if !ctx.correlation.lock().await.resolve_front(AckOutcome::Rejected) {
                debug!("stray NACK with no command in flight");
            }
        }
        message => deliver_event(ctx, raw, message),
    }
}

fn deliver_event(ctx: &ListenerContext, raw: String, message: OwnMessage) {
    let notification = ctx.generate_events.then(|| EventNotification {
        gateway: ctx
            .identity
            .read()
            .as_ref()
            .map(|i| i.unique_id.clone())
            .unwrap_or_default(),
        frame: raw.clone(),
        who: message.who().map(str::to_string),
    });

    // A dropped receiver only means the application stopped listening;
    // acknowledgement routing must keep working regardless.
    let _ = ctx.events.send(SessionEvent::Message { raw, message });

    if let Some(notification) = notification {
        let _ = ctx.events.send(SessionEvent::Notification(notification));
    }
}

async fn transport_lost(ctx: &ListenerContext) -> ListenerExit {
    let failed = ctx
        .correlation
        .lock()
        .await
        .drain(AckOutcome::ConnectionLost);
    if failed > 0 {
        warn!(in_flight = failed, "failed in-flight commands on connection loss");
    }
    ListenerExit::TransportLost
}

// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
