use serde::Serialize;

use crate::codec::OwnMessage;

// -----------------------------------------------------------------------------
// ----- SessionEvent ----------------------------------------------------------

/// What the listening loop hands to the application's event sink, in strict
/// arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Unsolicited frame from the gateway.
    Message { raw: String, message: OwnMessage },

    /// Synthesized payload, emitted after the raw message when event
    /// generation is enabled.
    Notification(EventNotification),
}

// -----------------------------------------------------------------------------
// ----- EventNotification -----------------------------------------------------

/// Generic notification mirroring the raw frame, ready to be forwarded to an
/// external bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventNotification {
    /// Unique id of the originating gateway.
    pub gateway: String,

    /// Raw wire frame.
    pub frame: String,

    /// WHO of the frame, when it has one.
    pub who: Option<String>,
}

// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
