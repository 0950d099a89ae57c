use std::fmt;

use super::frame::{self, CodecError};

// -----------------------------------------------------------------------------
// ----- OwnMessage ------------------------------------------------------------

/// One decoded OpenWebNet frame, classified over the finite set of protocol
/// categories so routing can match exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnMessage {
    /// `*#*1##` — positive acknowledgement.
    Ack,

    /// `*#*0##` — negative acknowledgement.
    Nack,

    /// `*#<digits>##` — authentication nonce sent by the gateway during the
    /// handshake (and the client's password answer, same shape).
    Nonce(String),

    /// `*99*<kind>##` — session request sent by the client after the greeting.
    SessionRequest { kind: String },

    /// `*WHO*WHAT*WHERE##` — command or unsolicited event.
    Command {
        who: String,
        what: String,
        where_: String,
    },

    /// `*#WHO*WHERE##` — status request.
    StatusRequest { who: String, where_: String },

    /// `*#WHO*WHERE*DIM[*VAL...]##` — dimension request (no values) or
    /// dimension reply/event (with values).
    Dimension {
        who: String,
        where_: String,
        dimension: String,
        values: Vec<String>,
    },
}

// -----------------------------------------------------------------------------
// ----- OwnMessage: Static ----------------------------------------------------

impl OwnMessage {
    pub fn parse(raw: &str) -> Result<OwnMessage, CodecError> {
        frame::check(raw)?;

        let body = &raw[..raw.len() - 2]; // strip "##"

        match body {
            "*#*1" => return Ok(OwnMessage::Ack),
            "*#*0" => return Ok(OwnMessage::Nack),
            _ => {}
        }

        if let Some(rest) = body.strip_prefix("*#") {
            return Self::parse_status(raw, rest);
        }

        // Plain command frame: *WHO*WHAT*WHERE##
        let parts: Vec<&str> = body[1..].split('*').collect();
        match parts.as_slice() {
            [who, kind] if *who == "99" => Ok(OwnMessage::SessionRequest {
                kind: (*kind).to_string(),
            }),
            [who, what, where_] => Ok(OwnMessage::Command {
                who: (*who).to_string(),
                what: (*what).to_string(),
                where_: (*where_).to_string(),
            }),
            _ => Err(CodecError::UnknownShape(raw.to_string())),
        }
    }
}

// -----------------------------------------------------------------------------
// ----- OwnMessage: Public ----------------------------------------------------

impl OwnMessage {
    /// Frames the listening loop must route to the correlation table rather
    /// than to the event sink.
    pub fn is_acknowledgement(&self) -> bool {
        matches!(self, OwnMessage::Ack | OwnMessage::Nack)
    }

    pub fn who(&self) -> Option<&str> {
        match self {
            OwnMessage::Command { who, .. }
            | OwnMessage::StatusRequest { who, .. }
            | OwnMessage::Dimension { who, .. } => Some(who),
            _ => None,
        }
    }
}

// -----------------------------------------------------------------------------
// ----- OwnMessage: Private ---------------------------------------------------

impl OwnMessage {
    fn parse_status(raw: &str, rest: &str) -> Result<OwnMessage, CodecError> {
        if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(OwnMessage::Nonce(rest.to_string()));
        }

        let parts: Vec<&str> = rest.split('*').collect();
        match parts.as_slice() {
            [who, where_] => Ok(OwnMessage::StatusRequest {
                who: (*who).to_string(),
                where_: (*where_).to_string(),
            }),
            [who, where_, dimension, values @ ..] => Ok(OwnMessage::Dimension {
                who: (*who).to_string(),
                where_: (*where_).to_string(),
                dimension: (*dimension).to_string(),
                values: values.iter().map(|v| (*v).to_string()).collect(),
            }),
            _ => Err(CodecError::UnknownShape(raw.to_string())),
        }
    }
}

// -----------------------------------------------------------------------------
// ----- OwnCommand ------------------------------------------------------------

/// A validated outbound frame. Construction is the codec validity gate: the
/// dispatcher refuses to queue anything that does not parse as a command,
/// status request or dimension request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnCommand {
    frame: String,
}

impl OwnCommand {
    pub fn new(frame: impl Into<String>) -> Result<Self, CodecError> {
        let frame = frame.into();
        match OwnMessage::parse(&frame)? {
            OwnMessage::Command { .. }
            | OwnMessage::StatusRequest { .. }
            | OwnMessage::Dimension { .. } => Ok(Self { frame }),
            _ => Err(CodecError::NotACommand(frame)),
        }
    }

    pub fn is_valid(frame: &str) -> bool {
        Self::new(frame).is_ok()
    }

    pub fn frame(&self) -> &str {
        &self.frame
    }

    pub fn who(&self) -> Option<String> {
        OwnMessage::parse(&self.frame)
            .ok()
            .and_then(|m| m.who().map(str::to_string))
    }
}

impl fmt::Display for OwnCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.frame)
    }
}

// -----------------------------------------------------------------------------
// ----- Tests -----------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_acknowledgements() {
        assert_eq!(OwnMessage::parse("*#*1##").unwrap(), OwnMessage::Ack);
        assert_eq!(OwnMessage::parse("*#*0##").unwrap(), OwnMessage::Nack);
        assert!(OwnMessage::parse("*#*1##").unwrap().is_acknowledgement());
    }

    #[test]
    fn classifies_nonce() {
        assert_eq!(
            OwnMessage::parse("*#603356072##").unwrap(),
            OwnMessage::Nonce("603356072".to_string())
        );
    }

    #[test]
    fn classifies_session_request() {
        assert_eq!(
            OwnMessage::parse("*99*1##").unwrap(),
            OwnMessage::SessionRequest {
                kind: "1".to_string()
            }
        );
    }

    #[test]
    fn classifies_command() {
        let msg = OwnMessage::parse("*1*1*12##").unwrap();
        assert_eq!(
            msg,
            OwnMessage::Command {
                who: "1".to_string(),
                what: "1".to_string(),
                where_: "12".to_string(),
            }
        );
        assert_eq!(msg.who(), Some("1"));
    }

    #[test]
    fn classifies_status_and_dimension() {
        assert_eq!(
            OwnMessage::parse("*#1*12##").unwrap(),
            OwnMessage::StatusRequest {
                who: "1".to_string(),
                where_: "12".to_string(),
            }
        );

        assert_eq!(
            OwnMessage::parse("*#13**16*1*2*3##").unwrap(),
            OwnMessage::Dimension {
                who: "13".to_string(),
                where_: String::new(),
                dimension: "16".to_string(),
                values: vec!["1".to_string(), "2".to_string(), "3".to_string()],
            }
        );
    }

    #[test]
    fn rejects_malformed_frames() {
        assert!(OwnMessage::parse("").is_err());
        assert!(OwnMessage::parse("hello##").is_err());
        assert!(OwnMessage::parse("*1*1*12").is_err());
    }

    #[test]
    fn command_gate_rejects_non_commands() {
        assert!(OwnCommand::new("*1*1*12##").is_ok());
        assert!(OwnCommand::new("*#1*12##").is_ok());
        assert!(OwnCommand::new("*#*1##").is_err());
        assert!(OwnCommand::new("*99*1##").is_err());
        assert!(!OwnCommand::is_valid("switch on the lights"));
    }
}

// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
