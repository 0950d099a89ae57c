use bytes::BytesMut;
use memchr::memmem;
use thiserror::Error;

// -----------------------------------------------------------------------------
// ----- Constants -------------------------------------------------------------

/// Every OpenWebNet frame is ASCII and terminated by `##`.
pub const FRAME_END: &[u8] = b"##";

// -----------------------------------------------------------------------------
// ----- CodecError ------------------------------------------------------------

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("frame must start with '*' and end with \"##\"")]
    BadDelimiters,

    #[error("frame contains characters outside the protocol alphabet")]
    BadCharacters,

    #[error("empty frame")]
    Empty,

    #[error("unrecognized frame shape: {0}")]
    UnknownShape(String),

    #[error("frame is not a command: {0}")]
    NotACommand(String),
}

// -----------------------------------------------------------------------------
// ----- Frame extraction ------------------------------------------------------

/// Pull the next complete frame (including its `##` terminator) out of a read
/// buffer. Returns `None` when no full frame has arrived yet.
///
/// Decoding is lossy on purpose: a frame of garbage bytes must reach the
/// classifier (and be rejected there) instead of tearing down the transport.
pub fn extract(buffer: &mut BytesMut) -> Option<String> {
    let end = memmem::find(buffer, FRAME_END)?;
    let raw = buffer.split_to(end + FRAME_END.len());

    Some(String::from_utf8_lossy(&raw).into_owned())
}

/// Shape check shared by the parser and `OwnCommand::is_valid`: delimiters
/// plus the protocol alphabet (digits, `*`, `#`).
pub fn check(raw: &str) -> Result<(), CodecError> {
    if raw.is_empty() {
        return Err(CodecError::Empty);
    }
    if raw.len() < 4 || !raw.starts_with('*') || !raw.ends_with("##") {
        return Err(CodecError::BadDelimiters);
    }
    if !raw
        .bytes()
        .all(|b| b.is_ascii_digit() || b == b'*' || b == b'#')
    {
        return Err(CodecError::BadCharacters);
    }
    Ok(())
}

pub fn is_well_formed(raw: &str) -> bool {
    check(raw).is_ok()
}

// -----------------------------------------------------------------------------
// ----- Tests -----------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_single_frame() {
        let mut buf = BytesMut::from(&b"*1*1*12##"[..]);
        let frame = extract(&mut buf).unwrap();
        assert_eq!(frame, "*1*1*12##");
        assert!(buf.is_empty());
    }

    #[test]
    fn extracts_frames_in_arrival_order() {
        let mut buf = BytesMut::from(&b"*#*1##*1*0*23##*#*0##"[..]);
        assert_eq!(extract(&mut buf).unwrap(), "*#*1##");
        assert_eq!(extract(&mut buf).unwrap(), "*1*0*23##");
        assert_eq!(extract(&mut buf).unwrap(), "*#*0##");
        assert!(extract(&mut buf).is_none());
    }

    #[test]
    fn partial_frame_stays_buffered() {
        let mut buf = BytesMut::from(&b"*1*1*1"[..]);
        assert!(extract(&mut buf).is_none());
        assert_eq!(&buf[..], b"*1*1*1");

        buf.extend_from_slice(b"2##");
        assert_eq!(extract(&mut buf).unwrap(), "*1*1*12##");
    }

    #[test]
    fn well_formed_accepts_protocol_frames() {
        assert!(is_well_formed("*1*1*12##"));
        assert!(is_well_formed("*#*1##"));
        assert!(is_well_formed("*#13**15##"));
    }

    #[test]
    fn well_formed_rejects_garbage() {
        assert!(!is_well_formed("1*1*12##"));
        assert!(!is_well_formed("*1*1*12"));
        assert!(!is_well_formed("*1*on*12##"));
        assert!(!is_well_formed("##"));
    }
}

// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
