//! # The line protocol spoken with the worker.
//!
//! All messages are single lines of UTF-8 text, trimmed of surrounding
//! whitespace by the framing layer:
//!
//! | Direction          | Message             | Meaning                        |
//! |--------------------|---------------------|--------------------------------|
//! | worker → supervisor| `ready`             | handshake complete, device open|
//! | worker → supervisor| `error:device`      | device could not be opened     |
//! | supervisor → worker| `<n>,<n>,...,<n>`   | channel values, comma-joined   |
//! | worker → supervisor| `OK:<n>`            | `n` bytes written to the device|
//!
//! Anything else is a protocol error, surfaced to the pending caller.

/// Upper bound on channels per frame: the size of one DMX universe.
pub const MAX_CHANNELS: usize = 512;

const READY: &str = "ready";
const DEVICE_ERROR: &str = "error:device";
const ACK_PREFIX: &str = "OK:";

/// Classified handshake message.
pub(crate) enum Handshake<'a> {
    /// Exact literal `ready`.
    Ready,
    /// Exact literal `error:device`.
    DeviceError,
    /// Anything else; carries the raw text.
    Other(&'a str),
}

/// Classifies the first message received after launch.
pub(crate) fn classify_handshake(message: &str) -> Handshake<'_> {
    match message {
        READY => Handshake::Ready,
        DEVICE_ERROR => Handshake::DeviceError,
        other => Handshake::Other(other),
    }
}

/// Parses an `OK:<n>` acknowledgement.
///
/// Returns `None` unless `<n>` is a plain decimal integer; `OK:junk` is an
/// unknown response, not a count mismatch.
pub(crate) fn parse_ack(message: &str) -> Option<usize> {
    message.strip_prefix(ACK_PREFIX)?.parse().ok()
}

/// Encodes a frame as comma-joined decimal channel values.
///
/// Length bounds are the caller's concern; the element type already
/// guarantees the 0–255 value range.
pub(crate) fn encode_frame(channels: &[u8]) -> String {
    let mut out = String::with_capacity(channels.len() * 4);
    for (i, value) in channels.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&value.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_literals_are_exact() {
        assert!(matches!(classify_handshake("ready"), Handshake::Ready));
        assert!(matches!(
            classify_handshake("error:device"),
            Handshake::DeviceError
        ));
        assert!(matches!(classify_handshake("READY"), Handshake::Other(_)));
        assert!(matches!(classify_handshake("ready!"), Handshake::Other(_)));
        assert!(matches!(classify_handshake(""), Handshake::Other(_)));
    }

    #[test]
    fn ack_parses_plain_integers_only() {
        assert_eq!(parse_ack("OK:3"), Some(3));
        assert_eq!(parse_ack("OK:512"), Some(512));
        assert_eq!(parse_ack("OK:0"), Some(0));
        assert_eq!(parse_ack("OK:"), None);
        assert_eq!(parse_ack("OK:three"), None);
        assert_eq!(parse_ack("OK:-1"), None);
        assert_eq!(parse_ack("ok:3"), None);
        assert_eq!(parse_ack("ready"), None);
    }

    #[test]
    fn frames_are_comma_joined_decimal() {
        assert_eq!(encode_frame(&[0, 128, 255]), "0,128,255");
        assert_eq!(encode_frame(&[7]), "7");
        assert_eq!(encode_frame(&[]), "");
    }
}
