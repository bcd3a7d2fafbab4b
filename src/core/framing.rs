//! # Line reassembly for the worker's stdout stream.
//!
//! The worker speaks one message per line. The OS pipe delivers arbitrary
//! byte chunks: a read may contain a fragment of a line, exactly one line,
//! or several lines at once. [`LineBuffer`] turns that stream back into
//! discrete trimmed messages.
//!
//! ## Rules
//! - Every complete line in a chunk is emitted, in order.
//! - A trailing fragment persists across calls until its terminator arrives.
//! - Messages are trimmed of surrounding whitespace (this also strips `\r`).
//! - Splitting happens on raw bytes; decoding to text only at emission, so a
//!   UTF-8 sequence straddling two chunks survives intact.
//! - A fragment growing past [`MAX_FRAGMENT`] without a terminator is
//!   discarded; reassembly resumes after the next terminator.

/// Cap on an unterminated fragment. A cooperating worker sends short lines;
/// anything near this size is garbage output, not protocol.
const MAX_FRAGMENT: usize = 8 * 1024;

/// Reassembles newline-delimited messages from a byte stream.
pub(crate) struct LineBuffer {
    fragment: Vec<u8>,
    overflowed: bool,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self {
            fragment: Vec::new(),
            overflowed: false,
        }
    }

    /// Feeds one chunk and returns every message completed by it.
    pub fn extend(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in chunk {
            if byte == b'\n' {
                if !self.overflowed {
                    let text = String::from_utf8_lossy(&self.fragment);
                    lines.push(text.trim().to_string());
                }
                self.fragment.clear();
                self.overflowed = false;
            } else if self.overflowed {
                // skip until the next terminator
            } else if self.fragment.len() == MAX_FRAGMENT {
                self.fragment.clear();
                self.overflowed = true;
            } else {
                self.fragment.push(byte);
            }
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_line_per_chunk() {
        let mut buf = LineBuffer::new();
        assert_eq!(buf.extend(b"ready\n"), vec!["ready"]);
    }

    #[test]
    fn several_lines_in_one_chunk_are_all_emitted() {
        let mut buf = LineBuffer::new();
        assert_eq!(buf.extend(b"OK:3\nOK:4\nOK:5\n"), vec!["OK:3", "OK:4", "OK:5"]);
    }

    #[test]
    fn fragment_persists_across_chunks() {
        let mut buf = LineBuffer::new();
        assert!(buf.extend(b"rea").is_empty());
        assert!(buf.extend(b"d").is_empty());
        assert_eq!(buf.extend(b"y\nOK:").as_slice(), ["ready"]);
        assert_eq!(buf.extend(b"1\n"), vec!["OK:1"]);
    }

    #[test]
    fn messages_are_trimmed() {
        let mut buf = LineBuffer::new();
        assert_eq!(buf.extend(b"  ready \r\n"), vec!["ready"]);
    }

    #[test]
    fn blank_line_is_emitted_empty() {
        let mut buf = LineBuffer::new();
        assert_eq!(buf.extend(b"\n"), vec![""]);
    }

    #[test]
    fn multibyte_sequence_split_across_chunks_survives() {
        let mut buf = LineBuffer::new();
        let text = "grüß".as_bytes();
        assert!(buf.extend(&text[..3]).is_empty());
        assert_eq!(buf.extend(&text[3..]), Vec::<String>::new());
        assert_eq!(buf.extend(b"\n"), vec!["grüß"]);
    }

    #[test]
    fn oversized_fragment_is_discarded() {
        let mut buf = LineBuffer::new();
        let junk = vec![b'x'; MAX_FRAGMENT + 10];
        assert!(buf.extend(&junk).is_empty());
        // The runaway line is dropped entirely; the next one is clean.
        assert_eq!(buf.extend(b"tail\nready\n"), vec!["ready"]);
    }
}
