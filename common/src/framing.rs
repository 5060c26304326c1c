//! Splitting a byte stream into terminated lines.

use bytes::BytesMut;
use smtp_codec_utils::LineParsing;

use crate::ProtocolError;

/// RFC 5321 limits a text line to 1000 octets including the CRLF
pub const DEFAULT_MAX_LINE_LENGTH: usize = 998;

/// Cuts complete lines off the front of a buffer.
///
/// A line ends at `\n`, usually preceded by `\r`. Lines are returned with
/// their terminator. The maximum length applies to the line without it.
#[derive(Debug, Clone, Copy)]
pub struct LineFramer {
    max_line_length: usize,
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE_LENGTH)
    }
}

impl LineFramer {
    /// Create a framer accepting lines up to `max_line_length` bytes
    #[must_use]
    pub fn new(max_line_length: usize) -> Self {
        Self { max_line_length }
    }

    /// The configured maximum line length
    #[must_use]
    pub fn max_line_length(&self) -> usize {
        self.max_line_length
    }

    /// Split the next complete line off `buffer`.
    ///
    /// Returns `Ok(None)` if no complete line is buffered yet.
    ///
    /// # Errors
    /// Fails with [`ProtocolError::LineTooLong`] as soon as it is clear the
    /// next line exceeds the maximum length, even before it is complete.
    pub fn next_line(&self, buffer: &mut BytesMut) -> Result<Option<BytesMut>, ProtocolError> {
        let Some(newline) = buffer.iter().position(|&b| b == b'\n') else {
            // A trailing CR may still become part of the terminator
            let pending = buffer.len() - usize::from(buffer.ends_with(b"\r"));
            if pending > self.max_line_length {
                return Err(ProtocolError::LineTooLong(pending));
            }
            return Ok(None);
        };

        let line = buffer.split_to(newline + 1);
        let length = line.len() - line.terminator_len();
        if length > self.max_line_length {
            return Err(ProtocolError::LineTooLong(length));
        }

        Ok(Some(line))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_splits_lines_with_terminators() {
        let framer = LineFramer::new(64);
        let mut buffer = BytesMut::from("EHLO x\r\nNOOP\nQU");

        assert_eq!(
            framer.next_line(&mut buffer).unwrap().as_deref(),
            Some(&b"EHLO x\r\n"[..])
        );
        assert_eq!(
            framer.next_line(&mut buffer).unwrap().as_deref(),
            Some(&b"NOOP\n"[..])
        );
        assert_eq!(framer.next_line(&mut buffer).unwrap(), None);
        assert_eq!(&buffer[..], b"QU");
    }

    #[test]
    fn test_limit_excludes_terminator() {
        let framer = LineFramer::new(4);

        let mut buffer = BytesMut::from("NOOP\r\n");
        assert!(framer.next_line(&mut buffer).unwrap().is_some());

        let mut buffer = BytesMut::from("NOOPS\r\n");
        assert_matches!(
            framer.next_line(&mut buffer),
            Err(ProtocolError::LineTooLong(5))
        );
    }

    #[test]
    fn test_incomplete_line_fails_early() {
        let framer = LineFramer::new(4);

        let mut buffer = BytesMut::from("NOOP\r");
        assert_matches!(framer.next_line(&mut buffer), Ok(None));

        let mut buffer = BytesMut::from("NOOPNOOP");
        assert_matches!(
            framer.next_line(&mut buffer),
            Err(ProtocolError::LineTooLong(8))
        );
    }

    #[test]
    fn test_default_limit() {
        assert_eq!(LineFramer::default().max_line_length(), 998);
    }
}
