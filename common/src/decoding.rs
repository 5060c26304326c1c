//! Implement what components may be parsed from the wire
//!
//! [`RequestDecoder`] turns lines sent by an smtp client into requests and
//! content blocks, [`ReplyDecoder`] turns lines sent by a server into
//! replies.

use std::mem;

use bytes::BytesMut;
use smtp_codec_utils::{debug, LineParsing};

use crate::commands::Request;
use crate::content::{ContentBlock, CONTENT_TERMINATOR};
use crate::framing::LineFramer;
use crate::reply::{ReplyLine, Response};
use crate::{InvalidData, ProtocolError};

/// Parse something 'from the wire'.
pub(crate) trait Parsable: Sized {
    /// Parse a `Self` from the given `BytesMut` buffer.
    ///
    /// # Errors
    /// This can fail to parse, returning a [`ProtocolError`].
    fn parse(buffer: BytesMut) -> Result<Self, ProtocolError>;
}

/// Everything an smtp client can send
#[cfg_attr(feature = "tracing", derive(strum::Display))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// A command line
    Request(Request),
    /// The content following a `DATA` command, once it is complete
    Content(ContentBlock),
}

impl From<Request> for ClientEvent {
    fn from(value: Request) -> Self {
        Self::Request(value)
    }
}

impl From<ContentBlock> for ClientEvent {
    fn from(value: ContentBlock) -> Self {
        Self::Content(value)
    }
}

/// Which kind of line the decoder expects next
#[cfg_attr(feature = "tracing", derive(strum::Display))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Command lines
    Command,
    /// Content lines, until the terminating `.` line
    Content,
    /// A fatal error happened, nothing is decoded anymore
    Failed,
}

/// The per connection state of the request decoder.
///
/// Content lines are only ever held while in content mode, leaving it hands
/// them all over in a single [`ContentBlock`].
#[derive(Debug, Default)]
pub enum DecoderState {
    /// Expecting a command line
    #[default]
    Command,
    /// Collecting content lines
    Content {
        /// Lines received so far, each with its terminator
        chunks: Vec<BytesMut>,
    },
    /// Terminal, entered on the first error
    Failed,
}

impl DecoderState {
    /// The mode this state is in
    #[must_use]
    pub fn mode(&self) -> Mode {
        match self {
            Self::Command => Mode::Command,
            Self::Content { .. } => Mode::Content,
            Self::Failed => Mode::Failed,
        }
    }

    /// Consume one line, returning the follow-up state and what was decoded.
    ///
    /// A failure always leads to [`DecoderState::Failed`].
    #[must_use]
    pub fn advance(self, line: BytesMut) -> (Self, Result<Option<ClientEvent>, ProtocolError>) {
        match self {
            Self::Command => match Request::parse(line) {
                Ok(request) => {
                    let next = if request.command().expects_content() {
                        Self::Content { chunks: Vec::new() }
                    } else {
                        Self::Command
                    };
                    (next, Ok(Some(request.into())))
                }
                Err(err) => (Self::Failed, Err(err)),
            },
            Self::Content { mut chunks } => {
                if line.without_terminator() == CONTENT_TERMINATOR {
                    let content = ContentBlock::from_chunks(chunks);
                    (Self::Command, Ok(Some(content.into())))
                } else {
                    chunks.push(line);
                    (Self::Content { chunks }, Ok(None))
                }
            }
            Self::Failed => (Self::Failed, Ok(None)),
        }
    }
}

/// Decodes the lines sent by an smtp client.
///
/// Starts out expecting commands. After a command expecting content all
/// lines are collected until a line consisting of a single `.` arrives.
///
/// The first error is final: the decoder enters [`Mode::Failed`] and will
/// not produce any further events, nor does it try to resynchronize.
#[derive(Debug, Default)]
pub struct RequestDecoder {
    framer: LineFramer,
    state: DecoderState,
}

impl RequestDecoder {
    /// Create a decoder accepting lines up to `max_line_length` bytes
    #[must_use]
    pub fn new(max_line_length: usize) -> Self {
        Self {
            framer: LineFramer::new(max_line_length),
            state: DecoderState::Command,
        }
    }

    /// The mode the decoder is currently in
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.state.mode()
    }

    /// Whether a fatal error ended decoding
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.mode() == Mode::Failed
    }

    /// Decode a single line, terminator included.
    ///
    /// # Errors
    /// Fails if a command line is shorter than four bytes.
    pub fn decode_line(&mut self, line: BytesMut) -> Result<Option<ClientEvent>, ProtocolError> {
        let previous = self.mode();
        let (state, decoded) = mem::take(&mut self.state).advance(line);
        if state.mode() != previous {
            debug!("Decoder switched from {} to {} mode", previous, state.mode());
        }
        self.state = state;

        let event = decoded?;
        #[cfg(feature = "tracing")]
        match &event {
            Some(event) => tracing::debug!(%event, "Decoded"),
            None => tracing::trace!("No event for this line"),
        }
        Ok(event)
    }

    /// Decode the next event from `buffer`, consuming as many lines as
    /// needed.
    ///
    /// Returns `Ok(None)` once `buffer` holds no further complete line.
    ///
    /// # Errors
    /// Fails on lines too long or command lines too short.
    pub fn decode(&mut self, buffer: &mut BytesMut) -> Result<Option<ClientEvent>, ProtocolError> {
        if self.is_failed() {
            buffer.clear();
            return Ok(None);
        }

        loop {
            let line = match self.framer.next_line(buffer) {
                Ok(Some(line)) => line,
                Ok(None) => return Ok(None),
                Err(err) => {
                    self.state = DecoderState::Failed;
                    return Err(err);
                }
            };

            if let Some(event) = self.decode_line(line)? {
                return Ok(Some(event));
            }
        }
    }
}

/// Decodes the (possibly multi-line) replies sent by an smtp server.
#[derive(Debug, Default)]
pub struct ReplyDecoder {
    framer: LineFramer,
    pending: Option<Response>,
    failed: bool,
}

impl ReplyDecoder {
    /// Create a decoder accepting lines up to `max_line_length` bytes
    #[must_use]
    pub fn new(max_line_length: usize) -> Self {
        Self {
            framer: LineFramer::new(max_line_length),
            pending: None,
            failed: false,
        }
    }

    /// Whether a fatal error ended decoding
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Decode the next complete reply from `buffer`.
    ///
    /// # Errors
    /// Fails on lines too long, malformed reply lines or a reply code
    /// changing in the middle of a multi-line reply.
    pub fn decode(&mut self, buffer: &mut BytesMut) -> Result<Option<Response>, ProtocolError> {
        if self.failed {
            buffer.clear();
            return Ok(None);
        }

        let decoded = self.decode_lines(buffer);
        if decoded.is_err() {
            self.failed = true;
            self.pending = None;
        }
        decoded
    }

    fn decode_lines(&mut self, buffer: &mut BytesMut) -> Result<Option<Response>, ProtocolError> {
        while let Some(line) = self.framer.next_line(buffer)? {
            let raw = line.clone();
            let line = ReplyLine::parse(line)?;

            let response = self
                .pending
                .get_or_insert_with(|| Response::empty(line.code));
            if response.code() != line.code {
                return Err(InvalidData::new(
                    "Reply code changed within a multi-line reply",
                    raw,
                )
                .into());
            }
            response.push_detail(line.text);

            if line.last {
                return Ok(self.pending.take());
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::commands::Command;

    fn decode_all(decoder: &mut RequestDecoder, lines: &[&str]) -> Vec<ClientEvent> {
        lines
            .iter()
            .filter_map(|line| {
                decoder
                    .decode_line(BytesMut::from(*line))
                    .expect("Failed decoding line")
            })
            .collect()
    }

    #[rstest]
    #[case(Command::Ehlo, "EHLO")]
    #[case(Command::Helo, "HELO")]
    #[case(Command::Mail, "MAIL")]
    #[case(Command::Rcpt, "RCPT")]
    #[case(Command::Rset, "RSET")]
    #[case(Command::Noop, "NOOP")]
    #[case(Command::Help, "HELP")]
    #[case(Command::Quit, "QUIT")]
    #[case(Command::Vrfy, "VRFY")]
    #[case(Command::Expn, "EXPN")]
    fn test_command_with_two_parameters(#[case] command: Command, #[case] verb: &str) {
        let mut decoder = RequestDecoder::new(usize::MAX);
        let line = format!("{verb} p1 p2\r\n");

        let event = decoder.decode_line(BytesMut::from(line.as_str())).unwrap();

        assert_eq!(
            event,
            Some(ClientEvent::Request(Request::new(command, ["p1", "p2"])))
        );
        assert_eq!(decoder.mode(), Mode::Command);
    }

    #[test]
    fn test_noop_without_parameters() {
        let mut decoder = RequestDecoder::default();

        let events = decode_all(&mut decoder, &["NOOP\r\n"]);

        assert_eq!(events, vec![ClientEvent::from(Request::noop())]);
    }

    #[test]
    fn test_data_and_content() {
        let mut decoder = RequestDecoder::default();

        let events = decode_all(
            &mut decoder,
            &["DATA\r\n", "Subject: Test\r\n", "\r\n", "Test\r\n", ".\r\n"],
        );

        assert_eq!(
            events,
            vec![
                ClientEvent::from(Request::data()),
                ClientEvent::from(ContentBlock::from(&b"Subject: Test\r\n\r\nTest\r\n"[..])),
            ]
        );
        assert_eq!(decoder.mode(), Mode::Command);
    }

    #[test]
    fn test_content_lines_are_absorbed() {
        let mut decoder = RequestDecoder::default();
        decoder.decode_line(BytesMut::from("DATA\r\n")).unwrap();

        assert_eq!(decoder.mode(), Mode::Content);
        // Command-looking lines are content now
        assert_eq!(decoder.decode_line(BytesMut::from("QUIT\r\n")).unwrap(), None);
        assert_eq!(decoder.decode_line(BytesMut::from("..\r\n")).unwrap(), None);
        assert_eq!(decoder.decode_line(BytesMut::from(". \r\n")).unwrap(), None);

        let event = decoder.decode_line(BytesMut::from(".\r\n")).unwrap();
        assert_eq!(
            event,
            Some(ContentBlock::from(&b"QUIT\r\n..\r\n. \r\n"[..]).into())
        );
    }

    #[test]
    fn test_empty_content() {
        let mut decoder = RequestDecoder::default();

        let events = decode_all(&mut decoder, &["data\r\n", ".\r\n", "QUIT\r\n"]);

        assert_eq!(
            events,
            vec![
                ClientEvent::from(Request::data()),
                ClientEvent::from(ContentBlock::default()),
                ClientEvent::from(Request::quit()),
            ]
        );
    }

    #[test]
    fn test_short_line_is_fatal() {
        let mut decoder = RequestDecoder::default();

        let err = decoder.decode_line(BytesMut::from("HI\r\n")).unwrap_err();
        assert_matches!(err, ProtocolError::NotEnoughData(_));
        assert!(decoder.is_failed());

        assert_eq!(decoder.decode_line(BytesMut::from("NOOP\r\n")).unwrap(), None);
    }

    #[test]
    fn test_decode_from_buffer() {
        let mut decoder = RequestDecoder::new(64);
        let mut buffer = BytesMut::from("EHLO localhost\r\nDATA\r\nline\r\n.\r\nQU");

        assert_eq!(
            decoder.decode(&mut buffer).unwrap(),
            Some(Request::ehlo("localhost").into())
        );
        assert_eq!(
            decoder.decode(&mut buffer).unwrap(),
            Some(Request::data().into())
        );
        assert_eq!(
            decoder.decode(&mut buffer).unwrap(),
            Some(ContentBlock::from(&b"line\r\n"[..]).into())
        );
        assert_eq!(decoder.decode(&mut buffer).unwrap(), None);

        buffer.extend_from_slice(b"IT\r\n");
        assert_eq!(
            decoder.decode(&mut buffer).unwrap(),
            Some(Request::quit().into())
        );
    }

    #[test]
    fn test_line_too_long_is_fatal() {
        let mut decoder = RequestDecoder::new(8);
        let mut buffer = BytesMut::from("EHLO localhost\r\nNOOP\r\n");

        assert_matches!(
            decoder.decode(&mut buffer),
            Err(ProtocolError::LineTooLong(14))
        );
        assert!(decoder.is_failed());
        assert_eq!(decoder.decode(&mut buffer).unwrap(), None);
    }

    #[test]
    fn test_state_threading() {
        let (state, decoded) = DecoderState::Command.advance(BytesMut::from("DATA\r\n"));
        assert!(decoded.is_ok());
        assert_matches!(&state, DecoderState::Content { chunks } if chunks.is_empty());

        let (state, decoded) = state.advance(BytesMut::from("x\r\n"));
        assert_matches!(decoded, Ok(None));
        assert_matches!(&state, DecoderState::Content { chunks } if chunks.len() == 1);

        let (state, _) = state.advance(BytesMut::from(".\r\n"));
        assert_eq!(state.mode(), Mode::Command);
    }

    #[test]
    fn test_reply_single_line() {
        let mut decoder = ReplyDecoder::default();
        let mut buffer = BytesMut::from("200 Ok\r\n");

        assert_eq!(
            decoder.decode(&mut buffer).unwrap(),
            Some(Response::single(200, "Ok"))
        );
    }

    #[test]
    fn test_reply_multi_line_across_reads() {
        let mut decoder = ReplyDecoder::default();
        let mut buffer = BytesMut::from("250-mx.example.org\r\n250-PIPE");

        assert_eq!(decoder.decode(&mut buffer).unwrap(), None);

        buffer.extend_from_slice(b"LINING\r\n250 8BITMIME\r\n");
        assert_eq!(
            decoder.decode(&mut buffer).unwrap(),
            Some(Response::new(250, ["mx.example.org", "PIPELINING", "8BITMIME"]))
        );
    }

    #[test]
    fn test_reply_empty_detail() {
        let mut decoder = ReplyDecoder::default();
        let mut buffer = BytesMut::from("250 \r\n");

        assert_eq!(
            decoder.decode(&mut buffer).unwrap(),
            Some(Response::single(250, ""))
        );
    }

    #[test]
    fn test_reply_code_mismatch_is_fatal() {
        let mut decoder = ReplyDecoder::default();
        let mut buffer = BytesMut::from("250-first\r\n251 second\r\n220 Ok\r\n");

        assert_matches!(
            decoder.decode(&mut buffer),
            Err(ProtocolError::InvalidData(_))
        );
        assert!(decoder.is_failed());
        assert_eq!(decoder.decode(&mut buffer).unwrap(), None);
    }
}
