//! Implement what components may write to the wire

#[cfg(feature = "tracing")]
use std::fmt::{self, Display};

use bytes::BytesMut;
use enum_dispatch::enum_dispatch;

use crate::commands::Request;
use crate::content::ContentBlock;
use crate::reply::Response;

/// Write something 'to the wire'.
#[enum_dispatch(ServerMessage)]
#[enum_dispatch(ClientMessage)]
pub trait Writable {
    /// Write self to the buffer
    fn write(&self, buffer: &mut BytesMut);

    /// Byte-length that would be written if [`Self::write`] is called
    fn len(&self) -> usize;

    /// Whether a call to [`Self::write`] would write nothing
    fn is_empty(&self) -> bool;
}

/// Messages sent by the Server
///
/// This is used to encode things on the server and decode them on the client.
#[enum_dispatch]
#[derive(Debug, Clone)]
pub enum ServerMessage {
    /// A reply to the last command or content block
    Response,
}

#[cfg(feature = "tracing")]
impl Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::Response(response) => write!(f, "Response/{response}"),
        }
    }
}

/// Messages sent by the Client
///
/// This is used to encode things on the client and decode them on the server.
#[enum_dispatch]
#[derive(Debug, Clone)]
pub enum ClientMessage {
    /// A command line
    Request,
    /// The content after a `DATA` command, written with its terminating line
    ContentBlock,
}

#[cfg(feature = "tracing")]
impl Display for ClientMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientMessage::Request(request) => write!(f, "Request/{request}"),
            ClientMessage::ContentBlock(content) => {
                write!(f, "ContentBlock/{} lines", content.line_count())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_dispatch_to_response() {
        let message: ServerMessage = Response::new(250, ["Hello", "Ok"]).into();
        let mut buffer = BytesMut::new();
        message.write(&mut buffer);

        assert_eq!(&buffer[..], b"250-Hello\r\n250 Ok\r\n");
        assert_eq!(message.len(), buffer.len());
    }

    #[test]
    fn test_dispatch_client_messages() {
        let messages: Vec<ClientMessage> = vec![
            Request::data().into(),
            ContentBlock::from(&b"Hi\r\n"[..]).into(),
        ];
        let mut buffer = BytesMut::new();
        for message in &messages {
            message.write(&mut buffer);
        }

        assert_eq!(&buffer[..], b"DATA\r\nHi\r\n.\r\n");
    }
}
