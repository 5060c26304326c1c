#![doc = include_str!("../Readme.md")]

mod codec;
mod handler;

#[cfg(feature = "_fuzzing")]
pub mod fuzzing;

use asynchronous_codec::Framed;
pub use codec::SmtpCodec;
pub use handler::{Error, Handler};

use futures::{AsyncRead, AsyncWrite, SinkExt, StreamExt};
use smtp_codec_common::{
    commands::Command, decoding::ClientEvent, framing::DEFAULT_MAX_LINE_LENGTH, reply::Response,
};
use smtp_codec_utils::debug;
#[cfg(feature = "tracing")]
use tracing::instrument;

/// The entry point to host an smtp server
#[derive(Debug)]
pub struct Server<'h, H: Handler> {
    handler: &'h mut H,
    max_line_length: usize,
}

impl<'h, H: Handler> Server<'h, H> {
    /// Create a new Server to handle connections.
    ///
    /// Lines longer than `max_line_length` (terminator excluded) end the
    /// connection with [`Error::Codec`].
    #[must_use]
    pub fn new(handler: &'h mut H, max_line_length: usize) -> Self {
        Self {
            handler,
            max_line_length,
        }
    }

    /// Create a server accepting lines up to the RFC 5321 limit of 1000
    /// octets including the terminator.
    #[must_use]
    pub fn default_rfc5321(handler: &'h mut H) -> Self {
        Self::new(handler, DEFAULT_MAX_LINE_LENGTH)
    }

    /// Handle a single smtp connection.
    ///
    /// Sends the greeting, then answers every decoded request and content
    /// block via the [`Handler`]. Returns after answering `QUIT` or once
    /// the client closes the connection.
    ///
    /// # Errors
    /// This basically errors for three cases: Io Problems, Codec Problems and
    /// problems returned by the handler implementation. Any of them ends the
    /// connection, nothing is retried.
    ///
    /// Have a look at [`enum@crate::Error`] for more information.
    #[cfg_attr(feature = "tracing", instrument(skip_all))]
    pub async fn handle_connection<RW: AsyncRead + AsyncWrite + Unpin + Send>(
        &mut self,
        socket: RW,
    ) -> Result<(), Error<H::Error>> {
        let mut framed = Framed::new(socket, SmtpCodec::new(self.max_line_length));

        if let Some(greeting) = self.handler.greeting().await.map_err(Error::from_app_error)? {
            debug!("Sending greeting");
            framed.send(&greeting.into()).await?;
        }

        while let Some(event) = framed.next().await {
            let event = event?;
            debug!("Received {:?}", event);

            let quit = matches!(&event, ClientEvent::Request(r) if *r.command() == Command::Quit);
            let response = match event {
                ClientEvent::Request(request) => self.handler.request(request).await,
                ClientEvent::Content(content) => self.handler.content(content).await,
            }
            .map_err(Error::from_app_error)?;

            Self::respond(response, &mut framed).await?;
            if quit {
                debug!("Client quit");
                return Ok(());
            }
        }
        Ok(())
    }

    /// Helper function to send a reply
    async fn respond<RW: AsyncRead + AsyncWrite + Unpin>(
        response: Response,
        framed: &mut Framed<RW, SmtpCodec>,
    ) -> Result<(), Error<H::Error>> {
        debug!("Sending {:?}", response);
        framed.send(&response.into()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use smtp_codec_common::{commands::Request, content::ContentBlock, ProtocolError};
    use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};
    use tokio_util::compat::TokioAsyncReadCompatExt;

    use super::*;

    #[derive(Debug, Default)]
    struct RecordingHandler {
        requests: Vec<Request>,
        contents: Vec<ContentBlock>,
    }

    #[async_trait]
    impl Handler for RecordingHandler {
        type Error = &'static str;

        async fn request(&mut self, request: Request) -> Result<Response, Self::Error> {
            let response = match request.command() {
                Command::Data => Response::single(354, "End data with <CR><LF>.<CR><LF>"),
                Command::Ehlo => Response::new(250, ["localhost", "8BITMIME"]),
                Command::Quit => Response::single(221, "Bye"),
                Command::Unknown(_) => Response::single(500, "Command unrecognized"),
                _ => Response::single(250, "Ok"),
            };
            self.requests.push(request);
            Ok(response)
        }

        async fn content(&mut self, content: ContentBlock) -> Result<Response, Self::Error> {
            self.contents.push(content);
            Ok(Response::single(250, "Queued"))
        }
    }

    async fn run_session(input: &[u8]) -> (RecordingHandler, Result<(), Error<&'static str>>, String) {
        let (client, server) = duplex(4096);
        let (mut client_read, mut client_write) = tokio::io::split(client);

        client_write.write_all(input).await.unwrap();
        client_write.shutdown().await.unwrap();

        let mut handler = RecordingHandler::default();
        let result = Server::default_rfc5321(&mut handler)
            .handle_connection(server.compat())
            .await;

        let mut output = String::new();
        client_read.read_to_string(&mut output).await.unwrap();

        (handler, result, output)
    }

    #[tokio::test]
    async fn test_full_session() {
        let (handler, result, output) = run_session(
            b"EHLO localhost\r\nMAIL FROM:<a@b>\r\nDATA\r\nSubject: Hi\r\n\r\nBody\r\n.\r\nQUIT\r\nNOOP\r\n",
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(
            output,
            "220 Service ready\r\n\
             250-localhost\r\n250 8BITMIME\r\n\
             250 Ok\r\n\
             354 End data with <CR><LF>.<CR><LF>\r\n\
             250 Queued\r\n\
             221 Bye\r\n"
        );
        assert_eq!(
            handler.requests,
            vec![
                Request::ehlo("localhost"),
                Request::mail(Some("a@b")),
                Request::data(),
                Request::quit(),
            ]
        );
        assert_eq!(
            handler.contents,
            vec![ContentBlock::from(&b"Subject: Hi\r\n\r\nBody\r\n"[..])]
        );
    }

    #[tokio::test]
    async fn test_short_line_ends_session() {
        let (handler, result, output) = run_session(b"NOOP\r\nHI\r\nNOOP\r\n").await;

        assert!(matches!(result, Err(Error::Codec(ProtocolError::NotEnoughData(_)))));
        assert_eq!(output, "220 Service ready\r\n250 Ok\r\n");
        assert_eq!(handler.requests, vec![Request::noop()]);
    }

    #[tokio::test]
    async fn test_unknown_command_is_forwarded() {
        let (handler, result, output) = run_session(b"XFOO bar\r\n").await;

        assert!(result.is_ok());
        assert_eq!(output, "220 Service ready\r\n500 Command unrecognized\r\n");
        assert_eq!(handler.requests[0].parameters(), ["bar"]);
    }
}
