#![doc = include_str!("../Readme.md")]

mod codec;

#[cfg(feature = "_fuzzing")]
pub mod fuzzing;

use asynchronous_codec::Framed;
use futures::{AsyncRead, AsyncWrite, SinkExt, StreamExt};
use paste::paste;
use smtp_codec_utils::debug;
use thiserror::Error;
#[cfg(feature = "tracing")]
use tracing::{instrument, Level};

use smtp_codec_common::{
    commands::Request, content::ContentBlock, encoding::ClientMessage,
    framing::DEFAULT_MAX_LINE_LENGTH, reply::Response, ProtocolError,
};

use self::codec::SmtpClientCodec;

/// An smtp client, creating connections with the same settings
#[derive(Debug, Clone, Copy)]
pub struct Client {
    max_line_length: usize,
}

impl Default for Client {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE_LENGTH)
    }
}

/// A single smtp connection
///
/// This can be created by calling [`Client::connect_via`], which awaits the
/// server greeting.
///
/// A regular session could use these commands in order:
///
/// - [`Connection::ehlo`]
/// - [`Connection::mail`]
/// - [`Connection::rcpt`] (multiple)
/// - [`Connection::data`]
/// - [`Connection::content`]
/// - [`Connection::quit`]
///
/// The connection does not enforce this order, the server decides what
/// it accepts.
pub struct Connection<RW: AsyncRead + AsyncWrite + Unpin> {
    framed: Framed<RW, SmtpClientCodec>,
    greeting: Response,
}

impl Client {
    /// Create a client accepting reply lines up to `max_line_length` bytes,
    /// terminator excluded.
    #[must_use]
    pub fn new(max_line_length: usize) -> Self {
        Self { max_line_length }
    }

    /// Set up a smtp session via the provided RW connection
    ///
    /// # Errors
    /// This fails if an io-error is experienced or the server greets with a
    /// negative reply.
    pub async fn connect_via<RW: AsyncRead + AsyncWrite + Unpin>(
        &self,
        connection: RW,
    ) -> Result<Connection<RW>, ResponseError> {
        let mut framed = Framed::new(connection, SmtpClientCodec::new(self.max_line_length));

        let greeting = framed
            .next()
            .await
            .ok_or(ResponseError::MissingServerResponse)??;
        debug!("Received greeting {}", greeting);
        let greeting = expect_accepted(greeting)?;

        Ok(Connection { framed, greeting })
    }
}

macro_rules! command {
    (
        $(#[$outer:meta])*
        $variant:ident($($arg:ident: $arg_type:ty),*)
    ) => {
        paste! {
            $(#[$outer])*
            pub async fn [<$variant:snake>](&mut self, $($arg: $arg_type),*) -> Result<Response, ResponseError> {
                self.send(Request::[<$variant:snake>]($($arg),*)).await
            }
        }
    };
}

impl<RW: AsyncRead + AsyncWrite + Unpin> Connection<RW> {
    /// The reply the server greeted with
    #[must_use]
    pub fn greeting(&self) -> &Response {
        &self.greeting
    }

    command!(
        /// Greet the server, asking for its extensions
        ///
        /// # Errors
        /// Errors on io or codec errors and negative replies
        Ehlo(hostname: &str)
    );

    command!(
        /// Greet the server without extensions
        ///
        /// # Errors
        /// Errors on io or codec errors and negative replies
        Helo(hostname: &str)
    );

    command!(
        /// Start a mail transaction, `None` being the null sender
        ///
        /// # Errors
        /// Errors on io or codec errors and negative replies
        Mail(sender: Option<&str>)
    );

    command!(
        /// Add a recipient
        ///
        /// # Errors
        /// Errors on io or codec errors and negative replies
        Rcpt(recipient: &str)
    );

    command!(
        /// Announce the content, send it with [`Connection::content`] next
        ///
        /// # Errors
        /// Errors on io or codec errors and negative replies
        Data()
    );

    command!(
        /// Reset the mail transaction
        ///
        /// # Errors
        /// Errors on io or codec errors and negative replies
        Rset()
    );

    command!(
        /// Do nothing but get a reply
        ///
        /// # Errors
        /// Errors on io or codec errors and negative replies
        Noop()
    );

    command!(
        /// Ask for help, optionally on a topic
        ///
        /// # Errors
        /// Errors on io or codec errors and negative replies
        Help(topic: Option<&str>)
    );

    command!(
        /// Verify an address
        ///
        /// # Errors
        /// Errors on io or codec errors and negative replies
        Vrfy(argument: &str)
    );

    command!(
        /// Expand a mailing list
        ///
        /// # Errors
        /// Errors on io or codec errors and negative replies
        Expn(argument: &str)
    );

    /// Send the content after a [`Connection::data`] request.
    ///
    /// The terminating `.` line is appended. Lines starting with a dot are
    /// sent as they are.
    ///
    /// # Errors
    /// Errors on io or codec errors and negative replies
    pub async fn content(&mut self, content: ContentBlock) -> Result<Response, ResponseError> {
        self.exchange(content.into()).await
    }

    /// Send any request, including ones with unknown verbs
    ///
    /// # Errors
    /// Errors on io or codec errors and negative replies
    #[cfg_attr(feature = "tracing", instrument(level = Level::DEBUG, skip(self), fields(%request), err))]
    pub async fn send(&mut self, request: Request) -> Result<Response, ResponseError> {
        self.exchange(request.into()).await
    }

    /// End the session
    ///
    /// # Errors
    /// Errors on io or codec errors and negative replies
    pub async fn quit(mut self) -> Result<Response, ResponseError> {
        self.send(Request::quit()).await
    }

    /// Send a message and await the reply
    async fn exchange(&mut self, message: ClientMessage) -> Result<Response, ResponseError> {
        debug!("Sending message");
        self.framed.send(&message).await?;

        let response = self
            .framed
            .next()
            .await
            .ok_or(ResponseError::MissingServerResponse)??;
        debug!("Received {}", response);

        expect_accepted(response)
    }
}

/// Anything below 400 lets the session go on
fn expect_accepted(response: Response) -> Result<Response, ResponseError> {
    if response.code() < 400 {
        Ok(response)
    } else {
        Err(ResponseError::Rejected(response))
    }
}

/// An error for all problems the client could experience
#[derive(Debug, Error)]
pub enum ResponseError {
    /// Anything protocol related
    #[error(transparent)]
    ProtocolError(#[from] ProtocolError),
    /// If there should have been a response
    #[error("Server did not respond to a query")]
    MissingServerResponse,
    /// The server answered with a transient or permanent negative reply
    #[error("Server rejected the request: {0}")]
    Rejected(Response),
}
