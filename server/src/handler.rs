use std::io;

use async_trait::async_trait;
use thiserror::Error;

use smtp_codec_common::{commands::Request, content::ContentBlock, reply::Response, ProtocolError};

/// A trait to implement a working smtp server.
///
/// The server decodes what the client sends and calls these methods in the
/// order things arrive. Each call is answered with the returned reply.
///
/// See examples on how to implement this.
#[async_trait]
pub trait Handler: Send {
    /// A user error that might be returned handling this smtp connection
    type Error: Send;

    /// The reply sent as soon as a client connects.
    ///
    /// Returning `None` sends nothing.
    async fn greeting(&mut self) -> Result<Option<Response>, Self::Error> {
        Ok(Some(Response::single(220, "Service ready")))
    }

    /// A command line sent by the client.
    ///
    /// After a `DATA` request the codec collects content no matter the
    /// reply, the next call is [`Handler::content`].
    async fn request(&mut self, request: Request) -> Result<Response, Self::Error>;

    /// All content lines sent after `DATA`, up to the terminating `.` line.
    async fn content(&mut self, _content: ContentBlock) -> Result<Response, Self::Error> {
        Ok(Response::single(250, "Ok"))
    }
}

/// The main error for this crate encapsulating the different error cases.
#[derive(Debug, Error)]
pub enum Error<ImplError> {
    /// If IO breaks, this will return a [`Error::Io`],
    /// which is a simple [`std::io::Error`]. Check the underlying transport.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The Codec had problems de/encoding data. The client sent something
    /// this crate is not able to decode, the connection is unusable.
    #[error(transparent)]
    Codec(#[from] ProtocolError),

    /// The handler trait implementation returned an error.
    /// This is plumbed through and returned to the call site.
    #[error(transparent)]
    Impl {
        /// The application error patched through
        source: ImplError,
    },
}

impl<AppError> Error<AppError> {
    pub(crate) fn from_app_error(source: AppError) -> Self {
        Self::Impl { source }
    }
}
