use std::fmt::{self, Display};

use bytes::{BufMut, BytesMut};
use itertools::Itertools;
use smtp_codec_utils::{LineParsing, CRLF};

use super::{tokenize, Command, VERB_LENGTH};
use crate::decoding::Parsable;
use crate::encoding::Writable;
use crate::{error::STAGE_DECODING, NotEnoughData, ProtocolError};

/// A single decoded command line: the command and its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    command: Command,
    parameters: Vec<String>,
}

impl Request {
    /// Create a request from a command and its parameters
    #[must_use]
    pub fn new<P, S>(command: Command, parameters: P) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command,
            parameters: parameters.into_iter().map(Into::into).collect(),
        }
    }

    fn bare(command: Command) -> Self {
        Self {
            command,
            parameters: Vec::new(),
        }
    }

    /// The command of this request
    #[must_use]
    pub fn command(&self) -> &Command {
        &self.command
    }

    /// The parameters following the command, in order
    #[must_use]
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// `EHLO <hostname>`
    #[must_use]
    pub fn ehlo(hostname: impl Into<String>) -> Self {
        Self::new(Command::Ehlo, [hostname])
    }

    /// `HELO <hostname>`
    #[must_use]
    pub fn helo(hostname: impl Into<String>) -> Self {
        Self::new(Command::Helo, [hostname])
    }

    /// `MAIL FROM:<sender>`, a `None` sender is the null reverse path `<>`
    #[must_use]
    pub fn mail(sender: Option<&str>) -> Self {
        Self::new(
            Command::Mail,
            [format!("FROM:<{}>", sender.unwrap_or_default())],
        )
    }

    /// `RCPT TO:<recipient>`
    #[must_use]
    pub fn rcpt(recipient: &str) -> Self {
        Self::new(Command::Rcpt, [format!("TO:<{recipient}>")])
    }

    /// `DATA`
    #[must_use]
    pub fn data() -> Self {
        Self::bare(Command::Data)
    }

    /// `NOOP`
    #[must_use]
    pub fn noop() -> Self {
        Self::bare(Command::Noop)
    }

    /// `RSET`
    #[must_use]
    pub fn rset() -> Self {
        Self::bare(Command::Rset)
    }

    /// `QUIT`
    #[must_use]
    pub fn quit() -> Self {
        Self::bare(Command::Quit)
    }

    /// `HELP [topic]`
    #[must_use]
    pub fn help(topic: Option<&str>) -> Self {
        Self::new(Command::Help, topic)
    }

    /// `VRFY <argument>`
    #[must_use]
    pub fn vrfy(argument: impl Into<String>) -> Self {
        Self::new(Command::Vrfy, [argument])
    }

    /// `EXPN <argument>`
    #[must_use]
    pub fn expn(argument: impl Into<String>) -> Self {
        Self::new(Command::Expn, [argument])
    }
}

impl Parsable for Request {
    /// Parse a full command line, terminator included.
    fn parse(buffer: BytesMut) -> Result<Self, ProtocolError> {
        let line_len = buffer.without_terminator().len();
        if line_len < VERB_LENGTH {
            return Err(NotEnoughData::new(
                STAGE_DECODING,
                "Command",
                "received a command line shorter than a verb",
                VERB_LENGTH,
                line_len,
                buffer,
            )
            .into());
        }

        let command = Command::lookup(&buffer[..VERB_LENGTH])?;
        let parameters = tokenize(&buffer[VERB_LENGTH..]);

        Ok(Self {
            command,
            parameters,
        })
    }
}

impl Writable for Request {
    fn write(&self, buffer: &mut BytesMut) {
        buffer.extend_from_slice(self.command.as_bytes());
        for parameter in &self.parameters {
            buffer.put_u8(b' ');
            buffer.extend_from_slice(parameter.as_bytes());
        }
        buffer.extend_from_slice(CRLF);
    }

    fn len(&self) -> usize {
        self.command.as_bytes().len()
            + self.parameters.iter().map(|p| 1 + p.len()).sum::<usize>()
            + CRLF.len()
    }

    fn is_empty(&self) -> bool {
        false
    }
}

impl Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.parameters.is_empty() {
            write!(f, "{}", self.command)
        } else {
            write!(f, "{} {}", self.command, self.parameters.iter().join(" "))
        }
    }
}
