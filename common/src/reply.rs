//! Replies sent by the server: a numeric code and its detail lines.

use std::fmt::{self, Display, Write};

use bytes::{BufMut, BytesMut};
use smtp_codec_utils::{ByteParsing, LineParsing, CRLF};

use crate::decoding::Parsable;
use crate::encoding::Writable;
use crate::{error::STAGE_DECODING, InvalidData, NotEnoughData, ProtocolError};

const SP: u8 = b' ';
const DASH: u8 = b'-';
const REPLY_CODE_LENGTH: usize = 3;

/// A reply to the smtp client.
///
/// With zero or one detail this is written as a single line
/// `<code> <detail>`. With more details every line but the last uses a
/// `-` after the code, marking that the reply continues.
///
/// The code is written as plain decimal digits and not range checked.
/// Detail lines must not contain CR or LF, see [`Response::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    code: u16,
    details: Vec<String>,
}

impl Response {
    /// Create a reply with any number of detail lines
    #[must_use]
    pub fn new<D, S>(code: u16, details: D) -> Self
    where
        D: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            code,
            details: details.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a single line reply
    #[must_use]
    pub fn single(code: u16, detail: impl Into<String>) -> Self {
        Self {
            code,
            details: vec![detail.into()],
        }
    }

    /// Create a reply without any detail line.
    ///
    /// This is written as `<code> ` followed by the terminator.
    #[must_use]
    pub fn empty(code: u16) -> Self {
        Self {
            code,
            details: Vec::new(),
        }
    }

    /// The reply code
    #[must_use]
    pub fn code(&self) -> u16 {
        self.code
    }

    /// The detail lines, in order
    #[must_use]
    pub fn details(&self) -> &[String] {
        &self.details
    }

    /// 2xx
    #[must_use]
    pub fn is_positive_completion(&self) -> bool {
        (200..300).contains(&self.code)
    }

    /// 3xx
    #[must_use]
    pub fn is_positive_intermediate(&self) -> bool {
        (300..400).contains(&self.code)
    }

    /// 4xx
    #[must_use]
    pub fn is_transient_negative(&self) -> bool {
        (400..500).contains(&self.code)
    }

    /// 5xx
    #[must_use]
    pub fn is_permanent_negative(&self) -> bool {
        (500..600).contains(&self.code)
    }

    /// Check that writing this reply keeps the line framing intact.
    ///
    /// Writing never checks this by itself.
    ///
    /// # Errors
    /// Returns [`InvalidData`] holding the first detail line that contains
    /// a CR or LF.
    pub fn validate(&self) -> Result<(), InvalidData> {
        match self
            .details
            .iter()
            .find(|detail| detail.bytes().any(|b| b == b'\r' || b == b'\n'))
        {
            Some(detail) => Err(InvalidData::new(
                "Reply detail contains a line terminator",
                BytesMut::from(detail.as_bytes()),
            )),
            None => Ok(()),
        }
    }

    pub(crate) fn push_detail(&mut self, detail: String) {
        self.details.push(detail);
    }

    fn write_line(buffer: &mut BytesMut, code: &str, separator: u8, detail: &str) {
        buffer.extend_from_slice(code.as_bytes());
        buffer.put_u8(separator);
        buffer.extend_from_slice(detail.as_bytes());
        buffer.extend_from_slice(CRLF);
    }
}

impl Writable for Response {
    fn write(&self, buffer: &mut BytesMut) {
        let code = self.code.to_string();

        match self.details.split_last() {
            None => Self::write_line(buffer, &code, SP, ""),
            Some((last, continued)) => {
                for detail in continued {
                    Self::write_line(buffer, &code, DASH, detail);
                }
                Self::write_line(buffer, &code, SP, last);
            }
        }
    }

    fn len(&self) -> usize {
        let line_overhead = self.code.to_string().len() + 1 + CRLF.len();
        let lines = self.details.len().max(1);

        lines * line_overhead + self.details.iter().map(String::len).sum::<usize>()
    }

    fn is_empty(&self) -> bool {
        false
    }
}

impl Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)?;
        for detail in &self.details {
            f.write_char(' ')?;
            f.write_str(detail)?;
        }
        Ok(())
    }
}

/// A single line of a possibly multi-line reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ReplyLine {
    pub(crate) code: u16,
    pub(crate) last: bool,
    pub(crate) text: String,
}

impl Parsable for ReplyLine {
    fn parse(mut buffer: BytesMut) -> Result<Self, ProtocolError> {
        let line_len = buffer.without_terminator().len();
        buffer.truncate(line_len);

        let Some(code) = buffer.safe_split_to(REPLY_CODE_LENGTH) else {
            return Err(NotEnoughData::new(
                STAGE_DECODING,
                "Reply",
                "a reply line needs a three digit code",
                REPLY_CODE_LENGTH,
                buffer.len(),
                buffer,
            )
            .into());
        };
        if !code.iter().all(u8::is_ascii_digit) {
            return Err(InvalidData::new("Reply code is not numeric", code).into());
        }
        let code = code
            .iter()
            .fold(0_u16, |acc, digit| acc * 10 + u16::from(digit - b'0'));

        let last = match buffer.safe_get_u8() {
            None | Some(SP) => true,
            Some(DASH) => false,
            Some(_) => {
                return Err(InvalidData::new("Invalid separator after reply code", buffer).into())
            }
        };

        Ok(Self {
            code,
            last,
            text: String::from_utf8_lossy(&buffer).into_owned(),
        })
    }
}
