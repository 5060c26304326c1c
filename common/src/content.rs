//! The raw content following a `DATA` command.

use bytes::BytesMut;
use smtp_codec_utils::CRLF;

use crate::encoding::Writable;

/// The line that ends a content block, without its terminator
pub const CONTENT_TERMINATOR: &[u8] = b".";

/// All lines received between `DATA` and the terminating `.` line.
///
/// Every line keeps its original terminator, the terminating line itself
/// is not part of the content. Leading dots are not unescaped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContentBlock {
    content: BytesMut,
}

impl From<&[u8]> for ContentBlock {
    fn from(value: &[u8]) -> Self {
        Self {
            content: BytesMut::from(value),
        }
    }
}

impl From<BytesMut> for ContentBlock {
    fn from(content: BytesMut) -> Self {
        Self { content }
    }
}

impl ContentBlock {
    /// Concatenate accumulated content lines into one block
    pub(crate) fn from_chunks(chunks: Vec<BytesMut>) -> Self {
        let mut content = BytesMut::with_capacity(chunks.iter().map(BytesMut::len).sum());
        for chunk in chunks {
            content.extend_from_slice(&chunk);
        }
        Self { content }
    }

    /// Access the contained content bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.content
    }

    /// Take the contained content bytes.
    #[must_use]
    pub fn into_inner(self) -> BytesMut {
        self.content
    }

    /// Number of lines in this block
    #[must_use]
    pub fn line_count(&self) -> usize {
        bytecount::count(&self.content, b'\n')
    }

    fn needs_line_break(&self) -> bool {
        !self.content.is_empty() && !self.content.ends_with(b"\n")
    }
}

impl Writable for ContentBlock {
    fn write(&self, buffer: &mut BytesMut) {
        buffer.extend_from_slice(&self.content);
        if self.needs_line_break() {
            buffer.extend_from_slice(CRLF);
        }
        buffer.extend_from_slice(CONTENT_TERMINATOR);
        buffer.extend_from_slice(CRLF);
    }

    fn len(&self) -> usize {
        let line_break = if self.needs_line_break() { CRLF.len() } else { 0 };
        self.content.len() + line_break + CONTENT_TERMINATOR.len() + CRLF.len()
    }

    fn is_empty(&self) -> bool {
        false
    }
}
