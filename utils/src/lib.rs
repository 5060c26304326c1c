#![doc = include_str!("../Readme.md")]

use bytes::{Buf, BytesMut};

/// Carriage return followed by line feed, the smtp line terminator
pub const CRLF: &[u8] = b"\r\n";

/// Log at debug level if the calling crate has its `tracing` feature enabled.
///
/// Without the feature this expands to nothing.
#[macro_export]
macro_rules! debug {
    ($($arg:tt)+) => {
        #[cfg(feature = "tracing")]
        ::tracing::debug!($($arg)+);
    };
}

/// Length checked splitting of a parse buffer
pub trait ByteParsing {
    /// Split off the first `at` bytes, `None` if there are not enough.
    fn safe_split_to(&mut self, at: usize) -> Option<BytesMut>;
    /// Take the next byte, `None` on an empty buffer.
    fn safe_get_u8(&mut self) -> Option<u8>;
}

impl ByteParsing for BytesMut {
    fn safe_split_to(&mut self, at: usize) -> Option<Self> {
        (at <= self.len()).then(|| self.split_to(at))
    }

    fn safe_get_u8(&mut self) -> Option<u8> {
        if self.is_empty() {
            return None;
        }
        Some(self.get_u8())
    }
}

/// Inspect the line terminator of a single line
pub trait LineParsing {
    /// Length of the trailing terminator: 2 for `\r\n`, 1 for a bare `\n`,
    /// 0 if the line is not terminated.
    fn terminator_len(&self) -> usize;

    /// The line without its trailing terminator.
    fn without_terminator(&self) -> &[u8];
}

impl LineParsing for [u8] {
    fn terminator_len(&self) -> usize {
        if self.ends_with(CRLF) {
            2
        } else if self.ends_with(b"\n") {
            1
        } else {
            0
        }
    }

    fn without_terminator(&self) -> &[u8] {
        &self[..self.len() - self.terminator_len()]
    }
}
