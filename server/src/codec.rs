use asynchronous_codec::{Decoder, Encoder};
use bytes::BytesMut;

use smtp_codec_common::decoding::{ClientEvent, Mode, RequestDecoder};
use smtp_codec_common::encoding::{ServerMessage, Writable};
use smtp_codec_common::ProtocolError;

/// The `SmtpCodec` is responsible for decoding from and encoding to bits on
/// the wire from structs provided by this crate.
///
/// Decoding yields client requests and content blocks, encoding writes
/// replies. One codec belongs to exactly one connection.
#[derive(Debug, Default)]
pub struct SmtpCodec {
    decoder: RequestDecoder,
}

impl SmtpCodec {
    /// Create a codec accepting lines up to `max_line_length` bytes,
    /// terminator excluded.
    #[must_use]
    pub fn new(max_line_length: usize) -> Self {
        Self {
            decoder: RequestDecoder::new(max_line_length),
        }
    }

    /// The mode the request decoder is in
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.decoder.mode()
    }
}

impl Decoder for SmtpCodec {
    type Item = ClientEvent;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.decoder.decode(src)
    }
}

impl Encoder for SmtpCodec {
    type Item<'i> = &'i ServerMessage;
    type Error = ProtocolError;

    fn encode(&mut self, item: &ServerMessage, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.len());
        item.write(dst);
        Ok(())
    }
}
