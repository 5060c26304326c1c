use asynchronous_codec::{Decoder, Encoder};
use bytes::BytesMut;

use smtp_codec_common::decoding::ReplyDecoder;
use smtp_codec_common::encoding::{ClientMessage, Writable};
use smtp_codec_common::reply::Response;
use smtp_codec_common::ProtocolError;

/// Client side codec: writes requests and content blocks, reads
/// (multi-line) replies.
#[derive(Debug, Default)]
pub(crate) struct SmtpClientCodec {
    decoder: ReplyDecoder,
}

impl SmtpClientCodec {
    pub(crate) fn new(max_line_length: usize) -> Self {
        Self {
            decoder: ReplyDecoder::new(max_line_length),
        }
    }
}

impl Decoder for SmtpClientCodec {
    type Item = Response;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.decoder.decode(src)
    }
}

impl Encoder for SmtpClientCodec {
    type Item<'i> = &'i ClientMessage;
    type Error = ProtocolError;

    fn encode(&mut self, item: &ClientMessage, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.len());
        item.write(dst);
        Ok(())
    }
}
