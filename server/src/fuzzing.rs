use asynchronous_codec::Decoder;
use bytes::BytesMut;
use smtp_codec_common::{decoding::ClientEvent, ProtocolError};

use crate::codec::SmtpCodec;

/// Decode everything in `buffer` with a fresh codec
///
/// # Errors
/// Forwards the first decoding error
pub fn fuzz_parse(buffer: &mut BytesMut) -> Result<Vec<ClientEvent>, ProtocolError> {
    let mut codec = SmtpCodec::new(2_usize.pow(16));
    let mut events = Vec::new();
    while let Some(event) = codec.decode(buffer)? {
        events.push(event);
    }
    Ok(events)
}
