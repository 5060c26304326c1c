use asynchronous_codec::Decoder;
use bytes::BytesMut;
use smtp_codec_common::{reply::Response, ProtocolError};

use crate::codec::SmtpClientCodec;

/// Decode everything in `buffer` with a fresh codec
///
/// # Errors
/// Forwards the first decoding error
pub fn fuzz_parse(buffer: &mut BytesMut) -> Result<Vec<Response>, ProtocolError> {
    let mut codec = SmtpClientCodec::new(2_usize.pow(16));
    let mut responses = Vec::new();
    while let Some(response) = codec.decode(buffer)? {
        responses.push(response);
    }
    Ok(responses)
}
