use smtp_codec_utils::LineParsing;

const SP: u8 = b' ';

/// Split the remainder of a command line into its parameters.
///
/// `remainder` is everything after the four byte verb, still carrying the
/// line terminator. Parameters are separated by single spaces; runs of
/// spaces do not produce empty parameters. Each parameter is trimmed of
/// surrounding ASCII whitespace, which also removes the terminator from the
/// last one. Nothing else is interpreted, `FROM:<a@b>` stays as is.
#[must_use]
pub fn tokenize(remainder: &[u8]) -> Vec<String> {
    if remainder.len() == remainder.terminator_len() {
        return Vec::new();
    }

    remainder
        .split(|&b| b == SP)
        .map(<[u8]>::trim_ascii)
        .filter(|token| !token.is_empty())
        .map(|token| String::from_utf8_lossy(token).into_owned())
        .collect()
}
