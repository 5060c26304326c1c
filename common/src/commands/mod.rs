//! Smtp command verbs and the requests carrying them.
//!
//! Every command line starts with a four letter verb. Known verbs map to a
//! dedicated [`Command`] variant, everything else is kept as
//! [`Command::Unknown`] so it can still be forwarded or logged.

mod parameters;
mod request;

use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};

use bytes::BytesMut;

use crate::{error::STAGE_DECODING, NotEnoughData, ProtocolError};

pub use self::parameters::tokenize;
pub use self::request::Request;

/// Length of every smtp command verb
pub const VERB_LENGTH: usize = 4;

/// A four byte verb not found in the command table.
///
/// Comparison and hashing ignore ASCII case, the original bytes are kept
/// for writing them back out.
#[derive(Debug, Clone, Copy)]
pub struct Verb([u8; VERB_LENGTH]);

impl Verb {
    /// The verb exactly as it was received
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl PartialEq for Verb {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for Verb {}

impl Hash for Verb {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_ascii_uppercase().hash(state);
    }
}

macro_rules! command_table {
    ($($variant:ident => $verb:literal,)+) => {
        /// An smtp command, identified by its four letter verb.
        ///
        /// See [`Command::lookup`] on how verbs are matched.
        #[allow(missing_docs)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Command {
            $($variant,)+
            /// Any verb not in the table above
            Unknown(Verb),
        }

        impl Command {
            /// Look up the command for the first four bytes of `bytes`.
            ///
            /// Matching ignores ASCII case. Verbs not in the table yield
            /// [`Command::Unknown`] carrying the bytes verbatim.
            ///
            /// # Errors
            /// Fails with [`ProtocolError::NotEnoughData`] if fewer than four
            /// bytes are available.
            pub fn lookup(bytes: &[u8]) -> Result<Self, ProtocolError> {
                let Some(verb) = bytes.first_chunk::<VERB_LENGTH>() else {
                    return Err(NotEnoughData::new(
                        STAGE_DECODING,
                        "Command",
                        "a command verb needs four bytes",
                        VERB_LENGTH,
                        bytes.len(),
                        BytesMut::from(bytes),
                    )
                    .into());
                };
                $(
                    if verb.eq_ignore_ascii_case($verb) {
                        return Ok(Self::$variant);
                    }
                )+
                Ok(Self::Unknown(Verb(*verb)))
            }

            /// The verb of this command.
            ///
            /// Known commands are written in their upper case form, unknown
            /// ones as received.
            #[must_use]
            pub fn as_bytes(&self) -> &[u8] {
                match self {
                    $(Self::$variant => $verb,)+
                    Self::Unknown(verb) => verb.as_bytes(),
                }
            }
        }
    };
}

command_table!(
    // Session opening
    Ehlo => b"EHLO",
    Helo => b"HELO",
    // Mail transaction
    Mail => b"MAIL",
    Rcpt => b"RCPT",
    Data => b"DATA",
    Rset => b"RSET",
    // Miscellaneous
    Noop => b"NOOP",
    Help => b"HELP",
    Quit => b"QUIT",
    Vrfy => b"VRFY",
    Expn => b"EXPN",
);

impl Command {
    /// Whether a content block follows this command
    #[must_use]
    pub fn expects_content(&self) -> bool {
        matches!(self, Self::Data)
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(b"EHLO", Command::Ehlo)]
    #[case(b"helo", Command::Helo)]
    #[case(b"MaIl", Command::Mail)]
    #[case(b"rcpt", Command::Rcpt)]
    #[case(b"DATA", Command::Data)]
    #[case(b"rset", Command::Rset)]
    #[case(b"NOOP", Command::Noop)]
    #[case(b"Help", Command::Help)]
    #[case(b"QUIT", Command::Quit)]
    #[case(b"vrfy", Command::Vrfy)]
    #[case(b"EXPN", Command::Expn)]
    fn test_lookup_known(#[case] verb: &[u8], #[case] expected: Command) {
        assert_eq!(Command::lookup(verb).unwrap(), expected);
    }

    #[test]
    fn test_lookup_unknown_keeps_bytes() {
        let command = Command::lookup(b"xAuT").unwrap();

        assert_matches!(command, Command::Unknown(v) if v.as_bytes() == b"xAuT");
        assert_eq!(command.as_bytes(), b"xAuT");
    }

    #[test]
    fn test_unknown_equality_ignores_case() {
        let lower = Command::lookup(b"auth").unwrap();
        let upper = Command::lookup(b"AUTH").unwrap();

        assert_eq!(lower, upper);
        assert_ne!(lower, Command::lookup(b"ATRN").unwrap());

        let set: HashSet<Command> = [lower, upper].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_lookup_uses_first_four_bytes() {
        assert_eq!(Command::lookup(b"QUIT\r\n").unwrap(), Command::Quit);
    }

    #[test]
    fn test_lookup_too_short() {
        let err = Command::lookup(b"HI").unwrap_err();

        assert_matches!(err, ProtocolError::NotEnoughData(e) if e.expected == 4 && e.got == 2);
    }

    #[test]
    fn test_only_data_expects_content() {
        assert!(Command::Data.expects_content());
        assert!(!Command::Mail.expects_content());
        assert!(!Command::lookup(b"BDAT").unwrap().expects_content());
    }

    #[test]
    fn test_display_canonical_verb() {
        assert_eq!(Command::lookup(b"ehlo").unwrap().to_string(), "EHLO");
        assert_eq!(Command::lookup(b"sTls").unwrap().to_string(), "sTls");
    }
}
