#![doc = include_str!("../Readme.md")]

pub use smtp_codec_client as client;
pub use smtp_codec_common as common;
pub use smtp_codec_server as server;
