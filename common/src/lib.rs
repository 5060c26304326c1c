#![doc = include_str!("../Readme.md")]

pub mod commands;
pub mod content;
pub mod decoding;
pub mod encoding;
pub mod framing;
pub mod reply;

mod error;

pub use error::{InvalidData, NotEnoughData, ProtocolError};
