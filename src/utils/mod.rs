//! Utility modules

pub mod error;
pub mod resp;

pub use error::{ConnectionError, ProbeError, ProtocolError, Result, SinkError};
pub use resp::{RespDecoder, RespEncoder, RespValue};
