use shared::ProtocolError;
use std::io;
use thiserror::Error;
use tokio_util::codec::LinesCodecError;

/// Failures of the acceptor or of a single session's transport
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("server is already running")]
    AlreadyRunning,

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("line framing error: {0}")]
    Line(#[from] LinesCodecError),

    #[error("malformed request: {0}")]
    Protocol(#[from] ProtocolError),
}
