// Client-side error taxonomy.
//
// Four families, matching how a frontend has to react:
// - validation (`InvalidMessage`): nothing was sent, the connection is
//   untouched, fix the message and retry;
// - capacity (`Refused`): the relay had no free slot, no session exists;
// - protocol (`Protocol`): the connection was already torn down by the time
//   the error is returned;
// - transport (`ConnectFailed`, `Io`, `HandshakeTimeout`): likewise torn
//   down, reconnect is a fresh `connect`.

use std::io;

use thiserror::Error;

use nullchat_protocol::ProtocolError;

#[derive(Debug, Error)]
pub enum ClientError {
    /// No connection is open; `connect` first.
    #[error("not connected to a server")]
    NotConnected,

    /// The TCP connection could not be established.
    #[error("connection failed: {0}")]
    ConnectFailed(#[source] io::Error),

    /// The relay answered the handshake with something other than an
    /// accept — either an explicit refusal (no free slot) or an unexpected
    /// first event.
    #[error("server refused the connection")]
    Refused,

    /// No handshake event arrived within the connect timeout.
    #[error("timed out waiting for the server handshake")]
    HandshakeTimeout,

    /// The message failed validation before any I/O; the connection state
    /// is unchanged.
    #[error("invalid outgoing message: {0}")]
    InvalidMessage(&'static str),

    /// The peer violated the wire protocol; the connection has been closed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The transport failed outside a frame read; the connection has been
    /// closed.
    #[error("transport error: {0}")]
    Io(#[from] io::Error),
}
