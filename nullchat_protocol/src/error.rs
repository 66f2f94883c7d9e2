// Protocol-level error type shared by framing and message decoding.
//
// Everything here is fatal for the connection that observed it, except as
// interpreted by the caller: the relay tears down the offending session, the
// client tears down its one connection. Validation errors that never reach
// the wire live in the client crate instead (`ClientError::InvalidMessage`).

use std::io;
use std::string::FromUtf8Error;

use thiserror::Error;

use crate::limits::{MAX_ARG_SIZE, MAX_ARGS};
use crate::message::Kind;

#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The transport failed or closed mid-frame.
    #[error("transport error: {0}")]
    Io(#[from] io::Error),

    /// An argument's encoded form (bytes plus terminator) does not fit the
    /// `MAX_ARG_SIZE` budget.
    #[error("argument of {len} bytes exceeds the {MAX_ARG_SIZE}-byte argument budget")]
    ArgTooLong { len: usize },

    /// More than `MAX_ARGS` arguments before the list terminator.
    #[error("frame carries {count} arguments (limit {MAX_ARGS})")]
    TooManyArgs { count: usize },

    /// An empty argument cannot be encoded: on the wire it is
    /// indistinguishable from the argument-list terminator.
    #[error("empty argument would terminate the argument list early")]
    EmptyArg,

    /// An argument containing an interior null byte would decode as two.
    #[error("argument contains an interior null byte")]
    EmbeddedNul,

    /// Argument bytes were not valid UTF-8.
    #[error("argument is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] FromUtf8Error),

    /// A known kind arrived with the wrong number of arguments for its
    /// direction.
    #[error("{kind} frame carried {got} arguments, expected {expected}")]
    ArgCount {
        kind: Kind,
        expected: usize,
        got: usize,
    },
}
