// Protocol limits shared by the relay and the client.
//
// These values bound allocation per decoded frame, not true protocol
// semantics — the semantic limits (`MAX_MSG_LEN`, `MAX_NICK_LEN`) are
// enforced by the endpoints after decode. Both ends of a connection must
// agree on all of them.

/// Maximum encoded size of a single argument in bytes, including its null
/// terminator. Bounds the per-argument buffer a decoder may accumulate.
pub const MAX_ARG_SIZE: usize = 4096;

/// Maximum number of arguments in one frame.
pub const MAX_ARGS: usize = 8;

/// Maximum chat message text length in bytes.
pub const MAX_MSG_LEN: usize = 128;

/// Maximum nickname length in bytes.
pub const MAX_NICK_LEN: usize = 16;

/// Well-known port the relay listens on by default.
pub const DEFAULT_PORT: u16 = 21500;

/// Default cap on concurrent sessions held by the relay.
pub const DEFAULT_MAX_SESSIONS: usize = 8;

/// Nickname assigned to a session before it requests its own.
pub const DEFAULT_NICKNAME: &str = "Anonymous";
