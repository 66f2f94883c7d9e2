// nullchat_protocol — wire protocol shared by the nullchat relay and client.
//
// This crate defines the framing, message vocabulary, shared limits, and
// readiness-polling primitive used by the relay server (`nullchat_relay`)
// and the client session library (`nullchat_client`) to speak over TCP. It
// is the single source of truth for the wire format: both sides reuse it
// unchanged, so the two stay bit-compatible by construction.
//
// Module overview:
// - `limits.rs`:    Sizes both ends must agree on — argument/frame bounds,
//                   semantic text limits, default port and capacity.
// - `framing.rs`:   The codec: a 3-byte kind tag, null-terminated UTF-8
//                   arguments, and an empty argument closing the list.
// - `message.rs`:   `Kind` plus the direction-specific `ClientRequest` and
//                   `ServerEvent` enums with arity-checked conversions.
// - `error.rs`:     `ProtocolError`, fatal for the connection that saw it.
// - `readiness.rs`: `poll_readable` over raw descriptors (Unix), the single
//                   suspension point of both event loops.
//
// Design decisions:
// - **Self-delimiting frames.** No length prefix means no byte-order
//   concerns and a trivially language-agnostic format, at the cost of an
//   O(size) terminator scan per argument.
// - **No async runtime.** Blocking `Read`/`Write` plus one readiness poll
//   per loop iteration; no worker threads, no locks.

pub mod error;
pub mod framing;
pub mod limits;
pub mod message;
#[cfg(unix)]
pub mod readiness;

pub use error::ProtocolError;
pub use framing::{Frame, KIND_SIZE, encode_frame, read_frame, write_frame};
pub use message::{ClientRequest, Kind, ServerEvent};
