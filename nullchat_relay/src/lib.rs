// nullchat_relay — broadcast chat relay server for nullchat.
//
// The relay is a thin message broker: it accepts TCP connections from chat
// clients into a fixed-capacity session table, tracks a nickname per
// session, and forwards every chat message to all other sessions. It holds
// no history and no identity — nicknames are display-only attribution.
//
// Module overview:
// - `session.rs`: `Session` and the fixed-slot `SessionTable` — occupancy,
//                 nickname storage, and the send/broadcast helpers. The
//                 core data structure that `server.rs` drives.
// - `server.rs`:  TCP listener, the single-threaded readiness-poll event
//                 loop, per-kind policy, and `RelayConfig`.
//
// Dependencies: `nullchat_protocol` (shared framing, message types, and
// readiness polling).
//
// The relay can run as a standalone binary (`main.rs`) or be embedded in a
// host process via the library API (`start_relay`).

pub mod server;
pub mod session;

pub use server::{RelayConfig, RelayHandle, start_relay};
