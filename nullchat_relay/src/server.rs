// TCP listener and main event loop for the chat relay.
//
// Architecture: one logical thread, readiness-driven.
//
// Each loop iteration makes a single `poll_readable` call over the listener
// plus every occupied session socket — that poll is the loop's only
// suspension point. Within one iteration the accept check is serviced
// before per-session messages, and sessions are serviced in slot order.
// Sockets stay in blocking mode: once the poll reports one ready, the
// framing layer reads a complete frame (or fails) before the loop moves on.
// No worker threads, no locks — the session table is touched only here.
//
// A slow peer can therefore stall an iteration and there is no per-send
// timeout; that is an accepted limitation of the single-threaded design,
// not a guarantee.
//
// Shutdown: the loop polls with a bounded interval and rechecks a
// `keep_running` flag, so `RelayHandle::stop` takes effect within one
// interval.

use std::io;
use std::net::{SocketAddr, TcpListener};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use serde::Deserialize;

use nullchat_protocol::framing::{read_frame, write_frame};
use nullchat_protocol::limits::{
    DEFAULT_MAX_SESSIONS, DEFAULT_NICKNAME, DEFAULT_PORT, MAX_MSG_LEN, MAX_NICK_LEN,
};
use nullchat_protocol::message::{ClientRequest, ServerEvent};
use nullchat_protocol::readiness::poll_readable;

use crate::session::{Session, SessionTable};

/// How long one poll waits before the loop rechecks its stop flag.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Handle returned by `start_relay` to control the running server.
pub struct RelayHandle {
    keep_running: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl RelayHandle {
    /// Signal the relay to stop and wait for it to shut down.
    pub fn stop(self) {
        self.keep_running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread {
            let _ = handle.join();
        }
    }
}

/// Configuration for starting a relay server.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelayConfig {
    /// Interface to bind. `0.0.0.0` accepts clients from any interface;
    /// tests bind `127.0.0.1` to stay on loopback.
    pub bind_host: String,
    /// Listen port. 0 lets the OS pick a free one.
    pub port: u16,
    /// Maximum concurrent sessions; further connects are refused.
    pub max_clients: usize,
    /// Nickname assigned to every session until it requests its own.
    pub default_nick: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".into(),
            port: DEFAULT_PORT,
            max_clients: DEFAULT_MAX_SESSIONS,
            default_nick: DEFAULT_NICKNAME.into(),
        }
    }
}

impl RelayConfig {
    /// Load a config from a JSON file. Missing fields fall back to the
    /// defaults, unknown fields are rejected.
    pub fn load(path: &Path) -> io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

/// Start the relay server on a background thread. Returns a handle for
/// stopping it and the actual bound address (useful when port 0 is used to
/// let the OS pick a free port).
pub fn start_relay(config: RelayConfig) -> io::Result<(RelayHandle, SocketAddr)> {
    let listener = TcpListener::bind((config.bind_host.as_str(), config.port))?;
    let addr = listener.local_addr()?;
    let keep_running = Arc::new(AtomicBool::new(true));
    let keep_running_clone = keep_running.clone();

    let thread = thread::spawn(move || {
        run_relay(&listener, &config, &keep_running_clone);
    });

    Ok((
        RelayHandle {
            keep_running,
            thread: Some(thread),
        },
        addr,
    ))
}

/// Main relay loop. Runs until `keep_running` is set to false.
///
/// Public so the standalone binary can run it directly on the main thread;
/// embedders and tests go through `start_relay` instead.
pub fn run_relay(listener: &TcpListener, config: &RelayConfig, keep_running: &AtomicBool) {
    let mut table = SessionTable::new(config.max_clients);
    log::info!(
        "relay ready: {} slots, default nick {:?}",
        table.capacity(),
        config.default_nick
    );

    while keep_running.load(Ordering::SeqCst) {
        let occupied = table.occupied_slots();

        // One poll over the listener and every occupied slot, in that order.
        let ready = {
            let mut sources: Vec<&dyn std::os::fd::AsRawFd> =
                Vec::with_capacity(1 + occupied.len());
            sources.push(listener);
            for &slot in &occupied {
                if let Some(stream) = table.stream(slot) {
                    sources.push(stream);
                }
            }
            match poll_readable(&sources, Some(POLL_INTERVAL)) {
                Ok(ready) => ready,
                Err(e) => {
                    log::error!("readiness poll failed: {e}");
                    break;
                }
            }
        };

        if ready[0] {
            handle_connection(listener, &mut table, config);
        }
        for (i, &slot) in occupied.iter().enumerate() {
            // A slot can only vanish through its own handler, but check
            // anyway before trusting a pre-poll snapshot.
            if ready[i + 1] && table.is_occupied(slot) {
                handle_message(&mut table, slot);
            }
        }
    }

    log::info!("relay loop stopped, dropping {} session(s)", table.len());
}

/// Handle a pending connection: accept it, then either claim a slot
/// (handshake + join notice) or refuse it outright.
fn handle_connection(listener: &TcpListener, table: &mut SessionTable, config: &RelayConfig) {
    let (mut stream, peer) = match listener.accept() {
        Ok(accepted) => accepted,
        Err(e) => {
            log::warn!("failed to accept incoming connection: {e}");
            return;
        }
    };

    let Some(slot) = table.free_slot() else {
        log::warn!("refusing {peer}: all {} slots occupied", table.capacity());
        // Best effort; the connection is dropped either way and no session
        // state was ever created.
        if let Err(e) = write_frame(&mut stream, &ServerEvent::Refused.to_frame()) {
            log::debug!("failed to send refusal to {peer}: {e}");
        }
        return;
    };

    // Handshake: accept, then push the default nickname so the client can
    // display its own name from the start.
    if let Err(e) = write_frame(&mut stream, &ServerEvent::Accepted.to_frame()) {
        log::warn!("handshake with {peer} failed: {e}");
        return;
    }
    let nick_event = ServerEvent::NickChange {
        nick: config.default_nick.clone(),
    };
    if let Err(e) = write_frame(&mut stream, &nick_event.to_frame()) {
        log::warn!("incoming connection {peer} lost during handshake: {e}");
        return;
    }

    table.insert(
        slot,
        Session {
            nickname: config.default_nick.clone(),
            stream,
        },
    );
    log::info!("client {peer} connected as {:?} (slot {slot})", config.default_nick);
    table.broadcast_chat_from(slot, "Connected");
}

/// Service one readable session: decode a frame and apply per-kind policy.
fn handle_message(table: &mut SessionTable, slot: usize) {
    let frame = {
        let Some(mut stream) = table.stream(slot) else {
            return;
        };
        match read_frame(&mut stream) {
            Ok(frame) => frame,
            Err(e) => {
                log::info!("session in slot {slot} failed: {e}");
                disconnect(table, slot);
                return;
            }
        }
    };

    match ClientRequest::from_frame(frame) {
        Ok(Some(ClientRequest::Chat { text })) => {
            if text.len() > MAX_MSG_LEN {
                log::warn!(
                    "slot {slot} sent a {}-byte message (limit {MAX_MSG_LEN})",
                    text.len()
                );
                disconnect(table, slot);
                return;
            }
            if let Some(nick) = table.nickname(slot) {
                log::info!("<{nick}> {text}");
            }
            table.broadcast_chat_from(slot, &text);
        }
        Ok(Some(ClientRequest::NickChange { nick })) => {
            if nick.len() > MAX_NICK_LEN {
                log::warn!(
                    "slot {slot} requested a {}-byte nickname (limit {MAX_NICK_LEN})",
                    nick.len()
                );
                disconnect(table, slot);
                return;
            }
            let old = table.nickname(slot).unwrap_or_default().to_owned();
            log::info!("client {old} changed nickname to {nick}");

            // Notice goes out attributed to the old name, then the rename
            // lands, then the sender alone gets the confirmation echo. The
            // confirmation carries whatever the relay stored, so a future
            // normalization step slots in here.
            table.broadcast_chat_from(slot, &format!("Changed nickname to <{nick}>"));
            table.set_nickname(slot, nick.clone());
            table.send_to(slot, &ServerEvent::NickChange { nick });
        }
        Ok(None) => {
            // Unknown or misdirected kind: ignore and keep the session.
            log::debug!("ignoring unrecognized frame from slot {slot}");
        }
        Err(e) => {
            log::info!("protocol error from slot {slot}: {e}");
            disconnect(table, slot);
        }
    }
}

/// Tear down one session: free the slot, tell everyone else, close the
/// stream. Broadcast failures here are ignored — any session that also
/// failed will be detected on its own next poll.
fn disconnect(table: &mut SessionTable, slot: usize) {
    let Some(session) = table.remove(slot) else {
        return;
    };
    log::info!("client {} disconnected (slot {slot})", session.nickname);
    let notice = ServerEvent::Chat {
        sender: session.nickname,
        text: "Disconnected".into(),
    };
    table.broadcast(&notice, None);
    // `session.stream` drops here, closing the connection.
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_protocol_limits() {
        let config = RelayConfig::default();
        // All interfaces by default: the relay exists to be reached.
        assert_eq!(config.bind_host, "0.0.0.0");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.max_clients, DEFAULT_MAX_SESSIONS);
        assert_eq!(config.default_nick, DEFAULT_NICKNAME);
    }

    #[test]
    fn config_file_overrides_and_defaults_mix() {
        let dir = std::env::temp_dir();
        let path = dir.join("nullchat_relay_config_test.json");
        std::fs::write(
            &path,
            r#"{ "bind_host": "127.0.0.1", "port": 0, "max_clients": 2 }"#,
        )
        .unwrap();

        let config = RelayConfig::load(&path).unwrap();
        assert_eq!(config.bind_host, "127.0.0.1");
        assert_eq!(config.port, 0);
        assert_eq!(config.max_clients, 2);
        assert_eq!(config.default_nick, DEFAULT_NICKNAME);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn config_file_rejects_unknown_fields() {
        let dir = std::env::temp_dir();
        let path = dir.join("nullchat_relay_config_unknown_test.json");
        std::fs::write(&path, r#"{ "ports": 21500 }"#).unwrap();

        let err = RelayConfig::load(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        std::fs::remove_file(&path).ok();
    }
}
