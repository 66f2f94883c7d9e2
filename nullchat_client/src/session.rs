// Client session: one outbound connection to a relay.
//
// `ChatClient` is the resource object a frontend owns for the lifetime of
// its networking — constructing it acquires the session state, dropping it
// closes any open connection. It holds at most one connection and exactly
// one of two states: disconnected or connected. A new `connect` always
// tears down the old connection first, so there is never a concurrent
// attempt.
//
// Everything is synchronous on the caller's thread. `receive` is the only
// bounded wait: it polls the socket for readiness up to the caller's
// timeout and returns `Ok(None)` when nothing arrived — the one outcome
// that is neither data nor an error, and never a disconnect. Protocol and
// transport failures tear the connection down on the spot and surface a
// distinguishable error; the frontend reacts by clearing its state, and
// reconnection is always a fresh `connect`.

use std::net::TcpStream;
use std::os::fd::AsRawFd;
use std::time::{Duration, Instant};

use nullchat_protocol::ProtocolError;
use nullchat_protocol::framing::{read_frame, write_frame};
use nullchat_protocol::limits::{MAX_MSG_LEN, MAX_NICK_LEN};
use nullchat_protocol::message::{ClientRequest, ServerEvent};
use nullchat_protocol::readiness::poll_readable;

use crate::error::ClientError;

/// Client end of a relay connection.
pub struct ChatClient {
    stream: Option<TcpStream>,
}

impl ChatClient {
    /// Create a disconnected client. Dropping the client closes whatever
    /// connection it holds at the time.
    pub fn new() -> Self {
        Self { stream: None }
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Connect to a relay and wait up to `timeout` for its handshake.
    ///
    /// The first event must be an accept. A refusal or any other first
    /// event yields `ClientError::Refused`; silence within `timeout` yields
    /// `ClientError::HandshakeTimeout`. Every failure path leaves the
    /// client disconnected. An existing connection is torn down before the
    /// new attempt.
    pub fn connect(&mut self, host: &str, port: u16, timeout: Duration) -> Result<(), ClientError> {
        self.disconnect();

        let stream = TcpStream::connect((host, port)).map_err(ClientError::ConnectFailed)?;
        self.stream = Some(stream);
        log::debug!("connected to {host}:{port}, awaiting handshake");

        match self.receive(timeout) {
            Ok(Some(ServerEvent::Accepted)) => {
                log::info!("session accepted by {host}:{port}");
                Ok(())
            }
            Ok(Some(ServerEvent::Refused)) => {
                log::info!("session refused by {host}:{port}");
                self.disconnect();
                Err(ClientError::Refused)
            }
            Ok(Some(other)) => {
                log::warn!("unexpected handshake event: {other:?}");
                self.disconnect();
                Err(ClientError::Refused)
            }
            Ok(None) => {
                self.disconnect();
                Err(ClientError::HandshakeTimeout)
            }
            // `receive` has already torn the connection down.
            Err(e) => Err(e),
        }
    }

    /// Validate and send one request.
    ///
    /// Validation happens before any I/O: an over-limit, empty, or
    /// null-bearing text returns `InvalidMessage` and leaves both the
    /// transport and the connection state untouched. A transport failure
    /// disconnects and propagates.
    pub fn send(&mut self, request: &ClientRequest) -> Result<(), ClientError> {
        validate(request)?;

        let Some(stream) = self.stream.as_ref() else {
            return Err(ClientError::NotConnected);
        };
        let mut writer = stream;
        if let Err(e) = write_frame(&mut writer, &request.to_frame()) {
            self.disconnect();
            return Err(lift(e));
        }
        Ok(())
    }

    /// Wait up to `timeout` for one event from the relay.
    ///
    /// `Ok(None)` means nothing arrived — not an error, not a disconnect,
    /// and the connection remains usable. A decode failure or an argument
    /// count mismatch disconnects and propagates. Frames with unrecognized
    /// kinds are skipped and the remaining budget keeps polling. Ownership
    /// of the event's strings passes to the caller.
    pub fn receive(&mut self, timeout: Duration) -> Result<Option<ServerEvent>, ClientError> {
        let deadline = Instant::now() + timeout;
        loop {
            let Some(stream) = self.stream.as_ref() else {
                return Err(ClientError::NotConnected);
            };

            let remaining = deadline.saturating_duration_since(Instant::now());
            let sources: [&dyn AsRawFd; 1] = [stream];
            let ready = match poll_readable(&sources, Some(remaining)) {
                Ok(ready) => ready,
                Err(e) => {
                    self.disconnect();
                    return Err(ClientError::Io(e));
                }
            };
            if !ready[0] {
                return Ok(None);
            }

            let mut reader = stream;
            let decoded = read_frame(&mut reader).and_then(ServerEvent::from_frame);
            match decoded {
                Ok(Some(event)) => return Ok(Some(event)),
                Ok(None) => {
                    // Unknown kind: ignore and keep polling within budget.
                    log::debug!("ignoring unrecognized frame from relay");
                }
                Err(e) => {
                    self.disconnect();
                    return Err(lift(e));
                }
            }
        }
    }

    /// Close the connection if one is open. Idempotent, infallible, and
    /// invoked internally on every connect/send/receive failure.
    pub fn disconnect(&mut self) {
        if self.stream.take().is_some() {
            log::debug!("disconnected");
        }
    }
}

impl Default for ChatClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Enforce the semantic limits a frame cannot express.
fn validate(request: &ClientRequest) -> Result<(), ClientError> {
    match request {
        ClientRequest::Chat { text } => {
            if text.is_empty() {
                return Err(ClientError::InvalidMessage("chat text is empty"));
            }
            if text.contains('\0') {
                return Err(ClientError::InvalidMessage("chat text contains a null byte"));
            }
            if text.len() > MAX_MSG_LEN {
                return Err(ClientError::InvalidMessage(
                    "chat text exceeds the maximum message length",
                ));
            }
        }
        ClientRequest::NickChange { nick } => {
            if nick.is_empty() {
                return Err(ClientError::InvalidMessage("nickname is empty"));
            }
            if nick.contains('\0') {
                return Err(ClientError::InvalidMessage("nickname contains a null byte"));
            }
            if nick.len() > MAX_NICK_LEN {
                return Err(ClientError::InvalidMessage(
                    "nickname exceeds the maximum nickname length",
                ));
            }
        }
    }
    Ok(())
}

/// Surface transport failures as transport errors rather than wrapping
/// them in the protocol variant.
fn lift(e: ProtocolError) -> ClientError {
    match e {
        ProtocolError::Io(io) => ClientError::Io(io),
        other => ClientError::Protocol(other),
    }
}
