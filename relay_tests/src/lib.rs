// relay_tests — end-to-end harness driving a live relay over loopback.
//
// `TestPeer` wraps `ChatClient` with panicking helpers so the integration
// tests read as scripts: connect, say, expect. All waits are bounded, so a
// wedged relay fails the test instead of hanging it.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use nullchat_client::ChatClient;
use nullchat_protocol::message::{ClientRequest, ServerEvent};
use nullchat_relay::{RelayConfig, RelayHandle, start_relay};

/// Generous bound for "this event is definitely coming".
pub const RECV_BUDGET: Duration = Duration::from_secs(5);

/// Short bound for "nothing should arrive".
pub const QUIET: Duration = Duration::from_millis(200);

/// Start a relay on an ephemeral loopback port.
pub fn start_test_relay(max_clients: usize) -> (RelayHandle, SocketAddr) {
    let config = RelayConfig {
        bind_host: "127.0.0.1".into(),
        port: 0,
        max_clients,
        ..RelayConfig::default()
    };
    start_relay(config).unwrap()
}

pub struct TestPeer {
    pub client: ChatClient,
}

impl TestPeer {
    /// Connect to the relay and complete the handshake, panicking on any
    /// failure. The assigned-nickname event is left queued for the test.
    pub fn connect(addr: SocketAddr) -> Self {
        let mut client = ChatClient::new();
        client
            .connect(&addr.ip().to_string(), addr.port(), RECV_BUDGET)
            .unwrap();
        Self { client }
    }

    /// Connect and also consume the assigned-nickname event, for tests
    /// that only care about traffic after joining.
    pub fn join(addr: SocketAddr) -> Self {
        let mut peer = Self::connect(addr);
        let nick = peer.expect_event(RECV_BUDGET);
        assert!(
            matches!(nick, ServerEvent::NickChange { .. }),
            "expected assigned nickname, got {nick:?}"
        );
        peer
    }

    pub fn say(&mut self, text: &str) {
        self.client
            .send(&ClientRequest::Chat { text: text.into() })
            .unwrap();
    }

    pub fn set_nick(&mut self, nick: &str) {
        self.client
            .send(&ClientRequest::NickChange { nick: nick.into() })
            .unwrap();
    }

    /// One bounded receive; `None` means nothing arrived in time.
    pub fn recv(&mut self, timeout: Duration) -> Option<ServerEvent> {
        self.client.receive(timeout).unwrap()
    }

    /// Receive until an event arrives, panicking if the budget runs out.
    pub fn expect_event(&mut self, budget: Duration) -> ServerEvent {
        let deadline = Instant::now() + budget;
        loop {
            let remaining = deadline
                .checked_duration_since(Instant::now())
                .unwrap_or_else(|| panic!("no event within {budget:?}"));
            if let Some(event) = self.recv(remaining) {
                return event;
            }
        }
    }

    /// Receive until `pred` matches, panicking if the budget runs out.
    /// Events that do not match are discarded.
    pub fn expect_matching(
        &mut self,
        budget: Duration,
        pred: impl Fn(&ServerEvent) -> bool,
    ) -> ServerEvent {
        let deadline = Instant::now() + budget;
        loop {
            assert!(
                Instant::now() < deadline,
                "no matching event within {budget:?}"
            );
            let event = self.expect_event(deadline.saturating_duration_since(Instant::now()));
            if pred(&event) {
                return event;
            }
        }
    }

    /// Discard everything already queued.
    pub fn drain(&mut self) {
        while self.recv(QUIET).is_some() {}
    }
}
