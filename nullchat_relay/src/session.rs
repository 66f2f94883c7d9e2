// Session table for the relay.
//
// `SessionTable` is the central data structure that `server.rs` drives: a
// fixed-capacity array of slots, each empty or holding one connected
// `Session` (nickname plus the owned TCP stream). All mutation happens on
// the server's single control thread — no internal locking. A slot is
// polled for readiness iff it is occupied, and both facts are read off the
// same `Option`, so occupancy and poll-set membership cannot drift apart.
//
// Writing to session streams: the `send_to` / `broadcast` helpers encode a
// `ServerEvent` and write it out. Write errors on a single session are
// logged but never propagated — a session whose send path broke will fail
// on its own next poll and be torn down there, so there is no error fan-out
// across peers.

use std::net::TcpStream;

use nullchat_protocol::framing::write_frame;
use nullchat_protocol::message::ServerEvent;

/// One connected client: its display nickname and the owned transport
/// handle. The stream is exclusively this session's for its lifetime;
/// dropping the session closes it.
pub struct Session {
    pub nickname: String,
    pub stream: TcpStream,
}

/// Fixed-capacity collection of at most `capacity` sessions, indexed by
/// slot. Free slots are found by linear scan — the arena-and-index pattern,
/// no per-connection allocation beyond the session itself.
pub struct SessionTable {
    slots: Vec<Option<Session>>,
}

impl SessionTable {
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self { slots }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Index of the first free slot, or `None` when the table is full.
    pub fn free_slot(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_none)
    }

    /// Indices of every occupied slot, in slot order. This is exactly the
    /// set the server polls alongside its listener.
    pub fn occupied_slots(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|_| i))
            .collect()
    }

    pub fn is_occupied(&self, slot: usize) -> bool {
        self.slots.get(slot).is_some_and(Option::is_some)
    }

    /// Claim a free slot for a session. Callers pass an index obtained from
    /// `free_slot`; claiming an occupied slot is a logic error.
    pub fn insert(&mut self, slot: usize, session: Session) {
        debug_assert!(self.slots[slot].is_none(), "slot {slot} already occupied");
        self.slots[slot] = Some(session);
    }

    /// Release a slot, returning its session (stream still open) so the
    /// caller can finish the teardown sequence before the handle drops.
    pub fn remove(&mut self, slot: usize) -> Option<Session> {
        self.slots.get_mut(slot).and_then(Option::take)
    }

    pub fn stream(&self, slot: usize) -> Option<&TcpStream> {
        self.slots.get(slot).and_then(|s| s.as_ref()).map(|s| &s.stream)
    }

    pub fn nickname(&self, slot: usize) -> Option<&str> {
        self.slots
            .get(slot)
            .and_then(|s| s.as_ref())
            .map(|s| s.nickname.as_str())
    }

    /// Replace a session's nickname. Collisions are deliberately not
    /// checked: nicknames are display-only attribution, sessions are keyed
    /// by slot.
    pub fn set_nickname(&mut self, slot: usize, nickname: String) {
        if let Some(session) = self.slots.get_mut(slot).and_then(Option::as_mut) {
            session.nickname = nickname;
        }
    }

    /// Send an event to one session. A write failure is logged and dropped;
    /// the session will be detected as failed on its own next poll.
    pub fn send_to(&mut self, slot: usize, event: &ServerEvent) {
        if let Some(session) = self.slots.get_mut(slot).and_then(Option::as_mut) {
            if let Err(e) = write_frame(&mut session.stream, &event.to_frame()) {
                log::debug!(
                    "dropping failed send to slot {slot} ({}): {e}",
                    session.nickname
                );
            }
        }
    }

    /// Send an event to every occupied slot except `except`, in slot order.
    /// Used for all relay broadcasts — a sender never hears its own message.
    pub fn broadcast(&mut self, event: &ServerEvent, except: Option<usize>) {
        for slot in self.occupied_slots() {
            if Some(slot) == except {
                continue;
            }
            self.send_to(slot, event);
        }
    }

    /// Broadcast chat text attributed to the session in `from`, excluding
    /// that session itself.
    pub fn broadcast_chat_from(&mut self, from: usize, text: &str) {
        let Some(sender) = self.nickname(from).map(str::to_owned) else {
            return;
        };
        let event = ServerEvent::Chat {
            sender,
            text: text.to_owned(),
        };
        self.broadcast(&event, Some(from));
    }
}

#[cfg(test)]
mod tests {
    use std::net::{TcpListener, TcpStream};

    use nullchat_protocol::framing::read_frame;
    use nullchat_protocol::message::ServerEvent;

    use super::*;

    /// Create a TCP pair: (client_stream, server_stream) on localhost.
    fn tcp_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).unwrap();
        let (server, _) = listener.accept().unwrap();
        (client, server)
    }

    fn session(nick: &str, stream: TcpStream) -> Session {
        Session {
            nickname: nick.into(),
            stream,
        }
    }

    /// Read one ServerEvent from the client end of a pair.
    fn recv_event(stream: &mut TcpStream) -> ServerEvent {
        let frame = read_frame(stream).unwrap();
        ServerEvent::from_frame(frame).unwrap().unwrap()
    }

    #[test]
    fn slots_fill_in_order_and_free_on_remove() {
        let mut table = SessionTable::new(2);
        assert_eq!(table.capacity(), 2);
        assert!(table.is_empty());

        let (_c1, s1) = tcp_pair();
        let slot_a = table.free_slot().unwrap();
        assert_eq!(slot_a, 0);
        table.insert(slot_a, session("alice", s1));

        let (_c2, s2) = tcp_pair();
        let slot_b = table.free_slot().unwrap();
        assert_eq!(slot_b, 1);
        table.insert(slot_b, session("bob", s2));

        assert_eq!(table.len(), 2);
        assert_eq!(table.free_slot(), None);
        assert_eq!(table.occupied_slots(), vec![0, 1]);

        // Removing the first slot makes it the next free one again.
        let removed = table.remove(0).unwrap();
        assert_eq!(removed.nickname, "alice");
        assert_eq!(table.free_slot(), Some(0));
        assert_eq!(table.occupied_slots(), vec![1]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn broadcast_skips_the_excluded_slot() {
        let mut table = SessionTable::new(3);
        let (mut c0, s0) = tcp_pair();
        let (mut c1, s1) = tcp_pair();
        let (mut c2, s2) = tcp_pair();
        table.insert(0, session("alice", s0));
        table.insert(1, session("bob", s1));
        table.insert(2, session("carol", s2));

        table.broadcast_chat_from(1, "hi all");

        for client in [&mut c0, &mut c2] {
            let event = recv_event(client);
            assert_eq!(
                event,
                ServerEvent::Chat {
                    sender: "bob".into(),
                    text: "hi all".into()
                }
            );
        }

        // Bob's own stream saw nothing: the next thing he receives must be a
        // different event, delivered after the broadcast.
        table.send_to(1, &ServerEvent::Accepted);
        assert_eq!(recv_event(&mut c1), ServerEvent::Accepted);
    }

    #[test]
    fn send_failure_does_not_disturb_other_slots() {
        let mut table = SessionTable::new(2);
        let (c0, s0) = tcp_pair();
        let (mut c1, s1) = tcp_pair();
        table.insert(0, session("alice", s0));
        table.insert(1, session("bob", s1));

        // Break alice's connection, then broadcast. Bob must still hear it.
        drop(c0);
        table.broadcast_chat_from(0, "still here?");
        // No exclusion for a notice from slot 0's perspective going to bob.
        let event = recv_event(&mut c1);
        assert_eq!(
            event,
            ServerEvent::Chat {
                sender: "alice".into(),
                text: "still here?".into()
            }
        );
        // The broken slot stays occupied until the poll loop tears it down.
        assert!(table.is_occupied(0));
    }

    #[test]
    fn set_nickname_updates_attribution() {
        let mut table = SessionTable::new(2);
        let (_c0, s0) = tcp_pair();
        let (mut c1, s1) = tcp_pair();
        table.insert(0, session("Anonymous", s0));
        table.insert(1, session("bob", s1));

        table.set_nickname(0, "alice".into());
        assert_eq!(table.nickname(0), Some("alice"));

        table.broadcast_chat_from(0, "renamed");
        let event = recv_event(&mut c1);
        assert_eq!(
            event,
            ServerEvent::Chat {
                sender: "alice".into(),
                text: "renamed".into()
            }
        );
    }
}
