// Protocol messages for client-relay communication.
//
// Two enums define the full protocol vocabulary:
// - `ClientRequest`: sent by a chat client to the relay.
// - `ServerEvent`: sent by the relay to chat clients.
//
// Both directions share the `Kind` tag enumeration but differ in payload
// shape — a chat frame carries one argument outbound (the text) and two
// inbound (sender nickname, text). The `from_frame` conversions enforce the
// per-direction argument counts; a mismatch is a `ProtocolError::ArgCount`
// and fatal for the connection that saw it.
//
// Unrecognized tags decode structurally (the framing layer consumes the
// whole frame) but convert to `None`: both relay and client ignore them and
// keep the connection. A known tag arriving in the wrong direction — `ACC`
// from a client, say — is treated the same way.

use std::fmt;

use crate::error::ProtocolError;
use crate::framing::{Frame, KIND_SIZE};

/// The closed set of 3-byte kind tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Handshake accepted (server → client, no arguments).
    Accepted,
    /// Handshake refused, relay at capacity (server → client, no arguments).
    Refused,
    /// Chat text (client → server: \[text\]; server → client: \[sender, text\]).
    Chat,
    /// Nickname change request or confirmation (one argument both ways).
    Nick,
}

impl Kind {
    /// The raw tag bytes as they appear on the wire.
    pub const fn tag(self) -> [u8; KIND_SIZE] {
        match self {
            Kind::Accepted => *b"ACC",
            Kind::Refused => *b"REF",
            Kind::Chat => *b"MSG",
            Kind::Nick => *b"NIC",
        }
    }

    /// Map raw tag bytes back to a kind. `None` for anything outside the
    /// closed set.
    pub fn from_tag(tag: [u8; KIND_SIZE]) -> Option<Self> {
        match &tag {
            b"ACC" => Some(Kind::Accepted),
            b"REF" => Some(Kind::Refused),
            b"MSG" => Some(Kind::Chat),
            b"NIC" => Some(Kind::Nick),
            _ => None,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Kind::Accepted => "ACC",
            Kind::Refused => "REF",
            Kind::Chat => "MSG",
            Kind::Nick => "NIC",
        })
    }
}

/// Messages a client sends to the relay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientRequest {
    /// Say something to everyone else.
    Chat { text: String },
    /// Ask for a new nickname. The relay answers with the nickname it
    /// actually stored, so it may normalize or filter.
    NickChange { nick: String },
}

impl ClientRequest {
    pub fn kind(&self) -> Kind {
        match self {
            ClientRequest::Chat { .. } => Kind::Chat,
            ClientRequest::NickChange { .. } => Kind::Nick,
        }
    }

    pub fn to_frame(&self) -> Frame {
        match self {
            ClientRequest::Chat { text } => Frame::new(Kind::Chat.tag(), vec![text.clone()]),
            ClientRequest::NickChange { nick } => Frame::new(Kind::Nick.tag(), vec![nick.clone()]),
        }
    }

    /// Interpret a decoded frame as a client request. `Ok(None)` means the
    /// tag is unknown (or not valid client → server) and should be ignored.
    pub fn from_frame(frame: Frame) -> Result<Option<Self>, ProtocolError> {
        let Some(kind) = Kind::from_tag(frame.kind) else {
            return Ok(None);
        };
        match kind {
            Kind::Chat => {
                let [text] = expect_args(kind, frame.args)?;
                Ok(Some(ClientRequest::Chat { text }))
            }
            Kind::Nick => {
                let [nick] = expect_args(kind, frame.args)?;
                Ok(Some(ClientRequest::NickChange { nick }))
            }
            // Server-to-client kinds are not requests; ignore like unknown.
            Kind::Accepted | Kind::Refused => Ok(None),
        }
    }
}

/// Messages the relay sends to clients.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServerEvent {
    /// Handshake succeeded; the session holds a slot.
    Accepted,
    /// Handshake failed; the relay is at capacity.
    Refused,
    /// Chat text from another session (or a relay notice attributed to one).
    Chat { sender: String, text: String },
    /// The nickname the relay now has on file for this session.
    NickChange { nick: String },
}

impl ServerEvent {
    pub fn kind(&self) -> Kind {
        match self {
            ServerEvent::Accepted => Kind::Accepted,
            ServerEvent::Refused => Kind::Refused,
            ServerEvent::Chat { .. } => Kind::Chat,
            ServerEvent::NickChange { .. } => Kind::Nick,
        }
    }

    pub fn to_frame(&self) -> Frame {
        match self {
            ServerEvent::Accepted => Frame::new(Kind::Accepted.tag(), Vec::new()),
            ServerEvent::Refused => Frame::new(Kind::Refused.tag(), Vec::new()),
            ServerEvent::Chat { sender, text } => {
                Frame::new(Kind::Chat.tag(), vec![sender.clone(), text.clone()])
            }
            ServerEvent::NickChange { nick } => Frame::new(Kind::Nick.tag(), vec![nick.clone()]),
        }
    }

    /// Interpret a decoded frame as a server event. `Ok(None)` means the tag
    /// is unknown and should be ignored. Ownership of the argument strings
    /// moves into the returned event.
    pub fn from_frame(frame: Frame) -> Result<Option<Self>, ProtocolError> {
        let Some(kind) = Kind::from_tag(frame.kind) else {
            return Ok(None);
        };
        match kind {
            Kind::Accepted => {
                let [] = expect_args(kind, frame.args)?;
                Ok(Some(ServerEvent::Accepted))
            }
            Kind::Refused => {
                let [] = expect_args(kind, frame.args)?;
                Ok(Some(ServerEvent::Refused))
            }
            Kind::Chat => {
                let [sender, text] = expect_args(kind, frame.args)?;
                Ok(Some(ServerEvent::Chat { sender, text }))
            }
            Kind::Nick => {
                let [nick] = expect_args(kind, frame.args)?;
                Ok(Some(ServerEvent::NickChange { nick }))
            }
        }
    }
}

/// Check the argument count for a kind and take ownership of the arguments.
fn expect_args<const N: usize>(
    kind: Kind,
    args: Vec<String>,
) -> Result<[String; N], ProtocolError> {
    let got = args.len();
    args.try_into().map_err(|_| ProtocolError::ArgCount {
        kind,
        expected: N,
        got,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_a_closed_bijection() {
        for kind in [Kind::Accepted, Kind::Refused, Kind::Chat, Kind::Nick] {
            assert_eq!(Kind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(Kind::from_tag(*b"XYZ"), None);
        assert_eq!(Kind::from_tag(*b"msg"), None); // tags are case-sensitive
    }

    #[test]
    fn chat_arity_differs_by_direction() {
        // One argument client → server.
        let outbound = ClientRequest::Chat {
            text: "hello".into(),
        };
        assert_eq!(outbound.to_frame().args.len(), 1);

        // Two arguments server → client.
        let inbound = Frame::new(Kind::Chat.tag(), vec!["alice".into(), "hello".into()]);
        let event = ServerEvent::from_frame(inbound).unwrap().unwrap();
        assert_eq!(
            event,
            ServerEvent::Chat {
                sender: "alice".into(),
                text: "hello".into()
            }
        );
    }

    #[test]
    fn wrong_arity_is_a_protocol_error() {
        // A one-argument MSG is invalid server → client.
        let frame = Frame::new(Kind::Chat.tag(), vec!["hello".into()]);
        let err = ServerEvent::from_frame(frame).unwrap_err();
        match err {
            ProtocolError::ArgCount {
                kind,
                expected,
                got,
            } => {
                assert_eq!(kind, Kind::Chat);
                assert_eq!(expected, 2);
                assert_eq!(got, 1);
            }
            other => panic!("expected ArgCount, got {other:?}"),
        }

        // ACC must carry no arguments.
        let frame = Frame::new(Kind::Accepted.tag(), vec!["spurious".into()]);
        assert!(matches!(
            ServerEvent::from_frame(frame).unwrap_err(),
            ProtocolError::ArgCount { .. }
        ));
    }

    #[test]
    fn unknown_tags_are_ignored_both_ways() {
        let frame = Frame::new(*b"PNG", vec!["whatever".into()]);
        assert_eq!(ServerEvent::from_frame(frame.clone()).unwrap(), None);
        assert_eq!(ClientRequest::from_frame(frame).unwrap(), None);
    }

    #[test]
    fn server_only_kinds_are_not_requests() {
        let frame = Frame::new(Kind::Accepted.tag(), Vec::new());
        assert_eq!(ClientRequest::from_frame(frame).unwrap(), None);
        let frame = Frame::new(Kind::Refused.tag(), Vec::new());
        assert_eq!(ClientRequest::from_frame(frame).unwrap(), None);
    }
}
