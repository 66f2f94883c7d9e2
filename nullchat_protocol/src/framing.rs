// Null-terminated message framing over TCP.
//
// A frame is a 3-byte kind tag followed by a list of UTF-8 arguments, each
// terminated by a null byte, with an empty argument (a lone null) closing
// the list. The framing is self-delimiting — no length prefix, no byte-order
// concerns — at the cost of an O(size) scan for each argument's terminator.
//
// `read_frame` and `write_frame` operate on plain `Read`/`Write`, so the
// same code runs over a blocking `TcpStream` and over a `Cursor` in tests.
// Reads are deliberately unbuffered: the relay and client poll the raw
// socket for readiness between frames, and a buffering reader would hold
// bytes the poll can no longer see.
//
// This module has no knowledge of message semantics. The `MAX_ARG_SIZE` /
// `MAX_ARGS` limits exist purely to bound allocation per call; semantic
// limits (nickname length, message length) belong to the endpoints.

use std::io::{Read, Write};

use crate::error::ProtocolError;
use crate::limits::{MAX_ARG_SIZE, MAX_ARGS};

/// Width of the kind tag in bytes. Not null-terminated.
pub const KIND_SIZE: usize = 3;

/// One decoded wire frame: a raw kind tag and its arguments.
///
/// The codec leaves the tag uninterpreted; `message::Kind` gives the tags
/// meaning one layer up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub kind: [u8; KIND_SIZE],
    pub args: Vec<String>,
}

impl Frame {
    pub fn new(kind: [u8; KIND_SIZE], args: Vec<String>) -> Self {
        Self { kind, args }
    }
}

/// Encode a frame into its wire bytes.
///
/// Fails if the frame carries more than `MAX_ARGS` arguments, if any
/// argument's encoded length (bytes plus terminator) exceeds `MAX_ARG_SIZE`,
/// or if an argument is empty or contains an interior null byte — neither
/// survives this framing.
pub fn encode_frame(frame: &Frame) -> Result<Vec<u8>, ProtocolError> {
    if frame.args.len() > MAX_ARGS {
        return Err(ProtocolError::TooManyArgs {
            count: frame.args.len(),
        });
    }

    let mut out =
        Vec::with_capacity(KIND_SIZE + frame.args.iter().map(|a| a.len() + 1).sum::<usize>() + 1);
    out.extend_from_slice(&frame.kind);

    for arg in &frame.args {
        let bytes = arg.as_bytes();
        if bytes.len() + 1 > MAX_ARG_SIZE {
            return Err(ProtocolError::ArgTooLong { len: bytes.len() });
        }
        if bytes.is_empty() {
            return Err(ProtocolError::EmptyArg);
        }
        if bytes.contains(&0) {
            return Err(ProtocolError::EmbeddedNul);
        }
        out.extend_from_slice(bytes);
        out.push(0);
    }

    // Empty argument terminates the list.
    out.push(0);
    Ok(out)
}

/// Encode a frame and write it as a single contiguous write.
pub fn write_frame<W: Write>(writer: &mut W, frame: &Frame) -> Result<(), ProtocolError> {
    let bytes = encode_frame(frame)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read one frame: 3 kind bytes, then arguments until the empty terminator.
///
/// Fails if the stream closes mid-frame, an argument reaches `MAX_ARG_SIZE`
/// encoded bytes with no null in sight, a ninth non-empty argument arrives,
/// or argument bytes are not valid UTF-8. Once a frame has begun, the read
/// runs to completion or error — it never yields mid-frame.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Frame, ProtocolError> {
    let mut kind = [0u8; KIND_SIZE];
    reader.read_exact(&mut kind)?;

    let mut args = Vec::new();
    loop {
        let mut arg: Vec<u8> = Vec::new();
        loop {
            // Terminator included in the budget: content is capped one byte
            // below MAX_ARG_SIZE.
            if arg.len() + 1 > MAX_ARG_SIZE {
                return Err(ProtocolError::ArgTooLong { len: arg.len() });
            }
            let mut byte = [0u8; 1];
            reader.read_exact(&mut byte)?;
            if byte[0] == 0 {
                break;
            }
            arg.push(byte[0]);
        }

        // The empty argument ends the list.
        if arg.is_empty() {
            break;
        }
        if args.len() == MAX_ARGS {
            return Err(ProtocolError::TooManyArgs {
                count: args.len() + 1,
            });
        }
        args.push(String::from_utf8(arg)?);
    }

    Ok(Frame { kind, args })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn frame(kind: &[u8; 3], args: &[&str]) -> Frame {
        Frame::new(*kind, args.iter().map(|a| (*a).to_string()).collect())
    }

    #[test]
    fn roundtrip_two_args() {
        let original = frame(b"MSG", &["alice", "hello there"]);
        let mut buf = Vec::new();
        write_frame(&mut buf, &original).unwrap();

        let mut cursor = Cursor::new(&buf);
        let recovered = read_frame(&mut cursor).unwrap();
        assert_eq!(recovered, original);
    }

    #[test]
    fn roundtrip_no_args() {
        let original = frame(b"ACC", &[]);
        let mut buf = Vec::new();
        write_frame(&mut buf, &original).unwrap();

        // Just the tag and the list terminator.
        assert_eq!(buf, b"ACC\0");

        let mut cursor = Cursor::new(&buf);
        let recovered = read_frame(&mut cursor).unwrap();
        assert_eq!(recovered, original);
    }

    #[test]
    fn encoded_layout_is_null_separated() {
        let original = frame(b"NIC", &["bob"]);
        let bytes = encode_frame(&original).unwrap();
        assert_eq!(bytes, b"NICbob\0\0");
    }

    #[test]
    fn rejects_oversized_arg_on_encode() {
        // MAX_ARG_SIZE - 1 content bytes still fit (plus terminator).
        let fits = frame(b"MSG", &[&"x".repeat(MAX_ARG_SIZE - 1)]);
        assert!(encode_frame(&fits).is_ok());

        let too_big = frame(b"MSG", &[&"x".repeat(MAX_ARG_SIZE)]);
        let err = encode_frame(&too_big).unwrap_err();
        assert!(matches!(err, ProtocolError::ArgTooLong { .. }));
    }

    #[test]
    fn rejects_oversized_arg_on_decode() {
        // Tag, then MAX_ARG_SIZE bytes with no null anywhere.
        let mut wire = b"MSG".to_vec();
        wire.resize(wire.len() + MAX_ARG_SIZE, b'x');
        let mut cursor = Cursor::new(&wire);
        let err = read_frame(&mut cursor).unwrap_err();
        assert!(matches!(err, ProtocolError::ArgTooLong { .. }));
    }

    #[test]
    fn rejects_too_many_args_on_encode() {
        let args: Vec<&str> = vec!["a"; MAX_ARGS + 1];
        let overfull = frame(b"MSG", &args);
        let err = encode_frame(&overfull).unwrap_err();
        assert!(matches!(err, ProtocolError::TooManyArgs { .. }));
    }

    #[test]
    fn max_args_roundtrips_but_one_more_fails_decode() {
        // Exactly MAX_ARGS arguments plus the terminator is a legal frame.
        let args: Vec<&str> = vec!["a"; MAX_ARGS];
        let full = frame(b"MSG", &args);
        let bytes = encode_frame(&full).unwrap();
        let recovered = read_frame(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(recovered, full);

        // A ninth argument on the wire is rejected before the terminator.
        let mut wire = b"MSG".to_vec();
        for _ in 0..=MAX_ARGS {
            wire.extend_from_slice(b"a\0");
        }
        wire.push(0);
        let err = read_frame(&mut Cursor::new(&wire)).unwrap_err();
        assert!(matches!(err, ProtocolError::TooManyArgs { .. }));
    }

    #[test]
    fn rejects_empty_and_nul_bearing_args_on_encode() {
        let empty = frame(b"MSG", &[""]);
        assert!(matches!(
            encode_frame(&empty).unwrap_err(),
            ProtocolError::EmptyArg
        ));

        let embedded = frame(b"MSG", &["he\0llo"]);
        assert!(matches!(
            encode_frame(&embedded).unwrap_err(),
            ProtocolError::EmbeddedNul
        ));
    }

    #[test]
    fn eof_mid_frame_is_an_error() {
        // Tag plus a half-finished argument, no terminator.
        let wire = b"MSGhal".to_vec();
        let mut cursor = Cursor::new(&wire);
        let err = read_frame(&mut cursor).unwrap_err();
        match err {
            ProtocolError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof),
            other => panic!("expected Io, got {other:?}"),
        }
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        let wire = b"MSG\xff\xfe\0\0".to_vec();
        let mut cursor = Cursor::new(&wire);
        let err = read_frame(&mut cursor).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidUtf8(_)));
    }

    #[test]
    fn multiple_frames_in_sequence() {
        let frames = vec![
            frame(b"ACC", &[]),
            frame(b"NIC", &["Anonymous"]),
            frame(b"MSG", &["Anonymous", "Connected"]),
        ];
        let mut wire = Vec::new();
        for f in &frames {
            write_frame(&mut wire, f).unwrap();
        }

        let mut cursor = Cursor::new(&wire);
        for expected in &frames {
            let recovered = read_frame(&mut cursor).unwrap();
            assert_eq!(&recovered, expected);
        }
    }
}
