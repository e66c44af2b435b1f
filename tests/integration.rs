//! Integration tests for hybridwire.
//!
//! These tests verify the integration between the codec, the parser, the
//! stream decoder and the session models.

use hybridwire::codec::{ControlPayload, ErrorReport, FileTransferEnd, FileTransferStart, Handshake};
use hybridwire::protocol::{
    create_message, deserialize, flags, parse, BaseHeader, ErrorCode, FrameCodec, MessageType,
    ParseResult,
};
use hybridwire::session::{initialize_file_transfer, CounterSessionIds, ManualClock, SessionFactory};
use hybridwire::{Decoded, ProtocolError, StreamDecoder};
use proptest::prelude::*;

fn http_frame(request: &[u8]) -> Vec<u8> {
    let mut bytes = BaseHeader::new(flags::HTTP_MODE, 8).encode().to_vec();
    bytes.extend_from_slice(request);
    bytes
}

/// HTTP-mode frame carrying a request line.
#[test]
fn test_http_scenario() {
    let frame = http_frame(b"GET / HTTP/1.1\r\n\r\n");
    match parse(&frame) {
        ParseResult::Http { data } => assert_eq!(&data[..], b"GET / HTTP/1.1\r\n\r\n"),
        other => panic!("expected HTTP, got {other:?}"),
    }
}

/// create -> serialize -> deserialize keeps every field.
#[test]
fn test_message_scenario() {
    let msg = create_message(MessageType::Message, 42, &b"hi"[..], flags::BINARY_MODE).unwrap();
    let decoded = deserialize(&msg.serialize()).unwrap();

    assert_eq!(decoded.session_id(), Some(42));
    assert_eq!(decoded.msg_type(), Some(MessageType::Message));
    assert_eq!(decoded.flags(), flags::BINARY_MODE);
    assert_eq!(decoded.payload(), b"hi");
}

#[test]
fn test_five_bytes_need_base_header() {
    assert_eq!(parse(b"HWP\0\x01"), ParseResult::NeedMore { required: 8 });
}

/// Any prefix shorter than a reported `required` is also incomplete.
#[test]
fn test_incomplete_input_monotonic() {
    let frames = [
        create_message(
            MessageType::FileTransferData,
            7,
            vec![1u8; 100],
            flags::BINARY_MODE,
        )
        .unwrap()
        .serialize()
        .to_vec(),
        http_frame(b"POST /upload HTTP/1.1\r\nContent-Length: 0\r\n\r\n"),
    ];

    for frame in &frames {
        for k in 0..frame.len() {
            if let ParseResult::NeedMore { required } = parse(&frame[..k]) {
                assert!(required > k);
                for shorter in 0..k.min(required) {
                    assert!(
                        parse(&frame[..shorter]).is_need_more(),
                        "prefix {shorter} of a NeedMore({required}) buffer was not NeedMore"
                    );
                }
            }
        }
        assert!(parse(frame).is_complete());
    }
}

fn message_type() -> impl Strategy<Value = MessageType> {
    proptest::sample::select(vec![
        MessageType::Handshake,
        MessageType::SessionInit,
        MessageType::SessionAck,
        MessageType::FileTransferStart,
        MessageType::FileTransferData,
        MessageType::FileTransferEnd,
        MessageType::Message,
        MessageType::Error,
    ])
}

proptest! {
    /// deserialize(serialize(m)) == m, and the parser agrees on the same bytes.
    #[test]
    fn test_binary_roundtrip_any_message(
        msg_type in message_type(),
        session_id in any::<u64>(),
        extra_flags in 0u8..8,
        payload in proptest::collection::vec(any::<u8>(), 0..512),
    ) {
        let flags = flags::BINARY_MODE | (extra_flags << 2);
        let msg = create_message(msg_type, session_id, payload.clone(), flags).unwrap();
        let bytes = msg.serialize();

        let decoded = deserialize(&bytes).unwrap();
        prop_assert_eq!(&decoded, &msg);
        prop_assert_eq!(decoded.msg_type(), Some(msg_type));
        prop_assert_eq!(decoded.session_id(), Some(session_id));
        prop_assert_eq!(decoded.flags(), flags);
        prop_assert_eq!(decoded.payload(), &payload[..]);

        match parse(&bytes) {
            ParseResult::Binary { message } => prop_assert_eq!(message, msg),
            other => prop_assert!(false, "expected binary frame, got {:?}", other),
        }
    }

    /// Every strict prefix of a binary frame is incomplete, never an error.
    #[test]
    fn test_binary_prefixes_need_more(
        session_id in any::<u64>(),
        payload in proptest::collection::vec(any::<u8>(), 0..64),
        cut in any::<prop::sample::Index>(),
    ) {
        let bytes = create_message(MessageType::Message, session_id, payload, flags::BINARY_MODE)
            .unwrap()
            .serialize();
        let k = cut.index(bytes.len());
        match parse(&bytes[..k]) {
            ParseResult::NeedMore { required } => prop_assert!(required > k),
            other => prop_assert!(false, "prefix {} gave {:?}", k, other),
        }
    }
}

#[test]
fn test_classification_is_idempotent() {
    let buffers = [
        http_frame(b"GET / HTTP/1.1\r\n\r\n"),
        create_message(MessageType::SessionInit, 3, &b"x"[..], flags::BINARY_MODE)
            .unwrap()
            .serialize()
            .to_vec(),
        b"HWP".to_vec(),
        b"not a frame at all".to_vec(),
    ];

    for buffer in &buffers {
        assert_eq!(parse(buffer), parse(buffer));
    }
}

#[test]
fn test_mode_flags_both_or_neither_rejected() {
    for bad in [0x00u8, 0x03] {
        let mut frame = create_message(MessageType::Message, 1, &b"x"[..], flags::BINARY_MODE)
            .unwrap()
            .serialize()
            .to_vec();
        frame[5] = bad;
        assert_eq!(
            parse(&frame),
            ParseResult::Error {
                reason: ProtocolError::ConflictingOrMissingModeFlags(bad)
            }
        );
    }
}

/// A client handshake, a chunked file transfer and an error report, all
/// concatenated and delivered in awkward chunks.
#[test]
fn test_session_and_file_transfer_over_stream() {
    let codec = FrameCodec::new();
    let sessions = SessionFactory::new(CounterSessionIds::starting_at(500), ManualClock::new(0));

    let mut wire = Vec::new();
    wire.extend(Handshake::new("client-a").to_message(&codec, 0).unwrap().serialize());

    let session = sessions.create("client-a");
    let mut sender = initialize_file_transfer("a.bin", 200_000);
    wire.extend(
        FileTransferStart::from(&sender)
            .to_message(&codec, session.session_id)
            .unwrap()
            .serialize(),
    );
    while !sender.is_complete {
        let len = sender.next_chunk_len();
        let chunk = vec![0x5A; len as usize];
        wire.extend(
            codec
                .create_message(
                    MessageType::FileTransferData,
                    session.session_id,
                    chunk,
                    flags::BINARY_MODE,
                )
                .unwrap()
                .serialize(),
        );
        sender.apply_chunk(len).unwrap();
    }
    wire.extend(
        FileTransferEnd::from(&sender)
            .to_message(&codec, session.session_id)
            .unwrap()
            .serialize(),
    );

    let mut decoder = StreamDecoder::new();
    let mut messages = Vec::new();
    for chunk in wire.chunks(7_001) {
        for item in decoder.push(chunk).unwrap() {
            match item {
                Decoded::Binary(msg) => messages.push(msg),
                Decoded::Http(_) => panic!("unexpected HTTP data"),
            }
        }
    }
    assert!(decoder.is_empty());

    // handshake + start + 4 data chunks + end
    assert_eq!(messages.len(), 7);
    assert_eq!(Handshake::from_message(&messages[0]).unwrap().client_id, "client-a");

    let mut receiver = FileTransferStart::from_message(&messages[1]).unwrap().into_state();
    for msg in &messages[2..6] {
        assert_eq!(msg.msg_type(), Some(MessageType::FileTransferData));
        assert_eq!(msg.session_id(), Some(500));
        assert!(!receiver.is_complete);
        receiver.apply_chunk(msg.payload_len() as u64).unwrap();
    }
    assert!(receiver.is_complete);
    assert_eq!(receiver.bytes_transferred, 200_000);

    let end = FileTransferEnd::from_message(&messages[6]).unwrap();
    assert_eq!(end.bytes_transferred, 200_000);
}

#[test]
fn test_error_report_for_rejected_frame() {
    let mut decoder = StreamDecoder::new();
    let err = decoder.push(b"HWQ\0\x01\x02\x00\x17").unwrap_err();
    assert_eq!(err, ProtocolError::BadMagic);

    let reply = ErrorReport::from(&err)
        .to_message(&FrameCodec::new(), 0)
        .unwrap()
        .serialize();
    match parse(&reply) {
        ParseResult::Binary { message } => {
            let report = ErrorReport::from_message(&message).unwrap();
            assert_eq!(report.code, ErrorCode::InvalidProtocol);
            assert!(report.detail.contains("magic"));
        }
        other => panic!("expected binary reply, got {other:?}"),
    }
}

/// Independent connections decoded concurrently on separate tasks.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_connections() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let mut handles = Vec::new();
    for conn in 0..8u64 {
        let (mut client, mut server) = tokio::io::duplex(64);

        let writer = tokio::spawn(async move {
            for seq in 0..20u64 {
                let payload = format!("conn {conn} seq {seq}").into_bytes();
                let frame = create_message(MessageType::Message, conn, payload, flags::BINARY_MODE)
                    .unwrap()
                    .serialize();
                client.write_all(&frame).await.unwrap();
            }
            client.shutdown().await.unwrap();
        });

        let reader = tokio::spawn(async move {
            let mut decoder = StreamDecoder::new();
            let mut received = Vec::new();
            let mut buf = [0u8; 13];
            loop {
                let n = server.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                for item in decoder.push(&buf[..n]).unwrap() {
                    if let Decoded::Binary(msg) = item {
                        assert_eq!(msg.session_id(), Some(conn));
                        received.push(String::from_utf8(msg.payload().to_vec()).unwrap());
                    }
                }
            }
            assert!(decoder.is_empty());
            received
        });

        handles.push((conn, writer, reader));
    }

    for (conn, writer, reader) in handles {
        writer.await.unwrap();
        let received = reader.await.unwrap();
        let expected: Vec<String> = (0..20).map(|seq| format!("conn {conn} seq {seq}")).collect();
        assert_eq!(received, expected);
    }
}
