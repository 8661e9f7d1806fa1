use super::*;

fn sample_message() -> Frame {
    Frame::new(Command::Message)
        .header("subscription", "sub-0")
        .header("destination", "/topic/room/42/code")
        .header("message-id", "m-1")
        .with_body(r#"{"eventType":"UPDATE","code":"x=1"}"#)
}

// =============================================================================
// Command
// =============================================================================

#[test]
fn command_wire_spelling_round_trips() {
    for command in [
        Command::Connect,
        Command::Connected,
        Command::Send,
        Command::Subscribe,
        Command::Unsubscribe,
        Command::Disconnect,
        Command::Message,
        Command::Receipt,
        Command::Error,
    ] {
        assert_eq!(Command::parse(command.as_str()).expect("command"), command);
    }
}

#[test]
fn command_parse_rejects_lowercase() {
    let err = Command::parse("send").expect_err("lowercase should fail");
    assert_eq!(err, CodecError::UnknownCommand("send".to_owned()));
}

#[test]
fn command_serializes_as_uppercase_json() {
    assert_eq!(serde_json::to_string(&Command::Message).expect("serialize"), "\"MESSAGE\"");
}

// =============================================================================
// encode / decode
// =============================================================================

#[test]
fn encode_decode_round_trip_preserves_frame() {
    let frame = sample_message();
    let text = encode_frame(&frame);
    let decoded = decode_frame(&text).expect("decode").expect("frame");

    assert_eq!(decoded.command, Command::Message);
    assert_eq!(decoded.get_header("subscription"), Some("sub-0"));
    assert_eq!(decoded.body, frame.body);
}

#[test]
fn encode_appends_content_length_and_nul() {
    let text = encode_frame(&Frame::send_json("/app/update.code", "{}"));
    assert!(text.starts_with("SEND\n"));
    assert!(text.contains("content-length:2\n"));
    assert!(text.ends_with("\n\n{}\0"));
}

#[test]
fn encode_skips_content_length_for_empty_body() {
    let text = encode_frame(&Frame::unsubscribe("sub-3"));
    assert_eq!(text, "UNSUBSCRIBE\nid:sub-3\n\n\0");
}

#[test]
fn encode_escapes_header_values_except_for_connect() {
    let send = Frame::new(Command::Send).header("note", "a:b\nc");
    assert!(encode_frame(&send).contains("note:a\\cb\\nc\n"));

    let connect = Frame::new(Command::Connect).header("host", "localhost:8080");
    assert!(encode_frame(&connect).contains("host:localhost:8080\n"));
}

#[test]
fn decode_unescapes_header_values() {
    let frame = decode_frame("MESSAGE\nnote:a\\cb\\\\c\n\nbody\0")
        .expect("decode")
        .expect("frame");
    assert_eq!(frame.get_header("note"), Some("a:b\\c"));
}

#[test]
fn decode_rejects_undefined_escape() {
    let err = decode_frame("MESSAGE\nnote:a\\tb\n\n\0").expect_err("escape should fail");
    assert_eq!(err, CodecError::InvalidEscape('t'));
}

#[test]
fn decode_heart_beat_returns_none() {
    assert_eq!(decode_frame("\n").expect("decode"), None);
    assert_eq!(decode_frame("\r\n").expect("decode"), None);
}

#[test]
fn decode_skips_leading_heart_beats() {
    let frame = decode_frame("\n\nCONNECTED\nversion:1.2\nheart-beat:0,0\n\n\0")
        .expect("decode")
        .expect("frame");
    assert_eq!(frame.command, Command::Connected);
    assert_eq!(frame.get_header("version"), Some("1.2"));
}

#[test]
fn decode_accepts_crlf_line_endings() {
    let frame = decode_frame("RECEIPT\r\nreceipt-id:77\r\n\r\n\0")
        .expect("decode")
        .expect("frame");
    assert_eq!(frame.command, Command::Receipt);
    assert_eq!(frame.get_header("receipt-id"), Some("77"));
}

#[test]
fn decode_honours_content_length_with_embedded_nul() {
    let frame = decode_frame("MESSAGE\ncontent-length:3\n\na\0b\0")
        .expect("decode")
        .expect("frame");
    assert_eq!(frame.body, "a\0b");
}

#[test]
fn decode_rejects_content_length_past_payload() {
    let err = decode_frame("MESSAGE\ncontent-length:99\n\nabc\0").expect_err("length should fail");
    assert!(matches!(err, CodecError::InvalidContentLength(_)));
}

#[test]
fn decode_rejects_header_without_separator() {
    let err = decode_frame("MESSAGE\nbroken\n\n\0").expect_err("header should fail");
    assert_eq!(err, CodecError::MalformedHeader("broken".to_owned()));
}

#[test]
fn decode_rejects_truncated_frame() {
    let err = decode_frame("MESSAGE\ndestination:/x").expect_err("truncated");
    assert_eq!(err, CodecError::Truncated);
}

#[test]
fn first_repeated_header_wins() {
    let frame = decode_frame("MESSAGE\nfoo:1\nfoo:2\n\n\0")
        .expect("decode")
        .expect("frame");
    assert_eq!(frame.get_header("foo"), Some("1"));
}

// =============================================================================
// Frame builders
// =============================================================================

#[test]
fn connect_frame_carries_heart_beat_and_host() {
    let frame = Frame::connect("example.test", HeartBeat::new(10_000, 10_000));
    assert_eq!(frame.command, Command::Connect);
    assert_eq!(frame.get_header("heart-beat"), Some("10000,10000"));
    assert_eq!(frame.get_header("host"), Some("example.test"));
    assert!(frame.get_header("accept-version").is_some_and(|v| v.contains("1.2")));
}

#[test]
fn subscribe_frame_sets_id_and_destination() {
    let frame = Frame::subscribe("sub-1", "/topic/room/abc/votes");
    assert_eq!(frame.get_header("id"), Some("sub-1"));
    assert_eq!(frame.get_header("destination"), Some("/topic/room/abc/votes"));
}

// =============================================================================
// Heart-beat
// =============================================================================

#[test]
fn heart_beat_parse_and_display() {
    let hb = HeartBeat::parse("10000, 5000").expect("heart-beat");
    assert_eq!(hb, HeartBeat::new(10_000, 5_000));
    assert_eq!(hb.to_string(), "10000,5000");
}

#[test]
fn heart_beat_parse_rejects_garbage() {
    assert!(HeartBeat::parse("10000").is_err());
    assert!(HeartBeat::parse("a,b").is_err());
}

#[test]
fn negotiate_uses_larger_interval_per_direction() {
    let negotiated = negotiate_heart_beat(HeartBeat::new(10_000, 10_000), HeartBeat::new(20_000, 4_000));
    assert_eq!(negotiated.send_every, Some(Duration::from_millis(10_000)));
    assert_eq!(negotiated.expect_every, Some(Duration::from_millis(20_000)));
}

#[test]
fn negotiate_disables_direction_when_either_side_offers_zero() {
    let negotiated = negotiate_heart_beat(HeartBeat::new(10_000, 10_000), HeartBeat::new(0, 0));
    assert_eq!(negotiated, NegotiatedHeartBeat::default());

    let negotiated = negotiate_heart_beat(HeartBeat::new(0, 10_000), HeartBeat::new(10_000, 10_000));
    assert_eq!(negotiated.send_every, None);
    assert_eq!(negotiated.expect_every, Some(Duration::from_millis(10_000)));
}
