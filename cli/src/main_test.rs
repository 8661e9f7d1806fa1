use super::*;
use time::OffsetDateTime;

#[test]
fn push_parses_session_and_defaults() {
    let cli = Cli::try_parse_from([
        "codeshare",
        "push",
        "6f1c2d9e-8a4b-4c1d-9e2f-3a4b5c6d7e8f",
        "--password",
        "pw",
        "--file",
        "main.py",
    ])
    .expect("parse");

    let args = match cli.command {
        Command::Push(args) => args,
        other => panic!("expected push, got {other:?}"),
    };
    assert_eq!(args.session.room.to_string(), "6f1c2d9e-8a4b-4c1d-9e2f-3a4b5c6d7e8f");
    assert_eq!(args.session.password.as_deref(), Some("pw"));
    assert_eq!(args.file.as_deref(), Some(Path::new("main.py")));
    assert_eq!(args.wait_secs, 15);
}

#[test]
fn room_argument_must_be_a_uuid() {
    let err = Cli::try_parse_from(["codeshare", "snapshots", "room-42"]).expect_err("invalid uuid");
    assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
}

#[test]
fn snapshot_requires_title() {
    let err = Cli::try_parse_from(["codeshare", "snapshot", "6f1c2d9e-8a4b-4c1d-9e2f-3a4b5c6d7e8f"])
        .expect_err("missing title");
    assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
}

#[test]
fn snapshot_view_formats_timestamp() {
    let snapshot = Snapshot {
        id: "s-1".to_owned(),
        created_at: OffsetDateTime::UNIX_EPOCH,
        title: "first".to_owned(),
        description: String::new(),
        code: "print(1)".to_owned(),
        comments: Vec::new(),
    };
    let view = snapshot_view(&snapshot);
    assert_eq!(view["id"], "s-1");
    assert_eq!(view["createdAt"], "1970-01-01T00:00:00Z");
    assert_eq!(view["code"], "print(1)");
    assert_eq!(view["comments"], serde_json::json!([]));
}
