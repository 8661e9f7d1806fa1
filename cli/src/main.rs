use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use codeshare::net::api::{ApiError, HttpRoomApi, RoomApi};
use codeshare::net::stomp_client::{StompConfig, StompTransport};
use codeshare::net::transport::Transport;
use codeshare::net::types::NewSnapshot;
use codeshare::state::session::authorize_room;
use codeshare::state::snapshots::Snapshot;
use codeshare::state::storage::{JsonFileRoomStorage, RoomStorage, StorageError};
use codeshare::sync::{EngineStopped, RoomSyncHandle, SyncEvent};
use codeshare::{ConfigError, Notice, RoomSync, SyncConfig};
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

#[cfg(test)]
#[path = "main_test.rs"]
mod main_test;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("room API: {0}")]
    Api(#[from] ApiError),
    #[error("room storage: {0}")]
    Storage(#[from] StorageError),
    #[error("room {0} has not been entered on this device; run `enter` first")]
    NotEntered(String),
    #[error("failed to read input: {0}")]
    Input(#[from] std::io::Error),
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("room did not become ready within {0}s")]
    NotReady(u64),
    #[error("room authorization failed: {0}")]
    Unauthorized(String),
    #[error(transparent)]
    Engine(#[from] EngineStopped),
    #[error("engine task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Parser, Debug)]
#[command(name = "codeshare", about = "Collaborative code room client")]
struct Cli {
    #[arg(long, env = "CODESHARE_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, env = "CODESHARE_WS_URL")]
    ws_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List rooms this device has entered.
    Rooms,
    /// Authorize with a room password and remember the room.
    Enter {
        room: Uuid,
        #[arg(long, env = "CODESHARE_ROOM_PASSWORD")]
        password: String,
    },
    /// Print the room's snapshot list as JSON.
    Snapshots { room: Uuid },
    /// Freeze code from a file (or stdin) as a new snapshot.
    Snapshot(SnapshotArgs),
    /// Follow a room: print notices and live code until Ctrl-C.
    Watch(SessionArgs),
    /// Replace the room's live code with a file (or stdin) and exit.
    Push(PushArgs),
}

#[derive(Args, Debug)]
struct SnapshotArgs {
    room: Uuid,
    #[arg(long)]
    title: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long, help = "Input file path, or - for stdin")]
    file: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SessionArgs {
    room: Uuid,
    #[arg(long, env = "CODESHARE_ROOM_PASSWORD")]
    password: Option<String>,
}

#[derive(Args, Debug)]
struct PushArgs {
    #[command(flatten)]
    session: SessionArgs,
    #[arg(long, help = "Input file path, or - for stdin")]
    file: Option<PathBuf>,
    #[arg(long, default_value_t = 15)]
    wait_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = resolve_config(cli.base_url.as_deref(), cli.ws_url.as_deref())?;

    match cli.command {
        Command::Rooms => run_rooms(&config),
        Command::Enter { room, password } => run_enter(&config, room, &password).await,
        Command::Snapshots { room } => run_snapshots(&config, room).await,
        Command::Snapshot(args) => run_snapshot(&config, args).await,
        Command::Watch(args) => run_watch(&config, args).await,
        Command::Push(args) => run_push(&config, args).await,
    }
}

fn resolve_config(base_url: Option<&str>, ws_url: Option<&str>) -> Result<SyncConfig, CliError> {
    let config = SyncConfig::from_env()?;
    if base_url.is_none() && ws_url.is_none() {
        return Ok(config);
    }
    let base = base_url.map_or_else(|| config.base_url.clone(), ToOwned::to_owned);
    Ok(config.with_endpoints(&base, ws_url)?)
}

fn room_storage(config: &SyncConfig) -> JsonFileRoomStorage {
    JsonFileRoomStorage::new(config.rooms_file.clone())
}

// =============================================================================
// ONE-SHOT COMMANDS
// =============================================================================

fn run_rooms(config: &SyncConfig) -> Result<(), CliError> {
    let rooms = room_storage(config).rooms()?;
    let list: Vec<_> = rooms.values().collect();
    println!("{}", serde_json::to_string_pretty(&list)?);
    Ok(())
}

async fn run_enter(config: &SyncConfig, room: Uuid, password: &str) -> Result<(), CliError> {
    let api = HttpRoomApi::from_config(config)?;
    let grant = authorize_room(&api, &room_storage(config), &room.to_string(), password).await?;
    eprintln!("entered room {} ({})", grant.title, grant.room_id);
    Ok(())
}

async fn run_snapshots(config: &SyncConfig, room: Uuid) -> Result<(), CliError> {
    let api = HttpRoomApi::from_config(config)?;
    let snapshots = api.fetch_snapshots(&room.to_string()).await?;
    let views: Vec<Value> = snapshots.iter().map(snapshot_view).collect();
    print_json(&Value::Array(views))
}

async fn run_snapshot(config: &SyncConfig, args: SnapshotArgs) -> Result<(), CliError> {
    let room = args.room.to_string();
    let stored = room_storage(config)
        .room(&room)?
        .filter(|r| r.is_authorized)
        .ok_or_else(|| CliError::NotEntered(room.clone()))?;
    let code = read_code(args.file.as_deref()).await?;

    let api = HttpRoomApi::from_config(config)?;
    let request = NewSnapshot {
        room_id: stored.room_id,
        title: args.title,
        description: args.description,
        code,
    };
    api.create_snapshot(&room, &request).await?;
    info!(%room, title = %request.title, "snapshot requested");
    Ok(())
}

// =============================================================================
// LIVE COMMANDS
// =============================================================================

struct Engine {
    handle: RoomSyncHandle,
    task: JoinHandle<()>,
    events: UnboundedReceiver<SyncEvent>,
}

fn start_engine(config: &SyncConfig, args: &SessionArgs) -> Result<Engine, CliError> {
    let transport: Arc<dyn Transport> =
        Arc::new(StompTransport::start(StompConfig::from_sync(config)));
    let api: Arc<dyn RoomApi> = Arc::new(HttpRoomApi::from_config(config)?);
    let storage: Arc<dyn RoomStorage> = Arc::new(room_storage(config));
    let (sync, events) = RoomSync::new(config, transport, api, storage);
    let (handle, task) = sync.spawn();

    handle.open_room(&args.room.to_string())?;
    if let Some(password) = &args.password {
        handle.enter_room(password)?;
    }
    Ok(Engine { handle, task, events })
}

async fn run_watch(config: &SyncConfig, args: SessionArgs) -> Result<(), CliError> {
    let mut engine = start_engine(config, &args)?;
    loop {
        tokio::select! {
            event = engine.events.recv() => {
                let Some(event) = event else { break };
                print_event(&event);
            }
            _ = tokio::signal::ctrl_c() => {
                engine.handle.shutdown()?;
                break;
            }
        }
    }
    engine.task.await?;
    Ok(())
}

async fn run_push(config: &SyncConfig, args: PushArgs) -> Result<(), CliError> {
    let code = read_code(args.file.as_deref()).await?;
    let mut engine = start_engine(config, &args.session)?;

    let waited = tokio::time::timeout(
        Duration::from_secs(args.wait_secs),
        wait_until_ready(&mut engine.events),
    )
    .await;
    let outcome = match waited {
        Ok(Ok(())) => {
            engine.handle.edit_code(&code)?;
            Ok(())
        }
        Ok(Err(error)) => Err(error),
        Err(_) => Err(CliError::NotReady(args.wait_secs)),
    };

    engine.handle.shutdown()?;
    engine.task.await?;
    if outcome.is_ok() {
        info!(room = %args.session.room, bytes = code.len(), "code pushed");
    }
    outcome
}

async fn wait_until_ready(events: &mut UnboundedReceiver<SyncEvent>) -> Result<(), CliError> {
    while let Some(event) = events.recv().await {
        print_event(&event);
        match event {
            SyncEvent::Ready(true) => return Ok(()),
            SyncEvent::Notice(Notice::AuthorizationFailed(reason)) => return Err(CliError::Unauthorized(reason)),
            _ => {}
        }
    }
    Err(CliError::Engine(EngineStopped))
}

// =============================================================================
// OUTPUT
// =============================================================================

fn print_event(event: &SyncEvent) {
    match event {
        SyncEvent::Connection(state) => eprintln!("connection: {state:?}"),
        SyncEvent::Ready(ready) => eprintln!("ready: {ready}"),
        SyncEvent::CodeChanged(code) => {
            println!("----- live code -----");
            println!("{code}");
        }
        SyncEvent::SnapshotsChanged { count } => eprintln!("snapshots: {count}"),
        SyncEvent::ModeChanged(mode) => eprintln!("mode: {mode:?}"),
        SyncEvent::Notice(notice) => eprintln!("[{:?}] {notice}", notice.level()),
    }
}

fn snapshot_view(snapshot: &Snapshot) -> Value {
    serde_json::json!({
        "id": snapshot.id,
        "createdAt": snapshot.created_at.format(&Rfc3339).ok(),
        "title": snapshot.title,
        "description": snapshot.description,
        "code": snapshot.code,
        "comments": snapshot.comments,
    })
}

fn print_json(value: &Value) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn read_code(file: Option<&Path>) -> Result<String, CliError> {
    match file {
        Some(path) if path != Path::new("-") => Ok(tokio::fs::read_to_string(path).await?),
        _ => {
            let mut code = String::new();
            tokio::io::stdin().read_to_string(&mut code).await?;
            Ok(code)
        }
    }
}
