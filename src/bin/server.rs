use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use maze_chase_server::config::SimulationConfig;
use maze_chase_server::engine::{GameEngine, GameEngineOptions};
use maze_chase_server::maps::{builtin_maps, load_maps, pick_map, MapDefinition};
use maze_chase_server::server_protocol::{parse_client_message, ParsedClientMessage, ServerMessage};
use maze_chase_server::server_utils::{parse_port, resolve_map_index, resolve_seed};
use serde_json::json;
use tokio::sync::{mpsc, Mutex};
use tower_http::services::{ServeDir, ServeFile};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

type SharedState = Arc<Mutex<ServerState>>;

#[derive(Clone)]
struct ClientContext {
    tx: mpsc::Sender<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum QueuePolicy {
    DropOnFull,
    DisconnectOnFull,
}

struct ServerState {
    clients: HashMap<String, ClientContext>,
    game: Option<GameEngine>,
    maps: Vec<MapDefinition>,
    config: SimulationConfig,
    rounds_started: usize,
}

impl ServerState {
    fn new(maps: Vec<MapDefinition>, config: SimulationConfig) -> Self {
        Self {
            clients: HashMap::new(),
            game: None,
            maps,
            config,
            rounds_started: 0,
        }
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let port = parse_port(std::env::var("PORT").ok().as_deref());
    let maps = std::env::var("MAPS_FILE")
        .ok()
        .map(PathBuf::from)
        .map_or_else(builtin_maps, |path| load_maps_or_builtin(&path));
    let config = std::env::var("GAME_CONFIG")
        .ok()
        .map(PathBuf::from)
        .map_or_else(SimulationConfig::default, |path| load_config_or_default(&path))
        .sanitized();
    let tick_ms = config.tick_ms;

    let state = Arc::new(Mutex::new(ServerState::new(maps, config)));
    start_tick_loop(state.clone(), tick_ms);

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/ws", get(ws_handler))
        .with_state(state);

    let app = if let Some(static_dir) = resolve_static_dir() {
        let index_file = static_dir.join("index.html");
        info!(root = %static_dir.to_string_lossy(), "serving static files");
        app.fallback_service(
            ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)),
        )
    } else {
        warn!("static file root not found, serving the websocket api only");
        app
    };

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(port, "listening");
    axum::serve(listener, app).await
}

fn load_maps_or_builtin(path: &Path) -> Vec<MapDefinition> {
    match load_maps(path) {
        Ok(maps) if !maps.is_empty() => maps,
        Ok(_) => {
            warn!(path = %path.display(), "map file is empty, using built-in maps");
            builtin_maps()
        }
        Err(err) => {
            warn!(path = %path.display(), %err, "map file rejected, using built-in maps");
            builtin_maps()
        }
    }
}

fn load_config_or_default(path: &Path) -> SimulationConfig {
    SimulationConfig::load(path).unwrap_or_else(|err| {
        warn!(path = %path.display(), %err, "config rejected, using defaults");
        SimulationConfig::default()
    })
}

fn resolve_static_dir() -> Option<PathBuf> {
    if let Ok(raw) = std::env::var("STATIC_DIR") {
        let path = PathBuf::from(raw);
        if path.join("index.html").is_file() {
            return Some(path);
        }
    }

    let candidates = [PathBuf::from("dist/client"), PathBuf::from("static")];
    candidates
        .into_iter()
        .find(|path| path.join("index.html").is_file())
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: SharedState, socket: WebSocket) {
    let client_id = make_id("client");
    let (tx, mut rx) = mpsc::channel::<String>(256);

    {
        let mut guard = state.lock().await;
        guard
            .clients
            .insert(client_id.clone(), ClientContext { tx: tx.clone() });
        send_welcome(&mut guard, &client_id);
    }
    info!(client = %client_id, "client connected");

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if ws_sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(received) = ws_receiver.next().await {
        let Ok(message) = received else {
            break;
        };

        match message {
            Message::Text(raw) => {
                handle_client_message(state.clone(), &client_id, raw.to_string()).await;
            }
            Message::Binary(raw) => {
                if let Ok(text) = String::from_utf8(raw.to_vec()) {
                    handle_client_message(state.clone(), &client_id, text).await;
                } else {
                    send_error_to_client(&state, &client_id, "invalid utf8 message").await;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    state.lock().await.clients.remove(&client_id);
    info!(client = %client_id, "client disconnected");
    drop(tx);
    let _ = writer.await;
}

async fn handle_client_message(state: SharedState, client_id: &str, raw: String) {
    let Some(message) = parse_client_message(&raw) else {
        send_error_to_client(&state, client_id, "invalid message").await;
        return;
    };

    let mut guard = state.lock().await;
    match message {
        ParsedClientMessage::Start { map, seed } => {
            if guard.game.as_ref().is_some_and(|game| !game.is_ended()) {
                send_to_client(
                    &mut guard,
                    client_id,
                    &ServerMessage::Error {
                        message: "round already running".to_string(),
                    },
                    QueuePolicy::DisconnectOnFull,
                );
                return;
            }
            start_round(&mut guard, map, seed);
        }
        ParsedClientMessage::Input { dir } => {
            if let Some(game) = guard.game.as_mut() {
                game.receive_input(dir);
            }
        }
        ParsedClientMessage::Ping { t } => {
            send_to_client(
                &mut guard,
                client_id,
                &ServerMessage::Pong { t },
                QueuePolicy::DisconnectOnFull,
            );
        }
    }
}

fn start_round(state: &mut ServerState, requested_map: Option<usize>, seed: Option<u64>) {
    let index = resolve_map_index(requested_map, state.rounds_started, state.maps.len());
    let Some(definition) = pick_map(&state.maps, index).cloned() else {
        broadcast(
            state,
            &ServerMessage::Error {
                message: "no maps loaded".to_string(),
            },
            QueuePolicy::DisconnectOnFull,
        );
        return;
    };
    let map = match definition.build() {
        Ok(map) => map,
        Err(err) => {
            error!(map = %definition.name, %err, "map failed to build");
            broadcast(
                state,
                &ServerMessage::Error {
                    message: format!("map {} is invalid", definition.name),
                },
                QueuePolicy::DisconnectOnFull,
            );
            return;
        }
    };

    let seed = resolve_seed(seed, now_ms(), state.rounds_started);
    let game = GameEngine::new(map, state.config.clone(), seed, GameEngineOptions::default());
    info!(map = game.map.name(), seed, round = state.rounds_started, "round started");
    state.rounds_started += 1;

    let welcome = ServerMessage::Welcome {
        map: game.get_map_view(),
        config: game.config.clone(),
    };
    state.game = Some(game);
    broadcast(state, &welcome, QueuePolicy::DisconnectOnFull);
}

/// Current round's map, or the one the next start would pick.
fn send_welcome(state: &mut ServerState, client_id: &str) {
    let map = match state.game.as_ref() {
        Some(game) => Some(game.get_map_view()),
        None => {
            let index = resolve_map_index(None, state.rounds_started, state.maps.len());
            pick_map(&state.maps, index)
                .and_then(|definition| definition.build().ok())
                .map(|map| map.to_map_view())
        }
    };
    let Some(map) = map else {
        return;
    };
    let welcome = ServerMessage::Welcome {
        map,
        config: state.config.clone(),
    };
    send_to_client(state, client_id, &welcome, QueuePolicy::DisconnectOnFull);
}

fn start_tick_loop(state: SharedState, tick_ms: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(tick_ms.max(1)));
        loop {
            interval.tick().await;
            let mut guard = state.lock().await;
            tick_game(&mut guard);
        }
    });
}

fn tick_game(state: &mut ServerState) {
    let snapshot = {
        let Some(game) = state.game.as_mut() else {
            return;
        };
        game.step();
        game.build_snapshot(true)
    };

    broadcast(
        state,
        &ServerMessage::State { snapshot },
        QueuePolicy::DropOnFull,
    );

    let summary = {
        let Some(game) = state.game.as_ref() else {
            return;
        };
        if game.is_ended() {
            Some(game.build_summary())
        } else {
            None
        }
    };

    if let Some(summary) = summary {
        info!(
            reason = ?summary.reason,
            score = summary.score,
            ticks = summary.ticks,
            "round over"
        );
        broadcast(
            state,
            &ServerMessage::GameOver { summary },
            QueuePolicy::DisconnectOnFull,
        );
        state.game = None;
    }
}

fn encode(message: &ServerMessage) -> Option<String> {
    match serde_json::to_string(message) {
        Ok(payload) => Some(payload),
        Err(err) => {
            error!(%err, "failed to encode server message");
            None
        }
    }
}

fn send_to_client(
    state: &mut ServerState,
    client_id: &str,
    message: &ServerMessage,
    policy: QueuePolicy,
) {
    let Some(payload) = encode(message) else {
        return;
    };
    let send_failed = if let Some(client) = state.clients.get(client_id) {
        client.tx.try_send(payload).is_err()
    } else {
        false
    };
    if send_failed && policy == QueuePolicy::DisconnectOnFull {
        disconnect_client_internal(state, client_id);
    }
}

fn broadcast(state: &mut ServerState, message: &ServerMessage, policy: QueuePolicy) {
    let Some(payload) = encode(message) else {
        return;
    };
    let mut failed_clients = Vec::new();
    for (client_id, client) in &state.clients {
        if client.tx.try_send(payload.clone()).is_err() && policy == QueuePolicy::DisconnectOnFull
        {
            failed_clients.push(client_id.clone());
        }
    }
    for client_id in failed_clients {
        disconnect_client_internal(state, &client_id);
    }
}

/// Dropping the sender ends the writer task, which closes the socket.
fn disconnect_client_internal(state: &mut ServerState, client_id: &str) {
    if state.clients.remove(client_id).is_some() {
        warn!(client = %client_id, "client queue full, disconnecting");
    }
}

async fn send_error_to_client(state: &SharedState, client_id: &str, message: &str) {
    let mut guard = state.lock().await;
    send_to_client(
        &mut guard,
        client_id,
        &ServerMessage::Error {
            message: message.to_string(),
        },
        QueuePolicy::DisconnectOnFull,
    );
}

fn make_id(prefix: &str) -> String {
    let seq = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{seq}")
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_client() -> (ServerState, mpsc::Receiver<String>) {
        let mut state = ServerState::new(builtin_maps(), SimulationConfig::default());
        let (tx, rx) = mpsc::channel(16);
        state
            .clients
            .insert("client_1".to_string(), ClientContext { tx });
        (state, rx)
    }

    #[test]
    fn start_round_rotates_maps_and_broadcasts_welcome() {
        let (mut state, mut rx) = state_with_client();
        start_round(&mut state, None, Some(5));
        assert_eq!(state.rounds_started, 1);
        let first = state.game.as_ref().map(|game| game.map.name().to_string());
        assert_eq!(first.as_deref(), Some("classic"));
        let payload = rx.try_recv().expect("welcome should be queued");
        assert!(payload.contains(r#""type":"welcome""#));

        state.game = None;
        start_round(&mut state, None, Some(5));
        let second = state.game.as_ref().map(|game| game.map.name().to_string());
        assert_eq!(second.as_deref(), Some("mini"));
    }

    #[test]
    fn tick_game_broadcasts_state() {
        let (mut state, mut rx) = state_with_client();
        start_round(&mut state, Some(1), Some(9));
        let _ = rx.try_recv();
        tick_game(&mut state);
        let payload = rx.try_recv().expect("state should be queued");
        assert!(payload.contains(r#""type":"state""#));
    }

    #[test]
    fn full_queue_drops_state_but_disconnects_on_required_messages() {
        let mut state = ServerState::new(builtin_maps(), SimulationConfig::default());
        let (tx, _rx) = mpsc::channel(1);
        state
            .clients
            .insert("client_1".to_string(), ClientContext { tx });
        let pong = ServerMessage::Pong { t: 1.0 };
        broadcast(&mut state, &pong, QueuePolicy::DropOnFull);
        broadcast(&mut state, &pong, QueuePolicy::DropOnFull);
        assert!(state.clients.contains_key("client_1"));
        broadcast(&mut state, &pong, QueuePolicy::DisconnectOnFull);
        assert!(!state.clients.contains_key("client_1"));
    }
}
