use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::IntoResponse,
    routing::get,
    Router,
};
use bf_core::calculator::{CalculatorSession, Command, Component, Effect};
use bf_core::fields::FieldKind;
use bf_core::persistence::{KeyValueStore, MemoryStore};
use bf_core::units::DimensionUnit;
use futures::{sink::SinkExt, stream::SplitSink, stream::StreamExt};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

type Session = CalculatorSession<SharedStore>;
type Sender = SplitSink<WebSocket, Message>;

// Application State
struct AppState {
    store: RwLock<MemoryStore>,
}

/// Store handle sessions persist through; locked values written by one
/// connection survive for the next one, like localStorage across visits.
#[derive(Clone)]
struct SharedStore(Arc<AppState>);

impl KeyValueStore for SharedStore {
    fn get(&self, key: &str) -> Option<String> {
        self.0.store.read().unwrap().get(key)
    }

    fn set(&mut self, key: &str, value: &str) {
        self.0.store.write().unwrap().set(key, value);
    }

    fn remove(&mut self, key: &str) {
        self.0.store.write().unwrap().remove(key);
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let shared_state = Arc::new(AppState {
        store: RwLock::new(MemoryStore::new()),
    });

    // build our application with a route
    let app = Router::new()
        .route("/", get(root))
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(shared_state);

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

async fn root() -> &'static str {
    "Hello from Board Foot Calculator Backend!"
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Numeric edit command: which field, which input of it, and the raw text.
#[derive(Deserialize)]
struct EditCmd {
    field: String,
    component: Option<String>, // "fraction" targets a composite sub-unit input
    value: String,
}

#[derive(Deserialize)]
struct UnitCmd {
    field: String,
    unit: String,
}

/// Full snapshot sent after every command so the frontend never drifts.
#[derive(Serialize)]
struct StateSnapshot<'a> {
    state: &'a bf_core::calculator::CalculatorState,
    locked: Vec<FieldKind>,
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let conn = Uuid::new_v4();
    info!("calculator client connected: {}", conn);

    let (mut sender, mut receiver) = socket.split();
    let mut session = Session::new(SharedStore(state));

    if send_state(&mut sender, &session).await.is_err() {
        return;
    }

    while let Some(msg) = receiver.next().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(_) => break,
        };

        if let Message::Text(text) = msg {
            info!("[{}] received: {}", conn, text);

            let mut effects = Vec::new();
            if let Some(json) = text.strip_prefix("EDIT:") {
                match serde_json::from_str::<EditCmd>(json) {
                    Ok(cmd) => match FieldKind::parse(&cmd.field) {
                        Some(field) => {
                            let component = match cmd.component.as_deref() {
                                Some("fraction") => Component::Fraction,
                                _ => Component::Main,
                            };
                            effects = session.handle(Command::Edit {
                                field,
                                component,
                                raw: cmd.value,
                            });
                        }
                        None => warn!("[{}] unknown field in EDIT: {}", conn, cmd.field),
                    },
                    Err(e) => warn!("[{}] failed to parse EDIT command: {}", conn, e),
                }
            } else if let Some(json) = text.strip_prefix("UNIT:") {
                match serde_json::from_str::<UnitCmd>(json) {
                    Ok(cmd) => {
                        match (FieldKind::parse(&cmd.field), DimensionUnit::parse(&cmd.unit)) {
                            (Some(field), Some(unit)) => {
                                effects = session.handle(Command::UnitChange { field, unit });
                            }
                            _ => warn!(
                                "[{}] unknown field or unit in UNIT: {} {}",
                                conn, cmd.field, cmd.unit
                            ),
                        }
                    }
                    Err(e) => warn!("[{}] failed to parse UNIT command: {}", conn, e),
                }
            } else if let Some(key) = text.strip_prefix("LOCK:") {
                match FieldKind::parse(key) {
                    Some(field) => effects = session.handle(Command::ToggleLock { field }),
                    None => warn!("[{}] unknown field in LOCK: {}", conn, key),
                }
            } else if let Some(key) = text.strip_prefix("BLUR:") {
                match FieldKind::parse(key) {
                    Some(field) => effects = session.handle(Command::Blur { field }),
                    None => warn!("[{}] unknown field in BLUR: {}", conn, key),
                }
            } else if text == "RESET" {
                effects = session.handle(Command::Reset);
            } else if text == "SHARE" {
                let query = session.share_query();
                if sender
                    .send(Message::Text(format!("SHARE_UPDATE:{}", query)))
                    .await
                    .is_err()
                {
                    return;
                }
            } else if let Some(query) = text.strip_prefix("LOAD:") {
                effects = session.load_share_query(query);
            } else if let Some(answer) = text.strip_prefix("FEEDBACK:") {
                effects = session.record_feedback(answer == "yes");
            } else {
                warn!("[{}] unrecognized command: {}", conn, text);
            }

            for effect in &effects {
                if send_effect(&mut sender, effect).await.is_err() {
                    return;
                }
            }
            if send_state(&mut sender, &session).await.is_err() {
                return;
            }
        }
    }

    // Keep locked values around for the client's next visit
    session.persist_locked();
    info!("calculator client disconnected: {}", conn);
}

async fn send_effect(sender: &mut Sender, effect: &Effect) -> Result<(), axum::Error> {
    let tag = match effect {
        Effect::FieldComputed { .. } => "FIELD_UPDATE",
        Effect::LockChanged { .. } => "LOCK_UPDATE",
        Effect::Rejected { .. } => "REJECTED",
        Effect::Notice { .. } => "NOTICE",
    };
    let payload = serde_json::to_string(effect).unwrap_or_else(|_| "{}".to_string());
    sender
        .send(Message::Text(format!("{}:{}", tag, payload)))
        .await
}

async fn send_state(sender: &mut Sender, session: &Session) -> Result<(), axum::Error> {
    let snapshot = StateSnapshot {
        state: session.state(),
        locked: session.locks().locked_fields(),
    };
    let json = serde_json::to_string(&snapshot).unwrap_or_else(|_| "{}".to_string());
    sender
        .send(Message::Text(format!("STATE_UPDATE:{}", json)))
        .await
}
