//! Manages the WebSocket connection lifecycle for one application session.
//!
//! One connection is one running instance of the study companion: the
//! learner picks an exam, works the dashboard and chat screens, and loses
//! all conversational state when the connection closes. The screen flow is
//! modeled as an explicit state machine rather than ad hoc flags.
//!
//! Outbound messages go through an mpsc channel drained by a dedicated
//! writer task, so chat cycles run in the background while this loop keeps
//! reading. A prompt arriving while a reply is pending therefore reaches the
//! controller's in-flight gate immediately and is dropped there, instead of
//! sitting in the socket buffer until the pending cycle ends.

use super::chat::{self, ChatScreen};
use super::protocol::{ChatMode, ClientMessage, ModuleCard, ServerMessage};
use crate::state::AppState;
use anyhow::{Result, anyhow};
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use certprep_core::catalog::{self, Track};
use certprep_core::controller::PromptVisibility;
use certprep_core::progress::{ModuleStatus, ProgressTracker};
use certprep_core::prompt;
use futures_util::{SinkExt, StreamExt, stream::SplitStream};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Axum handler to upgrade an HTTP connection to a WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// The screens reachable after exam selection. `Chat` owns the transcript
/// and the oracle session, so moving back to `Dashboard` drops both;
/// nothing about the chat is persisted.
enum Screen {
    Dashboard,
    Chat(ChatScreen),
}

/// Per-connection application state: the selected track, module progress for
/// this exam-selection lifecycle, and whichever screen is showing.
struct AppSession {
    state: Arc<AppState>,
    track: Track,
    progress: ProgressTracker,
    screen: Screen,
}

/// Main handler for an individual WebSocket connection.
#[instrument(name = "app_session", skip_all, fields(connection_id))]
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = Uuid::new_v4();
    tracing::Span::current().record("connection_id", tracing::field::display(connection_id));
    info!("New WebSocket connection. Awaiting exam selection...");

    let (mut socket_tx, mut socket_rx) = socket.split();

    // Writer task: owns the sink and serializes every outbound message.
    let (out_tx, mut out_rx) = mpsc::channel::<ServerMessage>(32);
    let writer = tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            let serialized = match serde_json::to_string(&msg) {
                Ok(serialized) => serialized,
                Err(e) => {
                    error!(error = %e, "Failed to serialize server message.");
                    continue;
                }
            };
            if socket_tx.send(Message::Text(serialized.into())).await.is_err() {
                break;
            }
        }
    });

    // The first message from the client must select an exam track.
    let track = match await_exam_selection(&mut socket_rx, &out_tx).await {
        Ok(Some(track)) => track,
        Ok(None) => {
            info!("Client disconnected before selecting an exam.");
            writer.abort();
            return;
        }
        Err(e) => {
            error!(error = ?e, "Handshake failed.");
            writer.abort();
            return;
        }
    };

    let mut app = AppSession::new(state, track);
    if send_msg(&out_tx, app.exam_selected_msg()).await.is_err() {
        error!("Failed to confirm exam selection to client.");
        writer.abort();
        return;
    }
    info!(track = %track, "Exam selected; dashboard ready.");

    while let Some(msg_result) = socket_rx.next().await {
        match msg_result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(msg) => {
                    if let Err(e) = app.dispatch(msg, &out_tx).await {
                        error!(error = ?e, "Failed to handle client message.");
                        break;
                    }
                }
                Err(e) => warn!(error = %e, "Ignoring malformed client message."),
            },
            Ok(Message::Close(_)) => {
                info!("Client sent close frame.");
                break;
            }
            Ok(Message::Ping(_) | Message::Pong(_) | Message::Binary(_)) => {}
            Err(e) => {
                warn!(error = ?e, "Error receiving from client WebSocket.");
                break;
            }
        }
    }
    // Tearing down the writer makes any still-running cycle's sends fail,
    // so those tasks exit instead of outliving the connection.
    writer.abort();
    info!("WebSocket connection closed; transcript and session discarded.");
}

/// Waits for the mandatory `select_exam` handshake message.
async fn await_exam_selection(
    socket_rx: &mut SplitStream<WebSocket>,
    out_tx: &mpsc::Sender<ServerMessage>,
) -> Result<Option<Track>> {
    loop {
        return match socket_rx.next().await {
            Some(Ok(Message::Text(text))) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::SelectExam { track }) => Ok(Some(track)),
                _ => {
                    send_msg(
                        out_tx,
                        ServerMessage::Error {
                            message: "First message must be `select_exam`.".to_string(),
                        },
                    )
                    .await?;
                    Err(anyhow!("first message was not `select_exam`"))
                }
            },
            Some(Ok(Message::Close(_))) | None => Ok(None),
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
            Some(Ok(Message::Binary(_))) => Err(anyhow!("unexpected binary frame during handshake")),
            Some(Err(e)) => Err(e.into()),
        };
    }
}

impl AppSession {
    fn new(state: Arc<AppState>, track: Track) -> Self {
        Self {
            state,
            track,
            progress: new_progress(track),
            screen: Screen::Dashboard,
        }
    }

    /// Applies one client message to the screen state machine.
    async fn dispatch(
        &mut self,
        msg: ClientMessage,
        out_tx: &mpsc::Sender<ServerMessage>,
    ) -> Result<()> {
        match msg {
            ClientMessage::SelectExam { track } => {
                // Starting over: fresh progress, any open chat discarded.
                info!(track = %track, "Exam re-selected; resetting progress.");
                self.track = track;
                self.progress = new_progress(track);
                self.screen = Screen::Dashboard;
                send_msg(out_tx, self.exam_selected_msg()).await?;
            }
            ClientMessage::StartModule { module_id } => {
                if matches!(self.screen, Screen::Chat(_)) {
                    warn!("Ignoring start_module while a chat is open.");
                    return Ok(());
                }
                let Some(module) = catalog::module(self.track, &module_id) else {
                    send_msg(
                        out_tx,
                        ServerMessage::Error {
                            message: format!(
                                "Unknown module '{}' for {}.",
                                module_id, self.track
                            ),
                        },
                    )
                    .await?;
                    return Ok(());
                };
                info!(module = module.id, "Starting study module.");
                self.progress.start(module.id);
                let screen = ChatScreen::study(&self.state, self.track, module);
                send_msg(
                    out_tx,
                    ServerMessage::ChatOpened {
                        mode: ChatMode::Study,
                        title: module.name.to_string(),
                    },
                )
                .await?;
                let priming = prompt::study_priming_prompt(self.track, module);
                chat::spawn_send_cycle(
                    &screen,
                    priming,
                    PromptVisibility::Hidden,
                    out_tx.clone(),
                );
                self.screen = Screen::Chat(screen);
            }
            ClientMessage::StartMockTest => {
                if matches!(self.screen, Screen::Chat(_)) {
                    warn!("Ignoring start_mock_test while a chat is open.");
                    return Ok(());
                }
                info!("Starting mock test.");
                let screen = ChatScreen::mock_test(&self.state, self.track);
                send_msg(
                    out_tx,
                    ServerMessage::ChatOpened {
                        mode: ChatMode::MockTest,
                        title: format!("{} Mock Test", self.track.name()),
                    },
                )
                .await?;
                let priming = prompt::mock_test_priming_prompt(self.track);
                chat::spawn_send_cycle(
                    &screen,
                    priming,
                    PromptVisibility::Hidden,
                    out_tx.clone(),
                );
                self.screen = Screen::Chat(screen);
            }
            ClientMessage::UserMessage { text } => match &self.screen {
                Screen::Chat(screen) => {
                    chat::spawn_send_cycle(
                        screen,
                        text,
                        PromptVisibility::Visible,
                        out_tx.clone(),
                    );
                }
                Screen::Dashboard => warn!("Ignoring user_message outside a chat."),
            },
            ClientMessage::SelectOption { turn_id, option } => match &self.screen {
                Screen::Chat(screen) => {
                    chat::spawn_select_cycle(screen, turn_id, option, out_tx.clone());
                }
                Screen::Dashboard => warn!("Ignoring select_option outside a chat."),
            },
            ClientMessage::CompleteModule => {
                let module_id = match &self.screen {
                    Screen::Chat(screen) => Some(screen.module_id().map(str::to_string)),
                    Screen::Dashboard => None,
                };
                match module_id {
                    Some(completed) => {
                        if let Some(id) = completed {
                            info!(module = %id, "Module completed.");
                            self.progress.complete(&id);
                        }
                        self.screen = Screen::Dashboard;
                        send_msg(out_tx, self.dashboard_msg()).await?;
                    }
                    None => warn!("Ignoring complete_module outside a chat."),
                }
            }
            ClientMessage::ReturnToDashboard => match self.screen {
                Screen::Chat(_) => {
                    self.screen = Screen::Dashboard;
                    send_msg(out_tx, self.dashboard_msg()).await?;
                }
                Screen::Dashboard => warn!("Ignoring return_to_dashboard on the dashboard."),
            },
        }
        Ok(())
    }

    fn module_cards(&self) -> Vec<ModuleCard> {
        catalog::modules_for(self.track)
            .iter()
            .map(|m| ModuleCard {
                id: m.id.to_string(),
                name: m.name.to_string(),
                status: self.progress.status(m.id).unwrap_or(ModuleStatus::NotStarted),
            })
            .collect()
    }

    fn exam_selected_msg(&self) -> ServerMessage {
        ServerMessage::ExamSelected {
            track: self.track,
            modules: self.module_cards(),
        }
    }

    fn dashboard_msg(&self) -> ServerMessage {
        ServerMessage::ReturnedToDashboard {
            modules: self.module_cards(),
            percent_complete: self.progress.percent_complete(),
        }
    }
}

fn new_progress(track: Track) -> ProgressTracker {
    ProgressTracker::new(
        catalog::modules_for(track)
            .iter()
            .map(|m| m.id.to_string()),
    )
}

/// Queues a `ServerMessage` for the writer task.
pub(crate) async fn send_msg(
    out_tx: &mpsc::Sender<ServerMessage>,
    msg: ServerMessage,
) -> Result<()> {
    out_tx.send(msg).await?;
    Ok(())
}
