//! The chat screen: one transcript, one oracle session, one turn at a time.

use super::protocol::ServerMessage;
use super::session::send_msg;
use crate::state::AppState;
use certprep_core::catalog::{ModuleDef, Track};
use certprep_core::controller::{PromptVisibility, TurnController};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

/// Everything owned by an open chat screen. Dropping it (returning to the
/// dashboard) discards the transcript and the oracle session; nothing is
/// persisted.
pub(crate) struct ChatScreen {
    controller: Arc<TurnController>,
    module_id: Option<String>,
}

impl ChatScreen {
    pub(crate) fn study(state: &Arc<AppState>, track: Track, module: &ModuleDef) -> Self {
        Self {
            controller: new_controller(state, track),
            module_id: Some(module.id.to_string()),
        }
    }

    pub(crate) fn mock_test(state: &Arc<AppState>, track: Track) -> Self {
        Self {
            controller: new_controller(state, track),
            module_id: None,
        }
    }

    /// The module this screen is studying; `None` for mock tests.
    pub(crate) fn module_id(&self) -> Option<&str> {
        self.module_id.as_deref()
    }
}

fn new_controller(state: &Arc<AppState>, track: Track) -> Arc<TurnController> {
    Arc::new(TurnController::new(
        track,
        state.chat_client.clone(),
        state.system_prompt.clone(),
    ))
}

/// Spawns one send cycle as a background task so the connection keeps
/// reading while the oracle round trip runs.
///
/// The user-turn echo is forwarded as soon as the cycle is accepted, before
/// the round trip. A message arriving mid-flight opens its own task, hits
/// the controller's gate, and is dropped with a log line; it is never
/// buffered for later.
pub(crate) fn spawn_send_cycle(
    screen: &ChatScreen,
    prompt: String,
    visibility: PromptVisibility,
    out_tx: mpsc::Sender<ServerMessage>,
) {
    let controller = screen.controller.clone();
    tokio::spawn(async move {
        let Some(pending) = controller.try_send(&prompt, visibility).await else {
            warn!("Dropped send: a reply is already pending.");
            return;
        };
        if let Some(turn) = pending.user_turn() {
            if send_msg(&out_tx, ServerMessage::Turn { turn: turn.clone() })
                .await
                .is_err()
            {
                return;
            }
        }
        let reply_turn = pending.finish().await;
        let _ = send_msg(&out_tx, ServerMessage::Turn { turn: reply_turn }).await;
    });
}

/// Spawns the cycle for an option pick: confirm the selection, echo the
/// chosen option as a user turn, then forward the follow-up reply.
pub(crate) fn spawn_select_cycle(
    screen: &ChatScreen,
    turn_id: Uuid,
    option: String,
    out_tx: mpsc::Sender<ServerMessage>,
) {
    let controller = screen.controller.clone();
    tokio::spawn(async move {
        let Some(pending) = controller.try_select(turn_id, &option).await else {
            warn!(%turn_id, "Dropped option selection (already answered, pending reply, or unknown turn).");
            return;
        };
        if send_msg(
            &out_tx,
            ServerMessage::TurnAnswered {
                turn_id,
                option: option.clone(),
            },
        )
        .await
        .is_err()
        {
            return;
        }
        if let Some(turn) = pending.user_turn() {
            if send_msg(&out_tx, ServerMessage::Turn { turn: turn.clone() })
                .await
                .is_err()
            {
                return;
            }
        }
        let reply_turn = pending.finish().await;
        let _ = send_msg(&out_tx, ServerMessage::Turn { turn: reply_turn }).await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Provider};
    use async_trait::async_trait;
    use certprep_core::catalog;
    use certprep_core::oracle::{ChatClient, Exchange, OracleError};
    use certprep_core::transcript::Speaker;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;
    use tracing::Level;

    fn test_state(client: Arc<dyn ChatClient>) -> Arc<AppState> {
        Arc::new(AppState {
            chat_client: client,
            system_prompt: Arc::from("instruction"),
            config: Arc::new(Config {
                bind_address: "127.0.0.1:3000".parse().unwrap(),
                provider: Provider::OpenAI,
                openai_api_key: Some("test-key".to_string()),
                gemini_api_key: None,
                chat_model: "gpt-4o".to_string(),
                log_level: Level::INFO,
                prompts_path: "./prompts".into(),
            }),
        })
    }

    /// A client that parks inside the call until released, so a test can
    /// observe the in-flight window.
    struct GatedClient {
        release: Notify,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ChatClient for GatedClient {
        async fn complete(
            &self,
            _system_instruction: &str,
            _history: &[Exchange],
            _prompt: &str,
        ) -> Result<String, OracleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.release.notified().await;
            Ok("slow reply".to_string())
        }
    }

    #[tokio::test]
    async fn mid_flight_message_is_dropped_not_buffered() {
        let client = Arc::new(GatedClient {
            release: Notify::new(),
            calls: AtomicUsize::new(0),
        });
        let state = test_state(client.clone());
        let module = catalog::module(Track::Pmp, "risk").unwrap();
        let screen = ChatScreen::study(&state, Track::Pmp, module);
        let (out_tx, mut out_rx) = mpsc::channel(8);

        spawn_send_cycle(
            &screen,
            "first".to_string(),
            PromptVisibility::Visible,
            out_tx.clone(),
        );

        // The echo arrives while the oracle call is still parked.
        let echo = out_rx.recv().await.unwrap();
        match echo {
            ServerMessage::Turn { turn } => {
                assert_eq!(turn.text, "first");
                assert_eq!(turn.speaker, Speaker::User);
            }
            other => panic!("expected user turn echo, got {other:?}"),
        }
        while client.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        // A second message mid-flight reaches the gate and is dropped.
        spawn_send_cycle(
            &screen,
            "second".to_string(),
            PromptVisibility::Visible,
            out_tx.clone(),
        );
        for _ in 0..50 {
            tokio::task::yield_now().await;
        }
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);

        client.release.notify_one();
        let reply = out_rx.recv().await.unwrap();
        match reply {
            ServerMessage::Turn { turn } => assert_eq!(turn.text, "slow reply"),
            other => panic!("expected assistant reply, got {other:?}"),
        }

        // Nothing else was produced: one echo, one reply, no second cycle.
        drop(out_tx);
        drop(screen);
        assert!(out_rx.recv().await.is_none());
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }
}
