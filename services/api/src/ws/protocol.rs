//! Defines the WebSocket message protocol between the browser client and the API server.

use certprep_core::catalog::Track;
use certprep_core::progress::ModuleStatus;
use certprep_core::transcript::Turn;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a chat screen is a focused study session or a full mock test.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChatMode {
    Study,
    MockTest,
}

/// Messages sent from the client (browser) to the server.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Picks the exam track. This must be the first message, and may be sent
    /// again later to start over with fresh progress.
    SelectExam { track: Track },
    /// Opens a study chat for one module of the selected track.
    StartModule { module_id: String },
    /// Opens a mock-test chat covering the whole selected track.
    StartMockTest,
    /// A free-text message from the learner.
    UserMessage { text: String },
    /// The learner picked an option on a multiple-choice turn.
    SelectOption { turn_id: Uuid, option: String },
    /// Marks the current module completed and returns to the dashboard.
    CompleteModule,
    /// Leaves the chat without completing, discarding transcript and session.
    ReturnToDashboard,
}

/// One module's dashboard card: identity plus lifecycle status.
#[derive(Serialize, Debug, Clone)]
pub struct ModuleCard {
    pub id: String,
    pub name: String,
    pub status: ModuleStatus,
}

/// Messages sent from the server to the client (browser).
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Confirms the exam selection and provides the dashboard contents.
    ExamSelected {
        track: Track,
        modules: Vec<ModuleCard>,
    },
    /// A chat screen is now open; turns for it will follow.
    ChatOpened { mode: ChatMode, title: String },
    /// One turn appended to the transcript (user echo or assistant reply).
    Turn { turn: Turn },
    /// Confirms an option selection was recorded on a turn.
    TurnAnswered { turn_id: Uuid, option: String },
    /// The client is back on the dashboard; the chat screen is gone.
    ReturnedToDashboard {
        modules: Vec<ModuleCard>,
        percent_complete: u8,
    },
    /// Reports a protocol-level error to the client.
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_deserialize_by_tag() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"select_exam","track":"leed_v5"}"#).unwrap();
        assert!(matches!(
            msg,
            ClientMessage::SelectExam { track: Track::LeedV5 }
        ));

        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"start_module","module_id":"risk"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::StartModule { module_id } if module_id == "risk"));

        let msg: ClientMessage = serde_json::from_str(r#"{"type":"start_mock_test"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::StartMockTest));
    }

    #[test]
    fn select_option_carries_turn_id() {
        let id = Uuid::new_v4();
        let raw = format!(r#"{{"type":"select_option","turn_id":"{id}","option":"A) Yes"}}"#);
        let msg: ClientMessage = serde_json::from_str(&raw).unwrap();
        match msg {
            ClientMessage::SelectOption { turn_id, option } => {
                assert_eq!(turn_id, id);
                assert_eq!(option, "A) Yes");
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn server_messages_serialize_with_snake_case_tags() {
        let msg = ServerMessage::ChatOpened {
            mode: ChatMode::MockTest,
            title: "PMP Mock Test".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"chat_opened""#));
        assert!(json.contains(r#""mode":"mock_test""#));
    }

    #[test]
    fn module_card_includes_status() {
        let card = ModuleCard {
            id: "scope".to_string(),
            name: "Scope Management".to_string(),
            status: ModuleStatus::InProgress,
        };
        let json = serde_json::to_string(&card).unwrap();
        assert!(json.contains(r#""status":"in_progress""#));
    }
}
