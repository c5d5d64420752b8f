//! Owns the oracle conversation handle for one chat screen.

use crate::catalog::Track;
use crate::oracle::{ChatClient, Exchange, ExchangeRole, OracleError};
use std::sync::Arc;
use tracing::{debug, info};

/// The live conversation with the oracle. The chat-completions API is
/// stateless, so the handle carries the accumulated history itself; a fresh
/// handle therefore means a conversation the model has no memory of.
#[derive(Debug)]
struct ChatHandle {
    track: Track,
    history: Vec<Exchange>,
}

/// Provides a live conversation bound to an exam track, recreating it
/// transparently when the track changes or after any send failure.
pub struct SessionManager {
    client: Arc<dyn ChatClient>,
    system_instruction: Arc<str>,
    handle: Option<ChatHandle>,
}

impl SessionManager {
    pub fn new(client: Arc<dyn ChatClient>, system_instruction: Arc<str>) -> Self {
        Self {
            client,
            system_instruction,
            handle: None,
        }
    }

    /// Makes sure a handle for `track` exists. Idempotent for the same
    /// track; a track change discards the old handle and its history.
    pub fn ensure_session(&mut self, track: Track) {
        if self.handle.as_ref().is_none_or(|h| h.track != track) {
            info!(track = %track, "opening fresh chat session");
            self.handle = Some(ChatHandle {
                track,
                history: Vec::new(),
            });
        }
    }

    /// Number of exchanges recorded on the current handle, if any.
    pub fn history_len(&self) -> Option<usize> {
        self.handle.as_ref().map(|h| h.history.len())
    }

    /// Sends one prompt on the conversation for `track` and returns the raw
    /// reply text.
    ///
    /// On success the prompt/reply pair is appended to the handle's history.
    /// On any failure the handle is unconditionally discarded, so the next
    /// send starts a clean conversation rather than reusing a handle in an
    /// unknown state.
    pub async fn send(&mut self, track: Track, prompt: &str) -> Result<String, OracleError> {
        self.ensure_session(track);
        let history = self
            .handle
            .as_ref()
            .map(|h| h.history.clone())
            .unwrap_or_default();

        debug!(track = %track, history_len = history.len(), "sending prompt to oracle");
        match self
            .client
            .complete(&self.system_instruction, &history, prompt)
            .await
        {
            Ok(reply) => {
                if let Some(handle) = self.handle.as_mut() {
                    handle.history.push(Exchange {
                        role: ExchangeRole::User,
                        text: prompt.to_string(),
                    });
                    handle.history.push(Exchange {
                        role: ExchangeRole::Model,
                        text: reply.clone(),
                    });
                }
                Ok(reply)
            }
            Err(err) => {
                // Fail closed.
                self.handle = None;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::MockChatClient;

    fn manager(client: MockChatClient) -> SessionManager {
        SessionManager::new(Arc::new(client), Arc::from("be helpful"))
    }

    #[tokio::test]
    async fn history_accumulates_across_sends() {
        let mut seq = mockall::Sequence::new();
        let mut client = MockChatClient::new();
        client
            .expect_complete()
            .withf(|_, history, _| history.is_empty())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok("first reply".to_string()));
        client
            .expect_complete()
            .withf(|_, history, prompt| history.len() == 2 && prompt == "second")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok("second reply".to_string()));

        let mut session = manager(client);
        session.send(Track::Pmp, "first").await.unwrap();
        session.send(Track::Pmp, "second").await.unwrap();
        assert_eq!(session.history_len(), Some(4));
    }

    #[tokio::test]
    async fn track_switch_starts_with_empty_history() {
        let mut client = MockChatClient::new();
        client
            .expect_complete()
            .withf(|_, history, _| history.is_empty())
            .times(2)
            .returning(|_, _, _| Ok("reply".to_string()));

        let mut session = manager(client);
        session.send(Track::LeedV41, "hello").await.unwrap();
        assert_eq!(session.history_len(), Some(2));

        session.send(Track::Pmp, "hello again").await.unwrap();
        assert_eq!(session.history_len(), Some(2));
    }

    #[tokio::test]
    async fn ensure_session_is_idempotent_for_same_track() {
        let mut client = MockChatClient::new();
        client
            .expect_complete()
            .times(1)
            .returning(|_, _, _| Ok("reply".to_string()));

        let mut session = manager(client);
        session.send(Track::LeedV5, "hi").await.unwrap();
        session.ensure_session(Track::LeedV5);
        session.ensure_session(Track::LeedV5);
        assert_eq!(session.history_len(), Some(2));
    }

    #[tokio::test]
    async fn failure_discards_the_handle() {
        let mut seq = mockall::Sequence::new();
        let mut client = MockChatClient::new();
        client
            .expect_complete()
            .withf(|_, history, _| history.is_empty())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok("ok".to_string()));
        client
            .expect_complete()
            .withf(|_, history, _| history.len() == 2)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Err(OracleError::Communication("quota".to_string())));
        // The retry after the failure must see a brand-new conversation.
        client
            .expect_complete()
            .withf(|_, history, _| history.is_empty())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok("recovered".to_string()));

        let mut session = manager(client);
        session.send(Track::Pmp, "one").await.unwrap();
        let err = session.send(Track::Pmp, "two").await.unwrap_err();
        assert!(matches!(err, OracleError::Communication(_)));
        assert_eq!(session.history_len(), None);

        let reply = session.send(Track::Pmp, "three").await.unwrap();
        assert_eq!(reply, "recovered");
    }
}
