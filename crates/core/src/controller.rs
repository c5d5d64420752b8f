//! Drives one request/response cycle against the session manager.

use crate::catalog::Track;
use crate::classifier::{self, ParsedReply};
use crate::oracle::ChatClient;
use crate::session::SessionManager;
use crate::transcript::{Transcript, Turn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

/// The fixed in-transcript notice appended when a send fails. The error
/// itself is never propagated to the transcript's consumers.
pub const FAILURE_NOTICE: &str =
    "Oh no! 🤖 I seem to have a short circuit. Please try again or return to the dashboard.";

/// Whether a prompt is recorded as a visible user turn. Priming prompts that
/// open a module or mock test are sent but not shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptVisibility {
    Visible,
    Hidden,
}

/// Result of asking the controller to run a cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Dropped without side effects: another send was in flight, or an
    /// option selection did not apply (already answered, unknown turn, or
    /// the option was not one of the turn's choices).
    Rejected,
    /// The cycle ran to completion. `user_turn` is present for visible
    /// prompts; `reply_turn` is the classified assistant reply, or the
    /// fixed failure notice when the send failed.
    Completed {
        user_turn: Option<Turn>,
        reply_turn: Turn,
    },
}

/// Owns one chat screen's transcript and oracle session, serializing all
/// sends through a single in-flight gate.
///
/// The gate is mutual exclusion, not a queue: a send attempted while another
/// is in flight is dropped. There is no cancellation; an accepted send runs
/// to completion (success or failure notice) before the gate reopens.
pub struct TurnController {
    track: Track,
    inner: Mutex<Inner>,
    in_flight: AtomicBool,
}

struct Inner {
    session: SessionManager,
    transcript: Transcript,
}

impl TurnController {
    pub fn new(track: Track, client: Arc<dyn ChatClient>, system_instruction: Arc<str>) -> Self {
        Self {
            track,
            inner: Mutex::new(Inner {
                session: SessionManager::new(client, system_instruction),
                transcript: Transcript::new(),
            }),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn track(&self) -> Track {
        self.track
    }

    /// Snapshot of the full ordered transcript.
    pub async fn transcript(&self) -> Vec<Turn> {
        self.inner.lock().await.transcript.turns().to_vec()
    }

    /// Takes the in-flight gate and records the visible user turn, without
    /// starting the oracle round trip yet. Returns `None` when another cycle
    /// is already running; the attempt is dropped, not queued.
    ///
    /// A visible user turn lands in the transcript here, before the round
    /// trip, so it renders ahead of the pending reply. The returned cycle
    /// should be driven to [`PendingCycle::finish`]; dropping it reopens the
    /// gate without appending a reply.
    pub async fn try_send(
        &self,
        prompt: &str,
        visibility: PromptVisibility,
    ) -> Option<PendingCycle<'_>> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            debug!("dropping send: another send is in flight");
            return None;
        }
        let user_turn = match visibility {
            PromptVisibility::Visible => {
                let turn = Turn::user(prompt);
                self.inner.lock().await.transcript.push(turn.clone());
                Some(turn)
            }
            PromptVisibility::Hidden => None,
        };
        Some(PendingCycle {
            controller: self,
            user_turn,
            prompt: prompt.to_string(),
            released: false,
        })
    }

    /// Records the learner's pick for a multiple-choice turn and opens a
    /// cycle with the chosen option as the next visible prompt.
    ///
    /// Returns `None` when a send is in flight or the selection does not
    /// apply: already answered, unknown turn, or an option the turn does not
    /// offer. Repeat selections are therefore no-ops (the UI keeps option
    /// buttons disabled until the pending reply lands).
    pub async fn try_select(&self, turn_id: Uuid, option: &str) -> Option<PendingCycle<'_>> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            debug!(%turn_id, "dropping option selection: a send is in flight");
            return None;
        }
        let user_turn = {
            let mut inner = self.inner.lock().await;
            if !inner.transcript.mark_answered(turn_id, option) {
                debug!(%turn_id, "option selection did not apply");
                drop(inner);
                self.in_flight.store(false, Ordering::SeqCst);
                return None;
            }
            let turn = Turn::user(option);
            inner.transcript.push(turn.clone());
            turn
        };
        Some(PendingCycle {
            controller: self,
            user_turn: Some(user_turn),
            prompt: option.to_string(),
            released: false,
        })
    }

    /// Runs one full send cycle, or drops the attempt if one is already
    /// running.
    pub async fn send(&self, prompt: &str, visibility: PromptVisibility) -> SendOutcome {
        match self.try_send(prompt, visibility).await {
            Some(pending) => {
                let user_turn = pending.user_turn().cloned();
                let reply_turn = pending.finish().await;
                SendOutcome::Completed {
                    user_turn,
                    reply_turn,
                }
            }
            None => SendOutcome::Rejected,
        }
    }

    /// Records the learner's pick for a multiple-choice turn, then drives a
    /// new visible cycle with the chosen option as the prompt.
    pub async fn select_option(&self, turn_id: Uuid, option: &str) -> SendOutcome {
        match self.try_select(turn_id, option).await {
            Some(pending) => {
                let user_turn = pending.user_turn().cloned();
                let reply_turn = pending.finish().await;
                SendOutcome::Completed {
                    user_turn,
                    reply_turn,
                }
            }
            None => SendOutcome::Rejected,
        }
    }
}

/// An accepted cycle holding the in-flight gate. Created by
/// [`TurnController::try_send`] or [`TurnController::try_select`]; the user
/// turn (if visible) is already in the transcript and can be shown while the
/// round trip runs.
pub struct PendingCycle<'a> {
    controller: &'a TurnController,
    user_turn: Option<Turn>,
    prompt: String,
    released: bool,
}

impl PendingCycle<'_> {
    /// The user turn appended when this cycle was opened, if visible.
    pub fn user_turn(&self) -> Option<&Turn> {
        self.user_turn.as_ref()
    }

    /// Runs the oracle round trip, appends the reply turn, and reopens the
    /// gate. The reply is the classified assistant text, or the fixed
    /// failure notice when the send fails.
    pub async fn finish(mut self) -> Turn {
        let result = {
            let mut inner = self.controller.inner.lock().await;
            inner.session.send(self.controller.track, &self.prompt).await
        };

        let reply_turn = match result {
            Ok(reply) => Turn::assistant(classifier::classify(&reply)),
            Err(err) => {
                warn!(error = %err, "send failed; reporting in transcript");
                Turn::assistant(ParsedReply::Narrative(FAILURE_NOTICE.to_string()))
            }
        };
        self.controller
            .inner
            .lock()
            .await
            .transcript
            .push(reply_turn.clone());

        self.released = true;
        self.controller.in_flight.store(false, Ordering::SeqCst);
        reply_turn
    }
}

impl Drop for PendingCycle<'_> {
    fn drop(&mut self) {
        // An abandoned cycle must not leave the gate closed.
        if !self.released {
            self.controller.in_flight.store(false, Ordering::SeqCst);
        }
    }
}
