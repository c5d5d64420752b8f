//! Append-only conversation transcript with per-turn answer state.

use crate::classifier::ParsedReply;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Assistant,
}

/// One message in the transcript.
///
/// For assistant turns classified as multiple-choice, `text` holds the
/// question stem and `options` the answer choices; otherwise `options` is
/// empty. `chosen_option` is set at most once and is always a member of
/// `options`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub id: Uuid,
    pub speaker: Speaker,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    pub answered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chosen_option: Option<String>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            speaker: Speaker::User,
            text: text.into(),
            options: Vec::new(),
            answered: false,
            chosen_option: None,
        }
    }

    pub fn assistant(reply: ParsedReply) -> Self {
        let (text, options) = match reply {
            ParsedReply::Narrative(text) => (text, Vec::new()),
            ParsedReply::MultipleChoice { stem, options } => (stem, options),
        };
        Self {
            id: Uuid::new_v4(),
            speaker: Speaker::Assistant,
            text,
            options,
            answered: false,
            chosen_option: None,
        }
    }

    /// Whether this turn is a question still waiting for an answer.
    pub fn awaits_answer(&self) -> bool {
        self.speaker == Speaker::Assistant && !self.options.is_empty() && !self.answered
    }
}

/// The ordered message sequence for one chat screen. Turns are never removed
/// or reordered; the only mutation after append is marking a turn answered.
#[derive(Debug, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Records the learner's pick for a multiple-choice turn.
    ///
    /// Returns `false` without mutating anything when the turn is unknown,
    /// already answered, or `option` is not one of the turn's options. Only
    /// the first successful call per turn has effect.
    pub fn mark_answered(&mut self, turn_id: Uuid, option: &str) -> bool {
        let Some(turn) = self.turns.iter_mut().find(|t| t.id == turn_id) else {
            return false;
        };
        if !turn.awaits_answer() || !turn.options.iter().any(|o| o == option) {
            return false;
        }
        turn.answered = true;
        turn.chosen_option = Some(option.to_string());
        true
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;

    fn mcq_turn() -> Turn {
        Turn::assistant(classify("Pick one:\nA) First\nB) Second"))
    }

    #[test]
    fn assistant_turn_from_narrative_has_no_options() {
        let turn = Turn::assistant(classify("Nice work so far."));
        assert_eq!(turn.text, "Nice work so far.");
        assert!(turn.options.is_empty());
        assert!(!turn.awaits_answer());
    }

    #[test]
    fn first_answer_wins() {
        let mut transcript = Transcript::new();
        let turn = mcq_turn();
        let id = turn.id;
        transcript.push(turn);

        assert!(transcript.mark_answered(id, "A) First"));
        assert!(!transcript.mark_answered(id, "B) Second"));

        let answered = &transcript.turns()[0];
        assert!(answered.answered);
        assert_eq!(answered.chosen_option.as_deref(), Some("A) First"));
    }

    #[test]
    fn answer_must_be_a_listed_option() {
        let mut transcript = Transcript::new();
        let turn = mcq_turn();
        let id = turn.id;
        transcript.push(turn);

        assert!(!transcript.mark_answered(id, "C) Not offered"));
        assert!(!transcript.turns()[0].answered);
    }

    #[test]
    fn unknown_turn_is_ignored() {
        let mut transcript = Transcript::new();
        transcript.push(mcq_turn());
        assert!(!transcript.mark_answered(Uuid::new_v4(), "A) First"));
    }

    #[test]
    fn appends_preserve_order() {
        let mut transcript = Transcript::new();
        transcript.push(Turn::user("first"));
        transcript.push(Turn::assistant(classify("second")));
        transcript.push(Turn::user("third"));

        let texts: Vec<&str> = transcript.turns().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn turn_serializes_without_empty_fields() {
        let turn = Turn::user("hello");
        let json = serde_json::to_string(&turn).unwrap();
        assert!(!json.contains("options"));
        assert!(!json.contains("chosen_option"));
        assert!(json.contains("\"speaker\":\"user\""));
    }
}
