use serde::{Deserialize, Serialize};

use crate::core::ports::emitter::EmitterPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnEventKind {
    InterrogatorQuestion,
    ParticipantAnswer,
    Judgment,
    /// The orchestrator itself could not continue. Always the last event.
    Error,
}

impl TurnEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TurnEventKind::InterrogatorQuestion => "interrogator_question",
            TurnEventKind::ParticipantAnswer => "participant_answer",
            TurnEventKind::Judgment => "judgment",
            TurnEventKind::Error => "error",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TurnEventKind::Judgment | TurnEventKind::Error)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnEvent {
    pub run_id: String,
    pub kind: TurnEventKind,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_number: Option<u32>,
    pub ts: String,
}

impl TurnEvent {
    pub fn new(
        run_id: &str,
        kind: TurnEventKind,
        content: impl Into<String>,
        turn_number: Option<u32>,
    ) -> Self {
        Self {
            run_id: run_id.to_string(),
            kind,
            content: content.into(),
            turn_number,
            ts: now_iso(),
        }
    }

    pub fn error(run_id: &str, message: impl Into<String>) -> Self {
        Self::new(run_id, TurnEventKind::Error, message, None)
    }

    /// Server-sent-event framing: `data: {json}` followed by a blank line.
    pub fn to_sse_frame(&self) -> String {
        let payload = serde_json::to_string(self).unwrap_or_else(|_| {
            serde_json::json!({
                "run_id": self.run_id,
                "kind": TurnEventKind::Error.as_str(),
                "content": "failed to serialize event",
            })
            .to_string()
        });
        format!("data: {payload}\n\n")
    }
}

pub(crate) fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339()
}

pub(super) fn emit_turn_event(
    emitter: &dyn EmitterPort,
    run_id: &str,
    kind: TurnEventKind,
    content: &str,
    turn_number: Option<u32>,
) {
    log::debug!(
        "game {run_id}: {} (turn {:?}, {} chars)",
        kind.as_str(),
        turn_number,
        content.chars().count()
    );
    emitter.emit(&TurnEvent::new(run_id, kind, content, turn_number));
}
