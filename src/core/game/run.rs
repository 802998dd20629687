use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use futures::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::adapters::emitter::ChannelEmitter;
use crate::core::ports::emitter::EmitterPort;

use super::events::{emit_turn_event, now_iso, TurnEvent, TurnEventKind};
use super::history::ConversationHistory;
use super::invoke::ModelClient;
use super::prompts::{interrogator_system_prompt, judgment_prompt, participant_system_prompt};
use super::record::{record_run, Conversation, GameRun};
use super::verdict::extract_verdict;
use super::Game;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRequest {
    pub participant_model: String,
    pub interrogator_model: String,
    pub num_questions: u32,
    /// Who started the run; stored verbatim on the record.
    pub run_by: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GameError {
    #[error("Both participant and interrogator models must be selected")]
    MissingModel,
    #[error("The number of questions must be at least 1")]
    NoQuestions,
    #[error("run_by must be non-empty")]
    MissingRunBy,
}

impl GameRequest {
    pub fn validate(&self) -> Result<(), GameError> {
        if self.participant_model.trim().is_empty() || self.interrogator_model.trim().is_empty() {
            return Err(GameError::MissingModel);
        }
        if self.num_questions == 0 {
            return Err(GameError::NoQuestions);
        }
        if self.run_by.trim().is_empty() {
            return Err(GameError::MissingRunBy);
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct GameOutcome {
    pub run: GameRun,
    pub persisted: bool,
}

/// Live events of one run, in production order. The stream ends once the
/// run has finished and its record has been handed to the store.
pub struct GameStream {
    run_id: String,
    events: UnboundedReceiverStream<TurnEvent>,
}

impl GameStream {
    pub fn run_id(&self) -> &str {
        &self.run_id
    }
}

impl Stream for GameStream {
    type Item = TurnEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.events).poll_next(cx)
    }
}

fn new_run_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl Game {
    /// Plays one run to completion, emitting events as they are produced.
    pub async fn play(
        &self,
        request: &GameRequest,
        emitter: &dyn EmitterPort,
    ) -> Result<GameOutcome, GameError> {
        request.validate()?;
        Ok(self.run_game(new_run_id(), request, emitter).await)
    }

    /// Validates, then plays the run on its own task. Dropping the stream
    /// does not stop the run; it still completes and is recorded.
    pub fn stream(self: &Arc<Self>, request: GameRequest) -> Result<GameStream, GameError> {
        request.validate()?;

        let run_id = new_run_id();
        let (tx, rx) = mpsc::unbounded_channel();

        let game = Arc::clone(self);
        let worker_run_id = run_id.clone();
        let worker_tx = tx.clone();
        let worker = tokio::spawn(async move {
            let emitter = ChannelEmitter::new(worker_tx);
            game.run_game(worker_run_id, &request, &emitter).await
        });

        let supervisor_run_id = run_id.clone();
        tokio::spawn(async move {
            if let Err(error) = worker.await {
                log::error!("game {supervisor_run_id} aborted: {error}");
                let _ = tx.send(TurnEvent::error(
                    &supervisor_run_id,
                    format!("Game error: {error}"),
                ));
            }
        });

        Ok(GameStream {
            run_id,
            events: UnboundedReceiverStream::new(rx),
        })
    }

    async fn run_game(
        &self,
        run_id: String,
        request: &GameRequest,
        emitter: &dyn EmitterPort,
    ) -> GameOutcome {
        let started = Instant::now();
        let client = ModelClient::new(self.llm.clone(), self.llm_response_timeout);
        let num_questions = request.num_questions;
        let interrogator_model = request.interrogator_model.trim();
        let participant_model = request.participant_model.trim();

        log::info!(
            "game {run_id} started: interrogator={} participant={} questions={}",
            interrogator_model,
            participant_model,
            num_questions
        );

        let interrogator_system_prompt = interrogator_system_prompt(num_questions);
        let participant_system_prompt = participant_system_prompt().to_string();
        let mut interrogator = ConversationHistory::with_system(&interrogator_system_prompt);
        let mut participant = ConversationHistory::with_system(&participant_system_prompt);

        let mut question = client
            .invoke(interrogator_model, interrogator.messages())
            .await;
        interrogator.push_assistant(&question);
        emit_turn_event(
            emitter,
            &run_id,
            TurnEventKind::InterrogatorQuestion,
            &question,
            Some(1),
        );

        for i in 0..num_questions {
            participant.push_user(&question);
            let answer = client
                .invoke(participant_model, participant.messages())
                .await;
            participant.push_assistant(&answer);
            emit_turn_event(
                emitter,
                &run_id,
                TurnEventKind::ParticipantAnswer,
                &answer,
                Some(i + 1),
            );

            interrogator.push_user(&answer);

            if i + 1 < num_questions {
                question = client
                    .invoke(interrogator_model, interrogator.messages())
                    .await;
                interrogator.push_assistant(&question);
                emit_turn_event(
                    emitter,
                    &run_id,
                    TurnEventKind::InterrogatorQuestion,
                    &question,
                    Some(i + 2),
                );
            }
        }

        interrogator.push_user(judgment_prompt());
        let judgment_text = client
            .invoke(interrogator_model, interrogator.messages())
            .await;
        interrogator.push_assistant(&judgment_text);
        emit_turn_event(
            emitter,
            &run_id,
            TurnEventKind::Judgment,
            &judgment_text,
            None,
        );

        let extraction = extract_verdict(&judgment_text);
        let run = GameRun {
            run_id: run_id.clone(),
            interrogator_model: interrogator_model.to_string(),
            participant_model: participant_model.to_string(),
            interrogator_system_prompt,
            participant_system_prompt,
            conversation: Conversation {
                interrogator_transcript: interrogator,
                participant_transcript: participant,
            },
            judgment: extraction.cleaned,
            verdict: extraction.verdict,
            run_by: request.run_by.trim().to_string(),
            created_at: now_iso(),
        };

        let persisted = record_run(self.store.clone(), run.clone()).await;
        log::info!(
            "game {run_id} finished in {}ms: verdict={} persisted={persisted}",
            started.elapsed().as_millis(),
            run.verdict
        );

        GameOutcome { run, persisted }
    }
}
