use std::io::Write;
use std::sync::Arc;

use futures::{Stream, StreamExt};

use crate::adapters::config::Settings;
use crate::core::game::{TurnEvent, TurnEventKind};
use crate::runtime::cli::PlayArgs;

use super::shared::{build_game, game_request};

pub async fn play(args: PlayArgs) -> Result<(), String> {
    let settings = Settings::load_global();
    if !settings.has_api_key() {
        log::warn!(
            "no API key configured for provider {}; every turn will fall back",
            settings.provider
        );
    }

    let request = game_request(args, &settings);
    let game = Arc::new(build_game(&settings));
    let events = game.stream(request).map_err(|e| e.to_string())?;
    let run_id = events.run_id().to_string();

    let relay = relay_events(events, std::io::stdout()).await;
    if let Some(error) = relay.write_error {
        return Err(format!("stopped printing game {run_id}: {error}"));
    }

    println!("{run_id}");

    match relay.last_kind {
        Some(kind) if kind.is_terminal() && kind != TurnEventKind::Error => Ok(()),
        _ => Err(format!("game {run_id} did not finish")),
    }
}

#[derive(Debug, Default)]
pub(super) struct RelaySummary {
    pub last_kind: Option<TurnEventKind>,
    pub write_error: Option<String>,
}

/// Prints every event as an SSE frame. A failed write stops the printing but
/// not the draining: the stream only ends once the run has been recorded, and
/// returning early would let the runtime shut down before that happens.
pub(super) async fn relay_events<S, W>(mut events: S, mut out: W) -> RelaySummary
where
    S: Stream<Item = TurnEvent> + Unpin,
    W: Write,
{
    let mut summary = RelaySummary::default();
    while let Some(event) = events.next().await {
        summary.last_kind = Some(event.kind);
        if summary.write_error.is_some() {
            continue;
        }
        let written = out
            .write_all(event.to_sse_frame().as_bytes())
            .and_then(|()| out.flush());
        if let Err(error) = written {
            log::debug!("event output closed: {error}");
            summary.write_error = Some(error.to_string());
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    use futures::future::BoxFuture;

    use super::relay_events;
    use crate::core::game::{Game, GameRequest, GameRun, TurnEventKind};
    use crate::core::ports::llm::{DynError, LlmChatRequest, LlmPort, StreamEvent};
    use crate::core::ports::store::{StoreError, StorePort};

    struct EchoLlm;

    impl LlmPort for EchoLlm {
        fn chat_stream<'a>(
            &'a self,
            request: LlmChatRequest<'a>,
        ) -> BoxFuture<'a, Result<(), DynError>> {
            Box::pin(async move {
                // Yield so the consumer gets to run between turns.
                tokio::task::yield_now().await;
                let reply = format!("{} says hi", request.model);
                let _ = request.tx.send(StreamEvent::Text(reply));
                let _ = request.tx.send(StreamEvent::Done);
                Ok(())
            })
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        runs: Mutex<Vec<GameRun>>,
    }

    impl StorePort for MemoryStore {
        fn persist(&self, run: &GameRun) -> Result<(), StoreError> {
            self.runs.lock().expect("store lock").push(run.clone());
            Ok(())
        }
    }

    /// Accepts the first frame, then behaves like a closed pipe.
    #[derive(Default)]
    struct ClosedAfterFirstFrame {
        frames: usize,
    }

    impl Write for ClosedAfterFirstFrame {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.frames >= 1 {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "Broken pipe"));
            }
            self.frames += 1;
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn request() -> GameRequest {
        GameRequest {
            participant_model: "p/one".to_string(),
            interrogator_model: "i/one".to_string(),
            num_questions: 2,
            run_by: "test".to_string(),
        }
    }

    #[test]
    fn closed_output_still_records_run_before_runtime_shuts_down() {
        let store = Arc::new(MemoryStore::default());
        let game = Arc::new(Game::new(Arc::new(EchoLlm), store.clone()));

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .expect("runtime");
        let summary = runtime.block_on(async {
            let events = game.stream(request()).expect("valid request");
            relay_events(events, ClosedAfterFirstFrame::default()).await
        });
        drop(runtime);

        assert_eq!(summary.write_error.as_deref(), Some("Broken pipe"));
        assert_eq!(summary.last_kind, Some(TurnEventKind::Judgment));
        assert_eq!(store.runs.lock().expect("store lock").len(), 1);
    }

    #[tokio::test]
    async fn frames_are_written_in_order() {
        let game = Arc::new(Game::new(Arc::new(EchoLlm), Arc::new(MemoryStore::default())));
        let events = game.stream(request()).expect("valid request");

        let mut out = Vec::new();
        let summary = relay_events(events, &mut out).await;

        assert!(summary.write_error.is_none());
        let text = String::from_utf8(out).expect("utf8 output");
        let frames = text.split_terminator("\n\n").collect::<Vec<_>>();
        assert_eq!(frames.len(), 5);
        assert!(frames.iter().all(|f| f.starts_with("data: {")));
        assert!(frames[4].contains("\"kind\":\"judgment\""));
    }
}
