use std::io::Write;
use std::sync::Arc;

use serde::Serialize;

use crate::adapters::config::Settings;
use crate::adapters::llm::ChatLlmAdapter;
use crate::adapters::providers::ProviderRegistry;
use crate::adapters::store::{RunDb, SqliteRunStore};
use crate::core::game::{Game, GameRequest};

use super::super::PlayArgs;

pub fn build_game(settings: &Settings) -> Game {
    let llm = Arc::new(ChatLlmAdapter::new(settings.provider_access()));
    let store = Arc::new(SqliteRunStore::new(settings.db_path()));
    Game::new(llm, store).with_llm_response_timeout(settings.llm_response_timeout())
}

pub fn open_run_db(settings: &Settings) -> Result<RunDb, String> {
    RunDb::open(&settings.db_path()).map_err(|e| e.to_string())
}

/// Flags win over config; config supplies whatever was left out.
pub fn game_request(args: PlayArgs, settings: &Settings) -> GameRequest {
    GameRequest {
        participant_model: args
            .participant
            .unwrap_or_else(|| settings.participant_model.clone()),
        interrogator_model: args
            .interrogator
            .unwrap_or_else(|| settings.interrogator_model.clone()),
        num_questions: args.questions.unwrap_or_else(|| settings.num_questions()),
        run_by: args.run_by.unwrap_or_else(|| settings.run_by.clone()),
    }
}

pub fn provider_base_url(settings: &Settings) -> Result<String, String> {
    let access = settings.provider_access();
    if let Some(base_url) = access.base_url {
        return Ok(base_url);
    }
    let registry = ProviderRegistry::default();
    let provider = registry.resolve_llm(&access.provider).map_err(|e| {
        format!("{e} (known providers: {})", registry.llm_provider_ids().join(", "))
    })?;
    Ok(provider.default_base_url().to_string())
}

pub fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let rendered = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{rendered}").map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::{game_request, provider_base_url};
    use crate::adapters::config::Settings;
    use crate::runtime::cli::PlayArgs;

    #[test]
    fn request_falls_back_to_settings() {
        let settings = Settings::default();
        let request = game_request(
            PlayArgs {
                questions: Some(2),
                ..PlayArgs::default()
            },
            &settings,
        );
        assert_eq!(request.participant_model, "moonshotai/kimi-k2");
        assert_eq!(request.interrogator_model, "openai/gpt-4o-mini");
        assert_eq!(request.num_questions, 2);
        assert_eq!(request.run_by, "cli");
    }

    #[test]
    fn explicit_zero_questions_reaches_validation() {
        let request = game_request(
            PlayArgs {
                questions: Some(0),
                ..PlayArgs::default()
            },
            &Settings::default(),
        );
        assert!(request.validate().is_err());
    }

    #[test]
    fn base_url_prefers_config_then_registry() {
        let mut settings = Settings::default();
        assert_eq!(
            provider_base_url(&settings).expect("openrouter"),
            "https://openrouter.ai/api/v1"
        );

        settings.provider_base_url = Some("http://gateway.local/v1".to_string());
        assert_eq!(
            provider_base_url(&settings).expect("override"),
            "http://gateway.local/v1"
        );

        settings.provider_base_url = None;
        settings.provider = "nope".to_string();
        let err = provider_base_url(&settings).expect_err("unknown provider");
        assert!(err.starts_with("Unsupported LLM provider: nope"));
        assert!(err.contains("lm_studio, ollama, openai, openrouter"));
    }
}
