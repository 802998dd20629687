use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::adapters::llm::ProviderAccess;

/// Bump this when adding new fields with non-trivial defaults.
/// When a loaded config has a lower version, it is re-saved to disk
/// so that users see the new keys in their `config.toml`.
const CURRENT_CONFIG_VERSION: u32 = 1;

const PLACEHOLDER_API_KEYS: &[&str] = &[
    "YOUR_OPENROUTER_API_KEY",
    "your_openrouter_api_key_here",
    "insert_your_openrouter_api_key",
];

fn default_provider() -> String {
    "openrouter".to_string()
}

fn default_participant_model() -> String {
    "moonshotai/kimi-k2".to_string()
}

fn default_interrogator_model() -> String {
    "openai/gpt-4o-mini".to_string()
}

fn default_num_questions() -> u32 {
    5
}

fn default_llm_response_timeout_ms() -> u64 {
    180_000
}

fn default_run_by() -> String {
    "cli".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Settings {
    pub config_version: u32,
    #[serde(default = "default_provider")]
    pub provider: String,
    pub provider_base_url: Option<String>,
    #[serde(default)]
    pub api_keys: HashMap<String, String>,
    #[serde(default = "default_participant_model")]
    pub participant_model: String,
    #[serde(default = "default_interrogator_model")]
    pub interrogator_model: String,
    #[serde(default = "default_num_questions")]
    pub num_questions: u32,
    #[serde(default = "default_llm_response_timeout_ms")]
    pub llm_response_timeout_ms: u64,
    pub db_path: Option<String>,
    #[serde(default = "default_run_by")]
    pub run_by: String,
    pub http_referer: Option<String>,
    pub app_title: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_version: 0,
            provider: default_provider(),
            provider_base_url: None,
            api_keys: HashMap::new(),
            participant_model: default_participant_model(),
            interrogator_model: default_interrogator_model(),
            num_questions: default_num_questions(),
            llm_response_timeout_ms: default_llm_response_timeout_ms(),
            db_path: None,
            run_by: default_run_by(),
            http_referer: None,
            app_title: Some("Turing Arena".to_string()),
        }
    }
}

impl Settings {
    fn global_config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".turing-arena")
    }

    fn global_config_path() -> PathBuf {
        Self::global_config_dir().join("config.toml")
    }

    /// Loads `~/.turing-arena/config.toml` and applies environment overrides.
    pub fn load_global() -> Self {
        let mut settings = Self::load_file();
        settings.apply_env_overrides(|name| std::env::var(name).ok());
        settings
    }

    fn load_file() -> Self {
        let path = Self::global_config_path();
        if !path.exists() {
            return Self {
                config_version: CURRENT_CONFIG_VERSION,
                ..Self::default()
            };
        }

        let content = std::fs::read_to_string(&path).unwrap_or_default();
        let mut settings: Self = match toml::from_str(&content) {
            Ok(s) => s,
            Err(e) => {
                log::warn!("failed to parse {}: {e}. Using defaults.", path.display());
                Self::default()
            }
        };

        // Re-save when config is from an older version so new fields
        // (with their defaults) appear in the file on disk.
        if settings.config_version < CURRENT_CONFIG_VERSION {
            settings.config_version = CURRENT_CONFIG_VERSION;
            if let Err(e) = settings.save() {
                log::warn!("failed to migrate config to v{CURRENT_CONFIG_VERSION}: {e}");
            }
        }

        settings
    }

    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let global_dir = Self::global_config_dir();
        std::fs::create_dir_all(&global_dir)?;
        let content = toml::to_string_pretty(self)?;
        std::fs::write(Self::global_config_path(), &content)?;
        Ok(())
    }

    /// Environment wins over the file. `lookup` is injectable for tests.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(key) = non_empty("OPENROUTER_API_KEY") {
            self.set_api_key("openrouter", &key);
        }
        if let Some(key) = non_empty("TURING_ARENA_API_KEY") {
            let provider = self.provider.clone();
            self.set_api_key(&provider, &key);
        }
        if let Some(referer) = non_empty("HTTP_REFERER") {
            self.http_referer = Some(referer.trim().to_string());
        }
        if let Some(title) = non_empty("X_TITLE") {
            self.app_title = Some(title.trim().to_string());
        }
        if let Some(db_path) = non_empty("TURING_ARENA_DB") {
            self.db_path = Some(db_path.trim().to_string());
        }
    }

    pub fn set_api_key(&mut self, provider: &str, key: &str) {
        let normalized_provider = provider.trim().to_ascii_lowercase();
        if normalized_provider.is_empty() {
            return;
        }
        let normalized_key = key.trim().to_string();
        if normalized_key.is_empty() {
            self.api_keys.remove(&normalized_provider);
        } else {
            self.api_keys.insert(normalized_provider, normalized_key);
        }
    }

    /// The key for the active provider, ignoring template placeholders.
    pub fn api_key(&self) -> Option<String> {
        let normalized_provider = self.provider.trim().to_ascii_lowercase();
        self.api_keys
            .get(&normalized_provider)
            .map(|key| key.trim())
            .filter(|key| !key.is_empty() && !PLACEHOLDER_API_KEYS.contains(key))
            .map(ToOwned::to_owned)
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key().is_some()
    }

    pub fn num_questions(&self) -> u32 {
        self.num_questions.max(1)
    }

    pub fn llm_response_timeout(&self) -> Duration {
        Duration::from_millis(self.llm_response_timeout_ms.clamp(1_000, 600_000))
    }

    pub fn db_path(&self) -> PathBuf {
        match self.db_path.as_deref().map(str::trim) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => Self::global_config_dir().join("turing_test_db.sqlite"),
        }
    }

    pub fn provider_access(&self) -> ProviderAccess {
        ProviderAccess {
            provider: self.provider.trim().to_ascii_lowercase(),
            api_key: self.api_key().unwrap_or_default(),
            base_url: self
                .provider_base_url
                .as_deref()
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(ToOwned::to_owned),
            http_referer: self.http_referer.clone(),
            app_title: self.app_title.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Settings;
    use std::collections::HashMap;
    use std::time::Duration;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_match_original_game_setup() {
        let settings = Settings::default();
        assert_eq!(settings.provider, "openrouter");
        assert_eq!(settings.participant_model, "moonshotai/kimi-k2");
        assert_eq!(settings.interrogator_model, "openai/gpt-4o-mini");
        assert_eq!(settings.num_questions(), 5);
        assert_eq!(settings.run_by, "cli");
        assert!(!settings.has_api_key());
    }

    #[test]
    fn env_overrides_key_headers_and_db() {
        let mut settings = Settings::default();
        settings.apply_env_overrides(env(&[
            ("OPENROUTER_API_KEY", " sk-or-123 "),
            ("HTTP_REFERER", "https://arena.example"),
            ("X_TITLE", "Arena"),
            ("TURING_ARENA_DB", "/tmp/arena.sqlite"),
        ]));

        assert_eq!(settings.api_key().as_deref(), Some("sk-or-123"));
        assert_eq!(settings.http_referer.as_deref(), Some("https://arena.example"));
        assert_eq!(settings.app_title.as_deref(), Some("Arena"));
        assert_eq!(settings.db_path(), std::path::PathBuf::from("/tmp/arena.sqlite"));
    }

    #[test]
    fn generic_key_applies_to_active_provider() {
        let mut settings = Settings {
            provider: "openai".to_string(),
            ..Settings::default()
        };
        settings.apply_env_overrides(env(&[("TURING_ARENA_API_KEY", "sk-openai")]));
        assert_eq!(settings.api_key().as_deref(), Some("sk-openai"));
        assert_eq!(settings.provider_access().provider, "openai");
    }

    #[test]
    fn placeholder_key_counts_as_unset() {
        let mut settings = Settings::default();
        settings.set_api_key("openrouter", "YOUR_OPENROUTER_API_KEY");
        assert!(!settings.has_api_key());
        assert_eq!(settings.provider_access().api_key, "");
    }

    #[test]
    fn empty_key_clears_existing_entry() {
        let mut settings = Settings::default();
        settings.set_api_key("OpenRouter", "sk-1");
        assert!(settings.has_api_key());
        settings.set_api_key("openrouter", "   ");
        assert!(!settings.has_api_key());
    }

    #[test]
    fn numeric_settings_are_clamped() {
        let settings = Settings {
            num_questions: 0,
            llm_response_timeout_ms: 5,
            ..Settings::default()
        };
        assert_eq!(settings.num_questions(), 1);
        assert_eq!(settings.llm_response_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn old_config_without_version_gets_defaults_on_deserialize() {
        let settings: Settings =
            toml::from_str("provider = \"ollama\"\n").expect("parse partial config");
        assert_eq!(settings.config_version, 0);
        assert_eq!(settings.provider, "ollama");
        assert_eq!(settings.interrogator_model, "openai/gpt-4o-mini");
        assert_eq!(settings.llm_response_timeout_ms, 180_000);
    }

    #[test]
    fn settings_round_trip_through_toml() {
        let mut settings = Settings::default();
        settings.set_api_key("openrouter", "sk-1");
        settings.db_path = Some("/data/runs.sqlite".to_string());
        let content = toml::to_string_pretty(&settings).expect("serialize");
        let back: Settings = toml::from_str(&content).expect("deserialize");
        assert_eq!(back.api_key().as_deref(), Some("sk-1"));
        assert_eq!(back.db_path, settings.db_path);
    }
}
