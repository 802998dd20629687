use serde::Serialize;

use crate::adapters::catalog::fetch_text_models;
use crate::adapters::config::Settings;

use super::shared::{print_json, provider_base_url};

#[derive(Debug, Serialize)]
struct ApiKeyStatus {
    provider: String,
    api_key_set: bool,
}

pub async fn list_models() -> Result<(), String> {
    let settings = Settings::load_global();
    let base_url = provider_base_url(&settings)?;
    let api_key = settings.api_key();
    let catalog = fetch_text_models(&base_url, api_key.as_deref())
        .await
        .map_err(|e| e.to_string())?;
    print_json(&catalog)
}

pub async fn check_api_key() -> Result<(), String> {
    let settings = Settings::load_global();
    print_json(&ApiKeyStatus {
        provider: settings.provider.clone(),
        api_key_set: settings.has_api_key(),
    })
}
