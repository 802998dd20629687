use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::adapters::providers::models_endpoint;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to fetch model catalog: {0}")]
    Http(#[from] reqwest::Error),
    #[error("model catalog returned {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelArchitecture {
    #[serde(default)]
    pub input_modalities: Vec<String>,
    #[serde(default)]
    pub output_modalities: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogModel {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<ModelArchitecture>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CatalogModel {
    /// `text` must appear among both the declared input and output modalities.
    pub fn supports_text_modalities(&self) -> bool {
        let Some(architecture) = self.architecture.as_ref() else {
            return false;
        };
        let has_text = |modalities: &[String]| modalities.iter().any(|m| m == "text");
        has_text(&architecture.input_modalities) && has_text(&architecture.output_modalities)
    }

    pub fn provider_prefix(&self) -> &str {
        self.id.split('/').next().unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct CatalogResponse {
    #[serde(default)]
    data: Vec<CatalogModel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TextModelCatalog {
    pub models: Vec<CatalogModel>,
    pub providers: Vec<String>,
}

impl TextModelCatalog {
    pub fn from_models(all_models: Vec<CatalogModel>) -> Self {
        let models = all_models
            .into_iter()
            .filter(CatalogModel::supports_text_modalities)
            .collect::<Vec<_>>();

        let mut providers = models
            .iter()
            .map(|model| model.provider_prefix().to_string())
            .filter(|prefix| !prefix.is_empty())
            .collect::<Vec<_>>();
        providers.sort();
        providers.dedup();

        Self { models, providers }
    }
}

/// Lists the models at `{base_url}/models` that accept and produce text.
pub async fn fetch_text_models(
    base_url: &str,
    api_key: Option<&str>,
) -> Result<TextModelCatalog, CatalogError> {
    let client = reqwest::Client::new();
    let mut request = client.get(models_endpoint(base_url));
    if let Some(key) = api_key.map(str::trim).filter(|key| !key.is_empty()) {
        request = request.bearer_auth(key);
    }

    let response = request.send().await?;
    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(CatalogError::Status { status, body });
    }

    let catalog = response.json::<CatalogResponse>().await?;
    log::debug!("model catalog returned {} entries", catalog.data.len());
    Ok(TextModelCatalog::from_models(catalog.data))
}
