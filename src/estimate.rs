//! Price estimates and nearby-store hints from the Gemini REST API.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::Config;

pub const NO_KEY_ESTIMATE: &str = "Consultar con profesional";
pub const NO_KEY_INFO: &str = "AI assistant unavailable (missing API key)";
pub const FALLBACK_ESTIMATE: &str = "A convenir";
pub const FALLBACK_INFO: &str = "Could not reach the AI assistant.";
pub const LOCATION_PROCESSED: &str = "Location processed.";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub uri: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceEstimate {
    pub estimate: String,
    pub info: String,
    pub map_text: Option<String>,
    pub sources: Vec<Source>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EstimateQuery {
    pub service_name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, thiserror::Error)]
enum GeminiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upstream returned {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Default, Deserialize)]
struct GroundingChunk {
    web: Option<ChunkLink>,
    maps: Option<ChunkLink>,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkLink {
    uri: Option<String>,
    title: Option<String>,
}

impl GenerateResponse {
    fn text(&self) -> Option<String> {
        let text: String = self
            .candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    fn sources(&self) -> Vec<Source> {
        let Some(metadata) = self
            .candidates
            .first()
            .and_then(|candidate| candidate.grounding_metadata.as_ref())
        else {
            return Vec::new();
        };
        metadata
            .grounding_chunks
            .iter()
            .flat_map(|chunk| [chunk.web.as_ref(), chunk.maps.as_ref()])
            .flatten()
            .filter_map(|link| match (&link.title, &link.uri) {
                (Some(title), Some(uri)) if !title.is_empty() && !uri.is_empty() => Some(Source {
                    title: title.clone(),
                    uri: uri.clone(),
                }),
                _ => None,
            })
            .collect()
    }
}

#[derive(Clone)]
pub struct PriceEstimator {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl PriceEstimator {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key: config.gemini_api_key.clone(),
            base_url: config.gemini_base_url.clone(),
            model: config.gemini_model.clone(),
        })
    }

    pub fn enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// Never fails: upstream problems turn into fallback text.
    pub async fn estimate(&self, query: &EstimateQuery) -> PriceEstimate {
        let Some(api_key) = self.api_key.as_deref() else {
            return PriceEstimate {
                estimate: NO_KEY_ESTIMATE.to_string(),
                info: NO_KEY_INFO.to_string(),
                map_text: None,
                sources: Vec::new(),
            };
        };

        let estimate = match self
            .generate(api_key, &price_prompt(query), json!({ "google_search": {} }))
            .await
        {
            Ok(response) => response.text().unwrap_or_else(|| FALLBACK_ESTIMATE.to_string()),
            Err(err) => {
                log::warn!("Gemini price estimate failed: {err}");
                FALLBACK_ESTIMATE.to_string()
            }
        };

        match self
            .generate(api_key, &maps_prompt(query), json!({ "google_maps": {} }))
            .await
        {
            Ok(response) => {
                let map_text = response.text();
                PriceEstimate {
                    estimate,
                    info: map_text
                        .clone()
                        .unwrap_or_else(|| LOCATION_PROCESSED.to_string()),
                    sources: response.sources(),
                    map_text,
                }
            }
            Err(err) => {
                log::warn!("Gemini maps lookup failed: {err}");
                PriceEstimate {
                    estimate,
                    info: FALLBACK_INFO.to_string(),
                    map_text: None,
                    sources: Vec::new(),
                }
            }
        }
    }

    async fn generate(
        &self,
        api_key: &str,
        prompt: &str,
        tool: serde_json::Value,
    ) -> Result<GenerateResponse, GeminiError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "tools": [tool],
        });
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(GeminiError::Status(response.status()));
        }
        Ok(response.json::<GenerateResponse>().await?)
    }
}

fn price_prompt(query: &EstimateQuery) -> String {
    format!(
        "Soy un usuario en Argentina, {location}. Necesito un servicio de {service}.\n\
         El problema es: \"{description}\".\n\
         Busca precios actuales de mano de obra en Argentina para esto.\n\
         Dame UNICAMENTE un rango de precios estimado en Pesos Argentinos (ARS).\n\
         Sé breve. Ejemplo: \"$15.000 - $30.000 ARS\".",
        location = query.location,
        service = query.service_name,
        description = query.description,
    )
}

fn maps_prompt(query: &EstimateQuery) -> String {
    format!(
        "El usuario está en: {location}.\n\
         Verifica si esta ubicación existe en Argentina.\n\
         Lista 2 ferreterías o tiendas de materiales cercanas que podrían servir para un trabajo de {service}.\n\
         Formato breve en español.",
        location = query.location,
        service = query.service_name,
    )
}
