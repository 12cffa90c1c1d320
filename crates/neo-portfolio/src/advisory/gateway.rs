use serde::Deserialize;
use serde_json::json;

use super::decoder::decode_payload;
use super::{AdvisoryError, MilestoneDraft, ValuationAdvisor, ValuationEstimate};
use crate::config::AdvisoryConfig;
use crate::portfolio::domain::Asset;

/// Thin client for the Gemini `generateContent` REST endpoint. Structured
/// JSON output is requested through the generation config; the reply text
/// still goes through the fence-stripping decoder before it is trusted.
#[derive(Debug, Clone)]
pub struct GeminiValuationClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    valuation_model: String,
    plan_model: String,
}

impl GeminiValuationClient {
    pub fn from_config(config: &AdvisoryConfig) -> Result<Self, AdvisoryError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| AdvisoryError::Unavailable("no advisory API key configured".to_string()))?;

        Ok(Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            valuation_model: config.valuation_model.clone(),
            plan_model: config.plan_model.clone(),
        })
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<String, AdvisoryError> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "responseMimeType": "application/json" }
        });

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| AdvisoryError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdvisoryError::Transport(format!(
                "advisory endpoint returned {status}"
            )));
        }

        let envelope: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| AdvisoryError::MalformedResponse(err.to_string()))?;

        envelope.first_text().ok_or_else(|| {
            AdvisoryError::MalformedResponse("reply contained no candidate text".to_string())
        })
    }
}

#[async_trait::async_trait]
impl ValuationAdvisor for GeminiValuationClient {
    async fn estimate_valuation(&self, asset: &Asset) -> Result<ValuationEstimate, AdvisoryError> {
        let prompt = valuation_prompt(asset);
        let reply = self.generate(&self.valuation_model, &prompt).await?;
        decode_payload(&reply)
    }

    async fn generate_payment_plan(
        &self,
        asset_name: &str,
        total_value: f64,
    ) -> Result<Vec<MilestoneDraft>, AdvisoryError> {
        let prompt = payment_plan_prompt(asset_name, total_value);
        let reply = self.generate(&self.plan_model, &prompt).await?;
        decode_payload(&reply)
    }
}

fn valuation_prompt(asset: &Asset) -> String {
    format!(
        "Act as a Dubai real-estate valuation expert. Estimate the current market price in AED \
         for the following property:\n\
         - Building: {}\n\
         - Area: {}\n\
         - Type: {}\n\
         - Size: {} sqft\n\
         - Bedrooms: {}\n\
         Return a JSON object with estimatedValue (number, AED), confidence (number, 0-1), \
         and reasoning (string).",
        asset.building_name, asset.area, asset.asset_type, asset.size, asset.bedrooms
    )
}

fn payment_plan_prompt(asset_name: &str, total_value: f64) -> String {
    format!(
        "Generate a realistic 50/50 or 60/40 construction-linked payment plan for an off-plan \
         property named \"{asset_name}\" with a total value of {total_value} AED. Include 5-7 \
         milestones whose percentages sum to exactly 100. Return a JSON array of objects with \
         milestone (string), percent (number), and date (ISO date string)."
    )
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content
            .parts
            .into_iter()
            .find_map(|part| part.text)
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}
