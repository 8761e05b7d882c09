use jobpilot_core::config::ScorerConfig;
use jobpilot_core::error::AppError;
use jobpilot_core::models::RelevanceReport;
use jobpilot_core::traits::RelevanceScorer;
use serde::Deserialize;

use crate::chat::ChatClient;

const SYSTEM_PROMPT: &str = "You are a recruiting assistant. Score how well a candidate \
     profile matches a job description. Respond ONLY with a JSON object with integer \
     fields total_score, skill_score, experience_score, education_score, industry_score \
     (each 0-100), a boolean field recommend, and a string field analysis with a short \
     justification.";

/// LLM-backed relevance scorer.
///
/// Infallible by contract: every transport, API, or parse failure is
/// logged and mapped to the fixed neutral fallback report, so a scoring
/// outage degrades ranking quality without stopping the pipeline.
#[derive(Clone)]
pub struct OpenAiScorer {
    chat: ChatClient,
}

impl OpenAiScorer {
    pub fn new(api_key: &str, cfg: &ScorerConfig) -> Result<Self, AppError> {
        Ok(Self {
            chat: ChatClient::new(api_key, &cfg.model, &cfg.base_url)?,
        })
    }

    async fn request_score(
        &self,
        job_description: &str,
        profile_text: &str,
    ) -> Result<RelevanceReport, AppError> {
        let user = format!(
            "Job description:\n{job_description}\n\nCandidate profile:\n{profile_text}"
        );
        let content = self.chat.complete(SYSTEM_PROMPT, &user, true).await?;
        parse_report(&content)
    }
}

impl RelevanceScorer for OpenAiScorer {
    async fn score(&self, job_description: &str, profile_text: &str) -> RelevanceReport {
        match self.request_score(job_description, profile_text).await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(error = %e, "Scoring failed, using neutral fallback");
                RelevanceReport::fallback()
            }
        }
    }
}

#[derive(Deserialize)]
struct RawReport {
    total_score: i64,
    #[serde(default)]
    skill_score: i64,
    #[serde(default)]
    experience_score: i64,
    #[serde(default)]
    education_score: i64,
    #[serde(default)]
    industry_score: i64,
    #[serde(default)]
    recommend: bool,
    #[serde(default)]
    analysis: String,
}

const MAX_ANALYSIS_CHARS: usize = 200;

/// Parse a model reply into a report, clamping every score to 0-100 and
/// the analysis to its length bound. Tolerates markdown code fences
/// around the JSON object.
fn parse_report(content: &str) -> Result<RelevanceReport, AppError> {
    let raw: RawReport = serde_json::from_str(strip_fences(content))
        .map_err(|e| AppError::ParseError(format!("scorer returned invalid JSON: {e}")))?;
    Ok(RelevanceReport {
        total_score: clamp_score(raw.total_score),
        skill_score: clamp_score(raw.skill_score),
        experience_score: clamp_score(raw.experience_score),
        education_score: clamp_score(raw.education_score),
        industry_score: clamp_score(raw.industry_score),
        recommend: raw.recommend,
        analysis: clamp_analysis(raw.analysis),
    })
}

fn clamp_score(value: i64) -> u8 {
    value.clamp(0, 100) as u8
}

fn clamp_analysis(mut analysis: String) -> String {
    if let Some((cut, _)) = analysis.char_indices().nth(MAX_ANALYSIS_CHARS) {
        analysis.truncate(cut);
    }
    analysis
}

fn strip_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}
