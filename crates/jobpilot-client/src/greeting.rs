use jobpilot_core::error::AppError;
use jobpilot_core::models::JobListing;
use jobpilot_core::traits::{GreetingComposer, TemplateGreeting};

use crate::chat::ChatClient;

const SYSTEM_PROMPT: &str = "You write short, professional first messages from a job \
     seeker to a recruiter. One paragraph, no more than 120 words, no placeholders, \
     no subject line. Mention the role by name and one concrete relevant strength \
     from the candidate profile.";

const MAX_GREETING_CHARS: usize = 600;

/// LLM-personalized greeting composer.
///
/// Falls back to the plain deterministic template whenever generation
/// fails or returns something unusable, so applying never blocks on the
/// generation service.
#[derive(Clone)]
pub struct LlmGreeter {
    chat: ChatClient,
}

impl LlmGreeter {
    pub fn new(chat: ChatClient) -> Self {
        Self { chat }
    }

    async fn generate(
        &self,
        listing: &JobListing,
        profile_text: &str,
    ) -> Result<String, AppError> {
        let user = format!(
            "Role: {} at {}\n\nCandidate profile:\n{profile_text}",
            listing.title, listing.company
        );
        let reply = self.chat.complete(SYSTEM_PROMPT, &user, false).await?;
        let cleaned = sanitize(&reply);
        if cleaned.is_empty() {
            return Err(AppError::ParseError("empty greeting from model".into()));
        }
        Ok(cleaned)
    }
}

impl GreetingComposer for LlmGreeter {
    async fn compose(&self, listing: &JobListing, profile_text: &str) -> String {
        match self.generate(listing, profile_text).await {
            Ok(greeting) => greeting,
            Err(e) => {
                tracing::warn!(job_id = %listing.id, error = %e, "Greeting generation failed, using template");
                TemplateGreeting::render(listing)
            }
        }
    }
}

/// Collapse whitespace runs into single spaces and cap the length, since
/// recruiting chat boxes reject long or multi-line first messages.
fn sanitize(text: &str) -> String {
    let mut cleaned: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.len() > MAX_GREETING_CHARS {
        let cut = cleaned
            .char_indices()
            .take_while(|(i, _)| *i < MAX_GREETING_CHARS)
            .map(|(i, c)| i + c.len_utf8())
            .last()
            .unwrap_or(0);
        cleaned.truncate(cut);
    }
    cleaned
}
