//! Cover letter generation. Fills the prompt template, calls the model once, and always
//! hands back usable text within the job board's length limit.
//!
//! Generation failures never reach the workflow: they are logged and replaced by
//! `FALLBACK_COVER_LETTER`.

use std::sync::Arc;

use tracing::{info, warn};

use crate::generation::prompts::{DEFAULT_COVER_LETTER_PROMPT, FALLBACK_COVER_LETTER};
use crate::jobboard::types::{clamp_cover_letter, COVER_LETTER_LIMIT};
use crate::llm_client::TextGenerator;
use crate::models::config::Expertise;

#[derive(Clone)]
pub struct CoverLetterGenerator {
    generator: Arc<dyn TextGenerator>,
    template: String,
    expertise: Expertise,
}

impl CoverLetterGenerator {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        template: Option<String>,
        expertise: Expertise,
    ) -> Self {
        Self {
            generator,
            template: template.unwrap_or_else(|| DEFAULT_COVER_LETTER_PROMPT.to_string()),
            expertise,
        }
    }

    /// Never fails; at most `COVER_LETTER_LIMIT` characters.
    pub async fn generate(&self, job_description: &str) -> String {
        let prompt = render_prompt(&self.template, job_description, &self.expertise);

        info!("Generating personalized cover letter");
        let text = match self.generator.generate(&prompt).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!("Cover letter generation failed, using fallback: {e}");
                return FALLBACK_COVER_LETTER.to_string();
            }
        };

        if text.is_empty() {
            warn!("Model returned an empty cover letter, using fallback");
            return FALLBACK_COVER_LETTER.to_string();
        }

        let length = text.chars().count();
        if length > COVER_LETTER_LIMIT {
            warn!("Cover letter too long ({length} chars), truncating to {COVER_LETTER_LIMIT}");
        }
        let letter = clamp_cover_letter(&text);
        info!("Cover letter ready ({} characters)", letter.chars().count());
        letter
    }
}

/// Substitutes job and applicant fields into every occurrence of each placeholder.
pub fn render_prompt(template: &str, job_description: &str, expertise: &Expertise) -> String {
    template
        .replace("{jobDescription}", job_description)
        .replace("{skills}", &expertise.skills.join(", "))
        .replace("{experience}", &expertise.experience.join(". "))
        .replace(
            "{education}",
            expertise.education.as_deref().unwrap_or("Not specified"),
        )
        .replace("{languages}", &expertise.languages.join(", "))
        .replace(
            "{additionalInfo}",
            expertise.additional_info.as_deref().unwrap_or(""),
        )
}
