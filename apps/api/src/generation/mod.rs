// Cover letter generation.
// All model calls go through llm_client; this module owns the prompt and length policy.

pub mod cover_letter;
pub mod prompts;

pub use cover_letter::CoverLetterGenerator;
