// Shared prompt constants.
// Feature-specific prompt templates live next to the feature (see generation/prompts.rs).

/// System prompt for calls that expect prose back, not JSON.
pub const PLAIN_TEXT_SYSTEM: &str = "You are a concise professional writer. \
    Respond with the requested text only. \
    Do NOT add a preamble, headings, markdown, or placeholder brackets.";
