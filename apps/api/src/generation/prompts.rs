// Cover letter prompt template and the fixed letters used when no model output is usable.

/// Template used when the bot config carries no `aiPrompt`.
/// Placeholders: {jobDescription} {skills} {experience} {education} {languages} {additionalInfo}
pub const DEFAULT_COVER_LETTER_PROMPT: &str = r#"Write a cover letter for the job below.

JOB DESCRIPTION:
{jobDescription}

APPLICANT:
- Skills: {skills}
- Experience: {experience}
- Education: {education}
- Languages: {languages}
- Additional information: {additionalInfo}

Rules:
- At most 900 characters.
- Plain text, no greeting placeholders such as [Company Name].
- Mention only skills and experience listed above.
- Close with a short thank-you."#;

/// Returned whenever generation fails or produces nothing.
pub const FALLBACK_COVER_LETTER: &str = "I am writing to express my strong interest in this position. With my technical skills and experience in software development, I am confident I would be a valuable addition to your team. I am eager to contribute to your organization and grow professionally. Thank you for considering my application.";

/// Used for placeholder jobs, which have no real posting to write against.
pub const PLACEHOLDER_COVER_LETTER: &str =
    "Manual Application - No Job ID found. Please write cover letter manually.";

/// Description used when neither the post nor the job board gave one.
pub const UNKNOWN_JOB_DESCRIPTION: &str = "Software Job";
