// Inbound post triage: keyword relevance and job id extraction.
// Both are pure; the workflow decides what to do with the results.

pub mod job_ref;
pub mod keywords;

pub use job_ref::{extract_job_reference, JobReference};
pub use keywords::{match_keywords, KeywordMatchResult, KeywordMatcher};
