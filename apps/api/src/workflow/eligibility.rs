use chrono::{DateTime, Utc};

use crate::intake::JobReference;
use crate::jobboard::JobPosting;

use super::outcome::ErrorKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    /// No authoritative posting to check against; proceed with what the post says.
    BestEffort,
    NotApproved,
    Expired,
}

impl Eligibility {
    /// The failure this verdict maps to, if any.
    pub fn rejection(&self) -> Option<(ErrorKind, &'static str)> {
        match self {
            Eligibility::NotApproved => {
                Some((ErrorKind::NotApproved, "Job is not approved for application"))
            }
            Eligibility::Expired => Some((ErrorKind::Expired, "Job deadline has passed")),
            Eligibility::Eligible | Eligibility::BestEffort => None,
        }
    }
}

/// Placeholder jobs are never rejected. Real jobs need approval status "approved" and a
/// deadline that has not passed; without posting details they proceed best-effort.
pub fn check_eligibility(
    job: &JobReference,
    posting: Option<&JobPosting>,
    now: DateTime<Utc>,
) -> Eligibility {
    match (job, posting) {
        (JobReference::Placeholder(_), _) => Eligibility::BestEffort,
        (JobReference::Real(_), None) => Eligibility::BestEffort,
        (JobReference::Real(_), Some(posting)) if !posting.is_approved() => Eligibility::NotApproved,
        (JobReference::Real(_), Some(posting)) if posting.is_expired(now) => Eligibility::Expired,
        (JobReference::Real(_), Some(_)) => Eligibility::Eligible,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn posting(status: &str, deadline: Option<DateTime<Utc>>) -> JobPosting {
        JobPosting {
            id: "job-1".to_string(),
            title: Some("Engineer".to_string()),
            approval_status: Some(status.to_string()),
            deadline,
            description: None,
            company: None,
            job_type: None,
            location: None,
            experience_level: None,
        }
    }

    fn real() -> JobReference {
        JobReference::Real("job-1".to_string())
    }

    #[test]
    fn test_approved_future_deadline_is_eligible() {
        let now = Utc::now();
        let p = posting("approved", Some(now + Duration::days(3)));
        assert_eq!(check_eligibility(&real(), Some(&p), now), Eligibility::Eligible);
    }

    #[test]
    fn test_unapproved_is_rejected() {
        let now = Utc::now();
        let p = posting("pending", Some(now + Duration::days(3)));
        let verdict = check_eligibility(&real(), Some(&p), now);
        assert_eq!(verdict, Eligibility::NotApproved);
        assert_eq!(verdict.rejection().unwrap().0, ErrorKind::NotApproved);
    }

    #[test]
    fn test_passed_deadline_is_rejected() {
        let now = Utc::now();
        let p = posting("approved", Some(now - Duration::hours(1)));
        let verdict = check_eligibility(&real(), Some(&p), now);
        assert_eq!(verdict, Eligibility::Expired);
        assert_eq!(verdict.rejection().unwrap().1, "Job deadline has passed");
    }

    #[test]
    fn test_missing_status_counts_as_not_approved() {
        let now = Utc::now();
        let mut p = posting("approved", None);
        p.approval_status = None;
        assert_eq!(check_eligibility(&real(), Some(&p), now), Eligibility::NotApproved);
    }

    #[test]
    fn test_placeholder_never_rejected() {
        let now = Utc::now();
        let p = posting("rejected", Some(now - Duration::days(30)));
        let verdict = check_eligibility(&JobReference::Placeholder(1), Some(&p), now);
        assert_eq!(verdict, Eligibility::BestEffort);
        assert!(verdict.rejection().is_none());
    }

    #[test]
    fn test_missing_details_proceed_best_effort() {
        assert_eq!(
            check_eligibility(&real(), None, Utc::now()),
            Eligibility::BestEffort
        );
    }
}
