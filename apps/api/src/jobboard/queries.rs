// GraphQL documents sent to the job board, one per named operation.

pub const FETCH_USER_BY_TELEGRAM_ID: &str = r#"query FetchUserByTelegramId($telegram_id: String!) {
  users(where: {telegram_id: {_eq: $telegram_id}}) {
    id
  }
}"#;

pub const FETCH_JOB_SEEKER: &str = r#"query js_id($user_id: uuid!) {
  job_seekers(where: {user_id: {_eq: $user_id}}) {
    id
    default_profile_id
  }
}"#;

pub const FETCH_JOB_SEEKER_PROFILES: &str = r#"query FetchJobSeekerProfilesById($job_seeker_id: uuid!) {
  job_seekers_by_pk(id: $job_seeker_id) {
    profiles {
      id
      professional_title
    }
    default_profile_id
  }
}"#;

pub const FETCH_PLATFORM_ID: &str = r#"query getPlatformId {
  platforms(where: {name: {_eq: "BOT"}}) {
    id
    name
  }
}"#;

pub const VIEW_JOB_DETAILS: &str = r#"query viewDetails($id: uuid!, $share_id: uuid) {
  view_job_details(obj: {job_id: $id, share_id: $share_id}) {
    id
    title
    approval_status
    job_type
    job_site
    location
    entity {
      name
      type
    }
    deadline
    vacancy_count
    experience_level
    description
  }
}"#;

pub const APPLY_TO_JOB: &str = r#"mutation ApplyToJob($application: JobApplicationInput!, $job_id: uuid!, $origin_platform_id: uuid!, $share_id: uuid, $telegramUsername: String, $profile_id: uuid!) {
  apply_to_job(
    application: $application
    job_id: $job_id
    origin_platform_id: $origin_platform_id
    job_share_id: $share_id
    telegram_username: $telegramUsername
    profile_id: $profile_id
  ) {
    application_id
  }
}"#;

/// Hasura role selected per operation.
pub mod roles {
    pub const TEMPORARY_USER: &str = "insert_temporary_user";
    pub const USER: &str = "user";
    pub const JOB_SEEKER: &str = "job_seeker";
}
