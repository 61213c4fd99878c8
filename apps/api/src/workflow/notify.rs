use async_trait::async_trait;

/// Operator-facing message about one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Submitted {
        job_id: String,
        job_title: Option<String>,
        company_name: Option<String>,
        application_id: Option<String>,
    },
    Failed {
        job_id: String,
        job_title: Option<String>,
        error: String,
    },
    ApprovalRequired {
        job_id: String,
        job_title: Option<String>,
        company_name: Option<String>,
    },
}

impl Notification {
    pub fn job_id(&self) -> &str {
        match self {
            Notification::Submitted { job_id, .. }
            | Notification::Failed { job_id, .. }
            | Notification::ApprovalRequired { job_id, .. } => job_id,
        }
    }

    /// Markdown body sent to the operator's chat.
    pub fn render(&self) -> String {
        let mut message = String::new();
        match self {
            Notification::Submitted {
                job_id,
                job_title,
                company_name,
                application_id,
            } => {
                message.push_str("✅ **Application Submitted Successfully!**\n\n");
                message.push_str(&format!("📋 **Job ID:** {job_id}\n"));
                push_line(&mut message, "💼 **Position:**", job_title);
                push_line(&mut message, "🏢 **Company:**", company_name);
                push_line(&mut message, "🆔 **Application ID:**", application_id);
                message.push_str("\nYour application has been automatically submitted!");
            }
            Notification::Failed {
                job_id,
                job_title,
                error,
            } => {
                message.push_str("❌ **Application Failed**\n\n");
                message.push_str(&format!("📋 **Job ID:** {job_id}\n"));
                push_line(&mut message, "💼 **Position:**", job_title);
                message.push_str(&format!("\n⚠️ **Error:** {error}"));
            }
            Notification::ApprovalRequired {
                job_id,
                job_title,
                company_name,
            } => {
                message.push_str("⏳ **Requires Manual Approval**\n\n");
                message.push_str(&format!("📋 **Job ID:** {job_id}\n"));
                push_line(&mut message, "💼 **Position:**", job_title);
                push_line(&mut message, "🏢 **Company:**", company_name);
                message.push_str("\nReview the cover letter and approve it from the dashboard.");
            }
        }
        message
    }
}

fn push_line(message: &mut String, label: &str, value: &Option<String>) {
    if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
        message.push_str(&format!("{label} {value}\n"));
    }
}

/// Delivers notifications to the operator. Failures are for the caller to log; they
/// never change a workflow's outcome.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()>;
}
