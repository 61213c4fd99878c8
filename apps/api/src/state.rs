use std::sync::Arc;

use crate::store::ApplicationStore;
use crate::workflow::ApplicationWorkflow;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ApplicationStore>,
    /// Same workflow instance the listener runs; used for manual approvals.
    pub workflow: ApplicationWorkflow,
}
