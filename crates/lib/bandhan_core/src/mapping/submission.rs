//! Mapping submission.
//!
//! Validates the triple locally, then saves it. Every attempt records
//! exactly one banner: the success message or the error.

use std::sync::Arc;

use tracing::{info, warn};

use super::{MappingApi, MappingRequest};
use crate::auth::normalize::ErrorRecord;
use crate::context::AppContext;

/// Shown when any of the three fields is missing.
pub const REQUIRED_FIELDS_MESSAGE: &str = "Installation, Tenant and Subscription required.";

/// Shown after a successful save.
pub const SAVED_MESSAGE: &str = "Successfully saved";

/// Result of one submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Saved,
    /// Rejected locally; no request was sent.
    Invalid(ErrorRecord),
    /// The backend rejected the mapping or could not be reached.
    Failed(ErrorRecord),
}

pub struct MappingSubmission {
    context: AppContext,
    api: Arc<dyn MappingApi>,
}

impl MappingSubmission {
    pub fn new(context: AppContext, api: Arc<dyn MappingApi>) -> Self {
        Self { context, api }
    }

    /// Submit `request`, consuming it.
    pub async fn submit(&self, request: MappingRequest) -> SubmissionOutcome {
        self.context.sink.clear().await;

        if !request.is_complete() {
            let record = ErrorRecord::new(REQUIRED_FIELDS_MESSAGE, None);
            self.context.sink.report(record.clone()).await;
            return SubmissionOutcome::Invalid(record);
        }

        match self.api.save_mapping(&request).await {
            Ok(()) => {
                info!(installation = %request.installation_id, "mapping submitted");
                self.context.sink.set_success(SAVED_MESSAGE).await;
                SubmissionOutcome::Saved
            }
            Err(e) => {
                warn!(error = %e, "mapping submission failed");
                let record = ErrorRecord::new(e.to_string(), None);
                self.context.sink.report(record.clone()).await;
                SubmissionOutcome::Failed(record)
            }
        }
    }
}
