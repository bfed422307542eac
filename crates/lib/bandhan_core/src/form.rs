//! The mapping form: owns the in-progress mapping and composes the selector
//! and the submission.

use std::sync::Arc;

use crate::azure::DirectoryApi;
use crate::context::AppContext;
use crate::installation::installation_id_from_url;
use crate::mapping::submission::{MappingSubmission, SubmissionOutcome};
use crate::mapping::{MappingApi, MappingRequest};
use crate::selector::CascadingSelector;

pub struct MappingForm {
    context: AppContext,
    installation_id: String,
    selector: CascadingSelector,
    submission: MappingSubmission,
}

impl MappingForm {
    pub fn new(
        context: AppContext,
        installation_id: impl Into<String>,
        directory: Arc<dyn DirectoryApi>,
        mapping_api: Arc<dyn MappingApi>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            selector: CascadingSelector::new(context.clone(), directory, scopes),
            submission: MappingSubmission::new(context.clone(), mapping_api),
            installation_id: installation_id.into(),
            context,
        }
    }

    /// Build the form for the page at `page_url`.
    pub fn for_page(
        context: AppContext,
        page_url: &str,
        directory: Arc<dyn DirectoryApi>,
        mapping_api: Arc<dyn MappingApi>,
        scopes: Vec<String>,
    ) -> Self {
        let installation_id = installation_id_from_url(page_url);
        Self::new(context, installation_id, directory, mapping_api, scopes)
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    pub fn installation_id(&self) -> &str {
        &self.installation_id
    }

    pub fn set_installation_id(&mut self, installation_id: impl Into<String>) {
        self.installation_id = installation_id.into();
    }

    pub fn selector(&self) -> &CascadingSelector {
        &self.selector
    }

    /// Clear the banner and load the tenant list.
    pub async fn mount(&self) -> usize {
        self.context.sink.clear().await;
        self.selector.load_tenants().await
    }

    /// The mapping as currently selected.
    pub async fn draft(&self) -> MappingRequest {
        let state = self.selector.state().await;
        MappingRequest::new(
            self.installation_id.clone(),
            state.selected_tenant,
            state.selected_subscription,
        )
    }

    /// Submit the current draft.
    pub async fn save(&self) -> SubmissionOutcome {
        let draft = self.draft().await;
        self.submission.submit(draft).await
    }
}
