//! Wires configuration into the core services and runs each command.

use std::sync::Arc;

use bandhan_core::api::http_client;
use bandhan_core::auth::session::AuthSession;
use bandhan_core::azure::ManagementClient;
use bandhan_core::config::BandhanConfig;
use bandhan_core::context::{AppContext, Banner};
use bandhan_core::entra::EntraProvider;
use bandhan_core::form::MappingForm;
use bandhan_core::mapping::MappingClient;
use bandhan_core::mapping::permissions::{ClientServices, PermissionsClient};
use bandhan_core::mapping::submission::{SAVED_MESSAGE, SubmissionOutcome};
use bandhan_core::selector::{CascadingSelector, SubscriptionLoad};
use log::info;

use crate::cli::MapArgs;
use crate::prompt::{Choice, Picker, TerminalPrompt};
use crate::{Error, Result};

pub struct App {
    config: BandhanConfig,
    context: AppContext,
    directory: Arc<ManagementClient>,
    mapping: Arc<MappingClient>,
    permissions: Arc<PermissionsClient>,
}

impl App {
    pub fn new(config: BandhanConfig) -> Result<Self> {
        let http = http_client(config.http_timeout)?;
        let provider = EntraProvider::new(http.clone(), &config, Arc::new(TerminalPrompt));
        let auth = AuthSession::new(Arc::new(provider), config.login_scopes.clone())
            .with_login_host(config.login_host.clone());

        Ok(Self {
            context: AppContext::new(Arc::new(auth)),
            directory: Arc::new(ManagementClient::new(http.clone(), &config.management_url)),
            mapping: Arc::new(MappingClient::new(http.clone(), &config.mapping_api_url)),
            permissions: Arc::new(PermissionsClient::new(http, &config.permissions_api_url)),
            config,
        })
    }

    fn selector(&self) -> CascadingSelector {
        CascadingSelector::new(
            self.context.clone(),
            self.directory.clone(),
            self.config.azure_api_scopes.clone(),
        )
    }

    /// Turn an error banner into a command failure.
    async fn check_banner(&self) -> Result<()> {
        match self.context.sink.banner().await {
            Banner::Error(record) => Err(Error::Reported(record)),
            _ => Ok(()),
        }
    }

    pub async fn tenants(&self) -> Result<()> {
        let selector = self.selector();
        selector.load_tenants().await;
        self.check_banner().await?;
        for tenant in selector.state().await.tenants {
            println!("{}\t{}", tenant.tenant_id, tenant.display_name);
        }
        Ok(())
    }

    pub async fn subscriptions(&self, tenant: &str) -> Result<()> {
        let selector = self.selector();
        selector.select_tenant(tenant).await;
        self.check_banner().await?;
        for subscription in selector.state().await.subscriptions {
            println!(
                "{}\t{}",
                subscription.subscription_id, subscription.display_name
            );
        }
        Ok(())
    }

    pub async fn client_services(&self) -> Result<()> {
        let services = ClientServices::new(self.context.sink.clone(), self.permissions.clone());
        services.load().await;
        self.check_banner().await?;
        for service in services.services().await {
            println!("{}", service.client_id);
        }
        Ok(())
    }

    pub async fn map(&self, args: MapArgs) -> Result<()> {
        let mut form = MappingForm::for_page(
            self.context.clone(),
            args.page_url.as_deref().unwrap_or_default(),
            self.directory.clone(),
            self.mapping.clone(),
            self.config.azure_api_scopes.clone(),
        );
        if let Some(id) = args.installation_id {
            form.set_installation_id(id);
        }
        info!("mapping installation '{}'", form.installation_id());

        form.mount().await;
        self.check_banner().await?;
        let mut picker = Picker::stdin();

        let tenant = match args.tenant {
            Some(tenant) => tenant,
            None => {
                let tenants = form.selector().state().await.tenants;
                let choices: Vec<Choice<'_>> = tenants
                    .iter()
                    .map(|t| Choice {
                        id: &t.tenant_id,
                        label: &t.display_name,
                    })
                    .collect();
                picker.choose("tenant", &choices, None).await?
            }
        };

        if let SubscriptionLoad::Failed = form.selector().select_tenant(&tenant).await {
            self.check_banner().await?;
        }

        let state = form.selector().state().await;
        let subscription = match args.subscription {
            Some(subscription) => subscription,
            None => {
                let choices: Vec<Choice<'_>> = state
                    .subscriptions
                    .iter()
                    .map(|s| Choice {
                        id: &s.subscription_id,
                        label: &s.display_name,
                    })
                    .collect();
                let default = Some(state.selected_subscription.as_str()).filter(|s| !s.is_empty());
                picker.choose("subscription", &choices, default).await?
            }
        };
        if !form.selector().select_subscription(&subscription).await {
            return Err(Error::Custom(format!(
                "Subscription {subscription} is not listed for tenant {tenant}"
            )));
        }

        match form.save().await {
            SubmissionOutcome::Saved => {
                println!("{SAVED_MESSAGE}");
                Ok(())
            }
            SubmissionOutcome::Invalid(record) | SubmissionOutcome::Failed(record) => {
                Err(Error::Reported(record))
            }
        }
    }
}
