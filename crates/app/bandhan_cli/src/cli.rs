use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bandhan", version, about = "Map installations to Azure tenants and subscriptions", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in, pick a tenant and subscription, and save the mapping
    Map(MapArgs),
    /// List the tenants visible to the signed-in account
    Tenants,
    /// List the subscriptions of a tenant
    Subscriptions {
        /// Tenant id
        #[arg(long)]
        tenant: String,
    },
    /// List client services with granted permissions
    ClientServices,
    /// Print version information
    Version,
}

#[derive(Args, Debug, Default)]
pub struct MapArgs {
    /// Page URL carrying the `installation_id` query parameter
    #[arg(long, env = "BANDHAN_PAGE_URL")]
    pub page_url: Option<String>,

    /// Installation id; takes precedence over the page URL
    #[arg(long)]
    pub installation_id: Option<String>,

    /// Tenant id; prompts when omitted
    #[arg(long)]
    pub tenant: Option<String>,

    /// Subscription id; prompts when omitted
    #[arg(long)]
    pub subscription: Option<String>,
}
