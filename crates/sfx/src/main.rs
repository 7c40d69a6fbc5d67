use crate::prelude::{eprintln, *};
use clap::Parser;

mod apps;
mod client;
mod error;
mod image_store;
mod manifest;
mod nodes;
mod page_tokens;
mod prelude;
mod tree;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Browse a Service Fabric cluster from the terminal"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Cluster HTTP gateway endpoint (overrides SFX_CLUSTER_ENDPOINT)
    #[clap(long, global = true)]
    endpoint: Option<String>,

    /// Whether to display additional information.
    #[clap(long, env = "SFX_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// List cluster nodes
    Nodes(crate::nodes::NodesOptions),

    /// List applications
    Apps(crate::apps::AppsOptions),

    /// List the services of an application
    Services(crate::apps::ServicesOptions),

    /// Inspect the cluster manifest and image store configuration
    Manifest(crate::manifest::ManifestOptions),

    /// Render the cluster as a navigable tree
    Tree(crate::tree::TreeOptions),

    /// Browse the native image store
    ImageStore(crate::image_store::ImageStoreOptions),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    let config = client::ClusterConfig::from_env()?.with_overrides(app.global.endpoint.clone());
    if app.global.verbose {
        eprintln!("Cluster endpoint: {}", config.endpoint);
        eprintln!("API version: {}", config.api_version);
    }

    let client = client::ClusterClient::new(config)?;

    match app.command {
        SubCommands::Nodes(options) => crate::nodes::handler(&client, options).await,
        SubCommands::Apps(options) => crate::apps::handler(&client, options).await,
        SubCommands::Services(options) => crate::apps::services_handler(&client, options).await,
        SubCommands::Manifest(options) => crate::manifest::handler(&client, options).await,
        SubCommands::Tree(options) => crate::tree::handler(&client, options).await,
        SubCommands::ImageStore(options) => crate::image_store::handler(&client, options).await,
    }
}
