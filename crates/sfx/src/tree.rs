use futures::future::try_join_all;

use crate::client::ClusterClient;
use crate::prelude::{println, *};

use sfx_core::explorer::{build_cluster_tree, render_tree, ApplicationEntry, ClusterSnapshot};

/// Options for rendering the cluster hierarchy
#[derive(Debug, clap::Args, Clone)]
pub struct TreeOptions {
    /// Also fetch the services of every application
    #[arg(long)]
    pub services: bool,

    /// Also list the image store root when the cluster uses the native store
    #[arg(long)]
    pub image_store: bool,

    /// Output the tree as JSON
    #[arg(long)]
    pub json: bool,
}

/// Gather nodes, applications and the image store state for one cluster
pub async fn snapshot_data(
    client: &ClusterClient,
    with_services: bool,
    with_image_store: bool,
) -> Result<ClusterSnapshot> {
    let (nodes, apps) = futures::try_join!(client.list_nodes(), client.list_applications())?;

    let applications = if with_services {
        try_join_all(apps.into_iter().map(|info| async move {
            let services = client.list_services(&info.id).await?;
            Ok::<_, color_eyre::eyre::Report>(ApplicationEntry {
                info,
                services: Some(services),
            })
        }))
        .await?
    } else {
        apps.into_iter()
            .map(|info| ApplicationEntry {
                info,
                services: None,
            })
            .collect()
    };

    // The image store entry is optional decoration, hide it rather than fail the tree.
    if let Err(e) = client.refresh_manifest().await {
        log::warn!("Cluster manifest unavailable, hiding image store: {:#}", e);
    }

    let native_image_store = client.manifest().is_native_image_store();
    let image_store = if native_image_store && with_image_store {
        Some(client.list_image_store(None).await?)
    } else {
        None
    };

    Ok(ClusterSnapshot {
        nodes,
        applications,
        native_image_store,
        image_store,
    })
}

/// Handle the tree command
pub async fn handler(client: &ClusterClient, options: TreeOptions) -> Result<()> {
    let snapshot = snapshot_data(client, options.services, options.image_store).await?;
    let tree = build_cluster_tree(client.endpoint(), &snapshot);

    if options.json {
        println!("{}", serde_json::to_string_pretty(&tree)?);
    } else {
        println!("{}", render_tree(&tree).trim_end());
    }

    Ok(())
}
