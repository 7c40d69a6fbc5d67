use crate::client::ClusterClient;
use crate::prelude::{eprintln, println, *};
use serde::Serialize;

use sfx_core::explorer::NodeInfo;
use sfx_core::pagination::Page;

/// Options for listing cluster nodes
#[derive(Debug, clap::Args, Clone)]
#[command(after_help = "EXAMPLES:
  # List every node in the cluster:
  sfx nodes

  # Browse one page at a time:
  sfx nodes --page --max-results 50

  # Fetch the following page using the handle printed by the previous run:
  sfx nodes --page --max-results 50 --next-page <handle>")]
pub struct NodesOptions {
    /// Fetch a single page instead of walking every page
    #[arg(long)]
    pub page: bool,

    /// Maximum number of nodes per page (single-page mode)
    #[arg(long)]
    pub max_results: Option<usize>,

    /// Handle of the page to fetch, as printed by a previous run (implies --page)
    #[arg(long)]
    pub next_page: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

const NODES_PATH: &str = "/Nodes";

/// One page of nodes plus the handle for the next one
#[derive(Debug, Serialize)]
pub struct NodesPageOutput {
    pub nodes: Vec<NodeInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page: Option<String>,
}

/// Fetch a single page of nodes, caching the continuation token behind a short handle
pub async fn nodes_page_data(
    client: &ClusterClient,
    max_results: Option<usize>,
    next_page: Option<String>,
) -> Result<NodesPageOutput> {
    let endpoint = client.endpoint();
    let token = next_page
        .as_deref()
        .map(|handle| crate::page_tokens::recall(endpoint, NODES_PATH, handle))
        .transpose()?;

    let page: Page<NodeInfo> = client
        .fetch_page(NODES_PATH, token, max_results)
        .await
        .context("Failed to fetch nodes page")?;

    let next_page = page
        .next_token()
        .map(|token| crate::page_tokens::remember(endpoint, NODES_PATH, token))
        .transpose()?;

    Ok(NodesPageOutput {
        nodes: page.items.unwrap_or_default(),
        next_page,
    })
}

/// Render nodes as a table
pub fn format_nodes_table(nodes: &[NodeInfo]) -> String {
    let mut table = crate::prelude::new_table();
    table.add_row(prettytable::row![
        "Name", "Address", "Type", "Status", "Health"
    ]);

    for node in nodes {
        table.add_row(prettytable::row![
            &node.name,
            node.ip_address_or_fqdn.as_deref().unwrap_or("-"),
            node.node_type.as_deref().unwrap_or("-"),
            node.node_status.as_deref().unwrap_or("-"),
            node.health_state.as_deref().unwrap_or("-")
        ]);
    }

    table.to_string()
}

/// Handle the nodes command
pub async fn handler(client: &ClusterClient, options: NodesOptions) -> Result<()> {
    if options.page || options.next_page.is_some() {
        let data = nodes_page_data(client, options.max_results, options.next_page).await?;

        if options.json {
            println!("{}", serde_json::to_string_pretty(&data)?);
            return Ok(());
        }

        println!("{}", format_nodes_table(&data.nodes));
        if let Some(handle) = &data.next_page {
            let limit = options
                .max_results
                .map(|n| format!(" --max-results {}", n))
                .unwrap_or_default();
            eprintln!(
                "\nTo fetch the next page, run:\n  sfx nodes --page{} --next-page {}",
                limit, handle
            );
        }
        return Ok(());
    }

    let nodes = client.list_nodes().await?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&nodes)?);
    } else {
        println!("Found {} node(s):\n", nodes.len());
        println!("{}", format_nodes_table(&nodes));
    }

    Ok(())
}
