use colored::Colorize;
use serde::Serialize;

use crate::client::ClusterClient;
use crate::prelude::{println, *};

/// Options for inspecting the cluster manifest
#[derive(Debug, clap::Args, Clone)]
pub struct ManifestOptions {
    /// Print the manifest XML
    #[arg(long, conflicts_with_all = ["parsed", "json"])]
    pub xml: bool,

    /// Print the manifest converted to JSON
    #[arg(long, conflicts_with = "json")]
    pub parsed: bool,

    /// Output the image store summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManifestSummary {
    pub endpoint: String,
    pub native_image_store: bool,
    pub image_store_connection_string: Option<String>,
}

/// Fetch the manifest and summarize the image store configuration
pub async fn manifest_summary_data(client: &ClusterClient) -> Result<ManifestSummary> {
    client.refresh_manifest().await?;
    let cache = client.manifest();

    Ok(ManifestSummary {
        endpoint: client.endpoint().to_string(),
        native_image_store: cache.is_native_image_store(),
        image_store_connection_string: cache.image_store_connection_string(),
    })
}

pub fn format_summary(summary: &ManifestSummary) -> String {
    let store = if summary.native_image_store {
        "native".green().to_string()
    } else {
        "external".yellow().to_string()
    };

    format!(
        "{} {}\n{} {}\n{} {}",
        "Cluster:".bold(),
        summary.endpoint,
        "Image store:".bold(),
        store,
        "Connection string:".bold(),
        summary
            .image_store_connection_string
            .as_deref()
            .unwrap_or("(not configured)")
    )
}

/// Handle the manifest command
pub async fn handler(client: &ClusterClient, options: ManifestOptions) -> Result<()> {
    let summary = manifest_summary_data(client).await?;

    if options.xml {
        println!("{}", client.manifest().xml());
    } else if options.parsed {
        let parsed = client.manifest().get();
        println!("{}", serde_json::to_string_pretty(&parsed)?);
    } else if options.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", format_summary(&summary));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(native: bool, connection: Option<&str>) -> ManifestSummary {
        ManifestSummary {
            endpoint: "http://localhost:19080".to_string(),
            native_image_store: native,
            image_store_connection_string: connection.map(str::to_string),
        }
    }

    #[test]
    fn test_format_summary_native() {
        colored::control::set_override(false);
        let text = format_summary(&summary(true, Some("fabric:ImageStore")));

        assert!(text.contains("Image store: native"));
        assert!(text.contains("fabric:ImageStore"));
    }

    #[test]
    fn test_format_summary_unconfigured() {
        colored::control::set_override(false);
        let text = format_summary(&summary(false, None));

        assert!(text.contains("Image store: external"));
        assert!(text.contains("(not configured)"));
    }

    #[test]
    fn test_summary_json_is_camel_case() {
        let json = serde_json::to_value(summary(true, Some("fabric:ImageStore"))).unwrap();

        assert_eq!(json["nativeImageStore"], true);
        assert_eq!(json["imageStoreConnectionString"], "fabric:ImageStore");
    }
}
