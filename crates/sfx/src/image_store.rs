use crate::client::ClusterClient;
use crate::prelude::{println, *};

use sfx_core::explorer::{build_image_store_tree, render_tree};
use sfx_core::tree::TreeNode;

/// Options for browsing the native image store
#[derive(Debug, clap::Args, Clone)]
#[command(after_help = "EXAMPLES:
  # List the image store root:
  sfx image-store

  # List one folder:
  sfx image-store 'Store\\VotingType'")]
pub struct ImageStoreOptions {
    /// Store relative path of the folder to list (defaults to the root)
    pub path: Option<String>,

    /// Output the listing as JSON
    #[arg(long)]
    pub json: bool,
}

/// List one image store folder as a tree, refusing clusters without a native store
pub async fn image_store_data(client: &ClusterClient, path: Option<&str>) -> Result<TreeNode> {
    client.refresh_manifest().await?;
    if !client.manifest().is_native_image_store() {
        return Err(eyre!(
            "{} does not use the native image store",
            client.endpoint()
        ));
    }

    let content = client.list_image_store(path).await?;
    log::debug!(
        "Image store listing: {} folder(s), {} file(s)",
        content.store_folders.len(),
        content.store_files.len()
    );

    Ok(build_image_store_tree(client.endpoint(), path, &content))
}

/// Handle the image-store command
pub async fn handler(client: &ClusterClient, options: ImageStoreOptions) -> Result<()> {
    let tree = image_store_data(client, options.path.as_deref()).await?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&tree)?);
    } else {
        println!("{}", render_tree(&tree).trim_end());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct Cli {
        #[command(flatten)]
        options: ImageStoreOptions,
    }

    #[test]
    fn test_path_defaults_to_root() {
        let cli = Cli::try_parse_from(["sfx"]).unwrap();

        assert!(cli.options.path.is_none());
        assert!(!cli.options.json);
    }

    #[test]
    fn test_path_and_json_flag() {
        let cli = Cli::try_parse_from(["sfx", "Store\\VotingType", "--json"]).unwrap();

        assert_eq!(cli.options.path.as_deref(), Some("Store\\VotingType"));
        assert!(cli.options.json);
    }
}
