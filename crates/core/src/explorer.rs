//! Cluster hierarchy assembly
//!
//! Turns the flat resource lists returned by the Service Fabric REST API into
//! a [`TreeNode`] hierarchy, and renders that hierarchy as an indented outline.

use serde::{Deserialize, Serialize};

use crate::tree::{Children, ImageStoreFields, ItemType, NodeMetadata, NodeOptions, TreeNode};

/// Node descriptor from `GET /Nodes`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NodeInfo {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Id", default)]
    pub id: Option<NodeId>,
    #[serde(rename = "IpAddressOrFQDN", default)]
    pub ip_address_or_fqdn: Option<String>,
    #[serde(rename = "Type", default)]
    pub node_type: Option<String>,
    #[serde(rename = "CodeVersion", default)]
    pub code_version: Option<String>,
    #[serde(rename = "NodeStatus", default)]
    pub node_status: Option<String>,
    #[serde(rename = "HealthState", default)]
    pub health_state: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NodeId {
    #[serde(rename = "Id")]
    pub id: String,
}

/// Application descriptor from `GET /Applications`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ApplicationInfo {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "TypeName", default)]
    pub type_name: Option<String>,
    #[serde(rename = "TypeVersion", default)]
    pub type_version: Option<String>,
    #[serde(rename = "Status", default)]
    pub status: Option<String>,
    #[serde(rename = "HealthState", default)]
    pub health_state: Option<String>,
}

/// Service descriptor from `GET /Applications/{id}/$/GetServices`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServiceInfo {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "TypeName", default)]
    pub type_name: Option<String>,
    #[serde(rename = "ManifestVersion", default)]
    pub manifest_version: Option<String>,
    #[serde(rename = "ServiceKind", default)]
    pub service_kind: Option<String>,
    #[serde(rename = "ServiceStatus", default)]
    pub service_status: Option<String>,
    #[serde(rename = "HealthState", default)]
    pub health_state: Option<String>,
}

/// Listing of one image store directory from `GET /ImageStore[/{path}]`.
///
/// Sizes and counts arrive as decimal strings.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct ImageStoreContent {
    #[serde(rename = "StoreFiles", default)]
    pub store_files: Vec<ImageStoreFile>,
    #[serde(rename = "StoreFolders", default)]
    pub store_folders: Vec<ImageStoreFolder>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ImageStoreFile {
    #[serde(rename = "StoreRelativePath")]
    pub store_relative_path: String,
    #[serde(rename = "FileSize", default)]
    pub file_size: Option<String>,
    #[serde(rename = "FileVersion", default)]
    pub file_version: Option<FileVersion>,
    #[serde(rename = "ModifiedDate", default)]
    pub modified_date: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FileVersion {
    #[serde(rename = "VersionNumber", default)]
    pub version_number: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ImageStoreFolder {
    #[serde(rename = "StoreRelativePath")]
    pub store_relative_path: String,
    #[serde(rename = "FileCount", default)]
    pub file_count: Option<String>,
}

/// An application plus its services, when they were fetched.
#[derive(Debug, Clone)]
pub struct ApplicationEntry {
    pub info: ApplicationInfo,
    pub services: Option<Vec<ServiceInfo>>,
}

/// Everything needed to draw one cluster.
#[derive(Debug, Clone, Default)]
pub struct ClusterSnapshot {
    pub nodes: Vec<NodeInfo>,
    pub applications: Vec<ApplicationEntry>,
    pub native_image_store: bool,
    /// Root listing of the image store, when it was fetched.
    pub image_store: Option<ImageStoreContent>,
}

/// Strip the `fabric:/` scheme for display.
fn display_name(name: &str) -> &str {
    name.strip_prefix("fabric:/").unwrap_or(name)
}

fn node_item(endpoint: &str, node: &NodeInfo) -> TreeNode {
    let id = node
        .id
        .as_ref()
        .map(|id| id.id.clone())
        .unwrap_or_else(|| node.name.clone());

    TreeNode::new(
        node.name.clone(),
        NodeOptions::of_type(ItemType::NODE)
            .with_id(id)
            .with_metadata(NodeMetadata {
                cluster_endpoint: Some(endpoint.to_string()),
                health_state: node.health_state.clone(),
                node_name: Some(node.name.clone()),
                type_name: node.node_type.clone(),
                type_version: node.code_version.clone(),
                ..Default::default()
            }),
    )
}

fn service_item(endpoint: &str, application_id: &str, service: &ServiceInfo) -> TreeNode {
    TreeNode::new(
        display_name(&service.name),
        NodeOptions::of_type(ItemType::SERVICE)
            .with_id(service.id.clone())
            .with_metadata(NodeMetadata {
                cluster_endpoint: Some(endpoint.to_string()),
                application_id: Some(application_id.to_string()),
                service_id: Some(service.id.clone()),
                health_state: service.health_state.clone(),
                type_name: service.type_name.clone(),
                type_version: service.manifest_version.clone(),
                service_kind: service.service_kind.clone(),
                ..Default::default()
            }),
    )
}

fn application_item(endpoint: &str, entry: &ApplicationEntry) -> TreeNode {
    let app = &entry.info;
    let services = entry.services.as_ref().map(|services| {
        services
            .iter()
            .map(|service| service_item(endpoint, &app.id, service))
            .collect::<Vec<_>>()
    });

    TreeNode::new(
        display_name(&app.name),
        NodeOptions::of_type(ItemType::APPLICATION)
            .with_id(app.id.clone())
            .with_children(services)
            .with_metadata(NodeMetadata {
                cluster_endpoint: Some(endpoint.to_string()),
                application_id: Some(app.id.clone()),
                health_state: app.health_state.clone(),
                type_name: app.type_name.clone(),
                type_version: app.type_version.clone(),
                ..Default::default()
            }),
    )
}

/// Last segment of a store relative path. The store uses `\\` separators.
fn path_leaf(path: &str) -> &str {
    path.rsplit(['\\', '/'])
        .find(|segment| !segment.is_empty())
        .unwrap_or(path)
}

fn parse_count(value: Option<&String>) -> Option<u64> {
    value.and_then(|v| v.trim().parse().ok())
}

/// Folder and file items for one image store listing, folders first.
///
/// Folders stay unloaded until listed themselves. Files are always leaves.
pub fn image_store_items(endpoint: &str, content: &ImageStoreContent) -> Vec<TreeNode> {
    let metadata = NodeMetadata {
        cluster_endpoint: Some(endpoint.to_string()),
        ..Default::default()
    };

    let folders = content.store_folders.iter().map(|folder| {
        TreeNode::new(
            path_leaf(&folder.store_relative_path),
            NodeOptions::of_type(ItemType::IMAGE_STORE_FOLDER)
                .with_id(folder.store_relative_path.clone())
                .with_metadata(metadata.clone())
                .with_image_store(ImageStoreFields {
                    path: Some(folder.store_relative_path.clone()),
                    file_count: parse_count(folder.file_count.as_ref()),
                    ..Default::default()
                }),
        )
    });

    let files = content.store_files.iter().map(|file| {
        TreeNode::new(
            path_leaf(&file.store_relative_path),
            NodeOptions::of_type(ItemType::IMAGE_STORE_FILE)
                .with_id(file.store_relative_path.clone())
                .with_metadata(metadata.clone())
                .with_image_store(ImageStoreFields {
                    path: Some(file.store_relative_path.clone()),
                    size: parse_count(file.file_size.as_ref()),
                    version: file
                        .file_version
                        .as_ref()
                        .and_then(|v| v.version_number.clone()),
                    modified_date: file.modified_date.clone(),
                    ..Default::default()
                }),
        )
    });

    folders.chain(files).collect()
}

/// Build the subtree for one image store directory, `None` being the store root.
pub fn build_image_store_tree(
    endpoint: &str,
    path: Option<&str>,
    content: &ImageStoreContent,
) -> TreeNode {
    let children = image_store_items(endpoint, content);
    let metadata = NodeMetadata {
        cluster_endpoint: Some(endpoint.to_string()),
        ..Default::default()
    };

    match path {
        Some(path) => TreeNode::new(
            path_leaf(path),
            NodeOptions::of_type(ItemType::IMAGE_STORE_FOLDER)
                .with_id(path)
                .with_children(children)
                .with_metadata(metadata)
                .with_image_store(ImageStoreFields {
                    path: Some(path.to_string()),
                    file_count: Some(content.store_files.len() as u64),
                    ..Default::default()
                }),
        ),
        None => image_store_root(Some(children), metadata),
    }
}

fn image_store_root(children: Option<Vec<TreeNode>>, metadata: NodeMetadata) -> TreeNode {
    TreeNode::new(
        "Image Store",
        NodeOptions::of_type(ItemType::IMAGE_STORE)
            .with_id("imagestore")
            .with_children(children)
            .with_metadata(metadata),
    )
}

fn group(label: &str, kind: &str, children: Vec<TreeNode>) -> TreeNode {
    TreeNode::new(
        label,
        NodeOptions::of_type(ItemType::group_of(kind)).with_children(children),
    )
}

/// Build the explorer hierarchy for one cluster.
///
/// Groups are always loaded (possibly empty). The image store entry only
/// appears when the cluster uses the native image store. It stays a lazy
/// placeholder unless the snapshot carries its root listing.
pub fn build_cluster_tree(endpoint: &str, snapshot: &ClusterSnapshot) -> TreeNode {
    let nodes = snapshot
        .nodes
        .iter()
        .map(|node| node_item(endpoint, node))
        .collect();

    let applications = snapshot
        .applications
        .iter()
        .map(|entry| application_item(endpoint, entry))
        .collect();

    let mut sections = vec![
        group("Nodes", ItemType::NODE, nodes),
        group("Applications", ItemType::APPLICATION, applications),
    ];

    if snapshot.native_image_store {
        let children = snapshot
            .image_store
            .as_ref()
            .map(|content| image_store_items(endpoint, content));
        sections.push(image_store_root(
            children,
            NodeMetadata {
                cluster_endpoint: Some(endpoint.to_string()),
                ..Default::default()
            },
        ));
    }

    TreeNode::new(
        endpoint,
        NodeOptions::of_type(ItemType::CLUSTER)
            .with_id(endpoint)
            .with_children(sections)
            .with_metadata(NodeMetadata {
                cluster_endpoint: Some(endpoint.to_string()),
                ..Default::default()
            }),
    )
}

/// Render a tree as an indented outline, two spaces per level.
///
/// `▸` marks expandable nodes, `•` leaves. Loaded children are always shown.
pub fn render_tree(root: &TreeNode) -> String {
    let mut out = String::new();
    render_node(root, 0, &mut out);
    out
}

fn render_node(node: &TreeNode, depth: usize, out: &mut String) {
    let marker = if node.expand_state().is_expandable() {
        '▸'
    } else {
        '•'
    };

    out.push_str(&"  ".repeat(depth));
    out.push(marker);
    out.push(' ');
    out.push_str(node.label());
    if let Some(health) = &node.metadata().health_state {
        out.push_str(&format!(" [{health}]"));
    }
    match (node.image_store().size, node.image_store().file_count) {
        (Some(size), _) => out.push_str(&format!(" ({size} bytes)")),
        (None, Some(count)) => out.push_str(&format!(" ({count} files)")),
        _ => {}
    }
    out.push('\n');

    if let Children::Loaded(children) = node.children() {
        for child in children {
            render_node(child, depth + 1, out);
        }
    }
}
