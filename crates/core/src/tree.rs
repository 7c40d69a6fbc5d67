//! Tree nodes for the cluster explorer
//!
//! A [`TreeNode`] is one entry in the navigable resource hierarchy. Whether a
//! node can be expanded is decided once, at construction, from two inputs:
//! the load state of its children and its [`ItemType`].

use std::fmt;

use serde::{Serialize, Serializer};

/// Open vocabulary of node kinds.
///
/// Kept as a string rather than an enum so new kinds (and any `*-group`
/// container) classify without code changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ItemType(String);

impl ItemType {
    pub const CLUSTER: &'static str = "cluster";
    pub const NODE: &'static str = "node";
    pub const APPLICATION: &'static str = "application";
    pub const SERVICE: &'static str = "service";
    pub const PARTITION: &'static str = "partition";
    pub const REPLICA: &'static str = "replica";
    pub const DEPLOYED_APPLICATION: &'static str = "deployed-application";
    pub const DEPLOYED_SERVICE_PACKAGE: &'static str = "deployed-service-package";
    pub const IMAGE_STORE: &'static str = "image-store";
    pub const IMAGE_STORE_FOLDER: &'static str = "image-store-folder";
    pub const IMAGE_STORE_FILE: &'static str = "image-store-file";
    pub const METRICS: &'static str = "metrics";
    pub const COMMANDS: &'static str = "commands";

    const GROUP_SUFFIX: &'static str = "-group";

    /// Kinds whose children are fetched on first expansion.
    const LAZY_LOADED: [&'static str; 10] = [
        Self::NODE,
        Self::DEPLOYED_APPLICATION,
        Self::DEPLOYED_SERVICE_PACKAGE,
        Self::SERVICE,
        Self::PARTITION,
        Self::REPLICA,
        Self::IMAGE_STORE,
        Self::IMAGE_STORE_FOLDER,
        Self::METRICS,
        Self::COMMANDS,
    ];

    pub fn new(value: impl Into<String>) -> Self {
        ItemType(value.into())
    }

    /// Group container for `kind`, e.g. `node` -> `node-group`.
    pub fn group_of(kind: &str) -> Self {
        ItemType(format!("{kind}{}", Self::GROUP_SUFFIX))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_group(&self) -> bool {
        self.0.ends_with(Self::GROUP_SUFFIX)
    }

    pub fn is_lazy_loaded(&self) -> bool {
        Self::LAZY_LOADED.contains(&self.0.as_str()) || self.is_group()
    }
}

impl From<&str> for ItemType {
    fn from(value: &str) -> Self {
        ItemType::new(value)
    }
}

impl From<String> for ItemType {
    fn from(value: String) -> Self {
        ItemType(value)
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Load state of a node's children.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Children {
    /// Not fetched yet, or a leaf.
    #[default]
    NotLoaded,
    /// Fetched and confirmed to have none.
    LoadedEmpty,
    Loaded(Vec<TreeNode>),
}

impl Children {
    /// Attached children, `None` when nothing has been loaded.
    pub fn as_slice(&self) -> Option<&[TreeNode]> {
        match self {
            Children::NotLoaded => None,
            Children::LoadedEmpty => Some(&[]),
            Children::Loaded(nodes) => Some(nodes),
        }
    }

    pub fn is_loaded(&self) -> bool {
        !matches!(self, Children::NotLoaded)
    }
}

impl From<Option<Vec<TreeNode>>> for Children {
    fn from(value: Option<Vec<TreeNode>>) -> Self {
        match value {
            None => Children::NotLoaded,
            Some(nodes) if nodes.is_empty() => Children::LoadedEmpty,
            Some(nodes) => Children::Loaded(nodes),
        }
    }
}

impl From<Vec<TreeNode>> for Children {
    fn from(value: Vec<TreeNode>) -> Self {
        Children::from(Some(value))
    }
}

impl Serialize for Children {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_slice().serialize(serializer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExpandState {
    Leaf,
    Collapsed,
}

impl ExpandState {
    pub fn is_expandable(&self) -> bool {
        matches!(self, ExpandState::Collapsed)
    }
}

/// Decide whether a node is expandable. First match wins:
///
/// 1. children attached -> collapsed
/// 2. children not loaded and a lazy-loaded kind -> collapsed placeholder
/// 3. anything else (confirmed empty, unknown kind) -> leaf
pub fn classify(children: &Children, item_type: Option<&ItemType>) -> ExpandState {
    match children {
        Children::Loaded(nodes) if !nodes.is_empty() => ExpandState::Collapsed,
        Children::NotLoaded if item_type.is_some_and(ItemType::is_lazy_loaded) => {
            ExpandState::Collapsed
        }
        _ => ExpandState::Leaf,
    }
}

/// "Show details" binding for a detail-bearing node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailsCommand {
    pub item_type: ItemType,
    pub item_id: String,
}

impl DetailsCommand {
    /// Groups are navigation-only and never get a binding.
    fn for_item(item_type: Option<&ItemType>, item_id: Option<&str>) -> Option<Self> {
        match (item_type, item_id) {
            (Some(item_type), Some(item_id)) if !item_type.is_group() => Some(DetailsCommand {
                item_type: item_type.clone(),
                item_id: item_id.to_string(),
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageStoreFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_count: Option<u64>,
}

/// Correlation metadata copied verbatim onto the node.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replica_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_kind: Option<String>,
}

/// Construction input for [`TreeNode::new`].
#[derive(Debug, Clone, Default)]
pub struct NodeOptions {
    pub children: Children,
    pub item_type: Option<ItemType>,
    pub item_id: Option<String>,
    pub metadata: NodeMetadata,
    pub image_store: ImageStoreFields,
}

impl NodeOptions {
    pub fn of_type(item_type: impl Into<ItemType>) -> Self {
        NodeOptions {
            item_type: Some(item_type.into()),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, item_id: impl Into<String>) -> Self {
        self.item_id = Some(item_id.into());
        self
    }

    pub fn with_children(mut self, children: impl Into<Children>) -> Self {
        self.children = children.into();
        self
    }

    pub fn with_metadata(mut self, metadata: NodeMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_image_store(mut self, image_store: ImageStoreFields) -> Self {
        self.image_store = image_store;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    label: String,
    children: Children,
    #[serde(skip_serializing_if = "Option::is_none")]
    item_type: Option<ItemType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    item_id: Option<String>,
    #[serde(flatten)]
    metadata: NodeMetadata,
    #[serde(flatten)]
    image_store: ImageStoreFields,
    expand_state: ExpandState,
    #[serde(skip_serializing_if = "Option::is_none")]
    command: Option<DetailsCommand>,
}

impl TreeNode {
    /// Build a node. Never fails: unknown kinds fall through to a leaf.
    pub fn new(label: impl Into<String>, options: NodeOptions) -> Self {
        let NodeOptions {
            children,
            item_type,
            item_id,
            metadata,
            image_store,
        } = options;

        let expand_state = classify(&children, item_type.as_ref());
        let command = DetailsCommand::for_item(item_type.as_ref(), item_id.as_deref());

        TreeNode {
            label: label.into(),
            children,
            item_type,
            item_id,
            metadata,
            image_store,
            expand_state,
            command,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn children(&self) -> &Children {
        &self.children
    }

    pub fn item_type(&self) -> Option<&ItemType> {
        self.item_type.as_ref()
    }

    pub fn item_id(&self) -> Option<&str> {
        self.item_id.as_deref()
    }

    pub fn metadata(&self) -> &NodeMetadata {
        &self.metadata
    }

    pub fn image_store(&self) -> &ImageStoreFields {
        &self.image_store
    }

    pub fn expand_state(&self) -> ExpandState {
        self.expand_state
    }

    pub fn details_command(&self) -> Option<&DetailsCommand> {
        self.command.as_ref()
    }
}
