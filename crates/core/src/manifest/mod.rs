//! Cluster manifest cache
//!
//! Parses a cluster manifest once and memoizes whether the cluster uses the
//! native (in-cluster) image store. Replacing the document always drops the
//! memo, so the flag can never describe an older manifest.

pub mod xml;

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const MANAGEMENT_SECTION: &str = "Management";
const CONNECTION_STRING_PARAMETER: &str = "ImageStoreConnectionString";
const NATIVE_IMAGE_STORE_PREFIX: &str = "fabric:imagestore";

/// Response envelope of `GET /$/GetClusterManifest`.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ClusterManifestResponse {
    #[serde(rename = "Manifest")]
    pub manifest: String,
}

/// A manifest as handed to [`ManifestCache::set`]: raw XML or a response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestDocument(String);

impl ManifestDocument {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ManifestDocument {
    fn from(value: &str) -> Self {
        ManifestDocument(value.to_string())
    }
}

impl From<String> for ManifestDocument {
    fn from(value: String) -> Self {
        ManifestDocument(value)
    }
}

impl From<ClusterManifestResponse> for ManifestDocument {
    fn from(value: ClusterManifestResponse) -> Self {
        ManifestDocument(value.manifest)
    }
}

impl From<&ClusterManifestResponse> for ManifestDocument {
    fn from(value: &ClusterManifestResponse) -> Self {
        ManifestDocument(value.manifest.clone())
    }
}

/// Why the native image store lookup came out the way it did.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Lookup {
    Native(String),
    External(String),
    EmptyDocument,
    MissingSection,
    MissingParameter,
}

impl Lookup {
    fn is_native(&self) -> bool {
        matches!(self, Lookup::Native(_))
    }
}

#[derive(Debug, Default)]
struct State {
    xml: String,
    parsed: Value,
    native_image_store: Option<bool>,
}

/// Owned cache for one cluster connection.
///
/// All state sits behind one lock, so a reader never sees the new document
/// paired with the old flag.
#[derive(Debug, Default)]
pub struct ManifestCache {
    state: Mutex<State>,
}

impl ManifestCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // State is replaced wholesale, a poisoned guard still holds a consistent value.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the document and reset the memoized flag.
    ///
    /// Unparseable XML is kept as raw text with an empty parsed tree.
    pub fn set(&self, document: impl Into<ManifestDocument>) {
        let ManifestDocument(xml) = document.into();

        let parsed = match xml::to_json(&xml) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Failed to parse cluster manifest: {}", e);
                Value::Object(Map::new())
            }
        };

        *self.lock() = State {
            xml,
            parsed,
            native_image_store: None,
        };
    }

    /// Parsed manifest tree.
    pub fn get(&self) -> Value {
        self.lock().parsed.clone()
    }

    /// Parsed manifest tree as JSON text.
    pub fn get_raw(&self) -> String {
        self.lock().parsed.to_string()
    }

    /// The manifest XML as last set.
    pub fn xml(&self) -> String {
        self.lock().xml.clone()
    }

    /// Forget the memoized flag, keeping the document.
    pub fn invalidate(&self) {
        self.lock().native_image_store = None;
    }

    /// Whether the cluster stores application packages in the native image store.
    ///
    /// Computed on first call after a `set`/`invalidate`, then served from the
    /// memo. Anything inconclusive resolves to `false`, which is memoized too.
    pub fn is_native_image_store(&self) -> bool {
        let mut state = self.lock();
        if let Some(cached) = state.native_image_store {
            return cached;
        }

        let lookup = lookup_connection_string(&state.parsed);
        let native = lookup.is_native();
        log::info!("Native image store: {} ({:?})", native, lookup);

        state.native_image_store = Some(native);
        native
    }

    /// `ImageStoreConnectionString` from the `Management` section, if present.
    pub fn image_store_connection_string(&self) -> Option<String> {
        match lookup_connection_string(&self.lock().parsed) {
            Lookup::Native(value) | Lookup::External(value) => Some(value),
            _ => None,
        }
    }
}

fn lookup_connection_string(parsed: &Value) -> Lookup {
    let Some(manifest) = parsed.get("ClusterManifest") else {
        return Lookup::EmptyDocument;
    };

    let sections = manifest
        .get("FabricSettings")
        .map(|settings| xml::as_list(settings.get("Section")))
        .unwrap_or_default();

    let Some(management) = sections
        .into_iter()
        .find(|section| xml::attribute(section, "Name") == Some(MANAGEMENT_SECTION))
    else {
        return Lookup::MissingSection;
    };

    let value = xml::as_list(management.get("Parameter"))
        .into_iter()
        .find(|parameter| xml::attribute(parameter, "Name") == Some(CONNECTION_STRING_PARAMETER))
        .and_then(|parameter| xml::attribute(parameter, "Value"));

    match value {
        Some(value) if is_native_connection_string(value) => Lookup::Native(value.to_string()),
        Some(value) => Lookup::External(value.to_string()),
        None => Lookup::MissingParameter,
    }
}

/// Case-insensitive `fabric:ImageStore` prefix test.
pub fn is_native_connection_string(value: &str) -> bool {
    value
        .get(..NATIVE_IMAGE_STORE_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(NATIVE_IMAGE_STORE_PREFIX))
}
