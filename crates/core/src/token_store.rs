//! Continuation token persistence
//!
//! Single-page browsing hands the user a short handle instead of the raw
//! continuation token. A token is only meaningful for the list it came from,
//! so every record carries its scope (cluster endpoint plus list path) and a
//! handle is refused when replayed against a different scope.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const HANDLE_LEN: usize = 8;
const RECORD_EXTENSION: &str = "json";

#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Corrupt token record: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("Continuation token not found: {0}")]
    NotFound(String),
    #[error("Invalid token handle: {0}")]
    InvalidHandle(String),
    #[error("Handle {handle} belongs to {recorded}, not {requested}")]
    ScopeMismatch {
        handle: String,
        recorded: String,
        requested: String,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenRecord {
    scope: String,
    token: String,
}

/// Scope of a paged list: the cluster endpoint joined with the list path.
pub fn list_scope(endpoint: &str, path: &str) -> String {
    format!(
        "{}/{}",
        endpoint.trim_end_matches('/').to_ascii_lowercase(),
        path.trim_start_matches('/')
    )
}

fn record_key(scope: &str, token: &str) -> String {
    format!("{:x}", md5::compute(format!("{scope}\n{token}").as_bytes()))
}

fn normalize_handle(handle: &str) -> Result<String, TokenStoreError> {
    let handle = handle.trim().to_ascii_lowercase();

    if handle.len() != HANDLE_LEN || !handle.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(TokenStoreError::InvalidHandle(format!(
            "expected {HANDLE_LEN} hexadecimal characters, got {handle:?}"
        )));
    }

    Ok(handle)
}

fn find_record(dir: &Path, handle: &str) -> Result<Option<PathBuf>, TokenStoreError> {
    if !dir.exists() {
        return Ok(None);
    }

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_record = path.extension().is_some_and(|ext| ext == RECORD_EXTENSION)
            && path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .is_some_and(|stem| stem.starts_with(handle));

        if is_record && path.is_file() {
            return Ok(Some(path));
        }
    }

    Ok(None)
}

/// Store `token` for `scope` in `dir` and return its handle.
pub fn save_token(dir: &Path, scope: &str, token: &str) -> Result<String, TokenStoreError> {
    fs::create_dir_all(dir)?;

    let key = record_key(scope, token);
    let record = TokenRecord {
        scope: scope.to_string(),
        token: token.to_string(),
    };
    fs::write(
        dir.join(format!("{key}.{RECORD_EXTENSION}")),
        serde_json::to_vec(&record)?,
    )?;
    log::debug!("Stored continuation token for {} as {}", scope, &key[..HANDLE_LEN]);

    Ok(key[..HANDLE_LEN].to_string())
}

/// Load the token stored under `handle`, provided it was saved for `scope`.
///
/// Handles are case-insensitive.
pub fn load_token(dir: &Path, scope: &str, handle: &str) -> Result<String, TokenStoreError> {
    let handle = normalize_handle(handle)?;

    let path = find_record(dir, &handle)?.ok_or_else(|| TokenStoreError::NotFound(handle.clone()))?;
    let record: TokenRecord = serde_json::from_slice(&fs::read(&path)?)?;

    if record.scope != scope {
        return Err(TokenStoreError::ScopeMismatch {
            handle,
            recorded: record.scope,
            requested: scope.to_string(),
        });
    }

    Ok(record.token)
}
