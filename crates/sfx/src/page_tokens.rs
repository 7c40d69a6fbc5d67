use crate::prelude::*;
use std::path::PathBuf;

use sfx_core::token_store::{list_scope, load_token, save_token};

/// Directory where continuation tokens are kept between runs
fn token_dir() -> Result<PathBuf> {
    Ok(dirs_next::cache_dir()
        .ok_or_else(|| eyre!("Unable to determine cache directory"))?
        .join("sfx")
        .join("tokens"))
}

/// Store a continuation token for `path` on `endpoint` and return the handle to pass to `--next-page`
pub fn remember(endpoint: &str, path: &str, token: &str) -> Result<String> {
    save_token(&token_dir()?, &list_scope(endpoint, path), token)
        .context("Failed to cache continuation token")
}

/// Resolve a handle printed by a previous run back into its continuation token
pub fn recall(endpoint: &str, path: &str, handle: &str) -> Result<String> {
    load_token(&token_dir()?, &list_scope(endpoint, path), handle)
        .with_context(|| format!("Continuation token {} is not usable here", handle))
}
