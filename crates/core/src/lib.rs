//! Core library for sfx
//!
//! This crate is the **Functional Core** of the sfx Service Fabric explorer.
//! The `sfx` binary is the Imperative Shell: it owns HTTP, configuration and
//! terminal output, and hands plain data to the functions here.
//!
//! Nothing in this crate performs network I/O. The pagination aggregator
//! awaits whatever futures its caller supplies, so it runs on any executor.
//!
//! # Module Organization
//!
//! - [`pagination`]: Walk continuation-token list endpoints into one collection
//! - [`tree`]: Tree nodes with inferred expand state and details bindings
//! - [`explorer`]: REST resource descriptors and the cluster hierarchy builder
//! - [`manifest`]: Cluster manifest cache and the native image store flag
//! - [`token_store`]: Short handles for continuation tokens between CLI runs
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use sfx_core::pagination::{aggregate, Page};
//!
//! let nodes = aggregate(|token: Option<String>| async move {
//!     fetch_nodes_page(token).await
//! })
//! .await?;
//! ```

pub mod explorer;
pub mod manifest;
pub mod pagination;
pub mod token_store;
pub mod tree;
