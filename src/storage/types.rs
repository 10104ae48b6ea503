//! Shared types used by the object-store client and helpers.

use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Root prefix under which every listing namespace lives.
pub const LISTINGS_ROOT: &str = "listings/";

/// Errors returned while interacting with the object store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid store URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The requested object key does not exist.
    #[error("Object not found: {key}")]
    NotFound {
        /// Storage key that was requested.
        key: String,
    },
    /// The store responded with an unexpected status code.
    #[error("Unexpected store response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned from the store.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
}

/// Metadata map attached to a stored object, keys lower-cased by convention.
pub type MetadataMap = BTreeMap<String, String>;

/// Metadata key carrying the uploader-declared document classification.
pub const DOCUMENT_TYPE_KEY: &str = "document_type";

/// One stored object returned by a prefix listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectEntry {
    /// Full storage key, including the listing/tenant prefix and filename.
    pub key: String,
    /// Object size in bytes as reported by the store.
    #[serde(default)]
    pub size: u64,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListResponse {
    #[serde(default)]
    pub(crate) objects: Vec<ObjectEntry>,
    #[serde(default)]
    pub(crate) common_prefixes: Vec<String>,
}

/// Build the storage prefix scoping one listing's tenants.
pub fn listing_prefix(address: &str) -> String {
    format!("{LISTINGS_ROOT}{address}/")
}

/// Build the storage prefix scoping one tenant's documents.
pub fn tenant_prefix(address: &str, tenant: &str) -> String {
    format!("{LISTINGS_ROOT}{address}/{tenant}/")
}
