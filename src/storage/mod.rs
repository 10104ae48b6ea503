//! Object-store gateway integration.

pub mod client;
pub mod sign;
pub mod types;

use async_trait::async_trait;

pub use client::StoreService;
pub use sign::presigned_download_url;
pub use types::{
    DOCUMENT_TYPE_KEY, LISTINGS_ROOT, MetadataMap, ObjectEntry, StoreError, listing_prefix,
    tenant_prefix,
};

/// Interface over the blob store consumed by the screening pipeline.
///
/// The production implementation is [`StoreService`]; tests substitute in-memory fakes.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Enumerate listing addresses.
    async fn list_listings(&self) -> Result<Vec<String>, StoreError>;

    /// Enumerate tenants under one listing.
    async fn list_tenants(&self, address: &str) -> Result<Vec<String>, StoreError>;

    /// List a tenant's documents, optionally restricted to `.txt` keys.
    async fn list_documents(
        &self,
        address: &str,
        tenant: &str,
        text_only: bool,
    ) -> Result<Vec<ObjectEntry>, StoreError>;

    /// Download an object's raw bytes.
    async fn get_object(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Fetch an object's metadata map.
    async fn get_metadata(&self, key: &str) -> Result<MetadataMap, StoreError>;

    /// Store an object with metadata.
    async fn put_object(
        &self,
        key: &str,
        bytes: Vec<u8>,
        metadata: &MetadataMap,
    ) -> Result<(), StoreError>;

    /// Create the marker object establishing a listing namespace.
    async fn create_listing(&self, address: &str) -> Result<(), StoreError>;

    /// Produce a time-limited download URL for one object.
    fn presigned_download_url(&self, key: &str) -> Result<String, StoreError>;
}

#[async_trait]
impl ObjectStore for StoreService {
    async fn list_listings(&self) -> Result<Vec<String>, StoreError> {
        StoreService::list_listings(self).await
    }

    async fn list_tenants(&self, address: &str) -> Result<Vec<String>, StoreError> {
        StoreService::list_tenants(self, address).await
    }

    async fn list_documents(
        &self,
        address: &str,
        tenant: &str,
        text_only: bool,
    ) -> Result<Vec<ObjectEntry>, StoreError> {
        StoreService::list_documents(self, address, tenant, text_only).await
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        StoreService::get_object(self, key).await
    }

    async fn get_metadata(&self, key: &str) -> Result<MetadataMap, StoreError> {
        StoreService::get_metadata(self, key).await
    }

    async fn put_object(
        &self,
        key: &str,
        bytes: Vec<u8>,
        metadata: &MetadataMap,
    ) -> Result<(), StoreError> {
        StoreService::put_object(self, key, bytes, metadata).await
    }

    async fn create_listing(&self, address: &str) -> Result<(), StoreError> {
        StoreService::create_listing(self, address).await
    }

    fn presigned_download_url(&self, key: &str) -> Result<String, StoreError> {
        StoreService::presigned_download_url(self, key)
    }
}
