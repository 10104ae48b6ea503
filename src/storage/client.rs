//! HTTP client wrapper for the object-store gateway.
//!
//! The gateway is a key-prefix-addressed blob store. Listing is a JSON endpoint on the
//! bucket root (`prefix` and `delimiter` query parameters, the latter grouping keys by
//! their next path segment); object bodies travel as raw bytes; per-object metadata rides
//! on `x-meta-*` headers.

use crate::config::get_config;
use crate::storage::sign;
use crate::storage::types::{
    ListResponse, MetadataMap, ObjectEntry, StoreError, listing_prefix, tenant_prefix,
};
use reqwest::{Client, Method, StatusCode, Url};

/// Header prefix carrying object metadata in both directions.
const META_HEADER_PREFIX: &str = "x-meta-";

/// Lightweight HTTP client for object-store operations.
pub struct StoreService {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) bucket: String,
    pub(crate) api_key: Option<String>,
    pub(crate) signing_key: String,
    pub(crate) presign_expiry_secs: u64,
}

impl StoreService {
    /// Construct a new client using configuration derived from the environment.
    pub fn new() -> Result<Self, StoreError> {
        let config = get_config();
        let client = Client::builder().user_agent("tenantdesk/0.1").build()?;

        let base_url = normalize_base_url(&config.store_url).map_err(StoreError::InvalidUrl)?;
        tracing::debug!(
            url = %base_url,
            bucket = %config.store_bucket,
            has_api_key = config.store_api_key.is_some(),
            "Initialized store HTTP client"
        );

        Ok(Self {
            client,
            base_url,
            bucket: config.store_bucket.clone(),
            api_key: config.store_api_key.clone(),
            signing_key: config.store_signing_key.clone(),
            presign_expiry_secs: config.presign_expiry_secs,
        })
    }

    /// Enumerate listing addresses by grouping keys under the listings root.
    pub async fn list_listings(&self) -> Result<Vec<String>, StoreError> {
        let response = self
            .list_raw(crate::storage::types::LISTINGS_ROOT, Some("/"))
            .await?;
        Ok(response
            .common_prefixes
            .into_iter()
            .filter_map(|prefix| {
                prefix
                    .strip_prefix(crate::storage::types::LISTINGS_ROOT)
                    .map(|rest| rest.trim_end_matches('/').to_string())
            })
            .filter(|address| !address.is_empty())
            .collect())
    }

    /// Enumerate tenants that have submitted documents under one listing.
    pub async fn list_tenants(&self, address: &str) -> Result<Vec<String>, StoreError> {
        let prefix = listing_prefix(address);
        let response = self.list_raw(&prefix, Some("/")).await?;
        Ok(response
            .common_prefixes
            .into_iter()
            .filter_map(|grouped| {
                grouped
                    .strip_prefix(prefix.as_str())
                    .map(|rest| rest.trim_end_matches('/').to_string())
            })
            .filter(|tenant| !tenant.is_empty())
            .collect())
    }

    /// List a tenant's stored documents, optionally restricted to plain-text files.
    ///
    /// Prefix marker objects (keys ending in `/`) are never reported as documents.
    pub async fn list_documents(
        &self,
        address: &str,
        tenant: &str,
        text_only: bool,
    ) -> Result<Vec<ObjectEntry>, StoreError> {
        let prefix = tenant_prefix(address, tenant);
        let response = self.list_raw(&prefix, None).await?;
        Ok(response
            .objects
            .into_iter()
            .filter(|entry| !entry.key.ends_with('/'))
            .filter(|entry| !text_only || entry.key.ends_with(".txt"))
            .collect())
    }

    /// Download an object's raw bytes.
    pub async fn get_object(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let response = self
            .request(Method::GET, self.object_url(key)?)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(response.bytes().await?.to_vec()),
            StatusCode::NOT_FOUND => Err(StoreError::NotFound {
                key: key.to_string(),
            }),
            status => {
                let body = response.text().await.unwrap_or_default();
                let error = StoreError::UnexpectedStatus { status, body };
                tracing::error!(key, error = %error, "Failed to fetch object");
                Err(error)
            }
        }
    }

    /// Fetch an object's metadata map from its `x-meta-*` headers.
    ///
    /// Header names are case-folded; values that are not valid header text are dropped
    /// with a warning rather than failing the whole lookup.
    pub async fn get_metadata(&self, key: &str) -> Result<MetadataMap, StoreError> {
        let response = self
            .request(Method::HEAD, self.object_url(key)?)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let mut metadata = MetadataMap::new();
                for (name, value) in response.headers() {
                    let name = name.as_str().to_ascii_lowercase();
                    if let Some(meta_key) = name.strip_prefix(META_HEADER_PREFIX) {
                        match value.to_str() {
                            Ok(text) => {
                                metadata.insert(meta_key.to_string(), text.to_string());
                            }
                            Err(_) => {
                                tracing::warn!(key, meta_key, "Dropping non-text metadata value");
                            }
                        }
                    }
                }
                Ok(metadata)
            }
            StatusCode::NOT_FOUND => Err(StoreError::NotFound {
                key: key.to_string(),
            }),
            status => {
                // HEAD responses carry no body worth reporting.
                let error = StoreError::UnexpectedStatus {
                    status,
                    body: String::new(),
                };
                tracing::error!(key, error = %error, "Failed to fetch metadata");
                Err(error)
            }
        }
    }

    /// Store an object under the given key with optional metadata headers.
    pub async fn put_object(
        &self,
        key: &str,
        bytes: Vec<u8>,
        metadata: &MetadataMap,
    ) -> Result<(), StoreError> {
        let mut request = self.request(Method::PUT, self.object_url(key)?);
        for (meta_key, value) in metadata {
            request = request.header(format!("{META_HEADER_PREFIX}{meta_key}"), value);
        }
        let response = request.body(bytes).send().await?;

        self.ensure_success(response, || {
            tracing::debug!(key, "Object stored");
        })
        .await
    }

    /// Create the empty marker object that establishes a listing namespace.
    ///
    /// Re-creating an existing listing is a no-op at the store level, so the operation
    /// is idempotent.
    pub async fn create_listing(&self, address: &str) -> Result<(), StoreError> {
        let marker = listing_prefix(address);
        self.put_object(&marker, Vec::new(), &MetadataMap::new())
            .await?;
        tracing::info!(address, "Listing created");
        Ok(())
    }

    /// Produce a time-limited download URL for one object.
    pub fn presigned_download_url(&self, key: &str) -> Result<String, StoreError> {
        sign::presigned_download_url(
            &self.base_url,
            &self.bucket,
            key,
            &self.signing_key,
            self.presign_expiry_secs,
        )
    }

    async fn list_raw(
        &self,
        prefix: &str,
        delimiter: Option<&str>,
    ) -> Result<ListResponse, StoreError> {
        let mut url = self.bucket_url()?;
        url.query_pairs_mut().append_pair("prefix", prefix);
        if let Some(delimiter) = delimiter {
            url.query_pairs_mut().append_pair("delimiter", delimiter);
        }

        let response = self.request(Method::GET, url).send().await?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = StoreError::UnexpectedStatus { status, body };
            tracing::error!(prefix, error = %error, "Failed to list objects");
            Err(error)
        }
    }

    fn bucket_url(&self) -> Result<Url, StoreError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|err| StoreError::InvalidUrl(err.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| StoreError::InvalidUrl("store URL cannot be a base".into()))?
            .pop_if_empty()
            .push(&self.bucket);
        Ok(url)
    }

    fn object_url(&self, key: &str) -> Result<Url, StoreError> {
        let mut url = self.bucket_url()?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| StoreError::InvalidUrl("store URL cannot be a base".into()))?;
            for segment in key.split('/') {
                segments.push(segment);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        let mut req = self.client.request(method, url);
        if let Some(api_key) = &self.api_key
            && !api_key.is_empty()
        {
            req = req.header("api-key", api_key);
        }
        req
    }

    async fn ensure_success<F>(
        &self,
        response: reqwest::Response,
        on_success: F,
    ) -> Result<(), StoreError>
    where
        F: FnOnce(),
    {
        if response.status().is_success() {
            on_success();
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = StoreError::UnexpectedStatus { status, body };
            tracing::error!(error = %error, "Store request failed");
            Err(error)
        }
    }
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}
