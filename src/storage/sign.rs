//! HMAC-signed, time-limited download URLs.
//!
//! The store gateway accepts `GET {base}/{bucket}/{key}?expires={unix}&signature={hex}` where
//! the signature is an HMAC-SHA256 over the canonical string `"GET\n{bucket}/{key}\n{expires}"`.
//! Signing happens client-side with a shared secret, so no round trip to the store is needed
//! to hand a browser a short-lived link.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use time::OffsetDateTime;

use super::types::StoreError;

type HmacSha256 = Hmac<Sha256>;

/// Compute the hex signature for one download grant.
pub(crate) fn sign_download(bucket: &str, key: &str, expires_unix: i64, secret: &str) -> String {
    let canonical = format!("GET\n{bucket}/{key}\n{expires_unix}");
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(canonical.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Build a presigned download URL expiring `expiry_secs` from now.
///
/// Keys may contain spaces and slashes; each path segment is percent-encoded by the URL
/// builder while the slashes separating segments are preserved.
pub fn presigned_download_url(
    base_url: &str,
    bucket: &str,
    key: &str,
    secret: &str,
    expiry_secs: u64,
) -> Result<String, StoreError> {
    let expires = OffsetDateTime::now_utc().unix_timestamp() + expiry_secs as i64;
    presigned_download_url_at(base_url, bucket, key, secret, expires)
}

/// Build a presigned download URL with an explicit absolute expiry timestamp.
pub(crate) fn presigned_download_url_at(
    base_url: &str,
    bucket: &str,
    key: &str,
    secret: &str,
    expires_unix: i64,
) -> Result<String, StoreError> {
    let mut url =
        reqwest::Url::parse(base_url).map_err(|err| StoreError::InvalidUrl(err.to_string()))?;
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|()| StoreError::InvalidUrl("store URL cannot be a base".into()))?;
        segments.pop_if_empty();
        segments.push(bucket);
        for segment in key.split('/') {
            segments.push(segment);
        }
    }
    let signature = sign_download(bucket, key, expires_unix, secret);
    url.query_pairs_mut()
        .append_pair("expires", &expires_unix.to_string())
        .append_pair("signature", &signature);
    Ok(url.to_string())
}
