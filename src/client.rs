//! Bucket-scoped S3 client facade

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::head_object::HeadObjectOutput;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{ChecksumAlgorithm, ChecksumMode, Delete, ObjectIdentifier};
use aws_sdk_s3::Client;
use base64::engine::general_purpose;
use base64::Engine as _;

use crate::credentials::{default_credentials_dir, Credentials};
use crate::error::{DeleteFailure, Error, Result};
use crate::types::{Bucket, RemoteObject};

/// Construction parameters for [`BucketClient`].
///
/// `bucket` and `region` are required and must be non-empty. When either
/// key field is `None`, both credential files are read from
/// `credentials_dir` (default `~/.s3`).
#[derive(Debug, Clone, Default)]
pub struct BucketClientConfig {
    pub bucket: String,
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Override for the credential file directory.
    pub credentials_dir: Option<PathBuf>,
    /// Custom endpoint for S3-compatible services (MinIO, LocalStack).
    pub endpoint_url: Option<String>,
    /// Use path-style addressing (required by most custom endpoints).
    pub force_path_style: bool,
}

impl BucketClientConfig {
    pub fn new(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
            ..Default::default()
        }
    }
}

/// Client bound to one bucket in one region.
///
/// Holds a single authenticated session for its whole lifetime. Every
/// operation is one request/response exchange with the service, awaited to
/// completion before returning; strict [`delete`](Self::delete) is the
/// documented exception with its extra existence check.
#[derive(Debug)]
pub struct BucketClient {
    client: Client,
    bucket: String,
    region: String,
}

impl BucketClient {
    /// Connect using credential files from the default directory.
    pub async fn new(bucket: impl Into<String>, region: impl Into<String>) -> Result<Self> {
        Self::with_config(BucketClientConfig::new(bucket, region)).await
    }

    /// Connect with explicit configuration.
    ///
    /// Resolves credentials (before any network activity), builds the
    /// session, then eagerly verifies the bucket with one `HeadBucket`
    /// round trip.
    pub async fn with_config(config: BucketClientConfig) -> Result<Self> {
        if config.bucket.is_empty() {
            return Err(Error::InvalidInput {
                reason: "bucket name must not be empty".to_string(),
            });
        }
        if config.region.is_empty() {
            return Err(Error::InvalidInput {
                reason: "region must not be empty".to_string(),
            });
        }

        let credentials = match (&config.access_key_id, &config.secret_access_key) {
            (Some(access), Some(secret)) => Credentials::new(access.clone(), secret.clone()),
            _ => {
                let dir = config
                    .credentials_dir
                    .clone()
                    .unwrap_or_else(default_credentials_dir);
                Credentials::load_from_dir(&dir)?
            }
        };

        let provider = aws_sdk_s3::config::Credentials::new(
            credentials.access_key_id,
            credentials.secret_access_key,
            None,
            None,
            "s3kit",
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(provider);
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let shared = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if config.force_path_style {
            builder = builder.force_path_style(true);
        }
        let client = Client::from_conf(builder.build());

        tracing::debug!("verifying bucket {} in {}", config.bucket, config.region);
        if let Err(err) = client.head_bucket().bucket(&config.bucket).send().await {
            return Err(match err.as_service_error() {
                Some(service) if service.is_not_found() => Error::BucketNotFound {
                    bucket: config.bucket,
                },
                _ => classify(err),
            });
        }

        Ok(Self {
            client,
            bucket: config.bucket,
            region: config.region,
        })
    }

    /// Name of the bucket this client addresses.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Region the session is bound to.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// List objects, optionally restricted to a key prefix.
    ///
    /// Returns at most one listing page in service order. A truncated
    /// listing is logged, not followed.
    pub async fn list_objects(&self, prefix: Option<&str>) -> Result<Vec<RemoteObject>> {
        let mut request = self.client.list_objects_v2().bucket(&self.bucket);
        if let Some(p) = prefix {
            request = request.prefix(p);
        }

        let response = request.send().await.map_err(|err| match err.as_service_error() {
            Some(service) if service.is_no_such_bucket() => Error::BucketNotFound {
                bucket: self.bucket.clone(),
            },
            _ => classify(err),
        })?;

        if response.is_truncated().unwrap_or(false) {
            tracing::debug!(
                "listing of {} truncated at the service page limit",
                self.bucket
            );
        }

        let objects = response
            .contents()
            .iter()
            .map(|obj| RemoteObject {
                key: obj.key().unwrap_or_default().to_string(),
                size: obj.size().unwrap_or(0) as u64,
                last_modified: obj.last_modified().map(|d| {
                    chrono::DateTime::from_timestamp(d.secs(), d.subsec_nanos())
                        .unwrap_or_default()
                }),
                etag: obj.e_tag().map(|s| s.to_string()),
                storage_class: obj.storage_class().map(|s| s.as_str().to_string()),
            })
            .collect();

        Ok(objects)
    }

    /// Keys of the plain files under `prefix`, directory placeholder keys
    /// excluded.
    pub async fn list_files(&self, prefix: Option<&str>) -> Result<Vec<String>> {
        let objects = self.list_objects(prefix).await?;
        Ok(objects
            .into_iter()
            .filter(|obj| !obj.is_placeholder())
            .map(|obj| obj.key)
            .collect())
    }

    /// All buckets owned by the credentials.
    pub async fn list_buckets(&self) -> Result<Vec<Bucket>> {
        let response = self.client.list_buckets().send().await.map_err(classify)?;

        let buckets = response
            .buckets()
            .iter()
            .map(|b| Bucket {
                name: b.name().unwrap_or_default().to_string(),
                creation_date: b.creation_date().map(|d| {
                    chrono::DateTime::from_timestamp(d.secs(), d.subsec_nanos())
                        .unwrap_or_default()
                }),
            })
            .collect();

        Ok(buckets)
    }

    /// Upload a local file to `key`, silently overwriting any existing
    /// object.
    ///
    /// A SHA-256 object checksum is recorded with the upload so
    /// [`get_sha256`](Self::get_sha256) can serve it back later.
    pub async fn upload(&self, local_path: impl AsRef<Path>, key: &str) -> Result<()> {
        let local_path = local_path.as_ref();
        if key.is_empty() {
            return Err(Error::InvalidInput {
                reason: "remote key must not be empty".to_string(),
            });
        }

        let body = ByteStream::from_path(local_path)
            .await
            .map_err(|source| Error::LocalFileNotFound {
                path: local_path.to_path_buf(),
                source: Box::new(source),
            })?;

        tracing::info!("uploading {:?} to {}/{}", local_path, self.bucket, key);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .checksum_algorithm(ChecksumAlgorithm::Sha256)
            .body(body)
            .send()
            .await
            .map_err(|err| {
                if is_auth_error(&err) {
                    Error::Authentication {
                        source: Box::new(err),
                    }
                } else {
                    Error::UploadFailed {
                        key: key.to_string(),
                        source: Box::new(err),
                    }
                }
            })?;

        Ok(())
    }

    /// Download `key` to a local path, overwriting any existing file.
    ///
    /// The parent directory of `local_path` must already exist.
    pub async fn download(&self, key: &str, local_path: impl AsRef<Path>) -> Result<()> {
        let local_path = local_path.as_ref();
        tracing::info!("downloading {}/{} to {:?}", self.bucket, key, local_path);

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| match err.as_service_error() {
                Some(service) if service.is_no_such_key() => self.object_not_found(key),
                _ => classify(err),
            })?;

        let data = response.body.collect().await.map_err(|source| Error::Service {
            source: Box::new(source),
        })?;

        tokio::fs::write(local_path, data.into_bytes())
            .await
            .map_err(|source| Error::LocalWriteFailed {
                path: local_path.to_path_buf(),
                source,
            })
    }

    /// Response headers for `key` as a name → value map.
    ///
    /// Covers `content-type`, `content-length`, `etag`, `last-modified`
    /// and any `x-amz-meta-*` metadata stored with the object.
    pub async fn get_headers(&self, key: &str) -> Result<HashMap<String, String>> {
        let response = self.head(key, false).await?;

        let mut headers = HashMap::new();
        if let Some(content_type) = response.content_type() {
            headers.insert("content-type".to_string(), content_type.to_string());
        }
        if let Some(length) = response.content_length() {
            headers.insert("content-length".to_string(), length.to_string());
        }
        if let Some(etag) = response.e_tag() {
            headers.insert("etag".to_string(), etag.to_string());
        }
        if let Some(modified) = response.last_modified() {
            let formatted = chrono::DateTime::from_timestamp(modified.secs(), modified.subsec_nanos())
                .unwrap_or_default()
                .to_rfc2822();
            headers.insert("last-modified".to_string(), formatted);
        }
        if let Some(metadata) = response.metadata() {
            for (name, value) in metadata {
                headers.insert(format!("x-amz-meta-{name}"), value.clone());
            }
        }

        Ok(headers)
    }

    /// Size of `key` in bytes, derived from the object headers.
    pub async fn get_size(&self, key: &str) -> Result<u64> {
        let response = self.head(key, false).await?;
        Ok(response.content_length().unwrap_or(0) as u64)
    }

    /// Hex-encoded SHA-256 of `key`, served from the checksum the service
    /// recorded at upload time.
    ///
    /// Objects stored without a SHA-256 checksum, or through a multipart
    /// upload (composite checksum), report [`Error::HashUnavailable`]. The
    /// content is never downloaded and re-hashed locally.
    pub async fn get_sha256(&self, key: &str) -> Result<String> {
        let response = self.head(key, true).await?;

        response
            .checksum_sha256()
            .and_then(decode_checksum)
            .ok_or_else(|| Error::HashUnavailable {
                key: key.to_string(),
            })
    }

    /// Remove `key` from the bucket.
    ///
    /// Deletion is strict: the key must exist, verified with an extra head
    /// request, so deleting the same key twice fails the second time with
    /// [`Error::RemoteObjectNotFound`].
    pub async fn delete(&self, key: &str) -> Result<()> {
        self.head(key, false).await?;

        tracing::info!("deleting {}/{}", self.bucket, key);
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(classify)?;

        Ok(())
    }

    /// Remove a batch of keys in one request.
    ///
    /// An empty batch returns `Ok` without contacting the service. Keys
    /// the service refuses are reported through
    /// [`Error::PartialDeleteFailure`]; the remaining keys stay deleted.
    pub async fn delete_many(&self, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }

        tracing::info!("deleting {} objects from {}", keys.len(), self.bucket);
        let payload = build_delete_payload(keys)?;
        let response = self
            .client
            .delete_objects()
            .bucket(&self.bucket)
            .delete(payload)
            .send()
            .await
            .map_err(classify)?;

        let failed: Vec<DeleteFailure> = response
            .errors()
            .iter()
            .map(|e| DeleteFailure {
                key: e.key().unwrap_or_default().to_string(),
                code: e.code().map(|s| s.to_string()),
                message: e.message().map(|s| s.to_string()),
            })
            .collect();

        if failed.is_empty() {
            Ok(())
        } else {
            Err(Error::PartialDeleteFailure {
                attempted: keys.len(),
                failed,
            })
        }
    }

    async fn head(&self, key: &str, checksums: bool) -> Result<HeadObjectOutput> {
        let mut request = self.client.head_object().bucket(&self.bucket).key(key);
        if checksums {
            request = request.checksum_mode(ChecksumMode::Enabled);
        }

        request.send().await.map_err(|err| match err.as_service_error() {
            Some(service) if service.is_not_found() => self.object_not_found(key),
            _ => classify(err),
        })
    }

    fn object_not_found(&self, key: &str) -> Error {
        Error::RemoteObjectNotFound {
            bucket: self.bucket.clone(),
            key: key.to_string(),
        }
    }
}

// HEAD responses have no error body, so a rejected signature there is only
// visible through the HTTP status.
fn is_auth_error<E: ProvideErrorMetadata>(err: &SdkError<E>) -> bool {
    if matches!(
        err.code(),
        Some(
            "AccessDenied"
                | "InvalidAccessKeyId"
                | "SignatureDoesNotMatch"
                | "ExpiredToken"
                | "AuthorizationHeaderMalformed"
        )
    ) {
        return true;
    }

    err.raw_response()
        .map(|response| {
            let status = response.status().as_u16();
            status == 401 || status == 403
        })
        .unwrap_or(false)
}

fn classify<E>(err: SdkError<E>) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    if is_auth_error(&err) {
        Error::Authentication {
            source: Box::new(err),
        }
    } else {
        Error::Service {
            source: Box::new(err),
        }
    }
}

fn build_delete_payload(keys: &[String]) -> Result<Delete> {
    let mut objects = Vec::with_capacity(keys.len());
    for key in keys {
        let id = ObjectIdentifier::builder()
            .key(key)
            .build()
            .map_err(|source| Error::Service {
                source: Box::new(source),
            })?;
        objects.push(id);
    }

    Delete::builder()
        .set_objects(Some(objects))
        .build()
        .map_err(|source| Error::Service {
            source: Box::new(source),
        })
}

/// Decode a service-reported base64 checksum into lowercase hex.
///
/// Composite multipart checksums (`<base64>-<parts>`) are not a content
/// digest and yield `None`.
fn decode_checksum(value: &str) -> Option<String> {
    if value.contains('-') {
        return None;
    }
    let bytes = general_purpose::STANDARD.decode(value).ok()?;
    Some(hex_encode(&bytes))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_encode() {
        assert_eq!(hex_encode(&[0x00, 0xff, 0x10]), "00ff10");
        assert_eq!(hex_encode(&[]), "");
    }

    #[test]
    fn test_decode_checksum_plain_digest() {
        // base64 of the bytes 01 02 03 04
        assert_eq!(decode_checksum("AQIDBA==").as_deref(), Some("01020304"));
    }

    #[test]
    fn test_decode_checksum_rejects_composite() {
        assert!(decode_checksum("AQIDBA==-5").is_none());
    }

    #[test]
    fn test_decode_checksum_rejects_invalid_base64() {
        assert!(decode_checksum("not base64 at all!").is_none());
    }

    #[test]
    fn test_delete_payload_preserves_order() {
        let keys = vec!["b".to_string(), "a".to_string(), "b".to_string()];
        let payload = build_delete_payload(&keys).unwrap();

        let out: Vec<&str> = payload.objects().iter().map(|o| o.key()).collect();
        assert_eq!(out, ["b", "a", "b"]);
    }

    #[test]
    fn test_config_new_defaults() {
        let config = BucketClientConfig::new("my-bucket", "eu-west-1");
        assert_eq!(config.bucket, "my-bucket");
        assert_eq!(config.region, "eu-west-1");
        assert!(config.access_key_id.is_none());
        assert!(config.secret_access_key.is_none());
        assert!(config.credentials_dir.is_none());
        assert!(config.endpoint_url.is_none());
        assert!(!config.force_path_style);
    }
}
