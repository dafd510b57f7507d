//! Object-store adapter.
//!
//! Wraps the bucket and object lifecycle against an S3-compatible store.
//! Every mutating call goes straight to the store and every list re-queries
//! it, so results are immediately visible with no client-side caching.
//! Bucket names cross this boundary only in normalized form.

use crate::config::AppConfig;
use crate::models::{bucket::BucketSummary, object::ObjectSummary};
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::{ByteStream, DateTimeFormat};
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use aws_sdk_s3::{Client, Config as S3Config};
use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, info};

const BUCKET_NAME_MIN_LEN: usize = 3;
const BUCKET_NAME_MAX_LEN: usize = 63;

/// S3 bulk delete accepts at most 1000 keys per request.
const BULK_DELETE_CHUNK: usize = 1000;

#[derive(Debug, Error)]
pub enum MinioError {
    /// Raw name could not be normalized into a valid bucket name.
    #[error(
        "Invalid bucket name: {reason}. Bucket names must be lowercase, 3-63 characters, and contain only letters, numbers, dots, and hyphens."
    )]
    InvalidName { reason: String },

    /// The addressed bucket does not exist. An expected negative outcome,
    /// not a transport failure.
    #[error("Bucket does not exist")]
    BucketMissing,

    /// Non-force delete refused because the bucket still holds objects.
    #[error(
        "Cannot delete bucket '{name}'. Bucket is not empty. It contains {count} object(s). Please delete all objects first."
    )]
    BucketNotEmpty { name: String, count: usize },

    /// Store unreachable or the call itself failed.
    #[error("{0}")]
    Backend(String),
}

pub type MinioResult<T> = Result<T, MinioError>;

/// Outcome of a create-bucket call. Creating a name that already exists is
/// reported, not raised, and no create call is issued for it.
#[derive(Debug)]
pub enum CreateBucketOutcome {
    Created { name: String, renamed: bool },
    AlreadyExists { name: String },
}

/// Client for the S3-compatible object store. Cheap to clone.
#[derive(Clone)]
pub struct MinioService {
    client: Client,
}

impl MinioService {
    /// Build an S3 client against the configured endpoint with static
    /// credentials and path-style addressing.
    pub fn new(cfg: &AppConfig) -> Self {
        let endpoint = cfg.minio_endpoint_url();
        info!("Initializing object-store client for {}", endpoint);

        let credentials = Credentials::new(
            cfg.minio_access_key.clone(),
            cfg.minio_secret_key.clone(),
            None,
            None,
            "protocol-gateway",
        );

        let s3_config = S3Config::builder()
            .credentials_provider(credentials)
            .region(Region::new("us-east-1"))
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(endpoint)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(s3_config),
        }
    }

    /// List all buckets. Doubles as the connectivity probe.
    pub async fn list_buckets(&self) -> MinioResult<Vec<BucketSummary>> {
        let response = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(backend_err)?;

        let buckets = response
            .buckets()
            .iter()
            .map(|bucket| BucketSummary {
                name: bucket.name().unwrap_or_default().to_string(),
                creation_date: bucket
                    .creation_date()
                    .and_then(|dt| dt.fmt(DateTimeFormat::DateTime).ok()),
            })
            .collect::<Vec<_>>();

        debug!("listed {} buckets", buckets.len());
        Ok(buckets)
    }

    pub async fn bucket_exists(&self, name: &str) -> MinioResult<bool> {
        match self.client.head_bucket().bucket(name).send().await {
            Ok(_) => Ok(true),
            Err(SdkError::ServiceError(ctx)) if ctx.err().is_not_found() => Ok(false),
            Err(err) => Err(backend_err(err)),
        }
    }

    /// Normalize the raw name, then create the bucket unless it already
    /// exists. Reports whether the final name differs from the input so the
    /// caller can tell the user about the rename.
    pub async fn create_bucket(&self, raw_name: &str) -> MinioResult<CreateBucketOutcome> {
        let name = normalize_bucket_name(raw_name)?;
        debug!("bucket name `{}` normalized to `{}`", raw_name, name);

        if self.bucket_exists(&name).await? {
            return Ok(CreateBucketOutcome::AlreadyExists { name });
        }

        self.client
            .create_bucket()
            .bucket(&name)
            .send()
            .await
            .map_err(backend_err)?;

        Ok(CreateBucketOutcome::Created {
            renamed: name != raw_name,
            name,
        })
    }

    /// Delete an empty bucket. Fails with the object count when the bucket
    /// still holds objects, so the caller can offer the force path.
    pub async fn delete_bucket(&self, name: &str) -> MinioResult<()> {
        if !self.bucket_exists(name).await? {
            return Err(MinioError::BucketMissing);
        }

        let count = self.list_all_objects(name).await?.len();
        if count > 0 {
            return Err(MinioError::BucketNotEmpty {
                name: name.to_string(),
                count,
            });
        }

        self.client
            .delete_bucket()
            .bucket(name)
            .send()
            .await
            .map_err(backend_err)?;
        Ok(())
    }

    /// Delete all objects in the bucket, then the bucket itself. Returns
    /// how many objects were removed; an empty bucket skips the bulk-delete
    /// call entirely.
    pub async fn force_delete_bucket(&self, name: &str) -> MinioResult<usize> {
        if !self.bucket_exists(name).await? {
            return Err(MinioError::BucketMissing);
        }

        let keys: Vec<String> = self
            .list_all_objects(name)
            .await?
            .into_iter()
            .map(|object| object.name)
            .collect();

        if !keys.is_empty() {
            debug!("force delete: removing {} objects from `{}`", keys.len(), name);
            self.delete_keys(name, &keys).await?;
        }

        self.client
            .delete_bucket()
            .bucket(name)
            .send()
            .await
            .map_err(backend_err)?;
        Ok(keys.len())
    }

    pub async fn list_objects(&self, bucket: &str) -> MinioResult<Vec<ObjectSummary>> {
        if !self.bucket_exists(bucket).await? {
            return Err(MinioError::BucketMissing);
        }
        self.list_all_objects(bucket).await
    }

    /// Store `data` under `key`. Returns the stored size in bytes.
    pub async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> MinioResult<usize> {
        if !self.bucket_exists(bucket).await? {
            return Err(MinioError::BucketMissing);
        }

        let size = data.len();
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(backend_err)?;
        Ok(size)
    }

    /// Fetch an object for streaming. The caller decides whether to pipe
    /// the byte stream through or accumulate it.
    pub async fn get_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> MinioResult<aws_sdk_s3::operation::get_object::GetObjectOutput> {
        if !self.bucket_exists(bucket).await? {
            return Err(MinioError::BucketMissing);
        }

        self.client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(backend_err)
    }

    /// Read an object to completion and decode it as text.
    pub async fn read_object_text(&self, bucket: &str, key: &str) -> MinioResult<String> {
        let output = self.get_object(bucket, key).await?;
        let data = output.body.collect().await.map_err(backend_err)?;
        Ok(String::from_utf8_lossy(&data.into_bytes()).into_owned())
    }

    pub async fn delete_object(&self, bucket: &str, key: &str) -> MinioResult<()> {
        if !self.bucket_exists(bucket).await? {
            return Err(MinioError::BucketMissing);
        }

        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(backend_err)?;
        Ok(())
    }

    /// Full recursive listing, following continuation tokens to the end.
    async fn list_all_objects(&self, bucket: &str) -> MinioResult<Vec<ObjectSummary>> {
        let mut objects = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut request = self.client.list_objects_v2().bucket(bucket);
            if let Some(token) = &continuation {
                request = request.continuation_token(token);
            }
            let page = request.send().await.map_err(backend_err)?;

            for object in page.contents() {
                objects.push(ObjectSummary {
                    name: object.key().unwrap_or_default().to_string(),
                    size: object.size().unwrap_or(0),
                    last_modified: object
                        .last_modified()
                        .and_then(|dt| dt.fmt(DateTimeFormat::DateTime).ok()),
                    etag: object.e_tag().map(str::to_string),
                });
            }

            if page.is_truncated() == Some(true) {
                continuation = page.next_continuation_token().map(str::to_string);
            } else {
                break;
            }
        }

        Ok(objects)
    }

    async fn delete_keys(&self, bucket: &str, keys: &[String]) -> MinioResult<()> {
        for chunk in keys.chunks(BULK_DELETE_CHUNK) {
            let identifiers = chunk
                .iter()
                .map(|key| ObjectIdentifier::builder().key(key).build())
                .collect::<Result<Vec<_>, _>>()
                .map_err(backend_err)?;
            let delete = Delete::builder()
                .set_objects(Some(identifiers))
                .build()
                .map_err(backend_err)?;

            self.client
                .delete_objects()
                .bucket(bucket)
                .delete(delete)
                .send()
                .await
                .map_err(backend_err)?;
        }
        Ok(())
    }
}

fn backend_err<E>(err: E) -> MinioError
where
    E: std::error::Error + Send + Sync + 'static,
{
    MinioError::Backend(aws_sdk_s3::error::DisplayErrorContext(&err).to_string())
}

/// Normalize a user-supplied bucket name into the store's allowed form.
///
/// Deterministic and idempotent: lowercase, map everything outside
/// `[a-z0-9.-]` to `-`, strip leading/trailing `-`/`.`, collapse runs of
/// the same separator, pad with `x` up to 3 chars, truncate to 63. The
/// final anchor check (`^[a-z0-9][a-z0-9.-]*[a-z0-9]$`, single-character
/// results exempt) can still fail, e.g. when truncation leaves a trailing
/// separator.
pub fn normalize_bucket_name(raw: &str) -> MinioResult<String> {
    let lowered = raw.to_lowercase();

    let mapped: String = lowered
        .chars()
        .map(|ch| match ch {
            'a'..='z' | '0'..='9' | '.' | '-' => ch,
            _ => '-',
        })
        .collect();

    let trimmed = mapped.trim_matches(['-', '.']);

    let mut name = String::with_capacity(trimmed.len());
    for ch in trimmed.chars() {
        if (ch == '-' || ch == '.') && name.ends_with(ch) {
            continue;
        }
        name.push(ch);
    }

    while name.len() < BUCKET_NAME_MIN_LEN {
        name.push('x');
    }
    if name.len() > BUCKET_NAME_MAX_LEN {
        name.truncate(BUCKET_NAME_MAX_LEN);
    }

    if name.len() > 1 && !is_valid_bucket_name(&name) {
        return Err(MinioError::InvalidName {
            reason: "name contains invalid characters even after normalization".into(),
        });
    }

    Ok(name)
}

/// Direct check of `^[a-z0-9][a-z0-9.-]*[a-z0-9]$`.
fn is_valid_bucket_name(name: &str) -> bool {
    fn edge(b: u8) -> bool {
        b.is_ascii_lowercase() || b.is_ascii_digit()
    }
    fn inner(b: u8) -> bool {
        edge(b) || b == b'.' || b == b'-'
    }

    match name.as_bytes() {
        [] => false,
        [only] => edge(*only),
        [first, middle @ .., last] => {
            edge(*first) && edge(*last) && middle.iter().copied().all(inner)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_punctuation() {
        assert_eq!(normalize_bucket_name("My_Bucket!!").unwrap(), "my-bucket");
    }

    #[test]
    fn pads_short_names() {
        assert_eq!(normalize_bucket_name("ab").unwrap(), "abx");
        assert_eq!(normalize_bucket_name("a").unwrap(), "axx");
    }

    #[test]
    fn collapses_separator_runs() {
        assert_eq!(normalize_bucket_name("a---b...c").unwrap(), "a-b.c");
        // Mixed runs are not the same separator, so they survive.
        assert_eq!(normalize_bucket_name("a.-b").unwrap(), "a.-b");
    }

    #[test]
    fn strips_leading_and_trailing_separators() {
        assert_eq!(normalize_bucket_name("..--data--..").unwrap(), "data");
    }

    #[test]
    fn truncates_to_max_length() {
        let name = normalize_bucket_name(&"a".repeat(100)).unwrap();
        assert_eq!(name.len(), 63);
    }

    #[test]
    fn truncation_can_expose_invalid_trailing_separator() {
        // 62 valid chars, a hyphen at index 62, more valid chars after;
        // truncation to 63 leaves the hyphen last.
        let raw = format!("{}-{}", "a".repeat(62), "b".repeat(7));
        assert!(matches!(
            normalize_bucket_name(&raw),
            Err(MinioError::InvalidName { .. })
        ));
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in [
            "My_Bucket!!",
            "ab",
            "  spaced out name  ",
            "..--data--..",
            "ALL_CAPS_123",
            "already-valid.name",
            "x",
            "a---b...c",
        ] {
            let once = normalize_bucket_name(raw).unwrap();
            let twice = normalize_bucket_name(&once).unwrap();
            assert_eq!(once, twice, "not idempotent for {:?}", raw);
        }
    }

    #[test]
    fn result_always_within_bounds_and_alphabet() {
        for raw in ["a", "Hello World", "???", "-.-.-", &"z".repeat(200)] {
            if let Ok(name) = normalize_bucket_name(raw) {
                assert!(name.len() >= BUCKET_NAME_MIN_LEN, "too short for {:?}", raw);
                assert!(name.len() <= BUCKET_NAME_MAX_LEN, "too long for {:?}", raw);
                assert!(
                    name.chars()
                        .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '.' | '-')),
                    "bad alphabet for {:?}",
                    raw
                );
            }
        }
    }

    #[test]
    fn valid_names_pass_through_unchanged() {
        for name in ["my-bucket", "abc", "a.b.c", "bucket-123"] {
            assert_eq!(normalize_bucket_name(name).unwrap(), name);
        }
    }

    #[test]
    fn anchor_check_accepts_and_rejects() {
        assert!(is_valid_bucket_name("abc"));
        assert!(is_valid_bucket_name("a-b.c9"));
        assert!(!is_valid_bucket_name("-abc"));
        assert!(!is_valid_bucket_name("abc-"));
        assert!(!is_valid_bucket_name(""));
        assert!(is_valid_bucket_name("a"));
        assert!(!is_valid_bucket_name("-"));
    }
}
