//! Handlers for `/api/minio/*` — bucket and object operations.
//!
//! Failure status conventions follow the original console contract:
//! a missing bucket is an expected outcome (HTTP 200 with `success:false`),
//! bad names and non-empty deletes are 400, and transport failures are 500.

use crate::{
    errors::AppError,
    services::{
        AppState,
        minio_service::{CreateBucketOutcome, MinioError},
    },
};
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::json;
use tokio_util::io::ReaderStream;
use tracing::{error, warn};

#[derive(Debug, Deserialize)]
pub struct CreateBucketRequest {
    #[serde(rename = "bucketName")]
    pub bucket_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UploadTextRequest {
    #[serde(rename = "objectName")]
    pub object_name: Option<String>,
    pub content: Option<String>,
}

/// GET /api/minio/test — list buckets to confirm reachability.
pub async fn test_minio(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    match state.minio.list_buckets().await {
        Ok(buckets) => Ok(Json(json!({
            "success": true,
            "message": "MinIO server is running",
            "buckets": buckets
        }))),
        Err(err) => Err(AppError::internal(format!(
            "MinIO server is not reachable: {}",
            err
        ))),
    }
}

/// GET /api/minio/buckets
pub async fn list_buckets(State(state): State<AppState>) -> Response {
    match state.minio.list_buckets().await {
        Ok(buckets) => Json(json!({ "success": true, "buckets": buckets })).into_response(),
        Err(err) => failure_response(err),
    }
}

/// POST /api/minio/buckets — create after normalizing the requested name.
pub async fn create_bucket(
    State(state): State<AppState>,
    Json(payload): Json<CreateBucketRequest>,
) -> Response {
    let Some(raw_name) = payload.bucket_name.filter(|name| !name.is_empty()) else {
        return AppError::bad_request("Bucket name is required").into_response();
    };

    match state.minio.create_bucket(&raw_name).await {
        Ok(CreateBucketOutcome::Created { name, renamed }) => {
            let message = if renamed {
                format!("Bucket created as '{}' (normalized from '{}')", name, raw_name)
            } else {
                format!("Bucket '{}' created successfully", name)
            };
            Json(json!({ "success": true, "message": message, "bucketName": name }))
                .into_response()
        }
        Ok(CreateBucketOutcome::AlreadyExists { name }) => Json(json!({
            "success": false,
            "error": format!("Bucket '{}' already exists", name)
        }))
        .into_response(),
        Err(err) => failure_response(err),
    }
}

/// DELETE /api/minio/buckets/{bucket} — refuses non-empty buckets.
pub async fn delete_bucket(State(state): State<AppState>, Path(bucket): Path<String>) -> Response {
    match state.minio.delete_bucket(&bucket).await {
        Ok(()) => Json(json!({
            "success": true,
            "message": format!("Bucket '{}' deleted successfully", bucket)
        }))
        .into_response(),
        Err(err) => failure_response(err),
    }
}

/// DELETE /api/minio/buckets/{bucket}/force — empties the bucket first.
pub async fn force_delete_bucket(
    State(state): State<AppState>,
    Path(bucket): Path<String>,
) -> Response {
    match state.minio.force_delete_bucket(&bucket).await {
        Ok(removed) => Json(json!({
            "success": true,
            "message": format!(
                "Bucket '{}' and all its contents ({} objects) deleted successfully",
                bucket, removed
            )
        }))
        .into_response(),
        Err(err) => failure_response(err),
    }
}

/// GET /api/minio/buckets/{bucket}/objects
pub async fn list_objects(State(state): State<AppState>, Path(bucket): Path<String>) -> Response {
    match state.minio.list_objects(&bucket).await {
        Ok(objects) => Json(json!({ "success": true, "objects": objects })).into_response(),
        Err(err) => failure_response(err),
    }
}

/// POST /api/minio/buckets/{bucket}/objects — multipart file upload.
///
/// Expects a `file` part; an optional `objectName` part overrides the
/// uploaded filename as the object key.
pub async fn upload_file(
    State(state): State<AppState>,
    Path(bucket): Path<String>,
    mut multipart: Multipart,
) -> Response {
    let mut file: Option<(String, String, Bytes)> = None;
    let mut object_name: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                return AppError::bad_request(format!("Invalid multipart body: {}", err))
                    .into_response();
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                match field.bytes().await {
                    Ok(data) => file = Some((filename, content_type, data)),
                    Err(err) => {
                        return AppError::bad_request(format!("Failed to read upload: {}", err))
                            .into_response();
                    }
                }
            }
            "objectName" => {
                if let Ok(value) = field.text().await {
                    if !value.is_empty() {
                        object_name = Some(value);
                    }
                }
            }
            _ => {}
        }
    }

    let Some((filename, content_type, data)) = file else {
        return AppError::bad_request("No file uploaded").into_response();
    };
    let object_name = object_name.unwrap_or(filename);

    match state
        .minio
        .put_object(&bucket, &object_name, data, &content_type)
        .await
    {
        Ok(size) => Json(json!({
            "success": true,
            "message": format!(
                "File '{}' uploaded successfully to bucket '{}'",
                object_name, bucket
            ),
            "objectName": object_name,
            "size": size
        }))
        .into_response(),
        Err(err) => failure_response(err),
    }
}

/// POST /api/minio/buckets/{bucket}/text — store a text body as an object.
pub async fn upload_text(
    State(state): State<AppState>,
    Path(bucket): Path<String>,
    Json(payload): Json<UploadTextRequest>,
) -> Response {
    let Some(object_name) = payload.object_name.filter(|name| !name.is_empty()) else {
        return AppError::bad_request("Object name is required").into_response();
    };
    let Some(content) = payload.content else {
        return AppError::bad_request("Content is required").into_response();
    };

    let data = Bytes::from(content);
    match state
        .minio
        .put_object(&bucket, &object_name, data, "text/plain")
        .await
    {
        Ok(size) => Json(json!({
            "success": true,
            "message": format!(
                "Text content uploaded successfully as '{}' to bucket '{}'",
                object_name, bucket
            ),
            "objectName": object_name,
            "size": size
        }))
        .into_response(),
        Err(err) => failure_response(err),
    }
}

/// GET /api/minio/buckets/{bucket}/objects/{object} — streaming download.
///
/// The store's byte stream is piped through without buffering.
pub async fn download_object(
    State(state): State<AppState>,
    Path((bucket, object)): Path<(String, String)>,
) -> Response {
    match state.minio.get_object(&bucket, &object).await {
        Ok(output) => {
            let content_type = output
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let stream = ReaderStream::new(output.body.into_async_read());

            let mut response = Response::new(Body::from_stream(stream));
            let headers = response.headers_mut();
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_str(&content_type)
                    .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
            );
            let disposition = format!("attachment; filename=\"{}\"", object);
            if let Ok(value) = HeaderValue::from_str(&disposition) {
                headers.insert(header::CONTENT_DISPOSITION, value);
            }
            response
        }
        Err(err) => failure_response(err),
    }
}

/// GET /api/minio/buckets/{bucket}/objects/{object}/text — read to
/// completion and return the content as JSON.
pub async fn read_object_text(
    State(state): State<AppState>,
    Path((bucket, object)): Path<(String, String)>,
) -> Response {
    match state.minio.read_object_text(&bucket, &object).await {
        Ok(content) => Json(json!({ "success": true, "content": content })).into_response(),
        Err(err) => failure_response(err),
    }
}

/// DELETE /api/minio/buckets/{bucket}/objects/{object}
pub async fn delete_object(
    State(state): State<AppState>,
    Path((bucket, object)): Path<(String, String)>,
) -> Response {
    match state.minio.delete_object(&bucket, &object).await {
        Ok(()) => Json(json!({
            "success": true,
            "message": format!(
                "Object '{}' deleted successfully from bucket '{}'",
                object, bucket
            )
        }))
        .into_response(),
        Err(err) => failure_response(err),
    }
}

/// Map adapter failures onto the console's status conventions.
fn failure_response(err: MinioError) -> Response {
    let status = match &err {
        MinioError::BucketMissing => StatusCode::OK,
        MinioError::InvalidName { .. } | MinioError::BucketNotEmpty { .. } => {
            StatusCode::BAD_REQUEST
        }
        MinioError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    match &err {
        MinioError::Backend(detail) => error!("object-store call failed: {}", detail),
        other => warn!("object-store request rejected: {}", other),
    }

    let mut body = json!({ "success": false, "error": err.to_string() });
    if let MinioError::BucketNotEmpty { count, .. } = &err {
        body["objectCount"] = json!(count);
    }

    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_bucket_is_a_success_false_200() {
        let response = failure_response(MinioError::BucketMissing);
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"], json!("Bucket does not exist"));
    }

    #[tokio::test]
    async fn non_empty_bucket_is_400_with_object_count() {
        let response = failure_response(MinioError::BucketNotEmpty {
            name: "full".into(),
            count: 3,
        });
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["objectCount"], json!(3));
    }

    #[tokio::test]
    async fn backend_failure_is_500() {
        let response = failure_response(MinioError::Backend("connection refused".into()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn invalid_name_is_400() {
        let response = failure_response(MinioError::InvalidName {
            reason: "too weird".into(),
        });
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
