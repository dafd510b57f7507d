//! Defines the `/api` routes for all three backend adapters.
//!
//! ## Structure
//! - **SOAP todo endpoints** (`/api/soap`)
//!   - `GET    /test` — probe reachability (WSDL fetch)
//!   - `GET    /todos`, `POST /todos` — list / create
//!   - `GET    /todos/{id}`, `PUT /todos/{id}`, `DELETE /todos/{id}`
//!
//! - **Object-store endpoints** (`/api/minio`)
//!   - `GET    /test` — probe reachability + list buckets
//!   - `GET    /buckets`, `POST /buckets`
//!   - `DELETE /buckets/{bucket}` — refuses non-empty buckets
//!   - `DELETE /buckets/{bucket}/force` — empties first, then deletes
//!   - `GET    /buckets/{bucket}/objects`, `POST` (multipart upload)
//!   - `POST   /buckets/{bucket}/text` — upload a text body
//!   - `GET    /buckets/{bucket}/objects/{object}` — streaming download
//!   - `GET    /buckets/{bucket}/objects/{object}/text` — read as text
//!   - `DELETE /buckets/{bucket}/objects/{object}`
//!
//! - **Socket endpoints** (`/api/socket`)
//!   - `GET    /test`, `POST /send`, `POST /echo`
//!   - `GET    /messages`, `DELETE /messages`

use crate::{
    handlers::{minio_handlers, soap_handlers, socket_handlers},
    services::AppState,
};
use axum::{
    Router,
    routing::{delete, get, post},
};

/// Build and return the router for the whole `/api` surface.
///
/// The router carries shared state (`AppState`) to all handlers.
pub fn routes() -> Router<AppState> {
    Router::new()
        // SOAP todo service
        .route("/api/soap/test", get(soap_handlers::test_soap))
        .route(
            "/api/soap/todos",
            get(soap_handlers::list_todos).post(soap_handlers::create_todo),
        )
        .route(
            "/api/soap/todos/{id}",
            get(soap_handlers::get_todo)
                .put(soap_handlers::update_todo)
                .delete(soap_handlers::delete_todo),
        )
        // Object store
        .route("/api/minio/test", get(minio_handlers::test_minio))
        .route(
            "/api/minio/buckets",
            get(minio_handlers::list_buckets).post(minio_handlers::create_bucket),
        )
        .route(
            "/api/minio/buckets/{bucket}",
            delete(minio_handlers::delete_bucket),
        )
        .route(
            "/api/minio/buckets/{bucket}/force",
            delete(minio_handlers::force_delete_bucket),
        )
        .route(
            "/api/minio/buckets/{bucket}/objects",
            get(minio_handlers::list_objects).post(minio_handlers::upload_file),
        )
        .route(
            "/api/minio/buckets/{bucket}/text",
            post(minio_handlers::upload_text),
        )
        .route(
            "/api/minio/buckets/{bucket}/objects/{object}",
            get(minio_handlers::download_object).delete(minio_handlers::delete_object),
        )
        .route(
            "/api/minio/buckets/{bucket}/objects/{object}/text",
            get(minio_handlers::read_object_text),
        )
        // Socket server
        .route("/api/socket/test", get(socket_handlers::test_socket))
        .route("/api/socket/send", post(socket_handlers::send_message))
        .route("/api/socket/echo", post(socket_handlers::echo_message))
        .route(
            "/api/socket/messages",
            get(socket_handlers::get_messages).delete(socket_handlers::clear_messages),
        )
}
