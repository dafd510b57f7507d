//! HTTP handlers translating the browser's JSON calls to the adapters.

pub mod minio_handlers;
pub mod soap_handlers;
pub mod socket_handlers;
