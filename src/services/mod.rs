//! Protocol adapters and the shared application state.

pub mod minio_service;
pub mod soap_service;
pub mod socket_service;

use crate::config::AppConfig;

/// Shared state handed to every request handler. Each adapter is cheap to
/// clone; the socket history is the only state shared across requests.
#[derive(Clone)]
pub struct AppState {
    pub soap: soap_service::SoapService,
    pub minio: minio_service::MinioService,
    pub socket: socket_service::SocketService,
}

impl AppState {
    pub fn new(cfg: &AppConfig) -> Self {
        Self {
            soap: soap_service::SoapService::new(cfg.soap_url.clone()),
            minio: minio_service::MinioService::new(cfg),
            socket: socket_service::SocketService::new(cfg.socket_addr()),
        }
    }
}
