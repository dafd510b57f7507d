//! Handlers for `/api/socket/*` — one-shot exchanges with the echo server.

use crate::{errors::AppError, services::AppState};
use axum::{
    Json,
    extract::{ConnectInfo, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::net::SocketAddr;
use tracing::error;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EchoRequest {
    pub text: Option<String>,
}

/// GET /api/socket/test — ping the socket server.
pub async fn test_socket(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    match state.socket.probe().await {
        Ok(response) => Ok(Json(json!({
            "success": true,
            "message": "Socket server is running",
            "response": response,
            "server_info": state.socket.server_info()
        }))),
        Err(err) => {
            error!("socket probe failed: {}", err);
            Err(AppError::internal(format!(
                "Socket server is not reachable: {}",
                err
            )))
        }
    }
}

/// POST /api/socket/send — send one raw message and record it.
pub async fn send_message(
    State(state): State<AppState>,
    ConnectInfo(caller): ConnectInfo<SocketAddr>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<Json<Value>, AppError> {
    let message = payload
        .message
        .filter(|m| !m.is_empty())
        .ok_or_else(|| AppError::bad_request("Message is required"))?;

    match state.socket.send(&message, &caller.ip().to_string()).await {
        Ok(record) => Ok(Json(json!({
            "success": true,
            "message": "Message sent successfully",
            "sent_message": record.message,
            "server_response": record.response,
            "timestamp": record.timestamp
        }))),
        Err(err) => {
            error!("socket send failed: {}", err);
            Err(AppError::internal(format!(
                "Failed to send message: {}",
                err
            )))
        }
    }
}

/// POST /api/socket/echo — send `echo <text>`, not recorded in history.
pub async fn echo_message(
    State(state): State<AppState>,
    Json(payload): Json<EchoRequest>,
) -> Result<Json<Value>, AppError> {
    let text = payload
        .text
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::bad_request("Text is required"))?;

    match state.socket.echo(&text).await {
        Ok(response) => Ok(Json(json!({
            "success": true,
            "original_text": text,
            "echo_command": format!("echo {}", text),
            "server_response": response
        }))),
        Err(err) => {
            error!("socket echo failed: {}", err);
            Err(AppError::internal(format!("Echo failed: {}", err)))
        }
    }
}

/// GET /api/socket/messages — bounded history, newest first.
pub async fn get_messages(State(state): State<AppState>) -> Json<Value> {
    let messages = state.socket.messages();
    Json(json!({
        "success": true,
        "message_count": messages.len(),
        "messages": messages,
        "server_info": state.socket.server_info()
    }))
}

/// DELETE /api/socket/messages — clear history, reporting the count removed.
pub async fn clear_messages(State(state): State<AppState>) -> Json<Value> {
    let cleared = state.socket.clear_messages();
    Json(json!({
        "success": true,
        "message": format!("Cleared {} messages", cleared),
        "remaining_messages": 0
    }))
}
