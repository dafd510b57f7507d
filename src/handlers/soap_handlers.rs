//! Handlers for `/api/soap/*` — JSON front for the SOAP todo service.

use crate::{errors::AppError, services::AppState};
use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::error;

#[derive(Debug, Deserialize)]
pub struct CreateTodoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTodoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

/// GET /api/soap/test — fetch the WSDL to confirm reachability.
pub async fn test_soap(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    match state.soap.probe().await {
        Ok(wsdl) => Ok(Json(json!({
            "success": true,
            "message": "SOAP server is running",
            "wsdl": wsdl
        }))),
        Err(err) => Err(AppError::internal(format!(
            "SOAP server is not reachable: {}",
            err
        ))),
    }
}

/// GET /api/soap/todos
pub async fn list_todos(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let todos = state.soap.get_all_todos().await.map_err(soap_failure)?;
    Ok(Json(json!({ "success": true, "data": todos })))
}

/// GET /api/soap/todos/{id}
pub async fn get_todo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let reply = state.soap.get_todo(id).await.map_err(soap_failure)?;
    Ok(Json(json!({ "success": true, "data": reply })))
}

/// POST /api/soap/todos
pub async fn create_todo(
    State(state): State<AppState>,
    Json(payload): Json<CreateTodoRequest>,
) -> Result<Json<Value>, AppError> {
    let title = payload
        .title
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::bad_request("Title is required"))?;
    let description = payload.description.unwrap_or_default();

    let reply = state
        .soap
        .create_todo(&title, &description)
        .await
        .map_err(soap_failure)?;
    Ok(Json(json!({ "success": true, "data": reply })))
}

/// PUT /api/soap/todos/{id}
pub async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateTodoRequest>,
) -> Result<Json<Value>, AppError> {
    let title = payload
        .title
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::bad_request("Title is required"))?;
    let description = payload.description.unwrap_or_default();
    let completed = payload.completed.unwrap_or(false);

    let reply = state
        .soap
        .update_todo(id, &title, &description, completed)
        .await
        .map_err(soap_failure)?;
    Ok(Json(json!({ "success": true, "data": reply })))
}

/// DELETE /api/soap/todos/{id}
pub async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let reply = state.soap.delete_todo(id).await.map_err(soap_failure)?;
    Ok(Json(json!({ "success": true, "data": reply })))
}

fn soap_failure(err: crate::services::soap_service::SoapError) -> AppError {
    error!("SOAP call failed: {}", err);
    AppError::internal(err.to_string())
}
