use crate::api::AppState;
use crate::api::schemas::notifications::{DispatchResponse, RegisterTokenRequest, SendNotificationRequest};
use crate::error::{AppError, Result};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse, response::Response};

/// Sends one notification to a caller-supplied token list.
///
/// The relay performs no token cleanup: it is not given token ownership,
/// so invalid tokens are only reported back to the caller.
///
/// # Errors
/// Returns `AppError::BadRequest` if the token list is empty or the title
/// or body is missing.
pub async fn send(State(state): State<AppState>, Json(payload): Json<SendNotificationRequest>) -> Result<Response> {
    payload.validate().map_err(AppError::BadRequest)?;

    let (tokens, request) = payload.into_parts();
    let result = state.dispatcher.dispatch(&tokens, &request).await;

    // Partial success is success; only a dispatch that delivered nothing
    // is reported as a server-side failure.
    let status = if result.success { StatusCode::OK } else { StatusCode::INTERNAL_SERVER_ERROR };
    Ok((status, Json(DispatchResponse::from_result(result, "Notifications sent"))).into_response())
}

/// Broadcast variant: same dispatch, but the HTTP status is always 200 and
/// the `success` flag alone reflects the outcome.
///
/// # Errors
/// Returns `AppError::BadRequest` on request validation failure.
pub async fn broadcast(
    State(state): State<AppState>,
    Json(payload): Json<SendNotificationRequest>,
) -> Result<Response> {
    payload.validate().map_err(AppError::BadRequest)?;

    let (tokens, request) = payload.into_parts();
    let result = state.dispatcher.dispatch(&tokens, &request).await;

    Ok((StatusCode::OK, Json(DispatchResponse::from_result(result, "Broadcast complete"))).into_response())
}

/// Registers a device token for a user. Idempotent: re-registering an
/// already-stored token leaves the set unchanged.
///
/// # Errors
/// Returns `AppError::BadRequest` if the token format is invalid.
/// Returns `AppError::NotFound` if the user does not exist.
pub async fn register_token(
    State(state): State<AppState>,
    Json(payload): Json<RegisterTokenRequest>,
) -> Result<impl IntoResponse> {
    payload.validate().map_err(AppError::BadRequest)?;
    state.users.add_token(payload.user_id, payload.token.trim()).await?;
    Ok(StatusCode::OK)
}
