//! Share-creation endpoint.

use axum::Json;
use axum::extract::State;
use tracing::warn;
use validator::Validate;

use publink_auth::secrets_match;
use publink_core::error::{AppError, ErrorKind};
use publink_service::share::service::CreateShare;

use crate::dto::{CreateShareRequest, CreateShareResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// `POST /api/shares`.
///
/// Gated by the configured access key; an empty configured key disables
/// the endpoint entirely. Domain validation failures come back in the
/// `{status, error}` body so share tooling can show them verbatim.
pub async fn create_share(
    State(state): State<AppState>,
    Json(req): Json<CreateShareRequest>,
) -> Result<Json<CreateShareResponse>, ApiError> {
    let configured_key = &state.config.share.access_key;
    if configured_key.is_empty() {
        return Err(AppError::not_found("Not found").into());
    }
    if !secrets_match(&req.access_key, configured_key) {
        warn!("Share creation rejected: bad access key");
        return Err(AppError::authentication("Invalid access key").into());
    }

    if let Err(errors) = req.validate() {
        return Ok(Json(CreateShareResponse::err(flatten_errors(&errors))));
    }

    let result = state
        .share_service
        .create_share(CreateShare {
            path: req.path,
            expire_time: req.expire_time,
            password: req.password,
            notify: req.notify,
        })
        .await;

    match result {
        Ok(token) => Ok(Json(CreateShareResponse::ok(
            state.config.server.publink(&token),
        ))),
        Err(e) if e.kind == ErrorKind::Validation => Ok(Json(CreateShareResponse::err(e.message))),
        Err(e) if e.kind == ErrorKind::Timeout => {
            Ok(Json(CreateShareResponse::err("Operation timed out")))
        }
        Err(e) => Err(e.into()),
    }
}

fn flatten_errors(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{field} is invalid"))
            })
        })
        .collect::<Vec<_>>()
        .join("; ")
}
