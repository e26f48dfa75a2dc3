//! Anonymous share access: listings, downloads, password verification.

use std::net::SocketAddr;

use axum::Json;
use axum::body::Body;
use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;
use tracing::debug;

use publink_core::error::AppError;
use publink_core::result::AppResult;
use publink_core::types::pagination::PageRequest;
use publink_service::share::access::ShareTarget;

use crate::dto::{AccessQuery, DirectoryListing, VerifyPasswordRequest};
use crate::error::{ApiError, ApiErrorResponse};
use crate::extract::{client_ip, session_cookie, session_id, user_agent};
use crate::state::AppState;

/// `GET /s/{token-prefix}/{token-suffix}[/subpath...]`.
///
/// Serves a directory-listing page or streams a file download,
/// depending on what the token (plus subpath) resolves to.
pub async fn access_share(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(query): Query<AccessQuery>,
    headers: HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    jar: CookieJar,
) -> Result<Response, ApiError> {
    let (token, subpath) = parse_share_path(&path)?;
    let record = state.access_service.resolve(&token).await?;

    if record.has_password() && !is_session_verified(&state, &jar, &token) {
        return Ok(password_required());
    }

    match state.access_service.resolve_target(&record, &subpath).await? {
        ShareTarget::Directory { volume, prefix } => {
            let page = PageRequest::new(
                query.page.unwrap_or(1),
                state.config.share.page_size,
            );
            let listing = state
                .access_service
                .list_directory(&volume, &prefix, &page)
                .await?;
            let name = prefix
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .filter(|n| !n.is_empty())
                .unwrap_or(&record.filename)
                .to_string();
            Ok(Json(DirectoryListing {
                name,
                page: listing,
            })
            .into_response())
        }
        ShareTarget::File {
            volume,
            key,
            filename,
        } => {
            let ip = client_ip(&headers, connect_info.as_ref());
            let agent = user_agent(&headers);
            state
                .access_service
                .record_download(&record, &token, &subpath, &ip, &agent)
                .await?;

            let stream = state.access_service.open_download(&volume, &key).await?;
            debug!(token, key = %key, "Streaming download");
            Ok(file_response(&filename, Body::from_stream(stream)))
        }
    }
}

/// `POST /s/{token-prefix}/{token-suffix}[/...]` with `{password}`.
///
/// Verifies the share password and remembers the verification in the
/// caller's session so the link stops prompting.
pub async fn verify_password(
    State(state): State<AppState>,
    Path(path): Path<String>,
    jar: CookieJar,
    Json(req): Json<VerifyPasswordRequest>,
) -> Result<(CookieJar, Json<serde_json::Value>), ApiError> {
    let (token, _) = parse_share_path(&path)?;
    let record = state.access_service.resolve(&token).await?;

    state
        .access_service
        .check_password(&record, Some(&req.password))?;

    let session = session_id(&jar).unwrap_or_else(|| state.sessions.new_session());
    state.sessions.mark_verified(session, &token);

    Ok((jar.add(session_cookie(session)), Json(json!({"status": true}))))
}

/// Split the wildcard remainder into `(token, subpath)`. The token is
/// always exactly two segments (random prefix + filename suffix).
fn parse_share_path(path: &str) -> AppResult<(String, String)> {
    let trimmed = path.trim_start_matches('/');
    let mut segments = trimmed.splitn(3, '/');
    let prefix = segments.next().unwrap_or_default();
    let suffix = segments.next().unwrap_or_default();
    if prefix.is_empty() || suffix.is_empty() {
        return Err(AppError::not_found("Share link not found"));
    }
    let token = format!("{prefix}/{suffix}");
    let subpath = segments.next().unwrap_or_default().to_string();
    Ok((token, subpath))
}

fn is_session_verified(state: &AppState, jar: &CookieJar, token: &str) -> bool {
    session_id(jar)
        .map(|session| state.sessions.is_verified(session, token))
        .unwrap_or(false)
}

fn password_required() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ApiErrorResponse {
            error: "PASSWORD_REQUIRED".to_string(),
            message: "This link is password protected".to_string(),
        }),
    )
        .into_response()
}

fn file_response(filename: &str, body: Body) -> Response {
    let disposition = format!(
        "attachment; filename*=UTF-8''{}",
        urlencoding::encode(filename)
    );
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type_for(filename))
        .header(header::CONTENT_DISPOSITION, disposition)
        .body(body)
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

fn content_type_for(filename: &str) -> &'static str {
    let ext = filename
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_lowercase();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "txt" | "md" | "log" | "cfg" | "conf" => "text/plain; charset=utf-8",
        "html" | "htm" => "text/html; charset=utf-8",
        "json" => "application/json",
        "xml" => "application/xml",
        "csv" => "text/csv",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "zip" => "application/zip",
        "gz" | "tgz" => "application/gzip",
        "tar" => "application/x-tar",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_share_path() {
        assert_eq!(
            parse_share_path("abc123/report.pdf").unwrap(),
            ("abc123/report.pdf".to_string(), String::new())
        );
        assert_eq!(
            parse_share_path("abc123/docs/sub/file.txt").unwrap(),
            ("abc123/docs".to_string(), "sub/file.txt".to_string())
        );
        assert!(parse_share_path("abc123").is_err());
        assert!(parse_share_path("").is_err());
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for("report.pdf"), "application/pdf");
        assert_eq!(content_type_for("archive.tar"), "application/x-tar");
        assert_eq!(content_type_for("mystery.bin"), "application/octet-stream");
    }
}
