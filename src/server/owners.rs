//! Owners endpoint.
//!
//! `GET /repos/{org}/{repo}/pulls/{number}/owners` answers with the JSON form
//! of [`OwnersResponse`](crate::owners::OwnersResponse), resolved against the
//! configuration snapshot current at request time.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use super::AppState;
use crate::github::GitHubClient;
use crate::owners::{OwnersError, OwnersResponse};
use crate::types::PrNumber;

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for OwnersError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            message: self.to_string(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

pub async fn owners_handler<G: GitHubClient>(
    State(app_state): State<AppState<G>>,
    Path((org, repo, number)): Path<(String, String, u64)>,
) -> Result<Json<OwnersResponse>, OwnersError> {
    let config = app_state.config().current();
    let response = app_state
        .owners()
        .list_owners(&org, &repo, PrNumber(number), &config)
        .await?;
    Ok(Json(response))
}
