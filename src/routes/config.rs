use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};

use crate::{
    error::AppError,
    payload::{ConfigPayload, EnvSource, ENV_KEYS},
    AppState,
};

/// `GET /api/config`: the payload built from the environment as it is right
/// now. Never falls through to the filesystem.
pub async fn get_config(State(state): State<AppState>) -> Result<Response, AppError> {
    let unset: Vec<&str> = ENV_KEYS
        .into_iter()
        .filter(|key| state.env.get(key).is_none())
        .collect();
    if !unset.is_empty() {
        tracing::debug!(?unset, "Serving config with empty values");
    }

    let body = ConfigPayload::from_source(state.env.as_ref()).to_json()?;

    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}
