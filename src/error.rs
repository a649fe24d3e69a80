use std::{io, net::SocketAddr, path::PathBuf};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Fatal errors raised while starting or running the server.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Cannot locate executable: {0}")]
    CurrentExe(#[source] io::Error),

    #[error("Executable has no parent directory: {}", .0.display())]
    NoParentDir(PathBuf),

    #[error("Cannot change directory to {}: {source}", path.display())]
    ChangeDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] io::Error),
}

/// Per-request failures, rendered as plain-text responses.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("File not found")]
    NotFound,

    #[error("No permission to list directory")]
    ListingDenied(#[source] io::Error),

    #[error("Cannot encode config payload: {0}")]
    Encode(#[from] serde_json::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::ListingDenied(e) => {
                tracing::debug!(error = %e, "Directory listing failed");
                StatusCode::NOT_FOUND
            }
            AppError::Encode(e) => {
                tracing::error!(error = %e, "Config payload encoding failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, self.to_string()).into_response()
    }
}
