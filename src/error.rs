//! Crate error type.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceIntentError {
    #[error("Failed to read stdin: {0}")]
    StdinRead(#[source] io::Error),

    #[error("Failed to parse input JSON: {0}")]
    InputParse(#[from] serde_json::Error),

    #[error("Failed to serialize output JSON: {0}")]
    OutputSerialize(#[source] serde_json::Error),

    #[error("Missing text")]
    InputMissing,

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Failed to read corpus from {path}: {source}")]
    CorpusRead { path: PathBuf, source: io::Error },

    #[error("Failed to bind {addr}: {source}")]
    Bind { addr: String, source: io::Error },

    #[error("Server error: {0}")]
    Serve(#[source] io::Error),
}

impl IntoResponse for VoiceIntentError {
    fn into_response(self) -> Response {
        let status = match &self {
            VoiceIntentError::InputMissing
            | VoiceIntentError::InputParse(_)
            | VoiceIntentError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
