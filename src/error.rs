use crate::database::StoreError;
use crate::schema::{ErrorCode, FieldError};
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use log::error;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed ({} errors)", .0.len())]
    Validation(Vec<FieldError>),
    #[error("malformed request body: {0}")]
    MalformedBody(String),
    #[error("Movie not found")]
    NotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<Vec<FieldError>> for ApiError {
    fn from(errors: Vec<FieldError>) -> Self {
        ApiError::Validation(errors)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut res = HttpResponse::build(self.status_code());
        match self {
            ApiError::Validation(errors) => res.json(json!({ "error": errors })),
            ApiError::MalformedBody(message) => {
                let issue = FieldError::new(ErrorCode::InvalidJson, Vec::new(), message.as_str());
                res.json(json!({ "error": [issue] }))
            }
            ApiError::NotFound => res.json(json!({ "message": "Movie not found" })),
            ApiError::Store(err) => {
                error!("{}", err);
                res.json(json!({ "message": "Internal server error" }))
            }
        }
    }
}
