use axum::{
    extract::rejection::QueryRejection,
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use serde::Serialize;
use tracing::{debug, error};

use crate::catalog::CatalogError;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid song id: {0}")]
    InvalidId(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Invalid query: {0}")]
    InvalidQuery(#[from] QueryRejection),
    #[error("Validation failed")]
    Validation(#[from] garde::Report),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorBody {
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "error"))]
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidId(_)
            | ApiError::InvalidRequest(_)
            | ApiError::InvalidQuery(_)
            | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Catalog(e) => match e {
                CatalogError::NotFound { .. } => StatusCode::NOT_FOUND,
                CatalogError::NoFieldsToUpdate { .. } => StatusCode::BAD_REQUEST,
                CatalogError::UpstreamLookupFailed { .. } => StatusCode::BAD_GATEWAY,
                CatalogError::PersistenceFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn details(&self) -> Vec<String> {
        match self {
            ApiError::Validation(report) => report
                .iter()
                .map(|(path, error)| {
                    let path = path.to_string();
                    if path.is_empty() {
                        error.to_string()
                    } else {
                        format!("{path}: {error}")
                    }
                })
                .collect(),
            ApiError::InvalidQuery(rejection) => vec![rejection.body_text()],
            ApiError::Catalog(CatalogError::UpstreamLookupFailed { source, .. }) => {
                vec![source.to_string()]
            }
            _ => Vec::new(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {self:?}");
        } else {
            debug!("Request rejected: {self}");
        }
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        let body = ErrorBody {
            status: "error",
            message,
            details: self.details(),
        };
        (status, Json(body)).into_response()
    }
}
