use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

pub const PROJECT_SAVE_FAILED: &str = "Error while saving your project.";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    UnprocessableEntity(String),
    #[error("{0}")]
    EntityNotFound(String),
    #[error("{0}")]
    ValidationError(#[from] garde::Report),
    #[error("{0}")]
    InvalidRequest(String),
    #[error("Could not run the transaction.")]
    TransactionError(#[source] sqlx::Error),
    #[error("An error happened while running a database query.")]
    SpecificOperationError(#[source] sqlx::Error),
    #[error("No rows affected: {0}")]
    NoRowsAffectedError(String),
    #[error("{0}")]
    ConvertToUuidError(#[from] uuid::Error),
    #[error("{0}")]
    ConversionEntityError(String),
    #[error("Authentication is required.")]
    UnauthenticatedError,
    #[error("The access token is invalid.")]
    UnauthorizedError,
    #[error("This operation is not allowed.")]
    ForbiddenOperation,
    #[error("{0}")]
    ExternalServiceError(String),
    #[error("{PROJECT_SAVE_FAILED}")]
    ProjectSaveError,
}

impl AppError {
    /// Failures of the storage layer, as opposed to a rejected request.
    pub fn is_persistence_failure(&self) -> bool {
        matches!(
            self,
            AppError::TransactionError(_)
                | AppError::SpecificOperationError(_)
                | AppError::NoRowsAffectedError(_)
                | AppError::ConversionEntityError(_)
        )
    }

    /// Collapses storage failures of a project write into the generic save
    /// error. The original error only reaches the server log.
    pub fn into_project_save_error(self) -> AppError {
        if self.is_persistence_failure() {
            tracing::error!(
                error.cause_chain = ?self,
                error.message = %self,
                "Failed to save project"
            );
            AppError::ProjectSaveError
        } else {
            self
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::EntityNotFound(_) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_)
            | AppError::InvalidRequest(_)
            | AppError::ConvertToUuidError(_) => StatusCode::BAD_REQUEST,
            AppError::UnauthenticatedError | AppError::UnauthorizedError => {
                StatusCode::UNAUTHORIZED
            }
            AppError::ForbiddenOperation => StatusCode::FORBIDDEN,
            AppError::TransactionError(_)
            | AppError::SpecificOperationError(_)
            | AppError::NoRowsAffectedError(_)
            | AppError::ConversionEntityError(_)
            | AppError::ExternalServiceError(_)
            | AppError::ProjectSaveError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let msg = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(
                error.cause_chain = ?self,
                error.message = %self,
                "Unexpected error happened"
            );
            if matches!(self, AppError::ProjectSaveError) {
                self.to_string()
            } else {
                "Internal server error".to_string()
            }
        } else {
            self.to_string()
        };

        (
            status,
            Json(serde_json::json!({ "status": status.as_u16(), "msg": msg })),
        )
            .into_response()
    }
}

// 抽出に失敗したリクエストも同じ形式で返す
impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_failures_collapse_into_save_error() {
        let err = AppError::NoRowsAffectedError("no project".into()).into_project_save_error();
        assert!(matches!(err, AppError::ProjectSaveError));
        assert_eq!(err.to_string(), "Error while saving your project.");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn request_errors_pass_through_save_wrapping() {
        let err = AppError::EntityNotFound("user".into()).into_project_save_error();
        assert!(matches!(err, AppError::EntityNotFound(_)));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err = AppError::ForbiddenOperation.into_project_save_error();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn bad_credentials_are_unauthorized_not_forbidden() {
        assert_eq!(
            AppError::UnauthenticatedError.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::UnauthorizedError.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::ForbiddenOperation.status_code(),
            StatusCode::FORBIDDEN
        );
    }
}
