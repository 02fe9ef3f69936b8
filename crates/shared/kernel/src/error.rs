use kw_database::DatabaseError;
use kw_storage::StorageError;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// The single error every inventory operation reports.
#[kw_derive::kw_error]
pub enum InventoryError {
    /// A referenced record does not exist.
    #[fault(not_found)]
    #[error("Not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A parameter is malformed or out of range.
    #[fault(invalid)]
    #[error("Invalid argument{}: {message}", format_context(.context))]
    InvalidArgument { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Unknown or expired session, IP mismatch or missing privilege.
    #[fault(not_authorized)]
    #[error("Not authorized{}: {message}", format_context(.context))]
    NotAuthorized { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The call is well formed but would break a model or business rule.
    #[fault(not_permitted)]
    #[error("Operation not permitted{}: {message}", format_context(.context))]
    OperationNotPermitted { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Database error{}: {source}", format_context(.context))]
    Database {
        #[source]
        source: DatabaseError,
        context: Option<Cow<'static, str>>,
    },

    #[error("Storage error{}: {source}", format_context(.context))]
    Storage {
        #[source]
        source: StorageError,
        context: Option<Cow<'static, str>>,
    },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl InventoryError {
    /// The kind reported to clients.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } | Self::Storage { source: StorageError::FileNotFound { .. }, .. } => {
                ErrorKind::NotFound
            },
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::NotAuthorized { .. } => ErrorKind::NotAuthorized,
            Self::OperationNotPermitted { .. } => ErrorKind::OperationNotPermitted,
            Self::Database { .. } | Self::Storage { .. } | Self::Internal { .. } => {
                ErrorKind::Internal
            },
        }
    }
}

/// Coarse classification of an [`InventoryError`], stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    NotFound,
    InvalidArgument,
    NotAuthorized,
    OperationNotPermitted,
    Internal,
}

/// Error payload of every failed call.
#[kw_derive::api_model]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&InventoryError> for ErrorBody {
    fn from(error: &InventoryError) -> Self {
        let message = match error.kind() {
            ErrorKind::Internal => "Internal server error".to_owned(),
            _ => error.to_string(),
        };
        Self { kind: error.kind(), message }
    }
}

#[cfg(feature = "server")]
mod response {
    use super::{ErrorBody, ErrorKind, InventoryError};
    use axum::Json;
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};

    impl ErrorKind {
        #[must_use]
        pub const fn status(self) -> StatusCode {
            match self {
                Self::NotFound => StatusCode::NOT_FOUND,
                Self::InvalidArgument => StatusCode::BAD_REQUEST,
                Self::NotAuthorized => StatusCode::UNAUTHORIZED,
                Self::OperationNotPermitted => StatusCode::FORBIDDEN,
                Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            }
        }
    }

    impl IntoResponse for InventoryError {
        fn into_response(self) -> Response {
            let kind = self.kind();
            if kind == ErrorKind::Internal {
                tracing::error!(error = %self, "Operation failed");
            }
            (kind.status(), Json(ErrorBody::from(&self))).into_response()
        }
    }
}
