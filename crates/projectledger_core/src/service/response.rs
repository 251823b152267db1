//! JSON response envelope for a transport layer.
//!
//! Shape: `{"code": <u16>, "message": <string>, "data": <optional>}`.
//! Storage failures are reported with a generic message so internal details
//! stay in the logs.

use crate::repo::project_repo::LedgerError;
use crate::repo::RepoError;
use serde::Serialize;
use std::fmt::Display;

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_NOT_FOUND: u16 = 404;
pub const STATUS_INTERNAL_ERROR: u16 = 500;

const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

/// Maps an error to the HTTP status a handler should answer with.
pub trait HttpStatus {
    fn status_code(&self) -> u16;
}

impl HttpStatus for LedgerError {
    fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => STATUS_NOT_FOUND,
            Self::Validation(_) | Self::InsufficientBudget { .. } => STATUS_BAD_REQUEST,
            Self::Db(_) | Self::InvalidData(_) => STATUS_INTERNAL_ERROR,
        }
    }
}

impl HttpStatus for RepoError {
    fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => STATUS_NOT_FOUND,
            Self::Validation(_) | Self::EmailTaken(_) => STATUS_BAD_REQUEST,
            Self::Db(_) | Self::InvalidData(_) => STATUS_INTERNAL_ERROR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponse<T> {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            code: STATUS_OK,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn from_error<E: HttpStatus + Display>(err: &E) -> Self {
        let code = err.status_code();
        let message = if code == STATUS_INTERNAL_ERROR {
            INTERNAL_ERROR_MESSAGE.to_string()
        } else {
            err.to_string()
        };
        Self {
            code,
            message,
            data: None,
        }
    }
}

impl ApiResponse<()> {
    /// Success without a payload.
    pub fn done(message: impl Into<String>) -> Self {
        Self {
            code: STATUS_OK,
            message: message.into(),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ApiResponse, HttpStatus};
    use crate::db::DbError;
    use crate::repo::project_repo::LedgerError;
    use crate::repo::EntityRef;
    use uuid::Uuid;

    #[test]
    fn ledger_errors_map_to_status_codes() {
        let id = Uuid::new_v4();
        assert_eq!(
            LedgerError::NotFound(EntityRef::Project(id)).status_code(),
            404
        );
        assert_eq!(
            LedgerError::InsufficientBudget {
                project_id: id,
                requested: 10,
                available: 5,
            }
            .status_code(),
            400
        );
        let db = LedgerError::Db(DbError::UnsupportedSchemaVersion {
            db_version: 9,
            latest_supported: 2,
        });
        assert_eq!(db.status_code(), 500);
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = LedgerError::InvalidData("bad uuid in projects.id".to_string());
        let response = ApiResponse::<()>::from_error(&err);
        assert_eq!(response.code, 500);
        assert_eq!(response.message, "internal server error");
        assert!(response.data.is_none());
    }
}
