//! Error types for the drive_perms crate.

use thiserror::Error;

/// Errors that can occur while auditing Google Drive permissions.
#[derive(Error, Debug)]
pub enum DriveError {
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    CredentialsParseError(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("JWT encoding error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Token refresh failed: {0}")]
    TokenRefreshError(String),

    #[error("OAuth2 flow failed: {0}")]
    OAuthError(#[from] yup_oauth2::Error),

    #[error("Permission {permission_id} is missing field `{field}`")]
    MissingField {
        field: &'static str,
        permission_id: String,
    },

    #[error("Permission {permission_id} changed between listing and fetch: expected {expected}, found {found}")]
    PermissionMismatch {
        permission_id: String,
        expected: String,
        found: String,
    },

    #[error("Spreadsheet error: {0}")]
    SpreadsheetError(#[from] rust_xlsxwriter::XlsxError),
}

/// Result type alias for DriveError.
pub type Result<T> = std::result::Result<T, DriveError>;
