//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Self-registration request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Desired login name.
    #[validate(length(min = 3, max = 64, message = "Username must be 3 to 64 characters"))]
    pub username: String,
    /// Plain-text password.
    #[validate(length(min = 6, max = 100, message = "Password must be 6 to 100 characters"))]
    pub password: String,
}

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Username.
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Create user request (admin).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUserRequest {
    /// Username.
    #[validate(length(min = 3, max = 64, message = "Username must be 3 to 64 characters"))]
    pub username: String,
    /// Password.
    #[validate(length(min = 6, max = 100, message = "Password must be 6 to 100 characters"))]
    pub password: String,
    /// Role names. Defaults to `["USER"]`.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Account status. Defaults to `ACTIVE`.
    #[serde(default)]
    pub status: Option<String>,
}

/// Replace a user's roles.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateRolesRequest {
    /// New role set.
    pub roles: Vec<String>,
}

/// Change a user's status.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateStatusRequest {
    /// `ACTIVE` or `DISABLED`. Blank keeps the current status.
    #[serde(default)]
    pub status: Option<String>,
}

/// Rename a file.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RenameFileRequest {
    /// New display name.
    #[validate(length(min = 1, max = 255, message = "Name must be 1 to 255 characters"))]
    pub name: String,
}

/// Filters of `GET /files/paged`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileFilterParams {
    /// `ACTIVE` or `ARCHIVED`.
    pub status: Option<String>,
}

/// Filters of `GET /events/paged`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFilterParams {
    /// Acting user.
    pub user_id: Option<uuid::Uuid>,
    /// `CREATED`, `UPDATED` or `DELETED`.
    pub status: Option<String>,
}

/// Query string of a signed local download link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedDownloadParams {
    /// Unix expiry time.
    pub expires: i64,
    /// URL-safe base64 signature.
    pub signature: String,
}
