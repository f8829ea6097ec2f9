//! Data models for Google Drive API responses and credential files.

use serde::{Deserialize, Serialize};

/// MIME type Google Drive uses for folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Metadata for a file or folder in Google Drive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mime_type: Option<String>,
}

impl FileMetadata {
    pub fn new(id: impl Into<String>, name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            mime_type: Some(mime_type.into()),
        }
    }

    /// Convenience constructor for a folder entry.
    pub fn folder(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, FOLDER_MIME_TYPE)
    }

    pub fn is_folder(&self) -> bool {
        self.mime_type.as_deref() == Some(FOLDER_MIME_TYPE)
    }
}

/// Response from the files.list API endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileListResponse {
    #[serde(default)]
    pub files: Vec<FileMetadata>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Shared Drive metadata.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SharedDrive {
    pub id: String,
    pub name: String,
}

/// Response from the drives.list API endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveListResponse {
    #[serde(default)]
    pub drives: Vec<SharedDrive>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Permission entry as returned by permissions.list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PermissionSummary {
    pub id: String,
    #[serde(rename = "type")]
    pub permission_type: String,
    pub role: String,
}

/// Response from the permissions.list API endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionListResponse {
    #[serde(default)]
    pub permissions: Vec<PermissionSummary>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Full permission record as returned by permissions.get.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub id: String,
    #[serde(rename = "type")]
    pub permission_type: String,
    pub role: String,
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub allow_file_discovery: Option<bool>,
    /// Only populated for items that live in a shared drive.
    #[serde(default)]
    pub permission_details: Option<Vec<PermissionDetail>>,
}

/// One inheritance record of a shared drive permission.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionDetail {
    #[serde(default)]
    pub permission_type: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub inherited_from: Option<String>,
    #[serde(default)]
    pub inherited: bool,
}

/// Owner entry of a file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    #[serde(default)]
    pub email_address: Option<String>,
}

/// Metadata of the personal drive root (`files/root`).
#[derive(Debug, Deserialize)]
pub struct RootMetadata {
    #[serde(default)]
    pub owners: Vec<Owner>,
}

impl RootMetadata {
    /// Email of the first owner that has one, if any.
    pub fn owner_email(&self) -> Option<String> {
        self.owners.iter().find_map(|o| o.email_address.clone())
    }
}

/// Google API error response.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    pub code: u16,
    pub message: String,
}

/// Service account credentials from JSON file.
#[derive(Debug, Deserialize)]
pub struct ServiceAccountCredentials {
    pub client_email: String,
    pub private_key: String,
    pub token_uri: Option<String>,
}

/// OAuth2 token response of the JWT bearer grant.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_metadata_deserialize() {
        let json = r#"{
            "id": "abc123",
            "name": "Reports",
            "mimeType": "application/vnd.google-apps.folder"
        }"#;

        let metadata: FileMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(metadata.id, "abc123");
        assert_eq!(metadata.name, "Reports");
        assert!(metadata.is_folder());
    }

    #[test]
    fn test_file_without_mime_type_is_not_folder() {
        let metadata: FileMetadata =
            serde_json::from_str(r#"{"id": "x", "name": "notes.txt"}"#).unwrap();
        assert!(!metadata.is_folder());
    }

    #[test]
    fn test_permission_with_details() {
        let json = r#"{
            "id": "p1",
            "type": "group",
            "role": "organizer",
            "emailAddress": "fin-team@x.com",
            "permissionDetails": [
                {"permissionType": "member", "role": "organizer", "inheritedFrom": "drive1", "inherited": true}
            ]
        }"#;

        let perm: Permission = serde_json::from_str(json).unwrap();
        assert_eq!(perm.permission_type, "group");
        assert_eq!(perm.email_address.as_deref(), Some("fin-team@x.com"));
        let details = perm.permission_details.unwrap();
        assert_eq!(details.len(), 1);
        assert!(details[0].inherited);
        assert_eq!(details[0].inherited_from.as_deref(), Some("drive1"));
    }

    #[test]
    fn test_permission_detail_inherited_defaults_false() {
        let detail: PermissionDetail =
            serde_json::from_str(r#"{"permissionType": "file", "role": "reader"}"#).unwrap();
        assert!(!detail.inherited);
    }

    #[test]
    fn test_root_owner_email() {
        let root: RootMetadata = serde_json::from_str(
            r#"{"owners": [{"displayName": "Alice"}, {"emailAddress": "alice@x.com"}]}"#,
        )
        .unwrap();
        assert_eq!(root.owner_email().as_deref(), Some("alice@x.com"));

        let empty: RootMetadata = serde_json::from_str("{}").unwrap();
        assert!(empty.owner_email().is_none());
    }

    #[test]
    fn test_token_response_default_expiry() {
        let token: TokenResponse =
            serde_json::from_str(r#"{"access_token": "ya29.x"}"#).unwrap();
        assert_eq!(token.expires_in, 3600);
    }
}
