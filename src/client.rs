//! Google Drive API client for the permission audit.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::auth::TokenProvider;
use crate::error::{DriveError, Result};
use crate::models::{
    ApiErrorResponse, DriveListResponse, FileListResponse, FileMetadata, Permission,
    PermissionListResponse, PermissionSummary, RootMetadata, SharedDrive,
};
use crate::pagination::{collect_pages, EmptyPagePolicy, Page};

/// Base URL for Google Drive API v3.
pub const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Page size used for every listing call.
const PAGE_SIZE: &str = "100";

/// Fields requested when fetching a single permission.
const PERMISSION_FIELDS: &str = "id,type,role,permissionDetails,emailAddress,allowFileDiscovery";

/// Read-only view of the Drive API used by the audit.
#[async_trait]
pub trait DriveApi: Send + Sync {
    /// Email address of the owner of the personal drive root.
    async fn root_owner(&self) -> Result<Option<String>>;

    /// All shared drives visible to the caller.
    async fn list_shared_drives(&self) -> Result<Vec<SharedDrive>>;

    /// Immediate children of `parent_id`. `drive_id` scopes the query to a
    /// shared drive.
    async fn list_children(&self, parent_id: &str, drive_id: Option<&str>)
        -> Result<Vec<FileMetadata>>;

    /// Permission summaries of a file, folder or shared drive.
    async fn list_permissions(&self, file_id: &str) -> Result<Vec<PermissionSummary>>;

    /// Full permission record.
    async fn get_permission(&self, file_id: &str, permission_id: &str) -> Result<Permission>;
}

/// HTTP client for the Drive v3 REST API.
pub struct DriveClient {
    auth: Arc<dyn TokenProvider>,
    http: Client,
    base_url: String,
}

impl DriveClient {
    /// Create a new DriveClient talking to the public Drive API.
    pub fn new(auth: Arc<dyn TokenProvider>) -> Self {
        Self::with_base_url(auth, DRIVE_API_BASE)
    }

    /// Create a client against a different API root (used by tests).
    pub fn with_base_url(auth: Arc<dyn TokenProvider>, base_url: impl Into<String>) -> Self {
        Self {
            auth,
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Issue a GET request and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let token = self.auth.access_token().await?;

        let response = self
            .http
            .get(format!("{}/{}", self.base_url, path))
            .bearer_auth(&token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            if let Ok(api_error) = serde_json::from_str::<ApiErrorResponse>(&error_body) {
                return Err(DriveError::ApiError {
                    status: api_error.error.code,
                    message: api_error.error.message,
                });
            }
            return Err(DriveError::ApiError {
                status: status.as_u16(),
                message: error_body,
            });
        }

        Ok(response.json().await?)
    }

    async fn files_page(
        &self,
        query: &str,
        drive_id: Option<&str>,
        page_token: Option<String>,
    ) -> Result<Page<FileMetadata>> {
        let mut params: Vec<(&str, &str)> = vec![
            ("q", query),
            ("pageSize", PAGE_SIZE),
            ("fields", "nextPageToken, files(id, name, mimeType)"),
        ];
        if let Some(drive_id) = drive_id {
            params.extend([
                ("driveId", drive_id),
                ("corpora", "drive"),
                ("includeItemsFromAllDrives", "true"),
                ("supportsAllDrives", "true"),
                ("spaces", "drive"),
            ]);
        }
        if let Some(ref token) = page_token {
            params.push(("pageToken", token.as_str()));
        }

        let list: FileListResponse = self.get_json("files", &params).await?;
        Ok(Page::new(list.files, list.next_page_token))
    }

    async fn drives_page(&self, page_token: Option<String>) -> Result<Page<SharedDrive>> {
        let mut params: Vec<(&str, &str)> = vec![("pageSize", PAGE_SIZE)];
        if let Some(ref token) = page_token {
            params.push(("pageToken", token.as_str()));
        }

        let list: DriveListResponse = self.get_json("drives", &params).await?;
        Ok(Page::new(list.drives, list.next_page_token))
    }
}

#[async_trait]
impl DriveApi for DriveClient {
    async fn root_owner(&self) -> Result<Option<String>> {
        let root: RootMetadata = self
            .get_json("files/root", &[("fields", "owners(emailAddress)")])
            .await?;
        Ok(root.owner_email())
    }

    async fn list_shared_drives(&self) -> Result<Vec<SharedDrive>> {
        collect_pages(
            move |token| self.drives_page(token),
            EmptyPagePolicy::StopOnEmpty,
        )
        .await
    }

    async fn list_children(
        &self,
        parent_id: &str,
        drive_id: Option<&str>,
    ) -> Result<Vec<FileMetadata>> {
        debug!(parent_id, ?drive_id, "listing children");
        let query = format!("'{}' in parents and trashed = false", parent_id);
        let query = query.as_str();
        collect_pages(
            move |token| self.files_page(query, drive_id, token),
            EmptyPagePolicy::Continue,
        )
        .await
    }

    async fn list_permissions(&self, file_id: &str) -> Result<Vec<PermissionSummary>> {
        // A single page of 100 grants per item is assumed to be enough.
        let list: PermissionListResponse = self
            .get_json(
                &format!("files/{}/permissions", file_id),
                &[("supportsAllDrives", "true"), ("pageSize", PAGE_SIZE)],
            )
            .await?;
        if list.next_page_token.is_some() {
            debug!(file_id, "more than one page of permissions, only the first is audited");
        }
        Ok(list.permissions)
    }

    async fn get_permission(&self, file_id: &str, permission_id: &str) -> Result<Permission> {
        self.get_json(
            &format!("files/{}/permissions/{}", file_id, permission_id),
            &[("supportsAllDrives", "true"), ("fields", PERMISSION_FIELDS)],
        )
        .await
    }
}
