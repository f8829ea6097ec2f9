//! Effective permission resolution for a single file, folder or drive.
//!
//! A permission is kept when it grants something at this node rather
//! than only echoing a grant from an ancestor:
//! - shared drive items carry `permissionDetails`; the permission is
//!   dropped when every detail is marked inherited
//! - personal drive items carry no details; the personal drive owner's
//!   entry is dropped everywhere except on the root itself

use tracing::debug;

use crate::client::DriveApi;
use crate::error::{DriveError, Result};
use crate::models::Permission;

/// Pseudo identifier of the personal drive root.
pub const ROOT_ID: &str = "root";

/// Number of spaces per indentation level in the text report.
pub const INDENT_WIDTH: usize = 3;

/// Who a grant applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Principal {
    User(String),
    Group(String),
    Domain,
    Anyone,
    /// A principal type this tool does not know about yet.
    Unknown(String),
}

impl Principal {
    /// Classify a permission record by its principal type.
    pub fn from_permission(permission: &Permission) -> Result<Self> {
        let email = || {
            permission
                .email_address
                .clone()
                .ok_or_else(|| DriveError::MissingField {
                    field: "emailAddress",
                    permission_id: permission.id.clone(),
                })
        };

        Ok(match permission.permission_type.as_str() {
            "user" => Principal::User(email()?),
            "group" => Principal::Group(email()?),
            "domain" => Principal::Domain,
            "anyone" => Principal::Anyone,
            other => Principal::Unknown(other.to_string()),
        })
    }

    /// Drive API name of the principal type.
    pub fn type_name(&self) -> &str {
        match self {
            Principal::User(_) => "user",
            Principal::Group(_) => "group",
            Principal::Domain => "domain",
            Principal::Anyone => "anyone",
            Principal::Unknown(kind) => kind,
        }
    }

    pub fn email(&self) -> Option<&str> {
        match self {
            Principal::User(email) | Principal::Group(email) => Some(email),
            _ => None,
        }
    }

    /// Index key: the email address, or `_<type>` when there is none.
    pub fn key(&self) -> String {
        match self.email() {
            Some(email) => email.to_string(),
            None => format!("_{}", self.type_name()),
        }
    }
}

/// A permission that is effective at a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub path: String,
    pub principal: Principal,
    pub role: String,
    pub allow_discovery: bool,
}

impl Grant {
    /// One line of the text report, without indentation.
    pub fn display_line(&self) -> String {
        let discovery = if self.allow_discovery {
            " allow discovery"
        } else {
            ""
        };
        match &self.principal {
            Principal::User(email) => format!("User {} {}", email, self.role),
            Principal::Group(email) => format!("Group {} {}", email, self.role),
            Principal::Domain => format!("ADFCM {}{}", self.role, discovery),
            Principal::Anyone => format!("Anyone {}{}", self.role, discovery),
            Principal::Unknown(kind) => format!("TODO {} {}", kind, self.role),
        }
    }
}

/// Whether `permission` adds nothing at `file_id`.
pub fn is_suppressed(permission: &Permission, file_id: &str, root_owner: Option<&str>) -> bool {
    match &permission.permission_details {
        Some(details) => details.iter().all(|detail| detail.inherited),
        None => {
            file_id != ROOT_ID
                && root_owner.is_some()
                && permission.email_address.as_deref() == root_owner
        }
    }
}

/// Fetch every permission of `file_id` and return the effective grants,
/// in the order the API lists them.
pub async fn resolve_permissions<A>(
    api: &A,
    file_id: &str,
    path: &str,
    root_owner: Option<&str>,
) -> Result<Vec<Grant>>
where
    A: DriveApi + ?Sized,
{
    let summaries = api.list_permissions(file_id).await?;
    let mut grants = Vec::new();

    for summary in summaries {
        let permission = api.get_permission(file_id, &summary.id).await?;

        if permission.permission_type != summary.permission_type {
            return Err(DriveError::PermissionMismatch {
                permission_id: summary.id,
                expected: summary.permission_type,
                found: permission.permission_type,
            });
        }
        if permission.role != summary.role {
            return Err(DriveError::PermissionMismatch {
                permission_id: summary.id,
                expected: summary.role,
                found: permission.role,
            });
        }

        if is_suppressed(&permission, file_id, root_owner) {
            debug!(path, permission_id = %permission.id, "inherited permission skipped");
            continue;
        }

        let principal = Principal::from_permission(&permission)?;
        let allow_discovery = matches!(principal, Principal::Domain | Principal::Anyone)
            && permission.allow_file_discovery.unwrap_or(false);

        grants.push(Grant {
            path: path.to_string(),
            principal,
            role: permission.role,
            allow_discovery,
        });
    }

    Ok(grants)
}

/// Render grants as report lines, each prefixed with `indent` spaces.
pub fn render_lines(grants: &[Grant], indent: usize) -> String {
    let pad = " ".repeat(indent);
    grants
        .iter()
        .map(|grant| format!("{}{}", pad, grant.display_line()))
        .collect::<Vec<_>>()
        .join("\n")
}
