//! Accumulated audit results.
//!
//! Every effective grant found during the walk is appended to an
//! [`AuditLog`]. The path index, the principal index and the spreadsheet
//! rows are all projections of that one list, so they always agree.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::Serialize;

use crate::resolver::{Grant, INDENT_WIDTH};

/// `(type, role, email)` as stored under a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathEntry(pub String, pub String, pub Option<String>);

/// `(type, role, path)` as stored under a principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrincipalEntry(pub String, pub String, pub String);

/// Path to the principals granted on it, in discovery order.
pub type PathPermissionIndex = IndexMap<String, Vec<PathEntry>>;

/// Principal key to the paths it is granted on, in discovery order.
pub type PrincipalPathIndex = IndexMap<String, Vec<PrincipalEntry>>;

/// Header of the spreadsheet export.
pub const SHEET_HEADER: [&str; 4] = ["Path", "Type", "Role", "Email"];

/// One spreadsheet row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    pub path: String,
    pub principal_type: String,
    pub role: String,
    /// Email address, or the synthetic `_<type>` key.
    pub email: String,
}

impl SheetRow {
    pub fn cells(&self) -> [&str; 4] {
        [&self.path, &self.principal_type, &self.role, &self.email]
    }
}

/// Append-only list of effective grants.
#[derive(Debug, Default, Clone)]
pub struct AuditLog {
    grants: Vec<Grant>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, grant: Grant) {
        self.grants.push(grant);
    }

    pub fn grants(&self) -> &[Grant] {
        &self.grants
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }

    pub fn path_index(&self) -> PathPermissionIndex {
        let mut index = PathPermissionIndex::new();
        for grant in &self.grants {
            index.entry(grant.path.clone()).or_default().push(PathEntry(
                grant.principal.type_name().to_string(),
                grant.role.clone(),
                grant.principal.email().map(str::to_string),
            ));
        }
        index
    }

    pub fn principal_index(&self) -> PrincipalPathIndex {
        let mut index = PrincipalPathIndex::new();
        for grant in &self.grants {
            index
                .entry(grant.principal.key())
                .or_default()
                .push(PrincipalEntry(
                    grant.principal.type_name().to_string(),
                    grant.role.clone(),
                    grant.path.clone(),
                ));
        }
        index
    }

    pub fn sheet_rows(&self) -> Vec<SheetRow> {
        self.grants
            .iter()
            .map(|grant| SheetRow {
                path: grant.path.clone(),
                principal_type: grant.principal.type_name().to_string(),
                role: grant.role.clone(),
                email: grant.principal.key(),
            })
            .collect()
    }

    /// Principal index sorted by key, one header line per principal and
    /// one indented line per grant.
    pub fn summary_lines(&self) -> Vec<String> {
        let sorted: BTreeMap<String, Vec<PrincipalEntry>> =
            self.principal_index().into_iter().collect();
        let pad = " ".repeat(INDENT_WIDTH);

        let mut lines = Vec::new();
        for (key, entries) in sorted {
            lines.push(key);
            for PrincipalEntry(kind, role, path) in entries {
                lines.push(format!("{}{} {} {}", pad, kind, role, path));
            }
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::Principal;

    fn grant(path: &str, principal: Principal, role: &str) -> Grant {
        Grant {
            path: path.to_string(),
            principal,
            role: role.to_string(),
            allow_discovery: false,
        }
    }

    fn sample_log() -> AuditLog {
        let mut log = AuditLog::new();
        log.record(grant("/", Principal::User("alice@x.com".into()), "owner"));
        log.record(grant("Reports/", Principal::User("bob@x.com".into()), "reader"));
        log.record(grant("Reports/", Principal::Anyone, "reader"));
        log.record(grant("Reports/a.txt", Principal::User("bob@x.com".into()), "writer"));
        log
    }

    #[test]
    fn test_path_index_preserves_order() {
        let index = sample_log().path_index();
        let keys: Vec<_> = index.keys().cloned().collect();
        assert_eq!(keys, vec!["/", "Reports/", "Reports/a.txt"]);
        assert_eq!(
            index["Reports/"],
            vec![
                PathEntry("user".into(), "reader".into(), Some("bob@x.com".into())),
                PathEntry("anyone".into(), "reader".into(), None),
            ]
        );
    }

    #[test]
    fn test_principal_index_uses_synthetic_keys() {
        let index = sample_log().principal_index();
        assert_eq!(index["bob@x.com"].len(), 2);
        assert_eq!(
            index["_anyone"],
            vec![PrincipalEntry("anyone".into(), "reader".into(), "Reports/".into())]
        );
    }

    #[test]
    fn test_indexes_agree() {
        let log = sample_log();
        let by_path = log.path_index();
        let by_principal = log.principal_index();

        let total_by_path: usize = by_path.values().map(Vec::len).sum();
        let total_by_principal: usize = by_principal.values().map(Vec::len).sum();
        assert_eq!(total_by_path, log.len());
        assert_eq!(total_by_principal, log.len());

        for (path, entries) in &by_path {
            for PathEntry(kind, role, email) in entries {
                let key = email.clone().unwrap_or_else(|| format!("_{}", kind));
                assert!(by_principal[&key]
                    .contains(&PrincipalEntry(kind.clone(), role.clone(), path.clone())));
            }
        }
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(sample_log().path_index()).unwrap();
        assert_eq!(json["Reports/"][1], serde_json::json!(["anyone", "reader", null]));

        let json = serde_json::to_value(sample_log().principal_index()).unwrap();
        assert_eq!(json["alice@x.com"][0], serde_json::json!(["user", "owner", "/"]));
    }

    #[test]
    fn test_sheet_rows() {
        let rows = sample_log().sheet_rows();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[2].cells(), ["Reports/", "anyone", "reader", "_anyone"]);
    }

    #[test]
    fn test_summary_sorted_by_key() {
        let lines = sample_log().summary_lines();
        assert_eq!(
            lines,
            vec![
                "_anyone",
                "   anyone reader Reports/",
                "alice@x.com",
                "   user owner /",
                "bob@x.com",
                "   user reader Reports/",
                "   user writer Reports/a.txt",
            ]
        );
    }

    #[test]
    fn test_empty_log() {
        let log = AuditLog::new();
        assert!(log.is_empty());
        assert!(log.path_index().is_empty());
        assert!(log.summary_lines().is_empty());
    }
}
