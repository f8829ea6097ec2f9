//! drive_perms - Audit who has access to what in a Google Drive account.
//!
//! This library provides functionality to:
//! - Walk the personal drive and every shared drive
//! - Keep only the permissions granted at each file or folder, dropping
//!   the ones merely inherited from an ancestor
//! - Export the grants as path and principal indexes (JSON) and as a
//!   spreadsheet
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use drive_perms::auth::{FileTokenStore, InstalledAppAuthenticator};
//! use drive_perms::{run_audit, write_outputs, AuditConfig, DriveClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cache = FileTokenStore::open("token.json");
//!     let auth = InstalledAppAuthenticator::from_file("credentials.json", cache).await?;
//!     let client = DriveClient::new(Arc::new(auth));
//!
//!     let config = AuditConfig::default();
//!     let (log, _summary) = run_audit(&client, &config, std::io::stdout()).await?;
//!     write_outputs(&log, &config)?;
//!
//!     Ok(())
//! }
//! ```

pub mod audit;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod models;
pub mod pagination;
pub mod resolver;
pub mod walker;

// Re-exports for convenience
pub use audit::AuditLog;
pub use auth::TokenProvider;
pub use client::{DriveApi, DriveClient};
pub use config::{AuditConfig, OutputFormat};
pub use error::{DriveError, Result};
pub use export::write_outputs;
pub use models::FileMetadata;
pub use resolver::{Grant, Principal};
pub use walker::{run_audit, WalkSummary, Walker};
