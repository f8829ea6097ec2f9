//! Run configuration shared by the library and the CLI.

use std::path::{Path, PathBuf};

use clap::ValueEnum;

/// Path to principals export.
pub const PATH_INDEX_FILE: &str = "p2ur.json";

/// Principal to paths export.
pub const PRINCIPAL_INDEX_FILE: &str = "u2pr.json";

/// Spreadsheet export.
pub const SPREADSHEET_FILE: &str = "DrivePerms.xlsx";

/// Which export files to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Both JSON indexes.
    Json,
    /// The spreadsheet only.
    Xlsx,
    /// JSON indexes and spreadsheet.
    #[default]
    All,
}

impl OutputFormat {
    pub fn writes_json(self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::All)
    }

    pub fn writes_xlsx(self) -> bool {
        matches!(self, OutputFormat::Xlsx | OutputFormat::All)
    }
}

/// What to walk and where to put the results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditConfig {
    pub output_dir: PathBuf,
    pub format: OutputFormat,
    pub include_my_drive: bool,
    pub include_shared_drives: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            format: OutputFormat::default(),
            include_my_drive: true,
            include_shared_drives: true,
        }
    }
}

impl AuditConfig {
    pub fn with_output_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.output_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn path_index_file(&self) -> PathBuf {
        self.output_dir.join(PATH_INDEX_FILE)
    }

    pub fn principal_index_file(&self) -> PathBuf {
        self.output_dir.join(PRINCIPAL_INDEX_FILE)
    }

    pub fn spreadsheet_file(&self) -> PathBuf {
        self.output_dir.join(SPREADSHEET_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_audits_everything() {
        let config = AuditConfig::default();
        assert!(config.include_my_drive);
        assert!(config.include_shared_drives);
        assert!(config.format.writes_json());
        assert!(config.format.writes_xlsx());
        assert_eq!(config.path_index_file(), PathBuf::from("./p2ur.json"));
    }

    #[test]
    fn test_output_paths_follow_dir() {
        let config = AuditConfig::default().with_output_dir("/tmp/audit");
        assert_eq!(config.principal_index_file(), PathBuf::from("/tmp/audit/u2pr.json"));
        assert_eq!(config.spreadsheet_file(), PathBuf::from("/tmp/audit/DrivePerms.xlsx"));
    }

    #[test]
    fn test_format_selection() {
        assert!(OutputFormat::Json.writes_json());
        assert!(!OutputFormat::Json.writes_xlsx());
        assert!(OutputFormat::Xlsx.writes_xlsx());
        assert!(!OutputFormat::Xlsx.writes_json());
    }
}
