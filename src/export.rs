//! JSON and spreadsheet export of the audit results.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;
use tracing::info;

use crate::audit::{AuditLog, SheetRow, SHEET_HEADER};
use crate::config::AuditConfig;
use crate::error::Result;

/// Name of the worksheet in the spreadsheet export.
pub const SHEET_NAME: &str = "Permissions";

/// Write `value` as pretty-printed JSON.
pub fn write_json<T: Serialize + ?Sized, P: AsRef<Path>>(path: P, value: &T) -> Result<()> {
    let path = path.as_ref();
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, value)?;
    info!(path = %path.display(), "wrote JSON export");
    Ok(())
}

/// Write one row per grant below a bold, frozen header row.
pub fn write_spreadsheet<P: AsRef<Path>>(path: P, rows: &[SheetRow]) -> Result<()> {
    let path = path.as_ref();
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, title) in SHEET_HEADER.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *title, &header_format)?;
    }
    for (idx, row) in rows.iter().enumerate() {
        let row_num = idx as u32 + 1;
        for (col, cell) in row.cells().iter().enumerate() {
            worksheet.write_string(row_num, col as u16, *cell)?;
        }
    }

    worksheet.set_freeze_panes(1, 0)?;
    worksheet.autofit();

    workbook.save(path)?;
    info!(path = %path.display(), rows = rows.len(), "wrote spreadsheet export");
    Ok(())
}

/// Write the exports selected by `config`. Returns the files written.
pub fn write_outputs(log: &AuditLog, config: &AuditConfig) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    if config.format.writes_json() {
        let path = config.path_index_file();
        write_json(&path, &log.path_index())?;
        written.push(path);

        let path = config.principal_index_file();
        write_json(&path, &log.principal_index())?;
        written.push(path);
    }
    if config.format.writes_xlsx() {
        let path = config.spreadsheet_file();
        write_spreadsheet(&path, &log.sheet_rows())?;
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::PathEntry;
    use indexmap::IndexMap;
    use tempfile::tempdir;

    #[test]
    fn test_write_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("p2ur.json");

        let mut index: IndexMap<String, Vec<PathEntry>> = IndexMap::new();
        index.insert(
            "Reports/".to_string(),
            vec![PathEntry("user".into(), "reader".into(), Some("bob@x.com".into()))],
        );
        write_json(&path, &index).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["Reports/"][0][2], "bob@x.com");
    }

    #[test]
    fn test_write_spreadsheet() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("DrivePerms.xlsx");
        let rows = vec![SheetRow {
            path: "Finance".to_string(),
            principal_type: "group".to_string(),
            role: "organizer".to_string(),
            email: "fin-team@x.com".to_string(),
        }];

        write_spreadsheet(&path, &rows).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        // xlsx files are zip archives
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_write_outputs_json_only() {
        use crate::config::OutputFormat;
        use crate::resolver::{Grant, Principal};

        let dir = tempdir().unwrap();
        let mut config = AuditConfig::default().with_output_dir(dir.path());
        config.format = OutputFormat::Json;

        let mut log = AuditLog::new();
        log.record(Grant {
            path: "Reports/".to_string(),
            principal: Principal::Anyone,
            role: "reader".to_string(),
            allow_discovery: false,
        });

        let written = write_outputs(&log, &config).unwrap();
        assert_eq!(written, vec![config.path_index_file(), config.principal_index_file()]);
        assert!(!config.spreadsheet_file().exists());

        let content = std::fs::read_to_string(config.principal_index_file()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["_anyone"][0], serde_json::json!(["anyone", "reader", "Reports/"]));
    }

    #[test]
    fn test_write_json_to_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("u2pr.json");
        assert!(write_json(&path, &serde_json::json!({})).is_err());
    }
}
