//! # Trunk Config Record
//!
//! The receiver reads its trunking setup from a TSV file with a header row
//! and one data row:
//!
//! ```text
//! "Sysname"	"Control Channel List"	"Offset"	"NAC"	"Modulation"	"TGID Tags File"	"Whitelist"	"Blacklist"	"Center Frequency"
//! "County P25"	"851.0125,852.3375"	"0"	"0x125"	"cqpsk"	"county.tsv"	""	""	""
//! ```
//!
//! Only the first data row is interpreted. Anything after it is kept
//! verbatim and written back unchanged. The file is overwritten in place;
//! callers must not issue concurrent writes.

use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

use super::tsv::{parse_record, write_record};
use super::{CONTROL_CHANNEL_LIST, SYSNAME, TGID_TAGS_FILE};
use crate::error::{ControlError, Result};
use crate::protocol::TrunkSettings;

/// Header plus first data row of a trunk config file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrunkConfigRecord {
    columns: Vec<String>,
    values: Vec<String>,
    /// Terminator used after the header, reused for the data row
    line_ending: String,
    /// Whether the data row itself ended with a terminator
    row_terminated: bool,
    /// Uninterpreted remainder of the file
    trailing: String,
}

impl TrunkConfigRecord {
    /// Decode a trunk config from file contents
    ///
    /// `source` is only used in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::EmptyTrunkConfig`] when there is no data row
    /// and [`ControlError::Tsv`] when the header and data row disagree.
    pub fn parse(source: &Path, contents: &str) -> Result<Self> {
        if contents.is_empty() {
            return Err(ControlError::EmptyTrunkConfig(source.to_path_buf()));
        }

        let header = parse_record(contents)?;
        if header.rest.is_empty() || header.rest.starts_with(&['\r', '\n'][..]) {
            return Err(ControlError::EmptyTrunkConfig(source.to_path_buf()));
        }

        let row = parse_record(header.rest)?;
        if row.fields.len() != header.fields.len() {
            return Err(ControlError::Tsv(format!(
                "{}: data row has {} fields, header has {}",
                source.display(),
                row.fields.len(),
                header.fields.len()
            )));
        }

        Ok(Self {
            columns: header.fields,
            values: row.fields,
            line_ending: header.terminator.to_string(),
            row_terminated: !row.terminator.is_empty(),
            trailing: row.rest.to_string(),
        })
    }

    /// Read and decode a trunk config file
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::TrunkConfigNotFound`] if the file does not
    /// exist, in addition to the errors of [`TrunkConfigRecord::parse`].
    pub async fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => ControlError::TrunkConfigNotFound(path.to_path_buf()),
            _ => ControlError::Io(e),
        })?;
        Self::parse(path, &contents)
    }

    /// Encode back to file contents
    pub fn to_tsv(&self) -> String {
        let mut out = String::new();
        write_record(&self.columns, &mut out);
        out.push_str(&self.line_ending);
        write_record(&self.values, &mut out);
        if self.row_terminated {
            out.push_str(&self.line_ending);
        }
        out.push_str(&self.trailing);
        out
    }

    /// Overwrite `path` with this record
    pub async fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        tokio::fs::write(path, self.to_tsv()).await?;
        debug!("Wrote trunk config to {}", path.display());
        Ok(())
    }

    /// Apply updates to existing columns
    ///
    /// Keys that are not columns of this record are ignored; no columns are
    /// ever added. Returns how many updates were applied.
    pub fn update<I, K, V>(&mut self, updates: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut applied = 0;
        for (key, value) in updates {
            if let Some(idx) = self.column_index(key.as_ref()) {
                self.values[idx] = value.into();
                applied += 1;
            } else {
                debug!("Ignoring unknown trunk column {:?}", key.as_ref());
            }
        }
        applied
    }

    /// Value of a column, if the column exists
    pub fn get(&self, column: &str) -> Option<&str> {
        self.column_index(column).map(|idx| self.values[idx].as_str())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The three user-editable fields; missing columns read as empty
    pub fn settings(&self) -> TrunkSettings {
        let field = |column: &str| self.get(column).unwrap_or_default().to_string();
        TrunkSettings {
            sysname: field(SYSNAME),
            cclist: field(CONTROL_CHANNEL_LIST),
            tglist: field(TGID_TAGS_FILE),
        }
    }

    fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trunk::{COLUMNS, WHITELIST};
    use std::path::PathBuf;
    use tempfile::TempDir;
    use tokio_test::assert_ok;

    const TRUNK_TSV: &str = "\"Sysname\"\t\"Control Channel List\"\t\"Offset\"\t\"NAC\"\t\"Modulation\"\t\"TGID Tags File\"\t\"Whitelist\"\t\"Blacklist\"\t\"Center Frequency\"\r\n\
\"County P25\"\t\"851.0125,852.3375\"\t\"0\"\t\"0x125\"\t\"cqpsk\"\t\"county.tsv\"\t\"\"\t\"\"\t\"\"\r\n";

    fn write_fixture(contents: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trunk.tsv");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn test_read_fields() {
        let (_dir, path) = write_fixture(TRUNK_TSV);
        let record = TrunkConfigRecord::read(&path).await.unwrap();

        assert_eq!(record.columns(), COLUMNS);
        assert_eq!(record.get(SYSNAME), Some("County P25"));
        assert_eq!(record.get(CONTROL_CHANNEL_LIST), Some("851.0125,852.3375"));
        assert_eq!(record.get(WHITELIST), Some(""));
        assert_eq!(record.get("Nonexistent"), None);
    }

    #[tokio::test]
    async fn test_round_trip_is_byte_identical() {
        let (_dir, path) = write_fixture(TRUNK_TSV);
        let record = assert_ok!(TrunkConfigRecord::read(&path).await);
        assert_ok!(record.write(&path).await);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), TRUNK_TSV);
    }

    #[test]
    fn test_round_trip_preserves_lf_and_missing_final_newline() {
        let contents = "\"Sysname\"\t\"NAC\"\n\"A\"\t\"0x1\"";
        let record = TrunkConfigRecord::parse(Path::new("t.tsv"), contents).unwrap();
        assert_eq!(record.to_tsv(), contents);
    }

    #[test]
    fn test_extra_rows_preserved_verbatim() {
        let contents = "\"Sysname\"\t\"NAC\"\n\"A\"\t\"0x1\"\n\"B\"\t\"0x2\"\nunquoted\tjunk\n";
        let mut record = TrunkConfigRecord::parse(Path::new("t.tsv"), contents).unwrap();
        record.update([(SYSNAME, "X")]);
        assert_eq!(
            record.to_tsv(),
            "\"Sysname\"\t\"NAC\"\n\"X\"\t\"0x1\"\n\"B\"\t\"0x2\"\nunquoted\tjunk\n"
        );
    }

    #[tokio::test]
    async fn test_update_changes_only_named_field() {
        let (_dir, path) = write_fixture(TRUNK_TSV);
        let mut record = TrunkConfigRecord::read(&path).await.unwrap();
        let before = record.clone();

        assert_eq!(record.update([(SYSNAME, "X")]), 1);

        for column in COLUMNS {
            if column == SYSNAME {
                assert_eq!(record.get(column), Some("X"));
            } else {
                assert_eq!(record.get(column), before.get(column), "column {} changed", column);
            }
        }
    }

    #[test]
    fn test_update_ignores_unknown_keys() {
        let mut record = TrunkConfigRecord::parse(Path::new("t.tsv"), TRUNK_TSV).unwrap();
        let applied = record.update([("Talkgroup_List_Name", "x.tsv"), ("Bogus", "y")]);
        assert_eq!(applied, 0);
        assert_eq!(record.columns().len(), 9);
        assert_eq!(record.to_tsv(), TRUNK_TSV);
    }

    #[test]
    fn test_values_with_quotes_are_escaped_on_write() {
        let mut record = TrunkConfigRecord::parse(Path::new("t.tsv"), TRUNK_TSV).unwrap();
        record.update([(SYSNAME, "The \"Big\" One")]);
        let reparsed = TrunkConfigRecord::parse(Path::new("t.tsv"), &record.to_tsv()).unwrap();
        assert_eq!(reparsed.get(SYSNAME), Some("The \"Big\" One"));
    }

    #[test]
    fn test_settings() {
        let record = TrunkConfigRecord::parse(Path::new("t.tsv"), TRUNK_TSV).unwrap();
        let settings = record.settings();
        assert_eq!(settings.sysname, "County P25");
        assert_eq!(settings.cclist, "851.0125,852.3375");
        assert_eq!(settings.tglist, "county.tsv");
    }

    #[tokio::test]
    async fn test_missing_file_is_distinct_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trunk.tsv");
        match TrunkConfigRecord::read(&path).await {
            Err(ControlError::TrunkConfigNotFound(p)) => assert_eq!(p, path),
            other => panic!("Expected TrunkConfigNotFound, got: {:?}", other),
        }
    }

    #[test]
    fn test_header_only_is_empty() {
        for contents in ["", "\"Sysname\"\t\"NAC\"", "\"Sysname\"\t\"NAC\"\r\n", "\"Sysname\"\n\n"] {
            let result = TrunkConfigRecord::parse(Path::new("t.tsv"), contents);
            assert!(
                matches!(result, Err(ControlError::EmptyTrunkConfig(_))),
                "contents {:?} gave {:?}",
                contents,
                result
            );
        }
    }

    #[test]
    fn test_short_row_is_error() {
        let result = TrunkConfigRecord::parse(Path::new("t.tsv"), "\"Sysname\"\t\"NAC\"\n\"A\"\n");
        assert!(matches!(result, Err(ControlError::Tsv(_))));
    }
}
