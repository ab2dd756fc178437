//! # Site Catalog
//!
//! Each imported trunked system has a catalog `<systems_dir>/<system>.tsv`
//! listing its sites and their control channels. Catalogs are produced by the
//! import tooling; this module only reads them.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::tsv::parse_table;
use super::CONTROL_CHANNEL_LIST;
use crate::error::{ControlError, Result};

/// Site identifier column
pub const SITE: &str = "Site";

/// Sites of one trunked system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteCatalog {
    /// (site id, control channel list)
    sites: Vec<(String, String)>,
}

impl SiteCatalog {
    /// Catalog file for `system` under `systems_dir`
    pub fn path(systems_dir: &Path, system: &str) -> PathBuf {
        systems_dir.join(format!("{}.tsv", system))
    }

    /// Talkgroup whitelist file for `system` under `systems_dir`
    pub fn whitelist_path(systems_dir: &Path, system: &str) -> PathBuf {
        systems_dir.join(format!("{}_whitelist.tsv", system))
    }

    /// Load the catalog for `system`
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::Session`] if the system is unknown and
    /// [`ControlError::Tsv`] if the catalog lacks a required column.
    pub async fn load(systems_dir: &Path, system: &str) -> Result<Self> {
        validate_system_id(system)?;

        let path = Self::path(systems_dir, system);
        let contents = tokio::fs::read_to_string(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => ControlError::Session(format!("unknown system {}", system)),
            _ => ControlError::Io(e),
        })?;

        Self::parse(system, &contents)
    }

    pub fn parse(system: &str, contents: &str) -> Result<Self> {
        let mut rows = parse_table(contents)?.into_iter();
        let header = rows.next().unwrap_or_default();

        let column = |name: &str| {
            header.iter().position(|c| c == name).ok_or_else(|| {
                ControlError::Tsv(format!("site catalog for {} has no {:?} column", system, name))
            })
        };
        let site_idx = column(SITE)?;
        let cc_idx = column(CONTROL_CHANNEL_LIST)?;

        let sites = rows
            .filter_map(|row| {
                let site = row.get(site_idx)?.trim().to_string();
                let channels = row.get(cc_idx)?.trim().to_string();
                Some((site, channels))
            })
            .collect();

        Ok(Self { sites })
    }

    /// Control channel list of `site`
    pub fn control_channels(&self, site: &str) -> Option<&str> {
        let site = site.trim();
        self.sites
            .iter()
            .find(|(id, _)| id == site)
            .map(|(_, channels)| channels.as_str())
    }
}

/// System ids become file names, so they may not contain path separators
pub fn validate_system_id(system: &str) -> Result<()> {
    if system.is_empty() || system.contains(&['/', '\\', '.'][..]) {
        return Err(ControlError::Protocol(format!("invalid system id: {:?}", system)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio_test::assert_ok;

    const CATALOG: &str = "\"Site\"\t\"Name\"\t\"Control Channel List\"\n\
\"1\"\t\"North\"\t\"851.0125,851.5125\"\n\
\"12\"\t\"Harbor\"\t\"852.3375\"\n";

    #[test]
    fn test_parse_catalog() {
        let catalog = SiteCatalog::parse("3245", CATALOG).unwrap();
        assert_eq!(catalog.control_channels("12"), Some("852.3375"));
        assert_eq!(catalog.control_channels(" 1 "), Some("851.0125,851.5125"));
        assert_eq!(catalog.control_channels("99"), None);
    }

    #[test]
    fn test_catalog_missing_columns() {
        let result = SiteCatalog::parse("3245", "\"Site\"\t\"Name\"\n\"1\"\t\"North\"\n");
        assert!(matches!(result, Err(ControlError::Tsv(_))));
        assert!(SiteCatalog::parse("3245", "").is_err());
    }

    #[tokio::test]
    async fn test_load_from_systems_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("3245.tsv"), CATALOG).unwrap();

        let catalog = assert_ok!(SiteCatalog::load(dir.path(), "3245").await);
        assert_eq!(catalog.control_channels("1"), Some("851.0125,851.5125"));

        let missing = SiteCatalog::load(dir.path(), "9999").await;
        assert!(matches!(missing, Err(ControlError::Session(_))));
    }

    #[tokio::test]
    async fn test_load_rejects_path_traversal() {
        let dir = TempDir::new().unwrap();
        let result = SiteCatalog::load(dir.path(), "../etc/passwd").await;
        assert!(matches!(result, Err(ControlError::Protocol(_))));
        assert!(validate_system_id("").is_err());
        assert!(validate_system_id("3245").is_ok());
    }

    #[test]
    fn test_whitelist_path() {
        let path = SiteCatalog::whitelist_path(Path::new("systems"), "3245");
        assert_eq!(path, PathBuf::from("systems/3245_whitelist.tsv"));
    }
}
