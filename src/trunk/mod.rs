//! # Trunk Config Module
//!
//! File-backed receiver configuration.
//!
//! This module handles:
//! - Reading and writing the single-row `trunk.tsv` record consumed by the receiver
//! - Partial updates of known columns
//! - Per-system site catalogs used for site switching

pub mod tsv;
pub mod record;
pub mod sites;

pub use record::TrunkConfigRecord;
pub use sites::{validate_system_id, SiteCatalog};

/// Column names of the trunk config record, in receiver order
pub const SYSNAME: &str = "Sysname";
pub const CONTROL_CHANNEL_LIST: &str = "Control Channel List";
pub const OFFSET: &str = "Offset";
pub const NAC: &str = "NAC";
pub const MODULATION: &str = "Modulation";
pub const TGID_TAGS_FILE: &str = "TGID Tags File";
pub const WHITELIST: &str = "Whitelist";
pub const BLACKLIST: &str = "Blacklist";
pub const CENTER_FREQUENCY: &str = "Center Frequency";

pub const COLUMNS: [&str; 9] = [
    SYSNAME,
    CONTROL_CHANNEL_LIST,
    OFFSET,
    NAC,
    MODULATION,
    TGID_TAGS_FILE,
    WHITELIST,
    BLACKLIST,
    CENTER_FREQUENCY,
];
