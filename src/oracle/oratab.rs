//! Oratab registry parsing
//!
//! The oratab file maps each database identifier to its Oracle home and a
//! start-on-boot flag, one `SID:ORACLE_HOME:FLAG` entry per line.

use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::lines::strip_comments;
use crate::error::{Error, Result};

/// Default location of the registry file
pub const DEFAULT_ORATAB: &str = "/etc/oratab";

/// A single oratab entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OratabEntry {
    /// Database identifier (ORACLE_SID)
    pub sid: String,
    /// Installation directory (ORACLE_HOME)
    pub oracle_home: PathBuf,
    /// Start flag as written in the file (`Y`, `N`, `W`, ...)
    pub start_flag: String,
}

impl OratabEntry {
    /// Whether `dbstart` should start this database on boot.
    pub fn starts_on_boot(&self) -> bool {
        self.start_flag.eq_ignore_ascii_case("y")
    }
}

/// Snapshot of an oratab file, keyed by database identifier.
///
/// Duplicate identifiers keep the last entry in the file. Existing callers
/// may rely on this, so it is preserved rather than rejected.
#[derive(Debug, Clone, Default)]
pub struct Oratab {
    entries: IndexMap<String, OratabEntry>,
}

impl Oratab {
    /// Parse oratab text.
    pub fn parse(text: &str) -> Self {
        let mut entries = IndexMap::new();

        for line in strip_comments(text) {
            let fields: Vec<&str> = line.splitn(3, ':').collect();
            let [sid, home, flag] = fields.as_slice() else {
                warn!(line = %line, "Skipping oratab line without three fields");
                continue;
            };

            let (sid, home) = (sid.trim(), home.trim());
            if sid.is_empty() || home.is_empty() {
                warn!(line = %line, "Skipping oratab line with empty SID or home");
                continue;
            }

            entries.insert(
                sid.to_string(),
                OratabEntry {
                    sid: sid.to_string(),
                    oracle_home: PathBuf::from(home),
                    start_flag: flag.trim().to_string(),
                },
            );
        }

        Self { entries }
    }

    /// Read and parse the oratab file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Ok(Self::parse(&text))
    }

    /// Look up an entry by database identifier.
    pub fn get(&self, sid: &str) -> Option<&OratabEntry> {
        self.entries.get(sid)
    }

    /// Iterate over entries in file order.
    pub fn iter(&self) -> impl Iterator<Item = &OratabEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
