//! Live ACL state as read from a target, and per-pass reconciliation tasks.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::declaration::DesiredState;
use super::entry::{AclEntry, EntryKey};

/// Raw lines that look like an unqualified `user::`, `group::` or `other::` entry.
static BASE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(u(ser)?|g(roup)?|o(ther)?)::").expect("base entry pattern is valid")
});

/// The ACL of one object as it is right now.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CurrentState {
    entries: Vec<AclEntry>,
    opaque: Vec<String>,
}

impl CurrentState {
    pub fn new(entries: Vec<AclEntry>) -> Self {
        CurrentState {
            entries,
            opaque: Vec::new(),
        }
    }

    /// Build from the native listing format.
    ///
    /// Blank lines and `#` comments (including trailing `#effective:` notes)
    /// are dropped. Lines that do not parse as entries are kept verbatim.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut state = CurrentState::default();
        for line in lines {
            let line = line.as_ref();
            let content = line.split('#').next().unwrap_or_default().trim();
            if content.is_empty() {
                continue;
            }
            match content.parse::<AclEntry>() {
                Ok(entry) => state.entries.push(entry),
                Err(_) => state.opaque.push(content.to_string()),
            }
        }
        state
    }

    pub fn entries(&self) -> &[AclEntry] {
        &self.entries
    }

    /// Lines that could not be parsed as entries.
    pub fn opaque(&self) -> &[String] {
        &self.opaque
    }

    pub fn entry_set(&self) -> BTreeSet<&AclEntry> {
        self.entries.iter().collect()
    }

    pub fn key_set(&self) -> BTreeSet<EntryKey> {
        self.entries.iter().map(AclEntry::key).collect()
    }

    /// Only `user::`, `group::` and `other::` remain: no named entries, no
    /// mask, no default entries, and no unparsed line that is anything else.
    pub fn is_minimal(&self) -> bool {
        self.entries.iter().all(AclEntry::is_base)
            && self.opaque.iter().all(|line| BASE_LINE.is_match(line))
    }
}

/// One desired state paired with the state read for the same path in this pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationTask {
    pub desired: DesiredState,
    pub current: CurrentState,
}

impl ReconciliationTask {
    pub fn new(desired: DesiredState, current: CurrentState) -> Self {
        ReconciliationTask { desired, current }
    }
}
