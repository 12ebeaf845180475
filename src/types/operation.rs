//! Reconciliation verdicts and the operations handed to the write collaborator.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};

use itertools::Itertools;
use serde::Serialize;

use super::entry::{AclEntry, EntryKey};
use super::state::CurrentState;

/// The change to make to one ACL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "entries", rename_all = "lowercase")]
pub enum AclChange {
    /// Add or overwrite these entries (`setfacl -m`)
    Modify(Vec<AclEntry>),
    /// Remove these entries whatever their permissions (`setfacl -x`)
    Remove(Vec<EntryKey>),
    /// Remove every extended entry (`setfacl -b`)
    Purge,
    /// Replace the whole ACL with these entries (`setfacl --set`)
    Replace(Vec<AclEntry>),
}

impl Display for AclChange {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            AclChange::Modify(entries) => write!(f, "modify [{}]", entries.iter().join(",")),
            AclChange::Remove(keys) => write!(f, "remove [{}]", keys.iter().join(",")),
            AclChange::Purge => write!(f, "purge"),
            AclChange::Replace(entries) => write!(f, "replace [{}]", entries.iter().join(",")),
        }
    }
}

/// Whether an operation targets the path only or the whole subtree via the
/// native tool's own recursion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Recursion {
    #[default]
    PathOnly,
    Native,
}

/// A resolved change for one path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ApplyOperation {
    path: PathBuf,
    change: AclChange,
    recursion: Recursion,
}

impl ApplyOperation {
    pub fn new(path: impl Into<PathBuf>, change: AclChange, recursion: Recursion) -> Self {
        ApplyOperation {
            path: path.into(),
            change,
            recursion,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn change(&self) -> &AclChange {
        &self.change
    }

    pub fn recursion(&self) -> Recursion {
        self.recursion
    }

    /// The entries `path` would carry after this operation, given `current`.
    ///
    /// This models the entry bookkeeping only. The native tool may also
    /// recalculate the mask entry, which is not reproduced here.
    pub fn preview(&self, current: &CurrentState) -> Vec<AclEntry> {
        match &self.change {
            AclChange::Modify(entries) => {
                let mut result = current.entries().to_vec();
                for entry in entries {
                    match result.iter_mut().find(|e| e.key() == entry.key()) {
                        Some(existing) => *existing = entry.clone(),
                        None => result.push(entry.clone()),
                    }
                }
                result
            }
            AclChange::Remove(keys) => current
                .entries()
                .iter()
                .filter(|e| !keys.contains(&e.key()))
                .cloned()
                .collect(),
            AclChange::Purge => current
                .entries()
                .iter()
                .filter(|e| e.is_base())
                .cloned()
                .collect(),
            AclChange::Replace(entries) => entries.iter().unique().cloned().collect(),
        }
    }
}

impl Display for ApplyOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} on {}", self.change, self.path.display())?;
        if self.recursion == Recursion::Native {
            write!(f, " (recursive)")?;
        }
        Ok(())
    }
}

/// Result of comparing desired and current state for one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Verdict {
    InSync,
    Apply(ApplyOperation),
}

impl Verdict {
    pub fn in_sync(&self) -> bool {
        matches!(self, Verdict::InSync)
    }

    pub fn operation(&self) -> Option<&ApplyOperation> {
        match self {
            Verdict::InSync => None,
            Verdict::Apply(op) => Some(op),
        }
    }

    pub fn into_operation(self) -> Option<ApplyOperation> {
        match self {
            Verdict::InSync => None,
            Verdict::Apply(op) => Some(op),
        }
    }
}

impl Display for Verdict {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Verdict::InSync => write!(f, "in sync"),
            Verdict::Apply(op) => write!(f, "{op}"),
        }
    }
}
