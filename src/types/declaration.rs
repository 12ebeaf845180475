//! Desired-state declarations and their serde input surface.

use std::path::{Path, PathBuf};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::error::AclError;

use super::entry::AclEntry;

/// What to do with the declared entries.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    ToSchema,
    AsRefStr,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Action {
    /// Add or overwrite the declared entries, leave everything else alone
    #[default]
    Set,
    /// Remove the declared entries, whatever their permission bits
    Unset,
    /// Make the ACL consist of exactly the declared entries
    Exact,
    /// Remove every extended entry, leaving only `user::`, `group::` and `other::`
    Purge,
}

/// How a recursive declaration reaches the objects below its path.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    ToSchema,
    AsRefStr,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum RecurseMode {
    /// One native recursive call (`setfacl -R`) on the path
    #[default]
    Lazy,
    /// One task per file and directory below the path
    Deep,
}

/// What a missing target means for a task.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    ToSchema,
    AsRefStr,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum IgnoreMissing {
    /// A missing target fails the task
    #[default]
    False,
    /// A missing target is not a finding
    Quiet,
    /// A missing target is reported as a warning
    Notify,
}

/// One or more raw entry strings; a single string is accepted as a list of one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum PermissionList {
    One(String),
    Many(Vec<String>),
}

impl PermissionList {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            PermissionList::One(s) => vec![s],
            PermissionList::Many(v) => v,
        }
    }
}

/// A declaration as received from the orchestration layer, before validation.
///
/// ```json
/// {
///   "path": "/var/www/html",
///   "action": "exact",
///   "permission": ["user::rwx", "group::r-x", "mask::rwx", "other::r--"],
///   "recursive": true,
///   "recursemode": "deep",
///   "ignore_missing": "notify"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct Declaration {
    pub path: String,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub permission: Option<PermissionList>,
    #[serde(default)]
    pub recursive: bool,
    #[serde(default, alias = "recurse_mode")]
    pub recursemode: Option<String>,
    #[serde(default)]
    pub ignore_missing: Option<String>,
}

fn parse_keyword<T: std::str::FromStr>(field: &str, value: Option<&str>) -> Result<T, AclError>
where
    T: Default,
{
    match value {
        None => Ok(T::default()),
        Some(v) => v.parse().map_err(|_| {
            AclError::InvalidDeclaration(format!(r#"invalid value "{v}" for {field}"#))
        }),
    }
}

impl TryFrom<Declaration> for DesiredState {
    type Error = AclError;

    fn try_from(decl: Declaration) -> Result<Self, Self::Error> {
        let action: Action = parse_keyword("action", decl.action.as_deref())?;
        let recurse_mode: RecurseMode = parse_keyword("recursemode", decl.recursemode.as_deref())?;
        let ignore_missing: IgnoreMissing =
            parse_keyword("ignore_missing", decl.ignore_missing.as_deref())?;

        let raw = decl
            .permission
            .map(PermissionList::into_vec)
            .unwrap_or_default();
        let entries = raw
            .iter()
            .map(|s| s.parse::<AclEntry>())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DesiredState::new(decl.path, entries)?
            .with_action(action)
            .with_recursion(decl.recursive, recurse_mode)
            .with_ignore_missing(ignore_missing))
    }
}

/// A validated, immutable desired state for one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DesiredState {
    path: PathBuf,
    action: Action,
    entries: Vec<AclEntry>,
    recursive: bool,
    recurse_mode: RecurseMode,
    ignore_missing: IgnoreMissing,
}

impl DesiredState {
    /// Create a `Set` declaration for `path`. The path must be absolute and at
    /// least one entry is required.
    pub fn new(path: impl Into<PathBuf>, entries: Vec<AclEntry>) -> Result<Self, AclError> {
        let path = path.into();
        if !path.is_absolute() {
            return Err(AclError::PathNotAbsolute(path.display().to_string()));
        }
        if entries.is_empty() {
            return Err(AclError::InvalidDeclaration(format!(
                "permission is a required property ({})",
                path.display()
            )));
        }

        Ok(DesiredState {
            path,
            action: Action::default(),
            entries,
            recursive: false,
            recurse_mode: RecurseMode::default(),
            ignore_missing: IgnoreMissing::default(),
        })
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    pub fn with_recursion(mut self, recursive: bool, mode: RecurseMode) -> Self {
        self.recursive = recursive;
        self.recurse_mode = mode;
        self
    }

    pub fn with_ignore_missing(mut self, ignore_missing: IgnoreMissing) -> Self {
        self.ignore_missing = ignore_missing;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn action(&self) -> Action {
        self.action
    }

    /// The entries as declared, duplicates included.
    pub fn entries(&self) -> &[AclEntry] {
        &self.entries
    }

    /// The entries with exact duplicates removed, first occurrence kept.
    pub fn unique_entries(&self) -> Vec<AclEntry> {
        self.entries.iter().unique().cloned().collect()
    }

    pub fn recursive(&self) -> bool {
        self.recursive
    }

    pub fn recurse_mode(&self) -> RecurseMode {
        self.recurse_mode
    }

    pub fn ignore_missing(&self) -> IgnoreMissing {
        self.ignore_missing
    }

    /// Recursive and delegated to the write collaborator's own recursion.
    pub fn is_lazy_recursive(&self) -> bool {
        self.recursive && self.recurse_mode == RecurseMode::Lazy
    }

    /// Recursive and expanded into one task per descendant.
    pub fn is_deep_recursive(&self) -> bool {
        self.recursive && self.recurse_mode == RecurseMode::Deep
    }

    /// A leaf declaration for a descendant of this one.
    pub(crate) fn child(&self, path: PathBuf, entries: Vec<AclEntry>) -> DesiredState {
        DesiredState {
            path,
            action: self.action,
            entries,
            recursive: false,
            recurse_mode: RecurseMode::default(),
            ignore_missing: self.ignore_missing,
        }
    }
}
