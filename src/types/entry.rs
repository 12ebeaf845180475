//! Canonical ACL entries.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AclError;

use super::permission::Permission;
use super::qualifier::{Qualifier, Scope};

/// One ACL line, e.g. `default:user:www-data:r-x`.
///
/// Entries can only be built through [`AclEntry::new`] or by parsing, so every
/// value renders to a canonical string that parses back to itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AclEntry {
    scope: Scope,
    qualifier: Qualifier,
    identity: Option<String>,
    permission: Permission,
}

impl AclEntry {
    /// Build an entry from its parts.
    ///
    /// An empty identity is the same as no identity. Only `user` and `group`
    /// entries may name a principal, and identities may not contain `:`, `,`,
    /// `#` or whitespace.
    pub fn new(
        scope: Scope,
        qualifier: Qualifier,
        identity: Option<&str>,
        permission: Permission,
    ) -> Result<Self, AclError> {
        let identity = identity.filter(|id| !id.is_empty());

        if let Some(id) = identity {
            if !qualifier.accepts_identity() {
                return Err(AclError::MalformedEntry(format!(
                    r#"{qualifier} entries cannot name a principal, got "{id}""#
                )));
            }
            // `:` separates fields, `,` separates entries on the setfacl
            // command line and `#` starts a comment in getfacl output.
            if id.contains([':', ',', '#']) || id.contains(char::is_whitespace) {
                return Err(AclError::MalformedEntry(format!(
                    r#"Identity may not contain ':', ',', '#' or whitespace, got "{id}""#
                )));
            }
        }

        Ok(AclEntry {
            scope,
            qualifier,
            identity: identity.map(str::to_string),
            permission,
        })
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn qualifier(&self) -> Qualifier {
        self.qualifier
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub fn permission(&self) -> Permission {
        self.permission
    }

    pub fn is_default(&self) -> bool {
        self.scope == Scope::Default
    }

    /// `user::`, `group::` or `other::` in the access scope: the entries that
    /// mirror the classic mode bits and survive a purge.
    pub fn is_base(&self) -> bool {
        self.is_unqualified_access() && self.qualifier != Qualifier::Mask
    }

    /// Access-scope entry without an identity, mask included. These cannot be
    /// removed individually.
    pub fn is_unqualified_access(&self) -> bool {
        self.scope == Scope::Access && self.identity.is_none()
    }

    /// The entry with its permission field stripped.
    pub fn key(&self) -> EntryKey {
        EntryKey {
            scope: self.scope,
            qualifier: self.qualifier,
            identity: self.identity.clone(),
        }
    }

    /// Same scope, qualifier and identity with a different permission.
    pub fn with_permission(&self, permission: Permission) -> Self {
        AclEntry {
            permission,
            ..self.clone()
        }
    }
}

impl Display for AclEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}{}", self.key(), self.permission)
    }
}

impl FromStr for AclEntry {
    type Err = AclError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let s = raw.trim();
        let mut fields: Vec<&str> = s.split(':').collect();

        if fields.len() < 3 {
            return Err(AclError::MalformedEntry(format!(
                "Too few fields in '{s}'. At least 3 required, got {}.",
                fields.len()
            )));
        }
        if fields.len() > 4 {
            return Err(AclError::MalformedEntry(format!(
                "Too many fields in '{s}'. At most 4 allowed, got {}.",
                fields.len()
            )));
        }

        let scope = if fields.len() == 4 {
            Scope::from_field(fields.remove(0))?
        } else {
            Scope::Access
        };

        let (qualifier, identity, permission) = (fields[0], fields[1], fields[2]);
        AclEntry::new(
            scope,
            Qualifier::from_field(qualifier)?,
            Some(identity),
            permission.parse()?,
        )
    }
}

impl TryFrom<String> for AclEntry {
    type Error = AclError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AclEntry> for String {
    fn from(entry: AclEntry) -> Self {
        entry.to_string()
    }
}

/// An entry without its permission, rendered `[default:]qualifier:identity:`.
///
/// Unset compares entries by key so that `user:blub:r-x` matches a live
/// `user:blub:rwx`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EntryKey {
    scope: Scope,
    qualifier: Qualifier,
    identity: Option<String>,
}

impl EntryKey {
    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn qualifier(&self) -> Qualifier {
        self.qualifier
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// The form `setfacl -x` expects, without the trailing colon.
    pub fn removal_spec(&self) -> String {
        let rendered = self.to_string();
        rendered.trim_end_matches(':').to_string()
    }
}

impl Display for EntryKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{}{}:{}:",
            self.scope.prefix(),
            self.qualifier,
            self.identity.as_deref().unwrap_or_default()
        )
    }
}
