//! Entry scope and qualifier names.
//!
//! This module centralizes the keyword spellings used by the entry grammar so
//! that short forms (`u`, `g`, `o`, `m`, `d`) only ever appear here.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::error::AclError;

/// Whether an entry governs the object itself or is inherited by new children.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Access,
    Default,
}

impl Scope {
    /// The canonical prefix for this scope, `""` or `"default:"`.
    pub fn prefix(&self) -> &'static str {
        match self {
            Scope::Access => "",
            Scope::Default => "default:",
        }
    }

    /// Parse the leading field of a four-field entry. Only `d` and `default`
    /// are accepted; there is no spelled-out form of the access scope.
    pub(crate) fn from_field(field: &str) -> Result<Self, AclError> {
        if field.eq_ignore_ascii_case("d") || field.eq_ignore_ascii_case("default") {
            Ok(Scope::Default)
        } else {
            Err(AclError::MalformedEntry(format!(
                r#"First field of 4 must be "d" or "default", got "{field}""#
            )))
        }
    }
}

/// The category of principal an entry governs.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum Qualifier {
    /// The owning user, or a named user when an identity is present
    #[strum(to_string = "user", serialize = "u")]
    User,
    /// The owning group, or a named group when an identity is present
    #[strum(to_string = "group", serialize = "g")]
    Group,
    /// Everyone else
    #[strum(to_string = "other", serialize = "o")]
    Other,
    /// Upper bound on named user, named group and owning group permissions
    #[strum(to_string = "mask", serialize = "m")]
    Mask,
}

impl Qualifier {
    /// Whether entries of this qualifier may name a specific principal.
    pub fn accepts_identity(&self) -> bool {
        matches!(self, Qualifier::User | Qualifier::Group)
    }

    pub(crate) fn from_field(field: &str) -> Result<Self, AclError> {
        field.parse().map_err(|_| {
            AclError::MalformedEntry(format!(
                r#"Unknown type "{field}", expected "user", "group", "other" or "mask""#
            ))
        })
    }
}
