//! Data model types for ACL entries, declarations and reconciliation results.
//!
//! Canonical string forms:
//! - Entry: `[default:]<user|group|other|mask>:<identity>:<rwx>`, e.g.
//!   `user:www-data:r-x`, `default:mask::rwx`
//! - Entry key: the entry without its permission, e.g. `user:www-data:`
//!
//! Parsing accepts the `u`, `g`, `o`, `m` and `d` shortcuts, octal digits and
//! partial symbolic permissions; rendering always produces the long form.

mod declaration;
mod entry;
mod operation;
mod permission;
mod qualifier;
mod state;

pub use declaration::{Action, Declaration, DesiredState, IgnoreMissing, PermissionList, RecurseMode};
pub use entry::{AclEntry, EntryKey};
pub use operation::{AclChange, ApplyOperation, Recursion, Verdict};
pub use permission::Permission;
pub use qualifier::{Qualifier, Scope};
pub use state::{CurrentState, ReconciliationTask};
