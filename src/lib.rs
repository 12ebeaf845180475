// src/lib.rs
pub use codec::{parse_entries, parse_entry, render_entry};
pub use command::FaclCommand;
pub use engine::Reconciler;
pub use error::AclError;
pub use expand::{expand, strip_default_entries};
pub use loader::{load_declaration, load_declarations, load_file_intents};
pub use ordering::{
    DeclarationIndex, FileIntent, FileKind, Prerequisite, is_descendant, prerequisites,
};
pub use runner::{PassReport, PassRunner, TaskOutcome, TaskReport};
pub use traits::{AclReader, AclWriter};
pub use types::{
    AclChange, AclEntry, Action, ApplyOperation, CurrentState, Declaration, DesiredState,
    EntryKey, IgnoreMissing, Permission, PermissionList, Qualifier, RecurseMode,
    ReconciliationTask, Recursion, Scope, Verdict,
};

mod codec;
mod command;
mod engine;
mod error;
mod expand;
mod loader;
pub mod metrics;
mod ordering;
mod runner;
mod timers;
mod traits;
mod types;
