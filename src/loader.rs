use crate::error::AclError;
use crate::ordering::FileIntent;
use crate::types::{Declaration, DesiredState};

/// Parse a JSON array of declarations into validated desired states.
///
/// The first invalid declaration aborts the load. Its error is returned with
/// its position in the array.
///
/// Example:
/// ```rust
/// use posix_acl_core::load_declarations;
/// let json = r#"[
///     { "path": "/srv/www", "permission": ["user:www:rwx", "d:user:www:r-x"], "recursive": true },
///     { "path": "/srv/www/tmp", "action": "purge", "permission": "user::rwx" }
/// ]"#;
/// let declarations = load_declarations(json).unwrap();
/// assert_eq!(declarations.len(), 2);
/// ```
pub fn load_declarations(json: &str) -> Result<Vec<DesiredState>, AclError> {
    let raw: Vec<Declaration> = serde_json::from_str(json)?;
    raw.into_iter()
        .enumerate()
        .map(|(i, decl)| DesiredState::try_from(decl).map_err(|e| at_position(i, e)))
        .collect()
}

/// Parse a single JSON declaration object.
pub fn load_declaration(json: &str) -> Result<DesiredState, AclError> {
    let raw: Declaration = serde_json::from_str(json)?;
    DesiredState::try_from(raw)
}

/// Parse a JSON array of file-creation intents.
pub fn load_file_intents(json: &str) -> Result<Vec<FileIntent>, AclError> {
    Ok(serde_json::from_str(json)?)
}

fn at_position(index: usize, err: AclError) -> AclError {
    match err {
        AclError::MalformedEntry(msg) => {
            AclError::MalformedEntry(format!("declaration {index}: {msg}"))
        }
        AclError::InvalidDeclaration(msg) => {
            AclError::InvalidDeclaration(format!("declaration {index}: {msg}"))
        }
        AclError::PathNotAbsolute(msg) => {
            AclError::PathNotAbsolute(format!("declaration {index}: {msg}"))
        }
        other => other,
    }
}
