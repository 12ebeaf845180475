//! String codec for ACL entries.

use crate::error::AclError;
use crate::types::AclEntry;

/// Parse one raw entry string into its canonical form.
///
/// Example:
/// ```rust
/// use posix_acl_core::{parse_entry, render_entry};
/// let entry = parse_entry("d:u:www-data:5").unwrap();
/// assert_eq!(render_entry(&entry), "default:user:www-data:r-x");
/// ```
pub fn parse_entry(raw: &str) -> Result<AclEntry, AclError> {
    raw.parse()
}

/// Render an entry in canonical form. Never fails.
pub fn render_entry(entry: &AclEntry) -> String {
    entry.to_string()
}

/// Parse a list of raw entries, failing on the first malformed one.
pub fn parse_entries<I, S>(raw: I) -> Result<Vec<AclEntry>, AclError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter().map(|s| parse_entry(s.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    #[parameterized(
        long = { "user:root:rwx" },
        short = { "u:root:7" },
        flags = { "U:root:111" },
        default_short = { "d:g:wheel:r" },
        default_long = { "default:mask::5" },
        owning = { "o::" },
        reordered = { "group:adm:xw" },
    )]
    fn test_render_is_fixed_point(raw: &str) {
        let once = parse_entry(raw).unwrap();
        let rendered = render_entry(&once);
        let twice = parse_entry(&rendered).unwrap();
        assert_eq!(once, twice);
        assert_eq!(render_entry(&twice), rendered);
    }

    #[test]
    fn test_parse_entries() {
        let entries = parse_entries(["u::7", "g::5", "o::0"]).unwrap();
        let rendered: Vec<String> = entries.iter().map(render_entry).collect();
        assert_eq!(rendered, vec!["user::rwx", "group::r-x", "other::---"]);
    }

    #[test]
    fn test_parse_entries_stops_at_malformed() {
        let err = parse_entries(["u::7", "wrong::rwx"]).unwrap_err();
        assert!(matches!(err, AclError::MalformedEntry(_)));
    }
}
