//! Utility functions for output naming and path manipulation

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Maximum number of suffixes tried when resolving name collisions
const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// Turn an arbitrary name into something safe to use as a file name
///
/// Runs of characters other than word characters, `-` and `.` become a single `_`,
/// leading and trailing `.`/`_` are stripped, and an empty result becomes `unnamed`.
///
/// # Examples
///
/// ```
/// use bip_extract::utils::safe_name;
///
/// assert_eq!(safe_name("Sales Report (2024)"), "Sales_Report_2024");
/// assert_eq!(safe_name("../etc"), "etc");
/// assert_eq!(safe_name("  "), "unnamed");
/// ```
#[must_use]
pub fn safe_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());

    for c in name.trim().chars() {
        if c.is_alphanumeric() || matches!(c, '_' | '-' | '.') {
            if c == '_' && out.ends_with('_') {
                continue;
            }
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }

    let trimmed = out.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        "unnamed".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Find `dir/<stem>.<ext>` that does not exist yet, trying `<stem>_1.<ext>`, `<stem>_2.<ext>`, ...
///
/// `ext` is given without the dot; an empty `ext` yields a bare name (used for directories).
pub fn unique_path(dir: &Path, stem: &str, ext: &str) -> Result<PathBuf> {
    let name_for = |suffix: Option<u32>| {
        let base = match suffix {
            Some(i) => format!("{stem}_{i}"),
            None => stem.to_string(),
        };
        if ext.is_empty() {
            base
        } else {
            format!("{base}.{ext}")
        }
    };

    let candidate = dir.join(name_for(None));
    if !candidate.exists() {
        return Ok(candidate);
    }

    for i in 1..=MAX_RENAME_ATTEMPTS {
        let candidate = dir.join(name_for(Some(i)));
        if !candidate.exists() {
            return Ok(candidate);
        }
    }

    Err(Error::Other(format!(
        "could not find a free name for {stem} in {} after {MAX_RENAME_ATTEMPTS} attempts",
        dir.display()
    )))
}

/// Path of `path` relative to `root`, `/`-separated, as stored in ZIP entries
pub fn zip_entry_name(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn safe_name_keeps_word_characters() {
        assert_eq!(safe_name("Sales_Model-v2.1"), "Sales_Model-v2.1");
        assert_eq!(safe_name("Müller Umsätze"), "Müller_Umsätze");
    }

    #[test]
    fn safe_name_collapses_runs_and_strips_edges() {
        assert_eq!(safe_name("a   b///c"), "a_b_c");
        assert_eq!(safe_name("a__b"), "a_b");
        assert_eq!(safe_name("__.hidden._"), "hidden");
        assert_eq!(safe_name("Q1 (draft)"), "Q1_draft");
    }

    #[test]
    fn safe_name_never_returns_empty() {
        assert_eq!(safe_name(""), "unnamed");
        assert_eq!(safe_name("///"), "unnamed");
        assert_eq!(safe_name(".."), "unnamed");
    }

    #[test]
    fn unique_path_returns_original_when_free() {
        let dir = tempdir().unwrap();
        let path = unique_path(dir.path(), "Sales", "sql").unwrap();
        assert_eq!(path, dir.path().join("Sales.sql"));
    }

    #[test]
    fn unique_path_appends_counter_on_collision() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("Sales.sql"), b"").unwrap();
        std::fs::write(dir.path().join("Sales_1.sql"), b"").unwrap();

        let path = unique_path(dir.path(), "Sales", "sql").unwrap();
        assert_eq!(path, dir.path().join("Sales_2.sql"));
    }

    #[test]
    fn unique_path_without_extension_is_bare() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("Model")).unwrap();

        let path = unique_path(dir.path(), "Model", "").unwrap();
        assert_eq!(path, dir.path().join("Model_1"));
    }

    #[test]
    fn zip_entry_name_uses_forward_slashes() {
        let root = Path::new("/work");
        let nested = root.join("templates").join("Invoice.rtf");
        assert_eq!(
            zip_entry_name(root, &nested).as_deref(),
            Some("templates/Invoice.rtf")
        );
        assert_eq!(zip_entry_name(root, root), None);
        assert_eq!(zip_entry_name(root, Path::new("/elsewhere/x")), None);
    }
}
