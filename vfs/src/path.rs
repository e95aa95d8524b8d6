//! Location normalization.

use crate::VfsError;

/// Normalize a location.
///
/// Backslashes become forward slashes, empty and `.` segments are dropped and
/// leading or trailing slashes are stripped. A location containing `..`, or
/// one that is empty after normalization, is rejected.
pub fn normalize(path: &str) -> Result<String, VfsError> {
    let replaced = path.replace('\\', "/");
    let mut segments = Vec::new();

    for segment in replaced.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                return Err(VfsError::InvalidPath(format!(
                    "path traversal (..) not allowed in '{path}'"
                )));
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        return Err(VfsError::InvalidPath("empty path".into()));
    }

    Ok(segments.join("/"))
}

/// The trailing segment of a location: `"materials/wood.mat"` gives `"wood.mat"`.
pub fn file_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(pos) => &path[pos + 1..],
        None => path,
    }
}

/// Split a normalized path into its first segment and the remainder.
pub(crate) fn split_source(path: &str) -> (&str, &str) {
    path.split_once('/').unwrap_or((path, ""))
}
