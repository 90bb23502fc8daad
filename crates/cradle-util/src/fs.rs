use std::path::{Path, PathBuf};

/// Walk up from `start` looking for a file named `filename`.
/// Returns the path to the directory containing the file, or `None`.
pub fn find_ancestor_with(start: &Path, filename: &str) -> Option<PathBuf> {
    let mut current = start;
    loop {
        let candidate = current.join(filename);
        if candidate.is_file() {
            return Some(current.to_path_buf());
        }
        current = current.parent()?;
    }
}

/// Read a UTF-8 text file, mapping failures to [`CradleError::Descriptor`](crate::errors::CradleError::Descriptor).
pub fn read_descriptor(path: &Path) -> Result<String, crate::errors::CradleError> {
    std::fs::read_to_string(path).map_err(|e| crate::errors::CradleError::Descriptor {
        message: format!("Failed to read {}: {e}", path.display()),
    })
}
