//! Canonical paths for rollcall.
//!
//! Single source of truth - import this instead of hardcoding paths.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rollcall::config::paths;
//!
//! let registry = paths::registry_file(None)?;
//! ```

use std::path::{Path, PathBuf};

use anyhow::Result;

/// Registry file, preferring an explicit override (the `--registry` flag)
pub fn registry_file(override_path: Option<&Path>) -> Result<PathBuf> {
    match override_path {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(crate::config::config()?.registry.clone()),
    }
}

/// Input file used when the operator asks for the default
pub fn default_input() -> Result<PathBuf> {
    Ok(crate::config::config()?.default_input.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_override_wins() {
        let path = registry_file(Some(Path::new("/tmp/custom.json"))).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/custom.json"));
    }
}
