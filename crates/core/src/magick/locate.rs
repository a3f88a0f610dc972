//! Executable lookup on `PATH`.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use super::traits::ExecutableLocator;

/// Resolves executables the way a shell would.
///
/// A path with more than one component is checked as given. A bare name is
/// searched for in each directory of the search path, in order.
#[derive(Debug, Clone)]
pub struct PathLocator {
    search_path: Option<OsString>,
}

impl PathLocator {
    /// Uses the process `PATH`.
    pub fn new() -> Self {
        Self {
            search_path: env::var_os("PATH"),
        }
    }

    /// Uses an explicit search path in `PATH` syntax.
    pub fn with_search_path(search_path: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(search_path.into()),
        }
    }
}

impl Default for PathLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutableLocator for PathLocator {
    fn locate(&self, program: &Path) -> Option<PathBuf> {
        if program.as_os_str().is_empty() {
            return None;
        }

        if program.components().count() > 1 {
            return is_executable(program).then(|| program.to_path_buf());
        }

        let search_path = self.search_path.as_ref()?;
        env::split_paths(search_path)
            .map(|dir| dir.join(program))
            .find(|candidate| is_executable(candidate))
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| m.is_file())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[cfg(unix)]
    fn make_executable(dir: &Path, name: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        std::fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn test_bare_name_searched_in_order() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        make_executable(second.path(), "convert");
        let expected = make_executable(first.path(), "convert");

        let search = env::join_paths([first.path(), second.path()]).unwrap();
        let locator = PathLocator::with_search_path(search);

        assert_eq!(locator.locate(Path::new("convert")), Some(expected));
    }

    #[cfg(unix)]
    #[test]
    fn test_explicit_path() {
        let dir = TempDir::new().unwrap();
        let binary = make_executable(dir.path(), "magick");
        let locator = PathLocator::with_search_path("");

        assert_eq!(locator.locate(&binary), Some(binary.clone()));
        assert!(locator.locate(&dir.path().join("missing")).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_executable_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("convert"), "not a binary").unwrap();

        let locator = PathLocator::with_search_path(dir.path().as_os_str());
        assert!(locator.locate(Path::new("convert")).is_none());
    }

    #[test]
    fn test_missing_binary() {
        let dir = TempDir::new().unwrap();
        let locator = PathLocator::with_search_path(dir.path().as_os_str());
        assert!(locator.locate(Path::new("definitely-not-installed")).is_none());
        assert!(locator.locate(Path::new("")).is_none());
    }
}
