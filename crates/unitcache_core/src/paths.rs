//! Lexical path helpers.

use std::path::{Component, Path, PathBuf};

/// Resolves `.` and `..` components without touching the file system.
///
/// Dependency paths are compared with `==`, so every path entering the cache
/// goes through here first. A `..` at the root stays at the root; a leading
/// `..` of a relative path is kept.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match result.components().next_back() {
                Some(Component::Normal(_)) => {
                    result.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => result.push(Component::ParentDir),
            },
            _ => result.push(component),
        }
    }
    result
}
