//! Cache configuration.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::file_container::FileContainer;
use crate::paths::normalize_path;
use crate::project_part::ProjectPart;

/// Configuration describing project parts and the documents to track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Compile configurations.
    #[serde(default)]
    pub project_parts: Vec<ProjectPartConfig>,

    /// Documents to track.
    #[serde(default)]
    pub documents: Vec<DocumentConfig>,

    /// Whether documents require their file to exist when created.
    #[serde(default = "default_check_file_exists")]
    pub check_file_exists: bool,

    /// Base directory for resolving relative document paths.
    /// This is usually the directory containing the configuration file.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

const INCLUDE_FLAGS: [&str; 2] = ["-I", "-isystem"];

fn default_check_file_exists() -> bool {
    true
}

/// A project part entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectPartConfig {
    /// Project part id.
    pub id: String,
    /// Compile arguments.
    #[serde(default)]
    pub arguments: Vec<String>,
}

/// A document entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentConfig {
    /// File path, absolute or relative to the config file.
    pub path: PathBuf,
    /// Project part id.
    pub project_part: String,
    /// Extra per-file arguments.
    #[serde(default)]
    pub arguments: Vec<String>,
}

impl CacheConfig {
    /// File names searched by [`discover`](Self::discover), in order.
    pub const CONFIG_FILES: &'static [&'static str] = &["unitcache.json", ".unitcache.json"];

    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self {
            project_parts: Vec::new(),
            documents: Vec::new(),
            check_file_exists: default_check_file_exists(),
            base_dir: None,
        }
    }

    /// Loads and validates a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Self::from_json(&content)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Parses and validates a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Finds a configuration file in `start` or any of its ancestors.
    pub fn discover(start: impl AsRef<Path>) -> Option<PathBuf> {
        start.as_ref().ancestors().find_map(|dir| {
            Self::CONFIG_FILES
                .iter()
                .map(|name| dir.join(name))
                .find(|candidate| candidate.is_file())
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut ids = HashSet::new();
        for part in &self.project_parts {
            if !ids.insert(part.id.as_str()) {
                return Err(ConfigError::invalid(format!(
                    "duplicate project part '{}'",
                    part.id
                )));
            }
        }

        for document in &self.documents {
            if !ids.contains(document.project_part.as_str()) {
                return Err(ConfigError::invalid(format!(
                    "document '{}' refers to unknown project part '{}'",
                    document.path.display(),
                    document.project_part
                )));
            }
        }

        Ok(())
    }

    /// Builds the configured project parts.
    ///
    /// Relative include directories (`-I`, `-isystem`) are resolved against
    /// the base directory, like document paths.
    pub fn project_parts(&self) -> Vec<ProjectPart> {
        self.project_parts
            .iter()
            .map(|part| {
                ProjectPart::new(part.id.clone(), self.resolve_arguments(&part.arguments))
            })
            .collect()
    }

    fn resolve_arguments(&self, arguments: &[String]) -> Vec<String> {
        let mut resolved = Vec::with_capacity(arguments.len());
        let mut iter = arguments.iter();

        while let Some(argument) = iter.next() {
            if let Some(flag) = INCLUDE_FLAGS.iter().find(|flag| argument.as_str() == **flag) {
                resolved.push(flag.to_string());
                if let Some(dir) = iter.next() {
                    resolved.push(self.resolve(Path::new(dir)).display().to_string());
                }
                continue;
            }

            let joined = INCLUDE_FLAGS.iter().find_map(|flag| {
                argument
                    .strip_prefix(flag)
                    .filter(|dir| !dir.is_empty())
                    .map(|dir| format!("{}{}", flag, self.resolve(Path::new(dir)).display()))
            });
            resolved.push(joined.unwrap_or_else(|| argument.clone()));
        }

        resolved
    }

    /// Builds containers for the configured documents, resolving paths
    /// against the base directory.
    pub fn file_containers(&self) -> Vec<FileContainer> {
        self.documents
            .iter()
            .map(|document| {
                FileContainer::new(self.resolve(&document.path), document.project_part.clone())
                    .with_file_arguments(document.arguments.clone())
            })
            .collect()
    }

    /// Resolves a path against the base directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => normalize_path(&base.join(path)),
            _ => normalize_path(path),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const CONFIG: &str = r#"{
        "project_parts": [
            { "id": "app", "arguments": ["-Iinclude", "-DAPP"] }
        ],
        "documents": [
            { "path": "src/main.cpp", "project_part": "app" },
            { "path": "/abs/other.cpp", "project_part": "app", "arguments": ["-O2"] }
        ]
    }"#;

    #[test]
    fn test_from_json_defaults() {
        let config = CacheConfig::from_json("{}").unwrap();
        assert!(config.project_parts.is_empty());
        assert!(config.documents.is_empty());
        assert!(config.check_file_exists);
    }

    #[test]
    fn test_from_file_resolves_relative_paths() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("unitcache.json");
        fs::write(&path, CONFIG).unwrap();

        let config = CacheConfig::from_file(&path).unwrap();
        let containers = config.file_containers();

        assert_eq!(containers.len(), 2);
        assert_eq!(containers[0].file_path, dir.path().join("src/main.cpp"));
        assert_eq!(containers[0].project_part_id, "app");
        assert_eq!(containers[1].file_path, PathBuf::from("/abs/other.cpp"));
        assert_eq!(containers[1].file_arguments, vec!["-O2".to_string()]);

        let parts = config.project_parts();
        assert_eq!(parts.len(), 1);
        assert_eq!(
            parts[0].arguments(),
            &[
                format!("-I{}", dir.path().join("include").display()),
                "-DAPP".to_string()
            ][..]
        );
    }

    #[test]
    fn test_parent_dir_components_are_resolved() {
        let mut config = CacheConfig::from_json(
            r#"{
                "project_parts": [ { "id": "app", "arguments": ["-I../shared/include"] } ],
                "documents": [ { "path": "./src/../main.cpp", "project_part": "app" } ]
            }"#,
        )
        .unwrap();
        config.base_dir = Some(PathBuf::from("/project/app"));

        assert_eq!(
            config.file_containers()[0].file_path,
            PathBuf::from("/project/app/main.cpp")
        );
        assert_eq!(
            config.project_parts()[0].arguments(),
            &["-I/project/shared/include".to_string()][..]
        );
    }

    #[test]
    fn test_include_arguments_without_base_dir_are_kept() {
        let config = CacheConfig::from_json(
            r#"{ "project_parts": [ { "id": "app", "arguments": ["-I", "inc", "-isystem/usr/include", "-DX"] } ] }"#,
        )
        .unwrap();

        assert_eq!(
            config.project_parts()[0].arguments(),
            &["-I", "inc", "-isystem/usr/include", "-DX"].map(String::from)[..]
        );
    }

    #[test]
    fn test_separate_include_argument_is_resolved() {
        let mut config = CacheConfig::from_json(
            r#"{ "project_parts": [ { "id": "app", "arguments": ["-isystem", "sys", "-I/abs"] } ] }"#,
        )
        .unwrap();
        config.base_dir = Some(PathBuf::from("/project"));

        assert_eq!(
            config.project_parts()[0].arguments(),
            &[
                "-isystem".to_string(),
                "/project/sys".to_string(),
                "-I/abs".to_string()
            ][..]
        );
    }

    #[test]
    fn test_duplicate_project_part_is_invalid() {
        let err = CacheConfig::from_json(
            r#"{ "project_parts": [ { "id": "app" }, { "id": "app" } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_unknown_project_part_is_invalid() {
        let err = CacheConfig::from_json(
            r#"{ "documents": [ { "path": "a.cpp", "project_part": "missing" } ] }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = CacheConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = CacheConfig::from_file(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_discover_walks_up() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join(".unitcache.json"), "{}").unwrap();

        assert_eq!(
            CacheConfig::discover(&nested),
            Some(dir.path().join(".unitcache.json"))
        );
    }
}
