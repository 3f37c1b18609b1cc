//! A lightweight engine that only follows `#include` directives.
//!
//! It does no semantic analysis. The "translation unit" it produces is the
//! transitive set of files reachable through includes, which is enough to
//! drive the invalidation machinery end to end.

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::engine::{ParseEngine, ParseRequest};
use crate::error::EngineError;
use crate::paths::normalize_path;
use crate::unsaved_files::UnsavedFiles;

/// Engine resolving includes against the including directory and `-I` paths.
#[derive(Debug, Default, Clone, Copy)]
pub struct IncludeScanEngine;

/// Index state: how many units were created through it.
#[derive(Debug, Default)]
pub struct ScanIndex {
    units_created: usize,
}

impl ScanIndex {
    /// Units created through this index.
    pub fn units_created(&self) -> usize {
        self.units_created
    }
}

/// The result of scanning a primary file.
#[derive(Debug, Clone)]
pub struct ScannedUnit {
    file_path: PathBuf,
    arguments: Vec<String>,
    includes: BTreeSet<PathBuf>,
    unresolved: BTreeSet<String>,
    reparse_count: usize,
}

impl ScannedUnit {
    /// Primary file.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Resolved included files, excluding the primary file.
    pub fn includes(&self) -> &BTreeSet<PathBuf> {
        &self.includes
    }

    /// Include names that could not be resolved.
    pub fn unresolved(&self) -> &BTreeSet<String> {
        &self.unresolved
    }

    /// Number of incremental reparses applied.
    pub fn reparse_count(&self) -> usize {
        self.reparse_count
    }
}

#[derive(Debug, PartialEq, Eq)]
enum IncludeDirective<'a> {
    Quoted(&'a str),
    Angled(&'a str),
}

impl IncludeScanEngine {
    /// Creates the engine.
    pub fn new() -> Self {
        Self
    }

    fn scan(
        &self,
        file_path: &Path,
        arguments: &[String],
        unsaved_files: &UnsavedFiles,
    ) -> Result<(BTreeSet<PathBuf>, BTreeSet<String>), EngineError> {
        let search_paths = include_search_paths(arguments);
        let primary = read_source(file_path, unsaved_files)?;

        let mut includes = BTreeSet::new();
        let mut unresolved = BTreeSet::new();
        let primary_path = normalize_path(file_path);
        let mut visited = HashSet::new();
        visited.insert(primary_path.clone());

        let mut queue = VecDeque::new();
        queue.push_back((primary_path, primary));

        while let Some((current, source)) = queue.pop_front() {
            for directive in source.lines().filter_map(parse_include) {
                let Some(resolved) =
                    resolve_include(&current, &directive, &search_paths, unsaved_files)
                else {
                    let name = match directive {
                        IncludeDirective::Quoted(name) | IncludeDirective::Angled(name) => name,
                    };
                    debug!("Unresolved include {} in {}", name, current.display());
                    unresolved.insert(name.to_string());
                    continue;
                };

                if !visited.insert(resolved.clone()) {
                    continue;
                }
                includes.insert(resolved.clone());

                match read_source(&resolved, unsaved_files) {
                    Ok(content) => queue.push_back((resolved, content)),
                    Err(e) => debug!("Skipping unreadable include: {}", e),
                }
            }
        }

        Ok((includes, unresolved))
    }
}

impl ParseEngine for IncludeScanEngine {
    type Index = ScanIndex;
    type Unit = ScannedUnit;

    fn create_index(&self) -> Self::Index {
        ScanIndex::default()
    }

    fn parse(
        &self,
        index: &mut Self::Index,
        request: &ParseRequest<'_>,
    ) -> Result<Self::Unit, EngineError> {
        let (includes, unresolved) =
            self.scan(request.file_path, request.arguments, request.unsaved_files)?;
        index.units_created += 1;

        Ok(ScannedUnit {
            file_path: request.file_path.to_path_buf(),
            arguments: request.arguments.to_vec(),
            includes,
            unresolved,
            reparse_count: 0,
        })
    }

    fn reparse(
        &self,
        unit: &mut Self::Unit,
        request: &ParseRequest<'_>,
    ) -> Result<(), EngineError> {
        // Arguments are fixed for the lifetime of a unit.
        let (includes, unresolved) =
            self.scan(&unit.file_path, &unit.arguments, request.unsaved_files)?;
        unit.includes = includes;
        unit.unresolved = unresolved;
        unit.reparse_count += 1;
        Ok(())
    }

    fn dependencies(&self, unit: &Self::Unit) -> HashSet<PathBuf> {
        unit.includes.iter().cloned().collect()
    }
}

fn read_source(path: &Path, unsaved_files: &UnsavedFiles) -> Result<String, EngineError> {
    if let Some(content) = unsaved_files.content(path) {
        return Ok(content.to_string());
    }
    fs::read_to_string(path).map_err(|source| EngineError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn include_search_paths(arguments: &[String]) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    let mut iter = arguments.iter();

    while let Some(argument) = iter.next() {
        for flag in ["-I", "-isystem"] {
            if argument == flag {
                if let Some(value) = iter.next() {
                    paths.push(PathBuf::from(value));
                }
                break;
            }
            if let Some(value) = argument.strip_prefix(flag)
                && !value.is_empty()
            {
                paths.push(PathBuf::from(value));
                break;
            }
        }
    }

    paths
}

fn parse_include(line: &str) -> Option<IncludeDirective<'_>> {
    let rest = line.trim_start().strip_prefix('#')?.trim_start();
    let rest = rest.strip_prefix("include")?.trim_start();

    if let Some(quoted) = rest.strip_prefix('"') {
        return quoted
            .split('"')
            .next()
            .filter(|name| !name.is_empty())
            .map(IncludeDirective::Quoted);
    }
    if let Some(angled) = rest.strip_prefix('<') {
        let end = angled.find('>')?;
        return angled
            .get(..end)
            .filter(|name| !name.is_empty())
            .map(IncludeDirective::Angled);
    }
    None
}

fn resolve_include(
    including_file: &Path,
    directive: &IncludeDirective<'_>,
    search_paths: &[PathBuf],
    unsaved_files: &UnsavedFiles,
) -> Option<PathBuf> {
    let name = match directive {
        IncludeDirective::Quoted(name) => {
            if let Some(dir) = including_file.parent() {
                let candidate = normalize_path(&dir.join(name));
                if source_exists(&candidate, unsaved_files) {
                    return Some(candidate);
                }
            }
            name
        }
        IncludeDirective::Angled(name) => name,
    };

    search_paths
        .iter()
        .map(|dir| normalize_path(&dir.join(name)))
        .find(|candidate| source_exists(candidate, unsaved_files))
}

fn source_exists(path: &Path, unsaved_files: &UnsavedFiles) -> bool {
    unsaved_files.unsaved_file(path).is_some() || path.is_file()
}
