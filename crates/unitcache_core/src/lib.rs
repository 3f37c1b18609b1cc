//! # unitcache_core
//!
//! Incremental translation-unit cache for code-intelligence backends.
//!
//! This crate provides:
//! - [`Document`], the cache entry for one file under one project part
//! - [`Documents`], the collection that turns editor and file-system events
//!   into dirty marks
//! - [`TranslationUnitUpdater`], which parses or reparses through a
//!   [`ParseEngine`]
//! - Configuration loading
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use unitcache_core::{CacheConfig, Documents, IncludeScanEngine, NullWatcher};
//!
//! let config = CacheConfig::from_file("unitcache.json")?;
//! let documents = Documents::new(Arc::new(IncludeScanEngine::new()), Box::new(NullWatcher));
//! documents.create_or_update_project_parts(config.project_parts());
//!
//! for document in documents.create(&config.file_containers())? {
//!     document.parse()?;
//!     println!("{}: {:?}", document, document.depended_file_paths()?);
//! }
//! ```

mod config;
pub mod document;
mod documents;
pub mod engine;
mod error;
mod file_container;
mod handle;
pub mod include_scan;
mod paths;
mod project_part;
mod time_point;
mod translation_unit;
pub mod unsaved_files;
pub mod updater;
pub mod watcher;

pub use config::{CacheConfig, DocumentConfig, ProjectPartConfig};
pub use document::{Document, DocumentHost, DocumentKey, FileExistsCheck};
pub use documents::Documents;
pub use engine::{ParseEngine, ParseRequest};
pub use error::{ConfigError, DocumentError, EngineError};
pub use file_container::FileContainer;
pub use handle::NativeHandle;
pub use include_scan::{IncludeScanEngine, ScanIndex, ScannedUnit};
pub use paths::normalize_path;
pub use project_part::{ProjectPart, ProjectParts};
pub use time_point::TimePoint;
pub use translation_unit::TranslationUnit;
pub use unsaved_files::{UnsavedFile, UnsavedFiles};
pub use updater::{TranslationUnitUpdater, UpdateInput, UpdateMode, UpdateResult};
pub use watcher::{FileWatcher, NullWatcher, WatchRegistry};
