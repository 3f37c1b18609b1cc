//! Integration tests for the document collection.
//!
//! These drive [`Documents`] with the include-scanning engine over real files
//! and check dirty marking, watch registration and error reporting.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use unitcache_core::{
    Document, DocumentError, Documents, FileContainer, FileExistsCheck, FileWatcher,
    IncludeScanEngine, ProjectPart,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum WatchEvent {
    Watch(PathBuf),
    Unwatch(PathBuf),
}

#[derive(Clone, Default)]
struct RecordingWatcher(Arc<Mutex<Vec<WatchEvent>>>);

impl RecordingWatcher {
    fn take(&self) -> Vec<WatchEvent> {
        std::mem::take(&mut *self.0.lock())
    }
}

impl FileWatcher for RecordingWatcher {
    fn watch(&self, path: &Path) {
        self.0.lock().push(WatchEvent::Watch(path.to_path_buf()));
    }

    fn unwatch(&self, path: &Path) {
        self.0.lock().push(WatchEvent::Unwatch(path.to_path_buf()));
    }
}

struct Project {
    dir: TempDir,
    watcher: RecordingWatcher,
    documents: Documents<IncludeScanEngine>,
}

impl Project {
    fn new(files: &[(&str, &str)]) -> Self {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }

        let watcher = RecordingWatcher::default();
        let documents = Documents::new(
            Arc::new(IncludeScanEngine::new()),
            Box::new(watcher.clone()),
        );
        documents.create_or_update_project_parts(vec![ProjectPart::new("app", Vec::new())]);

        Self {
            dir,
            watcher,
            documents,
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn container(&self, name: &str) -> FileContainer {
        FileContainer::new(self.path(name), "app")
    }

    fn create(&self, name: &str) -> Document<IncludeScanEngine> {
        let mut created = self.documents.create(&[self.container(name)]).unwrap();
        created.remove(0)
    }
}

fn paths(items: &[PathBuf]) -> BTreeSet<PathBuf> {
    items.iter().cloned().collect()
}

fn includes_of(document: &Document<IncludeScanEngine>) -> BTreeSet<PathBuf> {
    document
        .with_translation_unit(|unit| unit.unit().map(|u| u.includes().clone()))
        .unwrap()
        .unwrap_or_default()
}

#[test]
fn test_parse_registers_dependencies_and_watches() {
    let project = Project::new(&[("main.cpp", "#include \"a.h\"\n"), ("a.h", "")]);
    let document = project.create("main.cpp");

    document.parse().unwrap();

    let expected: HashSet<PathBuf> = [project.path("main.cpp"), project.path("a.h")].into();
    assert_eq!(document.depended_file_paths().unwrap(), expected);
    assert_eq!(
        project.documents.watched_files(),
        vec![project.path("a.h"), project.path("main.cpp")]
    );
    assert!(document.is_intact());
    assert!(!document.is_needing_reparse().unwrap());
}

#[test]
fn test_dependency_change_dirties_and_reparse_cleans() {
    let project = Project::new(&[("main.cpp", "#include \"a.h\"\n"), ("a.h", "")]);
    let document = project.create("main.cpp");
    document.parse().unwrap();

    let dirtied = project
        .documents
        .update_documents_with_changed_dependency(&project.path("a.h"));
    assert_eq!(dirtied, vec![document.clone()]);
    assert_eq!(project.documents.dirty_documents(), vec![document.clone()]);

    document.update().unwrap();

    assert!(!document.is_needing_reparse().unwrap());
    assert!(project.documents.dirty_documents().is_empty());
    let reparses = document
        .with_translation_unit(|unit| unit.unit().map(|u| u.reparse_count()))
        .unwrap();
    assert_eq!(reparses, Some(1));
}

#[test]
fn test_unrelated_change_does_not_dirty() {
    let project = Project::new(&[("main.cpp", ""), ("other.h", "")]);
    let document = project.create("main.cpp");
    document.parse().unwrap();

    let dirtied = project
        .documents
        .update_documents_with_changed_dependency(&project.path("other.h"));

    assert!(dirtied.is_empty());
    assert!(!document.is_needing_reparse().unwrap());
}

#[test]
fn test_reparse_drops_stale_watches() {
    let project = Project::new(&[
        ("main.cpp", "#include \"a.h\"\n"),
        ("a.h", ""),
        ("b.h", ""),
    ]);
    let document = project.create("main.cpp");
    document.parse().unwrap();
    project.watcher.take();

    fs::write(project.path("main.cpp"), "#include \"b.h\"\n").unwrap();
    project
        .documents
        .update_documents_with_changed_dependency(&project.path("main.cpp"));
    document.update().unwrap();

    assert_eq!(
        project.watcher.take(),
        vec![
            WatchEvent::Watch(project.path("b.h")),
            WatchEvent::Unwatch(project.path("a.h")),
        ]
    );
    assert!(!project.documents.is_watched(&project.path("a.h")));
    assert!(project.documents.is_watched(&project.path("b.h")));
}

#[test]
fn test_project_part_change_forces_full_parse() {
    let project = Project::new(&[("main.cpp", "#include <lib.h>\n"), ("inc/lib.h", "")]);
    let document = project.create("main.cpp");
    document.parse().unwrap();
    assert!(includes_of(&document).is_empty());

    let include_dir = format!("-I{}", project.path("inc").display());
    let dirtied = project
        .documents
        .create_or_update_project_parts(vec![ProjectPart::new("app", vec![include_dir.clone()])]);

    assert_eq!(dirtied, vec![document.clone()]);
    assert!(document.is_project_part_outdated().unwrap());
    assert_eq!(document.project_part().unwrap().arguments(), &[include_dir][..]);

    document.update().unwrap();

    assert!(!document.is_project_part_outdated().unwrap());
    assert!(!document.is_needing_reparse().unwrap());
    assert_eq!(includes_of(&document), paths(&[project.path("inc/lib.h")]));
}

#[test]
fn test_unchanged_project_part_does_not_dirty() {
    let project = Project::new(&[("main.cpp", "")]);
    let document = project.create("main.cpp");
    document.parse().unwrap();

    let dirtied = project
        .documents
        .create_or_update_project_parts(vec![ProjectPart::new("app", Vec::new())]);

    assert!(dirtied.is_empty());
    assert!(!document.is_needing_reparse().unwrap());
}

#[test]
fn test_create_with_unsaved_content_uses_buffer() {
    let project = Project::new(&[("main.cpp", ""), ("a.h", "")]);

    let created = project
        .documents
        .create(&[project
            .container("main.cpp")
            .with_unsaved_content("#include \"a.h\"\n")
            .with_revision(2)])
        .unwrap();
    let document = &created[0];
    document.parse().unwrap();

    assert_eq!(document.document_revision().unwrap(), 2);
    assert_eq!(includes_of(document), paths(&[project.path("a.h")]));
    assert_eq!(
        project
            .documents
            .unsaved_files()
            .content(&project.path("main.cpp")),
        Some("#include \"a.h\"\n")
    );
}

#[test]
fn test_update_sets_revision_and_dirties() {
    let project = Project::new(&[("main.cpp", "")]);
    let document = project.create("main.cpp");
    document.parse().unwrap();

    let updated = project
        .documents
        .update(&[project
            .container("main.cpp")
            .with_unsaved_content("int x;\n")
            .with_revision(7)])
        .unwrap();

    assert_eq!(updated, vec![document.clone()]);
    assert_eq!(document.document_revision().unwrap(), 7);
    assert!(document.is_needing_reparse().unwrap());
}

#[test]
fn test_update_unknown_document_fails() {
    let project = Project::new(&[("main.cpp", "")]);

    let err = project
        .documents
        .update(&[project.container("main.cpp")])
        .unwrap_err();

    assert_eq!(
        err,
        DocumentError::DocumentDoesNotExist {
            path: project.path("main.cpp"),
            project_part_id: "app".to_string(),
        }
    );
}

#[test]
fn test_create_errors() {
    let project = Project::new(&[("main.cpp", "")]);
    project.create("main.cpp");

    let duplicate = project
        .documents
        .create(&[project.container("main.cpp")])
        .unwrap_err();
    assert!(matches!(
        duplicate,
        DocumentError::DocumentAlreadyExists { .. }
    ));

    let unknown_part = project
        .documents
        .create(&[FileContainer::new(project.path("main.cpp"), "lib")])
        .unwrap_err();
    assert_eq!(
        unknown_part,
        DocumentError::ProjectPartDoesNotExist {
            id: "lib".to_string()
        }
    );

    let missing = project
        .documents
        .create(&[project.container("missing.cpp")])
        .unwrap_err();
    assert_eq!(
        missing,
        DocumentError::file_does_not_exist(project.path("missing.cpp"))
    );
    assert_eq!(project.documents.len(), 1);
}

#[test]
fn test_failed_parse_latches_until_next_result() {
    let dir = TempDir::new().unwrap();
    let main = dir.path().join("main.cpp");
    let documents = Documents::new(
        Arc::new(IncludeScanEngine::new()),
        Box::new(RecordingWatcher::default()),
    )
    .with_file_exists_check(FileExistsCheck::DoNotCheck);
    documents.create_or_update_project_parts(vec![ProjectPart::new("app", Vec::new())]);

    let document = documents
        .create(&[FileContainer::new(&main, "app")])
        .unwrap()
        .remove(0);
    document.parse().unwrap();

    assert!(document.has_parse_or_reparse_failed().unwrap());
    assert!(!document.is_intact());
    assert!(documents.watched_files().is_empty());

    fs::write(&main, "").unwrap();
    document.parse().unwrap();

    assert!(!document.has_parse_or_reparse_failed().unwrap());
    assert!(document.is_intact());
}

#[test]
fn test_deleted_main_file_is_not_dirtied() {
    let project = Project::new(&[("main.cpp", "")]);
    let document = project.create("main.cpp");
    document.parse().unwrap();

    fs::remove_file(project.path("main.cpp")).unwrap();
    let dirtied = project
        .documents
        .update_documents_with_changed_dependency(&project.path("main.cpp"));

    assert!(dirtied.is_empty());
    assert!(!document.is_intact());
    assert_eq!(
        document.depended_file_paths().unwrap_err(),
        DocumentError::file_does_not_exist(project.path("main.cpp"))
    );
}

#[test]
fn test_remove_releases_watches() {
    let project = Project::new(&[("main.cpp", "#include \"a.h\"\n"), ("a.h", "")]);
    let document = project.create("main.cpp");
    document.parse().unwrap();

    project
        .documents
        .remove(&[project.container("main.cpp")])
        .unwrap();

    assert!(project.documents.is_empty());
    assert!(project.documents.watched_files().is_empty());
    assert!(!project.documents.has_document(&project.path("main.cpp"), "app"));

    let err = project
        .documents
        .remove(&[project.container("main.cpp")])
        .unwrap_err();
    assert!(matches!(err, DocumentError::DocumentDoesNotExist { .. }));
}

#[test]
fn test_parse_of_removed_document_does_not_watch() {
    let project = Project::new(&[("main.cpp", "#include \"a.h\"\n"), ("a.h", "")]);
    let held = project.create("main.cpp");

    project
        .documents
        .remove(&[project.container("main.cpp")])
        .unwrap();
    held.parse().unwrap();

    assert!(project.documents.watched_files().is_empty());
    assert!(project.watcher.take().is_empty());

    let recreated = project.create("main.cpp");
    recreated.parse().unwrap();
    assert_eq!(
        project.documents.watched_files(),
        vec![project.path("a.h"), project.path("main.cpp")]
    );
}

#[test]
fn test_reparse_of_evicted_document_does_not_watch() {
    let project = Project::new(&[("main.cpp", "#include \"a.h\"\n"), ("a.h", "")]);
    project
        .documents
        .create_or_update_project_parts(vec![ProjectPart::new("tests", Vec::new())]);
    let held = project
        .documents
        .create(&[FileContainer::new(project.path("main.cpp"), "tests")])
        .unwrap()
        .remove(0);
    held.parse().unwrap();
    held.set_dirty().unwrap();

    project
        .documents
        .remove_project_parts(&["tests".to_string()])
        .unwrap();
    held.reparse().unwrap();

    assert!(project.documents.watched_files().is_empty());
}

#[test]
fn test_include_through_parent_dir_is_a_dependency() {
    let project = Project::new(&[
        ("src/main.cpp", "#include \"../inc/a.h\"\n"),
        ("inc/a.h", ""),
    ]);
    let document = project.create("src/main.cpp");
    document.parse().unwrap();

    let expected: HashSet<PathBuf> =
        [project.path("src/main.cpp"), project.path("inc/a.h")].into();
    assert_eq!(document.depended_file_paths().unwrap(), expected);

    let dirtied = project
        .documents
        .update_documents_with_changed_dependency(&project.path("inc/a.h"));
    assert_eq!(dirtied, vec![document.clone()]);

    document.update().unwrap();
    let dirtied = project
        .documents
        .update_documents_with_changed_dependency(&project.path("src/../inc/./a.h"));
    assert_eq!(dirtied, vec![document]);
}

#[test]
fn test_removing_project_part_evicts_documents() {
    let project = Project::new(&[("main.cpp", ""), ("other.cpp", "")]);
    project
        .documents
        .create_or_update_project_parts(vec![ProjectPart::new("tests", Vec::new())]);
    let kept = project.create("main.cpp");
    project
        .documents
        .create(&[FileContainer::new(project.path("other.cpp"), "tests")])
        .unwrap();

    project
        .documents
        .remove_project_parts(&["tests".to_string()])
        .unwrap();

    assert_eq!(project.documents.documents(), vec![kept]);
    assert!(project.documents.project_part("tests").is_err());
    assert!(
        project
            .documents
            .remove_project_parts(&["tests".to_string()])
            .is_err()
    );
}

#[test]
fn test_editor_visibility_queries() {
    let project = Project::new(&[("a.cpp", ""), ("b.cpp", ""), ("c.cpp", "")]);
    let a = project.create("a.cpp");
    let b = project.create("b.cpp");
    let c = project.create("c.cpp");
    for document in [&a, &b, &c] {
        document.set_dirty().unwrap();
    }

    project
        .documents
        .set_visible_in_editors(&[project.path("a.cpp"), project.path("b.cpp")])
        .unwrap();
    project
        .documents
        .set_used_by_current_editor(&project.path("a.cpp"))
        .unwrap();

    assert_eq!(project.documents.current_editor_document(), Some(a.clone()));
    assert_eq!(
        project.documents.dirty_and_visible_but_not_current_documents(),
        vec![b.clone()]
    );
    assert!(!c.is_visible_in_editor().unwrap());
}

#[test]
fn test_shared_header_stays_watched_across_documents() {
    let project = Project::new(&[
        ("a.cpp", "#include \"common.h\"\n"),
        ("b.cpp", "#include \"common.h\"\n"),
        ("common.h", ""),
    ]);
    let a = project.create("a.cpp");
    let b = project.create("b.cpp");
    a.parse().unwrap();
    b.parse().unwrap();

    let dirtied = project
        .documents
        .update_documents_with_changed_dependency(&project.path("common.h"));
    assert_eq!(dirtied, vec![a.clone(), b.clone()]);

    project.documents.remove(&[project.container("a.cpp")]).unwrap();
    assert!(project.documents.is_watched(&project.path("common.h")));
    assert!(!project.documents.is_watched(&project.path("a.cpp")));
}
