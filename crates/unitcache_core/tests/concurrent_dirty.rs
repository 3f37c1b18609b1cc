//! A dirty mark that lands while a reparse is in flight must survive the
//! reparse's result.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use unitcache_core::{
    Documents, EngineError, FileContainer, FileExistsCheck, NullWatcher, ParseEngine,
    ParseRequest, ProjectPart,
};

/// Engine whose first reparse waits until the test releases it.
struct GateEngine {
    armed: AtomicBool,
    entered: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
}

impl ParseEngine for GateEngine {
    type Index = ();
    type Unit = ();

    fn create_index(&self) -> Self::Index {}

    fn parse(&self, _index: &mut (), _request: &ParseRequest<'_>) -> Result<(), EngineError> {
        Ok(())
    }

    fn reparse(&self, _unit: &mut (), _request: &ParseRequest<'_>) -> Result<(), EngineError> {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.entered.lock().send(()).unwrap();
            self.release.lock().recv().unwrap();
        }
        Ok(())
    }

    fn dependencies(&self, _unit: &()) -> HashSet<PathBuf> {
        HashSet::new()
    }
}

#[test]
fn test_set_dirty_during_reparse_keeps_document_dirty() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let engine = GateEngine {
        armed: AtomicBool::new(true),
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
    };

    let documents = Documents::new(Arc::new(engine), Box::new(NullWatcher))
        .with_file_exists_check(FileExistsCheck::DoNotCheck);
    documents.create_or_update_project_parts(vec![ProjectPart::new("app", Vec::new())]);
    let document = documents
        .create(&[FileContainer::new("/virtual/main.cpp", "app")])
        .unwrap()
        .remove(0);

    document.parse().unwrap();
    document.set_dirty().unwrap();
    let snapshot_time_point = document.needs_to_be_reparsed_change_time_point().unwrap();

    let reparsing = {
        let document = document.clone();
        thread::spawn(move || document.reparse())
    };

    entered_rx.recv().unwrap();
    document.set_dirty().unwrap();
    let concurrent_time_point = document.needs_to_be_reparsed_change_time_point().unwrap();
    release_tx.send(()).unwrap();
    reparsing.join().unwrap().unwrap();

    assert!(concurrent_time_point > snapshot_time_point);
    assert!(document.is_needing_reparse().unwrap());
    assert!(!document.has_parse_or_reparse_failed().unwrap());

    document.reparse().unwrap();
    assert!(!document.is_needing_reparse().unwrap());
}

#[test]
fn test_translation_unit_access_waits_for_update() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let engine = GateEngine {
        armed: AtomicBool::new(true),
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
    };

    let documents = Documents::new(Arc::new(engine), Box::new(NullWatcher))
        .with_file_exists_check(FileExistsCheck::DoNotCheck);
    documents.create_or_update_project_parts(vec![ProjectPart::new("app", Vec::new())]);
    let document = documents
        .create(&[FileContainer::new("/virtual/main.cpp", "app")])
        .unwrap()
        .remove(0);
    document.parse().unwrap();

    let reparsing = {
        let document = document.clone();
        thread::spawn(move || document.reparse())
    };
    entered_rx.recv().unwrap();

    let reader = {
        let document = document.clone();
        thread::spawn(move || document.with_translation_unit(|unit| unit.is_null()))
    };
    release_tx.send(()).unwrap();

    reparsing.join().unwrap().unwrap();
    assert_eq!(reader.join().unwrap(), Ok(false));
}
