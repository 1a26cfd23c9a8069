//! Background document loading.
//!
//! One thread per load: read the file, parse it, query geometry for every
//! page, fetch the outline, then hand the complete batch back over a channel.
//! The UI thread drains the channel each frame and publishes through the
//! session, which rejects stale generations; the thread also checks its
//! ticket so a superseded load stops early instead of finishing dead work.
//!
//! Any single geometry failure aborts the load: a partial dimension cache
//! would leave row-height math inconsistent, so nothing publishes.

use pdf_engine::{DocumentEngine, LopdfEngine, OpenSource, OutlineItem};
use pdf_reader_scheduler::LoadTicket;
use reader_core::{PageSize, ReaderError};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

/// Complete result of a successful load, ready to publish in one step.
#[derive(Debug)]
pub struct LoadedDocument {
    pub generation: u64,
    pub path: PathBuf,
    pub bytes: Vec<u8>,
    pub sizes: Vec<PageSize>,
    pub outline: Vec<OutlineItem>,
}

#[derive(Debug)]
pub enum LoaderEvent {
    Loaded(Box<LoadedDocument>),
    Failed { generation: u64, error: ReaderError },
}

pub fn spawn_document_load(path: PathBuf, ticket: LoadTicket, events: Sender<LoaderEvent>) {
    std::thread::spawn(move || {
        let event = run_load(&path, &ticket);
        if ticket.is_superseded() {
            return;
        }
        let _ = events.send(event);
    });
}

fn run_load(path: &Path, ticket: &LoadTicket) -> LoaderEvent {
    let generation = ticket.generation();
    let failed = |error: ReaderError| LoaderEvent::Failed { generation, error };

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            return failed(ReaderError::DocumentLoad { reason: err.to_string() });
        }
    };

    let mut engine = LopdfEngine::new();
    let handle = match engine.open(OpenSource::Bytes(bytes.clone())) {
        Ok(handle) => handle,
        Err(err) => {
            return failed(ReaderError::DocumentLoad { reason: err.to_string() });
        }
    };

    let page_count = match engine.page_count(handle) {
        Ok(count) => count,
        Err(err) => {
            return failed(ReaderError::DocumentLoad { reason: err.to_string() });
        }
    };

    let mut sizes = Vec::with_capacity(page_count as usize);
    for index in 0..page_count {
        if ticket.is_superseded() {
            return failed(ReaderError::DocumentLoad { reason: "superseded".to_string() });
        }

        match engine.page_size(handle, index) {
            Ok(size) => sizes.push(PageSize { width: size.width, height: size.height }),
            Err(err) => {
                return failed(ReaderError::PageGeometry {
                    page: index + 1,
                    reason: err.to_string(),
                });
            }
        }
    }

    let outline = match engine.outline(handle) {
        Ok(outline) => outline,
        Err(err) => {
            return failed(ReaderError::DocumentLoad { reason: err.to_string() });
        }
    };

    LoaderEvent::Loaded(Box::new(LoadedDocument { generation, path: path.to_path_buf(), bytes, sizes, outline }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdf_reader_scheduler::LoadCoordinator;
    use std::sync::mpsc;

    #[test]
    fn missing_file_reports_a_document_load_error() {
        let coordinator = LoadCoordinator::new();
        let ticket = coordinator.begin();

        let event = run_load(Path::new("/nonexistent/document.pdf"), &ticket);
        match event {
            LoaderEvent::Failed { generation, error } => {
                assert_eq!(generation, ticket.generation());
                assert!(matches!(error, ReaderError::DocumentLoad { .. }));
            }
            LoaderEvent::Loaded(_) => panic!("load should fail for a missing file"),
        }
    }

    #[test]
    fn superseded_load_sends_nothing() {
        let coordinator = LoadCoordinator::new();
        let ticket = coordinator.begin();
        let _newer = coordinator.begin();

        let (sender, receiver) = mpsc::channel();
        spawn_document_load(PathBuf::from("/nonexistent/document.pdf"), ticket, sender);

        // The channel closes without delivering an event: the stale loader
        // dropped its result.
        assert!(receiver.recv().is_err());
    }
}
