//! Generation tickets for in-flight load supersession
//!
//! Each document load begins a new generation. The loader carries a ticket
//! and can check whether a newer load has started, stopping early instead of
//! finishing work whose result would be rejected anyway. The owner compares a
//! result's generation against the current one before publishing, so a stale
//! batch can never overwrite a newer document's state.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

/// Issues load generations and answers which one is current.
///
/// # Example
///
/// ```
/// use pdf_reader_scheduler::LoadCoordinator;
///
/// let coordinator = LoadCoordinator::new();
/// let first = coordinator.begin();
/// let second = coordinator.begin();
///
/// assert!(first.is_superseded());
/// assert!(!second.is_superseded());
/// assert!(coordinator.is_current(second.generation()));
/// ```
#[derive(Debug, Default)]
pub struct LoadCoordinator {
    current: Arc<AtomicU64>,
}

impl LoadCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new load generation, superseding any ticket issued earlier.
    pub fn begin(&self) -> LoadTicket {
        let generation = self.current.fetch_add(1, Ordering::AcqRel) + 1;
        LoadTicket { generation, current: Arc::clone(&self.current) }
    }

    pub fn current_generation(&self) -> u64 {
        self.current.load(Ordering::Acquire)
    }

    /// Whether `generation` is still the latest one issued.
    pub fn is_current(&self, generation: u64) -> bool {
        self.current_generation() == generation
    }
}

/// Handed to a loader; all clones observe supersession by later `begin` calls.
#[derive(Debug, Clone)]
pub struct LoadTicket {
    generation: u64,
    current: Arc<AtomicU64>,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True once a newer load has begun.
    pub fn is_superseded(&self) -> bool {
        self.current.load(Ordering::Acquire) != self.generation
    }
}
