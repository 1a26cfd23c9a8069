//! Per-document reader session.
//!
//! Single owner of the dimension cache, responsive scale, slot registry, and
//! navigation state. The shell mutates it only between frames; the loader
//! thread never touches it directly, it just sends results whose generation
//! the session checks before publishing.

use crate::dimensions::{row_height, DimensionCache, PageSize};
use crate::navigation::NavigationController;
use crate::registry::{MountedPage, PageSlotRegistry, PageToken};
use pdf_reader_scheduler::{LoadCoordinator, LoadTicket};

#[derive(Debug)]
pub struct ReaderSession {
    coordinator: LoadCoordinator,
    cache: DimensionCache,
    scale: f32,
    registry: PageSlotRegistry,
    navigation: NavigationController,
    last_page_settled: bool,
}

impl Default for ReaderSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ReaderSession {
    pub fn new() -> Self {
        Self {
            coordinator: LoadCoordinator::new(),
            cache: DimensionCache::empty(),
            scale: 1.0,
            registry: PageSlotRegistry::new(),
            navigation: NavigationController::new(),
            last_page_settled: false,
        }
    }

    /// Begin a document load. The returned ticket travels with the loader;
    /// starting another load supersedes it. The previous document stays fully
    /// readable until the new one publishes.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.coordinator.begin()
    }

    /// Install a completed geometry batch. Returns `false` (and changes
    /// nothing) when `generation` is not the current load, so a stale batch
    /// can never overwrite a newer document's cache. On success the whole
    /// view state resets: fresh cache, scale 1, empty registry, page 1.
    pub fn publish(&mut self, generation: u64, sizes: Vec<PageSize>) -> bool {
        if !self.coordinator.is_current(generation) {
            return false;
        }

        self.cache = DimensionCache::from_sizes(sizes);
        self.scale = 1.0;
        self.registry.clear();
        self.last_page_settled = false;
        self.navigation.document_ready(self.cache.page_count());
        true
    }

    /// Whether `generation` is the load most recently begun. Lets the shell
    /// drop stale loader messages (including failures) without touching state.
    pub fn is_current_load(&self, generation: u64) -> bool {
        self.coordinator.is_current(generation)
    }

    pub fn page_count(&self) -> u32 {
        self.cache.page_count()
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn dimensions(&self) -> &DimensionCache {
        &self.cache
    }

    pub fn navigation(&self) -> &NavigationController {
        &self.navigation
    }

    pub fn navigation_mut(&mut self) -> &mut NavigationController {
        &mut self.navigation
    }

    /// Height to allocate for a row in the virtual list.
    pub fn row_height(&self, index: u32) -> f32 {
        row_height(&self.cache, self.scale, index)
    }

    pub fn record_page_mounted(&mut self, index: u32, measured: MountedPage) -> PageToken {
        self.registry.record_mount(index, measured)
    }

    pub fn record_page_unmounted(&mut self, index: u32) {
        self.registry.record_unmount(index)
    }

    pub fn mounted_page(&self, index: u32) -> Option<MountedPage> {
        self.registry.mounted(index)
    }

    pub fn page_token(&self, index: u32) -> Option<PageToken> {
        self.registry.token(index)
    }

    /// Re-derive the responsive scale from the current page's mounted
    /// measurement. No-op when the page is not mounted, the cache has no
    /// entry, or the measurement implies the scale already stored. Returns
    /// `true` when the scale changed; the caller must then invalidate row
    /// heights from index 0, since the scale is global.
    pub fn remeasure_current_page(&mut self) -> bool {
        let index = self.navigation.current_page().saturating_sub(1);

        let Some(mounted) = self.registry.mounted(index) else {
            return false;
        };
        let Some(size) = self.cache.get(index) else {
            return false;
        };
        if mounted.height_px <= 0.0 {
            return false;
        }

        let next = size.height / mounted.height_px;
        if !next.is_finite() || next <= 0.0 || next == self.scale {
            return false;
        }

        self.scale = next;
        true
    }

    /// Report a successful render. Returns `true` exactly once per document,
    /// when the final page by index order first renders: the signal that
    /// layout geometry has settled and one re-measure cycle should run.
    pub fn note_page_rendered(&mut self, index: u32) -> bool {
        if self.last_page_settled || self.cache.is_empty() {
            return false;
        }
        if index + 1 != self.cache.page_count() {
            return false;
        }

        self.last_page_settled = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(heights: &[f32]) -> Vec<PageSize> {
        heights.iter().map(|&height| PageSize { width: 612.0, height }).collect()
    }

    fn loaded_session(heights: &[f32]) -> ReaderSession {
        let mut session = ReaderSession::new();
        let ticket = session.begin_load();
        assert!(session.publish(ticket.generation(), sizes(heights)));
        session
    }

    #[test]
    fn row_heights_are_positive_before_and_after_population() {
        let mut session = ReaderSession::new();

        let before = session.row_height(0);
        assert!(before.is_finite() && before > 0.0);

        let ticket = session.begin_load();
        assert!(session.publish(ticket.generation(), sizes(&[800.0, 1000.0])));

        for index in 0..2 {
            let after = session.row_height(index);
            assert!(after.is_finite() && after > 0.0);
        }
    }

    #[test]
    fn resize_rescales_all_rows_from_the_current_page() {
        let mut session = loaded_session(&[800.0, 1000.0, 600.0]);

        assert_eq!(session.row_height(0), 800.0);
        assert_eq!(session.row_height(1), 1000.0);
        assert_eq!(session.row_height(2), 600.0);

        // Current page (1) now renders 400px tall.
        session.record_page_mounted(0, MountedPage { width_px: 306.0, height_px: 400.0 });
        assert!(session.remeasure_current_page());
        assert_eq!(session.scale(), 2.0);

        assert_eq!(session.row_height(0), 400.0);
        assert_eq!(session.row_height(1), 500.0);
        assert_eq!(session.row_height(2), 300.0);
    }

    #[test]
    fn remeasure_is_idempotent() {
        let mut session = loaded_session(&[800.0, 1000.0]);
        session.record_page_mounted(0, MountedPage { width_px: 306.0, height_px: 400.0 });

        assert!(session.remeasure_current_page());
        let first = session.scale();

        assert!(!session.remeasure_current_page(), "unchanged geometry must not re-fire");
        assert_eq!(session.scale(), first);
    }

    #[test]
    fn remeasure_without_a_mounted_page_is_a_no_op() {
        let mut session = loaded_session(&[800.0]);

        assert!(!session.remeasure_current_page());
        assert_eq!(session.scale(), 1.0);

        // A degenerate measurement is also ignored.
        session.record_page_mounted(0, MountedPage { width_px: 0.0, height_px: 0.0 });
        assert!(!session.remeasure_current_page());
        assert_eq!(session.scale(), 1.0);
    }

    #[test]
    fn navigation_round_trip_through_the_session() {
        let mut session = loaded_session(&[800.0; 10]);

        let command = session.navigation_mut().request_page(7).expect("should navigate");
        assert_eq!(command.item_index, 6);
        assert_eq!(session.navigation().current_page(), 7);
        assert_eq!(session.navigation().display_text(), "7");
    }

    #[test]
    fn out_of_range_navigation_is_rejected() {
        let mut session = loaded_session(&[800.0, 900.0, 1000.0]);

        assert!(session.navigation_mut().request_page(5).is_none());
        assert_eq!(session.navigation().current_page(), 1);
        assert_eq!(session.navigation().display_text(), "1");
    }

    #[test]
    fn stale_geometry_batch_is_rejected() {
        let mut session = ReaderSession::new();

        let stale = session.begin_load();
        let current = session.begin_load();
        assert!(stale.is_superseded());
        assert!(!session.is_current_load(stale.generation()));

        assert!(!session.publish(stale.generation(), sizes(&[111.0])));
        assert_eq!(session.page_count(), 0);

        assert!(session.publish(current.generation(), sizes(&[800.0, 900.0])));
        assert_eq!(session.page_count(), 2);
        assert_eq!(session.row_height(0), 800.0);
    }

    #[test]
    fn reload_replaces_geometry_atomically() {
        let mut session = loaded_session(&[800.0, 1000.0, 600.0]);
        session.record_page_mounted(0, MountedPage { width_px: 306.0, height_px: 400.0 });
        assert!(session.remeasure_current_page());
        let old_token = session.page_token(0);

        let ticket = session.begin_load();
        assert!(session.publish(ticket.generation(), sizes(&[250.0, 350.0])));

        // Nothing of the old document survives: sizes, scale, tokens.
        assert_eq!(session.page_count(), 2);
        assert_eq!(session.row_height(0), 250.0);
        assert_eq!(session.row_height(2), crate::FALLBACK_ROW_HEIGHT);
        assert_eq!(session.scale(), 1.0);
        assert_eq!(session.page_token(0), None);
        assert_ne!(session.page_token(0), old_token);
        assert_eq!(session.navigation().current_page(), 1);
    }

    #[test]
    fn empty_document_publishes_an_empty_cache() {
        let mut session = ReaderSession::new();
        let ticket = session.begin_load();

        assert!(session.publish(ticket.generation(), Vec::new()));
        assert_eq!(session.page_count(), 0);
        assert!(session.navigation().is_ready());
    }

    #[test]
    fn last_page_render_settles_exactly_once() {
        let mut session = loaded_session(&[800.0, 900.0, 1000.0]);

        assert!(!session.note_page_rendered(0));
        assert!(!session.note_page_rendered(1));
        assert!(session.note_page_rendered(2), "final page render triggers the settle");
        assert!(!session.note_page_rendered(2), "only the first time");

        // A reload re-arms the signal.
        let ticket = session.begin_load();
        assert!(session.publish(ticket.generation(), sizes(&[500.0])));
        assert!(session.note_page_rendered(0));
    }

    #[test]
    fn unmount_keeps_the_slot_for_remounting() {
        let mut session = loaded_session(&[800.0, 900.0]);

        let token = session.record_page_mounted(1, MountedPage { width_px: 10.0, height_px: 20.0 });
        session.record_page_unmounted(1);
        assert_eq!(session.mounted_page(1), None);

        let again = session.record_page_mounted(1, MountedPage { width_px: 10.0, height_px: 20.0 });
        assert_eq!(token, again);
    }
}
