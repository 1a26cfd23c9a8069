//! Mounted-page slot registry.
//!
//! An explicit arena replacing weak-keyed node maps: each page index gets one
//! slot holding a stable identity token and, while the page is mounted, its
//! measured on-screen size. Unmounting clears the measurement but keeps the
//! slot, so a remount of the same index reuses the same token. The registry
//! is discarded wholesale on document change; tokens are never reused across
//! indices.

use std::collections::HashMap;

/// Stable per-index identity within a document session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageToken(u64);

impl PageToken {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Measured on-screen size of a mounted page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MountedPage {
    pub width_px: f32,
    pub height_px: f32,
}

#[derive(Debug, Clone, Copy)]
struct PageSlot {
    token: PageToken,
    mounted: Option<MountedPage>,
}

#[derive(Debug, Default)]
pub struct PageSlotRegistry {
    slots: HashMap<u32, PageSlot>,
    next_token: u64,
}

impl PageSlotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a page as mounted with its current measurement. Mints the
    /// slot's token on first sight of the index; later mounts (and re-mounts
    /// after an unmount) reuse it.
    pub fn record_mount(&mut self, index: u32, measured: MountedPage) -> PageToken {
        let next_token = &mut self.next_token;
        let slot = self.slots.entry(index).or_insert_with(|| {
            *next_token += 1;
            PageSlot { token: PageToken(*next_token), mounted: None }
        });

        slot.mounted = Some(measured);
        slot.token
    }

    /// Clear the measurement for an index that scrolled out of the mounted
    /// window. The slot (and token) persists for the session.
    pub fn record_unmount(&mut self, index: u32) {
        if let Some(slot) = self.slots.get_mut(&index) {
            slot.mounted = None;
        }
    }

    pub fn mounted(&self, index: u32) -> Option<MountedPage> {
        self.slots.get(&index).and_then(|slot| slot.mounted)
    }

    pub fn token(&self, index: u32) -> Option<PageToken> {
        self.slots.get(&index).map(|slot| slot.token)
    }

    /// Drop every slot (document change). The token counter keeps rising, so
    /// tokens are unique across sessions too.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }
}
