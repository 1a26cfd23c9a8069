//! Coordination logic for the virtualized reader view.
//!
//! Everything here is UI-free and single-owner: the shell holds one
//! [`ReaderSession`] and mutates it between frames. The session ties together
//! the per-document dimension cache, the responsive scale estimate, the
//! mounted-page slot registry, and the navigation state machine, and guards
//! all of it behind a load generation so a superseded document load can never
//! publish into a newer session.

mod dimensions;
mod error;
mod navigation;
mod registry;
mod session;
mod texture_cache;

pub use dimensions::{row_height, DimensionCache, PageSize, FALLBACK_ROW_HEIGHT};
pub use error::ReaderError;
pub use navigation::{NavigationController, ScrollCommand};
pub use registry::{MountedPage, PageSlotRegistry, PageToken};
pub use session::ReaderSession;
pub use texture_cache::{PageTextureCache, TextureKey};
