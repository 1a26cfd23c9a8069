/// Failure taxonomy for the reader view.
///
/// Navigation range violations are deliberately absent: out-of-range input is
/// ignored, not reported.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReaderError {
    /// Fatal to the view; nothing can render until a fresh open succeeds.
    #[error("document failed to load: {reason}")]
    DocumentLoad { reason: String },

    /// A per-page geometry query failed during load. The whole load aborts
    /// rather than publishing a partial dimension cache.
    #[error("geometry query failed for page {page}: {reason}")]
    PageGeometry { page: u32, reason: String },

    /// Isolated to one row; siblings keep rendering.
    #[error("page {page} failed to render: {reason}")]
    PageRender { page: u32, reason: String },
}
