use image::{ImageBuffer, Rgba};
use lopdf::Document;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

mod outline;

pub use outline::OutlineItem;

pub type RgbaImage = ImageBuffer<Rgba<u8>, Vec<u8>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentHandle(u64);

impl DocumentHandle {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Native page geometry at reference scale (1 PDF point = 1 reference pixel).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRequest {
    pub page_index: u32,
    pub scale: f32,
}

impl Default for RenderRequest {
    fn default() -> Self {
        Self { page_index: 0, scale: 1.0 }
    }
}

#[derive(Debug, Clone)]
pub enum OpenSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl From<PathBuf> for OpenSource {
    fn from(value: PathBuf) -> Self {
        Self::Path(value)
    }
}

impl From<&Path> for OpenSource {
    fn from(value: &Path) -> Self {
        Self::Path(value.to_path_buf())
    }
}

impl From<Vec<u8>> for OpenSource {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parse error: {0}")]
    Parse(#[from] lopdf::Error),
    #[error("invalid handle {0}")]
    InvalidHandle(u64),
    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },
    #[error("encrypted PDFs are not supported in the default backend")]
    EncryptedUnsupported,
    #[error("backend error: {0}")]
    Backend(String),
}

/// Document engine surface consumed by the reader.
///
/// Geometry is queried per page at reference scale; the outline is read once
/// at open time and served from the handle's record.
pub trait DocumentEngine {
    fn open(&mut self, source: OpenSource) -> Result<DocumentHandle, EngineError>;
    fn page_count(&self, handle: DocumentHandle) -> Result<u32, EngineError>;
    fn page_size(
        &self,
        handle: DocumentHandle,
        page_index: u32,
    ) -> Result<PageSize, EngineError>;
    fn outline(&self, handle: DocumentHandle) -> Result<Vec<OutlineItem>, EngineError>;
    fn render_page(
        &self,
        handle: DocumentHandle,
        request: RenderRequest,
    ) -> Result<RgbaImage, EngineError>;
    fn close(&mut self, handle: DocumentHandle) -> Result<(), EngineError>;
}

/// US Letter, used when a page carries no usable MediaBox.
const FALLBACK_PAGE_SIZE: PageSize = PageSize { width: 612.0, height: 792.0 };

#[derive(Debug, Clone)]
struct DocumentRecord {
    bytes: Vec<u8>,
    page_sizes: Vec<PageSize>,
    outline: Vec<OutlineItem>,
}

/// Structural backend: parses geometry and outline with `lopdf` and rasters
/// blank page placeholders. Real page content requires the `pdfium` feature.
#[derive(Debug, Default)]
pub struct LopdfEngine {
    next_handle: u64,
    docs: HashMap<DocumentHandle, DocumentRecord>,
}

impl LopdfEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn parse(bytes: &[u8]) -> Result<(Vec<PageSize>, Vec<OutlineItem>), EngineError> {
        if bytes.windows("/Encrypt".len()).any(|window| window == b"/Encrypt") {
            return Err(EngineError::EncryptedUnsupported);
        }

        let doc = Document::load_mem(bytes)?;
        let pages = doc.get_pages();
        let mut sizes = Vec::with_capacity(pages.len());

        for (_, object_id) in pages {
            let dict = doc.get_dictionary(object_id)?;
            let size = dict
                .get(b"MediaBox")
                .ok()
                .and_then(|obj| obj.as_array().ok())
                .and_then(|array| {
                    if array.len() != 4 {
                        return None;
                    }
                    let x0 = array[0].as_float().ok()?;
                    let y0 = array[1].as_float().ok()?;
                    let x1 = array[2].as_float().ok()?;
                    let y1 = array[3].as_float().ok()?;
                    Some(PageSize { width: (x1 - x0).abs(), height: (y1 - y0).abs() })
                })
                .unwrap_or(FALLBACK_PAGE_SIZE);

            sizes.push(size);
        }

        // A zero-page document is unusual but legal here: the reader publishes
        // an empty dimension cache for it.
        Ok((sizes, outline::extract_outline(&doc)))
    }

    fn record(&self, handle: DocumentHandle) -> Result<&DocumentRecord, EngineError> {
        self.docs.get(&handle).ok_or(EngineError::InvalidHandle(handle.raw()))
    }

    #[cfg(feature = "pdfium")]
    fn bytes(&self, handle: DocumentHandle) -> Result<&[u8], EngineError> {
        Ok(&self.record(handle)?.bytes)
    }
}

impl DocumentEngine for LopdfEngine {
    fn open(&mut self, source: OpenSource) -> Result<DocumentHandle, EngineError> {
        let bytes = match source {
            OpenSource::Path(path) => fs::read(path)?,
            OpenSource::Bytes(bytes) => bytes,
        };

        let (page_sizes, outline) = Self::parse(&bytes)?;

        self.next_handle += 1;
        let handle = DocumentHandle(self.next_handle);
        self.docs.insert(handle, DocumentRecord { bytes, page_sizes, outline });

        Ok(handle)
    }

    fn page_count(&self, handle: DocumentHandle) -> Result<u32, EngineError> {
        Ok(self.record(handle)?.page_sizes.len() as u32)
    }

    fn page_size(
        &self,
        handle: DocumentHandle,
        page_index: u32,
    ) -> Result<PageSize, EngineError> {
        let record = self.record(handle)?;
        record.page_sizes.get(page_index as usize).copied().ok_or(EngineError::PageOutOfRange {
            page: page_index,
            page_count: record.page_sizes.len() as u32,
        })
    }

    fn outline(&self, handle: DocumentHandle) -> Result<Vec<OutlineItem>, EngineError> {
        Ok(self.record(handle)?.outline.clone())
    }

    fn render_page(
        &self,
        handle: DocumentHandle,
        request: RenderRequest,
    ) -> Result<RgbaImage, EngineError> {
        let page_size = self.page_size(handle, request.page_index)?;
        let scale = if request.scale <= 0.0 { 1.0 } else { request.scale };

        let width = (page_size.width * scale).round().max(1.0) as u32;
        let height = (page_size.height * scale).round().max(1.0) as u32;

        Ok(blank_page_raster(width, height))
    }

    fn close(&mut self, handle: DocumentHandle) -> Result<(), EngineError> {
        self.docs.remove(&handle).map(|_| ()).ok_or(EngineError::InvalidHandle(handle.raw()))
    }
}

/// White sheet with a light gray border, the structural backend's stand-in
/// for rasterized page content.
fn blank_page_raster(width: u32, height: u32) -> RgbaImage {
    const BORDER: Rgba<u8> = Rgba([220, 220, 220, 255]);

    let mut image = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));

    if width >= 4 && height >= 4 {
        for x in 0..width {
            image.put_pixel(x, 0, BORDER);
            image.put_pixel(x, height - 1, BORDER);
        }
        for y in 0..height {
            image.put_pixel(0, y, BORDER);
            image.put_pixel(width - 1, y, BORDER);
        }
    }

    image
}

#[cfg(feature = "pdfium")]
pub mod pdfium_backend {
    use super::*;
    use pdfium_render::prelude::*;

    /// Rasterizing backend: structure still comes from the inner `lopdf`
    /// engine, page content from a system pdfium library.
    pub struct PdfiumEngine {
        pdfium: Pdfium,
        inner: LopdfEngine,
    }

    impl PdfiumEngine {
        pub fn from_system_library() -> Result<Self, EngineError> {
            let pdfium = Pdfium::bind_to_system_library().map(Pdfium::new).map_err(|err| {
                EngineError::Backend(format!("failed to bind pdfium system library: {err}"))
            })?;

            Ok(Self { pdfium, inner: LopdfEngine::default() })
        }
    }

    impl DocumentEngine for PdfiumEngine {
        fn open(&mut self, source: OpenSource) -> Result<DocumentHandle, EngineError> {
            self.inner.open(source)
        }

        fn page_count(&self, handle: DocumentHandle) -> Result<u32, EngineError> {
            self.inner.page_count(handle)
        }

        fn page_size(
            &self,
            handle: DocumentHandle,
            page_index: u32,
        ) -> Result<PageSize, EngineError> {
            self.inner.page_size(handle, page_index)
        }

        fn outline(&self, handle: DocumentHandle) -> Result<Vec<OutlineItem>, EngineError> {
            self.inner.outline(handle)
        }

        fn render_page(
            &self,
            handle: DocumentHandle,
            request: RenderRequest,
        ) -> Result<RgbaImage, EngineError> {
            let page_size = self.inner.page_size(handle, request.page_index)?;
            let scale = if request.scale <= 0.0 { 1.0 } else { request.scale };
            let target_width = (page_size.width * scale).round().max(1.0) as i32;

            let document = self
                .pdfium
                .load_pdf_from_byte_slice(self.inner.bytes(handle)?, None)
                .map_err(|err| EngineError::Backend(err.to_string()))?;
            let page = document
                .pages()
                .get(request.page_index as u16)
                .map_err(|err| EngineError::Backend(err.to_string()))?;

            let config = PdfRenderConfig::new().set_target_width(target_width);
            let bitmap = page
                .render_with_config(&config)
                .map_err(|err| EngineError::Backend(err.to_string()))?;

            let width = bitmap.width() as u32;
            let height = bitmap.height() as u32;
            let rgba = bitmap.as_rgba_bytes().to_vec();

            RgbaImage::from_raw(width, height, rgba).ok_or_else(|| {
                EngineError::Backend("pdfium produced a malformed RGBA buffer".to_owned())
            })
        }

        fn close(&mut self, handle: DocumentHandle) -> Result<(), EngineError> {
            self.inner.close(handle)
        }
    }
}

pub fn default_engine() -> LopdfEngine {
    LopdfEngine::new()
}
