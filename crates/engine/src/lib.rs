//! PDF rendering boundary.
//!
//! The viewer consumes PDF documents exclusively through the [`PdfEngine`]
//! trait: open a file, ask for page geometry, rasterize a page at a zoom
//! factor, and release the handle. Two backends exist: [`GeometryEngine`]
//! parses page geometry with lopdf and renders placeholder rasters (always
//! available, used by tests and as a fallback), and the `pdfium` feature
//! adds a backend that rasterizes real page content through the PDFium
//! native library.

use image::{ImageBuffer, Rgba};
use lopdf::Document;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// RGBA raster of a rendered page.
pub type PageRaster = ImageBuffer<Rgba<u8>, Vec<u8>>;

/// Opaque ticket for an open document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentHandle(u64);

impl DocumentHandle {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Page dimensions in PDF points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSizePt {
    pub width_pt: f32,
    pub height_pt: f32,
}

/// US Letter, used when a page carries no usable MediaBox.
const FALLBACK_PAGE_SIZE: PageSizePt = PageSizePt { width_pt: 612.0, height_pt: 792.0 };

/// One page-raster request. Zoom is integer percent; 100 renders the page
/// at one pixel per point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderRequest {
    pub page_index: u32,
    pub zoom_percent: u16,
}

impl Default for RenderRequest {
    fn default() -> Self {
        Self { page_index: 0, zoom_percent: 100 }
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
    #[error("unknown document handle {0}")]
    UnknownHandle(u64),
    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },
    #[error("encrypted PDFs are not supported")]
    Encrypted,
    #[error("backend error: {0}")]
    Backend(String),
}

/// The collaborator boundary the viewer talks to.
///
/// Handles are exclusively owned by the caller; releasing a handle twice is
/// an error rather than a silent no-op, so double-release bugs surface.
pub trait PdfEngine {
    fn open(&mut self, source: OpenSource) -> Result<DocumentHandle, EngineError>;
    fn page_count(&self, handle: DocumentHandle) -> Result<u32, EngineError>;
    fn page_size(
        &self,
        handle: DocumentHandle,
        page_index: u32,
    ) -> Result<PageSizePt, EngineError>;
    fn render_page(
        &self,
        handle: DocumentHandle,
        request: RenderRequest,
    ) -> Result<PageRaster, EngineError>;
    fn close(&mut self, handle: DocumentHandle) -> Result<(), EngineError>;
}

/// Raster dimensions for a page at a zoom percent. Zoom 0 is treated as 100.
pub fn raster_dimensions(size: PageSizePt, zoom_percent: u16) -> (u32, u32) {
    let multiplier = if zoom_percent == 0 { 1.0 } else { f32::from(zoom_percent) / 100.0 };

    let width = (size.width_pt * multiplier).round().max(1.0) as u32;
    let height = (size.height_pt * multiplier).round().max(1.0) as u32;

    (width, height)
}

/// Geometry-only backend built on lopdf.
///
/// Parses real page geometry but renders placeholder rasters: a white page
/// with a light border, sized exactly as the requested zoom dictates. Keeps
/// the whole pipeline exercisable where no PDFium library is present.
#[derive(Debug, Default)]
pub struct GeometryEngine {
    next_handle: u64,
    docs: HashMap<DocumentHandle, Vec<PageSizePt>>,
}

impl GeometryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn parse_page_sizes(bytes: &[u8]) -> Result<Vec<PageSizePt>, EngineError> {
        // lopdf cannot decrypt; reject up front instead of failing mid-parse.
        if bytes.windows("/Encrypt".len()).any(|window| window == b"/Encrypt") {
            return Err(EngineError::Encrypted);
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
                    Some(PageSizePt { width_pt: (x1 - x0).abs(), height_pt: (y1 - y0).abs() })
                })
                .unwrap_or(FALLBACK_PAGE_SIZE);

            sizes.push(size);
        }

        if sizes.is_empty() {
            return Err(EngineError::Backend("document has no pages".to_owned()));
        }

        Ok(sizes)
    }

    fn sizes(&self, handle: DocumentHandle) -> Result<&[PageSizePt], EngineError> {
        self.docs
            .get(&handle)
            .map(Vec::as_slice)
            .ok_or(EngineError::UnknownHandle(handle.raw()))
    }
}

impl PdfEngine for GeometryEngine {
    fn open(&mut self, source: OpenSource) -> Result<DocumentHandle, EngineError> {
        let bytes = match source {
            OpenSource::Path(path) => fs::read(path)?,
            OpenSource::Bytes(bytes) => bytes,
        };

        let sizes = Self::parse_page_sizes(&bytes)?;

        self.next_handle += 1;
        let handle = DocumentHandle(self.next_handle);
        log::debug!("opened document {} ({} pages)", handle.raw(), sizes.len());
        self.docs.insert(handle, sizes);

        Ok(handle)
    }

    fn page_count(&self, handle: DocumentHandle) -> Result<u32, EngineError> {
        Ok(self.sizes(handle)?.len() as u32)
    }

    fn page_size(
        &self,
        handle: DocumentHandle,
        page_index: u32,
    ) -> Result<PageSizePt, EngineError> {
        let sizes = self.sizes(handle)?;
        sizes.get(page_index as usize).copied().ok_or(EngineError::PageOutOfRange {
            page: page_index,
            page_count: sizes.len() as u32,
        })
    }

    fn render_page(
        &self,
        handle: DocumentHandle,
        request: RenderRequest,
    ) -> Result<PageRaster, EngineError> {
        let size = self.page_size(handle, request.page_index)?;
        let (width, height) = raster_dimensions(size, request.zoom_percent);

        let mut raster = PageRaster::from_pixel(width, height, Rgba([255, 255, 255, 255]));

        let border = Rgba([220, 220, 220, 255]);
        if width >= 4 && height >= 4 {
            for x in 0..width {
                raster.put_pixel(x, 0, border);
                raster.put_pixel(x, height - 1, border);
            }
            for y in 0..height {
                raster.put_pixel(0, y, border);
                raster.put_pixel(width - 1, y, border);
            }
        }

        Ok(raster)
    }

    fn close(&mut self, handle: DocumentHandle) -> Result<(), EngineError> {
        self.docs
            .remove(&handle)
            .map(|_| log::debug!("released document {}", handle.raw()))
            .ok_or(EngineError::UnknownHandle(handle.raw()))
    }
}

/// The backend the viewer prefers when compiled in.
pub fn default_engine() -> GeometryEngine {
    GeometryEngine::new()
}

#[cfg(feature = "pdfium")]
pub mod pdfium {
    //! PDFium-backed rasterization.

    use super::*;
    use pdfium_render::prelude::{
        PdfRenderConfig, Pdfium, PdfiumError, PdfDocument as PdfiumDocument,
    };

    /// Bind the PDFium native library.
    ///
    /// Search order: the executable's directory (app bundles), the current
    /// working directory, then system library paths.
    pub fn bind_library() -> Result<Pdfium, EngineError> {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|path| path.parent().map(Path::to_path_buf));

        if let Some(dir) = exe_dir {
            if let Ok(bindings) =
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir))
            {
                return Ok(Pdfium::new(bindings));
            }
        }

        Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map(Pdfium::new)
            .map_err(|err| EngineError::Backend(format!("failed to bind PDFium: {err}")))
    }

    /// Full-content backend over the PDFium native library.
    pub struct PdfiumEngine {
        pdfium: &'static Pdfium,
        next_handle: u64,
        docs: HashMap<DocumentHandle, PdfiumDocument<'static>>,
    }

    impl PdfiumEngine {
        /// Binds PDFium once for the process lifetime. The binding is leaked
        /// so open documents can borrow it for as long as the engine lives.
        pub fn new() -> Result<Self, EngineError> {
            let pdfium: &'static Pdfium = Box::leak(Box::new(bind_library()?));

            Ok(Self { pdfium, next_handle: 0, docs: HashMap::new() })
        }

        fn doc(&self, handle: DocumentHandle) -> Result<&PdfiumDocument<'static>, EngineError> {
            self.docs.get(&handle).ok_or(EngineError::UnknownHandle(handle.raw()))
        }

        fn open_error(err: PdfiumError) -> EngineError {
            EngineError::Backend(format!("PDFium could not load the document: {err}"))
        }
    }

    impl PdfEngine for PdfiumEngine {
        fn open(&mut self, source: OpenSource) -> Result<DocumentHandle, EngineError> {
            let document = match source {
                OpenSource::Path(path) => self
                    .pdfium
                    .load_pdf_from_file(&path, None)
                    .map_err(Self::open_error)?,
                OpenSource::Bytes(bytes) => {
                    // PDFium borrows the buffer for the document's lifetime.
                    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
                    self.pdfium
                        .load_pdf_from_byte_slice(bytes, None)
                        .map_err(Self::open_error)?
                }
            };

            self.next_handle += 1;
            let handle = DocumentHandle::from_raw(self.next_handle);
            log::debug!(
                "opened document {} ({} pages) via PDFium",
                handle.raw(),
                document.pages().len()
            );
            self.docs.insert(handle, document);

            Ok(handle)
        }

        fn page_count(&self, handle: DocumentHandle) -> Result<u32, EngineError> {
            Ok(u32::from(self.doc(handle)?.pages().len()))
        }

        fn page_size(
            &self,
            handle: DocumentHandle,
            page_index: u32,
        ) -> Result<PageSizePt, EngineError> {
            let document = self.doc(handle)?;
            let page_count = u32::from(document.pages().len());
            let index = u16::try_from(page_index)
                .map_err(|_| EngineError::PageOutOfRange { page: page_index, page_count })?;

            let page = document
                .pages()
                .get(index)
                .map_err(|_| EngineError::PageOutOfRange { page: page_index, page_count })?;

            Ok(PageSizePt { width_pt: page.width().value, height_pt: page.height().value })
        }

        fn render_page(
            &self,
            handle: DocumentHandle,
            request: RenderRequest,
        ) -> Result<PageRaster, EngineError> {
            let size = self.page_size(handle, request.page_index)?;
            let (width, height) = raster_dimensions(size, request.zoom_percent);

            let document = self.doc(handle)?;
            let page = document
                .pages()
                .get(request.page_index as u16)
                .map_err(|_| EngineError::PageOutOfRange {
                    page: request.page_index,
                    page_count: u32::from(document.pages().len()),
                })?;

            let config = PdfRenderConfig::new()
                .set_target_width(width as i32)
                .set_target_height(height as i32);

            let bitmap = page
                .render_with_config(&config)
                .map_err(|err| EngineError::Backend(format!("render failed: {err}")))?;

            let bitmap_width = bitmap.width() as u32;
            let bitmap_height = bitmap.height() as u32;
            let bytes = bitmap.as_rgba_bytes().to_vec();

            PageRaster::from_raw(bitmap_width, bitmap_height, bytes)
                .ok_or_else(|| EngineError::Backend("raster buffer size mismatch".to_owned()))
        }

        fn close(&mut self, handle: DocumentHandle) -> Result<(), EngineError> {
            self.docs
                .remove(&handle)
                .map(|_| log::debug!("released document {}", handle.raw()))
                .ok_or(EngineError::UnknownHandle(handle.raw()))
        }
    }
}
