//! PDF rasterisation: render every page to a `DynamicImage` via pdfium at a
//! density chosen for the run's viewport.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto a dedicated thread pool
//! thread designed for blocking operations, preventing the Tokio worker
//! threads from stalling during CPU-heavy rendering.
//!
//! ## Why pick a density per page?
//!
//! Rendering at a fixed DPI and resizing afterwards resamples twice and
//! blurs small text. Each page's point size is run through
//! [`select_density`] first, so pdfium produces the final pixel size
//! directly and later stages only correct rounding.
//!
//! ## Locating the library
//!
//! `PDFIUM_LIB_PATH` names the shared library explicitly. Otherwise the
//! platform library in the working directory is tried, then the system
//! library search path.

use super::fit::{select_density, REFERENCE_DENSITY};
use crate::config::{Style, VideoConfig, Viewport};
use crate::error::{PageError, Pdf2VideoError};
use crate::progress::ProgressCallback;
use image::DynamicImage;
use pdfium_render::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit pdfium shared library.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Result of rendering a whole document.
#[derive(Debug)]
pub struct RenderedDocument {
    /// The viewport the pages were rendered for.
    pub viewport: Viewport,
    /// `(page_index_0based, image)` in page order, failed pages omitted.
    pub pages: Vec<(usize, DynamicImage)>,
    /// Pages that were skipped.
    pub skipped: Vec<PageError>,
    /// Pages in the document.
    pub page_count: usize,
    /// First usable page size in pixels at reference density.
    pub native_size: (u32, u32),
}

/// What can be learned about a document without rendering it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub page_count: usize,
    /// First page size in points (1/72 in).
    pub first_page_points: Option<(f64, f64)>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub pdf_version: String,
}

/// Bind to the pdfium shared library.
pub fn bind_pdfium() -> Result<Pdfium, Pdf2VideoError> {
    match std::env::var_os(PDFIUM_LIB_PATH_ENV) {
        Some(path) => {
            let path = PathBuf::from(path);
            debug!("Binding pdfium from {}", path.display());
            Pdfium::bind_to_library(&path)
        }
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map(Pdfium::new)
    .map_err(|e| Pdf2VideoError::PdfiumBindingFailed(e.to_string()))
}

/// Map a pdfium load failure onto the password / corrupt-file errors.
fn load_error(pdf_path: &Path, password: Option<&str>, e: PdfiumError) -> Pdf2VideoError {
    let err_str = format!("{:?}", e);
    if err_str.contains("Password") || err_str.contains("password") {
        if password.is_some() {
            Pdf2VideoError::WrongPassword {
                path: pdf_path.to_path_buf(),
            }
        } else {
            Pdf2VideoError::PasswordRequired {
                path: pdf_path.to_path_buf(),
            }
        }
    } else {
        Pdf2VideoError::CorruptPdf {
            path: pdf_path.to_path_buf(),
            detail: err_str,
        }
    }
}

fn page_points(page: &PdfPage) -> (f64, f64) {
    (page.width().value as f64, page.height().value as f64)
}

fn valid_points((w, h): (f64, f64)) -> bool {
    w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0
}

/// Render every page of a PDF for `config`.
///
/// `auto` dimensions are resolved from the first page with a usable size,
/// measured at reference density.
pub async fn render_document(
    pdf_path: &Path,
    config: &VideoConfig,
) -> Result<RenderedDocument, Pdf2VideoError> {
    let path = pdf_path.to_path_buf();
    let config = config.clone();

    tokio::task::spawn_blocking(move || render_document_blocking(&path, &config))
        .await
        .map_err(|e| Pdf2VideoError::Internal(format!("Render task panicked: {}", e)))?
}

/// Blocking implementation of document rendering.
fn render_document_blocking(
    pdf_path: &Path,
    config: &VideoConfig,
) -> Result<RenderedDocument, Pdf2VideoError> {
    let pdfium = bind_pdfium()?;
    let password = config.password.as_deref();
    let document = pdfium
        .load_pdf_from_file(pdf_path, password)
        .map_err(|e| load_error(pdf_path, password, e))?;

    let pages = document.pages();
    let page_count = pages.len() as usize;
    info!("PDF loaded: {} pages", page_count);

    let native = pages
        .iter()
        .map(|p| page_points(&p))
        .find(|&size| valid_points(size))
        .ok_or_else(|| Pdf2VideoError::EmptySource {
            path: pdf_path.to_path_buf(),
            skipped: page_count,
        })?;
    let native_size = (native.0.round() as u32, native.1.round() as u32);
    let viewport = config.resolve_viewport(native_size)?;
    info!(
        "Rendering for {}x{} viewport ({} style)",
        viewport.width, viewport.height, config.style
    );

    let progress = config.progress_callback.clone();
    if let Some(cb) = &progress {
        cb.on_conversion_start(page_count);
    }
    let mut rendered = Vec::with_capacity(page_count);
    let mut skipped = Vec::new();

    for (idx, page) in pages.iter().enumerate() {
        match render_page(&page, idx, &viewport, config.style) {
            Ok(image) => {
                report_item(&progress, idx, page_count);
                rendered.push((idx, image));
            }
            Err(err) => {
                warn!("Skipping {}", err);
                skipped.push(err);
            }
        }
    }

    Ok(RenderedDocument {
        viewport,
        pages: rendered,
        skipped,
        page_count,
        native_size,
    })
}

fn report_item(progress: &Option<ProgressCallback>, idx: usize, total: usize) {
    if let Some(cb) = progress {
        cb.on_item_loaded(idx + 1, total);
    }
}

/// Render one page at the density the viewport calls for.
fn render_page(
    page: &PdfPage,
    idx: usize,
    vp: &Viewport,
    style: Style,
) -> Result<DynamicImage, PageError> {
    let (w, h) = page_points(page);
    let density = select_density(w, h, vp, style).map_err(|_| PageError::MalformedPage {
        page: idx + 1,
        width: w,
        height: h,
    })?;

    let render_config =
        PdfRenderConfig::new().scale_page_by_factor((density / REFERENCE_DENSITY) as f32);

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| PageError::RenderFailed {
            page: idx + 1,
            detail: format!("{:?}", e),
        })?;

    let image = bitmap.as_image();
    debug!(
        "Rendered page {} ({:.1}x{:.1} pt @ {:.1}) → {}x{} px",
        idx + 1,
        w,
        h,
        density,
        image.width(),
        image.height()
    );
    Ok(image)
}

/// Read page count, first page size and metadata without rendering.
pub async fn inspect_document(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentInfo, Pdf2VideoError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(|s| s.to_string());

    tokio::task::spawn_blocking(move || inspect_document_blocking(&path, pwd.as_deref()))
        .await
        .map_err(|e| Pdf2VideoError::Internal(format!("Inspect task panicked: {}", e)))?
}

/// Blocking implementation of document inspection.
fn inspect_document_blocking(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentInfo, Pdf2VideoError> {
    let pdfium = bind_pdfium()?;
    let document = pdfium
        .load_pdf_from_file(pdf_path, password)
        .map_err(|e| load_error(pdf_path, password, e))?;

    let metadata = document.metadata();
    let pages = document.pages();

    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    Ok(DocumentInfo {
        page_count: pages.len() as usize,
        first_page_points: pages.iter().next().map(|p| page_points(&p)),
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        pdf_version: format!("{:?}", document.version()),
    })
}
