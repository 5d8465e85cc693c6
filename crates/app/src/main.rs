//! Paperdesk, a minimal desktop PDF viewer.
//!
//! Opens a file, renders pages to a scrollable canvas, navigates pages,
//! and zooms. Page rasterization is delegated to the engine crate.

mod recent_files;
mod viewer;

use eframe::egui;
use paperdesk_engine::PdfEngine;
use std::path::PathBuf;
use viewer::ViewerApp;

fn main() -> eframe::Result {
    env_logger::init();

    let initial_file = std::env::args_os().nth(1).map(PathBuf::from);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 700.0])
            .with_min_inner_size([640.0, 480.0])
            .with_title(format!("Paperdesk v{}", env!("CARGO_PKG_VERSION"))),
        ..Default::default()
    };

    eframe::run_native(
        "Paperdesk",
        options,
        Box::new(move |_cc| Ok(Box::new(ViewerApp::new(new_engine(), initial_file)))),
    )
}

/// Prefer PDFium; fall back to the geometry backend when the native
/// library is not present.
fn new_engine() -> Box<dyn PdfEngine> {
    match paperdesk_engine::pdfium::PdfiumEngine::new() {
        Ok(engine) => Box::new(engine),
        Err(err) => {
            log::warn!("PDFium unavailable ({err}); using the geometry backend");
            Box::new(paperdesk_engine::default_engine())
        }
    }
}
