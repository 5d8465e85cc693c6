//! Viewer application shell.
//!
//! Owns the engine, the session state, and the widgets. All session
//! mutations flow through [`ViewerApp::dispatch`]: the session returns
//! commands, and this module is the boundary that executes them (engine
//! calls, texture uploads, indicator text).

use crate::recent_files::RecentFiles;
use eframe::egui;
use paperdesk_engine::{DocumentHandle, EngineError, OpenSource, PdfEngine, RenderRequest};
use paperdesk_session::{parse_page_entry, Command, Session, SessionEvent};
use std::path::{Path, PathBuf};

pub struct ViewerApp {
    engine: Box<dyn PdfEngine>,
    session: Session,
    displayed: Option<DisplayedPage>,

    // Indicator widgets
    page_entry: String,
    page_count_label: String,
    zoom_label: String,
    status: String,

    error_dialog: Option<ErrorDialogState>,
    recent: RecentFiles,
    pending_open: Option<PathBuf>,
}

/// The one page texture held at a time; replaced on every page or zoom
/// change rather than cached.
struct DisplayedPage {
    texture: egui::TextureHandle,
    size: egui::Vec2,
}

struct ErrorDialogState {
    severity: ErrorSeverity,
    message: String,
}

#[derive(Clone, Copy, PartialEq)]
enum ErrorSeverity {
    Error,
    Warning,
}

impl ErrorSeverity {
    fn title(self) -> &'static str {
        match self {
            ErrorSeverity::Error => "Error",
            ErrorSeverity::Warning => "Warning",
        }
    }
}

impl ViewerApp {
    pub fn new(engine: Box<dyn PdfEngine>, initial_file: Option<PathBuf>) -> Self {
        let mut recent = RecentFiles::new();
        if let Err(err) = recent.load() {
            log::warn!("could not load recent files: {err}");
        }

        Self {
            engine,
            session: Session::new(),
            displayed: None,
            page_entry: String::new(),
            page_count_label: "/ -".to_owned(),
            zoom_label: "100%".to_owned(),
            status: "Ready".to_owned(),
            error_dialog: None,
            recent,
            pending_open: initial_file,
        }
    }

    fn show_error(&mut self, severity: ErrorSeverity, message: impl Into<String>) {
        self.error_dialog = Some(ErrorDialogState { severity, message: message.into() });
    }

    /// Run one session event and execute the commands it produces.
    fn dispatch(&mut self, ctx: &egui::Context, event: SessionEvent) {
        match self.session.apply(event) {
            Ok(transition) => {
                self.session = transition.session;
                for command in transition.commands {
                    self.run_command(ctx, command);
                }
            }
            Err(err) => {
                self.show_error(ErrorSeverity::Warning, err.to_string());
                self.restore_page_entry();
            }
        }
    }

    fn run_command(&mut self, ctx: &egui::Context, command: Command) {
        match command {
            Command::ReleaseDocument(handle) => {
                if let Err(err) = self.engine.close(handle) {
                    log::warn!("failed to release document {}: {err}", handle.raw());
                }
            }
            Command::RenderPage { handle, page_index, zoom_percent } => {
                self.render_page(ctx, handle, page_index, zoom_percent);
            }
            Command::UpdateIndicators { page_number, page_count, zoom_percent } => {
                self.page_entry = page_number.to_string();
                self.page_count_label = format!("/ {page_count}");
                self.zoom_label = format!("{zoom_percent}%");
            }
        }
    }

    fn render_page(
        &mut self,
        ctx: &egui::Context,
        handle: DocumentHandle,
        page_index: u32,
        zoom_percent: u16,
    ) {
        match self.engine.render_page(handle, RenderRequest { page_index, zoom_percent }) {
            Ok(raster) => {
                let image = egui::ColorImage::from_rgba_unmultiplied(
                    [raster.width() as usize, raster.height() as usize],
                    raster.as_raw(),
                );
                let texture = ctx.load_texture(
                    format!("page_{page_index}_{zoom_percent}"),
                    image,
                    egui::TextureOptions::LINEAR,
                );
                let size = egui::vec2(raster.width() as f32, raster.height() as f32);
                self.displayed = Some(DisplayedPage { texture, size });
            }
            Err(err) => {
                log::error!("failed to render page {page_index}: {err}");
                self.show_error(
                    ErrorSeverity::Error,
                    format!("Could not render page {}:\n{err}", page_index + 1),
                );
            }
        }
    }

    fn open_file_dialog(&mut self, ctx: &egui::Context) {
        if let Some(path) = rfd::FileDialog::new().add_filter("PDF", &["pdf"]).pick_file() {
            self.open_path(ctx, path);
        }
    }

    fn open_path(&mut self, ctx: &egui::Context, path: PathBuf) {
        match self.open_document(&path) {
            Ok((handle, page_count)) => {
                self.dispatch(ctx, SessionEvent::DocumentOpened { handle, page_count });

                let name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                ctx.send_viewport_cmd(egui::ViewportCommand::Title(format!("Paperdesk - {name}")));
                self.status = format!("Loaded {name} ({page_count} pages)");

                self.recent.add(&path);
                if let Err(err) = self.recent.save() {
                    log::warn!("could not save recent files: {err}");
                }
            }
            Err(err) => {
                log::error!("failed to open {}: {err}", path.display());
                self.show_error(ErrorSeverity::Error, format!("Could not open PDF:\n{err}"));
                self.status = "Failed to load document".to_owned();
            }
        }
    }

    /// Open plus page count as one step, so a half-opened document never
    /// leaks a handle.
    fn open_document(&mut self, path: &Path) -> Result<(DocumentHandle, u32), EngineError> {
        let handle = self.engine.open(OpenSource::from(path))?;

        match self.engine.page_count(handle) {
            Ok(page_count) => Ok((handle, page_count)),
            Err(err) => {
                let _ = self.engine.close(handle);
                Err(err)
            }
        }
    }

    fn commit_page_entry(&mut self, ctx: &egui::Context) {
        match parse_page_entry(&self.page_entry) {
            Ok(page_number) => self.dispatch(ctx, SessionEvent::GotoPage { page_number }),
            Err(err) => {
                self.show_error(ErrorSeverity::Warning, err.to_string());
                self.restore_page_entry();
            }
        }
    }

    fn restore_page_entry(&mut self) {
        if self.session.is_open() {
            self.page_entry = (self.session.page_index() + 1).to_string();
        }
    }

    fn handle_keyboard_shortcuts(&mut self, ctx: &egui::Context) {
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.error_dialog = None;
        }

        // Shortcuts must not fire while the page entry is being edited.
        if ctx.wants_keyboard_input() {
            return;
        }

        let mut events = Vec::new();
        ctx.input(|i| {
            if i.key_pressed(egui::Key::ArrowLeft) || i.key_pressed(egui::Key::PageUp) {
                events.push(SessionEvent::PreviousPage);
            }
            if i.key_pressed(egui::Key::ArrowRight) || i.key_pressed(egui::Key::PageDown) {
                events.push(SessionEvent::NextPage);
            }
            if i.key_pressed(egui::Key::Plus) || i.key_pressed(egui::Key::Equals) {
                events.push(SessionEvent::ZoomIn);
            }
            if i.key_pressed(egui::Key::Minus) {
                events.push(SessionEvent::ZoomOut);
            }
        });

        for event in events {
            self.dispatch(ctx, event);
        }
    }

    fn draw_toolbar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.add_space(8.0);

                if ui.button("📂 Open").clicked() {
                    self.open_file_dialog(ctx);
                }

                let mut open_recent: Option<PathBuf> = None;
                ui.add_enabled_ui(!self.recent.files().is_empty(), |ui| {
                    ui.menu_button("Recent", |ui| {
                        for path in self.recent.files().to_vec() {
                            let label = path
                                .file_name()
                                .map(|name| name.to_string_lossy().into_owned())
                                .unwrap_or_else(|| path.display().to_string());
                            if ui.button(label).clicked() {
                                open_recent = Some(path);
                                ui.close_menu();
                            }
                        }
                    });
                });
                if let Some(path) = open_recent {
                    self.open_path(ctx, path);
                }

                ui.separator();

                ui.add_enabled_ui(self.session.is_open(), |ui| {
                    if ui.button("◀").clicked() {
                        self.dispatch(ctx, SessionEvent::PreviousPage);
                    }

                    let entry = ui.add(
                        egui::TextEdit::singleline(&mut self.page_entry).desired_width(36.0),
                    );
                    if entry.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                        self.commit_page_entry(ctx);
                    }
                    ui.label(&self.page_count_label);

                    if ui.button("▶").clicked() {
                        self.dispatch(ctx, SessionEvent::NextPage);
                    }

                    ui.separator();

                    if ui.button("−").clicked() {
                        self.dispatch(ctx, SessionEvent::ZoomOut);
                    }
                    ui.label(&self.zoom_label);
                    if ui.button("+").clicked() {
                        self.dispatch(ctx, SessionEvent::ZoomIn);
                    }
                });
            });
        });
    }

    fn draw_viewport(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            if !self.session.is_open() {
                ui.centered_and_justified(|ui| {
                    ui.heading("Open a PDF to get started");
                });
                return;
            }

            egui::ScrollArea::both().auto_shrink([false, false]).show(ui, |ui| {
                if let Some(page) = &self.displayed {
                    // Center small pages in the viewport.
                    let available = ui.available_size();
                    let padding_x = ((available.x - page.size.x) / 2.0).max(0.0);
                    let padding_y = ((available.y - page.size.y) / 2.0).max(0.0);

                    ui.add_space(padding_y);
                    ui.horizontal(|ui| {
                        ui.add_space(padding_x);
                        ui.image(egui::load::SizedTexture::new(page.texture.id(), page.size));
                    });
                }
            });
        });
    }

    fn draw_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(&self.status);
            });
        });
    }

    fn draw_error_dialog(&mut self, ctx: &egui::Context) {
        let Some(dialog) = &self.error_dialog else {
            return;
        };

        let title = dialog.severity.title();
        let message = dialog.message.clone();

        let mut should_close = false;
        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(&message);
                ui.add_space(12.0);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Min), |ui| {
                    if ui.button("OK").clicked() {
                        should_close = true;
                    }
                });
            });

        if should_close {
            self.error_dialog = None;
        }
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some(path) = self.pending_open.take() {
            self.open_path(ctx, path);
        }

        self.handle_keyboard_shortcuts(ctx);
        self.draw_toolbar(ctx);
        self.draw_status_bar(ctx);
        // The central panel always comes after the outer panels.
        self.draw_viewport(ctx);
        self.draw_error_dialog(ctx);
    }
}

impl Drop for ViewerApp {
    fn drop(&mut self) {
        let session = std::mem::take(&mut self.session);
        if let Some(Command::ReleaseDocument(handle)) = session.into_release_command() {
            if let Err(err) = self.engine.close(handle) {
                log::warn!("failed to release document on exit: {err}");
            }
        }
    }
}
