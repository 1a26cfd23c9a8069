//! PDF Reader - continuous-scroll reader with a virtualized viewport.
//!
//! eframe shell wiring the reader session, the virtual list, and the
//! document engine together. Only pages in (or near) the visible window are
//! rasterized; the page input and the scroll position stay in sync through
//! the session's navigation controller.

use eframe::egui;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::{Duration, Instant};

mod loader;
mod logger;
mod recent_files;

use loader::{spawn_document_load, LoadedDocument, LoaderEvent};
use logger::AppLogger;
use pdf_engine::{DocumentEngine, DocumentHandle, OpenSource, OutlineItem, RenderRequest};
use pdf_reader_scheduler::Debouncer;
use pdf_reader_virtual_list::{VirtualList, VisibleRange};
use reader_core::{
    MountedPage, PageSize, PageTextureCache, ReaderError, ReaderSession, TextureKey,
};
use recent_files::RecentFiles;

const RESIZE_DEBOUNCE: Duration = Duration::from_millis(50);
/// Orientation flips settle slowly (animated rotation keeps resizing the
/// viewport); measure well after the flip.
const ORIENTATION_DEBOUNCE: Duration = Duration::from_millis(1000);

const OVERSCAN_PAGES: u32 = 2;
const PAGE_GAP: f32 = 12.0;
const PAGE_MARGIN: f32 = 16.0;
const TEXTURE_CACHE_CAPACITY: usize = 48;
const MAX_RENDER_WIDTH_PX: u32 = 4096;

fn main() -> eframe::Result {
    let logger = AppLogger::new(256);
    if let Err(err) = logger.clone().init() {
        eprintln!("could not install logger: {err}");
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 900.0])
            .with_min_inner_size([640.0, 480.0])
            .with_title("PDF Reader"),
        ..Default::default()
    };

    eframe::run_native(
        "PDF Reader",
        options,
        Box::new(move |cc| Ok(Box::new(PdfReaderApp::new(cc, logger)))),
    )
}

#[cfg(feature = "pdfium")]
fn build_engine() -> Box<dyn DocumentEngine> {
    match pdf_engine::pdfium_backend::PdfiumEngine::from_system_library() {
        Ok(engine) => Box::new(engine),
        Err(err) => {
            log::warn!("pdfium unavailable ({err}); using the structural renderer");
            Box::new(pdf_engine::default_engine())
        }
    }
}

#[cfg(not(feature = "pdfium"))]
fn build_engine() -> Box<dyn DocumentEngine> {
    Box::new(pdf_engine::default_engine())
}

/// Modal error dialog state
struct ErrorDialogState {
    message: String,
}

struct PdfReaderApp {
    // Document state
    engine: Box<dyn DocumentEngine>,
    document: Option<DocumentHandle>,
    outline: Vec<OutlineItem>,

    // View coordination
    session: ReaderSession,
    list: VirtualList,
    textures: PageTextureCache<egui::TextureHandle>,
    render_failures: HashSet<TextureKey>,
    mounted: Vec<u32>,

    // Background loading
    loader_sender: mpsc::Sender<LoaderEvent>,
    loader_events: mpsc::Receiver<LoaderEvent>,
    loading: bool,

    // Navigation input
    page_input: String,
    pending_scroll: Option<f32>,

    // Viewport change tracking
    resize_debounce: Debouncer,
    orientation_debounce: Debouncer,
    last_viewport_size: egui::Vec2,
    portrait: bool,

    // UI state
    error_dialog: Option<ErrorDialogState>,
    recent_files: RecentFiles,
    logger: AppLogger,
}

impl PdfReaderApp {
    fn new(_cc: &eframe::CreationContext<'_>, logger: AppLogger) -> Self {
        let (loader_sender, loader_events) = mpsc::channel();

        let mut recent_files = RecentFiles::new();
        if let Err(err) = recent_files.load() {
            log::warn!("could not load recent files: {err}");
        }

        Self {
            engine: build_engine(),
            document: None,
            outline: Vec::new(),
            session: ReaderSession::new(),
            list: VirtualList::new(0, OVERSCAN_PAGES),
            textures: PageTextureCache::new(TEXTURE_CACHE_CAPACITY),
            render_failures: HashSet::new(),
            mounted: Vec::new(),
            loader_sender,
            loader_events,
            loading: false,
            page_input: String::new(),
            pending_scroll: None,
            resize_debounce: Debouncer::new(RESIZE_DEBOUNCE),
            orientation_debounce: Debouncer::new(ORIENTATION_DEBOUNCE),
            last_viewport_size: egui::Vec2::ZERO,
            portrait: false,
            error_dialog: None,
            recent_files,
            logger,
        }
    }

    fn show_error(&mut self, message: impl Into<String>) {
        self.error_dialog = Some(ErrorDialogState { message: message.into() });
    }

    /// Open a PDF file using the file picker
    fn open_file_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new().add_filter("PDF", &["pdf"]).pick_file() {
            self.open_path(path);
        }
    }

    /// Kick off a background load; a load already in flight is superseded.
    fn open_path(&mut self, path: PathBuf) {
        let ticket = self.session.begin_load();
        self.loading = true;
        log::info!("loading {}", path.display());
        spawn_document_load(path, ticket, self.loader_sender.clone());
    }

    fn drain_loader_events(&mut self) {
        while let Ok(event) = self.loader_events.try_recv() {
            match event {
                LoaderEvent::Loaded(document) => self.install_document(*document),
                LoaderEvent::Failed { generation, error } => {
                    if !self.session.is_current_load(generation) {
                        continue;
                    }
                    self.loading = false;
                    log::error!("{error}");
                    self.show_error(error.to_string());
                }
            }
        }
    }

    /// Swap in a freshly loaded document. The session rejects stale
    /// generations, so a superseded load can never replace a newer one.
    fn install_document(&mut self, document: LoadedDocument) {
        if !self.session.is_current_load(document.generation) {
            return;
        }

        let mut engine = build_engine();
        let handle = match engine.open(OpenSource::Bytes(document.bytes)) {
            Ok(handle) => handle,
            Err(err) => {
                let error = ReaderError::DocumentLoad { reason: err.to_string() };
                log::error!("{error}");
                self.loading = false;
                self.show_error(error.to_string());
                return;
            }
        };

        if !self.session.publish(document.generation, document.sizes) {
            return;
        }

        self.engine = engine;
        self.document = Some(handle);
        self.outline = document.outline;
        self.list.reset(self.session.page_count());
        self.textures.clear();
        self.render_failures.clear();
        self.mounted.clear();
        self.page_input = self.session.navigation().display_text();
        self.pending_scroll = Some(0.0);
        self.loading = false;

        self.recent_files.add(&document.path);
        if let Err(err) = self.recent_files.save() {
            log::warn!("could not save recent files: {err}");
        }

        log::info!(
            "loaded {} ({} pages, {} outline entries)",
            document.path.display(),
            self.session.page_count(),
            self.outline.len()
        );
    }

    /// Commit the page input. Invalid and out-of-range values are ignored and
    /// the committed page is redisplayed.
    fn submit_page_input(&mut self) {
        match self.page_input.trim().parse::<u32>() {
            Ok(page) => {
                if let Some(command) = self.session.navigation_mut().request_page(page) {
                    self.apply_scroll(command.item_index);
                } else {
                    log::debug!("ignoring navigation to page {page}");
                }
            }
            Err(_) => {
                log::debug!("ignoring non-numeric page input {:?}", self.page_input);
            }
        }

        self.page_input = self.session.navigation().display_text();
    }

    fn navigate_step(&mut self, delta: i64) {
        if let Some(command) = self.session.navigation_mut().request_step(delta) {
            self.apply_scroll(command.item_index);
            self.page_input = self.session.navigation().display_text();
        }
    }

    fn apply_scroll(&mut self, item_index: u32) {
        let session = &self.session;
        let offset = self.list.scroll_to_item(item_index, |i| session.row_height(i) + PAGE_GAP);
        self.pending_scroll = Some(offset);
    }

    /// Re-estimate the responsive scale from the current page's mounted
    /// measurement; on change, every row height is invalidated.
    fn run_remeasure(&mut self) -> bool {
        if self.session.remeasure_current_page() {
            self.list.invalidate_from(0);
            log::info!("responsive scale now {:.3}", self.session.scale());
            true
        } else {
            false
        }
    }
}

impl eframe::App for PdfReaderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_loader_events();
        self.handle_keyboard_shortcuts(ctx);
        self.draw_toolbar(ctx);
        self.draw_status_bar(ctx);
        self.draw_viewport(ctx);
        self.draw_error_dialog(ctx);

        if self.loading {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

impl PdfReaderApp {
    fn handle_keyboard_shortcuts(&mut self, ctx: &egui::Context) {
        let modifiers = ctx.input(|i| i.modifiers);
        let cmd_or_ctrl = modifiers.command || modifiers.ctrl;

        let (open_pressed, next_pressed, prev_pressed) = ctx.input(|i| {
            (
                cmd_or_ctrl && i.key_pressed(egui::Key::O),
                i.key_pressed(egui::Key::PageDown),
                i.key_pressed(egui::Key::PageUp),
            )
        });

        if open_pressed {
            self.open_file_dialog();
        }

        // Paging keys belong to the focused text input while one is active.
        if ctx.wants_keyboard_input() {
            return;
        }
        if next_pressed {
            self.navigate_step(1);
        }
        if prev_pressed {
            self.navigate_step(-1);
        }
    }

    fn draw_toolbar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.add_space(8.0);

                ui.menu_button("📂 Open", |ui| {
                    if ui.button("Browse…").clicked() {
                        ui.close_menu();
                        self.open_file_dialog();
                    }

                    let recents: Vec<PathBuf> = self.recent_files.files().to_vec();
                    if !recents.is_empty() {
                        ui.separator();
                        for path in recents {
                            let label = path
                                .file_name()
                                .map(|name| name.to_string_lossy().into_owned())
                                .unwrap_or_else(|| path.display().to_string());
                            if ui.button(label).clicked() {
                                ui.close_menu();
                                self.open_path(path);
                            }
                        }

                        ui.separator();
                        if ui.button("Clear Recent").clicked() {
                            ui.close_menu();
                            self.recent_files.clear();
                            if let Err(err) = self.recent_files.save() {
                                log::warn!("could not save recent files: {err}");
                            }
                        }
                    }
                });

                ui.separator();

                let ready = self.session.navigation().is_ready();
                ui.add_enabled_ui(ready, |ui| {
                    if ui.button("◀").clicked() {
                        self.navigate_step(-1);
                    }

                    let response = ui.add(
                        egui::TextEdit::singleline(&mut self.page_input).desired_width(48.0),
                    );
                    if response.lost_focus() {
                        self.submit_page_input();
                    }

                    let total_text = if ready {
                        format!("/ {}", self.session.navigation().page_count())
                    } else {
                        "— / —".to_string()
                    };
                    ui.label(total_text);

                    if ui.button("▶").clicked() {
                        self.navigate_step(1);
                    }
                });

                if self.loading {
                    ui.separator();
                    ui.spinner();
                    ui.label("Loading…");
                }
            });
        });
    }

    fn draw_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let latest = self.logger.latest_message().unwrap_or_else(|| "Ready".to_string());
                let history: Vec<String> = self
                    .logger
                    .entries()
                    .iter()
                    .rev()
                    .take(8)
                    .map(|entry| {
                        format!(
                            "{} {} {}",
                            entry.timestamp.format("%H:%M:%S"),
                            entry.level,
                            entry.message
                        )
                    })
                    .collect();

                let response = ui.weak(latest);
                if !history.is_empty() {
                    response.on_hover_text(history.join("\n"));
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if self.session.navigation().is_ready() {
                        ui.weak(format!(
                            "{} pages · scale {:.2}",
                            self.session.page_count(),
                            self.session.scale()
                        ));
                    }
                });
            });
        });
    }

    fn draw_viewport(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.document.is_none() {
                ui.centered_and_justified(|ui| {
                    if self.loading {
                        ui.spinner();
                    } else {
                        ui.heading("Open a PDF to get started");
                    }
                });
                return;
            }

            if self.session.page_count() == 0 {
                ui.centered_and_justified(|ui| {
                    ui.weak("This document has no pages");
                });
                return;
            }

            let viewport_size = ui.available_size();
            self.track_viewport_change(ctx, viewport_size);

            let mut scroll_area = egui::ScrollArea::vertical().auto_shrink([false, false]);
            if let Some(offset) = self.pending_scroll.take() {
                scroll_area = scroll_area.vertical_scroll_offset(offset);
            }

            scroll_area.show_viewport(ui, |ui, viewport| {
                self.draw_page_rows(ui, viewport);
            });
        });
    }

    /// Feed viewport size changes into the debouncers and run the re-measure
    /// when one fires. A plain resize and an aspect flip (orientation change)
    /// settle on different clocks.
    fn track_viewport_change(&mut self, ctx: &egui::Context, size: egui::Vec2) {
        let now = Instant::now();

        if self.last_viewport_size == egui::Vec2::ZERO {
            self.last_viewport_size = size;
            self.portrait = size.y >= size.x;
        } else if size != self.last_viewport_size {
            let portrait = size.y >= size.x;
            if portrait != self.portrait {
                self.portrait = portrait;
                self.orientation_debounce.poke(now);
            } else {
                self.resize_debounce.poke(now);
            }
            self.last_viewport_size = size;
        }

        let resize_fired = self.resize_debounce.fire_ready(now);
        let orientation_fired = self.orientation_debounce.fire_ready(now);
        if (resize_fired || orientation_fired) && self.run_remeasure() {
            ctx.request_repaint();
        }

        // Keep frames coming while a fire is pending; egui repaints on input
        // only.
        if self.resize_debounce.is_armed() || self.orientation_debounce.is_armed() {
            ctx.request_repaint_after(Duration::from_millis(25));
        }
    }

    fn draw_page_rows(&mut self, ui: &mut egui::Ui, viewport: egui::Rect) {
        let total = {
            let session = &self.session;
            self.list.total_extent(|i| session.row_height(i) + PAGE_GAP)
        };
        ui.set_height(total);

        let scroll_offset = viewport.min.y.max(0.0);
        let (render, visible) = {
            let session = &self.session;
            let render = self.list.render_range(scroll_offset, viewport.height(), |i| {
                session.row_height(i) + PAGE_GAP
            });
            let visible = self.list.visible_range(scroll_offset, viewport.height(), |i| {
                session.row_height(i) + PAGE_GAP
            });
            (render, visible)
        };

        let available_width = ui.available_width();

        if let Some(range) = render {
            self.sync_mounted(range);
            for index in range.iter() {
                let top = {
                    let session = &self.session;
                    self.list.item_offset(index, |i| session.row_height(i) + PAGE_GAP)
                };
                self.draw_page_row(ui, index, top, available_width);
            }
        }

        if let Some(range) = visible {
            if self.session.navigation_mut().observe_top_page(range.first) {
                self.page_input = self.session.navigation().display_text();
            }
        }
    }

    /// Clear measurements for pages that scrolled out of the mounted window.
    fn sync_mounted(&mut self, range: VisibleRange) {
        let previous = std::mem::take(&mut self.mounted);
        for index in previous {
            if !range.contains(index) {
                self.session.record_page_unmounted(index);
            }
        }
        self.mounted = range.iter().collect();
    }

    fn draw_page_row(&mut self, ui: &mut egui::Ui, index: u32, top: f32, available_width: f32) {
        let origin = ui.min_rect().left_top();
        let row_height = self.session.row_height(index);

        let drawn_width = (available_width - 2.0 * PAGE_MARGIN).max(50.0);
        let drawn_height = match self.session.dimensions().get(index) {
            Some(native) if native.width > 0.0 && native.height > 0.0 => {
                drawn_width * native.height / native.width
            }
            _ => row_height.max(1.0),
        };

        let rect = egui::Rect::from_min_size(
            egui::pos2(origin.x + (available_width - drawn_width) / 2.0, origin.y + top),
            egui::vec2(drawn_width, drawn_height),
        );

        self.session.record_page_mounted(
            index,
            MountedPage { width_px: drawn_width, height_px: drawn_height },
        );

        let Some(native) = self.session.dimensions().get(index) else {
            ui.painter().rect_filled(rect, 2.0, ui.visuals().widgets.inactive.bg_fill);
            return;
        };

        let pixels_per_point = ui.ctx().pixels_per_point();
        let width_px =
            ((drawn_width * pixels_per_point).round() as u32).clamp(1, MAX_RENDER_WIDTH_PX);
        let key = TextureKey { page_index: index, width_px };

        let ctx = ui.ctx().clone();
        self.ensure_texture(&ctx, key, native);

        match self.textures.get(key) {
            Some(texture) => {
                ui.painter().image(
                    texture.id(),
                    rect,
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
            }
            None => {
                // Render failed (or is unavailable); the row keeps its space
                // and siblings are unaffected.
                ui.painter().rect_filled(rect, 2.0, ui.visuals().widgets.inactive.bg_fill);
            }
        }
    }

    /// Rasterize one page into the texture cache if it is not already there.
    /// Failures are logged once per key and the row paints a placeholder.
    fn ensure_texture(&mut self, ctx: &egui::Context, key: TextureKey, native: PageSize) {
        if self.textures.contains(key) || self.render_failures.contains(&key) {
            return;
        }
        let Some(handle) = self.document else {
            return;
        };

        let scale = key.width_px as f32 / native.width.max(1.0);
        let request = RenderRequest { page_index: key.page_index, scale };

        match self.engine.render_page(handle, request) {
            Ok(image) => {
                let size = [image.width() as usize, image.height() as usize];
                let pixels = egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw());
                let texture = ctx.load_texture(
                    format!("page_{}_{}", key.page_index, key.width_px),
                    pixels,
                    egui::TextureOptions::LINEAR,
                );
                self.textures.insert(key, texture);

                // The last page's first render marks layout as settled; run
                // one re-measure cycle on that signal.
                if self.session.note_page_rendered(key.page_index) && self.run_remeasure() {
                    ctx.request_repaint();
                }
            }
            Err(err) => {
                self.render_failures.insert(key);
                let error =
                    ReaderError::PageRender { page: key.page_index + 1, reason: err.to_string() };
                log::warn!("{error}");
            }
        }
    }

    fn draw_error_dialog(&mut self, ctx: &egui::Context) {
        let Some(error) = &self.error_dialog else {
            return;
        };
        let message = error.message.clone();

        let mut should_close = false;
        egui::Window::new("❌ Error")
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
