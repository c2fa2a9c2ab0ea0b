//! Main application state and UI coordination

use std::sync::Arc;

use eframe::egui;

use crate::core::config::AppConfig;
use crate::core::file_system;
use crate::core::record::Record;
use crate::orchestrator::{Notice, NoticeLevel, Orchestrator};
use crate::remote::{HttpStore, MemoryStore, RemoteError, RemoteRequest, RemoteStore, RemoteWorker};
use crate::ui::file_list::FileListPanel;
use crate::ui::preview::PreviewPanel;
use crate::ui::table::{BaselineTable, CellEdit, RecordTable};

/// Main application state
pub struct MetadataEditorApp {
    /// Session, filename, and remote state
    pub editor: Orchestrator,
    /// Runs remote store calls in the background
    worker: RemoteWorker,
    /// Application configuration
    pub config: AppConfig,
    /// True when documents are kept in memory instead of a server
    pub offline: bool,
    /// Whether the file list sidebar is visible
    pub sidebar_visible: bool,
    /// Cell currently being edited
    pub editing: Option<CellEdit>,
    /// Remote file awaiting delete confirmation
    pub pending_delete: Option<String>,
    /// Latest batch of messages for the status bar
    status: Vec<Notice>,
}

impl MetadataEditorApp {
    /// Create a new application instance
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        // Load config or use defaults
        let config = AppConfig::load().unwrap_or_else(|e| {
            tracing::warn!("Using default config: {:#}", e);
            AppConfig::default()
        });

        Self::configure_style(&cc.egui_ctx, &config);

        let (store, offline) = Self::open_store(&config);
        let ctx = cc.egui_ctx.clone();
        let worker = RemoteWorker::spawn(store, move || ctx.request_repaint());

        let mut app = Self {
            editor: Orchestrator::new(Record::sample_set(), config.last_filename.clone()),
            worker,
            config,
            offline,
            sidebar_visible: true,
            editing: None,
            pending_delete: None,
            status: Vec::new(),
        };

        app.refresh_files();
        app
    }

    /// Pick the HTTP store when a URL is configured, else the in-memory one
    fn open_store(config: &AppConfig) -> (Arc<dyn RemoteStore>, bool) {
        if let Some(url) = config.api_url() {
            match HttpStore::new(url) {
                Ok(store) => return (Arc::new(store), false),
                Err(e) => tracing::error!("Failed to open document store: {}", e),
            }
        }
        tracing::info!("No document store configured, keeping files in memory");
        (Arc::new(MemoryStore::new()), true)
    }

    /// Apply theme and font size from the config
    fn configure_style(ctx: &egui::Context, config: &AppConfig) {
        if config.ui.theme == "dark" {
            ctx.set_visuals(egui::Visuals::dark());
        } else {
            ctx.set_visuals(egui::Visuals::light());
        }

        let size = config.editor.font_size;
        ctx.style_mut(|style| {
            for text_style in [egui::TextStyle::Body, egui::TextStyle::Monospace, egui::TextStyle::Button] {
                if let Some(font) = style.text_styles.get_mut(&text_style) {
                    font.size = size;
                }
            }
        });
    }

    /// Hand a request to the worker. If the worker is gone, fail it locally.
    fn dispatch(&mut self, request: Option<RemoteRequest>) {
        let mut next = request;
        while let Some(request) = next.take() {
            if let Err(request) = self.worker.submit(request) {
                tracing::error!("Remote worker is not running");
                let error = RemoteError::Connection("remote worker stopped".to_string());
                next = self.editor.complete(request.fail(error));
            }
        }
    }

    /// Apply finished remote calls and collect messages for the status bar
    fn pump(&mut self) {
        for completion in self.worker.poll() {
            let follow_up = self.editor.complete(completion);
            self.dispatch(follow_up);
        }
        if !self.worker.is_running() && self.editor.is_loading() {
            self.editor
                .abort(RemoteError::Connection("remote worker stopped".to_string()));
        }

        let notices = self.editor.take_notices();
        if !notices.is_empty() {
            self.status = notices;
        }

        if self.config.last_filename != self.editor.filename() {
            self.config.last_filename = self.editor.filename().to_string();
            self.save_config();
        }
    }

    fn save_config(&self) {
        if let Err(e) = self.config.save() {
            tracing::error!("Failed to save config: {:#}", e);
        }
    }

    fn set_status(&mut self, level: NoticeLevel, message: String) {
        self.status = vec![Notice { level, message }];
    }

    /// Ask the store for its file list
    pub fn refresh_files(&mut self) {
        let request = self.editor.request_list();
        self.dispatch(request);
    }

    /// Upload the current rows under the active filename
    pub fn save_to_server(&mut self) {
        let request = self.editor.request_save();
        self.dispatch(request);
    }

    /// Replace the session with a stored document
    pub fn load_from_server(&mut self, filename: &str) {
        self.editing = None;
        let request = self.editor.request_load(filename);
        self.dispatch(request);
    }

    /// Remove a stored document (after confirmation)
    pub fn delete_from_server(&mut self, filename: &str) {
        let request = self.editor.request_delete(filename);
        self.dispatch(request);
    }

    /// Pick a local XML file and replace the session with it
    pub fn import_file(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("XML", &["xml"])
            .pick_file()
        else {
            return;
        };

        if !file_system::is_xml(&path) {
            tracing::warn!("Importing file without .xml extension: {}", path.display());
        }

        match file_system::read_document(&path) {
            Ok(text) => {
                self.editing = None;
                let name = file_system::display_name(&path);
                if let Ok(count) = self.editor.import(&name, &text) {
                    self.set_status(NoticeLevel::Info, format!("Imported {} rows from {}", count, name));
                }
            }
            Err(e) => {
                tracing::error!("{:#}", e);
                self.set_status(NoticeLevel::Error, format!("{:#}", e));
            }
        }
    }

    /// Write the current document to a local file
    pub fn export_file(&mut self) {
        let (filename, xml) = self.editor.export();
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(filename.as_str())
            .add_filter("XML", &["xml"])
            .save_file()
        else {
            return;
        };

        match file_system::write_document(&path, &xml) {
            Ok(()) => self.set_status(
                NoticeLevel::Info,
                format!("Exported {}", file_system::display_name(&path)),
            ),
            Err(e) => {
                tracing::error!("{:#}", e);
                self.set_status(NoticeLevel::Error, format!("{:#}", e));
            }
        }
    }

    fn save_changes(&mut self) {
        self.editing = None;
        self.editor.save_changes();
    }

    fn reset(&mut self) {
        self.editing = None;
        self.editor.reset();
    }

    fn add_row(&mut self) {
        self.editor.add_row();
    }

    /// Render the top menu bar
    fn render_menu_bar(&mut self, ctx: &egui::Context) {
        let loading = self.editor.is_loading();

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Import XML...").clicked() {
                        self.import_file();
                        ui.close();
                    }
                    if ui.button("Export XML...").clicked() {
                        self.export_file();
                        ui.close();
                    }
                    ui.separator();
                    if ui
                        .add_enabled(!loading, egui::Button::new("Save to Server"))
                        .clicked()
                    {
                        self.save_to_server();
                        ui.close();
                    }
                    if ui
                        .add_enabled(!loading, egui::Button::new("Refresh Saved Files"))
                        .clicked()
                    {
                        self.refresh_files();
                        ui.close();
                    }
                    ui.separator();
                    if ui.button("Exit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("Edit", |ui| {
                    if ui.button("Add Row").clicked() {
                        self.add_row();
                        ui.close();
                    }
                    if ui.button("Save Changes").clicked() {
                        self.save_changes();
                        ui.close();
                    }
                    if ui.button("Reset").clicked() {
                        self.reset();
                        ui.close();
                    }
                });

                ui.menu_button("View", |ui| {
                    if ui.button("Toggle Sidebar").clicked() {
                        self.sidebar_visible = !self.sidebar_visible;
                        ui.close();
                    }
                    if ui
                        .checkbox(&mut self.config.ui.show_comparison, "Show Original")
                        .changed()
                    {
                        self.save_config();
                    }
                    if ui
                        .checkbox(&mut self.config.editor.show_preview, "Show XML Preview")
                        .changed()
                    {
                        self.save_config();
                    }
                });
            });
        });
    }

    /// Render filename field and action buttons
    fn render_toolbar(&mut self, ui: &mut egui::Ui) {
        let loading = self.editor.is_loading();

        ui.horizontal(|ui| {
            ui.heading("XML Metadata Editor");
            if self.editor.is_dirty() {
                ui.colored_label(egui::Color32::from_rgb(230, 150, 40), "\u{25CF} Unsaved changes");
            }
            if loading {
                ui.spinner();
            }
        });

        ui.horizontal(|ui| {
            ui.label("Filename:");
            let mut filename = self.editor.filename().to_string();
            if ui
                .add(egui::TextEdit::singleline(&mut filename).desired_width(200.0))
                .changed()
            {
                self.editor.set_filename(filename);
            }

            ui.separator();

            if ui.button("Import").clicked() {
                self.import_file();
            }
            if ui.button("Export").clicked() {
                self.export_file();
            }
            if ui
                .add_enabled(!loading, egui::Button::new("Save to Server"))
                .clicked()
            {
                self.save_to_server();
            }

            ui.separator();

            if ui.button("Add Row").clicked() {
                self.add_row();
            }
            let dirty = self.editor.is_dirty();
            if ui.add_enabled(dirty, egui::Button::new("Save")).clicked() {
                self.save_changes();
            }
            if ui.add_enabled(dirty, egui::Button::new("Reset")).clicked() {
                self.reset();
            }
            let label = if self.config.ui.show_comparison {
                "Hide Original"
            } else {
                "Compare"
            };
            if ui.button(label).clicked() {
                self.config.ui.show_comparison = !self.config.ui.show_comparison;
                self.save_config();
            }
        });
    }

    fn notice_color(ui: &egui::Ui, level: NoticeLevel) -> egui::Color32 {
        match level {
            NoticeLevel::Info => ui.visuals().text_color(),
            NoticeLevel::Warning => egui::Color32::from_rgb(230, 150, 40),
            NoticeLevel::Error => ui.visuals().error_fg_color,
        }
    }

    /// Render the status bar at the bottom
    fn render_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                match Notice::most_severe(&self.status) {
                    Some(notice) => {
                        let color = Self::notice_color(ui, notice.level);
                        ui.colored_label(color, &notice.message);
                        if self.status.len() > 1 {
                            ui.weak(format!("(+{} more)", self.status.len() - 1))
                                .on_hover_ui(|ui| {
                                    for notice in &self.status {
                                        let color = Self::notice_color(ui, notice.level);
                                        ui.colored_label(color, &notice.message);
                                    }
                                });
                        }
                    }
                    None => {
                        ui.weak("Ready");
                    }
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.weak(format!("{} rows", self.editor.session().records().len()));
                });
            });
        });
    }

    /// Ask before deleting a remote file
    fn render_delete_confirmation(&mut self, ctx: &egui::Context) {
        let Some(filename) = self.pending_delete.clone() else {
            return;
        };

        let mut decision = None;
        egui::Window::new("Delete file")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(format!("Delete {}?", filename));
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Delete").clicked() {
                        decision = Some(true);
                    }
                    if ui.button("Cancel").clicked() {
                        decision = Some(false);
                    }
                });
            });

        if let Some(confirmed) = decision {
            self.pending_delete = None;
            if confirmed {
                self.delete_from_server(&filename);
            }
        }
    }
}

impl eframe::App for MetadataEditorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.pump();

        // Handle keyboard shortcuts
        let (save, toggle_sidebar, add_row) = ctx.input(|i| {
            (
                i.modifiers.command && i.key_pressed(egui::Key::S),
                i.modifiers.command && i.key_pressed(egui::Key::B),
                i.modifiers.command && i.key_pressed(egui::Key::N),
            )
        });
        if save {
            self.save_changes();
        }
        if toggle_sidebar {
            self.sidebar_visible = !self.sidebar_visible;
        }
        if add_row {
            self.add_row();
        }

        self.render_menu_bar(ctx);
        self.render_status_bar(ctx);

        // Render sidebar with remote files
        if self.sidebar_visible {
            egui::SidePanel::left("sidebar")
                .resizable(true)
                .default_width(self.config.ui.sidebar_width)
                .min_width(150.0)
                .show(ctx, |ui| {
                    FileListPanel::show(ui, self);
                });
        }

        // Render main content area
        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_toolbar(ui);
            ui.separator();

            egui::ScrollArea::vertical()
                .id_salt("content_scroll")
                .show(ui, |ui| {
                    if self.config.ui.show_comparison {
                        ui.strong("Current Version");
                    }
                    RecordTable::show(ui, self);

                    if self.config.ui.show_comparison {
                        ui.add_space(12.0);
                        ui.strong("Original Version");
                        BaselineTable::show(ui, self.editor.session().baseline());
                    }

                    if self.config.editor.show_preview {
                        ui.add_space(12.0);
                        ui.separator();
                        PreviewPanel::show(ui, self);
                    }
                });
        });

        self.render_delete_confirmation(ctx);
    }
}
