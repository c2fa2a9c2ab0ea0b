//! Remote file list panel

use eframe::egui;

use crate::app::MetadataEditorApp;

/// Sidebar listing documents in the remote store
pub struct FileListPanel;

impl FileListPanel {
    /// Show the file list panel
    pub fn show(ui: &mut egui::Ui, app: &mut MetadataEditorApp) {
        let loading = app.editor.is_loading();

        ui.vertical(|ui| {
            // Header
            ui.horizontal(|ui| {
                ui.heading("Saved Files");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui
                        .add_enabled(!loading, egui::Button::new("\u{21BB}"))
                        .on_hover_text("Refresh")
                        .clicked()
                    {
                        app.refresh_files();
                    }
                    if loading {
                        ui.spinner();
                    }
                });
            });

            if app.offline {
                ui.weak("Offline: files are kept in memory");
            }

            ui.separator();

            let files = app.editor.files().to_vec();
            let active = app.editor.filename().to_string();

            egui::ScrollArea::vertical()
                .id_salt("file_list_scroll")
                .show(ui, |ui| {
                    if files.is_empty() {
                        ui.label("No saved files");
                        return;
                    }
                    for name in &files {
                        Self::show_file(ui, app, name, name == &active, loading);
                    }
                });
        });
    }

    /// Show one file row with load and delete actions
    fn show_file(
        ui: &mut egui::Ui,
        app: &mut MetadataEditorApp,
        name: &str,
        is_active: bool,
        loading: bool,
    ) {
        ui.horizontal(|ui| {
            let label = format!("\u{1F4C4} {}", name);
            if ui
                .selectable_label(is_active, label)
                .on_hover_text("Load")
                .double_clicked()
                && !loading
            {
                app.load_from_server(name);
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui
                    .add_enabled(!loading, egui::Button::new("\u{2716}"))
                    .on_hover_text("Delete")
                    .clicked()
                {
                    app.pending_delete = Some(name.to_string());
                }
                if ui
                    .add_enabled(!loading, egui::Button::new("Load"))
                    .clicked()
                {
                    app.load_from_server(name);
                }
            });
        });
    }
}
