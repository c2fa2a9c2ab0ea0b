//! XML preview panel

use eframe::egui;

use crate::app::MetadataEditorApp;

/// Read-only view of the document that export would produce
pub struct PreviewPanel;

impl PreviewPanel {
    /// Show the preview panel
    pub fn show(ui: &mut egui::Ui, app: &MetadataEditorApp) {
        let xml = app.editor.preview();

        ui.heading("XML Preview");
        ui.add_space(4.0);

        egui::ScrollArea::both()
            .id_salt("preview_scroll")
            .max_height(320.0)
            .show(ui, |ui| {
                ui.add(
                    egui::TextEdit::multiline(&mut xml.as_str())
                        .font(egui::TextStyle::Monospace)
                        .code_editor()
                        .desired_width(f32::INFINITY),
                );
            });
    }
}
