//! Record tables: the editable current rows and the read-only baseline

use eframe::egui;
use egui_extras::{Column, TableBuilder};

use crate::app::MetadataEditorApp;
use crate::core::record::{Field, Record};

/// A cell being edited and its uncommitted text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellEdit {
    pub id: u64,
    pub field: Field,
    pub buffer: String,
    focused: bool,
}

impl CellEdit {
    fn new(id: u64, field: Field, buffer: String) -> Self {
        Self {
            id,
            field,
            buffer,
            focused: false,
        }
    }

    fn is(&self, id: u64, field: Field) -> bool {
        self.id == id && self.field == field
    }
}

enum RowAction {
    StartEdit(u64, Field, String),
    Commit(u64, Field, String),
    Cancel,
    Delete(u64),
}

/// Editable table of the current rows
pub struct RecordTable;

impl RecordTable {
    /// Show the table and apply any edits made this frame
    pub fn show(ui: &mut egui::Ui, app: &mut MetadataEditorApp) {
        let records = app.editor.session().records().to_vec();
        let mut actions = Vec::new();
        let editing = &mut app.editing;

        ui.push_id("current_table", |ui| {
            TableBuilder::new(ui)
                .striped(true)
                .vscroll(false)
                .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
                .column(Column::initial(160.0).at_least(80.0).resizable(true))
                .column(Column::initial(260.0).at_least(100.0).resizable(true))
                .column(Column::remainder().at_least(120.0))
                .column(Column::exact(60.0))
                .header(24.0, |mut header| {
                    for field in Field::ALL {
                        header.col(|ui| {
                            ui.strong(field.label());
                        });
                    }
                    header.col(|ui| {
                        ui.strong("Actions");
                    });
                })
                .body(|mut body| {
                    for record in &records {
                        body.row(28.0, |mut row| {
                            for field in Field::ALL {
                                row.col(|ui| {
                                    Self::show_cell(ui, record, field, editing, &mut actions);
                                });
                            }
                            row.col(|ui| {
                                if ui.button("\u{2716}").on_hover_text("Delete row").clicked() {
                                    actions.push(RowAction::Delete(record.id));
                                }
                            });
                        });
                    }
                });
        });

        if records.is_empty() {
            ui.weak("No rows. Use \"Add Row\" to create one.");
        }

        for action in actions {
            Self::apply(app, action);
        }
    }

    fn show_cell(
        ui: &mut egui::Ui,
        record: &Record,
        field: Field,
        editing: &mut Option<CellEdit>,
        actions: &mut Vec<RowAction>,
    ) {
        match editing.as_mut() {
            Some(edit) if edit.is(record.id, field) => {
                let response = ui.add(
                    egui::TextEdit::singleline(&mut edit.buffer)
                        .hint_text(field.placeholder())
                        .desired_width(f32::INFINITY),
                );
                if !edit.focused {
                    response.request_focus();
                    edit.focused = true;
                }
                if response.lost_focus() {
                    // Escape reverts, Enter or clicking away commits
                    if ui.input(|i| i.key_pressed(egui::Key::Escape)) {
                        actions.push(RowAction::Cancel);
                    } else {
                        actions.push(RowAction::Commit(record.id, field, edit.buffer.clone()));
                    }
                }
            }
            _ => {
                let text = record.get(field);
                let label = if text.is_empty() {
                    egui::RichText::new(field.placeholder()).weak()
                } else {
                    egui::RichText::new(text)
                };
                let response = ui
                    .add(egui::Label::new(label).truncate().sense(egui::Sense::click()))
                    .on_hover_cursor(egui::CursorIcon::Text);
                if response.clicked() {
                    actions.push(RowAction::StartEdit(record.id, field, text.to_string()));
                }
            }
        }
    }

    fn apply(app: &mut MetadataEditorApp, action: RowAction) {
        match action {
            RowAction::StartEdit(id, field, text) => {
                app.editing = Some(CellEdit::new(id, field, text));
            }
            RowAction::Commit(id, field, text) => {
                app.editor.set_field(id, field, text);
                if app.editing.as_ref().is_some_and(|e| e.is(id, field)) {
                    app.editing = None;
                }
            }
            RowAction::Cancel => app.editing = None,
            RowAction::Delete(id) => {
                if app.editing.as_ref().is_some_and(|e| e.id == id) {
                    app.editing = None;
                }
                app.editor.delete_row(id);
            }
        }
    }
}

/// Read-only table of the baseline rows
pub struct BaselineTable;

impl BaselineTable {
    pub fn show(ui: &mut egui::Ui, records: &[Record]) {
        ui.push_id("baseline_table", |ui| {
            TableBuilder::new(ui)
                .striped(true)
                .vscroll(false)
                .column(Column::initial(160.0).at_least(80.0))
                .column(Column::initial(260.0).at_least(100.0))
                .column(Column::remainder().at_least(120.0))
                .header(24.0, |mut header| {
                    for field in Field::ALL {
                        header.col(|ui| {
                            ui.strong(field.label());
                        });
                    }
                })
                .body(|mut body| {
                    for record in records {
                        body.row(24.0, |mut row| {
                            for field in Field::ALL {
                                row.col(|ui| {
                                    ui.weak(record.get(field));
                                });
                            }
                        });
                    }
                });
        });
    }
}
