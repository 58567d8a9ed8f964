use eframe::egui::{RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::{CellValue, Dataset};
use crate::ui::controls::cell_label;

// ---------------------------------------------------------------------------
// Data table (filtered rows)
// ---------------------------------------------------------------------------

const ROW_HEIGHT: f32 = 18.0;

/// Render `dataset` as a scrollable table. `id` keeps side-by-side tables apart.
pub fn data_table(ui: &mut Ui, id: &str, dataset: &Dataset) {
    if dataset.columns.is_empty() {
        ui.label("The file has no columns.");
        return;
    }

    let names: Vec<&str> = dataset.column_names().collect();
    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .max_scroll_height(420.0)
            .columns(Column::auto().at_least(60.0).clip(true), names.len())
            .header(20.0, |mut header| {
                for name in &names {
                    header.col(|ui: &mut Ui| {
                        ui.strong(*name);
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, dataset.len(), |mut row| {
                    let record = &dataset.rows[row.index()];
                    for name in &names {
                        row.col(|ui: &mut Ui| {
                            let value = record.get(name);
                            if matches!(value, CellValue::Null) {
                                ui.label(RichText::new(cell_label(value)).weak());
                            } else {
                                ui.label(cell_label(value));
                            }
                        });
                    }
                });
            });
    });
}
